//! Integration tests for the phone assignment workflow.
//!
//! Runs against an in-memory SQLite database with the real migrations, so
//! the partial unique index over unreleased assignments is exercised for
//! real.

use backend::database::models::{
    CreatePhoneAssignment, CreateTenant, CreateUser, OwnerType, Role,
};
use backend::errors::ServiceError;
use backend::repositories::phone_assignment_repository::PhoneAssignmentRepository;
use backend::repositories::user_repository::UserRepository;
use backend::services::group_service::GroupService;
use backend::services::phone_assignment_service::PhoneAssignmentService;
use backend::services::tenant_service::TenantService;
use backend::services::user_service::UserService;
use backend::utils::jwt::Claims;
use sqlx::SqlitePool;

async fn setup_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

fn claims(user_id: &str, role: Role, tenant_id: Option<&str>) -> Claims {
    Claims {
        sub: user_id.to_string(),
        email: format!("{user_id}@test.local"),
        role: role.to_string(),
        tenant_id: tenant_id.map(String::from),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        iat: chrono::Utc::now().timestamp() as usize,
    }
}

/// Seeds a SuperAdmin row directly and returns claims for it.
async fn seed_super_admin(pool: &SqlitePool, name: &str) -> Claims {
    let repo = UserRepository::new(pool);
    let user = repo
        .create_user(backend::repositories::user_repository::NewUserRow {
            tenant_id: None,
            name: name.to_string(),
            email: format!("{name}@test.local"),
            password_hash: "not-a-real-hash".to_string(),
            role: Role::SuperAdmin,
            phone_number: None,
            is_first_login: false,
            temp_password_expires_at: None,
        })
        .await
        .unwrap();
    claims(&user.id, Role::SuperAdmin, None)
}

fn tenant_request(name: &str) -> CreateTenant {
    CreateTenant {
        name: name.to_string(),
        contact_email: None,
        contact_phone: None,
        address: None,
        messages_enabled: None,
        contacts_enabled: None,
        voicemail_enabled: None,
        phone_enabled: None,
        retention_years: None,
    }
}

fn user_request(name: &str, email: &str, tenant_id: &str) -> CreateUser {
    CreateUser {
        name: name.to_string(),
        email: email.to_string(),
        password: Some("password-123".to_string()),
        role: Role::OrgUser,
        tenant_id: Some(tenant_id.to_string()),
        phone_number: None,
    }
}

fn assignment_request(number: &str, tenant_id: &str, owner_type: OwnerType, owner_id: &str) -> CreatePhoneAssignment {
    CreatePhoneAssignment {
        phone_number: number.to_string(),
        tenant_id: tenant_id.to_string(),
        owner_type,
        owner_id: owner_id.to_string(),
    }
}

#[tokio::test]
async fn assign_writes_owner_and_record_together() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant = TenantService::new(&pool)
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();
    let user = UserService::new(&pool)
        .create_user(user_request("Alice", "alice@acme.com", &tenant.id), &root)
        .await
        .unwrap();

    let assignment = PhoneAssignmentService::new(&pool)
        .assign(
            assignment_request("+15551230001", &tenant.id, OwnerType::User, &user.id),
            &root,
        )
        .await
        .unwrap();

    assert!(assignment.is_active);
    assert_eq!(assignment.phone_number, "+15551230001");
    assert_eq!(assignment.assigned_by, root.user_id());

    // The denormalized owner field moved in the same transaction.
    let reloaded = UserRepository::new(&pool)
        .get_user_by_id(&user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.phone_number.as_deref(), Some("+15551230001"));
}

#[tokio::test]
async fn second_assign_of_same_number_conflicts() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant = TenantService::new(&pool)
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();
    let user_service = UserService::new(&pool);
    let alice = user_service
        .create_user(user_request("Alice", "alice@acme.com", &tenant.id), &root)
        .await
        .unwrap();
    let bob = user_service
        .create_user(user_request("Bob", "bob@acme.com", &tenant.id), &root)
        .await
        .unwrap();

    let service = PhoneAssignmentService::new(&pool);
    service
        .assign(
            assignment_request("+15551230002", &tenant.id, OwnerType::User, &alice.id),
            &root,
        )
        .await
        .unwrap();

    // Assign is deliberately not idempotent: the second call must fail.
    let err = service
        .assign(
            assignment_request("+15551230002", &tenant.id, OwnerType::User, &bob.id),
            &root,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists { .. }));
}

#[tokio::test]
async fn owner_with_a_number_cannot_take_another() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant = TenantService::new(&pool)
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();
    let alice = UserService::new(&pool)
        .create_user(user_request("Alice", "alice@acme.com", &tenant.id), &root)
        .await
        .unwrap();

    let service = PhoneAssignmentService::new(&pool);
    service
        .assign(
            assignment_request("+15551230003", &tenant.id, OwnerType::User, &alice.id),
            &root,
        )
        .await
        .unwrap();

    let err = service
        .assign(
            assignment_request("+15551230004", &tenant.id, OwnerType::User, &alice.id),
            &root,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation { .. }));

    // The transaction rolled back: no record exists for the second number
    // and the owner still carries the first.
    let orphan = PhoneAssignmentRepository::new(&pool)
        .get_held_by_number("+15551230004")
        .await
        .unwrap();
    assert!(orphan.is_none());
    let reloaded = UserRepository::new(&pool)
        .get_user_by_id(&alice.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.phone_number.as_deref(), Some("+15551230003"));
}

#[tokio::test]
async fn unassign_frees_the_number_for_reassignment() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant = TenantService::new(&pool)
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();
    let user_service = UserService::new(&pool);
    let alice = user_service
        .create_user(user_request("Alice", "alice@acme.com", &tenant.id), &root)
        .await
        .unwrap();
    let bob = user_service
        .create_user(user_request("Bob", "bob@acme.com", &tenant.id), &root)
        .await
        .unwrap();

    let service = PhoneAssignmentService::new(&pool);
    let assignment = service
        .assign(
            assignment_request("+15551230005", &tenant.id, OwnerType::User, &alice.id),
            &root,
        )
        .await
        .unwrap();

    let released = service.unassign(&assignment.id, &root).await.unwrap();
    assert!(!released.is_active);
    assert!(released.unassigned_at.is_some());
    assert_eq!(released.unassigned_by.as_deref(), Some(root.user_id()));

    // The owner's denormalized number was cleared in the same transaction.
    let reloaded = UserRepository::new(&pool)
        .get_user_by_id(&alice.id)
        .await
        .unwrap()
        .unwrap();
    assert!(reloaded.phone_number.is_none());

    // The number is free again.
    let second = service
        .assign(
            assignment_request("+15551230005", &tenant.id, OwnerType::User, &bob.id),
            &root,
        )
        .await
        .unwrap();
    assert!(second.is_active);

    // History is kept: the released record still exists, deactivated.
    let history = PhoneAssignmentRepository::new(&pool)
        .get_assignment_by_id(&assignment.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!history.is_active);
}

#[tokio::test]
async fn unassign_twice_reports_not_found() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant = TenantService::new(&pool)
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();
    let alice = UserService::new(&pool)
        .create_user(user_request("Alice", "alice@acme.com", &tenant.id), &root)
        .await
        .unwrap();

    let service = PhoneAssignmentService::new(&pool);
    let assignment = service
        .assign(
            assignment_request("+15551230006", &tenant.id, OwnerType::User, &alice.id),
            &root,
        )
        .await
        .unwrap();

    service.unassign(&assignment.id, &root).await.unwrap();
    let err = service.unassign(&assignment.id, &root).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[tokio::test]
async fn suspension_keeps_the_owner_number() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant = TenantService::new(&pool)
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();
    let alice = UserService::new(&pool)
        .create_user(user_request("Alice", "alice@acme.com", &tenant.id), &root)
        .await
        .unwrap();

    let service = PhoneAssignmentService::new(&pool);
    let assignment = service
        .assign(
            assignment_request("+15551230007", &tenant.id, OwnerType::User, &alice.id),
            &root,
        )
        .await
        .unwrap();

    let suspended = service.set_active(&assignment.id, false, &root).await.unwrap();
    assert!(!suspended.is_active);

    // Unlike unassign, suspension does not clear the owner's number.
    let reloaded = UserRepository::new(&pool)
        .get_user_by_id(&alice.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.phone_number.as_deref(), Some("+15551230007"));

    let resumed = service.set_active(&assignment.id, true, &root).await.unwrap();
    assert!(resumed.is_active);
}

#[tokio::test]
async fn suspended_number_cannot_be_given_to_another_owner() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant = TenantService::new(&pool)
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();
    let user_service = UserService::new(&pool);
    let alice = user_service
        .create_user(user_request("Alice", "alice@acme.com", &tenant.id), &root)
        .await
        .unwrap();
    let bob = user_service
        .create_user(user_request("Bob", "bob@acme.com", &tenant.id), &root)
        .await
        .unwrap();

    let service = PhoneAssignmentService::new(&pool);
    let first = service
        .assign(
            assignment_request("+15551230008", &tenant.id, OwnerType::User, &alice.id),
            &root,
        )
        .await
        .unwrap();
    service.set_active(&first.id, false, &root).await.unwrap();

    // Suspension keeps the hold: the number cannot be handed to Bob.
    let err = service
        .assign(
            assignment_request("+15551230008", &tenant.id, OwnerType::User, &bob.id),
            &root,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists { .. }));

    // Alice still carries the number, Bob never got it.
    let user_repo = UserRepository::new(&pool);
    let alice_row = user_repo.get_user_by_id(&alice.id).await.unwrap().unwrap();
    assert_eq!(alice_row.phone_number.as_deref(), Some("+15551230008"));
    let bob_row = user_repo.get_user_by_id(&bob.id).await.unwrap().unwrap();
    assert!(bob_row.phone_number.is_none());

    // Reactivation is always possible because the hold never lapsed.
    let resumed = service.set_active(&first.id, true, &root).await.unwrap();
    assert!(resumed.is_active);
}

#[tokio::test]
async fn unassign_releases_a_suspended_assignment() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant = TenantService::new(&pool)
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();
    let alice = UserService::new(&pool)
        .create_user(user_request("Alice", "alice@acme.com", &tenant.id), &root)
        .await
        .unwrap();

    let service = PhoneAssignmentService::new(&pool);
    let assignment = service
        .assign(
            assignment_request("+15551230012", &tenant.id, OwnerType::User, &alice.id),
            &root,
        )
        .await
        .unwrap();
    service.set_active(&assignment.id, false, &root).await.unwrap();

    // A suspended assignment still holds its number, so unassign must
    // work on it or the number would be stuck forever.
    let released = service.unassign(&assignment.id, &root).await.unwrap();
    assert!(released.unassigned_at.is_some());

    let reloaded = UserRepository::new(&pool)
        .get_user_by_id(&alice.id)
        .await
        .unwrap()
        .unwrap();
    assert!(reloaded.phone_number.is_none());

    // Released rows are history and cannot be reactivated.
    let err = service
        .set_active(&assignment.id, true, &root)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[tokio::test]
async fn groups_can_own_numbers() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant = TenantService::new(&pool)
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();

    let group = GroupService::new(&pool)
        .create_group(
            backend::database::models::CreateGroup {
                name: "Support".to_string(),
                description: None,
                member_ids: vec![],
                tenant_id: Some(tenant.id.clone()),
            },
            &root,
        )
        .await
        .unwrap();

    let assignment = PhoneAssignmentService::new(&pool)
        .assign(
            assignment_request("+15551230009", &tenant.id, OwnerType::Group, &group.group.id),
            &root,
        )
        .await
        .unwrap();
    assert_eq!(assignment.owner_type, OwnerType::Group);
}

#[tokio::test]
async fn assigning_to_a_missing_owner_is_not_found() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant = TenantService::new(&pool)
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();

    let err = PhoneAssignmentService::new(&pool)
        .assign(
            assignment_request("+15551230010", &tenant.id, OwnerType::User, "no-such-user"),
            &root,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[tokio::test]
async fn malformed_number_is_rejected() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let err = PhoneAssignmentService::new(&pool)
        .assign(
            assignment_request("5551230011", "tenant-x", OwnerType::User, "user-x"),
            &root,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation { .. }));
}
