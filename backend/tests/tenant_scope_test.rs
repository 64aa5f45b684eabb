//! Integration tests for tenant scoping and privilege enforcement.
//!
//! Cross-tenant reads must come back as not-found rather than forbidden,
//! so a caller can never learn that a record exists outside their scope.

use backend::database::models::{CreateGroup, CreateTenant, CreateUser, Role, UpdateUser};
use backend::errors::ServiceError;
use backend::repositories::user_repository::{NewUserRow, UserRepository};
use backend::services::group_service::GroupService;
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

async fn seed_super_admin(pool: &SqlitePool, name: &str) -> Claims {
    let user = UserRepository::new(pool)
        .create_user(NewUserRow {
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

fn user_request(name: &str, email: &str, role: Role, tenant_id: Option<&str>) -> CreateUser {
    CreateUser {
        name: name.to_string(),
        email: email.to_string(),
        password: Some("password-123".to_string()),
        role,
        tenant_id: tenant_id.map(String::from),
        phone_number: None,
    }
}

#[tokio::test]
async fn cross_tenant_reads_look_nonexistent() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant_service = TenantService::new(&pool);
    let tenant_a = tenant_service
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();
    let tenant_b = tenant_service
        .create_tenant(tenant_request("Globex"), &root)
        .await
        .unwrap();

    let user_service = UserService::new(&pool);
    let admin_a = user_service
        .create_user(
            user_request("AdminA", "admin-a@acme.com", Role::Admin, Some(&tenant_a.id)),
            &root,
        )
        .await
        .unwrap();
    let user_b = user_service
        .create_user(
            user_request("UserB", "user-b@globex.com", Role::OrgUser, Some(&tenant_b.id)),
            &root,
        )
        .await
        .unwrap();

    // Admin of tenant A asking about tenant B's user: not-found, never 403.
    let admin_a_claims = claims(&admin_a.id, Role::Admin, Some(&tenant_a.id));
    let err = user_service
        .get_user_required(&user_b.id, &admin_a_claims)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[tokio::test]
async fn super_admins_only_see_their_own_tenants() {
    let pool = setup_pool().await;
    let root_one = seed_super_admin(&pool, "root-one").await;
    let root_two = seed_super_admin(&pool, "root-two").await;

    let tenant_service = TenantService::new(&pool);
    let tenant = tenant_service
        .create_tenant(tenant_request("Acme"), &root_one)
        .await
        .unwrap();

    let err = tenant_service
        .get_tenant_required(&tenant.id, &root_two)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));

    let (tenants, total) = tenant_service
        .list_tenants(&root_two, &Default::default())
        .await
        .unwrap();
    assert!(tenants.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn user_lists_are_scoped_to_the_tenant() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant_service = TenantService::new(&pool);
    let tenant_a = tenant_service
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();
    let tenant_b = tenant_service
        .create_tenant(tenant_request("Globex"), &root)
        .await
        .unwrap();

    let user_service = UserService::new(&pool);
    let admin_a = user_service
        .create_user(
            user_request("AdminA", "admin-a@acme.com", Role::Admin, Some(&tenant_a.id)),
            &root,
        )
        .await
        .unwrap();
    user_service
        .create_user(
            user_request("UserB", "user-b@globex.com", Role::OrgUser, Some(&tenant_b.id)),
            &root,
        )
        .await
        .unwrap();

    let admin_a_claims = claims(&admin_a.id, Role::Admin, Some(&tenant_a.id));
    let (users, total) = user_service
        .list_users(&admin_a_claims, &Default::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert!(users.iter().all(|u| u.tenant_id.as_deref() == Some(tenant_a.id.as_str())));

    // The creating SuperAdmin sees users across both tenants.
    let (_, total) = user_service.list_users(&root, &Default::default()).await.unwrap();
    assert_eq!(total, 2);
}

#[tokio::test]
async fn admins_create_into_their_own_tenant_only() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant_service = TenantService::new(&pool);
    let tenant_a = tenant_service
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();
    let tenant_b = tenant_service
        .create_tenant(tenant_request("Globex"), &root)
        .await
        .unwrap();

    let user_service = UserService::new(&pool);
    let admin_a = user_service
        .create_user(
            user_request("AdminA", "admin-a@acme.com", Role::Admin, Some(&tenant_a.id)),
            &root,
        )
        .await
        .unwrap();
    let admin_a_claims = claims(&admin_a.id, Role::Admin, Some(&tenant_a.id));

    // The payload names tenant B, but the admin's own tenant wins.
    let created = user_service
        .create_user(
            user_request("Sneaky", "sneaky@acme.com", Role::OrgUser, Some(&tenant_b.id)),
            &admin_a_claims,
        )
        .await
        .unwrap();
    assert_eq!(created.tenant_id.as_deref(), Some(tenant_a.id.as_str()));

    // And an Admin can never mint a SuperAdmin.
    let err = user_service
        .create_user(
            user_request("Boss", "boss@acme.com", Role::SuperAdmin, None),
            &admin_a_claims,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PermissionDenied { .. }));
}

#[tokio::test]
async fn role_and_tenant_changes_require_super_admin() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant = TenantService::new(&pool)
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();

    let user_service = UserService::new(&pool);
    let admin = user_service
        .create_user(
            user_request("Admin", "admin@acme.com", Role::Admin, Some(&tenant.id)),
            &root,
        )
        .await
        .unwrap();
    let user = user_service
        .create_user(
            user_request("Alice", "alice@acme.com", Role::OrgUser, Some(&tenant.id)),
            &root,
        )
        .await
        .unwrap();

    let admin_claims = claims(&admin.id, Role::Admin, Some(&tenant.id));
    let err = user_service
        .update_user(
            &user.id,
            UpdateUser {
                role: Some(Role::Admin),
                ..Default::default()
            },
            &admin_claims,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PermissionDenied { .. }));

    // Plain profile updates by the same admin still work.
    let renamed = user_service
        .update_user(
            &user.id,
            UpdateUser {
                name: Some("Alice Smith".to_string()),
                ..Default::default()
            },
            &admin_claims,
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Alice Smith");

    // The SuperAdmin can promote.
    let promoted = user_service
        .update_user(
            &user.id,
            UpdateUser {
                role: Some(Role::OrgManager),
                ..Default::default()
            },
            &root,
        )
        .await
        .unwrap();
    assert_eq!(promoted.role, Role::OrgManager);
}

#[tokio::test]
async fn duplicate_emails_conflict_case_insensitively() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant = TenantService::new(&pool)
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();

    let user_service = UserService::new(&pool);
    user_service
        .create_user(
            user_request("Alice", "alice@acme.com", Role::OrgUser, Some(&tenant.id)),
            &root,
        )
        .await
        .unwrap();

    let err = user_service
        .create_user(
            user_request("Other", "ALICE@ACME.COM", Role::OrgUser, Some(&tenant.id)),
            &root,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists { .. }));
}

#[tokio::test]
async fn deleted_users_free_their_email() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant = TenantService::new(&pool)
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();

    let user_service = UserService::new(&pool);
    let alice = user_service
        .create_user(
            user_request("Alice", "alice@acme.com", Role::OrgUser, Some(&tenant.id)),
            &root,
        )
        .await
        .unwrap();

    user_service.delete_user(&alice.id, &root).await.unwrap();

    // Soft-deleted rows do not count for uniqueness.
    let replacement = user_service
        .create_user(
            user_request("Alice Again", "alice@acme.com", Role::OrgUser, Some(&tenant.id)),
            &root,
        )
        .await
        .unwrap();
    assert_ne!(replacement.id, alice.id);
}

#[tokio::test]
async fn group_names_are_unique_per_tenant_only() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant_service = TenantService::new(&pool);
    let tenant_a = tenant_service
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();
    let tenant_b = tenant_service
        .create_tenant(tenant_request("Globex"), &root)
        .await
        .unwrap();

    let group_service = GroupService::new(&pool);
    let request = |tenant_id: &str| CreateGroup {
        name: "Support".to_string(),
        description: None,
        member_ids: vec![],
        tenant_id: Some(tenant_id.to_string()),
    };

    group_service.create_group(request(&tenant_a.id), &root).await.unwrap();

    let err = group_service
        .create_group(request(&tenant_a.id), &root)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists { .. }));

    // Same name in a different tenant is fine.
    group_service.create_group(request(&tenant_b.id), &root).await.unwrap();
}

#[tokio::test]
async fn group_members_must_belong_to_the_tenant() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let tenant_service = TenantService::new(&pool);
    let tenant_a = tenant_service
        .create_tenant(tenant_request("Acme"), &root)
        .await
        .unwrap();
    let tenant_b = tenant_service
        .create_tenant(tenant_request("Globex"), &root)
        .await
        .unwrap();

    let outsider = UserService::new(&pool)
        .create_user(
            user_request("UserB", "user-b@globex.com", Role::OrgUser, Some(&tenant_b.id)),
            &root,
        )
        .await
        .unwrap();

    let err = GroupService::new(&pool)
        .create_group(
            CreateGroup {
                name: "Support".to_string(),
                description: None,
                member_ids: vec![outsider.id],
                tenant_id: Some(tenant_a.id.clone()),
            },
            &root,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation { .. }));
}

#[tokio::test]
async fn self_deletion_is_rejected() {
    let pool = setup_pool().await;
    let root = seed_super_admin(&pool, "root").await;

    let err = UserService::new(&pool)
        .delete_user(root.user_id(), &root)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation { .. }));
}
