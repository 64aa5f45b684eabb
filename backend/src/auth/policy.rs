//! Role-based page authorization policy.
//!
//! Maps each role to the set of UI path prefixes it may navigate to, and
//! decides for a given request whether to allow it, bounce it to the login
//! page, redirect it to the role's home page, or answer as if the page did
//! not exist. Denials deliberately read as "not found" rather than
//! "forbidden" so an unauthorized role cannot confirm a page exists.
//!
//! Data access is scoped separately: every repository call carries an
//! [`AccessScope`] derived from the verified claims, so path-level
//! authorization never substitutes for tenant isolation.

use crate::database::models::Role;
use crate::errors::ServiceError;
use crate::utils::jwt::{Claims, JwtUtils};
use std::str::FromStr;

/// Path prefixes reachable without any token.
const PUBLIC_PREFIXES: &[&str] = &[
    "/login",
    "/register",
    "/forgot-password",
    "/reset-password",
    "/api/auth",
    "/_next",
    "/static",
    "/favicon.ico",
];

/// Outcome of evaluating a page navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageDecision {
    /// Serve the page.
    Allow,
    /// Send the caller to the given path (role home for `/`).
    Redirect(&'static str),
    /// Unauthenticated request for a protected page: go to login.
    Login,
    /// Path is outside the role's allow-list; answered as not-found.
    NotFound,
}

/// Parses the role string from token claims against the closed role set.
///
/// An unknown role is a deny, not a crash: callers translate the error into
/// a not-found decision.
pub fn resolve_role(claims: &Claims) -> Result<Role, ServiceError> {
    Role::from_str(claims.role())
        .map_err(|e| ServiceError::permission_denied(format!("unresolvable role: {e}")))
}

/// Returns true when the path may be served without a token.
pub fn is_public_path(path: &str) -> bool {
    let path = normalize(path);
    path_matches_any(path, PUBLIC_PREFIXES)
}

/// Static role → allowed page prefixes table.
pub fn allowed_prefixes(role: Role) -> &'static [&'static str] {
    match role {
        Role::SuperAdmin => &["/", "/dashboard", "/users"],
        Role::Admin | Role::OrgManager | Role::OrgUser => &[
            "/",
            "/messages",
            "/contacts",
            "/voicemail",
            "/phone",
            "/settings",
        ],
    }
}

/// Role-specific landing page used for the root-path redirect.
pub fn home_path(role: Role) -> &'static str {
    match role {
        Role::SuperAdmin => "/dashboard",
        Role::Admin | Role::OrgManager | Role::OrgUser => "/messages",
    }
}

/// Decides whether `role` may navigate to `path`.
///
/// Trailing slashes are stripped first. The root path is special-cased into
/// a redirect to the role's home page; any other path is allowed iff it
/// equals one of the role's prefixes or sits strictly below one
/// (`prefix + "/"`).
pub fn check_page(role: Role, path: &str) -> PageDecision {
    let path = normalize(path);

    if path == "/" {
        return PageDecision::Redirect(home_path(role));
    }

    let prefixes: Vec<&str> = allowed_prefixes(role)
        .iter()
        .copied()
        .filter(|p| *p != "/")
        .collect();

    if path_matches_any(path, &prefixes) {
        PageDecision::Allow
    } else {
        PageDecision::NotFound
    }
}

/// Full request evaluation: public bypass, token presence, role resolution,
/// then the prefix check.
pub fn evaluate_request(jwt: &JwtUtils, token: Option<&str>, path: &str) -> PageDecision {
    if is_public_path(path) {
        return PageDecision::Allow;
    }

    let Some(token) = token else {
        return PageDecision::Login;
    };

    let claims = match jwt.validate_token(token) {
        Ok(claims) => claims,
        // Expired or invalid token: terminal, back to login.
        Err(_) => return PageDecision::Login,
    };

    match resolve_role(&claims) {
        Ok(role) => check_page(role, path),
        Err(_) => PageDecision::NotFound,
    }
}

/// Tenant scope applied to every data-layer operation.
///
/// SuperAdmins see the tenants they created; everyone else sees exactly
/// their own tenant. Cross-tenant reads fall out as empty results or
/// not-found, cross-tenant writes as permission errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    /// SuperAdmin: rows whose tenant was created by this user.
    Creator { user_id: String },
    /// Tenant roles: rows belonging to this tenant only.
    Tenant { tenant_id: String },
}

impl AccessScope {
    /// Derives the data scope from verified claims.
    pub fn from_claims(claims: &Claims) -> Result<Self, ServiceError> {
        let role = resolve_role(claims)?;

        if role.is_super_admin() {
            return Ok(AccessScope::Creator {
                user_id: claims.user_id().to_string(),
            });
        }

        match claims.tenant_id() {
            Some(tenant_id) => Ok(AccessScope::Tenant {
                tenant_id: tenant_id.to_string(),
            }),
            None => Err(ServiceError::unauthenticated(
                "token has no tenant for a tenant-scoped role",
            )),
        }
    }

    /// The tenant id this scope pins queries to, when it pins one.
    pub fn tenant_id(&self) -> Option<&str> {
        match self {
            AccessScope::Creator { .. } => None,
            AccessScope::Tenant { tenant_id } => Some(tenant_id),
        }
    }
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

fn path_matches_any(path: &str, prefixes: &[&str]) -> bool {
    prefixes
        .iter()
        .any(|prefix| path == *prefix || path.starts_with(&format!("{prefix}/")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::jwt::Claims;

    fn claims(role: &str, tenant: Option<&str>) -> Claims {
        Claims {
            sub: "user-1".into(),
            email: "a@b.com".into(),
            role: role.into(),
            tenant_id: tenant.map(String::from),
            exp: usize::MAX,
            iat: 0,
        }
    }

    const ALL_ROLES: [Role; 4] = [Role::SuperAdmin, Role::Admin, Role::OrgManager, Role::OrgUser];

    #[test]
    fn test_every_configured_prefix_is_allowed() {
        // Property: for every (role, prefix) pair in the table, the prefix
        // itself and any strict sub-path are allowed.
        for role in ALL_ROLES {
            for prefix in allowed_prefixes(role) {
                if *prefix == "/" {
                    continue;
                }
                assert_eq!(check_page(role, prefix), PageDecision::Allow);
                assert_eq!(
                    check_page(role, &format!("{prefix}/details/42")),
                    PageDecision::Allow
                );
                assert_eq!(
                    check_page(role, &format!("{prefix}/")),
                    PageDecision::Allow
                );
            }
        }
    }

    #[test]
    fn test_prefix_match_is_not_substring_match() {
        // "/users" allowed must not leak "/users-export".
        assert_eq!(
            check_page(Role::SuperAdmin, "/users-export"),
            PageDecision::NotFound
        );
        assert_eq!(
            check_page(Role::OrgUser, "/messagesarchive"),
            PageDecision::NotFound
        );
    }

    #[test]
    fn test_denial_reads_as_not_found() {
        // An OrgUser probing an existing SuperAdmin page learns nothing.
        assert_eq!(check_page(Role::OrgUser, "/users"), PageDecision::NotFound);
        assert_eq!(
            check_page(Role::OrgUser, "/dashboard"),
            PageDecision::NotFound
        );
        assert_eq!(
            check_page(Role::SuperAdmin, "/messages"),
            PageDecision::NotFound
        );
    }

    #[test]
    fn test_root_redirects_to_role_home() {
        assert_eq!(
            check_page(Role::SuperAdmin, "/"),
            PageDecision::Redirect("/dashboard")
        );
        for role in [Role::Admin, Role::OrgManager, Role::OrgUser] {
            assert_eq!(check_page(role, "/"), PageDecision::Redirect("/messages"));
            assert_eq!(check_page(role, "///"), PageDecision::Redirect("/messages"));
        }
    }

    #[test]
    fn test_public_paths_bypass_auth() {
        assert!(is_public_path("/login"));
        assert!(is_public_path("/api/auth/login"));
        assert!(is_public_path("/static/logo.png"));
        assert!(!is_public_path("/messages"));
        assert!(!is_public_path("/loginnn"));
    }

    #[test]
    fn test_unknown_role_is_denied() {
        let c = claims("Root", Some("t1"));
        assert!(resolve_role(&c).is_err());
    }

    #[test]
    fn test_scope_derivation() {
        let sa = claims("SuperAdmin", None);
        assert_eq!(
            AccessScope::from_claims(&sa).unwrap(),
            AccessScope::Creator {
                user_id: "user-1".into()
            }
        );

        let org = claims("OrgUser", Some("tenant-acme"));
        assert_eq!(
            AccessScope::from_claims(&org).unwrap(),
            AccessScope::Tenant {
                tenant_id: "tenant-acme".into()
            }
        );

        // Tenant-scoped role without a tenant id is rejected.
        let broken = claims("Admin", None);
        assert!(AccessScope::from_claims(&broken).is_err());
    }
}
