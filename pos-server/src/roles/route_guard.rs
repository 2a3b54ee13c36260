//! Route guard
//!
//! Pure mapping from `(effective role, path)` to allow / redirect. Paths
//! outside both lists are open to every role.

use serde::Serialize;

use shared::models::UserRole;

pub const MANAGER_HOME: &str = "/dashboard";
pub const CASHIER_HOME: &str = "/dashboard/pos";

const MANAGER_ONLY: &[&str] = &[
    "/dashboard/employees",
    "/dashboard/shifts/manage",
    "/dashboard/analytics",
    "/dashboard/inventory",
    "/dashboard/fraud-alerts",
    "/dashboard/role-requests",
    "/dashboard/invoices",
    "/dashboard/settings",
];

const CASHIER_ONLY: &[&str] = &[
    "/dashboard/pos",
    "/dashboard/my-shifts",
    "/dashboard/breaks",
    "/dashboard/self-checkout",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "redirectTo", rename_all = "lowercase")]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

/// Landing route for a role
pub fn default_route(role: UserRole) -> &'static str {
    match role {
        UserRole::Manager => MANAGER_HOME,
        UserRole::Cashier => CASHIER_HOME,
    }
}

/// `path` equals `prefix` or continues it with a new segment
fn has_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}

pub fn check_route(role: UserRole, path: &str) -> RouteDecision {
    let forbidden = match role {
        UserRole::Manager => CASHIER_ONLY,
        UserRole::Cashier => MANAGER_ONLY,
    };
    if forbidden.iter().any(|prefix| has_prefix(path, prefix)) {
        RouteDecision::Redirect(default_route(role))
    } else {
        RouteDecision::Allow
    }
}
