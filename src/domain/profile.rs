use super::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Role tag on a profile row; every authorization check keys on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Employee,
}

/// Rows written outside this service may carry no role or an unexpected
/// one; those never grant admin rights.
fn lenient_role<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .and_then(|value| value.parse().ok())
        .unwrap_or_default())
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Employee => "employee",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "employee" => Ok(Self::Employee),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Profile {
    const TABLE: &'static str = "profiles";
    const ORDER_BY: (&'static str, bool) = ("created_at", false);
}

/// Profile row written right after the auth account is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

/// A screen of the application, shown only to the roles allowed to open it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct NavItem {
    #[schema(value_type = String)]
    pub title: &'static str,
    #[schema(value_type = String)]
    pub href: &'static str,
    #[serde(skip)]
    admin_only: bool,
}

const NAVIGATION: [NavItem; 10] = [
    NavItem { title: "Dashboard", href: "/dashboard", admin_only: false },
    NavItem { title: "Sell", href: "/sell", admin_only: false },
    NavItem { title: "Products", href: "/products", admin_only: false },
    NavItem { title: "Categories", href: "/categories", admin_only: false },
    NavItem { title: "Customers", href: "/customers", admin_only: false },
    NavItem { title: "Sales", href: "/sales", admin_only: false },
    NavItem { title: "Suppliers", href: "/suppliers", admin_only: true },
    NavItem { title: "Purchase orders", href: "/purchase-orders", admin_only: true },
    NavItem { title: "Reports", href: "/reports", admin_only: true },
    NavItem { title: "Users", href: "/users", admin_only: true },
];

/// Screens visible to `role`, in menu order.
#[must_use]
pub fn navigation(role: Role) -> Vec<NavItem> {
    NAVIGATION
        .iter()
        .filter(|item| role == Role::Admin || !item.admin_only)
        .copied()
        .collect()
}
