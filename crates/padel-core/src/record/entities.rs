//! Field models for the dashboard's entities.
//!
//! Each model is the `F` of a [`Record<F>`](super::Record). Optional fields
//! default so that partially populated documents still decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;

pub type Sale = Record<SaleFields>;
pub type User = Record<UserFields>;
pub type Role = Record<RoleFields>;
pub type Product = Record<ProductFields>;

/// Lifecycle of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SaleStatus {
    Pendiente,
    Completada,
    Cancelada,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleFields {
    /// Staff member who registered the sale.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub cliente: Option<String>,
    #[serde(default)]
    pub estado: Option<SaleStatus>,
    #[serde(default)]
    pub name_cliente: Option<String>,
    pub total: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items_sale: Vec<SaleItem>,
}

/// One line of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub id_venta: Option<String>,
    pub id_producto: String,
    pub cantidad: u32,
    pub precio: f64,
    pub total: f64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFields {
    pub nickname: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Role id.
    pub role: String,
    /// Denormalized role name for display.
    #[serde(default)]
    pub name_role: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleFields {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Permission keys such as `read_sale` or `update_user`.
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl RoleFields {
    pub fn allows(&self, permission: &str) -> bool {
        self.is_active && self.permissions.iter().any(|p| p == permission)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFields {
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub stock: Option<i64>,
}

fn default_active() -> bool {
    true
}
