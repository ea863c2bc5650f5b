use super::{Line, Record};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Sale {
    pub id: Uuid,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One product in the checkout cart.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl Line for CartLine {
    fn quantity(&self) -> i32 {
        self.quantity
    }

    fn unit_price(&self) -> Decimal {
        self.unit_price
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct Checkout {
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    pub payment_method: PaymentMethod,
    pub items: Vec<CartLine>,
}

impl Checkout {
    /// Sum of the line totals.
    ///
    /// # Errors
    /// Returns [`super::LineError::Overflow`] when the total does not fit.
    pub fn total_amount(&self) -> Result<Decimal, super::LineError> {
        super::total(&self.items)
    }
}

impl Record for Sale {
    const TABLE: &'static str = "sales";
    const ORDER_BY: (&'static str, bool) = ("created_at", false);
}
