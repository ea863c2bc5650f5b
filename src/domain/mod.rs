//! Records stored by the hosted backend.
//!
//! These are plain shapes for (de)serialization. Validation, uniqueness and
//! stock bookkeeping are the backend's job; the only logic here is the line
//! and order totals computed before an order or sale is submitted.

mod catalog;
mod orders;
mod profile;
mod sales;

pub use self::catalog::{
    Category, CategoryInput, Customer, CustomerInput, Product, ProductInput, Supplier,
    SupplierInput,
};
pub use self::orders::{
    NewPurchaseOrder, PurchaseOrder, PurchaseOrderItem, PurchaseOrderLine, PurchaseOrderStatus,
};
pub use self::profile::{navigation, NavItem, NewProfile, Profile, Role};
pub use self::sales::{CartLine, Checkout, PaymentMethod, Sale};

use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};

/// A table exposed through the generic record endpoints.
pub trait Record: Serialize + DeserializeOwned + Send + 'static {
    /// Table name on the hosted backend.
    const TABLE: &'static str;
    /// Column and direction (`true` = ascending) used for listings.
    const ORDER_BY: (&'static str, bool);
}

/// A record written straight to its table, without a stored procedure.
pub trait Editable: Record {
    /// Body accepted on create and update.
    type Input: Serialize + DeserializeOwned + Send + 'static;
}

/// Something priced per unit and bought or sold in a quantity.
pub trait Line {
    fn quantity(&self) -> i32;
    fn unit_price(&self) -> Decimal;

    /// `None` when the product does not fit in a `Decimal`.
    fn line_total(&self) -> Option<Decimal> {
        Decimal::from(self.quantity()).checked_mul(self.unit_price())
    }
}

/// Sum of line totals.
///
/// # Errors
/// Returns [`LineError::Overflow`] when a line or the running sum overflows.
pub fn total<L: Line>(lines: &[L]) -> Result<Decimal, LineError> {
    lines.iter().try_fold(Decimal::ZERO, |sum, line| {
        line.line_total()
            .and_then(|line_total| sum.checked_add(line_total))
            .ok_or(LineError::Overflow)
    })
}

/// Why a set of lines cannot be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineError {
    Empty,
    NonPositiveQuantity,
    NegativePrice,
    Overflow,
}

impl LineError {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Empty => "At least one item is required",
            Self::NonPositiveQuantity => "Quantity must be greater than zero",
            Self::NegativePrice => "Unit price cannot be negative",
            Self::Overflow => "Order total is too large",
        }
    }
}

/// Reject empty line lists, zero or negative quantities, negative prices and
/// totals that overflow.
///
/// # Errors
/// Returns the first problem found.
pub fn check_lines<L: Line>(lines: &[L]) -> Result<(), LineError> {
    if lines.is_empty() {
        return Err(LineError::Empty);
    }
    if lines.iter().any(|line| line.quantity() <= 0) {
        return Err(LineError::NonPositiveQuantity);
    }
    if lines.iter().any(|line| line.unit_price().is_sign_negative()) {
        return Err(LineError::NegativePrice);
    }
    total(lines).map(drop)
}
