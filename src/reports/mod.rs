//! Sales and purchase reports for a date range.
//!
//! Eight aggregate procedures run concurrently with the caller's token. Each
//! result lands in its own [`Panel`]; a failing procedure turns into an error
//! panel plus a [`Notice`] and never hides the other seven.

pub mod pdf;

use crate::backend::{Backend, BackendError, Credential};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{instrument, warn};
use utoipa::ToSchema;

/// Days covered when the caller does not pick a start date, today included.
pub const DEFAULT_RANGE_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReportRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidRange {
    Inverted,
    OutOfBounds,
}

impl std::fmt::Display for InvalidRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Inverted => "Start date must not be after end date",
            Self::OutOfBounds => "End date is too early to compute a default start date",
        })
    }
}

impl ReportRange {
    /// Fill missing bounds: `to` defaults to `today`, `from` to the
    /// [`DEFAULT_RANGE_DAYS`] ending at `to`.
    ///
    /// # Errors
    /// Returns [`InvalidRange::Inverted`] when `from` is after `to`, and
    /// [`InvalidRange::OutOfBounds`] when the default start would fall before
    /// the earliest representable date.
    pub fn resolve(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, InvalidRange> {
        let to = to.unwrap_or(today);
        let from = match from {
            Some(from) => from,
            None => to
                .checked_sub_signed(Duration::days(DEFAULT_RANGE_DAYS - 1))
                .ok_or(InvalidRange::OutOfBounds)?,
        };
        if from > to {
            return Err(InvalidRange::Inverted);
        }
        Ok(Self { from, to })
    }

    fn rpc_args(self) -> RangeArgs {
        RangeArgs {
            start_date: self.from,
            end_date: self.to,
        }
    }
}

#[derive(Serialize)]
struct RangeArgs {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SalesSummary {
    pub total_sales: i64,
    pub total_revenue: Decimal,
    pub average_sale: Decimal,
    pub items_sold: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailySales {
    pub day: NaiveDate,
    #[serde(default)]
    pub sales_count: i64,
    #[serde(default)]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductSales {
    pub product_name: String,
    #[serde(default)]
    pub quantity_sold: i64,
    #[serde(default)]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategorySales {
    pub category_name: String,
    #[serde(default)]
    pub quantity_sold: i64,
    #[serde(default)]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmployeeSales {
    pub employee_name: String,
    #[serde(default)]
    pub sales_count: i64,
    #[serde(default)]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomerSales {
    pub customer_name: String,
    #[serde(default)]
    pub sales_count: i64,
    #[serde(default)]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentMethodSales {
    pub payment_method: String,
    #[serde(default)]
    pub sales_count: i64,
    #[serde(default)]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PurchaseSummary {
    pub total_orders: i64,
    pub total_spent: Decimal,
    pub pending_orders: i64,
    pub received_orders: i64,
}

/// Outcome of one report procedure.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Panel<T> {
    Ok { data: T },
    Error { message: String },
}

impl<T> Panel<T> {
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Ok { data } => Some(data),
            Self::Error { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NoticeVariant {
    Destructive,
}

/// Toast-style message shown next to the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Notice {
    pub variant: NoticeVariant,
    pub title: String,
    pub description: String,
}

/// The eight aggregate procedures, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    SalesSummary,
    SalesByDay,
    TopProducts,
    SalesByCategory,
    SalesByEmployee,
    SalesByCustomer,
    SalesByPaymentMethod,
    PurchaseSummary,
}

impl ReportKind {
    pub const ALL: [Self; 8] = [
        Self::SalesSummary,
        Self::SalesByDay,
        Self::TopProducts,
        Self::SalesByCategory,
        Self::SalesByEmployee,
        Self::SalesByCustomer,
        Self::SalesByPaymentMethod,
        Self::PurchaseSummary,
    ];

    #[must_use]
    pub const fn function(self) -> &'static str {
        match self {
            Self::SalesSummary => "get_sales_summary",
            Self::SalesByDay => "get_sales_by_day",
            Self::TopProducts => "get_top_products",
            Self::SalesByCategory => "get_sales_by_category",
            Self::SalesByEmployee => "get_sales_by_employee",
            Self::SalesByCustomer => "get_sales_by_customer",
            Self::SalesByPaymentMethod => "get_sales_by_payment_method",
            Self::PurchaseSummary => "get_purchase_summary",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::SalesSummary => "Sales summary",
            Self::SalesByDay => "Sales by day",
            Self::TopProducts => "Top products",
            Self::SalesByCategory => "Sales by category",
            Self::SalesByEmployee => "Sales by employee",
            Self::SalesByCustomer => "Sales by customer",
            Self::SalesByPaymentMethod => "Sales by payment method",
            Self::PurchaseSummary => "Purchase summary",
        }
    }
}

/// Every panel for one range, plus a notice per failed panel.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReportSet {
    pub range: ReportRange,
    pub sales_summary: Panel<SalesSummary>,
    pub sales_by_day: Panel<Vec<DailySales>>,
    pub top_products: Panel<Vec<ProductSales>>,
    pub sales_by_category: Panel<Vec<CategorySales>>,
    pub sales_by_employee: Panel<Vec<EmployeeSales>>,
    pub sales_by_customer: Panel<Vec<CustomerSales>>,
    pub sales_by_payment_method: Panel<Vec<PaymentMethodSales>>,
    pub purchase_summary: Panel<PurchaseSummary>,
    pub notices: Vec<Notice>,
}

/// Summary procedures may answer with a single object or a one-row table.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: Default> OneOrMany<T> {
    fn into_first(self) -> T {
        match self {
            Self::One(value) => value,
            Self::Many(rows) => rows.into_iter().next().unwrap_or_default(),
        }
    }
}

/// Table procedures answer `null` when there is nothing to aggregate.
fn rows<T>(rows: Option<Vec<T>>) -> Vec<T> {
    rows.unwrap_or_default()
}

fn summary<T: Default>(value: Option<OneOrMany<T>>) -> T {
    value.map(OneOrMany::into_first).unwrap_or_default()
}

async fn call<T: DeserializeOwned>(
    backend: &Backend,
    access_token: &str,
    kind: ReportKind,
    args: &RangeArgs,
) -> Result<T, BackendError> {
    backend
        .rpc(Credential::User(access_token), kind.function(), args)
        .await
}

/// Fold one procedure result into its panel, recording a notice on failure.
fn panel<T>(
    kind: ReportKind,
    result: Result<T, BackendError>,
    notices: &mut Vec<Notice>,
) -> Panel<T> {
    match result {
        Ok(data) => Panel::Ok { data },
        Err(err) => {
            let message = err.to_string();
            warn!(report = kind.function(), "report failed: {message}");
            notices.push(Notice {
                variant: NoticeVariant::Destructive,
                title: format!("Could not load {}", kind.title().to_lowercase()),
                description: message.clone(),
            });
            Panel::Error { message }
        }
    }
}

/// Run all eight procedures for `range` concurrently and collect the panels.
#[instrument(skip(backend, access_token))]
pub async fn build(backend: &Backend, access_token: &str, range: ReportRange) -> ReportSet {
    let args = range.rpc_args();

    let (
        sales_summary,
        sales_by_day,
        top_products,
        sales_by_category,
        sales_by_employee,
        sales_by_customer,
        sales_by_payment_method,
        purchase_summary,
    ) = tokio::join!(
        call::<Option<OneOrMany<SalesSummary>>>(backend, access_token, ReportKind::SalesSummary, &args),
        call::<Option<Vec<DailySales>>>(backend, access_token, ReportKind::SalesByDay, &args),
        call::<Option<Vec<ProductSales>>>(backend, access_token, ReportKind::TopProducts, &args),
        call::<Option<Vec<CategorySales>>>(backend, access_token, ReportKind::SalesByCategory, &args),
        call::<Option<Vec<EmployeeSales>>>(backend, access_token, ReportKind::SalesByEmployee, &args),
        call::<Option<Vec<CustomerSales>>>(backend, access_token, ReportKind::SalesByCustomer, &args),
        call::<Option<Vec<PaymentMethodSales>>>(
            backend,
            access_token,
            ReportKind::SalesByPaymentMethod,
            &args
        ),
        call::<Option<OneOrMany<PurchaseSummary>>>(
            backend,
            access_token,
            ReportKind::PurchaseSummary,
            &args
        ),
    );

    let mut notices = Vec::new();
    ReportSet {
        range,
        sales_summary: panel(
            ReportKind::SalesSummary,
            sales_summary.map(summary),
            &mut notices,
        ),
        sales_by_day: panel(ReportKind::SalesByDay, sales_by_day.map(rows), &mut notices),
        top_products: panel(ReportKind::TopProducts, top_products.map(rows), &mut notices),
        sales_by_category: panel(
            ReportKind::SalesByCategory,
            sales_by_category.map(rows),
            &mut notices,
        ),
        sales_by_employee: panel(
            ReportKind::SalesByEmployee,
            sales_by_employee.map(rows),
            &mut notices,
        ),
        sales_by_customer: panel(
            ReportKind::SalesByCustomer,
            sales_by_customer.map(rows),
            &mut notices,
        ),
        sales_by_payment_method: panel(
            ReportKind::SalesByPaymentMethod,
            sales_by_payment_method.map(rows),
            &mut notices,
        ),
        purchase_summary: panel(
            ReportKind::PurchaseSummary,
            purchase_summary.map(summary),
            &mut notices,
        ),
        notices,
    }
}
