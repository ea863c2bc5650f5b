//! # Depozit (Point of Sale & Inventory)
//!
//! `depozit` is the HTTP service behind a small-business point of sale: product
//! catalog, categories, customers, suppliers, purchase orders, checkout and
//! reporting.
//!
//! ## Hosted backend
//!
//! Persistence, authentication and row-level security live in a hosted
//! database service (auth under `/auth/v1`, tables under `/rest/v1`, stored
//! procedures under `/rest/v1/rpc`). Stock decrement on sale, purchase-order
//! receipt and sales aggregation are stored procedures there. This crate only
//! orchestrates: it authenticates callers, forwards reads and writes with the
//! caller's access token so row-level security applies, and formats results.
//!
//! ## Roles
//!
//! Every account has a profile row tagged `admin` or `employee`. User
//! management and reports require `admin`; the service-role key is only used
//! by the user-management endpoints.
//!
//! ## Reports
//!
//! Eight aggregate procedures are called concurrently for a date range. Each
//! one becomes an independent panel so a single failure never hides the rest.
//! The same set can be exported as a PDF.

pub mod api;
pub mod backend;
pub mod cli;
pub mod domain;
pub mod reports;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
