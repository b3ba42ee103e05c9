//! Customer domain types.

use chrono::{DateTime, Utc};

use slate_core::CustomerId;

/// A commerce customer (domain type).
///
/// Wraps the requesting identity with commerce-specific fields. Created on
/// the first commerce interaction of a session; the session keeps the
/// customer id so later requests resolve the same cart.
#[derive(Debug, Clone)]
pub struct Customer {
    /// Unique customer ID.
    pub id: CustomerId,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Shipping address.
    pub address: Option<String>,
    /// When the customer record was created.
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new customer.
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub phone: Option<String>,
    pub address: Option<String>,
}
