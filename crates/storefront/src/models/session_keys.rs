//! Keys for values stored in the tower-sessions session.

/// Session key for the commerce customer id.
///
/// Set on first commerce interaction (when the customer record is created)
/// and used to resolve the customer's cart on every later request.
pub const CUSTOMER_ID: &str = "customer_id";
