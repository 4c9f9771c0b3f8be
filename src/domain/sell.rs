//! Sell: one partial or full liquidation recorded against a circle.

use crate::domain::{CircleId, Decimal, SellId};
use serde::Serialize;

/// Validated input for a sell. `note` is empty when the client sent none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellInput {
    pub qty: Decimal,
    pub price: Decimal,
    pub rub: Decimal,
    pub note: String,
}

/// A stored sell row. Never updated after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sell {
    pub id: SellId,
    pub circle_id: CircleId,
    pub qty: Decimal,
    pub price: Decimal,
    pub rub: Decimal,
    pub note: String,
    /// Milliseconds since Unix epoch.
    pub created_at: i64,
}
