//! Domain types for the circle ledger.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper
//! - Identifier and code primitives: UserId, CircleId, SellId, TelegramId, Currency
//! - Circle and Sell rows, and the sell arithmetic that keeps a circle consistent

pub mod circle;
pub mod decimal;
pub mod primitives;
pub mod sell;

pub use circle::{Circle, NewCircle, SellRejection};
pub use decimal::Decimal;
pub use primitives::{
    CircleId, Currency, PrimitiveParseError, RawTelegramId, SellId, TelegramId, UserId,
};
pub use sell::{Sell, SellInput};
