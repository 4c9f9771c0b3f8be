pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod ledger;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{Circle, CircleId, Currency, Decimal, Sell, TelegramId, UserId};
pub use error::AppError;
pub use ledger::{Ledger, LedgerError};
