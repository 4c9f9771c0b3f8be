//! Domain primitives: row identifiers, TelegramId, Currency.

use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Internal user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// Circle identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CircleId(pub i64);

impl CircleId {
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for CircleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sell identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SellId(pub i64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimitiveParseError {
    #[error("telegram_id must not be empty")]
    EmptyTelegramId,
    #[error("currency must not be empty")]
    EmptyCurrency,
}

/// External user identifier issued by Telegram.
///
/// Clients send it either as a JSON string or as an integer; both are kept as
/// the trimmed decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TelegramId(String);

impl TelegramId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TelegramId {
    type Err = PrimitiveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PrimitiveParseError::EmptyTelegramId);
        }
        Ok(TelegramId(trimmed.to_string()))
    }
}

impl std::fmt::Display for TelegramId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw wire form of a telegram id before validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawTelegramId {
    Number(i64),
    Text(String),
}

impl RawTelegramId {
    pub fn parse(&self) -> Result<TelegramId, PrimitiveParseError> {
        match self {
            RawTelegramId::Number(n) => TelegramId::from_str(&n.to_string()),
            RawTelegramId::Text(s) => TelegramId::from_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for TelegramId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawTelegramId::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// Currency code (e.g., "USD", "EUR"), stored upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Wrap an already-normalized code, e.g. one read back from storage.
    pub fn new(code: String) -> Self {
        Currency(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Currency {
    type Err = PrimitiveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PrimitiveParseError::EmptyCurrency);
        }
        Ok(Currency(trimmed.to_uppercase()))
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
