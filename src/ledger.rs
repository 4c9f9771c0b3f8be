//! Ledger service: validates client input and drives the repository.

use crate::db::{Repository, SellOutcome};
use crate::domain::{
    Circle, CircleId, Currency, Decimal, NewCircle, RawTelegramId, Sell, SellInput, UserId,
};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),
    #[error("Circle not found: {0}")]
    CircleNotFound(CircleId),
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

/// Client request to open a circle. Every field is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CircleDraft {
    pub user_id: Option<i64>,
    pub currency: Option<String>,
    pub buy_rub: Option<Decimal>,
    pub buy_price: Option<Decimal>,
}

/// Client request to sell part of a circle. `note` is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SellDraft {
    pub qty: Option<Decimal>,
    pub price: Option<Decimal>,
    pub rub: Option<Decimal>,
    pub note: Option<String>,
}

#[derive(Clone)]
pub struct Ledger {
    repo: Arc<Repository>,
}

impl Ledger {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Resolve a Telegram id to the internal user id, creating the user on
    /// first sight.
    pub async fn get_or_create_user(
        &self,
        telegram_id: Option<&RawTelegramId>,
    ) -> Result<UserId, LedgerError> {
        let telegram_id = telegram_id
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| LedgerError::Validation("telegram_id required".into()))?;

        let (user_id, _created) = self.repo.get_or_create_user(&telegram_id).await?;
        Ok(user_id)
    }

    pub async fn list_circles(&self, user_id: UserId) -> Result<Vec<Circle>, LedgerError> {
        Ok(self.repo.list_circles(user_id).await?)
    }

    /// A circle with its sells, oldest sell first.
    pub async fn circle_with_sells(
        &self,
        circle_id: CircleId,
    ) -> Result<(Circle, Vec<Sell>), LedgerError> {
        let circle = self
            .repo
            .get_circle(circle_id)
            .await?
            .ok_or(LedgerError::CircleNotFound(circle_id))?;
        let sells = self.repo.list_sells(circle_id).await?;
        Ok((circle, sells))
    }

    pub async fn create_circle(&self, draft: CircleDraft) -> Result<Circle, LedgerError> {
        let new = validate_circle(draft)?;

        match self.repo.insert_circle(new).await {
            Ok(circle) => Ok(circle),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(LedgerError::Validation("Unknown user_id".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Record a sell and return the circle as updated by it.
    pub async fn record_sell(
        &self,
        circle_id: CircleId,
        draft: SellDraft,
    ) -> Result<Circle, LedgerError> {
        let sell = validate_sell(draft)?;

        match self.repo.record_sell(circle_id, &sell).await? {
            SellOutcome::Recorded(circle) => Ok(circle),
            SellOutcome::NotFound => Err(LedgerError::CircleNotFound(circle_id)),
            SellOutcome::Rejected(rejection) => Err(LedgerError::Validation(rejection.to_string())),
        }
    }

    /// Delete a circle and its sells. Deleting an unknown id succeeds.
    pub async fn delete_circle(&self, circle_id: CircleId) -> Result<(), LedgerError> {
        self.repo.delete_circle(circle_id).await?;
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), LedgerError> {
        Ok(self.repo.ping().await?)
    }
}

fn require_positive(name: &str, value: Decimal) -> Result<Decimal, LedgerError> {
    if value.is_positive() {
        Ok(value)
    } else {
        Err(LedgerError::Validation(format!("{} must be positive", name)))
    }
}

fn validate_circle(draft: CircleDraft) -> Result<NewCircle, LedgerError> {
    let missing = || LedgerError::Validation("Missing required fields".into());

    let user_id = draft.user_id.ok_or_else(missing)?;
    let currency = draft
        .currency
        .as_deref()
        .and_then(|c| Currency::from_str(c).ok())
        .ok_or_else(missing)?;
    let buy_rub = draft.buy_rub.ok_or_else(missing)?;
    let buy_price = draft.buy_price.ok_or_else(missing)?;

    if user_id <= 0 {
        return Err(LedgerError::Validation("user_id must be positive".into()));
    }
    let buy_rub = require_positive("buy_rub", buy_rub)?;
    let buy_price = require_positive("buy_price", buy_price)?;

    NewCircle::open(UserId(user_id), currency, buy_rub, buy_price)
        .ok_or_else(|| LedgerError::Validation("buy_rub / buy_price is out of range".into()))
}

/// Only presence is checked here; amount checks belong to the circle so that
/// a missing or closed circle is reported first.
fn validate_sell(draft: SellDraft) -> Result<SellInput, LedgerError> {
    match (draft.qty, draft.price, draft.rub) {
        (Some(qty), Some(price), Some(rub)) => Ok(SellInput {
            qty,
            price,
            rub,
            note: draft.note.unwrap_or_default(),
        }),
        _ => Err(LedgerError::Validation("Missing sell data".into())),
    }
}
