//! Circle: one buy-then-sell trading position.

use crate::domain::{CircleId, Currency, Decimal, SellInput, UserId};
use serde::Serialize;
use thiserror::Error;

/// A sell can be refused by the circle's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SellRejection {
    #[error("Circle is closed")]
    Closed,
    #[error("{0} must be positive")]
    NotPositive(&'static str),
    #[error("Sell qty exceeds remaining qty")]
    ExceedsRemaining,
    #[error("{0} is out of range")]
    OutOfRange(&'static str),
}

/// Fields of a circle before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCircle {
    pub user_id: UserId,
    pub currency: Currency,
    pub buy_rub: Decimal,
    pub buy_price: Decimal,
    pub buy_qty: Decimal,
}

impl NewCircle {
    /// Open a position by spending `buy_rub` at `buy_price` per unit.
    ///
    /// Returns `None` when `buy_price` is zero.
    pub fn open(
        user_id: UserId,
        currency: Currency,
        buy_rub: Decimal,
        buy_price: Decimal,
    ) -> Option<Self> {
        let buy_qty = buy_rub.checked_div(buy_price)?;
        Some(NewCircle {
            user_id,
            currency,
            buy_rub,
            buy_price,
            buy_qty,
        })
    }
}

/// A stored circle row.
///
/// `remaining_qty + sell_qty == buy_qty` holds after every accepted sell, and
/// `closed` is set exactly when `remaining_qty <= 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Circle {
    pub id: CircleId,
    pub user_id: UserId,
    pub currency: Currency,
    pub buy_rub: Decimal,
    pub buy_price: Decimal,
    pub buy_qty: Decimal,
    pub remaining_qty: Decimal,
    pub sell_qty: Decimal,
    pub sell_rub: Decimal,
    pub closed: bool,
    /// Milliseconds since Unix epoch.
    pub created_at: i64,
}

impl Circle {
    /// Materialize a freshly inserted circle: nothing sold yet.
    pub fn from_new(id: CircleId, new: NewCircle, created_at: i64) -> Self {
        Circle {
            id,
            user_id: new.user_id,
            currency: new.currency,
            buy_rub: new.buy_rub,
            buy_price: new.buy_price,
            buy_qty: new.buy_qty,
            remaining_qty: new.buy_qty,
            sell_qty: Decimal::zero(),
            sell_rub: Decimal::zero(),
            closed: false,
            created_at,
        }
    }

    /// Apply a sell to the circle.
    ///
    /// Checks run in order: closed, positive amounts, remaining quantity,
    /// arithmetic range. A rejected sell leaves the circle untouched.
    pub fn apply_sell(&mut self, sell: &SellInput) -> Result<(), SellRejection> {
        if self.closed {
            return Err(SellRejection::Closed);
        }
        for (name, value) in [("qty", sell.qty), ("price", sell.price), ("rub", sell.rub)] {
            if !value.is_positive() {
                return Err(SellRejection::NotPositive(name));
            }
        }
        if sell.qty > self.remaining_qty {
            return Err(SellRejection::ExceedsRemaining);
        }

        let remaining_qty = self
            .remaining_qty
            .checked_sub(sell.qty)
            .ok_or(SellRejection::OutOfRange("remaining_qty"))?;
        let sell_qty = self
            .sell_qty
            .checked_add(sell.qty)
            .ok_or(SellRejection::OutOfRange("sell_qty"))?;
        let sell_rub = self
            .sell_rub
            .checked_add(sell.rub)
            .ok_or(SellRejection::OutOfRange("sell_rub"))?;

        self.remaining_qty = remaining_qty;
        self.sell_qty = sell_qty;
        self.sell_rub = sell_rub;
        self.closed = remaining_qty <= Decimal::zero();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sell(qty: &str, rub: &str) -> SellInput {
        SellInput {
            qty: dec(qty),
            price: dec("100"),
            rub: dec(rub),
            note: String::new(),
        }
    }

    fn circle(buy_rub: &str, buy_price: &str) -> Circle {
        let new = NewCircle::open(
            UserId(1),
            Currency::from_str("usd").unwrap(),
            dec(buy_rub),
            dec(buy_price),
        )
        .unwrap();
        Circle::from_new(CircleId(1), new, 0)
    }

    #[test]
    fn test_open_computes_buy_qty() {
        let c = circle("1000", "100");
        assert_eq!(c.buy_qty, dec("10"));
        assert_eq!(c.remaining_qty, dec("10"));
        assert_eq!(c.sell_qty, Decimal::zero());
        assert_eq!(c.sell_rub, Decimal::zero());
        assert!(!c.closed);
    }

    #[test]
    fn test_open_rejects_zero_price() {
        let new = NewCircle::open(
            UserId(1),
            Currency::from_str("usd").unwrap(),
            dec("1000"),
            Decimal::zero(),
        );
        assert!(new.is_none());
    }

    #[test]
    fn test_partial_then_full_sell_closes() {
        let mut c = circle("1000", "100");

        c.apply_sell(&sell("6", "660")).unwrap();
        assert_eq!(c.remaining_qty, dec("4"));
        assert_eq!(c.sell_qty, dec("6"));
        assert_eq!(c.sell_rub, dec("660"));
        assert!(!c.closed);

        c.apply_sell(&sell("4", "480")).unwrap();
        assert_eq!(c.remaining_qty, Decimal::zero());
        assert_eq!(c.sell_qty, dec("10"));
        assert_eq!(c.sell_rub, dec("1140"));
        assert!(c.closed);

        assert_eq!(
            c.apply_sell(&sell("1", "100")),
            Err(SellRejection::Closed)
        );
    }

    #[test]
    fn test_oversell_is_rejected_without_change() {
        let mut c = circle("1000", "100");
        let before = c.clone();

        assert_eq!(
            c.apply_sell(&sell("10.0001", "1000")),
            Err(SellRejection::ExceedsRemaining)
        );
        assert_eq!(c, before);
    }

    #[test]
    fn test_closed_check_precedes_quantity_check() {
        let mut c = circle("1000", "100");
        c.apply_sell(&sell("10", "1000")).unwrap();
        assert_eq!(
            c.apply_sell(&sell("500", "1")),
            Err(SellRejection::Closed)
        );
    }

    #[test]
    fn test_remaining_plus_sold_equals_bought() {
        let mut c = circle("1000", "3");
        for (qty, rub) in [("100", "310"), ("33.3", "105"), ("0.0001", "1")] {
            c.apply_sell(&sell(qty, rub)).unwrap();
            assert_eq!(c.remaining_qty + c.sell_qty, c.buy_qty);
        }
        assert!(!c.closed);
    }

    #[test]
    fn test_non_positive_amounts_rejected_after_closed_check() {
        let mut c = circle("1000", "100");
        assert_eq!(
            c.apply_sell(&sell("-1", "100")),
            Err(SellRejection::NotPositive("qty"))
        );
        assert_eq!(
            c.apply_sell(&sell("1", "0")),
            Err(SellRejection::NotPositive("rub"))
        );

        c.apply_sell(&sell("10", "1000")).unwrap();
        assert_eq!(
            c.apply_sell(&sell("-1", "100")),
            Err(SellRejection::Closed)
        );
    }

    #[test]
    fn test_proceeds_overflow_is_rejected_without_change() {
        let mut c = circle("1000", "100");
        let max = "79228162514264337593543950335";
        c.apply_sell(&sell("1", max)).unwrap();
        let before = c.clone();

        assert_eq!(
            c.apply_sell(&sell("1", max)),
            Err(SellRejection::OutOfRange("sell_rub"))
        );
        assert_eq!(c, before);
        assert_eq!(
            SellRejection::OutOfRange("sell_rub").to_string(),
            "sell_rub is out of range"
        );
    }
}
