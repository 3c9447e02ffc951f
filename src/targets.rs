// 5.5: single-order targets. one take-profit for an interval's profit, one
// add-on order sized from profit, and the fixed half/full take-profit plan
// placed around a fresh entry.

use crate::error::{require_positive, LadderError, LadderResult};
use crate::types::{Direction, Ladder, LadderStep, PositionSnapshot};
use crate::valuation::{profit_quantity, valuate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeProfitParams {
    /// Fraction of margin for the full target; the half target uses half of it.
    pub percent: Decimal,
    /// Quantity the plan is sized on. Each target order carries half.
    pub budget: Decimal,
}

impl Default for TakeProfitParams {
    fn default() -> Self {
        Self {
            percent: Decimal::ONE,
            budget: dec!(0.2),
        }
    }
}

impl TakeProfitParams {
    pub fn validate(&self) -> LadderResult<()> {
        require_positive("percent", self.percent)?;
        require_positive("budget", self.budget)?;
        Ok(())
    }
}

fn on_profit_side(direction: Direction, entry_price: Decimal, exit_price: Decimal) -> bool {
    match direction {
        Direction::Long => exit_price > entry_price,
        Direction::Short => exit_price < entry_price,
    }
}

/// Closing order that banks `pnl` at `exit_price`. None when the exit is not
/// on the profit side or the order would close the whole position.
pub fn interval_take_profit(
    snapshot: &PositionSnapshot,
    exit_price: Decimal,
    pnl: Decimal,
) -> LadderResult<Option<Ladder>> {
    require_positive("pnl", pnl)?;
    let quantity = profit_quantity(pnl, exit_price, snapshot.leverage())?;

    if !on_profit_side(snapshot.direction(), snapshot.entry_price(), exit_price) {
        debug!(direction = %snapshot.direction(), exit = %exit_price, "take profit skipped, exit on losing side");
        return Ok(None);
    }
    if quantity >= snapshot.quantity() {
        debug!(quantity = %quantity, held = %snapshot.quantity(), "take profit skipped, would close position");
        return Ok(None);
    }

    let step = LadderStep::new(exit_price, quantity, snapshot.leverage())?;
    Ok(Some(Ladder::one_sided(snapshot.direction().opposite(), vec![step])))
}

/// Order adding to the position at `entry_price`, sized from `pnl`. Doubled while
/// the position is under half of `max_quantity`; None once it is at the cap.
pub fn increase_position(
    snapshot: &PositionSnapshot,
    entry_price: Decimal,
    pnl: Decimal,
    max_quantity: Decimal,
) -> LadderResult<Option<Ladder>> {
    require_positive("pnl", pnl)?;
    require_positive("max_quantity", max_quantity)?;
    if snapshot.quantity() >= max_quantity {
        debug!(held = %snapshot.quantity(), max = %max_quantity, "increase skipped, position at max quantity");
        return Ok(None);
    }

    let mut quantity = profit_quantity(pnl, entry_price, snapshot.leverage())?;
    if snapshot.quantity() < max_quantity / dec!(2) {
        quantity *= dec!(2);
    }

    let step = LadderStep::new(entry_price, quantity, snapshot.leverage())?;
    Ok(Some(Ladder::one_sided(snapshot.direction(), vec![step])))
}

/// Two take-profits at the half and full target, two add-on orders at the
/// mirrored prices, plus the entry order itself when nothing is held yet.
pub fn take_profit_plan(
    direction: Direction,
    entry_price: Decimal,
    leverage: Decimal,
    params: &TakeProfitParams,
    holding: bool,
) -> LadderResult<Ladder> {
    params.validate()?;
    let half = valuate(params.percent / dec!(2), entry_price, leverage, params.budget)?;
    let full = valuate(params.percent, entry_price, leverage, params.budget)?;

    let against = direction.opposite();
    let add_prices = [half.price_for(against), full.price_for(against)];
    if add_prices.iter().any(|p| *p <= Decimal::ZERO) {
        return Err(LadderError::invalid(
            "percent",
            format!("add-on price {} is not positive", full.price_for(against)),
        ));
    }

    let half_budget = params.budget / dec!(2);
    let closes = [half.price_for(direction), full.price_for(direction)]
        .into_iter()
        .map(|price| LadderStep::new(price, half_budget, leverage))
        .collect::<LadderResult<Vec<_>>>()?;

    let mut adds = Vec::with_capacity(3);
    if !holding {
        adds.push(LadderStep::new(entry_price, params.budget, leverage)?);
    }
    for price in add_prices {
        adds.push(LadderStep::new(price, half_budget, leverage)?);
    }

    Ok(match direction {
        Direction::Long => Ladder::new(adds, closes),
        Direction::Short => Ladder::new(closes, adds),
    })
}
