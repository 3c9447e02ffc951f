// 2.0: position valuation. the price at which a given percent of the position's
// margin is made (bull) or lost (bear). everything that walks a price ladder
// by profit target goes through valuate().

use crate::error::{checked, require_positive, LadderResult};
use crate::types::Direction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valuation {
    pub bull_price: Decimal,
    pub bear_price: Decimal,
    pub notional: Decimal,
    pub target_pnl: Decimal,
}

impl Valuation {
    // longs take profit on the way up, shorts on the way down
    pub fn price_for(&self, direction: Direction) -> Decimal {
        match direction {
            Direction::Long => self.bull_price,
            Direction::Short => self.bear_price,
        }
    }
}

pub fn valuate(
    target_percent: Decimal,
    entry_price: Decimal,
    leverage: Decimal,
    quantity: Decimal,
) -> LadderResult<Valuation> {
    require_positive("entry_price", entry_price)?;
    require_positive("leverage", leverage)?;
    require_positive("quantity", quantity)?;

    let margin_per_unit = checked(entry_price.checked_div(leverage), "valuation margin")?;
    let notional = checked(margin_per_unit.checked_mul(quantity), "valuation notional")?;
    let target_pnl = checked(notional.checked_mul(target_percent), "valuation pnl")?;
    let per_unit_move = checked(target_pnl.checked_div(quantity), "valuation move")?;

    Ok(Valuation {
        bull_price: checked(entry_price.checked_add(per_unit_move), "valuation bull price")?,
        bear_price: checked(entry_price.checked_sub(per_unit_move), "valuation bear price")?,
        notional,
        target_pnl,
    })
}

// 2.1: margin locked by a position at entry
pub fn initial_margin(entry_price: Decimal, quantity: Decimal, leverage: Decimal) -> LadderResult<Decimal> {
    require_positive("leverage", leverage)?;
    let gross = checked(entry_price.checked_mul(quantity), "initial margin")?;
    checked(gross.checked_div(leverage), "initial margin")
}

// 2.2: quantity whose margin at exit_price equals pnl
pub fn profit_quantity(pnl: Decimal, exit_price: Decimal, leverage: Decimal) -> LadderResult<Decimal> {
    require_positive("exit_price", exit_price)?;
    let levered = checked(pnl.checked_mul(leverage), "profit quantity")?;
    checked(levered.checked_div(exit_price), "profit quantity")
}
