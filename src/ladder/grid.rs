// 4.3: range/interval grid. sizes the per-step quantity from how much of the
// run range the grid has to cover, then hands off to the pair generator.

use super::pair::{generate_pair, PairParams};
use crate::error::{require_positive, LadderError, LadderResult};
use crate::types::{Ladder, PositionSnapshot};
use crate::valuation::valuate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridParams {
    /// Price distance the grid is expected to cover (e.g. 8600 to 9600 is 1000).
    pub run_range: Decimal,
    /// Price distance between resting orders.
    pub interval: Decimal,
    /// Most coins the grid may ever hold.
    pub maximum_quantity: Decimal,
    /// Fraction of margin used to value the position against the maximum.
    pub take_profit: Decimal,
    /// Orders per side.
    pub pair_count: usize,
    pub reduce_multiplier: Decimal,
    pub spread_multiplier: Decimal,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            run_range: dec!(1000),
            interval: dec!(50),
            maximum_quantity: dec!(6),
            take_profit: dec!(2),
            pair_count: 4,
            reduce_multiplier: dec!(2),
            spread_multiplier: Decimal::ONE,
        }
    }
}

impl GridParams {
    pub fn validate(&self) -> LadderResult<()> {
        require_positive("run_range", self.run_range)?;
        require_positive("interval", self.interval)?;
        require_positive("maximum_quantity", self.maximum_quantity)?;
        require_positive("take_profit", self.take_profit)?;
        require_positive("reduce_multiplier", self.reduce_multiplier)?;
        require_positive("spread_multiplier", self.spread_multiplier)?;
        if self.pair_count == 0 {
            return Err(LadderError::invalid("pair_count", "must be at least 1"));
        }
        Ok(())
    }

    // small positions get three times the base step so they reach size quickly
    fn step_quantity(&self, snapshot: &PositionSnapshot) -> LadderResult<Decimal> {
        let minimum_trades = self.run_range / self.interval;
        let base = self.maximum_quantity / minimum_trades;

        let position_value = if snapshot.is_flat() {
            Decimal::ZERO
        } else {
            valuate(self.take_profit, snapshot.entry_price(), snapshot.leverage(), snapshot.quantity())?.notional
        };
        let maximum_value = valuate(
            self.take_profit,
            snapshot.entry_price(),
            snapshot.leverage(),
            self.maximum_quantity,
        )?
        .notional;

        if position_value < maximum_value / Decimal::from(self.pair_count) {
            Ok(base * dec!(3))
        } else {
            Ok(base)
        }
    }
}

pub fn build_grid(
    snapshot: &PositionSnapshot,
    current_price: Option<Decimal>,
    params: &GridParams,
) -> LadderResult<Ladder> {
    params.validate()?;
    let step_quantity = params.step_quantity(snapshot)?;

    // below half size the grid stays on the entry instead of chasing the market
    let last_fill_price = if snapshot.quantity() < params.maximum_quantity / dec!(2) {
        None
    } else {
        current_price
    };

    generate_pair(&PairParams {
        anchor_price: snapshot.entry_price(),
        last_fill_price,
        step_size: params.interval,
        spread_multiplier: params.spread_multiplier,
        multiplier: Decimal::ONE,
        step_quantity,
        leverage: snapshot.leverage(),
        quantity_cap: params.maximum_quantity,
        current_quantity: snapshot.quantity(),
        pair_count: params.pair_count,
        reduce_multiplier: params.reduce_multiplier,
        direction: snapshot.direction(),
    })
}
