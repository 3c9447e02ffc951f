//! Profit-compounding allocation.
//!
//! The position's initial margin is split into intervals. Each interval's
//! profit is rolled into the next step: the margin a step ties up at its price
//! buys the quantity of the following step, one percent target further out.
//! The take-profit ladder goes on the side that closes the position; the slow
//! market ladder goes on the side that adds to it and is truncated so the
//! position can never grow past the configured maximum.

use crate::error::{require_positive, LadderError, LadderResult};
use crate::types::{Direction, Ladder, LadderStep, PositionSnapshot};
use crate::valuation::{initial_margin, profit_quantity, valuate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A compounding ladder stops once less than this much quantity remains.
pub const REMAINING_QUANTITY_EPSILON: Decimal = dec!(0.005);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationParams {
    /// Fraction of initial margin targeted per full cycle (0.04 = 4%).
    pub exit_percent: Decimal,
    pub take_profit_interval: u32,
    pub slow_market_interval: u32,
    /// Hard cap on total position quantity.
    pub max_quantity: Decimal,
    /// Guard against compounding ladders that never reach the epsilon.
    pub max_steps: usize,
}

impl Default for AllocationParams {
    fn default() -> Self {
        Self {
            exit_percent: dec!(0.04),
            take_profit_interval: 4,
            slow_market_interval: 4,
            max_quantity: dec!(5),
            max_steps: 1_000,
        }
    }
}

impl AllocationParams {
    pub fn validate(&self) -> LadderResult<()> {
        require_positive("exit_percent", self.exit_percent)?;
        require_positive("max_quantity", self.max_quantity)?;
        if self.take_profit_interval == 0 {
            return Err(LadderError::invalid("take_profit_interval", "must be at least 1"));
        }
        if self.slow_market_interval == 0 {
            return Err(LadderError::invalid("slow_market_interval", "must be at least 1"));
        }
        if self.max_steps == 0 {
            return Err(LadderError::invalid("max_steps", "must be at least 1"));
        }
        Ok(())
    }
}

/// Compounding steps walking away from entry in `direction` (Long walks up).
#[derive(Debug, Clone)]
pub struct CompoundingSteps {
    percent: Decimal,
    leverage: Decimal,
    direction: Direction,
    price: Decimal,
    quantity: Decimal,
    remaining: Decimal,
    emitted: usize,
    max_steps: usize,
    failed: bool,
}

impl CompoundingSteps {
    pub fn new(
        percent: Decimal,
        snapshot: &PositionSnapshot,
        budget: Decimal,
        direction: Direction,
        max_steps: usize,
    ) -> LadderResult<Self> {
        let start = valuate(percent, snapshot.entry_price(), snapshot.leverage(), snapshot.quantity())?;
        let first_price = start.price_for(direction);
        if first_price <= Decimal::ZERO {
            return Err(LadderError::invalid(
                "exit_percent",
                format!("first compounding price is {first_price}"),
            ));
        }

        Ok(Self {
            percent,
            leverage: snapshot.leverage(),
            direction,
            price: snapshot.entry_price(),
            quantity: profit_quantity(budget, first_price, snapshot.leverage())?,
            remaining: snapshot.quantity(),
            emitted: 0,
            max_steps,
            failed: false,
        })
    }

    fn advance(&mut self) -> LadderResult<LadderStep> {
        if self.emitted >= self.max_steps {
            return Err(LadderError::NonConvergent { steps: self.emitted });
        }
        let valuation = valuate(self.percent, self.price, self.leverage, self.quantity)?;
        let next_price = valuation.price_for(self.direction);
        if next_price <= Decimal::ZERO {
            return Err(LadderError::invalid(
                "exit_percent",
                format!("compounding price reached {next_price}"),
            ));
        }

        let step = LadderStep::new(next_price, self.quantity, self.leverage)?;
        self.price = next_price;
        self.quantity = profit_quantity(valuation.notional, next_price, self.leverage)?;
        self.remaining -= self.quantity;
        self.emitted += 1;
        Ok(step)
    }
}

impl Iterator for CompoundingSteps {
    type Item = LadderResult<LadderStep>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining <= REMAINING_QUANTITY_EPSILON {
            return None;
        }
        let result = self.advance();
        self.failed = result.is_err();
        Some(result)
    }
}

fn compounding_ladder(
    snapshot: &PositionSnapshot,
    params: &AllocationParams,
    margin: Decimal,
    interval: u32,
    direction: Direction,
) -> LadderResult<Vec<LadderStep>> {
    let intervals = Decimal::from(interval);
    CompoundingSteps::new(
        params.exit_percent / intervals,
        snapshot,
        margin / intervals,
        direction,
        params.max_steps,
    )?
    .collect()
}

// appends slow-market steps while the position stays within max_quantity
fn cap_to_max_quantity(steps: Vec<LadderStep>, held: Decimal, max_quantity: Decimal) -> Vec<LadderStep> {
    let mut running = held;
    let mut kept = Vec::with_capacity(steps.len());
    for step in steps {
        if running + step.quantity > max_quantity {
            debug!(
                running = %running,
                next = %step.quantity,
                max = %max_quantity,
                "slow market ladder truncated at max quantity"
            );
            break;
        }
        running += step.quantity;
        kept.push(step);
    }
    kept
}

pub fn allocate(snapshot: &PositionSnapshot, params: &AllocationParams) -> LadderResult<Ladder> {
    params.validate()?;
    require_positive("quantity", snapshot.quantity())?;

    let margin = initial_margin(snapshot.entry_price(), snapshot.quantity(), snapshot.leverage())?;
    let (ascending_interval, descending_interval) = match snapshot.direction() {
        Direction::Long => (params.take_profit_interval, params.slow_market_interval),
        Direction::Short => (params.slow_market_interval, params.take_profit_interval),
    };

    let ascending = compounding_ladder(snapshot, params, margin, ascending_interval, Direction::Long)?;
    let descending = compounding_ladder(snapshot, params, margin, descending_interval, Direction::Short)?;

    let ladder = match snapshot.direction() {
        Direction::Long => Ladder::new(
            cap_to_max_quantity(descending, snapshot.quantity(), params.max_quantity),
            ascending,
        ),
        Direction::Short => Ladder::new(
            descending,
            cap_to_max_quantity(ascending, snapshot.quantity(), params.max_quantity),
        ),
    };
    Ok(ladder)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_snapshot() -> PositionSnapshot {
        PositionSnapshot::new(dec!(30000), dec!(10), dec!(1), Direction::Long).unwrap()
    }

    #[test]
    fn first_compounding_step() {
        // 4 intervals of 4%: 1% per step, 750 of margin per interval
        let steps: Vec<LadderStep> = CompoundingSteps::new(dec!(0.01), &long_snapshot(), dec!(750), Direction::Long, 100)
            .unwrap()
            .collect::<LadderResult<_>>()
            .unwrap();
        assert!((steps[0].price - dec!(30030)).abs() < dec!(0.000001));
        assert_eq!(steps[0].quantity, dec!(750) * dec!(10) / dec!(30030));
        assert!(steps.windows(2).all(|w| w[1].price > w[0].price));
        // remaining started at 1 and each later step eats about 0.25
        assert!(steps.len() >= 4 && steps.len() <= 6);
    }

    #[test]
    fn long_allocation_sides() {
        let ladder = allocate(&long_snapshot(), &AllocationParams::default()).unwrap();
        assert!(!ladder.sells.is_empty());
        assert!(!ladder.buys.is_empty());
        assert!(ladder.sells.iter().all(|s| s.price > dec!(30000)));
        assert!(ladder.buys.iter().all(|s| s.price < dec!(30000)));
        assert!(ladder.total_buy_quantity() + dec!(1) <= dec!(5));
    }

    #[test]
    fn short_allocation_mirrors() {
        let snap = PositionSnapshot::new(dec!(30000), dec!(10), dec!(1), Direction::Short).unwrap();
        let ladder = allocate(&snap, &AllocationParams::default()).unwrap();
        assert!(ladder.buys.windows(2).all(|w| w[1].price < w[0].price));
        assert!(ladder.sells.windows(2).all(|w| w[1].price > w[0].price));
        assert!(ladder.total_sell_quantity() + dec!(1) <= dec!(5));
    }

    #[test]
    fn cap_truncates_slow_side() {
        let params = AllocationParams {
            max_quantity: dec!(1.3),
            ..AllocationParams::default()
        };
        let ladder = allocate(&long_snapshot(), &params).unwrap();
        // each slow step is about 0.25, so only one fits under 1.3
        assert_eq!(ladder.buys.len(), 1);

        let tight = AllocationParams {
            max_quantity: dec!(1),
            ..AllocationParams::default()
        };
        let ladder = allocate(&long_snapshot(), &tight).unwrap();
        assert!(ladder.buys.is_empty());
        assert!(!ladder.sells.is_empty());
    }

    #[test]
    fn cap_helper_stops_at_first_overflow() {
        let steps = vec![
            LadderStep::new(dec!(99), dec!(1), dec!(1)).unwrap(),
            LadderStep::new(dec!(98), dec!(2), dec!(1)).unwrap(),
            LadderStep::new(dec!(97), dec!(0.5), dec!(1)).unwrap(),
        ];
        let kept = cap_to_max_quantity(steps, dec!(1), dec!(3.5));
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn flat_position_rejected() {
        let flat = PositionSnapshot::new(dec!(30000), dec!(10), Decimal::ZERO, Direction::Long).unwrap();
        assert!(matches!(
            allocate(&flat, &AllocationParams::default()),
            Err(LadderError::InvalidParameter { name: "quantity", .. })
        ));
    }

    #[test]
    fn divergent_allocation_rejected() {
        // exit percent far above leverage: the compounding series never eats the position
        let snap = PositionSnapshot::new(dec!(30000), dec!(1), dec!(1), Direction::Long).unwrap();
        let params = AllocationParams {
            exit_percent: dec!(40),
            ..AllocationParams::default()
        };
        assert!(allocate(&snap, &params).is_err());
    }

    #[test]
    fn step_guard_trips() {
        let params = AllocationParams {
            max_steps: 2,
            ..AllocationParams::default()
        };
        assert_eq!(
            allocate(&long_snapshot(), &params),
            Err(LadderError::NonConvergent { steps: 2 })
        );
    }
}
