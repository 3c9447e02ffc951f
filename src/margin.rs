//! Maintenance margin brackets.
//!
//! The exchange charges a maintenance rate that steps up as the position's
//! notional grows. Each bracket covers a half-open notional range and carries a
//! base amount that keeps the piecewise-linear maintenance amount continuous at
//! the breakpoints.
//!
//! Notional above the last bracket has no defined rate and is rejected rather
//! than extrapolated.

use crate::error::{LadderError, LadderResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginBracket {
    /// Inclusive lower bound of the notional range.
    pub floor: Decimal,
    /// Exclusive upper bound of the notional range.
    pub ceiling: Decimal,
    /// Maintenance margin rate (0.004 = 0.4%).
    pub rate: Decimal,
    /// Rate increase over the previous bracket.
    pub rate_step: Decimal,
    /// Fixed offset added to the maintenance amount.
    pub base_amount: Decimal,
}

impl MarginBracket {
    pub fn contains(&self, notional: Decimal) -> bool {
        notional >= self.floor && notional < self.ceiling
    }

    pub fn maintenance_amount(&self, notional: Decimal) -> Decimal {
        notional * self.rate_step + self.base_amount
    }

    pub fn maintenance_margin(&self, notional: Decimal) -> Decimal {
        notional * self.rate
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginTable {
    pub brackets: Vec<MarginBracket>,
}

impl Default for MarginTable {
    fn default() -> Self {
        Self {
            brackets: vec![
                MarginBracket {
                    floor: Decimal::ZERO,
                    ceiling: dec!(50_000),
                    rate: dec!(0.004),
                    rate_step: dec!(0.004),
                    base_amount: Decimal::ZERO,
                },
                MarginBracket {
                    floor: dec!(50_000),
                    ceiling: dec!(250_000),
                    rate: dec!(0.005),
                    rate_step: dec!(0.001),
                    base_amount: dec!(50),
                },
                MarginBracket {
                    floor: dec!(250_000),
                    ceiling: dec!(1_000_000),
                    rate: dec!(0.01),
                    rate_step: dec!(0.005),
                    base_amount: dec!(1_300),
                },
                MarginBracket {
                    floor: dec!(1_000_000),
                    ceiling: dec!(5_000_000),
                    rate: dec!(0.025),
                    rate_step: dec!(0.015),
                    base_amount: dec!(16_300),
                },
            ],
        }
    }
}

impl MarginTable {
    pub fn lookup(&self, notional: Decimal) -> LadderResult<MarginBracket> {
        if notional >= self.max_notional() {
            return Err(LadderError::OutOfRange { notional });
        }
        self.brackets
            .iter()
            .find(|b| b.contains(notional))
            .copied()
            .ok_or(LadderError::OutOfRange { notional })
    }

    /// Brackets must start at zero, be ordered, and leave no gaps or overlaps.
    pub fn validate(&self) -> LadderResult<()> {
        let Some(first) = self.brackets.first() else {
            return Err(LadderError::invalid("margin_table", "no brackets"));
        };
        if !first.floor.is_zero() {
            return Err(LadderError::invalid("margin_table", "first bracket must start at 0"));
        }
        for bracket in &self.brackets {
            if bracket.ceiling <= bracket.floor {
                return Err(LadderError::invalid(
                    "margin_table",
                    format!("empty bracket [{}, {})", bracket.floor, bracket.ceiling),
                ));
            }
            if bracket.rate <= Decimal::ZERO || bracket.rate >= Decimal::ONE {
                return Err(LadderError::invalid(
                    "margin_table",
                    format!("rate {} outside (0, 1)", bracket.rate),
                ));
            }
        }
        for pair in self.brackets.windows(2) {
            if pair[0].ceiling != pair[1].floor {
                return Err(LadderError::invalid(
                    "margin_table",
                    format!("gap or overlap at {}", pair[0].ceiling),
                ));
            }
        }
        Ok(())
    }

    pub fn max_notional(&self) -> Decimal {
        self.brackets.last().map(|b| b.ceiling).unwrap_or(Decimal::ZERO)
    }
}

pub fn lookup_bracket(notional: Decimal) -> LadderResult<MarginBracket> {
    MarginTable::default().lookup(notional)
}
