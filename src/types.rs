// 1.0: the primitives. direction, the position snapshot handed in by the data layer,
// and the ladder values handed back. everything downstream is built on these.

use crate::error::{checked, require_non_negative, require_positive, LadderResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

// Long = profit when price goes up. Short = profit when price goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn sign(&self) -> Decimal {
        match self {
            Direction::Long => dec!(1),
            Direction::Short => dec!(-1),
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }

    /// Exchanges report an unsigned position with its liquidation price. A position
    /// whose entry sits above the liquidation price can only be long.
    pub fn from_liquidation(entry_price: Decimal, liquidation_price: Decimal) -> Self {
        if entry_price > liquidation_price {
            Direction::Long
        } else {
            Direction::Short
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

// 1.1: immutable view of an open position. quantity is always a magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    entry_price: Decimal,
    leverage: Decimal,
    quantity: Decimal,
    direction: Direction,
}

impl PositionSnapshot {
    pub fn new(
        entry_price: Decimal,
        leverage: Decimal,
        quantity: Decimal,
        direction: Direction,
    ) -> LadderResult<Self> {
        Ok(Self {
            entry_price: require_positive("entry_price", entry_price)?,
            leverage: require_positive("leverage", leverage)?,
            quantity: require_non_negative("quantity", quantity)?,
            direction,
        })
    }

    pub fn entry_price(&self) -> Decimal {
        self.entry_price
    }

    pub fn leverage(&self) -> Decimal {
        self.leverage
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    pub fn with_entry_price(&self, entry_price: Decimal) -> LadderResult<Self> {
        Self::new(entry_price, self.leverage, self.quantity, self.direction)
    }

    pub fn with_leverage(&self, leverage: Decimal) -> LadderResult<Self> {
        Self::new(self.entry_price, leverage, self.quantity, self.direction)
    }

    pub fn with_quantity(&self, quantity: Decimal) -> LadderResult<Self> {
        Self::new(self.entry_price, self.leverage, quantity, self.direction)
    }
}

// 1.2: one resting order. notional = price * quantity / leverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderStep {
    pub price: Decimal,
    pub quantity: Decimal,
    pub notional: Decimal,
}

impl LadderStep {
    pub fn new(price: Decimal, quantity: Decimal, leverage: Decimal) -> LadderResult<Self> {
        require_positive("leverage", leverage)?;
        let gross = checked(price.checked_mul(quantity), "step notional")?;
        Ok(Self {
            price,
            quantity,
            notional: checked(gross.checked_div(leverage), "step notional")?,
        })
    }
}

impl fmt::Display for LadderStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.quantity, self.price)
    }
}

// 1.3: both sides of the ladder. the caller owns it and turns steps into orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ladder {
    pub buys: Vec<LadderStep>,
    pub sells: Vec<LadderStep>,
}

impl Ladder {
    pub fn new(buys: Vec<LadderStep>, sells: Vec<LadderStep>) -> Self {
        Self { buys, sells }
    }

    /// All steps on one side: buys for `Long`, sells for `Short`.
    pub fn one_sided(side: Direction, steps: Vec<LadderStep>) -> Self {
        match side {
            Direction::Long => Self::new(steps, Vec::new()),
            Direction::Short => Self::new(Vec::new(), steps),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buys.is_empty() && self.sells.is_empty()
    }

    pub fn total_buy_quantity(&self) -> Decimal {
        self.buys.iter().map(|s| s.quantity).sum()
    }

    pub fn total_sell_quantity(&self) -> Decimal {
        self.sells.iter().map(|s| s.quantity).sum()
    }

    /// Keeps buys strictly below `current_price` and sells strictly above `floor`.
    pub fn retain_around(&mut self, current_price: Decimal, floor: Decimal) {
        self.buys.retain(|s| s.price < current_price);
        self.sells.retain(|s| s.price > floor);
    }

    /// Lowest resting price for a long, highest for a short.
    pub fn extreme_price(&self, direction: Direction) -> Option<Decimal> {
        let prices = self.buys.iter().chain(self.sells.iter()).map(|s| s.price);
        match direction {
            Direction::Long => prices.min(),
            Direction::Short => prices.max(),
        }
    }
}
