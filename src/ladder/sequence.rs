// 4.1: resumable step sequence. walks away from an anchor price one step at a time
// until the cumulative quantity reaches the cap. callers can re-anchor, flip
// direction or resize between pulls without losing the running quantity.

use crate::error::{require_non_negative, require_positive, LadderError, LadderResult};
use crate::types::LadderStep;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepDirection {
    Ascending,
    Descending,
}

impl StepDirection {
    fn first_offset(&self) -> Decimal {
        match self {
            StepDirection::Ascending => Decimal::ONE,
            StepDirection::Descending => Decimal::NEGATIVE_ONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceParams {
    pub anchor_price: Decimal,
    pub step_size: Decimal,
    pub spread_multiplier: Decimal,
    pub direction: StepDirection,
    pub multiplier: Decimal,
    pub step_quantity: Decimal,
    pub leverage: Decimal,
    pub quantity_cap: Decimal,
    /// Quantity already held when the sequence starts.
    pub starting_quantity: Decimal,
}

/// Overrides applied at a pull boundary. `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reparameterize {
    pub anchor_price: Option<Decimal>,
    pub direction: Option<StepDirection>,
    pub multiplier: Option<Decimal>,
    pub step_quantity: Option<Decimal>,
}

impl Reparameterize {
    pub fn anchor(price: Decimal) -> Self {
        Self {
            anchor_price: Some(price),
            ..Self::default()
        }
    }

    pub fn direction(mut self, direction: StepDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn multiplier(mut self, multiplier: Decimal) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    pub fn step_quantity(mut self, quantity: Decimal) -> Self {
        self.step_quantity = Some(quantity);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pull {
    Step(LadderStep),
    Exhausted,
}

#[derive(Debug, Clone)]
struct SequenceState {
    anchor_price: Decimal,
    step_size: Decimal,
    direction: StepDirection,
    multiplier: Decimal,
    cumulative_quantity: Decimal,
    step_quantity: Decimal,
    offset: Decimal,
}

#[derive(Debug, Clone)]
pub struct LadderSequence {
    state: SequenceState,
    leverage: Decimal,
    quantity_cap: Decimal,
    failed: bool,
}

impl LadderSequence {
    pub fn new(params: &SequenceParams) -> LadderResult<Self> {
        require_positive("anchor_price", params.anchor_price)?;
        require_positive("step_size", params.step_size)?;
        require_positive("spread_multiplier", params.spread_multiplier)?;
        require_positive("multiplier", params.multiplier)?;
        require_positive("step_quantity", params.step_quantity)?;
        require_positive("leverage", params.leverage)?;
        require_non_negative("quantity_cap", params.quantity_cap)?;
        require_non_negative("starting_quantity", params.starting_quantity)?;

        Ok(Self {
            state: SequenceState {
                anchor_price: params.anchor_price,
                step_size: params.step_size * params.spread_multiplier,
                direction: params.direction,
                multiplier: params.multiplier,
                cumulative_quantity: params.starting_quantity,
                step_quantity: params.step_quantity,
                offset: params.direction.first_offset(),
            },
            leverage: params.leverage,
            quantity_cap: params.quantity_cap,
            failed: false,
        })
    }

    pub fn cumulative_quantity(&self) -> Decimal {
        self.state.cumulative_quantity
    }

    pub fn step_size(&self) -> Decimal {
        self.state.step_size
    }

    pub fn is_exhausted(&self) -> bool {
        self.state.cumulative_quantity >= self.quantity_cap
    }

    pub fn pull(&mut self) -> LadderResult<Pull> {
        if self.is_exhausted() {
            return Ok(Pull::Exhausted);
        }

        let state = &self.state;
        let mut step_size = state.step_size;
        let mut price = state.anchor_price + state.offset * step_size;
        if price <= step_size {
            // too close to zero: shrink the spread for this and every later step
            step_size /= dec!(10);
            price = state.anchor_price + state.offset * step_size;
        }
        if price <= Decimal::ZERO {
            return Err(LadderError::invalid(
                "anchor_price",
                format!("step price {price} is not positive"),
            ));
        }

        let quantity = state.step_quantity * state.multiplier;
        let step = LadderStep::new(price, quantity, self.leverage)?;

        let state = &mut self.state;
        if step_size != state.step_size {
            debug!(
                anchor = %state.anchor_price,
                step_size = %step_size,
                "ladder spread contracted near zero"
            );
            state.step_size = step_size;
        }
        state.offset += match state.direction {
            StepDirection::Ascending => Decimal::ONE,
            StepDirection::Descending => Decimal::NEGATIVE_ONE,
        };
        state.cumulative_quantity += quantity;
        Ok(Pull::Step(step))
    }

    /// Applies overrides from the next pull on. The step offset restarts next to
    /// the (possibly new) anchor; cumulative quantity and any contracted step size
    /// carry over.
    pub fn reparameterize(&mut self, overrides: Reparameterize) -> LadderResult<()> {
        if let Some(anchor) = overrides.anchor_price {
            self.state.anchor_price = require_positive("anchor_price", anchor)?;
        }
        if let Some(direction) = overrides.direction {
            self.state.direction = direction;
        }
        if let Some(multiplier) = overrides.multiplier {
            self.state.multiplier = require_positive("multiplier", multiplier)?;
        }
        if let Some(quantity) = overrides.step_quantity {
            self.state.step_quantity = require_positive("step_quantity", quantity)?;
        }
        self.state.offset = self.state.direction.first_offset();
        Ok(())
    }

    pub fn resume_with(&mut self, overrides: Reparameterize) -> LadderResult<Pull> {
        self.reparameterize(overrides)?;
        self.pull()
    }
}

impl Iterator for LadderSequence {
    type Item = LadderResult<LadderStep>;

    // stops after the first error
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.pull() {
            Ok(Pull::Step(step)) => Some(Ok(step)),
            Ok(Pull::Exhausted) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
