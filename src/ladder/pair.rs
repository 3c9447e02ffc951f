// 4.2: matched buy/sell ladders from two sequences sharing an anchor.
// the sell side walks up, the buy side walks down. when the position already
// sits at the cap we fall back to a single reducing ladder.

use super::sequence::{LadderSequence, Pull, Reparameterize, SequenceParams, StepDirection};
use crate::error::{require_positive, LadderResult};
use crate::types::{Direction, Ladder, LadderStep};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairParams {
    pub anchor_price: Decimal,
    /// Re-anchor both sides here before assembling the ladder.
    pub last_fill_price: Option<Decimal>,
    pub step_size: Decimal,
    pub spread_multiplier: Decimal,
    pub multiplier: Decimal,
    pub step_quantity: Decimal,
    pub leverage: Decimal,
    pub quantity_cap: Decimal,
    pub current_quantity: Decimal,
    pub pair_count: usize,
    pub reduce_multiplier: Decimal,
    /// Directional bias of the position the ladder is built for.
    pub direction: Direction,
}

impl PairParams {
    fn sequence(&self, direction: StepDirection) -> SequenceParams {
        SequenceParams {
            anchor_price: self.anchor_price,
            step_size: self.step_size,
            spread_multiplier: self.spread_multiplier,
            direction,
            multiplier: self.multiplier,
            step_quantity: self.step_quantity,
            leverage: self.leverage,
            quantity_cap: self.quantity_cap,
            starting_quantity: self.current_quantity,
        }
    }

    fn fallback_sequence(&self) -> SequenceParams {
        SequenceParams {
            anchor_price: self.last_fill_price.unwrap_or(self.anchor_price),
            step_quantity: self.step_quantity * self.reduce_multiplier,
            starting_quantity: Decimal::ZERO,
            ..self.sequence(StepDirection::Descending)
        }
    }
}

// first pair, re-anchored at the last fill when there is one.
// None means one of the pulls found the sequence exhausted.
fn first_pair(
    params: &PairParams,
    buy_seq: &mut LadderSequence,
    sell_seq: &mut LadderSequence,
) -> LadderResult<Option<(LadderStep, LadderStep)>> {
    let Pull::Step(mut sell) = sell_seq.pull()? else {
        return Ok(None);
    };
    let Pull::Step(mut buy) = buy_seq.pull()? else {
        return Ok(None);
    };

    if let Some(last) = params.last_fill_price {
        let resume = Reparameterize::anchor(last).multiplier(params.multiplier);
        let Pull::Step(b) = buy_seq.resume_with(resume.direction(StepDirection::Descending))? else {
            return Ok(None);
        };
        let Pull::Step(s) = sell_seq.resume_with(resume.direction(StepDirection::Ascending))? else {
            return Ok(None);
        };
        buy = b;
        sell = s;
    }
    Ok(Some((buy, sell)))
}

pub fn generate_pair(params: &PairParams) -> LadderResult<Ladder> {
    require_positive("reduce_multiplier", params.reduce_multiplier)?;

    let mut sell_seq = LadderSequence::new(&params.sequence(StepDirection::Ascending))?;
    let mut buy_seq = LadderSequence::new(&params.sequence(StepDirection::Descending))?;

    let mut ladder = match first_pair(params, &mut buy_seq, &mut sell_seq)? {
        Some((buy, sell)) => {
            let mut buys = vec![buy];
            let mut sells = vec![sell];
            while buys.len() < params.pair_count {
                let Pull::Step(buy) = buy_seq.pull()? else { break };
                let Pull::Step(sell) = sell_seq.pull()? else { break };
                buys.push(buy);
                sells.push(sell);
            }
            Ladder::new(buys, sells)
        }
        None => {
            debug!(
                direction = %params.direction,
                current = %params.current_quantity,
                cap = %params.quantity_cap,
                "position at cap, building one-sided reduce ladder"
            );
            let mut reducer = LadderSequence::new(&params.fallback_sequence())?;
            let mut steps = Vec::with_capacity(params.pair_count);
            while steps.len() < params.pair_count {
                let Pull::Step(step) = reducer.pull()? else { break };
                steps.push(step);
            }
            // reducing orders trade against the position
            Ladder::one_sided(params.direction.opposite(), steps)
        }
    };

    // TODO: confirm with product whether the reversed sell quantities are intended
    ladder.sells = reverse_pair_quantities(ladder.sells, params.leverage)?;
    Ok(ladder)
}

/// Front-loads quantity on a symmetric price ladder: the Nth step takes the
/// quantity of the Nth-from-last step. Notional follows the new quantity.
pub fn reverse_pair_quantities(steps: Vec<LadderStep>, leverage: Decimal) -> LadderResult<Vec<LadderStep>> {
    require_positive("leverage", leverage)?;
    let quantities: Vec<Decimal> = steps.iter().map(|s| s.quantity).collect();
    steps
        .into_iter()
        .zip(quantities.into_iter().rev())
        .map(|(step, quantity)| LadderStep::new(step.price, quantity, leverage))
        .collect()
}
