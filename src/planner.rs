//! Planning boundary between the exchange layer and the ladder core.
//!
//! The exchange side hands in a position snapshot plus what it knows about the
//! market and the isolated margin; the planner answers with the ladder to rest
//! and how much margin has to be added so the outermost order cannot be reached
//! by liquidation. Nothing here talks to an exchange.

use crate::allocator::allocate;
use crate::config::{ConfigError, StrategyConfig};
use crate::error::{LadderError, LadderResult};
use crate::ladder::build_grid;
use crate::liquidation::{isolated_liquidation_price, wallet_balance_required};
use crate::targets::{increase_position, interval_take_profit, take_profit_plan};
use crate::types::{Direction, Ladder, PositionSnapshot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Market-side facts the planner needs besides the position itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketContext {
    pub current_price: Option<Decimal>,
    pub isolated_margin: Decimal,
    pub unrealized_pnl: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionPlan {
    pub ladder: Ladder,
    /// Price the allocation was anchored at.
    pub anchor_price: Decimal,
    /// Current liquidation price of the open position, None when flat.
    pub liquidation_price: Option<Decimal>,
    /// Balance needed to push liquidation beyond the outermost order.
    pub required_balance: Option<Decimal>,
    /// Margin to add to the isolated position, None when already covered.
    pub margin_top_up: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct LadderPlanner {
    config: StrategyConfig,
}

impl LadderPlanner {
    pub fn new(config: StrategyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn plan(&self, snapshot: &PositionSnapshot, market: &MarketContext) -> LadderResult<PositionPlan> {
        let working = if snapshot.is_flat() {
            let price = market.current_price.ok_or_else(|| {
                LadderError::invalid("current_price", "required to plan a flat position")
            })?;
            snapshot
                .with_entry_price(price)?
                .with_quantity(self.config.seed_quantity)?
        } else {
            *snapshot
        };

        let (anchor, current) = self.anchor_prices(working.entry_price(), market.current_price);
        let mut ladder = allocate(&working.with_entry_price(anchor)?, &self.config.allocation)?;
        if let Some(price) = current {
            ladder.retain_around(price, anchor.max(price));
        }

        if snapshot.is_flat() {
            info!(
                direction = %snapshot.direction(),
                anchor = %anchor,
                buys = ladder.buys.len(),
                sells = ladder.sells.len(),
                "planned seed ladder"
            );
            return Ok(PositionPlan {
                ladder,
                anchor_price: anchor,
                liquidation_price: None,
                required_balance: None,
                margin_top_up: None,
            });
        }

        let liquidation_price = isolated_liquidation_price(
            snapshot,
            market.isolated_margin,
            market.unrealized_pnl,
            &self.config.margin,
        )?;
        let required_balance = self.required_balance(snapshot, &ladder)?;
        let available = market.isolated_margin + market.unrealized_pnl.abs();
        let margin_top_up = required_balance
            .filter(|required| available < *required)
            .map(|required| required - available);

        info!(
            direction = %snapshot.direction(),
            anchor = %anchor,
            buys = ladder.buys.len(),
            sells = ladder.sells.len(),
            liquidation = %liquidation_price,
            "planned ladder"
        );
        if let Some(top_up) = margin_top_up {
            if top_up > market.isolated_margin {
                warn!(top_up = %top_up, isolated = %market.isolated_margin, "margin top-up exceeds isolated margin");
            } else {
                info!(top_up = %top_up, "margin top-up required");
            }
        }

        Ok(PositionPlan {
            ladder,
            anchor_price: anchor,
            liquidation_price: Some(liquidation_price),
            required_balance,
            margin_top_up,
        })
    }

    pub fn plan_grid(&self, snapshot: &PositionSnapshot, current_price: Option<Decimal>) -> LadderResult<Ladder> {
        build_grid(snapshot, current_price, &self.config.grid)
    }

    /// Half/full take-profit plan. A flat snapshot's entry price is the new entry.
    pub fn plan_take_profit(&self, snapshot: &PositionSnapshot) -> LadderResult<Ladder> {
        take_profit_plan(
            snapshot.direction(),
            snapshot.entry_price(),
            snapshot.leverage(),
            &self.config.take_profit,
            !snapshot.is_flat(),
        )
    }

    pub fn plan_interval_take_profit(
        &self,
        snapshot: &PositionSnapshot,
        exit_price: Decimal,
        pnl: Decimal,
    ) -> LadderResult<Option<Ladder>> {
        interval_take_profit(snapshot, exit_price, pnl)
    }

    /// Add-on order capped by the allocation's max quantity.
    pub fn plan_increase(
        &self,
        snapshot: &PositionSnapshot,
        entry_price: Decimal,
        pnl: Decimal,
    ) -> LadderResult<Option<Ladder>> {
        increase_position(snapshot, entry_price, pnl, self.config.allocation.max_quantity)
    }

    // with a market below entry the allocation starts from the market price
    fn anchor_prices(&self, entry: Decimal, current: Option<Decimal>) -> (Decimal, Option<Decimal>) {
        match current {
            Some(price) if self.config.use_current_price && entry > price => (price, Some(entry)),
            _ => (entry, current),
        }
    }

    // target liquidation sits one buffer past the outermost resting order
    fn required_balance(&self, snapshot: &PositionSnapshot, ladder: &Ladder) -> LadderResult<Option<Decimal>> {
        let Some(extreme) = ladder.extreme_price(snapshot.direction()) else {
            return Ok(None);
        };
        let target = match snapshot.direction() {
            Direction::Long => extreme - self.config.liquidation_buffer,
            Direction::Short => extreme + self.config.liquidation_buffer,
        };
        let unlevered = snapshot.with_leverage(Decimal::ONE)?;
        wallet_balance_required(target, &unlevered, Decimal::ZERO, &self.config.margin).map(Some)
    }
}
