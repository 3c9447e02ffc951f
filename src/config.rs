// 7.0 config.rs: every strategy knob in one place. allocation, grid, brackets.
// 7.1 presets mirror the account setups the strategy was tuned on.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::allocator::AllocationParams;
use crate::ladder::GridParams;
use crate::margin::MarginTable;
use crate::targets::TakeProfitParams;

// Complete configuration for one traded market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    // Compounding take-profit / slow-market allocation
    pub allocation: AllocationParams,
    // Range/interval grid used by plan_grid
    pub grid: GridParams,
    // Maintenance margin brackets
    pub margin: MarginTable,
    // Half/full take-profit plan around a fresh entry
    pub take_profit: TakeProfitParams,
    // Anchor at the lower of entry and market price when the market is below entry
    pub use_current_price: bool,
    // Distance between the outermost resting order and the target liquidation price
    pub liquidation_buffer: Decimal,
    // Quantity used to plan a ladder while flat
    pub seed_quantity: Decimal,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            allocation: AllocationParams::default(),
            grid: GridParams::default(),
            margin: MarginTable::default(),
            take_profit: TakeProfitParams::default(),
            use_current_price: true,
            liquidation_buffer: dec!(500),
            seed_quantity: dec!(0.1),
        }
    }
}

impl StrategyConfig {
    // BTC account preset: small budget, one coin max, three trades over a 3000 range
    pub fn btc() -> Self {
        let mut config = Self::default();
        config.allocation.take_profit_interval = 3;
        config.allocation.slow_market_interval = 3;
        config.allocation.max_quantity = Decimal::ONE;
        config.grid.run_range = dec!(3000);
        config.grid.interval = dec!(25);
        config.grid.maximum_quantity = Decimal::ONE;
        config.grid.pair_count = 3;
        config.seed_quantity = dec!(0.1);
        config.take_profit.budget = dec!(0.1);
        config
    }

    // Wider buffer, fewer compounding steps, smaller cap
    pub fn conservative() -> Self {
        let mut config = Self::default();
        config.allocation.exit_percent = dec!(0.02);
        config.allocation.max_quantity = dec!(2);
        config.grid.maximum_quantity = dec!(2);
        config.grid.pair_count = 2;
        config.liquidation_buffer = dec!(1000);
        config
    }

    // Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.allocation
            .validate()
            .map_err(|e| ConfigError::InvalidAllocation { reason: e.to_string() })?;

        self.grid
            .validate()
            .map_err(|e| ConfigError::InvalidGrid { reason: e.to_string() })?;

        self.margin
            .validate()
            .map_err(|e| ConfigError::InvalidMargin { reason: e.to_string() })?;

        self.take_profit
            .validate()
            .map_err(|e| ConfigError::InvalidTakeProfit { reason: e.to_string() })?;

        if self.liquidation_buffer < Decimal::ZERO {
            return Err(ConfigError::InvalidRisk {
                reason: "Liquidation buffer must not be negative".to_string(),
            });
        }

        if self.seed_quantity <= Decimal::ZERO {
            return Err(ConfigError::InvalidRisk {
                reason: "Seed quantity must be positive".to_string(),
            });
        }

        if self.seed_quantity > self.allocation.max_quantity {
            return Err(ConfigError::InvalidRisk {
                reason: "Seed quantity exceeds max quantity".to_string(),
            });
        }

        Ok(())
    }
}

// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid allocation: {reason}")]
    InvalidAllocation { reason: String },
    #[error("Invalid grid: {reason}")]
    InvalidGrid { reason: String },
    #[error("Invalid margin table: {reason}")]
    InvalidMargin { reason: String },
    #[error("Invalid take profit: {reason}")]
    InvalidTakeProfit { reason: String },
    #[error("Invalid risk settings: {reason}")]
    InvalidRisk { reason: String },
}
