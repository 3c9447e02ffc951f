// perps-ladder: order ladders and risk figures for a leveraged position.
// margin-first: the bracket and liquidation math bound every ladder we emit.
// all computation is deterministic decimal math with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   0.x  error.rs: LadderError taxonomy + checked arithmetic helpers
//   1.x  types.rs: Direction, PositionSnapshot, LadderStep, Ladder
//   2.x  valuation.rs: bull/bear price for a percent of margin
//   3.x  margin.rs: maintenance margin brackets
//   3.5  liquidation.rs: liquidation price <-> required wallet balance
//   4.x  ladder/: resumable step sequence, buy/sell pair, range grid
//   5.x  allocator.rs: profit-compounding take-profit / slow-market ladders
//   5.5  targets.rs: single take-profit / add-on orders, half/full take-profit plan
//   6.x  planner.rs: snapshot in, ladder + margin top-up out
//   7.x  config.rs: strategy settings, presets, validation

pub mod allocator;
pub mod config;
pub mod error;
pub mod ladder;
pub mod liquidation;
pub mod margin;
pub mod planner;
pub mod targets;
pub mod types;
pub mod valuation;

// re exports for convenience
pub use allocator::*;
pub use config::{ConfigError, StrategyConfig};
pub use error::{LadderError, LadderResult};
pub use ladder::*;
pub use liquidation::*;
pub use margin::*;
pub use planner::*;
pub use targets::*;
pub use types::*;
pub use valuation::*;
