// 4.0: ladder construction. a resumable step sequence, the buy/sell pair built
// from two of them, and the range grid that sizes and drives the pair.

mod grid;
mod pair;
mod sequence;

pub use grid::{build_grid, GridParams};
pub use pair::{generate_pair, reverse_pair_quantities, PairParams};
pub use sequence::{LadderSequence, Pull, Reparameterize, SequenceParams, StepDirection};
