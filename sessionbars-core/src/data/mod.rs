//! Bar continuity: sparse provider bars in, dense minute series out.

pub mod normalize;

pub use normalize::{normalize, verify_dense, GapRepair, NormalizeError, NormalizedSession};
