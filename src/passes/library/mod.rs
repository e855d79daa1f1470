//! Built-in analyses and transforms
//!
//! A small working set that exercises every scheduling path: CFG-shape
//! analyses, transforms that preserve them, and a transform that rewrites
//! the graph and preserves nothing.

pub mod const_fold;
pub mod dce;
pub mod dominators;
pub mod loops;
pub mod simplify_cfg;

pub use const_fold::ConstantFoldingPass;
pub use dce::DeadCodeEliminationPass;
pub use dominators::{Dominators, DominatorsAnalysis, DOMINATORS};
pub use loops::{LoopAnalysis, LoopInfo, LOOPS};
pub use simplify_cfg::SimplifyCfgPass;
