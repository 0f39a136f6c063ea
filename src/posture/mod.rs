// src/posture/mod.rs

mod evaluator;
mod types;

pub use evaluator::{evaluate, PostureEvaluator};
pub use types::*;
