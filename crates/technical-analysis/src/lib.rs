pub mod analyzer;
pub mod indicators;

#[cfg(test)]
mod indicators_tests;

pub use analyzer::*;
pub use indicators::*;
