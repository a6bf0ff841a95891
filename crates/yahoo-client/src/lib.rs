pub mod client;
pub mod parse;

pub use client::{YahooFinanceClient, DEFAULT_BASE_URL};
