pub mod benchmarks;
pub mod derivation;
pub mod engine;
pub mod geopolitics;
pub mod history;
pub mod narrative;
pub mod red_flags;
pub mod scoring;
pub mod tiers;

#[cfg(test)]
mod tests;

pub use benchmarks::{resolve_benchmark, Sector, SectorBenchmark, SectorContext};
pub use derivation::{CompanyFundamentals, GrowthRate, GrowthWindow};
pub use engine::{FundamentalAnalysisEngine, StockReport};
pub use geopolitics::{GeoRiskTier, GeopoliticalRisk};
pub use history::HistoricalSeries;
pub use narrative::{InvestorProfile, Narrative, NarrativeSection};
pub use red_flags::{RedFlag, RedFlagKind, Severity};
pub use scoring::{MarginsOfSafety, ScoreCard, ValuationBreakdown, Verdict};
pub use tiers::{ComponentResult, ComponentStatus, SubScore, TierLabel};
