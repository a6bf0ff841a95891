//! Sector benchmark table.
//!
//! Thresholds are expressed in the same units as `CompanyFundamentals`:
//! percentages for returns, margins, growth and payout; plain multiples for
//! P/E, P/B, net-debt/EBITDA and interest coverage.

use serde::{Deserialize, Serialize};

/// The 11 GICS sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sector {
    Technology,
    Healthcare,
    Financials,
    ConsumerDiscretionary,
    ConsumerStaples,
    Industrials,
    Energy,
    Utilities,
    RealEstate,
    Materials,
    CommunicationServices,
}

impl Sector {
    pub const ALL: [Sector; 11] = [
        Sector::Technology,
        Sector::Healthcare,
        Sector::Financials,
        Sector::ConsumerDiscretionary,
        Sector::ConsumerStaples,
        Sector::Industrials,
        Sector::Energy,
        Sector::Utilities,
        Sector::RealEstate,
        Sector::Materials,
        Sector::CommunicationServices,
    ];

    /// Parse a provider sector label. Accepts both GICS names and the
    /// labels Yahoo Finance uses ("Financial Services", "Consumer Cyclical", ...).
    pub fn parse(label: &str) -> Option<Sector> {
        let normalized = label.trim().to_lowercase();
        let sector = match normalized.as_str() {
            "technology" | "information technology" => Sector::Technology,
            "healthcare" | "health care" => Sector::Healthcare,
            "financials" | "financial services" | "financial" => Sector::Financials,
            "consumer discretionary" | "consumer cyclical" => Sector::ConsumerDiscretionary,
            "consumer staples" | "consumer defensive" => Sector::ConsumerStaples,
            "industrials" => Sector::Industrials,
            "energy" => Sector::Energy,
            "utilities" => Sector::Utilities,
            "real estate" => Sector::RealEstate,
            "materials" | "basic materials" => Sector::Materials,
            "communication services" | "telecommunication services" => {
                Sector::CommunicationServices
            }
            _ => return None,
        };
        Some(sector)
    }

    pub fn label(&self) -> &'static str {
        self.benchmark().name
    }

    pub fn benchmark(&self) -> &'static SectorBenchmark {
        match self {
            Sector::Technology => &TECHNOLOGY,
            Sector::Healthcare => &HEALTHCARE,
            Sector::Financials => &FINANCIALS,
            Sector::ConsumerDiscretionary => &CONSUMER_DISCRETIONARY,
            Sector::ConsumerStaples => &CONSUMER_STAPLES,
            Sector::Industrials => &INDUSTRIALS,
            Sector::Energy => &ENERGY,
            Sector::Utilities => &UTILITIES,
            Sector::RealEstate => &REAL_ESTATE,
            Sector::Materials => &MATERIALS,
            Sector::CommunicationServices => &COMMUNICATION_SERVICES,
        }
    }

    /// Sectors where price/book carries information (asset-heavy balance sheets).
    pub fn book_value_meaningful(&self) -> bool {
        matches!(
            self,
            Sector::Financials
                | Sector::Industrials
                | Sector::Materials
                | Sector::Energy
                | Sector::Utilities
                | Sector::RealEstate
        )
    }
}

/// Per-sector scoring thresholds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorBenchmark {
    pub name: &'static str,
    pub roe_excellent: f64,
    pub roe_good: f64,
    pub roic_excellent: f64,
    pub roic_good: f64,
    pub operating_margin_excellent: f64,
    pub operating_margin_good: f64,
    pub net_margin_excellent: f64,
    pub net_margin_good: f64,
    pub eps_growth_excellent: f64,
    pub eps_growth_good: f64,
    pub fcf_growth_excellent: f64,
    pub fcf_growth_good: f64,
    pub pe_cheap: f64,
    pub pe_fair: f64,
    pub pb_cheap: f64,
    pub pb_fair: f64,
    pub debt_ebitda_good: f64,
    pub debt_ebitda_ok: f64,
    pub interest_coverage_good: f64,
    pub interest_coverage_ok: f64,
    pub payout_good: f64,
    pub payout_ok: f64,
}

pub const TECHNOLOGY: SectorBenchmark = SectorBenchmark {
    name: "Technology",
    roe_excellent: 20.0,
    roe_good: 15.0,
    roic_excellent: 15.0,
    roic_good: 10.0,
    operating_margin_excellent: 25.0,
    operating_margin_good: 15.0,
    net_margin_excellent: 20.0,
    net_margin_good: 10.0,
    eps_growth_excellent: 15.0,
    eps_growth_good: 8.0,
    fcf_growth_excellent: 12.0,
    fcf_growth_good: 5.0,
    pe_cheap: 25.0,
    pe_fair: 35.0,
    pb_cheap: 8.0,
    pb_fair: 12.0,
    debt_ebitda_good: 1.0,
    debt_ebitda_ok: 2.0,
    interest_coverage_good: 15.0,
    interest_coverage_ok: 8.0,
    payout_good: 40.0,
    payout_ok: 60.0,
};

pub const HEALTHCARE: SectorBenchmark = SectorBenchmark {
    name: "Healthcare",
    roe_excellent: 18.0,
    roe_good: 12.0,
    roic_excellent: 12.0,
    roic_good: 8.0,
    operating_margin_excellent: 20.0,
    operating_margin_good: 12.0,
    net_margin_excellent: 15.0,
    net_margin_good: 8.0,
    eps_growth_excellent: 12.0,
    eps_growth_good: 6.0,
    fcf_growth_excellent: 10.0,
    fcf_growth_good: 5.0,
    pe_cheap: 20.0,
    pe_fair: 30.0,
    pb_cheap: 5.0,
    pb_fair: 8.0,
    debt_ebitda_good: 1.5,
    debt_ebitda_ok: 2.5,
    interest_coverage_good: 10.0,
    interest_coverage_ok: 5.0,
    payout_good: 50.0,
    payout_ok: 70.0,
};

pub const FINANCIALS: SectorBenchmark = SectorBenchmark {
    name: "Financials",
    roe_excellent: 12.0,
    roe_good: 9.0,
    roic_excellent: 10.0,
    roic_good: 7.0,
    operating_margin_excellent: 30.0,
    operating_margin_good: 20.0,
    net_margin_excellent: 20.0,
    net_margin_good: 12.0,
    eps_growth_excellent: 10.0,
    eps_growth_good: 5.0,
    fcf_growth_excellent: 8.0,
    fcf_growth_good: 3.0,
    pe_cheap: 12.0,
    pe_fair: 16.0,
    pb_cheap: 1.2,
    pb_fair: 2.0,
    // Leverage is not scored for financials; kept for completeness.
    debt_ebitda_good: 3.0,
    debt_ebitda_ok: 5.0,
    interest_coverage_good: 5.0,
    interest_coverage_ok: 3.0,
    payout_good: 45.0,
    payout_ok: 65.0,
};

pub const CONSUMER_DISCRETIONARY: SectorBenchmark = SectorBenchmark {
    name: "Consumer Discretionary",
    roe_excellent: 18.0,
    roe_good: 12.0,
    roic_excellent: 12.0,
    roic_good: 8.0,
    operating_margin_excellent: 12.0,
    operating_margin_good: 8.0,
    net_margin_excellent: 8.0,
    net_margin_good: 5.0,
    eps_growth_excellent: 12.0,
    eps_growth_good: 6.0,
    fcf_growth_excellent: 10.0,
    fcf_growth_good: 5.0,
    pe_cheap: 20.0,
    pe_fair: 28.0,
    pb_cheap: 5.0,
    pb_fair: 8.0,
    debt_ebitda_good: 2.0,
    debt_ebitda_ok: 3.0,
    interest_coverage_good: 8.0,
    interest_coverage_ok: 4.0,
    payout_good: 40.0,
    payout_ok: 60.0,
};

pub const CONSUMER_STAPLES: SectorBenchmark = SectorBenchmark {
    name: "Consumer Staples",
    roe_excellent: 20.0,
    roe_good: 14.0,
    roic_excellent: 12.0,
    roic_good: 8.0,
    operating_margin_excellent: 15.0,
    operating_margin_good: 10.0,
    net_margin_excellent: 10.0,
    net_margin_good: 6.0,
    eps_growth_excellent: 8.0,
    eps_growth_good: 4.0,
    fcf_growth_excellent: 7.0,
    fcf_growth_good: 3.0,
    pe_cheap: 20.0,
    pe_fair: 25.0,
    pb_cheap: 5.0,
    pb_fair: 8.0,
    debt_ebitda_good: 2.5,
    debt_ebitda_ok: 3.5,
    interest_coverage_good: 8.0,
    interest_coverage_ok: 4.0,
    payout_good: 60.0,
    payout_ok: 75.0,
};

pub const INDUSTRIALS: SectorBenchmark = SectorBenchmark {
    name: "Industrials",
    roe_excellent: 15.0,
    roe_good: 10.0,
    roic_excellent: 12.0,
    roic_good: 8.0,
    operating_margin_excellent: 15.0,
    operating_margin_good: 10.0,
    net_margin_excellent: 10.0,
    net_margin_good: 6.0,
    eps_growth_excellent: 10.0,
    eps_growth_good: 5.0,
    fcf_growth_excellent: 8.0,
    fcf_growth_good: 4.0,
    pe_cheap: 18.0,
    pe_fair: 25.0,
    pb_cheap: 3.0,
    pb_fair: 5.0,
    debt_ebitda_good: 2.0,
    debt_ebitda_ok: 3.0,
    interest_coverage_good: 8.0,
    interest_coverage_ok: 4.0,
    payout_good: 45.0,
    payout_ok: 65.0,
};

pub const ENERGY: SectorBenchmark = SectorBenchmark {
    name: "Energy",
    roe_excellent: 15.0,
    roe_good: 10.0,
    roic_excellent: 10.0,
    roic_good: 7.0,
    operating_margin_excellent: 15.0,
    operating_margin_good: 8.0,
    net_margin_excellent: 10.0,
    net_margin_good: 5.0,
    eps_growth_excellent: 10.0,
    eps_growth_good: 5.0,
    fcf_growth_excellent: 8.0,
    fcf_growth_good: 3.0,
    pe_cheap: 12.0,
    pe_fair: 18.0,
    pb_cheap: 1.5,
    pb_fair: 2.5,
    debt_ebitda_good: 1.5,
    debt_ebitda_ok: 2.5,
    interest_coverage_good: 8.0,
    interest_coverage_ok: 4.0,
    payout_good: 50.0,
    payout_ok: 75.0,
};

pub const UTILITIES: SectorBenchmark = SectorBenchmark {
    name: "Utilities",
    roe_excellent: 10.0,
    roe_good: 8.0,
    roic_excellent: 6.0,
    roic_good: 4.0,
    operating_margin_excellent: 20.0,
    operating_margin_good: 12.0,
    net_margin_excellent: 12.0,
    net_margin_good: 8.0,
    eps_growth_excellent: 6.0,
    eps_growth_good: 3.0,
    fcf_growth_excellent: 5.0,
    fcf_growth_good: 2.0,
    pe_cheap: 16.0,
    pe_fair: 22.0,
    pb_cheap: 1.5,
    pb_fair: 2.5,
    debt_ebitda_good: 4.0,
    debt_ebitda_ok: 5.5,
    interest_coverage_good: 4.0,
    interest_coverage_ok: 2.5,
    payout_good: 70.0,
    payout_ok: 85.0,
};

pub const REAL_ESTATE: SectorBenchmark = SectorBenchmark {
    name: "Real Estate",
    roe_excellent: 10.0,
    roe_good: 6.0,
    roic_excellent: 6.0,
    roic_good: 4.0,
    operating_margin_excellent: 30.0,
    operating_margin_good: 20.0,
    net_margin_excellent: 25.0,
    net_margin_good: 12.0,
    eps_growth_excellent: 6.0,
    eps_growth_good: 3.0,
    fcf_growth_excellent: 6.0,
    fcf_growth_good: 3.0,
    pe_cheap: 30.0,
    pe_fair: 45.0,
    pb_cheap: 1.2,
    pb_fair: 2.0,
    debt_ebitda_good: 5.0,
    debt_ebitda_ok: 7.0,
    interest_coverage_good: 4.0,
    interest_coverage_ok: 2.5,
    payout_good: 85.0,
    payout_ok: 95.0,
};

pub const MATERIALS: SectorBenchmark = SectorBenchmark {
    name: "Materials",
    roe_excellent: 15.0,
    roe_good: 10.0,
    roic_excellent: 10.0,
    roic_good: 7.0,
    operating_margin_excellent: 15.0,
    operating_margin_good: 10.0,
    net_margin_excellent: 10.0,
    net_margin_good: 6.0,
    eps_growth_excellent: 10.0,
    eps_growth_good: 5.0,
    fcf_growth_excellent: 8.0,
    fcf_growth_good: 3.0,
    pe_cheap: 15.0,
    pe_fair: 22.0,
    pb_cheap: 2.0,
    pb_fair: 3.0,
    debt_ebitda_good: 1.5,
    debt_ebitda_ok: 2.5,
    interest_coverage_good: 8.0,
    interest_coverage_ok: 4.0,
    payout_good: 45.0,
    payout_ok: 65.0,
};

pub const COMMUNICATION_SERVICES: SectorBenchmark = SectorBenchmark {
    name: "Communication Services",
    roe_excellent: 15.0,
    roe_good: 10.0,
    roic_excellent: 10.0,
    roic_good: 7.0,
    operating_margin_excellent: 20.0,
    operating_margin_good: 12.0,
    net_margin_excellent: 15.0,
    net_margin_good: 8.0,
    eps_growth_excellent: 12.0,
    eps_growth_good: 6.0,
    fcf_growth_excellent: 10.0,
    fcf_growth_good: 5.0,
    pe_cheap: 20.0,
    pe_fair: 28.0,
    pb_cheap: 4.0,
    pb_fair: 6.0,
    debt_ebitda_good: 2.0,
    debt_ebitda_ok: 3.0,
    interest_coverage_good: 8.0,
    interest_coverage_ok: 4.0,
    payout_good: 45.0,
    payout_ok: 65.0,
};

/// Fallback used when the sector is missing or unrecognized.
pub const DEFAULT: SectorBenchmark = SectorBenchmark {
    name: "Default",
    roe_excellent: 15.0,
    roe_good: 10.0,
    roic_excellent: 12.0,
    roic_good: 8.0,
    operating_margin_excellent: 15.0,
    operating_margin_good: 10.0,
    net_margin_excellent: 10.0,
    net_margin_good: 6.0,
    eps_growth_excellent: 10.0,
    eps_growth_good: 5.0,
    fcf_growth_excellent: 8.0,
    fcf_growth_good: 4.0,
    pe_cheap: 18.0,
    pe_fair: 25.0,
    pb_cheap: 3.0,
    pb_fair: 5.0,
    debt_ebitda_good: 2.0,
    debt_ebitda_ok: 3.0,
    interest_coverage_good: 8.0,
    interest_coverage_ok: 4.0,
    payout_good: 50.0,
    payout_ok: 70.0,
};

/// Sector resolved once per analysis and passed to every scoring step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectorContext {
    pub sector: Option<Sector>,
    pub benchmark: &'static SectorBenchmark,
}

impl SectorContext {
    pub fn resolve(label: Option<&str>) -> Self {
        let sector = label.and_then(Sector::parse);
        Self {
            sector,
            benchmark: resolve_benchmark(sector),
        }
    }

    pub fn is(&self, sector: Sector) -> bool {
        self.sector == Some(sector)
    }

    pub fn book_value_meaningful(&self) -> bool {
        self.sector.is_some_and(|s| s.book_value_meaningful())
    }
}

/// Benchmark for `sector`, or the `Default` entry.
pub fn resolve_benchmark(sector: Option<Sector>) -> &'static SectorBenchmark {
    match sector {
        Some(s) => s.benchmark(),
        None => &DEFAULT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gics_and_yahoo_labels() {
        assert_eq!(Sector::parse("Financial Services"), Some(Sector::Financials));
        assert_eq!(Sector::parse("financials"), Some(Sector::Financials));
        assert_eq!(Sector::parse(" Consumer Cyclical "), Some(Sector::ConsumerDiscretionary));
        assert_eq!(Sector::parse("Basic Materials"), Some(Sector::Materials));
        assert_eq!(Sector::parse("Real Estate"), Some(Sector::RealEstate));
        assert_eq!(Sector::parse("Shell Companies"), None);
    }

    #[test]
    fn unknown_sector_falls_back_to_default() {
        let ctx = SectorContext::resolve(Some("Crypto Mining"));
        assert_eq!(ctx.sector, None);
        assert_eq!(ctx.benchmark.name, "Default");

        let ctx = SectorContext::resolve(None);
        assert_eq!(ctx.benchmark.name, "Default");
    }

    #[test]
    fn every_sector_has_ordered_thresholds() {
        for sector in Sector::ALL {
            let b = sector.benchmark();
            assert_eq!(Sector::parse(b.name), Some(sector), "{}", b.name);
            assert!(b.roe_excellent > b.roe_good);
            assert!(b.roic_excellent > b.roic_good);
            assert!(b.operating_margin_excellent > b.operating_margin_good);
            assert!(b.net_margin_excellent > b.net_margin_good);
            assert!(b.eps_growth_excellent > b.eps_growth_good);
            assert!(b.fcf_growth_excellent > b.fcf_growth_good);
            assert!(b.pe_cheap < b.pe_fair);
            assert!(b.pb_cheap < b.pb_fair);
            assert!(b.debt_ebitda_good < b.debt_ebitda_ok);
            assert!(b.interest_coverage_good > b.interest_coverage_ok);
            assert!(b.payout_good < b.payout_ok);
        }
    }

    #[test]
    fn book_value_sectors() {
        assert!(SectorContext::resolve(Some("Utilities")).book_value_meaningful());
        assert!(!SectorContext::resolve(Some("Technology")).book_value_meaningful());
        assert!(!SectorContext::resolve(None).book_value_meaningful());
    }
}
