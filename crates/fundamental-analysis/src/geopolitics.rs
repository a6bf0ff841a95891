//! Country risk classification. The resulting penalty is subtracted from the
//! composite score only.

use serde::{Deserialize, Serialize};

const SAFE_COUNTRIES: &[&str] = &[
    "United States",
    "Canada",
    "United Kingdom",
    "Ireland",
    "Germany",
    "France",
    "Netherlands",
    "Belgium",
    "Luxembourg",
    "Switzerland",
    "Austria",
    "Sweden",
    "Norway",
    "Denmark",
    "Finland",
    "Iceland",
    "Spain",
    "Portugal",
    "Italy",
    "Japan",
    "Australia",
    "New Zealand",
    "Singapore",
];

const CAUTION_COUNTRIES: &[&str] = &[
    "China",
    "Hong Kong",
    "Taiwan",
    "South Korea",
    "India",
    "Israel",
    "Brazil",
    "Mexico",
    "Chile",
    "Colombia",
    "Peru",
    "South Africa",
    "Indonesia",
    "Malaysia",
    "Thailand",
    "Philippines",
    "Vietnam",
    "Poland",
    "Greece",
    "Saudi Arabia",
    "United Arab Emirates",
];

const HIGH_RISK_COUNTRIES: &[&str] = &[
    "Russia",
    "Belarus",
    "Ukraine",
    "Argentina",
    "Venezuela",
    "Turkey",
    "Iran",
    "Nigeria",
    "Egypt",
    "Pakistan",
    "Lebanon",
    "Kazakhstan",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoRiskTier {
    Safe,
    Caution,
    HighRisk,
    /// Not on any list; treated as moderately risky.
    Unclassified,
}

impl GeoRiskTier {
    pub fn classify(country: Option<&str>) -> Self {
        let Some(country) = country.map(str::trim).filter(|c| !c.is_empty()) else {
            return GeoRiskTier::Unclassified;
        };
        let listed = |list: &[&str]| list.iter().any(|c| c.eq_ignore_ascii_case(country));
        if listed(SAFE_COUNTRIES) {
            GeoRiskTier::Safe
        } else if listed(CAUTION_COUNTRIES) {
            GeoRiskTier::Caution
        } else if listed(HIGH_RISK_COUNTRIES) {
            GeoRiskTier::HighRisk
        } else {
            GeoRiskTier::Unclassified
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            GeoRiskTier::Safe => 10.0,
            GeoRiskTier::Caution => 6.0,
            GeoRiskTier::HighRisk => 2.0,
            GeoRiskTier::Unclassified => 5.0,
        }
    }

    pub fn penalty(&self) -> f64 {
        match self {
            GeoRiskTier::Safe => 0.0,
            GeoRiskTier::Caution => 1.5,
            GeoRiskTier::HighRisk => 3.0,
            GeoRiskTier::Unclassified => 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeopoliticalRisk {
    pub country: Option<String>,
    pub tier: GeoRiskTier,
    pub score: f64,
    pub penalty: f64,
}

impl GeopoliticalRisk {
    pub fn assess(country: Option<&str>) -> Self {
        let tier = GeoRiskTier::classify(country);
        Self {
            country: country.map(str::to_string),
            tier,
            score: tier.score(),
            penalty: tier.penalty(),
        }
    }
}
