use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal risk band derived solely from the penalty score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskClassification {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Very High Risk")]
    VeryHigh,
}

impl RiskClassification {
    /// Bands: 0-20 low, 21-40 medium, 41-60 high, 61 and above very high.
    pub const fn from_score(score: u32) -> Self {
        match score {
            0..=20 => RiskClassification::Low,
            21..=40 => RiskClassification::Medium,
            41..=60 => RiskClassification::High,
            _ => RiskClassification::VeryHigh,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RiskClassification::Low => "Low Risk",
            RiskClassification::Medium => "Medium Risk",
            RiskClassification::High => "High Risk",
            RiskClassification::VeryHigh => "Very High Risk",
        }
    }

    /// Loan terms lenders typically attach to the band.
    pub const fn lending_guidance(self) -> &'static str {
        match self {
            RiskClassification::Low => "best loan terms",
            RiskClassification::Medium => "standard loan terms",
            RiskClassification::High => "higher interest rates",
            RiskClassification::VeryHigh => "may need guarantors or co-signers",
        }
    }
}

impl fmt::Display for RiskClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
