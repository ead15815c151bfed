//! Maps free-text hazard findings from the report analysis onto the three-level taxonomy
//! consumed by the scorer.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::debug;

use super::domain::{HazardCategory, HazardLevel, HazardProfile};

/// Structured hazard analysis returned by the report analyzer.
///
/// Analyzer output is loosely shaped: a non-string rating reads as absent and a non-array
/// list reads as empty, so a partial analysis still normalizes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardAnalysis {
    #[serde(default, deserialize_with = "lenient_text")]
    pub risk_level: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub overall_summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub hazard_types: Vec<HazardFinding>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub recommendations: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub key_findings: Vec<String>,
}

/// One hazard named in the analysis, e.g. `Flooding` rated `HIGH`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HazardFinding {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub risk: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_text"
    )]
    pub description: Option<String>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(Some(text)),
        _ => Ok(None),
    }
}

/// Entries that do not fit `T` are dropped rather than rejecting the whole list.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// How findings that land in the same category are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardMergePolicy {
    /// The last finding for a category overwrites earlier ones.
    LastWins,
    /// The most severe finding for a category is kept.
    #[default]
    MostSevere,
}

impl FromStr for HazardMergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last_wins" | "last" => Ok(Self::LastWins),
            "most_severe" | "severe" => Ok(Self::MostSevere),
            other => Err(format!("unknown hazard merge policy '{other}'")),
        }
    }
}

/// Where the normalized levels came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardBasis {
    /// At least one finding was categorized.
    Analysis,
    /// Findings were absent or all moderate; the overall risk level was applied uniformly.
    OverallRisk,
    /// No analysis was available.
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedHazards {
    pub levels: HazardProfile,
    pub basis: HazardBasis,
}

/// Map a free-text risk rating onto a hazard level. Unrecognized text is `moderate`.
pub fn map_risk_level(raw: &str) -> HazardLevel {
    let normalized = raw.to_lowercase();
    if normalized.contains("low") {
        HazardLevel::Low
    } else if normalized.contains("high") {
        HazardLevel::High
    } else {
        HazardLevel::Moderate
    }
}

/// Sort a hazard name into its category by keyword.
pub fn categorize(kind: &str) -> HazardCategory {
    let normalized = kind.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|needle| normalized.contains(needle));

    if has(&["earthquake", "seismic", "fault"]) {
        HazardCategory::Seismic
    } else if has(&["flood", "typhoon", "storm", "cyclone"]) {
        HazardCategory::FloodTyphoon
    } else {
        HazardCategory::Other
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HazardNormalizer {
    policy: HazardMergePolicy,
}

impl HazardNormalizer {
    pub fn new(policy: HazardMergePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> HazardMergePolicy {
        self.policy
    }

    pub fn normalize(&self, analysis: Option<&HazardAnalysis>) -> NormalizedHazards {
        let Some(analysis) = analysis else {
            return NormalizedHazards {
                levels: HazardProfile::conservative(),
                basis: HazardBasis::Default,
            };
        };

        let mut assigned: [Option<HazardLevel>; 3] = [None; 3];
        for finding in &analysis.hazard_types {
            let category = categorize(&finding.kind);
            let level = finding
                .risk
                .as_deref()
                .map(map_risk_level)
                .unwrap_or(HazardLevel::Moderate);
            debug!(
                hazard = %finding.kind,
                category = category.label(),
                level = level.label(),
                "categorized hazard finding"
            );

            let slot = &mut assigned[slot_index(category)];
            *slot = match (self.policy, *slot) {
                (HazardMergePolicy::MostSevere, Some(current)) => Some(current.max(level)),
                _ => Some(level),
            };
        }

        let mut levels = HazardProfile::conservative();
        for category in HazardCategory::ALL {
            if let Some(level) = assigned[slot_index(category)] {
                levels.set(category, level);
            }
        }

        let categorized = assigned.iter().any(Option::is_some);
        if levels == HazardProfile::conservative() {
            if let Some(overall) = analysis.risk_level.as_deref() {
                return NormalizedHazards {
                    levels: HazardProfile::uniform(map_risk_level(overall)),
                    basis: HazardBasis::OverallRisk,
                };
            }
        }

        NormalizedHazards {
            levels,
            basis: if categorized {
                HazardBasis::Analysis
            } else {
                HazardBasis::Default
            },
        }
    }
}

/// Normalize with the default merge policy. Never fails; `None` yields all `moderate`.
pub fn normalize_hazards(analysis: Option<&HazardAnalysis>) -> HazardProfile {
    HazardNormalizer::default().normalize(analysis).levels
}

fn slot_index(category: HazardCategory) -> usize {
    match category {
        HazardCategory::Seismic => 0,
        HazardCategory::FloodTyphoon => 1,
        HazardCategory::Other => 2,
    }
}
