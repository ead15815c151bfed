use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Primary livelihood declared on the loan application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeSource {
    Multiple,
    Rice,
    Corn,
    Vegetables,
    Livestock,
    Other,
}

impl IncomeSource {
    pub const ALL: [IncomeSource; 6] = [
        IncomeSource::Multiple,
        IncomeSource::Rice,
        IncomeSource::Corn,
        IncomeSource::Vegetables,
        IncomeSource::Livestock,
        IncomeSource::Other,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            IncomeSource::Multiple => "multiple",
            IncomeSource::Rice => "rice",
            IncomeSource::Corn => "corn",
            IncomeSource::Vegetables => "vegetables",
            IncomeSource::Livestock => "livestock",
            IncomeSource::Other => "other",
        }
    }
}

/// Repayment record on prior loans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanHistory {
    #[serde(rename = "on_time")]
    OnTime,
    #[serde(rename = "late_1_2")]
    Late1To2,
    #[serde(rename = "late_3_5")]
    Late3To5,
    #[serde(rename = "late_5_plus")]
    Late5Plus,
}

impl LoanHistory {
    pub const ALL: [LoanHistory; 4] = [
        LoanHistory::OnTime,
        LoanHistory::Late1To2,
        LoanHistory::Late3To5,
        LoanHistory::Late5Plus,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            LoanHistory::OnTime => "on_time",
            LoanHistory::Late1To2 => "late_1_2",
            LoanHistory::Late3To5 => "late_3_5",
            LoanHistory::Late5Plus => "late_5_plus",
        }
    }
}

/// Tenure over the farmed land, from most to least secure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandOwnership {
    #[serde(rename = "owned_large")]
    OwnedLarge,
    #[serde(rename = "owned_medium")]
    OwnedMedium,
    #[serde(rename = "titled_1ha_plus")]
    Titled1haPlus,
    #[serde(rename = "small_or_shared")]
    SmallOrShared,
    #[serde(rename = "tenant")]
    Tenant,
    #[serde(rename = "none")]
    Landless,
}

impl LandOwnership {
    pub const ALL: [LandOwnership; 6] = [
        LandOwnership::OwnedLarge,
        LandOwnership::OwnedMedium,
        LandOwnership::Titled1haPlus,
        LandOwnership::SmallOrShared,
        LandOwnership::Tenant,
        LandOwnership::Landless,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            LandOwnership::OwnedLarge => "owned_large",
            LandOwnership::OwnedMedium => "owned_medium",
            LandOwnership::Titled1haPlus => "titled_1ha_plus",
            LandOwnership::SmallOrShared => "small_or_shared",
            LandOwnership::Tenant => "tenant",
            LandOwnership::Landless => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsuranceCoverage {
    #[serde(rename = "crop_life")]
    CropAndLife,
    #[serde(rename = "crop_only")]
    CropOnly,
    #[serde(rename = "none")]
    Uninsured,
}

impl InsuranceCoverage {
    pub const ALL: [InsuranceCoverage; 3] = [
        InsuranceCoverage::CropAndLife,
        InsuranceCoverage::CropOnly,
        InsuranceCoverage::Uninsured,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            InsuranceCoverage::CropAndLife => "crop_life",
            InsuranceCoverage::CropOnly => "crop_only",
            InsuranceCoverage::Uninsured => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BankingHistory {
    #[serde(rename = "savings_and_good_loans")]
    SavingsAndGoodLoans,
    #[serde(rename = "savings_only")]
    SavingsOnly,
    #[serde(rename = "none")]
    Unbanked,
}

impl BankingHistory {
    pub const ALL: [BankingHistory; 3] = [
        BankingHistory::SavingsAndGoodLoans,
        BankingHistory::SavingsOnly,
        BankingHistory::Unbanked,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            BankingHistory::SavingsAndGoodLoans => "savings_and_good_loans",
            BankingHistory::SavingsOnly => "savings_only",
            BankingHistory::Unbanked => "none",
        }
    }
}

/// Normalized severity for one hazard category. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardLevel {
    Low,
    Moderate,
    High,
}

impl HazardLevel {
    pub const ALL: [HazardLevel; 3] = [HazardLevel::Low, HazardLevel::Moderate, HazardLevel::High];

    pub const fn label(self) -> &'static str {
        match self {
            HazardLevel::Low => "low",
            HazardLevel::Moderate => "moderate",
            HazardLevel::High => "high",
        }
    }
}

/// Buckets that individual hazard findings are sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardCategory {
    Seismic,
    FloodTyphoon,
    Other,
}

impl HazardCategory {
    pub const ALL: [HazardCategory; 3] = [
        HazardCategory::Seismic,
        HazardCategory::FloodTyphoon,
        HazardCategory::Other,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            HazardCategory::Seismic => "seismic",
            HazardCategory::FloodTyphoon => "flood_typhoon",
            HazardCategory::Other => "other",
        }
    }
}

/// Fully populated hazard levels consumed by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardProfile {
    pub seismic: HazardLevel,
    pub flood_typhoon: HazardLevel,
    pub other: HazardLevel,
}

impl HazardProfile {
    pub const fn uniform(level: HazardLevel) -> Self {
        Self {
            seismic: level,
            flood_typhoon: level,
            other: level,
        }
    }

    /// Levels used when no usable hazard analysis exists.
    pub const fn conservative() -> Self {
        Self::uniform(HazardLevel::Moderate)
    }

    pub fn level(&self, category: HazardCategory) -> HazardLevel {
        match category {
            HazardCategory::Seismic => self.seismic,
            HazardCategory::FloodTyphoon => self.flood_typhoon,
            HazardCategory::Other => self.other,
        }
    }

    pub fn set(&mut self, category: HazardCategory, level: HazardLevel) {
        match category {
            HazardCategory::Seismic => self.seismic = level,
            HazardCategory::FloodTyphoon => self.flood_typhoon = level,
            HazardCategory::Other => self.other = level,
        }
    }
}

impl Default for HazardProfile {
    fn default() -> Self {
        Self::conservative()
    }
}

/// Hazard levels as submitted; any category may still be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardSelection {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub seismic: Option<HazardLevel>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub flood_typhoon: Option<HazardLevel>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub other: Option<HazardLevel>,
}

impl HazardSelection {
    pub fn is_complete(&self) -> bool {
        self.seismic.is_some() && self.flood_typhoon.is_some() && self.other.is_some()
    }

    /// Fill unset categories from `levels`, keeping explicitly chosen values.
    pub fn fill_from(&mut self, levels: HazardProfile) {
        self.seismic.get_or_insert(levels.seismic);
        self.flood_typhoon.get_or_insert(levels.flood_typhoon);
        self.other.get_or_insert(levels.other);
    }
}

impl From<HazardProfile> for HazardSelection {
    fn from(value: HazardProfile) -> Self {
        Self {
            seismic: Some(value.seismic),
            flood_typhoon: Some(value.flood_typhoon),
            other: Some(value.other),
        }
    }
}

/// Loan application as received from a form, API client, or CSV row.
///
/// Blank strings deserialize as absent values and numeric fields accept numbers or numeric
/// strings, so partially filled forms reach intake validation instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicantSubmission {
    #[serde(default, deserialize_with = "flexible_amount")]
    pub income: Option<f64>,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub expenses: Option<f64>,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub loan_payments: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub income_sources: Option<IncomeSource>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub loan_history: Option<LoanHistory>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub land_ownership: Option<LandOwnership>,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub equipment_savings: Option<f64>,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub crops_storage: Option<f64>,
    #[serde(default, deserialize_with = "flexible_amount")]
    pub collateral_ratio: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub insurance: Option<InsuranceCoverage>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub banking_history: Option<BankingHistory>,
    #[serde(default)]
    pub coop_member: bool,
    #[serde(default)]
    pub hazards: HazardSelection,
}

/// Complete applicant profile accepted by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub income: f64,
    pub expenses: f64,
    pub loan_payments: f64,
    pub income_sources: IncomeSource,
    pub loan_history: LoanHistory,
    pub land_ownership: LandOwnership,
    pub equipment_savings: f64,
    pub crops_storage: f64,
    pub collateral_ratio: f64,
    pub insurance: InsuranceCoverage,
    pub banking_history: BankingHistory,
    pub coop_member: bool,
    pub hazards: HazardProfile,
}

impl ApplicantProfile {
    pub fn net_disposable_income(&self) -> f64 {
        self.income - self.expenses - self.loan_payments
    }
}

impl From<&ApplicantProfile> for ApplicantSubmission {
    fn from(profile: &ApplicantProfile) -> Self {
        Self {
            income: Some(profile.income),
            expenses: Some(profile.expenses),
            loan_payments: Some(profile.loan_payments),
            income_sources: Some(profile.income_sources),
            loan_history: Some(profile.loan_history),
            land_ownership: Some(profile.land_ownership),
            equipment_savings: Some(profile.equipment_savings),
            crops_storage: Some(profile.crops_storage),
            collateral_ratio: Some(profile.collateral_ratio),
            insurance: Some(profile.insurance),
            banking_history: Some(profile.banking_history),
            coop_member: profile.coop_member,
            hazards: HazardSelection::from(profile.hazards),
        }
    }
}

/// Raised when a categorical field carries a value outside its vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field} value '{value}'")]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
}

fn find_variant<T: Copy>(
    field: &'static str,
    raw: &str,
    all: &[T],
    label: fn(T) -> &'static str,
) -> Result<T, UnknownVariant> {
    let needle = raw.trim();
    all.iter()
        .copied()
        .find(|variant| label(*variant).eq_ignore_ascii_case(needle))
        .ok_or_else(|| UnknownVariant {
            field,
            value: needle.to_string(),
        })
}

impl FromStr for IncomeSource {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        find_variant("income_sources", s, &Self::ALL, Self::label)
    }
}

impl FromStr for LoanHistory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        find_variant("loan_history", s, &Self::ALL, Self::label)
    }
}

impl FromStr for LandOwnership {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        find_variant("land_ownership", s, &Self::ALL, Self::label)
    }
}

impl FromStr for InsuranceCoverage {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        find_variant("insurance", s, &Self::ALL, Self::label)
    }
}

impl FromStr for BankingHistory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        find_variant("banking_history", s, &Self::ALL, Self::label)
    }
}

impl FromStr for HazardLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        find_variant("hazard level", s, &Self::ALL, Self::label)
    }
}

impl fmt::Display for HazardLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Number(f64),
    Text(String),
}

fn flexible_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<AmountRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(AmountRepr::Number(value)) => Ok(Some(value)),
        Some(AmountRepr::Text(text)) => {
            let cleaned = text.trim().replace(',', "");
            if cleaned.is_empty() {
                return Ok(None);
            }
            cleaned
                .parse::<f64>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("'{text}' is not a numeric amount")))
        }
    }
}
