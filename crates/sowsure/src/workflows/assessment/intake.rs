use super::domain::{ApplicantProfile, ApplicantSubmission, HazardProfile};

/// Reasons a submission cannot be scored.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", .fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },
    #[error("{field} must be a finite, non-negative amount (found {value})")]
    InvalidAmount { field: &'static str, value: f64 },
}

impl ValidationError {
    pub fn missing_fields(&self) -> &[&'static str] {
        match self {
            ValidationError::MissingFields { fields } => fields,
            ValidationError::InvalidAmount { .. } => &[],
        }
    }
}

/// Convert a submission into a complete profile, listing every missing field at once.
///
/// Zero counts as missing for every amount, matching how the intake form treats an
/// untouched numeric input.
pub fn profile_from_submission(
    submission: &ApplicantSubmission,
) -> Result<ApplicantProfile, ValidationError> {
    let mut missing = Vec::new();
    let mut invalid = None;

    let mut amount = |field: &'static str, value: Option<f64>| -> f64 {
        match value {
            Some(v) if !v.is_finite() || v < 0.0 => {
                invalid.get_or_insert(ValidationError::InvalidAmount { field, value: v });
                0.0
            }
            Some(v) if v > 0.0 => v,
            _ => {
                missing.push(field);
                0.0
            }
        }
    };

    let income = amount("income", submission.income);
    let expenses = amount("expenses", submission.expenses);
    let loan_payments = amount("loan_payments", submission.loan_payments);
    let equipment_savings = amount("equipment_savings", submission.equipment_savings);
    let crops_storage = amount("crops_storage", submission.crops_storage);
    let collateral_ratio = amount("collateral_ratio", submission.collateral_ratio);

    let income_sources = require(&mut missing, "income_sources", submission.income_sources);
    let loan_history = require(&mut missing, "loan_history", submission.loan_history);
    let land_ownership = require(&mut missing, "land_ownership", submission.land_ownership);
    let insurance = require(&mut missing, "insurance", submission.insurance);
    let banking_history = require(&mut missing, "banking_history", submission.banking_history);

    let hazards = &submission.hazards;
    let seismic = require(&mut missing, "hazards.seismic", hazards.seismic);
    let flood_typhoon = require(&mut missing, "hazards.flood_typhoon", hazards.flood_typhoon);
    let other = require(&mut missing, "hazards.other", hazards.other);

    if !missing.is_empty() {
        return Err(ValidationError::MissingFields { fields: missing });
    }
    if let Some(err) = invalid {
        return Err(err);
    }

    match (
        income_sources,
        loan_history,
        land_ownership,
        insurance,
        banking_history,
        seismic,
        flood_typhoon,
        other,
    ) {
        (
            Some(income_sources),
            Some(loan_history),
            Some(land_ownership),
            Some(insurance),
            Some(banking_history),
            Some(seismic),
            Some(flood_typhoon),
            Some(other),
        ) => Ok(ApplicantProfile {
            income,
            expenses,
            loan_payments,
            income_sources,
            loan_history,
            land_ownership,
            equipment_savings,
            crops_storage,
            collateral_ratio,
            insurance,
            banking_history,
            coop_member: submission.coop_member,
            hazards: HazardProfile {
                seismic,
                flood_typhoon,
                other,
            },
        }),
        _ => Err(ValidationError::MissingFields { fields: missing }),
    }
}

fn require<T>(missing: &mut Vec<&'static str>, field: &'static str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        missing.push(field);
    }
    value
}
