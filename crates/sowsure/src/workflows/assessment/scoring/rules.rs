use super::super::domain::{
    ApplicantProfile, BankingHistory, HazardCategory, HazardLevel, IncomeSource,
    InsuranceCoverage, LandOwnership, LoanHistory,
};
use super::{RiskFactor, ScoreComponent};

const COOP_MEMBER_DISCOUNT: i32 = -2;
const NON_MEMBER_PENALTY: i32 = 5;

pub(crate) fn score_components(profile: &ApplicantProfile) -> Vec<ScoreComponent> {
    let mut components = Vec::with_capacity(13);

    // Validation guarantees income > 0, so the ratios below are finite.
    let income = profile.income;

    let ndir = profile.net_disposable_income() / income;
    let points = match ndir {
        r if r >= 0.5 => 0,
        r if r >= 0.3 => 5,
        r if r >= 0.1 => 10,
        r if r >= 0.0 => 15,
        _ => 20,
    };
    push(
        &mut components,
        RiskFactor::IncomeSufficiency,
        points,
        format!("net disposable income ratio {:.0}%", ndir * 100.0),
    );

    let dti = profile.loan_payments / income;
    let points = match dti {
        r if r < 0.2 => 0,
        r if r < 0.3 => 2,
        r if r < 0.4 => 5,
        _ => 8,
    };
    push(
        &mut components,
        RiskFactor::DebtToIncome,
        points,
        format!("loan payments take {:.0}% of income", dti * 100.0),
    );

    let points = match profile.income_sources {
        IncomeSource::Multiple => 0,
        IncomeSource::Livestock => 3,
        IncomeSource::Rice | IncomeSource::Corn | IncomeSource::Vegetables => 5,
        IncomeSource::Other => 8,
    };
    push(
        &mut components,
        RiskFactor::IncomeStability,
        points,
        format!("income source '{}'", profile.income_sources.label()),
    );

    push(
        &mut components,
        RiskFactor::LoanHistory,
        loan_history_points(profile.loan_history),
        format!("repayment history '{}'", profile.loan_history.label()),
    );

    push(
        &mut components,
        RiskFactor::LandOwnership,
        land_ownership_points(profile.land_ownership),
        format!("land tenure '{}'", profile.land_ownership.label()),
    );

    let ratio = profile.collateral_ratio;
    let points = match ratio {
        r if r >= 1.0 => 0,
        r if r >= 0.5 => 5,
        _ => 10,
    };
    let notes = if ratio < 1.0 {
        format!("under-collateralized at {ratio:.2}x loan value")
    } else {
        format!("collateral covers {ratio:.2}x loan value")
    };
    push(&mut components, RiskFactor::Collateral, points, notes);

    let points = match profile.insurance {
        InsuranceCoverage::CropAndLife => 0,
        InsuranceCoverage::CropOnly => 5,
        InsuranceCoverage::Uninsured => 10,
    };
    push(
        &mut components,
        RiskFactor::Insurance,
        points,
        format!("insurance '{}'", profile.insurance.label()),
    );

    let points = match profile.banking_history {
        BankingHistory::SavingsAndGoodLoans => 0,
        BankingHistory::SavingsOnly => 3,
        BankingHistory::Unbanked => 5,
    };
    push(
        &mut components,
        RiskFactor::BankingHistory,
        points,
        format!("banking history '{}'", profile.banking_history.label()),
    );

    if profile.coop_member {
        push(
            &mut components,
            RiskFactor::CooperativeMembership,
            COOP_MEMBER_DISCOUNT,
            "cooperative member".to_string(),
        );
    } else {
        push(
            &mut components,
            RiskFactor::CooperativeMembership,
            NON_MEMBER_PENALTY,
            "not a cooperative member".to_string(),
        );
    }

    for category in HazardCategory::ALL {
        let level = profile.hazards.level(category);
        let factor = match category {
            HazardCategory::Seismic => RiskFactor::SeismicHazard,
            HazardCategory::FloodTyphoon => RiskFactor::FloodTyphoonHazard,
            HazardCategory::Other => RiskFactor::OtherHazard,
        };
        push(
            &mut components,
            factor,
            hazard_points(level),
            format!("{} hazard {}", category.label(), level.label()),
        );
    }

    let buffer = (profile.equipment_savings + profile.crops_storage) / income;
    let points = match buffer {
        r if r >= 0.5 => -5,
        r if r >= 0.25 => -3,
        r if r >= 0.1 => 0,
        _ => 5,
    };
    push(
        &mut components,
        RiskFactor::AssetBuffer,
        points,
        format!("equipment, savings and stored crops cover {:.0}% of income", buffer * 100.0),
    );

    components
}

pub(crate) const fn loan_history_points(history: LoanHistory) -> i32 {
    match history {
        LoanHistory::OnTime => 0,
        LoanHistory::Late1To2 => 3,
        LoanHistory::Late3To5 => 7,
        LoanHistory::Late5Plus => 10,
    }
}

pub(crate) const fn land_ownership_points(ownership: LandOwnership) -> i32 {
    match ownership {
        LandOwnership::OwnedLarge => 0,
        LandOwnership::OwnedMedium => 1,
        LandOwnership::Titled1haPlus => 2,
        LandOwnership::SmallOrShared => 4,
        LandOwnership::Tenant => 7,
        LandOwnership::Landless => 10,
    }
}

pub(crate) const fn hazard_points(level: HazardLevel) -> i32 {
    match level {
        HazardLevel::Low => 0,
        HazardLevel::Moderate => 5,
        HazardLevel::High => 10,
    }
}

fn push(components: &mut Vec<ScoreComponent>, factor: RiskFactor, points: i32, notes: String) {
    components.push(ScoreComponent {
        factor,
        points,
        notes,
    });
}
