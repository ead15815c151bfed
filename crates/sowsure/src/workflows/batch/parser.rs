use std::io::Read;

use serde::{Deserialize, Deserializer};

use crate::workflows::assessment::{ApplicantSubmission, HazardSelection};

/// One data row, keyed by its 1-based position after the header.
#[derive(Debug)]
pub(crate) struct BatchRecord {
    pub(crate) row: usize,
    pub(crate) label: Option<String>,
    pub(crate) submission: Result<ApplicantSubmission, String>,
}

/// Parse every row independently; only an unreadable header fails the whole file.
pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<BatchRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut records = Vec::new();

    for (index, record) in csv_reader.records().enumerate() {
        let row = index + 1;
        let parsed = record.and_then(|record| record.deserialize::<BatchRow>(Some(&headers)));

        let (label, submission) = match parsed {
            Ok(row) => (row.label(), row.into_submission()),
            Err(error) => (None, Err(error.to_string())),
        };

        records.push(BatchRecord {
            row,
            label,
            submission,
        });
    }

    Ok(records)
}

#[derive(Debug, Default, Deserialize)]
struct BatchRow {
    #[serde(default, alias = "applicant", alias = "name", deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    income: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    expenses: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    loan_payments: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    income_sources: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    loan_history: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    land_ownership: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    equipment_savings: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    crops_storage: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    collateral_ratio: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    insurance: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    banking_history: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    coop_member: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    seismic: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    flood_typhoon: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    other: Option<String>,
}

impl BatchRow {
    fn label(&self) -> Option<String> {
        self.id.clone()
    }

    fn into_submission(self) -> Result<ApplicantSubmission, String> {
        Ok(ApplicantSubmission {
            income: parse_amount("income", self.income)?,
            expenses: parse_amount("expenses", self.expenses)?,
            loan_payments: parse_amount("loan_payments", self.loan_payments)?,
            income_sources: parse_choice(self.income_sources)?,
            loan_history: parse_choice(self.loan_history)?,
            land_ownership: parse_choice(self.land_ownership)?,
            equipment_savings: parse_amount("equipment_savings", self.equipment_savings)?,
            crops_storage: parse_amount("crops_storage", self.crops_storage)?,
            collateral_ratio: parse_amount("collateral_ratio", self.collateral_ratio)?,
            insurance: parse_choice(self.insurance)?,
            banking_history: parse_choice(self.banking_history)?,
            coop_member: parse_flag(self.coop_member)?,
            hazards: HazardSelection {
                seismic: parse_choice(self.seismic)?,
                flood_typhoon: parse_choice(self.flood_typhoon)?,
                other: parse_choice(self.other)?,
            },
        })
    }
}

fn parse_amount(field: &str, raw: Option<String>) -> Result<Option<f64>, String> {
    raw.map(|value| {
        value
            .replace(',', "")
            .parse::<f64>()
            .map_err(|_| format!("{field} value '{value}' is not a number"))
    })
    .transpose()
}

fn parse_choice<T>(raw: Option<String>) -> Result<Option<T>, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| value.parse::<T>().map_err(|error| error.to_string()))
        .transpose()
}

fn parse_flag(raw: Option<String>) -> Result<bool, String> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("true" | "yes" | "y" | "1") => Ok(true),
        Some("false" | "no" | "n" | "0") => Ok(false),
        Some(other) => Err(format!("coop_member value '{other}' is not a yes/no answer")),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::assessment::{HazardLevel, LoanHistory};

    #[test]
    fn rows_parse_independently() {
        let csv = "\
id,income,expenses,loan_payments,income_sources,loan_history,land_ownership,equipment_savings,crops_storage,collateral_ratio,insurance,banking_history,coop_member,seismic,flood_typhoon,other
F-1,\"300,000\",150000,50000,multiple,on_time,owned_medium,75000,30000,1.2,crop_life,savings_and_good_loans,yes,low,low,low
F-2,120000,90000,20000,rice,sometimes,tenant,5000,1000,0.4,none,none,no,high,high,moderate
";
        let records = parse_records(csv.as_bytes()).expect("header parses");
        assert_eq!(records.len(), 2);

        let first = records[0].submission.as_ref().expect("first row parses");
        assert_eq!(records[0].label.as_deref(), Some("F-1"));
        assert_eq!(first.income, Some(300000.0));
        assert_eq!(first.loan_history, Some(LoanHistory::OnTime));
        assert!(first.coop_member);
        assert_eq!(first.hazards.other, Some(HazardLevel::Low));

        let second = records[1].submission.as_ref().expect_err("bad loan history");
        assert!(second.contains("unknown loan_history value 'sometimes'"));
        assert_eq!(records[1].row, 2);
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag(None), Ok(false));
        assert_eq!(parse_flag(Some("YES".to_string())), Ok(true));
        assert_eq!(parse_flag(Some("0".to_string())), Ok(false));
        assert!(parse_flag(Some("maybe".to_string())).is_err());
    }
}
