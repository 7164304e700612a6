//! Option contract identifiers and the upstream symbol token format.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::enums::OptionType;

/// One option instrument of the weekly chain.
///
/// Renders (via `Display`) to the opaque token the feed expects:
/// `{root}{yy}{month}{dd}{strike}{CE|PE}` where the month is not zero-padded,
/// e.g. `NIFTY2510724500CE` for the 7 Jan 2025 expiry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractId {
    pub root: String,
    pub expiry_year2: u32,
    pub expiry_month: u32,
    pub expiry_day: u32,
    pub strike: u32,
    pub option_type: OptionType,
}

impl ContractId {
    pub fn new(root: &str, expiry: NaiveDate, strike: u32, option_type: OptionType) -> Self {
        Self {
            root: root.to_string(),
            expiry_year2: expiry.year().rem_euclid(100) as u32,
            expiry_month: expiry.month(),
            expiry_day: expiry.day(),
            strike,
            option_type,
        }
    }

    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:02}{}{:02}{}{}",
            self.root,
            self.expiry_year2,
            self.expiry_month,
            self.expiry_day,
            self.strike,
            self.option_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_pads_year_and_day_but_not_month() {
        let expiry = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
        let id = ContractId::new("NIFTY", expiry, 24000, OptionType::Call);
        assert_eq!(id.token(), "NIFTY2510724000CE");

        let expiry = NaiveDate::from_ymd_opt(2025, 10, 28).unwrap();
        let id = ContractId::new("NIFTY", expiry, 26050, OptionType::Put);
        assert_eq!(id.to_string(), "NIFTY25102826050PE");
    }

    #[test]
    fn year_2100_wraps_to_two_digits() {
        let expiry = NaiveDate::from_ymd_opt(2105, 3, 3).unwrap();
        let id = ContractId::new("NIFTY", expiry, 100, OptionType::Call);
        assert_eq!(id.to_string(), "NIFTY05303100CE");
    }
}
