//! Strike universe generation and batch partitioning.

use chrono::NaiveDate;

use crate::models::contract::ContractId;
use crate::models::enums::OptionType;

/// Every contract of one scan, in emission order (ascending strike, CE before PE).
///
/// Emission order is the tie-break for equal rank scores, so it is never
/// re-sorted after generation.
#[derive(Debug, Clone, Default)]
pub struct ScanUniverse {
    contracts: Vec<ContractId>,
}

impl ScanUniverse {
    /// Generate both sides for every strike in `[strike_start, strike_end)`.
    ///
    /// A zero `strike_step` yields an empty universe rather than looping forever;
    /// `ScannerConfig::validate` rejects that case before a scan gets here.
    pub fn generate(
        root: &str,
        strike_start: u32,
        strike_end: u32,
        strike_step: u32,
        expiry: NaiveDate,
    ) -> Self {
        if strike_step == 0 {
            return Self::default();
        }

        let contracts = (strike_start..strike_end)
            .step_by(strike_step as usize)
            .flat_map(|strike| {
                OptionType::BOTH
                    .into_iter()
                    .map(move |side| ContractId::new(root, expiry, strike, side))
            })
            .collect();

        Self { contracts }
    }

    pub fn contracts(&self) -> &[ContractId] {
        &self.contracts
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Split the feed tokens into consecutive, non-overlapping batches of at
    /// most `batch_size`. Only the last batch may be short.
    pub fn batches(&self, batch_size: usize) -> Vec<Vec<String>> {
        if batch_size == 0 {
            return Vec::new();
        }
        self.contracts
            .chunks(batch_size)
            .map(|chunk| chunk.iter().map(ContractId::token).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 14).unwrap()
    }

    #[test]
    fn two_sides_per_strike_in_order() {
        let u = ScanUniverse::generate("NIFTY", 24000, 24200, 50, expiry());
        let tokens: Vec<String> = u.contracts().iter().map(ContractId::token).collect();
        assert_eq!(
            tokens,
            vec![
                "NIFTY25101424000CE",
                "NIFTY25101424000PE",
                "NIFTY25101424050CE",
                "NIFTY25101424050PE",
                "NIFTY25101424100CE",
                "NIFTY25101424100PE",
                "NIFTY25101424150CE",
                "NIFTY25101424150PE",
            ]
        );
    }

    #[test]
    fn end_strike_is_exclusive() {
        let u = ScanUniverse::generate("NIFTY", 24000, 27000, 50, expiry());
        assert_eq!(u.len(), 120);
        let last = u.contracts().last().unwrap();
        assert_eq!(last.strike, 26950);
        assert_eq!(last.option_type, OptionType::Put);

        // A step that does not divide the range stops below the end.
        let u = ScanUniverse::generate("NIFTY", 100, 260, 75, expiry());
        let strikes: Vec<u32> = u.contracts().iter().map(|c| c.strike).collect();
        assert_eq!(strikes, vec![100, 100, 175, 175, 250, 250]);
    }

    #[test]
    fn empty_ranges() {
        assert!(ScanUniverse::generate("NIFTY", 24000, 24000, 50, expiry()).is_empty());
        assert!(ScanUniverse::generate("NIFTY", 24000, 25000, 0, expiry()).is_empty());
    }

    #[test]
    fn batches_are_disjoint_and_exhaustive() {
        let u = ScanUniverse::generate("NIFTY", 24000, 27000, 50, expiry());
        let batches = u.batches(50);
        assert_eq!(batches.len(), 3);
        assert!(batches[..2].iter().all(|b| b.len() == 50));
        assert_eq!(batches[2].len(), 20);

        let flattened: Vec<String> = batches.into_iter().flatten().collect();
        let expected: Vec<String> = u.contracts().iter().map(ContractId::token).collect();
        assert_eq!(flattened, expected);
    }
}
