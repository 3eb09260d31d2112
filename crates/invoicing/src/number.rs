//! Sequential, human-readable invoice numbers (`INV-0001`, `INV-0002`, ...).

use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use invoicer_core::{DomainError, DomainResult};

const PREFIX: &str = "INV-";

/// Minimum number of digits; longer sequences are never truncated.
const MIN_DIGITS: usize = 4;

/// An invoice number: the `INV-` prefix followed by a zero-padded sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvoiceNumber(u64);

impl InvoiceNumber {
    /// Number assigned to the very first invoice.
    pub const fn first() -> Self {
        Self(1)
    }

    pub const fn sequence(self) -> u64 {
        self.0
    }

    /// The number following this one.
    pub fn next(self) -> DomainResult<Self> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or_else(|| DomainError::invariant("invoice number sequence exhausted"))
    }

    /// Derive the number for a new invoice from the most recently created one.
    ///
    /// The latest number must parse as `INV-<digits>`; anything else is rejected
    /// instead of guessing a fallback.
    pub fn next_after(latest: Option<&str>) -> DomainResult<Self> {
        match latest {
            None => Ok(Self::first()),
            Some(raw) => raw
                .parse::<InvoiceNumber>()
                .map_err(|_| {
                    DomainError::validation(format!(
                        "cannot derive the next invoice number from '{raw}'"
                    ))
                })?
                .next(),
        }
    }
}

impl core::fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{PREFIX}{:0width$}", self.0, width = MIN_DIGITS)
    }
}

impl FromStr for InvoiceNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::validation(format!("malformed invoice number '{s}'"));

        let digits = s.strip_prefix(PREFIX).ok_or_else(invalid)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        digits.parse::<u64>().map(Self).map_err(|_| invalid())
    }
}

impl Serialize for InvoiceNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for InvoiceNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn first_invoice_is_inv_0001() {
        assert_eq!(InvoiceNumber::next_after(None).unwrap().to_string(), "INV-0001");
    }

    #[test]
    fn increments_the_latest_number() {
        let next = InvoiceNumber::next_after(Some("INV-0041")).unwrap();
        assert_eq!(next.to_string(), "INV-0042");
    }

    #[test]
    fn padding_grows_past_four_digits() {
        let next = InvoiceNumber::next_after(Some("INV-9999")).unwrap();
        assert_eq!(next.to_string(), "INV-10000");
        assert_eq!("INV-10000".parse::<InvoiceNumber>().unwrap().sequence(), 10_000);
    }

    #[test]
    fn unparseable_latest_number_is_a_validation_error() {
        for legacy in ["2024-001", "INV-", "INV-12a", "inv-0003", "INV--1"] {
            match InvoiceNumber::next_after(Some(legacy)) {
                Err(DomainError::Validation(msg)) => assert!(msg.contains(legacy)),
                other => panic!("expected validation error for {legacy:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn serializes_as_display_string() {
        let json = serde_json::to_string(&InvoiceNumber::first()).unwrap();
        assert_eq!(json, "\"INV-0001\"");
        let back: InvoiceNumber = serde_json::from_str("\"INV-0107\"").unwrap();
        assert_eq!(back.sequence(), 107);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: numbering a run of invoices with no deletions yields 1, 2, 3, ...
        #[test]
        fn sequential_creation_is_monotonic(count in 1usize..200) {
            let mut latest: Option<String> = None;
            for expected in 1..=count as u64 {
                let next = InvoiceNumber::next_after(latest.as_deref()).unwrap();
                prop_assert_eq!(next.sequence(), expected);
                latest = Some(next.to_string());
            }
        }
    }
}
