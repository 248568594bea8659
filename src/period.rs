//! Period granularity of a time series and its row-label patterns

use crate::error::{StatError, StatResult};
use crate::types::IndexKey;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Periodicity of a time series; decides which rows of a source sheet are data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PeriodGranularity {
    Annual,
    #[default]
    Quarterly,
    Monthly,
}

/// Chronological position of a period label.
///
/// Month abbreviations outside JAN..DEC still match the monthly pattern;
/// they sort after December, then by their text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PeriodOrdinal {
    year: u32,
    sub_period: u8,
    tail: String,
}

impl PeriodGranularity {
    /// Name of the key column for this granularity
    pub fn display_name(&self) -> &'static str {
        match self {
            PeriodGranularity::Annual => "Year",
            PeriodGranularity::Quarterly => "Quarter",
            PeriodGranularity::Monthly => "Month",
        }
    }

    /// Anchored label pattern
    pub fn pattern(&self) -> &'static Regex {
        static ANNUAL: OnceLock<Regex> = OnceLock::new();
        static QUARTERLY: OnceLock<Regex> = OnceLock::new();
        static MONTHLY: OnceLock<Regex> = OnceLock::new();

        let (cell, source) = match self {
            PeriodGranularity::Annual => (&ANNUAL, r"^[0-9]{4}$"),
            PeriodGranularity::Quarterly => (&QUARTERLY, r"^[0-9]{4} Q[0-4]$"),
            PeriodGranularity::Monthly => (&MONTHLY, r"^[0-9]{4} [A-Z]{3}$"),
        };
        cell.get_or_init(|| Regex::new(source).expect("period pattern is valid"))
    }

    pub fn matches(&self, label: &str) -> bool {
        self.pattern().is_match(label)
    }

    /// Row key for a matching label: integers for annual data, text otherwise
    pub fn parse_key(&self, label: &str) -> Option<IndexKey> {
        if !self.matches(label) {
            return None;
        }
        match self {
            PeriodGranularity::Annual => label.parse().ok().map(IndexKey::Int),
            _ => Some(IndexKey::Text(label.to_string())),
        }
    }

    /// Chronological ordinal of a matching label
    pub fn ordinal(&self, label: &str) -> Option<PeriodOrdinal> {
        if !self.matches(label) {
            return None;
        }
        // All three patterns start with four ASCII digits
        let year = label[..4].parse().ok()?;
        let rest = label.get(5..).unwrap_or("");
        let (sub_period, tail) = match self {
            PeriodGranularity::Annual => (0, String::new()),
            PeriodGranularity::Quarterly => (rest[1..].parse().ok()?, String::new()),
            PeriodGranularity::Monthly => match MONTHS.iter().position(|m| *m == rest) {
                Some(i) => (i as u8 + 1, String::new()),
                None => (MONTHS.len() as u8 + 1, rest.to_string()),
            },
        };
        Some(PeriodOrdinal {
            year,
            sub_period,
            tail,
        })
    }

    /// Check a caller-supplied first period against this granularity
    pub fn validate_first_period(&self, first_period: &str) -> StatResult<PeriodOrdinal> {
        self.ordinal(first_period).ok_or_else(|| {
            StatError::Validation(format!(
                "The first time period '{}' and period type '{}' do not match up",
                first_period, self
            ))
        })
    }
}

impl fmt::Display for PeriodGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PeriodGranularity::Annual => "annual",
            PeriodGranularity::Quarterly => "quarterly",
            PeriodGranularity::Monthly => "monthly",
        };
        f.write_str(name)
    }
}

impl FromStr for PeriodGranularity {
    type Err = StatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "annual" | "year" | "yearly" => Ok(PeriodGranularity::Annual),
            "quarterly" | "quarter" => Ok(PeriodGranularity::Quarterly),
            "monthly" | "month" => Ok(PeriodGranularity::Monthly),
            other => Err(StatError::Validation(format!(
                "Unknown period '{}', expected annual, quarterly or monthly",
                other
            ))),
        }
    }
}
