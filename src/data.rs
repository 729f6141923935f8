use std::{fmt, str::FromStr, sync::OnceLock};

use anyhow::{Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Empty,
    Currency,
    Percentage,
    Date,
    Number,
    Text,
}

impl DataType {
    pub(crate) const ALL: [DataType; 6] = [
        DataType::Empty,
        DataType::Currency,
        DataType::Percentage,
        DataType::Date,
        DataType::Number,
        DataType::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Empty => "empty",
            DataType::Currency => "currency",
            DataType::Percentage => "percentage",
            DataType::Date => "date",
            DataType::Number => "number",
            DataType::Text => "text",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        DataType::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str() == lowered)
            .ok_or_else(|| anyhow!("Unknown data type '{s}'"))
    }
}

struct Patterns {
    currency: Regex,
    negative_currency: Regex,
    percentage: Regex,
    dates: [Regex; 3],
    number: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        currency: compile(r"^\$[\d,]+\.?\d*$"),
        negative_currency: compile(r"^\(\$[\d,]+\.?\d*\)$"),
        percentage: compile(r"^\d+\.?\d*%$"),
        dates: [
            compile(r"^\d{1,2}/\d{1,2}/\d{4}$"),
            compile(r"^\d{4}-\d{1,2}-\d{1,2}$"),
            compile(r"^\d{1,2}-\d{1,2}-\d{4}$"),
        ],
        number: compile(r"^(?:-?[\d,]*\d\.?\d*|-?\.\d+|\(\s*[\d,]*\d\.?\d*\s*\))$"),
    })
}

// Patterns are literals above; a failure here is a programming error.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid built-in pattern {pattern}: {err}"))
}

/// Fixed priority: empty, currency, percentage, date, number, then text.
pub fn classify(value: &str) -> DataType {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return DataType::Empty;
    }
    let patterns = patterns();
    if patterns.currency.is_match(trimmed)
        || patterns.negative_currency.is_match(trimmed)
        || trimmed.contains(CURRENCY_SYMBOLS)
    {
        return DataType::Currency;
    }
    if patterns.percentage.is_match(trimmed) {
        return DataType::Percentage;
    }
    if patterns.dates.iter().any(|re| re.is_match(trimmed)) {
        return DataType::Date;
    }
    if patterns.number.is_match(trimmed) {
        return DataType::Number;
    }
    DataType::Text
}

/// True for values that carry an amount: currency, plain numbers, or percentages.
pub fn looks_numeric_or_currency(value: &str) -> bool {
    matches!(
        classify(value),
        DataType::Currency | DataType::Number | DataType::Percentage
    )
}

pub fn classify_row(row: &[String]) -> Vec<DataType> {
    row.iter().map(|cell| classify(cell)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_follows_priority_order() {
        assert_eq!(classify("   "), DataType::Empty);
        assert_eq!(classify("$1,234.50"), DataType::Currency);
        assert_eq!(classify("($12.00)"), DataType::Currency);
        assert_eq!(classify("EUR 10 €"), DataType::Currency);
        assert_eq!(classify("45%"), DataType::Percentage);
        assert_eq!(classify("12.5%"), DataType::Percentage);
        assert_eq!(classify("01/15/2024"), DataType::Date);
        assert_eq!(classify("2024-1-5"), DataType::Date);
        assert_eq!(classify("1-15-2024"), DataType::Date);
        assert_eq!(classify("1,234"), DataType::Number);
        assert_eq!(classify("(42.10)"), DataType::Number);
        assert_eq!(classify("-7"), DataType::Number);
        assert_eq!(classify("fifty"), DataType::Text);
        assert_eq!(classify("12abc"), DataType::Text);
    }

    #[test]
    fn data_type_parses_display_names() {
        for ty in DataType::ALL {
            assert_eq!(ty.to_string().parse::<DataType>().unwrap(), ty);
        }
        assert!("decimal".parse::<DataType>().is_err());
    }

    #[test]
    fn looks_numeric_or_currency_excludes_dates_and_text() {
        assert!(looks_numeric_or_currency("$5"));
        assert!(looks_numeric_or_currency("17"));
        assert!(looks_numeric_or_currency("3%"));
        assert!(!looks_numeric_or_currency("01/01/2024"));
        assert!(!looks_numeric_or_currency("Total"));
        assert!(!looks_numeric_or_currency(""));
    }
}
