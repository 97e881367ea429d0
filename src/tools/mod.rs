pub mod finance;
pub mod split;
pub mod words;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("percentage for person {person} must be between 0 and 100, got {value}")]
    PercentageOutOfRange { person: usize, value: f64 },
    #[error("percentages add up to {0:.2}%; they must total 100%")]
    PercentagesDontSum(f64),
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("no text to analyse")]
    EmptyInput,
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// `1234567.891` -> `1,234,567.89` at `decimals` places.
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };
    let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    let is_zero = formatted.chars().all(|c| c == '0' || c == '.');
    if value.is_sign_negative() && !is_zero {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/tools/mod.rs"]
mod tests;
