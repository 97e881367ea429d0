//! Per-file aggregation of USV call tables.

use std::fmt;
use std::path::Path;

use crate::input::{InputError, csv_reader};

pub const ACCEPTED_COLUMN: &str = "Accepted";
pub const LABEL_COLUMN: &str = "Label";
pub const CALL_LENGTH_COLUMN: &str = "Call Length (s)";

pub const MEASUREMENT_COLUMNS: [&str; 11] = [
    "Call Length (s)",
    "Principal Frequency (kHz)",
    "Low Freq (kHz)",
    "High Freq (kHz)",
    "Delta Freq (kHz)",
    "Frequency Standard Deviation (kHz)",
    "Slope (kHz/s)",
    "Sinuosity",
    "Mean Power (dB/Hz)",
    "Tonality",
    "Peak Freq (kHz)",
];

pub const COMMON_LABELS: [&str; 10] = [
    "Downward",
    "2Syllabes",
    "Complex",
    "Chevron",
    "Harmonic",
    "Composite",
    "Flat",
    "Frequency_Step",
    "DChevron",
    "Upward",
];

/// Cell values read as missing, alongside the empty cell.
pub const NA_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub const TOTAL_COUNT_METRIC: &str = "Total_USVs_Count";
pub const CALL_LENGTH_SUM_METRIC: &str = "Call_Length_s_Sum";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Missing,
    Empty,
    NoAcceptedColumn,
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Missing => f.write_str("file not found"),
            SkipReason::Empty => f.write_str("empty file"),
            SkipReason::NoAcceptedColumn => write!(f, "no '{ACCEPTED_COLUMN}' column"),
            SkipReason::Unreadable(reason) => write!(f, "unreadable: {reason}"),
        }
    }
}

impl From<InputError> for SkipReason {
    fn from(err: InputError) -> Self {
        SkipReason::Unreadable(err.to_string())
    }
}

impl From<csv::Error> for SkipReason {
    fn from(err: csv::Error) -> Self {
        SkipReason::Unreadable(err.to_string())
    }
}

/// Ordered metric name/value pairs for one file.
pub type FileMetrics = Vec<(String, Option<f64>)>;

/// Column-name sanitizing shared by metric and label names.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '(' | ')' | '.'))
        .map(|c| if c == ' ' || c == '/' { '_' } else { c })
        .collect()
}

pub fn mean_metric_name(column: &str) -> String {
    format!("{}_Mean", sanitize(column))
}

pub fn label_metric_name(label: &str) -> String {
    format!("Label_{}_Count", sanitize(label))
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || NA_TOKENS.contains(&cell)
}

fn is_accepted(cell: &str) -> bool {
    let v = cell.trim().to_ascii_lowercase();
    v == "true" || v == "1"
}

/// Metric names every file produces, in output order.
pub fn base_metric_names() -> Vec<String> {
    let mut names = vec![
        TOTAL_COUNT_METRIC.to_string(),
        mean_metric_name(CALL_LENGTH_COLUMN),
        CALL_LENGTH_SUM_METRIC.to_string(),
    ];
    names.extend(MEASUREMENT_COLUMNS[1..].iter().map(|c| mean_metric_name(c)));
    names.extend(COMMON_LABELS.iter().map(|l| label_metric_name(l)));
    names
}

pub fn aggregate_usv_file(path: &Path) -> Result<FileMetrics, SkipReason> {
    if !path.exists() {
        return Err(SkipReason::Missing);
    }
    let mut reader = csv_reader(path)?;
    let headers = reader.headers()?.clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(SkipReason::Empty);
    }
    let column = |name: &str| headers.iter().position(|h| h == name);
    let accepted_idx = column(ACCEPTED_COLUMN).ok_or(SkipReason::NoAcceptedColumn)?;
    let label_idx = column(LABEL_COLUMN);

    let measurement_idx: Vec<Option<usize>> =
        MEASUREMENT_COLUMNS.iter().map(|c| column(*c)).collect();
    let mut numeric = vec![true; MEASUREMENT_COLUMNS.len()];
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); MEASUREMENT_COLUMNS.len()];
    let mut labels: Vec<(String, usize)> = Vec::new();
    let mut accepted = 0usize;

    for record in reader.records() {
        let record = record?;
        let keep = is_accepted(record.get(accepted_idx).unwrap_or(""));
        for (slot, idx) in measurement_idx.iter().enumerate() {
            let Some(idx) = idx else { continue };
            let cell = record.get(*idx).unwrap_or("");
            if is_missing(cell) {
                continue;
            }
            match cell.parse::<f64>() {
                Ok(v) if keep && v.is_finite() => values[slot].push(v),
                Ok(_) => {}
                Err(_) => numeric[slot] = false,
            }
        }
        if !keep {
            continue;
        }
        accepted += 1;
        if let Some(idx) = label_idx
            && let Some(label) = record.get(idx).filter(|l| !is_missing(l))
        {
            match labels.iter_mut().find(|(l, _)| l == label) {
                Some((_, count)) => *count += 1,
                None => labels.push((label.to_string(), 1)),
            }
        }
    }

    let column_mean = |slot: usize| -> Option<f64> {
        if accepted == 0 || measurement_idx[slot].is_none() || !numeric[slot] {
            return None;
        }
        let v = &values[slot];
        (!v.is_empty()).then(|| v.iter().sum::<f64>() / v.len() as f64)
    };
    let call_length_sum = (accepted > 0 && measurement_idx[0].is_some() && numeric[0])
        .then(|| values[0].iter().sum::<f64>());

    let mut out: FileMetrics = Vec::with_capacity(MEASUREMENT_COLUMNS.len() + labels.len() + 12);
    out.push((TOTAL_COUNT_METRIC.to_string(), Some(accepted as f64)));
    out.push((mean_metric_name(CALL_LENGTH_COLUMN), column_mean(0)));
    out.push((CALL_LENGTH_SUM_METRIC.to_string(), call_length_sum));
    for (slot, name) in MEASUREMENT_COLUMNS.iter().enumerate().skip(1) {
        out.push((mean_metric_name(name), column_mean(slot)));
    }
    for label in COMMON_LABELS {
        out.push((label_metric_name(label), Some(0.0)));
    }
    for (label, count) in labels {
        let name = label_metric_name(&label);
        match out.iter_mut().find(|(n, _)| *n == name) {
            Some((_, value)) => *value = Some(count as f64),
            None => out.push((name, Some(count as f64))),
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/usv.rs"]
mod tests;
