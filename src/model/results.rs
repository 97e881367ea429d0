use std::fmt;

use serde::{Serialize, Serializer};

use crate::model::dataset::Factor;
use crate::stats::significance_label;

/// One row of the statistical results table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatResult {
    #[serde(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Test_Type")]
    pub test_type: String,
    #[serde(rename = "Comparison")]
    pub comparison: String,
    #[serde(rename = "F_Statistic", serialize_with = "finite_or_empty")]
    pub statistic: Option<f64>,
    #[serde(rename = "P_Value", serialize_with = "finite_or_empty")]
    pub p_value: Option<f64>,
    #[serde(rename = "Effect_Size", serialize_with = "finite_or_empty")]
    pub effect_size: Option<f64>,
    #[serde(rename = "Significance")]
    pub significance: String,
    #[serde(rename = "Details")]
    pub details: String,
}

impl StatResult {
    pub fn new(metric: &str, test_type: impl Into<String>, comparison: impl Into<String>) -> Self {
        Self {
            metric: metric.to_string(),
            test_type: test_type.into(),
            comparison: comparison.into(),
            statistic: None,
            p_value: None,
            effect_size: None,
            significance: significance_label(f64::NAN).to_string(),
            details: String::new(),
        }
    }

    pub fn statistic(mut self, value: f64) -> Self {
        self.statistic = finite(value);
        self
    }

    /// Sets the p-value and the significance label derived from it.
    pub fn p_value(mut self, value: f64) -> Self {
        self.p_value = finite(value);
        self.significance = significance_label(value).to_string();
        self
    }

    pub fn effect_size(mut self, value: f64) -> Self {
        self.effect_size = finite(value);
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value.is_some_and(|p| p < alpha)
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn finite_or_empty<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) if v.is_finite() => serializer.serialize_f64(*v),
        _ => serializer.serialize_none(),
    }
}

/// A plotted group: one level of a factor, or one (primary, secondary) cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum GroupKey {
    Level { factor: Factor, level: String },
    Cell { primary: String, secondary: String },
}

impl GroupKey {
    pub fn level(factor: Factor, level: impl Into<String>) -> Self {
        GroupKey::Level {
            factor,
            level: level.into(),
        }
    }

    pub fn cell(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        GroupKey::Cell {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Level { level, .. } => f.write_str(level),
            GroupKey::Cell { primary, secondary } => write!(f, "({primary}, {secondary})"),
        }
    }
}

/// A significant pairwise comparison to draw as a bar on the plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub a: GroupKey,
    pub b: GroupKey,
    pub p_value: f64,
    pub label: &'static str,
}

impl Annotation {
    pub fn new(a: GroupKey, b: GroupKey, p_value: f64) -> Self {
        Self {
            a,
            b,
            p_value,
            label: significance_label(p_value),
        }
    }
}

/// Narrative of the analysis, written out next to the results table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisLog {
    lines: Vec<String>,
}

impl AnalysisLog {
    pub fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn extend(&mut self, other: AnalysisLog) {
        self.lines.extend(other.lines);
    }

    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

/// `{:.3}` for finite values, `nan` otherwise.
pub fn fmt3(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.3}")
    } else {
        "nan".to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/results.rs"]
mod tests;
