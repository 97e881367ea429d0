pub mod anova;
pub mod descriptive;
pub mod dist;
pub mod linalg;
pub mod nonparametric;
pub mod normality;
pub mod rank;
pub mod repeated;
pub mod ttest;
pub mod tukey;
pub mod variance;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("{test} needs at least {needed} observations, got {got}")]
    TooFewObservations {
        test: &'static str,
        needed: usize,
        got: usize,
    },
    #[error("{test} needs at least {needed} groups, got {got}")]
    TooFewGroups {
        test: &'static str,
        needed: usize,
        got: usize,
    },
    #[error("{test} is undefined: {reason}")]
    Degenerate { test: &'static str, reason: String },
}

impl StatsError {
    pub(crate) fn degenerate(test: &'static str, reason: impl Into<String>) -> Self {
        Self::Degenerate {
            test,
            reason: reason.into(),
        }
    }
}

pub fn bonferroni(p: f64, m: usize) -> f64 {
    if p.is_nan() {
        return p;
    }
    (p * m.max(1) as f64).min(1.0)
}

pub fn significance_label(p: f64) -> &'static str {
    if p.is_nan() {
        "ns"
    } else if p < 0.001 {
        "***"
    } else if p < 0.01 {
        "**"
    } else if p < 0.05 {
        "*"
    } else {
        "ns"
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/stats/mod.rs"]
mod tests;
