use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Factor {
    Sex,
    Genotype,
    Timepoint,
}

impl Factor {
    pub const ALL: [Factor; 3] = [Factor::Sex, Factor::Genotype, Factor::Timepoint];

    pub fn name(self) -> &'static str {
        match self {
            Factor::Sex => "Sex",
            Factor::Genotype => "Genotype",
            Factor::Timepoint => "Timepoint",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Factor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Factor::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown factor '{s}' (expected Sex, Genotype or Timepoint)"))
    }
}

/// One aggregated recording: an animal at a timepoint.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimalRecord {
    pub animal_id: String,
    pub timepoint: String,
    pub sex: Option<String>,
    pub genotype: Option<String>,
    /// Indexed like `Dataset::metric_names`.
    pub metrics: Vec<Option<f64>>,
}

impl AnimalRecord {
    pub fn factor(&self, factor: Factor) -> Option<&str> {
        match factor {
            Factor::Sex => self.sex.as_deref(),
            Factor::Genotype => self.genotype.as_deref(),
            Factor::Timepoint => Some(self.timepoint.as_str()),
        }
        .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub metric_names: Vec<String>,
    pub records: Vec<AnimalRecord>,
    pub factors: Vec<Factor>,
}

impl Dataset {
    pub fn metric_index(&self, name: &str) -> Option<usize> {
        self.metric_names.iter().position(|m| m == name)
    }

    pub fn animal_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.animal_id.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn has_factor(&self, factor: Factor) -> bool {
        self.factors.contains(&factor)
    }

    /// Metrics with at least one observed value.
    pub fn available_metrics(&self) -> Vec<&str> {
        self.metric_names
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.records.iter().any(|r| r.metrics[*idx].is_some()))
            .map(|(_, name)| name.as_str())
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/dataset.rs"]
mod tests;
