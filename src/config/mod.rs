use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::dataset::Factor;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// What to do when normality or equal-variance checks fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationPolicy {
    #[default]
    Nonparametric,
    Parametric,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Labels {
    pub sex: BTreeMap<String, String>,
    pub genotype: BTreeMap<String, String>,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            sex: pairs(&[("F", "Females"), ("M", "Males")]),
            genotype: pairs(&[("WT", "Wild Type"), ("MUT", "Mutant")]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Colors {
    pub sex: BTreeMap<String, String>,
    pub genotype: BTreeMap<String, String>,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            sex: pairs(&[("Females", "pink"), ("Males", "blue")]),
            genotype: pairs(&[("Wild Type", "green"), ("Mutant", "purple")]),
        }
    }
}

fn pairs(items: &[(&str, &str)]) -> BTreeMap<String, String> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub alpha: f64,
    pub min_samples_per_group: usize,
    pub timepoint_order: Vec<String>,
    pub metadata_file: String,
    pub plots_dir: String,
    pub results_dir: String,
    pub violation_policy: ViolationPolicy,
    pub labels: Labels,
    pub colors: Colors,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            min_samples_per_group: 3,
            timepoint_order: vec!["P4".to_string(), "P6".to_string()],
            metadata_file: "animal_metadata.csv".to_string(),
            plots_dir: "plots".to_string(),
            results_dir: "analysis_results".to_string(),
            violation_policy: ViolationPolicy::default(),
            labels: Labels::default(),
            colors: Colors::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::Invalid {
                key: "alpha",
                reason: format!("{} is not in (0, 1)", self.alpha),
            });
        }
        if self.min_samples_per_group == 0 {
            return Err(ConfigError::Invalid {
                key: "min_samples_per_group",
                reason: "must be at least 1".to_string(),
            });
        }
        for (key, value) in [
            ("metadata_file", &self.metadata_file),
            ("plots_dir", &self.plots_dir),
            ("results_dir", &self.results_dir),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Display label of a raw factor value (`F` -> `Females`).
    pub fn display_label(&self, factor: Factor, raw: &str) -> String {
        let table = match factor {
            Factor::Sex => &self.labels.sex,
            Factor::Genotype => &self.labels.genotype,
            Factor::Timepoint => return raw.to_string(),
        };
        table.get(raw).cloned().unwrap_or_else(|| raw.to_string())
    }

    /// Orders display labels: configured timepoints first, then sorted.
    pub fn level_order<'a>(&self, factor: Factor, levels: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let present: BTreeSet<&str> = levels.into_iter().collect();
        let mut out = Vec::with_capacity(present.len());
        if factor == Factor::Timepoint {
            for tp in &self.timepoint_order {
                if present.contains(tp.as_str()) {
                    out.push(tp.clone());
                }
            }
        }
        for level in present {
            if !out.iter().any(|o| o == level) {
                out.push(level.to_string());
            }
        }
        out
    }

    pub fn color_for(&self, factor: Factor, label: &str) -> Option<&str> {
        match factor {
            Factor::Sex => self.colors.sex.get(label).map(String::as_str),
            Factor::Genotype => self.colors.genotype.get(label).map(String::as_str),
            Factor::Timepoint => None,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let settings = match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            toml::from_str(&text)?
        }
        None => Settings::default(),
    };
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
#[path = "../../tests/src_inline/config/mod.rs"]
mod tests;
