use std::collections::{BTreeMap, BTreeSet};

use crate::config::Settings;
use crate::model::dataset::{Dataset, Factor};
use crate::stats::descriptive::mean;

/// One usable observation of the analysed metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub animal_id: String,
    /// Display label of the primary factor level.
    pub primary: String,
    pub secondary: Option<String>,
    pub value: f64,
}

/// Observations of one metric with display labels applied and incomplete
/// rows dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFrame {
    pub metric: String,
    pub primary: Factor,
    pub secondary: Option<Factor>,
    pub observations: Vec<Observation>,
    pub primary_levels: Vec<String>,
    pub secondary_levels: Vec<String>,
    /// Source rows dropped for a missing value, factor level or animal id.
    pub dropped: usize,
}

/// Subjects as complete rows over the within-factor levels.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectRows {
    pub animal_ids: Vec<String>,
    /// Between-factor level per subject (first one seen), when asked for.
    pub between: Vec<Option<String>>,
    pub rows: Vec<Vec<f64>>,
}

/// Builds the frame for `metric`; `None` when the metric is unknown.
pub fn build_frame(
    dataset: &Dataset,
    metric: &str,
    primary: Factor,
    secondary: Option<Factor>,
    settings: &Settings,
) -> Option<MetricFrame> {
    let idx = dataset.metric_index(metric)?;
    let mut observations = Vec::with_capacity(dataset.records.len());
    let mut dropped = 0usize;
    for record in &dataset.records {
        let value = record.metrics.get(idx).copied().flatten();
        let p = record.factor(primary);
        let s = secondary.map(|f| record.factor(f));
        let (Some(value), Some(p)) = (value, p) else {
            dropped += 1;
            continue;
        };
        if !value.is_finite() || record.animal_id.is_empty() || matches!(s, Some(None)) {
            dropped += 1;
            continue;
        }
        observations.push(Observation {
            animal_id: record.animal_id.clone(),
            primary: settings.display_label(primary, p),
            secondary: match (secondary, s) {
                (Some(f), Some(Some(raw))) => Some(settings.display_label(f, raw)),
                _ => None,
            },
            value,
        });
    }

    let primary_levels = settings.level_order(primary, observations.iter().map(|o| o.primary.as_str()));
    let secondary_levels = match secondary {
        Some(f) => settings.level_order(f, observations.iter().filter_map(|o| o.secondary.as_deref())),
        None => Vec::new(),
    };

    Some(MetricFrame {
        metric: metric.to_string(),
        primary,
        secondary,
        observations,
        primary_levels,
        secondary_levels,
        dropped,
    })
}

impl MetricFrame {
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Level label of `factor` for one observation.
    pub fn level_of<'a>(&self, obs: &'a Observation, factor: Factor) -> Option<&'a str> {
        if factor == self.primary {
            Some(obs.primary.as_str())
        } else if Some(factor) == self.secondary {
            obs.secondary.as_deref()
        } else {
            None
        }
    }

    pub fn levels(&self, factor: Factor) -> &[String] {
        if Some(factor) == self.secondary {
            &self.secondary_levels
        } else {
            &self.primary_levels
        }
    }

    /// Values at one level of `factor`.
    pub fn values_at(&self, factor: Factor, level: &str) -> Vec<f64> {
        self.observations
            .iter()
            .filter(|o| self.level_of(o, factor) == Some(level))
            .map(|o| o.value)
            .collect()
    }

    /// Non-empty `(level, values)` groups of `factor` in level order.
    pub fn groups(&self, factor: Factor) -> Vec<(String, Vec<f64>)> {
        self.levels(factor)
            .iter()
            .map(|level| (level.clone(), self.values_at(factor, level)))
            .filter(|(_, values)| !values.is_empty())
            .collect()
    }

    /// Values of one (primary, secondary) cell.
    pub fn cell_values(&self, primary: &str, secondary: &str) -> Vec<f64> {
        self.observations
            .iter()
            .filter(|o| o.primary == primary && o.secondary.as_deref() == Some(secondary))
            .map(|o| o.value)
            .collect()
    }

    /// Non-empty `(primary, secondary, values)` cells, primary-major.
    pub fn cells(&self) -> Vec<(String, String, Vec<f64>)> {
        let mut out = Vec::new();
        for p in &self.primary_levels {
            for s in &self.secondary_levels {
                let values = self.cell_values(p, s);
                if !values.is_empty() {
                    out.push((p.clone(), s.clone(), values));
                }
            }
        }
        out
    }

    /// True when `Timepoint` is analysed and some animal was recorded at
    /// more than one timepoint.
    pub fn is_repeated(&self) -> bool {
        if self.primary != Factor::Timepoint && self.secondary != Some(Factor::Timepoint) {
            return false;
        }
        let mut seen: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for obs in &self.observations {
            if let Some(tp) = self.level_of(obs, Factor::Timepoint) {
                seen.entry(obs.animal_id.as_str()).or_default().insert(tp);
            }
        }
        seen.values().any(|tps| tps.len() > 1)
    }

    /// Listwise-complete subject rows over the levels of `within`. Repeated
    /// rows of a subject at one level are averaged.
    pub fn subject_rows(&self, within: Factor, between: Option<Factor>) -> SubjectRows {
        let levels = self.levels(within);
        let mut order: Vec<&str> = Vec::new();
        let mut cells: BTreeMap<(&str, usize), Vec<f64>> = BTreeMap::new();
        let mut between_of: BTreeMap<&str, Option<&str>> = BTreeMap::new();
        for obs in &self.observations {
            let Some(level) = self.level_of(obs, within) else {
                continue;
            };
            let Some(j) = levels.iter().position(|l| l == level) else {
                continue;
            };
            let id = obs.animal_id.as_str();
            if !between_of.contains_key(id) {
                order.push(id);
                between_of.insert(id, between.and_then(|f| self.level_of(obs, f)));
            }
            cells.entry((id, j)).or_default().push(obs.value);
        }

        let mut out = SubjectRows {
            animal_ids: Vec::new(),
            between: Vec::new(),
            rows: Vec::new(),
        };
        for id in order {
            let row: Option<Vec<f64>> = (0..levels.len())
                .map(|j| cells.get(&(id, j)).map(|v| mean(v)))
                .collect();
            if let Some(row) = row {
                out.animal_ids.push(id.to_string());
                out.between
                    .push(between_of.get(id).copied().flatten().map(str::to_string));
                out.rows.push(row);
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/frame.rs"]
mod tests;
