use serde::Serialize;

use crate::tools::{ToolError, group_thousands};

const SUM_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    /// 1-based.
    pub person: usize,
    pub percent: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitPlan {
    pub total: f64,
    pub people: usize,
    pub even: bool,
    pub shares: Vec<Share>,
}

fn check_total(total: f64, people: usize) -> Result<(), ToolError> {
    if !total.is_finite() || total <= 0.0 {
        return Err(ToolError::InvalidInput(
            "total amount must be a positive number".to_string(),
        ));
    }
    if people < 1 {
        return Err(ToolError::InvalidInput(
            "number of people must be at least 1".to_string(),
        ));
    }
    Ok(())
}

pub fn even_split(total: f64, people: usize) -> Result<SplitPlan, ToolError> {
    check_total(total, people)?;
    let amount = total / people as f64;
    let percent = 100.0 / people as f64;
    Ok(SplitPlan {
        total,
        people,
        even: true,
        shares: (1..=people)
            .map(|person| Share {
                person,
                percent,
                amount,
            })
            .collect(),
    })
}

/// Percentage split. With `people - 1` percentages the last person takes
/// the remainder; with `people` percentages they must total 100 unless
/// `rebalance` scales the others around the last person's share.
pub fn custom_split(
    total: f64,
    people: usize,
    percents: &[f64],
    rebalance: bool,
) -> Result<SplitPlan, ToolError> {
    check_total(total, people)?;
    if people < 2 {
        return Err(ToolError::InvalidInput(
            "number of people must be at least 2 for a custom split".to_string(),
        ));
    }
    for (i, &p) in percents.iter().enumerate() {
        if !p.is_finite() || !(0.0..=100.0).contains(&p) {
            return Err(ToolError::PercentageOutOfRange {
                person: i + 1,
                value: p,
            });
        }
    }

    let percents = if percents.len() == people - 1 {
        let rest: f64 = percents.iter().sum();
        let mut all = percents.to_vec();
        all.push((100.0 - rest).max(0.0));
        all
    } else if percents.len() == people {
        if rebalance {
            rebalance_to_last(percents)
        } else {
            percents.to_vec()
        }
    } else {
        return Err(ToolError::InvalidInput(format!(
            "expected {} or {} percentages, got {}",
            people - 1,
            people,
            percents.len()
        )));
    };

    let sum: f64 = percents.iter().sum();
    if (sum - 100.0).abs() > SUM_TOLERANCE {
        return Err(ToolError::PercentagesDontSum(sum));
    }

    Ok(SplitPlan {
        total,
        people,
        even: false,
        shares: percents
            .into_iter()
            .enumerate()
            .map(|(i, percent)| Share {
                person: i + 1,
                percent,
                amount: total * (percent / 100.0),
            })
            .collect(),
    })
}

/// Keeps the last share and moves the others so the total is 100.
fn rebalance_to_last(percents: &[f64]) -> Vec<f64> {
    let Some((&last, others)) = percents.split_last() else {
        return Vec::new();
    };
    let total_others: f64 = others.iter().sum();
    let diff = 100.0 - (total_others + last);
    if diff.abs() < SUM_TOLERANCE || others.is_empty() {
        return percents.to_vec();
    }

    let adjusted: Vec<f64> = if total_others == 0.0 {
        let per_person = diff / others.len() as f64;
        others.iter().map(|v| (v + per_person).max(0.0)).collect()
    } else {
        others
            .iter()
            .map(|v| (v + diff * (v / total_others)).max(0.0))
            .collect()
    };
    let new_sum: f64 = adjusted.iter().sum();
    let scale = if new_sum != 0.0 { (100.0 - last) / new_sum } else { 0.0 };

    let mut out: Vec<f64> = adjusted.into_iter().map(|v| v * scale).collect();
    out.push(last);
    out
}

impl SplitPlan {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Total expense: \u{20ac}{}\n", group_thousands(self.total, 2)));
        out.push_str(&format!("Number of people: {}\n", self.people));
        if self.even {
            if let Some(share) = self.shares.first() {
                out.push_str(&format!("Each person pays: \u{20ac}{:.2}\n", share.amount));
            }
        } else {
            for share in &self.shares {
                out.push_str(&format!(
                    "Person {} pays ({:.2}%): \u{20ac}{:.2}\n",
                    share.person, share.percent, share.amount
                ));
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/tools/split.rs"]
mod tests;
