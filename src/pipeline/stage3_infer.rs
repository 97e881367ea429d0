use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::config::{Settings, ViolationPolicy};
use crate::model::dataset::Factor;
use crate::model::frame::{MetricFrame, SubjectRows};
use crate::model::results::{AnalysisLog, Annotation, GroupKey, StatResult, fmt3};
use crate::stats::anova::{AnovaTerm, one_way_anova, two_way_anova};
use crate::stats::nonparametric::{dunn, friedman, kruskal_wallis, mann_whitney_u, wilcoxon_signed_rank};
use crate::stats::normality::shapiro_wilk;
use crate::stats::rank::average_ranks;
use crate::stats::repeated::{mixed_anova, rm_anova};
use crate::stats::ttest::{cohens_d, paired_cohens_d, ttest_ind, ttest_paired};
use crate::stats::tukey::tukey_hsd;
use crate::stats::variance::levene;
use crate::stats::{StatsError, bonferroni};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Design {
    NoData,
    OneWay,
    RepeatedOneWay,
    TwoWay,
    Mixed,
}

#[derive(Debug, Clone)]
pub struct InferenceCtx {
    pub design: Design,
    pub results: Vec<StatResult>,
    pub annotations: Vec<Annotation>,
    pub log: AnalysisLog,
}

pub fn run_stage3(frame: &MetricFrame, settings: &Settings) -> InferenceCtx {
    let mut engine = Engine {
        frame,
        alpha: settings.alpha,
        policy: settings.violation_policy,
        results: Vec::new(),
        annotations: Vec::new(),
        log: AnalysisLog::default(),
    };
    let design = engine.run(settings.min_samples_per_group);
    engine.log.line("\n--- Statistical Analysis Complete ---");
    InferenceCtx {
        design,
        results: engine.results,
        annotations: engine.annotations,
        log: engine.log,
    }
}

struct Engine<'a> {
    frame: &'a MetricFrame,
    alpha: f64,
    policy: ViolationPolicy,
    results: Vec<StatResult>,
    annotations: Vec<Annotation>,
    log: AnalysisLog,
}

struct Pair {
    a: String,
    b: String,
    statistic: f64,
    p_raw: f64,
    effect: f64,
}

impl<'a> Engine<'a> {
    fn run(&mut self, min_samples: usize) -> Design {
        let frame = self.frame;
        self.log
            .line(format!("\n--- Statistical Analysis for '{}' ---", frame.metric));
        if frame.is_empty() {
            self.log.line(format!(
                "Not enough complete data for statistical analysis of '{}' after dropping missing values.",
                frame.metric
            ));
            return Design::NoData;
        }
        self.warn_small_groups(min_samples);

        let repeated = frame.is_repeated();
        match (frame.secondary, repeated) {
            (None, true) => {
                self.repeated_one_way();
                Design::RepeatedOneWay
            }
            (None, false) => {
                self.one_way();
                Design::OneWay
            }
            (Some(_), true) => {
                self.mixed();
                Design::Mixed
            }
            (Some(secondary), false) => {
                self.two_way(secondary);
                Design::TwoWay
            }
        }
    }

    fn metric(&self) -> &'a str {
        self.frame.metric.as_str()
    }

    fn push(&mut self, row: StatResult) {
        self.results.push(row);
    }

    fn annotate(&mut self, a: GroupKey, b: GroupKey, p: f64) {
        if p < self.alpha {
            self.annotations.push(Annotation::new(a, b, p));
        }
    }

    fn failed(&mut self, what: &str, err: &StatsError) {
        warn!(metric = self.metric(), test = what, error = %err, "statistical test failed");
        self.log.line(format!("Error performing {what}: {err}"));
    }

    fn warn_small_groups(&mut self, min_samples: usize) {
        let counts: Vec<(String, usize)> = match self.frame.secondary {
            None => self
                .frame
                .groups(self.frame.primary)
                .into_iter()
                .map(|(level, values)| (level, values.len()))
                .collect(),
            Some(_) => self
                .frame
                .cells()
                .into_iter()
                .map(|(p, s, values)| (format!("{p} / {s}"), values.len()))
                .collect(),
        };
        if counts.iter().any(|(_, n)| *n < min_samples) {
            self.log.line(format!(
                "Warning: Some groups have fewer than {min_samples} samples."
            ));
            self.log
                .line("Statistical tests may not be reliable. Group counts:");
            for (group, n) in counts {
                self.log.line(format!("    {group}: {n}"));
            }
        }
    }

    fn check_normality(&mut self, groups: &[(String, Vec<f64>)]) -> bool {
        self.log
            .line("\n  - Assessing Normality (Shapiro-Wilk Test):");
        let mut all_normal = true;
        for (name, values) in groups {
            if values.len() < 3 {
                self.log.line(format!(
                    "    - Group '{name}' has too few samples ({}) for Shapiro-Wilk test. Skipping normality check.",
                    values.len()
                ));
                all_normal = false;
                continue;
            }
            match shapiro_wilk(values) {
                Ok(sw) => {
                    let normal = sw.p_value >= self.alpha;
                    self.log.line(format!(
                        "    - Group '{name}' (p={}) {}",
                        fmt3(sw.p_value),
                        if normal {
                            "is normally distributed."
                        } else {
                            "is NOT normally distributed."
                        }
                    ));
                    all_normal &= normal;
                }
                Err(err) => {
                    self.log
                        .line(format!("    - Group '{name}': Shapiro-Wilk failed ({err})."));
                    all_normal = false;
                }
            }
        }
        all_normal
    }

    // (equal, p); p is NaN when Levene was skipped
    fn check_homogeneity(&mut self, groups: &[(String, Vec<f64>)]) -> (bool, f64) {
        let usable: Vec<&[f64]> = groups
            .iter()
            .map(|(_, v)| v.as_slice())
            .filter(|v| v.len() > 1)
            .collect();
        if usable.len() < 2 {
            self.log.line(
                "    - Not enough groups or data points per group for Levene's test. Skipping homogeneity of variance check.",
            );
            return (true, f64::NAN);
        }
        self.log
            .line("  - Assessing Homogeneity of Variances (Levene's Test):");
        match levene(&usable) {
            Ok(l) => {
                let equal = l.p_value >= self.alpha;
                self.log.line(format!(
                    "    - Levene's test (p={}) indicates {}",
                    fmt3(l.p_value),
                    if equal {
                        "equal variances (homoscedasticity)."
                    } else {
                        "unequal variances (heteroscedasticity)."
                    }
                ));
                (equal, l.p_value)
            }
            Err(err) => {
                self.log
                    .line(format!("    - Levene's test could not be computed ({err})."));
                (true, f64::NAN)
            }
        }
    }

    fn choose_parametric(&mut self, assumptions_met: bool) -> bool {
        if assumptions_met {
            self.log.line("\n  - Assumptions met for parametric test.");
            return true;
        }
        self.log
            .line("\n  - Assumptions not fully met for parametric test.");
        match self.policy {
            ViolationPolicy::Parametric => {
                self.log.line(
                    "  - Proceeding with parametric test despite assumption warnings. Interpret results with caution.",
                );
                true
            }
            ViolationPolicy::Nonparametric => {
                self.log
                    .line("  - Proceeding with non-parametric alternative as configured.");
                false
            }
        }
    }

    // One factor, independent groups.

    fn one_way(&mut self) {
        let factor = self.frame.primary;
        let groups = self.frame.groups(factor);
        if groups.len() < 2 {
            self.log.line(format!(
                "  - Not enough unique groups in {factor} for statistical comparison ({} groups found).",
                groups.len()
            ));
            return;
        }
        self.log.line(format!(
            "\n  - Considering analysis for {} by {factor}:",
            self.metric()
        ));
        let normal = self.check_normality(&groups);
        let (homogeneous, levene_p) = self.check_homogeneity(&groups);
        let parametric = self.choose_parametric(normal && homogeneous);
        let details = format!("Homogeneity_of_Variance_p: {}", fmt3(levene_p));

        match (parametric, groups.len()) {
            (true, 2) => self.t_test(factor, &groups, homogeneous, details),
            (true, _) => self.anova(factor, &groups, details),
            (false, 2) => self.mann_whitney(factor, &groups),
            (false, _) => self.kruskal(factor, &groups),
        }
    }

    fn t_test(&mut self, factor: Factor, groups: &[(String, Vec<f64>)], equal_var: bool, details: String) {
        self.log
            .line("\n  - Performing Independent Samples t-test (parametric):");
        let ((a, xa), (b, xb)) = (&groups[0], &groups[1]);
        let name = if equal_var {
            "Independent t-test"
        } else {
            self.log
                .line("    (Using Welch's t-test due to unequal variances)");
            "Welch's Independent t-test"
        };
        let t = match ttest_ind(xa, xb, equal_var) {
            Ok(t) => t,
            Err(err) => return self.failed(name, &err),
        };
        let d = cohens_d(xa, xb);
        self.log.line(format!(
            "    - {name}: t-statistic={}, p-value={}, Cohen's d={}",
            fmt3(t.t),
            fmt3(t.p_value),
            fmt3(d)
        ));
        self.push(
            StatResult::new(self.metric(), name, format!("{a} vs {b}"))
                .statistic(t.t)
                .p_value(t.p_value)
                .effect_size(d)
                .details(details),
        );
        self.conclude_pair(a, b, t.p_value, "");
        self.annotate(GroupKey::level(factor, a), GroupKey::level(factor, b), t.p_value);
    }

    fn conclude_pair(&mut self, a: &str, b: &str, p: f64, what: &str) {
        let metric = self.metric();
        if p < self.alpha {
            self.log.line(format!(
                "    - Conclusion: Statistically significant difference in {what}{metric} between {a} and {b}."
            ));
        } else {
            self.log.line(format!(
                "    - Conclusion: No statistically significant difference in {what}{metric} between {a} and {b}."
            ));
        }
    }

    fn anova(&mut self, factor: Factor, groups: &[(String, Vec<f64>)], details: String) {
        self.log.line("\n  - Performing One-way ANOVA (parametric):");
        let slices: Vec<&[f64]> = groups.iter().map(|(_, v)| v.as_slice()).collect();
        let aov = match one_way_anova(&slices) {
            Ok(a) => a,
            Err(err) => return self.failed("One-Way ANOVA", &err),
        };
        self.log_term(factor.name(), &aov.effect);
        self.push(term_row(self.metric(), "One-Way ANOVA", factor.name(), &aov.effect, details));
        if aov.effect.p_value < self.alpha {
            self.log.line(format!(
                "    - Conclusion: Statistically significant effect of {factor} on {}.",
                self.metric()
            ));
            self.log.line("\n    - Performing Tukey HSD post-hoc test:");
            self.tukey(groups, "Tukey HSD Post-hoc", None, |level| {
                GroupKey::level(factor, level)
            });
        } else {
            self.log.line(format!(
                "    - Conclusion: No statistically significant effect of {factor} on {} (p={}).",
                self.metric(),
                fmt3(aov.effect.p_value)
            ));
        }
    }

    fn tukey(
        &mut self,
        groups: &[(String, Vec<f64>)],
        test_type: &str,
        details: Option<&str>,
        key: impl Fn(&str) -> GroupKey,
    ) {
        let mut sorted: Vec<&(String, Vec<f64>)> = groups.iter().collect();
        sorted.sort_by(|x, y| x.0.cmp(&y.0));
        let slices: Vec<&[f64]> = sorted.iter().map(|(_, v)| v.as_slice()).collect();
        let pairs = match tukey_hsd(&slices, 0.05) {
            Ok(p) => p,
            Err(err) => return self.failed(test_type, &err),
        };
        for pair in pairs {
            let (a, b) = (&sorted[pair.a].0, &sorted[pair.b].0);
            let ci = format!(
                "Mean Diff: {}, CI: [{}, {}]",
                fmt3(pair.mean_diff),
                fmt3(pair.lower),
                fmt3(pair.upper)
            );
            self.log.line(format!(
                "      {a} vs {b}: {ci}, p-adj={}",
                fmt3(pair.p_value)
            ));
            self.push(
                StatResult::new(self.metric(), test_type, format!("{a} vs {b}"))
                    .p_value(pair.p_value)
                    .effect_size(pair.mean_diff)
                    .details(details.map_or(ci, str::to_string)),
            );
            self.annotate(key(a.as_str()), key(b.as_str()), pair.p_value);
        }
    }

    fn mann_whitney(&mut self, factor: Factor, groups: &[(String, Vec<f64>)]) {
        self.log
            .line("\n  - Performing Mann-Whitney U test (non-parametric):");
        let ((a, xa), (b, xb)) = (&groups[0], &groups[1]);
        let mw = match mann_whitney_u(xa, xb) {
            Ok(m) => m,
            Err(err) => return self.failed("Mann-Whitney U test", &err),
        };
        self.log.line(format!(
            "    - Mann-Whitney U test: U-statistic={}, p-value={}, Rank-Biserial Correlation={}",
            fmt3(mw.u),
            fmt3(mw.p_value),
            fmt3(mw.rank_biserial)
        ));
        self.push(
            StatResult::new(self.metric(), "Mann-Whitney U test", format!("{a} vs {b}"))
                .statistic(mw.u)
                .p_value(mw.p_value)
                .effect_size(mw.rank_biserial)
                .details("Non-parametric alternative."),
        );
        self.conclude_pair(a, b, mw.p_value, "ranks of ");
        self.annotate(GroupKey::level(factor, a), GroupKey::level(factor, b), mw.p_value);
    }

    fn kruskal(&mut self, factor: Factor, groups: &[(String, Vec<f64>)]) {
        self.log
            .line("\n  - Performing Kruskal-Wallis H-test (non-parametric):");
        let slices: Vec<&[f64]> = groups.iter().map(|(_, v)| v.as_slice()).collect();
        let kw = match kruskal_wallis(&slices) {
            Ok(k) => k,
            Err(err) => return self.failed("Kruskal-Wallis H-test", &err),
        };
        self.log.line(format!(
            "    - Kruskal-Wallis H-test: H-statistic={}, p-value={}",
            fmt3(kw.statistic),
            fmt3(kw.p_value)
        ));
        self.push(
            StatResult::new(self.metric(), "Kruskal-Wallis H-test", factor.name())
                .statistic(kw.statistic)
                .p_value(kw.p_value)
                .details("Non-parametric alternative due to assumption violation or user choice."),
        );
        if kw.p_value < self.alpha {
            self.log.line(format!(
                "    - Conclusion: Statistically significant difference in ranks of {} between groups.",
                self.metric()
            ));
            self.log.line(
                "\n    - Performing Dunn's Post-hoc test (using Bonferroni correction for pairwise comparisons):",
            );
            self.dunn(factor, groups, "Dunn's Post-hoc (Bonferroni)", "Post-hoc for Kruskal-Wallis");
        } else {
            self.log.line(format!(
                "    - Conclusion: No statistically significant difference in ranks of {} between groups.",
                self.metric()
            ));
        }
    }

    fn dunn(&mut self, factor: Factor, groups: &[(String, Vec<f64>)], test_type: &str, details: &str) {
        let slices: Vec<&[f64]> = groups.iter().map(|(_, v)| v.as_slice()).collect();
        let pairs = match dunn(&slices) {
            Ok(p) => p,
            Err(err) => return self.failed(test_type, &err),
        };
        for pair in pairs {
            let (a, b) = (&groups[pair.a].0, &groups[pair.b].0);
            let rbc = mann_whitney_u(slices[pair.a], slices[pair.b])
                .map_or(f64::NAN, |m| m.rank_biserial);
            self.log.line(format!(
                "      {a} vs {b}: z={}, p-unc={}, p-corr={}",
                fmt3(pair.z),
                fmt3(pair.p_raw),
                fmt3(pair.p_adjusted)
            ));
            self.push(
                StatResult::new(self.metric(), test_type, format!("{a} vs {b}"))
                    .p_value(pair.p_adjusted)
                    .effect_size(rbc)
                    .details(details),
            );
            self.annotate(
                GroupKey::level(factor, a),
                GroupKey::level(factor, b),
                pair.p_adjusted,
            );
        }
    }

    // One within factor.

    fn repeated_one_way(&mut self) {
        let factor = self.frame.primary;
        self.log.line(format!(
            "\n  - Considering One-way Repeated Measures ANOVA for '{}' by '{factor}':",
            self.metric()
        ));
        let subjects = self.frame.subject_rows(factor, None);
        let levels = self.frame.levels(factor).to_vec();
        self.log.line(format!(
            "  - Complete subjects: {} of {}; within-levels ({factor}): {}",
            subjects.rows.len(),
            distinct_animals(self.frame),
            levels.join(", ")
        ));

        let aov = match rm_anova(&subjects.rows) {
            Ok(a) => a,
            Err(err) => {
                self.failed("Repeated Measures ANOVA", &err);
                return self.friedman_fallback(factor, &levels, &subjects);
            }
        };
        let sphericity_p = aov.sphericity.map_or(f64::NAN, |s| s.p_value);
        let violated = aov.sphericity.is_some_and(|s| !s.holds(self.alpha));
        self.log.line(format!(
            "  - Mauchly's Test for Sphericity (p={}): {}",
            fmt3(sphericity_p),
            if violated {
                "Sphericity violated. Greenhouse-Geisser correction applied."
            } else {
                "Sphericity assumed."
            }
        ));
        let p = if violated { aov.p_gg } else { aov.effect.p_value };
        let mut details = format!("Sphericity p: {}", fmt3(sphericity_p));
        if violated {
            details.push_str(&format!(", GG epsilon: {}", fmt3(aov.epsilon_gg)));
        }
        self.log.line(format!(
            "    - Effect of {factor}: F-statistic={}, p-value={}, Partial Eta-squared={}",
            fmt3(aov.effect.f),
            fmt3(p),
            fmt3(aov.effect.partial_eta_sq)
        ));
        self.push(
            StatResult::new(self.metric(), "One-Way Repeated Measures ANOVA", factor.name())
                .statistic(aov.effect.f)
                .p_value(p)
                .effect_size(aov.effect.partial_eta_sq)
                .details(details),
        );
        if p < self.alpha {
            self.log
                .line(format!("      -> Statistically significant effect of {factor}."));
            self.log
                .line("\n    - Performing pairwise post-hoc tests (Bonferroni corrected):");
            let pairs = self.paired_t_tests(&levels, &subjects.rows);
            let m = pairs.len();
            for pair in pairs {
                self.push_paired(
                    pair,
                    m,
                    "Pairwise t-test (Bonferroni)",
                    "Post-hoc for RM ANOVA".to_string(),
                    |level| GroupKey::level(factor, level),
                );
            }
        } else {
            self.log.line(format!(
                "      -> No statistically significant effect of {factor} (p={}).",
                fmt3(p)
            ));
        }
    }

    fn friedman_fallback(&mut self, factor: Factor, levels: &[String], subjects: &SubjectRows) {
        if subjects.rows.is_empty() {
            self.log.line(
                "    - Not enough complete cases for Friedman test after pivoting and dropping missing values.",
            );
            return;
        }
        if levels.len() == 2 {
            self.log.line(
                "    - Falling back to the Wilcoxon signed-rank test (two timepoints).",
            );
            let a: Vec<f64> = subjects.rows.iter().map(|r| r[0]).collect();
            let b: Vec<f64> = subjects.rows.iter().map(|r| r[1]).collect();
            let w = match wilcoxon_signed_rank(&a, &b) {
                Ok(w) => w,
                Err(err) => return self.failed("Wilcoxon signed-rank test", &err),
            };
            self.log.line(format!(
                "    - Wilcoxon signed-rank: W={}, p-value={}",
                fmt3(w.statistic),
                fmt3(w.p_value)
            ));
            self.push(
                StatResult::new(
                    self.metric(),
                    "Wilcoxon Signed-Rank Test",
                    format!("{} vs {}", levels[0], levels[1]),
                )
                .statistic(w.statistic)
                .p_value(w.p_value)
                .details("Non-parametric alternative due to RM ANOVA failure."),
            );
            self.annotate(
                GroupKey::level(factor, &levels[0]),
                GroupKey::level(factor, &levels[1]),
                w.p_value,
            );
            return;
        }

        self.log
            .line("    - Falling back to the non-parametric Friedman test.");
        let fr = match friedman(&subjects.rows) {
            Ok(f) => f,
            Err(err) => return self.failed("Friedman test", &err),
        };
        self.log.line(format!(
            "    - Friedman Test: Chi-square={}, p-value={}",
            fmt3(fr.statistic),
            fmt3(fr.p_value)
        ));
        self.push(
            StatResult::new(self.metric(), "Friedman Test", factor.name())
                .statistic(fr.statistic)
                .p_value(fr.p_value)
                .details("Non-parametric alternative due to RM ANOVA failure."),
        );
        if fr.p_value >= self.alpha {
            self.log.line(format!(
                "    - Conclusion: No statistically significant difference in ranks of {} across {factor} timepoints.",
                self.metric()
            ));
            return;
        }
        self.log.line(format!(
            "    - Conclusion: Statistically significant difference in ranks of {} across {factor} timepoints.",
            self.metric()
        ));
        self.log
            .line("\n    - Performing post-hoc Wilcoxon signed-rank tests (Bonferroni corrected):");
        let m = levels.len() * (levels.len() - 1) / 2;
        for i in 0..levels.len() {
            for j in (i + 1)..levels.len() {
                let a: Vec<f64> = subjects.rows.iter().map(|r| r[i]).collect();
                let b: Vec<f64> = subjects.rows.iter().map(|r| r[j]).collect();
                let (t1, t2) = (&levels[i], &levels[j]);
                let w = match wilcoxon_signed_rank(&a, &b) {
                    Ok(w) => w,
                    Err(err) => {
                        self.failed(&format!("Wilcoxon signed-rank test ({t1} vs {t2})"), &err);
                        continue;
                    }
                };
                let corrected = bonferroni(w.p_value, m);
                self.log.line(format!(
                    "      - {t1} vs {t2}: W={}, p={} (Bonferroni corrected p={})",
                    fmt3(w.statistic),
                    fmt3(w.p_value),
                    fmt3(corrected)
                ));
                self.push(
                    StatResult::new(
                        self.metric(),
                        "Wilcoxon Signed-Rank Test (Bonferroni)",
                        format!("{t1} vs {t2}"),
                    )
                    .p_value(corrected)
                    .details("Post-hoc for Friedman Test"),
                );
                self.annotate(GroupKey::level(factor, t1), GroupKey::level(factor, t2), corrected);
            }
        }
    }

    fn paired_t_tests(&mut self, levels: &[String], rows: &[Vec<f64>]) -> Vec<Pair> {
        let mut out = Vec::new();
        for i in 0..levels.len() {
            for j in (i + 1)..levels.len() {
                let a: Vec<f64> = rows.iter().map(|r| r[i]).collect();
                let b: Vec<f64> = rows.iter().map(|r| r[j]).collect();
                match ttest_paired(&a, &b) {
                    Ok(t) => out.push(Pair {
                        a: levels[i].clone(),
                        b: levels[j].clone(),
                        statistic: t.t,
                        p_raw: t.p_value,
                        effect: paired_cohens_d(&a, &b),
                    }),
                    Err(err) => self.failed(
                        &format!("paired t-test ({} vs {})", levels[i], levels[j]),
                        &err,
                    ),
                }
            }
        }
        out
    }

    fn push_paired(
        &mut self,
        pair: Pair,
        comparisons: usize,
        test_type: &str,
        details: String,
        key: impl Fn(&str) -> GroupKey,
    ) {
        let p = bonferroni(pair.p_raw, comparisons);
        self.log.line(format!(
            "      {} vs {}: T={}, p-unc={}, p-corr={}, cohen-d={}",
            pair.a,
            pair.b,
            fmt3(pair.statistic),
            fmt3(pair.p_raw),
            fmt3(p),
            fmt3(pair.effect)
        ));
        self.push(
            StatResult::new(self.metric(), test_type, format!("{} vs {}", pair.a, pair.b))
                .p_value(p)
                .effect_size(pair.effect)
                .details(details),
        );
        self.annotate(key(pair.a.as_str()), key(pair.b.as_str()), p);
    }

    fn log_term(&mut self, name: &str, term: &AnovaTerm) {
        self.log.line(format!(
            "    - Effect of {name}: F-statistic={}, p-value={}, Partial Eta-squared={}",
            fmt3(term.f),
            fmt3(term.p_value),
            fmt3(term.partial_eta_sq)
        ));
        if term.p_value < self.alpha {
            self.log
                .line(format!("      -> Statistically significant effect of {name}."));
        }
    }

    // Two independent factors.

    fn two_way(&mut self, secondary: Factor) {
        let primary = self.frame.primary;
        self.log.line(format!(
            "\n  - Considering Two-way ANOVA for {} by {primary} and {secondary}:",
            self.metric()
        ));
        let cells: Vec<(String, Vec<f64>)> = self
            .frame
            .cells()
            .into_iter()
            .map(|(p, s, v)| (format!("{p}_{s}"), v))
            .collect();
        let normal = self.check_normality(&cells);
        let (homogeneous, levene_p) = self.check_homogeneity(&cells);
        let parametric = self.choose_parametric(normal && homogeneous);

        let frame = self.frame;
        let plevels = &frame.primary_levels;
        let slevels = &frame.secondary_levels;
        let mut a = Vec::with_capacity(frame.observations.len());
        let mut b = Vec::with_capacity(frame.observations.len());
        let mut y = Vec::with_capacity(frame.observations.len());
        for obs in &frame.observations {
            let (Some(s), Some(ai)) = (
                obs.secondary.as_deref(),
                plevels.iter().position(|l| *l == obs.primary),
            ) else {
                continue;
            };
            let Some(bi) = slevels.iter().position(|l| l == s) else {
                continue;
            };
            a.push(ai);
            b.push(bi);
            y.push(obs.value);
        }
        let interaction_name = format!("{primary} x {secondary}");

        if parametric {
            self.log.line("\n  - Performing Two-way ANOVA (parametric):");
            let aov = match two_way_anova(&a, &b, &y) {
                Ok(a) => a,
                Err(err) => return self.failed("Two-Way ANOVA", &err),
            };
            let details = format!("Homogeneity_of_Variance_p: {}", fmt3(levene_p));
            for (name, term) in [
                (primary.name().to_string(), Some(aov.a)),
                (secondary.name().to_string(), Some(aov.b)),
                (interaction_name.clone(), aov.interaction),
            ] {
                if let Some(term) = term {
                    self.log_term(&name, &term);
                    self.push(term_row(self.metric(), "Two-Way ANOVA", &name, &term, details.clone()));
                }
            }
            let interaction_p = aov.interaction.map_or(1.0, |t| t.p_value);
            if interaction_p < self.alpha {
                self.log.line(
                    "\n    - Significant interaction detected. Performing post-hoc comparisons (Tukey HSD) on combined groups:",
                );
                let combined: Vec<(String, Vec<f64>)> = frame
                    .cells()
                    .into_iter()
                    .map(|(p, s, v)| (format!("{p} x {s}"), v))
                    .collect();
                self.tukey(&combined, "Tukey HSD Post-hoc (Interaction)", None, |label| {
                    match label.split_once(" x ") {
                        Some((p, s)) => GroupKey::cell(p, s),
                        None => GroupKey::level(primary, label),
                    }
                });
            } else {
                self.log
                    .line("\n    - No significant interaction. Checking main effects for post-hoc:");
                for (factor, term) in [(primary, aov.a), (secondary, aov.b)] {
                    if term.p_value < self.alpha {
                        self.log.line(format!(
                            "\n    - Significant main effect of {factor}. Performing post-hoc (Tukey HSD):"
                        ));
                        let groups = frame.groups(factor);
                        self.tukey(
                            &groups,
                            &format!("Tukey HSD Post-hoc (Main Effect {factor})"),
                            Some("Post-hoc for Two-Way ANOVA Main Effect"),
                            |level| GroupKey::level(factor, level),
                        );
                    }
                }
            }
            return;
        }

        self.log
            .line("\n  - Assumptions not met or parametric test declined for Two-Way ANOVA.");
        self.log
            .line("    Proceeding with Non-parametric Two-way ANOVA (Rank-transformed ANOVA).");
        let ranks = average_ranks(&y);
        let aov = match two_way_anova(&a, &b, &ranks) {
            Ok(a) => a,
            Err(err) => return self.failed("Non-parametric Two-way ANOVA", &err),
        };
        for (name, term) in [
            (primary.name().to_string(), Some(aov.a)),
            (secondary.name().to_string(), Some(aov.b)),
            (interaction_name.clone(), aov.interaction),
        ] {
            if let Some(term) = term {
                self.log_term(&name, &term);
                self.push(term_row(
                    self.metric(),
                    "Non-parametric Two-Way ANOVA (on ranks)",
                    &name,
                    &term,
                    "Non-parametric alternative (Rank-transformed).".to_string(),
                ));
            }
        }
        let interaction_p = aov.interaction.map_or(1.0, |t| t.p_value);
        if interaction_p < self.alpha {
            self.log.line(
                "\n    - Statistically significant interaction (non-parametric). Performing Simple Effects Analysis (Mann-Whitney U) for significant interaction:",
            );
            self.simple_effects(primary, secondary);
        } else {
            self.log
                .line("\n  - No statistically significant interaction (non-parametric).");
            for (factor, term) in [(primary, aov.a), (secondary, aov.b)] {
                if term.p_value < self.alpha {
                    self.log.line(format!(
                        "\n  - Statistically significant main effect of {factor} (non-parametric)."
                    ));
                    self.log
                        .line(format!("    Performing post-hoc (Dunn's) for main effect of {factor}:"));
                    let groups = frame.groups(factor);
                    self.dunn(
                        factor,
                        &groups,
                        &format!("Dunn's Post-hoc (Main Effect {factor})"),
                        "Post-hoc for Non-parametric Two-Way ANOVA Main Effect",
                    );
                }
            }
        }
    }

    fn simple_effects(&mut self, primary: Factor, secondary: Factor) {
        let frame = self.frame;
        for s in &frame.secondary_levels {
            self.log
                .line(format!("\n--- Simple Effect of {primary} for {secondary} = {s} ---"));
            let groups: Vec<(&String, Vec<f64>)> = frame
                .primary_levels
                .iter()
                .map(|p| (p, frame.cell_values(p, s)))
                .filter(|(_, v)| !v.is_empty())
                .collect();
            if groups.len() < 2 {
                self.log.line(format!(
                    "  Not enough unique groups for simple effect analysis for {primary} at {secondary}={s}."
                ));
                continue;
            }
            let m = groups.len() * (groups.len() - 1) / 2;
            let test_type = format!("Mann-Whitney U (Simple Effect {primary} at {secondary}={s})");
            for i in 0..groups.len() {
                for j in (i + 1)..groups.len() {
                    let ((a, xa), (b, xb)) = (&groups[i], &groups[j]);
                    let mw = match mann_whitney_u(xa, xb) {
                        Ok(m) => m,
                        Err(err) => {
                            self.failed(&format!("{test_type} {a} vs {b}"), &err);
                            continue;
                        }
                    };
                    let p = bonferroni(mw.p_value, m);
                    self.log.line(format!(
                        "      {a} vs {b}: U={}, p-unc={}, p-corr={}",
                        fmt3(mw.u),
                        fmt3(mw.p_value),
                        fmt3(p)
                    ));
                    self.push(
                        StatResult::new(self.metric(), test_type.clone(), format!("{a} vs {b}"))
                            .p_value(p)
                            .effect_size(mw.rank_biserial)
                            .details("Post-hoc for Non-parametric Two-Way ANOVA Interaction"),
                    );
                    self.annotate(GroupKey::cell(*a, s), GroupKey::cell(*b, s), p);
                }
            }
        }
    }

    // One between factor, Timepoint within.

    fn mixed(&mut self) {
        let frame = self.frame;
        let between = if frame.primary == Factor::Timepoint {
            frame.secondary.unwrap_or(frame.primary)
        } else {
            frame.primary
        };
        let within = Factor::Timepoint;
        self.log.line(format!(
            "\n  - Considering Mixed ANOVA for '{}' with between-subject factor '{between}' and within-subject factor '{within}':",
            self.metric()
        ));
        let subjects = frame.subject_rows(within, Some(between));
        let within_levels = frame.levels(within).to_vec();
        let between_levels = frame.levels(between).to_vec();
        let mut by_level: BTreeMap<usize, Vec<Vec<f64>>> = BTreeMap::new();
        for (row, level) in subjects.rows.iter().zip(&subjects.between) {
            if let Some(g) = level
                .as_deref()
                .and_then(|l| between_levels.iter().position(|b| b == l))
            {
                by_level.entry(g).or_default().push(row.clone());
            }
        }
        self.log.line(format!(
            "  - Complete subjects: {} of {}; within-levels ({within}): {}; between-levels ({between}): {}",
            subjects.rows.len(),
            distinct_animals(frame),
            within_levels.join(", "),
            between_levels.join(", ")
        ));
        let present: Vec<usize> = by_level.keys().copied().collect();
        let groups: Vec<Vec<Vec<f64>>> = by_level.into_values().collect();

        let aov = match mixed_anova(&groups) {
            Ok(a) => a,
            Err(err) => return self.failed("Mixed ANOVA", &err),
        };
        let sphericity_p = aov.sphericity.map_or(f64::NAN, |s| s.p_value);
        let violated = aov.sphericity.is_some_and(|s| !s.holds(self.alpha));
        self.log.line(format!(
            "  - Mauchly's Test for Sphericity (p={}): {}",
            fmt3(sphericity_p),
            if violated {
                "Sphericity violated. Greenhouse-Geisser correction applied."
            } else {
                "Sphericity assumed."
            }
        ));
        let details = format!("Sphericity p: {}", fmt3(sphericity_p));
        let within_term = AnovaTerm {
            p_value: if violated { aov.within_p_gg } else { aov.within.p_value },
            ..aov.within
        };
        let interaction_term = AnovaTerm {
            p_value: if violated {
                aov.interaction_p_gg
            } else {
                aov.interaction.p_value
            },
            ..aov.interaction
        };
        let interaction_name = format!("{between} x {within}");
        for (name, term) in [
            (between.name().to_string(), aov.between),
            (within.name().to_string(), within_term),
            (interaction_name.clone(), interaction_term),
        ] {
            self.log_term(&name, &term);
            self.push(term_row(self.metric(), "Mixed ANOVA", &name, &term, details.clone()));
        }

        let cell_key = |b: &str, w: &str| {
            if frame.primary == within {
                GroupKey::cell(w, b)
            } else {
                GroupKey::cell(b, w)
            }
        };

        if interaction_term.p_value < self.alpha {
            self.log.line(
                "\n    - Significant interaction detected. Performing post-hoc comparisons:",
            );
            let mut pending: Vec<(String, Pair)> = Vec::new();
            for (g, rows) in present.iter().zip(&groups) {
                let level = between_levels[*g].clone();
                for pair in self.paired_t_tests(&within_levels, rows) {
                    pending.push((level.clone(), pair));
                }
            }
            let m = pending.len();
            let metric = self.metric();
            for (level, pair) in pending {
                let p = bonferroni(pair.p_raw, m);
                self.log.line(format!(
                    "      {between} ({level}): {} vs {}: T={}, p-unc={}, p-corr={}",
                    pair.a,
                    pair.b,
                    fmt3(pair.statistic),
                    fmt3(pair.p_raw),
                    fmt3(p)
                ));
                self.push(
                    StatResult::new(
                        metric,
                        "Pairwise t-test (Mixed ANOVA Post-hoc)",
                        format!("{between} ({level}): {} vs {}", pair.a, pair.b),
                    )
                    .p_value(p)
                    .effect_size(pair.effect)
                    .details(format!(
                        "Post-hoc for significant {between} x {within} interaction"
                    )),
                );
                self.annotate(cell_key(&level, &pair.a), cell_key(&level, &pair.b), p);
            }
            return;
        }

        self.log
            .line("\n    - No significant interaction. Checking main effects for post-hoc:");
        if aov.between.p_value < self.alpha {
            self.log.line(format!(
                "\n    - Significant main effect of {between}. Performing post-hoc (Tukey HSD):"
            ));
            let groups = frame.groups(between);
            self.tukey(
                &groups,
                &format!("Tukey HSD Post-hoc (Main Effect {between})"),
                Some("Post-hoc for Mixed ANOVA Main Effect"),
                |level| GroupKey::level(between, level),
            );
        }
        if within_term.p_value < self.alpha {
            self.log.line(format!(
                "\n    - Significant main effect of {within}. Performing pairwise post-hoc (Bonferroni corrected):"
            ));
            let pairs = self.paired_t_tests(&within_levels, &subjects.rows);
            let m = pairs.len();
            for pair in pairs {
                self.push_paired(
                    pair,
                    m,
                    &format!("Pairwise t-test (Main Effect {within}, Bonferroni)"),
                    "Post-hoc for Mixed ANOVA Main Effect".to_string(),
                    |level| GroupKey::level(within, level),
                );
            }
        }
    }
}

fn term_row(metric: &str, test_type: &str, comparison: &str, term: &AnovaTerm, details: String) -> StatResult {
    StatResult::new(metric, test_type, comparison)
        .statistic(term.f)
        .p_value(term.p_value)
        .effect_size(term.partial_eta_sq)
        .details(details)
}

fn distinct_animals(frame: &MetricFrame) -> usize {
    frame
        .observations
        .iter()
        .map(|o| o.animal_id.as_str())
        .collect::<std::collections::BTreeSet<_>>()
        .len()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_infer.rs"]
mod tests;
