// 📊 Analysis Tables
// Aggregates over the reconciled and joined tables. Plotting belongs to
// whoever consumes these.

use crate::democracy::DemocracyIndex;
use crate::join::JoinedOutcome;
use crate::reconciliation::ReconciledWar;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::collections::BTreeMap;

// ============================================================================
// FATALITIES PER COUNTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryFatalities {
    pub ctryname: String,
    pub wars: usize,
    pub total: i64,
}

/// Total fatalities per canonical country, largest first (ties by name)
pub fn fatalities_per_country(wars: &[ReconciledWar]) -> Vec<CountryFatalities> {
    let mut totals: BTreeMap<&str, (usize, i64)> = BTreeMap::new();
    for war in wars {
        let entry = totals.entry(war.ctryname.as_str()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += war.fatalities();
    }

    let mut rows: Vec<CountryFatalities> = totals
        .into_iter()
        .map(|(ctryname, (wars, total))| CountryFatalities {
            ctryname: ctryname.to_string(),
            wars,
            total,
        })
        .collect();

    // BTreeMap already ordered by name; stable sort keeps that for ties
    rows.sort_by(|a, b| b.total.cmp(&a.total));
    rows
}

// ============================================================================
// LIBERTY VS DEMOCRACY SCORES
// ============================================================================

/// Two-sample comparison of a country's liberty and democracy scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComparison {
    pub ctryname: String,
    pub observations: usize,
    pub democ_mean: f64,
    pub liberty_mean: f64,
    /// Pooled-variance t statistic (liberty − democ); `None` when undefined
    pub t_statistic: Option<f64>,
    pub degrees_of_freedom: usize,
    /// Two-sided p-value of the t statistic
    pub p_value: Option<f64>,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sum of squared deviations from the mean
fn sum_sq(values: &[f64], mean: f64) -> f64 {
    values.iter().map(|v| (v - mean).powi(2)).sum()
}

/// Two-sided p-value of a t statistic with `df` degrees of freedom
pub fn two_sided_p_value(t: f64, df: usize) -> Option<f64> {
    if df == 0 || t.is_nan() {
        return None;
    }
    let dist = StudentsT::new(0.0, 1.0, df as f64).ok()?;
    Some((2.0 * dist.sf(t.abs())).min(1.0))
}

/// Student's two-sample t statistic with pooled variance
pub fn pooled_t_statistic(a: &[f64], b: &[f64]) -> Option<f64> {
    let (n1, n2) = (a.len(), b.len());
    if n1 + n2 <= 2 || n1 == 0 || n2 == 0 {
        return None;
    }

    let (m1, m2) = (mean(a), mean(b));
    let pooled = (sum_sq(a, m1) + sum_sq(b, m2)) / (n1 + n2 - 2) as f64;
    let se = (pooled * (1.0 / n1 as f64 + 1.0 / n2 as f64)).sqrt();

    if se == 0.0 {
        None
    } else {
        Some((m1 - m2) / se)
    }
}

/// Compare liberty and democracy distributions over a country's valid rows
pub fn score_comparison(index: &DemocracyIndex, ctryname: &str) -> Option<ScoreComparison> {
    let (democ, liberty): (Vec<f64>, Vec<f64>) = index
        .country_records(ctryname)
        .map(|r| (r.democ as f64, r.liberty as f64))
        .unzip();

    if democ.is_empty() {
        return None;
    }

    let t_statistic = pooled_t_statistic(&liberty, &democ);
    let degrees_of_freedom = (2 * democ.len()).saturating_sub(2);

    Some(ScoreComparison {
        ctryname: ctryname.to_string(),
        observations: democ.len(),
        democ_mean: mean(&democ),
        liberty_mean: mean(&liberty),
        t_statistic,
        degrees_of_freedom,
        p_value: t_statistic.and_then(|t| two_sided_p_value(t, degrees_of_freedom)),
    })
}

/// One comparison per fatality-table country present in the index
pub fn score_comparisons(index: &DemocracyIndex, countries: &[CountryFatalities]) -> Vec<ScoreComparison> {
    countries
        .iter()
        .filter_map(|c| score_comparison(index, &c.ctryname))
        .collect()
}

// ============================================================================
// DELTA VS RATIO FIT
// ============================================================================

/// Least-squares line delta = intercept + slope * ratio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub points: usize,
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
    /// Two-sided p-value for slope = 0 (n − 2 degrees of freedom)
    pub p_value: Option<f64>,
}

pub fn linear_fit(rows: &[JoinedOutcome]) -> Option<LinearFit> {
    if rows.len() < 2 {
        return None;
    }

    let x: Vec<f64> = rows.iter().map(|r| r.ratio).collect();
    let y: Vec<f64> = rows.iter().map(|r| r.delta as f64).collect();
    let (mx, my) = (mean(&x), mean(&y));

    let sxx = sum_sq(&x, mx);
    if sxx == 0.0 {
        return None;
    }
    let syy = sum_sq(&y, my);
    let sxy: f64 = x.iter().zip(&y).map(|(a, b)| (a - mx) * (b - my)).sum();

    let slope = sxy / sxx;
    let r = if syy == 0.0 { 0.0 } else { sxy / (sxx * syy).sqrt() };

    let df = rows.len() - 2;
    let p_value = if df == 0 {
        None
    } else if 1.0 - r * r <= 0.0 {
        // perfect fit
        Some(0.0)
    } else {
        two_sided_p_value(r * (df as f64 / (1.0 - r * r)).sqrt(), df)
    };

    Some(LinearFit {
        points: rows.len(),
        slope,
        intercept: my - slope * mx,
        r,
        p_value,
    })
}
