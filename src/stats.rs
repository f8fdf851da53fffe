use crate::models::{DatasetRow, DerivedSeries};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

pub const ROLLING_WINDOW: usize = 3;
pub const WEEK_DAYS: usize = 7;

/// `values[i] - values[i - 1]`; the first element has no predecessor. The difference is taken
/// in `f64` so extreme totals cannot overflow.
pub fn day_over_day(values: &[i64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        if i == 0 {
            out.push(None);
        } else {
            out.push(Some(*value as f64 - values[i - 1] as f64));
        }
    }
    out
}

/// Trailing arithmetic mean; a position is defined only when its whole window is.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let sum = slice.iter().copied().sum::<Option<f64>>()?;
            Some(sum / window as f64)
        })
        .collect()
}

/// One slot per calendar day from the first to the last date. Duplicate dates keep their first
/// defined value and missing days stay undefined.
pub fn resample_daily(dates: &[NaiveDate], values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut by_day: BTreeMap<NaiveDate, Option<f64>> = BTreeMap::new();
    for (date, value) in dates.iter().zip(values) {
        let slot = by_day.entry(*date).or_insert(None);
        if slot.is_none() {
            *slot = *value;
        }
    }

    let (Some(first), Some(last)) = (by_day.keys().next(), by_day.keys().next_back()) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut day = *first;
    while day <= *last {
        out.push(by_day.get(&day).copied().flatten());
        day += Duration::days(1);
    }
    out
}

/// Mean of the defined values, `None` when there are none.
pub fn window_mean(values: &[Option<f64>]) -> Option<f64> {
    let defined: Vec<f64> = values.iter().flatten().copied().collect();
    if defined.is_empty() {
        return None;
    }
    Some(defined.iter().sum::<f64>() / defined.len() as f64)
}

pub fn guarded_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Percentage change between the mean of the last seven daily values and the mean of the
/// seven before them, truncated toward zero. An empty or zero prior window gives `0`.
pub fn week_over_week(daily: &[Option<f64>]) -> i64 {
    let len = daily.len();
    let recent = &daily[len.saturating_sub(WEEK_DAYS)..];
    let prior = &daily[len.saturating_sub(2 * WEEK_DAYS)..len.saturating_sub(WEEK_DAYS)];

    let Some(prior_mean) = window_mean(prior) else {
        return 0;
    };
    let recent_mean = window_mean(recent).unwrap_or(0.0);
    match guarded_ratio(recent_mean, prior_mean) {
        Some(ratio) => (100.0 * (ratio - 1.0)) as i64,
        None => 0,
    }
}

pub fn trend_summary(change: i64) -> String {
    // A negative change prints as "down -N%"; kept verbatim until the wording is confirmed.
    if change > 0 {
        format!("On average, new cases are up {change}% week over week.")
    } else {
        format!("On average, new cases are down {change}% week over week.")
    }
}

pub fn derive_series(rows: &[DatasetRow]) -> DerivedSeries {
    let dates: Vec<NaiveDate> = rows.iter().map(|row| row.date).collect();
    let cases: Vec<i64> = rows.iter().map(|row| row.case).collect();
    let case: Vec<f64> = cases.iter().map(|value| *value as f64).collect();
    let new: Vec<f64> = rows.iter().map(|row| row.new as f64).collect();
    let real = day_over_day(&cases);

    let rolling_case = rolling_mean(&to_defined(&case), ROLLING_WINDOW);
    let rolling_new = rolling_mean(&to_defined(&new), ROLLING_WINDOW);
    let rolling_real = rolling_mean(&real, ROLLING_WINDOW);
    let week_over_week = week_over_week(&resample_daily(&dates, &real));

    DerivedSeries {
        dates,
        case,
        new,
        real,
        rolling_case,
        rolling_new,
        rolling_real,
        week_over_week,
    }
}

fn to_defined(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}
