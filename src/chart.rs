use crate::config::PresenterConfig;
use crate::models::{
    Axis, AxisSide, Chart, ChartSeries, DashboardView, Dataset, DerivedSeries, SeriesKind,
};
use crate::stats::{derive_series, trend_summary};

pub const TICK_FORMAT: &str = "%b %d";
pub const MIN_ROWS: usize = 2;

pub const NOT_ENOUGH_DATA: &str = "Not enough data yet. The chart appears once two days have been recorded.";

/// Turns the persisted dataset into what the page shows. Never fails: datasets too small to
/// chart come back as [`DashboardView::Empty`].
pub fn render(dataset: &Dataset, settings: &PresenterConfig) -> DashboardView {
    let rows = if settings.skip_first_row {
        dataset.rows.get(1..).unwrap_or_default()
    } else {
        &dataset.rows[..]
    };

    if rows.len() < MIN_ROWS {
        return DashboardView::Empty {
            message: NOT_ENOUGH_DATA.to_string(),
        };
    }

    let derived = derive_series(rows);
    let summary = trend_summary(derived.week_over_week);
    DashboardView::Ready {
        chart: build_chart(&derived),
        summary,
    }
}

pub fn build_chart(derived: &DerivedSeries) -> Chart {
    let case: Vec<Option<f64>> = derived.case.iter().copied().map(Some).collect();

    let series = vec![
        ChartSeries {
            name: "New Cases".to_string(),
            kind: SeriesKind::Bar,
            axis: AxisSide::Right,
            color: "lightskyblue".to_string(),
            show_legend: true,
            points: derived.real.clone(),
        },
        ChartSeries {
            name: "Total Cases".to_string(),
            kind: SeriesKind::Bar,
            axis: AxisSide::Left,
            color: "lightpink".to_string(),
            show_legend: true,
            points: case,
        },
        ChartSeries {
            name: "Average Total Cases".to_string(),
            kind: SeriesKind::Line,
            axis: AxisSide::Left,
            color: "tomato".to_string(),
            show_legend: false,
            points: derived.rolling_case.clone(),
        },
        ChartSeries {
            name: "Average New Cases".to_string(),
            kind: SeriesKind::Line,
            axis: AxisSide::Right,
            color: "blue".to_string(),
            show_legend: false,
            points: derived.rolling_real.clone(),
        },
    ];

    let left_axis = Axis {
        title: "Total Cases".to_string(),
        color: "lightcoral".to_string(),
        min: 0.0,
        max: axis_max(&series, AxisSide::Left),
    };
    let right_axis = Axis {
        title: "New Cases".to_string(),
        color: "blue".to_string(),
        min: axis_min(&series, AxisSide::Right),
        max: axis_max(&series, AxisSide::Right),
    };

    Chart {
        dates: derived.dates.iter().map(|date| date.to_string()).collect(),
        tick_labels: derived
            .dates
            .iter()
            .map(|date| date.format(TICK_FORMAT).to_string())
            .collect(),
        series,
        left_axis,
        right_axis,
    }
}

fn axis_values(series: &[ChartSeries], side: AxisSide) -> impl Iterator<Item = f64> + '_ {
    series
        .iter()
        .filter(move |s| s.axis == side)
        .flat_map(|s| s.points.iter().flatten().copied())
}

fn axis_max(series: &[ChartSeries], side: AxisSide) -> f64 {
    let max = axis_values(series, side).fold(0.0_f64, f64::max);
    if max <= 0.0 { 1.0 } else { max * 1.1 }
}

// deltas go negative when the source revises its totals downward
fn axis_min(series: &[ChartSeries], side: AxisSide) -> f64 {
    let min = axis_values(series, side).fold(0.0_f64, f64::min);
    if min < 0.0 { min * 1.1 } else { 0.0 }
}
