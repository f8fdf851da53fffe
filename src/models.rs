use chrono::NaiveDate;
use serde::Serialize;

/// One persisted observation: `Date, Case, New` plus whatever extra numeric columns the
/// source emitted on the day it was fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRow {
    pub date: NaiveDate,
    pub case: i64,
    pub new: i64,
    pub extra: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Identifiers lifted from the dashboard page, used once for the data request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSession {
    pub sheet_id: String,
    pub vizql_root: String,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSeries {
    pub dates: Vec<NaiveDate>,
    pub case: Vec<f64>,
    pub new: Vec<f64>,
    pub real: Vec<Option<f64>>,
    pub rolling_case: Vec<Option<f64>>,
    pub rolling_new: Vec<Option<f64>>,
    pub rolling_real: Vec<Option<f64>>,
    pub week_over_week: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Bar,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSide {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub kind: SeriesKind,
    pub axis: AxisSide,
    pub color: String,
    pub show_legend: bool,
    pub points: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: String,
    pub color: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub dates: Vec<String>,
    pub tick_labels: Vec<String>,
    pub series: Vec<ChartSeries>,
    pub left_axis: Axis,
    pub right_axis: Axis,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    Ready { chart: Chart, summary: String },
    Empty { message: String },
}
