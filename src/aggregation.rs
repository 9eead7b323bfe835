use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::*;

use crate::error::Result;
use crate::ingest::require_columns;
use crate::schema::{aggregate, derived, optional, raw, value};

/// Which coordinate pair a map view reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSet {
    Simulated,
    Real,
}

impl CoordinateSet {
    fn columns(self) -> (&'static str, &'static str) {
        match self {
            CoordinateSet::Simulated => (derived::SIM_LAT, derived::SIM_LON),
            CoordinateSet::Real => (derived::REAL_LAT, derived::REAL_LON),
        }
    }
}

/// Headline numbers shown above the dashboard charts.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub total_incidents: usize,
    pub avg_movement_speed: Option<f64>,
    pub top_zone: Option<String>,
}

/// Float view of a column. Pass-through columns arrive as strings; unparsable values become null.
fn as_float(df: &DataFrame, name: &str) -> Result<Expr> {
    let expr = match df.column(name)?.dtype() {
        DataType::String => col(name)
            .str()
            .strip_chars(lit(" \t\r\n"))
            .cast(DataType::Float64),
        _ => col(name).cast(DataType::Float64),
    };
    Ok(expr)
}

/// Row selection shared by the day-scoped views.
///
/// `activity` needs an `Activity_Type` column; `day` needs `DayOfWeek`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowFilter<'a> {
    pub day: Option<&'a str>,
    pub activity: Option<&'a str>,
}

impl<'a> RowFilter<'a> {
    pub fn day(day: &'a str) -> Self {
        Self {
            day: Some(day),
            activity: None,
        }
    }

    pub fn with_activity(mut self, activity: &'a str) -> Self {
        self.activity = Some(activity);
        self
    }

    fn apply(self, df: &DataFrame) -> Result<LazyFrame> {
        let mut lazy = df.clone().lazy();
        if let Some(day) = self.day {
            require_columns(df, &[derived::DAY_OF_WEEK])?;
            lazy = lazy.filter(col(derived::DAY_OF_WEEK).eq(lit(day)));
        }
        if let Some(activity) = self.activity {
            require_columns(df, &[optional::ACTIVITY_TYPE])?;
            lazy = lazy.filter(col(optional::ACTIVITY_TYPE).eq(lit(activity)));
        }
        Ok(lazy)
    }
}

/// Grouping for the incident/density breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentView {
    /// Per (incident type, crowd density).
    Summary,
    /// Per (hour, incident type, crowd density).
    Detailed,
}

impl IncidentView {
    fn keys(self) -> Vec<&'static str> {
        match self {
            IncidentView::Summary => vec![optional::INCIDENT_TYPE, raw::CROWD_DENSITY],
            IncidentView::Detailed => {
                vec![derived::HOUR, optional::INCIDENT_TYPE, raw::CROWD_DENSITY]
            }
        }
    }

    /// Keys whose total a `Percent` value is relative to.
    fn share_keys(self) -> Vec<&'static str> {
        match self {
            IncidentView::Summary => vec![optional::INCIDENT_TYPE],
            IncidentView::Detailed => vec![derived::HOUR, optional::INCIDENT_TYPE],
        }
    }
}

/// Whether the incident breakdown also carries a `Percent` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentMeasure {
    Count,
    Percent,
}

fn row_count() -> Expr {
    len().cast(DataType::UInt64).alias(aggregate::COUNT)
}

/// `<name>, Count` for non-null values, most frequent first, ties by name.
fn value_counts(lazy: LazyFrame, name: &str) -> Result<DataFrame> {
    let out = lazy
        .filter(col(name).is_not_null())
        .group_by([col(name)])
        .agg([row_count()])
        .sort(
            [aggregate::COUNT, name],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .collect()?;
    Ok(out)
}

fn distinct_sorted(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    require_columns(df, &[name])?;
    let values: BTreeSet<String> = df
        .column(name)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();
    Ok(values.into_iter().collect())
}

/// Mean fatigue and stress score per hour of day.
pub fn fatigue_stress_by_hour(df: &DataFrame, filter: RowFilter<'_>) -> Result<DataFrame> {
    require_columns(
        df,
        &[derived::HOUR, derived::FATIGUE_SCORE, derived::STRESS_SCORE],
    )?;
    let out = filter
        .apply(df)?
        .group_by([col(derived::HOUR)])
        .agg([
            col(derived::FATIGUE_SCORE).cast(DataType::Float64).mean(),
            col(derived::STRESS_SCORE).cast(DataType::Float64).mean(),
        ])
        .sort([derived::HOUR], SortMultipleOptions::default())
        .collect()?;
    Ok(out)
}

/// Incident counts by type and crowd density, optionally split by hour.
///
/// With [`IncidentMeasure::Percent`] a `Percent` column gives each count as a
/// share of its incident type (within the hour for the detailed view).
pub fn incidents_by_type_and_density(
    df: &DataFrame,
    filter: RowFilter<'_>,
    view: IncidentView,
    measure: IncidentMeasure,
) -> Result<DataFrame> {
    let keys = view.keys();
    require_columns(df, &keys)?;
    let not_null = keys
        .iter()
        .map(|k| col(*k).is_not_null())
        .reduce(|acc, e| acc.and(e))
        .unwrap_or_else(|| lit(true));

    let mut lazy = filter
        .apply(df)?
        .filter(not_null)
        .group_by(keys.iter().map(|k| col(*k)).collect::<Vec<_>>())
        .agg([row_count()]);
    if measure == IncidentMeasure::Percent {
        let share_keys: Vec<Expr> = view.share_keys().into_iter().map(col).collect();
        let count = col(aggregate::COUNT).cast(DataType::Float64);
        lazy = lazy.with_column(
            (count.clone() / count.sum().over(share_keys) * lit(100.0))
                .alias(aggregate::PERCENT),
        );
    }
    let out = lazy
        .sort(keys, SortMultipleOptions::default())
        .collect()?;
    Ok(out)
}

/// Incident counts per (hour, incident type).
pub fn incidents_by_hour(df: &DataFrame, filter: RowFilter<'_>) -> Result<DataFrame> {
    require_columns(df, &[derived::HOUR, optional::INCIDENT_TYPE])?;
    let out = filter
        .apply(df)?
        .filter(
            col(derived::HOUR)
                .is_not_null()
                .and(col(optional::INCIDENT_TYPE).is_not_null()),
        )
        .group_by([col(derived::HOUR), col(optional::INCIDENT_TYPE)])
        .agg([row_count()])
        .sort(
            [derived::HOUR, optional::INCIDENT_TYPE],
            SortMultipleOptions::default(),
        )
        .collect()?;
    Ok(out)
}

/// Mean satisfaction and perceived safety per nationality.
pub fn safety_vs_satisfaction(df: &DataFrame) -> Result<DataFrame> {
    require_columns(
        df,
        &[
            optional::NATIONALITY,
            optional::SATISFACTION_RATING,
            optional::PERCEIVED_SAFETY_RATING,
        ],
    )?;
    let out = df
        .clone()
        .lazy()
        .filter(col(optional::NATIONALITY).is_not_null())
        .group_by([col(optional::NATIONALITY)])
        .agg([
            as_float(df, optional::SATISFACTION_RATING)?.mean(),
            as_float(df, optional::PERCEIVED_SAFETY_RATING)?.mean(),
        ])
        .sort([optional::NATIONALITY], SortMultipleOptions::default())
        .collect()?;
    Ok(out)
}

/// Mean movement speed per exact location.
pub fn movement_speed_by_location(df: &DataFrame) -> Result<DataFrame> {
    require_columns(
        df,
        &[
            derived::LOCATION_LAT,
            derived::LOCATION_LONG,
            optional::MOVEMENT_SPEED,
        ],
    )?;
    let out = df
        .clone()
        .lazy()
        .group_by([col(derived::LOCATION_LAT), col(derived::LOCATION_LONG)])
        .agg([as_float(df, optional::MOVEMENT_SPEED)?.mean()])
        .sort(
            [derived::LOCATION_LAT, derived::LOCATION_LONG],
            SortMultipleOptions::default(),
        )
        .collect()?;
    Ok(out)
}

/// Mean wait time per transport mode.
pub fn wait_time_by_transport(df: &DataFrame, filter: RowFilter<'_>) -> Result<DataFrame> {
    require_columns(
        df,
        &[
            optional::TRANSPORT_MODE,
            optional::WAITING_TIME_FOR_TRANSPORT,
        ],
    )?;
    let out = filter
        .apply(df)?
        .filter(col(optional::TRANSPORT_MODE).is_not_null())
        .group_by([col(optional::TRANSPORT_MODE)])
        .agg([as_float(df, optional::WAITING_TIME_FOR_TRANSPORT)?.mean()])
        .sort([optional::TRANSPORT_MODE], SortMultipleOptions::default())
        .collect()?;
    Ok(out)
}

/// Mean wait per (zone, transport mode), leaving out walking and incomplete rows.
pub fn wait_time_by_zone_and_transport(
    df: &DataFrame,
    filter: RowFilter<'_>,
) -> Result<DataFrame> {
    require_columns(
        df,
        &[
            derived::ZONE,
            optional::TRANSPORT_MODE,
            optional::WAITING_TIME_FOR_TRANSPORT,
        ],
    )?;
    let wait = as_float(df, optional::WAITING_TIME_FOR_TRANSPORT)?;
    let out = filter
        .apply(df)?
        .filter(
            col(derived::ZONE)
                .is_not_null()
                .and(col(optional::TRANSPORT_MODE).is_not_null())
                .and(wait.clone().is_not_null())
                .and(col(optional::TRANSPORT_MODE).neq(lit(value::WALKING))),
        )
        .group_by([col(derived::ZONE), col(optional::TRANSPORT_MODE)])
        .agg([wait.mean()])
        .sort(
            [derived::ZONE, optional::TRANSPORT_MODE],
            SortMultipleOptions::default(),
        )
        .collect()?;
    Ok(out)
}

/// Mean stress score per pilgrim experience level.
pub fn stress_by_experience(df: &DataFrame) -> Result<DataFrame> {
    require_columns(df, &[optional::PILGRIM_EXPERIENCE, derived::STRESS_SCORE])?;
    let out = df
        .clone()
        .lazy()
        .filter(
            col(optional::PILGRIM_EXPERIENCE)
                .is_not_null()
                .and(col(derived::STRESS_SCORE).is_not_null()),
        )
        .group_by([col(optional::PILGRIM_EXPERIENCE)])
        .agg([col(derived::STRESS_SCORE).cast(DataType::Float64).mean()])
        .sort(
            [optional::PILGRIM_EXPERIENCE],
            SortMultipleOptions::default(),
        )
        .collect()?;
    Ok(out)
}

/// Mean movement speed per pilgrim experience level.
pub fn speed_by_experience(df: &DataFrame) -> Result<DataFrame> {
    require_columns(df, &[optional::PILGRIM_EXPERIENCE, optional::MOVEMENT_SPEED])?;
    let speed = as_float(df, optional::MOVEMENT_SPEED)?;
    let out = df
        .clone()
        .lazy()
        .filter(
            col(optional::PILGRIM_EXPERIENCE)
                .is_not_null()
                .and(speed.clone().is_not_null()),
        )
        .group_by([col(optional::PILGRIM_EXPERIENCE)])
        .agg([speed.mean()])
        .sort(
            [optional::PILGRIM_EXPERIENCE],
            SortMultipleOptions::default(),
        )
        .collect()?;
    Ok(out)
}

/// Reported health conditions, most common first. `Normal` is not counted.
pub fn health_condition_counts(df: &DataFrame) -> Result<DataFrame> {
    require_columns(df, &[optional::HEALTH_CONDITION])?;
    let lazy = df
        .clone()
        .lazy()
        .filter(col(optional::HEALTH_CONDITION).neq(lit(value::NORMAL_HEALTH)));
    value_counts(lazy, optional::HEALTH_CONDITION)
}

/// Participants per nationality, most common first.
///
/// With `top_n`, nationalities past the first `top_n` are summed into one
/// trailing `Other` row.
pub fn nationality_counts(df: &DataFrame, top_n: Option<usize>) -> Result<DataFrame> {
    require_columns(df, &[optional::NATIONALITY])?;
    let counts = value_counts(df.clone().lazy(), optional::NATIONALITY)?;
    let top_n = match top_n {
        Some(n) if counts.height() > n => n,
        _ => return Ok(counts),
    };

    let mut names: Vec<String> = counts
        .column(optional::NATIONALITY)?
        .str()?
        .into_no_null_iter()
        .map(str::to_string)
        .collect();
    let mut totals: Vec<u64> = counts
        .column(aggregate::COUNT)?
        .u64()?
        .into_no_null_iter()
        .collect();
    let rest: u64 = totals[top_n..].iter().sum();
    names.truncate(top_n);
    totals.truncate(top_n);
    names.push(value::OTHER_NATIONALITY.to_string());
    totals.push(rest);

    let out = DataFrame::new(vec![
        Series::new(optional::NATIONALITY.into(), names).into(),
        Series::new(aggregate::COUNT.into(), totals).into(),
    ])?;
    Ok(out)
}

fn round4(value: f64) -> f64 {
    (value * 1e4).round_ties_even() / 1e4
}

/// Movement speed averaged over a ~10 m grid (coordinates rounded to 4 decimals).
///
/// Output columns: `Latitude`, `Longitude`, `Avg_Speed`.
pub fn movement_speed_heatmap(df: &DataFrame, coords: CoordinateSet) -> Result<DataFrame> {
    let (lat_col, lon_col) = coords.columns();
    require_columns(df, &[lat_col, lon_col, optional::MOVEMENT_SPEED])?;

    let rounded = |name: &str| -> Result<Series> {
        let values: Vec<Option<f64>> = df
            .column(name)?
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.map(round4))
            .collect();
        Ok(Series::new(name.into(), values))
    };

    let grid = DataFrame::new(vec![
        rounded(lat_col)?
            .with_name(aggregate::LATITUDE.into())
            .into(),
        rounded(lon_col)?
            .with_name(aggregate::LONGITUDE.into())
            .into(),
        df.column(optional::MOVEMENT_SPEED)?.clone(),
    ])?;

    let out = grid
        .lazy()
        .group_by([col(aggregate::LATITUDE), col(aggregate::LONGITUDE)])
        .agg([as_float(df, optional::MOVEMENT_SPEED)?
            .mean()
            .alias(aggregate::AVG_SPEED)])
        .sort(
            [aggregate::LATITUDE, aggregate::LONGITUDE],
            SortMultipleOptions::default(),
        )
        .collect()?;
    Ok(out)
}

/// Total incidents, mean movement speed and the busiest zone.
///
/// Ties for the busiest zone go to the alphabetically first name.
pub fn dashboard_summary(df: &DataFrame) -> Result<DashboardSummary> {
    require_columns(
        df,
        &[optional::INCIDENT_TYPE, optional::MOVEMENT_SPEED, derived::ZONE],
    )?;

    let incidents = df.column(optional::INCIDENT_TYPE)?;
    let total_incidents = incidents.len() - incidents.null_count();

    let speed = df
        .clone()
        .lazy()
        .select([as_float(df, optional::MOVEMENT_SPEED)?.mean()])
        .collect()?;
    let avg_movement_speed = speed.column(optional::MOVEMENT_SPEED)?.f64()?.get(0);

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for zone in df.column(derived::ZONE)?.str()?.into_iter().flatten() {
        *counts.entry(zone).or_default() += 1;
    }
    let top_zone = counts
        .iter()
        .fold(None::<(&str, usize)>, |best, (&zone, &n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((zone, n)),
        })
        .map(|(zone, _)| zone.to_string());

    Ok(DashboardSummary {
        total_incidents,
        avg_movement_speed,
        top_zone,
    })
}

/// Distinct `DayOfWeek` values, alphabetically, as the day filters list them.
pub fn days_present(df: &DataFrame) -> Result<Vec<String>> {
    distinct_sorted(df, derived::DAY_OF_WEEK)
}

/// Distinct `Activity_Type` values, alphabetically.
pub fn activities_present(df: &DataFrame) -> Result<Vec<String>> {
    distinct_sorted(df, optional::ACTIVITY_TYPE)
}
