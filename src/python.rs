use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3_polars::PyDataFrame;

use crate::aggregation::{self, CoordinateSet, IncidentMeasure, IncidentView, RowFilter};
use crate::config::PipelineConfig;
use crate::error::PrepError;
use crate::geocode::ZoneTable;
use crate::pipeline;
use crate::schema;

/// Import name of the extension module. Must match the `[lib]` name.
const MODULE_NAME: &str = "crowd_prep";

fn row_filter<'a>(day: Option<&'a str>, activity: Option<&'a str>) -> RowFilter<'a> {
    RowFilter { day, activity }
}

/// Load and clean an event log.
///
/// Returns the cleaned DataFrame and the 0-based indices of rows dropped for
/// unparseable timestamps. `config_toml` overrides seed, jitter and zones.
#[pyfunction]
#[pyo3(signature = (csv_path, config_toml=None))]
fn load_and_clean_data(
    csv_path: &str,
    config_toml: Option<&str>,
) -> PyResult<(PyDataFrame, Vec<usize>)> {
    let config = match config_toml {
        Some(text) => PipelineConfig::from_toml_str(text)?,
        None => PipelineConfig::default(),
    };
    let prepared = pipeline::load_and_clean_with(csv_path, &config)?;
    Ok((PyDataFrame(prepared.frame), prepared.dropped_rows))
}

#[pyfunction]
#[pyo3(signature = (df, day=None, activity=None))]
fn fatigue_stress_by_hour(
    df: PyDataFrame,
    day: Option<&str>,
    activity: Option<&str>,
) -> PyResult<PyDataFrame> {
    Ok(PyDataFrame(aggregation::fatigue_stress_by_hour(
        &df.0,
        row_filter(day, activity),
    )?))
}

/// Incident counts by type and density. `detailed` splits by hour; `percent`
/// adds each count's share of its incident type.
#[pyfunction]
#[pyo3(signature = (df, day=None, activity=None, detailed=false, percent=false))]
fn incidents_by_type_and_density(
    df: PyDataFrame,
    day: Option<&str>,
    activity: Option<&str>,
    detailed: bool,
    percent: bool,
) -> PyResult<PyDataFrame> {
    let view = if detailed {
        IncidentView::Detailed
    } else {
        IncidentView::Summary
    };
    let measure = if percent {
        IncidentMeasure::Percent
    } else {
        IncidentMeasure::Count
    };
    Ok(PyDataFrame(aggregation::incidents_by_type_and_density(
        &df.0,
        row_filter(day, activity),
        view,
        measure,
    )?))
}

#[pyfunction]
#[pyo3(signature = (df, day=None, activity=None))]
fn incidents_by_hour(
    df: PyDataFrame,
    day: Option<&str>,
    activity: Option<&str>,
) -> PyResult<PyDataFrame> {
    Ok(PyDataFrame(aggregation::incidents_by_hour(
        &df.0,
        row_filter(day, activity),
    )?))
}

#[pyfunction]
fn safety_vs_satisfaction(df: PyDataFrame) -> PyResult<PyDataFrame> {
    Ok(PyDataFrame(aggregation::safety_vs_satisfaction(&df.0)?))
}

#[pyfunction]
fn movement_speed_by_location(df: PyDataFrame) -> PyResult<PyDataFrame> {
    Ok(PyDataFrame(aggregation::movement_speed_by_location(&df.0)?))
}

#[pyfunction]
#[pyo3(signature = (df, day=None, activity=None))]
fn wait_time_by_transport(
    df: PyDataFrame,
    day: Option<&str>,
    activity: Option<&str>,
) -> PyResult<PyDataFrame> {
    Ok(PyDataFrame(aggregation::wait_time_by_transport(
        &df.0,
        row_filter(day, activity),
    )?))
}

#[pyfunction]
#[pyo3(signature = (df, day=None, activity=None))]
fn wait_time_by_zone_and_transport(
    df: PyDataFrame,
    day: Option<&str>,
    activity: Option<&str>,
) -> PyResult<PyDataFrame> {
    Ok(PyDataFrame(aggregation::wait_time_by_zone_and_transport(
        &df.0,
        row_filter(day, activity),
    )?))
}

#[pyfunction]
fn stress_by_experience(df: PyDataFrame) -> PyResult<PyDataFrame> {
    Ok(PyDataFrame(aggregation::stress_by_experience(&df.0)?))
}

#[pyfunction]
fn speed_by_experience(df: PyDataFrame) -> PyResult<PyDataFrame> {
    Ok(PyDataFrame(aggregation::speed_by_experience(&df.0)?))
}

#[pyfunction]
fn health_condition_counts(df: PyDataFrame) -> PyResult<PyDataFrame> {
    Ok(PyDataFrame(aggregation::health_condition_counts(&df.0)?))
}

/// Nationality counts; past `top_n` the remainder is grouped as `Other`.
#[pyfunction]
#[pyo3(signature = (df, top_n=Some(10)))]
fn nationality_counts(df: PyDataFrame, top_n: Option<usize>) -> PyResult<PyDataFrame> {
    Ok(PyDataFrame(aggregation::nationality_counts(&df.0, top_n)?))
}

#[pyfunction]
#[pyo3(signature = (df, use_simulated=true))]
fn movement_speed_heatmap(df: PyDataFrame, use_simulated: bool) -> PyResult<PyDataFrame> {
    let coords = if use_simulated {
        CoordinateSet::Simulated
    } else {
        CoordinateSet::Real
    };
    Ok(PyDataFrame(aggregation::movement_speed_heatmap(&df.0, coords)?))
}

/// Headline metrics as `(total_incidents, avg_movement_speed, top_zone)`.
#[pyfunction]
fn dashboard_summary(df: PyDataFrame) -> PyResult<(usize, Option<f64>, Option<String>)> {
    let summary = aggregation::dashboard_summary(&df.0)?;
    Ok((
        summary.total_incidents,
        summary.avg_movement_speed,
        summary.top_zone,
    ))
}

#[pyfunction]
fn days_present(df: PyDataFrame) -> PyResult<Vec<String>> {
    Ok(aggregation::days_present(&df.0)?)
}

#[pyfunction]
fn activities_present(df: PyDataFrame) -> PyResult<Vec<String>> {
    Ok(aggregation::activities_present(&df.0)?)
}

/// Validate a TOML config without loading data.
///
/// Raises the same exceptions a load with this config would.
#[pyfunction]
fn check_config(config_toml: &str) -> PyResult<()> {
    let config = PipelineConfig::from_toml_str(config_toml)?;
    ZoneTable::new(&config.zones).map_err(PrepError::from)?;
    Ok(())
}

/// Attach `child` and list it in `sys.modules` so `import crowd_prep.<child>` resolves.
fn register_submodule(parent: &Bound<'_, PyModule>, child: &Bound<'_, PyModule>) -> PyResult<()> {
    parent.add_submodule(child)?;
    let qualified = format!("{MODULE_NAME}.{}", child.name()?);
    parent
        .py()
        .import("sys")?
        .getattr("modules")?
        .set_item(qualified, child)?;
    Ok(())
}

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Required source columns
    let raw = PyModule::new(m.py(), "raw")?;
    raw.add("TIMESTAMP", schema::raw::TIMESTAMP)?;
    raw.add("CROWD_DENSITY", schema::raw::CROWD_DENSITY)?;
    raw.add("FATIGUE_LEVEL", schema::raw::FATIGUE_LEVEL)?;
    raw.add("STRESS_LEVEL", schema::raw::STRESS_LEVEL)?;
    raw.add(
        "AR_NAVIGATION_SUCCESS",
        schema::raw::AR_NAVIGATION_SUCCESS,
    )?;
    register_submodule(m, &raw)?;

    // Derived
    let derived = PyModule::new(m.py(), "derived")?;
    derived.add("HOUR", schema::derived::HOUR)?;
    derived.add("DAY_OF_WEEK", schema::derived::DAY_OF_WEEK)?;
    derived.add("FATIGUE_SCORE", schema::derived::FATIGUE_SCORE)?;
    derived.add("STRESS_SCORE", schema::derived::STRESS_SCORE)?;
    derived.add("ZONE", schema::derived::ZONE)?;
    derived.add("SIM_LAT", schema::derived::SIM_LAT)?;
    derived.add("SIM_LON", schema::derived::SIM_LON)?;
    derived.add("LOCATION_LAT", schema::derived::LOCATION_LAT)?;
    derived.add("LOCATION_LONG", schema::derived::LOCATION_LONG)?;
    derived.add("REAL_LAT", schema::derived::REAL_LAT)?;
    derived.add("REAL_LON", schema::derived::REAL_LON)?;
    register_submodule(m, &derived)?;

    // Optional pass-through
    let optional = PyModule::new(m.py(), "optional")?;
    optional.add("INCIDENT_TYPE", schema::optional::INCIDENT_TYPE)?;
    optional.add("ACTIVITY_TYPE", schema::optional::ACTIVITY_TYPE)?;
    optional.add("NATIONALITY", schema::optional::NATIONALITY)?;
    optional.add("MOVEMENT_SPEED", schema::optional::MOVEMENT_SPEED)?;
    optional.add("TRANSPORT_MODE", schema::optional::TRANSPORT_MODE)?;
    optional.add(
        "WAITING_TIME_FOR_TRANSPORT",
        schema::optional::WAITING_TIME_FOR_TRANSPORT,
    )?;
    optional.add("SATISFACTION_RATING", schema::optional::SATISFACTION_RATING)?;
    optional.add(
        "PERCEIVED_SAFETY_RATING",
        schema::optional::PERCEIVED_SAFETY_RATING,
    )?;
    optional.add("PILGRIM_EXPERIENCE", schema::optional::PILGRIM_EXPERIENCE)?;
    optional.add("HEALTH_CONDITION", schema::optional::HEALTH_CONDITION)?;
    register_submodule(m, &optional)?;

    // Aggregate outputs
    let aggregate = PyModule::new(m.py(), "aggregate")?;
    aggregate.add("COUNT", schema::aggregate::COUNT)?;
    aggregate.add("LATITUDE", schema::aggregate::LATITUDE)?;
    aggregate.add("LONGITUDE", schema::aggregate::LONGITUDE)?;
    aggregate.add("AVG_SPEED", schema::aggregate::AVG_SPEED)?;
    aggregate.add("PERCENT", schema::aggregate::PERCENT)?;
    register_submodule(m, &aggregate)?;

    // Special category values
    let value = PyModule::new(m.py(), "value")?;
    value.add("WALKING", schema::value::WALKING)?;
    value.add("NORMAL_HEALTH", schema::value::NORMAL_HEALTH)?;
    value.add("OTHER_NATIONALITY", schema::value::OTHER_NATIONALITY)?;
    register_submodule(m, &value)?;

    // Level labels
    let level = PyModule::new(m.py(), "level")?;
    level.add("LOW", schema::level::LOW)?;
    level.add("MEDIUM", schema::level::MEDIUM)?;
    level.add("HIGH", schema::level::HIGH)?;
    register_submodule(m, &level)?;

    Ok(())
}

#[pymodule]
fn crowd_prep(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(load_and_clean_data, m)?)?;
    m.add_function(wrap_pyfunction!(fatigue_stress_by_hour, m)?)?;
    m.add_function(wrap_pyfunction!(incidents_by_type_and_density, m)?)?;
    m.add_function(wrap_pyfunction!(incidents_by_hour, m)?)?;
    m.add_function(wrap_pyfunction!(safety_vs_satisfaction, m)?)?;
    m.add_function(wrap_pyfunction!(movement_speed_by_location, m)?)?;
    m.add_function(wrap_pyfunction!(wait_time_by_transport, m)?)?;
    m.add_function(wrap_pyfunction!(wait_time_by_zone_and_transport, m)?)?;
    m.add_function(wrap_pyfunction!(stress_by_experience, m)?)?;
    m.add_function(wrap_pyfunction!(speed_by_experience, m)?)?;
    m.add_function(wrap_pyfunction!(health_condition_counts, m)?)?;
    m.add_function(wrap_pyfunction!(nationality_counts, m)?)?;
    m.add_function(wrap_pyfunction!(movement_speed_heatmap, m)?)?;
    m.add_function(wrap_pyfunction!(dashboard_summary, m)?)?;
    m.add_function(wrap_pyfunction!(days_present, m)?)?;
    m.add_function(wrap_pyfunction!(activities_present, m)?)?;
    m.add_function(wrap_pyfunction!(check_config, m)?)?;
    add_schema_exports(m)?;
    Ok(())
}
