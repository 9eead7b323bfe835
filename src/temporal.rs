use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use polars::datatypes::TimeUnit;
use polars::prelude::*;
use tracing::{debug, warn};

use crate::error::Result;
use crate::ingest::require_columns;
use crate::schema::{derived, raw};

// Dash-separated dates are year-first or day-first; slash-separated ones are
// year-first or month-first. `%B` also accepts abbreviated month names.
const DATETIME_FORMATS: [&str; 22] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y-%m-%d %I:%M %p",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%d-%m-%Y %H:%M:%S%.f",
    "%d-%m-%Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%B %d %Y %H:%M:%S",
    "%B %d %Y %H:%M",
    "%Y%m%d %H%M%S",
    "%Y%m%d%H%M%S",
];

const DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%Y%m%d",
];

/// Result of the temporal stage: surviving rows plus which input rows were dropped.
#[derive(Debug, Clone)]
pub struct TemporalOutcome {
    pub frame: DataFrame,
    /// 0-based data-row indices whose timestamp did not parse.
    pub dropped_rows: Vec<usize>,
}

/// Permissive timestamp parse into a naive wall-clock instant.
///
/// Offsets on RFC 3339 input are discarded, keeping the local time as written.
/// Date-only values land on midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Full English weekday name, e.g. "Saturday".
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parse `Timestamp`, derive `Hour` and `DayOfWeek`, and drop rows that don't parse.
///
/// The `Timestamp` column is replaced in place by a naive microsecond Datetime;
/// `Hour` (Int32) and `DayOfWeek` (String) are appended.
pub fn normalize_timestamps(df: DataFrame) -> Result<TemporalOutcome> {
    require_columns(&df, &[raw::TIMESTAMP])?;

    let parsed: Vec<Option<NaiveDateTime>> = df
        .column(raw::TIMESTAMP)?
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_timestamp))
        .collect();

    let dropped_rows: Vec<usize> = parsed
        .iter()
        .enumerate()
        .filter_map(|(i, dt)| dt.is_none().then_some(i))
        .collect();

    let micros: Vec<Option<i64>> = parsed
        .iter()
        .map(|dt| dt.map(|dt| dt.and_utc().timestamp_micros()))
        .collect();
    let hours: Vec<Option<i32>> = parsed
        .iter()
        .map(|dt| dt.map(|dt| dt.hour() as i32))
        .collect();
    let days: Vec<Option<&str>> = parsed
        .iter()
        .map(|dt| dt.map(|dt| weekday_name(dt.weekday())))
        .collect();

    let timestamp = Series::new(raw::TIMESTAMP.into(), micros)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;

    let mut df = df;
    df.with_column(timestamp)?;
    df.with_column(Series::new(derived::HOUR.into(), hours))?;
    df.with_column(Series::new(derived::DAY_OF_WEEK.into(), days))?;

    let frame = df
        .lazy()
        .filter(col(raw::TIMESTAMP).is_not_null())
        .collect()?;

    if !dropped_rows.is_empty() {
        warn!(
            dropped = dropped_rows.len(),
            "dropped rows with unparseable timestamps"
        );
    }
    debug!(rows = frame.height(), "temporal normalization done");

    Ok(TemporalOutcome {
        frame,
        dropped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrepError;

    #[test]
    fn parses_common_shapes() {
        let expect = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        for value in [
            "2024-06-01 08:00",
            "2024-06-01 08:00:00",
            "2024-06-01T08:00:00",
            "2024-06-01T08:00:00.000",
            "2024/06/01 08:00",
            "06/01/2024 08:00",
            "2024-06-01 08:00 AM",
            "06/01/2024 08:00:00 AM",
            "01-06-2024 08:00",
            "1 June 2024 08:00",
            "June 1, 2024 08:00",
            "Jun 1 2024 08:00",
            "20240601 080000",
            "20240601080000",
            "  2024-06-01 08:00  ",
        ] {
            assert_eq!(parse_timestamp(value), Some(expect), "{value}");
        }
    }

    #[test]
    fn twelve_hour_clock_reads_meridiem() {
        assert_eq!(parse_timestamp("2024-06-01 08:00 PM").unwrap().hour(), 20);
        assert_eq!(parse_timestamp("06/01/2024 12:15 AM").unwrap().hour(), 0);
        assert_eq!(parse_timestamp("2024-06-01 12:30:00 PM").unwrap().hour(), 12);
    }

    #[test]
    fn rfc3339_keeps_wall_clock_time() {
        let dt = parse_timestamp("2024-06-01T08:30:00+03:00").unwrap();
        assert_eq!(dt.hour(), 8);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn date_only_is_midnight() {
        let dt = parse_timestamp("2024-06-02").unwrap();
        assert_eq!(dt.hour(), 0);
        assert_eq!(weekday_name(dt.weekday()), "Sunday");

        for value in ["02-06-2024", "20240602", "June 2, 2024", "Jun 2 2024"] {
            assert_eq!(parse_timestamp(value), Some(dt), "{value}");
        }
    }

    #[test]
    fn rejects_garbage() {
        for value in ["not-a-date", "bad-date", "", "   ", "2024-13-01 08:00", "25:00"] {
            assert_eq!(parse_timestamp(value), None, "{value}");
        }
    }

    #[test]
    fn drops_unparseable_rows_and_reports_them() {
        let df = polars::df!(
            "Timestamp" => [
                Some("2024-06-01 08:00"),
                Some("not-a-date"),
                None,
                Some("2024-06-01 09:15")
            ],
            "Other" => ["a", "b", "c", "d"],
        )
        .unwrap();

        let out = normalize_timestamps(df).unwrap();
        assert_eq!(out.dropped_rows, vec![1, 2]);
        assert_eq!(out.frame.height(), 2);

        let strs = |name: &str| -> Vec<Option<String>> {
            out.frame
                .column(name)
                .unwrap()
                .str()
                .unwrap()
                .into_iter()
                .map(|v| v.map(str::to_string))
                .collect()
        };
        let hours: Vec<Option<i32>> = out
            .frame
            .column("Hour")
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(hours, vec![Some(8), Some(9)]);
        assert_eq!(
            strs("DayOfWeek"),
            vec![Some("Saturday".into()), Some("Saturday".into())]
        );
        assert_eq!(strs("Other"), vec![Some("a".into()), Some("d".into())]);

        assert_eq!(
            out.frame.column("Timestamp").unwrap().dtype(),
            &DataType::Datetime(TimeUnit::Microseconds, None)
        );
    }

    #[test]
    fn timestamp_column_keeps_its_position() {
        let df = polars::df!(
            "A" => ["x"],
            "Timestamp" => ["2024-06-01 08:00"],
            "B" => ["y"],
        )
        .unwrap();
        let out = normalize_timestamps(df).unwrap();
        assert_eq!(
            out.frame.get_column_names_str(),
            vec!["A", "Timestamp", "B", "Hour", "DayOfWeek"]
        );
    }

    #[test]
    fn missing_timestamp_column_is_fatal() {
        let df = polars::df!("Other" => ["a"]).unwrap();
        let err = normalize_timestamps(df).unwrap_err();
        assert!(matches!(err, PrepError::MissingColumn(ref c) if c == "Timestamp"));
    }
}
