use polars::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::ingest::require_columns;
use crate::schema::{derived, level, raw};

/// Ordinal encoding of a three-level category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrdinalScore {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl OrdinalScore {
    pub fn value(self) -> i32 {
        self as i32
    }
}

/// Outcome of mapping a normalized level label to a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelCode {
    Scored(OrdinalScore),
    Unmapped,
}

impl LevelCode {
    /// Exact match on the title-cased label; anything else is `Unmapped`.
    pub fn classify(label: &str) -> Self {
        match label {
            level::LOW => LevelCode::Scored(OrdinalScore::Low),
            level::MEDIUM => LevelCode::Scored(OrdinalScore::Medium),
            level::HIGH => LevelCode::Scored(OrdinalScore::High),
            _ => LevelCode::Unmapped,
        }
    }

    pub fn score(self) -> Option<i32> {
        match self {
            LevelCode::Scored(score) => Some(score.value()),
            LevelCode::Unmapped => None,
        }
    }
}

/// AR navigation flag. Only the exact strings "Yes"/"No" are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    Success,
    Failure,
    Unrecorded,
}

impl NavigationOutcome {
    pub fn classify(value: Option<&str>) -> Self {
        match value {
            Some("Yes") => NavigationOutcome::Success,
            Some("No") => NavigationOutcome::Failure,
            _ => NavigationOutcome::Unrecorded,
        }
    }

    pub fn code(self) -> Option<i32> {
        match self {
            NavigationOutcome::Success => Some(1),
            NavigationOutcome::Failure => Some(0),
            NavigationOutcome::Unrecorded => None,
        }
    }
}

/// Title-case a label: a letter following a letter is lowered, any other letter is raised.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_is_letter = false;
    for ch in value.chars() {
        if prev_is_letter {
            out.extend(ch.to_lowercase());
        } else {
            out.extend(ch.to_uppercase());
        }
        prev_is_letter = ch.is_alphabetic();
    }
    out
}

fn title_case_column(df: &DataFrame, name: &str) -> Result<Series> {
    let values: Vec<Option<String>> = df
        .column(name)?
        .str()?
        .into_iter()
        .map(|v| v.map(title_case))
        .collect();
    Ok(Series::new(name.into(), values))
}

fn score_column(levels: &Series, name: &str) -> Result<Series> {
    let scores: Vec<Option<i32>> = levels
        .str()?
        .into_iter()
        .map(|v| v.and_then(|label| LevelCode::classify(label).score()))
        .collect();
    Ok(Series::new(name.into(), scores))
}

/// Title-case the level columns, derive `Fatigue_Score`/`Stress_Score`, and
/// recode `AR_Navigation_Success` to 1/0/null.
pub fn normalize_categoricals(mut df: DataFrame) -> Result<DataFrame> {
    require_columns(
        &df,
        &[
            raw::CROWD_DENSITY,
            raw::FATIGUE_LEVEL,
            raw::STRESS_LEVEL,
            raw::AR_NAVIGATION_SUCCESS,
        ],
    )?;

    let crowd = title_case_column(&df, raw::CROWD_DENSITY)?;
    let fatigue = title_case_column(&df, raw::FATIGUE_LEVEL)?;
    let stress = title_case_column(&df, raw::STRESS_LEVEL)?;

    let fatigue_score = score_column(&fatigue, derived::FATIGUE_SCORE)?;
    let stress_score = score_column(&stress, derived::STRESS_SCORE)?;

    let nav: Vec<Option<i32>> = df
        .column(raw::AR_NAVIGATION_SUCCESS)?
        .str()?
        .into_iter()
        .map(|v| NavigationOutcome::classify(v).code())
        .collect();

    df.with_column(crowd)?;
    df.with_column(fatigue)?;
    df.with_column(stress)?;
    df.with_column(Series::new(raw::AR_NAVIGATION_SUCCESS.into(), nav))?;
    df.with_column(fatigue_score)?;
    df.with_column(stress_score)?;

    debug!(
        unmapped_fatigue = df.column(derived::FATIGUE_SCORE)?.null_count(),
        unmapped_stress = df.column(derived::STRESS_SCORE)?.null_count(),
        "categorical normalization done"
    );
    Ok(df)
}
