/// Column-name constants for the crowd-monitoring event log.
/// Single source of truth - exported to Python via PyO3 when the `python` feature is on.

// ── Required source columns ─────────────────────────────────────────────────
pub mod raw {
    pub const TIMESTAMP: &str = "Timestamp";
    pub const CROWD_DENSITY: &str = "Crowd_Density";
    pub const FATIGUE_LEVEL: &str = "Fatigue_Level";
    pub const STRESS_LEVEL: &str = "Stress_Level";
    pub const AR_NAVIGATION_SUCCESS: &str = "AR_Navigation_Success";

    /// Checked in this order; the first absent one is reported.
    pub const REQUIRED: [&str; 5] = [
        TIMESTAMP,
        CROWD_DENSITY,
        FATIGUE_LEVEL,
        STRESS_LEVEL,
        AR_NAVIGATION_SUCCESS,
    ];

    /// Free-text level columns that get title-cased.
    pub const LEVELS: [&str; 3] = [CROWD_DENSITY, FATIGUE_LEVEL, STRESS_LEVEL];
}

// ── Derived columns ─────────────────────────────────────────────────────────
pub mod derived {
    pub const HOUR: &str = "Hour";
    pub const DAY_OF_WEEK: &str = "DayOfWeek";
    pub const FATIGUE_SCORE: &str = "Fatigue_Score";
    pub const STRESS_SCORE: &str = "Stress_Score";
    pub const ZONE: &str = "Zone";
    pub const SIM_LAT: &str = "Sim_Lat";
    pub const SIM_LON: &str = "Sim_Lon";
    pub const LOCATION_LAT: &str = "Location_Lat";
    pub const LOCATION_LONG: &str = "Location_Long";
    pub const REAL_LAT: &str = "Real_Lat";
    pub const REAL_LON: &str = "Real_Lon";
}

// ── Optional pass-through columns used by the dashboard ─────────────────────
pub mod optional {
    pub const INCIDENT_TYPE: &str = "Incident_Type";
    pub const ACTIVITY_TYPE: &str = "Activity_Type";
    pub const NATIONALITY: &str = "Nationality";
    pub const MOVEMENT_SPEED: &str = "Movement_Speed";
    pub const TRANSPORT_MODE: &str = "Transport_Mode";
    pub const WAITING_TIME_FOR_TRANSPORT: &str = "Waiting_Time_for_Transport";
    pub const SATISFACTION_RATING: &str = "Satisfaction_Rating";
    pub const PERCEIVED_SAFETY_RATING: &str = "Perceived_Safety_Rating";
    pub const PILGRIM_EXPERIENCE: &str = "Pilgrim_Experience";
    pub const HEALTH_CONDITION: &str = "Health_Condition";
}

// ── Aggregation output columns ──────────────────────────────────────────────
pub mod aggregate {
    pub const COUNT: &str = "Count";
    pub const LATITUDE: &str = "Latitude";
    pub const LONGITUDE: &str = "Longitude";
    pub const AVG_SPEED: &str = "Avg_Speed";
    pub const PERCENT: &str = "Percent";
}

// ── Category values the dashboard treats specially ──────────────────────────
pub mod value {
    /// Walking has no transport wait and is left out of wait-time views.
    pub const WALKING: &str = "Walking";
    /// A normal health reading is not an incident.
    pub const NORMAL_HEALTH: &str = "Normal";
    /// Bucket for nationalities beyond the top N.
    pub const OTHER_NATIONALITY: &str = "Other";
}

// ── Level labels ────────────────────────────────────────────────────────────
pub mod level {
    pub const LOW: &str = "Low";
    pub const MEDIUM: &str = "Medium";
    pub const HIGH: &str = "High";
}
