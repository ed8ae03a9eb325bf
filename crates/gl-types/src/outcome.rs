use serde::{Deserialize, Serialize};

use crate::errors::{GlResult, SimError};

/// The four disjoint week buckets used for per-range performance tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeekRange {
    #[serde(rename = "1-5")]
    W1To5,
    #[serde(rename = "6-9")]
    W6To9,
    #[serde(rename = "10-13")]
    W10To13,
    #[serde(rename = "14-17")]
    W14To17,
}

impl WeekRange {
    pub const ALL: [WeekRange; 4] = [
        WeekRange::W1To5,
        WeekRange::W6To9,
        WeekRange::W10To13,
        WeekRange::W14To17,
    ];

    /// Bucket a week number, rejecting anything outside the 17-week season.
    pub fn for_week(week: u8) -> GlResult<WeekRange> {
        match week {
            1..=5 => Ok(WeekRange::W1To5),
            6..=9 => Ok(WeekRange::W6To9),
            10..=13 => Ok(WeekRange::W10To13),
            14..=17 => Ok(WeekRange::W14To17),
            _ => Err(SimError::InvalidWeek { week }.into()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeekRange::W1To5 => "1-5",
            WeekRange::W6To9 => "6-9",
            WeekRange::W10To13 => "10-13",
            WeekRange::W14To17 => "14-17",
        }
    }

    /// Position within [`WeekRange::ALL`], for array-indexed bucket counters.
    pub fn index(&self) -> usize {
        match self {
            WeekRange::W1To5 => 0,
            WeekRange::W6To9 => 1,
            WeekRange::W10To13 => 2,
            WeekRange::W14To17 => 3,
        }
    }
}

impl std::fmt::Display for WeekRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One configuration scope. `Ros` (rest-of-season) drives the draft; the four
/// week-range horizons drive in-season scoring for their weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "ros")]
    Ros,
    #[serde(rename = "1-5")]
    W1To5,
    #[serde(rename = "6-9")]
    W6To9,
    #[serde(rename = "10-13")]
    W10To13,
    #[serde(rename = "14-17")]
    W14To17,
}

impl Horizon {
    pub const ALL: [Horizon; 5] = [
        Horizon::Ros,
        Horizon::W1To5,
        Horizon::W6To9,
        Horizon::W10To13,
        Horizon::W14To17,
    ];

    /// The four in-season horizons, in week order.
    pub const WEEKLY: [Horizon; 4] = [
        Horizon::W1To5,
        Horizon::W6To9,
        Horizon::W10To13,
        Horizon::W14To17,
    ];

    /// File name of this horizon's config inside a six-file config folder.
    pub fn config_file_name(&self) -> &'static str {
        match self {
            Horizon::Ros => "draft_config.json",
            Horizon::W1To5 => "week1-5.json",
            Horizon::W6To9 => "week6-9.json",
            Horizon::W10To13 => "week10-13.json",
            Horizon::W14To17 => "week14-17.json",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Horizon::Ros => "ros",
            Horizon::W1To5 => "1-5",
            Horizon::W6To9 => "6-9",
            Horizon::W10To13 => "10-13",
            Horizon::W14To17 => "14-17",
        }
    }

    pub fn week_range(&self) -> Option<WeekRange> {
        match self {
            Horizon::Ros => None,
            Horizon::W1To5 => Some(WeekRange::W1To5),
            Horizon::W6To9 => Some(WeekRange::W6To9),
            Horizon::W10To13 => Some(WeekRange::W10To13),
            Horizon::W14To17 => Some(WeekRange::W14To17),
        }
    }
}

impl std::fmt::Display for Horizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one head-to-head week.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeekOutcome {
    pub week: u8,
    pub won: bool,
    pub points: f64,
}

/// Result of one simulated season: aggregate record plus the per-week
/// breakdown used for week-range bucketing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonOutcome {
    pub wins: u32,
    pub losses: u32,
    pub points: f64,
    pub weeks: Vec<WeekOutcome>,
}

impl SeasonOutcome {
    pub fn total_games(&self) -> u32 {
        self.wins + self.losses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_range_bucketing() {
        assert_eq!(WeekRange::for_week(1).unwrap(), WeekRange::W1To5);
        assert_eq!(WeekRange::for_week(5).unwrap(), WeekRange::W1To5);
        assert_eq!(WeekRange::for_week(6).unwrap(), WeekRange::W6To9);
        assert_eq!(WeekRange::for_week(13).unwrap(), WeekRange::W10To13);
        assert_eq!(WeekRange::for_week(17).unwrap(), WeekRange::W14To17);
    }

    #[test]
    fn test_week_range_rejects_out_of_season() {
        assert!(WeekRange::for_week(0).is_err());
        assert!(WeekRange::for_week(18).is_err());
    }

    #[test]
    fn test_horizon_file_names() {
        assert_eq!(Horizon::Ros.config_file_name(), "draft_config.json");
        assert_eq!(Horizon::W14To17.config_file_name(), "week14-17.json");
        // Every horizon has a distinct file.
        let mut names: Vec<_> = Horizon::ALL.iter().map(|h| h.config_file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn test_weekly_horizons_map_to_their_ranges() {
        assert_eq!(Horizon::Ros.week_range(), None);
        for (horizon, range) in Horizon::WEEKLY.iter().zip(WeekRange::ALL) {
            assert_eq!(horizon.week_range(), Some(range));
        }
    }

    #[test]
    fn test_week_range_index_matches_all_order() {
        for (i, range) in WeekRange::ALL.iter().enumerate() {
            assert_eq!(range.index(), i);
        }
    }
}
