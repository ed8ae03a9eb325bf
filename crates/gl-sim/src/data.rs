//! Historical season data discovery and validation.
//!
//! Season folders are dated directories (`2022/`, `2023/`, ...) under a data
//! root, each carrying a schedule, game data, team data, and seventeen weekly
//! player snapshots. Folders that fail the structural check are skipped with
//! a warning; zero usable seasons aborts startup.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use gl_types::{DataError, GlResult};

/// Minimum undrafted, scoring players required in week 1 for a season to
/// support a full 10-team draft.
pub const MIN_VALID_PLAYERS: usize = 150;

/// One row of a weekly `players.csv` snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerRow {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub team: String,
    pub position: String,
    #[serde(default)]
    pub bye_week: Option<u8>,
    #[serde(default)]
    pub fantasy_points: Option<f64>,
    #[serde(default)]
    pub injury_status: Option<String>,
    #[serde(default)]
    pub drafted: Option<u8>,
    #[serde(default)]
    pub locked: Option<u8>,
    #[serde(default)]
    pub average_draft_position: Option<f64>,
    #[serde(default)]
    pub player_rating: Option<f64>,
}

impl PlayerRow {
    /// Available for drafting with a real scoring history.
    pub fn is_draftable(&self) -> bool {
        self.drafted.unwrap_or(0) == 0 && self.fantasy_points.unwrap_or(0.0) > 0.0
    }
}

/// One validated historical season.
#[derive(Debug, Clone)]
pub struct SeasonData {
    pub year: String,
    root: PathBuf,
}

impl SeasonData {
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn week_file(&self, week: u8) -> PathBuf {
        self.root
            .join("weeks")
            .join(format!("week_{week:02}"))
            .join("players.csv")
    }

    /// Load the player snapshot for one week.
    pub fn week_players(&self, week: u8) -> GlResult<Vec<PlayerRow>> {
        let path = self.week_file(week);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&path)
            .map_err(|e| DataError::ParseError {
                message: format!("{}: {e}", path.display()),
            })?;

        let mut rows = Vec::new();
        for record in reader.deserialize() {
            let row: PlayerRow = record.map_err(|e| DataError::ParseError {
                message: format!("{}: {e}", path.display()),
            })?;
            rows.push(row);
        }
        Ok(rows)
    }
}

/// Enumerate and validate dated season folders under `data_root`. Invalid
/// seasons are excluded with a warning; an empty result is fatal.
pub fn discover_seasons(data_root: &Path) -> GlResult<Vec<SeasonData>> {
    let mut seasons = Vec::new();
    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Ok(entries) = fs::read_dir(data_root) {
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name();
            if path.is_dir() && name.to_string_lossy().starts_with("20") {
                candidates.push(path);
            }
        }
    }
    candidates.sort();

    for path in candidates {
        let year = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match validate_season(&path, &year) {
            Ok(season) => {
                debug!(season = %season.year, "season data validated");
                seasons.push(season);
            }
            Err(e) => {
                warn!(season = %year, error = %e, "skipping invalid season folder");
            }
        }
    }

    if seasons.is_empty() {
        return Err(DataError::NoValidSeasons {
            root: data_root.display().to_string(),
        }
        .into());
    }
    info!(count = seasons.len(), "discovered historical seasons");
    Ok(seasons)
}

fn validate_season(path: &Path, year: &str) -> Result<SeasonData, DataError> {
    let missing_err = |missing: &str| DataError::MissingStructure {
        season: year.to_string(),
        missing: missing.to_string(),
    };

    for required in ["season_schedule.csv", "game_data.csv"] {
        if !path.join(required).is_file() {
            return Err(missing_err(required));
        }
    }
    if !path.join("team_data").is_dir() {
        return Err(missing_err("team_data/"));
    }
    for week in 1..=17u8 {
        let players = path
            .join("weeks")
            .join(format!("week_{week:02}"))
            .join("players.csv");
        if !players.is_file() {
            return Err(missing_err(&format!("weeks/week_{week:02}/players.csv")));
        }
    }

    let season = SeasonData {
        year: year.to_string(),
        root: path.to_path_buf(),
    };

    let week_one = season.week_players(1).map_err(|e| DataError::ParseError {
        message: e.to_string(),
    })?;
    let draftable = week_one.iter().filter(|p| p.is_draftable()).count();
    if draftable < MIN_VALID_PLAYERS {
        return Err(DataError::InsufficientPlayers {
            season: year.to_string(),
            found: draftable,
            required: MIN_VALID_PLAYERS,
        });
    }

    Ok(season)
}
