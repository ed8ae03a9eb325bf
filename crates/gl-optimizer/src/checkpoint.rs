//! Checkpoint persistence and resume detection.
//!
//! Each completed parameter writes an `intermediate_<NN>_<param>` folder
//! holding the six-file config set plus `performance.json`. The folder set
//! is treated as an append-only event log: resumption replays up to the last
//! valid entry, and any inconsistency against the fixed parameter order
//! invalidates the whole log.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde_json::Value;
use tracing::{debug, info, warn};

use gl_config::ConfigSet;
use gl_types::{ConfigError, GlResult, Horizon};

/// Retention cap for final `optimal_*` result folders.
pub const MAX_OPTIMAL_FOLDERS: usize = 5;

const PERFORMANCE_FILE: &str = "performance.json";

/// Resume decision made at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeState {
    Fresh,
    /// Continue from `next_index` (0-based position in the parameter order),
    /// loading baselines from `folder`.
    From {
        next_index: usize,
        folder: PathBuf,
    },
}

/// Filesystem store for per-parameter checkpoints and final result folders.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    output_dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Folder name for a completed parameter; `index` is the 1-based
    /// position in the parameter order.
    pub fn intermediate_name(index: usize, param: &str) -> String {
        format!("intermediate_{index:02}_{param}")
    }

    /// Parse `intermediate_<NN>_<param>`; `None` for anything else.
    pub fn parse_intermediate(name: &str) -> Option<(usize, &str)> {
        let rest = name.strip_prefix("intermediate_")?;
        let (digits, param) = rest.split_once('_')?;
        if digits.is_empty() || param.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some((digits.parse().ok()?, param))
    }

    /// Scan the output directory and decide whether to resume.
    ///
    /// Legacy flat `intermediate_*.json` files are a hard error requiring
    /// manual cleanup. An incomplete folder or a parameter name that does
    /// not match its index position invalidates the whole log and starts
    /// fresh. Otherwise resume follows the highest valid index.
    pub fn detect_resume(&self, order: &[&str]) -> GlResult<ResumeState> {
        if !self.output_dir.is_dir() {
            return Ok(ResumeState::Fresh);
        }

        let mut legacy = 0usize;
        let mut folders: Vec<(usize, String, PathBuf)> = Vec::new();

        for entry in fs::read_dir(&self.output_dir)?.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if path.is_file() && name.starts_with("intermediate_") && name.ends_with(".json") {
                legacy += 1;
                continue;
            }
            if !path.is_dir() {
                continue;
            }
            if let Some((index, param)) = Self::parse_intermediate(&name) {
                folders.push((index, param.to_string(), path));
            }
        }

        if legacy > 0 {
            return Err(ConfigError::LegacyArtifacts {
                count: legacy,
                dir: self.output_dir.display().to_string(),
            }
            .into());
        }
        if folders.is_empty() {
            return Ok(ResumeState::Fresh);
        }

        let mut highest: Option<(usize, PathBuf)> = None;
        for (index, param, path) in folders {
            if index == 0 || index > order.len() {
                // Indices past the order length come from a completed prior
                // run with a longer ordering; ignore them.
                debug!(folder = %path.display(), "ignoring out-of-range checkpoint index");
                continue;
            }
            let expected = order[index - 1];
            if param != expected {
                warn!(
                    folder = %path.display(),
                    expected,
                    "checkpoint parameter does not match its position; starting fresh"
                );
                return Ok(ResumeState::Fresh);
            }
            if !self.folder_complete(&path) {
                warn!(
                    folder = %path.display(),
                    "checkpoint folder incomplete; starting fresh"
                );
                return Ok(ResumeState::Fresh);
            }
            if highest.as_ref().map_or(true, |(best, _)| index > *best) {
                highest = Some((index, path));
            }
        }

        match highest {
            Some((index, _)) if index >= order.len() => {
                debug!("all parameters already complete; starting fresh");
                Ok(ResumeState::Fresh)
            }
            Some((index, folder)) => {
                info!(
                    completed = index,
                    total = order.len(),
                    "resuming from checkpoint"
                );
                Ok(ResumeState::From {
                    next_index: index,
                    folder,
                })
            }
            None => Ok(ResumeState::Fresh),
        }
    }

    fn folder_complete(&self, folder: &Path) -> bool {
        let mut required: Vec<&str> = vec!["league_config.json", PERFORMANCE_FILE];
        required.extend(Horizon::ALL.iter().map(|h| h.config_file_name()));
        required.iter().all(|name| folder.join(name).is_file())
    }

    /// Write the checkpoint for a completed parameter.
    pub fn save_intermediate(
        &self,
        index: usize,
        param: &str,
        set: &ConfigSet,
        performance: &Value,
    ) -> GlResult<PathBuf> {
        let folder = self.output_dir.join(Self::intermediate_name(index, param));
        set.save_to_dir(&folder)?;
        fs::write(
            folder.join(PERFORMANCE_FILE),
            serde_json::to_string_pretty(performance)?,
        )?;
        info!(folder = %folder.display(), "saved checkpoint");
        Ok(folder)
    }

    /// Load the baselines persisted by a checkpoint folder.
    pub fn load_folder(&self, folder: &Path) -> GlResult<ConfigSet> {
        ConfigSet::load_from_dir(folder)
    }

    /// Write the final result folder, enforcing the retention cap first.
    pub fn save_optimal(&self, set: &ConfigSet, performance: &Value) -> GlResult<PathBuf> {
        self.cleanup_old_optimal(MAX_OPTIMAL_FOLDERS);
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let folder = self.output_dir.join(format!("optimal_iterative_{timestamp}"));
        set.save_to_dir(&folder)?;
        fs::write(
            folder.join(PERFORMANCE_FILE),
            serde_json::to_string_pretty(performance)?,
        )?;
        info!(folder = %folder.display(), "saved optimal configuration");
        Ok(folder)
    }

    /// Delete every intermediate checkpoint folder (after a successful
    /// pass, or before a fresh start).
    pub fn cleanup_intermediates(&self) {
        let Ok(entries) = fs::read_dir(&self.output_dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if path.is_dir() && Self::parse_intermediate(&name).is_some() {
                if let Err(e) = fs::remove_dir_all(&path) {
                    warn!(folder = %path.display(), error = %e, "failed to delete checkpoint");
                }
            }
        }
    }

    /// Delete the oldest `optimal_*` folders while the count is at or above
    /// the cap. Names embed sortable timestamps, so lexicographic order is
    /// chronological. Deletion failures are warnings, never fatal.
    pub fn cleanup_old_optimal(&self, max_folders: usize) -> usize {
        let Ok(entries) = fs::read_dir(&self.output_dir) else {
            return 0;
        };
        let mut optimal: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.is_dir()
                    && p.file_name()
                        .map(|n| n.to_string_lossy().starts_with("optimal_"))
                        .unwrap_or(false)
            })
            .collect();
        optimal.sort();

        let mut deleted = 0;
        while optimal.len() >= max_folders {
            let oldest = optimal.remove(0);
            match fs::remove_dir_all(&oldest) {
                Ok(()) => {
                    info!(folder = %oldest.display(), "deleted old optimal folder");
                    deleted += 1;
                }
                Err(e) => {
                    warn!(folder = %oldest.display(), error = %e, "failed to delete old optimal folder");
                }
            }
        }
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gl_config::ConfigDoc;
    use serde_json::json;
    use tempfile::tempdir;

    const ORDER: [&str; 4] = [
        "NORMALIZATION_MAX_SCALE",
        "SAME_POS_BYE_WEIGHT",
        "PRIMARY_BONUS",
        "SECONDARY_BONUS",
    ];

    fn config_set() -> ConfigSet {
        let doc = ConfigDoc::from_value(json!({
            "parameters": {
                "SAME_POS_BYE_WEIGHT": 0.2,
                "NORMALIZATION_MAX_SCALE": 100
            }
        }))
        .unwrap();
        ConfigSet::from_docs(Horizon::ALL.map(|h| (h, doc.clone())))
    }

    fn save_checkpoint(store: &CheckpointStore, index: usize, param: &str) -> PathBuf {
        store
            .save_intermediate(index, param, &config_set(), &json!({ "win_rate": 0.6 }))
            .unwrap()
    }

    #[test]
    fn test_name_round_trip() {
        let name = CheckpointStore::intermediate_name(3, "PRIMARY_BONUS");
        assert_eq!(name, "intermediate_03_PRIMARY_BONUS");
        assert_eq!(
            CheckpointStore::parse_intermediate(&name),
            Some((3, "PRIMARY_BONUS"))
        );
        assert!(CheckpointStore::parse_intermediate("optimal_iterative_x").is_none());
        assert!(CheckpointStore::parse_intermediate("intermediate_").is_none());
        assert!(CheckpointStore::parse_intermediate("intermediate_ab_X").is_none());
    }

    #[test]
    fn test_fresh_when_empty() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        assert_eq!(store.detect_resume(&ORDER).unwrap(), ResumeState::Fresh);
    }

    #[test]
    fn test_legacy_json_files_are_hard_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("intermediate_01_OLD.json"), "{}").unwrap();
        let store = CheckpointStore::new(dir.path());
        let err = store.detect_resume(&ORDER).unwrap_err();
        assert!(err.to_string().contains("legacy"));
    }

    #[test]
    fn test_resume_from_highest_valid_checkpoint() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        save_checkpoint(&store, 1, ORDER[0]);
        save_checkpoint(&store, 2, ORDER[1]);
        let third = save_checkpoint(&store, 3, ORDER[2]);

        match store.detect_resume(&ORDER).unwrap() {
            ResumeState::From { next_index, folder } => {
                // Three parameters done: continue at the fourth (index 3).
                assert_eq!(next_index, 3);
                assert_eq!(folder, third);
            }
            other => panic!("expected resume, got {other:?}"),
        }
    }

    #[test]
    fn test_order_mismatch_starts_fresh() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        save_checkpoint(&store, 1, ORDER[0]);
        // Wrong parameter at index 2.
        save_checkpoint(&store, 2, "PRIMARY_BONUS");

        assert_eq!(store.detect_resume(&ORDER).unwrap(), ResumeState::Fresh);
    }

    #[test]
    fn test_incomplete_folder_starts_fresh() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let folder = save_checkpoint(&store, 1, ORDER[0]);
        fs::remove_file(folder.join("performance.json")).unwrap();

        assert_eq!(store.detect_resume(&ORDER).unwrap(), ResumeState::Fresh);
    }

    #[test]
    fn test_all_parameters_complete_starts_fresh() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        for (i, param) in ORDER.iter().enumerate() {
            save_checkpoint(&store, i + 1, param);
        }
        assert_eq!(store.detect_resume(&ORDER).unwrap(), ResumeState::Fresh);
    }

    #[test]
    fn test_checkpoint_round_trips_config_set() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let folder = save_checkpoint(&store, 1, ORDER[0]);

        let set = store.load_folder(&folder).unwrap();
        assert_eq!(
            set.horizon(Horizon::Ros).param("SAME_POS_BYE_WEIGHT"),
            Some(&json!(0.2))
        );
    }

    #[test]
    fn test_cleanup_intermediates() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        save_checkpoint(&store, 1, ORDER[0]);
        save_checkpoint(&store, 2, ORDER[1]);
        store.cleanup_intermediates();

        assert_eq!(store.detect_resume(&ORDER).unwrap(), ResumeState::Fresh);
        let remaining = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_optimal_retention_cap() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        for i in 0..MAX_OPTIMAL_FOLDERS {
            fs::create_dir(dir.path().join(format!("optimal_iterative_2024010{i}_000000")))
                .unwrap();
        }
        let deleted = store.cleanup_old_optimal(MAX_OPTIMAL_FOLDERS);
        assert_eq!(deleted, 1);
        // Oldest folder went first.
        assert!(!dir.path().join("optimal_iterative_20240100_000000").exists());
        assert!(dir.path().join("optimal_iterative_20240104_000000").exists());
    }

    #[test]
    fn test_save_optimal_writes_full_folder() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let folder = store
            .save_optimal(&config_set(), &json!({ "win_rate": 0.61 }))
            .unwrap();
        assert!(folder.join("league_config.json").is_file());
        assert!(folder.join("draft_config.json").is_file());
        assert!(folder.join("week14-17.json").is_file());
        assert!(folder.join("performance.json").is_file());
    }
}
