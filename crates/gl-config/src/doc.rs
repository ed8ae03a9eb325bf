//! Configuration documents and the six-file config set.
//!
//! A [`ConfigDoc`] wraps one nested JSON parameter tree. A [`ConfigSet`]
//! holds one fully-merged document per horizon, loaded from a folder of
//! `league_config.json` plus five horizon files and saved back in the same
//! split (base sections to the league file, week sections to each horizon
//! file).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use gl_types::{ConfigError, GlResult, Horizon};

use crate::catalog::{CatalogEntry, ParamRoute, BASE_SECTIONS, WEEK_SECTIONS};

/// One nested configuration tree. The root object carries a `parameters`
/// object; trial mutation always goes through a clone.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDoc {
    root: Value,
}

impl ConfigDoc {
    pub fn from_value(root: Value) -> GlResult<Self> {
        match root.get("parameters") {
            Some(Value::Object(_)) => Ok(Self { root }),
            _ => Err(ConfigError::MalformedDocument {
                message: "missing `parameters` object".to_string(),
            }
            .into()),
        }
    }

    pub fn from_file(path: &Path) -> GlResult<Self> {
        let raw = fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.display().to_string(),
        })?;
        let root: Value = serde_json::from_str(&raw)?;
        Self::from_value(root)
    }

    /// An empty document with no parameters set.
    pub fn empty() -> Self {
        Self {
            root: serde_json::json!({ "parameters": {} }),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    pub fn parameters(&self) -> &Map<String, Value> {
        // Guaranteed by construction.
        self.root["parameters"].as_object().unwrap_or_else(|| unreachable!())
    }

    pub fn parameters_mut(&mut self) -> &mut Map<String, Value> {
        match self.root["parameters"].as_object_mut() {
            Some(map) => map,
            None => unreachable!(),
        }
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.parameters().get(key)
    }

    /// Set a top-level field outside `parameters` (metadata like
    /// `config_name`).
    pub fn set_meta(&mut self, key: &str, value: Value) {
        if let Some(obj) = self.root.as_object_mut() {
            obj.insert(key.to_string(), value);
        }
    }

    /// Read the current numeric value of a catalog entry from this document.
    pub fn current_value(&self, entry: &CatalogEntry) -> Option<f64> {
        let params = self.parameters();
        let v = match entry.route {
            ParamRoute::TopLevel(key) => params.get(key),
            ParamRoute::Nested { section, key } => params.get(section)?.get(key),
            ParamRoute::ThresholdSteps { section } => {
                params.get(section)?.get("THRESHOLDS")?.get("STEPS")
            }
            ParamRoute::LocationModifier(key) => params.get("LOCATION_MODIFIERS")?.get(key),
            ParamRoute::DraftOrderFile => params.get("DRAFT_ORDER_FILE"),
        };
        v.and_then(Value::as_f64)
    }

    /// Merge base parameters under this document's own (horizon parameters
    /// win on conflict, though the section sets are disjoint by design).
    fn merged_over(base: &ConfigDoc, horizon: &ConfigDoc) -> ConfigDoc {
        let mut doc = base.clone();
        for (k, v) in horizon.parameters() {
            doc.parameters_mut().insert(k.clone(), v.clone());
        }
        // Carry horizon-file metadata (name, description) over the base's.
        if let (Some(dst), Some(src)) = (doc.root.as_object_mut(), horizon.root.as_object()) {
            for (k, v) in src {
                if k != "parameters" {
                    dst.insert(k.clone(), v.clone());
                }
            }
        }
        doc
    }

    /// Copy of this document keeping only the named parameter sections.
    fn filtered(&self, sections: &[&str]) -> ConfigDoc {
        let mut doc = self.clone();
        doc.parameters_mut()
            .retain(|k, _| sections.contains(&k.as_str()));
        doc
    }

    pub fn write_to_file(&self, path: &Path) -> GlResult<()> {
        let raw = serde_json::to_string_pretty(&self.root)?;
        fs::write(path, raw)?;
        Ok(())
    }
}

/// One fully-merged configuration document per horizon.
#[derive(Debug, Clone)]
pub struct ConfigSet {
    horizons: BTreeMap<&'static str, ConfigDoc>,
}

impl ConfigSet {
    /// Load the six-file structure: `league_config.json` merged with each
    /// horizon file. Any missing file is a configuration error.
    pub fn load_from_dir(dir: &Path) -> GlResult<Self> {
        let base = ConfigDoc::from_file(&dir.join("league_config.json"))?;
        let mut horizons = BTreeMap::new();
        for horizon in Horizon::ALL {
            let doc = ConfigDoc::from_file(&dir.join(horizon.config_file_name()))?;
            horizons.insert(horizon.label(), ConfigDoc::merged_over(&base, &doc));
        }
        Ok(Self { horizons })
    }

    /// Build a set from one merged document per horizon.
    pub fn from_docs(docs: impl IntoIterator<Item = (Horizon, ConfigDoc)>) -> Self {
        Self {
            horizons: docs
                .into_iter()
                .map(|(h, d)| (h.label(), d))
                .collect(),
        }
    }

    pub fn horizon(&self, horizon: Horizon) -> &ConfigDoc {
        &self.horizons[horizon.label()]
    }

    /// Replace one horizon's document wholesale. Winning candidates replace
    /// baselines rather than mutating them in place.
    pub fn replace(&mut self, horizon: Horizon, doc: ConfigDoc) {
        self.horizons.insert(horizon.label(), doc);
    }

    /// Write the six-file structure. Base sections are taken from the
    /// rest-of-season document (base updates keep all horizons in sync, so
    /// any horizon would do).
    pub fn save_to_dir(&self, dir: &Path) -> GlResult<()> {
        fs::create_dir_all(dir)?;
        let base = self.horizon(Horizon::Ros).filtered(&BASE_SECTIONS);
        base.write_to_file(&dir.join("league_config.json"))?;
        for horizon in Horizon::ALL {
            let doc = self.horizon(horizon).filtered(&WEEK_SECTIONS);
            doc.write_to_file(&dir.join(horizon.config_file_name()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn write_json(dir: &Path, name: &str, value: &Value) {
        fs::write(dir.join(name), serde_json::to_string_pretty(value).unwrap()).unwrap();
    }

    fn base_json() -> Value {
        json!({
            "config_name": "test league",
            "parameters": {
                "SAME_POS_BYE_WEIGHT": 0.2,
                "DIFF_POS_BYE_WEIGHT": 0.1,
                "DRAFT_ORDER_BONUSES": { "PRIMARY": 80, "SECONDARY": 60 },
                "DRAFT_ORDER_FILE": 1,
                "ADP_SCORING": { "WEIGHT": 2.0, "THRESHOLDS": { "STEPS": 20 } }
            }
        })
    }

    fn horizon_json(scale: f64) -> Value {
        json!({
            "parameters": {
                "NORMALIZATION_MAX_SCALE": scale,
                "PLAYER_RATING_SCORING": { "WEIGHT": 2.0 },
                "LOCATION_MODIFIERS": { "HOME": 1.5, "AWAY": -1.5 }
            }
        })
    }

    fn write_config_folder(dir: &Path) {
        write_json(dir, "league_config.json", &base_json());
        for (i, horizon) in Horizon::ALL.iter().enumerate() {
            write_json(dir, horizon.config_file_name(), &horizon_json(100.0 + i as f64));
        }
    }

    #[test]
    fn test_doc_requires_parameters_object() {
        assert!(ConfigDoc::from_value(json!({ "parameters": {} })).is_ok());
        assert!(ConfigDoc::from_value(json!({ "other": 1 })).is_err());
        assert!(ConfigDoc::from_value(json!({ "parameters": 3 })).is_err());
    }

    #[test]
    fn test_load_merges_base_and_horizon() {
        let dir = tempdir().unwrap();
        write_config_folder(dir.path());

        let set = ConfigSet::load_from_dir(dir.path()).unwrap();
        let ros = set.horizon(Horizon::Ros);
        // Base section present.
        assert_eq!(ros.param("SAME_POS_BYE_WEIGHT"), Some(&json!(0.2)));
        // Horizon section present, with the ros-specific value.
        assert_eq!(ros.param("NORMALIZATION_MAX_SCALE"), Some(&json!(100.0)));
        let late = set.horizon(Horizon::W14To17);
        assert_eq!(late.param("NORMALIZATION_MAX_SCALE"), Some(&json!(104.0)));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let dir = tempdir().unwrap();
        write_json(dir.path(), "league_config.json", &base_json());
        // No horizon files.
        let err = ConfigSet::load_from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Missing configuration file"));
    }

    #[test]
    fn test_save_splits_base_and_week_sections() {
        let dir = tempdir().unwrap();
        write_config_folder(dir.path());
        let set = ConfigSet::load_from_dir(dir.path()).unwrap();

        let out = tempdir().unwrap();
        set.save_to_dir(out.path()).unwrap();

        let league = ConfigDoc::from_file(&out.path().join("league_config.json")).unwrap();
        assert!(league.param("SAME_POS_BYE_WEIGHT").is_some());
        assert!(league.param("NORMALIZATION_MAX_SCALE").is_none());

        let week = ConfigDoc::from_file(&out.path().join("week6-9.json")).unwrap();
        assert!(week.param("NORMALIZATION_MAX_SCALE").is_some());
        assert!(week.param("SAME_POS_BYE_WEIGHT").is_none());

        // Round-trips back into a loadable set.
        let reloaded = ConfigSet::load_from_dir(out.path()).unwrap();
        // W6To9 is the third horizon, written with scale 100.0 + 2.
        assert_eq!(
            reloaded.horizon(Horizon::W6To9).param("NORMALIZATION_MAX_SCALE"),
            Some(&json!(102.0))
        );
    }

    #[test]
    fn test_current_value_via_routes() {
        let dir = tempdir().unwrap();
        write_config_folder(dir.path());
        let set = ConfigSet::load_from_dir(dir.path()).unwrap();
        let doc = set.horizon(Horizon::Ros);

        let scale = crate::catalog::lookup("NORMALIZATION_MAX_SCALE").unwrap();
        assert_eq!(doc.current_value(scale), Some(100.0));
        let primary = crate::catalog::lookup("PRIMARY_BONUS").unwrap();
        assert_eq!(doc.current_value(primary), Some(80.0));
        let steps = crate::catalog::lookup("ADP_SCORING_STEPS").unwrap();
        assert_eq!(doc.current_value(steps), Some(20.0));
        let home = crate::catalog::lookup("LOCATION_HOME").unwrap();
        assert_eq!(doc.current_value(home), Some(1.5));
    }
}
