//! Materialization of candidate configurations.
//!
//! Applies a `{parameter: value}` override map onto a deep copy of a
//! baseline document. The baseline is never mutated; concurrent trials may
//! read it while candidates derived from it are being evaluated.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use gl_types::{ConfigError, GlResult};

use crate::catalog::{lookup, threshold_companions, ParamRoute};
use crate::doc::ConfigDoc;
use crate::generator::round_to_precision;

/// Materializes full candidate configurations from a baseline plus an
/// override map, resolving draft-order indices against the backing-file
/// directory.
#[derive(Debug, Clone)]
pub struct Materializer {
    draft_order_dir: PathBuf,
}

impl Materializer {
    pub fn new(draft_order_dir: impl Into<PathBuf>) -> Self {
        Self {
            draft_order_dir: draft_order_dir.into(),
        }
    }

    /// Deep-copy `baseline` and write every override into its routed
    /// location. Unknown names and unresolvable draft-order indices fail
    /// with a configuration error; the baseline is untouched either way.
    pub fn materialize(
        &self,
        baseline: &ConfigDoc,
        overrides: &BTreeMap<String, f64>,
    ) -> GlResult<ConfigDoc> {
        let mut doc = baseline.clone();

        for (name, &value) in overrides {
            let entry = lookup(name).ok_or_else(|| ConfigError::UnknownParameter {
                name: name.clone(),
            })?;
            let number = to_number(value, entry.def.precision);
            let params = doc.parameters_mut();

            match entry.route {
                ParamRoute::TopLevel(key) => {
                    params.insert(key.to_string(), number);
                }
                ParamRoute::Nested { section, key } => {
                    section_mut(params, section).insert(key.to_string(), number);
                    rewrite_companions(params, section);
                }
                ParamRoute::ThresholdSteps { section } => {
                    let sec = section_mut(params, section);
                    let thresholds = object_mut(sec, "THRESHOLDS");
                    thresholds.insert("STEPS".to_string(), number);
                    rewrite_companions(params, section);
                }
                ParamRoute::LocationModifier(key) => {
                    section_mut(params, "LOCATION_MODIFIERS").insert(key.to_string(), number);
                }
                ParamRoute::DraftOrderFile => {
                    let index = value.round() as i64;
                    let order = self.load_draft_order(index)?;
                    params.insert("DRAFT_ORDER_FILE".to_string(), Value::from(index));
                    params.insert("DRAFT_ORDER".to_string(), order);
                }
            }
        }

        Ok(doc)
    }

    /// Load the `DRAFT_ORDER` array from the numbered backing file:
    /// `{n}_*.json` preferred, bare `{n}.json` accepted.
    fn load_draft_order(&self, index: i64) -> GlResult<Value> {
        let path = self.find_backing_file(index)?;
        let raw = fs::read_to_string(&path)?;
        let data: Value = serde_json::from_str(&raw)?;
        match data.get("DRAFT_ORDER") {
            Some(order @ Value::Array(_)) => {
                debug!(file = %path.display(), "loaded draft order");
                Ok(order.clone())
            }
            _ => Err(ConfigError::InvalidValue {
                parameter: "DRAFT_ORDER_FILE".to_string(),
                message: format!("{} has no DRAFT_ORDER array", path.display()),
            }
            .into()),
        }
    }

    fn find_backing_file(&self, index: i64) -> GlResult<PathBuf> {
        let prefix = format!("{index}_");
        if let Ok(entries) = fs::read_dir(&self.draft_order_dir) {
            for entry in entries.flatten() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with(&prefix) && name.ends_with(".json") {
                    return Ok(entry.path());
                }
            }
        }
        let bare = self.draft_order_dir.join(format!("{index}.json"));
        if bare.is_file() {
            return Ok(bare);
        }
        Err(ConfigError::MissingBackingFile {
            index,
            dir: self.draft_order_dir.display().to_string(),
        }
        .into())
    }
}

/// Numeric JSON value at the parameter's precision: integers for precision
/// 0, floats otherwise.
fn to_number(value: f64, precision: u8) -> Value {
    if precision == 0 {
        Value::from(value.round() as i64)
    } else {
        Value::from(round_to_precision(value, precision))
    }
}

fn section_mut<'a>(params: &'a mut Map<String, Value>, section: &str) -> &'a mut Map<String, Value> {
    object_mut_in(params, section)
}

fn object_mut<'a>(obj: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    object_mut_in(obj, key)
}

fn object_mut_in<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let entry = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    match entry.as_object_mut() {
        Some(obj) => obj,
        None => unreachable!(),
    }
}

/// Rewrite the fixed companion fields of a thresholded section. They come
/// from the fixed table, never from an override map.
fn rewrite_companions(params: &mut Map<String, Value>, section: &str) {
    let Some((threshold_fields, root_fields)) = threshold_companions(section) else {
        return;
    };
    let sec = section_mut(params, section);
    for (key, value) in root_fields {
        sec.insert(key.to_string(), value);
    }
    let thresholds = object_mut(sec, "THRESHOLDS");
    for (key, value) in threshold_fields {
        thresholds.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn baseline() -> ConfigDoc {
        ConfigDoc::from_value(json!({
            "parameters": {
                "NORMALIZATION_MAX_SCALE": 100,
                "SAME_POS_BYE_WEIGHT": 0.2,
                "DRAFT_ORDER_BONUSES": { "PRIMARY": 80, "SECONDARY": 60 },
                "ADP_SCORING": { "WEIGHT": 2.0, "THRESHOLDS": { "STEPS": 20 } },
                "TEMPERATURE_SCORING": { "WEIGHT": 1.0 },
                "LOCATION_MODIFIERS": { "HOME": 1.5 }
            }
        }))
        .unwrap()
    }

    fn overrides(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn materializer() -> Materializer {
        Materializer::new("nonexistent")
    }

    #[test]
    fn test_baseline_never_mutated() {
        let base = baseline();
        let before = base.clone();
        let _ = materializer()
            .materialize(&base, &overrides(&[("NORMALIZATION_MAX_SCALE", 140.0)]))
            .unwrap();
        assert_eq!(base, before);
    }

    #[test]
    fn test_top_level_and_nested_writes() {
        let doc = materializer()
            .materialize(
                &baseline(),
                &overrides(&[
                    ("NORMALIZATION_MAX_SCALE", 140.0),
                    ("PRIMARY_BONUS", 95.0),
                    ("LOCATION_AWAY", -3.5),
                ]),
            )
            .unwrap();
        assert_eq!(doc.param("NORMALIZATION_MAX_SCALE"), Some(&json!(140)));
        assert_eq!(
            doc.param("DRAFT_ORDER_BONUSES").unwrap().get("PRIMARY"),
            Some(&json!(95))
        );
        // Sibling key untouched.
        assert_eq!(
            doc.param("DRAFT_ORDER_BONUSES").unwrap().get("SECONDARY"),
            Some(&json!(60))
        );
        assert_eq!(
            doc.param("LOCATION_MODIFIERS").unwrap().get("AWAY"),
            Some(&json!(-3.5))
        );
        assert_eq!(
            doc.param("LOCATION_MODIFIERS").unwrap().get("HOME"),
            Some(&json!(1.5))
        );
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let err = materializer()
            .materialize(&baseline(), &overrides(&[("MYSTERY_KNOB", 1.0)]))
            .unwrap_err();
        assert!(err.to_string().contains("Unknown parameter"));
    }

    #[test]
    fn test_steps_override_rewrites_companions() {
        let doc = materializer()
            .materialize(&baseline(), &overrides(&[("ADP_SCORING_STEPS", 25.0)]))
            .unwrap();
        let thresholds = doc.param("ADP_SCORING").unwrap().get("THRESHOLDS").unwrap();
        assert_eq!(thresholds.get("STEPS"), Some(&json!(25)));
        assert_eq!(thresholds.get("BASE_POSITION"), Some(&json!(0)));
        assert_eq!(thresholds.get("DIRECTION"), Some(&json!("DECREASING")));
    }

    #[test]
    fn test_temperature_fixed_fields_follow_any_touch() {
        // Overriding only the weight still pins the fixed steps and ideal
        // temperature for the section.
        let doc = materializer()
            .materialize(
                &baseline(),
                &overrides(&[("TEMPERATURE_SCORING_WEIGHT", 1.8)]),
            )
            .unwrap();
        let section = doc.param("TEMPERATURE_SCORING").unwrap();
        assert_eq!(section.get("WEIGHT"), Some(&json!(1.8)));
        assert_eq!(section.get("IDEAL_TEMPERATURE"), Some(&json!(60)));
        let thresholds = section.get("THRESHOLDS").unwrap();
        assert_eq!(thresholds.get("STEPS"), Some(&json!(10)));
        assert_eq!(thresholds.get("DIRECTION"), Some(&json!("DECREASING")));
    }

    #[test]
    fn test_integer_precision_written_as_integer() {
        let doc = materializer()
            .materialize(&baseline(), &overrides(&[("MATCHUP_IMPACT_SCALE", 120.0)]))
            .unwrap();
        let v = doc.param("MATCHUP_SCORING").unwrap().get("IMPACT_SCALE").unwrap();
        assert!(v.is_i64());
        assert_eq!(v, &json!(120));
    }

    #[test]
    fn test_draft_order_file_loads_backing_array() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("7_rb_heavy.json"),
            json!({ "DRAFT_ORDER": ["RB", "RB", "WR", "QB"] }).to_string(),
        )
        .unwrap();

        let doc = Materializer::new(dir.path())
            .materialize(&baseline(), &overrides(&[("DRAFT_ORDER_FILE", 7.0)]))
            .unwrap();
        assert_eq!(doc.param("DRAFT_ORDER_FILE"), Some(&json!(7)));
        assert_eq!(
            doc.param("DRAFT_ORDER"),
            Some(&json!(["RB", "RB", "WR", "QB"]))
        );
    }

    #[test]
    fn test_draft_order_bare_numbered_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("3.json"),
            json!({ "DRAFT_ORDER": ["WR"] }).to_string(),
        )
        .unwrap();
        let doc = Materializer::new(dir.path())
            .materialize(&baseline(), &overrides(&[("DRAFT_ORDER_FILE", 3.0)]))
            .unwrap();
        assert_eq!(doc.param("DRAFT_ORDER"), Some(&json!(["WR"])));
    }

    #[test]
    fn test_missing_backing_file_is_error() {
        let dir = tempdir().unwrap();
        let err = Materializer::new(dir.path())
            .materialize(&baseline(), &overrides(&[("DRAFT_ORDER_FILE", 42.0)]))
            .unwrap_err();
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_empty_overrides_is_identity() {
        let base = baseline();
        let doc = materializer().materialize(&base, &BTreeMap::new()).unwrap();
        assert_eq!(doc, base);
    }
}
