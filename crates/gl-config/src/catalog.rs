//! The closed catalog of tunable parameters.
//!
//! Every parameter the optimizer may touch is declared here with its bounds,
//! numeric precision, and write route into the nested configuration tree.
//! The base-config vs per-horizon split is carried by [`BASE_SECTIONS`] and
//! [`WEEK_SECTIONS`]. Names not in the catalog are rejected at the edge
//! rather than routed by suffix convention.

use serde_json::{json, Value};

/// Legal domain of one tunable leaf: `[min, max]` discretized at
/// `10^-precision` (precision 0 = integers). Never mutated after load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterDef {
    pub min: f64,
    pub max: f64,
    pub precision: u8,
}

impl ParameterDef {
    pub const fn new(min: f64, max: f64, precision: u8) -> Self {
        Self {
            min,
            max,
            precision,
        }
    }

    /// Grid step implied by the precision.
    pub fn step(&self) -> f64 {
        10f64.powi(-(self.precision as i32))
    }
}

/// Where and how a parameter value is written into a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRoute {
    /// Scalar directly under `parameters`.
    TopLevel(&'static str),
    /// `parameters.<section>.<key>`.
    Nested {
        section: &'static str,
        key: &'static str,
    },
    /// `parameters.<section>.THRESHOLDS.STEPS`, rebuilding the fixed
    /// companion fields alongside it.
    ThresholdSteps { section: &'static str },
    /// `parameters.LOCATION_MODIFIERS.<key>`.
    LocationModifier(&'static str),
    /// Index into the numbered draft-order backing files; writes both the
    /// index and the loaded `DRAFT_ORDER` array.
    DraftOrderFile,
}

#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub def: ParameterDef,
    pub route: ParamRoute,
}

/// All tunable parameters in their fixed optimization order. The order is
/// part of the checkpoint contract: folder indices refer to positions here.
static CATALOG: [CatalogEntry; 24] = [
    CatalogEntry {
        name: "NORMALIZATION_MAX_SCALE",
        def: ParameterDef::new(50.0, 200.0, 0),
        route: ParamRoute::TopLevel("NORMALIZATION_MAX_SCALE"),
    },
    CatalogEntry {
        name: "SAME_POS_BYE_WEIGHT",
        def: ParameterDef::new(0.0, 0.5, 2),
        route: ParamRoute::TopLevel("SAME_POS_BYE_WEIGHT"),
    },
    CatalogEntry {
        name: "DIFF_POS_BYE_WEIGHT",
        def: ParameterDef::new(0.0, 0.3, 2),
        route: ParamRoute::TopLevel("DIFF_POS_BYE_WEIGHT"),
    },
    CatalogEntry {
        name: "PRIMARY_BONUS",
        def: ParameterDef::new(25.0, 150.0, 0),
        route: ParamRoute::Nested {
            section: "DRAFT_ORDER_BONUSES",
            key: "PRIMARY",
        },
    },
    CatalogEntry {
        name: "SECONDARY_BONUS",
        def: ParameterDef::new(25.0, 150.0, 0),
        route: ParamRoute::Nested {
            section: "DRAFT_ORDER_BONUSES",
            key: "SECONDARY",
        },
    },
    CatalogEntry {
        name: "DRAFT_ORDER_FILE",
        def: ParameterDef::new(1.0, 100.0, 0),
        route: ParamRoute::DraftOrderFile,
    },
    CatalogEntry {
        name: "ADP_SCORING_WEIGHT",
        def: ParameterDef::new(0.50, 7.00, 2),
        route: ParamRoute::Nested {
            section: "ADP_SCORING",
            key: "WEIGHT",
        },
    },
    CatalogEntry {
        name: "ADP_SCORING_STEPS",
        def: ParameterDef::new(5.0, 50.0, 0),
        route: ParamRoute::ThresholdSteps {
            section: "ADP_SCORING",
        },
    },
    CatalogEntry {
        name: "PLAYER_RATING_SCORING_WEIGHT",
        def: ParameterDef::new(0.50, 4.00, 2),
        route: ParamRoute::Nested {
            section: "PLAYER_RATING_SCORING",
            key: "WEIGHT",
        },
    },
    CatalogEntry {
        name: "TEAM_QUALITY_SCORING_WEIGHT",
        def: ParameterDef::new(0.00, 4.00, 2),
        route: ParamRoute::Nested {
            section: "TEAM_QUALITY_SCORING",
            key: "WEIGHT",
        },
    },
    CatalogEntry {
        name: "TEAM_QUALITY_MIN_WEEKS",
        def: ParameterDef::new(1.0, 12.0, 0),
        route: ParamRoute::Nested {
            section: "TEAM_QUALITY_SCORING",
            key: "MIN_WEEKS",
        },
    },
    CatalogEntry {
        name: "PERFORMANCE_SCORING_WEIGHT",
        def: ParameterDef::new(0.00, 8.00, 2),
        route: ParamRoute::Nested {
            section: "PERFORMANCE_SCORING",
            key: "WEIGHT",
        },
    },
    CatalogEntry {
        name: "PERFORMANCE_SCORING_STEPS",
        def: ParameterDef::new(0.01, 0.30, 2),
        route: ParamRoute::ThresholdSteps {
            section: "PERFORMANCE_SCORING",
        },
    },
    CatalogEntry {
        name: "PERFORMANCE_MIN_WEEKS",
        def: ParameterDef::new(1.0, 14.0, 0),
        route: ParamRoute::Nested {
            section: "PERFORMANCE_SCORING",
            key: "MIN_WEEKS",
        },
    },
    CatalogEntry {
        name: "MATCHUP_IMPACT_SCALE",
        def: ParameterDef::new(25.0, 250.0, 0),
        route: ParamRoute::Nested {
            section: "MATCHUP_SCORING",
            key: "IMPACT_SCALE",
        },
    },
    CatalogEntry {
        name: "MATCHUP_SCORING_WEIGHT",
        def: ParameterDef::new(0.0, 4.0, 2),
        route: ParamRoute::Nested {
            section: "MATCHUP_SCORING",
            key: "WEIGHT",
        },
    },
    CatalogEntry {
        name: "MATCHUP_MIN_WEEKS",
        def: ParameterDef::new(1.0, 14.0, 0),
        route: ParamRoute::Nested {
            section: "MATCHUP_SCORING",
            key: "MIN_WEEKS",
        },
    },
    CatalogEntry {
        name: "TEMPERATURE_IMPACT_SCALE",
        def: ParameterDef::new(0.0, 200.0, 0),
        route: ParamRoute::Nested {
            section: "TEMPERATURE_SCORING",
            key: "IMPACT_SCALE",
        },
    },
    CatalogEntry {
        name: "TEMPERATURE_SCORING_WEIGHT",
        def: ParameterDef::new(0.0, 3.0, 2),
        route: ParamRoute::Nested {
            section: "TEMPERATURE_SCORING",
            key: "WEIGHT",
        },
    },
    CatalogEntry {
        name: "WIND_IMPACT_SCALE",
        def: ParameterDef::new(0.0, 150.0, 0),
        route: ParamRoute::Nested {
            section: "WIND_SCORING",
            key: "IMPACT_SCALE",
        },
    },
    CatalogEntry {
        name: "WIND_SCORING_WEIGHT",
        def: ParameterDef::new(0.0, 4.0, 2),
        route: ParamRoute::Nested {
            section: "WIND_SCORING",
            key: "WEIGHT",
        },
    },
    CatalogEntry {
        name: "LOCATION_HOME",
        def: ParameterDef::new(-5.0, 15.0, 1),
        route: ParamRoute::LocationModifier("HOME"),
    },
    CatalogEntry {
        name: "LOCATION_AWAY",
        def: ParameterDef::new(-15.0, 5.0, 1),
        route: ParamRoute::LocationModifier("AWAY"),
    },
    CatalogEntry {
        name: "LOCATION_INTERNATIONAL",
        def: ParameterDef::new(-25.0, 5.0, 1),
        route: ParamRoute::LocationModifier("INTERNATIONAL"),
    },
];

/// Sections that live in `league_config.json`, shared by every horizon.
pub const BASE_SECTIONS: [&str; 12] = [
    "CURRENT_NFL_WEEK",
    "NFL_SEASON",
    "NFL_SCORING_FORMAT",
    "SAME_POS_BYE_WEIGHT",
    "DIFF_POS_BYE_WEIGHT",
    "INJURY_PENALTIES",
    "DRAFT_ORDER_BONUSES",
    "DRAFT_ORDER_FILE",
    "DRAFT_ORDER",
    "MAX_POSITIONS",
    "FLEX_ELIGIBLE_POSITIONS",
    "ADP_SCORING",
];

/// Sections that live in the per-horizon week files.
pub const WEEK_SECTIONS: [&str; 9] = [
    "NORMALIZATION_MAX_SCALE",
    "PLAYER_RATING_SCORING",
    "TEAM_QUALITY_SCORING",
    "PERFORMANCE_SCORING",
    "MATCHUP_SCORING",
    "SCHEDULE_SCORING",
    "TEMPERATURE_SCORING",
    "WIND_SCORING",
    "LOCATION_MODIFIERS",
];

pub fn catalog() -> &'static [CatalogEntry] {
    &CATALOG
}

pub fn lookup(name: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.name == name)
}

/// Parameter names in optimization order.
pub fn parameter_order() -> Vec<&'static str> {
    CATALOG.iter().map(|e| e.name).collect()
}

/// Fixed, non-optimized companion fields for a thresholded scoring section:
/// `(THRESHOLDS fields, section-root fields)`. These are always rewritten
/// from this table when the section is touched; they never come from an
/// override map.
pub(crate) fn threshold_companions(
    section: &str,
) -> Option<(Vec<(&'static str, Value)>, Vec<(&'static str, Value)>)> {
    match section {
        "ADP_SCORING" => Some((
            vec![("BASE_POSITION", json!(0)), ("DIRECTION", json!("DECREASING"))],
            vec![],
        )),
        "PLAYER_RATING_SCORING" => Some((
            vec![("BASE_POSITION", json!(0)), ("DIRECTION", json!("INCREASING"))],
            vec![],
        )),
        "TEAM_QUALITY_SCORING" => Some((
            vec![("BASE_POSITION", json!(0)), ("DIRECTION", json!("DECREASING"))],
            vec![],
        )),
        "PERFORMANCE_SCORING" => Some((
            vec![
                ("BASE_POSITION", json!(0.0)),
                ("DIRECTION", json!("BI_EXCELLENT_HI")),
            ],
            vec![],
        )),
        "MATCHUP_SCORING" => Some((
            vec![("BASE_POSITION", json!(0)), ("DIRECTION", json!("INCREASING"))],
            vec![],
        )),
        // Temperature and wind have fixed step counts; only their weight and
        // impact scale are tuned.
        "TEMPERATURE_SCORING" => Some((
            vec![
                ("BASE_POSITION", json!(0)),
                ("DIRECTION", json!("DECREASING")),
                ("STEPS", json!(10)),
            ],
            vec![("IDEAL_TEMPERATURE", json!(60))],
        )),
        "WIND_SCORING" => Some((
            vec![
                ("BASE_POSITION", json!(0)),
                ("DIRECTION", json!("DECREASING")),
                ("STEPS", json!(8)),
            ],
            vec![],
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_are_unique() {
        let mut names = parameter_order();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), CATALOG.len());
    }

    #[test]
    fn test_catalog_bounds_are_sane() {
        for entry in catalog() {
            assert!(
                entry.def.min < entry.def.max,
                "{} has inverted bounds",
                entry.name
            );
            assert!(entry.def.precision <= 2);
        }
    }

    #[test]
    fn test_lookup() {
        let entry = lookup("NORMALIZATION_MAX_SCALE").unwrap();
        assert_eq!(entry.def.min, 50.0);
        assert_eq!(entry.def.max, 200.0);
        assert_eq!(entry.def.precision, 0);
        assert!(lookup("NOT_A_PARAMETER").is_none());
    }

    #[test]
    fn test_threshold_companions_fixed_steps() {
        let (thresholds, root) = threshold_companions("TEMPERATURE_SCORING").unwrap();
        assert!(thresholds.iter().any(|(k, v)| *k == "STEPS" && *v == json!(10)));
        assert!(root.iter().any(|(k, v)| *k == "IDEAL_TEMPERATURE" && *v == json!(60)));

        let (wind, _) = threshold_companions("WIND_SCORING").unwrap();
        assert!(wind.iter().any(|(k, v)| *k == "STEPS" && *v == json!(8)));

        assert!(threshold_companions("LOCATION_MODIFIERS").is_none());
    }

    #[test]
    fn test_every_route_lands_in_exactly_one_section_split() {
        for entry in catalog() {
            let section = match entry.route {
                ParamRoute::TopLevel(key) => key,
                ParamRoute::Nested { section, .. } => section,
                ParamRoute::ThresholdSteps { section } => section,
                ParamRoute::LocationModifier(_) => "LOCATION_MODIFIERS",
                ParamRoute::DraftOrderFile => "DRAFT_ORDER_FILE",
            };
            let in_base = BASE_SECTIONS.contains(&section);
            let in_week = WEEK_SECTIONS.contains(&section);
            assert!(
                in_base ^ in_week,
                "{} routes to {section}, which must be in exactly one split",
                entry.name
            );
        }
    }

    #[test]
    fn test_step_size() {
        assert_eq!(ParameterDef::new(0.0, 1.0, 0).step(), 1.0);
        assert!((ParameterDef::new(0.0, 1.0, 2).step() - 0.01).abs() < 1e-12);
    }
}
