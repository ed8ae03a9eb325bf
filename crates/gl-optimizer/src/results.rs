//! Registry of every candidate evaluated for the current parameter.
//!
//! Discarded and rebuilt at the start of each parameter's trials; only the
//! updated baselines persist across parameters. Tie-breaking is stable:
//! first-registered wins, keeping the search deterministic for a fixed
//! evaluation order.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use gl_types::{GlResult, SeasonOutcome, SimError, WeekRange};

use crate::performance::ConfigPerformance;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreStats {
    pub count: usize,
    pub min_win_rate: f64,
    pub max_win_rate: f64,
    pub avg_win_rate: f64,
    pub min_avg_points: f64,
    pub max_avg_points: f64,
    pub avg_avg_points: f64,
}

#[derive(Debug, Default)]
pub struct ResultsStore {
    performances: HashMap<String, ConfigPerformance>,
    registration_order: Vec<String>,
}

impl ResultsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.registration_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registration_order.is_empty()
    }

    /// Register a candidate before recording results against it.
    /// Re-registering an id resets its totals but keeps its original
    /// position in the tie-break order.
    pub fn register(&mut self, config_id: &str) {
        if self.performances.contains_key(config_id) {
            warn!(config_id, "config re-registered; resetting its results");
        } else {
            self.registration_order.push(config_id.to_string());
        }
        self.performances
            .insert(config_id.to_string(), ConfigPerformance::new(config_id));
    }

    /// Fold one season outcome into a registered candidate.
    pub fn record(&mut self, config_id: &str, outcome: &SeasonOutcome) -> GlResult<()> {
        let perf = self
            .performances
            .get_mut(config_id)
            .ok_or_else(|| SimError::ConfigNotRegistered {
                config_id: config_id.to_string(),
            })?;
        perf.add_outcome(outcome)
    }

    pub fn get(&self, config_id: &str) -> Option<&ConfigPerformance> {
        self.performances.get(config_id)
    }

    fn in_registration_order(&self) -> impl Iterator<Item = &ConfigPerformance> {
        self.registration_order
            .iter()
            .filter_map(|id| self.performances.get(id))
    }

    /// Best candidate overall, `None` for an empty store. Strictly-better
    /// replacement keeps the first-registered winner on ties.
    pub fn best(&self) -> Option<&ConfigPerformance> {
        let mut best: Option<&ConfigPerformance> = None;
        for perf in self.in_registration_order() {
            match best {
                None => best = Some(perf),
                Some(current) if perf.compare(current) == std::cmp::Ordering::Greater => {
                    best = Some(perf)
                }
                _ => {}
            }
        }
        best
    }

    /// Top `n` candidates, best first, ties in registration order. Ranked by
    /// repeated best-extraction rather than a comparison sort: the epsilon
    /// comparator's equivalence is not transitive, so it is not a valid sort
    /// key, but "best of the remainder" is always well-defined.
    pub fn top_n(&self, n: usize) -> Vec<&ConfigPerformance> {
        let mut remaining: Vec<&ConfigPerformance> = self.in_registration_order().collect();
        let mut ranked = Vec::with_capacity(n.min(remaining.len()));
        while ranked.len() < n && !remaining.is_empty() {
            let mut best = 0;
            for i in 1..remaining.len() {
                if remaining[i].compare(remaining[best]) == std::cmp::Ordering::Greater {
                    best = i;
                }
            }
            ranked.push(remaining.remove(best));
        }
        ranked
    }

    /// Best candidate for one week range by that range's win rate, ties to
    /// the first registered.
    pub fn best_for_range(&self, range: WeekRange) -> Option<&ConfigPerformance> {
        let mut best: Option<&ConfigPerformance> = None;
        for perf in self.in_registration_order() {
            match best {
                None => best = Some(perf),
                Some(current)
                    if perf.win_rate_for_range(range) > current.win_rate_for_range(range) =>
                {
                    best = Some(perf)
                }
                _ => {}
            }
        }
        best
    }

    /// Min/max/avg win rate and points across all registered candidates.
    pub fn stats(&self) -> Option<StoreStats> {
        if self.is_empty() {
            return None;
        }
        let mut stats = StoreStats {
            count: 0,
            min_win_rate: f64::MAX,
            max_win_rate: f64::MIN,
            avg_win_rate: 0.0,
            min_avg_points: f64::MAX,
            max_avg_points: f64::MIN,
            avg_avg_points: 0.0,
        };
        for perf in self.in_registration_order() {
            let win_rate = perf.win_rate();
            let points = perf.avg_points();
            stats.count += 1;
            stats.min_win_rate = stats.min_win_rate.min(win_rate);
            stats.max_win_rate = stats.max_win_rate.max(win_rate);
            stats.avg_win_rate += win_rate;
            stats.min_avg_points = stats.min_avg_points.min(points);
            stats.max_avg_points = stats.max_avg_points.max(points);
            stats.avg_avg_points += points;
        }
        stats.avg_win_rate /= stats.count as f64;
        stats.avg_avg_points /= stats.count as f64;
        Some(stats)
    }

    /// Write the best candidate's summary to a JSON file.
    pub fn save_best(&self, path: &Path) -> GlResult<()> {
        let Some(best) = self.best() else {
            return Ok(());
        };
        let doc = json!({
            "saved_at": Utc::now().to_rfc3339(),
            "performance": best.summary(),
        });
        fs::write(path, serde_json::to_string_pretty(&doc)?)?;
        Ok(())
    }

    /// Write every candidate's summary, in registration order.
    pub fn save_all(&self, path: &Path) -> GlResult<()> {
        let all: Vec<Value> = self.in_registration_order().map(|p| p.summary()).collect();
        let doc = json!({
            "saved_at": Utc::now().to_rfc3339(),
            "results": all,
        });
        fs::write(path, serde_json::to_string_pretty(&doc)?)?;
        Ok(())
    }
}
