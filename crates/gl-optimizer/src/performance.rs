//! Per-candidate performance aggregation.

use std::cmp::Ordering;

use serde_json::{json, Value};

use gl_types::{GlResult, SeasonOutcome, WeekRange};

// Win rates within 1e-4 are treated as equal and fall through to the points
// tiebreaker, itself with a 1e-2 epsilon.
const WIN_RATE_EPSILON: f64 = 1e-4;
const POINTS_EPSILON: f64 = 1e-2;

/// Running totals for one candidate across many simulated seasons, overall
/// and per week range. Mutated only from the control thread after a parallel
/// batch completes.
#[derive(Debug, Clone)]
pub struct ConfigPerformance {
    pub config_id: String,
    pub total_wins: u32,
    pub total_losses: u32,
    pub total_points: f64,
    pub num_simulations: u32,
    range_wins: [u32; 4],
    range_losses: [u32; 4],
    range_points: [f64; 4],
}

impl ConfigPerformance {
    pub fn new(config_id: impl Into<String>) -> Self {
        Self {
            config_id: config_id.into(),
            total_wins: 0,
            total_losses: 0,
            total_points: 0.0,
            num_simulations: 0,
            range_wins: [0; 4],
            range_losses: [0; 4],
            range_points: [0.0; 4],
        }
    }

    /// Fold in one season. Per-week entries route into their range buckets;
    /// a season without a weekly breakdown still updates the overall totals.
    /// A week outside the season is an input-validation failure and leaves
    /// the totals untouched.
    pub fn add_outcome(&mut self, outcome: &SeasonOutcome) -> GlResult<()> {
        // Validate all weeks before mutating anything.
        let mut routed = Vec::with_capacity(outcome.weeks.len());
        for week in &outcome.weeks {
            routed.push((WeekRange::for_week(week.week)?, week));
        }

        for (range, week) in routed {
            let i = range.index();
            if week.won {
                self.range_wins[i] += 1;
            } else {
                self.range_losses[i] += 1;
            }
            self.range_points[i] += week.points;
        }

        self.total_wins += outcome.wins;
        self.total_losses += outcome.losses;
        self.total_points += outcome.points;
        self.num_simulations += 1;
        Ok(())
    }

    pub fn total_games(&self) -> u32 {
        self.total_wins + self.total_losses
    }

    pub fn win_rate(&self) -> f64 {
        if self.total_games() == 0 {
            return 0.0;
        }
        self.total_wins as f64 / self.total_games() as f64
    }

    pub fn avg_points(&self) -> f64 {
        if self.num_simulations == 0 {
            return 0.0;
        }
        self.total_points / self.num_simulations as f64
    }

    pub fn range_games(&self, range: WeekRange) -> u32 {
        let i = range.index();
        self.range_wins[i] + self.range_losses[i]
    }

    pub fn win_rate_for_range(&self, range: WeekRange) -> f64 {
        let games = self.range_games(range);
        if games == 0 {
            return 0.0;
        }
        self.range_wins[range.index()] as f64 / games as f64
    }

    /// Total ordering over candidates: win rate first, average points as the
    /// tiebreaker, both with epsilons. `Greater` means `self` is better.
    pub fn compare(&self, other: &ConfigPerformance) -> Ordering {
        let win_rate_diff = self.win_rate() - other.win_rate();
        if win_rate_diff.abs() > WIN_RATE_EPSILON {
            return if win_rate_diff > 0.0 {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        let points_diff = self.avg_points() - other.avg_points();
        if points_diff.abs() > POINTS_EPSILON {
            return if points_diff > 0.0 {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        Ordering::Equal
    }

    /// Plain-mapping summary: overall totals plus the four per-range
    /// breakdowns.
    pub fn summary(&self) -> Value {
        let mut ranges = serde_json::Map::new();
        for range in WeekRange::ALL {
            let i = range.index();
            ranges.insert(
                range.label().to_string(),
                json!({
                    "wins": self.range_wins[i],
                    "losses": self.range_losses[i],
                    "points": self.range_points[i],
                    "win_rate": self.win_rate_for_range(range),
                }),
            );
        }
        json!({
            "config_id": self.config_id,
            "total_wins": self.total_wins,
            "total_losses": self.total_losses,
            "total_points": self.total_points,
            "total_games": self.total_games(),
            "num_simulations": self.num_simulations,
            "win_rate": self.win_rate(),
            "avg_points_per_league": self.avg_points(),
            "week_range_performance": ranges,
        })
    }
}

impl std::fmt::Display for ConfigPerformance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}W-{}L ({:.1}%), avg {:.1} pts/league ({} sims)",
            self.config_id,
            self.total_wins,
            self.total_losses,
            self.win_rate() * 100.0,
            self.avg_points(),
            self.num_simulations
        )
    }
}
