//! The season-runner contract and the default league simulation.
//!
//! The optimizer only sees the [`SeasonRunner`] trait: draft, play a season,
//! hand back the outcome, release resources. [`LeagueSimulation`] is the
//! default implementation: a 10-team league over one historical season where
//! the tracked team drafts and sets lineups using the candidate
//! configuration and every week is scored from actual fantasy points.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gl_config::ConfigDoc;
use gl_types::{GlResult, SeasonOutcome, SimError, WeekOutcome};

use crate::data::{PlayerRow, SeasonData};

const NUM_TEAMS: usize = 10;
const ROSTER_SIZE: usize = 9;
const SEASON_WEEKS: u8 = 17;

/// Executes one simulated season under one fully-materialized configuration.
/// The evaluator always calls `cleanup`, success or failure.
pub trait SeasonRunner {
    fn run_draft(&mut self) -> GlResult<()>;
    fn run_season(&mut self) -> GlResult<()>;
    fn outcome(&self) -> SeasonOutcome;
    fn cleanup(&mut self);
}

/// Scoring knobs read once from a candidate configuration. Missing fields
/// fall back to neutral values so a sparse config still drafts.
#[derive(Debug, Clone)]
struct Knobs {
    normalization_max_scale: f64,
    same_pos_bye_weight: f64,
    diff_pos_bye_weight: f64,
    primary_bonus: f64,
    secondary_bonus: f64,
    draft_order: Vec<String>,
    adp_weight: f64,
    adp_steps: f64,
    player_rating_weight: f64,
    performance_weight: f64,
    matchup_weight: f64,
    location_home: f64,
    location_away: f64,
}

impl Knobs {
    fn from_doc(doc: &ConfigDoc) -> Self {
        let read = |name: &str, fallback: f64| -> f64 {
            gl_config::lookup(name)
                .and_then(|entry| doc.current_value(entry))
                .unwrap_or(fallback)
        };
        let draft_order = doc
            .param("DRAFT_ORDER")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            normalization_max_scale: read("NORMALIZATION_MAX_SCALE", 100.0),
            same_pos_bye_weight: read("SAME_POS_BYE_WEIGHT", 0.2),
            diff_pos_bye_weight: read("DIFF_POS_BYE_WEIGHT", 0.1),
            primary_bonus: read("PRIMARY_BONUS", 75.0),
            secondary_bonus: read("SECONDARY_BONUS", 50.0),
            draft_order,
            adp_weight: read("ADP_SCORING_WEIGHT", 2.0),
            adp_steps: read("ADP_SCORING_STEPS", 20.0).max(1.0),
            player_rating_weight: read("PLAYER_RATING_SCORING_WEIGHT", 2.0),
            performance_weight: read("PERFORMANCE_SCORING_WEIGHT", 2.0),
            matchup_weight: read("MATCHUP_SCORING_WEIGHT", 1.0),
            location_home: read("LOCATION_HOME", 1.5),
            location_away: read("LOCATION_AWAY", -1.5),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Roster {
    players: Vec<PlayerRow>,
}

impl Roster {
    fn count_position(&self, position: &str) -> usize {
        self.players.iter().filter(|p| p.position == position).count()
    }

    fn position_full(&self, position: &str) -> bool {
        let cap = match position {
            "QB" => 2,
            "RB" | "WR" => 4,
            "TE" => 2,
            "K" | "DST" => 1,
            _ => 1,
        };
        self.count_position(position) >= cap
    }
}

/// One 10-team season over one historical season's data.
pub struct LeagueSimulation {
    knobs: Knobs,
    season: Arc<SeasonData>,
    rng: StdRng,
    rosters: Vec<Roster>,
    tracked: usize,
    outcome: SeasonOutcome,
}

impl LeagueSimulation {
    pub fn new(config: &ConfigDoc, season: Arc<SeasonData>, seed: u64) -> Self {
        Self {
            knobs: Knobs::from_doc(config),
            season,
            rng: StdRng::seed_from_u64(seed),
            rosters: (0..NUM_TEAMS).map(|_| Roster::default()).collect(),
            tracked: 0,
            outcome: SeasonOutcome::default(),
        }
    }

    /// Draft score of one available player for the tracked team.
    fn draft_score(&self, player: &PlayerRow, round: usize, pick_number: usize) -> f64 {
        let knobs = &self.knobs;
        let rating = player.player_rating.unwrap_or(50.0);
        let mut score = rating / 100.0 * knobs.normalization_max_scale;

        // Market wisdom: reward value falling past its average draft slot,
        // one tier per `adp_steps` picks.
        if let Some(adp) = player.average_draft_position {
            let tiers = (adp - pick_number as f64) / knobs.adp_steps;
            score += tiers * knobs.adp_weight;
        }

        // Positional draft plan from the DRAFT_ORDER strategy file.
        if let Some(target) = knobs.draft_order.get(round) {
            if *target == player.position {
                score += knobs.primary_bonus;
            } else if knobs.draft_order.get(round + 1) == Some(&player.position) {
                score += knobs.secondary_bonus;
            }
        }

        // Bye-week overlap penalties against the roster built so far.
        if let Some(bye) = player.bye_week {
            for rostered in &self.rosters[self.tracked].players {
                if rostered.bye_week == Some(bye) {
                    let weight = if rostered.position == player.position {
                        knobs.same_pos_bye_weight
                    } else {
                        knobs.diff_pos_bye_weight
                    };
                    score -= weight * knobs.normalization_max_scale;
                }
            }
        }

        score
    }

    /// Lineup projection for weekly starter selection. Actual points decide
    /// the matchup; this only decides who starts.
    fn lineup_projection(&self, player: &PlayerRow, week: u8) -> f64 {
        let knobs = &self.knobs;
        let mut score = player.player_rating.unwrap_or(50.0) * knobs.player_rating_weight;
        score += player.fantasy_points.unwrap_or(0.0) * knobs.performance_weight;
        // Coarse venue swing, alternating by week parity per team hash.
        let home = (player.team.len() + week as usize) % 2 == 0;
        score += if home {
            knobs.location_home
        } else {
            knobs.location_away
        } * knobs.matchup_weight;
        score
    }

    fn starters(&self, roster: &Roster, points_by_id: &HashMap<&str, f64>, week: u8) -> f64 {
        let mut ranked: Vec<&PlayerRow> = roster.players.iter().collect();
        ranked.sort_by(|a, b| {
            self.lineup_projection(b, week)
                .partial_cmp(&self.lineup_projection(a, week))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut slots: HashMap<&str, usize> =
            [("QB", 1), ("RB", 2), ("WR", 2), ("TE", 1), ("K", 1), ("DST", 1)]
                .into_iter()
                .collect();
        let mut flex = 1usize;
        let mut total = 0.0;

        for player in ranked {
            let points = points_by_id
                .get(player.id.as_str())
                .copied()
                .unwrap_or(0.0);
            let position = player.position.as_str();
            if let Some(remaining) = slots.get_mut(position) {
                if *remaining > 0 {
                    *remaining -= 1;
                    total += points;
                    continue;
                }
            }
            if flex > 0 && matches!(position, "RB" | "WR" | "TE") {
                flex -= 1;
                total += points;
            }
        }
        total
    }
}

impl SeasonRunner for LeagueSimulation {
    /// Snake draft: the tracked team drafts by the candidate configuration,
    /// opponents draft by rating with jitter.
    fn run_draft(&mut self) -> GlResult<()> {
        let mut available: Vec<PlayerRow> = self
            .season
            .week_players(1)
            .map_err(|e| SimError::DraftFailed {
                message: e.to_string(),
            })?
            .into_iter()
            .filter(PlayerRow::is_draftable)
            .collect();

        if available.len() < NUM_TEAMS * ROSTER_SIZE {
            return Err(SimError::DraftFailed {
                message: format!("only {} draftable players", available.len()),
            }
            .into());
        }

        self.tracked = self.rng.random_range(0..NUM_TEAMS);
        let mut pick_number = 0usize;

        for round in 0..ROSTER_SIZE {
            let order: Vec<usize> = if round % 2 == 0 {
                (0..NUM_TEAMS).collect()
            } else {
                (0..NUM_TEAMS).rev().collect()
            };
            for team in order {
                pick_number += 1;
                let choice = if team == self.tracked {
                    available
                        .iter()
                        .enumerate()
                        .filter(|(_, p)| !self.rosters[team].position_full(&p.position))
                        .max_by(|(_, a), (_, b)| {
                            self.draft_score(a, round, pick_number)
                                .partial_cmp(&self.draft_score(b, round, pick_number))
                                .unwrap_or(std::cmp::Ordering::Equal)
                        })
                        .map(|(i, _)| i)
                } else {
                    let jitters: Vec<f64> = (0..available.len())
                        .map(|_| self.rng.random_range(-10.0..10.0))
                        .collect();
                    available
                        .iter()
                        .enumerate()
                        .filter(|(_, p)| !self.rosters[team].position_full(&p.position))
                        .max_by(|(ia, a), (ib, b)| {
                            (a.player_rating.unwrap_or(0.0) + jitters[*ia])
                                .partial_cmp(&(b.player_rating.unwrap_or(0.0) + jitters[*ib]))
                                .unwrap_or(std::cmp::Ordering::Equal)
                        })
                        .map(|(i, _)| i)
                };
                let Some(index) = choice else {
                    return Err(SimError::DraftFailed {
                        message: format!("no eligible player for team {team} in round {round}"),
                    }
                    .into());
                };
                let player = available.swap_remove(index);
                self.rosters[team].players.push(player);
            }
        }
        Ok(())
    }

    /// Seventeen weekly head-to-head matchups against rotating opponents.
    fn run_season(&mut self) -> GlResult<()> {
        for week in 1..=SEASON_WEEKS {
            let snapshot =
                self.season
                    .week_players(week)
                    .map_err(|e| SimError::SeasonFailed {
                        week,
                        message: e.to_string(),
                    })?;
            let points_by_id: HashMap<&str, f64> = snapshot
                .iter()
                .map(|p| (p.id.as_str(), p.fantasy_points.unwrap_or(0.0)))
                .collect();

            let opponent = (self.tracked + week as usize) % NUM_TEAMS;
            let opponent = if opponent == self.tracked {
                (opponent + 1) % NUM_TEAMS
            } else {
                opponent
            };

            let ours = self.starters(&self.rosters[self.tracked], &points_by_id, week);
            let theirs = self.starters(&self.rosters[opponent], &points_by_id, week);

            let won = ours > theirs;
            if won {
                self.outcome.wins += 1;
            } else {
                self.outcome.losses += 1;
            }
            self.outcome.points += ours;
            self.outcome.weeks.push(WeekOutcome {
                week,
                won,
                points: ours,
            });
        }
        Ok(())
    }

    fn outcome(&self) -> SeasonOutcome {
        self.outcome.clone()
    }

    fn cleanup(&mut self) {
        self.rosters.clear();
    }
}
