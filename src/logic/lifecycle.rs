//! Draw lifecycle: Idle -> InProgress -> PendingConfirmation -> Active -> Idle.
//!
//! One manager instance owns the lifecycle for the whole app. Mutations are serialized by a
//! writer lock; the published state sits behind a separate `RwLock` that is only written for
//! the instant of a transition, so readers always get a whole snapshot and never wait on
//! persistence.

use crate::logic::engine;
use crate::models::{
    ActiveDraw, CommitmentId, DrawConfiguration, DrawError, DrawLifecycleState, DrawResult,
    OutcomeField, Player, TeamId, TeamOutcome, TeamRecord, TeamResult,
};
use crate::store::{StatisticsRecalculator, TeamStore};
use rand::rngs::StdRng;
use rand::RngCore;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use uuid::Uuid;

/// Statistics step of a finalize that failed and can be retried on its own.
#[derive(Debug)]
struct FailedStatistics {
    commitment_id: CommitmentId,
    results: Vec<TeamResult>,
}

/// State only touched while holding the writer lock.
#[derive(Debug, Default)]
struct Writer {
    failed_statistics: Option<FailedStatistics>,
}

/// Puts the published state back to `Idle` if a draw computation unwinds before its outcome
/// is published.
struct DrawingGuard<'a> {
    state: &'a RwLock<DrawLifecycleState>,
    armed: bool,
}

impl DrawingGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for DrawingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            log::error!("Draw computation aborted; returning to idle");
            *self.state.write().unwrap_or_else(PoisonError::into_inner) = DrawLifecycleState::Idle;
        }
    }
}

/// Owns the current draw and its transitions. Share it behind an `Arc`.
pub struct DrawLifecycleManager<S, C, R = StdRng> {
    store: S,
    stats: C,
    state: RwLock<DrawLifecycleState>,
    writer: Mutex<Writer>,
    rng: Mutex<R>,
}

impl<S: TeamStore, C: StatisticsRecalculator, R: RngCore> DrawLifecycleManager<S, C, R> {
    /// Start in `Idle` without looking at the store.
    pub fn new(store: S, stats: C, rng: R) -> Self {
        Self {
            store,
            stats,
            state: RwLock::new(DrawLifecycleState::Idle),
            writer: Mutex::new(Writer::default()),
            rng: Mutex::new(rng),
        }
    }

    /// Start from what the store says: `Active` if teams are still marked current (the
    /// process stopped mid-pelada), `Idle` otherwise.
    pub fn restore(store: S, stats: C, rng: R) -> Result<Self, DrawError> {
        let teams = store.load_current_teams().map_err(DrawError::Persistence)?;
        let manager = Self::new(store, stats, rng);
        if let Some(first) = teams.first() {
            let commitment_id = first.commitment_id;
            log::info!(
                "Restored active draw {} with {} team(s)",
                commitment_id,
                teams.len()
            );
            manager.publish(DrawLifecycleState::Active(ActiveDraw {
                commitment_id,
                teams,
            }));
        }
        Ok(manager)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> DrawLifecycleState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_active(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_active()
    }

    /// Commitment whose statistics step failed and awaits `retry_statistics`, if any.
    pub fn pending_statistics(&self) -> Option<CommitmentId> {
        self.writer()
            .failed_statistics
            .as_ref()
            .map(|f| f.commitment_id)
    }

    /// Draw teams from `pool` and hold the result for confirmation.
    ///
    /// Only starts from `Idle`. Rejected with `AlreadyActive` while a confirmed draw is
    /// running, and with `InvalidTransition` while another draw is being computed or an
    /// unconfirmed one is held (`cancel` it first). The writer lock is released during the
    /// computation itself; if the computation fails or unwinds the state goes back to `Idle`.
    pub fn request_draw(
        &self,
        pool: &[Player],
        config: &DrawConfiguration,
    ) -> Result<DrawResult, DrawError> {
        config.check_shape()?;

        {
            let _writer = self.writer();
            match self.state() {
                DrawLifecycleState::Idle => self.publish(DrawLifecycleState::InProgress),
                DrawLifecycleState::Active(active) => {
                    log::warn!(
                        "Draw requested while draw {} is active; rejected",
                        active.commitment_id
                    );
                    return Err(DrawError::AlreadyActive);
                }
                other => return Err(self.reject("start a new draw", &other)),
            }
        }

        let guard = DrawingGuard {
            state: &self.state,
            armed: true,
        };
        let outcome = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            engine::draw(pool, config, &mut *rng)
        };

        let _writer = self.writer();
        guard.disarm();
        match outcome {
            Ok(result) if !result.is_empty() => {
                log::info!(
                    "Drew {} team(s) from {} player(s) ({})",
                    result.teams.len(),
                    pool.len(),
                    result.strategy
                );
                self.publish(DrawLifecycleState::PendingConfirmation(result.clone()));
                Ok(result)
            }
            Ok(_) => {
                self.publish(DrawLifecycleState::Idle);
                Err(DrawError::InsufficientPlayers)
            }
            Err(e) => {
                self.publish(DrawLifecycleState::Idle);
                Err(e)
            }
        }
    }

    /// Persist the pending draw as the current teams and make it active.
    ///
    /// On persistence failure the draw stays pending so the call can be retried.
    pub fn confirm(&self) -> Result<ActiveDraw, DrawError> {
        let _writer = self.writer();
        let result = match self.state() {
            DrawLifecycleState::PendingConfirmation(result) => result,
            other => return Err(self.reject("confirm", &other)),
        };

        let commitment_id = Uuid::new_v4();
        let teams: Vec<TeamRecord> = result
            .teams
            .iter()
            .map(|team| TeamRecord::from_team(team, commitment_id, &result))
            .collect();

        self.store.save_current_teams(&teams).map_err(|e| {
            log::error!("Failed to persist draw {}: {}", commitment_id, e);
            DrawError::Persistence(e)
        })?;

        let active = ActiveDraw {
            commitment_id,
            teams,
        };
        log::info!(
            "Confirmed draw {} ({} team(s))",
            commitment_id,
            active.teams.len()
        );
        self.publish(DrawLifecycleState::Active(active.clone()));
        Ok(active)
    }

    /// Drop the pending draw without persisting anything.
    ///
    /// An active draw is not cancelled here: the caller confirms the destructive intent with
    /// the user and then calls `discard_active`.
    pub fn cancel(&self) -> Result<(), DrawError> {
        let _writer = self.writer();
        match self.state() {
            DrawLifecycleState::PendingConfirmation(_) => {
                log::info!("Pending draw cancelled");
                self.publish(DrawLifecycleState::Idle);
                Ok(())
            }
            other => Err(self.reject("cancel", &other)),
        }
    }

    /// Throw away the active draw: current markers are removed, nothing reaches statistics.
    pub fn discard_active(&self) -> Result<(), DrawError> {
        let _writer = self.writer();
        let active = match self.state() {
            DrawLifecycleState::Active(active) => active,
            other => return Err(self.reject("discard", &other)),
        };

        self.store.clear_current_marker().map_err(|e| {
            log::error!("Failed to discard draw {}: {}", active.commitment_id, e);
            DrawError::Persistence(e)
        })?;

        log::info!("Discarded draw {}", active.commitment_id);
        self.publish(DrawLifecycleState::Idle);
        Ok(())
    }

    /// Close the active draw with the given per-team results.
    ///
    /// Every playing team needs an outcome; a missing reserve-team outcome counts as no games.
    /// Statistics are applied first, then the current markers are cleared. If clearing fails the
    /// draw stays active. If only the statistics step fails the draw is still closed, and
    /// `StatisticsRecalc` is returned so the caller can `retry_statistics`.
    pub fn finalize(&self, outcomes: &[TeamOutcome]) -> Result<(), DrawError> {
        let mut writer = self.writer();
        let active = match self.state() {
            DrawLifecycleState::Active(active) => active,
            other => return Err(self.reject("finalize", &other)),
        };

        if let Some(unknown) = outcomes.iter().find(|o| active.team(o.team_id).is_none()) {
            return Err(DrawError::UnknownTeam(unknown.team_id));
        }
        let missing = active
            .teams
            .iter()
            .filter(|t| !t.is_reserve && !outcomes.iter().any(|o| o.team_id == t.id))
            .count();
        if missing > 0 {
            return Err(DrawError::IncompleteOutcomes { missing });
        }

        let results: Vec<TeamResult> = active
            .teams
            .iter()
            .filter_map(|team| {
                outcomes
                    .iter()
                    .find(|o| o.team_id == team.id)
                    .map(|o| TeamResult::new(team, o))
            })
            .collect();

        let recalculated = self.stats.apply_outcomes(active.commitment_id, &results);

        self.store.clear_current_marker().map_err(|e| {
            log::error!("Failed to close draw {}: {}", active.commitment_id, e);
            DrawError::Persistence(e)
        })?;
        self.publish(DrawLifecycleState::Idle);

        match recalculated {
            Ok(()) => {
                log::info!("Finalized draw {}", active.commitment_id);
                writer.failed_statistics = None;
                Ok(())
            }
            Err(e) => {
                log::error!(
                    "Draw {} closed but statistics were not updated: {}",
                    active.commitment_id,
                    e
                );
                writer.failed_statistics = Some(FailedStatistics {
                    commitment_id: active.commitment_id,
                    results,
                });
                Err(DrawError::StatisticsRecalc(e))
            }
        }
    }

    /// Re-run only the statistics step of the last finalize that failed it.
    pub fn retry_statistics(&self) -> Result<(), DrawError> {
        let mut writer = self.writer();
        let failed = writer
            .failed_statistics
            .take()
            .ok_or(DrawError::NoFailedStatistics)?;

        match self.stats.apply_outcomes(failed.commitment_id, &failed.results) {
            Ok(()) => {
                log::info!("Statistics applied for draw {}", failed.commitment_id);
                Ok(())
            }
            Err(e) => {
                log::error!(
                    "Statistics retry for draw {} failed: {}",
                    failed.commitment_id,
                    e
                );
                writer.failed_statistics = Some(failed);
                Err(DrawError::StatisticsRecalc(e))
            }
        }
    }

    /// Change one result counter of an active team by `delta` (clamped at zero).
    pub fn adjust_team(
        &self,
        team_id: TeamId,
        field: OutcomeField,
        delta: i32,
    ) -> Result<TeamRecord, DrawError> {
        let _writer = self.writer();
        let mut active = match self.state() {
            DrawLifecycleState::Active(active) => active,
            other => return Err(self.reject("adjust a team", &other)),
        };
        if active.team(team_id).is_none() {
            return Err(DrawError::UnknownTeam(team_id));
        }

        let record = self
            .store
            .adjust_team_record(team_id, field, delta)
            .map_err(|e| {
                log::error!("Failed to adjust team {}: {}", team_id, e);
                DrawError::Persistence(e)
            })?;

        if let Some(team) = active.team_mut(team_id) {
            *team = record.clone();
        }
        self.publish(DrawLifecycleState::Active(active));
        Ok(record)
    }

    fn writer(&self) -> MutexGuard<'_, Writer> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, next: DrawLifecycleState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    fn reject(&self, operation: &'static str, state: &DrawLifecycleState) -> DrawError {
        log::warn!("Rejected '{}' while {}", operation, state.name());
        DrawError::InvalidTransition {
            operation,
            state: state.name(),
        }
    }
}
