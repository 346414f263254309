//! Integration tests for the draw lifecycle: transitions, persistence, statistics, recovery.

use pelada_draw::{
    CommitmentId, Criterion, DrawConfiguration, DrawError, DrawLifecycleManager,
    DrawLifecycleState, OutcomeField, Player, Position, Roster, SqliteStore,
    StatisticsRecalculator, StoreError, TeamId, TeamOutcome, TeamRecord, TeamResult, TeamStore,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

// ---------------------------------------------------------------------------
// Collaborator doubles
// ---------------------------------------------------------------------------

/// In-memory team store that can be told to fail.
#[derive(Default)]
struct FakeStore {
    current: Mutex<Vec<TeamRecord>>,
    saves: AtomicUsize,
    fail_save: AtomicBool,
    fail_clear: AtomicBool,
}

impl FakeStore {
    fn current(&self) -> Vec<TeamRecord> {
        self.current.lock().unwrap().clone()
    }
}

impl TeamStore for FakeStore {
    fn save_current_teams(&self, teams: &[TeamRecord]) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("disk full".into()));
        }
        *self.current.lock().unwrap() = teams.to_vec();
        Ok(())
    }

    fn clear_current_marker(&self) -> Result<(), StoreError> {
        if self.fail_clear.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("disk full".into()));
        }
        self.current.lock().unwrap().clear();
        Ok(())
    }

    fn adjust_team_record(
        &self,
        team_id: TeamId,
        field: OutcomeField,
        delta: i32,
    ) -> Result<TeamRecord, StoreError> {
        let mut current = self.current.lock().unwrap();
        let team = current
            .iter_mut()
            .find(|t| t.id == team_id)
            .ok_or(StoreError::TeamNotFound(team_id))?;
        team.apply_delta(field, delta);
        Ok(team.clone())
    }

    fn load_current_teams(&self) -> Result<Vec<TeamRecord>, StoreError> {
        Ok(self.current())
    }
}

/// Statistics collaborator that records calls and can be told to fail.
#[derive(Default)]
struct FakeStats {
    calls: Mutex<Vec<(CommitmentId, Vec<TeamResult>)>>,
    fail: AtomicBool,
}

impl StatisticsRecalculator for FakeStats {
    fn apply_outcomes(
        &self,
        commitment_id: CommitmentId,
        results: &[TeamResult],
    ) -> Result<(), StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push((commitment_id, results.to_vec()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("stats offline".into()));
        }
        Ok(())
    }
}

/// Team store whose `save_current_teams` stops at `entered` and then waits for `release`.
struct GatedStore {
    inner: FakeStore,
    entered: Barrier,
    release: Barrier,
}

impl GatedStore {
    fn new() -> Self {
        Self {
            inner: FakeStore::default(),
            entered: Barrier::new(2),
            release: Barrier::new(2),
        }
    }
}

impl TeamStore for GatedStore {
    fn save_current_teams(&self, teams: &[TeamRecord]) -> Result<(), StoreError> {
        self.entered.wait();
        self.release.wait();
        self.inner.save_current_teams(teams)
    }

    fn clear_current_marker(&self) -> Result<(), StoreError> {
        self.inner.clear_current_marker()
    }

    fn adjust_team_record(
        &self,
        team_id: TeamId,
        field: OutcomeField,
        delta: i32,
    ) -> Result<TeamRecord, StoreError> {
        self.inner.adjust_team_record(team_id, field, delta)
    }

    fn load_current_teams(&self) -> Result<Vec<TeamRecord>, StoreError> {
        self.inner.load_current_teams()
    }
}

/// Seeded RNG that holds its first caller between the two barriers of `gate`.
struct GatedRng {
    inner: StdRng,
    gate: Arc<(Barrier, Barrier)>,
    opened: bool,
}

impl GatedRng {
    fn new(gate: Arc<(Barrier, Barrier)>) -> Self {
        Self {
            inner: StdRng::seed_from_u64(5),
            gate,
            opened: false,
        }
    }

    fn pass_gate(&mut self) {
        if !self.opened {
            self.opened = true;
            self.gate.0.wait();
            self.gate.1.wait();
        }
    }
}

impl RngCore for GatedRng {
    fn next_u32(&mut self) -> u32 {
        self.pass_gate();
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.pass_gate();
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.pass_gate();
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.pass_gate();
        self.inner.try_fill_bytes(dest)
    }
}

/// RNG that panics on use.
struct BrokenRng;

impl RngCore for BrokenRng {
    fn next_u32(&mut self) -> u32 {
        panic!("entropy source gone")
    }

    fn next_u64(&mut self) -> u64 {
        panic!("entropy source gone")
    }

    fn fill_bytes(&mut self, _dest: &mut [u8]) {
        panic!("entropy source gone")
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
        panic!("entropy source gone")
    }
}

type FakeManager = DrawLifecycleManager<Arc<FakeStore>, Arc<FakeStats>>;

fn fake_manager() -> (Arc<FakeStore>, Arc<FakeStats>, FakeManager) {
    let store = Arc::new(FakeStore::default());
    let stats = Arc::new(FakeStats::default());
    let manager =
        DrawLifecycleManager::new(store.clone(), stats.clone(), StdRng::seed_from_u64(7));
    (store, stats, manager)
}

fn pool(n: usize) -> Vec<Player> {
    (0..n)
        .map(|i| Player::new(format!("P{i}"), Position::Midfielder, 3).with_score(i as i64))
        .collect()
}

fn config() -> DrawConfiguration {
    DrawConfiguration::by_criteria(5, 2, [Criterion::Score])
}

fn outcome(team: &TeamRecord, wins: u32, losses: u32, draws: u32) -> TeamOutcome {
    TeamOutcome {
        team_id: team.id,
        wins,
        losses,
        draws,
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

#[test]
fn request_draw_moves_to_pending_confirmation() {
    let (store, _, manager) = fake_manager();
    assert_eq!(manager.state(), DrawLifecycleState::Idle);

    let result = manager.request_draw(&pool(10), &config()).unwrap();

    assert_eq!(result.teams.len(), 2);
    assert_eq!(
        manager.state(),
        DrawLifecycleState::PendingConfirmation(result)
    );
    assert_eq!(store.saves.load(Ordering::SeqCst), 0);
}

#[test]
fn empty_pool_reports_insufficient_players_and_returns_to_idle() {
    let (_, _, manager) = fake_manager();

    assert!(matches!(
        manager.request_draw(&[], &config()),
        Err(DrawError::InsufficientPlayers)
    ));
    assert_eq!(manager.state(), DrawLifecycleState::Idle);
}

#[test]
fn invalid_shape_leaves_state_unchanged() {
    let (_, _, manager) = fake_manager();
    let pending = manager.request_draw(&pool(10), &config()).unwrap();

    let bad = DrawConfiguration::by_criteria(0, 2, [Criterion::Score]);
    assert!(matches!(
        manager.request_draw(&pool(10), &bad),
        Err(DrawError::InvalidConfiguration(_))
    ));
    assert_eq!(
        manager.state(),
        DrawLifecycleState::PendingConfirmation(pending)
    );
}

#[test]
fn new_draw_is_rejected_while_one_is_pending() {
    let (_, _, manager) = fake_manager();
    let pending = manager.request_draw(&pool(10), &config()).unwrap();

    assert!(matches!(
        manager.request_draw(&pool(4), &DrawConfiguration::random(2, 2)),
        Err(DrawError::InvalidTransition {
            operation: "start a new draw",
            state: "pending confirmation"
        })
    ));
    assert!(matches!(
        manager.request_draw(&[], &config()),
        Err(DrawError::InvalidTransition { .. })
    ));
    assert_eq!(
        manager.state(),
        DrawLifecycleState::PendingConfirmation(pending)
    );
}

#[test]
fn cancel_then_draw_again() {
    let (_, _, manager) = fake_manager();
    manager.request_draw(&pool(10), &config()).unwrap();
    manager.cancel().unwrap();

    let second = manager
        .request_draw(&pool(4), &DrawConfiguration::random(2, 2))
        .unwrap();

    assert_eq!(manager.state().pending(), Some(&second));
    assert_eq!(second.player_count(), 4);
}

#[test]
fn oversized_team_shape_draws_one_team() {
    let (_, _, manager) = fake_manager();

    let result = manager
        .request_draw(&pool(3), &DrawConfiguration::random(usize::MAX, 2))
        .unwrap();

    assert_eq!(result.teams.len(), 1);
    assert_eq!(result.player_count(), 3);
    assert_eq!(manager.state().pending(), Some(&result));
}

#[test]
fn panicking_draw_returns_to_idle() {
    let manager = DrawLifecycleManager::new(
        Arc::new(FakeStore::default()),
        Arc::new(FakeStats::default()),
        BrokenRng,
    );

    let joined = thread::scope(|s| {
        s.spawn(|| manager.request_draw(&pool(10), &DrawConfiguration::random(5, 2)))
            .join()
    });

    assert!(joined.is_err());
    assert_eq!(manager.state(), DrawLifecycleState::Idle);
    // Ordering by score never touches the RNG.
    assert!(manager.request_draw(&pool(10), &config()).is_ok());
}

#[test]
fn draw_requested_while_computing_is_rejected() {
    let gate = Arc::new((Barrier::new(2), Barrier::new(2)));
    let manager = DrawLifecycleManager::new(
        Arc::new(FakeStore::default()),
        Arc::new(FakeStats::default()),
        GatedRng::new(gate.clone()),
    );

    thread::scope(|s| {
        let first =
            s.spawn(|| manager.request_draw(&pool(10), &DrawConfiguration::random(5, 2)));
        gate.0.wait();

        assert_eq!(manager.state(), DrawLifecycleState::InProgress);
        assert!(matches!(
            manager.request_draw(&pool(4), &config()),
            Err(DrawError::InvalidTransition {
                operation: "start a new draw",
                state: "drawing"
            })
        ));
        assert_eq!(manager.state(), DrawLifecycleState::InProgress);

        gate.1.wait();
        let result = first.join().unwrap().unwrap();
        assert_eq!(result.player_count(), 10);
        assert_eq!(
            manager.state(),
            DrawLifecycleState::PendingConfirmation(result)
        );
    });
}

#[test]
fn readers_see_pending_until_confirm_persists() {
    let store = Arc::new(GatedStore::new());
    let manager = DrawLifecycleManager::new(
        store.clone(),
        Arc::new(FakeStats::default()),
        StdRng::seed_from_u64(7),
    );
    let pending = manager.request_draw(&pool(10), &config()).unwrap();

    thread::scope(|s| {
        let confirming = s.spawn(|| manager.confirm());
        store.entered.wait();

        assert_eq!(
            manager.state(),
            DrawLifecycleState::PendingConfirmation(pending.clone())
        );
        assert!(!manager.is_active());

        store.release.wait();
        let active = confirming.join().unwrap().unwrap();
        assert_eq!(manager.state(), DrawLifecycleState::Active(active));
    });
}

#[test]
fn confirm_from_idle_is_rejected_without_persisting() {
    let (store, _, manager) = fake_manager();

    assert!(matches!(
        manager.confirm(),
        Err(DrawError::InvalidTransition {
            operation: "confirm",
            state: "idle"
        })
    ));
    assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    assert_eq!(manager.state(), DrawLifecycleState::Idle);
}

#[test]
fn confirm_persists_every_team_and_activates() {
    let (store, _, manager) = fake_manager();
    let result = manager.request_draw(&pool(10), &config()).unwrap();

    let active = manager.confirm().unwrap();

    assert_eq!(active.teams.len(), result.teams.len());
    assert!(active
        .teams
        .iter()
        .all(|t| t.commitment_id == active.commitment_id));
    assert_eq!(store.current(), active.teams);
    assert_eq!(active.teams[0].player_ids, result.teams[0].player_ids());
    assert!(manager.is_active());

    assert!(matches!(
        manager.confirm(),
        Err(DrawError::InvalidTransition { .. })
    ));
}

#[test]
fn second_draw_is_rejected_while_active() {
    let (_, _, manager) = fake_manager();
    manager.request_draw(&pool(10), &config()).unwrap();
    let active = manager.confirm().unwrap();

    assert!(matches!(
        manager.request_draw(&pool(10), &config()),
        Err(DrawError::AlreadyActive)
    ));
    assert_eq!(manager.state(), DrawLifecycleState::Active(active));

    manager.discard_active().unwrap();
    assert!(manager.request_draw(&pool(10), &config()).is_ok());
}

#[test]
fn cancel_pending_discards_without_persisting() {
    let (store, _, manager) = fake_manager();
    manager.request_draw(&pool(10), &config()).unwrap();

    manager.cancel().unwrap();

    assert_eq!(manager.state(), DrawLifecycleState::Idle);
    assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    assert!(matches!(
        manager.cancel(),
        Err(DrawError::InvalidTransition { .. })
    ));
}

#[test]
fn cancel_does_not_touch_an_active_draw() {
    let (store, _, manager) = fake_manager();
    manager.request_draw(&pool(10), &config()).unwrap();
    manager.confirm().unwrap();

    assert!(matches!(
        manager.cancel(),
        Err(DrawError::InvalidTransition {
            operation: "cancel",
            state: "active"
        })
    ));
    assert!(manager.is_active());
    assert_eq!(store.current().len(), 2);
}

#[test]
fn operations_outside_active_are_rejected() {
    let (_, stats, manager) = fake_manager();
    let team_id = TeamId::new_v4();

    for state_setup in 0..2 {
        if state_setup == 1 {
            manager.request_draw(&pool(10), &config()).unwrap();
        }
        let before = manager.state();
        assert!(matches!(
            manager.discard_active(),
            Err(DrawError::InvalidTransition { .. })
        ));
        assert!(matches!(
            manager.finalize(&[]),
            Err(DrawError::InvalidTransition { .. })
        ));
        assert!(matches!(
            manager.adjust_team(team_id, OutcomeField::Wins, 1),
            Err(DrawError::InvalidTransition { .. })
        ));
        assert_eq!(manager.state(), before);
    }
    assert!(stats.calls.lock().unwrap().is_empty());
}

#[test]
fn discard_active_clears_markers_and_skips_statistics() {
    let (store, stats, manager) = fake_manager();
    manager.request_draw(&pool(10), &config()).unwrap();
    manager.confirm().unwrap();

    manager.discard_active().unwrap();

    assert_eq!(manager.state(), DrawLifecycleState::Idle);
    assert!(store.current().is_empty());
    assert!(stats.calls.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Failure semantics
// ---------------------------------------------------------------------------

#[test]
fn confirm_persistence_failure_keeps_draw_pending() {
    let (store, _, manager) = fake_manager();
    let result = manager.request_draw(&pool(10), &config()).unwrap();
    store.fail_save.store(true, Ordering::SeqCst);

    assert!(matches!(manager.confirm(), Err(DrawError::Persistence(_))));
    assert_eq!(
        manager.state(),
        DrawLifecycleState::PendingConfirmation(result)
    );

    store.fail_save.store(false, Ordering::SeqCst);
    assert!(manager.confirm().is_ok());
    assert!(manager.is_active());
}

#[test]
fn discard_failure_keeps_draw_active() {
    let (store, _, manager) = fake_manager();
    manager.request_draw(&pool(10), &config()).unwrap();
    manager.confirm().unwrap();
    store.fail_clear.store(true, Ordering::SeqCst);

    assert!(matches!(
        manager.discard_active(),
        Err(DrawError::Persistence(_))
    ));
    assert!(manager.is_active());
}

#[test]
fn finalize_applies_statistics_then_returns_to_idle() {
    let (store, stats, manager) = fake_manager();
    manager.request_draw(&pool(10), &config()).unwrap();
    let active = manager.confirm().unwrap();
    let outcomes = [
        outcome(&active.teams[0], 3, 1, 1),
        outcome(&active.teams[1], 1, 3, 1),
    ];

    manager.finalize(&outcomes).unwrap();

    assert_eq!(manager.state(), DrawLifecycleState::Idle);
    assert!(store.current().is_empty());
    let calls = stats.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, active.commitment_id);
    assert_eq!(calls[0].1[0].wins, 3);
    assert_eq!(calls[0].1[0].player_ids, active.teams[0].player_ids);
    assert_eq!(calls[0].1[1].losses, 3);
}

#[test]
fn finalize_needs_every_playing_team() {
    let (_, stats, manager) = fake_manager();
    manager.request_draw(&pool(10), &config()).unwrap();
    let active = manager.confirm().unwrap();

    assert!(matches!(
        manager.finalize(&[outcome(&active.teams[0], 1, 0, 0)]),
        Err(DrawError::IncompleteOutcomes { missing: 1 })
    ));

    let stranger = TeamOutcome {
        team_id: TeamId::new_v4(),
        ..Default::default()
    };
    assert!(matches!(
        manager.finalize(&[stranger]),
        Err(DrawError::UnknownTeam(_))
    ));
    assert!(manager.is_active());
    assert!(stats.calls.lock().unwrap().is_empty());
}

#[test]
fn reserve_team_outcome_is_optional() {
    let (_, stats, manager) = fake_manager();
    manager.request_draw(&pool(7), &config()).unwrap();
    let active = manager.confirm().unwrap();
    assert_eq!(active.teams.len(), 2);
    assert!(active.teams[1].is_reserve);

    manager
        .finalize(&[outcome(&active.teams[0], 2, 0, 0)])
        .unwrap();

    let calls = stats.calls.lock().unwrap();
    assert_eq!(calls[0].1.len(), 1);
}

#[test]
fn statistics_failure_closes_draw_and_can_be_retried() {
    let (store, stats, manager) = fake_manager();
    manager.request_draw(&pool(10), &config()).unwrap();
    let active = manager.confirm().unwrap();
    stats.fail.store(true, Ordering::SeqCst);
    let outcomes = [
        outcome(&active.teams[0], 1, 0, 0),
        outcome(&active.teams[1], 0, 1, 0),
    ];

    assert!(matches!(
        manager.finalize(&outcomes),
        Err(DrawError::StatisticsRecalc(_))
    ));
    assert_eq!(manager.state(), DrawLifecycleState::Idle);
    assert!(store.current().is_empty());
    assert_eq!(manager.pending_statistics(), Some(active.commitment_id));

    assert!(matches!(
        manager.retry_statistics(),
        Err(DrawError::StatisticsRecalc(_))
    ));
    assert_eq!(manager.pending_statistics(), Some(active.commitment_id));

    stats.fail.store(false, Ordering::SeqCst);
    manager.retry_statistics().unwrap();
    assert_eq!(manager.pending_statistics(), None);
    assert_eq!(stats.calls.lock().unwrap().len(), 3);
    assert!(matches!(
        manager.retry_statistics(),
        Err(DrawError::NoFailedStatistics)
    ));
}

#[test]
fn finalize_clear_failure_keeps_draw_active() {
    let (store, _, manager) = fake_manager();
    manager.request_draw(&pool(10), &config()).unwrap();
    let active = manager.confirm().unwrap();
    store.fail_clear.store(true, Ordering::SeqCst);
    let outcomes = [
        outcome(&active.teams[0], 1, 0, 0),
        outcome(&active.teams[1], 0, 1, 0),
    ];

    assert!(matches!(
        manager.finalize(&outcomes),
        Err(DrawError::Persistence(_))
    ));
    assert_eq!(manager.state(), DrawLifecycleState::Active(active));
}

#[test]
fn adjust_team_clamps_at_zero() {
    let (store, _, manager) = fake_manager();
    manager.request_draw(&pool(10), &config()).unwrap();
    let active = manager.confirm().unwrap();
    let team_id = active.teams[0].id;

    let record = manager.adjust_team(team_id, OutcomeField::Wins, 2).unwrap();
    assert_eq!(record.wins, 2);
    let record = manager.adjust_team(team_id, OutcomeField::Wins, -5).unwrap();
    assert_eq!(record.wins, 0);
    let record = manager.adjust_team(team_id, OutcomeField::Draws, 1).unwrap();
    assert_eq!(record.draws, 1);

    let state = manager.state();
    let shown = state.active().unwrap().team(team_id).unwrap();
    assert_eq!((shown.wins, shown.draws), (0, 1));
    assert_eq!(store.current()[0].draws, 1);

    assert!(matches!(
        manager.adjust_team(TeamId::new_v4(), OutcomeField::Losses, 1),
        Err(DrawError::UnknownTeam(_))
    ));
}

// ---------------------------------------------------------------------------
// SQLite-backed flows
// ---------------------------------------------------------------------------

fn sqlite_with_roster(n: usize) -> Arc<SqliteStore> {
    let store = Arc::new(SqliteStore::open(":memory:").unwrap());
    for player in pool(n) {
        assert!(store.add_player(&player).unwrap());
    }
    store
}

#[test]
fn full_pelada_updates_player_statistics() {
    let store = sqlite_with_roster(10);
    let manager =
        DrawLifecycleManager::new(store.clone(), store.clone(), StdRng::seed_from_u64(3));

    let players = store.active_players().unwrap();
    manager.request_draw(&players, &config()).unwrap();
    let active = manager.confirm().unwrap();
    let (first, second) = (&active.teams[0], &active.teams[1]);
    manager.adjust_team(first.id, OutcomeField::Wins, 2).unwrap();
    manager.adjust_team(second.id, OutcomeField::Draws, 1).unwrap();

    manager
        .finalize(&[outcome(first, 2, 0, 1), outcome(second, 0, 2, 1)])
        .unwrap();

    assert!(store.load_current_teams().unwrap().is_empty());
    let winner = store.player(first.player_ids[0]).unwrap().unwrap();
    assert_eq!(
        (winner.games, winner.wins, winner.draws, winner.losses),
        (3, 2, 1, 0)
    );
    assert_eq!(winner.score, 2 * 3 + 1);
    let loser = store.player(second.player_ids[0]).unwrap().unwrap();
    assert_eq!((loser.games, loser.losses, loser.score), (3, 2, 1));
}

#[test]
fn restart_restores_active_draw_from_store() {
    let store = sqlite_with_roster(10);
    let players = store.active_players().unwrap();
    let active = {
        let manager =
            DrawLifecycleManager::new(store.clone(), store.clone(), StdRng::seed_from_u64(3));
        manager.request_draw(&players, &config()).unwrap();
        let active = manager.confirm().unwrap();
        manager
            .adjust_team(active.teams[1].id, OutcomeField::Wins, 1)
            .unwrap();
        active
    };

    let restored =
        DrawLifecycleManager::restore(store.clone(), store.clone(), StdRng::seed_from_u64(4))
            .unwrap();

    let state = restored.state();
    let resumed = state.active().expect("draw should resume as active");
    assert_eq!(resumed.commitment_id, active.commitment_id);
    assert_eq!(resumed.teams.len(), 2);
    assert_eq!(resumed.teams[1].wins, 1);
    assert_eq!(resumed.teams[0].player_ids, active.teams[0].player_ids);
    assert!(matches!(
        restored.request_draw(&players, &config()),
        Err(DrawError::AlreadyActive)
    ));
}

#[test]
fn restart_without_current_teams_is_idle() {
    let store = sqlite_with_roster(3);

    let manager =
        DrawLifecycleManager::restore(store.clone(), store, StdRng::seed_from_u64(1)).unwrap();

    assert_eq!(manager.state(), DrawLifecycleState::Idle);
}

#[test]
fn concurrent_drawers_leave_exactly_one_current_draw() {
    let store = sqlite_with_roster(12);
    let players = store.active_players().unwrap();
    let manager = Arc::new(DrawLifecycleManager::new(
        store.clone(),
        store.clone(),
        StdRng::seed_from_u64(11),
    ));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let players = players.clone();
            thread::spawn(move || {
                match manager.request_draw(&players, &DrawConfiguration::random(6, 2)) {
                    Ok(_) => {}
                    Err(DrawError::AlreadyActive) | Err(DrawError::InvalidTransition { .. }) => {
                        return 0
                    }
                    Err(e) => panic!("unexpected draw error: {e}"),
                }
                match manager.confirm() {
                    Ok(_) => 1,
                    Err(DrawError::InvalidTransition { .. }) => 0,
                    Err(e) => panic!("unexpected confirm error: {e}"),
                }
            })
        })
        .collect();
    let confirmed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(confirmed, 1);
    let state = manager.state();
    let active = state.active().expect("one draw should be active");
    let current = store.load_current_teams().unwrap();
    assert_eq!(current.len(), 2);
    assert!(current
        .iter()
        .all(|t| t.commitment_id == active.commitment_id));
}
