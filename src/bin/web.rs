//! Single binary web server: JSON API over the draw lifecycle.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! PELADA_DB picks the SQLite file, PELADA_ROSTER_CSV seeds the roster on start,
//! PELADA_POINTS_WIN / _DRAW / _LOSS set the scoring rules.

use actix_web::{
    get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use pelada_draw::{
    read_players_csv, Criterion, DrawConfiguration, DrawError, DrawLifecycleManager, OutcomeField,
    Roster, ScoringRules, SqliteStore, TeamId, TeamOutcome,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::sync::Arc;

type Manager = DrawLifecycleManager<Arc<SqliteStore>, Arc<SqliteStore>>;

/// Shared app state: the one lifecycle manager plus the roster it draws from.
struct AppContext {
    manager: Manager,
    roster: Arc<SqliteStore>,
}

type AppState = Data<AppContext>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct DrawBody {
    #[serde(default = "default_players_per_team")]
    players_per_team: usize,
    #[serde(default = "default_team_count")]
    team_count: usize,
    #[serde(default)]
    random: bool,
    #[serde(default = "default_criteria")]
    criteria: BTreeSet<Criterion>,
}

impl DrawBody {
    fn into_configuration(self) -> DrawConfiguration {
        DrawConfiguration {
            players_per_team: self.players_per_team,
            team_count: self.team_count,
            random: self.random,
            criteria: self.criteria,
        }
    }
}

impl Default for DrawBody {
    fn default() -> Self {
        Self {
            players_per_team: default_players_per_team(),
            team_count: default_team_count(),
            random: false,
            criteria: default_criteria(),
        }
    }
}

fn default_players_per_team() -> usize {
    5
}

fn default_team_count() -> usize {
    2
}

fn default_criteria() -> BTreeSet<Criterion> {
    BTreeSet::from([Criterion::Score])
}

#[derive(Deserialize)]
struct FinalizeBody {
    outcomes: Vec<TeamOutcome>,
}

#[derive(Deserialize)]
struct AdjustTeamBody {
    field: OutcomeField,
    delta: i32,
}

/// Path segment: team id (e.g. /api/draw/teams/{team_id})
#[derive(Deserialize)]
struct TeamPath {
    team_id: TeamId,
}

/// Map a lifecycle error to a status code with the `{ "error": ... }` body.
fn error_response(e: DrawError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        DrawError::InvalidTransition { .. } | DrawError::AlreadyActive => {
            HttpResponse::Conflict().json(body)
        }
        DrawError::InsufficientPlayers
        | DrawError::InvalidConfiguration(_)
        | DrawError::IncompleteOutcomes { .. }
        | DrawError::UnknownTeam(_)
        | DrawError::NoFailedStatistics => HttpResponse::BadRequest().json(body),
        DrawError::Persistence(_) | DrawError::StatisticsRecalc(_) => {
            HttpResponse::InternalServerError().json(body)
        }
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "pelada-draw",
    })
}

/// Players eligible for the next draw.
#[get("/api/players")]
async fn api_players(state: AppState) -> HttpResponse {
    match state.roster.active_players() {
        Ok(players) => HttpResponse::Ok().json(players),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Current lifecycle state (idle, drawing, pending confirmation, or active).
#[get("/api/draw")]
async fn api_get_draw(state: AppState) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "lifecycle": state.manager.state(),
        "pending_statistics": state.manager.pending_statistics(),
    }))
}

/// Draw teams from the roster's eligible players. The draw runs off the request thread.
#[post("/api/draw")]
async fn api_request_draw(state: AppState, body: Option<Json<DrawBody>>) -> HttpResponse {
    let config = body.map(Json::into_inner).unwrap_or_default().into_configuration();
    if let Err(e) = config.validate() {
        return error_response(e);
    }
    let pool = match state.roster.active_players() {
        Ok(players) => players,
        Err(e) => return HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() })),
    };
    let ctx = state.clone();
    let drawn = tokio::task::spawn_blocking(move || ctx.manager.request_draw(&pool, &config)).await;
    match drawn {
        Ok(Ok(result)) => HttpResponse::Ok().json(result),
        Ok(Err(e)) => error_response(e),
        Err(e) => {
            log::error!("Draw task failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": "draw task failed" }))
        }
    }
}

/// Confirm the pending draw (persists it as the current teams).
#[post("/api/draw/confirm")]
async fn api_confirm_draw(state: AppState) -> HttpResponse {
    match state.manager.confirm() {
        Ok(active) => HttpResponse::Ok().json(active),
        Err(e) => error_response(e),
    }
}

/// Cancel the pending draw (nothing persisted).
#[post("/api/draw/cancel")]
async fn api_cancel_draw(state: AppState) -> HttpResponse {
    match state.manager.cancel() {
        Ok(()) => HttpResponse::Ok().json(state.manager.state()),
        Err(e) => error_response(e),
    }
}

/// Discard the active draw. The client asks the user before calling this.
#[post("/api/draw/discard")]
async fn api_discard_draw(state: AppState) -> HttpResponse {
    match state.manager.discard_active() {
        Ok(()) => HttpResponse::Ok().json(state.manager.state()),
        Err(e) => error_response(e),
    }
}

/// Finalize the active draw with per-team results.
#[post("/api/draw/finalize")]
async fn api_finalize_draw(state: AppState, body: Json<FinalizeBody>) -> HttpResponse {
    match state.manager.finalize(&body.outcomes) {
        Ok(()) => HttpResponse::Ok().json(state.manager.state()),
        Err(e) => error_response(e),
    }
}

/// Add to (or subtract from) one team's win/loss/draw count while the draw is active.
#[put("/api/draw/teams/{team_id}")]
async fn api_adjust_team(
    state: AppState,
    path: Path<TeamPath>,
    body: Json<AdjustTeamBody>,
) -> HttpResponse {
    match state.manager.adjust_team(path.team_id, body.field, body.delta) {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(e) => error_response(e),
    }
}

/// Retry the statistics step of the last finalize that failed it.
#[post("/api/draw/statistics/retry")]
async fn api_retry_statistics(state: AppState) -> HttpResponse {
    match state.manager.retry_statistics() {
        Ok(()) => HttpResponse::Ok().json(state.manager.state()),
        Err(e) => error_response(e),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "pelada.db".to_string()
}

/// Integer env var with fallback.
fn env_points(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn scoring_from_env() -> ScoringRules {
    let defaults = ScoringRules::default();
    ScoringRules {
        win: env_points("PELADA_POINTS_WIN", defaults.win),
        draw: env_points("PELADA_POINTS_DRAW", defaults.draw),
        loss: env_points("PELADA_POINTS_LOSS", defaults.loss),
    }
}

/// Import the roster file, skipping names already registered.
fn import_roster(store: &SqliteStore, path: &str) -> std::io::Result<()> {
    let file = File::open(path)?;
    let players = read_players_csv(file).map_err(std::io::Error::other)?;
    let mut added = 0;
    for player in &players {
        if store.add_player(player).map_err(std::io::Error::other)? {
            added += 1;
        }
    }
    log::info!("Imported {} of {} roster player(s) from {}", added, players.len(), path);
    Ok(())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let db_path = std::env::var("PELADA_DB").unwrap_or_else(|_| default_db_path());

    let store = SqliteStore::open(&db_path)
        .map_err(std::io::Error::other)?
        .with_scoring(scoring_from_env());
    let store = Arc::new(store);
    if let Ok(path) = std::env::var("PELADA_ROSTER_CSV") {
        import_roster(&store, &path)?;
    }

    let manager = DrawLifecycleManager::restore(store.clone(), store.clone(), StdRng::from_entropy())
        .map_err(std::io::Error::other)?;
    if manager.is_active() {
        log::info!("Resuming an active draw from {}", db_path);
    }
    let state = Data::new(AppContext {
        manager,
        roster: store,
    });

    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_players)
            .service(api_get_draw)
            .service(api_request_draw)
            .service(api_confirm_draw)
            .service(api_cancel_draw)
            .service(api_discard_draw)
            .service(api_finalize_draw)
            .service(api_adjust_team)
            .service(api_retry_statistics)
    })
    .bind(bind)?
    .run()
    .await
}
