//! Single binary JSON API around the scheduler.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! SCHEDULE_TIMEOUT_SECS bounds each scheduling request (default 30).

use actix_web::{
    get, post,
    web::{Data, Json},
    App, HttpResponse, HttpServer, Responder,
};
use doubles_scheduler::{
    check_feasibility, generate_schedule, parse_roster_str, Player, PlayerStats, Schedule,
    ScheduleConfig, ScheduleError,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-server settings read from the environment at startup.
struct ServerSettings {
    schedule_timeout: Duration,
}

type AppState = Data<ServerSettings>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct ScheduleRequest {
    players: Vec<Player>,
    #[serde(default)]
    config: ScheduleConfig,
}

#[derive(Serialize)]
struct ScheduleResponse {
    schedule: Schedule,
    stats: Vec<PlayerStats>,
}

fn error_response(e: &ScheduleError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string(), "kind": e.kind() });
    if e.is_configuration_error() {
        HttpResponse::BadRequest().json(body)
    } else {
        HttpResponse::UnprocessableEntity().json(body)
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "doubles-scheduler",
    })
}

/// Parse a CSV roster (`name,rating,gender`) into players.
#[post("/api/roster/csv")]
async fn api_parse_roster(body: String) -> HttpResponse {
    match parse_roster_str(&body) {
        Ok(players) => HttpResponse::Ok().json(players),
        Err(e) => error_response(&e),
    }
}

/// Run the pre-checks only and return the round plan.
#[post("/api/schedule/check")]
async fn api_check_schedule(body: Json<ScheduleRequest>) -> HttpResponse {
    match check_feasibility(&body.players, &body.config) {
        Ok(plan) => HttpResponse::Ok().json(plan),
        Err(e) => error_response(&e),
    }
}

/// Generate a full schedule. The search runs on a blocking thread.
#[post("/api/schedule")]
async fn api_generate_schedule(state: AppState, body: Json<ScheduleRequest>) -> HttpResponse {
    let ScheduleRequest { players, mut config } = body.into_inner();
    if config.budget.time_limit_ms.is_none() {
        config.budget.time_limit_ms = Some(state.schedule_timeout.as_millis() as u64);
    }

    let job = tokio::task::spawn_blocking(move || {
        let result = generate_schedule(&players, &config);
        (players, result)
    });
    // Grace period over the engine's own limit before giving up on the worker.
    let outer = state.schedule_timeout + Duration::from_secs(5);
    match tokio::time::timeout(outer, job).await {
        Ok(Ok((players, Ok(schedule)))) => {
            let stats = schedule.player_stats(&players);
            HttpResponse::Ok().json(ScheduleResponse { schedule, stats })
        }
        Ok(Ok((_, Err(e)))) => error_response(&e),
        Ok(Err(join_err)) => {
            log::error!("Scheduling task failed: {}", join_err);
            HttpResponse::InternalServerError().body("scheduling task failed")
        }
        Err(_) => HttpResponse::GatewayTimeout()
            .json(serde_json::json!({ "error": "Scheduling timed out", "kind": "timeout" })),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_schedule_timeout_secs() -> u64 {
    30
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let timeout_secs: u64 = std::env::var("SCHEDULE_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(default_schedule_timeout_secs);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(ServerSettings {
        schedule_timeout: Duration::from_secs(timeout_secs),
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_parse_roster)
            .service(api_check_schedule)
            .service(api_generate_schedule)
    })
    .bind(bind)?
    .run()
    .await
}
