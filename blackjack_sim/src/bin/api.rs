use actix_web::{
    body::BoxBody,
    get,
    http::{header::ContentType, StatusCode},
    post, web, App, HttpResponse, HttpServer, ResponseError,
};
use blackjack_sim::prelude::*;
use blackjack_sim::write::write_summaries_json;
use log::{error, info};
use serde::Deserialize;
use std::sync::{Mutex, MutexGuard, TryLockError};

/// A struct for handling the configurations of the game. Meant to be deserialized from JSON.
#[derive(Debug, Deserialize)]
struct GameConfig {
    player_starting_balance: i64,
    num_simulations: u32,
    num_decks: usize,
    hands_per_simulation: u32,
    base_bet: u32,
    surrender: Option<bool>,
    insurance: Option<bool>,
    reshuffle_threshold: Option<f32>,
    seed: Option<u64>,
}

impl From<GameConfig> for BlackjackSimulatorConfig {
    fn from(value: GameConfig) -> Self {
        let mut builder = BlackjackSimulatorConfig::new();
        builder
            .player_starting_balance(value.player_starting_balance)
            .num_simulations(value.num_simulations)
            .num_decks(value.num_decks)
            .hands_per_simulation(value.hands_per_simulation)
            .base_bet(value.base_bet)
            .surrender(value.surrender.unwrap_or(false))
            .insurance(value.insurance.unwrap_or(false))
            .reshuffle_threshold(value.reshuffle_threshold.unwrap_or(0.25));
        if let Some(seed) = value.seed {
            builder.seed(seed);
        }
        builder.build()
    }
}

/// A struct for deserializing the strategy configuration from json.
#[derive(Deserialize)]
struct SimConfig {
    strategy: String,
}

/// An enum that will handle user facing errors
#[derive(Debug)]
enum UserError {
    InternalError,
    SimulationCreationError(String),
    SimulatorNotCreated,
    SimulationRunning,
    BadInput(String),
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserError::InternalError => write!(f, "an internal error occured"),
            UserError::SimulationCreationError(s) => write!(f, "{}", s),
            UserError::SimulatorNotCreated => write!(
                f,
                "a simulator has not been created, configure the game parameters first"
            ),
            UserError::SimulationRunning => {
                write!(f, "a simulation is running, try again once it has finished")
            }
            UserError::BadInput(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for UserError {}

impl ResponseError for UserError {
    fn error_response(&self) -> HttpResponse<BoxBody> {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            UserError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            UserError::SimulationCreationError(_) => StatusCode::BAD_REQUEST,
            UserError::SimulatorNotCreated => StatusCode::BAD_REQUEST,
            UserError::SimulationRunning => StatusCode::CONFLICT,
            UserError::BadInput(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<SimulationError> for UserError {
    fn from(value: SimulationError) -> Self {
        match value {
            SimulationError::InvalidConfig(msg) => UserError::BadInput(msg),
            SimulationError::NoSimulations => {
                UserError::BadInput("no simulations have been added, unable to run.".to_string())
            }
            e => {
                error!("simulation failed: {e}");
                UserError::InternalError
            }
        }
    }
}

type AppSimulator = web::Data<Mutex<Option<MulStrategyBlackjackSimulator>>>;

/// Takes the simulator lock without waiting, a run in progress holds it on a blocking thread.
fn try_lock_simulator(
    app_sim: &AppSimulator,
) -> Result<MutexGuard<'_, Option<MulStrategyBlackjackSimulator>>, UserError> {
    app_sim.try_lock().map_err(|e| match e {
        TryLockError::WouldBlock => UserError::SimulationRunning,
        TryLockError::Poisoned(_) => UserError::InternalError,
    })
}

/// A handler that will configure, and build a new `MulStrategyBlackjackSimulator` using the given parameters the body of the request
#[post("/config-game-params")]
async fn configure_simulation_parameters(
    params: web::Json<GameConfig>,
    app_sim: AppSimulator,
) -> Result<HttpResponse, UserError> {
    let config = BlackjackSimulatorConfig::from(params.into_inner());
    let simulator = MulStrategyBlackjackSimulator::new(config).build()?;

    let mut guard = try_lock_simulator(&app_sim)?;
    *guard = Some(simulator);
    info!("simulator configured: {:?}", config);
    Ok(HttpResponse::Ok().body("simulator created successfully"))
}

/// A handler that will add a simulation to the simulator.
#[post("/add-sim")]
async fn add_simulation(
    sim_params: web::Json<SimConfig>,
    app_sim: AppSimulator,
) -> Result<HttpResponse, UserError> {
    let kind: StrategyKind = sim_params
        .strategy
        .parse()
        .map_err(|e: BlackjackGameError| UserError::SimulationCreationError(e.to_string()))?;

    let mut guard = try_lock_simulator(&app_sim)?;
    let simulator = guard.as_mut().ok_or(UserError::SimulatorNotCreated)?;
    simulator.add_simulation(kind.build())?;
    info!("added a {} simulation", kind);
    Ok(HttpResponse::Ok().body("simulation added successfully"))
}

/// A handler that will run the simulation given the configurations.
/// Will return an error response if the game has not been configured and/or no simulations have been added.
#[get("/run-sim")]
async fn run_simulation(app_sim: AppSimulator) -> Result<HttpResponse, UserError> {
    // The run is CPU bound, keep it off the async workers
    let summaries = web::block(move || -> Result<Vec<SimulationSummary>, UserError> {
        let mut guard = try_lock_simulator(&app_sim)?;
        let simulator = guard.as_mut().ok_or(UserError::SimulatorNotCreated)?;
        Ok(simulator.run()?)
    })
    .await
    .map_err(|e| {
        error!("simulation task failed: {e}");
        UserError::InternalError
    })??;

    let mut body = Vec::new();
    write_summaries_json(&summaries, &mut body).map_err(|e| {
        error!("unable to serialize summaries: {e}");
        UserError::InternalError
    })?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(body))
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(configure_simulation_parameters)
        .service(add_simulation)
        .service(run_simulation);
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let address = "127.0.0.1";
    let port = 8080;
    info!("listening at {}:{}...", address, port);

    let app_sim: AppSimulator = web::Data::new(Mutex::new(None));

    HttpServer::new(move || {
        App::new().app_data(app_sim.clone()).configure(routes)
    })
    .bind((address, port))?
    .run()
    .await
}
