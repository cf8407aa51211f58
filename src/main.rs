use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wordtiles::{
    dictionary::InMemoryDictionary,
    game::{self, GameRepository, GameService, PostgresGameRepository},
    AppState, EventBus, GameConfig,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wordtiles=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting word tile game server");

    let config = GameConfig::from_env();
    info!(
        turn_seconds = config.default_turn_duration_secs,
        bingo_bonus = config.bingo_bonus,
        skip_rounds = config.consecutive_skip_rounds,
        "Game configuration loaded"
    );

    // Word lists are loaded by an outer process
    let dictionary = Arc::new(InMemoryDictionary::new());

    let event_bus = EventBus::new();
    let mut builder = GameService::builder(dictionary, Arc::new(event_bus)).with_config(config);

    // Games live in PostgreSQL when DATABASE_URL is set, in memory otherwise
    if let Ok(database_url) = std::env::var("DATABASE_URL") {
        match sqlx::PgPool::connect(&database_url).await {
            Ok(pool) => {
                info!("Using PostgreSQL game repository");
                let games: Arc<dyn GameRepository> = Arc::new(PostgresGameRepository::new(pool));
                builder = builder.with_game_repository(games);
            }
            Err(e) => {
                error!(error = %e, "Failed to connect to database");
                return;
            }
        }
    }

    let app_state = AppState::new(builder.start());

    let app = Router::new()
        .route("/", get(|| async { "Word tiles game server" }))
        .merge(game::routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr = std::env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, addr = %addr, "Failed to bind server address");
            return;
        }
    };

    info!(addr = %addr, "Server running");
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server stopped with error");
    }
}
