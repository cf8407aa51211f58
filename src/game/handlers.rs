use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};

use super::{
    models::{ActionModel, GameModel, GameStatus, PlayerModel, WordModel},
    types::{
        ActionsQuery, BoardQuery, ChatMessage, ChatRequest, CreateGameRequest, ExchangeResult,
        ExchangeTilesRequest, PlayMoveRequest, PlayResult, RackQuery, UserRequest,
    },
};
use crate::{
    board::VirtualBoard,
    rack::VirtualRack,
    shared::{AppError, AppState},
};

/// Routes of the game API
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/games", post(create_game).get(list_games))
        .route("/games/:game_id", get(get_game))
        .route("/games/:game_id/join", post(join_game))
        .route("/games/:game_id/leave", post(leave_game))
        .route("/games/:game_id/start", post(start_game))
        .route("/games/:game_id/play", post(play_move))
        .route("/games/:game_id/exchange", post(exchange_tiles))
        .route("/games/:game_id/end", post(end_game))
        .route("/games/:game_id/terminate", post(terminate_game))
        .route("/games/:game_id/chat", post(post_chat))
        .route("/games/:game_id/board", get(get_board))
        .route("/games/:game_id/racks/:player_number", get(get_rack))
        .route("/games/:game_id/players", get(list_players))
        .route("/games/:game_id/words", get(list_words))
        .route("/games/:game_id/actions", get(list_actions))
}

#[derive(Debug, Default, Deserialize)]
pub struct GameListQuery {
    pub status: Option<GameStatus>,
}

/// POST /games
#[instrument(name = "create_game", skip(state, request))]
pub async fn create_game(
    State(state): State<AppState>,
    Json(request): Json<CreateGameRequest>,
) -> Result<Json<GameModel>, AppError> {
    let game = state.game_service.create_game(request).await?;
    info!(game_id = %game.id, "Game created via API");
    Ok(Json(game))
}

/// GET /games?status=WAITING
#[instrument(name = "list_games", skip(state))]
pub async fn list_games(
    State(state): State<AppState>,
    Query(query): Query<GameListQuery>,
) -> Result<Json<Vec<GameModel>>, AppError> {
    Ok(Json(state.game_service.list_games(query.status).await?))
}

/// GET /games/:game_id
#[instrument(name = "get_game", skip(state))]
pub async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<GameModel>, AppError> {
    Ok(Json(state.game_service.get_game(&game_id).await?))
}

/// POST /games/:game_id/join
#[instrument(name = "join_game", skip(state, request))]
pub async fn join_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<UserRequest>,
) -> Result<Json<GameModel>, AppError> {
    Ok(Json(
        state
            .game_service
            .join_game(&game_id, &request.user_id)
            .await?,
    ))
}

/// POST /games/:game_id/leave
#[instrument(name = "leave_game", skip(state, request))]
pub async fn leave_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<UserRequest>,
) -> Result<Json<GameModel>, AppError> {
    Ok(Json(
        state
            .game_service
            .leave_game(&game_id, &request.user_id)
            .await?,
    ))
}

/// POST /games/:game_id/start
#[instrument(name = "start_game", skip(state))]
pub async fn start_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<GameModel>, AppError> {
    Ok(Json(state.game_service.start_game(&game_id).await?))
}

/// POST /games/:game_id/play
#[instrument(name = "play_move", skip(state, request))]
pub async fn play_move(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<PlayMoveRequest>,
) -> Result<Json<PlayResult>, AppError> {
    let result = state.game_service.play_move(&game_id, request).await?;
    info!(game_id = %game_id, points = result.points, "Move accepted via API");
    Ok(Json(result))
}

/// POST /games/:game_id/exchange
#[instrument(name = "exchange_tiles", skip(state, request))]
pub async fn exchange_tiles(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<ExchangeTilesRequest>,
) -> Result<Json<ExchangeResult>, AppError> {
    Ok(Json(
        state
            .game_service
            .exchange_tiles(
                &game_id,
                request.player_number,
                request.round_number,
                &request.tile_numbers,
            )
            .await?,
    ))
}

/// POST /games/:game_id/end
#[instrument(name = "end_game", skip(state))]
pub async fn end_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<GameModel>, AppError> {
    Ok(Json(state.game_service.end_game(&game_id).await?))
}

/// POST /games/:game_id/terminate
#[instrument(name = "terminate_game", skip(state, request))]
pub async fn terminate_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<UserRequest>,
) -> Result<Json<GameModel>, AppError> {
    Ok(Json(
        state
            .game_service
            .terminate_game(&game_id, &request.user_id)
            .await?,
    ))
}

/// POST /games/:game_id/chat
#[instrument(name = "post_chat", skip(state, request))]
pub async fn post_chat(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatMessage>, AppError> {
    Ok(Json(
        state
            .game_service
            .post_chat(&game_id, &request.user_id, &request.message)
            .await?,
    ))
}

/// GET /games/:game_id/board?version=N
#[instrument(name = "get_board", skip(state))]
pub async fn get_board(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Query(query): Query<BoardQuery>,
) -> Result<Json<VirtualBoard>, AppError> {
    Ok(Json(
        state
            .game_service
            .get_current_board(&game_id, query.version)
            .await?,
    ))
}

/// GET /games/:game_id/racks/:player_number?round=N
#[instrument(name = "get_rack", skip(state))]
pub async fn get_rack(
    State(state): State<AppState>,
    Path((game_id, player_number)): Path<(String, u32)>,
    Query(query): Query<RackQuery>,
) -> Result<Json<VirtualRack>, AppError> {
    Ok(Json(
        state
            .game_service
            .get_current_rack(&game_id, player_number, query.round)
            .await?,
    ))
}

/// GET /games/:game_id/players
#[instrument(name = "list_players", skip(state))]
pub async fn list_players(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<Vec<PlayerModel>>, AppError> {
    Ok(Json(state.game_service.list_players(&game_id).await?))
}

/// GET /games/:game_id/words
#[instrument(name = "list_words", skip(state))]
pub async fn list_words(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<Vec<WordModel>>, AppError> {
    Ok(Json(state.game_service.list_words(&game_id).await?))
}

/// GET /games/:game_id/actions?since=N
#[instrument(name = "list_actions", skip(state))]
pub async fn list_actions(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Query(query): Query<ActionsQuery>,
) -> Result<Json<Vec<ActionModel>>, AppError> {
    Ok(Json(
        state
            .game_service
            .actions_since(&game_id, query.since)
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::Language;
    use crate::dictionary::InMemoryDictionary;
    use crate::event::EventBus;
    use crate::game::GameService;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    fn app() -> Router {
        let dictionary = Arc::new(InMemoryDictionary::with_words(Language::English, ["WEAK"]));
        let service = GameService::builder(dictionary, Arc::new(EventBus::new())).start();
        routes().with_state(AppState::new(service))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_create_game_handler() {
        let response = app()
            .oneshot(post_json(
                "/games",
                r#"{"owner_id": "alice", "expected_player_count": 2}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let game = body_json(response).await;
        assert_eq!(game["status"], "WAITING");
        assert_eq!(game["owner_id"], "alice");
        assert_eq!(game["rows"], 15);
        assert_eq!(game["language"], "en");
    }

    #[tokio::test]
    async fn test_create_game_rejects_too_many_players() {
        let response = app()
            .oneshot(post_json(
                "/games",
                r#"{"owner_id": "alice", "expected_player_count": 9}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["kind"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_unknown_game_is_not_found() {
        let request = Request::builder()
            .uri("/games/missing")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_join_then_board_of_waiting_game() {
        let app = app();
        let response = app
            .clone()
            .oneshot(post_json(
                "/games",
                r#"{"owner_id": "alice", "expected_player_count": 3}"#,
            ))
            .await
            .unwrap();
        let game_id = body_json(response).await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/games/{}/join", game_id),
                r#"{"user_id": "bob"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["active_player_count"], 2);

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/games/{}/join", game_id),
                r#"{"user_id": "bob"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let request = Request::builder()
            .uri(format!("/games/{}/board", game_id))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let board = body_json(response).await;
        assert_eq!(board["cells"].as_array().unwrap().len(), 225);
    }
}
