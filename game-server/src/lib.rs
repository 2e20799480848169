use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use warp::Filter;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Reply;

use crate::auth::{AuthError, IdentityVerifier};
use crate::service::GameService;
use game_core::GameError;
use game_types::{CreateRoomResponse, ErrorCode, ErrorResponse, InviteResponse, Player};

pub mod auth;
pub mod config;
pub mod hub;
pub mod invite;
pub mod room;
pub mod service;
pub mod websocket;

#[derive(Deserialize)]
struct LiveQuery {
    token: String,
}

pub fn create_routes(
    service: Arc<dyn GameService>,
    verifier: Arc<dyn IdentityVerifier>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let service_filter = warp::any().map({
        let service = service.clone();
        move || service.clone()
    });

    let auth_filter = warp::any().map({
        let verifier = verifier.clone();
        move || verifier.clone()
    });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    let create_room = warp::path("room")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::header::optional::<String>("authorization"))
        .and(service_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_create_room);

    let player_rooms = warp::path("room")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::header::optional::<String>("authorization"))
        .and(service_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_player_rooms_request);

    let invite = warp::path!("join" / "room" / Uuid)
        .and(warp::get())
        .and(warp::header::optional::<String>("authorization"))
        .and(service_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_invite_request);

    let room_state = warp::path!("room" / Uuid)
        .and(warp::get())
        .and(warp::header::optional::<String>("authorization"))
        .and(service_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_room_state_request);

    // WebSocket endpoint, gated by an invite token
    let live = warp::path("live")
        .and(warp::path::end())
        .and(warp::ws())
        .and(warp::query::<LiveQuery>())
        .and(service_filter.clone())
        .and_then(handle_live_request);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "authorization"])
        .allow_methods(vec!["GET", "POST"]);

    live.or(health)
        .or(create_room)
        .or(player_rooms)
        .or(invite)
        .or(room_state)
        .with(cors)
        .with(warp::log("word_rooms"))
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::RoomNotFound => StatusCode::NOT_FOUND,
        ErrorCode::TokenExpired | ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorCode::NotCreator => StatusCode::FORBIDDEN,
        ErrorCode::CannotJoinOngoing
        | ErrorCode::AlreadyStarted
        | ErrorCode::AlreadyEnded
        | ErrorCode::RoomClosed => StatusCode::CONFLICT,
        ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn error_reply(code: ErrorCode, message: impl Into<String>) -> Response {
    let body = ErrorResponse {
        code,
        error: message.into(),
    };
    warp::reply::with_status(warp::reply::json(&body), status_for(code)).into_response()
}

fn game_error_reply(e: &GameError) -> Response {
    error_reply(e.code(), e.to_string())
}

async fn authenticate(
    header: Option<String>,
    verifier: &Arc<dyn IdentityVerifier>,
) -> Result<Player, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?;
    let token = header.strip_prefix("Bearer ").unwrap_or(&header);
    verifier.verify(token.trim()).await
}

fn auth_error_reply(e: &AuthError) -> Response {
    tracing::warn!("Rejected request: {}", e);
    error_reply(ErrorCode::Unauthenticated, e.to_string())
}

async fn handle_create_room(
    auth_header: Option<String>,
    service: Arc<dyn GameService>,
    verifier: Arc<dyn IdentityVerifier>,
) -> Result<Response, warp::Rejection> {
    let player = match authenticate(auth_header, &verifier).await {
        Ok(player) => player,
        Err(e) => return Ok(auth_error_reply(&e)),
    };

    match service.create_room(player).await {
        Ok(id) => Ok(warp::reply::with_status(
            warp::reply::json(&CreateRoomResponse { id }),
            StatusCode::CREATED,
        )
        .into_response()),
        Err(e) => Ok(game_error_reply(&e)),
    }
}

async fn handle_invite_request(
    room_id: Uuid,
    auth_header: Option<String>,
    service: Arc<dyn GameService>,
    verifier: Arc<dyn IdentityVerifier>,
) -> Result<Response, warp::Rejection> {
    let player = match authenticate(auth_header, &verifier).await {
        Ok(player) => player,
        Err(e) => return Ok(auth_error_reply(&e)),
    };

    match service.issue_invite(player, room_id).await {
        Ok(token) => Ok(warp::reply::json(&InviteResponse { token }).into_response()),
        Err(e) => Ok(game_error_reply(&e)),
    }
}

async fn handle_room_state_request(
    room_id: Uuid,
    auth_header: Option<String>,
    service: Arc<dyn GameService>,
    verifier: Arc<dyn IdentityVerifier>,
) -> Result<Response, warp::Rejection> {
    let player = match authenticate(auth_header, &verifier).await {
        Ok(player) => player,
        Err(e) => return Ok(auth_error_reply(&e)),
    };

    match service.room_snapshot(&player, room_id).await {
        Ok(state) => Ok(warp::reply::json(&state).into_response()),
        Err(e) => Ok(game_error_reply(&e)),
    }
}

async fn handle_player_rooms_request(
    auth_header: Option<String>,
    service: Arc<dyn GameService>,
    verifier: Arc<dyn IdentityVerifier>,
) -> Result<Response, warp::Rejection> {
    let player = match authenticate(auth_header, &verifier).await {
        Ok(player) => player,
        Err(e) => return Ok(auth_error_reply(&e)),
    };

    match service.player_rooms(&player).await {
        Ok(rooms) => Ok(warp::reply::json(&rooms).into_response()),
        Err(e) => Ok(game_error_reply(&e)),
    }
}

async fn handle_live_request(
    ws: warp::ws::Ws,
    query: LiveQuery,
    service: Arc<dyn GameService>,
) -> Result<Response, warp::Rejection> {
    match service.redeem_invite(&query.token).await {
        Ok(invite) => Ok(ws
            .on_upgrade(move |socket| websocket::handle_connection(socket, service, invite))
            .into_response()),
        Err(e) => Ok(game_error_reply(&e)),
    }
}
