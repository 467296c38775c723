use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use axum::{
    extract::{Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use server_api::{ApiContext, Generator, MissingGenerator};
use shared::{
    domain::{
        Collection, Infant, InfantId, InfantProfile, LingTestRecord, MilestoneProgress, OwnerId,
        ScreeningRecord,
    },
    error::{ApiError, ErrorCode},
    protocol::{
        AddInfantRequest, CatalogPayload, GenerateAudioRequest, GenerateAudioResponse,
        LoginRequest, LoginResponse, RecommendationRequest, RecommendationResponse, Report,
        SaveLingTestRequest, SaveProgressRequest, SaveRiskFactorsRequest, ServerEvent,
    },
};
use storage::Storage;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod auth;
mod config;
mod generator;

use app_state::AppState;
use auth::{mint_token, AuthConfig, AuthOwner, WsOwner};
use config::{load_settings, prepare_database_url, DEV_JWT_SECRET};
use generator::HttpGenerator;

const MAX_BODY_BYTES: usize = 64 * 1024;

type Rejection = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    if settings.auth.jwt_secret == DEV_JWT_SECRET {
        warn!("using the development token secret; set APP__AUTH__JWT_SECRET in production");
    }

    let generator: Arc<dyn Generator> = match settings.generation.base_url.as_deref() {
        Some(base_url) => {
            info!(%base_url, "generation backend configured");
            Arc::new(HttpGenerator::new(
                base_url,
                settings.generation.api_key.clone(),
                Duration::from_secs(settings.generation.timeout_seconds),
            )?)
        }
        None => {
            info!("generation backend not configured; recommendations and audio are unavailable");
            Arc::new(MissingGenerator)
        }
    };

    let (events, _) = broadcast::channel(256);
    let state = AppState {
        api: ApiContext::with_generator(storage, generator),
        auth: AuthConfig {
            secret: settings.auth.jwt_secret,
            ttl_seconds: settings.auth.token_ttl_seconds,
        },
        audio_dir: PathBuf::from(settings.audio_dir),
        events,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let audio = ServeDir::new(&state.audio_dir);
    Router::new()
        .route("/healthz", get(healthz))
        .route("/login", post(login))
        .route("/profile", get(http_get_profile).put(http_save_profile))
        .route("/screening", get(http_get_screening))
        .route("/screening/risk-factors", put(http_save_risk_factors))
        .route("/screening/recommendations", post(http_recommendations))
        .route("/milestones", get(http_get_milestones).put(http_save_milestones))
        .route("/checklist", get(http_get_checklist).put(http_save_checklist))
        .route("/ling-test", get(http_get_ling_test).put(http_save_ling_test))
        .route("/infants", get(http_list_infants).post(http_add_infant))
        .route("/infants/:infant_id", get(http_get_infant))
        .route("/report", get(http_report))
        .route("/catalog", get(http_catalog))
        .route("/generate/audio", post(http_generate_audio))
        .route("/ws", get(ws_handler))
        .nest_service("/audio", audio)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ApiError) -> Rejection {
    (status_for(err.code), Json(err))
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn record_saved(state: &AppState, owner_id: OwnerId, collection: Collection) {
    let _ = state.events.send(ServerEvent::RecordSaved {
        owner_id,
        collection,
    });
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, Rejection> {
    state.api.storage.health_check().await.map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::internal(e.to_string())),
        )
    })?;
    Ok("ok")
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, Rejection> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(reject(ApiError::validation("username is required")));
    }

    let owner_id = state
        .api
        .storage
        .create_owner(username)
        .await
        .map_err(|e| reject(ApiError::internal(e.to_string())))?;
    let token = mint_token(&state.auth, owner_id, username)
        .map_err(|e| reject(ApiError::internal(e.to_string())))?;
    info!(owner_id = owner_id.0, "owner signed in");

    Ok(Json(LoginResponse { owner_id, token }))
}

async fn http_get_profile(
    State(state): State<Arc<AppState>>,
    AuthOwner(owner_id): AuthOwner,
) -> Result<Json<Option<InfantProfile>>, Rejection> {
    let profile = server_api::get_profile(&state.api, owner_id)
        .await
        .map_err(reject)?;
    Ok(Json(profile))
}

async fn http_save_profile(
    State(state): State<Arc<AppState>>,
    AuthOwner(owner_id): AuthOwner,
    Json(profile): Json<InfantProfile>,
) -> Result<Json<InfantProfile>, Rejection> {
    let profile = server_api::save_profile(&state.api, owner_id, profile, today())
        .await
        .map_err(reject)?;
    record_saved(&state, owner_id, Collection::Profiles);
    Ok(Json(profile))
}

async fn http_get_screening(
    State(state): State<Arc<AppState>>,
    AuthOwner(owner_id): AuthOwner,
) -> Result<Json<Option<ScreeningRecord>>, Rejection> {
    let record = server_api::get_screening(&state.api, owner_id)
        .await
        .map_err(reject)?;
    Ok(Json(record))
}

async fn http_save_risk_factors(
    State(state): State<Arc<AppState>>,
    AuthOwner(owner_id): AuthOwner,
    Json(req): Json<SaveRiskFactorsRequest>,
) -> Result<Json<ScreeningRecord>, Rejection> {
    let record = server_api::save_risk_factors(&state.api, owner_id, req.risk_factors)
        .await
        .map_err(reject)?;
    record_saved(&state, owner_id, Collection::Screenings);
    Ok(Json(record))
}

async fn http_recommendations(
    State(state): State<Arc<AppState>>,
    AuthOwner(owner_id): AuthOwner,
    Json(req): Json<RecommendationRequest>,
) -> Result<Json<RecommendationResponse>, Rejection> {
    let response =
        server_api::generate_recommendations(&state.api, owner_id, req.screening_status, today())
            .await
            .map_err(reject)?;
    record_saved(&state, owner_id, Collection::Screenings);
    Ok(Json(response))
}

async fn get_progress(
    state: &AppState,
    owner_id: OwnerId,
    collection: Collection,
) -> Result<Json<Option<MilestoneProgress>>, Rejection> {
    let progress = server_api::get_progress(&state.api, owner_id, collection)
        .await
        .map_err(reject)?;
    Ok(Json(progress))
}

async fn save_progress(
    state: &AppState,
    owner_id: OwnerId,
    collection: Collection,
    req: SaveProgressRequest,
) -> Result<Json<MilestoneProgress>, Rejection> {
    let progress = server_api::save_progress(&state.api, owner_id, collection, req.completed)
        .await
        .map_err(reject)?;
    record_saved(state, owner_id, collection);
    Ok(Json(progress))
}

async fn http_get_milestones(
    State(state): State<Arc<AppState>>,
    AuthOwner(owner_id): AuthOwner,
) -> Result<Json<Option<MilestoneProgress>>, Rejection> {
    get_progress(&state, owner_id, Collection::Milestones).await
}

async fn http_save_milestones(
    State(state): State<Arc<AppState>>,
    AuthOwner(owner_id): AuthOwner,
    Json(req): Json<SaveProgressRequest>,
) -> Result<Json<MilestoneProgress>, Rejection> {
    save_progress(&state, owner_id, Collection::Milestones, req).await
}

async fn http_get_checklist(
    State(state): State<Arc<AppState>>,
    AuthOwner(owner_id): AuthOwner,
) -> Result<Json<Option<MilestoneProgress>>, Rejection> {
    get_progress(&state, owner_id, Collection::Checklists).await
}

async fn http_save_checklist(
    State(state): State<Arc<AppState>>,
    AuthOwner(owner_id): AuthOwner,
    Json(req): Json<SaveProgressRequest>,
) -> Result<Json<MilestoneProgress>, Rejection> {
    save_progress(&state, owner_id, Collection::Checklists, req).await
}

async fn http_get_ling_test(
    State(state): State<Arc<AppState>>,
    AuthOwner(owner_id): AuthOwner,
) -> Result<Json<Option<LingTestRecord>>, Rejection> {
    let record = server_api::get_ling_test(&state.api, owner_id)
        .await
        .map_err(reject)?;
    Ok(Json(record))
}

async fn http_save_ling_test(
    State(state): State<Arc<AppState>>,
    AuthOwner(owner_id): AuthOwner,
    Json(req): Json<SaveLingTestRequest>,
) -> Result<Json<LingTestRecord>, Rejection> {
    let record = server_api::save_ling_test(&state.api, owner_id, req.observations)
        .await
        .map_err(reject)?;
    record_saved(&state, owner_id, Collection::LingTests);
    Ok(Json(record))
}

async fn http_list_infants(
    State(state): State<Arc<AppState>>,
    AuthOwner(owner_id): AuthOwner,
) -> Result<Json<Vec<Infant>>, Rejection> {
    let infants = server_api::list_infants(&state.api, owner_id)
        .await
        .map_err(reject)?;
    Ok(Json(infants))
}

async fn http_add_infant(
    State(state): State<Arc<AppState>>,
    AuthOwner(owner_id): AuthOwner,
    Json(req): Json<AddInfantRequest>,
) -> Result<(StatusCode, Json<Infant>), Rejection> {
    let infant = server_api::add_infant(&state.api, owner_id, &req.name)
        .await
        .map_err(reject)?;

    if let Ok(infants) = server_api::list_infants(&state.api, owner_id).await {
        let _ = state
            .events
            .send(ServerEvent::InfantsUpdated { owner_id, infants });
    }

    Ok((StatusCode::CREATED, Json(infant)))
}

async fn http_get_infant(
    State(state): State<Arc<AppState>>,
    AuthOwner(owner_id): AuthOwner,
    Path(infant_id): Path<i64>,
) -> Result<Json<Infant>, Rejection> {
    let infant = server_api::get_infant(&state.api, owner_id, InfantId(infant_id))
        .await
        .map_err(reject)?;
    Ok(Json(infant))
}

async fn http_report(
    State(state): State<Arc<AppState>>,
    AuthOwner(owner_id): AuthOwner,
) -> Result<Json<Report>, Rejection> {
    let report = server_api::build_report(&state.api, owner_id)
        .await
        .map_err(reject)?;
    Ok(Json(report))
}

async fn http_catalog(AuthOwner(_owner_id): AuthOwner) -> Json<CatalogPayload> {
    Json(server_api::catalog())
}

async fn http_generate_audio(
    State(state): State<Arc<AppState>>,
    AuthOwner(owner_id): AuthOwner,
    Json(req): Json<GenerateAudioRequest>,
) -> Result<Json<GenerateAudioResponse>, Rejection> {
    let media = server_api::generate_audio(&state.api, &req.prompt)
        .await
        .map_err(|e| {
            warn!(owner_id = owner_id.0, message = %e.message, "audio request failed");
            reject(e)
        })?;
    Ok(Json(GenerateAudioResponse { media }))
}

async fn ws_handler(
    State(state): State<Arc<AppState>>,
    WsOwner(owner_id): WsOwner,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket, owner_id))
}

async fn ws_connection(
    state: Arc<AppState>,
    socket: axum::extract::ws::WebSocket,
    owner_id: OwnerId,
) {
    use axum::extract::ws::Message;
    use futures::{SinkExt, StreamExt};

    let (mut sender, mut receiver) = socket.split();
    let mut events_rx = state.events.subscribe();

    let send_task = tokio::spawn(async move {
        loop {
            let event = match events_rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(owner_id = owner_id.0, skipped, "websocket subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if event.owner_id() != owner_id {
                continue;
            }
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
