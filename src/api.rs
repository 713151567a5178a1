//! REST API for the placement service.
//!
//! Exposes the placement engine over HTTP. Uses Axum as the web framework and
//! supports CORS.

use std::sync::OnceLock;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use stow_it_now::error::ValidationError;
use stow_it_now::model::{Container, PalletInstance, PalletType};
use stow_it_now::optimizer::{
    PlacementConfig, PlacementOutcome, place_with_config, place_with_progress, unplaced_reason,
    validate_input,
};
use stow_it_now::stats::{StatsSnapshot, StrategyReport, TypeSummary};

use crate::config::{ApiConfig, OptimizerConfig};

#[derive(Clone)]
struct ApiState {
    optimizer_config: OptimizerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>stow-it-now API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
</html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Container floor as sent by the client.
#[derive(Deserialize, Clone, Copy, ToSchema)]
#[schema(example = json!({ "length": 1203.2, "width": 235.0 }))]
pub struct ContainerRequest {
    pub length: f64,
    pub width: f64,
}

/// Request structure for the placement endpoints.
///
/// `allow_rotations` and `grid_step` override the service configuration for
/// this request only.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "container": { "length": 1203.2, "width": 235.0 },
        "pallets": [
            { "id": "A", "length": 110.0, "width": 110.0, "quantity": 12 },
            { "id": "B", "length": 100.0, "width": 125.0, "quantity": 8 }
        ],
        "clearance": 1.0
    })
)]
pub struct PlaceRequest {
    pub container: ContainerRequest,
    pub pallets: Vec<PalletType>,
    #[serde(default)]
    pub clearance: f64,
    #[serde(default)]
    #[schema(nullable = true)]
    pub allow_rotations: Option<bool>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub grid_step: Option<f64>,
}

/// A request that passed validation, with the effective configuration.
#[derive(Debug)]
struct ValidatedPlaceRequest {
    container: Container,
    pallets: Vec<PalletType>,
    clearance: f64,
    config: PlacementConfig,
}

impl ValidatedPlaceRequest {
    fn pallet_count(&self) -> usize {
        self.pallets.iter().map(|pallet| pallet.quantity).sum()
    }
}

impl PlaceRequest {
    fn into_validated(
        self,
        defaults: PlacementConfig,
    ) -> Result<ValidatedPlaceRequest, ValidationError> {
        let mut config = defaults;
        if let Some(allow_rotations) = self.allow_rotations {
            config.allow_rotation = allow_rotations;
        }
        if let Some(grid_step) = self.grid_step {
            config.grid_step = grid_step;
        }

        let container = Container {
            length: self.container.length,
            width: self.container.width,
        };
        validate_input(&self.pallets, &container, self.clearance, &config)?;

        Ok(ValidatedPlaceRequest {
            container,
            pallets: self.pallets,
            clearance: self.clearance,
            config,
        })
    }
}

/// Response structure with the winning layout.
#[derive(Serialize, ToSchema)]
pub struct PlaceResponse {
    pub placements: Vec<PlacedPallet>,
    pub unplaced: Vec<UnplacedPallet>,
    pub is_complete: bool,
    pub stats: StatsSnapshot,
}

/// Single placed pallet.
///
/// # Fields
/// * `x`, `y` - Lower-left corner on the container floor
/// * `length`, `width` - Footprint after rotation
/// * `rotated` - Whether length and width were swapped
#[derive(Serialize, ToSchema)]
pub struct PlacedPallet {
    pub type_id: String,
    pub instance_index: usize,
    pub x: f64,
    pub y: f64,
    pub length: f64,
    pub width: f64,
    pub rotated: bool,
    pub color: String,
}

impl From<&PalletInstance> for PlacedPallet {
    fn from(instance: &PalletInstance) -> Self {
        Self {
            type_id: instance.type_id.clone(),
            instance_index: instance.instance_index,
            x: instance.x,
            y: instance.y,
            length: instance.final_length,
            width: instance.final_width,
            rotated: instance.rotated,
            color: instance.color.clone(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct UnplacedPallet {
    pub type_id: String,
    pub instance_index: usize,
    pub length: f64,
    pub width: f64,
    pub reason_code: String,
    pub reason: String,
}

impl PlaceResponse {
    fn from_outcome(
        outcome: PlacementOutcome,
        container: &Container,
        config: &PlacementConfig,
    ) -> Self {
        let PlacementOutcome { placements, stats } = outcome;

        Self {
            placements: placements.placed().map(PlacedPallet::from).collect(),
            unplaced: placements
                .unplaced()
                .map(|instance| {
                    let reason = unplaced_reason(instance, container, config);
                    UnplacedPallet {
                        type_id: instance.type_id.clone(),
                        instance_index: instance.instance_index,
                        length: instance.length,
                        width: instance.width,
                        reason_code: reason.code().to_string(),
                        reason: reason.to_string(),
                    }
                })
                .collect(),
            is_complete: stats.is_complete(),
            stats,
        }
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn parse_place_request(
    payload: Result<Json<PlaceRequest>, JsonRejection>,
    defaults: PlacementConfig,
) -> Result<ValidatedPlaceRequest, Response> {
    let Json(payload) = payload.map_err(|err| {
        error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid JSON data",
            err.to_string(),
        )
    })?;

    payload.into_validated(defaults).map_err(|err| {
        error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid input data",
            err.to_string(),
        )
    })
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_place, handle_place_stream),
    components(
        schemas(
            PlaceRequest,
            ContainerRequest,
            PalletType,
            PlaceResponse,
            PlacedPallet,
            UnplacedPallet,
            StatsSnapshot,
            StrategyReport,
            TypeSummary,
            ErrorResponse
        )
    ),
    tags((name = "placement", description = "Endpoints for container floor placement"))
)]
struct ApiDoc;

/// Builds the router with all endpoints.
fn router(optimizer_config: OptimizerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/place", post(handle_place))
        .route("/place_stream", post(handle_place_stream))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(ApiState { optimizer_config })
}

/// Starts the API server.
///
/// Blocks until the server is terminated.
pub async fn start_api_server(config: ApiConfig, optimizer_config: OptimizerConfig) {
    let app = router(optimizer_config);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            log::error!("Could not bind API server to {}: {}", addr, err);
            return;
        }
    };

    println!(
        "🚀 Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        println!("💡 Local access: http://localhost:{}", config.port());
    }
    println!("📦 API Endpoints:");
    println!("   - POST /place");
    println!("   - POST /place_stream");
    println!("📑 Documentation:");
    println!("   - GET /docs");
    println!("   - GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        log::error!("API server terminated with an error: {err}");
    }
}

/// Handler for POST /place endpoint.
///
/// Runs all strategies on the requested pallets and returns the best layout.
/// The run executes on the blocking pool and is abandoned once the configured
/// time budget is exceeded.
#[utoipa::path(
    post,
    path = "/place",
    request_body = PlaceRequest,
    responses(
        (status = 200, description = "Best layout found", body = PlaceResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or configuration",
            body = ErrorResponse
        ),
        (
            status = SERVICE_UNAVAILABLE,
            description = "Placement exceeded the time budget",
            body = ErrorResponse
        )
    ),
    tag = "placement"
)]
async fn handle_place(
    State(state): State<ApiState>,
    payload: Result<Json<PlaceRequest>, JsonRejection>,
) -> Response {
    let request = match parse_place_request(payload, state.optimizer_config.placement_config()) {
        Ok(request) => request,
        Err(response) => return response,
    };

    println!(
        "📥 New place request: {} pallets in {} types, clearance {}",
        request.pallet_count(),
        request.pallets.len(),
        request.clearance
    );

    let ValidatedPlaceRequest {
        container,
        pallets,
        clearance,
        config,
    } = request;
    let budget = state.optimizer_config.time_budget();
    let run = tokio::task::spawn_blocking(move || {
        place_with_config(&pallets, container, clearance, config)
    });

    match tokio::time::timeout(budget, run).await {
        Ok(Ok(Ok(outcome))) if outcome.stats.timed_out => timeout_response(budget),
        Ok(Ok(Ok(outcome))) => {
            println!(
                "📦 Result: {}/{} pallets placed by {}, efficiency {:.1}%",
                outcome.stats.placed_pallets,
                outcome.stats.total_pallets,
                outcome.stats.winning_strategy.as_deref().unwrap_or("none"),
                outcome.stats.efficiency * 100.0
            );
            let response = PlaceResponse::from_outcome(outcome, &container, &config);
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(Ok(Err(err))) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid input data",
            err.to_string(),
        ),
        Ok(Err(err)) => {
            log::error!("Placement task failed: {}", err);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Placement failed",
                err.to_string(),
            )
        }
        Err(_) => timeout_response(budget),
    }
}

fn timeout_response(budget: Duration) -> Response {
    log::warn!("Placement exceeded the time budget of {:?}", budget);
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "Placement timed out",
        format!("No result within {} ms", budget.as_millis()),
    )
}

/// Handler for POST /place_stream endpoint (SSE).
///
/// Streams `PlaceEvent`s as Server-Sent Events while the strategies run.
#[utoipa::path(
    post,
    path = "/place_stream",
    request_body = PlaceRequest,
    responses(
        (
            status = 200,
            description = "Streams placement events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or configuration",
            body = ErrorResponse
        )
    ),
    tag = "placement"
)]
async fn handle_place_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PlaceRequest>, JsonRejection>,
) -> Response {
    let ValidatedPlaceRequest {
        container,
        pallets,
        clearance,
        config,
    } = match parse_place_request(payload, state.optimizer_config.placement_config()) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (tx, rx) = mpsc::channel::<String>(32);

    // The run itself is bounded by the configured time budget.
    tokio::task::spawn_blocking(move || {
        let result = place_with_progress(&pallets, container, clearance, config, |event| {
            if tx.is_closed() {
                return;
            }
            if let Ok(json) = serde_json::to_string(event) {
                if tx.blocking_send(json).is_err() {
                    log::debug!("Stream client disconnected, remaining events are dropped");
                }
            }
        });
        if let Err(err) = result {
            log::warn!("Streamed placement rejected: {}", err);
        }
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
