//! Application setup and HTTP surface.
//!
//! Three endpoints: `/api/run` dispatches one named action synchronously,
//! `/api/worker` performs a single worker step (claim + execute + record)
//! for external trigger mechanisms like cron, `/health` answers liveness.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domains::daily::{run_daily, set_daily_target};
use crate::domains::leads::{run_enrich, run_scrape, ScrapeParams};
use crate::domains::outreach::{
    add_template, delete_template, ensure_templates, run_send, set_default_template,
};
use crate::domains::status::{get_history, get_status};
use crate::domains::websites::{run_generate, GenerateParams};
use crate::error::StageError;
use crate::jobs::{process_next_job, JobQueue, JobType};
use crate::kernel::PipelineDeps;

#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<PipelineDeps>,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub action: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Deserialize)]
pub struct WorkerQuery {
    pub token: Option<String>,
}

pub fn build_app(deps: Arc<PipelineDeps>) -> Router {
    let state = AppState { deps };

    Router::new()
        .route("/api/run", post(run_handler))
        .route("/api/worker", post(worker_handler).get(worker_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// One worker step. Guarded by `WORKER_TOKEN` when configured, so only the
/// scheduler (or an operator holding the token) can drive the queue.
async fn worker_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WorkerQuery>,
) -> impl IntoResponse {
    if let Some(expected) = &state.deps.config.worker_token {
        let supplied = headers
            .get("x-worker-token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or(query.token);
        if supplied.as_deref() != Some(expected.as_str()) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "ok": false, "error": "unauthorized" })),
            );
        }
    }

    match process_next_job(&state.deps).await {
        Ok(outcome) => match serde_json::to_value(&outcome) {
            Ok(body) => (StatusCode::OK, Json(body)),
            Err(e) => internal_error(e.to_string()),
        },
        Err(e) => internal_error(e.to_string()),
    }
}

async fn run_handler(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> impl IntoResponse {
    let deps = &state.deps;
    let result = dispatch_action(deps, &request.action, request.params).await;
    match result {
        Ok(result) => (StatusCode::OK, Json(json!({ "ok": true, "result": result }))),
        Err(ActionError::Unknown) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "unknown_action" })),
        ),
        Err(ActionError::Stage(e)) => internal_error(e.to_string()),
        Err(ActionError::Other(e)) => internal_error(e.to_string()),
    }
}

enum ActionError {
    Unknown,
    Stage(StageError),
    Other(anyhow::Error),
}

impl From<StageError> for ActionError {
    fn from(e: StageError) -> Self {
        ActionError::Stage(e)
    }
}

impl From<anyhow::Error> for ActionError {
    fn from(e: anyhow::Error) -> Self {
        ActionError::Other(e)
    }
}

async fn dispatch_action(
    deps: &Arc<PipelineDeps>,
    action: &str,
    params: Value,
) -> Result<Value, ActionError> {
    let result = match action {
        "check" => serde_json::to_value(Config::check()),
        "status" => serde_json::to_value(get_status(deps).await?),
        "history" => {
            let limit = params
                .get("limitPerFile")
                .and_then(Value::as_u64)
                .unwrap_or(20) as usize;
            serde_json::to_value(get_history(deps, limit).await?)
        }
        "scrape" => {
            let params: ScrapeParams = parse(params)?;
            serde_json::to_value(run_scrape(deps, params).await?)
        }
        "enrich" => {
            let leads_file = required_str(&params, "leadsFile")?;
            serde_json::to_value(run_enrich(deps, &leads_file).await?)
        }
        "generate-site" => {
            let params: GenerateParams = parse(params)?;
            serde_json::to_value(run_generate(deps, params).await?)
        }
        "send" => {
            let leads_file = required_str(&params, "leadsFile")?;
            serde_json::to_value(run_send(deps, &leads_file).await?)
        }
        "template-list" => serde_json::to_value(ensure_templates(&deps.local).await?),
        "template-add" => {
            let name = required_str(&params, "name")?;
            let subject = required_str(&params, "subject")?;
            let body = required_str(&params, "body")?;
            add_template(&deps.local, &name, &subject, &body).await?;
            Ok(json!({ "ok": true }))
        }
        "template-default" => {
            let name = required_str(&params, "name")?;
            set_default_template(&deps.local, &name).await?;
            Ok(json!({ "ok": true }))
        }
        "template-delete" => {
            let name = required_str(&params, "name")?;
            delete_template(&deps.local, &name).await?;
            Ok(json!({ "ok": true }))
        }
        "daily-set" => {
            let query = required_str(&params, "query")?;
            let location = required_str(&params, "location")?;
            serde_json::to_value(set_daily_target(deps, &query, &location).await?)
        }
        "daily-run" => serde_json::to_value(run_daily(deps).await?),
        "job-create" => {
            let job_type: JobType = required_str(&params, "type")?
                .parse()
                .map_err(|t: String| StageError::UnknownJobType(t))?;
            let payload = params.get("payload").cloned().unwrap_or(json!({}));
            let queue = JobQueue::new(deps.store.clone());
            serde_json::to_value(queue.create(job_type, payload).await.map_err(ActionError::Other)?)
        }
        "job-get" => {
            let id = required_str(&params, "id")?;
            let id = id
                .parse()
                .map_err(|_| StageError::Other(anyhow::anyhow!("invalid job id")))?;
            let queue = JobQueue::new(deps.store.clone());
            serde_json::to_value(queue.get(id).await.map_err(ActionError::Other)?)
        }
        "job-list" => {
            let limit = params.get("limit").and_then(Value::as_u64).unwrap_or(25) as usize;
            let queue = JobQueue::new(deps.store.clone());
            serde_json::to_value(queue.list(limit).await.map_err(ActionError::Other)?)
        }
        _ => return Err(ActionError::Unknown),
    };
    result.map_err(|e| ActionError::Other(e.into()))
}

fn parse<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, ActionError> {
    serde_json::from_value(params)
        .map_err(|e| ActionError::Other(anyhow::anyhow!("invalid params: {e}")))
}

fn required_str(params: &Value, key: &str) -> Result<String, ActionError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ActionError::Other(anyhow::anyhow!("params missing {key}")))
}

fn internal_error(message: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "ok": false, "error": message })),
    )
}
