//! Request handlers

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use sidekick_core::{build_goal, new_session_id, AgentRun, TaskRequest};
use sidekick_github::listing_failure;
use tracing::{info, warn};
use url::Url;

use crate::{AppState, Result, ServerError};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    token: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AgentRequest {
    session_id: String,
    goal: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskRunRequest {
    session_id: String,
    repo: String,
    task: TaskRequest,
    /// Enforce the branch/edit/PR order; defaults on for feature and debug
    #[serde(default)]
    guarded: Option<bool>,
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /login
pub async fn login(State(state): State<AppState>) -> Result<Redirect> {
    let url = state.oauth.authorize_url()?;
    Ok(Redirect::temporary(url.as_str()))
}

/// GET /callback?code=...
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    let code = params
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest("Missing OAuth code.".to_string()))?;

    let token = state.oauth.exchange_code(&code).await?;

    let session_id = new_session_id();
    state.sessions.set(&session_id, Some(token));
    info!("Session created from OAuth login");

    Ok(Redirect::temporary(&frontend_redirect(
        &state.frontend_url,
        &session_id,
    )))
}

/// POST /session {token}
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<Value>> {
    let token = request.token.trim();
    if token.is_empty() {
        return Err(ServerError::BadRequest("Token must not be empty.".to_string()));
    }

    let session_id = new_session_id();
    state.sessions.set(&session_id, Some(token.to_string()));
    info!("Session created from submitted token");

    Ok(Json(json!({ "status": "success", "session_id": session_id })))
}

/// POST /logout {session_id}
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> Json<Value> {
    if state.sessions.remove(&request.session_id) {
        Json(json!({ "status": "success", "message": "Logged out successfully." }))
    } else {
        Json(json!({ "status": "error", "message": "Session not found." }))
    }
}

/// POST /user/repos {session_id}
pub async fn user_repos(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> Result<Json<Value>> {
    let token = state.sessions.resolve(&request.session_id)?;
    let repos = state.runner.list_repositories(&token).await;

    if let Some(error) = listing_failure(&repos) {
        warn!(error, "Repository listing failed");
        return Err(ServerError::Upstream(error.to_string()));
    }

    Ok(Json(json!({ "status": "success", "repos": repos })))
}

/// POST /run-agent {session_id, goal}
pub async fn run_agent(
    State(state): State<AppState>,
    Json(request): Json<AgentRequest>,
) -> Result<Json<Value>> {
    let token = state.sessions.resolve(&request.session_id)?;
    if request.goal.trim().is_empty() {
        return Err(ServerError::BadRequest("Goal must not be empty.".to_string()));
    }

    let run = state.runner.run(&token, &request.goal, false).await?;
    Ok(Json(run_response(&run)))
}

/// POST /run-task {session_id, repo, task, guarded?}
pub async fn run_task(
    State(state): State<AppState>,
    Json(request): Json<TaskRunRequest>,
) -> Result<Json<Value>> {
    let token = state.sessions.resolve(&request.session_id)?;
    let goal = build_goal(&request.repo, &request.task)?;
    let guarded = request
        .guarded
        .unwrap_or_else(|| request.task.kind().is_procedural());

    info!(kind = %request.task.kind(), repo = %request.repo, guarded, "Running task");
    let run = state.runner.run(&token, &goal, guarded).await?;
    Ok(Json(run_response(&run)))
}

fn run_response(run: &AgentRun) -> Value {
    json!({
        "status": "success",
        "result": {
            "output": run.output,
            "logs": run.logs(),
            "completed": run.completed,
        }
    })
}

fn frontend_redirect(frontend_url: &str, session_id: &str) -> String {
    match Url::parse(frontend_url) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("session_id", session_id);
            url.to_string()
        }
        Err(_) => format!("{}?session_id={}", frontend_url, session_id),
    }
}
