use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Extension, Form, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{
        Html, IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::stream::{self, PollNext};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::channel::{self, HttpValidator};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::security::{UserContext, auth_middleware};
use crate::session::{InnSession, SessionStore};
use crate::ui;

/// How often idle sessions are swept.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let validator = HttpValidator::new(
        &config.validator.url,
        Duration::from_secs(config.validator.timeout_secs),
    )?;

    info!(
        name: "validator.config.loaded",
        endpoint = %validator.endpoint(),
        capacity = config.list.capacity,
        "Validation service configured"
    );

    let state = AppState {
        sessions: SessionStore::with_capacity(config.list.capacity),
        validator: Arc::new(validator),
        config: Arc::clone(&config),
    };

    spawn_session_sweeper(
        state.sessions.clone(),
        Duration::from_secs(config.server.session_timeout_secs),
    );

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    let sessions = Router::new()
        .route("/", get(index_handler))
        .route("/sessions/{id}", axum::routing::delete(delete_session))
        .route("/sessions/{id}/inn-check", post(submit_check))
        .route("/sessions/{id}/helper", post(fill_helper))
        .route("/sessions/{id}/form", get(get_form))
        .route("/sessions/{id}/list", get(get_list))
        .route("/sessions/{id}/stream", get(stream_session))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(sessions)
        .route("/health", get(|| async { "ok" }))
        .nest_service("/static", ServeDir::new("static"))
        .layer(axum::middleware::from_fn(move |req: Request, next: Next| {
            async move {
                match tokio::time::timeout(timeout, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            }
        }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn spawn_session_sweeper(sessions: SessionStore, timeout: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = sessions.cleanup_expired_with_timeout(timeout);
            if removed > 0 {
                info!(name: "session.expired", removed, "Expired sessions removed");
            }
        }
    });
}

fn lookup(state: &AppState, id: &str) -> Result<InnSession> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| Error::SessionNotFound(id.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct IndexQuery {
    #[serde(default)]
    token: Option<String>,
}

/// GET / - Open a new session and render the page.
async fn index_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Query(query): Query<IndexQuery>,
) -> Html<String> {
    let session = state.sessions.create();
    info!(
        name: "session.created",
        session_id = %session.id(),
        user_id = ?user.user_id,
        "Session created"
    );

    let content = ui::index_content(
        session.id(),
        &session.form_html(),
        &session.list_html(),
        query.token.as_deref(),
    );
    Html(ui::html_shell("Проверка ИНН", &content))
}

#[derive(Debug, Deserialize)]
struct SubmitForm {
    #[serde(default)]
    inn: String,
}

/// POST /sessions/:id/inn-check - Submit the form.
///
/// Valid lengths spawn the check and return the form with submit disabled;
/// the re-enabled form and the list arrive later over the stream.
async fn submit_check(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(user): Extension<UserContext>,
    Form(form): Form<SubmitForm>,
) -> Result<Html<String>> {
    let session = lookup(&state, &id)?;
    let request = session.with_form(|f| f.submit(form.inn.trim()));

    if let Some(request) = request {
        info!(
            name: "inn.check.accepted",
            session_id = %session.id(),
            user_id = ?user.user_id,
            "Check accepted"
        );
        let validator = Arc::clone(&state.validator);
        let session = session.clone();
        tokio::spawn(async move {
            channel::run_check(validator.as_ref(), session, request).await;
        });
    }

    Ok(Html(session.form_html()))
}

#[derive(Debug, Deserialize)]
struct HelperForm {
    value: String,
}

/// POST /sessions/:id/helper - Fill the input from an example.
async fn fill_helper(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<HelperForm>,
) -> Result<Html<String>> {
    let session = lookup(&state, &id)?;
    session.with_form(|f| f.fill_from_helper(&form.value));
    Ok(Html(session.form_html()))
}

/// GET /sessions/:id/form - Current form fragment.
async fn get_form(State(state): State<AppState>, Path(id): Path<String>) -> Result<Html<String>> {
    Ok(Html(lookup(&state, &id)?.form_html()))
}

/// GET /sessions/:id/list - Current list fragment.
async fn get_list(State(state): State<AppState>, Path(id): Path<String>) -> Result<Html<String>> {
    Ok(Html(lookup(&state, &id)?.list_html()))
}

/// DELETE /sessions/:id - Drop a session.
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state
        .sessions
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(Error::SessionNotFound(id))
}

/// GET /sessions/:id/stream - Live list and form renders.
async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>> + Send>> {
    let session = lookup(&state, &id)?;
    Ok(build_sse_response(session_events(session)))
}

/// Merge the session's list and form renders into named SSE events.
///
/// A reply publishes the list before the form; when both are pending the list
/// is polled first so the browser sees them in that order.
fn session_events(session: InnSession) -> impl Stream<Item = Event> + Send + 'static {
    let list = BroadcastStream::new(session.subscribe_list()).map(|r| ("list", r));
    let form = BroadcastStream::new(session.subscribe_form()).map(|r| ("form", r));

    stream::select_with_strategy(list, form, |_: &mut ()| PollNext::Left).filter_map(
        |(name, render)| async move {
            match render {
                Ok(html) => Some(Event::default().event(name).data(html)),
                Err(e) => {
                    // Lagged: the next render carries the full state anyway.
                    tracing::debug!(
                        name: "session.stream.lagged",
                        event = name,
                        error = %e,
                        "Stream lagged"
                    );
                    None
                }
            }
        },
    )
}

fn build_sse_response<S>(
    stream: S,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>> + Send>
where
    S: Stream<Item = Event> + Send + 'static,
{
    Sse::new(stream.map(Ok)).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
