use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::{json, Value};
use tracing::warn;
use utoipa::OpenApi;

use super::{
    dto::{EventLogDto, LogParams, LoginForm, SensorDisplayDto, SensorStatusDto},
    errors::AppError,
    views::{DashboardPage, LoginPage},
};
use crate::{
    app::{Dashboard, View},
    control::RelayCommand,
    event_log::LogEntry,
    panel::PanelHandles,
    snapshot_store::SyncState,
    telemetry::models::Relay,
};

/// Cookie carrying the opaque session id issued by `POST /login`.
pub const SESSION_COOKIE: &str = "dashboard_session";

fn session_id(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE).map(Cookie::value)
}

fn session_cookie(session: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build()
}

/// Panel of the viewer presenting the current session cookie.
async fn signed_in_panel(dashboard: &Dashboard, jar: &CookieJar) -> Result<PanelHandles, AppError> {
    let session = session_id(jar).ok_or(AppError::NotAuthenticated)?;
    dashboard
        .panel(session)
        .await
        .ok_or(AppError::NotAuthenticated)
}

/// Login form while signed out, the sensor panel once signed in.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Login form or dashboard page", body = String, content_type = "text/html"),
    ),
    tag = "pages"
)]
pub async fn index(
    State(dashboard): State<Arc<Dashboard>>,
    jar: CookieJar,
) -> Result<Html<String>, AppError> {
    let html = match dashboard.view(session_id(&jar)).await {
        View::Login { error } => LoginPage { error }.render()?,
        View::Panel { email } => {
            DashboardPage::new(&email, dashboard.event_log_enabled()).render()?
        }
    };
    Ok(Html(html))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Signed in, session cookie set, redirect to the dashboard"),
        (status = 401, description = "Rejected, login form with the error message", body = String, content_type = "text/html"),
    ),
    tag = "pages"
)]
pub async fn login(
    State(dashboard): State<Arc<Dashboard>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match dashboard.login(&form.email, &form.password).await {
        Ok(session) => Ok((jar.add(session_cookie(session)), Redirect::to("/")).into_response()),
        Err(e) => {
            let message = e.to_string();
            let html = LoginPage {
                error: Some(message.as_str()),
            }
            .render()?;
            Ok((StatusCode::UNAUTHORIZED, Html(html)).into_response())
        }
    }
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 303, description = "Session cookie cleared, redirect to the login form"),
    ),
    tag = "pages"
)]
pub async fn logout(
    State(dashboard): State<Arc<Dashboard>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    // Only the holder of the current session id can sign the user out.
    let session = session_id(&jar).map(str::to_owned);
    let jar = match session {
        Some(session) => {
            dashboard.logout(&session).await;
            jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
        }
        None => jar,
    };
    (jar, Redirect::to("/"))
}

/// Current snapshot of the sensor node, raw and as displayed.
#[utoipa::path(
    get,
    path = "/api/sensors",
    responses(
        (status = 200, description = "Snapshot and subscription state", body = SensorStatusDto),
        (status = 401, description = "Not signed in"),
    ),
    tag = "sensors"
)]
pub async fn get_sensors(
    State(dashboard): State<Arc<Dashboard>>,
    jar: CookieJar,
) -> Result<Json<SensorStatusDto>, AppError> {
    let panel = signed_in_panel(&dashboard, &jar).await?;
    let (sync, snapshot) = panel.store.view().await;
    Ok(Json(SensorStatusDto::new(sync, snapshot)))
}

/// Flip one relay. The write runs in the background and is never cancelled
/// once accepted; the new state arrives through the sensor subscription.
#[utoipa::path(
    post,
    path = "/api/relays/{relay}/toggle",
    params(
        ("relay" = Relay, Path, description = "Relay1, Relay2 or Relay3"),
    ),
    responses(
        (status = 202, description = "Write issued", body = RelayCommand),
        (status = 400, description = "Unknown relay"),
        (status = 401, description = "Not signed in"),
    ),
    tag = "relays"
)]
pub async fn toggle_relay(
    State(dashboard): State<Arc<Dashboard>>,
    jar: CookieJar,
    Path(relay): Path<Relay>,
) -> Result<(StatusCode, Json<RelayCommand>), AppError> {
    let panel = signed_in_panel(&dashboard, &jar).await?;
    let command = panel.issuer.command(relay).await;

    let issuer = panel.issuer;
    let pending = command.clone();
    tokio::spawn(async move {
        // Failures are already reported to the log and tracing by the issuer.
        if issuer.send(pending).await.is_err() {
            warn!(relay = %relay, "Relay write did not complete");
        }
    });

    Ok((StatusCode::ACCEPTED, Json(command)))
}

/// Event log entries after the first `since`, oldest first.
#[utoipa::path(
    get,
    path = "/api/log",
    params(
        ("since" = Option<usize>, Query, description = "Number of entries already seen"),
    ),
    responses(
        (status = 200, description = "Event log entries", body = EventLogDto),
        (status = 401, description = "Not signed in"),
    ),
    tag = "sensors"
)]
pub async fn get_log(
    State(dashboard): State<Arc<Dashboard>>,
    jar: CookieJar,
    Query(params): Query<LogParams>,
) -> Result<Json<EventLogDto>, AppError> {
    let panel = signed_in_panel(&dashboard, &jar).await?;
    let dto = match panel.log {
        Some(log) => {
            let (total, entries) = log.entries_since(params.since.unwrap_or(0)).await;
            EventLogDto {
                enabled: true,
                total,
                entries,
            }
        }
        None => EventLogDto {
            enabled: false,
            total: 0,
            entries: Vec::new(),
        },
    };
    Ok(Json(dto))
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "health"
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI document (served by api/mod.rs)
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(index, login, logout, get_sensors, toggle_relay, get_log, health),
    components(schemas(
        SensorStatusDto,
        SensorDisplayDto,
        SyncState,
        RelayCommand,
        Relay,
        EventLogDto,
        LogEntry,
        LoginForm
    )),
    tags(
        (name = "pages", description = "Login and dashboard pages"),
        (name = "sensors", description = "Live sensor snapshot and event log"),
        (name = "relays", description = "Relay commands"),
        (name = "health", description = "Liveness"),
    ),
    info(
        title = "Sensor Dashboard API",
        version = "0.1.0",
        description = "Realtime sensor panel and relay control backed by Firebase"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
