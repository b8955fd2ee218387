//! HTTP surface of the booking site's dynamic features.
//!
//! - POST /translate            - translate a page's text fragments
//! - POST /save-original-texts  - record a page's source-language fragments
//! - POST /chatbot              - one dialogue turn
//! - GET  /set-language/{lang}  - remember the visitor's page language
//! - GET  /get-language         - read it back
//! - GET  /quote?age=N          - per-ticket payment quote
//! - GET  /health, /metrics

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::metrics::metric_names;
use crate::pricing::{self, TicketQuote};
use crate::translate::Language;
use crate::AppContext;

/// Name of the cookie carrying the visitor's page language.
pub const LANG_COOKIE: &str = "lang";
const LANG_COOKIE_MAX_AGE_SECS: u64 = 31 * 24 * 3600;

/// Tells the dialogue engine whether the requester is signed in.
pub trait SessionProbe: Send + Sync {
    fn is_logged_in(&self, headers: &HeaderMap) -> bool;
}

/// Accounts live outside this service; every visitor counts as anonymous.
pub struct AnonymousSession;

impl SessionProbe for AnonymousSession {
    fn is_logged_in(&self, _headers: &HeaderMap) -> bool {
        false
    }
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    status: StatusCode,
    pub error: String,
}

impl ErrorResponse {
    fn bad_request(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: error.into(),
        }
    }
}

impl From<JsonRejection> for ErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ErrorResponse {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub texts: Vec<String>,
    pub lang: Option<String>,
    pub page_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveOriginalsRequest {
    pub page_url: String,
    #[serde(default)]
    pub texts: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub age: u32,
    #[serde(default)]
    pub student: bool,
    /// Stored ticket id; adds its `MUS24NNNN` reference to the quote.
    pub ticket_id: Option<u32>,
}

/// Build the router with CORS and request tracing applied.
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/translate", post(translate))
        .route("/save-original-texts", post(save_original_texts))
        .route("/chatbot", post(chatbot))
        .route("/set-language/{lang}", get(set_language))
        .route("/get-language", get(get_language))
        .route("/quote", get(quote))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                info_span!(
                    "http",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %Uuid::new_v4(),
                )
            }),
        )
        .with_state(ctx)
}

async fn translate(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let Json(req) = payload?;
    let lang_code = req.lang.as_deref().unwrap_or(Language::SOURCE.code());
    let page_id = req
        .page_url
        .or_else(|| {
            headers
                .get(header::REFERER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "/".to_string());

    let target: Language = match lang_code.parse() {
        Ok(lang) => lang,
        Err(e) => {
            warn!(lang = lang_code, page_id, "translate request for unknown language");
            let body = TranslateResponse {
                translations: req.texts,
                error: Some(e.to_string()),
            };
            return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
        }
    };

    match ctx.translator.translate_batch(&req.texts, target, &page_id).await {
        Ok(translations) => {
            debug!(page_id, lang = %target, items = translations.len(), "translate request served");
            Ok(Json(TranslateResponse {
                translations,
                error: None,
            })
            .into_response())
        }
        Err(e) => {
            error!(error = %e, page_id, lang = %target, "translate request failed");
            let body = TranslateResponse {
                translations: req.texts,
                error: Some(e.to_string()),
            };
            Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
        }
    }
}

async fn save_original_texts(
    State(ctx): State<AppContext>,
    payload: Result<Json<SaveOriginalsRequest>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let Json(req) = payload?;
    match ctx.translator.originals().save(&req.page_url, &req.texts) {
        Ok(created) => Ok(Json(serde_json::json!({
            "status": "success",
            "created": created,
        }))
        .into_response()),
        Err(e) => {
            error!(error = %e, page_id = %req.page_url, "saving original texts failed");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "status": "error", "error": e.to_string() })),
            )
                .into_response())
        }
    }
}

async fn chatbot(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let Json(req) = payload?;
    ctx.metrics.incr(metric_names::CHAT_MESSAGE, 1);
    let logged_in = ctx.session.is_logged_in(&headers);
    let reply = ctx.chatbot.respond(&req.message, logged_in);
    Ok(Json(reply).into_response())
}

async fn set_language(Path(lang): Path<String>) -> Response {
    let known = lang.parse::<Language>().ok();
    let mut response = Json(serde_json::json!({
        "status": "success",
        "language": lang,
    }))
    .into_response();

    if let Some(lang) = known {
        let cookie = format!(
            "{LANG_COOKIE}={}; Path=/; Max-Age={LANG_COOKIE_MAX_AGE_SECS}; SameSite=Lax",
            lang.code()
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().insert(header::SET_COOKIE, value);
                info!(lang = %lang, "page language selected");
            }
            Err(e) => warn!(error = %e, "language cookie not set"),
        }
    }
    response
}

async fn get_language(headers: HeaderMap) -> Json<serde_json::Value> {
    let language = lang_from_cookies(&headers).unwrap_or(Language::SOURCE);
    Json(serde_json::json!({ "language": language.code() }))
}

async fn quote(
    params: Result<Query<QuoteParams>, QueryRejection>,
) -> Result<Json<TicketQuote>, ErrorResponse> {
    let Query(params) = params?;
    let quote = pricing::quote(params.age, params.student);
    Ok(Json(match params.ticket_id {
        Some(id) => quote.for_ticket(id),
        None => quote,
    }))
}

async fn health() -> &'static str {
    "OK"
}

async fn metrics(State(ctx): State<AppContext>) -> Response {
    Json(ctx.metrics.summary()).into_response()
}

/// Language named by the `lang` cookie, if present and known.
fn lang_from_cookies(headers: &HeaderMap) -> Option<Language> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == LANG_COOKIE)
        .and_then(|(_, value)| value.parse().ok())
}

pub fn anonymous_sessions() -> Arc<dyn SessionProbe> {
    Arc::new(AnonymousSession)
}
