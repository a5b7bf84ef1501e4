//! Web listing for the quotes store.
//!
//! Exposes an axum [`Router`] that renders quotes as HTML, backed by any
//! [`QuoteStore`]. Access is optionally gated by a single shared Basic-auth
//! credential pair.

pub mod auth;
pub mod error;
pub mod etag;
pub mod render;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::{Query, State},
  http::{HeaderMap, StatusCode, header},
  middleware,
  response::{IntoResponse, Response},
  routing::get,
};
use quotes_core::{
  quote::{QuoteFilter, RatedQuote},
  rank::rank_by_score,
  store::QuoteStore,
};
use quotes_store_sqlite::WebCredentials;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use etag::{compute_etag, matches_if_none_match};
use render::Listing;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `QUOTES_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:     String,
  #[serde(default = "default_port")]
  pub port:     u16,
  #[serde(default = "default_db_path")]
  pub db_path:  PathBuf,
  /// `user:password`; unset or without a `:` disables auth.
  #[serde(default)]
  pub web_auth: Option<String>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_db_path() -> PathBuf { PathBuf::from("quotes.db") }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: QuoteStore> {
  pub store:       Arc<S>,
  /// `None` serves every request without auth.
  pub credentials: Option<Arc<WebCredentials>>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the quote listing.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: QuoteStore + Clone + 'static,
{
  Router::new()
    .route("/", get(index::<S>))
    .route("/random", get(random::<S>))
    .fallback(not_found)
    .layer(middleware::from_fn_with_state(
      state.clone(),
      auth::require_auth::<S>,
    ))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// The request's query pairs in arrival order. A flag is on only when its
/// first value is the literal `true`.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct ListParams(Vec<(String, String)>);

impl ListParams {
  fn flag(&self, key: &str) -> bool {
    self
      .0
      .iter()
      .find(|(k, _)| k == key)
      .is_some_and(|(_, v)| v == "true")
  }

  fn all(&self) -> bool { self.flag("all") }

  fn votesort(&self) -> bool { self.flag("votesort") }

  fn filter(&self) -> QuoteFilter { QuoteFilter::from_filter_low(!self.all()) }
}

/// `GET /[?all=true][&votesort=true]`
async fn index<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
  headers: HeaderMap,
) -> Result<Response, Error>
where
  S: QuoteStore + Clone + 'static,
{
  let mut quotes = state
    .store
    .list_all(params.filter())
    .await
    .map_err(Error::store)?;

  if params.votesort() {
    rank_by_score(&mut quotes);
  }

  page(&state, &headers, &params, "Quotes", &quotes)
}

/// `GET /random[?all=true]`: one quote drawn uniformly at random.
async fn random<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
  headers: HeaderMap,
) -> Result<Response, Error>
where
  S: QuoteStore + Clone + 'static,
{
  let quote = state
    .store
    .random_quote(params.filter())
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound)?;

  page(&state, &headers, &params, "Random quote", &[quote])
}

async fn not_found() -> Error { Error::NotFound }

fn page<S>(
  state:   &AppState<S>,
  headers: &HeaderMap,
  params:  &ListParams,
  title:   &str,
  quotes:  &[RatedQuote],
) -> Result<Response, Error>
where
  S: QuoteStore,
{
  let total = state.store.count().map_err(Error::store)?;
  let body = render::render(&Listing {
    title,
    quotes,
    total,
    query: &params.0,
  })?;

  let etag = compute_etag(&body);
  if matches_if_none_match(headers, &etag) {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }

  Ok(
    (
      StatusCode::OK,
      [
        (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
        (header::ETAG, etag),
      ],
      body,
    )
      .into_response(),
  )
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use quotes_store_sqlite::QuoteDb;
  use tower::ServiceExt as _;

  async fn make_state(secret: Option<&str>) -> AppState<QuoteDb> {
    let db = QuoteDb::open_in_memory().await.unwrap();
    AppState {
      store:       Arc::new(db),
      credentials: secret
        .map(|s| WebCredentials::from_secret(s).unwrap().unwrap())
        .map(Arc::new),
    }
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn oneshot_raw(
    state:   AppState<QuoteDb>,
    uri:     &str,
    headers: Vec<(header::HeaderName, &str)>,
  ) -> Response {
    let mut builder = Request::builder().method("GET").uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = builder.body(Body::empty()).unwrap();
    router(state).oneshot(req).await.unwrap()
  }

  async fn body_string(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  /// Ada's quote sinks to -3, Bob's sits at 0, Cy's rises to +1.
  async fn seed(db: &QuoteDb) {
    let ada = db.add_quote("Ada", "ada-quote").await.unwrap();
    db.add_quote("Bob", "bob-quote").await.unwrap();
    let cy = db.add_quote("Cy", "cy-quote").await.unwrap();
    for voter in ["x", "y", "z"] {
      db.downvote(ada, voter).await.unwrap();
    }
    db.upvote(cy, "x").await.unwrap();
  }

  // ── Auth ─────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unauthenticated_requests_return_401() {
    let state = make_state(Some("user:secret")).await;
    let resp  = oneshot_raw(state.clone(), "/", vec![]).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

    let resp = oneshot_raw(state, "/nowhere", vec![]).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn wrong_password_returns_401() {
    let state = make_state(Some("user:secret")).await;
    let auth  = auth_header("user", "guess");
    let resp  = oneshot_raw(state, "/", vec![(header::AUTHORIZATION, auth.as_str())]).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn authenticated_listing_returns_html() {
    let state = make_state(Some("user:secret")).await;
    state.store.add_quote("Ada", "<ada> hi").await.unwrap();
    let auth  = auth_header("user", "secret");
    let resp  = oneshot_raw(state, "/", vec![(header::AUTHORIZATION, auth.as_str())]).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(ct.starts_with("text/html"), "Content-Type: {ct}");
    assert!(resp.headers().contains_key(header::ETAG));
    let html = body_string(resp).await;
    assert!(html.contains("&lt;ada&gt; hi"), "{html}");
  }

  // ── Listing ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn listing_hides_disliked_quotes_by_default() {
    let state = make_state(None).await;
    seed(&state.store).await;

    let html = body_string(oneshot_raw(state.clone(), "/", vec![]).await).await;
    assert!(!html.contains("ada-quote"), "{html}");
    assert!(html.contains("2 quotes (3 stored)."), "{html}");
    let cy  = html.find("cy-quote").unwrap();
    let bob = html.find("bob-quote").unwrap();
    assert!(cy < bob, "newest first");

    let html = body_string(oneshot_raw(state, "/?all=true", vec![]).await).await;
    assert!(html.contains("ada-quote"), "{html}");
    assert!(html.contains("3 quotes (3 stored)."), "{html}");
  }

  #[tokio::test]
  async fn votesort_orders_by_score() {
    let state = make_state(None).await;
    seed(&state.store).await;
    // Bob's older quote now outscores Cy's.
    state.store.upvote(quotes_core::quote::QuoteId(2), "x").await.unwrap();
    state.store.upvote(quotes_core::quote::QuoteId(2), "y").await.unwrap();

    let html = body_string(oneshot_raw(state, "/?votesort=true&all=true", vec![]).await).await;
    let bob = html.find("bob-quote").unwrap();
    let cy  = html.find("cy-quote").unwrap();
    let ada = html.find("ada-quote").unwrap();
    assert!(bob < cy && cy < ada, "{html}");
  }

  #[tokio::test]
  async fn header_links_carry_other_parameters() {
    let state = make_state(None).await;
    seed(&state.store).await;

    let html = body_string(oneshot_raw(state, "/?votesort=true&page=2", vec![]).await).await;
    assert!(html.contains(r#"href="/?all=true&amp;page=2&amp;votesort=true""#), "{html}");
    assert!(html.contains(r#"href="/?page=2&amp;votesort=true""#), "{html}");
  }

  #[tokio::test]
  async fn empty_store_renders_placeholder() {
    let state = make_state(None).await;
    let resp  = oneshot_raw(state, "/", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("There are no quotes yet"));
  }

  #[tokio::test]
  async fn matching_etag_returns_304() {
    let state = make_state(None).await;
    seed(&state.store).await;

    let first = oneshot_raw(state.clone(), "/", vec![]).await;
    let etag  = first.headers().get(header::ETAG).unwrap().to_str().unwrap().to_string();

    let resp = oneshot_raw(state.clone(), "/", vec![(header::IF_NONE_MATCH, etag.as_str())]).await;
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);

    state.store.add_quote("Dee", "dee-quote").await.unwrap();
    let resp = oneshot_raw(state, "/", vec![(header::IF_NONE_MATCH, etag.as_str())]).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  // ── Random ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn random_skips_disliked_quotes() {
    let state = make_state(None).await;
    let ada = state.store.add_quote("Ada", "ada-quote").await.unwrap();
    for voter in ["x", "y", "z"] {
      state.store.downvote(ada, voter).await.unwrap();
    }

    let resp = oneshot_raw(state.clone(), "/random", vec![]).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = oneshot_raw(state, "/random?all=true", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("ada-quote"));
  }

  // ── Errors ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unknown_path_returns_404() {
    let state = make_state(None).await;
    let resp  = oneshot_raw(state, "/quotes/1", vec![]).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn closed_engine_returns_500() {
    let state = make_state(None).await;
    state.store.close().await.unwrap();
    let resp = oneshot_raw(state, "/", vec![]).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
