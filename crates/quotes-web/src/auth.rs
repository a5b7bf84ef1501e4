//! HTTP Basic-auth gate in front of every route.

use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use quotes_core::store::QuoteStore;
use quotes_store_sqlite::WebCredentials;

use crate::{AppState, error::Error};

/// Verify Basic credentials from request headers.
pub fn verify_auth(headers: &HeaderMap, creds: &WebCredentials) -> Result<(), Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let pair    = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = pair.split_once(':').ok_or(Error::Unauthorized)?;

  if creds.verify(username, password) {
    Ok(())
  } else {
    Err(Error::Unauthorized)
  }
}

/// Middleware: reject the request with 401 unless auth is disabled or the
/// presented credentials verify.
pub async fn require_auth<S>(
  State(state): State<AppState<S>>,
  req: Request,
  next: Next,
) -> Response
where
  S: QuoteStore + Clone + 'static,
{
  if let Some(creds) = state.credentials.as_deref()
    && let Err(e) = verify_auth(req.headers(), creds)
  {
    return e.into_response();
  }
  next.run(req).await
}
