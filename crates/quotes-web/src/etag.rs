//! ETag computation for rendered pages.

use axum::http::{HeaderMap, header};
use sha2::{Digest, Sha256};

/// Quoted SHA-256 hex of the page body.
pub fn compute_etag(body: &[u8]) -> String {
  let hash = Sha256::digest(body);
  format!("\"{}\"", hex::encode(hash))
}

/// `true` if `If-None-Match` lists `etag` (quoted or bare) or `*`.
pub fn matches_if_none_match(headers: &HeaderMap, etag: &str) -> bool {
  let Some(value) = headers
    .get(header::IF_NONE_MATCH)
    .and_then(|v| v.to_str().ok())
  else {
    return false;
  };
  let bare = etag.trim_matches('"');
  value.split(',').map(str::trim).any(|candidate| {
    candidate == "*"
      || candidate.trim_start_matches("W/").trim_matches('"') == bare
  })
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  #[test]
  fn etag_is_stable_and_quoted() {
    let a = compute_etag(b"<html></html>");
    assert_eq!(a, compute_etag(b"<html></html>"));
    assert_ne!(a, compute_etag(b"<html> </html>"));
    assert!(a.starts_with('"') && a.ends_with('"'));
  }

  #[test]
  fn if_none_match_forms() {
    let etag = compute_etag(b"page");
    let bare = etag.trim_matches('"').to_string();
    for value in [etag.clone(), bare.clone(), format!("W/{etag}"), format!("\"x\", {etag}"), "*".into()] {
      let mut h = HeaderMap::new();
      h.insert(header::IF_NONE_MATCH, HeaderValue::from_str(&value).unwrap());
      assert!(matches_if_none_match(&h, &etag), "{value}");
    }

    let mut h = HeaderMap::new();
    h.insert(header::IF_NONE_MATCH, HeaderValue::from_static("\"stale\""));
    assert!(!matches_if_none_match(&h, &etag));
    assert!(!matches_if_none_match(&HeaderMap::new(), &etag));
  }
}
