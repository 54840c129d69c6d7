//! Share links: a snapshot packed into the `data` query parameter of the application's URL.
//!
//! The payload is the snapshot JSON encoded with standard, padded base64. It is percent-encoded
//! when placed in the query so that `+`, `/` and `=` survive URL parsers. Links produced without
//! percent-encoding, where a parser has already turned `+` into a space, are still accepted.

use crate::snapshot::{stage_json, PendingImport, Snapshot, SnapshotError};
use crate::Result;
use anyhow::Context;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use url::Url;

/// The query parameter that carries the payload.
pub const DATA_PARAM: &str = "data";

/// Base64 of the snapshot's JSON text.
pub fn encode(snapshot: &Snapshot) -> Result<String> {
    Ok(STANDARD.encode(snapshot.to_json()?))
}

/// Builds `<base_url>?data=<payload>`, keeping any query parameters already on `base_url`.
pub fn link(base_url: &str, snapshot: &Snapshot) -> Result<Url> {
    let mut url =
        Url::parse(base_url).with_context(|| format!("Invalid share base URL '{base_url}'"))?;
    let payload = encode(snapshot)?;
    url.query_pairs_mut().append_pair(DATA_PARAM, &payload);
    Ok(url)
}

/// Decodes a base64 payload and stages the snapshot inside it.
pub fn decode(payload: &str) -> std::result::Result<PendingImport, SnapshotError> {
    // Base64 never contains spaces; a space here is a `+` that a URL parser decoded.
    let repaired = payload.trim().replace(' ', "+");
    let bytes = STANDARD.decode(repaired)?;
    let text = String::from_utf8(bytes)?;
    stage_json(&text)
}

/// The decoded value of the `data` parameter, if present.
pub fn data_param(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(name, _)| name == DATA_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// Stages the snapshot carried by `link`. Returns `Ok(None)` when the link has no `data`
/// parameter, which is the normal case for an ordinary visit.
pub fn stage_link(link: &str) -> std::result::Result<Option<PendingImport>, SnapshotError> {
    let url = Url::parse(link.trim())?;
    match data_param(&url) {
        None => Ok(None),
        Some(payload) => decode(&payload).map(Some),
    }
}

/// Returns `url` without its `data` parameter, keeping every other parameter. This is the address
/// to show once an import has been handled, so that revisiting it does not offer the import again.
pub fn strip_data_param(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| name != DATA_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    let mut stripped = url.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }
    stripped
}
