//! Asset Resolution
//!
//! Terminal success payloads are provider-specific bags; this module turns
//! them into one canonical `{ asset_url, thumbnail_url }` reference through
//! an ordered fallback chain. A succeeded job whose payload yields no
//! recognizable URL is a distinct failure, never silently treated as
//! success.

use serde_json::Value;
use url::Url;

use crate::types::{RelayError, ResolvedAsset, Result, ResultPayload};

/// Asset URL fields, most specific first: the binary model URL before the
/// generic source-file URL, then the skybox image
const ASSET_FIELDS: [&[&str]; 3] = [&["model_urls", "glb"], &["model_url"], &["file_url"]];

/// Thumbnail fields per provider shape
const THUMBNAIL_FIELDS: [&[&str]; 2] = [&["thumbnail_url"], &["thumb_url"]];

/// Extract the canonical asset reference from a success payload.
///
/// Fails with [`RelayError::NoAssetUrl`] when no known field holds a
/// usable URL.
pub fn resolve(payload: &ResultPayload) -> Result<ResolvedAsset> {
    let body = payload.as_value();

    let asset_url = first_url(body, &ASSET_FIELDS).ok_or(RelayError::NoAssetUrl)?;
    let thumbnail_url = first_url(body, &THUMBNAIL_FIELDS);

    Ok(ResolvedAsset {
        asset_url,
        thumbnail_url,
    })
}

/// Walk the candidate field paths in order, returning the first value that
/// parses as an absolute URL. Present-but-malformed fields are skipped so a
/// later fallback can still win.
fn first_url(body: &Value, candidates: &[&[&str]]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|path| lookup(body, path))
        .find(|value| Url::parse(value).is_ok())
        .map(str::to_string)
}

fn lookup<'a>(body: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut value = body;
    for segment in path {
        value = value.get(segment)?;
    }
    value.as_str().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primary_field_wins() {
        let payload = ResultPayload::new(json!({
            "model_urls": {"glb": "https://cdn.example/T1.glb"},
            "model_url": "https://cdn.example/T1-generic.bin",
            "thumbnail_url": "https://cdn.example/T1.png"
        }));

        let asset = resolve(&payload).unwrap();
        assert_eq!(asset.asset_url, "https://cdn.example/T1.glb");
        assert_eq!(
            asset.thumbnail_url.as_deref(),
            Some("https://cdn.example/T1.png")
        );
    }

    #[test]
    fn test_fallback_to_secondary_field() {
        let payload = ResultPayload::new(json!({
            "model_url": "https://cdn.example/T1.glb"
        }));

        let asset = resolve(&payload).unwrap();
        assert_eq!(asset.asset_url, "https://cdn.example/T1.glb");
        assert_eq!(asset.thumbnail_url, None);
    }

    #[test]
    fn test_skybox_shape() {
        let payload = ResultPayload::new(json!({
            "file_url": "https://cdn.example/sky.jpg",
            "thumb_url": "https://cdn.example/sky-small.jpg"
        }));

        let asset = resolve(&payload).unwrap();
        assert_eq!(asset.asset_url, "https://cdn.example/sky.jpg");
        assert_eq!(
            asset.thumbnail_url.as_deref(),
            Some("https://cdn.example/sky-small.jpg")
        );
    }

    #[test]
    fn test_no_known_field_is_a_distinct_failure() {
        let payload = ResultPayload::new(json!({"status": "SUCCEEDED"}));
        assert!(matches!(resolve(&payload), Err(RelayError::NoAssetUrl)));
    }

    #[test]
    fn test_malformed_primary_skipped_for_valid_fallback() {
        let payload = ResultPayload::new(json!({
            "model_urls": {"glb": "not a url"},
            "model_url": "https://cdn.example/T1.glb"
        }));

        let asset = resolve(&payload).unwrap();
        assert_eq!(asset.asset_url, "https://cdn.example/T1.glb");
    }

    #[test]
    fn test_empty_fields_do_not_resolve() {
        let payload = ResultPayload::new(json!({"model_url": ""}));
        assert!(matches!(resolve(&payload), Err(RelayError::NoAssetUrl)));
    }
}
