//! Manifest retrieval
//!
//! The manifest is a flat JSON array of file names, fetched once per run.
//! An empty array decodes fine here; deciding that it is an error belongs to
//! the caller.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::downloader::core::{DownloadError, HttpClient, Result};

/// Fetch and decode the manifest at `url`
pub async fn fetch_manifest(
    client: &HttpClient,
    url: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Vec<String>> {
    debug!("Fetching manifest from {}", url);

    let request = async {
        let response = client
            .inner()
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| manifest_download_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::ManifestDownload {
                url: url.to_string(),
                status: Some(status.as_u16()),
                source: None,
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| manifest_download_error(url, e))
    };

    let body = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
        body = request => body?,
    };

    let items = parse_manifest(url, &body)?;
    info!("Manifest lists {} item(s)", items.len());
    Ok(items)
}

/// Decode a manifest body as a list of names, order preserved
pub fn parse_manifest(url: &str, body: &[u8]) -> Result<Vec<String>> {
    serde_json::from_slice::<Vec<String>>(body).map_err(|source| DownloadError::ManifestParse {
        url: url.to_string(),
        source,
    })
}

fn manifest_download_error(url: &str, source: reqwest::Error) -> DownloadError {
    DownloadError::ManifestDownload {
        url: url.to_string(),
        status: source.status().map(|s| s.as_u16()),
        source: Some(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::core::ErrorKind;

    const URL: &str = "https://example.com/mods.json";

    #[test]
    fn parses_ordered_names() {
        let items = parse_manifest(URL, br#"["b.jar", "a.jar", "c.jar"]"#).unwrap();
        assert_eq!(items, vec!["b.jar", "a.jar", "c.jar"]);
    }

    #[test]
    fn empty_array_is_not_a_parse_error() {
        let items = parse_manifest(URL, b"[]").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn rejects_nested_objects_and_garbage() {
        let bodies: [&[u8]; 4] = [br#"[{"name": "a.jar"}]"#, b"not json", br#"{"mods": []}"#, b""];
        for body in bodies {
            let err = parse_manifest(URL, body).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ManifestParseError);
        }
    }
}
