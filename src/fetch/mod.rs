//! Dataset loading from local files or HTTP(S) URLs.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

/// Returns `true` when `source` should be fetched over HTTP.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        bail!("GET {url} returned status {status}");
    }
    Ok(resp.bytes().await?.to_vec())
}

/// Loads a dataset from a URL or a file path. `.gz` sources are decompressed.
#[tracing::instrument(skip(client))]
pub async fn load_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    let bytes = if is_remote(source) {
        fetch_bytes(client, source).await?
    } else {
        tokio::fs::read(source)
            .await
            .with_context(|| format!("Failed to read {source}"))?
    };
    debug!(bytes = bytes.len(), "Source loaded");

    if source.ends_with(".gz") {
        return gunzip(&bytes).with_context(|| format!("Failed to decompress {source}"));
    }
    Ok(bytes)
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::env;
    use std::fs;
    use std::io::Write;
    use std::sync::Mutex;

    /// Answers every request with a fixed status and body, recording the URLs.
    struct StubClient {
        status: u16,
        body: Vec<u8>,
        requested: Mutex<Vec<String>>,
    }

    impl StubClient {
        fn new(status: u16, body: &[u8]) -> Self {
            Self {
                status,
                body: body.to_vec(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl HttpClient for StubClient {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            self.requested.lock().unwrap().push(req.url().to_string());
            let resp = http::Response::builder()
                .status(self.status)
                .body(self.body.clone())
                .unwrap();
            Ok(reqwest::Response::from(resp))
        }
    }

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://dsc106.com/labs/lab07/data/bluebikes-stations.json"));
        assert!(is_remote("http://localhost/trips.csv"));
        assert!(!is_remote("data/trips.csv"));
        assert!(!is_remote("httpdocs/trips.csv"));
    }

    #[tokio::test]
    async fn test_fetch_bytes_rejects_error_status() {
        let client = StubClient::new(404, b"not found");
        let result = fetch_bytes(&client, "https://example.org/stations.json").await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("404"), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_load_remote_source_passes_body_through() {
        let body = br#"{"data": {"stations": []}}"#;
        let client = StubClient::new(200, body);

        let bytes = load_source(&client, "https://example.org/stations.json")
            .await
            .unwrap();

        assert_eq!(bytes, body);
        assert_eq!(
            client.requested.lock().unwrap().as_slice(),
            ["https://example.org/stations.json"]
        );
    }

    #[tokio::test]
    async fn test_load_remote_gz_source_is_decompressed() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"start_station_id\nA\n").unwrap();
        let client = StubClient::new(200, &encoder.finish().unwrap());

        let bytes = load_source(&client, "https://example.org/trips.csv.gz")
            .await
            .unwrap();

        assert_eq!(bytes, b"start_station_id\nA\n");
    }

    #[tokio::test]
    async fn test_load_local_file() {
        let path = temp_path("bluebikes_fetch_plain.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();

        let client = BasicClient::new().unwrap();
        let bytes = load_source(&client, &path).await.unwrap();

        assert_eq!(bytes, b"a,b\n1,2\n");
        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_load_gzipped_file() {
        let path = temp_path("bluebikes_fetch_gz.csv.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"start_station_id\nA\n").unwrap();
        fs::write(&path, encoder.finish().unwrap()).unwrap();

        let client = BasicClient::new().unwrap();
        let bytes = load_source(&client, &path).await.unwrap();

        assert_eq!(bytes, b"start_station_id\nA\n");
        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let client = BasicClient::new().unwrap();
        let result = load_source(&client, "/nonexistent/bluebikes/trips.csv").await;

        assert!(result.is_err());
    }
}
