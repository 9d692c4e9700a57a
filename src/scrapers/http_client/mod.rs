//! HTTP client for existence probes and audio downloads.

mod user_agent;

pub use user_agent::{HeaderPool, IMPERSONATE_USER_AGENTS};

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::candidates::filename_from_url;
use super::{AudioDownloader, ResourceProber};
use crate::config::HttpSettings;

/// Errors from HTTP fetches.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("No filename in URL: {0}")]
    NoFilename(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP client with rotated browser headers and bounded timeouts.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    headers: HeaderPool,
    probe_timeout: Duration,
    download_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client from settings.
    pub fn new(settings: &HttpSettings) -> Result<Self, FetchError> {
        let mut builder = Client::builder().gzip(true).brotli(true);
        if !settings.use_system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            headers: HeaderPool::new(settings.user_agents.clone()),
            probe_timeout: settings.probe_timeout(),
            download_timeout: settings.download_timeout(),
        })
    }

    /// Check whether `url` answers 200 OK.
    ///
    /// Transport failures count as absent and are only logged.
    pub async fn probe(&self, url: &str) -> bool {
        let headers = self.headers.headers(&mut rand::thread_rng());
        let start = Instant::now();

        match self
            .client
            .get(url)
            .headers(headers)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                debug!(
                    "Probe {} -> {} ({}ms)",
                    url,
                    status.as_u16(),
                    start.elapsed().as_millis()
                );
                status == StatusCode::OK
            }
            Err(e) => {
                debug!("URL test failed for {}: {}", url, e);
                false
            }
        }
    }

    /// Stream `url` into `dir`, naming the file after the URL's last segment.
    ///
    /// Creates `dir` when missing and overwrites an existing file of the same
    /// name.
    pub async fn download(&self, url: &str, dir: &Path) -> Result<PathBuf, FetchError> {
        let filename = filename_from_url(url);
        if filename.is_empty() {
            return Err(FetchError::NoFilename(url.to_string()));
        }

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&filename);

        let headers = self.headers.headers(&mut rand::thread_rng());
        let mut response = self
            .client
            .get(url)
            .headers(headers)
            .timeout(self.download_timeout)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(&path).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!("Saved {} bytes from {} to {}", written, url, path.display());
        Ok(path)
    }
}

#[async_trait]
impl ResourceProber for HttpClient {
    async fn probe(&self, url: &str) -> bool {
        HttpClient::probe(self, url).await
    }
}

#[async_trait]
impl AudioDownloader for HttpClient {
    async fn download(&self, url: &str, dir: &Path) -> Result<PathBuf, FetchError> {
        HttpClient::download(self, url, dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    const AUDIO_BYTES: &[u8] = b"ID3fake-audio-payload";

    /// Serve `/found.mp3` with a small body and 404 for everything else.
    async fn spawn_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let mut request = Vec::new();
                    loop {
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        if n == 0 {
                            break;
                        }
                        request.extend_from_slice(&buf[..n]);
                        if request.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                    let request = String::from_utf8_lossy(&request);
                    let path = request.split_whitespace().nth(1).unwrap_or("/");

                    let (status, body): (&str, &[u8]) = if path == "/found.mp3" {
                        ("200 OK", AUDIO_BYTES)
                    } else if path == "/moved.mp3" {
                        ("204 No Content", b"")
                    } else {
                        ("404 Not Found", b"missing")
                    };
                    let head = format!(
                        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        status,
                        body.len()
                    );
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(body).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{}", addr)
    }

    fn test_client() -> HttpClient {
        let settings = HttpSettings {
            probe_timeout: 5,
            download_timeout: 5,
            use_system_proxy: false,
            ..HttpSettings::default()
        };
        HttpClient::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn test_probe_status() {
        let base = spawn_server().await;
        let client = test_client();

        assert!(client.probe(&format!("{base}/found.mp3")).await);
        assert!(!client.probe(&format!("{base}/missing.mp3")).await);
        assert!(!client.probe(&format!("{base}/moved.mp3")).await);
    }

    #[tokio::test]
    async fn test_probe_transport_error_is_false() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = test_client();
        assert!(!client.probe(&format!("http://{addr}/found.mp3")).await);
    }

    #[tokio::test]
    async fn test_download_writes_and_overwrites() {
        let base = spawn_server().await;
        let client = test_client();
        let dir = tempdir().unwrap();
        let audio_dir = dir.path().join("nested").join("audio");

        let url = format!("{base}/found.mp3");
        let path = client.download(&url, &audio_dir).await.unwrap();
        assert_eq!(path, audio_dir.join("found.mp3"));
        assert_eq!(std::fs::read(&path).unwrap(), AUDIO_BYTES);

        std::fs::write(&path, b"stale").unwrap();
        client.download(&url, &audio_dir).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), AUDIO_BYTES);
    }

    #[tokio::test]
    async fn test_download_rejects_non_200() {
        let base = spawn_server().await;
        let client = test_client();
        let dir = tempdir().unwrap();

        let err = client
            .download(&format!("{base}/missing.mp3"), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert!(!dir.path().join("missing.mp3").exists());
    }
}
