//! Headless browser rendering for JavaScript-driven lookup pages.
//!
//! Uses chromiumoxide (CDP). Every render launches (or connects to) a fresh
//! browser session and tears it down before returning, on success and on
//! failure alike. Sessions are never pooled.

#[cfg(feature = "browser")]
use std::future::Future;
#[cfg(feature = "browser")]
use std::path::PathBuf;
#[cfg(feature = "browser")]
use std::time::Duration;

#[cfg(feature = "browser")]
use anyhow::Context;
use anyhow::Result;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Handler, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;

use crate::config::BrowserSettings;

/// Waits for the document to reach at least the interactive state.
#[cfg(feature = "browser")]
const WAIT_FOR_READY_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete' || document.readyState === 'interactive') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
            setTimeout(() => resolve('timeout'), 10000);
        }
    })
"#;

/// Renders pages in a throwaway headless Chromium.
#[cfg(feature = "browser")]
pub struct BrowserFetcher {
    settings: BrowserSettings,
}

#[cfg(feature = "browser")]
impl BrowserFetcher {
    /// Well-known Chromium install locations.
    const CHROME_PATHS: &'static [&'static str] = &[
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/snap/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    /// Configured executable if it exists, else the first known install.
    fn find_chrome(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.settings.chrome_path {
            if path.exists() {
                return Ok(path.clone());
            }
            warn!("Configured Chrome path {} does not exist", path.display());
        }

        Self::CHROME_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .inspect(|p| debug!("Using Chrome at {}", p.display()))
            .ok_or_else(|| {
                anyhow::anyhow!("No Chrome/Chromium found; set browser.chrome_path in the config")
            })
    }

    /// Start a new session: connect to the remote browser if configured,
    /// otherwise launch a local one.
    async fn open_session(&self) -> Result<BrowserSession> {
        if let Some(ref remote_url) = self.settings.remote_url {
            return BrowserSession::connect(remote_url).await;
        }

        let chrome_path = self.find_chrome()?;
        let (width, height) = self.settings.window_size;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(width, height);

        // with_head means NOT headless
        if !self.settings.headless {
            builder = builder.with_head();
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--no-sandbox")
            .arg("--disable-gpu");

        for arg in &self.settings.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        Ok(BrowserSession {
            browser,
            handler: spawn_handler(handler),
            owned: true,
        })
    }

    /// Render `url` and return the resulting page markup.
    ///
    /// The tab and the session are closed on every path.
    pub async fn render(&self, url: &str, user_agent: &str) -> Result<String> {
        let wait = self.settings.render_wait.sample(&mut rand::thread_rng());

        let session = self.open_session().await?;
        let result: Result<String> = async {
            let page = session.browser.new_page("about:blank").await?;
            let tab = page.clone();
            with_cleanup(load_page(&page, url, user_agent, wait), async move {
                if let Err(e) = tab.close().await {
                    debug!("Page close failed: {}", e);
                }
            })
            .await
        }
        .await;
        session.close().await;
        result
    }
}

/// Await `work`, then always await `cleanup`, returning the work's result.
#[cfg(feature = "browser")]
async fn with_cleanup<T>(
    work: impl Future<Output = Result<T>>,
    cleanup: impl Future<Output = ()>,
) -> Result<T> {
    let result = work.await;
    cleanup.await;
    result
}

/// Drive an open tab to `url` and read back its markup.
#[cfg(feature = "browser")]
async fn load_page(page: &Page, url: &str, user_agent: &str, wait: Duration) -> Result<String> {
    page.execute(SetUserAgentOverrideParams::new(user_agent.to_string()))
        .await?;

    debug!("Navigating to {}", url);
    let nav_params = NavigateParams::builder()
        .url(url)
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid URL: {}", e))?;
    page.execute(nav_params).await?;

    match tokio::time::timeout(
        Duration::from_secs(15),
        page.evaluate(WAIT_FOR_READY_SCRIPT.to_string()),
    )
    .await
    {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => debug!("Could not check ready state: {}", e),
        Err(_) => warn!("Timeout waiting for page ready state"),
    }

    // Let dynamic content render
    tokio::time::sleep(wait).await;

    Ok(page.content().await?)
}

/// Pump CDP events until the connection drops.
#[cfg(feature = "browser")]
fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    })
}

/// A live browser connection plus its CDP event loop.
#[cfg(feature = "browser")]
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    /// Whether this process launched the browser (and must shut it down).
    owned: bool,
}

#[cfg(feature = "browser")]
impl BrowserSession {
    /// Attach to a running Chrome through its DevTools HTTP endpoint.
    async fn connect(endpoint: &str) -> Result<Self> {
        info!("Connecting to remote browser at {}", endpoint);

        let base = endpoint
            .replacen("ws://", "http://", 1)
            .replacen("wss://", "https://", 1);
        let version: serde_json::Value =
            reqwest::get(format!("{}/json/version", base.trim_end_matches('/')))
                .await
                .context("Remote browser unreachable")?
                .json()
                .await
                .context("Remote browser returned invalid version info")?;
        let ws_url = version["webSocketDebuggerUrl"]
            .as_str()
            .context("Remote browser did not report a webSocketDebuggerUrl")?;

        let (browser, handler) = Browser::connect(ws_url)
            .await
            .context("Failed to attach to remote browser")?;

        Ok(Self {
            browser,
            handler: spawn_handler(handler),
            owned: false,
        })
    }

    /// Tear the session down. Never fails; problems are logged.
    async fn close(mut self) {
        if self.owned {
            if let Err(e) = self.browser.close().await {
                debug!("Browser close failed: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                debug!("Browser wait failed: {}", e);
            }
        }
        self.handler.abort();
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct BrowserFetcher {
    #[allow(dead_code)]
    settings: BrowserSettings,
}

#[cfg(not(feature = "browser"))]
impl BrowserFetcher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    pub async fn render(&self, _url: &str, _user_agent: &str) -> Result<String> {
        Err(anyhow::anyhow!(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
        ))
    }
}
