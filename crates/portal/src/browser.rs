use crate::config::{PortalConfig, Selector};
use crate::{PortalError, PortalResult};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Browser operations used by the upload flow.
#[async_trait]
pub trait PortalBrowser: Send {
    async fn open(&mut self, url: &str) -> PortalResult<()>;

    async fn click(&mut self, selector: &Selector) -> PortalResult<()>;

    /// Replaces the contents of a text input or textarea.
    async fn fill(&mut self, selector: &Selector, text: &str) -> PortalResult<()>;

    /// Sets a file input to `path`, which must be absolute.
    async fn attach_file(&mut self, selector: &Selector, path: &Path) -> PortalResult<()>;

    /// Chooses the option whose visible text matches `option` ignoring case and surrounding
    /// whitespace.
    async fn select_option(&mut self, selector: &Selector, option: &str) -> PortalResult<()>;

    /// Accepts a pending alert or confirm dialog and returns its text, if one is open.
    async fn accept_alert(&mut self) -> PortalResult<Option<String>>;

    /// Polls until `selector` matches nothing visible. Returns `false` on timeout.
    async fn wait_until_gone(&mut self, selector: &Selector, timeout: Duration)
        -> PortalResult<bool>;

    async fn close(&mut self) -> PortalResult<()>;
}

fn locator(selector: &Selector) -> Locator<'_> {
    match selector {
        Selector::Css(css) => Locator::Css(css),
        Selector::XPath(xpath) => Locator::XPath(xpath),
        Selector::LinkText(text) => Locator::LinkText(text),
    }
}

fn is_missing(err: &CmdError) -> bool {
    matches!(err, CmdError::WaitTimeout) || err.is_no_such_element()
}

/// [`PortalBrowser`] over a WebDriver session (chromedriver).
pub struct WebDriverBrowser {
    client: Client,
    wait: Duration,
}

impl WebDriverBrowser {
    /// Starts a session against `cfg.webdriver_url`.
    ///
    /// With a debugger address the session attaches to the running Chrome and switches to
    /// its most recently opened window, so the user's logged-in portal tab is reused.
    pub async fn connect(cfg: &PortalConfig) -> PortalResult<Self> {
        let client = ClientBuilder::native()
            .capabilities(chrome_capabilities(cfg))
            .connect(&cfg.webdriver_url)
            .await
            .map_err(|e| PortalError::Connect(format!("{}: {e}", cfg.webdriver_url)))?;

        if cfg.debugger_address.is_some() {
            let windows = client.windows().await?;
            if let Some(last) = windows.last() {
                client.switch_to_window(last.clone()).await?;
            }
        }

        tracing::info!("WebDriver session started at {}", cfg.webdriver_url);
        Ok(Self {
            client,
            wait: cfg.wait,
        })
    }

    async fn find(&self, selector: &Selector) -> PortalResult<Element> {
        self.client
            .wait()
            .at_most(self.wait)
            .for_element(locator(selector))
            .await
            .map_err(|e| {
                if is_missing(&e) {
                    PortalError::ElementNotFound(selector.to_string())
                } else {
                    PortalError::from(e)
                }
            })
    }
}

fn chrome_capabilities(cfg: &PortalConfig) -> Map<String, Value> {
    let chrome_options = match (&cfg.debugger_address, &cfg.profile_dir) {
        (Some(address), _) => json!({ "debuggerAddress": address }),
        (None, Some(profile)) => json!({
            "args": [format!("--user-data-dir={}", profile.display())]
        }),
        (None, None) => json!({}),
    };

    let mut caps = Map::new();
    caps.insert("browserName".into(), json!("chrome"));
    caps.insert("goog:chromeOptions".into(), chrome_options);
    caps
}

#[async_trait]
impl PortalBrowser for WebDriverBrowser {
    async fn open(&mut self, url: &str) -> PortalResult<()> {
        tracing::debug!("navigating to {}", url);
        self.client.goto(url).await?;
        Ok(())
    }

    async fn click(&mut self, selector: &Selector) -> PortalResult<()> {
        self.find(selector).await?.click().await?;
        Ok(())
    }

    async fn fill(&mut self, selector: &Selector, text: &str) -> PortalResult<()> {
        let element = self.find(selector).await?;
        element.clear().await?;
        element.send_keys(text).await?;
        Ok(())
    }

    async fn attach_file(&mut self, selector: &Selector, path: &Path) -> PortalResult<()> {
        let element = self.find(selector).await?;
        element.send_keys(&path.to_string_lossy()).await?;
        Ok(())
    }

    async fn select_option(&mut self, selector: &Selector, option: &str) -> PortalResult<()> {
        let select = self.find(selector).await?;
        let wanted = option.trim().to_lowercase();

        for candidate in select.find_all(Locator::Css("option")).await? {
            if candidate.text().await?.trim().to_lowercase() == wanted {
                candidate.click().await?;
                return Ok(());
            }
        }

        Err(PortalError::OptionNotFound {
            field: selector.to_string(),
            option: option.to_string(),
        })
    }

    async fn accept_alert(&mut self) -> PortalResult<Option<String>> {
        let text = match self.client.get_alert_text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("no alert to accept: {}", e);
                return Ok(None);
            }
        };
        self.client.accept_alert().await?;
        Ok(Some(text))
    }

    async fn wait_until_gone(
        &mut self,
        selector: &Selector,
        timeout: Duration,
    ) -> PortalResult<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.client.find(locator(selector)).await {
                Err(e) if is_missing(&e) => return Ok(true),
                Err(e) => return Err(e.into()),
                Ok(element) => match element.is_displayed().await {
                    // A stale element has been removed from the page.
                    Ok(false) | Err(_) => return Ok(true),
                    Ok(true) => {}
                },
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn close(&mut self) -> PortalResult<()> {
        self.client.clone().close().await?;
        tracing::info!("WebDriver session closed");
        Ok(())
    }
}
