use crate::{PortalError, PortalResult};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const PORTAL_URL_KEY: &str = "FOLLOWUP_PORTAL_URL";
pub const WEBDRIVER_URL_KEY: &str = "FOLLOWUP_WEBDRIVER_URL";
pub const CHROME_DEBUGGER_ADDRESS_KEY: &str = "FOLLOWUP_CHROME_DEBUGGER_ADDRESS";
pub const CHROME_PROFILE_DIR_KEY: &str = "FOLLOWUP_CHROME_PROFILE_DIR";
pub const DOCUMENT_TYPE_KEY: &str = "FOLLOWUP_PORTAL_DOCUMENT_TYPE";
pub const PROVIDER_KEY: &str = "FOLLOWUP_PORTAL_PROVIDER";
pub const WAIT_SECS_KEY: &str = "FOLLOWUP_PORTAL_WAIT_SECS";
pub const CONFIRM_SECS_KEY: &str = "FOLLOWUP_PORTAL_CONFIRM_SECS";

const DEFAULT_PORTAL_URL: &str = "https://txn2.healthfusionclaims.com/electronic/pm/patient_doc.jsp";
const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
const DEFAULT_DOCUMENT_TYPE: &str = "Consults";
const DEFAULT_PROVIDER: &str = "KLICKOVICH MD, ROBERT";
const DEFAULT_WAIT_SECS: u64 = 20;
const DEFAULT_CONFIRM_SECS: u64 = 5;

const UPLOAD_CONTROL_XPATH: &str =
    "//img[contains(@src, 'doc_upload.gif')] | //a[contains(text(),'Upload Document')]";

/// How a page element is located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Css(String),
    XPath(String),
    LinkText(String),
}

impl Selector {
    /// Element whose `name` attribute equals `name`.
    pub fn by_name(name: &str) -> Self {
        Selector::Css(format!("[name=\"{name}\"]"))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(css) => write!(f, "css `{css}`"),
            Selector::XPath(xpath) => write!(f, "xpath `{xpath}`"),
            Selector::LinkText(text) => write!(f, "link text `{text}`"),
        }
    }
}

/// Locators for the portal's upload form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalSelectors {
    pub upload_control: Selector,
    pub title: Selector,
    pub file: Selector,
    pub document_type: Selector,
    pub provider: Selector,
    pub notes: Selector,
    pub submit: Selector,
}

impl Default for PortalSelectors {
    fn default() -> Self {
        Self {
            upload_control: Selector::XPath(UPLOAD_CONTROL_XPATH.into()),
            title: Selector::by_name("documentTitle"),
            file: Selector::by_name("documentPath"),
            document_type: Selector::by_name("docType"),
            provider: Selector::by_name("providerId"),
            notes: Selector::by_name("notes"),
            submit: Selector::by_name("submit"),
        }
    }
}

/// Portal and WebDriver settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub portal_url: String,
    pub webdriver_url: String,
    /// `host:port` of an already running Chrome started with `--remote-debugging-port`.
    pub debugger_address: Option<String>,
    /// Chrome profile to launch with when not attaching to a running browser.
    pub profile_dir: Option<PathBuf>,
    pub document_type: String,
    pub provider: String,
    /// Upper bound on waiting for any single element.
    pub wait: Duration,
    /// How long the form may take to close after submitting.
    pub confirm: Duration,
    pub selectors: PortalSelectors,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            portal_url: DEFAULT_PORTAL_URL.into(),
            webdriver_url: DEFAULT_WEBDRIVER_URL.into(),
            debugger_address: None,
            profile_dir: None,
            document_type: DEFAULT_DOCUMENT_TYPE.into(),
            provider: DEFAULT_PROVIDER.into(),
            wait: Duration::from_secs(DEFAULT_WAIT_SECS),
            confirm: Duration::from_secs(DEFAULT_CONFIRM_SECS),
            selectors: PortalSelectors::default(),
        }
    }
}

impl PortalConfig {
    /// Resolve configuration from `lookup`; absent or blank keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::InvalidConfig` when a timeout is not a whole number of seconds.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PortalResult<Self> {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let secs = |key: &str, default: u64| -> PortalResult<Duration> {
            match value(key) {
                Some(v) => v.parse().map(Duration::from_secs).map_err(|_| {
                    PortalError::InvalidConfig(format!("{key} must be a number of seconds"))
                }),
                None => Ok(Duration::from_secs(default)),
            }
        };

        let defaults = Self::default();
        Ok(Self {
            portal_url: value(PORTAL_URL_KEY).unwrap_or(defaults.portal_url),
            webdriver_url: value(WEBDRIVER_URL_KEY).unwrap_or(defaults.webdriver_url),
            debugger_address: value(CHROME_DEBUGGER_ADDRESS_KEY),
            profile_dir: value(CHROME_PROFILE_DIR_KEY).map(PathBuf::from),
            document_type: value(DOCUMENT_TYPE_KEY).unwrap_or(defaults.document_type),
            provider: value(PROVIDER_KEY).unwrap_or(defaults.provider),
            wait: secs(WAIT_SECS_KEY, DEFAULT_WAIT_SECS)?,
            confirm: secs(CONFIRM_SECS_KEY, DEFAULT_CONFIRM_SECS)?,
            selectors: defaults.selectors,
        })
    }
}
