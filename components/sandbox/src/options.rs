//! Construction options for the simulated window.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Options the window and document are built from.
///
/// Unknown keys are kept in `extra` and exposed to script code unchanged as
/// `window.__options__`.
///
/// # Examples
///
/// ```
/// use sandbox::WindowOptions;
///
/// let options: WindowOptions =
///     serde_json::from_str(r#"{ "url": "https://example.test/app", "runScripts": "outside-only" }"#)
///         .unwrap();
/// assert_eq!(options.url, "https://example.test/app");
/// assert_eq!(options.content_type, "text/html");
/// assert!(options.extra.contains_key("runScripts"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindowOptions {
    /// Document URL
    pub url: String,
    /// Referrer reported by `document.referrer`
    pub referrer: String,
    /// Document content type
    pub content_type: String,
    /// `navigator.userAgent`
    pub user_agent: String,
    /// Provide `requestAnimationFrame` as a visual browser would
    pub pretend_to_be_visual: bool,
    /// Any other option, passed through verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            url: "about:blank".to_string(),
            referrer: String::new(),
            content_type: "text/html".to_string(),
            user_agent: format!("Mozilla/5.0 (EasyTests) easytests/{}", env!("CARGO_PKG_VERSION")),
            pretend_to_be_visual: false,
            extra: BTreeMap::new(),
        }
    }
}

impl WindowOptions {
    /// Set the document URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the referrer
    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = referrer.into();
        self
    }

    /// Enable `requestAnimationFrame`
    pub fn visual(mut self) -> Self {
        self.pretend_to_be_visual = true;
        self
    }
}
