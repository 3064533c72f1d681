//! Run options: markup, window options, module lookup and pumping.

use core_types::{Dialect, EasyTestsError, EasyTestsResult};
use sandbox::WindowOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use test_model::TimeoutPolicy;

/// Options for one test-file run.
///
/// Field names are camelCase on the wire; `jsdomOptions` is accepted as an
/// alias for `window`.
///
/// # Examples
///
/// ```
/// use easytests::RunOptions;
///
/// let options = RunOptions::from_json(
///     r#"{ "html": "<p>hi</p>", "jsdomOptions": { "url": "https://example.test/" } }"#,
/// )
/// .unwrap();
/// assert_eq!(options.html.as_deref(), Some("<p>hi</p>"));
/// assert_eq!(options.window.url, "https://example.test/");
/// assert_eq!(options.tick_millis, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunOptions {
    /// Markup the simulated document starts from
    pub html: Option<String>,
    /// Window construction options
    #[serde(alias = "jsdomOptions")]
    pub window: WindowOptions,
    /// Root for package lookups; the working directory when unset
    pub base_path: Option<PathBuf>,
    /// Grammar forced on every module, overriding extensions
    pub dialect: Option<Dialect>,
    /// Poll interval while waiting on script promises
    pub tick_millis: u64,
    /// What a stuck test does to the run
    pub timeout_policy: TimeoutPolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            html: None,
            window: WindowOptions::default(),
            base_path: None,
            dialect: None,
            tick_millis: 1,
            timeout_policy: TimeoutPolicy::default(),
        }
    }
}

impl RunOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from JSON text
    ///
    /// # Errors
    /// Returns [`EasyTestsError::Config`] on malformed input.
    pub fn from_json(text: &str) -> EasyTestsResult<Self> {
        serde_json::from_str(text).map_err(|e| config_error("json", e))
    }

    /// Load options from a `.json` file
    ///
    /// # Errors
    /// Returns [`EasyTestsError::Io`] if the file cannot be read and
    /// [`EasyTestsError::Config`] for other extensions or malformed content.
    pub fn load(path: impl AsRef<Path>) -> EasyTestsResult<Self> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|ext| ext.to_str());
        match extension {
            Some("json") => Self::from_json(&std::fs::read_to_string(path)?),
            _ => Err(EasyTestsError::Config {
                message: format!("unsupported options file {}", path.display()),
            }),
        }
    }

    /// Set the document markup
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Set the window options
    pub fn with_window(mut self, window: WindowOptions) -> Self {
        self.window = window;
        self
    }

    /// Set the package lookup root
    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Force a grammar for every module
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Set the promise poll interval
    pub fn with_tick_millis(mut self, tick_millis: u64) -> Self {
        self.tick_millis = tick_millis;
        self
    }

    /// Set the timeout policy
    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout_policy = policy;
        self
    }

    /// The package lookup root, defaulting to the working directory
    pub fn resolved_base_path(&self) -> EasyTestsResult<PathBuf> {
        match &self.base_path {
            Some(path) => Ok(path.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Poll interval, never zero
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}

fn config_error(format: &str, error: impl std::fmt::Display) -> EasyTestsError {
    EasyTestsError::Config {
        message: format!("malformed {format} options: {error}"),
    }
}
