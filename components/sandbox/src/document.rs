//! Simulated document construction.
//!
//! The runner only needs a document that script code can read, so the
//! default engine extracts the handful of fields tests usually touch and
//! exposes them as plain data.

use crate::options::WindowOptions;
use core_types::{EasyTestsError, EasyTestsResult};
use regex::Regex;
use serde::Serialize;

/// `document.documentElement`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentElement {
    /// Full markup of the `<html>` element
    #[serde(rename = "outerHTML")]
    pub outer_html: String,
}

/// `document.head` / `document.body`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Inner markup
    #[serde(rename = "innerHTML")]
    pub inner_html: String,
    /// Markup with tags removed
    pub text_content: String,
}

/// Snapshot of a document as seen by script code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Text of `<title>`, trimmed
    pub title: String,
    /// Document URL
    #[serde(rename = "URL")]
    pub url: String,
    /// Referrer
    pub referrer: String,
    /// Content type
    pub content_type: String,
    /// Always `complete`; documents are fully parsed before scripts run
    pub ready_state: String,
    /// Root element
    pub document_element: DocumentElement,
    /// `<head>` contents
    pub head: Section,
    /// `<body>` contents
    pub body: Section,
}

/// Builds a document from optional markup
pub trait DocumentEngine {
    /// Create a document.
    ///
    /// # Errors
    /// Engines may reject markup or options with [`EasyTestsError::Config`].
    fn create(&self, html: Option<&str>, options: &WindowOptions) -> EasyTestsResult<Document>;
}

/// Regex-based document engine for static markup
#[derive(Debug)]
pub struct StaticDocument {
    title: Regex,
    head: Regex,
    body: Regex,
    tag: Regex,
}

impl StaticDocument {
    /// Create the engine
    ///
    /// # Errors
    /// Only if a built-in pattern fails to compile.
    pub fn new() -> EasyTestsResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| EasyTestsError::Config {
                message: e.to_string(),
            })
        };
        Ok(Self {
            title: compile(r"(?is)<title[^>]*>(.*?)</title>")?,
            head: compile(r"(?is)<head[^>]*>(.*?)</head>")?,
            body: compile(r"(?is)<body[^>]*>(.*?)(?:</body>|$)")?,
            tag: compile(r"(?s)<[^>]*>")?,
        })
    }

    fn inner(&self, pattern: &Regex, html: &str) -> Option<String> {
        pattern
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn section(&self, inner_html: String) -> Section {
        let text_content = self.tag.replace_all(&inner_html, "").into_owned();
        Section {
            inner_html,
            text_content,
        }
    }
}

impl DocumentEngine for StaticDocument {
    fn create(&self, html: Option<&str>, options: &WindowOptions) -> EasyTestsResult<Document> {
        let html = html.unwrap_or("");
        let has_structure = html.to_ascii_lowercase().contains("<body");

        let head = self.inner(&self.head, html).unwrap_or_default();
        // Fragments without <body> are treated as body content.
        let body = if has_structure {
            self.inner(&self.body, html).unwrap_or_default()
        } else {
            html.to_string()
        };
        let title = self
            .inner(&self.title, html)
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        Ok(Document {
            title,
            url: options.url.clone(),
            referrer: options.referrer.clone(),
            content_type: options.content_type.clone(),
            ready_state: "complete".to_string(),
            document_element: DocumentElement {
                outer_html: format!("<html><head>{head}</head><body>{body}</body></html>"),
            },
            head: self.section(head),
            body: self.section(body),
        })
    }
}
