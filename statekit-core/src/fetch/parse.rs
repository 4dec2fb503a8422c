//! Response parsing.
//!
//! A completed response is turned into a [`Payload`] according to the
//! configured [`ParseMode`]. JSON goes through `serde_json`; markup bodies
//! are wrapped as a [`Document`] of the matching kind, standing in for the
//! host's document-parsing primitive; `Text` and `Response` pass the body or
//! the whole response through unparsed.

use std::str::FromStr;

use super::transport::Response;

/// How to interpret a successful response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Parse the body as JSON into a `serde_json::Value`.
    #[default]
    Json,
    Html,
    Xml,
    Svg,
    /// Return the body as a plain string.
    Text,
    /// Return the raw response unparsed.
    Response,
}

impl FromStr for ParseMode {
    type Err = std::convert::Infallible;

    /// Accepts the conventional lowercase names. Anything unrecognized logs
    /// a diagnostic and falls back to [`ParseMode::Response`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "json" => ParseMode::Json,
            "html" => ParseMode::Html,
            "xml" => ParseMode::Xml,
            "svg" => ParseMode::Svg,
            "text" => ParseMode::Text,
            "response" => ParseMode::Response,
            other => {
                tracing::warn!(mode = other, "unknown parse mode, returning raw response instead");
                ParseMode::Response
            }
        })
    }
}

/// The document type produced for markup bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Html,
    Svg,
    Xml,
}

/// A parsed document handed back from the document-parsing boundary.
///
/// The crate does not interpret markup itself; it records which document
/// type the mode selected and carries the source for the host to consume.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub kind: DocumentKind,
    pub source: String,
}

/// A parsed response body.
#[derive(Debug, Clone)]
pub enum Payload {
    Json(serde_json::Value),
    Document(Document),
    Text(String),
    Response(Response),
}

/// Parse a successful response per `mode`.
///
/// Returns `None` when the body fails to parse; the failure is swallowed
/// apart from a debug-level log line, matching the error taxonomy for
/// response handling.
pub(crate) fn parse_body(mode: ParseMode, response: Response) -> Option<Payload> {
    match mode {
        ParseMode::Json => match serde_json::from_str(&response.body) {
            Ok(value) => Some(Payload::Json(value)),
            Err(error) => {
                tracing::debug!(%error, "response body is not valid JSON");
                None
            }
        },
        ParseMode::Html => Some(Payload::Document(Document {
            kind: DocumentKind::Html,
            source: response.body,
        })),
        ParseMode::Svg => Some(Payload::Document(Document {
            kind: DocumentKind::Svg,
            source: response.body,
        })),
        ParseMode::Xml => Some(Payload::Document(Document {
            kind: DocumentKind::Xml,
            source: response.body,
        })),
        ParseMode::Text => Some(Payload::Text(response.body)),
        ParseMode::Response => Some(Payload::Response(response)),
    }
}
