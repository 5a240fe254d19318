//! Ask request types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where answer context is retrieved from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Local document index only
    #[default]
    Doc,
    /// Web search only
    Web,
    /// Both, re-summarised together
    Hybrid,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doc => "doc",
            Self::Web => "web",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "doc" => Ok(Self::Doc),
            "web" => Ok(Self::Web),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(format!("invalid mode: {}", other)),
        }
    }
}

/// Loosely typed boolean flag: JSON bool, number, or string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Number(i64),
    Text(String),
    /// Floats, objects, arrays: never set
    Other(serde_json::Value),
}

impl Flag {
    /// `true`, `1`, `"1"`, `"true"` and `"yes"` are set
    pub fn is_set(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Number(n) => *n == 1,
            Flag::Text(s) => crate::config::is_truthy(s),
            Flag::Other(_) => false,
        }
    }
}

/// Body of `POST /api/ask`, as JSON or form fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskRequest {
    /// The question
    #[serde(default)]
    pub query: Option<String>,
    /// `doc`, `web` or `hybrid` (default `doc`)
    #[serde(default)]
    pub mode: Option<String>,
    /// Request the pipeline trace (honoured only when debug output is enabled)
    #[serde(default)]
    pub debug: Option<Flag>,
}

/// An ask request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidAsk {
    pub query: String,
    pub mode: SearchMode,
    pub debug: bool,
}

/// Why an ask request was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskRejection {
    EmptyQuery,
    InvalidMode,
}

impl AskRejection {
    /// Message returned to the client
    pub fn message(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "queryが空です",
            Self::InvalidMode => "modeは doc|web|hybrid のいずれかです",
        }
    }
}

impl AskRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    /// Trim the query, default the mode and interpret the debug flag
    pub fn validate(&self) -> Result<ValidAsk, AskRejection> {
        let query = self.query.as_deref().unwrap_or("").trim().to_string();
        if query.is_empty() {
            return Err(AskRejection::EmptyQuery);
        }

        let mode = match self.mode.as_deref().map(str::trim) {
            None | Some("") => SearchMode::Doc,
            Some(m) => m.parse().map_err(|_| AskRejection::InvalidMode)?,
        };

        Ok(ValidAsk {
            query,
            mode,
            debug: self.debug.as_ref().map(Flag::is_set).unwrap_or(false),
        })
    }
}
