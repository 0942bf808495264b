use crate::types::Catalog;
use thiserror::Error;

/// Maximum number of bytes of raw model output kept on a `ParseError`.
const MAX_FRAGMENT_LEN: usize = 200;

/// Configuration faults in a tool catalog. These indicate a bug in the
/// registering system and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Duplicate tool name in catalog: {0}")]
    DuplicateTool(String),

    #[error("Duplicate parameter '{parameter}' in tool '{tool}'")]
    DuplicateParameter { tool: String, parameter: String },

    #[error("Invalid tool name {0:?}: {1}")]
    InvalidToolName(String, &'static str),

    #[error("Parameter '{parameter}' in tool '{tool}' cannot be used as a tag name")]
    InvalidParameterName { tool: String, parameter: String },

    #[error("Empty name in catalog: {0}")]
    EmptyName(String),
}

/// Classification of a failed parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// The text contains no call marker at all.
    #[error("No tool call found")]
    NoToolCall,
    /// Markers are unbalanced, nested, or a child element is broken.
    #[error("Malformed tool call: {0}")]
    MalformedEnvelope(String),
    #[error("Tool call is missing the tool name")]
    MissingToolName,
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    /// All required parameters that were absent or empty, in declaration order.
    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingRequiredParameter(Vec<String>),
    /// Another call follows the accepted one and the parser was told to reject that.
    #[error("Only one tool call is allowed per message")]
    TrailingToolCall,
}

impl ParseErrorKind {
    /// Stable machine-readable code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            ParseErrorKind::NoToolCall => "no_tool_call",
            ParseErrorKind::MalformedEnvelope(_) => "malformed_envelope",
            ParseErrorKind::MissingToolName => "missing_tool_name",
            ParseErrorKind::UnknownTool(_) => "unknown_tool",
            ParseErrorKind::MissingRequiredParameter(_) => "missing_required_parameter",
            ParseErrorKind::TrailingToolCall => "trailing_tool_call",
        }
    }
}

/// A classified parse failure together with the raw text it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub fragment: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, fragment: &str) -> Self {
        Self {
            kind,
            fragment: clip_fragment(fragment),
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Whether asking the model for a corrected call makes sense.
    /// A turn without any call is a direct answer, not a protocol failure.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.kind, ParseErrorKind::NoToolCall)
    }

    /// Corrective message for the model, or `None` when the turn should be
    /// treated as a direct answer.
    pub fn feedback(&self, catalog: &Catalog) -> Option<String> {
        let available = || {
            let names: Vec<&str> = catalog.names().collect();
            if names.is_empty() {
                "No tools are available.".to_string()
            } else {
                format!("Available tools: {}.", names.join(", "))
            }
        };

        let message = match &self.kind {
            ParseErrorKind::NoToolCall => return None,
            ParseErrorKind::MalformedEnvelope(reason) => format!(
                "Your tool call could not be read ({reason}). Send exactly one call of the form \
                 <tool_call><tool>name</tool><args><param>value</param></args></tool_call> \
                 and nothing else."
            ),
            ParseErrorKind::MissingToolName => {
                format!("Your tool call does not name a tool. {}", available())
            }
            ParseErrorKind::UnknownTool(name) => {
                format!("Unknown tool '{name}'. Please use only available tools. {}", available())
            }
            ParseErrorKind::MissingRequiredParameter(names) => format!(
                "Your call is missing values for the required parameters: {}. Please try again.",
                names.join(", ")
            ),
            ParseErrorKind::TrailingToolCall => {
                "Only one tool call is allowed per message. Send a single call and wait for its result."
                    .to_string()
            }
        };
        Some(message)
    }
}

/// Keep at most `MAX_FRAGMENT_LEN` bytes, cut on a char boundary.
fn clip_fragment(fragment: &str) -> String {
    if fragment.len() <= MAX_FRAGMENT_LEN {
        return fragment.to_string();
    }
    let mut end = MAX_FRAGMENT_LEN;
    while !fragment.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &fragment[..end])
}
