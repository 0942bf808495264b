use crate::error::CatalogError;
use crate::grammar::is_valid_tag_name;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;
use tracing::warn;

/// A single named, string-valued parameter of a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

impl ToolParameter {
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: false,
        }
    }
}

/// Description of a tool the model may call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Parameters in declaration order
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &ToolParameter> {
        self.parameters.iter().filter(|p| p.required)
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Why a tool name cannot round-trip through the rendered prompt and the
/// parser, if it cannot.
fn tool_name_problem(name: &str) -> Option<&'static str> {
    if name.trim() != name {
        Some("has surrounding whitespace")
    } else if name.chars().any(char::is_control) {
        Some("contains control characters")
    } else if name.contains("(required)") {
        Some("contains the required marker")
    } else {
        None
    }
}

/// Ordered, validated set of tools visible to one render/parse cycle.
///
/// Construction rejects duplicate tool names and duplicate parameter names,
/// so renderer and parser can rely on unique lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ToolDescriptor>", into = "Vec<ToolDescriptor>")]
pub struct Catalog {
    tools: Vec<ToolDescriptor>,
}

impl Catalog {
    pub fn new(tools: Vec<ToolDescriptor>) -> Result<Self, CatalogError> {
        let mut seen_tools = HashSet::new();
        for tool in &tools {
            if tool.name.trim().is_empty() {
                warn!("Rejecting catalog: tool with empty name");
                return Err(CatalogError::EmptyName("tool".to_string()));
            }
            if let Some(reason) = tool_name_problem(&tool.name) {
                warn!("Rejecting catalog: tool name {:?} {}", tool.name, reason);
                return Err(CatalogError::InvalidToolName(tool.name.clone(), reason));
            }
            if !seen_tools.insert(tool.name.as_str()) {
                warn!("Rejecting catalog: duplicate tool '{}'", tool.name);
                return Err(CatalogError::DuplicateTool(tool.name.clone()));
            }

            let mut seen_params = HashSet::new();
            for param in &tool.parameters {
                if param.name.trim().is_empty() {
                    warn!("Rejecting catalog: empty parameter name in '{}'", tool.name);
                    return Err(CatalogError::EmptyName(format!(
                        "parameter of tool '{}'",
                        tool.name
                    )));
                }
                if !is_valid_tag_name(&param.name) {
                    warn!(
                        "Rejecting catalog: parameter '{}' in '{}' is not a valid tag name",
                        param.name, tool.name
                    );
                    return Err(CatalogError::InvalidParameterName {
                        tool: tool.name.clone(),
                        parameter: param.name.clone(),
                    });
                }
                if !seen_params.insert(param.name.as_str()) {
                    warn!(
                        "Rejecting catalog: duplicate parameter '{}' in '{}'",
                        param.name, tool.name
                    );
                    return Err(CatalogError::DuplicateParameter {
                        tool: tool.name.clone(),
                        parameter: param.name.clone(),
                    });
                }
            }
        }

        Ok(Self { tools })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Exact, case-sensitive lookup
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ToolDescriptor> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name.as_str())
    }
}

impl TryFrom<Vec<ToolDescriptor>> for Catalog {
    type Error = CatalogError;

    fn try_from(tools: Vec<ToolDescriptor>) -> Result<Self, Self::Error> {
        Catalog::new(tools)
    }
}

impl From<Catalog> for Vec<ToolDescriptor> {
    fn from(catalog: Catalog) -> Self {
        catalog.tools
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a ToolDescriptor;
    type IntoIter = std::slice::Iter<'a, ToolDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.tools.iter()
    }
}

/// A validated tool call recovered from model output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCall {
    name: String,
    /// Decoded argument values, in order of first appearance
    arguments: IndexMap<String, String>,
    /// Byte range of the accepted envelope in the raw text
    #[serde(skip)]
    span: Range<usize>,
}

impl ToolCall {
    pub(crate) fn new(name: String, arguments: IndexMap<String, String>, span: Range<usize>) -> Self {
        Self {
            name,
            arguments,
            span,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &IndexMap<String, String> {
        &self.arguments
    }

    pub fn get(&self, parameter: &str) -> Option<&str> {
        self.arguments.get(parameter).map(String::as_str)
    }

    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    pub fn into_parts(self) -> (String, IndexMap<String, String>) {
        (self.name, self.arguments)
    }
}
