//! Renders a tool catalog into the instructional prompt segment.

use crate::error::CatalogError;
use crate::grammar::format_call;
use crate::types::{Catalog, ToolDescriptor, ToolParameter};
use tracing::debug;

const TOOL_USE_INSTRUCTIONS: &str = include_str!("../resources/tool_use_instructions.md");

const REQUIRED_MARKER: &str = "(required)";

/// Value used in the generic search example. It contains an ampersand so the
/// model sees the escaping rule applied.
const SEARCH_EXAMPLE_QUERY: &str = "dogs & cats";

/// Validate `tools` as a catalog and render it.
pub fn render(tools: &[ToolDescriptor]) -> Result<String, CatalogError> {
    let catalog = Catalog::new(tools.to_vec())?;
    Ok(render_catalog(&catalog))
}

/// Render the instructions, tool list and worked examples for `catalog`.
///
/// An empty catalog yields the instructions only.
pub fn render_catalog(catalog: &Catalog) -> String {
    let mut prompt = TOOL_USE_INSTRUCTIONS.trim_end().to_string();

    if catalog.is_empty() {
        prompt.push('\n');
        return prompt;
    }

    prompt.push_str("\n\n# Available Tools\n\n");
    prompt.push_str(&generate_tool_documentation(catalog));
    prompt.push_str("# Examples\n\n");
    prompt.push_str(&generate_examples(catalog));

    debug!(
        "Rendered tool prompt for {} tools ({} chars)",
        catalog.len(),
        prompt.len()
    );
    prompt
}

/// Whether a tool is meant for general lookup and gets the search example.
pub fn is_search_like(tool: &ToolDescriptor) -> bool {
    let name = tool.name.to_ascii_lowercase();
    name == "search" || name == "lookup" || name.ends_with("_search") || name.starts_with("search_")
}

/// Strip any `(required)` text from a description; the marker is rendered separately.
fn clean_description(description: &str) -> String {
    description.replace(REQUIRED_MARKER, "").trim().to_string()
}

fn format_parameter_doc(param: &ToolParameter) -> String {
    let mut doc = format!("- {}", param.name);

    if param.required {
        doc.push(' ');
        doc.push_str(REQUIRED_MARKER);
    }

    let description = clean_description(&param.description);
    if !description.is_empty() {
        doc.push_str(&format!(": {}", description));
    }

    doc
}

fn generate_tool_doc(tool: &ToolDescriptor) -> String {
    let mut doc = format!("## {}\n", tool.name);

    let description = clean_description(&tool.description);
    if !description.is_empty() {
        doc.push_str(&format!("Description: {}\n", description));
    }

    if tool.parameters.is_empty() {
        doc.push_str("Parameters: none\n");
    } else {
        doc.push_str("Parameters:\n");
        for param in &tool.parameters {
            doc.push_str(&format_parameter_doc(param));
            doc.push('\n');
        }
    }

    doc.push('\n');
    doc
}

fn generate_tool_documentation(catalog: &Catalog) -> String {
    catalog.iter().fold(String::new(), |mut docs, tool| {
        docs.push_str(&generate_tool_doc(tool));
        docs
    })
}

/// Placeholder text for a parameter in a worked example
fn parameter_placeholder(name: &str) -> String {
    match name {
        "query" => "Your search query here".to_string(),
        "path" | "file" | "filename" => "File path here".to_string(),
        "url" => "https://example.com/docs".to_string(),
        "regex" | "pattern" => "Your regex pattern here".to_string(),
        "code" | "content" | "command" | "message" => format!("Your {} here", name),
        "project" => "project-name".to_string(),
        _ => format!("{} here", name.replace('_', " ")),
    }
}

/// Example call for an arbitrary tool, filled with placeholders for each
/// required parameter.
fn generate_usage_example(tool: &ToolDescriptor) -> String {
    let placeholders: Vec<(&str, String)> = tool
        .required_parameters()
        .map(|p| (p.name.as_str(), parameter_placeholder(&p.name)))
        .collect();

    format_call(
        &tool.name,
        placeholders.iter().map(|(name, value)| (*name, value.as_str())),
    )
}

/// Example call for a search-like tool. The first parameter (preferring a
/// required one) carries a realistic query, other required parameters get
/// placeholders.
fn generate_search_example(tool: &ToolDescriptor) -> String {
    let query_param = tool
        .required_parameters()
        .next()
        .or_else(|| tool.parameters.first())
        .map(|p| p.name.as_str());

    let mut arguments: Vec<(&str, String)> = Vec::new();
    if let Some(query_param) = query_param {
        arguments.push((query_param, SEARCH_EXAMPLE_QUERY.to_string()));
    }
    for param in tool.required_parameters() {
        if Some(param.name.as_str()) != query_param {
            arguments.push((param.name.as_str(), parameter_placeholder(&param.name)));
        }
    }

    format_call(
        &tool.name,
        arguments.iter().map(|(name, value)| (*name, value.as_str())),
    )
}

fn generate_examples(catalog: &Catalog) -> String {
    let search_tool = catalog.iter().position(is_search_like);

    let mut examples = catalog
        .iter()
        .enumerate()
        .fold(String::new(), |mut examples, (index, tool)| {
            if Some(index) == search_tool {
                examples.push_str(&format!(
                    "Searching with {}. Note the escaped ampersand in the value:\n",
                    tool.name
                ));
                examples.push_str(&generate_search_example(tool));
            } else {
                examples.push_str(&format!("Calling {}:\n", tool.name));
                examples.push_str(&generate_usage_example(tool));
            }
            examples.push_str("\n\n");
            examples
        });

    // Keep a single trailing newline
    let trimmed_len = examples.trim_end().len();
    examples.truncate(trimmed_len);
    examples.push('\n');
    examples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tools() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new("search", "Search the document store")
                .with_parameter(ToolParameter::required("query", "What to look for"))
                .with_parameter(ToolParameter::optional("limit", "Maximum number of results")),
            ToolDescriptor::new("run_code", "Execute a Python snippet")
                .with_parameter(ToolParameter::required("code", "The code to run (required)"))
                .with_parameter(ToolParameter::optional("timeout", "Seconds before aborting")),
            ToolDescriptor::new("current_time", "Return the current time"),
        ]
    }

    #[test]
    fn test_format_parameter_doc() {
        let param = ToolParameter::optional("path", "Path to the file");
        assert_eq!(format_parameter_doc(&param), "- path: Path to the file");

        let param = ToolParameter::required("path", "Path to the file");
        assert_eq!(
            format_parameter_doc(&param),
            "- path (required): Path to the file"
        );

        // A marker inside the description is not rendered twice
        let param = ToolParameter::required("project", "Project name (required)");
        assert_eq!(
            format_parameter_doc(&param),
            "- project (required): Project name"
        );

        let param = ToolParameter::optional("project", "Project name (required)");
        assert_eq!(format_parameter_doc(&param), "- project: Project name");

        let param = ToolParameter::optional("flag", "");
        assert_eq!(format_parameter_doc(&param), "- flag");
    }

    #[test]
    fn test_render_lists_tools_in_catalog_order() {
        let prompt = render(&sample_tools()).unwrap();

        let search = prompt.find("## search\n").unwrap();
        let run_code = prompt.find("## run_code\n").unwrap();
        let time = prompt.find("## current_time\n").unwrap();
        assert!(search < run_code && run_code < time);

        assert!(prompt.contains("- query (required): What to look for"));
        assert!(prompt.contains("- limit: Maximum number of results"));
        assert!(prompt.contains("- code (required): The code to run"));
        assert!(prompt.contains("Parameters: none"));
        assert_eq!(prompt.matches(REQUIRED_MARKER).count(), 2);
    }

    #[test]
    fn test_render_contains_protocol_rules() {
        let prompt = render(&sample_tools()).unwrap();
        assert!(prompt.contains("exactly one tool per message"));
        assert!(prompt.contains("only content of your message"));
        assert!(prompt.contains("`&` as `&amp;`"));
        assert!(prompt.contains("`'` as `&apos;`"));
    }

    #[test]
    fn test_render_empty_catalog_has_instructions_only() {
        let prompt = render(&[]).unwrap();
        assert!(prompt.contains("# Tool Use"));
        assert!(!prompt.contains("# Available Tools"));
        assert!(!prompt.contains("# Examples"));
        assert!(!prompt.contains("## "));
    }

    #[test]
    fn test_render_rejects_duplicate_names() {
        let mut tools = sample_tools();
        tools.push(ToolDescriptor::new("search", "Shadowing tool"));
        assert_eq!(
            render(&tools),
            Err(CatalogError::DuplicateTool("search".into()))
        );
    }

    #[test]
    fn test_search_example_shows_escaping() {
        let prompt = render(&sample_tools()).unwrap();
        assert!(prompt.contains(
            "<tool_call>\n<tool>search</tool>\n<args>\n<query>dogs &amp; cats</query>\n</args>\n</tool_call>"
        ));
    }

    #[test]
    fn test_every_other_tool_gets_one_example() {
        let prompt = render(&sample_tools()).unwrap();
        assert_eq!(prompt.matches("<tool>run_code</tool>").count(), 1);
        assert_eq!(prompt.matches("<tool>current_time</tool>").count(), 1);
        assert!(prompt.contains("<code>Your code here</code>"));
        // Optional parameters stay out of the examples
        assert!(!prompt.contains("<timeout>"));
        assert!(!prompt.contains("<limit>"));
        assert!(prompt.contains("<tool>current_time</tool>\n<args>\n</args>"));
    }

    #[test]
    fn test_without_search_tool_no_search_example() {
        let tools = vec![ToolDescriptor::new("run_code", "Execute code")
            .with_parameter(ToolParameter::required("code", "Code"))];
        let prompt = render(&tools).unwrap();
        assert!(!prompt.contains("dogs &amp; cats"));
        assert!(prompt.contains("Calling run_code:"));
    }

    #[test]
    fn test_only_first_search_like_tool_gets_search_example() {
        let tools = vec![
            ToolDescriptor::new("web_search", "Search the web")
                .with_parameter(ToolParameter::required("query", "Query")),
            ToolDescriptor::new("file_search", "Search uploaded files")
                .with_parameter(ToolParameter::required("query", "Query"))
                .with_parameter(ToolParameter::required("vector_store", "Store id")),
        ];
        let prompt = render(&tools).unwrap();
        assert_eq!(prompt.matches("dogs &amp; cats").count(), 1);
        assert!(prompt.contains("Calling file_search:"));
        assert!(prompt.contains("<vector_store>vector store here</vector_store>"));
    }

    #[test]
    fn test_search_example_fills_other_required_parameters() {
        let tool = ToolDescriptor::new("search", "Search")
            .with_parameter(ToolParameter::optional("scope", "Where"))
            .with_parameter(ToolParameter::required("query", "What"))
            .with_parameter(ToolParameter::required("project", "Which project"));
        let example = generate_search_example(&tool);
        assert!(example.contains("<query>dogs &amp; cats</query>"));
        assert!(example.contains("<project>project-name</project>"));
        assert!(!example.contains("<scope>"));
    }

    #[test]
    fn test_search_like_predicate() {
        let tool = |name: &str| ToolDescriptor::new(name, "");
        assert!(is_search_like(&tool("search")));
        assert!(is_search_like(&tool("Lookup")));
        assert!(is_search_like(&tool("web_search")));
        assert!(is_search_like(&tool("search_files")));
        assert!(!is_search_like(&tool("research")));
        assert!(!is_search_like(&tool("run_code")));
    }

    #[test]
    fn test_render_is_deterministic() {
        let tools = sample_tools();
        assert_eq!(render(&tools).unwrap(), render(&tools).unwrap());
    }
}
