//! Markers of the tool call envelope and helpers shared by renderer and parser.

use crate::escape::escape;
use regex::Regex;
use std::sync::OnceLock;

pub const CALL_OPEN: &str = "<tool_call>";
pub const CALL_CLOSE: &str = "</tool_call>";
pub const NAME_OPEN: &str = "<tool>";
pub const NAME_CLOSE: &str = "</tool>";
pub const ARGS_OPEN: &str = "<args>";
pub const ARGS_CLOSE: &str = "</args>";

fn tag_name_regex() -> &'static Regex {
    static TAG_NAME: OnceLock<Regex> = OnceLock::new();
    TAG_NAME.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_.:-]*$").expect("tag name pattern is valid")
    })
}

/// Whether `name` can be used as an argument element name.
pub fn is_valid_tag_name(name: &str) -> bool {
    tag_name_regex().is_match(name)
}

/// Format a call envelope for `tool` with the given raw (unescaped) arguments.
///
/// The output is what a well-behaved model is expected to emit, one tag per line.
pub fn format_call<'a, I>(tool: &str, arguments: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut call = String::new();
    call.push_str(CALL_OPEN);
    call.push('\n');
    call.push_str(&format!("{NAME_OPEN}{}{NAME_CLOSE}\n", escape(tool)));
    call.push_str(ARGS_OPEN);
    call.push('\n');
    for (name, value) in arguments {
        call.push_str(&format!("<{name}>{}</{name}>\n", escape(value)));
    }
    call.push_str(ARGS_CLOSE);
    call.push('\n');
    call.push_str(CALL_CLOSE);
    call
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_names() {
        assert!(is_valid_tag_name("query"));
        assert!(is_valid_tag_name("_private"));
        assert!(is_valid_tag_name("max-depth"));
        assert!(is_valid_tag_name("ns:key.v2"));

        assert!(!is_valid_tag_name(""));
        assert!(!is_valid_tag_name("1st"));
        assert!(!is_valid_tag_name("two words"));
        assert!(!is_valid_tag_name("/query"));
        assert!(!is_valid_tag_name("a<b"));
    }

    #[test]
    fn test_format_call_escapes_values() {
        let call = format_call("search", [("query", "dogs & cats")]);
        assert_eq!(
            call,
            "<tool_call>\n<tool>search</tool>\n<args>\n<query>dogs &amp; cats</query>\n</args>\n</tool_call>"
        );
    }

    #[test]
    fn test_format_call_without_arguments() {
        let call = format_call("list_projects", std::iter::empty());
        assert_eq!(
            call,
            "<tool_call>\n<tool>list_projects</tool>\n<args>\n</args>\n</tool_call>"
        );
    }
}
