//! Recovers a single validated tool call from raw model output.

use crate::error::{ParseError, ParseErrorKind};
use crate::escape::unescape;
use crate::grammar::{
    is_valid_tag_name, ARGS_CLOSE, ARGS_OPEN, CALL_CLOSE, CALL_OPEN, NAME_CLOSE, NAME_OPEN,
};
use crate::types::{Catalog, ToolCall, ToolDescriptor};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, trace};

/// What to do with further calls after the first accepted one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingCallPolicy {
    /// Accept the first call and ignore the rest of the message
    #[default]
    Ignore,
    /// Fail with `TrailingToolCall` if another call marker follows
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub trailing_calls: TrailingCallPolicy,
}

/// Location of the first call envelope in the raw text
struct Envelope {
    /// Whole envelope including both markers
    outer: Range<usize>,
    /// Content between the markers
    inner: Range<usize>,
}

/// Parser bound to one catalog snapshot
#[derive(Debug, Clone, Copy)]
pub struct Parser<'a> {
    catalog: &'a Catalog,
    options: ParseOptions,
}

impl<'a> Parser<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            options: ParseOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Extract, resolve and validate the first tool call in `raw`.
    pub fn parse(&self, raw: &str) -> Result<ToolCall, ParseError> {
        let envelope = find_envelope(raw)?;
        let outer = &raw[envelope.outer.clone()];
        let body = &raw[envelope.inner.clone()];
        trace!("Found tool call envelope:\n{}", outer);

        let args_block = find_args_block(body, outer)?;

        let name = extract_tool_name(body, args_block.as_ref(), outer)?;
        let descriptor = self.catalog.get(&name).ok_or_else(|| {
            debug!("Model requested unknown tool '{}'", name);
            ParseError::new(ParseErrorKind::UnknownTool(name.clone()), outer)
        })?;

        let arguments = match args_block {
            Some(range) => extract_arguments(&body[range], outer)?,
            None => IndexMap::new(),
        };

        validate_required(descriptor, &arguments, outer)?;

        for key in arguments.keys() {
            if descriptor.parameter(key).is_none() {
                debug!("Tool '{}' called with undeclared argument '{}'", name, key);
            }
        }

        if self.options.trailing_calls == TrailingCallPolicy::Reject
            && raw[envelope.outer.end..].contains(CALL_OPEN)
        {
            return Err(ParseError::new(
                ParseErrorKind::TrailingToolCall,
                &raw[envelope.outer.end..],
            ));
        }

        debug!(
            "Accepted call to '{}' with {} arguments",
            name,
            arguments.len()
        );
        Ok(ToolCall::new(name, arguments, envelope.outer))
    }
}

/// Parse the first tool call in `raw` against `catalog` with default options.
pub fn parse(raw: &str, catalog: &Catalog) -> Result<ToolCall, ParseError> {
    Parser::new(catalog).parse(raw)
}

/// Cut `raw` right after the envelope of `call`, dropping anything the model
/// wrote after its tool call.
pub fn truncate_after_call<'r>(raw: &'r str, call: &ToolCall) -> &'r str {
    raw.get(..call.span().end).unwrap_or(raw)
}

fn malformed(reason: impl Into<String>, fragment: &str) -> ParseError {
    ParseError::new(ParseErrorKind::MalformedEnvelope(reason.into()), fragment)
}

fn find_envelope(raw: &str) -> Result<Envelope, ParseError> {
    let start = raw
        .find(CALL_OPEN)
        .ok_or_else(|| ParseError::new(ParseErrorKind::NoToolCall, raw))?;
    let inner_start = start + CALL_OPEN.len();
    let rest = &raw[inner_start..];

    let close = rest
        .find(CALL_CLOSE)
        .ok_or_else(|| malformed(format!("missing closing {CALL_CLOSE}"), &raw[start..]))?;

    if let Some(nested) = rest.find(CALL_OPEN) {
        if nested < close {
            return Err(malformed(
                format!("a second {CALL_OPEN} starts before the first one is closed"),
                &raw[start..],
            ));
        }
    }

    let inner_end = inner_start + close;
    Ok(Envelope {
        outer: start..inner_end + CALL_CLOSE.len(),
        inner: inner_start..inner_end,
    })
}

/// Byte range of the content of the `<args>` block inside `body`, if any.
fn find_args_block(body: &str, fragment: &str) -> Result<Option<Range<usize>>, ParseError> {
    let Some(open) = body.find(ARGS_OPEN) else {
        return Ok(None);
    };
    let content_start = open + ARGS_OPEN.len();
    let close = body[content_start..]
        .find(ARGS_CLOSE)
        .ok_or_else(|| malformed(format!("missing closing {ARGS_CLOSE}"), fragment))?;
    Ok(Some(content_start..content_start + close))
}

/// The `<tool>` element must sit outside the arguments block.
fn extract_tool_name(
    body: &str,
    args_block: Option<&Range<usize>>,
    fragment: &str,
) -> Result<String, ParseError> {
    let (before_args, after_args) = match args_block {
        Some(range) => (
            &body[..range.start - ARGS_OPEN.len()],
            &body[range.end + ARGS_CLOSE.len()..],
        ),
        None => (body, ""),
    };

    let region = if before_args.contains(NAME_OPEN) {
        before_args
    } else if after_args.contains(NAME_OPEN) {
        after_args
    } else {
        return Err(ParseError::new(ParseErrorKind::MissingToolName, fragment));
    };

    let open = region.find(NAME_OPEN).unwrap_or_default() + NAME_OPEN.len();
    let close = region[open..]
        .find(NAME_CLOSE)
        .ok_or_else(|| malformed(format!("missing closing {NAME_CLOSE}"), fragment))?;

    let name = unescape(&region[open..open + close]).trim().to_string();
    if name.is_empty() {
        return Err(ParseError::new(ParseErrorKind::MissingToolName, fragment));
    }

    trace!("Found tool name: {}", name);
    Ok(name)
}

/// Read `<name>value</name>` children of the arguments block. Later
/// duplicates overwrite earlier values.
fn extract_arguments(
    content: &str,
    fragment: &str,
) -> Result<IndexMap<String, String>, ParseError> {
    let mut arguments = IndexMap::new();
    let mut rest = content;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        if !rest.starts_with('<') {
            match rest.find('<') {
                Some(next_tag) => {
                    trace!("Skipping stray text in args: {:?}", &rest[..next_tag]);
                    rest = &rest[next_tag..];
                    continue;
                }
                None => {
                    trace!("Skipping trailing stray text in args: {:?}", rest);
                    break;
                }
            }
        }

        let tag_end = rest
            .find('>')
            .ok_or_else(|| malformed("unterminated argument tag", fragment))?;
        let tag = &rest[1..tag_end];

        if let Some(closing) = tag.strip_prefix('/') {
            return Err(malformed(
                format!("unexpected closing tag </{closing}> in arguments"),
                fragment,
            ));
        }

        if let Some(name) = tag.strip_suffix('/') {
            let name = name.trim_end();
            if !is_valid_tag_name(name) {
                return Err(malformed(format!("invalid argument tag <{tag}>"), fragment));
            }
            record_argument(&mut arguments, name, String::new());
            rest = &rest[tag_end + 1..];
            continue;
        }

        if !is_valid_tag_name(tag) {
            return Err(malformed(format!("invalid argument tag <{tag}>"), fragment));
        }

        let value_start = &rest[tag_end + 1..];
        let closing = format!("</{tag}>");
        let value_end = value_start
            .find(&closing)
            .ok_or_else(|| malformed(format!("argument <{tag}> is not closed"), fragment))?;

        let value = unescape(&value_start[..value_end]).into_owned();
        trace!("Found argument {}: {:?}", tag, value);
        record_argument(&mut arguments, tag, value);

        rest = &value_start[value_end + closing.len()..];
    }

    Ok(arguments)
}

fn record_argument(arguments: &mut IndexMap<String, String>, name: &str, value: String) {
    if arguments.insert(name.to_string(), value).is_some() {
        debug!("Argument '{}' given more than once, keeping the last value", name);
    }
}

fn validate_required(
    descriptor: &ToolDescriptor,
    arguments: &IndexMap<String, String>,
    fragment: &str,
) -> Result<(), ParseError> {
    let missing: Vec<String> = descriptor
        .required_parameters()
        .filter(|param| {
            arguments
                .get(&param.name)
                .map_or(true, |value| value.is_empty())
        })
        .map(|param| param.name.clone())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ParseError::new(
            ParseErrorKind::MissingRequiredParameter(missing),
            fragment,
        ))
    }
}
