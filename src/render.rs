//! Terminal rendering of chat turns
//!
//! Responses are untrusted markdown. They are flattened to plain text: fenced
//! code blocks get a frame labelled with their language, raw HTML is printed
//! literally, and control characters are stripped so a reply cannot drive the
//! terminal.

use crate::history::Turn;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

const CODE_RULE: &str = "────────";

/// Render a full turn: user input, then the assistant's response
pub fn render_turn(turn: &Turn) -> String {
    format!(
        "you  > {}\n\n{}\n",
        sanitize(&turn.user_input),
        render_markdown(&turn.response)
    )
}

pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut rendered = String::new();
    let mut list_stack: Vec<Option<u64>> = Vec::new();
    let mut in_code_block = false;

    for event in parser {
        match event {
            Event::Start(tag) => match tag {
                Tag::CodeBlock(kind) => {
                    in_code_block = true;
                    ensure_line_start(&mut rendered);
                    rendered.push_str(CODE_RULE);
                    if let Some(language) = fence_language(&kind) {
                        rendered.push(' ');
                        rendered.push_str(&language);
                        rendered.push(' ');
                        rendered.push_str(CODE_RULE);
                    }
                    rendered.push('\n');
                }
                Tag::List(start) => list_stack.push(start),
                Tag::Item => {
                    ensure_line_start(&mut rendered);
                    let depth = list_stack.len().saturating_sub(1);
                    rendered.push_str(&"  ".repeat(depth));
                    match list_stack.last_mut() {
                        Some(Some(n)) => {
                            rendered.push_str(&format!("{n}. "));
                            *n += 1;
                        }
                        _ => rendered.push_str("• "),
                    }
                }
                Tag::BlockQuote(_) => rendered.push_str("│ "),
                Tag::Strong => rendered.push_str("**"),
                Tag::Emphasis => rendered.push('_'),
                _ => {}
            },
            Event::End(tag_end) => match tag_end {
                TagEnd::CodeBlock => {
                    in_code_block = false;
                    ensure_line_start(&mut rendered);
                    rendered.push_str(CODE_RULE);
                    rendered.push_str("\n\n");
                }
                TagEnd::List(_) => {
                    list_stack.pop();
                    if list_stack.is_empty() {
                        rendered.push('\n');
                    }
                }
                TagEnd::Paragraph | TagEnd::Heading(_) => {
                    if list_stack.is_empty() {
                        rendered.push_str("\n\n");
                    }
                }
                TagEnd::Strong => rendered.push_str("**"),
                TagEnd::Emphasis => rendered.push('_'),
                _ => {}
            },
            Event::Text(text) => {
                if in_code_block {
                    for line in sanitize(&text).split_inclusive('\n') {
                        rendered.push_str("  ");
                        rendered.push_str(line);
                    }
                } else {
                    rendered.push_str(&sanitize(&text));
                }
            }
            Event::Code(text) => {
                rendered.push('`');
                rendered.push_str(&sanitize(&text));
                rendered.push('`');
            }
            Event::Html(text) | Event::InlineHtml(text) => rendered.push_str(&sanitize(&text)),
            Event::SoftBreak | Event::HardBreak => rendered.push('\n'),
            Event::Rule => rendered.push_str("────\n\n"),
            Event::TaskListMarker(checked) => {
                rendered.push_str(if checked { "[x] " } else { "[ ] " });
            }
            _ => {}
        }
    }

    let trimmed = rendered.trim_end_matches('\n').len();
    rendered.truncate(trimmed);
    rendered
}

fn fence_language(kind: &CodeBlockKind<'_>) -> Option<String> {
    match kind {
        CodeBlockKind::Fenced(info) => info
            .split(|c: char| c.is_whitespace() || c == ',')
            .next()
            .filter(|lang| !lang.is_empty())
            .map(sanitize),
        CodeBlockKind::Indented => None,
    }
}

fn ensure_line_start(rendered: &mut String) {
    if !rendered.is_empty() && !rendered.ends_with('\n') {
        rendered.push('\n');
    }
}

/// Drop control characters (escape sequences included), keeping newlines
/// and tabs
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}
