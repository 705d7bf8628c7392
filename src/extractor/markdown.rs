//! Block-by-block Markdown rendering of a pruned container.
//!
//! Every allow-listed descendant is a render unit and produces exactly one
//! block followed by a blank line, in document order. Nested units are not
//! deduplicated: a `ul` renders as a whole list and each of its `li` children
//! renders again as its own block.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

use crate::extractor::dom::{Document, ElementKind, NodeData, NodeId};
use crate::extractor::model::{MarkdownOptions, normalize_whitespace};

const BLOCK_SEPARATOR: &str = "\n\n";

/// Nesting of lists and blockquotes rendered as structure; deeper units are
/// flattened into text.
const MAX_BLOCK_DEPTH: usize = 32;

static COLLAPSE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static INLINE_ESCAPE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\\*_`\[\]])").unwrap());
static LINE_START_ESCAPES: LazyLock<[(Regex, &'static str); 5]> = LazyLock::new(|| {
    [
        (Regex::new(r"(?m)^(#{1,6}) ").unwrap(), r"\$1 "),
        (Regex::new(r"(?m)^>").unwrap(), r"\>"),
        (Regex::new(r"(?m)^([-+]) ").unwrap(), r"\$1 "),
        (Regex::new(r"(?m)^(=+)").unwrap(), r"\$1"),
        (Regex::new(r"(?m)^(\d+)\. ").unwrap(), r"$1\. "),
    ]
});

/// Renders every render unit below `container` and concatenates the blocks.
pub fn render(document: &Document, container: NodeId, options: &MarkdownOptions) -> String {
    let mut output = String::new();
    for unit in render_units(document, container, options) {
        output.push_str(&render_block(document, unit, options));
        output.push_str(BLOCK_SEPARATOR);
    }
    output
}

/// Allow-listed descendants of `container`, in document order.
pub fn render_units(
    document: &Document,
    container: NodeId,
    options: &MarkdownOptions,
) -> Vec<NodeId> {
    document
        .select_all(container, |element| is_render_unit(element.kind(), options))
        .into_iter()
        .filter(|&node| node != container)
        .collect()
}

fn is_render_unit(kind: ElementKind, options: &MarkdownOptions) -> bool {
    match kind {
        ElementKind::Heading(_)
        | ElementKind::Paragraph
        | ElementKind::UnorderedList
        | ElementKind::OrderedList
        | ElementKind::ListItem
        | ElementKind::Blockquote => true,
        ElementKind::Table => options.tables,
        _ => false,
    }
}

fn render_block(document: &Document, node: NodeId, options: &MarkdownOptions) -> String {
    render_block_at(document, node, options, 0)
}

fn render_block_at(
    document: &Document,
    node: NodeId,
    options: &MarkdownOptions,
    depth: usize,
) -> String {
    match document.kind(node) {
        Some(ElementKind::Heading(level)) => {
            let content = inline_content(document, node, options).replace('\n', " ");
            if content.is_empty() {
                String::new()
            } else {
                format!("{} {}", "#".repeat(usize::from(level)), content)
            }
        }
        Some(ElementKind::UnorderedList | ElementKind::OrderedList) => {
            render_list(document, node, options, depth)
        }
        Some(ElementKind::ListItem) => {
            let marker = item_marker(document, node);
            render_list_item(document, node, options, &marker, depth)
        }
        Some(ElementKind::Blockquote) => render_blockquote(document, node, options, depth),
        Some(ElementKind::Table) if options.tables => render_table(document, node, options),
        _ => inline_content(document, node, options),
    }
}

fn render_list(
    document: &Document,
    list: NodeId,
    options: &MarkdownOptions,
    depth: usize,
) -> String {
    let ordered = document.kind(list) == Some(ElementKind::OrderedList);
    let start = list_start(document, list);

    list_items(document, list)
        .enumerate()
        .map(|(index, item)| {
            let marker = if ordered {
                ordinal_marker(start, index)
            } else {
                "- ".to_string()
            };
            render_list_item(document, item, options, &marker, depth)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn list_items(document: &Document, list: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    document
        .children(list)
        .iter()
        .copied()
        .filter(|&child| document.kind(child) == Some(ElementKind::ListItem))
}

/// The `start` attribute as written, negative values included.
fn list_start(document: &Document, list: NodeId) -> i64 {
    document
        .get_attribute(list, "start")
        .and_then(|start| start.trim().parse().ok())
        .unwrap_or(1)
}

fn ordinal_marker(start: i64, index: usize) -> String {
    let offset = i64::try_from(index).unwrap_or(i64::MAX);
    format!("{}. ", start.saturating_add(offset))
}

/// Marker for an item rendered on its own, numbered from its enclosing list.
fn item_marker(document: &Document, item: NodeId) -> String {
    let Some(list) = document.parent(item) else {
        return "- ".to_string();
    };
    if document.kind(list) != Some(ElementKind::OrderedList) {
        return "- ".to_string();
    }
    let index = list_items(document, list)
        .position(|sibling| sibling == item)
        .unwrap_or(0);
    ordinal_marker(list_start(document, list), index)
}

fn render_list_item(
    document: &Document,
    item: NodeId,
    options: &MarkdownOptions,
    marker: &str,
    depth: usize,
) -> String {
    let indent = " ".repeat(marker.len());
    let mut raw = String::new();
    let mut nested = Vec::new();
    for &child in document.children(item) {
        match document.kind(child) {
            Some(ElementKind::UnorderedList | ElementKind::OrderedList)
                if depth < MAX_BLOCK_DEPTH =>
            {
                nested.push(render_list(document, child, options, depth + 1));
            }
            _ => push_inline(document, child, options, &mut raw),
        }
    }

    let content = finish_inline(&raw);
    let mut out = format!("{marker}{}", indent_lines(&content, &indent, false));
    for list in nested {
        out.push('\n');
        out.push_str(&indent_lines(&list, &indent, true));
    }
    out
}

fn indent_lines(text: &str, indent: &str, first: bool) -> String {
    text.lines()
        .enumerate()
        .map(|(index, line)| {
            if line.is_empty() || (index == 0 && !first) {
                line.to_string()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_blockquote(
    document: &Document,
    quote: NodeId,
    options: &MarkdownOptions,
    depth: usize,
) -> String {
    render_children_as_blocks(document, quote, options, depth)
        .lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Children of `node` as blocks: nested render units become blocks of their
/// own, runs of inline content between them become paragraphs. Past
/// `MAX_BLOCK_DEPTH` nested units are flattened into the surrounding text.
fn render_children_as_blocks(
    document: &Document,
    node: NodeId,
    options: &MarkdownOptions,
    depth: usize,
) -> String {
    let mut blocks = Vec::new();
    let mut raw = String::new();
    for &child in document.children(node) {
        match document.kind(child) {
            Some(kind) if is_render_unit(kind, options) && depth < MAX_BLOCK_DEPTH => {
                flush_paragraph(&mut raw, &mut blocks);
                blocks.push(render_block_at(document, child, options, depth + 1));
            }
            _ => push_inline(document, child, options, &mut raw),
        }
    }
    flush_paragraph(&mut raw, &mut blocks);

    blocks.retain(|block| !block.is_empty());
    blocks.join(BLOCK_SEPARATOR)
}

fn flush_paragraph(raw: &mut String, blocks: &mut Vec<String>) {
    let paragraph = finish_inline(raw);
    if !paragraph.is_empty() {
        blocks.push(paragraph);
    }
    raw.clear();
}

fn render_table(document: &Document, table: NodeId, options: &MarkdownOptions) -> String {
    document
        .select_all(table, |element| element.kind() == ElementKind::TableRow)
        .into_iter()
        .filter(|&row| nearest_table(document, row) == Some(table))
        .map(|row| {
            let mut line = String::from("|");
            for &cell in document.children(row) {
                if document.kind(cell) != Some(ElementKind::TableCell) {
                    continue;
                }
                let content = inline_content(document, cell, options)
                    .replace('\n', " ")
                    .replace('|', r"\|");
                line.push(' ');
                line.push_str(&content);
                line.push_str(" |");
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn nearest_table(document: &Document, node: NodeId) -> Option<NodeId> {
    document
        .ancestors(node)
        .find(|&ancestor| document.kind(ancestor) == Some(ElementKind::Table))
}

/// Inline rendering of everything below `node`, whitespace-normalized.
fn inline_content(document: &Document, node: NodeId, options: &MarkdownOptions) -> String {
    let mut raw = String::new();
    for &child in document.children(node) {
        push_inline(document, child, options, &mut raw);
    }
    finish_inline(&raw)
}

/// Work item of the inline walk. Wrappers record where their content starts
/// in the output and are closed once every child has been emitted.
enum Step<'a> {
    Enter(NodeId),
    Wrap { start: usize, delimiter: &'static str },
    Link { start: usize, href: &'a str },
    Newline,
}

/// Appends the inline Markdown of `node` and its subtree to `out`.
///
/// Walks with an explicit stack so nesting depth is bounded by the heap, not
/// the thread stack.
fn push_inline(document: &Document, node: NodeId, options: &MarkdownOptions, out: &mut String) {
    let mut stack = vec![Step::Enter(node)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(node) => enter_inline(document, node, options, out, &mut stack),
            Step::Wrap { start, delimiter } => {
                let content = out.split_off(start);
                push_wrapped(&content, delimiter, out);
            }
            Step::Link { start, href } => {
                let content = out.split_off(start);
                if content.trim().is_empty() {
                    out.push_str(&content);
                } else {
                    out.push('[');
                    out.push_str(content.trim());
                    out.push_str("](");
                    out.push_str(&link_destination(href));
                    out.push(')');
                }
            }
            Step::Newline => out.push('\n'),
        }
    }
}

fn enter_inline<'a>(
    document: &'a Document,
    node: NodeId,
    options: &MarkdownOptions,
    out: &mut String,
    stack: &mut Vec<Step<'a>>,
) {
    let element = match document.data(node) {
        NodeData::Text(text) => {
            let collapsed = COLLAPSE_REGEX.replace_all(text, " ");
            out.push_str(&INLINE_ESCAPE_REGEX.replace_all(&collapsed, r"\$1"));
            return;
        }
        NodeData::Element(element) => element,
        NodeData::Document => return,
    };

    match element.kind() {
        ElementKind::Strong => stack.push(Step::Wrap {
            start: out.len(),
            delimiter: "**",
        }),
        ElementKind::Emphasis => stack.push(Step::Wrap {
            start: out.len(),
            delimiter: "*",
        }),
        ElementKind::Code => {
            let code = document.text_of(node);
            if !code.is_empty() {
                out.push('`');
                out.push_str(&code);
                out.push('`');
            }
            return;
        }
        ElementKind::Link => {
            let href = element.attr("href").map(str::trim).filter(|h| !h.is_empty());
            if let Some(href) = href.filter(|_| !options.strip_links) {
                stack.push(Step::Link {
                    start: out.len(),
                    href,
                });
            }
        }
        ElementKind::Image => {
            if !options.strip_images
                && let Some(src) = element.attr("src").filter(|src| !src.is_empty())
            {
                let alt = element.attr("alt").filter(|alt| !alt.is_empty()).unwrap_or("image");
                out.push_str(&format!("![{alt}]({})", link_destination(src)));
            }
            return;
        }
        ElementKind::LineBreak => {
            out.push('\n');
            return;
        }
        ElementKind::Script | ElementKind::Style => return,
        ElementKind::Paragraph
        | ElementKind::Heading(_)
        | ElementKind::Blockquote
        | ElementKind::UnorderedList
        | ElementKind::OrderedList
        | ElementKind::ListItem
        | ElementKind::Table
        | ElementKind::TableRow => {
            out.push('\n');
            stack.push(Step::Newline);
        }
        ElementKind::TableCell | ElementKind::Other => {}
    }

    stack.extend(document.children(node).iter().rev().map(|&child| Step::Enter(child)));
}

/// Wraps content in `delimiter`, keeping surrounding whitespace outside so
/// `a<b> b </b>c` becomes `a **b** c`.
fn push_wrapped(content: &str, delimiter: &str, out: &mut String) {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        out.push_str(content);
        return;
    }
    if content.starts_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(delimiter);
    out.push_str(trimmed);
    out.push_str(delimiter);
    if content.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

/// Link target as written, or `<...>` when it holds characters that would
/// end a bare destination early.
fn link_destination(target: &str) -> Cow<'_, str> {
    if target.contains(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | '<' | '>')) {
        let escaped = target
            .replace('<', "%3C")
            .replace('>', "%3E")
            .replace(char::is_whitespace, "%20");
        Cow::Owned(format!("<{escaped}>"))
    } else {
        Cow::Borrowed(target)
    }
}

/// Collapses the raw inline accumulation into clean lines and escapes
/// line starts that Markdown would read as block syntax.
fn finish_inline(raw: &str) -> String {
    let normalized = normalize_whitespace(raw);
    let trimmed = normalized
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    escape_line_starts(&trimmed)
}

fn escape_line_starts(text: &str) -> String {
    LINE_START_ESCAPES
        .iter()
        .fold(text.to_string(), |acc, (regex, replacement)| {
            regex.replace_all(&acc, *replacement).into_owned()
        })
}
