//! Markdown text edits
//!
//! Pure string transformations used by the document accessor. Nothing here
//! touches a live document; every function maps the full current text to
//! the full new text so the caller can commit it with a single write.
//!
//! Frontmatter is edited line by line rather than round-tripped through a
//! YAML serializer, so properties other than the one being merged keep their
//! exact formatting.

use crate::error::{CoreError, CoreResult};
use crate::types::RenderKind;

// =============================================================================
// Frontmatter Detection
// =============================================================================

/// A document split around its leading `---` frontmatter block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frontmatter<'a> {
    /// Opening delimiter line, including its line break
    pub open: &'a str,
    /// Property lines between the delimiters
    pub inner: &'a str,
    /// Closing delimiter line, including its line break if present
    pub close: &'a str,
    /// Everything after the block
    pub body: &'a str,
}

/// Splits off the frontmatter block, if the document starts with one
pub fn split_frontmatter(text: &str) -> Option<Frontmatter<'_>> {
    let first_end = text.find('\n')?;
    if text[..first_end].trim_end() != "---" {
        return None;
    }

    let inner_start = first_end + 1;
    let mut offset = inner_start;
    for line in text[inner_start..].split_inclusive('\n') {
        if line.trim_end() == "---" {
            let close_end = offset + line.len();
            return Some(Frontmatter {
                open: &text[..inner_start],
                inner: &text[inner_start..offset],
                close: &text[offset..close_end],
                body: &text[close_end..],
            });
        }
        offset += line.len();
    }

    None
}

/// Returns the document body, i.e. the text after any frontmatter block
pub fn body(text: &str) -> &str {
    split_frontmatter(text).map(|fm| fm.body).unwrap_or(text)
}

fn detect_newline(text: &str) -> &'static str {
    if text.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

// =============================================================================
// Inline Rendering
// =============================================================================

/// Renders items for insertion at the top of a document.
///
/// Blank items are skipped. Returns an empty string when nothing remains.
pub fn render_items(items: &[String], kind: RenderKind) -> String {
    let items = items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty());

    match kind {
        RenderKind::Tag => items
            .map(tag_token)
            .filter(|tag| tag.len() > 1)
            .collect::<Vec<_>>()
            .join(" "),
        RenderKind::Wikilink => items
            .map(|item| format!("[[{}]]", item))
            .collect::<Vec<_>>()
            .join(" "),
        RenderKind::List => items
            .map(|item| format!("- {}", item))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// `"Project Planning"` -> `#Project-Planning`
fn tag_token(item: &str) -> String {
    let name = item
        .trim_start_matches('#')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!("#{}", name)
}

/// Prepends `rendered` to the body, after any frontmatter block.
///
/// The frontmatter block and the existing body are kept byte-for-byte; a
/// blank line separates the inserted block from the body.
pub fn insert_at_top(text: &str, rendered: &str) -> String {
    if rendered.is_empty() {
        return text.to_string();
    }

    let newline = detect_newline(text);
    let split = split_frontmatter(text)
        .map(|fm| text.len() - fm.body.len())
        .unwrap_or(0);
    let (head, body) = text.split_at(split);

    let mut out = String::with_capacity(text.len() + rendered.len() + 4);
    out.push_str(head);
    if !head.is_empty() && !head.ends_with('\n') {
        out.push_str(newline);
    }
    out.push_str(&rendered.replace('\n', newline));
    out.push_str(newline);
    out.push_str(newline);
    out.push_str(body);
    out
}

// =============================================================================
// Frontmatter Merge
// =============================================================================

/// Appends `value` to the list under `property` in the frontmatter block.
///
/// - No frontmatter: a block holding only `property: [value]` is created.
/// - Missing property: it is appended to the block.
/// - Empty or scalar property: converted to a block list.
/// - Flow (`[a, b]`) and block (`- a`) lists: the value is appended in place.
///
/// Mappings, block scalars and multi-line flow lists are refused with
/// [`CoreError::MutationFailed`] rather than rewritten.
pub fn merge_into_frontmatter(text: &str, property: &str, value: &str) -> CoreResult<String> {
    let property = property.trim();
    if property.is_empty() {
        return Err(CoreError::MutationFailed(
            "metadata property name is empty".to_string(),
        ));
    }

    let newline = detect_newline(text);
    let item = yaml_scalar(value);

    let Some(fm) = split_frontmatter(text) else {
        return Ok(format!(
            "---{nl}{property}:{nl}  - {item}{nl}---{nl}{text}",
            nl = newline
        ));
    };

    let mut lines: Vec<String> = fm.inner.lines().map(str::to_string).collect();
    merge_into_lines(&mut lines, property, &item)?;

    let mut out = String::with_capacity(text.len() + item.len() + 16);
    out.push_str(fm.open);
    for line in &lines {
        out.push_str(line);
        out.push_str(newline);
    }
    out.push_str(fm.close);
    out.push_str(fm.body);
    Ok(out)
}

fn merge_into_lines(lines: &mut Vec<String>, property: &str, item: &str) -> CoreResult<()> {
    let found = lines
        .iter()
        .enumerate()
        .find_map(|(i, line)| split_key(line, property).map(|(colon, rest)| (i, colon, rest)));

    let Some((index, colon, rest)) = found else {
        lines.push(format!("{}:", property));
        lines.push(format!("  - {}", item));
        return Ok(());
    };

    let key = lines[index][..colon].to_string();
    let (value, comment) = split_comment(rest);
    let value = value.trim().to_string();
    let comment = comment.map(str::to_string);

    if value.is_empty() || value == "~" || value == "null" {
        return append_block_item(lines, index, &key, property, item, comment.as_deref());
    }

    if value.starts_with('[') {
        if !value.ends_with(']') {
            return Err(CoreError::MutationFailed(format!(
                "'{}' uses a multi-line flow list",
                property
            )));
        }
        let inner = value[1..value.len() - 1].trim();
        let line = if inner.is_empty() {
            format!("{}: [{}]", key, item)
        } else {
            format!("{}: [{}, {}]", key, inner, item)
        };
        lines[index] = with_comment(line, comment.as_deref());
        return Ok(());
    }

    if value.starts_with('{') || value.starts_with('|') || value.starts_with('>') {
        return Err(CoreError::MutationFailed(format!(
            "'{}' is not a list or a single value",
            property
        )));
    }

    lines[index] = with_comment(format!("{}:", key), comment.as_deref());
    lines.insert(index + 1, format!("  - {}", value));
    lines.insert(index + 2, format!("  - {}", item));
    Ok(())
}

/// Splits a trailing `# comment` off a value, ignoring `#` inside quotes
/// or glued to a word (`a#b`).
fn split_comment(rest: &str) -> (&str, Option<&str>) {
    let mut quote = None;
    let mut prev_is_space = true;

    for (i, c) in rest.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '#' && prev_is_space => {
                return (&rest[..i], Some(rest[i..].trim_end()));
            }
            None => {}
        }
        prev_is_space = c.is_whitespace();
    }

    (rest, None)
}

fn with_comment(line: String, comment: Option<&str>) -> String {
    match comment {
        Some(comment) => format!("{} {}", line, comment),
        None => line,
    }
}

/// Appends to a block sequence that starts after the key line at `index`
fn append_block_item(
    lines: &mut Vec<String>,
    index: usize,
    key: &str,
    property: &str,
    item: &str,
    comment: Option<&str>,
) -> CoreResult<()> {
    let mut last_item = None;
    let mut last_content = index;
    let mut end = index + 1;

    while end < lines.len() {
        let line = &lines[end];
        let trimmed = line.trim_start();
        let indented = line.len() != trimmed.len();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            end += 1;
            continue;
        }
        if trimmed == "-" || trimmed.starts_with("- ") {
            last_item = Some(end);
        } else if !indented {
            break;
        } else if last_item.is_none() {
            return Err(CoreError::MutationFailed(format!(
                "'{}' holds a mapping, not a list",
                property
            )));
        }
        last_content = end;
        end += 1;
    }

    match last_item {
        Some(pos) => {
            let indent_len = lines[pos].len() - lines[pos].trim_start().len();
            let indent = lines[pos][..indent_len].to_string();
            lines.insert(last_content + 1, format!("{}- {}", indent, item));
        }
        None => {
            lines[index] = with_comment(format!("{}:", key), comment);
            lines.insert(index + 1, format!("  - {}", item));
        }
    }
    Ok(())
}

/// Finds `property:` (or `property :`) at the top level of a frontmatter line.
///
/// Returns the byte index where the key text ends and the text after the colon.
fn split_key<'a>(line: &'a str, property: &str) -> Option<(usize, &'a str)> {
    let candidates = [
        property.to_string(),
        format!("\"{}\"", property),
        format!("'{}'", property),
    ];

    candidates.iter().find_map(|candidate| {
        let rest = line.strip_prefix(candidate.as_str())?;
        let padded = rest.trim_start_matches([' ', '\t']);
        let after = padded.strip_prefix(':')?;
        if after.is_empty() || after.starts_with(char::is_whitespace) {
            Some((line.len() - padded.len(), after))
        } else {
            None
        }
    })
}

/// Formats a value as a YAML scalar, quoting when a plain scalar would
/// change meaning or break list syntax.
pub fn yaml_scalar(value: &str) -> String {
    let value = value.trim();
    if needs_quotes(value) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\"", escaped)
    } else {
        value.to_string()
    }
}

fn needs_quotes(value: &str) -> bool {
    const RESERVED: &[&str] = &["true", "false", "null", "yes", "no", "on", "off", "~"];
    const LEADING: &[char] = &[
        '-', '?', ':', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@', '`',
    ];

    value.is_empty()
        || value.parse::<f64>().is_ok()
        || RESERVED.contains(&value.to_ascii_lowercase().as_str())
        || value.starts_with(LEADING)
        || value.contains(": ")
        || value.contains(" #")
        || value.ends_with(':')
        || value.contains(['\n', '\r', '\t', ',', '[', ']', '{', '}'])
}
