//! Row transforms turning one JSONL record into report and artifact texts.
//!
//! A transform returns `None` when the row does not qualify; the loader then
//! skips the whole row.

use super::DatasetType;
use serde_json::Value;

/// Reports shorter than this many words are skipped.
pub const MIN_NL_WORDS: usize = 10;
/// Methods need at least this many non-empty lines.
pub const MIN_METHOD_LINES: f64 = 3.0;
/// Share of added lines a method needs to count as touched by the fix.
pub const MIN_ADDED_RATIO: f64 = 0.35;

const SEPARATED_SYMBOLS: &[char] = &[
    '.', ',', ':', ';', '`', '"', '\'', '(', ')', '[', ']', '{', '}', '?', '!', '*',
];

const MISSING_MARKERS: &[&str] = &["None", "nan", "NaN"];

pub fn nl_transform(kind: DatasetType, row: &Value) -> Option<String> {
    match kind {
        DatasetType::Codesearchnet => docstring_nl(row),
        DatasetType::IssueMethod | DatasetType::IssueCodelines => issue_nl(row),
    }
}

pub fn pl_transform(kind: DatasetType, row: &Value) -> Option<String> {
    match kind {
        DatasetType::Codesearchnet => str_field(row, "code").map(str::to_string),
        DatasetType::IssueMethod => method_pl(row),
        DatasetType::IssueCodelines => codelines_pl(row),
    }
}

fn str_field<'a>(row: &'a Value, name: &str) -> Option<&'a str> {
    row.get(name)?.as_str()
}

fn cut_at<'a>(text: &'a str, marker: &str) -> &'a str {
    match text.find(marker) {
        Some(i) => &text[..i],
        None => text,
    }
}

fn is_url(word: &str) -> bool {
    word.starts_with("http://") || word.starts_with("https://")
}

/// First docstring paragraph, when its tokenized form has enough words.
fn docstring_nl(row: &Value) -> Option<String> {
    let tokens = row.get("docstring_tokens")?.as_array()?;
    let joined = tokens
        .iter()
        .filter_map(Value::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    if cut_at(&joined, "<p >").split_whitespace().count() < MIN_NL_WORDS {
        return None;
    }
    let docstring = str_field(row, "docstring")?;
    Some(cut_at(docstring, "<p>").to_string())
}

/// Issue title and body, joined into one text without URLs.
fn issue_nl(row: &Value) -> Option<String> {
    let present = |name: &str| {
        str_field(row, name).filter(|s| !MISSING_MARKERS.contains(s))
    };
    let title = present("issue_title");
    let body = present("issue_body");

    let mut text = String::new();
    if let Some(title) = title {
        text.push_str(title);
    }
    if let Some(body) = body {
        if title.is_some() {
            let ends_sentence = text
                .trim_end()
                .chars()
                .last()
                .map_or(true, |c| c == '.' || c == ';');
            if !ends_sentence {
                text.push('.');
            }
            text.push('\n');
        }
        text.push_str(body);
    }

    let tokens = issue_tokens(&text);
    let mut joined = tokens.join(" ");
    if joined.ends_with('.') {
        joined.pop();
    }
    if joined.split_whitespace().count() < MIN_NL_WORDS {
        return None;
    }

    Some(strip_urls(&text))
}

/// Splits issue text at boundaries between punctuation and other characters,
/// dropping URLs and a leading `[tag]` word on each line.
pub fn issue_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for line in text.lines() {
        let mut words = line.split_whitespace().peekable();
        if words.peek().is_some_and(|w| w.starts_with('[')) {
            words.next();
        }
        for word in words.filter(|w| !is_url(w)) {
            let mut current = String::new();
            let mut last_is_symbol = false;
            for ch in word.chars() {
                let is_symbol = SEPARATED_SYMBOLS.contains(&ch);
                if !current.is_empty() && is_symbol != last_is_symbol {
                    tokens.push(std::mem::take(&mut current));
                }
                current.push(ch);
                last_is_symbol = is_symbol;
            }
            if !current.is_empty() {
                tokens.push(current);
            }
        }
    }
    tokens
}

fn strip_urls(text: &str) -> String {
    let mut result = text.to_string();
    for word in text.split_whitespace().filter(|w| is_url(w)) {
        if let Some(i) = result.find(word) {
            result.replace_range(i..i + word.len(), "");
        }
    }
    result
}

/// Method body, when enough of it was added by the fixing commit.
fn method_pl(row: &Value) -> Option<String> {
    let method_lines = row.get("method_nonempty_lines")?.as_f64()?;
    let added_lines = row.get("added_nonempty_lines")?.as_f64()?;
    if method_lines < MIN_METHOD_LINES || added_lines / method_lines < MIN_ADDED_RATIO {
        return None;
    }
    str_field(row, "code").map(str::to_string)
}

/// Commit subject line followed by the changed code lines.
fn codelines_pl(row: &Value) -> Option<String> {
    let message = str_field(row, "commit_message")?;
    let code = str_field(row, "code")?;
    let subject = message.lines().next().unwrap_or("");
    let mut pl = format!("{}\n{}", subject, code);
    if pl.starts_with('\n') {
        pl.remove(0);
    }
    Some(pl)
}
