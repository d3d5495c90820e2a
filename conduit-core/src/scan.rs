//! Keyword lookup over SQL text.
//!
//! Only top-level occurrences count: text inside parentheses, quoted literals,
//! quoted identifiers and comments is skipped. Keywords match case-insensitively
//! on word boundaries, multi-word keywords (`ORDER BY`) accept any whitespace run
//! between their words.

use crate::{DataError, Result};
use std::ops::Range;

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn skip_quoted(bytes: &[u8], start: usize, close: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == close {
            if bytes.get(i + 1) == Some(&close) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn match_words(bytes: &[u8], start: usize, words: &[&[u8]]) -> Option<usize> {
    let mut pos = start;
    for (k, word) in words.iter().enumerate() {
        if k > 0 {
            let spaces = bytes[pos..]
                .iter()
                .take_while(|b| b.is_ascii_whitespace())
                .count();
            if spaces == 0 {
                return None;
            }
            pos += spaces;
        }
        let end = pos + word.len();
        if end > bytes.len() || !bytes[pos..end].eq_ignore_ascii_case(word) {
            return None;
        }
        pos = end;
    }
    if pos < bytes.len() && is_word_byte(bytes[pos]) {
        return None;
    }
    Some(pos)
}

/// Byte ranges of every top-level occurrence of `keyword` in `sql`.
pub fn top_level_keywords(sql: &str, keyword: &str) -> Vec<Range<usize>> {
    let bytes = sql.as_bytes();
    let words: Vec<&[u8]> = keyword.split_whitespace().map(str::as_bytes).collect();
    let mut found = Vec::new();
    if words.is_empty() {
        return found;
    }
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                i = skip_quoted(bytes, i, quote);
                continue;
            }
            b'[' => {
                i = skip_quoted(bytes, i, b']');
                continue;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = bytes[i..]
                    .iter()
                    .position(|b| *b == b'\n')
                    .map_or(bytes.len(), |p| i + p + 1);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = sql[i + 2..].find("*/").map_or(bytes.len(), |p| i + 2 + p + 2);
                continue;
            }
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b if depth == 0 && is_word_byte(b) && (i == 0 || !is_word_byte(bytes[i - 1])) => {
                if let Some(end) = match_words(bytes, i, &words) {
                    found.push(i..end);
                    i = end;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }
    found
}

/// First top-level occurrence of `keyword`.
pub fn find_keyword(sql: &str, keyword: &str) -> Option<Range<usize>> {
    top_level_keywords(sql, keyword).into_iter().next()
}

/// Last top-level occurrence of `keyword`.
pub fn rfind_keyword(sql: &str, keyword: &str) -> Option<Range<usize>> {
    top_level_keywords(sql, keyword).pop()
}

/// Length of `keyword` when `sql` starts with it, leading whitespace included.
pub fn leading_keyword(sql: &str, keyword: &str) -> Option<usize> {
    let words: Vec<&[u8]> = keyword.split_whitespace().map(str::as_bytes).collect();
    let start = sql.len() - sql.trim_start().len();
    match_words(sql.as_bytes(), start, &words)
}

/// Statement text without surrounding whitespace and trailing semicolons.
pub fn trim_statement(sql: &str) -> &str {
    sql.trim().trim_end_matches(';').trim_end()
}

/// Splits `sql` at its trailing top-level `ORDER BY`: the body and the whole ordering clause.
pub fn split_order_by(sql: &str) -> (&str, Option<&str>) {
    match rfind_keyword(sql, "ORDER BY") {
        Some(range) => (sql[..range.start].trim_end(), Some(sql[range.start..].trim())),
        None => (sql, None),
    }
}

/// Fails unless `sql` has a top-level `ORDER BY`.
pub fn require_order_by(sql: &str) -> Result<()> {
    if rfind_keyword(sql, "ORDER BY").is_none() {
        return Err(DataError::format(
            "Paging requires an explicit ordering: the query has no top-level ORDER BY",
        ));
    }
    Ok(())
}
