//! Page content stream → text.
//!
//! lopdf's content decoder stops at the first token it cannot lex and keeps
//! the operations before it. Inline image data (`BI … ID <binary> EI`) and
//! comments are such tokens, so a page with a logo would silently lose all
//! text after the logo. The stream is therefore cleaned before decoding:
//! inline images and comments are blanked out, and the operators are counted.
//! A decode that yields fewer operations than were counted is a parse error,
//! never partial text.
//!
//! Text is then collected from the show-text operators (`Tj`, `TJ`, `'`,
//! `"`). Moves to a new line (`Td`/`TD` with a vertical offset, `T*`, `'`,
//! `"`, `Tm` at a new baseline) and the end of a text object become `\n`; a
//! horizontal move on the same line becomes a space.

use crate::error::PoQaError;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;
use tracing::debug;

/// A `TJ` adjustment below this (thousandths of text space) reads as a gap.
const TJ_SPACE_THRESHOLD: f32 = -100.0;

/// Extract the text of one page.
pub(crate) fn page_text(
    document: &Document,
    page_num: u32,
    page_id: ObjectId,
) -> Result<String, PoQaError> {
    let raw = document
        .get_page_content(page_id)
        .map_err(|e| page_error(page_num, e.to_string()))?;
    let operations = decode_operations(&raw).map_err(|detail| page_error(page_num, detail))?;

    let encodings: BTreeMap<Vec<u8>, &str> = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect();

    collect_text(&operations, &encodings).map_err(|detail| page_error(page_num, detail))
}

fn page_error(page_num: u32, detail: impl std::fmt::Display) -> PoQaError {
    PoQaError::DocumentParse {
        detail: format!("page {page_num}: {detail}"),
    }
}

// ── Decoding ─────────────────────────────────────────────────────────────

/// Decode a content stream, failing unless every operator was decoded.
pub(crate) fn decode_operations(raw: &[u8]) -> Result<Vec<Operation>, String> {
    let cleaned = clean_stream(raw)?;
    if cleaned.inline_images > 0 {
        debug!("Skipped {} inline image(s)", cleaned.inline_images);
    }

    let content = Content::decode(&cleaned.bytes).map_err(|e| e.to_string())?;
    if content.operations.len() != cleaned.operators {
        return Err(format!(
            "content stream decoded only {} of {} operations",
            content.operations.len(),
            cleaned.operators
        ));
    }
    Ok(content.operations)
}

#[derive(Debug)]
pub(crate) struct CleanStream {
    pub bytes: Vec<u8>,
    pub operators: usize,
    pub inline_images: usize,
}

fn is_white(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' | b'\0')
}

fn is_delimiter(c: u8) -> bool {
    matches!(
        c,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn token_end(data: &[u8], start: usize) -> usize {
    data[start..]
        .iter()
        .position(|&c| is_white(c) || is_delimiter(c))
        .map_or(data.len(), |p| start + p)
}

fn is_operator(token: &[u8]) -> bool {
    match token.first() {
        None => false,
        Some(c) if c.is_ascii_digit() || matches!(c, b'+' | b'-' | b'.') => false,
        Some(_) => !matches!(token, b"true" | b"false" | b"null"),
    }
}

/// End (exclusive) of the literal string opening at `start`.
fn literal_end(data: &[u8], start: usize) -> Result<usize, String> {
    let mut depth = 0usize;
    let mut i = start;
    while i < data.len() {
        match data[i] {
            b'\\' => i += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err("unterminated string in content stream".into())
}

/// Skip an inline image whose `BI` ends at `from`; returns the offset after `EI`.
fn skip_inline_image(data: &[u8], from: usize) -> Result<usize, String> {
    // Image dictionary up to the `ID` keyword.
    let mut i = from;
    let data_start = loop {
        while i < data.len() && is_white(data[i]) {
            i += 1;
        }
        if i >= data.len() {
            return Err("inline image without ID".into());
        }
        if data[i] == b'(' {
            i = literal_end(data, i)?;
        } else if data[i] == b'/' {
            i = token_end(data, i + 1);
        } else if is_delimiter(data[i]) {
            i += 1;
        } else {
            let end = token_end(data, i);
            if &data[i..end] == b"ID" {
                // A single white-space byte separates ID from the data.
                break (end + 1).min(data.len());
            }
            i = end;
        }
    };

    let mut p = data_start;
    while p + 1 < data.len() {
        if &data[p..p + 2] == b"EI"
            && p > 0
            && is_white(data[p - 1])
            && data.get(p + 2).map_or(true, |&c| is_white(c) || is_delimiter(c))
        {
            return Ok(p + 2);
        }
        p += 1;
    }
    Err("inline image without EI".into())
}

/// Blank out inline images and comments; count the operators that remain.
pub(crate) fn clean_stream(data: &[u8]) -> Result<CleanStream, String> {
    let mut out = Vec::with_capacity(data.len());
    let mut operators = 0;
    let mut inline_images = 0;
    let mut i = 0;

    while i < data.len() {
        let c = data[i];
        match c {
            b'%' => {
                while i < data.len() && !matches!(data[i], b'\r' | b'\n') {
                    i += 1;
                }
                out.push(b' ');
            }
            b'(' => {
                let end = literal_end(data, i)?;
                out.extend_from_slice(&data[i..end]);
                i = end;
            }
            b'<' if data.get(i + 1) == Some(&b'<') => {
                out.extend_from_slice(b"<<");
                i += 2;
            }
            b'<' => {
                let end = data[i..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map(|p| i + p + 1)
                    .ok_or("unterminated hex string in content stream")?;
                out.extend_from_slice(&data[i..end]);
                i = end;
            }
            b'/' => {
                let end = token_end(data, i + 1);
                out.extend_from_slice(&data[i..end]);
                i = end;
            }
            b'\0' | b'\x0c' => {
                out.push(b' ');
                i += 1;
            }
            c if is_white(c) || is_delimiter(c) => {
                out.push(c);
                i += 1;
            }
            _ => {
                let end = token_end(data, i);
                let token = &data[i..end];
                if token == b"BI" {
                    i = skip_inline_image(data, end)?;
                    inline_images += 1;
                    out.push(b' ');
                    continue;
                }
                if is_operator(token) {
                    operators += 1;
                }
                out.extend_from_slice(token);
                i = end;
            }
        }
    }

    Ok(CleanStream {
        bytes: out,
        operators,
        inline_images,
    })
}

// ── Text collection ──────────────────────────────────────────────────────

#[derive(Default)]
struct PageText {
    text: String,
}

impl PageText {
    fn line_break(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
    }

    fn word_break(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with(char::is_whitespace) {
            self.text.push(' ');
        }
    }

    fn show(&mut self, encoding: Option<&str>, operand: &Object) {
        match operand {
            Object::String(bytes, _) => self.text.push_str(&Document::decode_text(encoding, bytes)),
            Object::Array(items) => {
                for item in items {
                    match item {
                        Object::String(bytes, _) => {
                            self.text.push_str(&Document::decode_text(encoding, bytes))
                        }
                        other => {
                            if other.as_float().is_ok_and(|n| n < TJ_SPACE_THRESHOLD) {
                                self.word_break();
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

fn number(op: &Operation, index: usize) -> f32 {
    op.operands
        .get(index)
        .and_then(|o| o.as_float().ok())
        .unwrap_or(0.0)
}

fn collect_text(operations: &[Operation], encodings: &BTreeMap<Vec<u8>, &str>) -> Result<String, String> {
    let mut page = PageText::default();
    let mut encoding: Option<&str> = None;
    let mut baseline: Option<f32> = None;

    for op in operations {
        match op.operator.as_str() {
            "Tf" => {
                let font = op
                    .operands
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .ok_or("Tf without a font name")?;
                encoding = encodings.get(font).copied();
            }
            "Tj" => {
                if let Some(s) = op.operands.first() {
                    page.show(encoding, s);
                }
            }
            "TJ" => {
                if let Some(array) = op.operands.first() {
                    page.show(encoding, array);
                }
            }
            "'" | "\"" => {
                page.line_break();
                if let Some(s) = op.operands.last() {
                    page.show(encoding, s);
                }
            }
            "Td" | "TD" => {
                if number(op, 1) != 0.0 {
                    page.line_break();
                } else if number(op, 0) != 0.0 {
                    page.word_break();
                }
            }
            "T*" => page.line_break(),
            "Tm" => {
                let y = number(op, 5);
                match baseline {
                    Some(prev) if (prev - y).abs() < 0.5 => page.word_break(),
                    _ => page.line_break(),
                }
                baseline = Some(y);
            }
            "ET" => page.line_break(),
            _ => {}
        }
    }

    Ok(page.text)
}
