//! Brace-balanced expression scanning.
//!
//! Expressions are captured as raw text: scanning only has to find the
//! boundary. That means tracking bracket depth while skipping over string
//! literals, template literals (including `${}` holes), and comments, and
//! recognizing markup embedded inside the expression, which is consumed by
//! bracket-counting and re-parsed as a nested fragment.

use crate::ast::{Expression, Fragment};
use crate::error::{ErrorCode, ParseError};
use crate::html::{is_bracket_close, is_bracket_open, is_void};
use crate::parser::Parser;
use source_span::Span;

/// Embedded markup may re-enter the parser; past this depth the input is
/// assumed adversarial.
const MAX_MARKUP_DEPTH: usize = 24;

impl<'a> Parser<'a> {
    /// Reads a `{expr}` body. The cursor starts just past the opening `{`
    /// and is left on the closing `}`, which is not consumed.
    pub(crate) fn read_expression(&mut self) -> Result<Expression, ParseError> {
        self.read_expression_until('}', &[])
    }

    /// Reads an expression body until the bracket pairing with `close`
    /// balances out, or until one of `stop_keywords` appears
    /// whitespace-bounded at bracket depth zero. The terminator is not
    /// consumed; for a keyword stop the cursor is left on its first
    /// character.
    pub(crate) fn read_expression_until(
        &mut self,
        close: char,
        stop_keywords: &[&str],
    ) -> Result<Expression, ParseError> {
        let open = match close {
            ')' => '(',
            _ => '{',
        };
        let start = self.index;
        // the opener was already consumed by the caller
        let mut close_depth: u32 = 1;
        // all bracket kinds, for keyword-stop gating
        let mut total_depth: i64 = 0;
        let mut embedded: Option<(usize, Fragment, usize)> = None;

        loop {
            let Some(c) = self.char_at(self.index) else {
                return Err(self.eof_error());
            };
            if c == close {
                close_depth -= 1;
                if close_depth == 0 {
                    break;
                }
                total_depth -= 1;
                self.index += 1;
                continue;
            }
            if c == open {
                close_depth += 1;
                total_depth += 1;
                self.index += 1;
                continue;
            }
            match c {
                '"' | '\'' => {
                    self.index = self.skip_string(self.index, c)?;
                }
                '`' => {
                    self.index = self.skip_template_literal(self.index)?;
                }
                '/' if self.template[self.index..].starts_with("//") => {
                    self.index = self.template[self.index..]
                        .find('\n')
                        .map_or(self.template.len(), |n| self.index + n);
                }
                '/' if self.template[self.index..].starts_with("/*") => {
                    self.index = self.skip_block_comment(self.index)?;
                }
                '<' if embedded.is_none() && self.markup_follows() => {
                    let markup_start = self.index;
                    let markup_end = self.skip_embedded_markup(markup_start)?;
                    let snippet = &self.template[markup_start..markup_end];
                    let fragment = self.parse_embedded_fragment(snippet, markup_start)?;
                    embedded = Some((markup_start, fragment, markup_end));
                    self.index = markup_end;
                }
                c if is_bracket_open(c) => {
                    total_depth += 1;
                    self.index += 1;
                }
                c if is_bracket_close(c) => {
                    total_depth -= 1;
                    self.index += 1;
                }
                c => {
                    if total_depth == 0
                        && !stop_keywords.is_empty()
                        && self.at_stop_keyword(start, stop_keywords)
                    {
                        break;
                    }
                    self.index += c.len_utf8();
                }
            }
        }

        // drop trailing whitespace from the captured text
        let mut end = self.index;
        let bytes = self.template.as_bytes();
        while end > start && bytes[end - 1].is_ascii_whitespace() {
            end -= 1;
        }

        Ok(match embedded {
            None => Expression {
                span: Span::new(start as u32, end as u32),
                code_start: self.template[start..end].to_string(),
                code_end: String::new(),
                children: None,
            },
            Some((markup_start, fragment, markup_end)) => Expression {
                span: Span::new(start as u32, end as u32),
                code_start: self.template[start..markup_start].to_string(),
                code_end: self.template[markup_end..end.max(markup_end)].to_string(),
                children: Some(fragment),
            },
        })
    }

    /// True when the cursor sits on a whitespace-bounded stop keyword.
    fn at_stop_keyword(&self, expr_start: usize, keywords: &[&str]) -> bool {
        let bytes = self.template.as_bytes();
        if self.index == expr_start || !bytes[self.index - 1].is_ascii_whitespace() {
            return false;
        }
        let rest = &self.template[self.index..];
        keywords.iter().any(|kw| {
            rest.starts_with(kw)
                && rest[kw.len()..]
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_whitespace())
        })
    }

    /// True when `<` at the cursor begins embedded markup rather than a
    /// comparison: the next character must start a tag name.
    fn markup_follows(&self) -> bool {
        self.char_at(self.index + 1)
            .is_some_and(|c| c.is_ascii_alphabetic())
    }

    /// Parses the raw text of one embedded element as a fragment. Node
    /// offsets in the result are relative to the snippet; errors are
    /// re-based onto the enclosing template.
    fn parse_embedded_fragment(
        &self,
        snippet: &str,
        offset: usize,
    ) -> Result<Fragment, ParseError> {
        if self.depth + 1 > MAX_MARKUP_DEPTH {
            return Err(self.error_at(
                ErrorCode::ParseError,
                format!(
                    "Markup inside expressions cannot nest more than {} levels deep",
                    MAX_MARKUP_DEPTH
                ),
                offset,
            ));
        }
        self.nested(snippet)
            .run_to_fragment()
            .map_err(|err| err.rebase(self.template, offset, self.filename))
    }

    /// Skips a quoted string starting at `start`. Returns the index just
    /// past the closing quote.
    pub(crate) fn skip_string(&self, start: usize, quote: char) -> Result<usize, ParseError> {
        let bytes = self.template.as_bytes();
        let mut i = start + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b if b == quote as u8 => return Ok(i + 1),
                _ => i += 1,
            }
        }
        Err(self.eof_error())
    }

    /// Skips a template literal starting at the backtick, including any
    /// `${}` interpolation holes.
    pub(crate) fn skip_template_literal(&self, start: usize) -> Result<usize, ParseError> {
        let bytes = self.template.as_bytes();
        let mut i = start + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'`' => return Ok(i + 1),
                b'$' if bytes.get(i + 1) == Some(&b'{') => {
                    i = self.skip_js_group(i + 2)?;
                }
                _ => i += 1,
            }
        }
        Err(self.eof_error())
    }

    /// Skips a block comment starting at `/*`.
    fn skip_block_comment(&self, start: usize) -> Result<usize, ParseError> {
        self.template[start + 2..]
            .find("*/")
            .map(|n| start + 2 + n + 2)
            .ok_or_else(|| self.eof_error())
    }

    /// Skips a `{}`-delimited group of JavaScript starting just past the
    /// opening brace, honoring nested strings, templates, and comments.
    /// Returns the index just past the closing brace.
    pub(crate) fn skip_js_group(&self, start: usize) -> Result<usize, ParseError> {
        let bytes = self.template.as_bytes();
        let mut i = start;
        let mut depth: u32 = 1;
        while i < bytes.len() {
            match bytes[i] {
                b'{' => {
                    depth += 1;
                    i += 1;
                }
                b'}' => {
                    depth -= 1;
                    i += 1;
                    if depth == 0 {
                        return Ok(i);
                    }
                }
                b'"' | b'\'' => i = self.skip_string(i, bytes[i] as char)?,
                b'`' => i = self.skip_template_literal(i)?,
                b'/' if bytes.get(i + 1) == Some(&b'*') => i = self.skip_block_comment(i)?,
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    i = self.template[i..]
                        .find('\n')
                        .map_or(bytes.len(), |n| i + n);
                }
                _ => i += 1,
            }
        }
        Err(self.eof_error())
    }

    /// Finds the end of one embedded element starting at `<`, by counting
    /// open and close tags. Quoted attribute values and `{}` attribute
    /// expressions may contain `<`/`>` freely.
    fn skip_embedded_markup(&self, start: usize) -> Result<usize, ParseError> {
        let bytes = self.template.as_bytes();
        let mut i = start;
        let mut depth: usize = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'<' if self.template[i..].starts_with("<!--") => {
                    i = self.template[i + 4..]
                        .find("-->")
                        .map(|n| i + 4 + n + 3)
                        .ok_or_else(|| self.eof_error())?;
                }
                b'<' if bytes.get(i + 1) == Some(&b'/') => {
                    i = self.template[i..]
                        .find('>')
                        .map(|n| i + n + 1)
                        .ok_or_else(|| self.eof_error())?;
                    if depth <= 1 {
                        return Ok(i);
                    }
                    depth -= 1;
                }
                b'<' => {
                    let name_start = i + 1;
                    let mut j = name_start;
                    while j < bytes.len()
                        && (bytes[j].is_ascii_alphanumeric()
                            || matches!(bytes[j], b':' | b'-' | b'.' | b'!'))
                    {
                        j += 1;
                    }
                    let name = &self.template[name_start..j];
                    let (tag_end, self_closing) = self.skip_tag_body(j)?;
                    i = tag_end;
                    if self_closing || is_void(name) {
                        if depth == 0 {
                            return Ok(i);
                        }
                    } else {
                        depth += 1;
                    }
                }
                b'{' => i = self.skip_js_group(i + 1)?,
                _ => i += 1,
            }
        }
        Err(self.eof_error())
    }

    /// Scans an open tag from just past its name to its `>`, returning the
    /// index past the bracket and whether the tag was self-closing.
    fn skip_tag_body(&self, start: usize) -> Result<(usize, bool), ParseError> {
        let bytes = self.template.as_bytes();
        let mut i = start;
        while i < bytes.len() {
            match bytes[i] {
                b'>' => return Ok((i + 1, false)),
                b'/' if bytes.get(i + 1) == Some(&b'>') => return Ok((i + 2, true)),
                b'"' | b'\'' => i = self.skip_string(i, bytes[i] as char)?,
                b'{' => i = self.skip_js_group(i + 1)?,
                _ => i += 1,
            }
        }
        Err(self.eof_error())
    }
}
