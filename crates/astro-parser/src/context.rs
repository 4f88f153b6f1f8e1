//! Binding contexts for `{#each ... as}` and `{:then}`/`{:catch}`.
//!
//! A context is either a plain identifier or a destructuring pattern. The
//! pattern grammar is not reimplemented here: the raw text is sliced by
//! bracket matching and validated through the external JavaScript parser,
//! using a snippet padded so its offsets line up with the template.

use crate::ast::{Context, Pattern};
use crate::error::{ErrorCode, ParseError};
use crate::html::bracket_pair;
use crate::parser::Parser;
use source_span::Span;

impl<'a> Parser<'a> {
    /// Reads an identifier or a destructuring pattern at the cursor.
    pub(crate) fn read_context(&mut self) -> Result<Context, ParseError> {
        let start = self.index;
        let Some(first) = self.char_at(start) else {
            return Err(self.eof_error());
        };
        if first.is_alphabetic() || first == '_' || first == '$' {
            let Some(identifier) = self.read_identifier()? else {
                return Err(self.error(ErrorCode::UnexpectedToken, "Expected identifier or pattern"));
            };
            return Ok(Context::Identifier(identifier));
        }
        if first != '{' && first != '[' {
            return Err(self.error(ErrorCode::UnexpectedToken, "Expected identifier or pattern"));
        }

        let end = self.scan_pattern(start)?;
        self.index = end;
        let raw = self.template[start..end].to_string();
        self.validate_pattern(start, end, &raw)?;
        Ok(Context::Pattern(Pattern {
            span: Span::new(start as u32, end as u32),
            raw,
        }))
    }

    /// Finds the end of a bracketed pattern by matching each closing
    /// bracket against the most recent opener. Strings inside the pattern
    /// are skipped so brackets in them do not count.
    fn scan_pattern(&self, start: usize) -> Result<usize, ParseError> {
        let bytes = self.template.as_bytes();
        let mut stack: Vec<char> = Vec::new();
        let mut i = start;
        while i < bytes.len() {
            match bytes[i] {
                b'{' | b'[' | b'(' => {
                    stack.push(bytes[i] as char);
                    i += 1;
                }
                b'}' | b']' | b')' => {
                    let close = bytes[i] as char;
                    let expected = stack.pop().and_then(bracket_pair);
                    if expected != Some(close) {
                        return Err(self.error_at(
                            ErrorCode::UnexpectedToken,
                            match expected {
                                Some(c) => format!("Expected {c}"),
                                None => "Unexpected closing bracket".to_string(),
                            },
                            i,
                        ));
                    }
                    i += 1;
                    if stack.is_empty() {
                        return Ok(i);
                    }
                }
                b'"' | b'\'' => i = self.skip_string(i, bytes[i] as char)?,
                b'`' => i = self.skip_template_literal(i)?,
                _ => i += 1,
            }
        }
        Err(self.eof_error())
    }

    /// Runs the pattern text through the JavaScript parser. The snippet
    /// replaces every non-newline character before the pattern with a
    /// space (the last one with `(`) so reported offsets land on the
    /// template directly.
    fn validate_pattern(&self, start: usize, end: usize, raw: &str) -> Result<(), ParseError> {
        let mut snippet = String::with_capacity(start + raw.len() + 5);
        for c in self.template[..start].chars() {
            snippet.push(if c == '\n' { '\n' } else { ' ' });
        }
        snippet.pop();
        snippet.push('(');
        snippet.push_str(raw);
        snippet.push_str(" = 1)");

        match self.js.parse_pattern(&snippet) {
            Ok(_) => Ok(()),
            Err(err) => {
                let offset = err.offset.clamp(start, end);
                Err(self.error_at(ErrorCode::ParseError, err.message, offset))
            }
        }
    }
}
