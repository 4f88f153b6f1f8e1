//! Parse error types.
//!
//! Parsing is single-shot: the first error aborts the parse and is returned
//! to the caller with a resolved position and a rendered code frame.

use source_span::{code_frame, LineIndex};
use thiserror::Error;

/// The stable, kebab-cased code of a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Input ended where more was expected.
    UnexpectedEof,
    /// A token other than the expected one was found.
    UnexpectedToken,
    /// Whitespace was required between two tokens.
    MissingWhitespace,
    /// An element was still open at end of input.
    UnclosedElement,
    /// A block was still open at end of input.
    UnclosedBlock,
    /// A tag name failed the tag-name grammar or meta-tag registry.
    InvalidTagName,
    /// A void element was given content or a closing tag.
    InvalidVoidContent,
    /// A closing tag did not match any open element.
    InvalidClosingTag,
    /// An attribute or directive name appeared twice on one tag.
    DuplicateAttribute,
    /// More than one top-level `<style>` tag.
    DuplicateStyle,
    /// More than one front-matter script.
    InvalidScript,
    /// More than one `<astro:head>` tag.
    DuplicateHead,
    /// `<astro:head>` nested inside an element or block.
    InvalidHeadPlacement,
    /// The removed `ref:` directive was used.
    InvalidRefDirective,
    /// A `class:` directive with an empty name.
    InvalidClassDirective,
    /// A directive value that is not a single expression.
    InvalidDirectiveValue,
    /// `{:elseif}` written as one word.
    InvalidElseif,
    /// `{:else if}` outside an `{#if}` block.
    InvalidElseifPlacement,
    /// `{:else}` outside an `{#if}`/`{#each}` block.
    InvalidElsePlacement,
    /// `{:then}` outside an `{#await}` block.
    InvalidThenPlacement,
    /// `{:catch}` outside an `{#await}` block.
    InvalidCatchPlacement,
    /// `{#...}` with an unknown block keyword.
    ExpectedBlockType,
    /// A name was required (each index binding).
    ExpectedName,
    /// `{/...}` with no matching open block.
    UnexpectedBlockClose,
    /// `<astro:component>` without a `this` attribute.
    MissingComponentDefinition,
    /// A `this` attribute that is not a single expression.
    InvalidComponentDefinition,
    /// `<astro:self>` outside a block or component.
    InvalidSelfPlacement,
    /// A syntax error reported by the external JavaScript parser.
    ParseError,
    /// A JavaScript reserved word in identifier position.
    UnexpectedReservedWord,
}

impl ErrorCode {
    /// The kebab-cased code string, stable across releases.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnexpectedEof => "unexpected-eof",
            ErrorCode::UnexpectedToken => "unexpected-token",
            ErrorCode::MissingWhitespace => "missing-whitespace",
            ErrorCode::UnclosedElement => "unclosed-element",
            ErrorCode::UnclosedBlock => "unclosed-block",
            ErrorCode::InvalidTagName => "invalid-tag-name",
            ErrorCode::InvalidVoidContent => "invalid-void-content",
            ErrorCode::InvalidClosingTag => "invalid-closing-tag",
            ErrorCode::DuplicateAttribute => "duplicate-attribute",
            ErrorCode::DuplicateStyle => "duplicate-style",
            ErrorCode::InvalidScript => "invalid-script",
            ErrorCode::DuplicateHead => "duplicate-head",
            ErrorCode::InvalidHeadPlacement => "invalid-head-placement",
            ErrorCode::InvalidRefDirective => "invalid-ref-directive",
            ErrorCode::InvalidClassDirective => "invalid-class-directive",
            ErrorCode::InvalidDirectiveValue => "invalid-directive-value",
            ErrorCode::InvalidElseif => "invalid-elseif",
            ErrorCode::InvalidElseifPlacement => "invalid-elseif-placement",
            ErrorCode::InvalidElsePlacement => "invalid-else-placement",
            ErrorCode::InvalidThenPlacement => "invalid-then-placement",
            ErrorCode::InvalidCatchPlacement => "invalid-catch-placement",
            ErrorCode::ExpectedBlockType => "expected-block-type",
            ErrorCode::ExpectedName => "expected-name",
            ErrorCode::UnexpectedBlockClose => "unexpected-block-close",
            ErrorCode::MissingComponentDefinition => "missing-component-definition",
            ErrorCode::InvalidComponentDefinition => "invalid-component-definition",
            ErrorCode::InvalidSelfPlacement => "invalid-self-placement",
            ErrorCode::ParseError => "parse-error",
            ErrorCode::UnexpectedReservedWord => "unexpected-reserved-word",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fatal parse error.
///
/// `line` is 1-based and `column` is a 0-based byte column, both resolved
/// against the trimmed template.
#[derive(Debug, Clone, Error)]
#[error("{message} ({line}:{column})\n{frame}")]
pub struct ParseError {
    /// The stable error code.
    pub code: ErrorCode,
    /// The human-readable message.
    pub message: String,
    /// The byte offset where the error starts.
    pub start: usize,
    /// The byte offset where the error ends.
    pub end: usize,
    /// 1-based error line.
    pub line: u32,
    /// 0-based byte column within the line.
    pub column: u32,
    /// The rendered code frame.
    pub frame: String,
    /// The filename passed in parse options, if any.
    pub filename: Option<String>,
}

impl ParseError {
    /// Builds an error at `start`, resolving its position and code frame
    /// against `source`.
    pub(crate) fn new(
        code: ErrorCode,
        message: impl Into<String>,
        source: &str,
        start: usize,
        filename: Option<&str>,
    ) -> Self {
        let start = start.min(source.len());
        let pos = LineIndex::new(source).line_col((start as u32).into());
        Self {
            code,
            message: message.into(),
            start,
            end: start,
            line: pos.line + 1,
            column: pos.col,
            frame: code_frame(source, pos.line, pos.col),
            filename: filename.map(str::to_owned),
        }
    }

    /// Re-bases an error raised by a nested parse of an embedded snippet
    /// onto the outer template, re-rendering the frame.
    pub(crate) fn rebase(self, outer: &str, offset: usize, filename: Option<&str>) -> Self {
        ParseError::new(self.code, self.message, outer, self.start + offset, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_position_and_frame() {
        let err = ParseError::new(
            ErrorCode::UnexpectedToken,
            "Expected }",
            "<p>{x\n</p>",
            5,
            None,
        );
        let rendered = err.to_string();
        assert!(rendered.starts_with("Expected } (1:5)\n"));
        assert!(rendered.contains("1: <p>{x"));
        assert_eq!(err.code.as_str(), "unexpected-token");
    }

    #[test]
    fn test_rebase_shifts_position() {
        let inner = ParseError::new(ErrorCode::UnclosedElement, "<b> was left open", "<b>", 0, None);
        let rebased = inner.rebase("{x && <b>}", 6, None);
        assert_eq!(rebased.start, 6);
        assert_eq!(rebased.column, 6);
    }
}
