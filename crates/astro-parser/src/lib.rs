//! A single-pass parser for Astro component templates.
//!
//! A component file is HTML-like markup with three extensions: an optional
//! front-matter script fenced by `---` lines, `{expression}` mustache tags
//! whose contents are captured as raw JavaScript text, and `{#if}` /
//! `{#each}` / `{#await}` / `{#key}` control blocks. [`parse`] turns a
//! source string into a [`ParsedComponent`] or fails fast with a single
//! [`ParseError`] carrying a position and a code frame.
//!
//! ```
//! let component = astro_parser::parse("<h1>Hello {name}!</h1>").unwrap();
//! assert_eq!(component.html.children.len(), 1);
//! ```

mod ast;
mod context;
mod error;
mod expression;
mod fuzzymatch;
mod html;
mod js;
mod parser;

pub use ast::{
    Attribute, AttributeValue, AwaitBlock, AwaitSubBlock, Comment, Context, Directive,
    DirectiveExpression, DirectiveKind, EachBlock, Element, ElementKind, ElseBlock, Expression,
    Fragment, Identifier, IfBlock, KeyBlock, MustacheTag, NormalAttribute, Pattern,
    RawMustacheTag, Script, Shorthand, SpreadAttribute, Style, TemplateNode, Text, ValueChunk,
};
pub use error::{ErrorCode, ParseError};
pub use js::{JsParseError, JsParser, SwcParser};

/// Options accepted by [`parse_with`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Reported in diagnostics when set.
    pub filename: Option<String>,
    /// Custom-element mode keeps `<slot>` as a regular element.
    pub custom_element: bool,
}

/// The outcome of a successful parse: the markup tree plus the single
/// permitted `<style>` tag and front-matter script, when present.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedComponent {
    pub html: Fragment,
    pub css: Option<Style>,
    pub module: Option<Script>,
}

/// Parses a component with default options and the swc-backed JavaScript
/// parser.
pub fn parse(source: &str) -> Result<ParsedComponent, ParseError> {
    parse_with(source, &ParseOptions::default(), &SwcParser)
}

/// Parses a component. Trailing whitespace is ignored; all spans refer to
/// the trimmed source.
pub fn parse_with(
    source: &str,
    options: &ParseOptions,
    js: &dyn JsParser,
) -> Result<ParsedComponent, ParseError> {
    let template = source.trim_end();
    parser::Parser::new(template, options.filename.as_deref(), options.custom_element, js).finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_input() {
        let component = parse("").unwrap();
        assert!(component.html.children.is_empty());
        assert!(component.css.is_none());
        assert!(component.module.is_none());
    }

    #[test]
    fn test_trailing_whitespace_is_ignored() {
        let component = parse("<p>hi</p>\n\n  ").unwrap();
        assert_eq!(component.html.span.end_usize(), "<p>hi</p>".len());
    }

    #[test]
    fn test_error_display_carries_position_and_frame() {
        let err = parse("<div>\n<img>text</img>").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidVoidContent);
        let rendered = err.to_string();
        assert!(rendered.contains("(2:9)"), "{rendered}");
        assert!(rendered.contains("^"), "{rendered}");
    }
}
