//! Boundary between the template parser and the JavaScript parser.
//!
//! Destructuring contexts such as `{#each items as { id, name }}` carry a
//! JavaScript binding pattern. The template parser scans the pattern text by
//! bracket matching and hands it here for validation, so the heavy parser
//! stays behind a trait and tests can substitute their own.

use swc_common::{sync::Lrc, FileName, SourceMap, Spanned};
use swc_ecma_ast::{AssignTarget, AssignTargetPat, Expr, Pat, SimpleAssignTarget};
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax};

/// A failure reported by the JavaScript parser, positioned relative to the
/// start of the parsed snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsParseError {
    pub message: String,
    pub offset: usize,
}

/// Parses JavaScript binding patterns on behalf of the template parser.
///
/// The snippet is always a parenthesized assignment of the form
/// `(<pattern> = 1)`, left-padded so byte offsets inside it line up with the
/// enclosing template.
pub trait JsParser {
    fn parse_pattern(&self, snippet: &str) -> Result<Pat, JsParseError>;
}

/// The default [`JsParser`], backed by swc.
#[derive(Debug, Default, Clone, Copy)]
pub struct SwcParser;

impl JsParser for SwcParser {
    fn parse_pattern(&self, snippet: &str) -> Result<Pat, JsParseError> {
        let cm: Lrc<SourceMap> = Default::default();
        let fm = cm.new_source_file(Lrc::new(FileName::Anon), snippet.to_string());
        let file_start = fm.start_pos;

        let lexer = Lexer::new(
            Syntax::Es(Default::default()),
            Default::default(),
            StringInput::from(&*fm),
            None,
        );
        let mut parser = Parser::new_from(lexer);

        let expr = parser.parse_expr().map_err(|err| {
            let offset = (err.span().lo.0 - file_start.0) as usize;
            JsParseError {
                message: err.into_kind().msg().into_owned(),
                offset,
            }
        })?;
        if let Some(err) = parser.take_errors().into_iter().next() {
            let offset = (err.span().lo.0 - file_start.0) as usize;
            return Err(JsParseError {
                message: err.into_kind().msg().into_owned(),
                offset,
            });
        }

        pattern_from_expr(*expr, snippet)
    }
}

/// Unwraps `(<pattern> = 1)` down to the binding pattern on the left side.
fn pattern_from_expr(expr: Expr, snippet: &str) -> Result<Pat, JsParseError> {
    let mut expr = expr;
    while let Expr::Paren(paren) = expr {
        expr = *paren.expr;
    }
    let Expr::Assign(assign) = expr else {
        return Err(invalid_pattern(snippet));
    };
    match assign.left {
        AssignTarget::Simple(SimpleAssignTarget::Ident(ident)) => Ok(Pat::Ident(ident)),
        AssignTarget::Pat(AssignTargetPat::Array(pat)) => Ok(Pat::Array(pat)),
        AssignTarget::Pat(AssignTargetPat::Object(pat)) => Ok(Pat::Object(pat)),
        _ => Err(invalid_pattern(snippet)),
    }
}

fn invalid_pattern(snippet: &str) -> JsParseError {
    JsParseError {
        message: "Invalid binding pattern".to_string(),
        // Point at the pattern itself, just past the opening paren
        offset: snippet.find('(').map_or(0, |i| i + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_pattern() {
        let pat = SwcParser.parse_pattern("(item = 1)").unwrap();
        assert!(matches!(pat, Pat::Ident(_)));
    }

    #[test]
    fn test_object_pattern() {
        let pat = SwcParser.parse_pattern("({ id, name } = 1)").unwrap();
        assert!(matches!(pat, Pat::Object(_)));
    }

    #[test]
    fn test_array_pattern_with_defaults() {
        let pat = SwcParser.parse_pattern("([first, second = 2] = 1)").unwrap();
        assert!(matches!(pat, Pat::Array(_)));
    }

    #[test]
    fn test_malformed_pattern_reports_offset() {
        let err = SwcParser.parse_pattern("({ id: = 1)").unwrap_err();
        assert!(err.offset <= "({ id: = 1)".len());
    }
}
