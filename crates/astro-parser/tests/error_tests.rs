//! Integration tests for diagnostics: codes, messages and positions.
//! Every error is fatal, so each case asserts on the single returned error.

use astro_parser::{parse, ErrorCode, ParseError};
use pretty_assertions::assert_eq;

fn parse_err(source: &str) -> ParseError {
    match parse(source) {
        Ok(_) => panic!("expected a parse error for {source:?}"),
        Err(err) => err,
    }
}

#[test]
fn test_unclosed_element() {
    let err = parse_err("<div>");
    assert_eq!(err.code, ErrorCode::UnclosedElement);
    assert_eq!(err.message, "<div> was left open");
    assert_eq!(err.start, 0);
    assert_eq!(err.line, 1);
    assert_eq!(err.column, 0);
}

#[test]
fn test_unclosed_block() {
    let err = parse_err("{#if x}");
    assert_eq!(err.code, ErrorCode::UnclosedBlock);
    assert_eq!(err.message, "Block was left open");
}

#[test]
fn test_unclosed_comment() {
    let err = parse_err("<!-- never finished");
    assert_eq!(err.code, ErrorCode::UnexpectedEof);
    assert_eq!(err.message, "comment was left open, expected -->");
}

#[test]
fn test_void_element_closing_tag() {
    let err = parse_err("<br></br>");
    assert_eq!(err.code, ErrorCode::InvalidVoidContent);
    assert_eq!(
        err.message,
        "<br> is a void element and cannot have children, or a closing tag"
    );
    assert_eq!(err.start, 4);
}

#[test]
fn test_duplicate_attribute() {
    let err = parse_err("<div a=\"1\" a=\"2\"/>");
    assert_eq!(err.code, ErrorCode::DuplicateAttribute);
    assert_eq!(err.message, "Attributes need to be unique");
    assert_eq!(err.start, 11);
}

#[test]
fn test_duplicate_style() {
    let err = parse_err("<style>a{}</style><style>b{}</style>");
    assert_eq!(err.code, ErrorCode::DuplicateStyle);
    assert_eq!(err.message, "You can only have one <style> tag per Astro file");
    assert_eq!(err.start, 18);
}

#[test]
fn test_duplicate_front_matter() {
    let err = parse_err("---\na\n---\n---\nb\n---");
    assert_eq!(err.code, ErrorCode::InvalidScript);
    assert_eq!(
        err.message,
        "A component can only have one frontmatter (---) script"
    );
    assert_eq!(err.start, 10);
}

#[test]
fn test_unclosed_front_matter() {
    let err = parse_err("---\nconst x = 1;");
    assert_eq!(err.code, ErrorCode::UnexpectedEof);
    assert_eq!(err.message, "Expected ---");
}

#[test]
fn test_duplicate_head() {
    let err = parse_err("<astro:head></astro:head><astro:head>");
    assert_eq!(err.code, ErrorCode::DuplicateHead);
    assert_eq!(err.message, "A component can only have one <astro:head> tag");
    assert_eq!(err.start, 25);
}

#[test]
fn test_head_inside_element() {
    let err = parse_err("<div><astro:head></astro:head></div>");
    assert_eq!(err.code, ErrorCode::InvalidHeadPlacement);
    assert_eq!(
        err.message,
        "<astro:head> tags cannot be inside elements or blocks"
    );
}

#[test]
fn test_unknown_meta_tag_suggests_a_fix() {
    let err = parse_err("<astro:haed>");
    assert_eq!(err.code, ErrorCode::InvalidTagName);
    assert_eq!(
        err.message,
        "Valid <astro:...> tag names are astro:head (did you mean 'astro:head'?)"
    );
}

#[test]
fn test_unknown_meta_tag_without_a_close_match() {
    let err = parse_err("<astro:zzz>");
    assert_eq!(err.code, ErrorCode::InvalidTagName);
    assert_eq!(err.message, "Valid <astro:...> tag names are astro:head");
}

#[test]
fn test_self_reference_at_top_level() {
    let err = parse_err("<astro:self/>");
    assert_eq!(err.code, ErrorCode::InvalidSelfPlacement);
    assert_eq!(
        err.message,
        "<astro:self> components can only exist inside {#if} blocks, {#each} blocks, or slots passed to components"
    );
}

#[test]
fn test_component_without_this() {
    let err = parse_err("<astro:component/>");
    assert_eq!(err.code, ErrorCode::MissingComponentDefinition);
    assert_eq!(err.message, "<astro:component> must have a 'this' attribute");
}

#[test]
fn test_component_with_literal_this() {
    let err = parse_err("<astro:component this=\"div\"/>");
    assert_eq!(err.code, ErrorCode::InvalidComponentDefinition);
    assert_eq!(err.message, "invalid component definition");
}

#[test]
fn test_ref_directive_is_rejected() {
    let err = parse_err("<div ref:foo/>");
    assert_eq!(err.code, ErrorCode::InvalidRefDirective);
    assert!(err.message.contains("no longer supported"), "{}", err.message);
    assert!(err.message.contains("bind:this={foo}"), "{}", err.message);
}

#[test]
fn test_empty_class_directive() {
    let err = parse_err("<div class:={x}/>");
    assert_eq!(err.code, ErrorCode::InvalidClassDirective);
    assert_eq!(err.message, "Class binding name cannot be empty");
}

#[test]
fn test_directive_value_must_be_an_expression() {
    let err = parse_err("<div on:click=\"string\"/>");
    assert_eq!(err.code, ErrorCode::InvalidDirectiveValue);
    assert_eq!(
        err.message,
        "Directive value must be a JavaScript expression enclosed in curly braces"
    );
}

#[test]
fn test_quote_without_equals() {
    let err = parse_err("<div a\"b\">");
    assert_eq!(err.code, ErrorCode::UnexpectedToken);
    assert_eq!(err.message, "Expected =");
}

#[test]
fn test_elseif_single_word() {
    let err = parse_err("{#if a}x{:elseif b}y{/if}");
    assert_eq!(err.code, ErrorCode::InvalidElseif);
    assert_eq!(err.message, "'elseif' should be 'else if'");
}

#[test]
fn test_else_outside_block() {
    let err = parse_err("{:else}");
    assert_eq!(err.code, ErrorCode::InvalidElsePlacement);
    assert_eq!(
        err.message,
        "Cannot have an {:else} block outside an {#if ...} or {#each ...} block"
    );
}

#[test]
fn test_else_inside_wrong_block() {
    let err = parse_err("{#if a}<div>{:else}</div>{/if}");
    assert_eq!(err.code, ErrorCode::InvalidElsePlacement);
    assert_eq!(
        err.message,
        "Expected to close <div> tag before seeing {:else} block"
    );
}

#[test]
fn test_then_outside_await() {
    let err = parse_err("{:then}");
    assert_eq!(err.code, ErrorCode::InvalidThenPlacement);
    assert_eq!(
        err.message,
        "Cannot have an {:then} block outside an {#await ...} block"
    );
}

#[test]
fn test_catch_outside_await() {
    let err = parse_err("{:catch}");
    assert_eq!(err.code, ErrorCode::InvalidCatchPlacement);
    assert_eq!(
        err.message,
        "Cannot have an {:catch} block outside an {#await ...} block"
    );
}

#[test]
fn test_unknown_block_type() {
    let err = parse_err("{#unknown x}");
    assert_eq!(err.code, ErrorCode::ExpectedBlockType);
    assert_eq!(err.message, "Expected if, each, await or key");
}

#[test]
fn test_stray_block_close() {
    let err = parse_err("{/if}");
    assert_eq!(err.code, ErrorCode::UnexpectedBlockClose);
    assert_eq!(err.message, "Unexpected block closing tag");
}

#[test]
fn test_closing_tag_for_unopened_element() {
    let err = parse_err("<div></span></div>");
    assert_eq!(err.code, ErrorCode::InvalidClosingTag);
    assert_eq!(
        err.message,
        "</span> attempted to close an element that was not open"
    );
}

#[test]
fn test_closing_tag_for_auto_closed_element() {
    let err = parse_err("<p>a<p>b</p></p>");
    assert_eq!(err.code, ErrorCode::InvalidClosingTag);
    assert_eq!(
        err.message,
        "</p> attempted to close <p> that was already automatically closed by <p>"
    );
}

#[test]
fn test_reserved_word_as_each_context() {
    let err = parse_err("{#each items as class}x{/each}");
    assert_eq!(err.code, ErrorCode::UnexpectedReservedWord);
    assert_eq!(
        err.message,
        "'class' is a reserved word in JavaScript and cannot be used here"
    );
}

#[test]
fn test_each_without_context() {
    let err = parse_err("{#each items}x{/each}");
    assert_eq!(err.code, ErrorCode::UnexpectedToken);
    assert_eq!(err.message, "Expected as");
}

#[test]
fn test_each_index_requires_a_name() {
    let err = parse_err("{#each items as item, (item.id)}x{/each}");
    assert_eq!(err.code, ErrorCode::ExpectedName);
    assert_eq!(err.message, "Expected name");
}

#[test]
fn test_mismatched_pattern_brackets() {
    let err = parse_err("{#each x as [a,}x{/each}");
    assert_eq!(err.code, ErrorCode::UnexpectedToken);
    assert_eq!(err.message, "Expected ]");
}

#[test]
fn test_invalid_pattern_reported_at_template_offset() {
    let err = parse_err("{#each x as {a: 1}}x{/each}");
    assert_eq!(err.code, ErrorCode::ParseError);
    assert!(err.start >= 12, "offset {} should be in the pattern", err.start);
    assert!(err.start <= 18, "offset {} should be in the pattern", err.start);
}

#[test]
fn test_eof_inside_expression() {
    let err = parse_err("{foo");
    assert_eq!(err.code, ErrorCode::UnexpectedEof);
    assert_eq!(err.message, "Unexpected end of input");
    assert_eq!(err.start, 4);
}

#[test]
fn test_eof_inside_attribute_value() {
    let err = parse_err("<div a=\"x");
    assert_eq!(err.code, ErrorCode::UnexpectedEof);
    assert_eq!(err.message, "Unexpected end of input");
}

#[test]
fn test_missing_whitespace_after_block_keyword() {
    let err = parse_err("{#if(x)}y{/if}");
    assert_eq!(err.code, ErrorCode::MissingWhitespace);
    assert_eq!(err.message, "Expected whitespace");
}

#[test]
fn test_error_in_embedded_markup_uses_template_offsets() {
    let err = parse_err("{list.map(x => <li>{x}</wrong>)}");
    assert_eq!(err.code, ErrorCode::InvalidClosingTag);
    assert_eq!(
        err.message,
        "</wrong> attempted to close an element that was not open"
    );
    // the stray tag sits at offset 22 of the template, 7 of the snippet
    assert_eq!(err.start, 22);
}

#[test]
fn test_debug_tag_is_unsupported() {
    let err = parse_err("{@debug x}");
    assert_eq!(err.code, ErrorCode::ParseError);
    assert_eq!(err.message, "@debug not yet supported");
    assert_eq!(err.start, 0);
}

#[test]
fn test_invalid_tag_name() {
    let err = parse_err("<2fast>");
    assert_eq!(err.code, ErrorCode::InvalidTagName);
    assert_eq!(err.message, "Expected valid tag name");
}
