//! Integration tests for control blocks: if/each/await/key, else chains,
//! boundary whitespace trimming, and markup embedded in expressions.

use astro_parser::{
    parse, Context, EachBlock, IfBlock, ParsedComponent, TemplateNode, Text,
};
use pretty_assertions::assert_eq;

fn parse_ok(source: &str) -> ParsedComponent {
    parse(source).unwrap_or_else(|err| panic!("parse failed: {err}"))
}

fn as_if(node: &TemplateNode) -> &IfBlock {
    match node {
        TemplateNode::IfBlock(block) => block,
        other => panic!("expected an if block, got {}", other.description()),
    }
}

fn as_each(node: &TemplateNode) -> &EachBlock {
    match node {
        TemplateNode::EachBlock(block) => block,
        other => panic!("expected an each block, got {}", other.description()),
    }
}

fn as_text(node: &TemplateNode) -> &Text {
    match node {
        TemplateNode::Text(text) => text,
        other => panic!("expected text, got {}", other.description()),
    }
}

#[test]
fn test_if_block() {
    let component = parse_ok("{#if visible}<p>yes</p>{/if}");
    let block = as_if(&component.html.children[0]);
    assert_eq!(block.expression.code_start, "visible");
    assert!(!block.elseif);
    assert!(block.else_block.is_none());
    assert_eq!(block.children.len(), 1);
    assert_eq!(block.span.start_usize(), 0);
    assert_eq!(block.span.end_usize(), 28);
}

#[test]
fn test_if_else() {
    let component = parse_ok("{#if a}x{:else}y{/if}");
    let block = as_if(&component.html.children[0]);
    assert_eq!(as_text(&block.children[0]).data, "x");
    let else_block = block.else_block.as_ref().expect("else branch");
    assert_eq!(as_text(&else_block.children[0]).data, "y");
}

#[test]
fn test_else_if_chain() {
    let component = parse_ok("{#if a}1{:else if b}2{:else}3{/if}");
    let outer = as_if(&component.html.children[0]);
    assert_eq!(outer.expression.code_start, "a");
    assert_eq!(as_text(&outer.children[0]).data, "1");

    let else_block = outer.else_block.as_ref().expect("else-if branch");
    assert_eq!(else_block.children.len(), 1);
    let inner = as_if(&else_block.children[0]);
    assert!(inner.elseif);
    assert_eq!(inner.expression.code_start, "b");
    assert_eq!(as_text(&inner.children[0]).data, "2");

    let final_else = inner.else_block.as_ref().expect("final else branch");
    assert_eq!(as_text(&final_else.children[0]).data, "3");
}

#[test]
fn test_each_block_with_index_and_key() {
    let component = parse_ok("{#each items as item, i (item.id)}<li>{item}</li>{/each}");
    let block = as_each(&component.html.children[0]);
    assert_eq!(block.expression.code_start, "items");
    match &block.context {
        Context::Identifier(identifier) => assert_eq!(identifier.name, "item"),
        Context::Pattern(pattern) => panic!("expected an identifier, got {:?}", pattern.raw),
    }
    assert_eq!(block.index.as_deref(), Some("i"));
    assert_eq!(
        block.key.as_ref().map(|k| k.code_start.as_str()),
        Some("item.id")
    );
    assert_eq!(block.children.len(), 1);
}

#[test]
fn test_each_block_with_pattern_context() {
    let component = parse_ok("{#each pairs as [a, b]}{a}{/each}");
    let block = as_each(&component.html.children[0]);
    match &block.context {
        Context::Pattern(pattern) => assert_eq!(pattern.raw, "[a, b]"),
        Context::Identifier(identifier) => {
            panic!("expected a pattern, got {:?}", identifier.name)
        }
    }
}

#[test]
fn test_each_else() {
    let component = parse_ok("{#each items as item}x{:else}none{/each}");
    let block = as_each(&component.html.children[0]);
    let else_block = block.else_block.as_ref().expect("else branch");
    assert_eq!(as_text(&else_block.children[0]).data, "none");
}

#[test]
fn test_await_block_full_form() {
    let component = parse_ok("{#await promise}w{:then value}t{:catch err}c{/await}");
    let block = match &component.html.children[0] {
        TemplateNode::AwaitBlock(block) => block,
        other => panic!("expected an await block, got {}", other.description()),
    };
    assert_eq!(block.expression.code_start, "promise");
    assert!(!block.pending.skip);
    assert_eq!(as_text(&block.pending.children[0]).data, "w");
    assert!(!block.then.skip);
    assert_eq!(as_text(&block.then.children[0]).data, "t");
    assert!(!block.catch.skip);
    assert_eq!(as_text(&block.catch.children[0]).data, "c");
    match block.value.as_ref().expect("then binding") {
        Context::Identifier(identifier) => assert_eq!(identifier.name, "value"),
        Context::Pattern(pattern) => panic!("expected an identifier, got {:?}", pattern.raw),
    }
    match block.error.as_ref().expect("catch binding") {
        Context::Identifier(identifier) => assert_eq!(identifier.name, "err"),
        Context::Pattern(pattern) => panic!("expected an identifier, got {:?}", pattern.raw),
    }
}

#[test]
fn test_await_then_shorthand() {
    let component = parse_ok("{#await p then v}{v}{/await}");
    let block = match &component.html.children[0] {
        TemplateNode::AwaitBlock(block) => block,
        other => panic!("expected an await block, got {}", other.description()),
    };
    assert!(block.pending.skip);
    assert!(block.catch.skip);
    assert!(!block.then.skip);
    assert_eq!(block.then.children.len(), 1);
}

#[test]
fn test_await_keyword_inside_expression_is_not_a_stop() {
    let component = parse_ok("{#await promises.then(x => x)}done{/await}");
    let block = match &component.html.children[0] {
        TemplateNode::AwaitBlock(block) => block,
        other => panic!("expected an await block, got {}", other.description()),
    };
    assert_eq!(block.expression.code_start, "promises.then(x => x)");
    assert!(block.value.is_none());
}

#[test]
fn test_key_block() {
    let component = parse_ok("{#key id}<div/>{/key}");
    match &component.html.children[0] {
        TemplateNode::KeyBlock(block) => {
            assert_eq!(block.expression.code_start, "id");
            assert_eq!(block.children.len(), 1);
        }
        other => panic!("expected a key block, got {}", other.description()),
    }
}

#[test]
fn test_block_boundary_whitespace_is_trimmed() {
    let component = parse_ok("a {#if x} b {/if} c");
    assert_eq!(component.html.children.len(), 3);
    assert_eq!(as_text(&component.html.children[0]).data, "a ");
    let block = as_if(&component.html.children[1]);
    assert_eq!(block.children.len(), 1);
    assert_eq!(as_text(&block.children[0]).data, "b");
    assert_eq!(as_text(&component.html.children[2]).data, " c");
}

#[test]
fn test_no_trim_without_adjacent_whitespace() {
    let component = parse_ok("a{#if x} b {/if}c");
    let block = as_if(&component.html.children[1]);
    assert_eq!(as_text(&block.children[0]).data, " b ");
}

#[test]
fn test_else_branch_is_trimmed_too() {
    let component = parse_ok("{#if x} a {:else} b {/if}");
    let block = as_if(&component.html.children[0]);
    assert_eq!(as_text(&block.children[0]).data, "a");
    let else_block = block.else_block.as_ref().expect("else branch");
    assert_eq!(as_text(&else_block.children[0]).data, "b");
}

#[test]
fn test_markup_embedded_in_expression() {
    let component = parse_ok("{items.map(item => <li>{item}</li>)}");
    let tag = match &component.html.children[0] {
        TemplateNode::MustacheTag(tag) => tag,
        other => panic!("expected a mustache tag, got {}", other.description()),
    };
    assert_eq!(tag.expression.code_start, "items.map(item => ");
    assert_eq!(tag.expression.code_end, ")");
    let fragment = tag.expression.children.as_ref().expect("embedded fragment");
    assert_eq!(fragment.children.len(), 1);
    match &fragment.children[0] {
        TemplateNode::Element(element) => {
            assert_eq!(element.name, "li");
            // spans inside the fragment are relative to the snippet
            assert_eq!(element.span.start_usize(), 0);
            assert!(matches!(&element.children[0], TemplateNode::MustacheTag(_)));
        }
        other => panic!("expected an element, got {}", other.description()),
    }
}

#[test]
fn test_nested_blocks() {
    let component = parse_ok("{#each rows as row}{#if row.ok}<td>{row.v}</td>{/if}{/each}");
    let each = as_each(&component.html.children[0]);
    let inner = as_if(&each.children[0]);
    assert_eq!(inner.expression.code_start, "row.ok");
    assert_eq!(inner.children.len(), 1);
}

#[test]
fn test_block_closer_implicitly_closes_element() {
    let component = parse_ok("{#if x}<p>a{/if}");
    let block = as_if(&component.html.children[0]);
    match &block.children[0] {
        TemplateNode::Element(element) => assert_eq!(element.name, "p"),
        other => panic!("expected an element, got {}", other.description()),
    }
}
