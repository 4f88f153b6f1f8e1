//! AST types for Astro component templates.
//!
//! Every node carries a [`Span`] of byte offsets into the parsed template
//! (after trailing-whitespace trimming). Ownership is strictly tree-shaped:
//! a parent exclusively owns its children and no node refers back up the
//! tree.

use smol_str::SmolStr;
use source_span::Span;

/// The root fragment of a template, or an embedded fragment inside an
/// expression.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fragment {
    /// The span of the fragment, trimmed of purely-whitespace leading and
    /// trailing text. Zero for an empty fragment.
    pub span: Span,
    /// The child nodes, in document order.
    pub children: Vec<TemplateNode>,
}

/// A node in the template tree.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TemplateNode {
    /// Literal text.
    Text(Text),
    /// An HTML comment `<!-- ... -->`.
    Comment(Comment),
    /// An element, component, or one of the reserved tag forms.
    Element(Element),
    /// A `{expr}` tag.
    MustacheTag(MustacheTag),
    /// An `{@html expr}` tag.
    RawMustacheTag(RawMustacheTag),
    /// An `{#if}` block.
    IfBlock(IfBlock),
    /// An `{#each}` block.
    EachBlock(EachBlock),
    /// An `{#await}` block.
    AwaitBlock(AwaitBlock),
    /// A `{#key}` block.
    KeyBlock(KeyBlock),
}

impl TemplateNode {
    /// Returns the span of this node.
    pub fn span(&self) -> Span {
        match self {
            TemplateNode::Text(n) => n.span,
            TemplateNode::Comment(n) => n.span,
            TemplateNode::Element(n) => n.span,
            TemplateNode::MustacheTag(n) => n.span,
            TemplateNode::RawMustacheTag(n) => n.span,
            TemplateNode::IfBlock(n) => n.span,
            TemplateNode::EachBlock(n) => n.span,
            TemplateNode::AwaitBlock(n) => n.span,
            TemplateNode::KeyBlock(n) => n.span,
        }
    }

    /// A short human-readable description used in diagnostics.
    pub fn description(&self) -> String {
        match self {
            TemplateNode::Text(_) => "text".to_string(),
            TemplateNode::Comment(_) => "comment".to_string(),
            TemplateNode::Element(n) => format!("<{}> tag", n.name),
            TemplateNode::MustacheTag(_) => "{expression} tag".to_string(),
            TemplateNode::RawMustacheTag(_) => "{@html} block".to_string(),
            TemplateNode::IfBlock(_) => "{#if} block".to_string(),
            TemplateNode::EachBlock(_) => "{#each} block".to_string(),
            TemplateNode::AwaitBlock(_) => "{#await} block".to_string(),
            TemplateNode::KeyBlock(_) => "{#key} block".to_string(),
        }
    }
}

/// Literal text.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Text {
    /// The span of the text.
    pub span: Span,
    /// The verbatim source text.
    pub raw: String,
    /// The text with HTML character references decoded. Block-boundary
    /// whitespace trimming applies to this field only.
    pub data: String,
}

/// An HTML comment.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Comment {
    /// The span of the comment including delimiters.
    pub span: Span,
    /// The comment text between `<!--` and `-->`.
    pub data: String,
}

/// How a tag name was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementKind {
    /// An ordinary HTML element.
    Element,
    /// A component reference (capitalized or dotted name, `astro:self`, or
    /// `astro:component`).
    InlineComponent,
    /// A `<slot>` outlet.
    Slot,
    /// An `<astro:fragment>` slot template.
    SlotTemplate,
    /// A `<title>` inside `<astro:head>`.
    Title,
    /// The `<astro:head>` meta tag.
    Head,
}

/// An element-like node: element, component, slot, title or head.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Element {
    /// The span from `<` to the end of the closing tag (or `>` for
    /// self-closing and void tags).
    pub span: Span,
    /// The classification of this tag.
    pub kind: ElementKind,
    /// The tag name as written.
    pub name: SmolStr,
    /// Attributes and directives in source order.
    pub attributes: Vec<Attribute>,
    /// Child nodes.
    pub children: Vec<TemplateNode>,
    /// For `<astro:component>`, the expression from the extracted `this`
    /// attribute.
    pub expression: Option<Expression>,
}

/// The front-matter script of a component (`---` fenced).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Script {
    /// The span including both fences.
    pub span: Span,
    /// The span of just the fenced content.
    pub content_span: Span,
    /// The verbatim content between the fences. Not parsed here; a
    /// downstream collaborator feeds it to a JavaScript parser.
    pub content: String,
}

/// The single top-level `<style>` of a component.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Style {
    /// The span including tags.
    pub span: Span,
    /// The span of just the style content.
    pub content_span: Span,
    /// The raw style text. CSS parsing is out of scope; the text is opaque.
    pub content: String,
    /// Attributes on the style tag.
    pub attributes: Vec<Attribute>,
}

/// A scanned JavaScript expression.
///
/// The expression body is captured as raw text. When markup is embedded in
/// the expression, `code_start`/`code_end` hold the JS text on either side
/// of it and `children` holds the recursively parsed fragment; offsets
/// inside that fragment are relative to the embedded snippet.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expression {
    /// The span of the scanned expression text.
    pub span: Span,
    /// Raw JS text before the embedded markup, or the whole expression.
    pub code_start: String,
    /// Raw JS text after the embedded markup; empty when none was found.
    pub code_end: String,
    /// The embedded markup fragment, if any.
    pub children: Option<Fragment>,
}

/// An identifier, as used by directive shorthands and bindings.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identifier {
    /// The span of the identifier.
    pub span: Span,
    /// The identifier text.
    pub name: SmolStr,
}

/// A `{expr}` tag in template or attribute-value position.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MustacheTag {
    /// The span including braces.
    pub span: Span,
    /// The wrapped expression.
    pub expression: Expression,
}

/// An `{@html expr}` raw-injection tag.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawMustacheTag {
    /// The span including braces.
    pub span: Span,
    /// The wrapped expression.
    pub expression: Expression,
}

/// An attribute on an element-like tag.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Attribute {
    /// A plain attribute, boolean or valued.
    Normal(NormalAttribute),
    /// A `{...expr}` spread.
    Spread(SpreadAttribute),
    /// A colon-namespaced directive.
    Directive(Directive),
}

impl Attribute {
    /// Returns the span of this attribute.
    pub fn span(&self) -> Span {
        match self {
            Attribute::Normal(a) => a.span,
            Attribute::Spread(a) => a.span,
            Attribute::Directive(a) => a.span,
        }
    }

    /// Returns the name this attribute was written with, if it has one.
    pub fn name(&self) -> Option<&SmolStr> {
        match self {
            Attribute::Normal(a) => Some(&a.name),
            Attribute::Spread(_) => None,
            Attribute::Directive(a) => Some(&a.name),
        }
    }
}

/// A plain attribute.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalAttribute {
    /// The span of the attribute including its value.
    pub span: Span,
    /// The attribute name.
    pub name: SmolStr,
    /// The attribute value.
    pub value: AttributeValue,
}

/// An attribute value.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeValue {
    /// No value was written; the attribute is boolean true.
    True,
    /// A sequence of literal text and mustache chunks.
    Sequence(Vec<ValueChunk>),
}

impl AttributeValue {
    /// Returns the chunk sequence, or an empty slice for a boolean value.
    pub fn chunks(&self) -> &[ValueChunk] {
        match self {
            AttributeValue::True => &[],
            AttributeValue::Sequence(chunks) => chunks,
        }
    }
}

/// One chunk of an attribute-value sequence.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueChunk {
    /// Literal (entity-decoded) text.
    Text(Text),
    /// An embedded `{expr}`.
    MustacheTag(MustacheTag),
    /// The `{name}` shorthand form.
    Shorthand(Shorthand),
}

impl ValueChunk {
    /// Returns the span of this chunk.
    pub fn span(&self) -> Span {
        match self {
            ValueChunk::Text(c) => c.span,
            ValueChunk::MustacheTag(c) => c.span,
            ValueChunk::Shorthand(c) => c.span,
        }
    }
}

/// The expression of a `{name}` shorthand attribute.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shorthand {
    /// The span of the name inside the braces.
    pub span: Span,
    /// The implied identifier expression.
    pub expression: Identifier,
}

/// A `{...expr}` spread attribute.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpreadAttribute {
    /// The span including braces.
    pub span: Span,
    /// The expression being spread.
    pub expression: Expression,
}

/// The kind of a directive, derived from its pre-colon keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DirectiveKind {
    /// `use:action`
    Action,
    /// `animate:name`
    Animation,
    /// `bind:property`
    Binding,
    /// `class:name`
    Class,
    /// `on:event`
    EventHandler,
    /// `let:name`
    Let,
    /// `in:`/`out:`/`transition:` with intro/outro flags.
    Transition,
}

/// A colon-namespaced directive attribute.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Directive {
    /// The span of the directive including its value.
    pub span: Span,
    /// The directive kind.
    pub kind: DirectiveKind,
    /// The post-colon, pre-modifier name.
    pub name: SmolStr,
    /// Pipe-separated modifiers after the name.
    pub modifiers: Vec<SmolStr>,
    /// The directive expression, if any. Binding and Class directives with
    /// no written value default to an identifier equal to their name.
    pub expression: Option<DirectiveExpression>,
    /// For Transition directives, whether the transition plays on intro.
    pub intro: bool,
    /// For Transition directives, whether the transition plays on outro.
    pub outro: bool,
}

/// The value of a directive.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DirectiveExpression {
    /// An explicit `{expr}` value.
    Expression(Expression),
    /// The implied identifier for a value-less `bind:`/`class:` directive.
    Identifier(Identifier),
}

/// The binding introduced by `each ... as` or `await ... then/catch`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Context {
    /// A simple identifier binding.
    Identifier(Identifier),
    /// An array or object destructuring pattern, captured as raw text and
    /// validated through the external JS parser.
    Pattern(Pattern),
}

impl Context {
    /// Returns the span of this context.
    pub fn span(&self) -> Span {
        match self {
            Context::Identifier(i) => i.span,
            Context::Pattern(p) => p.span,
        }
    }
}

/// A destructuring pattern captured from an `each`/`await` binding.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pattern {
    /// The span of the pattern text.
    pub span: Span,
    /// The raw pattern text including brackets.
    pub raw: String,
}

/// An `{#if}` block.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IfBlock {
    /// The span of the block. For an else-if link this starts after the
    /// `{:else if ...}` tag, matching the upstream offset scheme.
    pub span: Span,
    /// The condition expression.
    pub expression: Expression,
    /// True when this block is the `{:else if}` continuation of another.
    pub elseif: bool,
    /// The consequent children.
    pub children: Vec<TemplateNode>,
    /// The `{:else}`/`{:else if}` branch, if any.
    pub else_block: Option<ElseBlock>,
}

/// An `{:else}` branch of an if or each block.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElseBlock {
    /// The span of the branch content.
    pub span: Span,
    /// The branch children. For an else-if chain this is a single nested
    /// `IfBlock` with `elseif == true`.
    pub children: Vec<TemplateNode>,
}

/// An `{#each}` block.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EachBlock {
    /// The span of the block.
    pub span: Span,
    /// The iterated expression.
    pub expression: Expression,
    /// The per-item binding.
    pub context: Context,
    /// The optional index name after a comma.
    pub index: Option<SmolStr>,
    /// The optional `(key)` expression.
    pub key: Option<Expression>,
    /// The loop body.
    pub children: Vec<TemplateNode>,
    /// The `{:else}` branch rendered for an empty list.
    pub else_block: Option<ElseBlock>,
}

/// An `{#await}` block. The three sub-blocks are always allocated; branches
/// that never appeared in the source keep `skip == true`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AwaitBlock {
    /// The span of the block.
    pub span: Span,
    /// The awaited expression.
    pub expression: Expression,
    /// The resolved-value binding from `{:then v}` or the `then` shorthand.
    pub value: Option<Context>,
    /// The rejection binding from `{:catch e}` or the `catch` shorthand.
    pub error: Option<Context>,
    /// The pending branch.
    pub pending: AwaitSubBlock,
    /// The resolved branch.
    pub then: AwaitSubBlock,
    /// The rejected branch.
    pub catch: AwaitSubBlock,
}

/// One branch of an `{#await}` block.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AwaitSubBlock {
    /// The span of the branch. Empty when the branch was never populated.
    pub span: Span,
    /// The branch children.
    pub children: Vec<TemplateNode>,
    /// True when the branch never appeared in the source.
    pub skip: bool,
}

impl AwaitSubBlock {
    /// An unpopulated branch anchored at the given offset.
    pub(crate) fn skipped(offset: usize) -> Self {
        Self {
            span: Span::empty(offset as u32),
            children: Vec::new(),
            skip: true,
        }
    }
}

/// A `{#key}` block.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyBlock {
    /// The span of the block.
    pub span: Span,
    /// The key expression.
    pub expression: Expression,
    /// The block children.
    pub children: Vec<TemplateNode>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use text_size::TextSize;

    #[test]
    fn test_node_span() {
        let text = Text {
            span: Span::new(3u32, 8u32),
            raw: "hello".to_string(),
            data: "hello".to_string(),
        };
        let node = TemplateNode::Text(text);
        assert_eq!(node.span().start, TextSize::from(3));
        assert_eq!(node.span().end, TextSize::from(8));
    }

    #[test]
    fn test_attribute_value_chunks() {
        assert!(AttributeValue::True.chunks().is_empty());
    }

    #[test]
    fn test_description() {
        let el = Element {
            span: Span::new(0u32, 5u32),
            kind: ElementKind::Element,
            name: SmolStr::new("div"),
            attributes: vec![],
            children: vec![],
            expression: None,
        };
        assert_eq!(TemplateNode::Element(el).description(), "<div> tag");
    }
}
