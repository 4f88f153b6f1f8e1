//! The template parser: a single-pass, character-level state machine.
//!
//! The parser never backtracks past a consumed character. Open constructs
//! live on a stack of [`Frame`]s; closing a construct pops its frame,
//! materializes the owned AST node, and attaches it to the frame below.
//! Every diagnostic is fatal: the first error aborts the parse.

use crate::ast::{
    Attribute, AttributeValue, AwaitBlock, AwaitSubBlock, Comment, Context, Directive,
    DirectiveExpression, DirectiveKind, EachBlock, Element, ElementKind, ElseBlock, Expression,
    Fragment, Identifier, IfBlock, KeyBlock, MustacheTag, NormalAttribute, RawMustacheTag, Script,
    Shorthand, SpreadAttribute, Style, TemplateNode, Text, ValueChunk,
};
use crate::error::{ErrorCode, ParseError};
use crate::fuzzymatch::{fuzzymatch, list_names};
use crate::html::{closing_tag_omitted, decode_character_references, is_void};
use crate::js::JsParser;
use crate::ParsedComponent;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use source_span::Span;

/// Tag names with reserved parser semantics.
const VALID_META_TAGS: &[&str] = &["astro:head"];

/// JavaScript reserved words, rejected in identifier position.
const RESERVED_WORDS: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let",
    "new", "null", "package", "private", "protected", "public", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Template whitespace: the characters trimmed around block boundaries.
fn is_template_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn span(start: usize, end: usize) -> Span {
    Span::new(start as u32, end as u32)
}

/// The state selected by the fragment dispatcher for the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Setup,
    Tag,
    Mustache,
    Text,
}

/// Which block keyword opens a `{#...}` construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    If,
    Each,
    Await,
    Key,
}

/// The branch of an `{#await}` block currently collecting children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AwaitSubKind {
    Pending,
    Then,
    Catch,
}

/// An element whose closing tag was inferred from HTML omission rules,
/// remembered so a later stray closing tag gets a precise message.
#[derive(Debug, Clone)]
struct AutoClosedTag {
    tag: SmolStr,
    reason: SmolStr,
    depth: usize,
}

/// An in-progress node on the open-construct stack.
pub(crate) enum Frame {
    Root {
        children: Vec<TemplateNode>,
    },
    Element {
        start: usize,
        kind: ElementKind,
        name: SmolStr,
        attributes: Vec<Attribute>,
        children: Vec<TemplateNode>,
        expression: Option<Expression>,
    },
    If {
        start: usize,
        expression: Expression,
        elseif: bool,
        children: Vec<TemplateNode>,
        else_block: Option<ElseBlock>,
    },
    Each {
        start: usize,
        expression: Expression,
        context: Context,
        index: Option<SmolStr>,
        key: Option<Expression>,
        children: Vec<TemplateNode>,
        else_block: Option<ElseBlock>,
    },
    Await {
        start: usize,
        expression: Expression,
        value: Option<Context>,
        error: Option<Context>,
        pending: AwaitSubBlock,
        then: AwaitSubBlock,
        catch: AwaitSubBlock,
    },
    Key {
        start: usize,
        expression: Expression,
        children: Vec<TemplateNode>,
    },
    Else {
        start: usize,
        children: Vec<TemplateNode>,
    },
    AwaitSub {
        kind: AwaitSubKind,
        start: usize,
        children: Vec<TemplateNode>,
    },
}

impl Frame {
    fn start(&self) -> usize {
        match self {
            Frame::Root { .. } => 0,
            Frame::Element { start, .. }
            | Frame::If { start, .. }
            | Frame::Each { start, .. }
            | Frame::Await { start, .. }
            | Frame::Key { start, .. }
            | Frame::Else { start, .. }
            | Frame::AwaitSub { start, .. } => *start,
        }
    }

    fn children_mut(&mut self) -> &mut Vec<TemplateNode> {
        match self {
            Frame::Root { children }
            | Frame::Element { children, .. }
            | Frame::If { children, .. }
            | Frame::Each { children, .. }
            | Frame::Key { children, .. }
            | Frame::Else { children, .. }
            | Frame::AwaitSub { children, .. } => children,
            // await children always collect in a sub-block frame
            Frame::Await { .. } => unreachable!("await blocks take children through sub-blocks"),
        }
    }

    /// A short description used in block-placement diagnostics.
    fn description(&self) -> String {
        match self {
            Frame::Root { .. } => "the component".to_string(),
            Frame::Element { name, .. } => format!("<{name}> tag"),
            Frame::If { .. } => "{#if} block".to_string(),
            Frame::Each { .. } => "{#each} block".to_string(),
            Frame::Await { .. }
            | Frame::AwaitSub {
                kind: AwaitSubKind::Pending,
                ..
            } => "{#await} block".to_string(),
            Frame::AwaitSub {
                kind: AwaitSubKind::Then,
                ..
            } => "{:then} block".to_string(),
            Frame::AwaitSub {
                kind: AwaitSubKind::Catch,
                ..
            } => "{:catch} block".to_string(),
            Frame::Else { .. } => "{:else} block".to_string(),
            Frame::Key { .. } => "{#key} block".to_string(),
        }
    }
}

fn element_from_frame(frame: Frame, end: usize) -> Option<TemplateNode> {
    if let Frame::Element {
        start,
        kind,
        name,
        attributes,
        children,
        expression,
    } = frame
    {
        Some(TemplateNode::Element(Element {
            span: span(start, end),
            kind,
            name,
            attributes,
            children,
            expression,
        }))
    } else {
        None
    }
}

/// How a text/mustache sequence terminates.
enum SequenceEnd {
    Literal(&'static str),
    Quote(char),
    Unquoted,
}

pub(crate) struct Parser<'a> {
    pub(crate) template: &'a str,
    pub(crate) index: usize,
    pub(crate) stack: Vec<Frame>,
    css: Vec<Style>,
    scripts: Vec<Script>,
    meta_tags: FxHashSet<SmolStr>,
    last_auto_closed_tag: Option<AutoClosedTag>,
    pub(crate) filename: Option<&'a str>,
    custom_element: bool,
    pub(crate) depth: usize,
    pub(crate) js: &'a dyn JsParser,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        template: &'a str,
        filename: Option<&'a str>,
        custom_element: bool,
        js: &'a dyn JsParser,
    ) -> Self {
        Self {
            template,
            index: 0,
            stack: vec![Frame::Root {
                children: Vec::new(),
            }],
            css: Vec::new(),
            scripts: Vec::new(),
            meta_tags: FxHashSet::default(),
            last_auto_closed_tag: None,
            filename,
            custom_element,
            depth: 0,
            js,
        }
    }

    /// A fresh parser over an embedded markup snippet, one level deeper.
    pub(crate) fn nested<'b>(&'b self, snippet: &'b str) -> Parser<'b> {
        let mut parser = Parser::new(snippet.trim_end(), self.filename, self.custom_element, self.js);
        parser.depth = self.depth + 1;
        parser
    }

    pub(crate) fn run_to_fragment(self) -> Result<Fragment, ParseError> {
        self.finish().map(|parsed| parsed.html)
    }

    /// Runs the state loop to the end of input, enforces the post-parse
    /// invariants, and assembles the result.
    pub(crate) fn finish(mut self) -> Result<ParsedComponent, ParseError> {
        while self.index < self.template.len() {
            match self.dispatch() {
                State::Setup => self.setup()?,
                State::Tag => self.tag()?,
                State::Mustache => self.mustache()?,
                State::Text => self.text(),
            }
        }

        if self.stack.len() > 1 {
            if let Some(frame) = self.stack.last() {
                return Err(match frame {
                    Frame::Element { name, start, .. } => self.error_at(
                        ErrorCode::UnclosedElement,
                        format!("<{name}> was left open"),
                        *start,
                    ),
                    other => self.error_at(
                        ErrorCode::UnclosedBlock,
                        "Block was left open",
                        other.start(),
                    ),
                });
            }
        }

        let children = match self.stack.pop() {
            Some(Frame::Root { children }) => children,
            _ => Vec::new(),
        };
        // the fragment's reported span excludes pure boundary whitespace,
        // but the whitespace text nodes themselves are kept
        let fragment_span = match (children.first(), children.last()) {
            (Some(first), Some(last)) => {
                let bytes = self.template.as_bytes();
                let mut start = first.span().start_usize();
                let mut end = last.span().end_usize();
                while start < end && is_template_whitespace(bytes[start] as char) {
                    start += 1;
                }
                while end > start && is_template_whitespace(bytes[end - 1] as char) {
                    end -= 1;
                }
                span(start, end)
            }
            _ => Span::empty(0u32),
        };
        let html = Fragment {
            span: fragment_span,
            children,
        };

        if self.css.len() > 1 {
            return Err(self.error_at(
                ErrorCode::DuplicateStyle,
                "You can only have one <style> tag per Astro file",
                self.css[1].span.start_usize(),
            ));
        }
        if self.scripts.len() > 1 {
            return Err(self.error_at(
                ErrorCode::InvalidScript,
                "A component can only have one frontmatter (---) script",
                self.scripts[1].span.start_usize(),
            ));
        }

        Ok(ParsedComponent {
            html,
            css: self.css.into_iter().next(),
            module: self.scripts.into_iter().next(),
        })
    }

    /// Pure lookahead state selection; consumes nothing.
    fn dispatch(&self) -> State {
        if self.at_setup_fence() {
            State::Setup
        } else if self.match_str("<") {
            State::Tag
        } else if self.match_str("{") {
            State::Mustache
        } else {
            State::Text
        }
    }

    /// Front matter is only legal before any non-whitespace content, at
    /// the start of a line.
    fn at_setup_fence(&self) -> bool {
        if !self.match_str("---") {
            return false;
        }
        if self.index > 0 && self.template.as_bytes()[self.index - 1] != b'\n' {
            return false;
        }
        if self.stack.len() != 1 {
            return false;
        }
        match self.stack.first() {
            Some(Frame::Root { children }) => children
                .iter()
                .all(|c| matches!(c, TemplateNode::Text(t) if t.data.trim().is_empty())),
            _ => false,
        }
    }

    // === cursor primitives ===

    pub(crate) fn char_at(&self, offset: usize) -> Option<char> {
        self.template.get(offset..).and_then(|s| s.chars().next())
    }

    pub(crate) fn match_str(&self, s: &str) -> bool {
        self.template[self.index..].starts_with(s)
    }

    pub(crate) fn eat(&mut self, s: &str) -> bool {
        if self.match_str(s) {
            self.index += s.len();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_required(&mut self, s: &str, message: Option<&str>) -> Result<(), ParseError> {
        if self.eat(s) {
            return Ok(());
        }
        let code = if self.index == self.template.len() {
            ErrorCode::UnexpectedEof
        } else {
            ErrorCode::UnexpectedToken
        };
        let message = match message {
            Some(m) => m.to_string(),
            None => format!("Expected {s}"),
        };
        Err(self.error(code, message))
    }

    pub(crate) fn allow_whitespace(&mut self) {
        while self.char_at(self.index).is_some_and(is_template_whitespace) {
            self.index += 1;
        }
    }

    pub(crate) fn require_whitespace(&mut self) -> Result<(), ParseError> {
        if !self.char_at(self.index).is_some_and(is_template_whitespace) {
            return Err(self.error(ErrorCode::MissingWhitespace, "Expected whitespace"));
        }
        self.allow_whitespace();
        Ok(())
    }

    /// Consumes up to (not including) the first character matching the
    /// terminator, or to end of input.
    pub(crate) fn read_until(
        &mut self,
        terminator: impl Fn(char) -> bool,
    ) -> Result<&'a str, ParseError> {
        if self.index >= self.template.len() {
            return Err(self.eof_error());
        }
        let template = self.template;
        let start = self.index;
        let mut i = start;
        while let Some(c) = template.get(i..).and_then(|s| s.chars().next()) {
            if terminator(c) {
                break;
            }
            i += c.len_utf8();
        }
        self.index = i;
        Ok(&template[start..i])
    }

    /// Consumes up to (not including) the next occurrence of `pattern`,
    /// or to end of input.
    pub(crate) fn read_until_str(&mut self, pattern: &str) -> Result<&'a str, ParseError> {
        if self.index >= self.template.len() {
            return Err(self.eof_error());
        }
        let template = self.template;
        let start = self.index;
        self.index = match template[start..].find(pattern) {
            Some(n) => start + n,
            None => template.len(),
        };
        Ok(&template[start..self.index])
    }

    /// Reads an identifier at the cursor, or `None` if the cursor is not
    /// on an identifier start. Reserved words are rejected.
    pub(crate) fn read_identifier(&mut self) -> Result<Option<Identifier>, ParseError> {
        let start = self.index;
        let Some(first) = self.char_at(start) else {
            return Ok(None);
        };
        if !(first.is_alphabetic() || first == '_' || first == '$') {
            return Ok(None);
        }
        let mut i = start + first.len_utf8();
        while let Some(c) = self.char_at(i) {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                i += c.len_utf8();
            } else {
                break;
            }
        }
        let name = &self.template[start..i];
        if RESERVED_WORDS.contains(&name) {
            return Err(self.error_at(
                ErrorCode::UnexpectedReservedWord,
                format!("'{name}' is a reserved word in JavaScript and cannot be used here"),
                start,
            ));
        }
        self.index = i;
        Ok(Some(Identifier {
            span: span(start, i),
            name: SmolStr::new(name),
        }))
    }

    // === errors ===

    pub(crate) fn error(&self, code: ErrorCode, message: impl Into<String>) -> ParseError {
        self.error_at(code, message, self.index)
    }

    pub(crate) fn error_at(
        &self,
        code: ErrorCode,
        message: impl Into<String>,
        offset: usize,
    ) -> ParseError {
        ParseError::new(code, message, self.template, offset, self.filename)
    }

    pub(crate) fn eof_error(&self) -> ParseError {
        self.error_at(
            ErrorCode::UnexpectedEof,
            "Unexpected end of input",
            self.template.len(),
        )
    }

    // === tree plumbing ===

    fn append_child(&mut self, node: TemplateNode) {
        if let Some(frame) = self.stack.last_mut() {
            frame.children_mut().push(node);
        }
    }

    fn current_description(&self) -> String {
        self.stack.last().map(Frame::description).unwrap_or_default()
    }

    // === setup (front matter) state ===

    fn setup(&mut self) -> Result<(), ParseError> {
        let start = self.index;
        self.eat_required("---", None)?;
        let content_start = self.index;
        let template = self.template;
        // the closing fence must sit at the start of a line
        let mut search = self.index;
        let close = loop {
            let Some(found) = template[search..].find("---") else {
                return Err(self.error_at(
                    ErrorCode::UnexpectedEof,
                    "Expected ---",
                    template.len(),
                ));
            };
            let at = search + found;
            if at == 0 || template.as_bytes()[at - 1] == b'\n' {
                break at;
            }
            search = at + 3;
        };
        let content = template[content_start..close].to_string();
        self.index = close;
        self.eat_required("---", None)?;
        self.scripts.push(Script {
            span: span(start, self.index),
            content_span: span(content_start, close),
            content,
        });
        Ok(())
    }

    // === text state ===

    fn text(&mut self) {
        let template = self.template;
        let start = self.index;
        while let Some(c) = self.char_at(self.index) {
            if c == '<' || c == '{' {
                break;
            }
            // let a front-matter fence after leading whitespace through
            if c == '-'
                && template[start..self.index].trim().is_empty()
                && self.at_setup_fence()
            {
                break;
            }
            self.index += c.len_utf8();
        }
        let raw = &template[start..self.index];
        let node = TemplateNode::Text(Text {
            span: span(start, self.index),
            raw: raw.to_string(),
            data: decode_character_references(raw),
        });
        self.append_child(node);
    }

    // === tag state ===

    fn tag(&mut self) -> Result<(), ParseError> {
        let start = self.index;
        self.index += 1;

        if self.eat("!--") {
            let data = self.read_until_str("-->")?.to_string();
            self.eat_required("-->", Some("comment was left open, expected -->"))?;
            self.append_child(TemplateNode::Comment(Comment {
                span: span(start, self.index),
                data,
            }));
            return Ok(());
        }

        let is_closing_tag = self.eat("/");
        let name = self.read_tag_name()?;

        if name == "astro:head" && !is_closing_tag {
            if self.meta_tags.contains(&name) {
                return Err(self.error_at(
                    ErrorCode::DuplicateHead,
                    format!("A component can only have one <{name}> tag"),
                    start,
                ));
            }
            if self.stack.len() > 1 {
                return Err(self.error_at(
                    ErrorCode::InvalidHeadPlacement,
                    format!("<{name}> tags cannot be inside elements or blocks"),
                    start,
                ));
            }
            self.meta_tags.insert(name.clone());
        }

        let kind = self.classify(&name);
        self.allow_whitespace();

        if is_closing_tag {
            if is_void(&name) {
                return Err(self.error_at(
                    ErrorCode::InvalidVoidContent,
                    format!("<{name}> is a void element and cannot have children, or a closing tag"),
                    start,
                ));
            }
            self.eat_required(">", None)?;
            // close elements without their own closing tags, e.g. <div><p></div>
            loop {
                match self.stack.last() {
                    Some(Frame::Element { name: top, .. }) if *top == name => break,
                    Some(Frame::Element {
                        kind: ElementKind::Element,
                        ..
                    }) => {
                        if let Some(node) =
                            self.stack.pop().and_then(|f| element_from_frame(f, start))
                        {
                            self.append_child(node);
                        }
                    }
                    _ => {
                        let message = match &self.last_auto_closed_tag {
                            Some(auto) if auto.tag == name => format!(
                                "</{name}> attempted to close <{name}> that was already automatically closed by <{}>",
                                auto.reason
                            ),
                            _ => format!("</{name}> attempted to close an element that was not open"),
                        };
                        return Err(self.error_at(ErrorCode::InvalidClosingTag, message, start));
                    }
                }
            }
            if let Some(node) = self.stack.pop().and_then(|f| element_from_frame(f, self.index)) {
                self.append_child(node);
            }
            if self
                .last_auto_closed_tag
                .as_ref()
                .is_some_and(|auto| self.stack.len() < auto.depth)
            {
                self.last_auto_closed_tag = None;
            }
            return Ok(());
        }

        // a sibling opener may implicitly close the current element
        let auto_close = match self.stack.last() {
            Some(Frame::Element { name: top, .. }) if closing_tag_omitted(top, Some(&name)) => {
                Some(top.clone())
            }
            _ => None,
        };
        if let Some(top_name) = auto_close {
            if let Some(node) = self.stack.pop().and_then(|f| element_from_frame(f, start)) {
                self.append_child(node);
            }
            self.last_auto_closed_tag = Some(AutoClosedTag {
                tag: top_name,
                reason: name.clone(),
                depth: self.stack.len(),
            });
        }

        let mut unique_names: FxHashSet<SmolStr> = FxHashSet::default();
        let mut attributes = Vec::new();
        while let Some(attribute) = self.read_attribute(&mut unique_names)? {
            attributes.push(attribute);
            self.allow_whitespace();
        }

        let mut expression = None;
        if name == "astro:component" {
            expression = Some(self.component_definition(&mut attributes, start)?);
        }

        // a top-level <style> is captured whole, not added to the tree
        if name == "style" && self.stack.len() == 1 {
            self.eat_required(">", None)?;
            let content_start = self.index;
            let content = self.read_until_str("</style>")?.to_string();
            let content_end = self.index;
            self.eat_required("</style>", None)?;
            self.css.push(Style {
                span: span(start, self.index),
                content_span: span(content_start, content_end),
                content,
                attributes,
            });
            return Ok(());
        }

        let self_closing = self.eat("/") || is_void(&name);
        self.eat_required(">", None)?;

        if self_closing {
            self.append_child(TemplateNode::Element(Element {
                span: span(start, self.index),
                kind,
                name,
                attributes,
                children: Vec::new(),
                expression,
            }));
        } else if name == "textarea" {
            // raw content with mustache interpolation, no nested tags
            let chunks = self.read_sequence(SequenceEnd::Literal("</textarea>"))?;
            self.eat_required("</textarea>", None)?;
            let children = chunks.into_iter().filter_map(chunk_to_node).collect();
            self.append_child(TemplateNode::Element(Element {
                span: span(start, self.index),
                kind,
                name,
                attributes,
                children,
                expression,
            }));
        } else if name == "script" || name == "style" {
            // opaque content up to the literal closing tag
            let content_start = self.index;
            let closing = format!("</{name}>");
            let data = self.read_until_str(&closing)?.to_string();
            let text = TemplateNode::Text(Text {
                span: span(content_start, self.index),
                raw: data.clone(),
                data,
            });
            self.eat_required(&closing, None)?;
            self.append_child(TemplateNode::Element(Element {
                span: span(start, self.index),
                kind,
                name,
                attributes,
                children: vec![text],
                expression,
            }));
        } else {
            self.stack.push(Frame::Element {
                start,
                kind,
                name,
                attributes,
                children: Vec::new(),
                expression,
            });
        }
        Ok(())
    }

    fn read_tag_name(&mut self) -> Result<SmolStr, ParseError> {
        let start = self.index;
        if self.eat_tag_keyword("astro:self") {
            // self-reference outside a conditional or slot would recurse forever
            let legal = self.stack.iter().any(|frame| {
                matches!(
                    frame,
                    Frame::If { .. }
                        | Frame::Each { .. }
                        | Frame::Element {
                            kind: ElementKind::InlineComponent,
                            ..
                        }
                )
            });
            if !legal {
                return Err(self.error_at(
                    ErrorCode::InvalidSelfPlacement,
                    "<astro:self> components can only exist inside {#if} blocks, {#each} blocks, or slots passed to components",
                    start,
                ));
            }
            return Ok(SmolStr::new("astro:self"));
        }
        if self.eat_tag_keyword("astro:component") {
            return Ok(SmolStr::new("astro:component"));
        }
        if self.eat_tag_keyword("astro:fragment") {
            return Ok(SmolStr::new("astro:fragment"));
        }
        if self.eat_tag_keyword("head") {
            return Ok(SmolStr::new("head"));
        }
        let name = self.read_until(|c| c.is_whitespace() || c == '/' || c == '>')?;
        if name == "astro:head" {
            return Ok(SmolStr::new(name));
        }
        if name.starts_with("astro:") {
            let mut message = format!(
                "Valid <astro:...> tag names are {}",
                list_names(VALID_META_TAGS)
            );
            if let Some(matched) = fuzzymatch(name, VALID_META_TAGS) {
                message.push_str(&format!(" (did you mean '{matched}'?)"));
            }
            return Err(self.error_at(ErrorCode::InvalidTagName, message, start));
        }
        if !valid_tag_name(name) {
            return Err(self.error_at(ErrorCode::InvalidTagName, "Expected valid tag name", start));
        }
        Ok(SmolStr::new(name))
    }

    /// Eats a reserved tag spelling only when followed by whitespace,
    /// `/` or `>`.
    fn eat_tag_keyword(&mut self, keyword: &str) -> bool {
        if !self.match_str(keyword) {
            return false;
        }
        match self.char_at(self.index + keyword.len()) {
            Some(c) if c.is_whitespace() || c == '/' || c == '>' => {
                self.index += keyword.len();
                true
            }
            _ => false,
        }
    }

    fn classify(&self, name: &str) -> ElementKind {
        if name == "astro:head" {
            ElementKind::Head
        } else if name.starts_with(|c: char| c.is_ascii_uppercase())
            || name.contains('.')
            || name == "astro:self"
            || name == "astro:component"
        {
            ElementKind::InlineComponent
        } else if name == "astro:fragment" {
            ElementKind::SlotTemplate
        } else if name == "title" && self.parent_is_head() {
            ElementKind::Title
        } else if name == "slot" && !self.custom_element {
            ElementKind::Slot
        } else {
            ElementKind::Element
        }
    }

    /// True when the nearest element-like ancestor is `<astro:head>`.
    fn parent_is_head(&self) -> bool {
        for frame in self.stack.iter().rev() {
            match frame {
                Frame::Element {
                    kind: ElementKind::Head,
                    ..
                } => return true,
                Frame::Element {
                    kind: ElementKind::Element | ElementKind::InlineComponent,
                    ..
                } => return false,
                _ => {}
            }
        }
        false
    }

    fn component_definition(
        &self,
        attributes: &mut Vec<Attribute>,
        start: usize,
    ) -> Result<Expression, ParseError> {
        let position = attributes
            .iter()
            .position(|a| matches!(a, Attribute::Normal(n) if n.name == "this"));
        let Some(position) = position else {
            return Err(self.error_at(
                ErrorCode::MissingComponentDefinition,
                "<astro:component> must have a 'this' attribute",
                start,
            ));
        };
        let definition = match attributes.remove(position) {
            Attribute::Normal(normal) => normal,
            other => {
                return Err(self.error_at(
                    ErrorCode::InvalidComponentDefinition,
                    "invalid component definition",
                    other.span().start_usize(),
                ))
            }
        };
        let definition_start = definition.span.start_usize();
        match definition.value {
            AttributeValue::Sequence(mut chunks) if chunks.len() == 1 => match chunks.remove(0) {
                ValueChunk::MustacheTag(tag) => Ok(tag.expression),
                ValueChunk::Shorthand(shorthand) => Ok(Expression {
                    span: shorthand.expression.span,
                    code_start: shorthand.expression.name.to_string(),
                    code_end: String::new(),
                    children: None,
                }),
                ValueChunk::Text(_) => Err(self.error_at(
                    ErrorCode::InvalidComponentDefinition,
                    "invalid component definition",
                    definition_start,
                )),
            },
            _ => Err(self.error_at(
                ErrorCode::InvalidComponentDefinition,
                "invalid component definition",
                definition_start,
            )),
        }
    }

    // === attributes ===

    fn check_unique(
        &self,
        unique_names: &mut FxHashSet<SmolStr>,
        name: &SmolStr,
        start: usize,
    ) -> Result<(), ParseError> {
        if !unique_names.insert(name.clone()) {
            return Err(self.error_at(
                ErrorCode::DuplicateAttribute,
                "Attributes need to be unique",
                start,
            ));
        }
        Ok(())
    }

    fn read_attribute(
        &mut self,
        unique_names: &mut FxHashSet<SmolStr>,
    ) -> Result<Option<Attribute>, ParseError> {
        let start = self.index;

        if self.eat("{") {
            self.allow_whitespace();
            if self.eat("...") {
                let expression = self.read_expression()?;
                self.allow_whitespace();
                self.eat_required("}", None)?;
                return Ok(Some(Attribute::Spread(SpreadAttribute {
                    span: span(start, self.index),
                    expression,
                })));
            }
            let Some(identifier) = self.read_identifier()? else {
                return Err(self.error(ErrorCode::UnexpectedToken, "Expected identifier"));
            };
            self.allow_whitespace();
            self.eat_required("}", None)?;
            self.check_unique(unique_names, &identifier.name, start)?;
            let name = identifier.name.clone();
            return Ok(Some(Attribute::Normal(NormalAttribute {
                span: span(start, self.index),
                name,
                value: AttributeValue::Sequence(vec![ValueChunk::Shorthand(Shorthand {
                    span: identifier.span,
                    expression: identifier,
                })]),
            })));
        }

        let name_slice =
            self.read_until(|c| c.is_whitespace() || matches!(c, '=' | '/' | '>' | '"' | '\''))?;
        if name_slice.is_empty() {
            return Ok(None);
        }
        let name = SmolStr::new(name_slice);
        let mut end = self.index;
        self.allow_whitespace();

        let mut value: Option<Vec<ValueChunk>> = None;
        if self.eat("=") {
            self.allow_whitespace();
            value = Some(self.read_attribute_value()?);
            end = self.index;
        } else if matches!(self.char_at(self.index), Some('"' | '\'')) {
            return Err(self.error(ErrorCode::UnexpectedToken, "Expected ="));
        }

        if let Some(colon_index) = name_slice.find(':') {
            if let Some(parsed) = directive_kind(&name_slice[..colon_index]) {
                return self
                    .finish_directive(
                        unique_names,
                        start,
                        end,
                        name_slice,
                        colon_index,
                        parsed,
                        value,
                    )
                    .map(Some);
            }
        }

        self.check_unique(unique_names, &name, start)?;
        Ok(Some(Attribute::Normal(NormalAttribute {
            span: span(start, end),
            name,
            value: match value {
                None => AttributeValue::True,
                Some(chunks) => AttributeValue::Sequence(chunks),
            },
        })))
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_directive(
        &self,
        unique_names: &mut FxHashSet<SmolStr>,
        start: usize,
        end: usize,
        name_slice: &str,
        colon_index: usize,
        parsed: ParsedDirective,
        value: Option<Vec<ValueChunk>>,
    ) -> Result<Attribute, ParseError> {
        let rest = &name_slice[colon_index + 1..];
        let mut parts = rest.split('|');
        let directive_name = SmolStr::new(parts.next().unwrap_or_default());
        let modifiers: Vec<SmolStr> = parts.map(SmolStr::new).collect();

        let kind = match parsed {
            ParsedDirective::Ref => {
                return Err(self.error_at(
                    ErrorCode::InvalidRefDirective,
                    format!(
                        "The ref directive is no longer supported \u{2014} use `bind:this={{{directive_name}}}` instead"
                    ),
                    start,
                ))
            }
            ParsedDirective::Kind(kind) => kind,
        };

        if kind == DirectiveKind::Binding && directive_name != "this" {
            self.check_unique(unique_names, &directive_name, start)?;
        } else if kind != DirectiveKind::EventHandler && kind != DirectiveKind::Action {
            self.check_unique(unique_names, &SmolStr::new(name_slice), start)?;
        }

        if kind == DirectiveKind::Class && directive_name.is_empty() {
            return Err(self.error_at(
                ErrorCode::InvalidClassDirective,
                "Class binding name cannot be empty",
                start + colon_index + 1,
            ));
        }

        let mut expression = None;
        if let Some(chunks) = value {
            if let Some(first) = chunks.first() {
                if chunks.len() > 1 || matches!(first, ValueChunk::Text(_)) {
                    return Err(self.error_at(
                        ErrorCode::InvalidDirectiveValue,
                        "Directive value must be a JavaScript expression enclosed in curly braces",
                        first.span().start_usize(),
                    ));
                }
            }
            expression = chunks.into_iter().next().and_then(|chunk| match chunk {
                ValueChunk::MustacheTag(tag) => {
                    Some(DirectiveExpression::Expression(tag.expression))
                }
                _ => None,
            });
        }

        let (intro, outro) = if kind == DirectiveKind::Transition {
            let direction = &name_slice[..colon_index];
            (
                direction == "in" || direction == "transition",
                direction == "out" || direction == "transition",
            )
        } else {
            (false, false)
        };

        if expression.is_none()
            && matches!(kind, DirectiveKind::Binding | DirectiveKind::Class)
        {
            expression = Some(DirectiveExpression::Identifier(Identifier {
                span: span(start + colon_index + 1, end),
                name: directive_name.clone(),
            }));
        }

        Ok(Attribute::Directive(Directive {
            span: span(start, end),
            kind,
            name: directive_name,
            modifiers,
            expression,
            intro,
            outro,
        }))
    }

    fn read_attribute_value(&mut self) -> Result<Vec<ValueChunk>, ParseError> {
        let quote = if self.eat("'") {
            Some('\'')
        } else if self.eat("\"") {
            Some('"')
        } else {
            None
        };
        let chunks = self.read_sequence(match quote {
            Some(q) => SequenceEnd::Quote(q),
            None => SequenceEnd::Unquoted,
        })?;
        if quote.is_some() {
            self.index += 1;
        }
        Ok(chunks)
    }

    fn sequence_done(&self, end: &SequenceEnd) -> bool {
        match end {
            SequenceEnd::Literal(s) => self.match_str(s),
            SequenceEnd::Quote(q) => self.char_at(self.index) == Some(*q),
            SequenceEnd::Unquoted => {
                self.match_str("/>")
                    || self.char_at(self.index).is_some_and(|c| {
                        c.is_whitespace() || matches!(c, '"' | '\'' | '=' | '<' | '>' | '`')
                    })
            }
        }
    }

    /// Reads alternating literal text and `{expr}` chunks until the
    /// terminator. Text is entity-decoded; empty text chunks are dropped.
    fn read_sequence(&mut self, end: SequenceEnd) -> Result<Vec<ValueChunk>, ParseError> {
        let mut chunks = Vec::new();
        let mut chunk_start = self.index;
        let mut raw = String::new();
        loop {
            if self.index >= self.template.len() {
                return Err(self.eof_error());
            }
            if self.sequence_done(&end) {
                if !raw.is_empty() {
                    chunks.push(ValueChunk::Text(Text {
                        span: span(chunk_start, self.index),
                        data: decode_character_references(&raw),
                        raw,
                    }));
                }
                return Ok(chunks);
            }
            if self.match_str("{") {
                if !raw.is_empty() {
                    let flushed = std::mem::take(&mut raw);
                    chunks.push(ValueChunk::Text(Text {
                        span: span(chunk_start, self.index),
                        data: decode_character_references(&flushed),
                        raw: flushed,
                    }));
                }
                let tag_start = self.index;
                self.index += 1;
                self.allow_whitespace();
                let expression = self.read_expression()?;
                self.allow_whitespace();
                self.eat_required("}", None)?;
                chunks.push(ValueChunk::MustacheTag(MustacheTag {
                    span: span(tag_start, self.index),
                    expression,
                }));
                chunk_start = self.index;
            } else if let Some(c) = self.char_at(self.index) {
                raw.push(c);
                self.index += c.len_utf8();
            }
        }
    }

    // === mustache state ===

    fn mustache(&mut self) -> Result<(), ParseError> {
        let start = self.index;
        self.index += 1;
        self.allow_whitespace();

        if self.eat("/") {
            self.close_block(start)
        } else if self.eat(":else") {
            self.else_tag()
        } else if self.match_str(":then") || self.match_str(":catch") {
            self.then_catch(start)
        } else if self.eat("#") {
            self.open_block(start)
        } else if self.eat("@html") {
            self.require_whitespace()?;
            let expression = self.read_expression()?;
            self.allow_whitespace();
            self.eat_required("}", None)?;
            self.append_child(TemplateNode::RawMustacheTag(RawMustacheTag {
                span: span(start, self.index),
                expression,
            }));
            Ok(())
        } else if self.eat("@debug") {
            Err(self.error_at(ErrorCode::ParseError, "@debug not yet supported", start))
        } else {
            let expression = self.read_expression()?;
            self.allow_whitespace();
            self.eat_required("}", None)?;
            self.append_child(TemplateNode::MustacheTag(MustacheTag {
                span: span(start, self.index),
                expression,
            }));
            Ok(())
        }
    }

    /// Handles `{/if}`, `{/each}`, `{/await}` and `{/key}`.
    fn close_block(&mut self, start: usize) -> Result<(), ParseError> {
        // an element with an omittable closing tag ends where the closer begins
        let omit = matches!(
            self.stack.last(),
            Some(Frame::Element { name, .. }) if closing_tag_omitted(name, None)
        );
        if omit {
            if let Some(node) = self.stack.pop().and_then(|f| element_from_frame(f, start)) {
                self.append_child(node);
            }
        }

        // a sub-block ends at the closer and folds into its parent block
        match self.stack.last() {
            Some(Frame::Else { .. }) => {
                if let Some(Frame::Else {
                    start: else_start,
                    children,
                }) = self.stack.pop()
                {
                    let else_block = ElseBlock {
                        span: span(else_start, start),
                        children,
                    };
                    match self.stack.last_mut() {
                        Some(
                            Frame::If {
                                else_block: slot, ..
                            }
                            | Frame::Each {
                                else_block: slot, ..
                            },
                        ) => *slot = Some(else_block),
                        _ => {
                            return Err(self
                                .error(ErrorCode::UnexpectedBlockClose, "Unexpected block closing tag"))
                        }
                    }
                }
            }
            Some(Frame::AwaitSub { .. }) => {
                if let Some(Frame::AwaitSub {
                    kind,
                    start: sub_start,
                    children,
                }) = self.stack.pop()
                {
                    let sub = AwaitSubBlock {
                        span: span(sub_start, start),
                        children,
                        skip: false,
                    };
                    match self.stack.last_mut() {
                        Some(Frame::Await {
                            pending,
                            then,
                            catch,
                            ..
                        }) => match kind {
                            AwaitSubKind::Pending => *pending = sub,
                            AwaitSubKind::Then => *then = sub,
                            AwaitSubKind::Catch => *catch = sub,
                        },
                        _ => {
                            return Err(self
                                .error(ErrorCode::UnexpectedBlockClose, "Unexpected block closing tag"))
                        }
                    }
                }
            }
            _ => {}
        }

        let expected = match self.stack.last() {
            Some(Frame::If { .. }) => "if",
            Some(Frame::Each { .. }) => "each",
            Some(Frame::Await { .. }) => "await",
            Some(Frame::Key { .. }) => "key",
            _ => {
                return Err(
                    self.error(ErrorCode::UnexpectedBlockClose, "Unexpected block closing tag")
                )
            }
        };
        self.eat_required(expected, None)?;
        self.allow_whitespace();
        self.eat_required("}", None)?;

        // fold {:else if} chains back onto their parent blocks
        while matches!(self.stack.last(), Some(Frame::If { elseif: true, .. })) {
            if let Some(Frame::If {
                start: if_start,
                expression,
                children,
                else_block,
                ..
            }) = self.stack.pop()
            {
                let inner = IfBlock {
                    span: span(if_start, self.index),
                    expression,
                    elseif: true,
                    children,
                    else_block,
                };
                match self.stack.last_mut() {
                    Some(Frame::If {
                        else_block: slot, ..
                    }) => {
                        *slot = Some(ElseBlock {
                            span: span(if_start, start),
                            children: vec![TemplateNode::IfBlock(inner)],
                        });
                    }
                    _ => {
                        return Err(self
                            .error(ErrorCode::UnexpectedBlockClose, "Unexpected block closing tag"))
                    }
                }
            }
        }

        let Some(frame) = self.stack.pop() else {
            return Err(self.error(ErrorCode::UnexpectedBlockClose, "Unexpected block closing tag"));
        };
        let block_start = frame.start();
        let mut node = match frame {
            Frame::If {
                start,
                expression,
                children,
                else_block,
                ..
            } => TemplateNode::IfBlock(IfBlock {
                span: span(start, self.index),
                expression,
                elseif: false,
                children,
                else_block,
            }),
            Frame::Each {
                start,
                expression,
                context,
                index,
                key,
                children,
                else_block,
            } => TemplateNode::EachBlock(EachBlock {
                span: span(start, self.index),
                expression,
                context,
                index,
                key,
                children,
                else_block,
            }),
            Frame::Await {
                start,
                expression,
                value,
                error,
                pending,
                then,
                catch,
            } => TemplateNode::AwaitBlock(AwaitBlock {
                span: span(start, self.index),
                expression,
                value,
                error,
                pending,
                then,
                catch,
            }),
            Frame::Key {
                start,
                expression,
                children,
            } => TemplateNode::KeyBlock(KeyBlock {
                span: span(start, self.index),
                expression,
                children,
            }),
            other => {
                self.stack.push(other);
                return Err(
                    self.error(ErrorCode::UnexpectedBlockClose, "Unexpected block closing tag")
                );
            }
        };

        // whitespace adjacent to the block controls edge trimming
        let trim_before = block_start == 0
            || matches!(
                self.template.as_bytes().get(block_start - 1),
                Some(b) if is_template_whitespace(*b as char)
            );
        let trim_after = self.char_at(self.index).map_or(true, is_template_whitespace);
        trim_block_whitespace(&mut node, trim_before, trim_after);

        self.append_child(node);
        Ok(())
    }

    /// Handles `{:else}` and `{:else if expr}`. The `:else` is consumed.
    fn else_tag(&mut self) -> Result<(), ParseError> {
        if self.eat("if") {
            return Err(self.error(ErrorCode::InvalidElseif, "'elseif' should be 'else if'"));
        }
        self.allow_whitespace();

        if self.eat("if") {
            if !matches!(self.stack.last(), Some(Frame::If { .. })) {
                let message = if self.stack.iter().any(|f| matches!(f, Frame::If { .. })) {
                    format!(
                        "Expected to close {} before seeing {{:else if ...}} block",
                        self.current_description()
                    )
                } else {
                    "Cannot have an {:else if ...} block outside an {#if ...} block".to_string()
                };
                return Err(self.error(ErrorCode::InvalidElseifPlacement, message));
            }
            self.require_whitespace()?;
            let expression = self.read_expression()?;
            self.allow_whitespace();
            self.eat_required("}", None)?;
            self.stack.push(Frame::If {
                start: self.index,
                expression,
                elseif: true,
                children: Vec::new(),
                else_block: None,
            });
        } else {
            if !matches!(
                self.stack.last(),
                Some(Frame::If { .. } | Frame::Each { .. })
            ) {
                let message = if self
                    .stack
                    .iter()
                    .any(|f| matches!(f, Frame::If { .. } | Frame::Each { .. }))
                {
                    format!(
                        "Expected to close {} before seeing {{:else}} block",
                        self.current_description()
                    )
                } else {
                    "Cannot have an {:else} block outside an {#if ...} or {#each ...} block"
                        .to_string()
                };
                return Err(self.error(ErrorCode::InvalidElsePlacement, message));
            }
            self.allow_whitespace();
            self.eat_required("}", None)?;
            self.stack.push(Frame::Else {
                start: self.index,
                children: Vec::new(),
            });
        }
        Ok(())
    }

    /// Handles `{:then [value]}` and `{:catch [error]}`.
    fn then_catch(&mut self, start: usize) -> Result<(), ParseError> {
        let is_then = self.eat(":then") || !self.eat(":catch");

        if is_then {
            if !matches!(
                self.stack.last(),
                Some(Frame::AwaitSub {
                    kind: AwaitSubKind::Pending,
                    ..
                })
            ) {
                let message = if self.stack.iter().any(|f| {
                    matches!(
                        f,
                        Frame::AwaitSub {
                            kind: AwaitSubKind::Pending,
                            ..
                        }
                    )
                }) {
                    format!(
                        "Expected to close {} before seeing {{:then}} block",
                        self.current_description()
                    )
                } else {
                    "Cannot have an {:then} block outside an {#await ...} block".to_string()
                };
                return Err(self.error(ErrorCode::InvalidThenPlacement, message));
            }
        } else if !matches!(
            self.stack.last(),
            Some(Frame::AwaitSub {
                kind: AwaitSubKind::Pending | AwaitSubKind::Then,
                ..
            })
        ) {
            let message = if self.stack.iter().any(|f| {
                matches!(
                    f,
                    Frame::AwaitSub {
                        kind: AwaitSubKind::Pending | AwaitSubKind::Then,
                        ..
                    }
                )
            }) {
                format!(
                    "Expected to close {} before seeing {{:catch}} block",
                    self.current_description()
                )
            } else {
                "Cannot have an {:catch} block outside an {#await ...} block".to_string()
            };
            return Err(self.error(ErrorCode::InvalidCatchPlacement, message));
        }

        // the active branch ends where this tag begins
        if let Some(Frame::AwaitSub {
            kind,
            start: sub_start,
            children,
        }) = self.stack.pop()
        {
            let sub = AwaitSubBlock {
                span: span(sub_start, start),
                children,
                skip: false,
            };
            if let Some(Frame::Await {
                pending,
                then,
                catch,
                ..
            }) = self.stack.last_mut()
            {
                match kind {
                    AwaitSubKind::Pending => *pending = sub,
                    AwaitSubKind::Then => *then = sub,
                    AwaitSubKind::Catch => *catch = sub,
                }
            }
        }

        if !self.eat("}") {
            self.require_whitespace()?;
            let context = self.read_context()?;
            if let Some(Frame::Await { value, error, .. }) = self.stack.last_mut() {
                if is_then {
                    *value = Some(context);
                } else {
                    *error = Some(context);
                }
            }
            self.allow_whitespace();
            self.eat_required("}", None)?;
        }

        self.stack.push(Frame::AwaitSub {
            kind: if is_then {
                AwaitSubKind::Then
            } else {
                AwaitSubKind::Catch
            },
            start,
            children: Vec::new(),
        });
        Ok(())
    }

    /// Handles `{#if}`, `{#each}`, `{#await}` and `{#key}` openers. The
    /// `#` is consumed.
    fn open_block(&mut self, start: usize) -> Result<(), ParseError> {
        let kind = if self.eat("if") {
            BlockKind::If
        } else if self.eat("each") {
            BlockKind::Each
        } else if self.eat("await") {
            BlockKind::Await
        } else if self.eat("key") {
            BlockKind::Key
        } else {
            return Err(self.error(ErrorCode::ExpectedBlockType, "Expected if, each, await or key"));
        };
        self.require_whitespace()?;
        let expression = match kind {
            BlockKind::Each => self.read_expression_until('}', &["as"])?,
            BlockKind::Await => self.read_expression_until('}', &["then", "catch"])?,
            _ => self.read_expression()?,
        };
        self.allow_whitespace();

        match kind {
            BlockKind::If => {
                self.eat_required("}", None)?;
                self.stack.push(Frame::If {
                    start,
                    expression,
                    elseif: false,
                    children: Vec::new(),
                    else_block: None,
                });
            }
            BlockKind::Key => {
                self.eat_required("}", None)?;
                self.stack.push(Frame::Key {
                    start,
                    expression,
                    children: Vec::new(),
                });
            }
            BlockKind::Each => self.open_each_block(start, expression)?,
            BlockKind::Await => self.open_await_block(start, expression)?,
        }
        Ok(())
    }

    fn open_each_block(&mut self, start: usize, expression: Expression) -> Result<(), ParseError> {
        // {#each} blocks must declare a context: {#each list as item}
        self.eat_required("as", None)?;
        self.require_whitespace()?;
        let context = self.read_context()?;
        self.allow_whitespace();

        let mut index = None;
        if self.eat(",") {
            self.allow_whitespace();
            let Some(identifier) = self.read_identifier()? else {
                return Err(self.error(ErrorCode::ExpectedName, "Expected name"));
            };
            index = Some(identifier.name);
            self.allow_whitespace();
        }

        let mut key = None;
        if self.eat("(") {
            self.allow_whitespace();
            key = Some(self.read_expression_until(')', &[])?);
            self.allow_whitespace();
            self.eat_required(")", None)?;
            self.allow_whitespace();
        }

        self.eat_required("}", None)?;
        self.stack.push(Frame::Each {
            start,
            expression,
            context,
            index,
            key,
            children: Vec::new(),
            else_block: None,
        });
        Ok(())
    }

    fn open_await_block(&mut self, start: usize, expression: Expression) -> Result<(), ParseError> {
        let mut value = None;
        let mut error = None;
        let mut active = AwaitSubKind::Pending;
        if self.eat("then") {
            self.require_whitespace()?;
            value = Some(self.read_context()?);
            self.allow_whitespace();
            active = AwaitSubKind::Then;
        } else if self.eat("catch") {
            self.require_whitespace()?;
            error = Some(self.read_context()?);
            self.allow_whitespace();
            active = AwaitSubKind::Catch;
        }
        self.eat_required("}", None)?;

        self.stack.push(Frame::Await {
            start,
            expression,
            value,
            error,
            pending: AwaitSubBlock::skipped(self.index),
            then: AwaitSubBlock::skipped(self.index),
            catch: AwaitSubBlock::skipped(self.index),
        });
        self.stack.push(Frame::AwaitSub {
            kind: active,
            start: self.index,
            children: Vec::new(),
        });
        Ok(())
    }
}

/// Which directive a pre-colon attribute keyword selects.
enum ParsedDirective {
    Kind(DirectiveKind),
    Ref,
}

fn directive_kind(prefix: &str) -> Option<ParsedDirective> {
    Some(match prefix {
        "use" => ParsedDirective::Kind(DirectiveKind::Action),
        "animate" => ParsedDirective::Kind(DirectiveKind::Animation),
        "bind" => ParsedDirective::Kind(DirectiveKind::Binding),
        "class" => ParsedDirective::Kind(DirectiveKind::Class),
        "on" => ParsedDirective::Kind(DirectiveKind::EventHandler),
        "let" => ParsedDirective::Kind(DirectiveKind::Let),
        "ref" => ParsedDirective::Ref,
        "in" | "out" | "transition" => ParsedDirective::Kind(DirectiveKind::Transition),
        _ => return None,
    })
}

fn valid_tag_name(name: &str) -> bool {
    let rest = name.strip_prefix('!').unwrap_or(name);
    rest.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn chunk_to_node(chunk: ValueChunk) -> Option<TemplateNode> {
    match chunk {
        ValueChunk::Text(text) => Some(TemplateNode::Text(text)),
        ValueChunk::MustacheTag(tag) => Some(TemplateNode::MustacheTag(tag)),
        ValueChunk::Shorthand(_) => None,
    }
}

/// Trims whitespace off the edges of a just-closed block, recursing into
/// else branches and else-if chains. Await blocks have no direct children
/// and are left alone.
fn trim_block_whitespace(node: &mut TemplateNode, trim_before: bool, trim_after: bool) {
    match node {
        TemplateNode::IfBlock(block) => {
            trim_children(&mut block.children, trim_before, trim_after);
            if let Some(else_block) = block.else_block.as_mut() {
                trim_else_block(else_block, trim_before, trim_after);
            }
        }
        TemplateNode::EachBlock(block) => {
            trim_children(&mut block.children, trim_before, trim_after);
            if let Some(else_block) = block.else_block.as_mut() {
                trim_else_block(else_block, trim_before, trim_after);
            }
        }
        TemplateNode::KeyBlock(block) => {
            trim_children(&mut block.children, trim_before, trim_after);
        }
        _ => {}
    }
}

fn trim_else_block(else_block: &mut ElseBlock, trim_before: bool, trim_after: bool) {
    trim_children(&mut else_block.children, trim_before, trim_after);
    if let Some(first) = else_block.children.first_mut() {
        if matches!(first, TemplateNode::IfBlock(b) if b.elseif) {
            trim_block_whitespace(first, trim_before, trim_after);
        }
    }
}

fn trim_children(children: &mut Vec<TemplateNode>, trim_before: bool, trim_after: bool) {
    if children.is_empty() {
        return;
    }
    if trim_before {
        if let Some(TemplateNode::Text(text)) = children.first_mut() {
            text.data = text.data.trim_start_matches(is_template_whitespace).to_string();
            if text.data.is_empty() {
                children.remove(0);
            }
        }
    }
    if trim_after {
        if let Some(TemplateNode::Text(text)) = children.last_mut() {
            text.data = text.data.trim_end_matches(is_template_whitespace).to_string();
            if text.data.is_empty() {
                children.pop();
            }
        }
    }
}
