use super::location::{Location, Position};
use serde::Serialize;
use std::fmt::Write as _;

/// Every kind of node the template grammar produces. Closed set: consumers
/// dispatch with an exhaustive `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SyntaxKind {
    // Structure
    Document,
    EndOfFile,

    // Tokens
    Trivia,
    Literal,
    Brace,
    Bracket,
    Equals,
    Quote,

    // Declarations and raw regions
    Doctype,
    Comment,
    CommentStart,
    CommentContent,
    CommentEnd,
    CData,
    CDataStart,
    CDataContent,
    CDataEnd,

    // Markup
    HtmlTag,
    HtmlStartTag,
    HtmlTagName,
    HtmlAttributes,
    HtmlAttribute,
    AttributeName,
    AttributeValue,
    HtmlEndTag,
    ScriptTag,
    StyleTag,
    RawText,

    // Embedded code
    Transition,
    EscapedTransition,
    CodeBlock,
    CodeExpression,
    CodeValue,
    CodeBrace,
}

impl SyntaxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyntaxKind::Document => "Document",
            SyntaxKind::EndOfFile => "EndOfFile",
            SyntaxKind::Trivia => "Trivia",
            SyntaxKind::Literal => "Literal",
            SyntaxKind::Brace => "Brace",
            SyntaxKind::Bracket => "Bracket",
            SyntaxKind::Equals => "Equals",
            SyntaxKind::Quote => "Quote",
            SyntaxKind::Doctype => "Doctype",
            SyntaxKind::Comment => "Comment",
            SyntaxKind::CommentStart => "CommentStart",
            SyntaxKind::CommentContent => "CommentContent",
            SyntaxKind::CommentEnd => "CommentEnd",
            SyntaxKind::CData => "CData",
            SyntaxKind::CDataStart => "CDataStart",
            SyntaxKind::CDataContent => "CDataContent",
            SyntaxKind::CDataEnd => "CDataEnd",
            SyntaxKind::HtmlTag => "HtmlTag",
            SyntaxKind::HtmlStartTag => "HtmlStartTag",
            SyntaxKind::HtmlTagName => "HtmlTagName",
            SyntaxKind::HtmlAttributes => "HtmlAttributes",
            SyntaxKind::HtmlAttribute => "HtmlAttribute",
            SyntaxKind::AttributeName => "AttributeName",
            SyntaxKind::AttributeValue => "AttributeValue",
            SyntaxKind::HtmlEndTag => "HtmlEndTag",
            SyntaxKind::ScriptTag => "ScriptTag",
            SyntaxKind::StyleTag => "StyleTag",
            SyntaxKind::RawText => "RawText",
            SyntaxKind::Transition => "Transition",
            SyntaxKind::EscapedTransition => "EscapedTransition",
            SyntaxKind::CodeBlock => "CodeBlock",
            SyntaxKind::CodeExpression => "CodeExpression",
            SyntaxKind::CodeValue => "CodeValue",
            SyntaxKind::CodeBrace => "CodeBrace",
        }
    }

    /// Element-like nodes: a start tag, content, and an optional end tag.
    pub fn is_element(&self) -> bool {
        matches!(self, SyntaxKind::HtmlTag | SyntaxKind::ScriptTag | SyntaxKind::StyleTag)
    }
}

/// Whitespace attached to a node, kept so the document can be rebuilt byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trivia {
    location: Location,
}

impl Trivia {
    pub fn new(location: Location) -> Self {
        debug_assert!(location.text().chars().all(char::is_whitespace));
        Self { location }
    }

    pub fn text(&self) -> &str {
        self.location.text()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeBody {
    /// A recognized token. `None` marks a required token that was missing.
    Value { value: Option<String>, location: Location },
    /// A marker whose meaning is its position alone.
    Location(Location),
    /// A construct whose meaning is the ordered concatenation of its children.
    Children(Vec<SyntaxNode>),
}

/// Concrete syntax tree node.
///
/// Nodes are built bottom-up and never change once handed to a parent:
/// there is no `&mut` access, trivia is supplied through the consuming
/// `with_*` methods while the parser still owns the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    kind: SyntaxKind,
    body: NodeBody,
    leading: Option<Trivia>,
    trailing: Option<Trivia>,
}

impl SyntaxNode {
    pub fn value(kind: SyntaxKind, value: Option<String>, location: Location) -> Self {
        Self::from_body(kind, NodeBody::Value { value, location })
    }

    pub fn marker(kind: SyntaxKind, location: Location) -> Self {
        Self::from_body(kind, NodeBody::Location(location))
    }

    pub fn composite(kind: SyntaxKind, children: Vec<SyntaxNode>) -> Self {
        Self::from_body(kind, NodeBody::Children(children))
    }

    /// A required token that was not found at `at`.
    pub fn missing(kind: SyntaxKind, at: Position) -> Self {
        Self::value(kind, None, Location::empty(at))
    }

    fn from_body(kind: SyntaxKind, body: NodeBody) -> Self {
        Self { kind, body, leading: None, trailing: None }
    }

    pub fn with_leading(mut self, trivia: Option<Trivia>) -> Self {
        self.leading = trivia;
        self
    }

    pub fn with_trailing(mut self, trivia: Option<Trivia>) -> Self {
        self.trailing = trivia;
        self
    }

    pub fn with_trivia(self, leading: Option<Trivia>, trailing: Option<Trivia>) -> Self {
        self.with_leading(leading).with_trailing(trailing)
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    pub fn body(&self) -> &NodeBody {
        &self.body
    }

    /// Token value for value nodes; `None` for missing tokens and non-value nodes.
    pub fn value_str(&self) -> Option<&str> {
        match &self.body {
            NodeBody::Value { value, .. } => value.as_deref(),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(&self.body, NodeBody::Value { value: None, .. })
    }

    /// Location of a leaf (value or marker). Composites have none of their own.
    pub fn location(&self) -> Option<&Location> {
        match &self.body {
            NodeBody::Value { location, .. } | NodeBody::Location(location) => Some(location),
            NodeBody::Children(_) => None,
        }
    }

    pub fn children(&self) -> &[SyntaxNode] {
        match &self.body {
            NodeBody::Children(children) => children,
            _ => &[],
        }
    }

    pub fn leading_trivia(&self) -> Option<&Trivia> {
        self.leading.as_ref()
    }

    pub fn trailing_trivia(&self) -> Option<&Trivia> {
        self.trailing.as_ref()
    }

    /// Start of the node's core content (trivia excluded).
    pub fn start(&self) -> Option<Position> {
        match &self.body {
            NodeBody::Children(children) => children.iter().find_map(SyntaxNode::full_start),
            _ => self.location().map(Location::start),
        }
    }

    /// Start including leading trivia.
    pub fn full_start(&self) -> Option<Position> {
        self.leading
            .as_ref()
            .map(|t| t.location().start())
            .or_else(|| self.start())
    }

    /// End including trailing trivia.
    pub fn full_end(&self) -> Option<Position> {
        if let Some(trivia) = &self.trailing {
            return Some(trivia.location().end());
        }
        match &self.body {
            NodeBody::Children(children) => children.iter().rev().find_map(SyntaxNode::full_end),
            _ => self.location().map(Location::end),
        }
    }

    /// Exact source text covered by this node, trivia included.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }

    pub fn write_source(&self, out: &mut String) {
        if let Some(trivia) = &self.leading {
            out.push_str(trivia.text());
        }
        match &self.body {
            NodeBody::Value { location, .. } | NodeBody::Location(location) => {
                out.push_str(location.text());
            }
            NodeBody::Children(children) => {
                for child in children {
                    child.write_source(out);
                }
            }
        }
        if let Some(trivia) = &self.trailing {
            out.push_str(trivia.text());
        }
    }

    pub fn child(&self, kind: SyntaxKind) -> Option<&SyntaxNode> {
        self.children().iter().find(|c| c.kind == kind)
    }

    /// All nodes below this one (self included), in document order.
    pub fn descendants(&self) -> Vec<&SyntaxNode> {
        let mut out = Vec::new();
        self.collect_descendants(&mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, out: &mut Vec<&'a SyntaxNode>) {
        out.push(self);
        for child in self.children() {
            child.collect_descendants(out);
        }
    }

    /// Element name for `HtmlTag`, `ScriptTag` and `StyleTag` nodes.
    pub fn tag_name(&self) -> Option<&str> {
        if !self.kind.is_element() && self.kind != SyntaxKind::HtmlEndTag {
            return None;
        }
        let holder = if self.kind == SyntaxKind::HtmlEndTag {
            self
        } else {
            self.child(SyntaxKind::HtmlStartTag)?
        };
        holder.child(SyntaxKind::HtmlTagName)?.value_str()
    }

    /// Indented debug rendering of the tree.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        let _ = write!(out, "{}{}", "  ".repeat(depth), self.kind.as_str());
        match &self.body {
            NodeBody::Value { value: Some(value), .. } => {
                let _ = write!(out, " {:?}", value);
            }
            NodeBody::Value { value: None, .. } => out.push_str(" <missing>"),
            NodeBody::Location(location) => {
                let _ = write!(out, " {:?}", location.text());
            }
            NodeBody::Children(_) => {}
        }
        if let Some(trivia) = &self.leading {
            let _ = write!(out, " lead={:?}", trivia.text());
        }
        if let Some(trivia) = &self.trailing {
            let _ = write!(out, " trail={:?}", trivia.text());
        }
        out.push('\n');
        for child in self.children() {
            child.dump_into(out, depth + 1);
        }
    }
}

/// Accumulates the children of a composite node while it is being parsed.
#[derive(Debug)]
pub struct NodeBuilder {
    kind: SyntaxKind,
    children: Vec<SyntaxNode>,
}

impl NodeBuilder {
    pub fn new(kind: SyntaxKind) -> Self {
        Self { kind, children: Vec::new() }
    }

    pub fn push(&mut self, node: SyntaxNode) {
        self.children.push(node);
    }

    pub fn push_all(&mut self, nodes: impl IntoIterator<Item = SyntaxNode>) {
        self.children.extend(nodes);
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn finish(self) -> SyntaxNode {
        SyntaxNode::composite(self.kind, self.children)
    }
}
