//! Read-only traversal contract for consumers that live outside the
//! generator, such as semantic highlighting and embedded-language regions.

use super::node::{SyntaxNode, Trivia};

/// Visitor over a syntax tree.
///
/// `walk` calls, for every node in document order: `visit_trivia` for the
/// leading trivia, `enter`, the same sequence for each child, `leave`, and
/// finally `visit_trivia` for the trailing trivia.
pub trait SyntaxVisitor {
    fn visit_trivia(&mut self, _trivia: &Trivia) {}

    /// Called before the children. Return `false` to skip them.
    fn enter(&mut self, _node: &SyntaxNode) -> bool {
        true
    }

    /// Called after the children.
    fn leave(&mut self, _node: &SyntaxNode) {}
}

/// Depth-first walk. Recursion follows tree depth, which the parser keeps
/// within `ParserOptions::max_nesting_depth` levels of elements and braces.
pub fn walk<V: SyntaxVisitor + ?Sized>(node: &SyntaxNode, visitor: &mut V) {
    if let Some(trivia) = node.leading_trivia() {
        visitor.visit_trivia(trivia);
    }
    if visitor.enter(node) {
        for child in node.children() {
            walk(child, visitor);
        }
    }
    visitor.leave(node);
    if let Some(trivia) = node.trailing_trivia() {
        visitor.visit_trivia(trivia);
    }
}

pub fn walk_all<V: SyntaxVisitor + ?Sized>(nodes: &[SyntaxNode], visitor: &mut V) {
    for node in nodes {
        walk(node, visitor);
    }
}
