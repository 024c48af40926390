mod location;
mod node;
pub mod visit;

pub use location::{LineSpan, Location, Position};
pub use node::{NodeBody, NodeBuilder, SyntaxKind, SyntaxNode, Trivia};
pub use visit::{SyntaxVisitor, walk, walk_all};
