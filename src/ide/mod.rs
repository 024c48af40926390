//! Editor services built on the syntax visitor: semantic highlighting and
//! embedded-language regions. Both read the tree only.

mod regions;
mod semantic_tokens;

pub use regions::{Language, LanguageRegion, LanguageRegions};
pub use semantic_tokens::{SemanticToken, SemanticTokens, TokenType, encode_relative};
