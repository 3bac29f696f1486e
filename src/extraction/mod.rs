//! Source parsers producing the syntax tree the extractor consumes.
//!
//! The extractor never parses by itself: it is handed a `SourceParser` and
//! always calls it with the fixed `ParseOptions`.
mod typescript_parser;

pub use typescript_parser::TypeScriptParser;

use crate::config::ParseOptions;
use crate::errors::Result;
use crate::syntax::SyntaxNode;

/// Parses source text into a syntax tree.
///
/// Implementations must tag nodes with the `NodeKind`s the extractor matches
/// on and report 1-based spans.
pub trait SourceParser {
    fn parse(&self, source: &str, options: &ParseOptions) -> Result<SyntaxNode>;
}

impl<F> SourceParser for F
where
    F: Fn(&str, &ParseOptions) -> Result<SyntaxNode>,
{
    fn parse(&self, source: &str, options: &ParseOptions) -> Result<SyntaxNode> {
        self(source, options)
    }
}
