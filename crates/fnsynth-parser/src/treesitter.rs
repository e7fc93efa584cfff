//! Tree-sitter integration for TypeScript parsing.

/// Parse TypeScript source and return the tree-sitter tree.
///
/// Returns `None` only if the grammar cannot be loaded or parsing is
/// cancelled; syntax errors still produce a (partially erroneous) tree.
pub fn parse_typescript(source: &str) -> Option<tree_sitter::Tree> {
    let language: tree_sitter::Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
    let mut parser = tree_sitter::Parser::new();
    if let Err(e) = parser.set_language(&language) {
        tracing::warn!("failed to set tree-sitter language: {}", e);
        return None;
    }
    parser.parse(source.as_bytes(), None)
}

/// Source text covered by a node.
pub fn node_text<'s>(node: &tree_sitter::Node, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}
