//! Post pass turning a [`MatchTree`] into [`ShaderLabSymbols`].
use crate::{
    document::ShaderDocument,
    grammar::{
        compiler::CompiledGrammar,
        match_tree::{MatchNodeId, MatchNodeKind, MatchTree},
    },
};

use super::{builtins::ShaderLabBuiltins, symbol_parser::SemanticContext, symbols::ShaderLabSymbols};

/// A symbol provider runs the semantic callbacks of a [`CompiledGrammar`] on a [`MatchTree`].
pub struct SymbolProvider<'a> {
    grammar: &'a CompiledGrammar,
    builtins: &'a ShaderLabBuiltins,
}

impl<'a> SymbolProvider<'a> {
    pub fn new(grammar: &'a CompiledGrammar, builtins: &'a ShaderLabBuiltins) -> Self {
        Self { grammar, builtins }
    }
    /// Run the callbacks in depth first pre order, parents before children.
    ///
    /// Below unmatched text and unmatched patterns, only the attempt that reached the furthest
    /// runs its callbacks.
    pub fn process_sub_matches(
        &self,
        tree: &MatchTree,
        document: &dyn ShaderDocument,
    ) -> ShaderLabSymbols {
        let mut symbols = ShaderLabSymbols::default();
        if tree.is_empty() {
            return symbols;
        }
        let mut context = SemanticContext {
            tree,
            document,
            builtins: self.builtins,
            symbols: &mut symbols,
        };
        let mut stack: Vec<MatchNodeId> = vec![tree.root()];
        while let Some(id) = stack.pop() {
            let node = tree.node(id);
            if let Some(callback) = self.grammar.on_matched(node.origin) {
                if let Some(state) = callback(&mut context, id) {
                    context.symbols.set_state(id, state);
                }
            }
            match node.kind {
                MatchNodeKind::UnmatchedText | MatchNodeKind::UnmatchedPattern => {
                    stack.extend(tree.best_attempt(id));
                }
                _ => stack.extend(node.children.iter().rev()),
            }
        }
        symbols
    }
}
