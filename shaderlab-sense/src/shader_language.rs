use crate::{
    completion::{resolve_completion, CompletionContext, CompletionItem},
    document::ShaderDocument,
    grammar::{
        compiler::{CompiledGrammar, GrammarCompiler},
        match_tree::MatchTree,
        matcher::Matcher,
        shaderlab::shaderlab_grammar,
        LanguageGrammar,
    },
    position::ShaderPosition,
    shader::ShaderLabParams,
    shader_error::ShaderError,
    symbols::{
        builtins::ShaderLabBuiltins, symbol_provider::SymbolProvider, symbols::ShaderLabSymbols,
    },
};

/// Result of matching a document, with the symbols collected from it.
#[derive(Debug)]
pub struct ShaderLabModule {
    pub tree: MatchTree,
    pub symbols: ShaderLabSymbols,
}

/// Owns the compiled grammar and the builtin vocabulary. Create it once, then reuse it for
/// every document.
pub struct ShaderLabLanguage {
    grammar: CompiledGrammar,
    builtins: ShaderLabBuiltins,
    params: ShaderLabParams,
}

impl ShaderLabLanguage {
    pub fn new(params: ShaderLabParams) -> Result<Self, ShaderError> {
        Self::with_grammar(&shaderlab_grammar(), params)
    }
    pub fn with_grammar(
        grammar: &LanguageGrammar,
        params: ShaderLabParams,
    ) -> Result<Self, ShaderError> {
        Ok(Self {
            grammar: GrammarCompiler::new(grammar).compile()?,
            builtins: ShaderLabBuiltins::default_builtins()?,
            params,
        })
    }
    pub fn get_grammar(&self) -> &CompiledGrammar {
        &self.grammar
    }
    pub fn get_builtins(&self) -> &ShaderLabBuiltins {
        &self.builtins
    }
    pub fn get_params(&self) -> &ShaderLabParams {
        &self.params
    }
    pub fn match_document(&self, document: &dyn ShaderDocument) -> MatchTree {
        Matcher::new(&self.grammar, document, &self.params).match_document()
    }
    pub fn query_symbols(&self, document: &dyn ShaderDocument) -> ShaderLabModule {
        let tree = self.match_document(document);
        let symbols = SymbolProvider::new(&self.grammar, &self.builtins)
            .process_sub_matches(&tree, document);
        ShaderLabModule { tree, symbols }
    }
    pub fn request_completion(
        &self,
        document: &dyn ShaderDocument,
        position: &ShaderPosition,
    ) -> Result<Vec<CompletionItem>, ShaderError> {
        let offset = document.offset_at(position)?;
        let module = self.query_symbols(document);
        let context = CompletionContext::new(
            &module.tree,
            document,
            &module.symbols,
            &self.builtins,
            &self.params,
            offset,
        );
        let items = resolve_completion(&self.grammar, &context);
        log::debug!(
            "Completion at {:?} returned {} items",
            position,
            items.len()
        );
        Ok(items)
    }
}
