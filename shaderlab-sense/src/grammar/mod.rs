//! Declarative grammar definitions and the engine running them.
//!
//! A [`LanguageGrammar`] is authored as data: a list of [`GrammarPattern`] with pattern strings
//! in a small mini language, plus named repositories of patterns and [`GrammarScope`].
//! [`compiler::GrammarCompiler`] turns it into a [`compiler::CompiledGrammar`] once, then
//! [`matcher::Matcher`] runs it against documents to produce a [`match_tree::MatchTree`].
//!
//! Pattern string syntax:
//! - `word` literal text.
//! - `<name>` builtin (`string`, `number`, `identifier`, `< >` for whitespace), then the
//!   pattern dictionary, then the grammar repository. Unknown names match any identifier.
//! - `[inner]` optional, `[inner ...]` optional and repeatable.
//! - `{name}` scope from the pattern scopes, then the grammar scope repository.
//! - `/regex/` raw regex.
//! - A space is only significant when the pattern keeps spaces.
//! - `\` escapes the next character.
use std::collections::BTreeMap;

use crate::{
    completion::{CompletionContext, CompletionItem},
    symbols::{symbol_parser::SemanticContext, symbols::SymbolRef},
};

use self::match_tree::MatchNodeId;

mod cg;
pub mod compiler;
pub mod match_tree;
pub mod matcher;
mod pattern_parser;
pub mod shaderlab;

/// Called once per match node of the pattern or scope during the post pass.
/// The returned symbol becomes the state of the node, visible to its descendants.
pub type MatchedCallback = fn(&mut SemanticContext<'_>, MatchNodeId) -> Option<SymbolRef>;
/// Called with a named node (or unmatched line) below the pattern or scope.
pub type CompletionCallback = fn(&CompletionContext<'_>, MatchNodeId) -> Vec<CompletionItem>;

#[derive(Clone, Default)]
pub struct GrammarPattern {
    pub name: Option<String>,
    pub id: Option<String>,
    pub patterns: Vec<String>,
    pub case_insensitive: bool,
    pub cross_line: bool,
    pub keep_space: bool,
    pub dictionary: BTreeMap<String, GrammarPattern>,
    pub scopes: BTreeMap<String, GrammarScope>,
    pub on_matched: Option<MatchedCallback>,
    pub on_completion: Option<CompletionCallback>,
}

#[derive(Clone, Default)]
pub struct GrammarScope {
    pub name: Option<String>,
    pub begin: String,
    pub end: String,
    pub patterns: Vec<GrammarPattern>,
    pub on_matched: Option<MatchedCallback>,
    pub on_completion: Option<CompletionCallback>,
}

#[derive(Debug, Clone, Default)]
pub struct LanguageGrammar {
    pub name: Option<String>,
    pub patterns: Vec<GrammarPattern>,
    pub pattern_repository: BTreeMap<String, GrammarPattern>,
    pub scope_repository: BTreeMap<String, GrammarScope>,
}

impl std::fmt::Debug for GrammarPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrammarPattern")
            .field("name", &self.name)
            .field("patterns", &self.patterns)
            .field("dictionary", &self.dictionary)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for GrammarScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrammarScope")
            .field("name", &self.name)
            .field("begin", &self.begin)
            .field("end", &self.end)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl GrammarPattern {
    pub fn new(patterns: &[&str]) -> Self {
        Self {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }
    // Reference a pattern from the grammar repository.
    pub fn include(name: &str) -> Self {
        Self::new(&[&format!("<{}>", name)])
    }
    pub fn string() -> Self {
        Self::new(&["<string>"]).name("String")
    }
    pub fn number() -> Self {
        Self::new(&["<number>"]).name("Number")
    }
    pub fn identifier() -> Self {
        Self::new(&["<identifier>"]).name("Identifier")
    }
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.into());
        self
    }
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.into());
        self
    }
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }
    pub fn cross_line(mut self) -> Self {
        self.cross_line = true;
        self
    }
    pub fn keep_space(mut self) -> Self {
        self.keep_space = true;
        self
    }
    pub fn dictionary(mut self, key: &str, pattern: GrammarPattern) -> Self {
        self.dictionary.insert(key.into(), pattern);
        self
    }
    pub fn scope(mut self, key: &str, scope: GrammarScope) -> Self {
        self.scopes.insert(key.into(), scope);
        self
    }
    pub fn on_matched(mut self, callback: MatchedCallback) -> Self {
        self.on_matched = Some(callback);
        self
    }
    pub fn on_completion(mut self, callback: CompletionCallback) -> Self {
        self.on_completion = Some(callback);
        self
    }
}

impl GrammarScope {
    pub fn new(begin: &str, end: &str) -> Self {
        Self {
            begin: begin.into(),
            end: end.into(),
            ..Default::default()
        }
    }
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.into());
        self
    }
    pub fn patterns(mut self, patterns: Vec<GrammarPattern>) -> Self {
        self.patterns = patterns;
        self
    }
    pub fn on_matched(mut self, callback: MatchedCallback) -> Self {
        self.on_matched = Some(callback);
        self
    }
    pub fn on_completion(mut self, callback: CompletionCallback) -> Self {
        self.on_completion = Some(callback);
        self
    }
}

impl LanguageGrammar {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
    pub fn patterns(mut self, patterns: Vec<GrammarPattern>) -> Self {
        self.patterns = patterns;
        self
    }
    pub fn pattern_repository(mut self, key: &str, pattern: GrammarPattern) -> Self {
        self.pattern_repository.insert(key.into(), pattern);
        self
    }
    pub fn scope_repository(mut self, key: &str, scope: GrammarScope) -> Self {
        self.scope_repository.insert(key.into(), scope);
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        document::{ShaderDocument, ShaderDocumentText},
        position::{ShaderPosition, ShaderRange},
        shader::ShaderLabParams,
        shader_error::ShaderError,
    };

    use super::{
        compiler::{CompiledGrammar, GrammarCompiler},
        match_tree::{MatchNodeId, MatchNodeKind, MatchTree},
        matcher::Matcher,
        GrammarPattern, GrammarScope, LanguageGrammar,
    };

    fn compile(grammar: &LanguageGrammar) -> CompiledGrammar {
        let _ = env_logger::builder().is_test(true).try_init();
        GrammarCompiler::new(grammar).compile().unwrap()
    }

    fn match_text(
        grammar: &CompiledGrammar,
        params: &ShaderLabParams,
        text: &str,
    ) -> (MatchTree, ShaderDocumentText) {
        let document = ShaderDocumentText::new(text);
        let tree = Matcher::new(grammar, &document, params).match_document();
        (tree, document)
    }

    fn count_kind(tree: &MatchTree, kind: MatchNodeKind) -> usize {
        tree.iter().filter(|(_, node)| node.kind == kind).count()
    }

    fn find_matched(tree: &MatchTree, grammar: &CompiledGrammar, name: &str) -> Vec<MatchNodeId> {
        tree.iter()
            .filter(|(_, node)| node.is_matched() && grammar.origin_name(node.origin) == Some(name))
            .map(|(id, _)| id)
            .collect()
    }

    fn assert_nested(tree: &MatchTree) {
        for (id, node) in tree.iter() {
            assert!(node.start_offset <= node.end_offset, "Node {:?} is reversed", id);
            let mut previous_start = node.start_offset;
            for child in tree.children(id) {
                let child = tree.node(*child);
                assert!(
                    child.start_offset >= node.start_offset && child.end_offset <= node.end_offset,
                    "Child of {:?} is out of its bounds",
                    id
                );
                assert!(child.start_offset >= previous_start, "Children of {:?} are unordered", id);
                previous_start = child.start_offset;
            }
        }
    }

    fn block_grammar() -> LanguageGrammar {
        LanguageGrammar::new("Block")
            .patterns(vec![GrammarPattern::new(&["{block}"]).name("Block")])
            .scope_repository(
                "block",
                GrammarScope::new("{", "}")
                    .name("Block")
                    .patterns(vec![
                        GrammarPattern::new(&["value <number>;"]).name("Value"),
                        GrammarPattern::new(&["{block}"]).name("Nested"),
                    ]),
            )
    }

    #[test]
    fn compile_errors() {
        let is_grammar_error = |grammar: &LanguageGrammar| {
            matches!(
                GrammarCompiler::new(grammar).compile(),
                Err(ShaderError::GrammarError(_))
            )
        };
        assert!(is_grammar_error(&LanguageGrammar::new("Empty")));
        assert!(is_grammar_error(
            &LanguageGrammar::new("Scope").patterns(vec![GrammarPattern::new(&["a {missing}"])])
        ));
        assert!(is_grammar_error(
            &LanguageGrammar::new("Alternatives").patterns(vec![GrammarPattern::new(&[])])
        ));
        assert!(is_grammar_error(
            &LanguageGrammar::new("Malformed").patterns(vec![GrammarPattern::new(&["<name"])])
        ));
        assert!(is_grammar_error(
            &LanguageGrammar::new("Regex").patterns(vec![GrammarPattern::new(&["/(/"])])
        ));
        assert!(is_grammar_error(&LanguageGrammar::new("Delimiter").patterns(vec![
            GrammarPattern::new(&["{empty}"]).scope("empty", GrammarScope::new("", "}"))
        ])));
    }

    #[test]
    fn recursive_grammar() {
        let grammar = LanguageGrammar::new("List")
            .patterns(vec![GrammarPattern::include("list")])
            .pattern_repository("list", GrammarPattern::new(&["(<list>)", "x"]).name("List"));
        let compiled = compile(&grammar);
        // The include and the list itself, compiled once each.
        assert_eq!(compiled.pattern_count(), 2);
        let (tree, _) = match_text(&compiled, &ShaderLabParams::default(), "((x))");
        assert!(tree.node(tree.root()).is_matched());
        let lists = tree
            .iter()
            .filter(|(_, node)| node.pattern_name.as_deref() == Some("list"))
            .count();
        assert_eq!(lists, 3);
        assert_nested(&tree);
    }

    #[test]
    fn optional_and_repeat() {
        let grammar = LanguageGrammar::new("Call").patterns(vec![GrammarPattern::new(&[
            "call <identifier>([<number>[, <number>...]]);",
        ])
        .name("Call")]);
        let compiled = compile(&grammar);
        let params = ShaderLabParams::default();

        let (tree, document) = match_text(&compiled, &params, "call foo(1, 2.5, -3);");
        assert!(tree.node(tree.root()).is_matched());
        let call = tree.children(tree.root())[0];
        let numbers = tree.get_match(call, "number");
        assert_eq!(numbers.len(), 3);
        assert_eq!(tree.text(numbers[1], &document), "2.5");
        assert_eq!(tree.get_matched_text(call, "identifier", &document), Some("foo"));

        let (tree, _) = match_text(&compiled, &params, "call foo();");
        let call = tree.children(tree.root())[0];
        assert!(tree.node(call).is_matched());
        assert!(tree.get_match(call, "number").is_empty());
    }

    #[test]
    fn keyword_boundary() {
        let grammar = LanguageGrammar::new("Keyword")
            .patterns(vec![GrammarPattern::new(&["if <identifier>"]).name("If")]);
        let compiled = compile(&grammar);
        let (tree, _) = match_text(&compiled, &ShaderLabParams::default(), "ifx y");
        assert!(!tree.node(tree.root()).is_matched());
        let (tree, _) = match_text(&compiled, &ShaderLabParams::default(), "if y");
        assert!(tree.node(tree.root()).is_matched());
    }

    #[test]
    fn unmatched_pattern_attempts() {
        let grammar = LanguageGrammar::new("Call").patterns(vec![
            GrammarPattern::new(&["call <identifier>(<number>);", "call <identifier>;"]).name("Call"),
        ]);
        let compiled = compile(&grammar);
        let (tree, document) = match_text(&compiled, &ShaderLabParams::default(), "call foo(1 2);");
        let root = tree.node(tree.root());
        assert_eq!(root.kind, MatchNodeKind::Unmatched);
        assert_eq!((root.start_offset, root.end_offset), (0, document.get_text().len()));
        let text = tree.children(tree.root())[0];
        assert_eq!(tree.node(text).kind, MatchNodeKind::UnmatchedText);
        let call = tree.children(text)[0];
        assert_eq!(tree.node(call).kind, MatchNodeKind::UnmatchedPattern);
        assert_eq!(tree.children(call).len(), 2);
        // First alternative went further, up to the space before "2".
        let best = tree.best_attempt(call).unwrap();
        assert_eq!(best, tree.children(call)[0]);
        assert_eq!(tree.get_matched_text(call, "identifier", &document), Some("foo"));
        assert_nested(&tree);
    }

    #[test]
    fn scope_recovery() {
        let compiled = compile(&block_grammar());
        let text = "{\n    value 1;\n    garbage here\n    value 2;\n    {\n        value 3;\n    }\n}\n";
        let (tree, document) = match_text(&compiled, &ShaderLabParams::default(), text);
        let root = tree.node(tree.root());
        assert!(root.is_matched());
        assert_eq!((root.start_offset, root.end_offset), (0, text.len()));
        assert_eq!(count_kind(&tree, MatchNodeKind::UnmatchedText), 1);
        let (unmatched, _) = tree
            .iter()
            .find(|(_, node)| node.is_unmatched_text())
            .unwrap();
        assert_eq!(
            tree.range(unmatched, &document),
            ShaderRange::new(ShaderPosition::new(2, 4), ShaderPosition::new(2, 16))
        );
        assert_eq!(tree.text(unmatched, &document), "garbage here");
        assert_eq!(find_matched(&tree, &compiled, "Value").len(), 3);
        // Inner value is scoped by the nested block.
        let values = find_matched(&tree, &compiled, "Value");
        let inner = tree.node(values[2]);
        let outer = tree.node(values[0]);
        assert_ne!(inner.matched_scope, outer.matched_scope);
        assert_eq!(
            tree.node(outer.matched_scope.unwrap()).parent.and_then(|parent| tree.parent(parent)),
            Some(tree.root())
        );
        assert_nested(&tree);
    }

    #[test]
    fn unterminated_scope() {
        let compiled = compile(&block_grammar());
        let text = "{\n    value 1;\n    value";
        let (tree, _) = match_text(&compiled, &ShaderLabParams::default(), text);
        let root = tree.node(tree.root());
        assert_eq!(root.kind, MatchNodeKind::Unmatched);
        assert_eq!((root.start_offset, root.end_offset), (0, text.len()));
        let (_, scope) = tree
            .iter()
            .find(|(_, node)| node.is_scope_match())
            .unwrap();
        assert_eq!(scope.kind, MatchNodeKind::Unmatched);
        assert_eq!((scope.start_offset, scope.end_offset), (0, text.len()));
        assert_eq!(find_matched(&tree, &compiled, "Value").len(), 1);
        assert_nested(&tree);
    }

    #[test]
    fn recovery_terminates() {
        let compiled = compile(&block_grammar());
        for text in ["", "}", "{", "{{{{", "\n\n\n", "value 1;", "{ value ; }\n}\n{"] {
            let (tree, _) = match_text(&compiled, &ShaderLabParams::default(), text);
            let root = tree.node(tree.root());
            assert_eq!((root.start_offset, root.end_offset), (0, text.len()));
            assert_nested(&tree);
        }
    }

    #[test]
    fn nested_on_every_prefix() {
        let compiled = compile(&super::shaderlab::shaderlab_grammar());
        let params = ShaderLabParams::default();
        let text = std::fs::read_to_string("./test/unlit.shader").unwrap();
        let cuts = text
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(text.len()));
        for cut in cuts {
            let (tree, _) = match_text(&compiled, &params, &text[..cut]);
            let root = tree.node(tree.root());
            assert_eq!((root.start_offset, root.end_offset), (0, cut));
            assert_nested(&tree);
        }
    }

    #[test]
    fn unterminated_scope_attempt() {
        // Scope tried after whitespace, then abandoned for the next alternative.
        let grammar = LanguageGrammar::new("Attempt").patterns(vec![GrammarPattern::new(&[
            "open {block}",
            "open <identifier>",
        ])
        .name("Open")])
        .scope_repository(
            "block",
            GrammarScope::new("{", "}").patterns(vec![GrammarPattern::new(&["value;"])]),
        );
        let compiled = compile(&grammar);
        let (tree, _) = match_text(&compiled, &ShaderLabParams::default(), "open\n    { value;");
        let (_, scope) = tree
            .iter()
            .find(|(_, node)| node.is_scope_match())
            .unwrap();
        assert_eq!(scope.kind, MatchNodeKind::Unmatched);
        // Starts where it was tried, before the whitespace.
        assert_eq!(scope.start_offset, "open".len());
        assert_nested(&tree);
    }

    #[test]
    fn depth_limit() {
        let grammar = LanguageGrammar::new("List")
            .patterns(vec![GrammarPattern::include("list")])
            .pattern_repository("list", GrammarPattern::new(&["(<list>)", "x"]).name("List"));
        let compiled = compile(&grammar);
        let text = format!("{}x{}", "(".repeat(64), ")".repeat(64));
        let (tree, _) = match_text(&compiled, &ShaderLabParams::default(), &text);
        assert!(tree.node(tree.root()).is_matched());
        let params = ShaderLabParams {
            depth_limit: 16,
            ..Default::default()
        };
        let (tree, _) = match_text(&compiled, &params, &text);
        assert!(!tree.node(tree.root()).is_matched());
    }

    #[test]
    fn innermost_node() {
        let compiled = compile(&block_grammar());
        let text = "{\n    value 12;\n}";
        let (tree, document) = match_text(&compiled, &ShaderLabParams::default(), text);
        let offset = text.find("12").unwrap() + 1;
        let innermost = tree.find_innermost(offset);
        assert_eq!(tree.text(innermost, &document), "12");
        assert_eq!(tree.node(innermost).pattern_name.as_deref(), Some("number"));
        let value = tree.node(innermost).matched_pattern.unwrap();
        assert_eq!(compiled.origin_name(tree.node(value).origin), Some("Value"));
        assert!(tree.ancestors(innermost).any(|ancestor| ancestor == tree.root()));
    }
}
