//! Compile a [`LanguageGrammar`] into an arena of [`PatternItem`].
//!
//! Every pattern definition compiles to exactly one [`PatternItem::Alternation`], every scope
//! definition to exactly one [`PatternItem::Scope`]. Definitions are memoized by identity and
//! registered before their body is compiled so recursive grammars terminate.
use std::collections::HashMap;

use regex::Regex;

use crate::shader_error::ShaderError;

use super::{
    match_tree::MatchOrigin,
    pattern_parser::{parse_pattern, PatternElement},
    CompletionCallback, GrammarPattern, GrammarScope, LanguageGrammar, MatchedCallback,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternItemId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompiledPatternId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompiledScopeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegExpKind {
    String,
    Number,
    Identifier,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceElement {
    pub item: PatternItemId,
    pub optional: bool,
    pub repeat: bool,
}

impl SequenceElement {
    fn required(item: PatternItemId) -> Self {
        Self {
            item,
            optional: false,
            repeat: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PatternItem {
    // Whitespace, matched only if at least one char is skipped.
    Empty {
        cross_line: bool,
    },
    Text {
        text: String,
        regex: Regex,
        cross_line: bool,
    },
    RegExp {
        kind: RegExpKind,
        regex: Regex,
        cross_line: bool,
    },
    Ordered {
        elements: Vec<SequenceElement>,
    },
    Alternation {
        pattern: CompiledPatternId,
        alternatives: Vec<PatternItemId>,
    },
    Named {
        name: String,
        inner: PatternItemId,
    },
    Scope {
        scope: CompiledScopeId,
        begin: PatternItemId,
        end: PatternItemId,
        body: Vec<PatternItemId>,
    },
    Grammar {
        body: Vec<PatternItemId>,
    },
}

#[derive(Clone)]
pub struct CompiledPattern {
    pub name: Option<String>,
    pub id: Option<String>,
    pub on_matched: Option<MatchedCallback>,
    pub on_completion: Option<CompletionCallback>,
}

#[derive(Clone)]
pub struct CompiledScope {
    pub name: Option<String>,
    pub on_matched: Option<MatchedCallback>,
    pub on_completion: Option<CompletionCallback>,
}

impl std::fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for CompiledScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledScope")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct SpaceSkipper {
    same_line: Regex,
    cross_line: Regex,
}

impl SpaceSkipper {
    fn new() -> Result<Self, ShaderError> {
        Ok(Self {
            same_line: Regex::new(r"^(?:[ \t]|/\*[^\n]*?\*/|//[^\n]*)*")?,
            cross_line: Regex::new(r"^(?:\s|/\*(?s:.*?)\*/|//[^\n]*)*")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    name: Option<String>,
    items: Vec<PatternItem>,
    patterns: Vec<CompiledPattern>,
    scopes: Vec<CompiledScope>,
    root: PatternItemId,
    skipper: SpaceSkipper,
}

impl CompiledGrammar {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    pub fn root(&self) -> PatternItemId {
        self.root
    }
    pub fn item(&self, id: PatternItemId) -> &PatternItem {
        &self.items[id.0]
    }
    pub fn pattern(&self, id: CompiledPatternId) -> &CompiledPattern {
        &self.patterns[id.0]
    }
    pub fn scope(&self, id: CompiledScopeId) -> &CompiledScope {
        &self.scopes[id.0]
    }
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
    pub fn on_matched(&self, origin: MatchOrigin) -> Option<MatchedCallback> {
        match origin {
            MatchOrigin::Pattern(pattern) => self.pattern(pattern).on_matched,
            MatchOrigin::Scope(scope) => self.scope(scope).on_matched,
            _ => None,
        }
    }
    pub fn on_completion(&self, origin: MatchOrigin) -> Option<CompletionCallback> {
        match origin {
            MatchOrigin::Pattern(pattern) => self.pattern(pattern).on_completion,
            MatchOrigin::Scope(scope) => self.scope(scope).on_completion,
            _ => None,
        }
    }
    // Debug name of the pattern or scope a node comes from.
    pub fn origin_name(&self, origin: MatchOrigin) -> Option<&str> {
        match origin {
            MatchOrigin::Pattern(pattern) => self.pattern(pattern).name.as_deref(),
            MatchOrigin::Scope(scope) => self.scope(scope).name.as_deref(),
            MatchOrigin::Grammar => self.name(),
            MatchOrigin::Item => None,
        }
    }
    /// Number of bytes of whitespace and comments at the start of `text`.
    pub fn skip_space(&self, text: &str, cross_line: bool) -> usize {
        let regex = if cross_line {
            &self.skipper.cross_line
        } else {
            &self.skipper.same_line
        };
        regex.find(text).map(|m| m.end()).unwrap_or(0)
    }
}

pub struct GrammarCompiler<'g> {
    grammar: &'g LanguageGrammar,
    items: Vec<PatternItem>,
    patterns: Vec<CompiledPattern>,
    scopes: Vec<CompiledScope>,
    compiled_patterns: HashMap<*const GrammarPattern, PatternItemId>,
    compiled_scopes: HashMap<*const GrammarScope, PatternItemId>,
    builtins: HashMap<(RegExpKind, bool), PatternItemId>,
}

impl<'g> GrammarCompiler<'g> {
    pub fn new(grammar: &'g LanguageGrammar) -> Self {
        Self {
            grammar,
            items: Vec::new(),
            patterns: Vec::new(),
            scopes: Vec::new(),
            compiled_patterns: HashMap::new(),
            compiled_scopes: HashMap::new(),
            builtins: HashMap::new(),
        }
    }
    pub fn compile(mut self) -> Result<CompiledGrammar, ShaderError> {
        if self.grammar.patterns.is_empty() {
            return Err(ShaderError::GrammarError("Grammar has no pattern".into()));
        }
        let root = self.push(PatternItem::Grammar { body: Vec::new() });
        let mut body = Vec::new();
        for pattern in &self.grammar.patterns {
            body.push(self.compile_pattern(pattern)?);
        }
        self.items[root.0] = PatternItem::Grammar { body };
        log::debug!(
            "Compiled grammar {:?}: {} items, {} patterns, {} scopes",
            self.grammar.name,
            self.items.len(),
            self.patterns.len(),
            self.scopes.len()
        );
        Ok(CompiledGrammar {
            name: self.grammar.name.clone(),
            items: self.items,
            patterns: self.patterns,
            scopes: self.scopes,
            root,
            skipper: SpaceSkipper::new()?,
        })
    }
    fn push(&mut self, item: PatternItem) -> PatternItemId {
        self.items.push(item);
        PatternItemId(self.items.len() - 1)
    }
    fn compile_pattern(&mut self, pattern: &'g GrammarPattern) -> Result<PatternItemId, ShaderError> {
        let key = pattern as *const GrammarPattern;
        if let Some(id) = self.compiled_patterns.get(&key) {
            return Ok(*id);
        }
        if pattern.patterns.is_empty() {
            return Err(ShaderError::GrammarError(format!(
                "Pattern {:?} has no alternative",
                pattern.name
            )));
        }
        let compiled_pattern = CompiledPatternId(self.patterns.len());
        self.patterns.push(CompiledPattern {
            name: pattern.name.clone(),
            id: pattern.id.clone(),
            on_matched: pattern.on_matched,
            on_completion: pattern.on_completion,
        });
        // Placeholder so that recursive references resolve to this item.
        let id = self.push(PatternItem::Alternation {
            pattern: compiled_pattern,
            alternatives: Vec::new(),
        });
        self.compiled_patterns.insert(key, id);
        let mut alternatives = Vec::with_capacity(pattern.patterns.len());
        for source in &pattern.patterns {
            let elements = parse_pattern(source)?;
            alternatives.push(self.compile_elements(pattern, &elements)?);
        }
        self.items[id.0] = PatternItem::Alternation {
            pattern: compiled_pattern,
            alternatives,
        };
        Ok(id)
    }
    fn compile_elements(
        &mut self,
        pattern: &'g GrammarPattern,
        elements: &[PatternElement],
    ) -> Result<PatternItemId, ShaderError> {
        let mut sequence = Vec::new();
        for element in elements {
            match element {
                PatternElement::Space => {
                    if pattern.keep_space {
                        let item = self.push(PatternItem::Empty {
                            cross_line: pattern.cross_line,
                        });
                        sequence.push(SequenceElement::required(item));
                    }
                }
                PatternElement::Text(text) => {
                    let item = self.compile_text(text, pattern.case_insensitive, pattern.cross_line)?;
                    sequence.push(SequenceElement::required(item));
                }
                PatternElement::Reference(name) => {
                    let item = self.compile_reference(pattern, name)?;
                    sequence.push(SequenceElement::required(item));
                }
                PatternElement::Scope(name) => {
                    let scope = match pattern.scopes.get(name) {
                        Some(scope) => scope,
                        None => match self.grammar.scope_repository.get(name) {
                            Some(scope) => scope,
                            None => {
                                return Err(ShaderError::GrammarError(format!(
                                    "Scope {{{}}} is not defined",
                                    name
                                )))
                            }
                        },
                    };
                    let item = self.compile_scope(scope)?;
                    sequence.push(SequenceElement::required(item));
                }
                PatternElement::RegExp(source) => {
                    let item = self.compile_regex(
                        source,
                        RegExpKind::Custom,
                        pattern.case_insensitive,
                        pattern.cross_line,
                    )?;
                    sequence.push(SequenceElement::required(item));
                }
                PatternElement::Optional { elements, repeat } => {
                    let item = self.compile_elements(pattern, elements)?;
                    sequence.push(SequenceElement {
                        item,
                        optional: true,
                        repeat: *repeat,
                    });
                }
            }
        }
        match sequence.as_slice() {
            [] => Err(ShaderError::GrammarError(format!(
                "Pattern {:?} contains an empty sequence",
                pattern.name
            ))),
            [single] if !single.optional => Ok(single.item),
            _ => Ok(self.push(PatternItem::Ordered { elements: sequence })),
        }
    }
    fn compile_text(
        &mut self,
        text: &str,
        case_insensitive: bool,
        cross_line: bool,
    ) -> Result<PatternItemId, ShaderError> {
        let flags = if case_insensitive { "(?i)" } else { "" };
        // Keywords must not match the start of a longer identifier.
        let boundary = match text.chars().last() {
            Some(c) if c.is_alphanumeric() || c == '_' => r"\b",
            _ => "",
        };
        let regex = Regex::new(&format!("^{}{}{}", flags, regex::escape(text), boundary))?;
        Ok(self.push(PatternItem::Text {
            text: text.into(),
            regex,
            cross_line,
        }))
    }
    fn compile_regex(
        &mut self,
        source: &str,
        kind: RegExpKind,
        case_insensitive: bool,
        cross_line: bool,
    ) -> Result<PatternItemId, ShaderError> {
        let regex = if case_insensitive {
            Regex::new(&format!("^(?i:{})", source))?
        } else {
            Regex::new(&format!("^(?:{})", source))?
        };
        Ok(self.push(PatternItem::RegExp {
            kind,
            regex,
            cross_line,
        }))
    }
    fn compile_builtin(
        &mut self,
        kind: RegExpKind,
        cross_line: bool,
    ) -> Result<PatternItemId, ShaderError> {
        if let Some(id) = self.builtins.get(&(kind, cross_line)) {
            return Ok(*id);
        }
        let source = match kind {
            RegExpKind::String => r#""(?:[^"\\\n]|\\.)*""#,
            RegExpKind::Number => r"[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?[fFhHuUlL]?",
            RegExpKind::Identifier | RegExpKind::Custom => r"[_a-zA-Z][_a-zA-Z0-9]*",
        };
        let id = self.compile_regex(source, kind, false, cross_line)?;
        self.builtins.insert((kind, cross_line), id);
        Ok(id)
    }
    fn compile_reference(
        &mut self,
        pattern: &'g GrammarPattern,
        name: &str,
    ) -> Result<PatternItemId, ShaderError> {
        let inner = match name {
            " " => {
                return Ok(self.push(PatternItem::Empty {
                    cross_line: pattern.cross_line,
                }))
            }
            "string" => self.compile_builtin(RegExpKind::String, pattern.cross_line)?,
            "number" => self.compile_builtin(RegExpKind::Number, pattern.cross_line)?,
            "identifier" => self.compile_builtin(RegExpKind::Identifier, pattern.cross_line)?,
            _ => {
                if let Some(definition) = pattern.dictionary.get(name) {
                    self.compile_pattern(definition)?
                } else if let Some(definition) = self.grammar.pattern_repository.get(name) {
                    self.compile_pattern(definition)?
                } else {
                    self.compile_builtin(RegExpKind::Identifier, pattern.cross_line)?
                }
            }
        };
        Ok(self.push(PatternItem::Named {
            name: name.into(),
            inner,
        }))
    }
    fn compile_scope(&mut self, scope: &'g GrammarScope) -> Result<PatternItemId, ShaderError> {
        let key = scope as *const GrammarScope;
        if let Some(id) = self.compiled_scopes.get(&key) {
            return Ok(*id);
        }
        if scope.begin.is_empty() || scope.end.is_empty() {
            return Err(ShaderError::GrammarError(format!(
                "Scope {:?} has an empty delimiter",
                scope.name
            )));
        }
        let compiled_scope = CompiledScopeId(self.scopes.len());
        self.scopes.push(CompiledScope {
            name: scope.name.clone(),
            on_matched: scope.on_matched,
            on_completion: scope.on_completion,
        });
        // Scope delimiters always skip across lines.
        let begin = self.compile_text(&scope.begin, false, true)?;
        let end = self.compile_text(&scope.end, false, true)?;
        let id = self.push(PatternItem::Scope {
            scope: compiled_scope,
            begin,
            end,
            body: Vec::new(),
        });
        self.compiled_scopes.insert(key, id);
        let mut body = Vec::with_capacity(scope.patterns.len());
        for pattern in &scope.patterns {
            body.push(self.compile_pattern(pattern)?);
        }
        self.items[id.0] = PatternItem::Scope {
            scope: compiled_scope,
            begin,
            end,
            body,
        };
        Ok(id)
    }
}
