//! Flattened result of matching a document.
//!
//! Nodes live in an arena indexed by [`MatchNodeId`], in depth first pre order, the root being
//! the first one. Parent links and the nearest enclosing pattern and scope matches are stamped
//! on every node when the tree is built.
use crate::{
    document::ShaderDocument,
    position::ShaderRange,
};

use super::{
    compiler::{CompiledPatternId, CompiledScopeId, PatternItemId},
    matcher::PatternMatch,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchNodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchNodeKind {
    Matched,
    Unmatched,
    // Alternation where no alternative matched. Children are all the attempts.
    UnmatchedPattern,
    // Line skipped by a scope. Children are the body attempts made on it.
    UnmatchedText,
}

/// What grammar construct produced a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOrigin {
    Item,
    Pattern(CompiledPatternId),
    Scope(CompiledScopeId),
    Grammar,
}

#[derive(Debug, Clone)]
pub struct MatchNode {
    // None for unmatched text.
    pub item: Option<PatternItemId>,
    pub origin: MatchOrigin,
    pub kind: MatchNodeKind,
    pub start_offset: usize,
    pub end_offset: usize,
    pub pattern_name: Option<String>,
    pub parent: Option<MatchNodeId>,
    pub children: Vec<MatchNodeId>,
    // Nearest strict ancestor that is a pattern match.
    pub matched_pattern: Option<MatchNodeId>,
    // Nearest strict ancestor that is a scope match.
    pub matched_scope: Option<MatchNodeId>,
}

impl MatchNode {
    pub fn is_matched(&self) -> bool {
        self.kind == MatchNodeKind::Matched
    }
    pub fn is_pattern_match(&self) -> bool {
        matches!(self.origin, MatchOrigin::Pattern(_))
    }
    pub fn is_scope_match(&self) -> bool {
        matches!(self.origin, MatchOrigin::Scope(_))
    }
    pub fn is_unmatched_text(&self) -> bool {
        self.kind == MatchNodeKind::UnmatchedText
    }
    pub fn contain(&self, offset: usize) -> bool {
        offset >= self.start_offset && offset <= self.end_offset
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchTree {
    nodes: Vec<MatchNode>,
}

impl MatchTree {
    pub fn new(root: PatternMatch) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.insert(root, None, None, None);
        tree
    }
    fn insert(
        &mut self,
        result: PatternMatch,
        parent: Option<MatchNodeId>,
        matched_pattern: Option<MatchNodeId>,
        matched_scope: Option<MatchNodeId>,
    ) -> MatchNodeId {
        let id = MatchNodeId(self.nodes.len());
        self.nodes.push(MatchNode {
            item: result.item,
            origin: result.origin,
            kind: result.kind,
            start_offset: result.start_offset,
            end_offset: result.end_offset,
            pattern_name: result.pattern_name,
            parent,
            children: Vec::with_capacity(result.children.len()),
            matched_pattern,
            matched_scope,
        });
        let child_pattern = match result.origin {
            MatchOrigin::Pattern(_) => Some(id),
            _ => matched_pattern,
        };
        let child_scope = match result.origin {
            MatchOrigin::Scope(_) => Some(id),
            _ => matched_scope,
        };
        for child in result.children {
            let child = self.insert(child, Some(id), child_pattern, child_scope);
            self.nodes[id.0].children.push(child);
        }
        id
    }
    pub fn root(&self) -> MatchNodeId {
        MatchNodeId(0)
    }
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    pub fn node(&self, id: MatchNodeId) -> &MatchNode {
        &self.nodes[id.0]
    }
    pub fn iter(&self) -> impl Iterator<Item = (MatchNodeId, &MatchNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (MatchNodeId(index), node))
    }
    pub fn children(&self, id: MatchNodeId) -> &[MatchNodeId] {
        &self.node(id).children
    }
    pub fn parent(&self, id: MatchNodeId) -> Option<MatchNodeId> {
        self.node(id).parent
    }
    /// Strict ancestors of the node, nearest first.
    pub fn ancestors(&self, id: MatchNodeId) -> impl Iterator<Item = MatchNodeId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }
    pub fn text<'d>(&self, id: MatchNodeId, document: &'d dyn ShaderDocument) -> &'d str {
        let node = self.node(id);
        document
            .get_text()
            .get(node.start_offset..node.end_offset)
            .unwrap_or("")
    }
    pub fn range(&self, id: MatchNodeId, document: &dyn ShaderDocument) -> ShaderRange {
        let node = self.node(id);
        ShaderRange::new(
            document.position_at(node.start_offset),
            document.position_at(node.end_offset),
        )
    }
    /// Attempt reaching the furthest for an unmatched text or pattern, first one on ties.
    pub fn best_attempt(&self, id: MatchNodeId) -> Option<MatchNodeId> {
        let mut best: Option<MatchNodeId> = None;
        for child in self.children(id) {
            best = match best {
                Some(current) if self.node(current).end_offset >= self.node(*child).end_offset => {
                    Some(current)
                }
                _ => Some(*child),
            };
        }
        best
    }
    /// Named descendants of a pattern match, in document order.
    ///
    /// Does not descend into nested pattern or scope matches, nor into other named nodes,
    /// which belong to another pattern. For unmatched nodes, only the best attempt is searched.
    pub fn get_match(&self, id: MatchNodeId, name: &str) -> Vec<MatchNodeId> {
        let node = self.node(id);
        let mut stack: Vec<MatchNodeId> = match node.kind {
            MatchNodeKind::UnmatchedPattern | MatchNodeKind::UnmatchedText => {
                self.best_attempt(id).into_iter().collect()
            }
            _ => node.children.iter().rev().copied().collect(),
        };
        let mut result = Vec::new();
        while let Some(current) = stack.pop() {
            let node = self.node(current);
            if node.pattern_name.as_deref() == Some(name) {
                result.push(current);
                continue;
            }
            if node.pattern_name.is_some() || node.is_pattern_match() || node.is_scope_match() {
                continue;
            }
            stack.extend(node.children.iter().rev());
        }
        result
    }
    /// Text of the first matched descendant with this name.
    pub fn get_matched_text<'d>(
        &self,
        id: MatchNodeId,
        name: &str,
        document: &'d dyn ShaderDocument,
    ) -> Option<&'d str> {
        self.get_match(id, name)
            .into_iter()
            .find(|matched| self.node(*matched).is_matched())
            .map(|matched| self.text(matched, document))
    }
    /// Deepest node containing the offset.
    ///
    /// Among children containing it, prefer the ones starting strictly before the offset, then
    /// the one reaching furthest, then the first one.
    pub fn find_innermost(&self, offset: usize) -> MatchNodeId {
        let mut current = self.root();
        loop {
            let mut best: Option<MatchNodeId> = None;
            for child in self.children(current) {
                let candidate = self.node(*child);
                if !candidate.contain(offset) {
                    continue;
                }
                best = match best {
                    Some(best) if !self.is_better(candidate, self.node(best), offset) => Some(best),
                    _ => Some(*child),
                };
            }
            match best {
                Some(best) => current = best,
                None => return current,
            }
        }
    }
    fn is_better(&self, candidate: &MatchNode, best: &MatchNode, offset: usize) -> bool {
        let candidate_before = candidate.start_offset < offset;
        let best_before = best.start_offset < offset;
        if candidate_before != best_before {
            candidate_before
        } else {
            candidate.end_offset > best.end_offset
        }
    }
}
