//! Answer completion requests by walking the match tree from the cursor up to the root.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    document::ShaderDocument,
    grammar::{
        compiler::CompiledGrammar,
        match_tree::{MatchNodeId, MatchNodeKind, MatchTree},
    },
    shader::ShaderLabParams,
    symbols::{builtins::ShaderLabBuiltins, symbols::ShaderLabSymbols},
};

pub mod cg;
pub mod shaderlab;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompletionItemKind {
    Keyword,
    Struct,
    Variable,
    Function,
    Field,
    Property,
    EnumMember,
    Snippet,
    TypeParameter,
    Unit,
    Module,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionItemKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_text: Option<String>,
}

impl CompletionItem {
    pub fn new(label: &str, kind: CompletionItemKind) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
            insert_text: None,
            sort_text: None,
        }
    }
    pub fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }
    pub fn with_insert_text(mut self, insert_text: String) -> Self {
        self.insert_text = Some(insert_text);
        self
    }
    pub fn with_sort_text(mut self, sort_text: String) -> Self {
        self.sort_text = Some(sort_text);
        self
    }
    fn sort_key(&self) -> &str {
        self.sort_text.as_deref().unwrap_or(&self.label)
    }
}

pub struct CompletionContext<'a> {
    pub tree: &'a MatchTree,
    pub document: &'a dyn ShaderDocument,
    pub symbols: &'a ShaderLabSymbols,
    pub builtins: &'a ShaderLabBuiltins,
    pub params: &'a ShaderLabParams,
    pub offset: usize,
    pub innermost: MatchNodeId,
}

impl<'a> CompletionContext<'a> {
    pub fn new(
        tree: &'a MatchTree,
        document: &'a dyn ShaderDocument,
        symbols: &'a ShaderLabSymbols,
        builtins: &'a ShaderLabBuiltins,
        params: &'a ShaderLabParams,
        offset: usize,
    ) -> Self {
        Self {
            tree,
            document,
            symbols,
            builtins,
            params,
            offset,
            innermost: find_cursor_node(tree, offset),
        }
    }
    pub fn text(&self, node: MatchNodeId) -> &'a str {
        self.tree.text(node, self.document)
    }
    pub fn name(&self, node: MatchNodeId) -> Option<&'a str> {
        self.tree.node(node).pattern_name.as_deref()
    }
    /// Cursor sits on a line or in a gap that no pattern of the scope explains.
    ///
    /// A line nothing understands still counts while the cursor is on its first word, so a
    /// partly typed name gets the same items as an empty line.
    pub fn is_blank_position(&self, node: MatchNodeId) -> bool {
        let matched = self.tree.node(node);
        if node == self.innermost {
            return matched.is_unmatched_text() || matched.is_scope_match();
        }
        matched.is_unmatched_text()
            && matched.start_offset <= self.offset
            && self
                .document
                .get_text()
                .get(matched.start_offset..self.offset)
                .map(|word| word.chars().all(|c| c.is_alphanumeric() || c == '_'))
                .unwrap_or(false)
    }
}

// Innermost node, with the delimiters of a scope standing for the scope body.
fn find_cursor_node(tree: &MatchTree, offset: usize) -> MatchNodeId {
    if tree.is_empty() {
        return tree.root();
    }
    let innermost = tree.find_innermost(offset);
    let node = tree.node(innermost);
    let parent = match node.parent {
        Some(parent) if tree.node(parent).is_scope_match() => parent,
        _ => return innermost,
    };
    if node.pattern_name.is_some() || !node.children.is_empty() || !node.is_matched() {
        return innermost;
    }
    let siblings = tree.children(parent);
    let is_begin = siblings.first() == Some(&innermost) && offset >= node.end_offset;
    let is_end = siblings.len() > 1
        && siblings.last() == Some(&innermost)
        && offset <= node.start_offset;
    if is_begin || is_end {
        parent
    } else {
        innermost
    }
}

pub fn resolve_completion(grammar: &CompiledGrammar, context: &CompletionContext) -> Vec<CompletionItem> {
    let tree = context.tree;
    let mut items = Vec::new();
    if tree.is_empty() {
        return items;
    }
    let mut current = Some(context.innermost);
    while let Some(id) = current {
        let node = tree.node(id);
        if node.pattern_name.is_some() || node.kind == MatchNodeKind::UnmatchedText {
            for provider in [node.matched_pattern, node.matched_scope]
                .into_iter()
                .flatten()
            {
                if let Some(callback) = grammar.on_completion(tree.node(provider).origin) {
                    items.extend(callback(context, id));
                }
            }
        }
        // Cursor in the body of the scope itself.
        if id == context.innermost && node.is_scope_match() {
            if let Some(callback) = grammar.on_completion(node.origin) {
                items.extend(callback(context, id));
            }
        }
        current = node.parent;
    }
    sort_completion_items(items)
}

/// Stable sort by sort text, then keep the first item of each label.
pub fn sort_completion_items(mut items: Vec<CompletionItem>) -> Vec<CompletionItem> {
    items.sort_by(|lhs, rhs| lhs.sort_key().cmp(rhs.sort_key()));
    let mut labels = HashSet::new();
    items.retain(|item| labels.insert(item.label.clone()));
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_and_dedup() {
        let items = vec![
            CompletionItem::new("z", CompletionItemKind::Field).with_sort_text("0002".into()),
            CompletionItem::new("y", CompletionItemKind::Variable),
            CompletionItem::new("x", CompletionItemKind::Field).with_sort_text("0000".into()),
            CompletionItem::new("y", CompletionItemKind::Field).with_sort_text("0001".into()),
            CompletionItem::new("a", CompletionItemKind::Keyword),
        ];
        let labels = sort_completion_items(items)
            .into_iter()
            .map(|item| (item.label, item.kind))
            .collect::<Vec<_>>();
        assert_eq!(
            labels,
            vec![
                ("x".to_string(), CompletionItemKind::Field),
                ("y".to_string(), CompletionItemKind::Field),
                ("z".to_string(), CompletionItemKind::Field),
                ("a".to_string(), CompletionItemKind::Keyword),
            ]
        );
    }

    #[test]
    fn completion_item_json() {
        let item = CompletionItem::new("Queue", CompletionItemKind::Property)
            .with_insert_text("\"Queue\"".into());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["label"], "Queue");
        assert_eq!(json["kind"], "Property");
        assert_eq!(json["insertText"], "\"Queue\"");
        assert!(json.get("sortText").is_none());
    }
}
