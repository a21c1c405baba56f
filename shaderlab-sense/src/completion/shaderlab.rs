//! Completion providers of the ShaderLab blocks.
use crate::{
    grammar::match_tree::MatchNodeId,
    symbols::{symbol_parser::unquote, symbols::SymbolRef},
};

use super::{CompletionContext, CompletionItem, CompletionItemKind};

fn snippet(label: &str, insert_text: &str) -> CompletionItem {
    CompletionItem::new(label, CompletionItemKind::Snippet).with_insert_text(insert_text.into())
}

fn keywords(labels: &[&str]) -> Vec<CompletionItem> {
    labels
        .iter()
        .map(|label| CompletionItem::new(label, CompletionItemKind::Keyword))
        .collect()
}

// Whether the node is inside a Pass rather than directly in a SubShader.
fn is_in_pass(context: &CompletionContext, node: MatchNodeId) -> bool {
    let block = context.symbols.find_state(context.tree, node, |state| match state {
        SymbolRef::SubShader(_) | SymbolRef::Pass(_) => Some(state),
        _ => None,
    });
    matches!(block, Some(SymbolRef::Pass(_)))
}

fn tag_names(context: &CompletionContext, node: MatchNodeId) -> Vec<CompletionItem> {
    let tags = if is_in_pass(context, node) {
        &context.builtins.pass_tags
    } else {
        &context.builtins.sub_shader_tags
    };
    tags.keys()
        .map(|tag| CompletionItem::new(tag, CompletionItemKind::Property).with_detail("Tag".into()))
        .collect()
}

fn tag_values(context: &CompletionContext, node: MatchNodeId, tag: &str) -> Vec<CompletionItem> {
    match context.builtins.find_tag_values(tag, is_in_pass(context, node)) {
        Some(values) => values
            .iter()
            .map(|value| {
                CompletionItem::new(value, CompletionItemKind::EnumMember).with_detail(tag.into())
            })
            .collect(),
        None => Vec::new(),
    }
}

fn render_state_names(context: &CompletionContext) -> Vec<CompletionItem> {
    context
        .builtins
        .render_states
        .keys()
        .map(|state| {
            CompletionItem::new(state, CompletionItemKind::Property)
                .with_detail("Render state".into())
        })
        .collect()
}

pub fn shader_scope_completion(context: &CompletionContext, node: MatchNodeId) -> Vec<CompletionItem> {
    if !context.is_blank_position(node) || !context.params.keyword_completion {
        return Vec::new();
    }
    vec![
        snippet("Properties", "Properties\n{\n}"),
        snippet("SubShader", "SubShader\n{\n}"),
        snippet("Fallback", "Fallback \"\""),
        snippet("CustomEditor", "CustomEditor \"\""),
        snippet("CGINCLUDE", "CGINCLUDE\nENDCG"),
    ]
}

pub fn property_completion(context: &CompletionContext, node: MatchNodeId) -> Vec<CompletionItem> {
    match context.name(node) {
        Some("propType") => context
            .builtins
            .property_types
            .iter()
            .map(|ty| CompletionItem::new(ty, CompletionItemKind::TypeParameter))
            .collect(),
        _ => Vec::new(),
    }
}

/// No-sense line directly in a SubShader or Pass.
pub fn render_block_completion(context: &CompletionContext, node: MatchNodeId) -> Vec<CompletionItem> {
    if !context.is_blank_position(node) {
        return Vec::new();
    }
    let mut items = render_state_names(context);
    if context.params.keyword_completion {
        if is_in_pass(context, node) {
            items.extend(keywords(&["Tags", "Stencil"]));
            items.push(snippet("CGPROGRAM", "CGPROGRAM\nENDCG"));
            items.push(snippet("HLSLPROGRAM", "HLSLPROGRAM\nENDHLSL"));
        } else {
            items.extend(keywords(&["Tags", "LOD", "UsePass", "GrabPass", "Stencil"]));
            items.push(snippet("Pass", "Pass\n{\n}"));
            items.push(snippet("CGPROGRAM", "CGPROGRAM\nENDCG"));
            items.push(snippet("HLSLPROGRAM", "HLSLPROGRAM\nENDHLSL"));
            items.push(snippet("CGINCLUDE", "CGINCLUDE\nENDCG"));
        }
    }
    items
}

// Name of a tag whose string is closed before the cursor, which then waits for its value.
fn closed_tag<'a>(context: &CompletionContext<'a>, tag: MatchNodeId) -> Option<&'a str> {
    let matched = context.tree.node(tag);
    let text = context.text(tag).trim();
    let closed = matched.is_matched() && text.len() >= 2 && text.ends_with('"');
    if closed && context.offset >= matched.end_offset {
        Some(unquote(text))
    } else {
        None
    }
}

pub fn tags_scope_completion(context: &CompletionContext, node: MatchNodeId) -> Vec<CompletionItem> {
    if context.is_blank_position(node) {
        return tag_names(context, node);
    }
    if !context.tree.node(node).is_unmatched_text() {
        return Vec::new();
    }
    // A pair missing its `=`, with the cursor past the tag.
    let tag = context
        .tree
        .best_attempt(node)
        .and_then(|pair| context.tree.get_match(pair, "tag").first().copied())
        .and_then(|tag| closed_tag(context, tag));
    match tag {
        Some(tag) => tag_values(context, node, tag),
        None => Vec::new(),
    }
}

pub fn tag_completion(context: &CompletionContext, node: MatchNodeId) -> Vec<CompletionItem> {
    match context.name(node) {
        Some("tag") => match closed_tag(context, node) {
            Some(tag) => tag_values(context, node, tag),
            None => tag_names(context, node),
        },
        Some("value") => {
            let pair = match context.tree.node(node).matched_pattern {
                Some(pair) => pair,
                None => return Vec::new(),
            };
            match context
                .tree
                .get_matched_text(pair, "tag", context.document)
            {
                Some(tag) => tag_values(context, node, unquote(tag.trim())),
                None => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

pub fn render_setup_completion(context: &CompletionContext, node: MatchNodeId) -> Vec<CompletionItem> {
    match context.name(node) {
        Some("state") => render_state_names(context),
        Some("value") => {
            let setup = match context.tree.node(node).matched_pattern {
                Some(setup) => setup,
                None => return Vec::new(),
            };
            let state = match context
                .tree
                .get_matched_text(setup, "state", context.document)
            {
                Some(state) => state.trim(),
                None => return Vec::new(),
            };
            context
                .builtins
                .render_states
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(state))
                .map(|(name, values)| {
                    values
                        .iter()
                        .map(|value| {
                            CompletionItem::new(value, CompletionItemKind::EnumMember)
                                .with_detail(name.clone())
                        })
                        .collect()
                })
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

pub fn pragma_completion(context: &CompletionContext, node: MatchNodeId) -> Vec<CompletionItem> {
    match context.name(node) {
        Some("command") => context
            .builtins
            .pragmas
            .iter()
            .map(|pragma| {
                CompletionItem::new(pragma, CompletionItemKind::Keyword)
                    .with_detail("#pragma".into())
            })
            .collect(),
        _ => Vec::new(),
    }
}
