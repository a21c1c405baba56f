//! Completion providers of Cg programs.
use crate::{
    grammar::match_tree::MatchNodeId,
    symbols::{
        cg_parser::resolve_unit_type,
        cg_symbols::CgGlobalId,
    },
};

use super::{CompletionContext, CompletionItem, CompletionItemKind};

fn type_items(context: &CompletionContext, global: Option<CgGlobalId>) -> Vec<CompletionItem> {
    match global {
        Some(global) => {
            let cg = &context.symbols.cg;
            cg.global(global)
                .declared_types
                .iter()
                .map(|ty| CompletionItem::new(&cg.ty(*ty).name, CompletionItemKind::Struct))
                .collect()
        }
        None => context
            .builtins
            .builtin_types()
            .iter()
            .map(|ty| CompletionItem::new(ty, CompletionItemKind::Struct))
            .collect(),
    }
}

fn keyword_items(context: &CompletionContext) -> Vec<CompletionItem> {
    if !context.params.keyword_completion {
        return Vec::new();
    }
    context
        .builtins
        .keywords
        .iter()
        .map(|keyword| CompletionItem::new(keyword, CompletionItemKind::Keyword))
        .collect()
}

// Variables visible from the node, functions and types of its program.
fn symbol_items(context: &CompletionContext, node: MatchNodeId) -> Vec<CompletionItem> {
    let cg = &context.symbols.cg;
    let scope = context.symbols.find_cg_context(context.tree, node);
    let global = scope.map(|scope| cg.global_of_context(scope));
    let mut items = Vec::new();
    if let Some(scope) = scope {
        items.extend(cg.get_all_variables(scope).into_iter().map(|variable| {
            CompletionItem::new(&cg.variable(variable).name, CompletionItemKind::Variable)
                .with_detail(cg.format_variable(variable))
        }));
    }
    if let Some(global) = global {
        items.extend(cg.global(global).functions.iter().map(|function| {
            CompletionItem::new(&cg.function(*function).name, CompletionItemKind::Function)
                .with_detail(cg.format_function(*function))
        }));
    }
    items.extend(type_items(context, global));
    items
}

fn member_items(
    context: &CompletionContext,
    unit: MatchNodeId,
    accessor: MatchNodeId,
) -> Vec<CompletionItem> {
    let resolved = match resolve_unit_type(
        context.tree,
        context.document,
        context.symbols,
        unit,
        Some(accessor),
    ) {
        Some(resolved) if !resolved.array => resolved,
        _ => return Vec::new(),
    };
    let cg = &context.symbols.cg;
    let ty = cg.ty(resolved.ty);
    ty.members
        .iter()
        .enumerate()
        .map(|(index, member)| {
            let item = CompletionItem::new(&cg.variable(*member).name, CompletionItemKind::Field)
                .with_detail(cg.format_variable(*member));
            if ty.ordered_members {
                item.with_sort_text(format!("{:04}", index))
            } else {
                item
            }
        })
        .collect()
}

fn semantics_items(context: &CompletionContext) -> Vec<CompletionItem> {
    context
        .builtins
        .semantics
        .iter()
        .map(|semantics| CompletionItem::new(semantics, CompletionItemKind::EnumMember))
        .collect()
}

/// Types and semantics of declarations, functions, parameters and struct members.
pub fn declaration_completion(context: &CompletionContext, node: MatchNodeId) -> Vec<CompletionItem> {
    match context.name(node) {
        Some("type") => type_items(
            context,
            context.symbols.find_cg_global(context.tree, node),
        ),
        Some("semantics") => semantics_items(context),
        _ => Vec::new(),
    }
}

/// Declared names at the program level are usually bound to shader properties.
pub fn declarator_completion(context: &CompletionContext, node: MatchNodeId) -> Vec<CompletionItem> {
    match context.name(node) {
        Some("name") => {
            let cg = &context.symbols.cg;
            let is_global = context
                .symbols
                .find_cg_context(context.tree, node)
                .map(|scope| cg.context(scope).upper.is_none())
                .unwrap_or(false);
            let shader = match context.symbols.find_shader(context.tree, node) {
                Some(shader) if is_global => shader,
                _ => return Vec::new(),
            };
            context
                .symbols
                .shader(shader)
                .properties
                .iter()
                .map(|property| {
                    CompletionItem::new(&property.identifier, CompletionItemKind::Variable)
                        .with_detail(property.format())
                })
                .collect()
        }
        Some("semantics") => semantics_items(context),
        _ => Vec::new(),
    }
}

pub fn unit_completion(context: &CompletionContext, node: MatchNodeId) -> Vec<CompletionItem> {
    match context.name(node) {
        Some("variable") | Some("callee") => {
            if context.tree.node(node).contain(context.offset) {
                symbol_items(context, node)
            } else {
                Vec::new()
            }
        }
        Some("type") => type_items(
            context,
            context.symbols.find_cg_global(context.tree, node),
        ),
        Some("accessor") => match context.tree.node(node).matched_pattern {
            Some(unit) => member_items(context, unit, node),
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

pub fn accessor_completion(context: &CompletionContext, node: MatchNodeId) -> Vec<CompletionItem> {
    match context.name(node) {
        Some("member") => {
            let accessor = match context.tree.node(node).matched_pattern {
                Some(accessor) => accessor,
                None => return Vec::new(),
            };
            match context.tree.node(accessor).matched_pattern {
                Some(unit) => member_items(context, unit, accessor),
                None => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

/// No-sense line in a function body or nested block.
pub fn block_completion(context: &CompletionContext, node: MatchNodeId) -> Vec<CompletionItem> {
    if !context.is_blank_position(node) {
        return Vec::new();
    }
    let mut items = keyword_items(context);
    items.extend(symbol_items(context, node));
    items
}

/// No-sense line at the top level of a program block.
pub fn cg_program_completion(context: &CompletionContext, node: MatchNodeId) -> Vec<CompletionItem> {
    if !context.is_blank_position(node) {
        return Vec::new();
    }
    let mut items = Vec::new();
    if context.params.keyword_completion {
        items.extend(["#pragma", "#include", "#define", "struct"].iter().map(|keyword| {
            CompletionItem::new(keyword, CompletionItemKind::Keyword)
        }));
    }
    items.extend(symbol_items(context, node));
    items
}
