//! Semantic callbacks of the Cg grammar, and type resolution of expression units.
use crate::{
    document::ShaderDocument,
    grammar::match_tree::{MatchNodeId, MatchTree},
};

use super::{
    cg_symbols::{CgContextId, CgTypeId},
    symbol_parser::SemanticContext,
    symbols::{ShaderLabSymbols, SymbolRef},
};

pub fn on_struct_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let global = context.symbols.find_cg_global(context.tree, node)?;
    let name = context.get_matched_text(node, "name")?;
    let ty = context.symbols.cg.add_custom_type(global, name);
    Some(SymbolRef::CgType(ty))
}

pub fn on_struct_member_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let owner = context.symbols.find_state(context.tree, node, |state| match state {
        SymbolRef::CgType(ty) => Some(ty),
        _ => None,
    })?;
    let global = context.symbols.cg.ty(owner).global?;
    let type_name = context.get_matched_text(node, "type")?;
    let name = context.get_matched_text(node, "name")?;
    let semantics = context.get_matched_text(node, "semantics");
    let array_size = context.get_matched_text(node, "arraySize");
    let cg = &mut context.symbols.cg;
    let ty = cg.get_type(global, type_name);
    let member = cg.create_variable(ty, name, semantics);
    if let Some(array_size) = array_size {
        cg.set_array_size(member, array_size.trim_matches(|c| c == '[' || c == ']'));
    }
    cg.add_member(owner, member);
    None
}

pub fn on_function_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let global = context.symbols.find_cg_global(context.tree, node)?;
    let type_name = context.get_matched_text(node, "type")?;
    let name = context.get_matched_text(node, "name")?;
    let semantics = context.get_matched_text(node, "semantics");
    let cg = &mut context.symbols.cg;
    let return_type = cg.get_type(global, type_name);
    let function = cg.add_function(global, return_type, name, semantics);
    Some(SymbolRef::CgFunction(function))
}

pub fn on_parameter_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let function = context.symbols.find_state(context.tree, node, |state| match state {
        SymbolRef::CgFunction(function) => Some(function),
        _ => None,
    })?;
    let type_name = context.get_matched_text(node, "type")?;
    let name = context.get_matched_text(node, "name")?;
    let semantics = context.get_matched_text(node, "semantics");
    let cg = &mut context.symbols.cg;
    let global = cg.function(function).global;
    let ty = cg.get_type(global, type_name);
    let parameter = cg.create_variable(ty, name, semantics);
    cg.add_parameter(function, parameter);
    None
}

/// Blocks open a new context. The body of a function also receives its parameters.
pub fn on_block_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let upper = context.symbols.find_cg_context(context.tree, node)?;
    let block = context.symbols.cg.create_context(upper);
    let function = context
        .tree
        .node(node)
        .matched_pattern
        .and_then(|pattern| context.symbols.state(pattern));
    if let Some(SymbolRef::CgFunction(function)) = function {
        if context.symbols.cg.function(function).body.is_none() {
            context.symbols.cg.set_function_context(function, block);
        }
    }
    Some(SymbolRef::CgContext(block))
}

// The declaration resolves the type, each declarator then registers a variable with it.
pub fn on_variable_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let global = context.symbols.find_cg_global(context.tree, node)?;
    let type_name = context.get_matched_text(node, "type")?;
    Some(SymbolRef::CgType(
        context.symbols.cg.get_type(global, type_name),
    ))
}

pub fn on_declarator_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let ty = context.symbols.find_state(context.tree, node, |state| match state {
        SymbolRef::CgType(ty) => Some(ty),
        _ => None,
    })?;
    let scope = context.symbols.find_cg_context(context.tree, node)?;
    let name = context.get_matched_text(node, "name")?;
    let semantics = context.get_matched_text(node, "semantics");
    let array_size = context.get_matched_text(node, "arraySize");
    let cg = &mut context.symbols.cg;
    let variable = cg.create_variable(ty, name, semantics);
    if let Some(array_size) = array_size {
        cg.set_array_size(variable, array_size.trim_matches(|c| c == '[' || c == ']'));
    }
    cg.add_variable(scope, variable);
    None
}

// `for (int i = 0; ...)` declares in the enclosing block.
pub fn on_for_init_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let scope = context.symbols.find_cg_context(context.tree, node)?;
    let type_name = context.get_matched_text(node, "type")?;
    let name = context.get_matched_text(node, "name")?;
    let cg = &mut context.symbols.cg;
    let global = cg.global_of_context(scope);
    let ty = cg.get_type(global, type_name);
    let variable = cg.create_variable(ty, name, None);
    cg.add_variable(scope, variable);
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedType {
    pub ty: CgTypeId,
    // Variable declared as an array, first subscript removes it.
    pub array: bool,
}

/// Type of an expression unit up to (excluding) the accessor `until`.
///
/// Only units starting with a variable or a call can be resolved.
pub fn resolve_unit_type(
    tree: &MatchTree,
    document: &dyn ShaderDocument,
    symbols: &ShaderLabSymbols,
    unit: MatchNodeId,
    until: Option<MatchNodeId>,
) -> Option<ResolvedType> {
    let scope: CgContextId = symbols.find_cg_context(tree, unit)?;
    let cg = &symbols.cg;
    let global = cg.global_of_context(scope);
    let mut resolved = if let Some(variable) = tree.get_matched_text(unit, "variable", document) {
        let variable = cg.variable(cg.get_variable(scope, variable.trim())?);
        ResolvedType {
            ty: variable.ty,
            array: variable.array_size.is_some(),
        }
    } else if let Some(callee) = tree.get_matched_text(unit, "callee", document) {
        let callee = callee.trim();
        let ty = match cg.find_function(global, callee) {
            Some(function) => cg.function(function).return_type,
            None => cg.find_type(global, callee)?,
        };
        ResolvedType { ty, array: false }
    } else {
        return None;
    };
    for accessor in tree.get_match(unit, "accessor") {
        if Some(accessor) == until {
            break;
        }
        let text = tree.text(accessor, document).trim();
        if text.starts_with('[') {
            if resolved.array {
                resolved.array = false;
            } else {
                resolved.ty = cg.ty(resolved.ty).element?;
            }
        } else {
            let member = text.trim_start_matches('.').trim();
            if resolved.array {
                return None;
            }
            resolved.ty = cg.resolve_member(resolved.ty, member)?;
        }
    }
    Some(resolved)
}
