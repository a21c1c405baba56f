//! Semantic callbacks of the ShaderLab grammar.
//!
//! Callbacks are run by [`super::symbol_provider::SymbolProvider`] on each pattern or scope
//! match, in document order, and build the [`ShaderLabSymbols`] of the document.
use crate::{
    document::ShaderDocument,
    grammar::match_tree::{MatchNodeId, MatchTree},
};

use super::{
    builtins::ShaderLabBuiltins,
    cg_symbols::CgGlobalId,
    symbols::{RenderSetup, ShaderLabSymbols, ShaderProperty, SymbolRef, Tag},
};

pub struct SemanticContext<'a> {
    pub tree: &'a MatchTree,
    pub document: &'a dyn ShaderDocument,
    pub builtins: &'a ShaderLabBuiltins,
    pub symbols: &'a mut ShaderLabSymbols,
}

impl<'a> SemanticContext<'a> {
    pub fn text(&self, node: MatchNodeId) -> &'a str {
        self.tree.text(node, self.document)
    }
    /// Text of the first matched node named `name` in the pattern.
    pub fn get_matched_text(&self, node: MatchNodeId, name: &str) -> Option<&'a str> {
        self.tree
            .get_matched_text(node, name, self.document)
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
    }
    pub fn get_all_matched_text(&self, node: MatchNodeId, name: &str) -> Vec<&'a str> {
        self.tree
            .get_match(node, name)
            .into_iter()
            .filter(|matched| self.tree.node(*matched).is_matched())
            .map(|matched| self.text(matched).trim())
            .collect()
    }
}

pub fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|text| text.strip_suffix('"'))
        .unwrap_or(text)
}

pub fn on_shader_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let name = context.get_matched_text(node, "name").map(unquote).unwrap_or("");
    let shader = context.symbols.add_shader(name);
    Some(SymbolRef::Shader(shader))
}

pub fn on_property_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let shader = context.symbols.find_shader(context.tree, node)?;
    let identifier = context.get_matched_text(node, "identifier")?;
    let property = ShaderProperty {
        shader,
        identifier: identifier.into(),
        display_name: context
            .get_matched_text(node, "displayName")
            .map(unquote)
            .unwrap_or("")
            .into(),
        ty: context.get_matched_text(node, "propType").unwrap_or("").into(),
        default_value: context
            .get_matched_text(node, "defaultValue")
            .unwrap_or("")
            .into(),
    };
    context.symbols.shader_mut(shader).properties.push(property);
    None
}

pub fn on_fallback_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let shader = context.symbols.find_shader(context.tree, node)?;
    let name = context.get_matched_text(node, "name")?;
    context.symbols.shader_mut(shader).fallback = Some(unquote(name).into());
    None
}

pub fn on_custom_editor_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let shader = context.symbols.find_shader(context.tree, node)?;
    let name = context.get_matched_text(node, "name")?;
    context.symbols.shader_mut(shader).custom_editor = Some(unquote(name).into());
    None
}

pub fn on_sub_shader_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let shader = context.symbols.find_shader(context.tree, node)?;
    Some(SymbolRef::SubShader(context.symbols.add_sub_shader(shader)))
}

pub fn on_pass_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let sub_shader = context.symbols.find_sub_shader(context.tree, node)?;
    Some(SymbolRef::Pass(context.symbols.add_pass(sub_shader)))
}

pub fn on_lod_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let sub_shader = context.symbols.find_sub_shader(context.tree, node)?;
    let value = context.get_matched_text(node, "value")?;
    context.symbols.sub_shader_mut(sub_shader).lod = Some(value.into());
    None
}

// Tags and render setups belong to the innermost pass or sub shader.
fn find_render_block(context: &SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    context
        .symbols
        .find_state(context.tree, node, |state| match state {
            SymbolRef::SubShader(_) | SymbolRef::Pass(_) => Some(state),
            _ => None,
        })
}

pub fn on_tag_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let tag = Tag {
        tag_name: unquote(context.get_matched_text(node, "tag")?).into(),
        value: unquote(context.get_matched_text(node, "value").unwrap_or("")).into(),
    };
    match find_render_block(context, node)? {
        SymbolRef::SubShader(sub_shader) => context.symbols.sub_shader_mut(sub_shader).tags.push(tag),
        SymbolRef::Pass(pass) => context.symbols.pass_mut(pass).tags.push(tag),
        _ => {}
    }
    None
}

pub fn on_render_setup_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let render_setup = RenderSetup {
        state_name: context.get_matched_text(node, "state")?.into(),
        value: context.get_all_matched_text(node, "value").join(" "),
    };
    match find_render_block(context, node)? {
        SymbolRef::SubShader(sub_shader) => context
            .symbols
            .sub_shader_mut(sub_shader)
            .render_setups
            .push(render_setup),
        SymbolRef::Pass(pass) => {
            let pass = context.symbols.pass_mut(pass);
            if render_setup.state_name.eq_ignore_ascii_case("Name") {
                pass.name = Some(unquote(&render_setup.value).into());
            }
            pass.render_setups.push(render_setup);
        }
        _ => {}
    }
    None
}

// Each program block gets its own global context, linked to the innermost render block. It
// sees what the include blocks before it in the same shader declare.
fn add_cg_global(context: &mut SemanticContext, node: MatchNodeId) -> CgGlobalId {
    let global = context.symbols.cg.create_global_context(context.builtins);
    let shader = context.symbols.find_shader(context.tree, node);
    context.symbols.cg.global_mut(global).shader = shader;
    match find_render_block(context, node) {
        Some(SymbolRef::Pass(pass)) => context.symbols.pass_mut(pass).cg_programs.push(global),
        Some(SymbolRef::SubShader(sub_shader)) => context
            .symbols
            .sub_shader_mut(sub_shader)
            .cg_programs
            .push(global),
        _ => {
            if let Some(shader) = shader {
                context.symbols.shader_mut(shader).cg_programs.push(global);
            }
        }
    }
    if let Some(shader) = shader {
        for include in context.symbols.shader(shader).cg_includes.clone() {
            context.symbols.cg.import_global(global, include);
        }
    }
    global
}

pub fn on_cg_program_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    Some(SymbolRef::CgGlobal(add_cg_global(context, node)))
}

pub fn on_cg_include_match(context: &mut SemanticContext, node: MatchNodeId) -> Option<SymbolRef> {
    let global = add_cg_global(context, node);
    if let Some(shader) = context.symbols.cg.global(global).shader {
        context.symbols.shader_mut(shader).cg_includes.push(global);
    }
    Some(SymbolRef::CgGlobal(global))
}
