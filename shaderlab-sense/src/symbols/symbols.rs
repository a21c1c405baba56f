use std::collections::HashMap;

use crate::grammar::match_tree::{MatchNodeId, MatchTree};

use super::cg_symbols::{CgContextId, CgFunctionId, CgGlobalId, CgSymbolTable, CgTypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubShaderId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassId(usize);

/// Symbol attached to a match node, visible to every node below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolRef {
    Shader(ShaderId),
    SubShader(SubShaderId),
    Pass(PassId),
    CgGlobal(CgGlobalId),
    CgContext(CgContextId),
    CgFunction(CgFunctionId),
    CgType(CgTypeId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shader {
    pub name: String,
    pub properties: Vec<ShaderProperty>,
    pub sub_shaders: Vec<SubShaderId>,
    pub fallback: Option<String>,
    pub custom_editor: Option<String>,
    // Program blocks declared at shader level.
    pub cg_programs: Vec<CgGlobalId>,
    // CGINCLUDE / HLSLINCLUDE blocks anywhere in the shader, in document order.
    pub cg_includes: Vec<CgGlobalId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProperty {
    pub shader: ShaderId,
    pub identifier: String,
    pub display_name: String,
    pub ty: String,
    pub default_value: String,
}

impl ShaderProperty {
    pub fn format(&self) -> String {
        format!(
            "{} (\"{}\", {}) = {}",
            self.identifier, self.display_name, self.ty, self.default_value
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub tag_name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSetup {
    pub state_name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubShader {
    pub shader: ShaderId,
    pub tags: Vec<Tag>,
    pub render_setups: Vec<RenderSetup>,
    pub passes: Vec<PassId>,
    pub cg_programs: Vec<CgGlobalId>,
    pub lod: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pass {
    pub sub_shader: SubShaderId,
    pub name: Option<String>,
    pub tags: Vec<Tag>,
    pub render_setups: Vec<RenderSetup>,
    pub cg_programs: Vec<CgGlobalId>,
}

/// Everything the semantic pass learned about a document.
#[derive(Debug, Clone, Default)]
pub struct ShaderLabSymbols {
    shaders: Vec<Shader>,
    sub_shaders: Vec<SubShader>,
    passes: Vec<Pass>,
    pub cg: CgSymbolTable,
    states: HashMap<MatchNodeId, SymbolRef>,
}

impl ShaderLabSymbols {
    pub fn add_shader(&mut self, name: &str) -> ShaderId {
        self.shaders.push(Shader {
            name: name.into(),
            ..Default::default()
        });
        ShaderId(self.shaders.len() - 1)
    }
    pub fn add_sub_shader(&mut self, shader: ShaderId) -> SubShaderId {
        let id = SubShaderId(self.sub_shaders.len());
        self.sub_shaders.push(SubShader {
            shader,
            tags: Vec::new(),
            render_setups: Vec::new(),
            passes: Vec::new(),
            cg_programs: Vec::new(),
            lod: None,
        });
        self.shaders[shader.0].sub_shaders.push(id);
        id
    }
    pub fn add_pass(&mut self, sub_shader: SubShaderId) -> PassId {
        let id = PassId(self.passes.len());
        self.passes.push(Pass {
            sub_shader,
            name: None,
            tags: Vec::new(),
            render_setups: Vec::new(),
            cg_programs: Vec::new(),
        });
        self.sub_shaders[sub_shader.0].passes.push(id);
        id
    }
    pub fn shaders(&self) -> &[Shader] {
        &self.shaders
    }
    pub fn shader(&self, id: ShaderId) -> &Shader {
        &self.shaders[id.0]
    }
    pub fn shader_mut(&mut self, id: ShaderId) -> &mut Shader {
        &mut self.shaders[id.0]
    }
    pub fn sub_shader(&self, id: SubShaderId) -> &SubShader {
        &self.sub_shaders[id.0]
    }
    pub fn sub_shader_mut(&mut self, id: SubShaderId) -> &mut SubShader {
        &mut self.sub_shaders[id.0]
    }
    pub fn pass(&self, id: PassId) -> &Pass {
        &self.passes[id.0]
    }
    pub fn pass_mut(&mut self, id: PassId) -> &mut Pass {
        &mut self.passes[id.0]
    }
    pub fn set_state(&mut self, node: MatchNodeId, state: SymbolRef) {
        self.states.insert(node, state);
    }
    pub fn state(&self, node: MatchNodeId) -> Option<SymbolRef> {
        self.states.get(&node).copied()
    }
    /// First state on the node or its ancestors accepted by the filter.
    pub fn find_state<T>(
        &self,
        tree: &MatchTree,
        node: MatchNodeId,
        filter: impl Fn(SymbolRef) -> Option<T>,
    ) -> Option<T> {
        std::iter::once(node)
            .chain(tree.ancestors(node))
            .filter_map(|id| self.state(id))
            .find_map(filter)
    }
    pub fn find_shader(&self, tree: &MatchTree, node: MatchNodeId) -> Option<ShaderId> {
        self.find_state(tree, node, |state| match state {
            SymbolRef::Shader(shader) => Some(shader),
            SymbolRef::SubShader(sub_shader) => Some(self.sub_shader(sub_shader).shader),
            SymbolRef::Pass(pass) => Some(self.sub_shader(self.pass(pass).sub_shader).shader),
            _ => None,
        })
    }
    pub fn find_sub_shader(&self, tree: &MatchTree, node: MatchNodeId) -> Option<SubShaderId> {
        self.find_state(tree, node, |state| match state {
            SymbolRef::SubShader(sub_shader) => Some(sub_shader),
            SymbolRef::Pass(pass) => Some(self.pass(pass).sub_shader),
            _ => None,
        })
    }
    /// Nearest Cg lexical context. A global resolves to its outermost context.
    pub fn find_cg_context(&self, tree: &MatchTree, node: MatchNodeId) -> Option<CgContextId> {
        self.find_state(tree, node, |state| match state {
            SymbolRef::CgContext(context) => Some(context),
            SymbolRef::CgGlobal(global) => Some(self.cg.global(global).context),
            _ => None,
        })
    }
    pub fn find_cg_global(&self, tree: &MatchTree, node: MatchNodeId) -> Option<CgGlobalId> {
        self.find_state(tree, node, |state| match state {
            SymbolRef::CgGlobal(global) => Some(global),
            SymbolRef::CgContext(context) => Some(self.cg.global_of_context(context)),
            _ => None,
        })
    }
}
