//! Declarations of a Cg program, stored in an arena.
//!
//! Back references (variable to context, context to upper context, type to global) are plain ids
//! into the [`CgSymbolTable`] so the whole graph stays owned by a single table.
use super::{
    builtins::{parse_type_shape, ShaderLabBuiltins},
    symbols::ShaderId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CgTypeId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CgVariableId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CgFunctionId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CgContextId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CgGlobalId(usize);

const VECTOR_MEMBERS: [&str; 4] = ["x", "y", "z", "w"];
const SWIZZLE_SETS: [&str; 3] = ["xyzw", "rgba", "stpq"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgType {
    pub name: String,
    pub members: Vec<CgVariableId>,
    // Members are positional (vector components), swizzles apply.
    pub ordered_members: bool,
    // Type produced by a subscript.
    pub element: Option<CgTypeId>,
    pub global: Option<CgGlobalId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgVariable {
    pub ty: CgTypeId,
    pub name: String,
    pub semantics: Option<String>,
    pub array_size: Option<String>,
    pub context: Option<CgContextId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgFunction {
    pub return_type: CgTypeId,
    pub name: String,
    pub parameters: Vec<CgVariableId>,
    pub semantics: Option<String>,
    pub global: CgGlobalId,
    pub body: Option<CgContextId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgContext {
    pub upper: Option<CgContextId>,
    pub contexts: Vec<CgContextId>,
    pub variables: Vec<CgVariableId>,
    pub global: CgGlobalId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgGlobalContext {
    // Outermost lexical context.
    pub context: CgContextId,
    pub declared_types: Vec<CgTypeId>,
    pub functions: Vec<CgFunctionId>,
    pub shader: Option<ShaderId>,
}

#[derive(Debug, Clone, Default)]
pub struct CgSymbolTable {
    types: Vec<CgType>,
    variables: Vec<CgVariable>,
    functions: Vec<CgFunction>,
    contexts: Vec<CgContext>,
    globals: Vec<CgGlobalContext>,
    vector_scalars: Vec<String>,
}

impl CgSymbolTable {
    pub fn ty(&self, id: CgTypeId) -> &CgType {
        &self.types[id.0]
    }
    pub fn variable(&self, id: CgVariableId) -> &CgVariable {
        &self.variables[id.0]
    }
    pub fn function(&self, id: CgFunctionId) -> &CgFunction {
        &self.functions[id.0]
    }
    pub fn context(&self, id: CgContextId) -> &CgContext {
        &self.contexts[id.0]
    }
    pub fn global(&self, id: CgGlobalId) -> &CgGlobalContext {
        &self.globals[id.0]
    }
    pub fn global_mut(&mut self, id: CgGlobalId) -> &mut CgGlobalContext {
        &mut self.globals[id.0]
    }
    pub fn globals(&self) -> impl Iterator<Item = CgGlobalId> + '_ {
        (0..self.globals.len()).map(CgGlobalId)
    }
    pub fn global_of_context(&self, context: CgContextId) -> CgGlobalId {
        self.context(context).global
    }

    /// New global context seeded with every builtin type.
    pub fn create_global_context(&mut self, builtins: &ShaderLabBuiltins) -> CgGlobalId {
        let global = CgGlobalId(self.globals.len());
        let context = CgContextId(self.contexts.len());
        self.contexts.push(CgContext {
            upper: None,
            contexts: Vec::new(),
            variables: Vec::new(),
            global,
        });
        self.globals.push(CgGlobalContext {
            context,
            declared_types: Vec::new(),
            functions: Vec::new(),
            shader: None,
        });
        for scalar in builtins
            .scalar_types
            .iter()
            .chain(builtins.types.iter())
            .filter(|scalar| builtins.is_vector_scalar(scalar))
        {
            if !self.vector_scalars.contains(scalar) {
                self.vector_scalars.push(scalar.clone());
            }
        }
        for name in builtins.builtin_types() {
            if self.find_type(global, &name).is_none() {
                self.declare_builtin_type(global, &name);
            }
        }
        global
    }
    fn push_type(&mut self, ty: CgType) -> CgTypeId {
        self.types.push(ty);
        CgTypeId(self.types.len() - 1)
    }
    fn declare_builtin_type(&mut self, global: CgGlobalId, name: &str) -> CgTypeId {
        match parse_type_shape(name) {
            Some((scalar, rows, columns)) if self.vector_scalars.iter().any(|s| s == scalar) => {
                self.synthesize_type(global, scalar, rows, columns)
            }
            _ => self.add_custom_type(global, name),
        }
    }
    // Vector and matrix types, their scalar and row types are declared on demand.
    fn synthesize_type(
        &mut self,
        global: CgGlobalId,
        scalar: &str,
        rows: u32,
        columns: Option<u32>,
    ) -> CgTypeId {
        let name = match columns {
            Some(columns) => format!("{}{}x{}", scalar, rows, columns),
            None => format!("{}{}", scalar, rows),
        };
        if let Some(existing) = self.find_type(global, &name) {
            return existing;
        }
        let scalar_type = match self.find_type(global, scalar) {
            Some(scalar_type) => scalar_type,
            None => self.add_custom_type(global, scalar),
        };
        match columns {
            Some(columns) => {
                let row = self.synthesize_type(global, scalar, columns, None);
                let id = self.add_custom_type(global, &name);
                self.types[id.0].element = Some(row);
                id
            }
            None => {
                let id = self.add_custom_type(global, &name);
                let members = VECTOR_MEMBERS
                    .iter()
                    .take(rows as usize)
                    .map(|member| self.create_variable(scalar_type, member, None))
                    .collect::<Vec<_>>();
                let ty = &mut self.types[id.0];
                ty.members = members;
                ty.ordered_members = true;
                ty.element = Some(scalar_type);
                id
            }
        }
    }
    /// Declare a type on the global context, returning the existing one if any.
    pub fn add_custom_type(&mut self, global: CgGlobalId, name: &str) -> CgTypeId {
        if let Some(existing) = self.find_type(global, name) {
            return existing;
        }
        let id = self.push_type(CgType {
            name: name.into(),
            members: Vec::new(),
            ordered_members: false,
            element: None,
            global: Some(global),
        });
        self.globals[global.0].declared_types.push(id);
        id
    }
    pub fn add_member(&mut self, ty: CgTypeId, member: CgVariableId) {
        self.types[ty.0].members.push(member);
    }
    /// Find a declared type by name, without declaring anything.
    pub fn find_type(&self, global: CgGlobalId, name: &str) -> Option<CgTypeId> {
        self.global(global)
            .declared_types
            .iter()
            .copied()
            .find(|ty| self.ty(*ty).name == name)
    }
    /// Resolve a type name: declared types, then vector and matrix shapes of known scalars,
    /// then a placeholder type named `name?` that is not registered.
    pub fn get_type(&mut self, global: CgGlobalId, name: &str) -> CgTypeId {
        if let Some(ty) = self.find_type(global, name) {
            return ty;
        }
        if let Some((scalar, rows, columns)) = parse_type_shape(name) {
            if self.vector_scalars.iter().any(|s| s == scalar) {
                return self.synthesize_type(global, scalar, rows, columns);
            }
        }
        self.push_type(CgType {
            name: format!("{}?", name),
            members: Vec::new(),
            ordered_members: false,
            element: None,
            global: Some(global),
        })
    }
    pub fn is_placeholder(&self, ty: CgTypeId) -> bool {
        self.ty(ty).name.ends_with('?')
    }
    pub fn create_variable(
        &mut self,
        ty: CgTypeId,
        name: &str,
        semantics: Option<&str>,
    ) -> CgVariableId {
        self.variables.push(CgVariable {
            ty,
            name: name.into(),
            semantics: semantics.map(|s| s.into()),
            array_size: None,
            context: None,
        });
        CgVariableId(self.variables.len() - 1)
    }
    pub fn set_array_size(&mut self, variable: CgVariableId, array_size: &str) {
        self.variables[variable.0].array_size = Some(array_size.into());
    }
    /// Make the types, functions and global variables of `from` visible in `global`.
    ///
    /// Imported symbols keep their owner, nothing is copied twice.
    pub fn import_global(&mut self, global: CgGlobalId, from: CgGlobalId) {
        for ty in self.globals[from.0].declared_types.clone() {
            if self.find_type(global, &self.types[ty.0].name).is_none() {
                self.globals[global.0].declared_types.push(ty);
            }
        }
        for function in self.globals[from.0].functions.clone() {
            if !self.globals[global.0].functions.contains(&function) {
                self.globals[global.0].functions.push(function);
            }
        }
        let context = self.globals[global.0].context;
        for variable in self.contexts[self.globals[from.0].context.0].variables.clone() {
            if !self.contexts[context.0].variables.contains(&variable) {
                self.contexts[context.0].variables.push(variable);
            }
        }
    }
    pub fn add_variable(&mut self, context: CgContextId, variable: CgVariableId) {
        self.contexts[context.0].variables.push(variable);
        self.variables[variable.0].context = Some(context);
    }
    /// New lexical context nested in `upper`.
    pub fn create_context(&mut self, upper: CgContextId) -> CgContextId {
        let id = CgContextId(self.contexts.len());
        let global = self.context(upper).global;
        self.contexts.push(CgContext {
            upper: Some(upper),
            contexts: Vec::new(),
            variables: Vec::new(),
            global,
        });
        self.contexts[upper.0].contexts.push(id);
        id
    }
    pub fn add_function(
        &mut self,
        global: CgGlobalId,
        return_type: CgTypeId,
        name: &str,
        semantics: Option<&str>,
    ) -> CgFunctionId {
        let id = CgFunctionId(self.functions.len());
        self.functions.push(CgFunction {
            return_type,
            name: name.into(),
            parameters: Vec::new(),
            semantics: semantics.map(|s| s.into()),
            global,
            body: None,
        });
        self.globals[global.0].functions.push(id);
        id
    }
    pub fn add_parameter(&mut self, function: CgFunctionId, parameter: CgVariableId) {
        self.functions[function.0].parameters.push(parameter);
        if let Some(body) = self.functions[function.0].body {
            self.add_variable(body, parameter);
        }
    }
    /// Attach the body context, parameters become variables of it.
    pub fn set_function_context(&mut self, function: CgFunctionId, context: CgContextId) {
        self.functions[function.0].body = Some(context);
        for parameter in self.functions[function.0].parameters.clone() {
            self.add_variable(context, parameter);
        }
    }
    pub fn find_function(&self, global: CgGlobalId, name: &str) -> Option<CgFunctionId> {
        self.global(global)
            .functions
            .iter()
            .copied()
            .find(|function| self.function(*function).name == name)
    }
    /// Variable visible from the context, innermost first.
    pub fn get_variable(&self, context: CgContextId, name: &str) -> Option<CgVariableId> {
        let mut current = Some(context);
        while let Some(id) = current {
            let context = self.context(id);
            if let Some(variable) = context
                .variables
                .iter()
                .copied()
                .find(|variable| self.variable(*variable).name == name)
            {
                return Some(variable);
            }
            current = context.upper;
        }
        None
    }
    /// Every variable visible from the context. Outer names come first, shadowed ones are
    /// replaced in place by the innermost declaration.
    pub fn get_all_variables(&self, context: CgContextId) -> Vec<CgVariableId> {
        let mut chain = vec![context];
        let mut current = self.context(context).upper;
        while let Some(upper) = current {
            chain.push(upper);
            current = self.context(upper).upper;
        }
        let mut variables: Vec<CgVariableId> = Vec::new();
        for context in chain.into_iter().rev() {
            for variable in &self.context(context).variables {
                let name = &self.variable(*variable).name;
                match variables
                    .iter_mut()
                    .find(|existing| self.variables[existing.0].name == *name)
                {
                    Some(existing) => *existing = *variable,
                    None => variables.push(*variable),
                }
            }
        }
        variables
    }
    /// Type of `ty.member`, including swizzles of positional members.
    pub fn resolve_member(&self, ty: CgTypeId, member: &str) -> Option<CgTypeId> {
        let owner = self.ty(ty);
        if let Some(variable) = owner
            .members
            .iter()
            .find(|variable| self.variable(**variable).name == member)
        {
            return Some(self.variable(*variable).ty);
        }
        if !owner.ordered_members || member.is_empty() || member.len() > 4 {
            return None;
        }
        let count = owner.members.len();
        let valid = SWIZZLE_SETS.iter().any(|set| {
            member
                .chars()
                .all(|c| set.find(c).map(|index| index < count).unwrap_or(false))
        });
        if !valid {
            return None;
        }
        let scalar = owner.element?;
        let global = owner.global?;
        if member.len() == 1 {
            Some(scalar)
        } else {
            self.find_type(global, &format!("{}{}", self.ty(scalar).name, member.len()))
        }
    }
    pub fn format_variable(&self, variable: CgVariableId) -> String {
        let variable = self.variable(variable);
        let mut label = format!("{} {}", self.ty(variable.ty).name, variable.name);
        if let Some(array_size) = &variable.array_size {
            label.push_str(&format!("[{}]", array_size));
        }
        if let Some(semantics) = &variable.semantics {
            label.push_str(&format!(" : {}", semantics));
        }
        label
    }
    pub fn format_function(&self, function: CgFunctionId) -> String {
        let function = self.function(function);
        let parameters = function
            .parameters
            .iter()
            .map(|parameter| self.format_variable(*parameter))
            .collect::<Vec<_>>()
            .join(", ");
        let mut label = format!(
            "{} {}({})",
            self.ty(function.return_type).name,
            function.name,
            parameters
        );
        if let Some(semantics) = &function.semantics {
            label.push_str(&format!(" : {}", semantics));
        }
        label
    }
}
