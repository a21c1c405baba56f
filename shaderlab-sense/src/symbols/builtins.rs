use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::shader_error::ShaderError;

/// Fixed vocabularies of ShaderLab and Cg.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShaderLabBuiltins {
    // Scalars with vector and square matrix variants.
    pub scalar_types: Vec<String>,
    pub types: Vec<String>,
    pub sampler_types: Vec<String>,
    pub keywords: Vec<String>,
    pub property_types: Vec<String>,
    pub pragmas: Vec<String>,
    pub semantics: Vec<String>,
    pub sub_shader_tags: BTreeMap<String, Vec<String>>,
    pub pass_tags: BTreeMap<String, Vec<String>>,
    pub render_states: BTreeMap<String, Vec<String>>,
}

impl ShaderLabBuiltins {
    pub fn parse_from_json(file_content: &str) -> Result<ShaderLabBuiltins, ShaderError> {
        Ok(serde_json::from_str::<ShaderLabBuiltins>(file_content)?)
    }
    pub fn default_builtins() -> Result<ShaderLabBuiltins, ShaderError> {
        Self::parse_from_json(include_str!("shaderlab-builtins.json"))
    }
    /// Every builtin type name: scalars, other types, vectors, matrices then samplers.
    pub fn builtin_types(&self) -> Vec<String> {
        let mut types = self.scalar_types.clone();
        types.extend(self.types.iter().cloned());
        for scalar in &self.scalar_types {
            types.extend((1..=4).map(|n| format!("{}{}", scalar, n)));
        }
        for scalar in &self.scalar_types {
            types.extend((1..=4).map(|n| format!("{}{}x{}", scalar, n, n)));
        }
        types.extend(self.sampler_types.iter().cloned());
        types
    }
    // Scalars that may be specialized as vectors or matrices.
    pub fn is_vector_scalar(&self, name: &str) -> bool {
        name != "void"
            && (self.scalar_types.iter().any(|t| t == name) || self.types.iter().any(|t| t == name))
    }
    pub fn find_tag_values(&self, tag: &str, in_pass: bool) -> Option<&Vec<String>> {
        if in_pass {
            self.pass_tags.get(tag)
        } else {
            self.sub_shader_tags.get(tag)
        }
    }
}

/// Split a type name like `float3` or `half4x4` into its scalar and dimensions.
pub fn parse_type_shape(name: &str) -> Option<(&str, u32, Option<u32>)> {
    fn dimension(c: char) -> Option<u32> {
        c.to_digit(10).filter(|d| (1..=4).contains(d))
    }
    let (head, columns) = match name.rsplit_once('x') {
        Some((head, columns)) if columns.chars().count() == 1 => {
            match (columns.chars().next().and_then(dimension), head.chars().last()) {
                (Some(columns), Some(last)) if last.is_ascii_digit() => (head, Some(columns)),
                _ => (name, None),
            }
        }
        _ => (name, None),
    };
    let last = head.chars().last()?;
    let rows = dimension(last)?;
    let scalar = &head[..head.len() - 1];
    if scalar.is_empty() {
        None
    } else {
        Some((scalar, rows, columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_json_ok() {
        let builtins = ShaderLabBuiltins::default_builtins().unwrap();
        assert!(builtins.sub_shader_tags.contains_key("Queue"));
        assert!(builtins.pass_tags.contains_key("LightMode"));
        assert!(builtins.render_states.contains_key("Cull"));
        let types = builtins.builtin_types();
        assert_eq!(&types[..4], &["float", "half", "int", "fixed"]);
        assert!(types.iter().any(|t| t == "float3"));
        assert!(types.iter().any(|t| t == "half4x4"));
        assert!(types.iter().any(|t| t == "samplerCUBE"));
        // No stray whitespace in vocabularies.
        for values in builtins.render_states.values() {
            assert!(values.iter().all(|value| value.trim() == value));
        }
    }

    #[test]
    fn type_shape() {
        assert_eq!(parse_type_shape("float3"), Some(("float", 3, None)));
        assert_eq!(parse_type_shape("half4x2"), Some(("half", 4, Some(2))));
        assert_eq!(parse_type_shape("fixed2x2"), Some(("fixed", 2, Some(2))));
        assert_eq!(parse_type_shape("min16float3"), Some(("min16float", 3, None)));
        assert_eq!(parse_type_shape("fixed"), None);
        assert_eq!(parse_type_shape("float5"), None);
        assert_eq!(parse_type_shape("3"), None);
        assert_eq!(parse_type_shape("matrix"), None);
    }
}
