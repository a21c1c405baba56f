//! Grammar of ShaderLab files.
use crate::{
    completion::shaderlab as completion,
    symbols::symbol_parser,
};

use super::{
    cg::{cg_pattern_repository, cg_scope_repository},
    GrammarPattern, GrammarScope, LanguageGrammar,
};

fn includes(names: &[&str]) -> Vec<GrammarPattern> {
    names.iter().map(|name| GrammarPattern::include(name)).collect()
}

fn shaderlab_pattern_repository() -> Vec<(&'static str, GrammarPattern)> {
    vec![
        (
            "properties",
            GrammarPattern::new(&["Properties {properties}"])
                .name("Properties")
                .case_insensitive()
                .cross_line()
                .scope(
                    "properties",
                    GrammarScope::new("{", "}")
                        .name("Properties")
                        .patterns(includes(&["property"])),
                ),
        ),
        (
            "property",
            GrammarPattern::new(&[
                "[<attribute>...]<identifier> (<displayName>, <propType>) = <defaultValue>",
            ])
            .name("Property")
            .dictionary(
                "attribute",
                GrammarPattern::new(&["/\\[[^\\]\\n]*\\]/"]).name("Attribute"),
            )
            .dictionary("displayName", GrammarPattern::string())
            .dictionary(
                "propType",
                GrammarPattern::new(&["<typeName>[(<number>[, <number>...])]"])
                    .name("Property Type")
                    .dictionary("typeName", GrammarPattern::new(&["/[_a-zA-Z0-9]+/"])),
            )
            .dictionary(
                "defaultValue",
                GrammarPattern::new(&[
                    "<number>",
                    "<string>[ \\{[<textureOption>...]\\}]",
                    "(<number>[, <number>...])",
                ])
                .name("Default Value"),
            )
            .on_matched(symbol_parser::on_property_match)
            .on_completion(completion::property_completion),
        ),
        (
            "fallback",
            GrammarPattern::new(&["Fallback <name>"])
                .name("Fallback")
                .case_insensitive()
                .dictionary("name", GrammarPattern::new(&["<string>", "Off"]).case_insensitive())
                .on_matched(symbol_parser::on_fallback_match),
        ),
        (
            "customEditor",
            GrammarPattern::new(&["CustomEditor <name>"])
                .name("Custom Editor")
                .case_insensitive()
                .dictionary("name", GrammarPattern::string())
                .on_matched(symbol_parser::on_custom_editor_match),
        ),
        (
            "subShader",
            GrammarPattern::new(&["SubShader {subShader}"])
                .name("SubShader")
                .case_insensitive()
                .cross_line()
                .scope(
                    "subShader",
                    GrammarScope::new("{", "}")
                        .name("SubShader")
                        .patterns(includes(&[
                            "tags",
                            "lod",
                            "pass",
                            "usePass",
                            "grabPass",
                            "stencil",
                            "cgProgram",
                            "renderSetup",
                        ]))
                        .on_matched(symbol_parser::on_sub_shader_match)
                        .on_completion(completion::render_block_completion),
                ),
        ),
        (
            "pass",
            GrammarPattern::new(&["Pass {pass}"])
                .name("Pass")
                .case_insensitive()
                .cross_line()
                .scope(
                    "pass",
                    GrammarScope::new("{", "}")
                        .name("Pass")
                        .patterns(includes(&["tags", "stencil", "cgProgram", "renderSetup"]))
                        .on_matched(symbol_parser::on_pass_match)
                        .on_completion(completion::render_block_completion),
                ),
        ),
        (
            "usePass",
            GrammarPattern::new(&["UsePass <string>"])
                .name("UsePass")
                .case_insensitive(),
        ),
        (
            "grabPass",
            GrammarPattern::new(&["GrabPass \\{[<string>]\\}"])
                .name("GrabPass")
                .case_insensitive()
                .cross_line(),
        ),
        (
            "tags",
            GrammarPattern::new(&["Tags {tags}"])
                .name("Tags")
                .case_insensitive()
                .cross_line()
                .scope(
                    "tags",
                    GrammarScope::new("{", "}")
                        .name("Tags")
                        .patterns(vec![GrammarPattern::new(&["<tag> = <value>"])
                            .name("Tag")
                            .dictionary("tag", GrammarPattern::string())
                            .dictionary("value", GrammarPattern::string())
                            .on_matched(symbol_parser::on_tag_match)
                            .on_completion(completion::tag_completion)])
                        .on_completion(completion::tags_scope_completion),
                ),
        ),
        (
            "lod",
            GrammarPattern::new(&["LOD <value>"])
                .name("LOD")
                .case_insensitive()
                .dictionary("value", GrammarPattern::number())
                .on_matched(symbol_parser::on_lod_match),
        ),
        (
            "stencil",
            GrammarPattern::new(&["Stencil {stencil}"])
                .name("Stencil")
                .case_insensitive()
                .cross_line()
                .scope(
                    "stencil",
                    GrammarScope::new("{", "}")
                        .name("Stencil")
                        .patterns(vec![GrammarPattern::new(&["<operation> < ><value>"])
                            .name("Stencil Operation")
                            .dictionary(
                                "value",
                                GrammarPattern::new(&["<identifier>", "<number>", "\\[<identifier>\\]"]),
                            )]),
                ),
        ),
        (
            "renderSetup",
            GrammarPattern::new(&["<state> < ><value>[[,] <value>...]"])
                .name("Render Setup")
                .dictionary(
                    "value",
                    GrammarPattern::new(&[
                        "<identifier>",
                        "<number>",
                        "<string>",
                        "\\[<identifier>\\]",
                    ]),
                )
                .on_matched(symbol_parser::on_render_setup_match)
                .on_completion(completion::render_setup_completion),
        ),
        (
            "cgProgram",
            GrammarPattern::new(&["{cgProgram}", "{hlslProgram}", "{cgInclude}", "{hlslInclude}"])
                .name("Program"),
        ),
    ]
}

/// The ShaderLab grammar, with Cg / HLSL programs embedded.
pub fn shaderlab_grammar() -> LanguageGrammar {
    let shader = GrammarPattern::new(&["Shader <name> {shader}"])
        .name("Shader")
        .case_insensitive()
        .cross_line()
        .dictionary("name", GrammarPattern::string())
        .scope(
            "shader",
            GrammarScope::new("{", "}")
                .name("Shader")
                .patterns(includes(&[
                    "properties",
                    "subShader",
                    "fallback",
                    "customEditor",
                    "cgProgram",
                ]))
                .on_completion(completion::shader_scope_completion),
        )
        .on_matched(symbol_parser::on_shader_match);
    let mut grammar = LanguageGrammar::new("ShaderLab").patterns(vec![shader]);
    for (key, pattern) in shaderlab_pattern_repository()
        .into_iter()
        .chain(cg_pattern_repository())
    {
        grammar = grammar.pattern_repository(key, pattern);
    }
    for (key, scope) in cg_scope_repository() {
        grammar = grammar.scope_repository(key, scope);
    }
    grammar
}
