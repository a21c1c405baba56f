pub mod builtins;
pub mod cg_parser;
pub mod cg_symbols;
pub mod symbol_parser;
pub mod symbol_provider;
pub mod symbols;

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::{
        completion::{CompletionItem, CompletionItemKind},
        document::{ShaderDocument, ShaderDocumentText},
        grammar::{match_tree::MatchNodeKind, GrammarPattern, LanguageGrammar},
        position::ShaderPosition,
        shader::ShaderLabParams,
        shader_error::ShaderError,
        shader_language::ShaderLabLanguage,
    };

    use super::{builtins::ShaderLabBuiltins, cg_symbols::CgSymbolTable, symbol_parser};

    fn create_language(params: ShaderLabParams) -> ShaderLabLanguage {
        let _ = env_logger::builder().is_test(true).try_init();
        ShaderLabLanguage::new(params).unwrap()
    }

    fn offset_after(text: &str, marker: &str) -> usize {
        text.find(marker).unwrap() + marker.len()
    }

    fn complete_at(language: &ShaderLabLanguage, text: &str, offset: usize) -> Vec<CompletionItem> {
        let document = ShaderDocumentText::new(text);
        let position = document.position_at(offset);
        language.request_completion(&document, &position).unwrap()
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|item| item.label.as_str()).collect()
    }

    fn has_item(items: &[CompletionItem], label: &str, kind: CompletionItemKind) -> bool {
        items.iter().any(|item| item.label == label && item.kind == kind)
    }

    #[test]
    fn one_line_shader() {
        let language = create_language(ShaderLabParams::default());
        let text = r#"Shader "S" { Properties { _Color ("Color", Color) = (1,1,1,1) } SubShader { Pass { CGPROGRAM ENDCG } } }"#;
        let document = ShaderDocumentText::new(text);
        let module = language.query_symbols(&document);
        let root = module.tree.node(module.tree.root());
        assert!(root.is_matched());
        assert_eq!((root.start_offset, root.end_offset), (0, text.len()));
        assert!(module.tree.iter().all(|(_, node)| !node.is_unmatched_text()));

        let shaders = module.symbols.shaders();
        assert_eq!(shaders.len(), 1);
        assert_eq!(shaders[0].name, "S");
        assert_eq!(shaders[0].properties.len(), 1);
        let property = &shaders[0].properties[0];
        assert_eq!(property.identifier, "_Color");
        assert_eq!(property.display_name, "Color");
        assert_eq!(property.ty, "Color");
        assert_eq!(property.default_value, "(1,1,1,1)");
        let sub_shader = module.symbols.sub_shader(shaders[0].sub_shaders[0]);
        assert_eq!(sub_shader.passes.len(), 1);
        assert_eq!(module.symbols.pass(sub_shader.passes[0]).cg_programs.len(), 1);
    }

    #[test]
    fn symbols_unlit_ok() {
        let language = create_language(ShaderLabParams::default());
        let file_path = Path::new("./test/unlit.shader");
        let shader_content = std::fs::read_to_string(file_path).unwrap();
        let document = ShaderDocumentText::new(shader_content);
        let module = language.query_symbols(&document);
        let tree = &module.tree;
        assert!(tree.node(tree.root()).is_matched());
        assert!(tree.iter().all(|(_, node)| !node.is_unmatched_text()));

        let symbols = &module.symbols;
        let shader = &symbols.shaders()[0];
        assert_eq!(shader.name, "Unlit/Simple");
        assert_eq!(shader.fallback.as_deref(), Some("Diffuse"));
        let identifiers = shader
            .properties
            .iter()
            .map(|property| property.identifier.as_str())
            .collect::<Vec<_>>();
        assert_eq!(identifiers, vec!["_MainTex", "_Color", "_UseFog", "_Cutoff"]);
        assert_eq!(shader.properties[0].ty, "2D");
        assert_eq!(shader.properties[0].default_value, "\"white\" {}");
        assert_eq!(shader.properties[3].ty, "Range(0, 1)");
        assert_eq!(shader.properties[3].default_value, "0.5");

        let sub_shader = symbols.sub_shader(shader.sub_shaders[0]);
        assert_eq!(sub_shader.lod.as_deref(), Some("100"));
        let tags = sub_shader
            .tags
            .iter()
            .map(|tag| (tag.tag_name.as_str(), tag.value.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(tags, vec![("RenderType", "Opaque"), ("Queue", "Geometry")]);

        let pass = symbols.pass(sub_shader.passes[0]);
        assert_eq!(pass.name.as_deref(), Some("FORWARD"));
        let states = pass
            .render_setups
            .iter()
            .map(|setup| (setup.state_name.as_str(), setup.value.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            states,
            vec![
                ("Name", "\"FORWARD\""),
                ("Cull", "Back"),
                ("ZWrite", "On"),
                ("Blend", "SrcAlpha OneMinusSrcAlpha"),
            ]
        );

        let cg = &symbols.cg;
        let global = pass.cg_programs[0];
        assert!(cg.global(global).shader.is_some());
        let appdata = cg.find_type(global, "appdata").unwrap();
        let members = cg
            .ty(appdata)
            .members
            .iter()
            .map(|member| cg.format_variable(*member))
            .collect::<Vec<_>>();
        assert_eq!(members, vec!["float4 vertex : POSITION", "float2 uv : TEXCOORD0"]);
        let globals = cg
            .context(cg.global(global).context)
            .variables
            .iter()
            .map(|variable| cg.variable(*variable).name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(globals, vec!["_MainTex", "_MainTex_ST", "_Color"]);

        let vert = cg.find_function(global, "vert").unwrap();
        assert_eq!(cg.format_function(vert), "v2f vert(appdata v)");
        let frag = cg.find_function(global, "frag").unwrap();
        assert_eq!(cg.function(frag).semantics.as_deref(), Some("SV_Target"));
        let body = cg.function(frag).body.unwrap();
        let locals = cg
            .context(body)
            .variables
            .iter()
            .map(|variable| cg.variable(*variable).name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(locals, vec!["i", "col", "index"]);
        // Parameters and globals are both visible from the body.
        assert!(cg.get_variable(body, "_Color").is_some());
        let i = cg.get_variable(body, "i").unwrap();
        assert!(!cg.is_placeholder(cg.variable(i).ty));
    }

    #[test]
    fn member_completion_ordered() {
        let language = create_language(ShaderLabParams::default());
        let text = "Shader \"S\" {
    SubShader {
        Pass {
            CGPROGRAM
            float3 worldPos;
            worldPos.
            ENDCG
        }
    }
}
";
        let items = complete_at(&language, text, offset_after(text, "worldPos."));
        assert_eq!(labels(&items), vec!["x", "y", "z"]);
        assert!(items.iter().all(|item| item.kind == CompletionItemKind::Field));
    }

    #[test]
    fn member_completion_struct() {
        let language = create_language(ShaderLabParams::default());
        let text = "Shader \"S\" {
    SubShader {
        Pass {
            CGPROGRAM
            struct v2f
            {
                float4 vertex : SV_POSITION;
                float2 uv : TEXCOORD0;
            };
            float4 frag (v2f i) : SV_Target
            {
                float2 a = i.
                float b = i.uv.
            }
            ENDCG
        }
    }
}
";
        let items = complete_at(&language, text, offset_after(text, "a = i."));
        assert_eq!(labels(&items), vec!["uv", "vertex"]);
        let items = complete_at(&language, text, offset_after(text, "i.uv."));
        assert_eq!(labels(&items), vec!["x", "y"]);
    }

    #[test]
    fn unterminated_tags() {
        let language = create_language(ShaderLabParams::default());
        let text = "Shader \"S\" {\n    SubShader {\n        Tags { \"Queue\"";
        let document = ShaderDocumentText::new(text);
        let module = language.query_symbols(&document);
        let root = module.tree.node(module.tree.root());
        assert_eq!((root.start_offset, root.end_offset), (0, text.len()));
        let grammar = language.get_grammar();
        let (_, tags) = module
            .tree
            .iter()
            .find(|(_, node)| {
                node.is_scope_match() && grammar.origin_name(node.origin) == Some("Tags")
            })
            .unwrap();
        assert_eq!(tags.kind, MatchNodeKind::Unmatched);
        assert_eq!(tags.end_offset, text.len());

        let items = complete_at(&language, text, text.len());
        assert_eq!(
            labels(&items),
            vec!["AlphaTest", "Background", "Geometry", "Overlay", "Transparent"]
        );
    }

    #[test]
    fn tags_vocabulary() {
        let language = create_language(ShaderLabParams::default());
        let text = "Shader \"S\" {
    SubShader {
        Tags { }
        Pass {
            Tags { }
        }
    }
}
";
        let sub_shader_items = complete_at(&language, text, offset_after(text, "Tags {"));
        assert!(has_item(&sub_shader_items, "Queue", CompletionItemKind::Property));
        assert!(has_item(&sub_shader_items, "RenderType", CompletionItemKind::Property));
        assert!(!has_item(&sub_shader_items, "LightMode", CompletionItemKind::Property));

        let pass_offset = text.rfind("Tags {").unwrap() + "Tags {".len();
        let pass_items = complete_at(&language, text, pass_offset);
        assert!(has_item(&pass_items, "LightMode", CompletionItemKind::Property));
        assert!(!has_item(&pass_items, "Queue", CompletionItemKind::Property));
    }

    #[test]
    fn render_block_completion() {
        let language = create_language(ShaderLabParams::default());
        let text = "Shader \"S\" {\n    SubShader {\n        \n        Pass {\n            Cull Of\n            \n        }\n    }\n}\n";
        let items = complete_at(&language, text, offset_after(text, "Cull Of"));
        assert_eq!(labels(&items), vec!["Back", "Front", "Off"]);

        let sub_shader_line = offset_after(text, "SubShader {\n        ");
        let items = complete_at(&language, text, sub_shader_line);
        assert!(has_item(&items, "Pass", CompletionItemKind::Snippet));
        assert!(has_item(&items, "LOD", CompletionItemKind::Keyword));
        assert!(has_item(&items, "ZWrite", CompletionItemKind::Property));

        let pass_line = offset_after(text, "Cull Of\n            ");
        let items = complete_at(&language, text, pass_line);
        assert!(!has_item(&items, "Pass", CompletionItemKind::Snippet));
        assert!(!has_item(&items, "LOD", CompletionItemKind::Keyword));
        assert!(has_item(&items, "Cull", CompletionItemKind::Property));
        assert!(has_item(&items, "CGPROGRAM", CompletionItemKind::Snippet));
    }

    #[test]
    fn function_completion() {
        let language = create_language(ShaderLabParams::default());
        let text = "Shader \"S\" {
    SubShader {
        Pass {
            CGPROGRAM
            void Foo(float a, float b) { }
            void Bar() { Foo( }
            ENDCG
        }
    }
}
";
        let items = complete_at(&language, text, offset_after(text, "{ Foo("));
        assert!(has_item(&items, "Foo", CompletionItemKind::Function));
        assert!(has_item(&items, "Bar", CompletionItemKind::Function));
        assert!(has_item(&items, "float4", CompletionItemKind::Struct));
        // Parameters of Foo are not visible from Bar.
        assert!(!labels(&items).contains(&"a"));
        let foo = items.iter().find(|item| item.label == "Foo").unwrap();
        assert_eq!(foo.detail.as_deref(), Some("void Foo(float a, float b)"));
    }

    #[test]
    fn garbage_line_recovery() {
        let language = create_language(ShaderLabParams::default());
        let file_path = Path::new("./test/broken.shader");
        let text = std::fs::read_to_string(file_path).unwrap();
        let document = ShaderDocumentText::new(text.as_str());
        let module = language.query_symbols(&document);
        let tree = &module.tree;
        assert!(tree.node(tree.root()).is_matched());
        let unmatched = tree
            .iter()
            .filter(|(_, node)| node.is_unmatched_text())
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        assert_eq!(unmatched.len(), 1);
        assert_eq!(tree.text(unmatched[0], &document), "@@@garbage@@@");
        assert_eq!(tree.range(unmatched[0], &document).start.line, 10);
        // Parsing resumed on the next line.
        let grammar = language.get_grammar();
        let (returned, _) = tree
            .iter()
            .find(|(_, node)| node.is_matched() && grammar.origin_name(node.origin) == Some("Return"))
            .unwrap();
        assert_eq!(tree.range(returned, &document).start.line, 11);

        let items = complete_at(&language, &text, offset_after(&text, "@@@gar"));
        assert!(has_item(&items, "return", CompletionItemKind::Keyword));
        assert!(has_item(&items, "color", CompletionItemKind::Variable));
        assert!(has_item(&items, "frag", CompletionItemKind::Function));
        assert!(has_item(&items, "float4", CompletionItemKind::Struct));
        for pair in items.windows(2) {
            assert_ne!(pair[0].label, pair[1].label);
        }
    }

    #[test]
    fn pragma_completion() {
        let language = create_language(ShaderLabParams::default());
        let text = "Shader \"S\" {
    SubShader {
        Pass {
            CGPROGRAM
            #pragma vert
            ENDCG
        }
    }
}
";
        let items = complete_at(&language, text, offset_after(text, "#pragma vert"));
        assert!(has_item(&items, "vertex", CompletionItemKind::Keyword));
        assert!(has_item(&items, "fragment", CompletionItemKind::Keyword));
    }

    #[test]
    fn keyword_completion_disabled() {
        let language = create_language(ShaderLabParams {
            keyword_completion: false,
            ..Default::default()
        });
        let text = std::fs::read_to_string("./test/broken.shader").unwrap();
        let items = complete_at(&language, &text, offset_after(&text, "@@@gar"));
        assert!(!has_item(&items, "return", CompletionItemKind::Keyword));
        assert!(has_item(&items, "color", CompletionItemKind::Variable));
    }

    #[test]
    fn invalid_position() {
        let language = create_language(ShaderLabParams::default());
        let document = ShaderDocumentText::new("Shader \"S\" { }");
        assert!(matches!(
            language.request_completion(&document, &ShaderPosition::new(0, 400)),
            Err(ShaderError::InvalidPosition(_))
        ));
    }

    #[test]
    fn depth_limit_degrades() {
        let language = create_language(ShaderLabParams {
            depth_limit: 8,
            ..Default::default()
        });
        let text = std::fs::read_to_string("./test/unlit.shader").unwrap();
        let document = ShaderDocumentText::new(text.as_str());
        let module = language.query_symbols(&document);
        let root = module.tree.node(module.tree.root());
        assert!(!root.is_matched());
        assert_eq!(root.end_offset, text.len());
        assert!(language
            .request_completion(&document, &ShaderPosition::new(21, 14))
            .is_ok());
    }

    #[test]
    fn custom_grammar_callbacks() {
        let _ = env_logger::builder().is_test(true).try_init();
        let grammar = LanguageGrammar::new("Mini").patterns(vec![GrammarPattern::new(&[
            "Shader <name>",
        ])
        .case_insensitive()
        .dictionary("name", GrammarPattern::string())
        .on_matched(symbol_parser::on_shader_match)]);
        let language = ShaderLabLanguage::with_grammar(&grammar, ShaderLabParams::default()).unwrap();
        let document = ShaderDocumentText::new("shader \"First\"\nSHADER \"Second\"");
        let module = language.query_symbols(&document);
        let names = module
            .symbols
            .shaders()
            .iter()
            .map(|shader| shader.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn lexical_scopes() {
        let builtins = ShaderLabBuiltins::default_builtins().unwrap();
        let mut cg = CgSymbolTable::default();
        let global = cg.create_global_context(&builtins);
        let outer = cg.global(global).context;
        let float = cg.get_type(global, "float");
        let float3 = cg.get_type(global, "float3");
        let value = cg.create_variable(float, "value", None);
        cg.add_variable(outer, value);
        let other = cg.create_variable(float, "other", None);
        cg.add_variable(outer, other);
        let inner = cg.create_context(outer);
        let shadow = cg.create_variable(float3, "value", None);
        cg.add_variable(inner, shadow);

        assert_eq!(cg.get_variable(inner, "value"), Some(shadow));
        assert_eq!(cg.get_variable(outer, "value"), Some(value));
        assert_eq!(cg.get_variable(inner, "other"), Some(other));
        assert_eq!(cg.get_variable(outer, "missing"), None);
        assert_eq!(cg.get_all_variables(inner), vec![shadow, other]);
        assert_eq!(cg.get_all_variables(outer), vec![value, other]);
        assert_eq!(cg.global_of_context(inner), global);
    }

    #[test]
    fn vector_types() {
        let builtins = ShaderLabBuiltins::default_builtins().unwrap();
        let mut cg = CgSymbolTable::default();
        let global = cg.create_global_context(&builtins);
        let float = cg.get_type(global, "float");
        let float2 = cg.get_type(global, "float2");
        let float3 = cg.get_type(global, "float3");
        let float4 = cg.get_type(global, "float4");
        assert!(cg.ty(float4).ordered_members);
        assert_eq!(cg.ty(float3).members.len(), 3);
        assert_eq!(cg.resolve_member(float4, "x"), Some(float));
        assert_eq!(cg.resolve_member(float4, "xy"), Some(float2));
        assert_eq!(cg.resolve_member(float4, "rgb"), Some(float3));
        assert_eq!(cg.resolve_member(float3, "w"), None);
        assert_eq!(cg.resolve_member(float4, "xg"), None);
        let matrix = cg.get_type(global, "float4x4");
        assert_eq!(cg.ty(matrix).element, Some(float4));
        // Declared once per global context.
        assert_eq!(cg.get_type(global, "float3"), float3);
        assert_eq!(cg.find_type(global, "half3x3").map(|ty| cg.ty(ty).name.clone()), Some("half3x3".into()));
    }

    #[test]
    fn placeholder_types() {
        let builtins = ShaderLabBuiltins::default_builtins().unwrap();
        let mut cg = CgSymbolTable::default();
        let global = cg.create_global_context(&builtins);
        let unknown = cg.get_type(global, "Unknown");
        assert!(cg.is_placeholder(unknown));
        assert_eq!(cg.ty(unknown).name, "Unknown?");
        assert!(cg.ty(unknown).members.is_empty());
        assert_eq!(cg.find_type(global, "Unknown"), None);
        let custom = cg.add_custom_type(global, "Light");
        assert_eq!(cg.get_type(global, "Light"), custom);
        assert!(!cg.is_placeholder(custom));
        assert_eq!(cg.resolve_member(unknown, "x"), None);
    }

    #[test]
    fn first_word_completion_in_block() {
        let language = create_language(ShaderLabParams::default());
        let text = "Shader \"S\" {
    SubShader {
        Pass {
            CGPROGRAM
            float4 frag () : SV_Target
            {
                float3 color = 1;
                col
            }
            ENDCG
        }
    }
}
";
        let items = complete_at(&language, text, offset_after(text, "= 1;\n                col"));
        assert!(has_item(&items, "color", CompletionItemKind::Variable));
        assert!(has_item(&items, "return", CompletionItemKind::Keyword));
        assert!(has_item(&items, "frag", CompletionItemKind::Function));
        assert!(has_item(&items, "float3", CompletionItemKind::Struct));

        let text = text.replace("col\n", "ret\n");
        let items = complete_at(&language, &text, offset_after(&text, "= 1;\n                ret"));
        assert!(has_item(&items, "return", CompletionItemKind::Keyword));
        assert!(has_item(&items, "color", CompletionItemKind::Variable));
    }

    #[test]
    fn first_word_completion_in_program() {
        let language = create_language(ShaderLabParams::default());
        let text = "Shader \"S\" {
    SubShader {
        Pass {
            CGPROGRAM
            float3 color;
            col
            #pragma vertex vert
            ENDCG
        }
    }
}
";
        let items = complete_at(&language, text, offset_after(text, "color;\n            col"));
        assert!(has_item(&items, "color", CompletionItemKind::Variable));
        assert!(has_item(&items, "struct", CompletionItemKind::Keyword));
        assert!(has_item(&items, "#pragma", CompletionItemKind::Keyword));
        // Statements only make sense inside functions.
        assert!(!has_item(&items, "return", CompletionItemKind::Keyword));

        let text = text.replace("col\n", "str\n");
        let items = complete_at(&language, &text, offset_after(&text, "color;\n            str"));
        assert!(has_item(&items, "struct", CompletionItemKind::Keyword));
        assert!(has_item(&items, "color", CompletionItemKind::Variable));
    }

    #[test]
    fn tag_values_after_space() {
        let language = create_language(ShaderLabParams::default());
        let text = "Shader \"S\" {\n    SubShader {\n        Tags { \"Queue\" ";
        let items = complete_at(&language, text, text.len());
        assert_eq!(
            labels(&items),
            vec!["AlphaTest", "Background", "Geometry", "Overlay", "Transparent"]
        );
    }

    #[test]
    fn include_visible_from_programs() {
        let language = create_language(ShaderLabParams::default());
        let text = "Shader \"S\" {
    CGINCLUDE
    struct Light
    {
        float3 direction;
    };
    float4 _Tint;
    float3 shade (Light light) { return light.direction; }
    ENDCG
    SubShader {
        Pass {
            CGPROGRAM
            float4 frag () : SV_Target
            {
                Light light;
                light.
            }
            ENDCG
        }
    }
}
";
        let document = ShaderDocumentText::new(text);
        let module = language.query_symbols(&document);
        let symbols = &module.symbols;
        let shader = &symbols.shaders()[0];
        assert_eq!(shader.cg_includes.len(), 1);
        let include = shader.cg_includes[0];

        let sub_shader = symbols.sub_shader(shader.sub_shaders[0]);
        let global = symbols.pass(sub_shader.passes[0]).cg_programs[0];
        let cg = &symbols.cg;
        assert_eq!(cg.find_type(global, "Light"), cg.find_type(include, "Light"));
        assert!(cg.find_type(global, "Light").is_some());
        assert!(cg.find_function(global, "shade").is_some());
        let tint = cg.get_variable(cg.global(global).context, "_Tint").unwrap();
        // Owned by the include block.
        assert_eq!(cg.variable(tint).context, Some(cg.global(include).context));

        let offset = text.rfind("light.").unwrap() + "light.".len();
        let items = complete_at(&language, text, offset);
        assert_eq!(labels(&items), vec!["direction"]);
    }

    #[test]
    fn import_global_once() {
        let builtins = ShaderLabBuiltins::default_builtins().unwrap();
        let mut cg = CgSymbolTable::default();
        let include = cg.create_global_context(&builtins);
        let light = cg.add_custom_type(include, "Light");
        let float = cg.get_type(include, "float");
        cg.add_function(include, float, "shade", None);
        let gain = cg.create_variable(float, "_Gain", None);
        let include_context = cg.global(include).context;
        cg.add_variable(include_context, gain);

        let program = cg.create_global_context(&builtins);
        let float3 = cg.get_type(program, "float3");
        cg.import_global(program, include);
        cg.import_global(program, include);
        assert_eq!(cg.find_type(program, "Light"), Some(light));
        // Built-in types of the program are kept.
        assert_eq!(cg.find_type(program, "float3"), Some(float3));
        assert_eq!(cg.global(program).functions.len(), 1);
        let context = cg.global(program).context;
        assert_eq!(cg.get_variable(context, "_Gain"), Some(gain));
        assert_eq!(cg.context(context).variables, vec![gain]);
    }
}
