//! Grammar of the Cg / HLSL code embedded in program blocks.
use crate::{
    completion::{cg as completion, shaderlab::pragma_completion},
    symbols::{
        cg_parser,
        symbol_parser::{on_cg_include_match, on_cg_program_match},
    },
};

use super::{GrammarPattern, GrammarScope, MatchedCallback};

fn statement_patterns() -> Vec<GrammarPattern> {
    [
        "if",
        "for",
        "while",
        "doWhile",
        "return",
        "jump",
        "blockStatement",
        "variableDeclaration",
        "expressionStatement",
    ]
    .iter()
    .map(|name| GrammarPattern::include(name))
    .collect()
}

fn program_patterns() -> Vec<GrammarPattern> {
    [
        "pragma",
        "include",
        "define",
        "directive",
        "cbuffer",
        "struct",
        "function",
        "variableDeclaration",
        "expressionStatement",
    ]
    .iter()
    .map(|name| GrammarPattern::include(name))
    .collect()
}

fn program_scope(begin: &str, end: &str, on_matched: MatchedCallback) -> GrammarScope {
    GrammarScope::new(begin, end)
        .name("Cg Program")
        .patterns(program_patterns())
        .on_matched(on_matched)
        .on_completion(completion::cg_program_completion)
}

pub(super) fn cg_scope_repository() -> Vec<(&'static str, GrammarScope)> {
    vec![
        ("cgProgram", program_scope("CGPROGRAM", "ENDCG", on_cg_program_match)),
        ("cgInclude", program_scope("CGINCLUDE", "ENDCG", on_cg_include_match)),
        ("hlslProgram", program_scope("HLSLPROGRAM", "ENDHLSL", on_cg_program_match)),
        ("hlslInclude", program_scope("HLSLINCLUDE", "ENDHLSL", on_cg_include_match)),
        (
            "block",
            GrammarScope::new("{", "}")
                .name("Block")
                .patterns(statement_patterns())
                .on_matched(cg_parser::on_block_match)
                .on_completion(completion::block_completion),
        ),
    ]
}

pub(super) fn cg_pattern_repository() -> Vec<(&'static str, GrammarPattern)> {
    let modifier = GrammarPattern::new(&[
        "/(?:static|inline|const|uniform|extern|volatile|shared|groupshared|precise|nointerpolation|linear|centroid|noperspective)\\b/",
    ])
    .name("Modifier");
    vec![
        (
            "pragma",
            GrammarPattern::new(&["#pragma <command>[ <argument>...]"])
                .name("Pragma")
                .keep_space()
                .dictionary(
                    "argument",
                    GrammarPattern::new(&["<string>", "<number>", "/[_a-zA-Z0-9.\\-]+/"]),
                )
                .on_completion(pragma_completion),
        ),
        (
            "include",
            GrammarPattern::new(&["#include <path>"])
                .name("Include")
                .dictionary("path", GrammarPattern::new(&["<string>", "/<[^>\\n]*>/"])),
        ),
        (
            "define",
            GrammarPattern::new(&["#define <macro>[ <value>]"])
                .name("Define")
                .keep_space()
                .dictionary("value", GrammarPattern::new(&["/\\S[^\\n]*/"])),
        ),
        (
            "directive",
            GrammarPattern::new(&[
                "/#\\s*(?:if|ifdef|ifndef|elif|else|endif|undef|error|warning|line)\\b[^\\n]*/",
            ])
            .name("Preprocessor"),
        ),
        (
            "cbuffer",
            GrammarPattern::new(&["/CBUFFER_START\\([^)\\n]*\\)/", "CBUFFER_END"]).name("Buffer"),
        ),
        (
            "struct",
            GrammarPattern::new(&["struct <name> {structBody}[;]"])
                .name("Struct")
                .cross_line()
                .scope(
                    "structBody",
                    GrammarScope::new("{", "}").name("Struct Body").patterns(vec![
                        GrammarPattern::new(&[
                            "[<modifier> ...]<type> <name>[<arraySize>][:<semantics>];",
                        ])
                        .name("Member")
                        .cross_line()
                        .dictionary("modifier", modifier.clone())
                        .on_matched(cg_parser::on_struct_member_match)
                        .on_completion(completion::declaration_completion),
                    ]),
                )
                .on_matched(cg_parser::on_struct_match),
        ),
        (
            "function",
            GrammarPattern::new(&[
                "[<modifier> ...]<type> <name>([<parameter>[, <parameter>...]])[:<semantics>] {block}",
            ])
            .name("Function")
            .cross_line()
            .dictionary("modifier", modifier.clone())
            .on_matched(cg_parser::on_function_match)
            .on_completion(completion::declaration_completion),
        ),
        (
            "parameter",
            GrammarPattern::new(&["[<qualifier>]<type> <name>[<arraySize>][:<semantics>]"])
                .name("Parameter")
                .cross_line()
                .dictionary(
                    "qualifier",
                    GrammarPattern::new(&[
                        "inout ",
                        "in ",
                        "out ",
                        "uniform ",
                        "triangle ",
                        "point ",
                        "line ",
                    ])
                    .name("Qualifier")
                    .keep_space(),
                )
                .on_matched(cg_parser::on_parameter_match)
                .on_completion(completion::declaration_completion),
        ),
        (
            "variableDeclaration",
            GrammarPattern::new(&["[<modifier> ...]<type> <declarator>[, <declarator>...];"])
                .name("Variable Declaration")
                .cross_line()
                .dictionary("modifier", modifier)
                .on_matched(cg_parser::on_variable_match)
                .on_completion(completion::declaration_completion),
        ),
        (
            "declarator",
            GrammarPattern::new(&["<name>[<arraySize>][:<semantics>][= <initializer>]"])
                .name("Declarator")
                .cross_line()
                .on_matched(cg_parser::on_declarator_match)
                .on_completion(completion::declarator_completion),
        ),
        (
            "initializer",
            GrammarPattern::new(&[
                "\\{[<initializer>[, <initializer>...]][,]\\}",
                "<expression>",
            ])
            .name("Initializer")
            .cross_line(),
        ),
        (
            "arraySize",
            GrammarPattern::new(&["\\[[<expression>]\\]"]).name("Array Size"),
        ),
        (
            "if",
            GrammarPattern::new(&["if (<expression>) <body>[ else <body>]"])
                .name("If")
                .cross_line(),
        ),
        (
            "for",
            GrammarPattern::new(&["for ([<forInit>]; [<expression>]; [<expression>]) <body>"])
                .name("For")
                .cross_line()
                .dictionary(
                    "forInit",
                    GrammarPattern::new(&["<type> <name> = <expression>", "<expression>"])
                        .name("For Init")
                        .cross_line()
                        .on_matched(cg_parser::on_for_init_match)
                        .on_completion(completion::declaration_completion),
                ),
        ),
        (
            "while",
            GrammarPattern::new(&["while (<expression>) <body>"])
                .name("While")
                .cross_line(),
        ),
        (
            "doWhile",
            GrammarPattern::new(&["do <body> while (<expression>);"])
                .name("Do While")
                .cross_line(),
        ),
        (
            "return",
            GrammarPattern::new(&["return[ <expression>];"])
                .name("Return")
                .cross_line(),
        ),
        (
            "jump",
            GrammarPattern::new(&["break ;", "continue ;", "discard ;"])
                .name("Jump")
                .cross_line(),
        ),
        (
            "blockStatement",
            GrammarPattern::new(&["{block}"]).name("Block Statement"),
        ),
        (
            "body",
            GrammarPattern::new(&["{block}", "<statement>"])
                .name("Body")
                .cross_line()
                .dictionary(
                    "statement",
                    GrammarPattern::new(&[
                        "<if>",
                        "<for>",
                        "<while>",
                        "<doWhile>",
                        "<return>",
                        "<jump>",
                        "<variableDeclaration>",
                        "<expressionStatement>",
                    ])
                    .name("Statement")
                    .cross_line(),
                ),
        ),
        (
            "expressionStatement",
            GrammarPattern::new(&["<expression>;"])
                .name("Expression Statement")
                .cross_line(),
        ),
        (
            "expression",
            GrammarPattern::new(&["<unit>[<operator> <unit>...]"])
                .name("Expression")
                .cross_line()
                .dictionary(
                    "operator",
                    GrammarPattern::new(&[
                        "/(?:<<=|>>=|&&|\\|\\||<<|>>|[-+*\\/%<>=!&|^]=|[-+*\\/%<>&|^=?:])/",
                    ])
                    .name("Operator"),
                ),
        ),
        (
            "unit",
            GrammarPattern::new(&[
                "<prefix><unit>",
                "(<type>)<unit>",
                "(<expression>)[<accessor>...][<postfix>]",
                "<callee>([<expression>[, <expression>...]])[<accessor>...][<postfix>]",
                "<number>",
                "<string>",
                "<variable>[<accessor>...][<postfix>]",
            ])
            .name("Expression Unit")
            .cross_line()
            .dictionary("prefix", GrammarPattern::new(&["/(?:\\+\\+|--|[-+!~])/"]))
            .dictionary("postfix", GrammarPattern::new(&["/(?:\\+\\+|--)/"]))
            .on_completion(completion::unit_completion),
        ),
        (
            "accessor",
            GrammarPattern::new(&[".[<member>]", "\\[<expression>\\]"])
                .name("Accessor")
                .on_completion(completion::accessor_completion),
        ),
    ]
}
