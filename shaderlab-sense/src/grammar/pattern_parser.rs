//! Tokenizer for the pattern mini language used in [`super::GrammarPattern::patterns`].
use std::{iter::Peekable, str::Chars};

use crate::shader_error::ShaderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum PatternElement {
    Text(String),
    // Only meaningful for patterns with keep_space.
    Space,
    Reference(String),
    Scope(String),
    RegExp(String),
    Optional {
        elements: Vec<PatternElement>,
        repeat: bool,
    },
}

struct PatternParser<'a> {
    pattern: &'a str,
    chars: Peekable<Chars<'a>>,
}

pub(super) fn parse_pattern(pattern: &str) -> Result<Vec<PatternElement>, ShaderError> {
    let mut parser = PatternParser {
        pattern,
        chars: pattern.chars().peekable(),
    };
    let elements = parser.parse_sequence(false)?;
    if elements.is_empty() {
        return Err(parser.error("Empty pattern"));
    }
    Ok(elements)
}

impl<'a> PatternParser<'a> {
    fn error(&self, message: &str) -> ShaderError {
        ShaderError::GrammarError(format!("{} in pattern \"{}\"", message, self.pattern))
    }
    fn flush(word: &mut String, elements: &mut Vec<PatternElement>) {
        if !word.is_empty() {
            elements.push(PatternElement::Text(std::mem::take(word)));
        }
    }
    fn parse_sequence(&mut self, inside_optional: bool) -> Result<Vec<PatternElement>, ShaderError> {
        let mut elements = Vec::new();
        let mut word = String::new();
        loop {
            let c = match self.chars.next() {
                Some(c) => c,
                None => {
                    if inside_optional {
                        return Err(self.error("Unclosed ["));
                    }
                    Self::flush(&mut word, &mut elements);
                    return Ok(elements);
                }
            };
            match c {
                '\\' => match self.chars.next() {
                    Some(escaped) => word.push(escaped),
                    None => return Err(self.error("Dangling escape")),
                },
                ' ' | '\t' => {
                    Self::flush(&mut word, &mut elements);
                    if elements.last() != Some(&PatternElement::Space) {
                        elements.push(PatternElement::Space);
                    }
                }
                '<' => {
                    Self::flush(&mut word, &mut elements);
                    let name = self.read_until('>')?;
                    elements.push(PatternElement::Reference(name));
                }
                '{' => {
                    Self::flush(&mut word, &mut elements);
                    let name = self.read_until('}')?;
                    elements.push(PatternElement::Scope(name));
                }
                '/' => {
                    Self::flush(&mut word, &mut elements);
                    let regex = self.read_regex()?;
                    elements.push(PatternElement::RegExp(regex));
                }
                '[' => {
                    Self::flush(&mut word, &mut elements);
                    let inner = self.parse_sequence(true)?;
                    elements.push(self.optional(inner)?);
                }
                ']' => {
                    if inside_optional {
                        Self::flush(&mut word, &mut elements);
                        return Ok(elements);
                    }
                    return Err(self.error("Unexpected ]"));
                }
                '>' | '}' => return Err(self.error(&format!("Unexpected {}", c))),
                _ => word.push(c),
            }
        }
    }
    fn optional(&self, mut elements: Vec<PatternElement>) -> Result<PatternElement, ShaderError> {
        fn trim_space(elements: &mut Vec<PatternElement>) {
            while elements.last() == Some(&PatternElement::Space) {
                elements.pop();
            }
        }
        trim_space(&mut elements);
        let mut repeat = false;
        if let Some(PatternElement::Text(text)) = elements.last_mut() {
            if let Some(stripped) = text.strip_suffix("...") {
                repeat = true;
                if stripped.is_empty() {
                    elements.pop();
                } else {
                    *text = stripped.to_string();
                }
                trim_space(&mut elements);
            }
        }
        if elements.is_empty() {
            return Err(self.error("Empty optional"));
        }
        Ok(PatternElement::Optional { elements, repeat })
    }
    fn read_until(&mut self, close: char) -> Result<String, ShaderError> {
        let mut name = String::new();
        loop {
            match self.chars.next() {
                Some('\\') => match self.chars.next() {
                    Some(escaped) => name.push(escaped),
                    None => return Err(self.error("Dangling escape")),
                },
                Some(c) if c == close => break,
                Some(c) => name.push(c),
                None => return Err(self.error(&format!("Missing {}", close))),
            }
        }
        if name.is_empty() {
            Err(self.error("Empty reference"))
        } else {
            Ok(name)
        }
    }
    fn read_regex(&mut self) -> Result<String, ShaderError> {
        let mut regex = String::new();
        loop {
            match self.chars.next() {
                Some('\\') => match self.chars.next() {
                    Some('/') => regex.push('/'),
                    Some(escaped) => {
                        regex.push('\\');
                        regex.push(escaped);
                    }
                    None => return Err(self.error("Dangling escape")),
                },
                Some('/') => break,
                Some(c) => regex.push(c),
                None => return Err(self.error("Unclosed regex")),
            }
        }
        if regex.is_empty() {
            Err(self.error("Empty regex"))
        } else {
            Ok(regex)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_pattern, PatternElement};

    fn text(value: &str) -> PatternElement {
        PatternElement::Text(value.into())
    }
    fn reference(value: &str) -> PatternElement {
        PatternElement::Reference(value.into())
    }

    #[test]
    fn parse_references_and_scopes() {
        let elements = parse_pattern("Shader <name> {shader}").unwrap();
        assert_eq!(
            elements,
            vec![
                text("Shader"),
                PatternElement::Space,
                reference("name"),
                PatternElement::Space,
                PatternElement::Scope("shader".into()),
            ]
        );
    }

    #[test]
    fn parse_nested_optional() {
        let elements = parse_pattern("<typeName>[(<number>[, <number> ...])]").unwrap();
        assert_eq!(
            elements,
            vec![
                reference("typeName"),
                PatternElement::Optional {
                    elements: vec![
                        text("("),
                        reference("number"),
                        PatternElement::Optional {
                            elements: vec![text(","), PatternElement::Space, reference("number")],
                            repeat: true,
                        },
                        text(")"),
                    ],
                    repeat: false,
                }
            ]
        );
        let elements = parse_pattern("<identifier>[<accessor>...]").unwrap();
        assert_eq!(
            elements[1],
            PatternElement::Optional {
                elements: vec![reference("accessor")],
                repeat: true
            }
        );
    }

    #[test]
    fn parse_escapes_and_regex() {
        let elements = parse_pattern("\\[<expression>\\]").unwrap();
        assert_eq!(elements, vec![text("["), reference("expression"), text("]")]);
        let elements = parse_pattern("/\\[[^\\]<>]*\\]/").unwrap();
        assert_eq!(elements, vec![PatternElement::RegExp("\\[[^\\]<>]*\\]".into())]);
        let elements = parse_pattern("/a\\/b/").unwrap();
        assert_eq!(elements, vec![PatternElement::RegExp("a/b".into())]);
        let elements = parse_pattern("<property> < > <value>").unwrap();
        assert_eq!(elements[2], reference(" "));
    }

    #[test]
    fn parse_errors() {
        for pattern in ["<name", "[a", "a]", "a>", "{scope", "", "[...]", "/abc", "<>"] {
            assert!(
                parse_pattern(pattern).is_err(),
                "Pattern \"{}\" should fail to parse",
                pattern
            );
        }
    }
}
