//! Read-only access to the text being matched.
//!
//! The engine only relies on the [`ShaderDocument`] trait. Editors are expected to implement it
//! over their own buffers; [`ShaderDocumentText`] is a plain owned implementation.
use crate::{
    position::{ShaderPosition, ShaderRange},
    shader_error::ShaderError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderLine<'a> {
    // Line content without its line terminator.
    pub text: &'a str,
    pub leading_whitespace: usize,
}

pub trait ShaderDocument {
    fn get_text(&self) -> &str;
    fn get_text_range(&self, range: &ShaderRange) -> Result<&str, ShaderError>;
    // Offset is clamped to the document.
    fn position_at(&self, offset: usize) -> ShaderPosition;
    fn offset_at(&self, position: &ShaderPosition) -> Result<usize, ShaderError>;
    fn line_at(&self, line: u32) -> Option<ShaderLine<'_>>;
    fn line_count(&self) -> usize;
}

#[derive(Debug, Clone, Default)]
pub struct ShaderDocumentText {
    content: String,
    line_starts: Vec<usize>,
}

impl ShaderDocumentText {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            content
                .char_indices()
                .filter(|(_, c)| *c == '\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            content,
            line_starts,
        }
    }
    fn line_bounds(&self, line: usize) -> Option<(usize, usize)> {
        let start = *self.line_starts.get(line)?;
        let end = match self.line_starts.get(line + 1) {
            Some(next) => next - 1, // Skip '\n'
            None => self.content.len(),
        };
        // Handle CRLF.
        let end = if end > start && self.content.as_bytes()[end - 1] == b'\r' {
            end - 1
        } else {
            end
        };
        Some((start, end))
    }
}

impl ShaderDocument for ShaderDocumentText {
    fn get_text(&self) -> &str {
        &self.content
    }
    fn get_text_range(&self, range: &ShaderRange) -> Result<&str, ShaderError> {
        let start = self.offset_at(&range.start)?;
        let end = self.offset_at(&range.end)?;
        if start > end {
            return Err(ShaderError::InvalidPosition(format!(
                "Range start {:?} is after range end {:?}",
                range.start, range.end
            )));
        }
        Ok(&self.content[start..end])
    }
    fn position_at(&self, offset: usize) -> ShaderPosition {
        let mut offset = std::cmp::min(offset, self.content.len());
        while !self.content.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = self.line_starts.partition_point(|start| *start <= offset) - 1;
        let line_start = self.line_starts[line];
        ShaderPosition {
            line: line as u32,
            pos: self.content[line_start..offset].chars().count() as u32,
        }
    }
    fn offset_at(&self, position: &ShaderPosition) -> Result<usize, ShaderError> {
        match self.line_bounds(position.line as usize) {
            Some((line_start, line_end)) => {
                let line = &self.content[line_start..line_end];
                match line.char_indices().nth(position.pos as usize) {
                    Some((byte_offset, _)) => Ok(line_start + byte_offset),
                    None => {
                        if position.pos as usize == line.chars().count() {
                            Ok(line_end)
                        } else {
                            Err(ShaderError::InvalidPosition(format!(
                                "Position {}:{} is not in range of line",
                                position.line, position.pos
                            )))
                        }
                    }
                }
            }
            // Line is out of bounds, assume its at the end.
            None => Ok(self.content.len()),
        }
    }
    fn line_at(&self, line: u32) -> Option<ShaderLine<'_>> {
        let (start, end) = self.line_bounds(line as usize)?;
        let text = &self.content[start..end];
        let leading_whitespace = text
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .count();
        Some(ShaderLine {
            text,
            leading_whitespace,
        })
    }
    fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_offset_conversion() {
        let document = ShaderDocumentText::new("Shader \"A\"\r\n{\n\té}\n");
        assert_eq!(document.line_count(), 4);
        assert_eq!(document.position_at(0), ShaderPosition::new(0, 0));
        assert_eq!(document.position_at(12), ShaderPosition::new(1, 0));
        // 'é' is two bytes long, column counts chars.
        let offset = document.offset_at(&ShaderPosition::new(2, 2)).unwrap();
        assert_eq!(&document.get_text()[offset..], "}\n");
        assert_eq!(document.position_at(offset), ShaderPosition::new(2, 2));
        // Middle of a char clamps back to its start.
        assert_eq!(document.position_at(offset - 1), ShaderPosition::new(2, 1));
        // Line past the end clamps to the end.
        assert_eq!(
            document.offset_at(&ShaderPosition::new(12, 0)).unwrap(),
            document.get_text().len()
        );
        assert!(document.offset_at(&ShaderPosition::new(0, 40)).is_err());
    }

    #[test]
    fn line_access() {
        let document = ShaderDocumentText::new("a\r\n    Pass {\n}");
        let line = document.line_at(1).unwrap();
        assert_eq!(line.text, "    Pass {");
        assert_eq!(line.leading_whitespace, 4);
        assert_eq!(document.line_at(0).unwrap().text, "a");
        assert_eq!(document.line_at(2).unwrap().text, "}");
        assert!(document.line_at(3).is_none());
        let text = document
            .get_text_range(&ShaderRange::new(
                ShaderPosition::new(1, 4),
                ShaderPosition::new(1, 8),
            ))
            .unwrap();
        assert_eq!(text, "Pass");
    }
}
