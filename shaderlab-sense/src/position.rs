use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Line / column position in a document. Columns count chars, not bytes.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, Hash)]
pub struct ShaderPosition {
    pub line: u32,
    pub pos: u32,
}

impl Ord for ShaderPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.line, &self.pos).cmp(&(&other.line, &other.pos))
    }
}

impl PartialOrd for ShaderPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ShaderPosition {
    fn eq(&self, other: &Self) -> bool {
        (&self.line, &self.pos) == (&other.line, &other.pos)
    }
}

impl Eq for ShaderPosition {}

impl ShaderPosition {
    pub fn new(line: u32, pos: u32) -> Self {
        Self { line, pos }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderRange {
    pub start: ShaderPosition,
    pub end: ShaderPosition,
}

impl ShaderRange {
    pub fn new(start: ShaderPosition, end: ShaderPosition) -> Self {
        Self { start, end }
    }
}
