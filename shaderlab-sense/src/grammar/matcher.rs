//! Run a [`CompiledGrammar`] against a document.
//!
//! Matching never fails as a whole. Patterns that do not match produce unmatched nodes, and
//! scopes recover from lines that nothing understands by wrapping them into an
//! [`MatchNodeKind::UnmatchedText`] node before resuming on the next line.
use crate::{document::ShaderDocument, position::ShaderPosition, shader::ShaderLabParams};

use super::{
    compiler::{CompiledGrammar, PatternItem, PatternItemId, SequenceElement},
    match_tree::{MatchNodeKind, MatchOrigin, MatchTree},
};

/// Owned result of a match, flattened into a [`MatchTree`] once complete.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    pub item: Option<PatternItemId>,
    pub origin: MatchOrigin,
    pub kind: MatchNodeKind,
    pub start_offset: usize,
    pub end_offset: usize,
    pub pattern_name: Option<String>,
    pub children: Vec<PatternMatch>,
}

impl PatternMatch {
    fn leaf(item: PatternItemId, kind: MatchNodeKind, start_offset: usize, end_offset: usize) -> Self {
        Self {
            item: Some(item),
            origin: MatchOrigin::Item,
            kind,
            start_offset,
            end_offset,
            pattern_name: None,
            children: Vec::new(),
        }
    }
    // Unmatched nodes start where the attempt was made, matched ones at their first child.
    fn from_children(
        item: Option<PatternItemId>,
        kind: MatchNodeKind,
        offset: usize,
        children: Vec<PatternMatch>,
    ) -> Self {
        let start_offset = match (kind, children.first()) {
            (MatchNodeKind::Matched, Some(first)) => first.start_offset,
            _ => offset,
        };
        let end_offset = children
            .iter()
            .map(|child| child.end_offset)
            .max()
            .unwrap_or(offset)
            .max(start_offset);
        Self {
            item,
            origin: MatchOrigin::Item,
            kind,
            start_offset,
            end_offset,
            pattern_name: None,
            children,
        }
    }
    fn with_origin(mut self, origin: MatchOrigin) -> Self {
        self.origin = origin;
        self
    }
    pub fn is_matched(&self) -> bool {
        self.kind == MatchNodeKind::Matched
    }
}

pub struct Matcher<'a> {
    grammar: &'a CompiledGrammar,
    document: &'a dyn ShaderDocument,
    text: &'a str,
    depth: u32,
    depth_limit: u32,
}

impl<'a> Matcher<'a> {
    pub fn new(
        grammar: &'a CompiledGrammar,
        document: &'a dyn ShaderDocument,
        params: &ShaderLabParams,
    ) -> Self {
        Self {
            grammar,
            document,
            text: document.get_text(),
            depth: 0,
            depth_limit: params.depth_limit,
        }
    }
    pub fn match_document(&mut self) -> MatchTree {
        let root = self.match_item(self.grammar.root(), 0);
        MatchTree::new(root)
    }
    pub fn match_item(&mut self, id: PatternItemId, offset: usize) -> PatternMatch {
        if offset > self.text.len() || !self.text.is_char_boundary(offset) {
            log::error!("Trying to match {:?} at invalid offset {}", id, offset);
            let offset = offset.min(self.text.len());
            return PatternMatch::leaf(id, MatchNodeKind::Unmatched, offset, offset);
        }
        if self.depth >= self.depth_limit {
            log::warn!(
                "Reached depth limit of {} while matching at {:?}",
                self.depth_limit,
                self.document.position_at(offset)
            );
            return PatternMatch::leaf(id, MatchNodeKind::Unmatched, offset, offset);
        }
        self.depth += 1;
        let grammar = self.grammar;
        let result = match grammar.item(id) {
            PatternItem::Empty { cross_line } => self.match_empty(id, offset, *cross_line),
            PatternItem::Text {
                regex, cross_line, ..
            }
            | PatternItem::RegExp {
                regex, cross_line, ..
            } => self.match_leaf(id, regex, offset, *cross_line),
            PatternItem::Ordered { elements } => self.match_ordered(id, elements, offset),
            PatternItem::Alternation {
                pattern,
                alternatives,
            } => self
                .match_alternation(id, alternatives, offset)
                .with_origin(MatchOrigin::Pattern(*pattern)),
            PatternItem::Named { name, inner } => {
                let mut result = self.match_item(*inner, offset);
                result.pattern_name = Some(name.clone());
                result
            }
            PatternItem::Scope {
                scope,
                begin,
                end,
                body,
            } => self
                .match_scope(id, *begin, *end, body, offset)
                .with_origin(MatchOrigin::Scope(*scope)),
            PatternItem::Grammar { body } => self
                .match_grammar(id, body, offset)
                .with_origin(MatchOrigin::Grammar),
        };
        self.depth -= 1;
        result
    }
    fn skip_space(&self, offset: usize, cross_line: bool) -> usize {
        offset + self.grammar.skip_space(&self.text[offset..], cross_line)
    }
    // Failed leaves cover the whitespace on their line so the cursor may sit in them.
    fn unmatched_leaf(&self, id: PatternItemId, offset: usize) -> PatternMatch {
        let end = self.skip_space(offset, false);
        PatternMatch::leaf(id, MatchNodeKind::Unmatched, offset, end)
    }
    fn match_empty(&self, id: PatternItemId, offset: usize, cross_line: bool) -> PatternMatch {
        let end = self.skip_space(offset, cross_line);
        if end > offset {
            PatternMatch::leaf(id, MatchNodeKind::Matched, offset, end)
        } else {
            PatternMatch::leaf(id, MatchNodeKind::Unmatched, offset, offset)
        }
    }
    fn match_leaf(
        &self,
        id: PatternItemId,
        regex: &regex::Regex,
        offset: usize,
        cross_line: bool,
    ) -> PatternMatch {
        let start = self.skip_space(offset, cross_line);
        match regex.find(&self.text[start..]) {
            Some(found) if found.start() == 0 => {
                PatternMatch::leaf(id, MatchNodeKind::Matched, start, start + found.end())
            }
            _ => self.unmatched_leaf(id, offset),
        }
    }
    fn match_ordered(
        &mut self,
        id: PatternItemId,
        elements: &[SequenceElement],
        offset: usize,
    ) -> PatternMatch {
        let mut children = Vec::new();
        let mut cursor = offset;
        let mut index = 0;
        while index < elements.len() {
            let element = elements[index];
            let result = self.match_item(element.item, cursor);
            if !result.is_matched() {
                if element.optional {
                    index += 1;
                    continue;
                }
                children.push(result);
                return PatternMatch::from_children(
                    Some(id),
                    MatchNodeKind::Unmatched,
                    offset,
                    children,
                );
            }
            let advanced = result.end_offset > cursor;
            cursor = result.end_offset;
            children.push(result);
            // Repeat in place while it makes progress.
            if !(element.repeat && advanced) {
                index += 1;
            }
        }
        if children.is_empty() {
            PatternMatch::leaf(id, MatchNodeKind::Unmatched, offset, offset)
        } else {
            PatternMatch::from_children(Some(id), MatchNodeKind::Matched, offset, children)
        }
    }
    fn match_alternation(
        &mut self,
        id: PatternItemId,
        alternatives: &[PatternItemId],
        offset: usize,
    ) -> PatternMatch {
        let mut attempts = Vec::with_capacity(alternatives.len());
        for alternative in alternatives {
            let result = self.match_item(*alternative, offset);
            if result.is_matched() {
                return PatternMatch::from_children(
                    Some(id),
                    MatchNodeKind::Matched,
                    offset,
                    vec![result],
                );
            }
            attempts.push(result);
        }
        PatternMatch::from_children(Some(id), MatchNodeKind::UnmatchedPattern, offset, attempts)
    }
    // First body pattern making progress at offset, or every failed attempt.
    fn match_body(
        &mut self,
        body: &[PatternItemId],
        offset: usize,
    ) -> Result<PatternMatch, Vec<PatternMatch>> {
        let mut attempts = Vec::with_capacity(body.len());
        for pattern in body {
            let result = self.match_item(*pattern, offset);
            if result.is_matched() && result.end_offset > offset {
                return Ok(result);
            }
            attempts.push(result);
        }
        Err(attempts)
    }
    fn line_end(&self, line: u32) -> usize {
        match self.document.line_at(line) {
            Some(text) => self
                .document
                .offset_at(&ShaderPosition::new(line, text.text.chars().count() as u32))
                .unwrap_or(self.text.len()),
            None => self.text.len(),
        }
    }
    // Wrap the rest of the line (and whatever the attempts consumed) into an unmatched text.
    // Returns the offset of the next line, if any.
    fn recover_line(
        &self,
        cursor: usize,
        attempts: Vec<PatternMatch>,
    ) -> (PatternMatch, Option<usize>) {
        let furthest = attempts
            .iter()
            .map(|attempt| attempt.end_offset)
            .max()
            .unwrap_or(cursor)
            .max(cursor);
        let line = self.document.position_at(furthest).line;
        let end = self.line_end(line).max(furthest);
        let next = if (line as usize + 1) < self.document.line_count() {
            self.document
                .offset_at(&ShaderPosition::new(line + 1, 0))
                .ok()
                .filter(|next| *next > cursor)
        } else {
            None
        };
        let mut text = PatternMatch::from_children(None, MatchNodeKind::UnmatchedText, cursor, attempts);
        text.end_offset = end;
        (text, next)
    }
    fn match_scope(
        &mut self,
        id: PatternItemId,
        begin: PatternItemId,
        end: PatternItemId,
        body: &[PatternItemId],
        offset: usize,
    ) -> PatternMatch {
        let mut cursor = self.skip_space(offset, true);
        let begin = self.match_item(begin, cursor);
        if !begin.is_matched() {
            return PatternMatch::from_children(
                Some(id),
                MatchNodeKind::Unmatched,
                offset,
                vec![begin],
            );
        }
        cursor = begin.end_offset;
        let mut children = vec![begin];
        loop {
            cursor = self.skip_space(cursor, true);
            let attempts = match self.match_body(body, cursor) {
                Ok(result) => {
                    cursor = result.end_offset;
                    children.push(result);
                    continue;
                }
                Err(attempts) => attempts,
            };
            let end = self.match_item(end, cursor);
            if end.is_matched() {
                children.push(end);
                return PatternMatch::from_children(
                    Some(id),
                    MatchNodeKind::Matched,
                    offset,
                    children,
                );
            }
            let (text, next) = self.recover_line(cursor, attempts);
            children.push(text);
            match next {
                Some(next) => cursor = next,
                None => {
                    log::debug!(
                        "Scope at {:?} is not terminated",
                        self.document.position_at(offset)
                    );
                    // Still report what was matched inside it. Starts where it was tried, like
                    // its sibling attempts.
                    return PatternMatch::from_children(
                        Some(id),
                        MatchNodeKind::Unmatched,
                        offset,
                        children,
                    );
                }
            }
        }
    }
    fn match_grammar(&mut self, id: PatternItemId, body: &[PatternItemId], offset: usize) -> PatternMatch {
        let mut children = Vec::new();
        let mut cursor = offset;
        let mut recovered = false;
        loop {
            cursor = self.skip_space(cursor, true);
            if cursor >= self.text.len() {
                break;
            }
            match self.match_body(body, cursor) {
                Ok(result) => {
                    cursor = result.end_offset;
                    children.push(result);
                }
                Err(attempts) => {
                    recovered = true;
                    let (text, next) = self.recover_line(cursor, attempts);
                    children.push(text);
                    match next {
                        Some(next) => cursor = next,
                        None => break,
                    }
                }
            }
        }
        let kind = if recovered {
            MatchNodeKind::Unmatched
        } else {
            MatchNodeKind::Matched
        };
        let mut result = PatternMatch::from_children(Some(id), kind, offset, children);
        // The root always spans the whole document.
        result.start_offset = offset;
        result.end_offset = self.text.len();
        result
    }
}
