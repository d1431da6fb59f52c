use super::keywords::{is_soft_closable, lookup, KeywordInfo};
use super::tokenizer::{tokenize_line, LexicalMode, Token};
use crate::util::clamp_to_char_boundary_left;

/// Carry state between lines: the stack of unclosed block openers plus the
/// tokenizer's lexical mode. Stack depth equals the nesting depth of unclosed
/// blocks seen so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndentState {
    stack: Vec<&'static str>,
    mode: LexicalMode,
    mismatches: u32,
}

impl IndentState {
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty() && self.mode == LexicalMode::Code
    }

    /// Closers seen so far whose pairing did not match the open block. The
    /// engine degrades through these; callers may surface the count.
    pub fn mismatches(&self) -> u32 {
        self.mismatches
    }
}

/// Recomputes leading whitespace from the keyword-pairing grammar, one line
/// or a whole buffer at a time.
#[derive(Debug, Clone)]
pub struct IndentEngine {
    unit: usize,
}

impl IndentEngine {
    pub fn new(unit: usize) -> Self {
        Self { unit: unit.max(1) }
    }

    /// Reformat the whole buffer: every line resets to column zero, then the
    /// pass rebuilds indentation from an empty stack. Idempotent.
    pub fn reindent_buffer(&self, text: &str) -> String {
        let mut state = IndentState::default();
        let lines: Vec<String> = text
            .split('\n')
            .map(|line| self.reindent_line(line, &mut state))
            .collect();
        lines.join("\n")
    }

    /// Re-derive one line's leading whitespace, advancing `state` past the
    /// line. Blank lines come back empty; a line that begins inside a string
    /// literal is user data and is returned untouched.
    pub fn reindent_line(&self, line: &str, state: &mut IndentState) -> String {
        if state.mode == LexicalMode::Str {
            advance_line(line, state);
            return line.to_string();
        }

        let stripped = line.trim_start();
        let depth = apply_line(stripped, state);
        if stripped.is_empty() {
            return String::new();
        }
        let mut out = " ".repeat(self.unit * depth);
        out.push_str(stripped);
        out
    }

    /// The carry state at the start of the line containing `offset`. Used by
    /// the live-typing path; callers cache the result per line start so a
    /// keystroke does not re-tokenize the whole document.
    pub fn state_at(&self, text: &str, offset: usize) -> IndentState {
        let offset = clamp_to_char_boundary_left(text, offset);
        let line_start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let mut state = IndentState::default();
        for line in text[..line_start].split('\n') {
            advance_line(line, &mut state);
        }
        state
    }

    /// Manual override: strip exactly one leading space or tab.
    pub fn unindent_once(line: &str) -> &str {
        line.strip_prefix(' ')
            .or_else(|| line.strip_prefix('\t'))
            .unwrap_or(line)
    }
}

/// Walk a line's tokens, mutating the stack, and return the depth the line
/// itself should sit at: measured after the first token's pops (a leading
/// closer aligns with its opener) and before any push that first token makes
/// (an opener's own line stays put; `else` reopens for the lines below it).
fn apply_line(stripped: &str, state: &mut IndentState) -> usize {
    let mut mode = state.mode;
    let tokens = tokenize_line(stripped, &mut mode);
    let mut line_depth = None;

    for token in tokens {
        match token {
            Token::Word(word) => match lookup(word) {
                Some(info) => {
                    if info.closes {
                        pop_matching(state, info);
                    }
                    if line_depth.is_none() {
                        line_depth = Some(state.stack.len());
                    }
                    if info.opens {
                        state.stack.push(info.word);
                    }
                }
                None => {
                    if line_depth.is_none() {
                        line_depth = Some(state.stack.len());
                    }
                }
            },
            Token::Terminator => {
                // Top-level statement boundary: everything still open is
                // abandoned, mirroring how the toplevel resynchronizes.
                state.stack.clear();
                if line_depth.is_none() {
                    line_depth = Some(0);
                }
            }
        }
    }

    state.mode = mode;
    line_depth.unwrap_or(state.stack.len())
}

fn advance_line(line: &str, state: &mut IndentState) {
    apply_line(line, state);
}

/// Pop for a closer. Soft openers (`then`, `else`, `with`) end implicitly,
/// so the closer pops through them to its real partner. Anything else that
/// fails to pair is an inconsistency in the source: record it and treat the
/// block as closed anyway. An empty stack makes the closer a counted no-op.
fn pop_matching(state: &mut IndentState, closer: &KeywordInfo) {
    while let Some(top) = state.stack.last() {
        if closer.pairs_with.contains(top) {
            state.stack.pop();
            return;
        }
        if is_soft_closable(top) {
            state.stack.pop();
            continue;
        }
        state.mismatches += 1;
        state.stack.pop();
        return;
    }
    state.mismatches += 1;
}
