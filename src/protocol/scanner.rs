use aho_corasick::{AhoCorasick, MatchKind};

pub const COMMAND_START: &str = "--LemonCamlCommand--";
pub const COMMAND_END: &str = "--EndLemonCamlCommand--";
pub const TREE_START: &str = "--LemonTree--";
pub const TREE_END: &str = "--EndLemonTree--";

/// One classified span of the toplevel's stdout stream, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    PlainText(String),
    CommandBlock(String),
    TreeBlock(String),
    UnterminatedCommandBlock,
    UnterminatedTreeBlock,
}

/// Splits the toplevel's stdout into plain text and tag-delimited protocol
/// blocks. Chunks may split anywhere, including inside a tag or a block body:
/// the scanner buffers the undecidable tail and re-examines it on the next
/// `process` call. Frames already returned are never re-emitted.
///
/// Both tag families are matched in one left-to-right pass; whichever start
/// tag occurs first in the stream wins, so plain text keeps document order
/// even when command and tree blocks are interleaved in a single chunk.
///
/// A start tag whose end tag has not arrived yet is held back entirely. Only
/// `finish`, called when the stream ends, declares it unterminated, skips
/// the start marker, and rescans the rest as plain text.
pub struct FrameScanner {
    buffer: String,
    starts: AhoCorasick,
}

impl Default for FrameScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScanner {
    pub fn new() -> Self {
        let starts = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostFirst)
            .build([COMMAND_START, TREE_START])
            .expect("protocol start tags are valid patterns");
        Self {
            buffer: String::new(),
            starts,
        }
    }

    pub fn process(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
        self.drain(false)
    }

    /// Flush the buffer at stream end, resolving any pending block as
    /// unterminated.
    pub fn finish(&mut self) -> Vec<Frame> {
        self.drain(true)
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    fn drain(&mut self, at_end: bool) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut pos = 0;

        loop {
            let Some(found) = self.starts.find(&self.buffer[pos..]) else {
                let rest = &self.buffer[pos..];
                let hold = if at_end {
                    0
                } else {
                    partial_start_tag_len(rest)
                };
                let safe = rest.len() - hold;
                if safe > 0 {
                    frames.push(Frame::PlainText(rest[..safe].to_string()));
                    pos += safe;
                }
                break;
            };

            let tag_at = pos + found.start();
            if tag_at > pos {
                frames.push(Frame::PlainText(self.buffer[pos..tag_at].to_string()));
            }

            let is_command = found.pattern().as_usize() == 0;
            let (start_len, end_tag) = if is_command {
                (COMMAND_START.len(), COMMAND_END)
            } else {
                (TREE_START.len(), TREE_END)
            };
            let body_from = tag_at + start_len;

            if body_from > self.buffer.len() {
                // The match itself cannot extend past the buffer, so this arm
                // is unreachable; kept as a plain guard against slicing past
                // the end below.
                pos = tag_at;
                break;
            }

            match self.buffer[body_from..].find(end_tag) {
                Some(rel) => {
                    let body = self.buffer[body_from..body_from + rel].to_string();
                    frames.push(if is_command {
                        Frame::CommandBlock(body)
                    } else {
                        Frame::TreeBlock(body)
                    });
                    pos = body_from + rel + end_tag.len();
                }
                None if at_end => {
                    frames.push(if is_command {
                        Frame::UnterminatedCommandBlock
                    } else {
                        Frame::UnterminatedTreeBlock
                    });
                    // Skip the marker; the tail rescans as ordinary input.
                    pos = body_from;
                }
                None => {
                    // End tag not in the buffer yet: hold the whole region.
                    pos = tag_at;
                    break;
                }
            }
        }

        if pos > 0 {
            self.buffer.drain(..pos);
        }
        frames
    }
}

/// Length of the longest suffix of `text` that is a proper prefix of either
/// start tag. That many bytes must stay buffered: the next chunk may complete
/// the tag.
fn partial_start_tag_len(text: &str) -> usize {
    let mut longest = 0;
    for tag in [COMMAND_START, TREE_START] {
        let max = tag.len().saturating_sub(1).min(text.len());
        for n in (longest + 1..=max).rev() {
            if text.ends_with(&tag[..n]) {
                longest = n;
                break;
            }
        }
    }
    longest
}
