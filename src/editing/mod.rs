pub mod filters;
pub mod segment;

pub use filters::{collapse_blank_lines, strip_comments};
pub use segment::{segment, Segment, STATEMENT_TERMINATOR};

/// The transforms every submission goes through before reaching the toplevel:
/// comments out, blank runs squeezed, exactly one trailing newline so the
/// statement terminator is flushed.
pub fn prepare_submission(text: &str) -> String {
    collapse_blank_lines(&strip_comments(text), true)
}
