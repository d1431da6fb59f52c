pub mod engine;
pub mod keywords;
pub mod tokenizer;

pub use engine::{IndentEngine, IndentState};
pub use keywords::{lookup, KeywordInfo};
pub use tokenizer::{tokenize_line, LexicalMode, Token};
