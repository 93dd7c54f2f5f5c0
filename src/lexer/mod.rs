//! The lexer-generation half: regex compilation, Thompson NFAs, subset
//! construction, minimization, and the longest-match scanner.

pub mod dfa;
pub mod nfa;
pub mod regex;
pub mod tokenizer;

pub use self::regex::RegexError;
pub use self::tokenizer::{LexicalRule, Token, TokenType, Tokenizer};
