//! Longest-match tokenization over a combined rule DFA.

use super::dfa::{AcceptInfo, CompiledRule, Dfa};
use super::nfa::Nfa;

/// Token categories produced by the scanner.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenType {
    Identifier,
    Number,
    String,
    Keyword,
    Operator,
    Delimiter,
    Whitespace,
    Comment,
    Eof,
    Unknown,
}

/// A pattern/token pairing. Lower `priority` values win equal-length
/// matches; `ignore` rules consume input without emitting tokens.
#[derive(Debug, Clone)]
pub struct LexicalRule {
    pub pattern: String,
    pub token: TokenType,
    pub priority: i32,
    pub ignore: bool,
}

impl LexicalRule {
    pub fn new(pattern: impl Into<String>, token: TokenType) -> Self {
        Self::with_priority(pattern, token, 0)
    }

    pub fn with_priority(pattern: impl Into<String>, token: TokenType, priority: i32) -> Self {
        Self {
            pattern: pattern.into(),
            token,
            priority,
            ignore: false,
        }
    }

    /// A rule whose matches are consumed but never emitted (whitespace,
    /// comments).
    pub fn ignored(pattern: impl Into<String>, token: TokenType, priority: i32) -> Self {
        Self {
            pattern: pattern.into(),
            token,
            priority,
            ignore: true,
        }
    }
}

/// A scanned token. `position` is the character offset of the lexeme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token: TokenType,
    pub lexeme: String,
    pub position: usize,
}

/// A longest-match scanner driven by the combined, minimized DFA of its
/// rules.
#[derive(Debug)]
pub struct Tokenizer {
    dfa: Dfa,
}

impl Tokenizer {
    /// Compile `rules` into a single automaton. A rule whose pattern fails
    /// to compile is skipped with a warning; the remaining rules proceed.
    pub fn new<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = LexicalRule>,
    {
        let mut nfa = Nfa::default();
        let mut compiled: Vec<CompiledRule> = Vec::new();

        for rule in rules {
            match nfa.compile(&rule.pattern) {
                Ok(fragment) => {
                    nfa.mark_accept(fragment.accept, compiled.len());
                    compiled.push(CompiledRule {
                        fragment,
                        token: rule.token,
                        priority: rule.priority,
                        ignore: rule.ignore,
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        pattern = %rule.pattern,
                        token = ?rule.token,
                        %error,
                        "skipping malformed lexical rule",
                    );
                }
            }
        }

        let dfa = Dfa::from_rules(&nfa, &compiled).minimize();
        tracing::debug!(
            rules = compiled.len(),
            states = dfa.len(),
            "built combined tokenizer DFA",
        );
        Self { dfa }
    }

    /// The combined automaton, for inspection.
    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    /// Scan `input` into tokens, ending with a synthetic `Eof` token.
    ///
    /// At each position the longest match wins; equal-length candidates are
    /// settled by the smaller priority value. A position with no match at
    /// all emits a one-character `Unknown` token.
    pub fn tokenize(&self, input: &str) -> Vec<Token> {
        let chars: Vec<char> = input.chars().collect();
        let mut tokens = Vec::new();
        let mut position = 0;

        while position < chars.len() {
            match self.longest_match(&chars, position) {
                Some((length, info)) => {
                    if !info.ignore {
                        tokens.push(Token {
                            token: info.token,
                            lexeme: chars[position..position + length].iter().collect(),
                            position,
                        });
                    }
                    position += length;
                }
                None => {
                    tokens.push(Token {
                        token: TokenType::Unknown,
                        lexeme: chars[position].to_string(),
                        position,
                    });
                    position += 1;
                }
            }
        }

        tokens.push(Token {
            token: TokenType::Eof,
            lexeme: String::new(),
            position,
        });
        tokens
    }

    /// Walk the DFA from `start`, recording the best accepting candidate.
    /// Zero-length matches are never produced, so the scan always makes
    /// progress even when a nullable pattern is among the rules.
    fn longest_match(&self, chars: &[char], start: usize) -> Option<(usize, AcceptInfo)> {
        let mut state = self.dfa.start();
        let mut best: Option<(usize, AcceptInfo)> = None;
        let mut offset = start;

        while offset < chars.len() {
            let Some(next) = self.dfa.state(state).transition(chars[offset]) else {
                break;
            };
            state = next;
            offset += 1;

            if let Some(info) = self.dfa.state(state).accept() {
                let length = offset - start;
                let better = match best {
                    None => true,
                    Some((best_length, best_info)) => {
                        length > best_length
                            || (length == best_length && info.priority < best_info.priority)
                    }
                };
                if better {
                    best = Some((length, info));
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_characters() {
        let tokenizer = Tokenizer::new([
            LexicalRule::new("a", TokenType::Identifier),
            LexicalRule::new("b", TokenType::Keyword),
        ]);
        let tokens = tokenizer.tokenize("ab");

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].token, TokenType::Identifier);
        assert_eq!(tokens[0].lexeme, "a");
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[1].token, TokenType::Keyword);
        assert_eq!(tokens[1].lexeme, "b");
        assert_eq!(tokens[1].position, 1);
        assert_eq!(tokens[2].token, TokenType::Eof);
        assert_eq!(tokens[2].position, 2);
    }

    #[test]
    fn empty_input_yields_eof_only() {
        let tokenizer = Tokenizer::new([LexicalRule::new("a", TokenType::Identifier)]);
        let tokens = tokenizer.tokenize("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token, TokenType::Eof);
        assert_eq!(tokens[0].position, 0);
    }

    #[test]
    fn longest_match_wins() {
        let tokenizer = Tokenizer::new([
            LexicalRule::new("a", TokenType::Identifier),
            LexicalRule::new("ab", TokenType::Keyword),
        ]);
        let tokens = tokenizer.tokenize("ab");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token, TokenType::Keyword);
        assert_eq!(tokens[0].lexeme, "ab");
    }

    #[test]
    fn malformed_rule_is_skipped() {
        // The first pattern underflows the fragment stack and is dropped;
        // the second still scans.
        let tokenizer = Tokenizer::new([
            LexicalRule::new("|a", TokenType::Operator),
            LexicalRule::new("b", TokenType::Keyword),
        ]);
        let tokens = tokenizer.tokenize("b");
        assert_eq!(tokens[0].token, TokenType::Keyword);
    }

    #[test]
    fn nullable_pattern_cannot_stall() {
        let tokenizer = Tokenizer::new([
            LexicalRule::new("a*", TokenType::Identifier),
            LexicalRule::new("b", TokenType::Keyword),
        ]);
        let tokens = tokenizer.tokenize("ba");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].token, TokenType::Keyword);
        assert_eq!(tokens[1].token, TokenType::Identifier);
        assert_eq!(tokens[1].lexeme, "a");
    }
}
