//! Regular expression preprocessing: explicit concatenation insertion and
//! infix-to-postfix conversion via the shunting-yard algorithm.

use std::fmt;

/// One element of a scanned pattern. Escaped characters arrive as plain
/// [`Literal`](RegexToken::Literal)s, so operator characters never leak
/// into the literal alphabet.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RegexToken {
    Literal(char),
    Union,
    Concat,
    Star,
    Plus,
    Question,
    LParen,
    RParen,
}

impl RegexToken {
    fn precedence(self) -> Option<u8> {
        match self {
            Self::Union => Some(1),
            Self::Concat => Some(2),
            Self::Star | Self::Plus | Self::Question => Some(3),
            _ => None,
        }
    }

    /// May this token end a sub-expression?
    fn closes(self) -> bool {
        matches!(
            self,
            Self::Literal(_) | Self::RParen | Self::Star | Self::Plus | Self::Question
        )
    }

    /// May this token begin a sub-expression?
    fn opens(self) -> bool {
        matches!(self, Self::Literal(_) | Self::LParen)
    }
}

impl fmt::Display for RegexToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(c) => write!(f, "{}", c),
            Self::Union => f.write_str("|"),
            Self::Concat => f.write_str("·"),
            Self::Star => f.write_str("*"),
            Self::Plus => f.write_str("+"),
            Self::Question => f.write_str("?"),
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegexError {
    #[error("dangling escape at end of pattern")]
    DanglingEscape,

    #[error("operand stack underflow on operator `{operator}`")]
    StackUnderflow { operator: RegexToken },

    #[error("{depth} fragments left after postfix evaluation, expected exactly one")]
    ResidualStack { depth: usize },
}

/// Scan a pattern into tokens. `\c` yields `Literal(c)` for any `c`.
fn scan(pattern: &str) -> Result<Vec<RegexToken>, RegexError> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            '\\' => RegexToken::Literal(chars.next().ok_or(RegexError::DanglingEscape)?),
            '|' => RegexToken::Union,
            '·' => RegexToken::Concat,
            '*' => RegexToken::Star,
            '+' => RegexToken::Plus,
            '?' => RegexToken::Question,
            '(' => RegexToken::LParen,
            ')' => RegexToken::RParen,
            c => RegexToken::Literal(c),
        };
        tokens.push(token);
    }
    Ok(tokens)
}

/// Make implicit concatenation explicit: insert `·` wherever the left token
/// may end a sub-expression and the right one may begin one.
fn insert_concat(tokens: Vec<RegexToken>) -> Vec<RegexToken> {
    let mut output = Vec::with_capacity(tokens.len() * 2);
    for (i, &token) in tokens.iter().enumerate() {
        output.push(token);
        if let Some(&next) = tokens.get(i + 1) {
            if token.closes() && next.opens() {
                output.push(RegexToken::Concat);
            }
        }
    }
    output
}

/// Shunting-yard conversion to postfix. Unmatched parentheses are discarded
/// silently, matching the scanner this replaces.
fn to_postfix(tokens: Vec<RegexToken>) -> Vec<RegexToken> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut operators: Vec<RegexToken> = Vec::new();

    for token in tokens {
        match token {
            RegexToken::Literal(_) => output.push(token),
            RegexToken::LParen => operators.push(token),
            RegexToken::RParen => {
                while let Some(&top) = operators.last() {
                    if top == RegexToken::LParen {
                        break;
                    }
                    output.push(operators.pop().unwrap());
                }
                if operators.last() == Some(&RegexToken::LParen) {
                    operators.pop();
                }
            }
            _ => {
                let precedence = token.precedence().unwrap();
                while let Some(&top) = operators.last() {
                    match top.precedence() {
                        Some(p) if p >= precedence => output.push(operators.pop().unwrap()),
                        _ => break,
                    }
                }
                operators.push(token);
            }
        }
    }

    while let Some(top) = operators.pop() {
        if top.precedence().is_some() {
            output.push(top);
        }
    }

    output
}

/// Convert an infix pattern into postfix form ready for Thompson
/// construction.
pub fn parse(pattern: &str) -> Result<Vec<RegexToken>, RegexError> {
    Ok(to_postfix(insert_concat(scan(pattern)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postfix(pattern: &str) -> String {
        parse(pattern)
            .unwrap()
            .iter()
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn concatenation_is_made_explicit() {
        assert_eq!(postfix("ab"), "ab·");
        assert_eq!(postfix("abc"), "ab·c·");
        assert_eq!(postfix("a(b)"), "ab·");
        assert_eq!(postfix("a*b"), "a*b·");
        assert_eq!(postfix("(a)(b)"), "ab·");
    }

    #[test]
    fn precedence_orders_operators() {
        assert_eq!(postfix("a|bc"), "abc·|");
        assert_eq!(postfix("(a|b)c"), "ab|c·");
        assert_eq!(postfix("ab|c"), "ab·c|");
        assert_eq!(postfix("a|b*"), "ab*|");
    }

    #[test]
    fn postfix_operators_bind_tightest() {
        assert_eq!(postfix("ab*"), "ab*·");
        assert_eq!(postfix("a+b?"), "a+b?·");
        assert_eq!(postfix("(ab)*"), "ab·*");
    }

    #[test]
    fn escapes_become_literals() {
        let tokens = parse(r"\*\(").unwrap();
        assert_eq!(
            tokens,
            [
                RegexToken::Literal('*'),
                RegexToken::Literal('('),
                RegexToken::Concat
            ]
        );
    }

    #[test]
    fn dangling_escape_is_an_error() {
        assert!(matches!(parse("a\\"), Err(RegexError::DanglingEscape)));
    }

    #[test]
    fn unmatched_parentheses_are_discarded() {
        assert_eq!(postfix("(ab"), "ab·");
        assert_eq!(postfix("ab)"), "ab·");
    }
}
