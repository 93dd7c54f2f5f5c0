use lexalr::lexer::{LexicalRule, Token, TokenType, Tokenizer};

fn kinds(tokens: &[Token]) -> Vec<TokenType> {
    tokens.iter().map(|t| t.token).collect()
}

#[test]
fn two_single_character_rules() {
    let tokenizer = Tokenizer::new([
        LexicalRule::new("a", TokenType::Identifier),
        LexicalRule::new("b", TokenType::Keyword),
    ]);
    let tokens = tokenizer.tokenize("ab");

    assert_eq!(
        tokens,
        [
            Token {
                token: TokenType::Identifier,
                lexeme: "a".into(),
                position: 0,
            },
            Token {
                token: TokenType::Keyword,
                lexeme: "b".into(),
                position: 1,
            },
            Token {
                token: TokenType::Eof,
                lexeme: String::new(),
                position: 2,
            },
        ]
    );
}

#[test]
fn maximum_match_beats_shorter_rule() {
    let tokenizer = Tokenizer::new([
        LexicalRule::new("a", TokenType::Identifier),
        LexicalRule::new("ab", TokenType::Keyword),
    ]);
    let tokens = tokenizer.tokenize("ab");

    assert_eq!(kinds(&tokens), [TokenType::Keyword, TokenType::Eof]);
    assert_eq!(tokens[0].lexeme, "ab");
    assert_eq!(tokens[0].position, 0);
    assert_eq!(tokens[1].position, 2);
}

#[test]
fn priority_breaks_equal_length_ties() {
    let tokenizer = Tokenizer::new([
        LexicalRule::with_priority("if", TokenType::Identifier, 2),
        LexicalRule::with_priority("if", TokenType::Keyword, 1),
    ]);
    let tokens = tokenizer.tokenize("if");

    assert_eq!(tokens[0].token, TokenType::Keyword);
    assert_eq!(tokens[0].lexeme, "if");
}

#[test]
fn ignored_rules_consume_silently() {
    let tokenizer = Tokenizer::new([
        LexicalRule::new("a", TokenType::Identifier),
        LexicalRule::ignored(" ", TokenType::Whitespace, 2),
    ]);
    let tokens = tokenizer.tokenize("a a");

    assert_eq!(
        kinds(&tokens),
        [TokenType::Identifier, TokenType::Identifier, TokenType::Eof]
    );
    assert_eq!(tokens[0].position, 0);
    assert_eq!(tokens[1].position, 2);
}

#[test]
fn unmatched_character_falls_back_to_unknown() {
    let tokenizer = Tokenizer::new([LexicalRule::new("a", TokenType::Identifier)]);
    let tokens = tokenizer.tokenize("x");

    assert_eq!(
        tokens,
        [
            Token {
                token: TokenType::Unknown,
                lexeme: "x".into(),
                position: 0,
            },
            Token {
                token: TokenType::Eof,
                lexeme: String::new(),
                position: 1,
            },
        ]
    );
}

#[test]
fn realistic_rule_set() {
    let tokenizer = Tokenizer::new([
        LexicalRule::with_priority("if|else|while", TokenType::Keyword, 0),
        LexicalRule::with_priority(
            "(a|b|c|d|e|f|g|h|i|j|k|l|m|n|o|p|q|r|s|t|u|v|w|x|y|z)+",
            TokenType::Identifier,
            1,
        ),
        LexicalRule::new("(0|1|2|3|4|5|6|7|8|9)+", TokenType::Number),
        LexicalRule::new("\\+|-|\\*|/|=", TokenType::Operator),
        LexicalRule::new(";|\\(|\\)", TokenType::Delimiter),
        LexicalRule::ignored(" +", TokenType::Whitespace, 9),
    ]);

    let tokens = tokenizer.tokenize("while (x1) x = x + 42;");
    // `x1` is not matched whole: letters then digits split into two tokens.
    assert_eq!(
        kinds(&tokens),
        [
            TokenType::Keyword,    // while
            TokenType::Delimiter,  // (
            TokenType::Identifier, // x
            TokenType::Number,     // 1
            TokenType::Delimiter,  // )
            TokenType::Identifier, // x
            TokenType::Operator,   // =
            TokenType::Identifier, // x
            TokenType::Operator,   // +
            TokenType::Number,     // 42
            TokenType::Delimiter,  // ;
            TokenType::Eof,
        ]
    );

    // Keyword wins over the identifier rule at equal length.
    assert_eq!(tokens[0].lexeme, "while");
}

#[test]
fn tokenization_partitions_the_input() {
    // Reconstructing the input from emitted plus consumed-but-ignored
    // lexemes must reproduce it exactly; positions strictly increase.
    let tokenizer = Tokenizer::new([
        LexicalRule::new("ab", TokenType::Keyword),
        LexicalRule::new("a", TokenType::Identifier),
        LexicalRule::new("b+", TokenType::Number),
    ]);
    let input = "abbbaxab";
    let tokens = tokenizer.tokenize(input);

    let mut rebuilt = String::new();
    let mut last_position = None;
    for token in &tokens {
        if token.token == TokenType::Eof {
            continue;
        }
        assert_eq!(token.position, rebuilt.chars().count());
        if let Some(last) = last_position {
            assert!(token.position > last);
        }
        last_position = Some(token.position);
        rebuilt.push_str(&token.lexeme);
    }
    assert_eq!(rebuilt, input);
}
