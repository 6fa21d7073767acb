// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::sync::LazyLock;

use regex::Regex;

// Alternation order matters: two-character operators before their
// one-character prefixes, punctuation before literals and names.
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"->|:=|[\[\].,(){}:$@^?/+\-*=!<>~&|#]|'(?:[^']|'')*'?|\d+(?:\.\d*)?(?:[eE][+-]?\d+)?|[^\W\d]\w*",
    )
    .expect("token pattern compiles")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Arrow,
    Assign,
    Punct(char),
    /// Single-quoted literal, quotes included. May be unterminated.
    Str(&'a str),
    Number(&'a str),
    Name(&'a str),
}

impl Token<'_> {
    pub fn is_punct(&self, ch: char) -> bool {
        matches!(self, Token::Punct(found) if *found == ch)
    }
}

/// Splits query text into tokens. Characters no token class recognizes
/// (whitespace, stray quotes, symbols) are skipped.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    TOKEN_PATTERN
        .find_iter(text)
        .filter_map(|found| classify(found.as_str()))
        .collect()
}

fn classify(text: &str) -> Option<Token<'_>> {
    let first = text.chars().next()?;
    let token = match text {
        "->" => Token::Arrow,
        ":=" => Token::Assign,
        _ if first == '\'' => Token::Str(text),
        _ if first.is_numeric() => Token::Number(text),
        _ if first.is_alphabetic() || first == '_' => Token::Name(text),
        _ => Token::Punct(first),
    };
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::{Token, tokenize};

    #[test]
    fn operators_win_over_their_prefixes() {
        assert_eq!(
            tokenize("a->b:=c:d-1"),
            vec![
                Token::Name("a"),
                Token::Arrow,
                Token::Name("b"),
                Token::Assign,
                Token::Name("c"),
                Token::Punct(':'),
                Token::Name("d"),
                Token::Punct('-'),
                Token::Number("1"),
            ]
        );
    }

    #[test]
    fn literals_and_names() {
        assert_eq!(
            tokenize("/school?name='it''s'&campus!=3.5e2"),
            vec![
                Token::Punct('/'),
                Token::Name("school"),
                Token::Punct('?'),
                Token::Name("name"),
                Token::Punct('='),
                Token::Str("'it''s'"),
                Token::Punct('&'),
                Token::Name("campus"),
                Token::Punct('!'),
                Token::Punct('='),
                Token::Number("3.5e2"),
            ]
        );
    }

    #[test]
    fn names_are_unicode_and_never_start_with_a_digit() {
        assert_eq!(
            tokenize("école 2nd _x"),
            vec![
                Token::Name("école"),
                Token::Number("2"),
                Token::Name("nd"),
                Token::Name("_x"),
            ]
        );
    }

    #[test]
    fn unterminated_literal_runs_to_the_end() {
        assert_eq!(
            tokenize("x='abc d"),
            vec![Token::Name("x"), Token::Punct('='), Token::Str("'abc d")]
        );
        assert!(tokenize("  \t\"").is_empty());
    }
}
