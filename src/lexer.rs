use std::{iter::Peekable, str::Chars};

use thiserror::Error;

use crate::token::{Token, TokenKind, KEYWORDS};

/// The lexer: a single-pass scanner over a source buffer with
/// one-character lookahead.
///
/// [`Lexer::lex`] keeps returning [`TokenKind::Eof`] once the input is
/// exhausted. The lexer is single-shot: after the first error, the result
/// of further calls is unspecified.
pub struct Lexer<'src> {
    iter: Peekable<Chars<'src>>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Lexer<'src> {
        Lexer {
            iter: source.chars().peekable(),
        }
    }

    /// Scans the next token.
    pub fn lex(&mut self) -> Result<Token, Error> {
        self.trim_whitespace();
        let Some(&current) = self.iter.peek() else {
            return Ok(Token::new(TokenKind::Eof));
        };
        if current.is_ascii_alphabetic() {
            Ok(self.lex_identifier())
        } else if current.is_ascii_digit() {
            Ok(self.lex_number())
        } else if current == '\'' {
            self.lex_string()
        } else {
            self.lex_symbol()
        }
    }

    fn trim_whitespace(&mut self) {
        while self.iter.next_if(|c| c.is_ascii_whitespace()).is_some() {}
    }

    fn lex_identifier(&mut self) -> Token {
        let mut identifier = String::new();
        while let Some(c) = self
            .iter
            .next_if(|c| c.is_ascii_alphabetic() || c.is_ascii_digit())
        {
            // Identifiers are case-insensitive; normalize the whole
            // spelling so `Foo` and `foo` intern to the same symbol.
            identifier.push(c.to_ascii_lowercase());
        }
        match KEYWORDS.get(&identifier) {
            Some(&keyword) => Token::new(keyword),
            None => Token::with_text(TokenKind::Identifier, identifier),
        }
    }

    fn lex_number(&mut self) -> Token {
        let mut number = String::new();
        while let Some(c) = self.iter.next_if(char::is_ascii_digit) {
            number.push(c);
        }
        // Conversion to a machine integer happens in the parser.
        Token::with_text(TokenKind::Number, number)
    }

    fn lex_string(&mut self) -> Result<Token, Error> {
        let quote = self.iter.next();
        debug_assert_eq!(quote, Some('\''));
        let mut literal = String::new();
        loop {
            match self.iter.next() {
                Some('\'') => return Ok(Token::with_text(TokenKind::Str, literal)),
                Some(c) => literal.push(c),
                None => return Err(Error::MismatchedQuotes),
            }
        }
    }

    /// Greedy longest-match over the punctuator table: a one-character
    /// punctuator is extended whenever the next character completes a
    /// known two-character one.
    fn lex_symbol(&mut self) -> Result<Token, Error> {
        use TokenKind::*;
        let first = self.iter.next().expect("caller peeked a character");
        let kind = match first {
            '+' => Add,
            '-' => Subtract,
            '*' => Multiply,
            '/' => Divide,
            '=' => Equal,
            '<' => match self.iter.peek() {
                Some('=') => self.advance_with(LessThanEqual),
                Some('>') => self.advance_with(NotEqual),
                _ => LessThan,
            },
            '>' => match self.iter.peek() {
                Some('=') => self.advance_with(GreaterThanEqual),
                _ => GreaterThan,
            },
            '[' => OpenBracket,
            ']' => CloseBracket,
            '.' => match self.iter.peek() {
                Some('.') => self.advance_with(DoublePeriod),
                _ => Period,
            },
            ',' => Comma,
            ':' => match self.iter.peek() {
                Some('=') => self.advance_with(Assign),
                _ => Colon,
            },
            ';' => SemiColon,
            '^' => Hat,
            '(' => OpenParen,
            ')' => CloseParen,
            _ => return Err(Error::UnknownSymbol),
        };
        Ok(Token::new(kind))
    }

    /// Consumes the peeked character and returns the provided kind.
    fn advance_with(&mut self, kind: TokenKind) -> TokenKind {
        self.iter.next();
        kind
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Unknown symbol")]
    UnknownSymbol,
    #[error("Mismatched quotes")]
    MismatchedQuotes,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.lex().expect("unexpected lexer failure");
            let done = token.is_eof();
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex_all(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn identifier_with_number() {
        assert_eq!(
            lex_all("foo1"),
            [
                Token::with_text(TokenKind::Identifier, "foo1"),
                Token::new(TokenKind::Eof),
            ]
        );
    }

    #[test]
    fn identifier_followed_by_symbol() {
        assert_eq!(
            lex_all("foo;"),
            [
                Token::with_text(TokenKind::Identifier, "foo"),
                Token::new(TokenKind::SemiColon),
                Token::new(TokenKind::Eof),
            ]
        );
    }

    #[test]
    fn number() {
        assert_eq!(
            lex_all("123"),
            [
                Token::with_text(TokenKind::Number, "123"),
                Token::new(TokenKind::Eof),
            ]
        );
    }

    #[test]
    fn string() {
        assert_eq!(
            lex_all("'foo'"),
            [
                Token::with_text(TokenKind::Str, "foo"),
                Token::new(TokenKind::Eof),
            ]
        );
    }

    #[test]
    fn empty_string() {
        assert_eq!(
            lex_all("''"),
            [
                Token::with_text(TokenKind::Str, ""),
                Token::new(TokenKind::Eof),
            ]
        );
    }

    #[test]
    fn simple_symbols() {
        use TokenKind::*;
        assert_eq!(kinds(".;()"), [Period, SemiColon, OpenParen, CloseParen, Eof]);
    }

    #[test]
    fn compound_symbols() {
        use TokenKind::*;
        assert_eq!(
            kinds("<=>=<>"),
            [LessThanEqual, GreaterThanEqual, NotEqual, Eof]
        );
    }

    #[test]
    fn mixed_symbols() {
        use TokenKind::*;
        assert_eq!(
            kinds("<;<=<("),
            [LessThan, SemiColon, LessThanEqual, LessThan, OpenParen, Eof]
        );
    }

    #[test]
    fn assign_and_ranges() {
        use TokenKind::*;
        assert_eq!(kinds(":= : .. ."), [Assign, Colon, DoublePeriod, Period, Eof]);
    }

    #[test]
    fn keywords() {
        use TokenKind::*;
        assert_eq!(
            lex_all("if foo begin end beginning"),
            [
                Token::new(If),
                Token::with_text(Identifier, "foo"),
                Token::new(Begin),
                Token::new(End),
                Token::with_text(Identifier, "beginning"),
                Token::new(Eof),
            ]
        );
    }

    #[test]
    fn case_is_normalized() {
        use TokenKind::*;
        assert_eq!(kinds("BEGIN Begin begin"), [Begin, Begin, Begin, Eof]);
        assert_eq!(
            lex_all("Foo foo"),
            [
                Token::with_text(Identifier, "foo"),
                Token::with_text(Identifier, "foo"),
                Token::new(Eof),
            ]
        );
    }

    #[test]
    fn eof_is_repeated() {
        let mut lexer = Lexer::new("x");
        assert_eq!(
            lexer.lex(),
            Ok(Token::with_text(TokenKind::Identifier, "x"))
        );
        for _ in 0..3 {
            assert_eq!(lexer.lex(), Ok(Token::new(TokenKind::Eof)));
        }
    }

    #[test]
    fn unknown_symbol() {
        assert_eq!(Lexer::new("?").lex(), Err(Error::UnknownSymbol));
    }

    #[test]
    fn mismatched_quotes() {
        assert_eq!(Lexer::new("'foo").lex(), Err(Error::MismatchedQuotes));
    }
}
