//! Lexing of GraphQL source text into a stream of [`Token`]s.
//!
//! The lexer is a single-pass, single-character-lookahead state machine.
//! Tokens can be pulled one at a time with [`Lexer::next_token`] or drained
//! eagerly into a [`TokenSink`] with [`Lexer::lex`]; both produce the same
//! sequence. The first error ends the stream.

mod accumulator;
mod token;

use std::str::Chars;

use thiserror::Error;
use triomphe::Arc;

pub use accumulator::{ChannelAccumulator, TokenSink, VecAccumulator};
pub use token::{Location, SourceFile, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexerErrorKind {
    #[error("unexpected character `{0}`")]
    InvalidCharacter(char),
    #[error("unterminated string")]
    UnterminatedString,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("malformed number")]
    InvalidNumber,
    #[error("unterminated spread operator, expected `...`")]
    InvalidSpread,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {location}")]
pub struct LexerError {
    pub kind: LexerErrorKind,
    pub location: Location,
}

/// Streaming lexer over one source file.
pub struct Lexer<'a> {
    source: Arc<SourceFile>,
    chars: Chars<'a>,
    line: u32,
    col: u32,
}

/// Lex an entire source file into a vector of tokens.
pub fn tokenize(source: &Arc<SourceFile>) -> Result<Vec<Token>, LexerError> {
    let mut accumulator = VecAccumulator::new();
    Lexer::new(source).lex(&mut accumulator)?;
    Ok(accumulator.into_tokens())
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a Arc<SourceFile>) -> Lexer<'a> {
        Lexer {
            source: Arc::clone(source),
            chars: source.buffer.chars(),
            line: 1,
            col: 0,
        }
    }

    /// Drain the whole stream into `sink`, stopping at the first error.
    pub fn lex(mut self, sink: &mut dyn TokenSink) -> Result<(), LexerError> {
        while let Some(token) = self.next_token()? {
            sink.push(token);
        }
        Ok(())
    }

    /// Pull the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexerError> {
        self.skip_ignored();

        let line = self.line;
        let start = self.col;
        let Some(c) = self.bump() else {
            return Ok(None);
        };

        let token = match c {
            '"' => self.string_value(line, start)?,
            '.' => self.spread(line, start)?,
            c if is_ident_start(c) => self.ident(c, line, start),
            c if c == '-' || c.is_ascii_digit() => self.number(c, line, start)?,
            c => match TokenKind::from_punctuator(c) {
                Some(kind) => self.token(kind, c.to_string(), line, start),
                None => {
                    return Err(self.error(LexerErrorKind::InvalidCharacter(c), line, start));
                }
            },
        };
        Ok(Some(token))
    }

    fn skip_ignored(&mut self) {
        while let Some(c) = self.first() {
            match c {
                ' ' | '\t' | '\r' | '\n' | '\u{FEFF}' => {
                    self.bump();
                }
                '#' => {
                    self.bump();
                    while self.first().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn ident(&mut self, first: char, line: u32, start: u32) -> Token {
        let mut lexeme = String::new();
        lexeme.push(first);
        while self.first().is_some_and(is_ident_char) {
            lexeme.push(self.bump().unwrap());
        }
        self.token(TokenKind::Identifier, lexeme, line, start)
    }

    fn number(&mut self, first: char, line: u32, start: u32) -> Result<Token, LexerError> {
        let mut lexeme = String::new();
        lexeme.push(first);

        if first == '-' && !self.first().is_some_and(|c| c.is_ascii_digit()) {
            return Err(self.error(LexerErrorKind::InvalidNumber, line, start));
        }
        while self.first().is_some_and(|c| c.is_ascii_digit()) {
            lexeme.push(self.bump().unwrap());
        }
        if self.first() == Some('.') {
            lexeme.push(self.bump().unwrap());
            if !self.first().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error(LexerErrorKind::InvalidNumber, line, start));
            }
            while self.first().is_some_and(|c| c.is_ascii_digit()) {
                lexeme.push(self.bump().unwrap());
            }
        }
        if matches!(self.first(), Some('e') | Some('E')) {
            lexeme.push(self.bump().unwrap());
            if matches!(self.first(), Some('+') | Some('-')) {
                lexeme.push(self.bump().unwrap());
            }
            if !self.first().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error(LexerErrorKind::InvalidNumber, line, start));
            }
            while self.first().is_some_and(|c| c.is_ascii_digit()) {
                lexeme.push(self.bump().unwrap());
            }
        }
        Ok(self.token(TokenKind::Number, lexeme, line, start))
    }

    fn spread(&mut self, line: u32, start: u32) -> Result<Token, LexerError> {
        if self.eat('.') && self.eat('.') {
            Ok(self.token(TokenKind::Spread, "...".to_string(), line, start))
        } else {
            Err(self.error(LexerErrorKind::InvalidSpread, line, start))
        }
    }

    /// Lexes the rest of a string after its opening `"`, dispatching between
    /// the empty string, a block string and a single-line string.
    fn string_value(&mut self, line: u32, start: u32) -> Result<Token, LexerError> {
        if self.first() == Some('"') {
            self.bump();
            if self.first() == Some('"') {
                self.bump();
                return self.block_string(line, start);
            }
            return Ok(self.token(TokenKind::String, String::new(), line, start));
        }

        let mut value = String::new();
        loop {
            match self.first() {
                None | Some('\n') => {
                    return Err(self.unterminated_string(line, start));
                }
                Some('"') => {
                    self.bump();
                    return Ok(self.token(TokenKind::String, value, line, start));
                }
                Some('\\') => {
                    self.bump();
                    value.push(self.escaped_char()?);
                }
                Some(_) => value.push(self.bump().unwrap()),
            }
        }
    }

    fn block_string(&mut self, line: u32, start: u32) -> Result<Token, LexerError> {
        let mut value = String::new();
        loop {
            match self.first() {
                None => return Err(self.unterminated_string(line, start)),
                Some('"') if self.starts_with_triple_quote() => {
                    self.bump();
                    self.bump();
                    self.bump();
                    return Ok(self.token(TokenKind::String, value, line, start));
                }
                Some('\\') if self.escaped_triple_quote() => {
                    self.bump();
                    self.bump();
                    self.bump();
                    self.bump();
                    value.push_str("\"\"\"");
                }
                Some(_) => value.push(self.bump().unwrap()),
            }
        }
    }

    fn escaped_char(&mut self) -> Result<char, LexerError> {
        let line = self.line;
        let start = self.col.saturating_sub(1);
        let Some(c) = self.bump() else {
            return Err(self.error(LexerErrorKind::InvalidEscape, line, start));
        };
        match c {
            '"' => Ok('"'),
            '\\' => Ok('\\'),
            '/' => Ok('/'),
            'b' => Ok('\u{0008}'),
            'f' => Ok('\u{000C}'),
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            't' => Ok('\t'),
            'u' => {
                let mut code = 0u32;
                for _ in 0..4 {
                    let digit = self
                        .bump()
                        .and_then(|c| c.to_digit(16))
                        .ok_or_else(|| self.error(LexerErrorKind::InvalidEscape, line, start))?;
                    code = code * 16 + digit;
                }
                char::from_u32(code)
                    .ok_or_else(|| self.error(LexerErrorKind::InvalidEscape, line, start))
            }
            _ => Err(self.error(LexerErrorKind::InvalidEscape, line, start)),
        }
    }

    fn starts_with_triple_quote(&self) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next() == Some('"') && ahead.next() == Some('"') && ahead.next() == Some('"')
    }

    fn escaped_triple_quote(&self) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next() == Some('\\')
            && ahead.next() == Some('"')
            && ahead.next() == Some('"')
            && ahead.next() == Some('"')
    }

    fn first(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.first() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn token(&self, kind: TokenKind, lexeme: String, line: u32, start: u32) -> Token {
        Token {
            kind,
            lexeme,
            location: Location {
                source: Arc::clone(&self.source),
                line,
                start,
                end: self.col,
            },
        }
    }

    fn error(&self, kind: LexerErrorKind, line: u32, start: u32) -> LexerError {
        LexerError {
            kind,
            location: Location {
                source: Arc::clone(&self.source),
                line,
                start,
                end: self.col.max(start + 1),
            },
        }
    }

    /// Unterminated strings point at the opening quote, not at wherever the
    /// line or the input ran out.
    fn unterminated_string(&self, line: u32, start: u32) -> LexerError {
        LexerError {
            kind: LexerErrorKind::UnterminatedString,
            location: Location {
                source: Arc::clone(&self.source),
                line,
                start,
                end: start + 1,
            },
        }
    }
}

fn is_ident_start(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '_')
}

fn is_ident_char(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        let source = SourceFile::new("test.graphql", input);
        tokenize(&source).unwrap()
    }

    fn lex_err(input: &str) -> LexerError {
        let source = SourceFile::new("test.graphql", input);
        tokenize(&source).unwrap_err()
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn it_lexes_punctuators_and_identifiers() {
        let tokens = lex("type Query { hello: String }");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::LeftBrace,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Identifier,
                TokenKind::RightBrace,
            ]
        );
        assert_eq!(tokens[0].lexeme, "type");
        assert_eq!(tokens[3].lexeme, "hello");
    }

    #[test]
    fn lexemes_match_source_slices() {
        let input = "type Q {\n  xs: [Int!]!\n  name(first: Int = 10): String\n}\n";
        let lines: Vec<&str> = input.lines().collect();
        for token in lex(input) {
            let line = lines[(token.location.line - 1) as usize];
            let slice = &line[token.location.start as usize..token.location.end as usize];
            assert_eq!(slice, token.lexeme, "bad span for {token}");
        }
    }

    #[test]
    fn it_tracks_lines_and_columns() {
        let tokens = lex("query {\n  hero\n}");
        let hero = &tokens[2];
        assert_eq!(hero.lexeme, "hero");
        assert_eq!(hero.location.line, 2);
        assert_eq!(hero.location.start, 2);
        assert_eq!(hero.location.end, 6);
    }

    #[test]
    fn it_skips_comments_and_commas_are_tokens() {
        let tokens = lex("# a comment\na, b # trailing\nc");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Identifier,
                TokenKind::Comma,
                TokenKind::Identifier,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn it_lexes_numbers() {
        let tokens = lex("42 -7 3.14 -0.5 1e10 6.02e-23");
        assert!(kinds(&tokens).iter().all(|k| *k == TokenKind::Number));
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["42", "-7", "3.14", "-0.5", "1e10", "6.02e-23"]);
    }

    #[test]
    fn it_rejects_malformed_numbers() {
        assert_eq!(lex_err("1.").kind, LexerErrorKind::InvalidNumber);
        assert_eq!(lex_err("1e").kind, LexerErrorKind::InvalidNumber);
        assert_eq!(lex_err("-x").kind, LexerErrorKind::InvalidNumber);
    }

    #[test]
    fn it_lexes_strings_with_escapes() {
        let tokens = lex(r#""plain" "a\"b" "tab\there" "A""#);
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["plain", "a\"b", "tab\there", "A"]);
    }

    #[test]
    fn it_lexes_block_strings() {
        let tokens = lex("\"\"\"first line\nsecond \"quoted\" line\"\"\" after");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, "first line\nsecond \"quoted\" line");
        assert_eq!(tokens[1].lexeme, "after");
    }

    #[test]
    fn it_lexes_empty_strings() {
        let tokens = lex(r#""" x"#);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, "");
    }

    #[test]
    fn unterminated_string_points_at_opening_quote() {
        let err = lex_err("type Q { x: \"abc \n}");
        assert_eq!(err.kind, LexerErrorKind::UnterminatedString);
        assert_eq!(err.location.line, 1);
        assert_eq!(err.location.start, 12);
        assert_eq!(err.location.end, 13);
    }

    #[test]
    fn it_rejects_invalid_escapes() {
        assert_eq!(lex_err(r#""\q""#).kind, LexerErrorKind::InvalidEscape);
        assert_eq!(lex_err(r#""\u00GG""#).kind, LexerErrorKind::InvalidEscape);
    }

    #[test]
    fn it_lexes_spread() {
        let tokens = lex("...friendFields");
        assert_eq!(tokens[0].kind, TokenKind::Spread);
        assert_eq!(tokens[1].lexeme, "friendFields");
    }

    #[test]
    fn it_rejects_short_spread() {
        assert_eq!(lex_err("..a").kind, LexerErrorKind::InvalidSpread);
        assert_eq!(lex_err(".").kind, LexerErrorKind::InvalidSpread);
    }

    #[test]
    fn it_rejects_unexpected_characters() {
        assert_eq!(lex_err("%").kind, LexerErrorKind::InvalidCharacter('%'));
    }

    #[test]
    fn token_stream_matches_snapshot() {
        let dump: String = lex("type Q { a: Int! }")
            .iter()
            .map(|t| format!("{t}\n"))
            .collect();
        expect_test::expect![[r#"
            IDENTIFIER("type") at test.graphql:1:0..4
            IDENTIFIER("Q") at test.graphql:1:5..6
            LEFT_BRACE("{") at test.graphql:1:7..8
            IDENTIFIER("a") at test.graphql:1:9..10
            COLON(":") at test.graphql:1:10..11
            IDENTIFIER("Int") at test.graphql:1:12..15
            BANG("!") at test.graphql:1:15..16
            RIGHT_BRACE("}") at test.graphql:1:17..18
        "#]]
        .assert_eq(&dump);
    }

    #[test]
    fn pull_and_eager_lexing_agree() {
        let input = "union U = A | B";
        let source = SourceFile::new("test.graphql", input);
        let mut lexer = Lexer::new(&source);
        let mut pulled = Vec::new();
        while let Some(token) = lexer.next_token().unwrap() {
            pulled.push(token);
        }
        assert_eq!(pulled, tokenize(&source).unwrap());
    }

    #[test]
    fn channel_accumulator_preserves_order() {
        let source = SourceFile::new("test.graphql", "a b c");
        let (sender, receiver) = std::sync::mpsc::sync_channel(2);
        let handle = std::thread::spawn({
            let source = Arc::clone(&source);
            move || {
                let mut accumulator = ChannelAccumulator::new(sender);
                Lexer::new(&source).lex(&mut accumulator)
            }
        });
        let received: Vec<String> = receiver.iter().map(|t| t.lexeme).collect();
        handle.join().unwrap().unwrap();
        assert_eq!(received, vec!["a", "b", "c"]);
    }
}
