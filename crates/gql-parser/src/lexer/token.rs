use std::fmt;
use std::path::{Path, PathBuf};

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use triomphe::Arc;

/// A single input to the pipeline: the path it was read from and its full
/// contents.
///
/// A `SourceFile` is shared by reference between every token and AST node
/// derived from it, so the buffer stays alive for as long as any of them do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub filepath: PathBuf,
    pub buffer: String,
}

impl SourceFile {
    pub fn new(filepath: impl AsRef<Path>, buffer: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            filepath: filepath.as_ref().to_owned(),
            buffer: buffer.into(),
        })
    }
}

/// The kind of a lexed token.
///
/// Punctuators are single codepoints; `Spread` covers the three-dot
/// operator; `Identifier`, `String` and `Number` carry their text in the
/// token's lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Equal,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Bang,
    Colon,
    Semicolon,
    Comma,
    VSlash,
    At,
    Dollar,
    Amp,
    Spread,
    Identifier,
    String,
    Number,
}

impl TokenKind {
    /// The wire name used in the token JSON form.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Equal => "EQUAL",
            TokenKind::LeftParen => "LEFT_PAREN",
            TokenKind::RightParen => "RIGHT_PAREN",
            TokenKind::LeftBrace => "LEFT_BRACE",
            TokenKind::RightBrace => "RIGHT_BRACE",
            TokenKind::LeftBracket => "LEFT_BRACKET",
            TokenKind::RightBracket => "RIGHT_BRACKET",
            TokenKind::Bang => "BANG",
            TokenKind::Colon => "COLON",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Comma => "COMMA",
            TokenKind::VSlash => "VSLASH",
            TokenKind::At => "AT",
            TokenKind::Dollar => "DOLLAR",
            TokenKind::Amp => "AMP",
            TokenKind::Spread => "SPREAD",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::String => "STRING",
            TokenKind::Number => "NUMBER",
        }
    }

    pub fn from_name(name: &str) -> Option<TokenKind> {
        Some(match name {
            "EQUAL" => TokenKind::Equal,
            "LEFT_PAREN" => TokenKind::LeftParen,
            "RIGHT_PAREN" => TokenKind::RightParen,
            "LEFT_BRACE" => TokenKind::LeftBrace,
            "RIGHT_BRACE" => TokenKind::RightBrace,
            "LEFT_BRACKET" => TokenKind::LeftBracket,
            "RIGHT_BRACKET" => TokenKind::RightBracket,
            "BANG" => TokenKind::Bang,
            "COLON" => TokenKind::Colon,
            "SEMICOLON" => TokenKind::Semicolon,
            "COMMA" => TokenKind::Comma,
            "VSLASH" => TokenKind::VSlash,
            "AT" => TokenKind::At,
            "DOLLAR" => TokenKind::Dollar,
            "AMP" => TokenKind::Amp,
            "SPREAD" => TokenKind::Spread,
            "IDENTIFIER" => TokenKind::Identifier,
            "STRING" => TokenKind::String,
            "NUMBER" => TokenKind::Number,
            _ => return None,
        })
    }

    pub(crate) fn from_punctuator(c: char) -> Option<TokenKind> {
        Some(match c {
            '=' => TokenKind::Equal,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '!' => TokenKind::Bang,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '|' => TokenKind::VSlash,
            '@' => TokenKind::At,
            '$' => TokenKind::Dollar,
            '&' => TokenKind::Amp,
            _ => return None,
        })
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A span in a source file.
///
/// `line` is 1-based; `start`/`end` are 0-based column offsets on that line,
/// with `end` exclusive, so `line[start..end]` is the token's lexeme for
/// single-line tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub source: Arc<SourceFile>,
    pub line: u32,
    pub start: u32,
    pub end: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}..{}",
            self.source.filepath.display(),
            self.line,
            self.start,
            self.end
        )
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Location", 3)?;
        state.serialize_field("line", &self.line)?;
        state.serialize_field("start", &self.start)?;
        state.serialize_field("end", &self.end)?;
        state.end()
    }
}

/// A lexed token: its kind, its exact source text, and where it came from.
///
/// String tokens carry the decoded value in `lexeme`, without the enclosing
/// quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub location: Location,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(\"{}\") at {}", self.kind, self.lexeme, self.location)
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Token", 3)?;
        state.serialize_field("type", self.kind.as_str())?;
        state.serialize_field("lexeme", &self.lexeme)?;
        state.serialize_field("location", &self.location)?;
        state.end()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn token_kind_names_round_trip() {
        let kinds = [
            TokenKind::Equal,
            TokenKind::LeftParen,
            TokenKind::RightParen,
            TokenKind::LeftBrace,
            TokenKind::RightBrace,
            TokenKind::LeftBracket,
            TokenKind::RightBracket,
            TokenKind::Bang,
            TokenKind::Colon,
            TokenKind::Semicolon,
            TokenKind::Comma,
            TokenKind::VSlash,
            TokenKind::At,
            TokenKind::Dollar,
            TokenKind::Amp,
            TokenKind::Spread,
            TokenKind::Identifier,
            TokenKind::String,
            TokenKind::Number,
        ];
        for kind in kinds {
            assert_eq!(TokenKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(TokenKind::from_name("PIPE"), None);
    }

    #[test]
    fn token_serializes_to_wire_form() {
        let source = SourceFile::new("query.graphql", "hello");
        let token = Token {
            kind: TokenKind::Identifier,
            lexeme: "hello".to_string(),
            location: Location {
                source,
                line: 1,
                start: 0,
                end: 5,
            },
        };
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "IDENTIFIER",
                "lexeme": "hello",
                "location": { "line": 1, "start": 0, "end": 5 },
            })
        );
    }
}
