//! Byte stream → token stream.
//!
//! Pull-based: `next_token` returns one `Token` at a time. String/character
//! literal sub-modes are entered explicitly by the parser once it has seen
//! the opening quote.

use crate::source::{SourceFile, SourceLocation};
use crate::token::{Token, TokenKind};

pub struct Lexer<'a> {
    source: &'a SourceFile,
    bytes: &'a [u8],
    idx: usize,
    line: u32,
    col: u32,
}

const ESCAPES: &[(u8, char)] = &[(b'n', '\n'), (b't', '\t'), (b'r', '\r'), (b'\\', '\\'), (b'\'', '\''), (b'"', '"')];

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(source: &'a SourceFile) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            idx: 0,
            line: 1,
            col: 0,
        }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.idx + ahead).copied()
    }

    fn eat(&mut self) -> Option<u8> {
        let c = self.bytes.get(self.idx).copied()?;
        self.idx += 1;
        if c == b'\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn loc(&self) -> SourceLocation {
        self.source.location_at(self.line, self.col.max(1), self.idx as u32)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek(0) {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.eat();
                }
                Some(b'/') if self.peek(1) == Some(b'/') => {
                    while !matches!(self.peek(0), None | Some(b'\n')) {
                        self.eat();
                    }
                }
                _ => break,
            }
        }
    }

    /// Produces the next token, or an `Eof` token once the buffer is
    /// exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let location = self.loc();
        let Some(c) = self.peek(0) else {
            return Token {
                location,
                kind: TokenKind::Eof,
                value: None,
            };
        };

        if c.is_ascii_digit() {
            return self.lex_number(location);
        }
        if c == b'_' || c.is_ascii_alphabetic() {
            return self.lex_identifier_or_keyword(location);
        }

        self.eat();
        let (kind, value) = match c {
            b':' if self.peek(0) == Some(b':') => {
                self.eat();
                (TokenKind::ColonColon, None)
            }
            b':' => (TokenKind::Colon, None),
            b'=' if self.peek(0) == Some(b'=') => {
                self.eat();
                (TokenKind::EqualEqual, None)
            }
            b'=' => (TokenKind::Equal, None),
            b'!' if self.peek(0) == Some(b'=') => {
                self.eat();
                (TokenKind::ExclamationEqual, None)
            }
            b'!' => (TokenKind::Exclamation, None),
            b'<' if self.peek(0) == Some(b'=') => {
                self.eat();
                (TokenKind::LessThanOrEqual, None)
            }
            b'<' if self.peek(0) == Some(b'<') => {
                self.eat();
                (TokenKind::BitwiseShiftL, None)
            }
            b'<' => (TokenKind::LessThan, None),
            b'>' if self.peek(0) == Some(b'=') => {
                self.eat();
                (TokenKind::GreaterThanOrEqual, None)
            }
            b'>' if self.peek(0) == Some(b'>') => {
                self.eat();
                (TokenKind::BitwiseShiftR, None)
            }
            b'>' => (TokenKind::GreaterThan, None),
            b'&' if self.peek(0) == Some(b'&') => {
                self.eat();
                (TokenKind::AmpAmp, None)
            }
            b'&' => (TokenKind::Amp, None),
            b'|' if self.peek(0) == Some(b'|') => {
                self.eat();
                (TokenKind::PipePipe, None)
            }
            b'|' => (TokenKind::Pipe, None),
            b'.' if self.peek(0) == Some(b'.') && self.peek(1) == Some(b'.') => {
                self.eat();
                self.eat();
                (TokenKind::Ellipsis, None)
            }
            b'.' => (TokenKind::Dot, None),
            b'(' => (TokenKind::LParen, None),
            b')' => (TokenKind::RParen, None),
            b'{' => (TokenKind::LBrace, None),
            b'}' => (TokenKind::RBrace, None),
            b'[' => (TokenKind::LBracket, None),
            b']' => (TokenKind::RBracket, None),
            b';' => (TokenKind::Semicolon, None),
            b',' => (TokenKind::Comma, None),
            b'+' => (TokenKind::Plus, None),
            b'-' => (TokenKind::Minus, None),
            b'*' => (TokenKind::Asterisk, None),
            b'/' => (TokenKind::Slash, None),
            b'%' => (TokenKind::Percent, None),
            b'^' => (TokenKind::Hat, None),
            b'~' => (TokenKind::Tilde, None),
            b'"' => {
                return self.lex_string_literal(location);
            }
            b'\'' => {
                return self.lex_char_literal(location);
            }
            _ => (TokenKind::Unknown, None),
        };
        Token { location, kind, value }
    }

    fn lex_identifier_or_keyword(&mut self, location: SourceLocation) -> Token {
        let start = self.idx;
        while matches!(self.peek(0), Some(c) if c == b'_' || c.is_ascii_alphanumeric()) {
            self.eat();
        }
        let text = std::str::from_utf8(&self.bytes[start..self.idx]).expect("source is UTF-8");
        if text == "true" || text == "false" {
            return Token {
                location,
                kind: TokenKind::BoolConstant,
                value: Some(text.to_owned()),
            };
        }
        if let Some(kind) = TokenKind::keyword_from_str(text) {
            return Token {
                location,
                kind,
                value: None,
            };
        }
        Token {
            location,
            kind: TokenKind::Identifier,
            value: Some(text.to_owned()),
        }
    }

    fn lex_number(&mut self, location: SourceLocation) -> Token {
        let start = self.idx;
        if self.peek(0) == Some(b'0') && matches!(self.peek(1), Some(b'b')) {
            self.eat();
            self.eat();
            while matches!(self.peek(0), Some(b'0' | b'1')) {
                self.eat();
            }
            let text = std::str::from_utf8(&self.bytes[start..self.idx]).expect("source is UTF-8");
            return Token {
                location,
                kind: TokenKind::BinInteger,
                value: Some(text.to_owned()),
            };
        }

        while matches!(self.peek(0), Some(c) if c.is_ascii_digit()) {
            self.eat();
        }
        let mut is_real = false;
        if self.peek(0) == Some(b'.') && matches!(self.peek(1), Some(c) if c.is_ascii_digit()) {
            is_real = true;
            self.eat();
            while matches!(self.peek(0), Some(c) if c.is_ascii_digit()) {
                self.eat();
            }
        }
        let text = std::str::from_utf8(&self.bytes[start..self.idx]).expect("source is UTF-8");
        Token {
            location,
            kind: if is_real { TokenKind::Real } else { TokenKind::Integer },
            value: Some(text.to_owned()),
        }
    }

    /// Reads the body of a `"..."` string literal, honouring the escape set
    /// `\n \t \r \\ \' \"` only. Returns `Unknown` if the
    /// file ends before the closing quote; the parser turns that into a diagnostic.
    fn lex_string_literal(&mut self, location: SourceLocation) -> Token {
        let mut out = String::new();
        loop {
            match self.peek(0) {
                None => {
                    return Token {
                        location,
                        kind: TokenKind::Unknown,
                        value: None,
                    };
                }
                Some(b'"') => {
                    self.eat();
                    break;
                }
                Some(b'\\') => {
                    self.eat();
                    match self.decode_escape() {
                        Some(c) => out.push(c),
                        None => {
                            return Token {
                                location,
                                kind: TokenKind::Unknown,
                                value: None,
                            };
                        }
                    }
                }
                Some(_) => {
                    out.push(self.eat_utf8_char());
                }
            }
        }
        Token {
            location,
            kind: TokenKind::StringLiteral,
            value: Some(out),
        }
    }

    /// Reads a `'c'` character literal.
    fn lex_char_literal(&mut self, location: SourceLocation) -> Token {
        let value = match self.peek(0) {
            Some(b'\\') => {
                self.eat();
                self.decode_escape()
            }
            Some(_) => Some(self.eat_utf8_char()),
            None => None,
        };
        let Some(c) = value else {
            return Token {
                location,
                kind: TokenKind::Unknown,
                value: None,
            };
        };
        if self.peek(0) != Some(b'\'') {
            return Token {
                location,
                kind: TokenKind::Unknown,
                value: None,
            };
        }
        self.eat();
        Token {
            location,
            kind: TokenKind::CharLiteral,
            value: Some(c.to_string()),
        }
    }

    fn decode_escape(&mut self) -> Option<char> {
        let c = self.eat()?;
        ESCAPES.iter().find(|(b, _)| *b == c).map(|(_, decoded)| *decoded)
    }

    /// Advances past one (possibly multi-byte) UTF-8 character and returns
    /// it. Falls back to the raw byte as a `char` on malformed input, since
    /// `SourceFile` guarantees valid UTF-8 at construction time this is only
    /// ever exercised on ASCII continuation of the fast path.
    fn eat_utf8_char(&mut self) -> char {
        let rest = std::str::from_utf8(&self.bytes[self.idx..]).unwrap_or_default();
        let c = rest.chars().next().unwrap_or('\u{FFFD}');
        for _ in 0..c.len_utf8() {
            self.eat();
        }
        c
    }
}

#[cfg(test)]
mod tests {
    use super::Lexer;
    use crate::source::SourceFile;
    use crate::token::TokenKind;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let file = SourceFile::new("t.sl", src);
        let mut lexer = Lexer::new(&file);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn skips_whitespace_and_line_comments() {
        let file = SourceFile::new("t.sl", "  // hi\n  42");
        let mut lexer = Lexer::new(&file);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Integer);
        assert_eq!(tok.value.as_deref(), Some("42"));
    }

    #[test]
    fn recognises_compound_operators() {
        assert_eq!(
            kinds("a::b == c != d <= e >= f && g || h << i >> j ..."),
            vec![
                TokenKind::Identifier,
                TokenKind::ColonColon,
                TokenKind::Identifier,
                TokenKind::EqualEqual,
                TokenKind::Identifier,
                TokenKind::ExclamationEqual,
                TokenKind::Identifier,
                TokenKind::LessThanOrEqual,
                TokenKind::Identifier,
                TokenKind::GreaterThanOrEqual,
                TokenKind::Identifier,
                TokenKind::AmpAmp,
                TokenKind::Identifier,
                TokenKind::PipePipe,
                TokenKind::Identifier,
                TokenKind::BitwiseShiftL,
                TokenKind::Identifier,
                TokenKind::BitwiseShiftR,
                TokenKind::Identifier,
                TokenKind::Ellipsis,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn binary_integer_literal() {
        let file = SourceFile::new("t.sl", "0b1011");
        let mut lexer = Lexer::new(&file);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::BinInteger);
        assert_eq!(tok.value.as_deref(), Some("0b1011"));
    }

    #[test]
    fn real_vs_integer_literal() {
        let file = SourceFile::new("t.sl", "3.14 7");
        let mut lexer = Lexer::new(&file);
        assert_eq!(lexer.next_token().kind, TokenKind::Real);
        assert_eq!(lexer.next_token().kind, TokenKind::Integer);
    }

    #[test]
    fn bool_literals_are_keywords_not_identifiers() {
        let file = SourceFile::new("t.sl", "true false");
        let mut lexer = Lexer::new(&file);
        let a = lexer.next_token();
        let b = lexer.next_token();
        assert_eq!(a.kind, TokenKind::BoolConstant);
        assert_eq!(b.kind, TokenKind::BoolConstant);
    }

    #[test]
    fn string_literal_decodes_known_escapes() {
        let file = SourceFile::new("t.sl", r#""a\nb\t\"c""#);
        let mut lexer = Lexer::new(&file);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::StringLiteral);
        assert_eq!(tok.value.as_deref(), Some("a\nb\t\"c"));
    }

    #[test]
    fn unterminated_string_is_unknown() {
        let file = SourceFile::new("t.sl", "\"abc");
        let mut lexer = Lexer::new(&file);
        assert_eq!(lexer.next_token().kind, TokenKind::Unknown);
    }

    #[test]
    fn unknown_escape_is_unknown() {
        let file = SourceFile::new("t.sl", r#""a\xFF""#);
        let mut lexer = Lexer::new(&file);
        assert_eq!(lexer.next_token().kind, TokenKind::Unknown);
    }

    #[test]
    fn char_literal() {
        let file = SourceFile::new("t.sl", "'a' '\\n'");
        let mut lexer = Lexer::new(&file);
        let a = lexer.next_token();
        assert_eq!(a.kind, TokenKind::CharLiteral);
        assert_eq!(a.value.as_deref(), Some("a"));
        let b = lexer.next_token();
        assert_eq!(b.kind, TokenKind::CharLiteral);
        assert_eq!(b.value.as_deref(), Some("\n"));
    }
}
