//! Lazy lexical scanner (spec.md §4.1). Produces one `Token` per call to
//! [`Scanner::scan_token`]; whitespace, `\r`/`\t`, newlines and `//` line
//! comments are skipped between tokens. Never allocates — tokens borrow
//! directly from the source string.
pub mod token;

use token::{Token, TokenKind};

pub struct Scanner<'src> {
    source: &'src str,
    bytes: &'src [u8],
    start: usize,
    current: usize,
    line: u32,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Scanner { source, bytes: source.as_bytes(), start: 0, current: 0, line: 1 }
    }

    pub fn scan_token(&mut self) -> Token<'src> {
        self.skip_whitespace();
        self.start = self.current;

        if self.is_at_end() {
            return self.make_token(TokenKind::Eof);
        }

        let c = self.advance();
        if is_alpha(c) {
            return self.identifier();
        }
        if c.is_ascii_digit() {
            return self.number();
        }

        match c {
            b'(' => self.make_token(TokenKind::LeftParen),
            b')' => self.make_token(TokenKind::RightParen),
            b'{' => self.make_token(TokenKind::LeftBrace),
            b'}' => self.make_token(TokenKind::RightBrace),
            b';' => self.make_token(TokenKind::Semicolon),
            b',' => self.make_token(TokenKind::Comma),
            b'.' => self.make_token(TokenKind::Dot),
            b'-' => self.make_token(TokenKind::Minus),
            b'+' => self.make_token(TokenKind::Plus),
            b'/' => self.make_token(TokenKind::Slash),
            b'*' => self.make_token(TokenKind::Star),
            b'!' => {
                let kind = if self.matches(b'=') { TokenKind::BangEqual } else { TokenKind::Bang };
                self.make_token(kind)
            }
            b'=' => {
                let kind = if self.matches(b'=') { TokenKind::EqualEqual } else { TokenKind::Equal };
                self.make_token(kind)
            }
            b'<' => {
                let kind = if self.matches(b'=') { TokenKind::LessEqual } else { TokenKind::Less };
                self.make_token(kind)
            }
            b'>' => {
                let kind = if self.matches(b'=') { TokenKind::GreaterEqual } else { TokenKind::Greater };
                self.make_token(kind)
            }
            b'"' => self.string(),
            _ => self.error_token("Unexpected character."),
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.bytes.len()
    }

    fn advance(&mut self) -> u8 {
        let c = self.bytes[self.current];
        self.current += 1;
        c
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() { 0 } else { self.bytes[self.current] }
    }

    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.bytes.len() { 0 } else { self.bytes[self.current + 1] }
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.bytes[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                b' ' | b'\r' | b'\t' => {
                    self.advance();
                }
                b'\n' => {
                    self.line += 1;
                    self.advance();
                }
                b'/' if self.peek_next() == b'/' => {
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token<'src> {
        Token { kind, lexeme: &self.source[self.start..self.current], line: self.line }
    }

    fn error_token(&self, message: &'static str) -> Token<'src> {
        Token { kind: TokenKind::Error, lexeme: message, line: self.line }
    }

    fn string(&mut self) -> Token<'src> {
        while self.peek() != b'"' && !self.is_at_end() {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.advance();
        }
        if self.is_at_end() {
            return self.error_token("Unterminated string.");
        }
        self.advance(); // closing quote
        self.make_token(TokenKind::String)
    }

    fn number(&mut self) -> Token<'src> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        self.make_token(TokenKind::Number)
    }

    fn identifier(&mut self) -> Token<'src> {
        while is_alpha(self.peek()) || self.peek().is_ascii_digit() {
            self.advance();
        }
        self.make_token(self.identifier_kind())
    }

    /// Hand-written trie over the keyword set, falling back to `Identifier`.
    fn identifier_kind(&self) -> TokenKind {
        let text = &self.source[self.start..self.current];
        match self.bytes[self.start] {
            b'a' => self.check_keyword(text, "and", TokenKind::And),
            b'c' => self.check_keyword(text, "class", TokenKind::Class),
            b'e' => self.check_keyword(text, "else", TokenKind::Else),
            b'f' if text.len() > 1 => match self.bytes[self.start + 1] {
                b'a' => self.check_keyword(text, "false", TokenKind::False),
                b'o' => self.check_keyword(text, "for", TokenKind::For),
                b'u' => self.check_keyword(text, "fun", TokenKind::Fun),
                _ => TokenKind::Identifier,
            },
            b'i' => self.check_keyword(text, "if", TokenKind::If),
            b'n' => self.check_keyword(text, "nil", TokenKind::Nil),
            b'o' => self.check_keyword(text, "or", TokenKind::Or),
            b'p' => self.check_keyword(text, "print", TokenKind::Print),
            b'r' => self.check_keyword(text, "return", TokenKind::Return),
            b's' => self.check_keyword(text, "super", TokenKind::Super),
            b't' if text.len() > 1 => match self.bytes[self.start + 1] {
                b'h' => self.check_keyword(text, "this", TokenKind::This),
                b'r' => self.check_keyword(text, "true", TokenKind::True),
                _ => TokenKind::Identifier,
            },
            b'v' => self.check_keyword(text, "var", TokenKind::Var),
            b'w' => self.check_keyword(text, "while", TokenKind::While),
            _ => TokenKind::Identifier,
        }
    }

    fn check_keyword(&self, text: &str, keyword: &str, kind: TokenKind) -> TokenKind {
        if text == keyword { kind } else { TokenKind::Identifier }
    }
}

fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(src);
        let mut out = Vec::new();
        loop {
            let tok = scanner.scan_token();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn scans_arithmetic_expression() {
        let k = kinds("1 + 2 * 3;");
        assert_eq!(
            k,
            vec![
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Star,
                TokenKind::Number,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_line_comments() {
        let k = kinds("// hello\nvar x = 1;");
        assert_eq!(k[0], TokenKind::Var);
    }

    #[test]
    fn number_with_trailing_dot_is_not_consumed() {
        let mut scanner = Scanner::new("1.");
        let tok = scanner.scan_token();
        assert_eq!(tok.kind, TokenKind::Number);
        assert_eq!(tok.lexeme, "1");
        let dot = scanner.scan_token();
        assert_eq!(dot.kind, TokenKind::Dot);
    }

    #[test]
    fn unterminated_string_is_error_token() {
        let mut scanner = Scanner::new("\"abc");
        let tok = scanner.scan_token();
        assert_eq!(tok.kind, TokenKind::Error);
        assert_eq!(tok.lexeme, "Unterminated string.");
    }

    #[test]
    fn keywords_recognized_and_prefixes_are_identifiers() {
        assert_eq!(kinds("forest")[0], TokenKind::Identifier);
        assert_eq!(kinds("for")[0], TokenKind::For);
        assert_eq!(kinds("this")[0], TokenKind::This);
        assert_eq!(kinds("thisx")[0], TokenKind::Identifier);
    }
}
