//! Tokenizer for host-language source files.
//!
//! Produces the token stream the declaration parser consumes. Statement
//! termination at line breaks follows the host language's insertion rule,
//! so the parser only ever sees explicit `Semicolon` tokens.

use crate::parser::token::{Span, Token, TokenKind};
use tracing::trace;

/// Three-character operators, longest-munch first.
const OPS3: &[&str] = &["<<=", ">>=", "&^=", "..."];

/// Two-character operators.
const OPS2: &[&str] = &[
    "==", "!=", "<=", ">=", "&&", "||", "<-", "++", "--", "+=", "-=", "*=",
    "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^", ":=",
];

/// A tokenizer that produces tokens from source text.
#[derive(Clone)]
pub struct Tokenizer<'src> {
    /// The source text being tokenized.
    source: &'src str,
    /// The remaining source text (suffix of `source`).
    remaining: &'src str,
    /// Current byte position in `source`.
    pos: u32,
    /// Current 1-based line number.
    line: u32,
    /// Kind and text of the last non-comment token, for statement
    /// termination at line breaks.
    last_significant: Option<(TokenKind, &'src str)>,
}

impl<'src> Tokenizer<'src> {
    /// Create a new tokenizer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            remaining: source,
            pos: 0,
            line: 1,
            last_significant: None,
        }
    }

    /// Check if we're at the end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Peek at the next character without consuming it.
    #[inline]
    fn peek(&self) -> Option<char> {
        self.remaining.chars().next()
    }

    /// Peek at the nth character (0-indexed) without consuming.
    #[inline]
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining.chars().nth(n)
    }

    /// Advance by one character and return it.
    #[inline]
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        if c == '\n' {
            self.line += 1;
        }
        self.pos += c.len_utf8() as u32;
        self.remaining = &self.remaining[c.len_utf8()..];
        Some(c)
    }

    /// Advance by n bytes (must not cross a newline).
    #[inline]
    fn advance_by(&mut self, n: usize) {
        self.pos += n as u32;
        self.remaining = &self.remaining[n..];
    }

    /// Check if the remaining text starts with the given prefix.
    #[inline]
    fn starts_with(&self, prefix: &str) -> bool {
        self.remaining.starts_with(prefix)
    }

    /// Create a token from the given start position to the current position.
    fn token(&mut self, kind: TokenKind, start: u32, line: u32) -> Token<'src> {
        let span = Span::new(start, self.pos);
        let text = &self.source[start as usize..self.pos as usize];
        if !kind.is_comment() {
            self.last_significant = Some((kind, text));
        }
        trace!("token {:?} at line {}: {:?}", kind, line, text);
        Token::new(kind, span, text, line)
    }

    /// Whether a line break at the current point terminates the statement.
    fn line_break_terminates(&self) -> bool {
        match self.last_significant {
            Some((kind, text)) => kind.terminates_statement(text),
            None => false,
        }
    }

    /// Emit an inserted semicolon for the line break at the current position.
    fn inserted_semicolon(&mut self) -> Token<'src> {
        let span = Span::new(self.pos, self.pos);
        self.last_significant = Some((TokenKind::Semicolon, ";"));
        Token::new(TokenKind::Semicolon, span, "\n", self.line)
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token<'src> {
        // Skip horizontal whitespace; a newline may become a semicolon.
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('\n') => {
                    if self.line_break_terminates() {
                        let tok = self.inserted_semicolon();
                        self.advance();
                        return tok;
                    }
                    self.advance();
                }
                _ => break,
            }
        }

        if self.is_eof() {
            // A final statement without a trailing newline still terminates.
            if self.line_break_terminates() {
                return self.inserted_semicolon();
            }
            return Token::new(
                TokenKind::Eof,
                Span::new(self.pos, self.pos),
                "",
                self.line,
            );
        }

        let start = self.pos;
        let line = self.line;
        let c = match self.peek() {
            Some(c) => c,
            None => {
                return Token::new(TokenKind::Eof, Span::new(self.pos, self.pos), "", self.line)
            }
        };

        // Comments
        if self.starts_with("//") {
            while let Some(c) = self.peek() {
                if c == '\n' {
                    break;
                }
                self.advance();
            }
            return self.token(TokenKind::LineComment, start, line);
        }
        if self.starts_with("/*") {
            self.advance_by(2);
            while !self.is_eof() && !self.starts_with("*/") {
                self.advance();
            }
            if self.starts_with("*/") {
                self.advance_by(2);
            }
            return self.token(TokenKind::BlockComment, start, line);
        }

        match c {
            '(' => {
                self.advance();
                self.token(TokenKind::LParen, start, line)
            }
            ')' => {
                self.advance();
                self.token(TokenKind::RParen, start, line)
            }
            '{' => {
                self.advance();
                self.token(TokenKind::LBrace, start, line)
            }
            '}' => {
                self.advance();
                self.token(TokenKind::RBrace, start, line)
            }
            '[' => {
                self.advance();
                self.token(TokenKind::LBracket, start, line)
            }
            ']' => {
                self.advance();
                self.token(TokenKind::RBracket, start, line)
            }
            ',' => {
                self.advance();
                self.token(TokenKind::Comma, start, line)
            }
            ';' => {
                self.advance();
                self.token(TokenKind::Semicolon, start, line)
            }
            '"' => self.tokenize_string(start, line),
            '`' => self.tokenize_raw_string(start, line),
            '\'' => self.tokenize_rune(start, line),
            '.' => {
                // Could be `.`, `...`, or the start of a float like `.5`.
                if self.peek_nth(1).is_some_and(|d| d.is_ascii_digit()) {
                    return self.tokenize_number(start, line);
                }
                if self.starts_with("...") {
                    self.advance_by(3);
                    return self.token(TokenKind::Op, start, line);
                }
                self.advance();
                self.token(TokenKind::Dot, start, line)
            }
            c if c.is_ascii_digit() => self.tokenize_number(start, line),
            c if is_ident_start(c) => {
                while let Some(c) = self.peek() {
                    if is_ident_continue(c) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                self.token(TokenKind::Ident, start, line)
            }
            _ => self.tokenize_operator(start, line),
        }
    }

    fn tokenize_operator(&mut self, start: u32, line: u32) -> Token<'src> {
        for op in OPS3 {
            if self.starts_with(op) {
                self.advance_by(op.len());
                return self.token(TokenKind::Op, start, line);
            }
        }
        for op in OPS2 {
            if self.starts_with(op) {
                self.advance_by(op.len());
                return self.token(TokenKind::Op, start, line);
            }
        }
        let c = self.peek().unwrap_or('\0');
        if "+-*/%&|^<>!=:~".contains(c) {
            self.advance();
            return self.token(TokenKind::Op, start, line);
        }
        self.advance();
        self.token(TokenKind::Error, start, line)
    }

    fn tokenize_string(&mut self, start: u32, line: u32) -> Token<'src> {
        self.advance(); // opening quote
        while let Some(c) = self.peek() {
            match c {
                '"' => {
                    self.advance();
                    return self.token(TokenKind::Str, start, line);
                }
                '\\' => {
                    self.advance();
                    self.advance();
                }
                '\n' => break,
                _ => {
                    self.advance();
                }
            }
        }
        self.token(TokenKind::Error, start, line)
    }

    fn tokenize_raw_string(&mut self, start: u32, line: u32) -> Token<'src> {
        self.advance(); // opening backtick
        while let Some(c) = self.peek() {
            if c == '`' {
                self.advance();
                return self.token(TokenKind::RawStr, start, line);
            }
            self.advance();
        }
        self.token(TokenKind::Error, start, line)
    }

    fn tokenize_rune(&mut self, start: u32, line: u32) -> Token<'src> {
        self.advance(); // opening quote
        while let Some(c) = self.peek() {
            match c {
                '\'' => {
                    self.advance();
                    return self.token(TokenKind::Rune, start, line);
                }
                '\\' => {
                    self.advance();
                    self.advance();
                }
                '\n' => break,
                _ => {
                    self.advance();
                }
            }
        }
        self.token(TokenKind::Error, start, line)
    }

    fn tokenize_number(&mut self, start: u32, line: u32) -> Token<'src> {
        let mut is_float = false;

        if self.starts_with("0x") || self.starts_with("0X") {
            self.advance_by(2);
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit() || c == '_') {
                self.advance();
            }
            return self.token(TokenKind::Int, start, line);
        }
        if self.starts_with("0b") || self.starts_with("0B") || self.starts_with("0o")
            || self.starts_with("0O")
        {
            self.advance_by(2);
            while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
                self.advance();
            }
            return self.token(TokenKind::Int, start, line);
        }

        while let Some(c) = self.peek() {
            match c {
                '0'..='9' | '_' => {
                    self.advance();
                }
                '.' => {
                    // A second dot ends the literal (`1..2` never appears in
                    // declarations, but selector chains like `1.e` do not).
                    if is_float {
                        break;
                    }
                    is_float = true;
                    self.advance();
                }
                'e' | 'E' => {
                    is_float = true;
                    self.advance();
                    if self.peek() == Some('+') || self.peek() == Some('-') {
                        self.advance();
                    }
                }
                'i' => {
                    // Imaginary suffix.
                    is_float = true;
                    self.advance();
                    break;
                }
                _ => break,
            }
        }

        let kind = if is_float { TokenKind::Float } else { TokenKind::Int };
        self.token(kind, start, line)
    }

    /// Tokenize the entire input.
    pub fn tokenize(source: &'src str) -> Vec<Token<'src>> {
        let mut tokenizer = Tokenizer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = tokenizer.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }
}

#[inline]
fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

#[inline]
fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Decodes an interpreted string literal token into its value.
///
/// Handles the escapes that occur in struct tags and annotation strings.
/// Unknown escapes are preserved verbatim.
pub fn unquote(text: &str) -> String {
    let inner = text
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(text);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Strips the backticks from a raw string literal token.
pub fn unquote_raw(text: &str) -> &str {
    text.strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(TokenKind, String)> {
        Tokenizer::tokenize(source)
            .into_iter()
            .map(|t| (t.kind, t.text.to_string()))
            .collect()
    }

    #[test]
    fn test_tokenize_type_declaration() {
        let tokens = kinds("type User struct {\n\tName string\n}\n");
        let texts: Vec<&str> = tokens.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(
            texts,
            vec!["type", "User", "struct", "{", "Name", "string", "\n", "}", "\n", ""]
        );
    }

    #[test]
    fn test_semicolon_insertion_only_after_terminators() {
        // No semicolon after `struct` or `{`, one after `string` and `}`.
        let tokens = kinds("type T struct {\n}\n");
        let semis = tokens
            .iter()
            .filter(|(k, _)| *k == TokenKind::Semicolon)
            .count();
        assert_eq!(semis, 1);
    }

    #[test]
    fn test_tokenize_struct_tag() {
        let tokens = kinds("Name string `json:\"name\"`\n");
        assert!(tokens
            .iter()
            .any(|(k, t)| *k == TokenKind::RawStr && t == "`json:\"name\"`"));
    }

    #[test]
    fn test_tokenize_numbers() {
        let tokens = kinds("1 0x1F 0b101 2.5 1e9 3i");
        let kinds: Vec<TokenKind> = tokens.iter().map(|(k, _)| *k).take(6).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Int,
                TokenKind::Int,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Float
            ]
        );
    }

    #[test]
    fn test_tokenize_operators() {
        let tokens = kinds("x := 1 << 2 &^ 3");
        let ops: Vec<&str> = tokens
            .iter()
            .filter(|(k, _)| *k == TokenKind::Op)
            .map(|(_, t)| t.as_str())
            .collect();
        assert_eq!(ops, vec![":=", "<<", "&^"]);
    }

    #[test]
    fn test_comment_tokens() {
        let tokens = kinds("// @Summary List accounts\ntype T int\n");
        assert_eq!(tokens[0].0, TokenKind::LineComment);
        assert_eq!(tokens[0].1, "// @Summary List accounts");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""a\"b\n""#), "a\"b\n");
        assert_eq!(unquote_raw("`json:\"x\"`"), "json:\"x\"");
    }
}
