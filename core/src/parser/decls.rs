//! # Declaration Parser
//!
//! Recursive-descent parser over the token stream. Only declarations are
//! materialized: package clause, imports, type and const declarations, and
//! function headers. Function bodies are scanned for local type
//! declarations and otherwise skipped by bracket matching.

use crate::error::{AppError, AppResult};
use crate::parser::ast::{
    ConstBlock, ConstExpr, ConstSpec, Decl, Field, File, FuncDecl, ImportSpec,
    StructBody, TypeBody, TypeExpr, TypeSpec,
};
use crate::parser::lexer::{unquote, unquote_raw, Tokenizer};
use crate::parser::token::{Token, TokenKind};

/// Parses one source file into its declaration tree.
pub fn parse_file(path: &str, source: &str) -> AppResult<File> {
    let tokens = Tokenizer::tokenize(source);
    let mut parser = Parser {
        path,
        tokens,
        pos: 0,
        pending_comments: Vec::new(),
        trailing_comment: None,
        last_line: 0,
    };
    parser.parse_file()
}

/// Parses a standalone type expression, as written in annotation tokens
/// (`[]account.Account`, `map[string]Item`, `Wrapper[string]`).
pub fn parse_type_expr_str(text: &str) -> AppResult<TypeExpr> {
    let tokens = Tokenizer::tokenize(text);
    let mut parser = Parser {
        path: "<annotation>",
        tokens,
        pos: 0,
        pending_comments: Vec::new(),
        trailing_comment: None,
        last_line: 0,
    };
    let expr = parser.parse_type_expr()?;
    parser.skip_semis();
    if !parser.at_eof() {
        let token = parser.bump();
        return Err(AppError::Parse(format!(
            "trailing input '{}' after type '{}'",
            token.text, text
        )));
    }
    Ok(expr)
}

struct Parser<'src> {
    path: &'src str,
    tokens: Vec<Token<'src>>,
    pos: usize,
    /// Comment lines waiting to be claimed as a doc block: `(line, text)`.
    pending_comments: Vec<(u32, String)>,
    /// A comment that shares a line with the token before it.
    trailing_comment: Option<(u32, String)>,
    /// Line of the last significant token consumed or peeked past.
    last_line: u32,
}

impl<'src> Parser<'src> {
    fn err(&self, line: u32, msg: impl Into<String>) -> AppError {
        AppError::Parse(format!("{}:{}: {}", self.path, line, msg.into()))
    }

    /// Folds comment tokens at the cursor into the pending doc block.
    fn skip_comments(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            if !token.kind.is_comment() {
                break;
            }
            let trailing = token.line == self.last_line && self.last_line != 0;
            let lines = clean_comment(token.kind, token.text);
            let mut line = token.line;
            for text in lines {
                if trailing {
                    self.trailing_comment = Some((line, text));
                } else {
                    self.pending_comments.push((line, text));
                }
                line += 1;
            }
            self.pos += 1;
        }
    }

    /// The current significant token.
    fn peek(&mut self) -> &Token<'src> {
        self.skip_comments();
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// The significant token after the current one.
    fn peek2(&mut self) -> Token<'src> {
        self.skip_comments();
        let mut idx = self.pos + 1;
        while let Some(token) = self.tokens.get(idx) {
            if !token.kind.is_comment() {
                return token.clone();
            }
            idx += 1;
        }
        self.tokens[self.tokens.len() - 1].clone()
    }

    /// Consumes and returns the current significant token.
    fn bump(&mut self) -> Token<'src> {
        self.skip_comments();
        let idx = self.pos.min(self.tokens.len() - 1);
        let token = self.tokens[idx].clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        self.last_line = token.line;
        token
    }

    fn at_eof(&mut self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn at_text(&mut self, text: &str) -> bool {
        self.peek().text == text
    }

    fn expect_kind(&mut self, kind: TokenKind, what: &str) -> AppResult<Token<'src>> {
        let token = self.bump();
        if token.kind != kind {
            return Err(self.err(
                token.line,
                format!("expected {}, found '{}'", what, token.text),
            ));
        }
        Ok(token)
    }

    fn expect_ident(&mut self, what: &str) -> AppResult<Token<'src>> {
        self.expect_kind(TokenKind::Ident, what)
    }

    fn expect_text(&mut self, text: &str) -> AppResult<Token<'src>> {
        let token = self.bump();
        if token.text != text {
            return Err(self.err(
                token.line,
                format!("expected '{}', found '{}'", text, token.text),
            ));
        }
        Ok(token)
    }

    fn skip_semis(&mut self) {
        while self.peek().kind == TokenKind::Semicolon {
            self.bump();
        }
    }

    fn expect_terminator(&mut self) -> AppResult<()> {
        let token = self.peek();
        match token.kind {
            TokenKind::Semicolon => {
                self.bump();
                Ok(())
            }
            // A closing bracket may legally end the last spec of a group.
            TokenKind::RBrace | TokenKind::RParen | TokenKind::Eof => Ok(()),
            _ => {
                let (line, text) = (token.line, token.text.to_string());
                Err(self.err(line, format!("expected end of declaration, found '{}'", text)))
            }
        }
    }

    /// Claims the contiguous comment block ending on the line above `line`.
    /// Everything older in the pending set is discarded.
    fn take_doc(&mut self, line: u32) -> Vec<String> {
        let pending = std::mem::take(&mut self.pending_comments);
        let mut doc: Vec<String> = Vec::new();
        let mut expect = line;
        for (comment_line, text) in pending.into_iter().rev() {
            if comment_line + 1 != expect {
                break;
            }
            expect = comment_line;
            doc.push(text);
        }
        doc.reverse();
        doc
    }

    /// Claims a trailing comment recorded for `line`.
    fn take_trailing(&mut self, line: u32) -> Option<String> {
        match self.trailing_comment.take() {
            Some((comment_line, text)) if comment_line == line => Some(text),
            other => {
                self.trailing_comment = other;
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // File structure
    // ------------------------------------------------------------------

    fn parse_file(&mut self) -> AppResult<File> {
        self.skip_semis();
        let package_line = self.peek().line;
        self.expect_text("package")?;
        let package_doc = self.take_doc(package_line);
        let package = self.expect_ident("package name")?.text.to_string();
        self.expect_terminator()?;

        let mut imports = Vec::new();
        loop {
            self.skip_semis();
            if !self.at_text("import") {
                break;
            }
            self.parse_import_decl(&mut imports)?;
        }

        let mut decls = Vec::new();
        loop {
            self.skip_semis();
            if self.at_eof() {
                break;
            }
            let line = self.peek().line;
            match self.peek().text {
                "type" => {
                    let specs = self.parse_type_decl()?;
                    decls.push(Decl::Type(specs));
                }
                "const" => {
                    let block = self.parse_const_block()?;
                    decls.push(Decl::Const(block));
                }
                "var" => self.skip_var_decl()?,
                "func" => {
                    let func = self.parse_func_decl()?;
                    decls.push(Decl::Func(func));
                }
                "import" => {
                    // Imports after other declarations are still legal input
                    // for lookup purposes.
                    self.parse_import_decl(&mut imports)?;
                }
                other => {
                    return Err(self.err(
                        line,
                        format!("unexpected token '{}' at top level", other),
                    ));
                }
            }
        }

        Ok(File {
            path: self.path.to_string(),
            package,
            package_doc,
            imports,
            decls,
        })
    }

    fn parse_import_decl(&mut self, imports: &mut Vec<ImportSpec>) -> AppResult<()> {
        self.expect_text("import")?;
        if self.peek().kind == TokenKind::LParen {
            self.bump();
            loop {
                self.skip_semis();
                if self.peek().kind == TokenKind::RParen {
                    self.bump();
                    break;
                }
                imports.push(self.parse_import_spec()?);
                self.expect_terminator()?;
            }
        } else {
            imports.push(self.parse_import_spec()?);
        }
        self.expect_terminator()
    }

    fn parse_import_spec(&mut self) -> AppResult<ImportSpec> {
        let token = self.bump();
        match token.kind {
            TokenKind::Str => Ok(ImportSpec {
                alias: None,
                path: unquote(token.text),
            }),
            TokenKind::Ident | TokenKind::Dot => {
                let alias = token.text.to_string();
                let path_token = self.expect_kind(TokenKind::Str, "import path")?;
                Ok(ImportSpec {
                    alias: Some(alias),
                    path: unquote(path_token.text),
                })
            }
            _ => Err(self.err(
                token.line,
                format!("expected import spec, found '{}'", token.text),
            )),
        }
    }

    // ------------------------------------------------------------------
    // Type declarations
    // ------------------------------------------------------------------

    fn parse_type_decl(&mut self) -> AppResult<Vec<TypeSpec>> {
        let decl_line = self.peek().line;
        self.expect_text("type")?;
        let decl_doc = self.take_doc(decl_line);

        if self.peek().kind == TokenKind::LParen {
            self.bump();
            let mut specs = Vec::new();
            loop {
                self.skip_semis();
                if self.peek().kind == TokenKind::RParen {
                    self.bump();
                    break;
                }
                let line = self.peek().line;
                let doc = self.take_doc(line);
                specs.push(self.parse_type_spec(doc, line)?);
                self.expect_terminator()?;
            }
            self.expect_terminator()?;
            Ok(specs)
        } else {
            let line = self.peek().line;
            let spec = self.parse_type_spec(decl_doc, line)?;
            self.expect_terminator()?;
            Ok(vec![spec])
        }
    }

    fn parse_type_spec(&mut self, doc: Vec<String>, line: u32) -> AppResult<TypeSpec> {
        let name = self.expect_ident("type name")?.text.to_string();

        let type_params = if self.peek().kind == TokenKind::LBracket && self.brackets_are_type_params()
        {
            self.parse_type_params()?
        } else {
            Vec::new()
        };

        // Alias form `type X = Y` and definition form `type X Y` are the
        // same thing to the schema pipeline.
        if self.at_text("=") {
            self.bump();
        }

        let body = self.parse_type_body()?;

        Ok(TypeSpec {
            doc,
            name,
            type_params,
            body,
            line,
        })
    }

    /// Disambiguates `type X[T any] ...` from `type X [N]Elem`.
    ///
    /// Generic parameter lists contain an identifier directly followed by
    /// the start of its constraint; array lengths are single expressions
    /// where that adjacency never occurs.
    fn brackets_are_type_params(&mut self) -> bool {
        self.skip_comments();
        let mut idx = self.pos; // at '['
        let mut depth = 0usize;
        let mut prev_was_ident = false;
        while let Some(token) = self.tokens.get(idx) {
            match token.kind {
                TokenKind::LBracket | TokenKind::LParen | TokenKind::LBrace => depth += 1,
                TokenKind::RBracket | TokenKind::RParen | TokenKind::RBrace => {
                    if depth <= 1 {
                        return false;
                    }
                    depth -= 1;
                }
                TokenKind::Ident if depth == 1 => {
                    if prev_was_ident {
                        return true;
                    }
                    prev_was_ident = true;
                    idx += 1;
                    continue;
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            prev_was_ident = false;
            idx += 1;
        }
        false
    }

    fn parse_type_params(&mut self) -> AppResult<Vec<String>> {
        self.expect_kind(TokenKind::LBracket, "'['")?;
        let mut names = Vec::new();
        let mut group_has_name = false;
        let mut depth = 0usize;
        loop {
            let token = self.bump();
            match token.kind {
                TokenKind::Eof => {
                    return Err(self.err(token.line, "unterminated type parameter list"))
                }
                TokenKind::LBracket | TokenKind::LParen | TokenKind::LBrace => depth += 1,
                TokenKind::RBracket if depth == 0 => break,
                TokenKind::RBracket | TokenKind::RParen | TokenKind::RBrace => depth -= 1,
                TokenKind::Comma if depth == 0 => group_has_name = false,
                TokenKind::Ident if depth == 0 && !group_has_name => {
                    names.push(token.text.to_string());
                    group_has_name = true;
                }
                _ => {}
            }
        }
        Ok(names)
    }

    fn parse_type_body(&mut self) -> AppResult<TypeBody> {
        match self.peek().text {
            "struct" => {
                self.bump();
                Ok(TypeBody::Struct(self.parse_struct_body()?))
            }
            "interface" => {
                self.bump();
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
                Ok(TypeBody::Interface)
            }
            _ => Ok(TypeBody::Alias(self.parse_type_expr()?)),
        }
    }

    // ------------------------------------------------------------------
    // Struct bodies and type expressions
    // ------------------------------------------------------------------

    fn parse_struct_body(&mut self) -> AppResult<StructBody> {
        self.expect_kind(TokenKind::LBrace, "'{'")?;
        let mut fields = Vec::new();
        loop {
            self.skip_semis();
            if self.peek().kind == TokenKind::RBrace {
                self.bump();
                break;
            }
            if self.at_eof() {
                let line = self.peek().line;
                return Err(self.err(line, "unterminated struct body"));
            }
            fields.push(self.parse_field()?);
        }
        Ok(StructBody { fields })
    }

    fn parse_field(&mut self) -> AppResult<Field> {
        let line = self.peek().line;
        let doc = self.take_doc(line);

        let names = self.parse_field_names()?;
        let type_expr = self.parse_type_expr()?;

        let tag = match self.peek().kind {
            TokenKind::Str => Some(unquote(self.bump().text)),
            TokenKind::RawStr => Some(unquote_raw(self.bump().text).to_string()),
            _ => None,
        };

        self.expect_terminator()?;
        let comment = self.take_trailing(self.last_line);

        Ok(Field {
            doc,
            comment,
            names,
            type_expr,
            tag,
        })
    }

    /// Parses the name list of a field, or returns empty for an embedded
    /// field (leaving its type expression unconsumed).
    fn parse_field_names(&mut self) -> AppResult<Vec<String>> {
        let first = self.peek().clone();
        if first.kind != TokenKind::Ident || crate::parser::token::is_keyword(first.text) {
            // `*T`, `map[...]`, inline structs: only valid with no name when
            // embedded (pointer) or after names (others); the type parser
            // sorts it out.
            return Ok(Vec::new());
        }

        let second = self.peek2();
        match second.kind {
            // `A, B string`
            TokenKind::Comma => {
                let mut names = vec![self.bump().text.to_string()];
                while self.peek().kind == TokenKind::Comma {
                    self.bump();
                    names.push(self.expect_ident("field name")?.text.to_string());
                }
                Ok(names)
            }
            // `Base` / `Base `json:"..."``
            TokenKind::Semicolon | TokenKind::Str | TokenKind::RawStr | TokenKind::RBrace => {
                Ok(Vec::new())
            }
            // `pkg.Base` embedded selector; a named selector field would be
            // `Name pkg.Base` with an identifier in second position.
            TokenKind::Dot => Ok(Vec::new()),
            // `Base[T]` embedded generic vs `Name [N]Elem` named array:
            // embedded when the bracket group is followed by a terminator
            // or tag.
            TokenKind::LBracket => {
                if self.generic_embedding_ahead() {
                    Ok(Vec::new())
                } else {
                    Ok(vec![self.bump().text.to_string()])
                }
            }
            _ => Ok(vec![self.bump().text.to_string()]),
        }
    }

    /// Lookahead for `Base[T]` embeddings: after the matching `]` the field
    /// must end (terminator, tag, or closing brace).
    fn generic_embedding_ahead(&mut self) -> bool {
        self.skip_comments();
        let mut idx = self.pos + 1; // at '['
        let mut depth = 0usize;
        while let Some(token) = self.tokens.get(idx) {
            if token.kind.is_comment() {
                idx += 1;
                continue;
            }
            match token.kind {
                TokenKind::LBracket => depth += 1,
                TokenKind::RBracket => {
                    depth -= 1;
                    if depth == 0 {
                        let mut next = idx + 1;
                        while self
                            .tokens
                            .get(next)
                            .is_some_and(|t| t.kind.is_comment())
                        {
                            next += 1;
                        }
                        return matches!(
                            self.tokens.get(next).map(|t| t.kind),
                            Some(TokenKind::Semicolon)
                                | Some(TokenKind::Str)
                                | Some(TokenKind::RawStr)
                                | Some(TokenKind::RBrace)
                        );
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            idx += 1;
        }
        false
    }

    fn parse_type_expr(&mut self) -> AppResult<TypeExpr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Op if token.text == "*" => {
                self.bump();
                Ok(TypeExpr::Pointer(Box::new(self.parse_type_expr()?)))
            }
            TokenKind::Op if token.text == "<-" => {
                self.bump();
                self.expect_text("chan")?;
                self.parse_type_expr()?;
                Ok(TypeExpr::Unsupported)
            }
            TokenKind::LBracket => {
                self.bump();
                if self.peek().kind == TokenKind::RBracket {
                    self.bump();
                } else {
                    // Fixed length or `...`; the value is irrelevant.
                    self.skip_until_bracket_close()?;
                }
                Ok(TypeExpr::Array(Box::new(self.parse_type_expr()?)))
            }
            TokenKind::Ident => match token.text {
                "map" => {
                    self.bump();
                    self.expect_kind(TokenKind::LBracket, "'['")?;
                    let key = self.parse_type_expr()?;
                    self.expect_kind(TokenKind::RBracket, "']'")?;
                    let value = self.parse_type_expr()?;
                    Ok(TypeExpr::Map {
                        key: Box::new(key),
                        value: Box::new(value),
                    })
                }
                "interface" => {
                    self.bump();
                    self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
                    Ok(TypeExpr::Interface)
                }
                "any" => {
                    self.bump();
                    Ok(TypeExpr::Interface)
                }
                "struct" => {
                    self.bump();
                    Ok(TypeExpr::Struct(self.parse_struct_body()?))
                }
                "func" => {
                    self.bump();
                    self.skip_func_signature()?;
                    Ok(TypeExpr::Unsupported)
                }
                "chan" => {
                    self.bump();
                    if self.at_text("<-") {
                        self.bump();
                    }
                    self.parse_type_expr()?;
                    Ok(TypeExpr::Unsupported)
                }
                _ => {
                    let name = self.bump().text.to_string();
                    let base = if self.peek().kind == TokenKind::Dot {
                        self.bump();
                        let selected = self.expect_ident("selector name")?.text.to_string();
                        TypeExpr::Selector {
                            pkg: name,
                            name: selected,
                        }
                    } else {
                        TypeExpr::Ident(name)
                    };
                    if self.peek().kind == TokenKind::LBracket {
                        self.bump();
                        let mut args = Vec::new();
                        loop {
                            args.push(self.parse_type_expr()?);
                            match self.peek().kind {
                                TokenKind::Comma => {
                                    self.bump();
                                }
                                TokenKind::RBracket => {
                                    self.bump();
                                    break;
                                }
                                _ => {
                                    let t = self.bump();
                                    return Err(self.err(
                                        t.line,
                                        format!(
                                            "expected ',' or ']' in type arguments, found '{}'",
                                            t.text
                                        ),
                                    ));
                                }
                            }
                        }
                        Ok(TypeExpr::Generic {
                            base: Box::new(base),
                            args,
                        })
                    } else {
                        Ok(base)
                    }
                }
            },
            _ => Err(self.err(
                token.line,
                format!("expected type expression, found '{}'", token.text),
            )),
        }
    }

    /// Consumes tokens up to and including the `]` that closes the bracket
    /// already consumed by the caller.
    fn skip_until_bracket_close(&mut self) -> AppResult<()> {
        let mut depth = 1usize;
        loop {
            let token = self.bump();
            match token.kind {
                TokenKind::LBracket => depth += 1,
                TokenKind::RBracket => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                TokenKind::Eof => {
                    return Err(self.err(token.line, "unterminated '['"));
                }
                _ => {}
            }
        }
    }

    /// Consumes a balanced `open ... close` group, which must begin at the
    /// cursor.
    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) -> AppResult<()> {
        let first = self.bump();
        if first.kind != open {
            return Err(self.err(
                first.line,
                format!("expected group opener, found '{}'", first.text),
            ));
        }
        let mut depth = 1usize;
        loop {
            let token = self.bump();
            if token.kind == open {
                depth += 1;
            } else if token.kind == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            } else if token.kind == TokenKind::Eof {
                return Err(self.err(token.line, "unterminated group"));
            }
        }
    }

    /// Consumes a function signature after the `func` keyword: parameters
    /// and an optional result clause.
    fn skip_func_signature(&mut self) -> AppResult<()> {
        self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
        match self.peek().kind {
            TokenKind::LParen => self.skip_balanced(TokenKind::LParen, TokenKind::RParen),
            TokenKind::Semicolon
            | TokenKind::RBrace
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::LBrace
            | TokenKind::Str
            | TokenKind::RawStr
            | TokenKind::Comma
            | TokenKind::Eof => Ok(()),
            _ => {
                self.parse_type_expr()?;
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Const declarations
    // ------------------------------------------------------------------

    fn parse_const_block(&mut self) -> AppResult<ConstBlock> {
        self.expect_text("const")?;
        let mut specs = Vec::new();
        if self.peek().kind == TokenKind::LParen {
            self.bump();
            let mut iota = 0i64;
            loop {
                self.skip_semis();
                if self.peek().kind == TokenKind::RParen {
                    self.bump();
                    break;
                }
                specs.push(self.parse_const_spec(iota)?);
                self.expect_terminator()?;
                iota += 1;
            }
        } else {
            specs.push(self.parse_const_spec(0)?);
        }
        self.expect_terminator()?;
        Ok(ConstBlock { specs })
    }

    fn parse_const_spec(&mut self, iota: i64) -> AppResult<ConstSpec> {
        let line = self.peek().line;
        let doc = self.take_doc(line);

        let mut names = vec![self.expect_ident("constant name")?.text.to_string()];
        while self.peek().kind == TokenKind::Comma {
            self.bump();
            names.push(self.expect_ident("constant name")?.text.to_string());
        }

        let type_expr = if !self.at_text("=") && self.peek().kind != TokenKind::Semicolon
            && self.peek().kind != TokenKind::RParen
        {
            Some(self.parse_type_expr()?)
        } else {
            None
        };

        let mut values = Vec::new();
        if self.at_text("=") {
            self.bump();
            values.push(self.parse_const_expr()?);
            while self.peek().kind == TokenKind::Comma {
                self.bump();
                values.push(self.parse_const_expr()?);
            }
        }

        // Trailing comment is on the spec line (or consumed just after).
        let comment = self.take_trailing(line).or_else(|| {
            self.skip_comments();
            self.take_trailing(self.last_line)
        });

        Ok(ConstSpec {
            doc,
            comment,
            names,
            type_expr,
            values,
            iota,
        })
    }

    fn parse_const_expr(&mut self) -> AppResult<ConstExpr> {
        self.parse_binary_expr(1)
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> AppResult<ConstExpr> {
        let mut lhs = self.parse_unary_expr()?;
        loop {
            let op = {
                let token = self.peek();
                if token.kind != TokenKind::Op {
                    break;
                }
                token.text.to_string()
            };
            let prec = match binary_precedence(&op) {
                Some(p) if p >= min_prec => p,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_binary_expr(prec + 1)?;
            lhs = ConstExpr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary_expr(&mut self) -> AppResult<ConstExpr> {
        let token = self.peek().clone();
        if token.kind == TokenKind::Op && matches!(token.text, "-" | "+" | "^" | "!") {
            self.bump();
            let expr = self.parse_unary_expr()?;
            return Ok(ConstExpr::Unary {
                op: token.text.to_string(),
                expr: Box::new(expr),
            });
        }
        self.parse_primary_expr()
    }

    fn parse_primary_expr(&mut self) -> AppResult<ConstExpr> {
        let token = self.bump();
        let mut expr = match token.kind {
            TokenKind::Int => ConstExpr::Int(parse_int_literal(token.text).ok_or_else(
                || self.err(token.line, format!("invalid integer literal '{}'", token.text)),
            )?),
            TokenKind::Float => {
                let cleaned: String = token.text.chars().filter(|c| *c != '_').collect();
                let cleaned = cleaned.trim_end_matches('i').to_string();
                ConstExpr::Float(cleaned.parse::<f64>().map_err(|_| {
                    self.err(token.line, format!("invalid float literal '{}'", token.text))
                })?)
            }
            TokenKind::Str => ConstExpr::Str(unquote(token.text)),
            TokenKind::RawStr => ConstExpr::Str(unquote_raw(token.text).to_string()),
            TokenKind::Rune => {
                let inner = unquote(&format!(
                    "\"{}\"",
                    token.text.trim_matches('\'')
                ));
                ConstExpr::Rune(inner.chars().next().map(|c| c as i64).unwrap_or(0))
            }
            TokenKind::LParen => {
                let inner = self.parse_const_expr()?;
                self.expect_kind(TokenKind::RParen, "')'")?;
                ConstExpr::Paren(Box::new(inner))
            }
            TokenKind::Ident => {
                let name = token.text.to_string();
                if self.peek().kind == TokenKind::Dot {
                    self.bump();
                    let selected = self.expect_ident("selector name")?.text.to_string();
                    ConstExpr::Selector {
                        pkg: name,
                        name: selected,
                    }
                } else {
                    ConstExpr::Ident(name)
                }
            }
            _ => {
                return Err(self.err(
                    token.line,
                    format!("expected constant expression, found '{}'", token.text),
                ))
            }
        };

        // Conversion / single-argument call.
        while self.peek().kind == TokenKind::LParen {
            self.bump();
            let arg = self.parse_const_expr()?;
            self.expect_kind(TokenKind::RParen, "')'")?;
            expr = ConstExpr::Call {
                func: Box::new(expr),
                arg: Box::new(arg),
            };
        }

        Ok(expr)
    }

    // ------------------------------------------------------------------
    // Functions and vars
    // ------------------------------------------------------------------

    fn parse_func_decl(&mut self) -> AppResult<FuncDecl> {
        let decl_line = self.peek().line;
        self.expect_text("func")?;
        let doc = self.take_doc(decl_line);

        // Method receiver.
        if self.peek().kind == TokenKind::LParen {
            self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
        }

        let name = self.expect_ident("function name")?.text.to_string();

        if self.peek().kind == TokenKind::LBracket {
            self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket)?;
        }

        self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;

        // Result clause.
        match self.peek().kind {
            TokenKind::LParen => {
                self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
            }
            TokenKind::LBrace | TokenKind::Semicolon | TokenKind::Eof => {}
            _ => {
                self.parse_type_expr()?;
            }
        }

        let mut local_types = Vec::new();
        if self.peek().kind == TokenKind::LBrace {
            self.parse_func_body(&mut local_types)?;
        }

        Ok(FuncDecl {
            doc,
            name,
            local_types,
        })
    }

    /// Walks a function body by bracket depth, materializing only the
    /// `type` declarations found at statement starts.
    fn parse_func_body(&mut self, local_types: &mut Vec<TypeSpec>) -> AppResult<()> {
        self.expect_kind(TokenKind::LBrace, "'{'")?;
        let mut depth = 1usize;
        let mut stmt_start = true;
        loop {
            // Drop comment noise inside bodies.
            self.skip_comments();
            self.pending_comments.clear();
            self.trailing_comment = None;

            let token = self.peek().clone();
            match token.kind {
                TokenKind::Eof => {
                    return Err(self.err(token.line, "unterminated function body"))
                }
                TokenKind::RBrace => {
                    self.bump();
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                    stmt_start = false;
                }
                TokenKind::LBrace => {
                    self.bump();
                    depth += 1;
                    stmt_start = true;
                }
                TokenKind::Semicolon => {
                    self.bump();
                    stmt_start = true;
                }
                TokenKind::Ident if stmt_start && token.text == "type" => {
                    let specs = self.parse_type_decl()?;
                    local_types.extend(specs);
                    stmt_start = true;
                }
                _ => {
                    self.bump();
                    stmt_start = false;
                }
            }
        }
    }

    fn skip_var_decl(&mut self) -> AppResult<()> {
        self.expect_text("var")?;
        if self.peek().kind == TokenKind::LParen {
            self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
            return self.expect_terminator();
        }
        // Single spec: consume to the end of the statement, respecting
        // nesting (composite literals, function literals).
        let mut depth = 0usize;
        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Eof => return Ok(()),
                TokenKind::Semicolon if depth == 0 => {
                    self.bump();
                    return Ok(());
                }
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => {
                    self.bump();
                    depth += 1;
                }
                TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => {
                    if depth == 0 {
                        return Ok(());
                    }
                    self.bump();
                    depth -= 1;
                }
                _ => {
                    self.bump();
                }
            }
        }
    }
}

/// Splits a comment token into cleaned lines.
fn clean_comment(kind: TokenKind, text: &str) -> Vec<String> {
    match kind {
        TokenKind::LineComment => {
            let body = text.strip_prefix("//").unwrap_or(text);
            vec![body.strip_prefix(' ').unwrap_or(body).to_string()]
        }
        TokenKind::BlockComment => {
            let body = text
                .strip_prefix("/*")
                .and_then(|s| s.strip_suffix("*/"))
                .unwrap_or(text);
            body.lines()
                .map(|line| {
                    let line = line.trim_start();
                    let line = line.strip_prefix('*').unwrap_or(line);
                    line.strip_prefix(' ').unwrap_or(line).to_string()
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

fn binary_precedence(op: &str) -> Option<u8> {
    match op {
        "||" => Some(1),
        "&&" => Some(2),
        "==" | "!=" | "<" | "<=" | ">" | ">=" => Some(3),
        "+" | "-" | "|" | "^" => Some(4),
        "*" | "/" | "%" | "<<" | ">>" | "&" | "&^" => Some(5),
        _ => None,
    }
}

/// Parses an integer literal with radix prefixes and digit separators.
fn parse_int_literal(text: &str) -> Option<i64> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(bin) = cleaned.strip_prefix("0b").or_else(|| cleaned.strip_prefix("0B")) {
        return i64::from_str_radix(bin, 2).ok();
    }
    if let Some(oct) = cleaned.strip_prefix("0o").or_else(|| cleaned.strip_prefix("0O")) {
        return i64::from_str_radix(oct, 8).ok();
    }
    if cleaned.len() > 1 && cleaned.starts_with('0') && cleaned.chars().all(|c| c.is_ascii_digit())
    {
        return i64::from_str_radix(&cleaned[1..], 8).ok();
    }
    cleaned.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> File {
        parse_file("test.go", source).unwrap()
    }

    #[test]
    fn test_parse_package_and_imports() {
        let file = parse(
            r#"
// Package account holds account models.
package account

import (
	"time"
	uuid "github.com/google/uuid"
	_ "embed"
	. "math"
)
"#,
        );
        assert_eq!(file.package, "account");
        assert_eq!(file.package_doc, vec!["Package account holds account models."]);
        assert_eq!(file.imports.len(), 4);
        assert_eq!(file.imports[1].alias.as_deref(), Some("uuid"));
        assert_eq!(file.imports[1].path, "github.com/google/uuid");
        assert!(file.imports[3].is_dot());
    }

    #[test]
    fn test_parse_struct_with_tags() {
        let file = parse(
            r#"
package account

// Account is a user account.
type Account struct {
	ID    string `json:"id"`
	Email string `json:"email,omitempty"`
	Age   int
}
"#,
        );
        let (spec, parent) = file.type_specs().next().unwrap();
        assert!(parent.is_none());
        assert_eq!(spec.name, "Account");
        assert_eq!(spec.doc, vec!["Account is a user account."]);
        let TypeBody::Struct(body) = &spec.body else {
            panic!("expected struct body");
        };
        assert_eq!(body.fields.len(), 3);
        assert_eq!(body.fields[0].names, vec!["ID"]);
        assert_eq!(body.fields[0].tag.as_deref(), Some("json:\"id\""));
        assert_eq!(body.fields[2].tag, None);
    }

    #[test]
    fn test_parse_embedded_fields() {
        let file = parse(
            r#"
package account

type Account struct {
	Base
	base.Model
	*Audit
	Email string `json:"email"`
}
"#,
        );
        let (spec, _) = file.type_specs().next().unwrap();
        let TypeBody::Struct(body) = &spec.body else {
            panic!("expected struct body");
        };
        assert!(body.fields[0].is_embedded());
        assert_eq!(body.fields[0].type_expr, TypeExpr::Ident("Base".into()));
        assert!(body.fields[1].is_embedded());
        assert_eq!(
            body.fields[1].type_expr,
            TypeExpr::Selector {
                pkg: "base".into(),
                name: "Model".into()
            }
        );
        assert!(body.fields[2].is_embedded());
        assert!(!body.fields[3].is_embedded());
    }

    #[test]
    fn test_parse_complex_field_types() {
        let file = parse(
            r#"
package models

type Payload struct {
	Tags    []string
	Lookup  map[string][]*Item
	Any     interface{}
	AnyTwo  any
	Wrapped types.Field[string]
	Fn      func(int) error
	Fixed   [16]byte
}
"#,
        );
        let (spec, _) = file.type_specs().next().unwrap();
        let TypeBody::Struct(body) = &spec.body else {
            panic!("expected struct body");
        };
        assert_eq!(
            body.fields[0].type_expr,
            TypeExpr::Array(Box::new(TypeExpr::Ident("string".into())))
        );
        assert!(matches!(body.fields[1].type_expr, TypeExpr::Map { .. }));
        assert_eq!(body.fields[2].type_expr, TypeExpr::Interface);
        assert_eq!(body.fields[3].type_expr, TypeExpr::Interface);
        assert!(matches!(body.fields[4].type_expr, TypeExpr::Generic { .. }));
        assert_eq!(body.fields[5].type_expr, TypeExpr::Unsupported);
        assert!(matches!(body.fields[6].type_expr, TypeExpr::Array(_)));
    }

    #[test]
    fn test_parse_generic_type_declaration() {
        let file = parse(
            r#"
package response

type Wrapper[T any] struct {
	Data T `json:"data"`
}

type Pair[K comparable, V any] struct {
	Key   K `json:"key"`
	Value V `json:"value"`
}

type Buf [4]byte
"#,
        );
        let specs: Vec<_> = file.type_specs().collect();
        assert_eq!(specs[0].0.type_params, vec!["T"]);
        assert_eq!(specs[1].0.type_params, vec!["K", "V"]);
        assert!(specs[2].0.type_params.is_empty());
        assert!(matches!(specs[2].0.body, TypeBody::Alias(TypeExpr::Array(_))));
    }

    #[test]
    fn test_parse_const_block_with_iota() {
        let file = parse(
            r#"
package role

type Role int

const (
	// RoleAdmin can do everything.
	RoleAdmin Role = iota + 1
	RoleUser          // plain user
	RoleGuest
)
"#,
        );
        let block = file.const_blocks().next().unwrap();
        assert_eq!(block.specs.len(), 3);
        assert_eq!(block.specs[0].iota, 0);
        assert_eq!(block.specs[0].doc, vec!["RoleAdmin can do everything."]);
        assert!(block.specs[0].values.len() == 1);
        assert_eq!(block.specs[1].iota, 1);
        assert!(block.specs[1].values.is_empty());
        assert_eq!(block.specs[1].comment.as_deref(), Some("plain user"));
        assert_eq!(block.specs[2].iota, 2);
    }

    #[test]
    fn test_parse_func_with_annotations_and_local_types() {
        let file = parse(
            r#"
package handlers

// GetAccount fetches one account.
// @Summary Get account
// @Success 200 {object} account.Account
// @Router /accounts/{id} [get]
func GetAccount(w http.ResponseWriter, r *http.Request) {
	type localResponse struct {
		OK bool `json:"ok"`
	}
	var x = localResponse{OK: true}
	_ = x
}
"#,
        );
        let func = file.funcs().next().unwrap();
        assert_eq!(func.name, "GetAccount");
        assert!(func.doc.iter().any(|l| l.starts_with("@Summary")));
        assert_eq!(func.local_types.len(), 1);
        assert_eq!(func.local_types[0].name, "localResponse");
    }

    #[test]
    fn test_parse_method_receiver() {
        let file = parse(
            r#"
package account

func (a *Account) Validate() error {
	return nil
}
"#,
        );
        let func = file.funcs().next().unwrap();
        assert_eq!(func.name, "Validate");
    }

    #[test]
    fn test_parse_alias_declarations() {
        let file = parse(
            r#"
package models

type ID string
type Alias = Account
type List []Account
"#,
        );
        let specs: Vec<_> = file.type_specs().collect();
        assert_eq!(specs.len(), 3);
        assert!(matches!(
            &specs[0].0.body,
            TypeBody::Alias(TypeExpr::Ident(n)) if n == "string"
        ));
        assert!(matches!(
            &specs[1].0.body,
            TypeBody::Alias(TypeExpr::Ident(n)) if n == "Account"
        ));
        assert!(matches!(&specs[2].0.body, TypeBody::Alias(TypeExpr::Array(_))));
    }

    #[test]
    fn test_parse_error_reports_position() {
        let err = parse_file("bad.go", "package x\ntype {\n").unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("bad.go:2"), "unexpected message: {}", msg);
    }

    #[test]
    fn test_var_declarations_are_skipped() {
        let file = parse(
            r#"
package config

var Debug = false

var (
	Name    = "x"
	Timeout = 30
)

type Config struct {
	Name string `json:"name"`
}
"#,
        );
        assert_eq!(file.type_specs().count(), 1);
    }
}
