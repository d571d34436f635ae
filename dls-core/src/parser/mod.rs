// Recursive descent parser for DML
//
// The parser never gives up on a file: every unexpected token produces a
// SyntaxError diagnostic and recovery skips to the next synchronization
// point (a consumed `;` or the next core declaration keyword), tracking
// brace depth so a spurious `}` does not unwind past the enclosing block.
// Imports, the declared DML version and file-level template applications
// are collected as by-products of the parse.

mod decl;
mod expr;
mod stmt;
mod types;

use crate::ast::{Declaration, Ident, ImportDecl};
use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::lexer::{tokenize, Token, TokenKind};
use crate::source::ZeroSpan;
use std::path::{Path, PathBuf};

/// Parser state
pub struct Parser {
    file: PathBuf,
    tokens: Vec<Token>,
    cursor: usize,
    diagnostics: Diagnostics,
    imports: Vec<ImportDecl>,
    dml_version: Option<String>,
    /// Templates applied to the device through file-level `is` items
    device_templates: Vec<Ident>,
}

/// Everything a parse produces
pub struct ParseResult {
    pub declarations: Vec<Declaration>,
    pub diagnostics: Diagnostics,
    pub imports: Vec<ImportDecl>,
    pub dml_version: Option<String>,
    pub device_templates: Vec<Ident>,
}

impl Parser {
    pub fn new(source: &str, file: impl AsRef<Path>) -> Self {
        let tokens = tokenize(source, file.as_ref());
        Self {
            file: file.as_ref().to_path_buf(),
            tokens,
            cursor: 0,
            diagnostics: Diagnostics::new(),
            imports: Vec::new(),
            dml_version: None,
            device_templates: Vec::new(),
        }
    }

    /// Parse the whole token stream into top-level declarations
    pub fn parse(mut self) -> ParseResult {
        let mut declarations = Vec::new();
        while !self.at_end() {
            let before = self.cursor;
            self.parse_top_level(&mut declarations);
            if self.cursor == before {
                // always make progress, whatever the token was
                self.advance();
            }
        }
        ParseResult {
            declarations,
            diagnostics: self.diagnostics,
            imports: self.imports,
            dml_version: self.dml_version,
            device_templates: self.device_templates,
        }
    }

    // =========================================================================
    // Token operations
    // =========================================================================

    fn current(&self) -> &Token {
        self.tokens
            .get(self.cursor)
            .unwrap_or_else(|| &self.tokens[self.tokens.len() - 1])
    }

    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn current_span(&self) -> ZeroSpan {
        self.current().span.clone()
    }

    fn current_text(&self) -> &str {
        &self.current().text
    }

    fn previous_span(&self) -> ZeroSpan {
        let index = self.cursor.saturating_sub(1);
        self.tokens
            .get(index)
            .map(|t| t.span.clone())
            .unwrap_or_else(|| self.current_span())
    }

    fn peek_kind(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.cursor + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn at_end(&self) -> bool {
        self.current_kind() == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.at_end() {
            self.cursor += 1;
        }
        token
    }

    fn consume(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Expect a specific token kind, emitting a SyntaxError when absent
    fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            self.error_expected(kind.display_name());
            None
        }
    }

    /// Expect a name. DML lets a few soft keywords (`size`, `data`) stand
    /// in name position.
    fn expect_name(&mut self) -> Option<Ident> {
        if self.current_kind().is_name_like() {
            let token = self.advance();
            Some(Ident::new(token.text, token.span))
        } else {
            self.error_expected("identifier");
            None
        }
    }

    // =========================================================================
    // Error handling and recovery
    // =========================================================================

    fn error_expected(&mut self, what: &str) {
        let got = self.current_kind().display_name();
        let span = self.current_span();
        self.diagnostics.add(Diagnostic::error(
            DiagnosticKind::Syntax,
            format!("expected {}, found {}", what, got),
            span,
        ));
    }

    fn error_unexpected(&mut self) {
        let got = self.current_kind().display_name();
        let span = self.current_span();
        self.diagnostics.add(Diagnostic::error(
            DiagnosticKind::Syntax,
            format!("unexpected {}", got),
            span,
        ));
    }

    fn syntax_error(&mut self, message: impl Into<String>, span: ZeroSpan) {
        self.diagnostics
            .add(Diagnostic::error(DiagnosticKind::Syntax, message, span));
    }

    /// Skip to the next synchronization point: just past a `;`, or at the
    /// next core declaration keyword. Brace depth is tracked so recovery
    /// inside a body stops at the enclosing `}` instead of unwinding.
    fn synchronize(&mut self) {
        let mut depth: u32 = 0;
        while !self.at_end() {
            match self.current_kind() {
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.advance();
                }
                kind if depth == 0 && kind.is_sync_point() => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip a bracketed region that is tolerated but not modeled
    /// (object array dimensions such as `register regs[i < 4]`)
    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) {
        if !self.check(open) {
            return;
        }
        let mut depth = 0u32;
        while !self.at_end() {
            let kind = self.current_kind();
            self.advance();
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
    }
}

/// Parse DML source text
pub fn parse(source: &str, file: impl AsRef<Path>) -> ParseResult {
    Parser::new(source, file).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_and_device() {
        let result = parse("dml 1.4;\ndevice watchdog;\n", "test.dml");
        assert!(!result.diagnostics.has_errors());
        assert_eq!(result.declarations.len(), 2);
        assert_eq!(result.dml_version.as_deref(), Some("1.4"));
    }

    #[test]
    fn test_imports_are_collected() {
        let result = parse(
            "dml 1.4;\ndevice d;\nimport \"utility.dml\";\nimport \"bank.dml\";\n",
            "test.dml",
        );
        assert!(!result.diagnostics.has_errors());
        assert_eq!(result.imports.len(), 2);
        assert_eq!(result.imports[0].path, "utility.dml");
    }

    #[test]
    fn test_error_recovery_continues() {
        // garbage between two declarations still yields both
        let result = parse("dml 1.4;\n@ @ @\ndevice d;\n", "test.dml");
        assert!(result.diagnostics.has_errors());
        assert_eq!(result.declarations.len(), 2);
    }

    #[test]
    fn test_file_level_is_applications() {
        let result = parse("dml 1.4;\ndevice d;\nis common_device;\n", "test.dml");
        assert!(!result.diagnostics.has_errors());
        assert_eq!(result.device_templates.len(), 1);
        assert_eq!(result.device_templates[0].name, "common_device");
    }
}
