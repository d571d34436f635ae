// Statement parsing
//
// Method bodies are statement lists. Preprocessor statements (#if,
// #foreach, #select) are ordinary statement variants carrying nested
// statement lists; a C block surfaces verbatim as an InlineC statement.

use crate::ast::{
    AfterStmt, AssertStmt, Block, CBlockStmt, DeleteStmt, DoWhileStmt, ErrorStmt, ExprStmt,
    ForStmt, ForeachStmt, GotoStmt, HashForeachStmt, HashIfStmt, HashSelectStmt, IfStmt,
    LabelStmt, LocalStmt, LogStmt, ReturnStmt, Statement, SwitchCase, SwitchStmt, ThrowStmt,
    TryStmt, VarStorage, WhileStmt,
};
use crate::lexer::TokenKind;

use super::Parser;

impl Parser {
    /// `{ statements }`
    pub(super) fn parse_block(&mut self) -> Option<Block> {
        let start = self.current_span();
        self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            let before = self.cursor;
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            } else {
                self.synchronize();
            }
            if self.cursor == before {
                self.advance();
            }
        }
        let end = self.current_span();
        self.expect(TokenKind::RBrace)?;
        Some(Block {
            statements,
            span: start.extend_to(&end),
        })
    }

    pub(super) fn parse_statement(&mut self) -> Option<Statement> {
        let start = self.current_span();
        match self.current_kind() {
            TokenKind::LBrace => self.parse_block().map(Statement::Block),
            TokenKind::Semicolon => {
                self.advance();
                Some(Statement::Empty(start))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Foreach => self.parse_foreach(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Break => {
                self.advance();
                self.expect(TokenKind::Semicolon)?;
                Some(Statement::Break(start))
            }
            TokenKind::Continue => {
                self.advance();
                self.expect(TokenKind::Semicolon)?;
                Some(Statement::Continue(start))
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                let end = self.previous_span();
                self.expect(TokenKind::Semicolon)?;
                Some(Statement::Return(Box::new(ReturnStmt {
                    value,
                    span: start.extend_to(&end),
                })))
            }
            TokenKind::Goto => {
                self.advance();
                let label = self.expect_name()?;
                self.expect(TokenKind::Semicolon)?;
                let span = start.extend_to(&label.span);
                Some(Statement::Goto(GotoStmt { label, span }))
            }
            TokenKind::Try => self.parse_try(),
            TokenKind::Throw => {
                self.advance();
                self.expect(TokenKind::Semicolon)?;
                Some(Statement::Throw(ThrowStmt { span: start }))
            }
            TokenKind::Log => self.parse_log(),
            TokenKind::Assert => {
                self.advance();
                let condition = self.parse_expr()?;
                self.expect(TokenKind::Semicolon)?;
                let span = start.extend_to(&self.previous_span());
                Some(Statement::Assert(Box::new(AssertStmt { condition, span })))
            }
            TokenKind::After => self.parse_after(),
            TokenKind::Delete => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Semicolon)?;
                let span = start.extend_to(&self.previous_span());
                Some(Statement::Delete(Box::new(DeleteStmt { expr, span })))
            }
            TokenKind::Local => self.parse_local(VarStorage::Local),
            TokenKind::Session => self.parse_local(VarStorage::Session),
            TokenKind::Saved => self.parse_local(VarStorage::Saved),
            TokenKind::ErrorKw => {
                self.advance();
                let message = self
                    .consume(TokenKind::StringLiteral)
                    .map(|token| token.text);
                self.expect(TokenKind::Semicolon)?;
                Some(Statement::Error(ErrorStmt {
                    message,
                    span: start,
                }))
            }
            TokenKind::HashIf => self.parse_hash_if(),
            TokenKind::HashForeach => self.parse_hash_foreach(),
            TokenKind::HashSelect => self.parse_hash_select(),
            TokenKind::CBlock => {
                let token = self.advance();
                Some(Statement::InlineC(CBlockStmt {
                    text: token.text,
                    span: token.span,
                }))
            }
            // identifier directly followed by a colon is a label
            TokenKind::Identifier if self.peek_kind(1) == TokenKind::Colon => {
                let name = self.expect_name()?;
                self.expect(TokenKind::Colon)?;
                let statement = self.parse_statement()?;
                let span = start.extend_to(statement.span());
                Some(Statement::Label(Box::new(LabelStmt {
                    name,
                    statement,
                    span,
                })))
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Semicolon)?;
                let span = start.extend_to(&self.previous_span());
                Some(Statement::Expression(Box::new(ExprStmt { expr, span })))
            }
        }
    }

    fn parse_if(&mut self) -> Option<Statement> {
        let start = self.current_span();
        self.advance();
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let then_branch = self.parse_statement()?;
        let else_branch = if self.consume(TokenKind::Else).is_some() {
            Some(self.parse_statement()?)
        } else {
            None
        };
        let end = else_branch
            .as_ref()
            .map(|s| s.span().clone())
            .unwrap_or_else(|| then_branch.span().clone());
        Some(Statement::If(Box::new(IfStmt {
            condition,
            then_branch,
            else_branch,
            span: start.extend_to(&end),
        })))
    }

    fn parse_while(&mut self) -> Option<Statement> {
        let start = self.current_span();
        self.advance();
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_statement()?;
        let span = start.extend_to(body.span());
        Some(Statement::While(Box::new(WhileStmt {
            condition,
            body,
            span,
        })))
    }

    fn parse_do_while(&mut self) -> Option<Statement> {
        let start = self.current_span();
        self.advance();
        let body = self.parse_statement()?;
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semicolon)?;
        let span = start.extend_to(&self.previous_span());
        Some(Statement::DoWhile(Box::new(DoWhileStmt {
            body,
            condition,
            span,
        })))
    }

    fn parse_for(&mut self) -> Option<Statement> {
        let start = self.current_span();
        self.advance();
        self.expect(TokenKind::LParen)?;

        let init = if self.consume(TokenKind::Semicolon).is_some() {
            None
        } else if self.check(TokenKind::Local) {
            self.parse_local(VarStorage::Local)
        } else {
            let expr = self.parse_expr()?;
            let span = expr.span().clone();
            self.expect(TokenKind::Semicolon)?;
            Some(Statement::Expression(Box::new(ExprStmt { expr, span })))
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon)?;

        let mut update = Vec::new();
        if !self.check(TokenKind::RParen) {
            update.push(self.parse_expr()?);
            while self.consume(TokenKind::Comma).is_some() {
                update.push(self.parse_expr()?);
            }
        }
        self.expect(TokenKind::RParen)?;

        let body = self.parse_statement()?;
        let span = start.extend_to(body.span());
        Some(Statement::For(Box::new(ForStmt {
            init,
            condition,
            update,
            body,
            span,
        })))
    }

    fn parse_foreach(&mut self) -> Option<Statement> {
        let start = self.current_span();
        self.advance();
        let var = self.expect_name()?;
        self.expect(TokenKind::In)?;
        let list = self.parse_expr()?;
        let body = self.parse_statement()?;
        let span = start.extend_to(body.span());
        Some(Statement::Foreach(Box::new(ForeachStmt {
            var,
            list,
            body,
            span,
        })))
    }

    fn parse_switch(&mut self) -> Option<Statement> {
        let start = self.current_span();
        self.advance();
        self.expect(TokenKind::LParen)?;
        let scrutinee = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::LBrace)?;

        let mut cases: Vec<SwitchCase> = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            let case_start = self.current_span();
            let label = if self.consume(TokenKind::Case).is_some() {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Colon)?;
                Some(expr)
            } else if self.consume(TokenKind::Default).is_some() {
                self.expect(TokenKind::Colon)?;
                None
            } else {
                // statements before any label are a syntax error; recover
                // by skipping to the next label or the closing brace
                self.error_expected("'case' or 'default'");
                self.synchronize();
                continue;
            };

            let mut body = Vec::new();
            while !matches!(
                self.current_kind(),
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                let before = self.cursor;
                if let Some(stmt) = self.parse_statement() {
                    body.push(stmt);
                } else {
                    self.synchronize();
                }
                if self.cursor == before {
                    self.advance();
                }
            }
            let span = case_start.extend_to(&self.previous_span());
            cases.push(SwitchCase { label, body, span });
        }
        let end = self.current_span();
        self.expect(TokenKind::RBrace)?;
        Some(Statement::Switch(Box::new(SwitchStmt {
            scrutinee,
            cases,
            span: start.extend_to(&end),
        })))
    }

    fn parse_try(&mut self) -> Option<Statement> {
        let start = self.current_span();
        self.advance();
        let body = self.parse_statement()?;
        self.expect(TokenKind::Catch)?;
        let handler = self.parse_statement()?;
        let span = start.extend_to(handler.span());
        Some(Statement::Try(Box::new(TryStmt {
            body,
            handler,
            span,
        })))
    }

    /// `log info, level, groups: "format", args...;`
    fn parse_log(&mut self) -> Option<Statement> {
        let start = self.current_span();
        self.advance();

        // the log kind; `error` is a keyword but legal here
        let kind = if self.check(TokenKind::ErrorKw) {
            let token = self.advance();
            crate::ast::Ident::new(token.text, token.span)
        } else {
            self.expect_name()?
        };

        let mut level = None;
        let mut groups = None;
        if self.consume(TokenKind::Comma).is_some() {
            level = Some(self.parse_expr()?);
            if self.consume(TokenKind::Comma).is_some() {
                groups = Some(self.parse_expr()?);
            }
        }
        self.expect(TokenKind::Colon)?;
        let message = self.parse_expr()?;
        let mut args = Vec::new();
        while self.consume(TokenKind::Comma).is_some() {
            args.push(self.parse_expr()?);
        }
        self.expect(TokenKind::Semicolon)?;
        let span = start.extend_to(&self.previous_span());
        Some(Statement::Log(Box::new(LogStmt {
            kind,
            level,
            groups,
            message,
            args,
            span,
        })))
    }

    /// `after 0.1 s: callback(args);` or `after: callback();`
    fn parse_after(&mut self) -> Option<Statement> {
        let start = self.current_span();
        self.advance();

        let mut delay = None;
        let mut unit = None;
        if !self.check(TokenKind::Colon) {
            delay = Some(self.parse_expr()?);
            if self.current_kind().is_name_like() {
                unit = self.expect_name();
            }
        }
        self.expect(TokenKind::Colon)?;
        let call = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        let span = start.extend_to(&self.previous_span());
        Some(Statement::After(Box::new(AfterStmt {
            delay,
            unit,
            call,
            span,
        })))
    }

    /// `local type name [= init];` (or session/saved storage)
    fn parse_local(&mut self, storage: VarStorage) -> Option<Statement> {
        let start = self.current_span();
        self.advance();
        let ty = self.parse_type()?;
        let name = self.expect_name()?;
        let init = if self.consume(TokenKind::Assign).is_some() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        let span = start.extend_to(&self.previous_span());
        Some(Statement::Local(Box::new(LocalStmt {
            storage,
            ty,
            name,
            init,
            span,
        })))
    }

    fn parse_hash_statement_body(&mut self) -> Option<Vec<Statement>> {
        self.expect(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            let before = self.cursor;
            if let Some(stmt) = self.parse_statement() {
                body.push(stmt);
            } else {
                self.synchronize();
            }
            if self.cursor == before {
                self.advance();
            }
        }
        self.expect(TokenKind::RBrace)?;
        Some(body)
    }

    fn parse_hash_if(&mut self) -> Option<Statement> {
        let start = self.current_span();
        self.advance();
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let then_body = self.parse_hash_statement_body()?;

        let else_body = if self.consume(TokenKind::HashElse).is_some() {
            if self.check(TokenKind::HashIf) {
                // else-if chain
                Some(vec![self.parse_hash_if()?])
            } else {
                Some(self.parse_hash_statement_body()?)
            }
        } else {
            None
        };
        let span = start.extend_to(&self.previous_span());
        Some(Statement::HashIf(Box::new(HashIfStmt {
            condition,
            then_body,
            else_body,
            span,
        })))
    }

    fn parse_hash_foreach(&mut self) -> Option<Statement> {
        let start = self.current_span();
        self.advance();
        let var = self.expect_name()?;
        self.expect(TokenKind::In)?;
        let list = self.parse_expr()?;
        let body = self.parse_hash_statement_body()?;
        let span = start.extend_to(&self.previous_span());
        Some(Statement::HashForeach(Box::new(HashForeachStmt {
            var,
            list,
            body,
            span,
        })))
    }

    /// `#select x in (list) where (cond) { ... } #else { ... }`
    fn parse_hash_select(&mut self) -> Option<Statement> {
        let start = self.current_span();
        self.advance();
        let var = self.expect_name()?;
        self.expect(TokenKind::In)?;
        let list = self.parse_expr()?;
        self.expect(TokenKind::Where)?;
        let where_clause = self.parse_expr()?;
        let body = self.parse_hash_statement_body()?;
        let else_body = if self.consume(TokenKind::HashElse).is_some() {
            Some(self.parse_hash_statement_body()?)
        } else {
            None
        };
        let span = start.extend_to(&self.previous_span());
        Some(Statement::HashSelect(Box::new(HashSelectStmt {
            var,
            list,
            where_clause,
            body,
            else_body,
            span,
        })))
    }
}
