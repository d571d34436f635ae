// Expression parsing, layered by precedence
//
// The ladder runs assignment -> ternary -> logical-or -> logical-and ->
// bitwise-or -> bitwise-xor -> bitwise-and -> equality -> relational ->
// shift -> additive -> multiplicative -> unary -> postfix -> primary.
// Bit slices bind at postfix level: a bare colon directly inside an index
// bracket separates the msb/lsb pair rather than opening a ternary arm.

use crate::ast::{
    BinaryExpr, BinaryOp, BitSliceExpr, CallExpr, CastExpr, Expression, Ident, IndexExpr,
    InitListExpr, Literal, LiteralValue, MemberExpr, NewExpr, SizeOfExpr, SizeOfTypeExpr,
    TernaryExpr, UnaryExpr, UnaryOp,
};
use crate::lexer::TokenKind;

use super::Parser;

/// Precedence levels, lowest binds loosest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Assignment,
    Ternary,
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Equality,
    Relational,
    Shift,
    Additive,
    Multiplicative,
}

fn infix_precedence(kind: TokenKind) -> Option<Precedence> {
    use TokenKind::*;
    Some(match kind {
        Assign | PlusAssign | MinusAssign | StarAssign | SlashAssign | PercentAssign
        | AmpAssign | PipeAssign | CaretAssign | ShlAssign | ShrAssign => Precedence::Assignment,
        Question | HashCond => Precedence::Ternary,
        PipePipe => Precedence::Or,
        AmpAmp => Precedence::And,
        Pipe => Precedence::BitOr,
        Caret => Precedence::BitXor,
        Amp => Precedence::BitAnd,
        EqEq | BangEq => Precedence::Equality,
        Lt | LtEq | Gt | GtEq => Precedence::Relational,
        Shl | Shr => Precedence::Shift,
        Plus | Minus => Precedence::Additive,
        Star | Slash | Percent => Precedence::Multiplicative,
        _ => return None,
    })
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    use TokenKind::*;
    Some(match kind {
        Plus => BinaryOp::Add,
        Minus => BinaryOp::Sub,
        Star => BinaryOp::Mul,
        Slash => BinaryOp::Div,
        Percent => BinaryOp::Mod,
        Shl => BinaryOp::Shl,
        Shr => BinaryOp::Shr,
        Lt => BinaryOp::Lt,
        LtEq => BinaryOp::Le,
        Gt => BinaryOp::Gt,
        GtEq => BinaryOp::Ge,
        EqEq => BinaryOp::Eq,
        BangEq => BinaryOp::Ne,
        Amp => BinaryOp::BitAnd,
        Caret => BinaryOp::BitXor,
        Pipe => BinaryOp::BitOr,
        AmpAmp => BinaryOp::And,
        PipePipe => BinaryOp::Or,
        Assign => BinaryOp::Assign,
        PlusAssign => BinaryOp::AddAssign,
        MinusAssign => BinaryOp::SubAssign,
        StarAssign => BinaryOp::MulAssign,
        SlashAssign => BinaryOp::DivAssign,
        PercentAssign => BinaryOp::ModAssign,
        AmpAssign => BinaryOp::AndAssign,
        PipeAssign => BinaryOp::OrAssign,
        CaretAssign => BinaryOp::XorAssign,
        ShlAssign => BinaryOp::ShlAssign,
        ShrAssign => BinaryOp::ShrAssign,
        _ => return None,
    })
}

impl Parser {
    pub(super) fn parse_expr(&mut self) -> Option<Expression> {
        self.parse_expr_precedence(Precedence::None)
    }

    fn parse_expr_precedence(&mut self, min_prec: Precedence) -> Option<Expression> {
        let mut left = self.parse_unary()?;
        while let Some(prec) = infix_precedence(self.current_kind()) {
            if prec <= min_prec {
                break;
            }
            left = self.parse_infix(left, prec)?;
        }
        Some(left)
    }

    fn parse_infix(&mut self, left: Expression, prec: Precedence) -> Option<Expression> {
        let kind = self.current_kind();
        match kind {
            // a ? b : c  and the preprocessor form  a #? b #: c
            TokenKind::Question | TokenKind::HashCond => {
                self.advance();
                let then_expr = self.parse_expr()?;
                if kind == TokenKind::HashCond {
                    self.expect(TokenKind::HashColon)?;
                } else {
                    self.expect(TokenKind::Colon)?;
                }
                let else_expr = self.parse_expr_precedence(Precedence::Assignment)?;
                let span = left.span().extend_to(else_expr.span());
                Some(Expression::Ternary(Box::new(TernaryExpr {
                    condition: left,
                    then_expr,
                    else_expr,
                    span,
                })))
            }
            _ => {
                let op = match binary_op(kind) {
                    Some(op) => op,
                    None => {
                        self.error_unexpected();
                        return None;
                    }
                };
                self.advance();
                // assignment is right-associative; everything else on the
                // ladder is left-associative
                let right = if prec == Precedence::Assignment {
                    self.parse_expr_precedence(Precedence::None)?
                } else {
                    self.parse_expr_precedence(prec)?
                };
                let span = left.span().extend_to(right.span());
                Some(Expression::Binary(Box::new(BinaryExpr {
                    op,
                    left,
                    right,
                    span,
                })))
            }
        }
    }

    pub(super) fn parse_unary(&mut self) -> Option<Expression> {
        let op = match self.current_kind() {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::PlusPlus => Some(UnaryOp::PreInc),
            TokenKind::MinusMinus => Some(UnaryOp::PreDec),
            TokenKind::Amp => Some(UnaryOp::AddressOf),
            TokenKind::Star => Some(UnaryOp::Deref),
            TokenKind::Defined => Some(UnaryOp::Defined),
            TokenKind::Stringify => Some(UnaryOp::Stringify),
            _ => None,
        };

        if let Some(op) = op {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_unary()?;
            let span = start.extend_to(operand.span());
            return Some(Expression::Unary(Box::new(UnaryExpr { op, operand, span })));
        }

        if self.check(TokenKind::Sizeof) {
            let start = self.current_span();
            self.advance();
            let expr = self.parse_unary()?;
            let span = start.extend_to(expr.span());
            return Some(Expression::SizeOf(Box::new(SizeOfExpr { expr, span })));
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Option<Expression> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current_kind() {
                TokenKind::Dot | TokenKind::Arrow => {
                    let arrow = self.check(TokenKind::Arrow);
                    self.advance();
                    let member = self.expect_name()?;
                    let span = expr.span().extend_to(&member.span);
                    expr = Expression::Member(Box::new(MemberExpr {
                        base: expr,
                        member,
                        arrow,
                        span,
                    }));
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_call_args()?;
                    let end = self.current_span();
                    self.expect(TokenKind::RParen)?;
                    let span = expr.span().extend_to(&end);
                    expr = Expression::Call(Box::new(CallExpr {
                        callee: expr,
                        args,
                        span,
                    }));
                }
                TokenKind::LBracket => {
                    self.advance();
                    let first = self.parse_expr()?;
                    if self.consume(TokenKind::Colon).is_some() {
                        // bit slice: base[msb:lsb]
                        let lsb = self.parse_expr()?;
                        let end = self.current_span();
                        self.expect(TokenKind::RBracket)?;
                        let span = expr.span().extend_to(&end);
                        expr = Expression::BitSlice(Box::new(BitSliceExpr {
                            base: expr,
                            msb: first,
                            lsb,
                            span,
                        }));
                    } else {
                        let end = self.current_span();
                        self.expect(TokenKind::RBracket)?;
                        let span = expr.span().extend_to(&end);
                        expr = Expression::Index(Box::new(IndexExpr {
                            base: expr,
                            index: first,
                            span,
                        }));
                    }
                }
                TokenKind::PlusPlus => {
                    let end = self.current_span();
                    self.advance();
                    let span = expr.span().extend_to(&end);
                    expr = Expression::Unary(Box::new(UnaryExpr {
                        op: UnaryOp::PostInc,
                        operand: expr,
                        span,
                    }));
                }
                TokenKind::MinusMinus => {
                    let end = self.current_span();
                    self.advance();
                    let span = expr.span().extend_to(&end);
                    expr = Expression::Unary(Box::new(UnaryExpr {
                        op: UnaryOp::PostDec,
                        operand: expr,
                        span,
                    }));
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<Expression> {
        let span = self.current_span();
        match self.current_kind() {
            TokenKind::IntLiteral => {
                let value = parse_int_text(self.current_text());
                self.advance();
                Some(Expression::Literal(Literal {
                    value: LiteralValue::Int(value),
                    span,
                }))
            }
            TokenKind::FloatLiteral => {
                let value = parse_float_text(self.current_text());
                self.advance();
                Some(Expression::Literal(Literal {
                    value: LiteralValue::Float(value),
                    span,
                }))
            }
            TokenKind::StringLiteral => {
                let value = self.current_text().to_string();
                self.advance();
                Some(Expression::Literal(Literal {
                    value: LiteralValue::String(value),
                    span,
                }))
            }
            TokenKind::CharLiteral => {
                let value = self.current_text().chars().next().unwrap_or('\0');
                self.advance();
                Some(Expression::Literal(Literal {
                    value: LiteralValue::Char(value),
                    span,
                }))
            }
            TokenKind::True | TokenKind::False => {
                let value = self.check(TokenKind::True);
                self.advance();
                Some(Expression::Literal(Literal {
                    value: LiteralValue::Bool(value),
                    span,
                }))
            }
            TokenKind::Null => {
                self.advance();
                Some(Expression::Literal(Literal {
                    value: LiteralValue::Null,
                    span,
                }))
            }
            TokenKind::Undefined => {
                self.advance();
                Some(Expression::Literal(Literal {
                    value: LiteralValue::Undefined,
                    span,
                }))
            }
            TokenKind::This => {
                let token = self.advance();
                Some(Expression::Identifier(Ident::new(token.text, token.span)))
            }
            TokenKind::Identifier | TokenKind::Size | TokenKind::Data => {
                let token = self.advance();
                Some(Expression::Identifier(Ident::new(token.text, token.span)))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Some(expr)
            }
            // cast(expr, type)
            TokenKind::Cast => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Comma)?;
                let ty = self.parse_type()?;
                let end = self.current_span();
                self.expect(TokenKind::RParen)?;
                Some(Expression::Cast(Box::new(CastExpr {
                    expr,
                    ty,
                    span: span.extend_to(&end),
                })))
            }
            TokenKind::Sizeoftype => {
                self.advance();
                let ty = self.parse_type()?;
                let span = span.extend_to(&self.previous_span());
                Some(Expression::SizeOfType(Box::new(SizeOfTypeExpr { ty, span })))
            }
            // new type  or  new type[count]
            TokenKind::New => {
                self.advance();
                let ty = self.parse_type()?;
                let mut count = None;
                if self.consume(TokenKind::LBracket).is_some() {
                    count = Some(self.parse_expr()?);
                    self.expect(TokenKind::RBracket)?;
                }
                let span = span.extend_to(&self.previous_span());
                Some(Expression::New(Box::new(NewExpr { ty, count, span })))
            }
            // initializer list: { a, b, c }
            TokenKind::LBrace => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(TokenKind::RBrace) {
                    elements.push(self.parse_expr()?);
                    while self.consume(TokenKind::Comma).is_some() {
                        if self.check(TokenKind::RBrace) {
                            break;
                        }
                        elements.push(self.parse_expr()?);
                    }
                }
                let end = self.current_span();
                self.expect(TokenKind::RBrace)?;
                Some(Expression::InitList(InitListExpr {
                    elements,
                    span: span.extend_to(&end),
                }))
            }
            // each T in (expr) surfaces as a call so the template name is
            // still visible to reference collection
            TokenKind::Each => {
                let each = self.advance();
                let template = self.expect_name()?;
                self.expect(TokenKind::In)?;
                let list = self.parse_expr()?;
                let span = span.extend_to(&self.previous_span());
                Some(Expression::Call(Box::new(CallExpr {
                    callee: Expression::Identifier(Ident::new(each.text, each.span)),
                    args: vec![Expression::Identifier(template), list],
                    span,
                })))
            }
            _ => {
                self.error_expected("expression");
                None
            }
        }
    }

    pub(super) fn parse_call_args(&mut self) -> Option<Vec<Expression>> {
        if self.check(TokenKind::RParen) {
            return Some(vec![]);
        }
        let mut args = vec![self.parse_expr()?];
        while self.consume(TokenKind::Comma).is_some() {
            if self.check(TokenKind::RParen) {
                break;
            }
            args.push(self.parse_expr()?);
        }
        Some(args)
    }
}

fn parse_int_text(text: &str) -> i64 {
    let trimmed = text.trim_end_matches(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L'));
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).unwrap_or(0)
    } else {
        trimmed.parse().unwrap_or(0)
    }
}

fn parse_float_text(text: &str) -> f64 {
    text.trim_end_matches(|c: char| matches!(c, 'f' | 'F' | 'u' | 'U' | 'l' | 'L'))
        .parse()
        .unwrap_or(0.0)
}
