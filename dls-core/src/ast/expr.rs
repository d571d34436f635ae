// Expression nodes

use super::{Ident, TypeExpr};
use crate::source::ZeroSpan;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Identifier(Ident),
    Binary(Box<BinaryExpr>),
    Unary(Box<UnaryExpr>),
    Call(Box<CallExpr>),
    Member(Box<MemberExpr>),
    Index(Box<IndexExpr>),
    Ternary(Box<TernaryExpr>),
    /// `base[msb:lsb]`
    BitSlice(Box<BitSliceExpr>),
    /// `cast(expr, type)`
    Cast(Box<CastExpr>),
    SizeOf(Box<SizeOfExpr>),
    SizeOfType(Box<SizeOfTypeExpr>),
    New(Box<NewExpr>),
    InitList(InitListExpr),
}

impl Expression {
    pub fn span(&self) -> &ZeroSpan {
        match self {
            Expression::Literal(e) => &e.span,
            Expression::Identifier(e) => &e.span,
            Expression::Binary(e) => &e.span,
            Expression::Unary(e) => &e.span,
            Expression::Call(e) => &e.span,
            Expression::Member(e) => &e.span,
            Expression::Index(e) => &e.span,
            Expression::Ternary(e) => &e.span,
            Expression::BitSlice(e) => &e.span,
            Expression::Cast(e) => &e.span,
            Expression::SizeOf(e) => &e.span,
            Expression::SizeOfType(e) => &e.span,
            Expression::New(e) => &e.span,
            Expression::InitList(e) => &e.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    String(String),
    Char(char),
    Bool(bool),
    Null,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
}

impl BinaryOp {
    pub fn is_assignment(&self) -> bool {
        use BinaryOp::*;
        matches!(
            self,
            Assign
                | AddAssign
                | SubAssign
                | MulAssign
                | DivAssign
                | ModAssign
                | AndAssign
                | OrAssign
                | XorAssign
                | ShlAssign
                | ShrAssign
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    BitNot,
    Neg,
    Plus,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    AddressOf,
    Deref,
    Defined,
    Stringify,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Expression,
    pub right: Expression,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Expression,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Expression,
    pub args: Vec<Expression>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub base: Expression,
    pub member: Ident,
    /// `->` rather than `.`
    pub arrow: bool,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub base: Expression,
    pub index: Expression,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TernaryExpr {
    pub condition: Expression,
    pub then_expr: Expression,
    pub else_expr: Expression,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BitSliceExpr {
    pub base: Expression,
    pub msb: Expression,
    pub lsb: Expression,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastExpr {
    pub expr: Expression,
    pub ty: TypeExpr,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizeOfExpr {
    pub expr: Expression,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizeOfTypeExpr {
    pub ty: TypeExpr,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpr {
    pub ty: TypeExpr,
    pub count: Option<Expression>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitListExpr {
    pub elements: Vec<Expression>,
    pub span: ZeroSpan,
}
