// Statement nodes

use super::{Expression, Ident, TypeExpr, VarStorage};
use crate::source::ZeroSpan;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Block(Block),
    If(Box<IfStmt>),
    While(Box<WhileStmt>),
    DoWhile(Box<DoWhileStmt>),
    For(Box<ForStmt>),
    Foreach(Box<ForeachStmt>),
    Switch(Box<SwitchStmt>),
    Break(ZeroSpan),
    Continue(ZeroSpan),
    Return(Box<ReturnStmt>),
    Goto(GotoStmt),
    Label(Box<LabelStmt>),
    Try(Box<TryStmt>),
    Throw(ThrowStmt),
    Log(Box<LogStmt>),
    Assert(Box<AssertStmt>),
    After(Box<AfterStmt>),
    Delete(Box<DeleteStmt>),
    /// `local`/`session`/`saved` variable declaration inside a body
    Local(Box<LocalStmt>),
    /// `error "message";` compile-time failure directive
    Error(ErrorStmt),
    HashIf(Box<HashIfStmt>),
    HashForeach(Box<HashForeachStmt>),
    HashSelect(Box<HashSelectStmt>),
    /// Verbatim `%{ ... %}` region
    InlineC(CBlockStmt),
    Expression(Box<ExprStmt>),
    /// A bare `;`
    Empty(ZeroSpan),
}

impl Statement {
    pub fn span(&self) -> &ZeroSpan {
        match self {
            Statement::Block(s) => &s.span,
            Statement::If(s) => &s.span,
            Statement::While(s) => &s.span,
            Statement::DoWhile(s) => &s.span,
            Statement::For(s) => &s.span,
            Statement::Foreach(s) => &s.span,
            Statement::Switch(s) => &s.span,
            Statement::Break(span) | Statement::Continue(span) | Statement::Empty(span) => span,
            Statement::Return(s) => &s.span,
            Statement::Goto(s) => &s.span,
            Statement::Label(s) => &s.span,
            Statement::Try(s) => &s.span,
            Statement::Throw(s) => &s.span,
            Statement::Log(s) => &s.span,
            Statement::Assert(s) => &s.span,
            Statement::After(s) => &s.span,
            Statement::Delete(s) => &s.span,
            Statement::Local(s) => &s.span,
            Statement::Error(s) => &s.span,
            Statement::HashIf(s) => &s.span,
            Statement::HashForeach(s) => &s.span,
            Statement::HashSelect(s) => &s.span,
            Statement::InlineC(s) => &s.span,
            Statement::Expression(s) => &s.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expression,
    pub then_branch: Statement,
    pub else_branch: Option<Statement>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expression,
    pub body: Statement,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoWhileStmt {
    pub body: Statement,
    pub condition: Expression,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: Option<Statement>,
    pub condition: Option<Expression>,
    pub update: Vec<Expression>,
    pub body: Statement,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeachStmt {
    pub var: Ident,
    pub list: Expression,
    pub body: Statement,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub scrutinee: Expression,
    pub cases: Vec<SwitchCase>,
    pub span: ZeroSpan,
}

/// One `case expr:` or `default:` arm with its statements
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub label: Option<Expression>,
    pub body: Vec<Statement>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expression>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GotoStmt {
    pub label: Ident,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelStmt {
    pub name: Ident,
    pub statement: Statement,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    pub body: Statement,
    pub handler: Statement,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStmt {
    pub span: ZeroSpan,
}

/// `log info, level, groups: "format", args...;`
#[derive(Debug, Clone, PartialEq)]
pub struct LogStmt {
    pub kind: Ident,
    pub level: Option<Expression>,
    pub groups: Option<Expression>,
    pub message: Expression,
    pub args: Vec<Expression>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssertStmt {
    pub condition: Expression,
    pub span: ZeroSpan,
}

/// `after 0.1 s: callback(args);`
#[derive(Debug, Clone, PartialEq)]
pub struct AfterStmt {
    pub delay: Option<Expression>,
    pub unit: Option<Ident>,
    pub call: Expression,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    pub expr: Expression,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalStmt {
    pub storage: VarStorage,
    pub ty: TypeExpr,
    pub name: Ident,
    pub init: Option<Expression>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorStmt {
    pub message: Option<String>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashIfStmt {
    pub condition: Expression,
    pub then_body: Vec<Statement>,
    pub else_body: Option<Vec<Statement>>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashForeachStmt {
    pub var: Ident,
    pub list: Expression,
    pub body: Vec<Statement>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashSelectStmt {
    pub var: Ident,
    pub list: Expression,
    pub where_clause: Expression,
    pub body: Vec<Statement>,
    pub else_body: Option<Vec<Statement>>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CBlockStmt {
    pub text: String,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expression,
    pub span: ZeroSpan,
}
