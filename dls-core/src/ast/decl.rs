// Declaration nodes
//
// The container objects of the language (bank, register, field, attribute,
// connect, interface, port, implement, event, group, subdevice) all share
// the ObjectDecl header; what varies between them is the kind tag and its
// payload (register size/offset, field bit range).

use super::{Block, Expression, Ident, TypeExpr};
use crate::source::ZeroSpan;

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    DmlVersion(DmlVersionDecl),
    Import(ImportDecl),
    Device(DeviceDecl),
    Template(TemplateDecl),
    Object(ObjectDecl),
    Method(MethodDecl),
    Param(ParamDecl),
    Session(VarDecl),
    Saved(VarDecl),
    Data(VarDecl),
    Constant(ConstantDecl),
    Typedef(TypedefDecl),
    Struct(StructDecl),
    Union(StructDecl),
    Enum(EnumDecl),
    Extern(ExternDecl),
    LogGroup(LogGroupDecl),
}

impl Declaration {
    pub fn span(&self) -> &ZeroSpan {
        match self {
            Declaration::DmlVersion(d) => &d.span,
            Declaration::Import(d) => &d.span,
            Declaration::Device(d) => &d.span,
            Declaration::Template(d) => &d.span,
            Declaration::Object(d) => &d.span,
            Declaration::Method(d) => &d.span,
            Declaration::Param(d) => &d.span,
            Declaration::Session(d) | Declaration::Saved(d) | Declaration::Data(d) => &d.span,
            Declaration::Constant(d) => &d.span,
            Declaration::Typedef(d) => &d.span,
            Declaration::Struct(d) | Declaration::Union(d) => &d.span,
            Declaration::Enum(d) => &d.span,
            Declaration::Extern(d) => &d.span,
            Declaration::LogGroup(d) => &d.span,
        }
    }

    /// The declared name, if this declaration introduces one
    pub fn name(&self) -> Option<&Ident> {
        match self {
            Declaration::DmlVersion(_) | Declaration::Import(_) => None,
            Declaration::Device(d) => Some(&d.name),
            Declaration::Template(d) => Some(&d.name),
            Declaration::Object(d) => Some(&d.name),
            Declaration::Method(d) => Some(&d.name),
            Declaration::Param(d) => Some(&d.name),
            Declaration::Session(d) | Declaration::Saved(d) | Declaration::Data(d) => {
                Some(&d.name)
            }
            Declaration::Constant(d) => Some(&d.name),
            Declaration::Typedef(d) => Some(&d.name),
            Declaration::Struct(d) | Declaration::Union(d) => Some(&d.name),
            Declaration::Enum(d) => Some(&d.name),
            Declaration::Extern(d) => Some(&d.name),
            Declaration::LogGroup(d) => Some(&d.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DmlVersionDecl {
    pub version: String,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    /// The quoted module path, e.g. `"utility.dml"`
    pub path: String,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDecl {
    pub name: Ident,
    /// Templates applied through the `is` clause
    pub templates: Vec<Ident>,
    /// DML 1.4 devices are declared `device name;` with the body living
    /// elsewhere in the file; an inline block is tolerated
    pub body: Option<Vec<Declaration>>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDecl {
    pub name: Ident,
    /// Parents from the header `is` clause and from `is x;` items in the body
    pub parents: Vec<Ident>,
    pub body: Vec<Declaration>,
    pub span: ZeroSpan,
}

impl TemplateDecl {
    pub fn params(&self) -> impl Iterator<Item = &ParamDecl> {
        self.body.iter().filter_map(|d| match d {
            Declaration::Param(p) => Some(p),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.body.iter().filter_map(|d| match d {
            Declaration::Method(m) => Some(m),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDecl {
    pub kind: ObjectKind,
    pub name: Ident,
    /// Templates applied through `is`
    pub templates: Vec<Ident>,
    /// Empty for the `;`-terminated form
    pub body: Vec<Declaration>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Bank,
    Register {
        size: Option<Expression>,
        offset: Option<Expression>,
    },
    Field {
        bits: Option<BitRange>,
    },
    Attribute,
    Connect,
    Interface,
    Port,
    Implement,
    Event,
    Group,
    Subdevice,
}

impl ObjectKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            ObjectKind::Bank => "bank",
            ObjectKind::Register { .. } => "register",
            ObjectKind::Field { .. } => "field",
            ObjectKind::Attribute => "attribute",
            ObjectKind::Connect => "connect",
            ObjectKind::Interface => "interface",
            ObjectKind::Port => "port",
            ObjectKind::Implement => "implement",
            ObjectKind::Event => "event",
            ObjectKind::Group => "group",
            ObjectKind::Subdevice => "subdevice",
        }
    }
}

/// `@ [msb:lsb]` on a field
#[derive(Debug, Clone, PartialEq)]
pub struct BitRange {
    pub msb: Expression,
    pub lsb: Option<Expression>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodModifier {
    Inline,
    Shared,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodParam {
    /// Untyped parameters are allowed on inline methods
    pub ty: Option<TypeExpr>,
    pub name: Ident,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: Ident,
    pub modifier: Option<MethodModifier>,
    pub independent: bool,
    pub startup: bool,
    pub memoized: bool,
    pub params: Vec<MethodParam>,
    /// `-> (type, ...)` return types
    pub returns: Vec<TypeExpr>,
    pub throws: bool,
    pub is_default: bool,
    /// None for abstract (declaration-only) methods
    pub body: Option<Block>,
    pub span: ZeroSpan,
}

impl MethodDecl {
    pub fn is_abstract(&self) -> bool {
        self.body.is_none()
    }

    /// Signature rendering used for display and override compatibility
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| match &p.ty {
                Some(ty) => format!("{} {}", ty.display_name(), p.name.name),
                None => p.name.name.clone(),
            })
            .collect();
        let mut sig = format!("{}({})", self.name.name, params.join(", "));
        if !self.returns.is_empty() {
            let rets: Vec<String> = self.returns.iter().map(|t| t.display_name()).collect();
            sig.push_str(&format!(" -> ({})", rets.join(", ")));
        }
        if self.throws {
            sig.push_str(" throws");
        }
        sig
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: Ident,
    pub ty: Option<TypeExpr>,
    pub value: Option<Expression>,
    /// Declared with `default` rather than `=`
    pub is_default_value: bool,
    pub span: ZeroSpan,
}

/// Storage class of a typed data declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarStorage {
    Session,
    Saved,
    Data,
    Local,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub ty: TypeExpr,
    pub name: Ident,
    pub init: Option<Expression>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantDecl {
    pub name: Ident,
    pub value: Expression,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedefDecl {
    pub name: Ident,
    pub ty: TypeExpr,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructMember {
    pub ty: TypeExpr,
    pub name: Ident,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: Ident,
    pub members: Vec<StructMember>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariant {
    pub name: Ident,
    pub value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: Ident,
    pub variants: Vec<EnumVariant>,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExternDecl {
    pub ty: Option<TypeExpr>,
    pub name: Ident,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogGroupDecl {
    pub name: Ident,
    pub span: ZeroSpan,
}
