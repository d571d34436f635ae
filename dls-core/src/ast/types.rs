// Type expressions
//
// DML type syntax is C-flavored. The analysis core does not type-check at
// compiler depth; a type expression records enough structure for display,
// reference collection and signature comparison.

use super::{Expression, Ident, StructMember};
use crate::source::ZeroSpan;

#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub is_const: bool,
    pub base: TypeBase,
    /// Levels of `*` indirection
    pub pointer_depth: u32,
    /// `vect` qualifier
    pub vect: bool,
    pub span: ZeroSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeBase {
    /// A named type: builtin C types and user typedefs alike. Multi-word
    /// builtins (`unsigned int`) are folded into a single name.
    Named(Ident),
    /// An anonymous struct or union body, as in `typedef struct { ... } t;`
    Struct(StructBody),
    /// `typeof expr`
    Typeof(Box<Expression>),
    Auto,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructBody {
    pub is_union: bool,
    pub members: Vec<StructMember>,
}

impl TypeExpr {
    pub fn named(ident: Ident) -> Self {
        let span = ident.span.clone();
        Self {
            is_const: false,
            base: TypeBase::Named(ident),
            pointer_depth: 0,
            vect: false,
            span,
        }
    }

    /// Rendered form used in symbol details and signature comparison
    pub fn display_name(&self) -> String {
        let mut out = String::new();
        if self.is_const {
            out.push_str("const ");
        }
        match &self.base {
            TypeBase::Named(ident) => out.push_str(&ident.name),
            TypeBase::Struct(body) => {
                out.push_str(if body.is_union { "union" } else { "struct" });
                out.push_str(" { ... }");
            }
            TypeBase::Typeof(_) => out.push_str("typeof(...)"),
            TypeBase::Auto => out.push_str("auto"),
        }
        for _ in 0..self.pointer_depth {
            out.push('*');
        }
        if self.vect {
            out.push_str(" vect");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Position, ZeroRange, ZeroSpan};

    fn span() -> ZeroSpan {
        ZeroSpan::new(ZeroRange::new(Position::new(0, 0), Position::new(0, 3)))
    }

    #[test]
    fn test_display_name() {
        let mut ty = TypeExpr::named(Ident::new("uint32", span()));
        assert_eq!(ty.display_name(), "uint32");
        ty.pointer_depth = 2;
        ty.is_const = true;
        assert_eq!(ty.display_name(), "const uint32**");
    }
}
