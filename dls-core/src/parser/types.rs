// Type expression parsing
//
// DML types are C-flavored: qualifiers, a base (named type, anonymous
// struct/union, typeof), pointer stars and the `vect` qualifier.

use crate::ast::{Ident, StructBody, StructMember, TypeBase, TypeExpr};
use crate::lexer::TokenKind;

use super::Parser;

// Multi-word builtin heads and continuations, e.g. `unsigned long long`
const TYPE_HEADS: &[&str] = &["unsigned", "signed", "short", "long"];
const TYPE_TAILS: &[&str] = &["int", "char", "short", "long", "double"];

impl Parser {
    pub(super) fn parse_type(&mut self) -> Option<TypeExpr> {
        let start = self.current_span();
        let mut is_const = false;

        loop {
            match self.current_kind() {
                TokenKind::Const => {
                    is_const = true;
                    self.advance();
                }
                // accepted qualifiers with no analysis significance
                TokenKind::Volatile | TokenKind::Static => {
                    self.advance();
                }
                _ => break,
            }
        }

        let base = match self.current_kind() {
            TokenKind::Auto => {
                self.advance();
                TypeBase::Auto
            }
            TokenKind::Struct => {
                self.advance();
                TypeBase::Struct(self.parse_struct_body(false)?)
            }
            TokenKind::Union => {
                self.advance();
                TypeBase::Struct(self.parse_struct_body(true)?)
            }
            // layout "big-endian" { ... } and bitfields N { ... } are
            // treated as opaque struct-like bases
            TokenKind::Layout => {
                self.advance();
                self.consume(TokenKind::StringLiteral);
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
                TypeBase::Struct(StructBody {
                    is_union: false,
                    members: Vec::new(),
                })
            }
            TokenKind::Bitfields => {
                self.advance();
                self.consume(TokenKind::IntLiteral);
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
                TypeBase::Struct(StructBody {
                    is_union: false,
                    members: Vec::new(),
                })
            }
            TokenKind::Typeof => {
                self.advance();
                let expr = self.parse_unary()?;
                TypeBase::Typeof(Box::new(expr))
            }
            TokenKind::Identifier => {
                let token = self.advance();
                let mut name = token.text;
                let mut span = token.span;
                // fold multi-word builtins into one name
                while TYPE_HEADS.contains(&name.split(' ').last().unwrap_or(""))
                    && self.check(TokenKind::Identifier)
                    && TYPE_TAILS.contains(&self.current_text())
                {
                    let next = self.advance();
                    name.push(' ');
                    name.push_str(&next.text);
                    span = span.extend_to(&next.span);
                }
                TypeBase::Named(Ident::new(name, span))
            }
            _ => {
                self.error_expected("type");
                return None;
            }
        };

        let mut ty = TypeExpr {
            is_const,
            base,
            pointer_depth: 0,
            vect: false,
            span: start.extend_to(&self.previous_span()),
        };

        loop {
            match self.current_kind() {
                TokenKind::Star => {
                    ty.pointer_depth += 1;
                    self.advance();
                }
                TokenKind::Vect => {
                    ty.vect = true;
                    self.advance();
                }
                _ => break,
            }
        }
        ty.span = start.extend_to(&self.previous_span());

        Some(ty)
    }

    /// `{ type name; ... }` after `struct` / `union`
    pub(super) fn parse_struct_body(&mut self, is_union: bool) -> Option<StructBody> {
        self.expect(TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            let Some(ty) = self.parse_type() else {
                self.synchronize();
                continue;
            };
            let Some(name) = self.expect_name() else {
                self.synchronize();
                continue;
            };
            self.expect(TokenKind::Semicolon);
            members.push(StructMember { ty, name });
        }
        self.expect(TokenKind::RBrace)?;
        Some(StructBody { is_union, members })
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use crate::ast::{Declaration, TypeBase};

    #[test]
    fn test_typedef_simple() {
        let result = parse("typedef uint32 reg_val_t;", "test.dml");
        assert!(!result.diagnostics.has_errors());
        let Declaration::Typedef(td) = &result.declarations[0] else {
            panic!("expected typedef");
        };
        assert_eq!(td.name.name, "reg_val_t");
        assert_eq!(td.ty.display_name(), "uint32");
    }

    #[test]
    fn test_typedef_pointer_and_const() {
        let result = parse("typedef const char *name_t;", "test.dml");
        assert!(!result.diagnostics.has_errors());
        let Declaration::Typedef(td) = &result.declarations[0] else {
            panic!("expected typedef");
        };
        assert_eq!(td.ty.display_name(), "const char*");
    }

    #[test]
    fn test_typedef_multiword() {
        let result = parse("typedef unsigned long long big_t;", "test.dml");
        assert!(!result.diagnostics.has_errors());
        let Declaration::Typedef(td) = &result.declarations[0] else {
            panic!("expected typedef");
        };
        assert_eq!(td.ty.display_name(), "unsigned long long");
    }

    #[test]
    fn test_typedef_struct() {
        let result = parse(
            "typedef struct { uint32 lo; uint32 hi; } pair_t;",
            "test.dml",
        );
        assert!(!result.diagnostics.has_errors());
        let Declaration::Typedef(td) = &result.declarations[0] else {
            panic!("expected typedef");
        };
        let TypeBase::Struct(body) = &td.ty.base else {
            panic!("expected struct base");
        };
        assert_eq!(body.members.len(), 2);
    }
}
