// Declaration parsing
//
// Top level recognizes the reserved leading keywords; anything else is a
// SyntaxError followed by recovery, never an abort. Object declarations
// follow the common shape `KEYWORD name [clauses] ('{' body '}' | ';')`
// with register size/offset and field bit-range clauses accepted in any
// order. `#if` at declaration level splices both branches into the
// surrounding body; conditional structure is not modeled there.

use crate::ast::{
    BitRange, ConstantDecl, Declaration, DeviceDecl, DmlVersionDecl, EnumDecl, EnumVariant,
    ExternDecl, Ident, ImportDecl, LogGroupDecl, MethodDecl, MethodModifier, MethodParam,
    ObjectDecl, ObjectKind, ParamDecl, StructDecl, TemplateDecl, TypeBase, TypedefDecl, VarDecl,
};
use crate::lexer::TokenKind;

use super::Parser;

impl Parser {
    /// Parse one top-level item, pushing any produced declarations
    pub(super) fn parse_top_level(&mut self, out: &mut Vec<Declaration>) {
        match self.current_kind() {
            TokenKind::Dml => {
                if let Some(decl) = self.parse_dml_version() {
                    out.push(decl);
                }
            }
            TokenKind::Import => {
                if let Some(decl) = self.parse_import() {
                    out.push(decl);
                }
            }
            TokenKind::Device => {
                if let Some(decl) = self.parse_device() {
                    out.push(decl);
                }
            }
            TokenKind::Template => {
                if let Some(decl) = self.parse_template() {
                    out.push(decl);
                }
            }
            // file-level `is template;` applies to the device
            TokenKind::Is => {
                self.advance();
                let templates = self.parse_template_list();
                self.expect(TokenKind::Semicolon);
                self.device_templates.extend(templates);
            }
            TokenKind::HashIf => self.parse_hash_if_decls(out),
            // tolerated structural items with no analysis value
            TokenKind::Bitorder => {
                self.advance();
                self.expect_name();
                self.expect(TokenKind::Semicolon);
            }
            TokenKind::Provisional => {
                self.advance();
                while self.current_kind().is_name_like() {
                    self.advance();
                    if self.consume(TokenKind::Comma).is_none() {
                        break;
                    }
                }
                self.expect(TokenKind::Semicolon);
            }
            TokenKind::Header | TokenKind::Footer => {
                self.advance();
                self.consume(TokenKind::CBlock);
            }
            TokenKind::CBlock => {
                self.advance();
            }
            TokenKind::Export => {
                self.advance();
                self.synchronize();
            }
            TokenKind::Hook => {
                self.advance();
                self.synchronize();
            }
            TokenKind::Library => {
                self.advance();
                self.consume(TokenKind::Semicolon);
            }
            TokenKind::ErrorKw => {
                self.advance();
                self.consume(TokenKind::StringLiteral);
                self.expect(TokenKind::Semicolon);
            }
            _ => {
                if let Some(decl) = self.parse_member_declaration() {
                    out.push(decl);
                }
            }
        }
    }

    /// Declarations legal both at top level and inside object bodies
    fn parse_member_declaration(&mut self) -> Option<Declaration> {
        match self.current_kind() {
            TokenKind::Method
            | TokenKind::Inline
            | TokenKind::Shared
            | TokenKind::Independent
            | TokenKind::Startup
            | TokenKind::Memoized => self.parse_method().map(Declaration::Method),
            TokenKind::Param => self.parse_param().map(Declaration::Param),
            TokenKind::Session => self.parse_var().map(Declaration::Session),
            TokenKind::Saved => self.parse_var().map(Declaration::Saved),
            TokenKind::Data => self.parse_var().map(Declaration::Data),
            TokenKind::Constant => self.parse_constant().map(Declaration::Constant),
            TokenKind::Typedef => self.parse_typedef().map(Declaration::Typedef),
            TokenKind::Struct => self.parse_struct_decl().map(Declaration::Struct),
            TokenKind::Union => self.parse_struct_decl().map(Declaration::Union),
            TokenKind::Enum => self.parse_enum().map(Declaration::Enum),
            TokenKind::Extern => self.parse_extern().map(Declaration::Extern),
            TokenKind::Loggroup => self.parse_loggroup().map(Declaration::LogGroup),
            TokenKind::Bank => self.parse_object(ObjectKind::Bank).map(Declaration::Object),
            TokenKind::Register => self
                .parse_object(ObjectKind::Register {
                    size: None,
                    offset: None,
                })
                .map(Declaration::Object),
            TokenKind::Field => self
                .parse_object(ObjectKind::Field { bits: None })
                .map(Declaration::Object),
            TokenKind::Attribute => self
                .parse_object(ObjectKind::Attribute)
                .map(Declaration::Object),
            TokenKind::Connect => self
                .parse_object(ObjectKind::Connect)
                .map(Declaration::Object),
            TokenKind::Interface => self
                .parse_object(ObjectKind::Interface)
                .map(Declaration::Object),
            TokenKind::Port => self.parse_object(ObjectKind::Port).map(Declaration::Object),
            TokenKind::Implement => self
                .parse_object(ObjectKind::Implement)
                .map(Declaration::Object),
            TokenKind::Event => self
                .parse_object(ObjectKind::Event)
                .map(Declaration::Object),
            TokenKind::Group => self
                .parse_object(ObjectKind::Group)
                .map(Declaration::Object),
            TokenKind::Subdevice => self
                .parse_object(ObjectKind::Subdevice)
                .map(Declaration::Object),
            _ => {
                self.error_unexpected();
                self.synchronize();
                None
            }
        }
    }

    /// `dml 1.4;`
    fn parse_dml_version(&mut self) -> Option<Declaration> {
        let start = self.current_span();
        self.advance();
        let version = match self.current_kind() {
            TokenKind::FloatLiteral | TokenKind::IntLiteral => self.advance().text,
            _ => {
                self.error_expected("version number");
                self.synchronize();
                return None;
            }
        };
        self.expect(TokenKind::Semicolon)?;
        let span = start.extend_to(&self.previous_span());
        self.dml_version = Some(version.clone());
        Some(Declaration::DmlVersion(DmlVersionDecl { version, span }))
    }

    /// `import "utility.dml";`
    fn parse_import(&mut self) -> Option<Declaration> {
        let start = self.current_span();
        self.advance();
        let Some(path_token) = self.expect(TokenKind::StringLiteral) else {
            self.synchronize();
            return None;
        };
        self.expect(TokenKind::Semicolon)?;
        let span = start.extend_to(&self.previous_span());
        let decl = ImportDecl {
            path: path_token.text,
            span,
        };
        self.imports.push(decl.clone());
        Some(Declaration::Import(decl))
    }

    /// `device name [is templates] ;` — the DML 1.4 form; the body lives
    /// elsewhere in the file. An inline block is tolerated.
    fn parse_device(&mut self) -> Option<Declaration> {
        let start = self.current_span();
        self.advance();
        let name = match self.expect_name() {
            Some(name) => name,
            None => {
                self.synchronize();
                return None;
            }
        };

        let mut templates = Vec::new();
        if self.consume(TokenKind::Is).is_some() {
            templates = self.parse_template_list();
        }

        let body = if self.check(TokenKind::LBrace) {
            let (declarations, applied) = self.parse_object_body();
            templates.extend(applied);
            Some(declarations)
        } else {
            self.expect(TokenKind::Semicolon)?;
            None
        };

        let span = start.extend_to(&self.previous_span());
        Some(Declaration::Device(DeviceDecl {
            name,
            templates,
            body,
            span,
        }))
    }

    /// `template name [is parents] { body }`; `is x;` items in the body
    /// are folded into the parent list
    fn parse_template(&mut self) -> Option<Declaration> {
        let start = self.current_span();
        self.advance();
        let name = match self.expect_name() {
            Some(name) => name,
            None => {
                self.synchronize();
                return None;
            }
        };

        let mut parents = Vec::new();
        if self.consume(TokenKind::Is).is_some() {
            parents = self.parse_template_list();
        }

        self.expect(TokenKind::LBrace)?;
        let (body, body_parents) = self.parse_body_declarations();
        self.expect(TokenKind::RBrace)?;
        parents.extend(body_parents);

        let span = start.extend_to(&self.previous_span());
        Some(Declaration::Template(TemplateDecl {
            name,
            parents,
            body,
            span,
        }))
    }

    /// `KEYWORD name [array-dims] [clauses] ('{' body '}' | ';')`
    fn parse_object(&mut self, mut kind: ObjectKind) -> Option<ObjectDecl> {
        let start = self.current_span();
        self.advance();
        let name = match self.expect_name() {
            Some(name) => name,
            None => {
                self.synchronize();
                return None;
            }
        };

        // object arrays (`register regs[i < 4]`) are accepted, dimensions
        // are not modeled
        if self.check(TokenKind::LBracket) {
            self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket);
        }

        let mut templates = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::Size => {
                    self.advance();
                    let expr = self.parse_expr()?;
                    if let ObjectKind::Register { size, .. } = &mut kind {
                        *size = Some(expr);
                    } else {
                        let span = self.previous_span();
                        self.syntax_error("'size' clause is only valid on registers", span);
                    }
                }
                TokenKind::At => {
                    self.advance();
                    if self.check(TokenKind::LBracket) {
                        // field bit range: @ [msb:lsb]
                        let range_start = self.current_span();
                        self.advance();
                        let msb = self.parse_expr()?;
                        let lsb = if self.consume(TokenKind::Colon).is_some() {
                            Some(self.parse_expr()?)
                        } else {
                            None
                        };
                        let range_end = self.current_span();
                        self.expect(TokenKind::RBracket)?;
                        let bit_range = BitRange {
                            msb,
                            lsb,
                            span: range_start.extend_to(&range_end),
                        };
                        if let ObjectKind::Field { bits } = &mut kind {
                            *bits = Some(bit_range);
                        } else {
                            self.syntax_error(
                                "bit range clause is only valid on fields",
                                bit_range.span,
                            );
                        }
                    } else {
                        let expr = self.parse_expr()?;
                        if let ObjectKind::Register { offset, .. } = &mut kind {
                            *offset = Some(expr);
                        } else {
                            let span = self.previous_span();
                            self.syntax_error("'@' offset clause is only valid on registers", span);
                        }
                    }
                }
                TokenKind::Is => {
                    self.advance();
                    templates.extend(self.parse_template_list());
                }
                _ => break,
            }
        }

        let body = if self.check(TokenKind::LBrace) {
            self.advance();
            let (body, body_templates) = self.parse_body_declarations();
            self.expect(TokenKind::RBrace)?;
            templates.extend(body_templates);
            body
        } else {
            self.expect(TokenKind::Semicolon)?;
            Vec::new()
        };

        let span = start.extend_to(&self.previous_span());
        Some(ObjectDecl {
            kind,
            name,
            templates,
            body,
            span,
        })
    }

    /// Body declarations until the closing brace; returns the items plus
    /// templates applied through `is x;` items
    fn parse_body_declarations(&mut self) -> (Vec<Declaration>, Vec<Ident>) {
        let mut declarations = Vec::new();
        let mut applied = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            let before = self.cursor;
            match self.current_kind() {
                TokenKind::Is => {
                    self.advance();
                    applied.extend(self.parse_template_list());
                    self.expect(TokenKind::Semicolon);
                }
                TokenKind::HashIf => self.parse_hash_if_decls(&mut declarations),
                TokenKind::ErrorKw => {
                    self.advance();
                    self.consume(TokenKind::StringLiteral);
                    self.expect(TokenKind::Semicolon);
                }
                _ => {
                    if let Some(decl) = self.parse_member_declaration() {
                        declarations.push(decl);
                    }
                }
            }
            if self.cursor == before {
                self.advance();
            }
        }
        (declarations, applied)
    }

    /// After the `{` body `}` of a device declared with an inline block
    fn parse_object_body(&mut self) -> (Vec<Declaration>, Vec<Ident>) {
        self.expect(TokenKind::LBrace);
        let result = self.parse_body_declarations();
        self.expect(TokenKind::RBrace);
        result
    }

    /// `#if (cond) { decls } [#else { decls }]` at declaration level; both
    /// branches are spliced into the output
    fn parse_hash_if_decls(&mut self, out: &mut Vec<Declaration>) {
        self.advance();
        self.expect(TokenKind::LParen);
        if self.parse_expr().is_none() {
            self.synchronize();
            return;
        }
        self.expect(TokenKind::RParen);
        if self.check(TokenKind::LBrace) {
            let (decls, _) = self.parse_object_body();
            out.extend(decls);
        }
        if self.consume(TokenKind::HashElse).is_some() {
            if self.check(TokenKind::HashIf) {
                self.parse_hash_if_decls(out);
            } else if self.check(TokenKind::LBrace) {
                let (decls, _) = self.parse_object_body();
                out.extend(decls);
            }
        }
    }

    /// `t`, `t1, t2` or `(t1, t2)` after `is`
    fn parse_template_list(&mut self) -> Vec<Ident> {
        let mut templates = Vec::new();
        let parenthesized = self.consume(TokenKind::LParen).is_some();
        loop {
            match self.expect_name() {
                Some(name) => templates.push(name),
                None => break,
            }
            if self.consume(TokenKind::Comma).is_none() {
                break;
            }
        }
        if parenthesized {
            self.expect(TokenKind::RParen);
        }
        templates
    }

    /// Ordered modifiers, then
    /// `method name(params) [-> (types)] [throws] [default] (body | ;)`
    fn parse_method(&mut self) -> Option<MethodDecl> {
        let start = self.current_span();

        let mut modifier = None;
        let mut independent = false;
        let mut startup = false;
        let mut memoized = false;
        // ranks enforce the declared order: inline|shared, independent,
        // startup, memoized
        let mut last_rank = 0u8;
        loop {
            let rank: u8 = match self.current_kind() {
                TokenKind::Inline | TokenKind::Shared => 1,
                TokenKind::Independent => 2,
                TokenKind::Startup => 3,
                TokenKind::Memoized => 4,
                _ => break,
            };
            let token = self.advance();
            if rank < last_rank {
                self.syntax_error(
                    format!(
                        "method modifier {} is out of order",
                        token.kind.display_name()
                    ),
                    token.span.clone(),
                );
            }
            last_rank = last_rank.max(rank);
            match token.kind {
                TokenKind::Inline => {
                    if modifier.is_none() {
                        modifier = Some(MethodModifier::Inline);
                    }
                }
                TokenKind::Shared => {
                    if modifier.is_none() {
                        modifier = Some(MethodModifier::Shared);
                    }
                }
                TokenKind::Independent => independent = true,
                TokenKind::Startup => startup = true,
                TokenKind::Memoized => memoized = true,
                _ => {}
            }
        }

        self.expect(TokenKind::Method)?;
        let name = match self.expect_name() {
            Some(name) => name,
            None => {
                self.synchronize();
                return None;
            }
        };

        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                match self.parse_method_param() {
                    Some(param) => params.push(param),
                    None => break,
                }
                if self.consume(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        let mut returns = Vec::new();
        if self.consume(TokenKind::Arrow).is_some() {
            self.expect(TokenKind::LParen)?;
            loop {
                match self.parse_type() {
                    Some(ty) => returns.push(ty),
                    None => break,
                }
                if self.consume(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
        }

        let throws = self.consume(TokenKind::Throws).is_some();
        let is_default = self.consume(TokenKind::Default).is_some();

        let body = if self.check(TokenKind::LBrace) {
            Some(self.parse_block()?)
        } else {
            self.expect(TokenKind::Semicolon)?;
            None
        };

        let span = start.extend_to(&self.previous_span());
        Some(MethodDecl {
            name,
            modifier,
            independent,
            startup,
            memoized,
            params,
            returns,
            throws,
            is_default,
            body,
            span,
        })
    }

    /// `type name` or bare `name` (untyped, inline methods)
    fn parse_method_param(&mut self) -> Option<MethodParam> {
        let ty = self.parse_type()?;
        if self.current_kind().is_name_like() {
            let name = self.expect_name()?;
            return Some(MethodParam { ty: Some(ty), name });
        }
        // a lone name parses as a simple named type; reinterpret it
        if let TypeBase::Named(ident) = &ty.base {
            if !ty.is_const && ty.pointer_depth == 0 && !ty.vect {
                return Some(MethodParam {
                    ty: None,
                    name: ident.clone(),
                });
            }
        }
        self.error_expected("parameter name");
        None
    }

    /// `param name [: type] [(= | default) value] ;`
    fn parse_param(&mut self) -> Option<ParamDecl> {
        let start = self.current_span();
        self.advance();
        let name = match self.expect_name() {
            Some(name) => name,
            None => {
                self.synchronize();
                return None;
            }
        };

        let mut ty = None;
        if self.consume(TokenKind::Colon).is_some() {
            ty = self.parse_type();
        }

        let mut value = None;
        let mut is_default_value = false;
        if self.consume(TokenKind::Assign).is_some() {
            value = Some(self.parse_expr()?);
        } else if self.consume(TokenKind::Default).is_some() {
            is_default_value = true;
            value = Some(self.parse_expr()?);
        } else if self.consume(TokenKind::Auto).is_some() {
            // `param name auto;` leaves the value provided by the runtime
        }

        self.expect(TokenKind::Semicolon)?;
        let span = start.extend_to(&self.previous_span());
        Some(ParamDecl {
            name,
            ty,
            value,
            is_default_value,
            span,
        })
    }

    /// `session|saved|data type name [= init] ;`
    fn parse_var(&mut self) -> Option<VarDecl> {
        let start = self.current_span();
        self.advance();
        let ty = self.parse_type()?;
        let name = match self.expect_name() {
            Some(name) => name,
            None => {
                self.synchronize();
                return None;
            }
        };
        let init = if self.consume(TokenKind::Assign).is_some() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        let span = start.extend_to(&self.previous_span());
        Some(VarDecl {
            ty,
            name,
            init,
            span,
        })
    }

    /// `constant NAME = value;`
    fn parse_constant(&mut self) -> Option<ConstantDecl> {
        let start = self.current_span();
        self.advance();
        let name = match self.expect_name() {
            Some(name) => name,
            None => {
                self.synchronize();
                return None;
            }
        };
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        let span = start.extend_to(&self.previous_span());
        Some(ConstantDecl { name, value, span })
    }

    /// `typedef type name;`
    fn parse_typedef(&mut self) -> Option<TypedefDecl> {
        let start = self.current_span();
        self.advance();
        let ty = self.parse_type()?;
        let name = match self.expect_name() {
            Some(name) => name,
            None => {
                self.synchronize();
                return None;
            }
        };
        self.expect(TokenKind::Semicolon)?;
        let span = start.extend_to(&self.previous_span());
        Some(TypedefDecl { name, ty, span })
    }

    /// `struct name { members }` / `union name { members }`
    fn parse_struct_decl(&mut self) -> Option<StructDecl> {
        let start = self.current_span();
        let is_union = self.check(TokenKind::Union);
        self.advance();
        let name = match self.expect_name() {
            Some(name) => name,
            None => {
                self.synchronize();
                return None;
            }
        };
        let body = self.parse_struct_body(is_union)?;
        self.consume(TokenKind::Semicolon);
        let span = start.extend_to(&self.previous_span());
        Some(StructDecl {
            name,
            members: body.members,
            span,
        })
    }

    /// `enum name { A, B = 2 }`
    fn parse_enum(&mut self) -> Option<EnumDecl> {
        let start = self.current_span();
        self.advance();
        let name = match self.expect_name() {
            Some(name) => name,
            None => {
                self.synchronize();
                return None;
            }
        };
        self.expect(TokenKind::LBrace)?;
        let mut variants = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            let Some(variant_name) = self.expect_name() else {
                self.synchronize();
                break;
            };
            let value = if self.consume(TokenKind::Assign).is_some() {
                Some(self.parse_expr()?)
            } else {
                None
            };
            variants.push(EnumVariant {
                name: variant_name,
                value,
            });
            if self.consume(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        self.consume(TokenKind::Semicolon);
        let span = start.extend_to(&self.previous_span());
        Some(EnumDecl {
            name,
            variants,
            span,
        })
    }

    /// `extern [type] name;`
    fn parse_extern(&mut self) -> Option<ExternDecl> {
        let start = self.current_span();
        self.advance();
        let ty = self.parse_type()?;
        let (ty, name) = if self.current_kind().is_name_like() {
            let name = self.expect_name()?;
            (Some(ty), name)
        } else if let TypeBase::Named(ident) = &ty.base {
            (None, ident.clone())
        } else {
            self.error_expected("name");
            self.synchronize();
            return None;
        };
        self.expect(TokenKind::Semicolon)?;
        let span = start.extend_to(&self.previous_span());
        Some(ExternDecl { ty, name, span })
    }

    /// `loggroup name;`
    fn parse_loggroup(&mut self) -> Option<LogGroupDecl> {
        let start = self.current_span();
        self.advance();
        let name = match self.expect_name() {
            Some(name) => name,
            None => {
                self.synchronize();
                return None;
            }
        };
        self.expect(TokenKind::Semicolon)?;
        let span = start.extend_to(&self.previous_span());
        Some(LogGroupDecl { name, span })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_device_with_templates() {
        let result = parse("dml 1.4;\ndevice timer is (base_device, resettable);\n", "test.dml");
        assert!(!result.diagnostics.has_errors());
        let Declaration::Device(device) = &result.declarations[1] else {
            panic!("expected device");
        };
        assert_eq!(device.name.name, "timer");
        assert_eq!(device.templates.len(), 2);
        assert!(device.body.is_none());
    }

    #[test]
    fn test_register_clauses_in_any_order() {
        for source in [
            "bank b { register r size 4 @ 0x10 is (read_only); }",
            "bank b { register r @ 0x10 size 4 is (read_only); }",
            "bank b { register r is read_only size 4 @ 0x10; }",
        ] {
            let result = parse(source, "test.dml");
            assert!(
                !result.diagnostics.has_errors(),
                "errors for {:?}: {:?}",
                source,
                result.diagnostics.as_slice()
            );
            let Declaration::Object(bank) = &result.declarations[0] else {
                panic!("expected bank");
            };
            let Declaration::Object(register) = &bank.body[0] else {
                panic!("expected register");
            };
            let ObjectKind::Register { size, offset } = &register.kind else {
                panic!("expected register kind");
            };
            assert!(size.is_some());
            assert!(offset.is_some());
            assert_eq!(register.templates.len(), 1);
        }
    }

    #[test]
    fn test_field_bit_range() {
        let result = parse(
            "bank b { register r size 4 @ 0x0 { field enable @ [0]; field mode @ [3:1]; } }",
            "test.dml",
        );
        assert!(!result.diagnostics.has_errors());
        let Declaration::Object(bank) = &result.declarations[0] else {
            panic!("expected bank");
        };
        let Declaration::Object(register) = &bank.body[0] else {
            panic!("expected register");
        };
        let Declaration::Object(enable) = &register.body[0] else {
            panic!("expected field");
        };
        let ObjectKind::Field { bits } = &enable.kind else {
            panic!("expected field kind");
        };
        let bits = bits.as_ref().expect("bit range");
        assert!(bits.lsb.is_none());
        let Declaration::Object(mode) = &register.body[1] else {
            panic!("expected field");
        };
        let ObjectKind::Field { bits } = &mode.kind else {
            panic!("expected field kind");
        };
        assert!(bits.as_ref().expect("bit range").lsb.is_some());
    }

    #[test]
    fn test_method_modifiers() {
        let result = parse(
            "template t { independent startup memoized method boot() -> (bool) { return true; } }",
            "test.dml",
        );
        assert!(!result.diagnostics.has_errors());
        let Declaration::Template(template) = &result.declarations[0] else {
            panic!("expected template");
        };
        let Declaration::Method(method) = &template.body[0] else {
            panic!("expected method");
        };
        assert!(method.independent && method.startup && method.memoized);
        assert_eq!(method.returns.len(), 1);
    }

    #[test]
    fn test_method_modifier_order_enforced() {
        let result = parse("memoized startup method m() { }", "test.dml");
        assert!(result.diagnostics.has_errors());
        // the method is still produced
        assert!(matches!(result.declarations[0], Declaration::Method(_)));
    }

    #[test]
    fn test_abstract_method() {
        let result = parse("template t { shared method get() -> (uint64); }", "test.dml");
        assert!(!result.diagnostics.has_errors());
        let Declaration::Template(template) = &result.declarations[0] else {
            panic!("expected template");
        };
        let Declaration::Method(method) = &template.body[0] else {
            panic!("expected method");
        };
        assert!(method.is_abstract());
        assert_eq!(method.modifier, Some(MethodModifier::Shared));
    }

    #[test]
    fn test_template_is_body_items() {
        let result = parse("template t { is base; is other; param x = 1; }", "test.dml");
        assert!(!result.diagnostics.has_errors());
        let Declaration::Template(template) = &result.declarations[0] else {
            panic!("expected template");
        };
        assert_eq!(template.parents.len(), 2);
        assert_eq!(template.params().count(), 1);
    }

    #[test]
    fn test_param_forms() {
        let result = parse(
            "param a = 4;\nparam b: uint32 = 0;\nparam c default 10;\nparam d;\nparam size = 8;",
            "test.dml",
        );
        assert!(
            !result.diagnostics.has_errors(),
            "{:?}",
            result.diagnostics.as_slice()
        );
        assert_eq!(result.declarations.len(), 5);
        let Declaration::Param(c) = &result.declarations[2] else {
            panic!("expected param");
        };
        assert!(c.is_default_value);
        let Declaration::Param(d) = &result.declarations[3] else {
            panic!("expected param");
        };
        assert!(d.value.is_none());
        let Declaration::Param(size) = &result.declarations[4] else {
            panic!("expected param");
        };
        assert_eq!(size.name.name, "size");
    }

    #[test]
    fn test_session_saved_data() {
        let result = parse(
            "session uint32 counter = 0;\nsaved bool armed;\ndata uint8 buffer;",
            "test.dml",
        );
        assert!(!result.diagnostics.has_errors());
        assert!(matches!(result.declarations[0], Declaration::Session(_)));
        assert!(matches!(result.declarations[1], Declaration::Saved(_)));
        assert!(matches!(result.declarations[2], Declaration::Data(_)));
    }

    #[test]
    fn test_object_array_tolerated() {
        let result = parse("bank b { register regs[i < 4] size 4 @ 0x0 + i * 4; }", "test.dml");
        assert!(
            !result.diagnostics.has_errors(),
            "{:?}",
            result.diagnostics.as_slice()
        );
    }

    #[test]
    fn test_hash_if_splices_declarations() {
        let result = parse(
            "#if (defined FAST) { param speed = 2; } #else { param speed = 1; }",
            "test.dml",
        );
        assert!(!result.diagnostics.has_errors());
        assert_eq!(result.declarations.len(), 2);
    }

    #[test]
    fn test_incomplete_declaration_recovers() {
        let result = parse("register r size\ntemplate t { }", "test.dml");
        assert!(result.diagnostics.has_errors());
        // the template after the broken register still parses
        assert!(result
            .declarations
            .iter()
            .any(|d| matches!(d, Declaration::Template(_))));
    }

    #[test]
    fn test_loggroup_and_constant() {
        let result = parse("loggroup irq;\nconstant WIDTH = 32;", "test.dml");
        assert!(!result.diagnostics.has_errors());
        assert!(matches!(result.declarations[0], Declaration::LogGroup(_)));
        assert!(matches!(result.declarations[1], Declaration::Constant(_)));
    }
}
