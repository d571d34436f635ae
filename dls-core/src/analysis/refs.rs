// Reference collection
//
// One pass over the AST recording every observed use of a name with the
// role the site implies: callee position is a Method use, a cast target
// or declared type is a Type use, a name after `is` is a Template use,
// and plain value positions are Variable uses. Member accesses record
// the base object only; resolving the member needs type information the
// core does not compute.

use crate::ast::{
    Declaration, Expression, ObjectKind, Statement, TypeBase, TypeExpr,
};
use crate::analysis::symbol::{Reference, ReferenceKind};

// Builtin C-ish type names that never resolve to a user symbol
const BUILTIN_TYPES: &[&str] = &[
    "void", "bool", "char", "int", "float", "double", "short", "long", "signed", "unsigned",
    "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32", "uint64", "size_t",
    "uintptr_t", "intptr_t",
];

/// Collects references from declarations, statements and expressions
#[derive(Default)]
pub struct ReferenceCollector {
    references: Vec<Reference>,
}

impl ReferenceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Vec<Reference> {
        self.references
    }

    pub fn collect_declarations(&mut self, declarations: &[Declaration]) {
        for declaration in declarations {
            self.collect_declaration(declaration);
        }
    }

    pub fn collect_declaration(&mut self, declaration: &Declaration) {
        match declaration {
            Declaration::DmlVersion(_) | Declaration::Import(_) | Declaration::LogGroup(_) => {}
            Declaration::Device(device) => {
                for template in &device.templates {
                    self.push(&template.name, ReferenceKind::Template, template.span.clone());
                }
                if let Some(body) = &device.body {
                    self.collect_declarations(body);
                }
            }
            Declaration::Template(template) => {
                for parent in &template.parents {
                    self.push(&parent.name, ReferenceKind::Template, parent.span.clone());
                }
                self.collect_declarations(&template.body);
            }
            Declaration::Object(object) => {
                for template in &object.templates {
                    self.push(&template.name, ReferenceKind::Template, template.span.clone());
                }
                match &object.kind {
                    ObjectKind::Register { size, offset } => {
                        if let Some(size) = size {
                            self.collect_expression(size, ReferenceKind::Variable);
                        }
                        if let Some(offset) = offset {
                            self.collect_expression(offset, ReferenceKind::Variable);
                        }
                    }
                    ObjectKind::Field { bits: Some(bits) } => {
                        self.collect_expression(&bits.msb, ReferenceKind::Variable);
                        if let Some(lsb) = &bits.lsb {
                            self.collect_expression(lsb, ReferenceKind::Variable);
                        }
                    }
                    _ => {}
                }
                self.collect_declarations(&object.body);
            }
            Declaration::Method(method) => {
                for param in &method.params {
                    if let Some(ty) = &param.ty {
                        self.collect_type(ty);
                    }
                }
                for ty in &method.returns {
                    self.collect_type(ty);
                }
                if let Some(body) = &method.body {
                    for statement in &body.statements {
                        self.collect_statement(statement);
                    }
                }
            }
            Declaration::Param(param) => {
                if let Some(ty) = &param.ty {
                    self.collect_type(ty);
                }
                if let Some(value) = &param.value {
                    self.collect_expression(value, ReferenceKind::Variable);
                }
            }
            Declaration::Session(var) | Declaration::Saved(var) | Declaration::Data(var) => {
                self.collect_type(&var.ty);
                if let Some(init) = &var.init {
                    self.collect_expression(init, ReferenceKind::Variable);
                }
            }
            Declaration::Constant(constant) => {
                self.collect_expression(&constant.value, ReferenceKind::Constant);
            }
            Declaration::Typedef(typedef) => self.collect_type(&typedef.ty),
            Declaration::Struct(decl) | Declaration::Union(decl) => {
                for member in &decl.members {
                    self.collect_type(&member.ty);
                }
            }
            Declaration::Enum(decl) => {
                for variant in &decl.variants {
                    if let Some(value) = &variant.value {
                        self.collect_expression(value, ReferenceKind::Constant);
                    }
                }
            }
            Declaration::Extern(decl) => {
                if let Some(ty) = &decl.ty {
                    self.collect_type(ty);
                }
            }
        }
    }

    pub fn collect_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Block(block) => {
                for statement in &block.statements {
                    self.collect_statement(statement);
                }
            }
            Statement::If(stmt) => {
                self.collect_expression(&stmt.condition, ReferenceKind::Variable);
                self.collect_statement(&stmt.then_branch);
                if let Some(else_branch) = &stmt.else_branch {
                    self.collect_statement(else_branch);
                }
            }
            Statement::While(stmt) => {
                self.collect_expression(&stmt.condition, ReferenceKind::Variable);
                self.collect_statement(&stmt.body);
            }
            Statement::DoWhile(stmt) => {
                self.collect_statement(&stmt.body);
                self.collect_expression(&stmt.condition, ReferenceKind::Variable);
            }
            Statement::For(stmt) => {
                if let Some(init) = &stmt.init {
                    self.collect_statement(init);
                }
                if let Some(condition) = &stmt.condition {
                    self.collect_expression(condition, ReferenceKind::Variable);
                }
                for update in &stmt.update {
                    self.collect_expression(update, ReferenceKind::Variable);
                }
                self.collect_statement(&stmt.body);
            }
            Statement::Foreach(stmt) => {
                self.collect_expression(&stmt.list, ReferenceKind::Variable);
                self.collect_statement(&stmt.body);
            }
            Statement::Switch(stmt) => {
                self.collect_expression(&stmt.scrutinee, ReferenceKind::Variable);
                for case in &stmt.cases {
                    if let Some(label) = &case.label {
                        self.collect_expression(label, ReferenceKind::Constant);
                    }
                    for statement in &case.body {
                        self.collect_statement(statement);
                    }
                }
            }
            Statement::Return(stmt) => {
                if let Some(value) = &stmt.value {
                    self.collect_expression(value, ReferenceKind::Variable);
                }
            }
            Statement::Label(stmt) => self.collect_statement(&stmt.statement),
            Statement::Try(stmt) => {
                self.collect_statement(&stmt.body);
                self.collect_statement(&stmt.handler);
            }
            Statement::Log(stmt) => {
                if let Some(level) = &stmt.level {
                    self.collect_expression(level, ReferenceKind::Variable);
                }
                if let Some(groups) = &stmt.groups {
                    self.collect_expression(groups, ReferenceKind::Variable);
                }
                self.collect_expression(&stmt.message, ReferenceKind::Variable);
                for arg in &stmt.args {
                    self.collect_expression(arg, ReferenceKind::Variable);
                }
            }
            Statement::Assert(stmt) => {
                self.collect_expression(&stmt.condition, ReferenceKind::Variable);
            }
            Statement::After(stmt) => {
                if let Some(delay) = &stmt.delay {
                    self.collect_expression(delay, ReferenceKind::Variable);
                }
                self.collect_expression(&stmt.call, ReferenceKind::Method);
            }
            Statement::Delete(stmt) => {
                self.collect_expression(&stmt.expr, ReferenceKind::Variable);
            }
            Statement::Local(stmt) => {
                self.collect_type(&stmt.ty);
                if let Some(init) = &stmt.init {
                    self.collect_expression(init, ReferenceKind::Variable);
                }
            }
            Statement::HashIf(stmt) => {
                self.collect_expression(&stmt.condition, ReferenceKind::Variable);
                for statement in &stmt.then_body {
                    self.collect_statement(statement);
                }
                if let Some(else_body) = &stmt.else_body {
                    for statement in else_body {
                        self.collect_statement(statement);
                    }
                }
            }
            Statement::HashForeach(stmt) => {
                self.collect_expression(&stmt.list, ReferenceKind::Variable);
                for statement in &stmt.body {
                    self.collect_statement(statement);
                }
            }
            Statement::HashSelect(stmt) => {
                self.collect_expression(&stmt.list, ReferenceKind::Variable);
                self.collect_expression(&stmt.where_clause, ReferenceKind::Variable);
                for statement in &stmt.body {
                    self.collect_statement(statement);
                }
                if let Some(else_body) = &stmt.else_body {
                    for statement in else_body {
                        self.collect_statement(statement);
                    }
                }
            }
            Statement::Expression(stmt) => {
                self.collect_expression(&stmt.expr, ReferenceKind::Variable);
            }
            Statement::Break(_)
            | Statement::Continue(_)
            | Statement::Goto(_)
            | Statement::Throw(_)
            | Statement::Error(_)
            | Statement::InlineC(_)
            | Statement::Empty(_) => {}
        }
    }

    pub fn collect_expression(&mut self, expression: &Expression, kind: ReferenceKind) {
        match expression {
            Expression::Literal(_) => {}
            Expression::Identifier(ident) => {
                if ident.name != "this" {
                    self.push(&ident.name, kind, ident.span.clone());
                }
            }
            Expression::Binary(expr) => {
                self.collect_expression(&expr.left, ReferenceKind::Variable);
                self.collect_expression(&expr.right, ReferenceKind::Variable);
            }
            Expression::Unary(expr) => {
                self.collect_expression(&expr.operand, ReferenceKind::Variable);
            }
            Expression::Call(expr) => {
                // an identifier in call position is a method use
                if let Expression::Identifier(callee) = &expr.callee {
                    self.push(&callee.name, ReferenceKind::Method, callee.span.clone());
                } else {
                    self.collect_expression(&expr.callee, ReferenceKind::Method);
                }
                for arg in &expr.args {
                    self.collect_expression(arg, ReferenceKind::Variable);
                }
            }
            Expression::Member(expr) => {
                self.collect_expression(&expr.base, ReferenceKind::Variable);
            }
            Expression::Index(expr) => {
                self.collect_expression(&expr.base, ReferenceKind::Variable);
                self.collect_expression(&expr.index, ReferenceKind::Variable);
            }
            Expression::Ternary(expr) => {
                self.collect_expression(&expr.condition, ReferenceKind::Variable);
                self.collect_expression(&expr.then_expr, ReferenceKind::Variable);
                self.collect_expression(&expr.else_expr, ReferenceKind::Variable);
            }
            Expression::BitSlice(expr) => {
                self.collect_expression(&expr.base, ReferenceKind::Variable);
                self.collect_expression(&expr.msb, ReferenceKind::Variable);
                self.collect_expression(&expr.lsb, ReferenceKind::Variable);
            }
            Expression::Cast(expr) => {
                self.collect_expression(&expr.expr, ReferenceKind::Variable);
                self.collect_type(&expr.ty);
            }
            Expression::SizeOf(expr) => {
                self.collect_expression(&expr.expr, ReferenceKind::Variable);
            }
            Expression::SizeOfType(expr) => self.collect_type(&expr.ty),
            Expression::New(expr) => {
                self.collect_type(&expr.ty);
                if let Some(count) = &expr.count {
                    self.collect_expression(count, ReferenceKind::Variable);
                }
            }
            Expression::InitList(expr) => {
                for element in &expr.elements {
                    self.collect_expression(element, ReferenceKind::Variable);
                }
            }
        }
    }

    pub fn collect_type(&mut self, ty: &TypeExpr) {
        match &ty.base {
            TypeBase::Named(ident) => {
                if !BUILTIN_TYPES.contains(&ident.name.as_str()) && !ident.name.contains(' ') {
                    self.push(&ident.name, ReferenceKind::Type, ident.span.clone());
                }
            }
            TypeBase::Struct(body) => {
                for member in &body.members {
                    self.collect_type(&member.ty);
                }
            }
            TypeBase::Typeof(expr) => self.collect_expression(expr, ReferenceKind::Variable),
            TypeBase::Auto => {}
        }
    }

    fn push(&mut self, name: &str, kind: ReferenceKind, span: crate::source::ZeroSpan) {
        self.references.push(Reference::new(name, kind, span));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn references_for(source: &str) -> Vec<Reference> {
        let result = parse(source, "test.dml");
        assert!(
            !result.diagnostics.has_errors(),
            "parse errors: {:?}",
            result.diagnostics.as_slice()
        );
        let mut collector = ReferenceCollector::new();
        collector.collect_declarations(&result.declarations);
        collector.finish()
    }

    #[test]
    fn test_is_clause_yields_template_references() {
        let refs = references_for("dml 1.4;\ndevice d is (base, resettable);");
        let templates: Vec<_> = refs
            .iter()
            .filter(|r| r.kind == ReferenceKind::Template)
            .collect();
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].name, "base");
    }

    #[test]
    fn test_call_position_is_method_reference() {
        let refs = references_for("method m() { update(1 + count); }");
        assert!(refs
            .iter()
            .any(|r| r.name == "update" && r.kind == ReferenceKind::Method));
        assert!(refs
            .iter()
            .any(|r| r.name == "count" && r.kind == ReferenceKind::Variable));
    }

    #[test]
    fn test_cast_target_is_type_reference() {
        let refs = references_for("method m() { local int x = cast(raw, reg_val_t); }");
        assert!(refs
            .iter()
            .any(|r| r.name == "reg_val_t" && r.kind == ReferenceKind::Type));
        // builtin type names are not references
        assert!(!refs.iter().any(|r| r.name == "int"));
    }

    #[test]
    fn test_member_access_records_base_only() {
        let refs = references_for("method m() { regs.ctrl = 1; }");
        assert!(refs.iter().any(|r| r.name == "regs"));
        assert!(!refs.iter().any(|r| r.name == "ctrl"));
    }

    #[test]
    fn test_constant_initializer_references() {
        let refs = references_for("constant TOTAL = BASE + 4;");
        assert!(refs
            .iter()
            .any(|r| r.name == "BASE" && r.kind == ReferenceKind::Constant));
    }
}
