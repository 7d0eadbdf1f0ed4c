//! Read-only tree traversal.
//!
//! Implement [`Visitor`] and override the `visit_*` hooks of interest; call
//! the matching `walk_*` function from an override to keep descending.
//! Traversal is pre-order and follows source order, so hooks fire for outer
//! nodes before the nodes they contain.

use super::*;

pub trait Visitor {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_statement(&mut self, stmt: &Statement) {
        walk_statement(self, stmt);
    }

    fn visit_expression(&mut self, expr: &Expression) {
        walk_expression(self, expr);
    }

    fn visit_pattern(&mut self, pattern: &Pattern) {
        walk_pattern(self, pattern);
    }

    fn visit_block(&mut self, block: &BlockStatement) {
        walk_block(self, block);
    }

    fn visit_function(&mut self, function: &Function) {
        walk_function(self, function);
    }

    fn visit_arrow_function(&mut self, arrow: &ArrowFunction) {
        walk_arrow_function(self, arrow);
    }

    fn visit_class(&mut self, class: &Class) {
        walk_class(self, class);
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause) {
        walk_catch_clause(self, clause);
    }

    fn visit_property_key(&mut self, key: &PropertyKey) {
        walk_property_key(self, key);
    }

    fn visit_identifier(&mut self, _id: &Identifier) {}
}

pub fn walk_program<V: Visitor + ?Sized>(v: &mut V, program: &Program) {
    for stmt in &program.statements {
        v.visit_statement(stmt);
    }
}

pub fn walk_block<V: Visitor + ?Sized>(v: &mut V, block: &BlockStatement) {
    for stmt in &block.statements {
        v.visit_statement(stmt);
    }
}

fn walk_variable_decl<V: Visitor + ?Sized>(v: &mut V, decl: &VariableDecl) {
    for declarator in &decl.declarations {
        v.visit_pattern(&declarator.target);
        if let Some(init) = &declarator.init {
            v.visit_expression(init);
        }
    }
}

pub fn walk_statement<V: Visitor + ?Sized>(v: &mut V, stmt: &Statement) {
    match stmt {
        Statement::VariableDecl(decl) => walk_variable_decl(v, decl),
        Statement::FunctionDecl(function) => v.visit_function(function),
        Statement::ClassDecl(class) => v.visit_class(class),
        Statement::Expression(s) => v.visit_expression(&s.expression),
        Statement::Block(block) => v.visit_block(block),
        Statement::Empty(_) | Statement::Debugger(_) => {}
        Statement::If(s) => {
            v.visit_expression(&s.condition);
            v.visit_statement(&s.then_branch);
            if let Some(else_branch) = &s.else_branch {
                v.visit_statement(else_branch);
            }
        }
        Statement::For(s) => {
            match &s.init {
                Some(ForInit::VariableDecl(decl)) => walk_variable_decl(v, decl),
                Some(ForInit::Expression(e)) => v.visit_expression(e),
                None => {}
            }
            if let Some(test) = &s.test {
                v.visit_expression(test);
            }
            if let Some(update) = &s.update {
                v.visit_expression(update);
            }
            v.visit_statement(&s.body);
        }
        Statement::ForIn(s) => {
            match &s.left {
                ForInTarget::VariableDecl(decl) => walk_variable_decl(v, decl),
                ForInTarget::Pattern(p) => v.visit_pattern(p),
            }
            v.visit_expression(&s.right);
            v.visit_statement(&s.body);
        }
        Statement::While(s) => {
            v.visit_expression(&s.condition);
            v.visit_statement(&s.body);
        }
        Statement::DoWhile(s) => {
            v.visit_statement(&s.body);
            v.visit_expression(&s.condition);
        }
        Statement::Return(s) => {
            if let Some(value) = &s.value {
                v.visit_expression(value);
            }
        }
        Statement::Break(s) | Statement::Continue(s) => {
            if let Some(label) = &s.label {
                v.visit_identifier(label);
            }
        }
        Statement::Throw(s) => v.visit_expression(&s.value),
        Statement::Try(s) => {
            v.visit_block(&s.block);
            if let Some(handler) = &s.handler {
                v.visit_catch_clause(handler);
            }
            if let Some(finalizer) = &s.finalizer {
                v.visit_block(finalizer);
            }
        }
        Statement::Switch(s) => {
            v.visit_expression(&s.discriminant);
            for case in &s.cases {
                if let Some(test) = &case.test {
                    v.visit_expression(test);
                }
                for stmt in &case.consequent {
                    v.visit_statement(stmt);
                }
            }
        }
        Statement::Labeled(s) => {
            v.visit_identifier(&s.label);
            v.visit_statement(&s.body);
        }
        Statement::With(s) => {
            v.visit_expression(&s.object);
            v.visit_statement(&s.body);
        }
    }
}

pub fn walk_catch_clause<V: Visitor + ?Sized>(v: &mut V, clause: &CatchClause) {
    if let Some(param) = &clause.param {
        v.visit_pattern(param);
    }
    v.visit_block(&clause.body);
}

pub fn walk_function<V: Visitor + ?Sized>(v: &mut V, function: &Function) {
    if let Some(id) = &function.id {
        v.visit_identifier(id);
    }
    for param in &function.params {
        v.visit_pattern(param);
    }
    v.visit_block(&function.body);
}

pub fn walk_arrow_function<V: Visitor + ?Sized>(v: &mut V, arrow: &ArrowFunction) {
    for param in &arrow.params {
        v.visit_pattern(param);
    }
    match &arrow.body {
        ArrowBody::Expression(e) => v.visit_expression(e),
        ArrowBody::Block(block) => v.visit_block(block),
    }
}

pub fn walk_class<V: Visitor + ?Sized>(v: &mut V, class: &Class) {
    if let Some(id) = &class.id {
        v.visit_identifier(id);
    }
    if let Some(super_class) = &class.super_class {
        v.visit_expression(super_class);
    }
    for member in &class.members {
        match member {
            ClassMember::Method { key, function, .. } => {
                v.visit_property_key(key);
                v.visit_function(function);
            }
            ClassMember::Field { key, value, .. } => {
                v.visit_property_key(key);
                if let Some(value) = value {
                    v.visit_expression(value);
                }
            }
            ClassMember::StaticBlock(block) => v.visit_block(block),
        }
    }
}

pub fn walk_property_key<V: Visitor + ?Sized>(v: &mut V, key: &PropertyKey) {
    match key {
        PropertyKey::Identifier(id) | PropertyKey::Private(id) => v.visit_identifier(id),
        PropertyKey::Computed(e, _) => v.visit_expression(e),
        PropertyKey::String(..) | PropertyKey::Number(..) | PropertyKey::BigInt(..) => {}
    }
}

pub fn walk_pattern<V: Visitor + ?Sized>(v: &mut V, pattern: &Pattern) {
    match pattern {
        Pattern::Identifier(id) => v.visit_identifier(id),
        Pattern::Object(p) => {
            for prop in &p.properties {
                v.visit_property_key(&prop.key);
                v.visit_pattern(&prop.value);
            }
            if let Some(rest) = &p.rest {
                v.visit_pattern(rest);
            }
        }
        Pattern::Array(p) => {
            for element in p.elements.iter().flatten() {
                v.visit_pattern(element);
            }
        }
        Pattern::Assignment(p) => {
            v.visit_pattern(&p.target);
            v.visit_expression(&p.default);
        }
        Pattern::Rest(p) => v.visit_pattern(&p.argument),
        Pattern::Expression(e) => v.visit_expression(e),
    }
}

pub fn walk_expression<V: Visitor + ?Sized>(v: &mut V, expr: &Expression) {
    match expr {
        Expression::Literal(_) | Expression::This(_) | Expression::Super(_) => {}
        Expression::Template(t) => {
            for e in &t.expressions {
                v.visit_expression(e);
            }
        }
        Expression::TaggedTemplate(t) => {
            v.visit_expression(&t.tag);
            for e in &t.quasi.expressions {
                v.visit_expression(e);
            }
        }
        Expression::Identifier(id) => v.visit_identifier(id),
        Expression::Array(a) => {
            for element in a.elements.iter().flatten() {
                v.visit_expression(element);
            }
        }
        Expression::Object(o) => {
            for prop in &o.properties {
                match prop {
                    ObjectProperty::Property { key, value, .. } => {
                        v.visit_property_key(key);
                        v.visit_expression(value);
                    }
                    ObjectProperty::Shorthand { name, default, .. } => {
                        v.visit_identifier(name);
                        if let Some(default) = default {
                            v.visit_expression(default);
                        }
                    }
                    ObjectProperty::Method { key, function, .. } => {
                        v.visit_property_key(key);
                        v.visit_function(function);
                    }
                    ObjectProperty::Spread(e, _) => v.visit_expression(e),
                }
            }
        }
        Expression::Function(f) => v.visit_function(f),
        Expression::Arrow(a) => v.visit_arrow_function(a),
        Expression::Class(c) => v.visit_class(c),
        Expression::Unary(u) => v.visit_expression(&u.argument),
        Expression::Update(u) => v.visit_expression(&u.argument),
        Expression::Binary(b) => {
            v.visit_expression(&b.left);
            v.visit_expression(&b.right);
        }
        Expression::Logical(l) => {
            v.visit_expression(&l.left);
            v.visit_expression(&l.right);
        }
        Expression::Assignment(a) => {
            v.visit_pattern(&a.target);
            v.visit_expression(&a.value);
        }
        Expression::Conditional(c) => {
            v.visit_expression(&c.test);
            v.visit_expression(&c.consequent);
            v.visit_expression(&c.alternate);
        }
        Expression::Sequence(s) => {
            for e in &s.expressions {
                v.visit_expression(e);
            }
        }
        Expression::Call(c) => {
            v.visit_expression(&c.callee);
            for arg in &c.arguments {
                v.visit_expression(arg);
            }
        }
        Expression::New(n) => {
            v.visit_expression(&n.callee);
            for arg in &n.arguments {
                v.visit_expression(arg);
            }
        }
        Expression::Member(m) => {
            v.visit_expression(&m.object);
            match &m.property {
                MemberProperty::Identifier(id) | MemberProperty::Private(id) => {
                    v.visit_identifier(id)
                }
                MemberProperty::Computed(e) => v.visit_expression(e),
            }
        }
        Expression::Spread(s) => v.visit_expression(&s.argument),
        Expression::Yield(y) => {
            if let Some(arg) = &y.argument {
                v.visit_expression(arg);
            }
        }
        Expression::Await(a) => v.visit_expression(&a.argument),
        Expression::ImportCall(i) => {
            v.visit_expression(&i.source);
            if let Some(options) = &i.options {
                v.visit_expression(options);
            }
        }
        Expression::MetaProperty(_) => {}
        Expression::Parenthesized(p) => v.visit_expression(&p.expression),
    }
}
