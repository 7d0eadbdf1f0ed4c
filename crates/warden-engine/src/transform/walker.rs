//! Tree walk collecting the insertions that route values through the
//! internal-state singleton.

use super::insertion::{Attach, InsertionList};
use crate::parser::ast::*;
use crate::parser::interner::Interner;

pub(super) struct Walker<'a> {
    interner: &'a Interner,
    state_name: &'a str,
    pub insertions: InsertionList,
    pub has_async: bool,
    catch_temp: Option<String>,
}

impl<'a> Walker<'a> {
    pub fn new(interner: &'a Interner, state_name: &'a str) -> Self {
        Self {
            interner,
            state_name,
            insertions: InsertionList::new(),
            has_async: false,
            catch_temp: None,
        }
    }

    /// Temporary binding for destructuring catch clauses.
    ///
    /// Every catch clause is its own scope, so one name serves all of them;
    /// it only has to avoid every name the source already uses.
    fn catch_temp(&mut self) -> String {
        if let Some(name) = &self.catch_temp {
            return name.clone();
        }
        let mut name = String::from("__warden_caught");
        let mut suffix = 0u32;
        while self.interner.get(&name).is_some() {
            suffix += 1;
            name = format!("__warden_caught{}", suffix);
        }
        self.catch_temp = Some(name.clone());
        name
    }
}

impl Visitor for Walker<'_> {
    fn visit_catch_clause(&mut self, clause: &CatchClause) {
        match &clause.param {
            Some(Pattern::Identifier(id)) => {
                let name = self.interner.resolve(id.name);
                // Rebind first thing in the body: `catch (e) {e=S.handleException(e);`
                self.insertions.push(
                    clause.body.span.start + 1,
                    Attach::Right,
                    format!("{name}={}.handleException({name});", self.state_name),
                );
            }
            Some(_) => {
                // `catch ({ a }) {..}` becomes
                // `catch (t) {t=S.handleException(t);try{throw t;}catch ({ a }) {..}}`
                let temp = self.catch_temp();
                self.insertions.push(
                    clause.span.start,
                    Attach::Right,
                    format!(
                        "catch({temp}){{{temp}={}.handleException({temp});try{{throw {temp};}}",
                        self.state_name
                    ),
                );
                self.insertions.push(clause.body.span.end, Attach::Left, "}");
            }
            None => {}
        }
        walk_catch_clause(self, clause);
    }

    fn visit_statement(&mut self, stmt: &Statement) {
        if let Statement::With(with) = stmt {
            let operand = with.object.span();
            // A comma operand must stay one argument.
            let (open, close) = match &with.object {
                Expression::Sequence(_) => ("((", "))"),
                _ => ("(", ")"),
            };
            self.insertions.push(
                operand.start,
                Attach::Right,
                format!("{}.wrapWith{open}", self.state_name),
            );
            self.insertions.push(operand.end, Attach::Left, close);
        }
        walk_statement(self, stmt);
    }

    fn visit_expression(&mut self, expr: &Expression) {
        if let Expression::ImportCall(import) = expr {
            self.insertions.push(
                import.span.start,
                Attach::Right,
                format!("{}.", self.state_name),
            );
        }
        walk_expression(self, expr);
    }

    fn visit_function(&mut self, function: &Function) {
        self.has_async |= function.is_async;
        walk_function(self, function);
    }

    fn visit_arrow_function(&mut self, arrow: &ArrowFunction) {
        self.has_async |= arrow.is_async;
        walk_arrow_function(self, arrow);
    }
}
