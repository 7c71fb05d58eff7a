use crate::ast::{AssignKind, Conditional, Expr, Scope, MAX_DEPTH};
use crate::environment::{self, Environment};
use crate::error::{LoopError, Span};
use crate::ops;
use crate::value::Value;

/// Tree-walking evaluator over a caller-owned environment.
///
/// Every evaluation returns `Option<Value>`: an empty scope or a conditional
/// ladder with no matching rung produces no value.
pub struct Evaluator<'env> {
    environment: &'env mut Environment,
    depth: usize,
}

impl<'env> Evaluator<'env> {
    pub fn new(environment: &'env mut Environment) -> Self {
        Self {
            environment,
            depth: 0,
        }
    }

    pub fn environment(&self) -> &Environment {
        &*self.environment
    }

    /// Evaluates a whole program. Nesting is checked over the entire tree
    /// first, so a program that is too deep changes no bindings.
    pub fn evaluate_program(&mut self, program: &Scope) -> Result<Option<Value>, LoopError> {
        log::debug!("evaluating {} top-level expressions", program.len());
        check_scope_depth(program, self.depth)?;
        self.evaluate_scope(program)
    }

    /// Evaluates each expression in order and yields the last result.
    pub fn evaluate_scope(&mut self, scope: &Scope) -> Result<Option<Value>, LoopError> {
        let mut last = None;
        for expr in &scope.exprs {
            last = self.evaluate(expr)?;
        }
        Ok(last)
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Option<Value>, LoopError> {
        match expr {
            Expr::Literal { value, .. } => Ok(Some(value.clone())),
            Expr::Identifier { name, span } => self
                .environment
                .get(name)
                .cloned()
                .map(Some)
                .ok_or_else(|| environment::not_found(name, *span)),
            _ => self.nested(*expr.span(), |evaluator| evaluator.evaluate_composite(expr)),
        }
    }

    /// Like `evaluate`, but a missing value is an error.
    pub fn evaluate_value(&mut self, expr: &Expr) -> Result<Value, LoopError> {
        self.evaluate(expr)?.ok_or_else(|| {
            LoopError::runtime_error_with_help(
                *expr.span(),
                "expression produced no value".to_string(),
                "An empty block or an 'if' without a matching branch has no value.".to_string(),
            )
        })
    }

    fn nested<T>(
        &mut self,
        span: Span,
        f: impl FnOnce(&mut Self) -> Result<T, LoopError>,
    ) -> Result<T, LoopError> {
        if self.depth >= MAX_DEPTH {
            return Err(too_deep(span));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn evaluate_composite(&mut self, expr: &Expr) -> Result<Option<Value>, LoopError> {
        match expr {
            Expr::Paren { expr, .. } => self.evaluate(expr),
            Expr::Unary {
                operator,
                operand,
                span,
            } => {
                let operand = self.evaluate_value(operand)?;
                ops::unary(*operator, &operand, *span).map(Some)
            }
            Expr::Binary {
                left,
                operator,
                right,
                span,
            } => {
                let left = self.evaluate_value(left)?;
                let right = self.evaluate_value(right)?;
                ops::binary(*operator, &left, &right, *span).map(Some)
            }
            Expr::Assignment {
                kind,
                name,
                constant,
                value,
                span,
            } => self
                .evaluate_assignment(*kind, name, *constant, value, *span)
                .map(Some),
            Expr::Conditional(conditional) => self.evaluate_conditional(conditional),
            Expr::Scope(scope) => self.evaluate_scope(scope),
            Expr::Literal { .. } | Expr::Identifier { .. } => self.evaluate(expr),
        }
    }

    fn evaluate_assignment(
        &mut self,
        kind: AssignKind,
        name: &str,
        constant: bool,
        value: &Expr,
        span: Span,
    ) -> Result<Value, LoopError> {
        let new_value = self.evaluate_value(value)?;

        match (kind, kind.operator()) {
            (AssignKind::Declare, _) => {
                self.environment.declare(name, new_value.clone(), constant);
                Ok(new_value)
            }
            (_, Some(operator)) => {
                let old_value = self
                    .environment
                    .get(name)
                    .cloned()
                    .ok_or_else(|| environment::not_found(name, span))?;
                // The fresh value is the left operand: `x -= 3` computes `3 - x`.
                let result = ops::binary(operator, &new_value, &old_value, span)?;
                self.environment.replace(name, result.clone(), span)?;
                Ok(result)
            }
            (_, None) => {
                self.environment.assign(name, new_value.clone(), span)?;
                Ok(new_value)
            }
        }
    }

    fn evaluate_conditional(&mut self, conditional: &Conditional) -> Result<Option<Value>, LoopError> {
        let condition = self.evaluate_value(&conditional.condition)?;

        match condition.as_bool() {
            Some(true) => {
                log::trace!("branch taken at {}", conditional.span);
                self.evaluate_scope(&conditional.then_branch)
            }
            Some(false) => match conditional.next {
                Some(ref next) => self.nested(next.span, |evaluator| evaluator.evaluate_conditional(next)),
                None => {
                    log::trace!("no branch taken at {}", conditional.span);
                    Ok(None)
                }
            },
            None => Err(LoopError::runtime_error_with_help(
                *conditional.condition.span(),
                format!("condition is not a boolean: found {}", condition.type_name()),
                "Conditions must evaluate to 'true' or 'false'; use a comparison such as 'x != 0'."
                    .to_string(),
            )),
        }
    }
}

fn too_deep(span: Span) -> LoopError {
    LoopError::runtime_error(
        span,
        format!("expression too deep: nesting exceeds {} levels", MAX_DEPTH),
    )
}

/// Walks `expr` the way `Evaluator::evaluate` nests, stopping at the first
/// node past `MAX_DEPTH`.
fn check_depth(expr: &Expr, depth: usize) -> Result<(), LoopError> {
    match expr {
        Expr::Literal { .. } | Expr::Identifier { .. } => Ok(()),
        _ if depth >= MAX_DEPTH => Err(too_deep(*expr.span())),
        Expr::Paren { expr, .. } => check_depth(expr, depth + 1),
        Expr::Unary { operand, .. } => check_depth(operand, depth + 1),
        Expr::Binary { left, right, .. } => {
            check_depth(left, depth + 1)?;
            check_depth(right, depth + 1)
        }
        Expr::Assignment { value, .. } => check_depth(value, depth + 1),
        Expr::Conditional(conditional) => check_conditional_depth(conditional, depth + 1),
        Expr::Scope(scope) => check_scope_depth(scope, depth + 1),
    }
}

fn check_scope_depth(scope: &Scope, depth: usize) -> Result<(), LoopError> {
    scope.exprs.iter().try_for_each(|expr| check_depth(expr, depth))
}

fn check_conditional_depth(conditional: &Conditional, depth: usize) -> Result<(), LoopError> {
    check_depth(&conditional.condition, depth)?;
    check_scope_depth(&conditional.then_branch, depth)?;
    match conditional.next {
        Some(ref next) if depth >= MAX_DEPTH => Err(too_deep(next.span)),
        Some(ref next) => check_conditional_depth(next, depth + 1),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOp;
    use crate::error::{BufferId, ErrorKind};
    use crate::parser;
    use crate::value::Scalar;

    fn eval_in(env: &mut Environment, source: &str) -> Result<Option<Value>, LoopError> {
        let program = parser::parse(source)?;
        Evaluator::new(env).evaluate_program(&program)
    }

    fn eval(source: &str) -> Result<Option<Value>, LoopError> {
        eval_in(&mut Environment::new(), source)
    }

    fn scalar(source: &str) -> Scalar {
        eval(source)
            .unwrap_or_else(|e| panic!("'{}' failed: {}", source, e))
            .unwrap_or_else(|| panic!("'{}' produced no value", source))
            .scalar()
            .clone()
    }

    #[test]
    fn arithmetic_and_precedence() {
        assert_eq!(scalar("1 + 2 * 3"), Scalar::I32(7));
        assert_eq!(scalar("(1 + 2) * 3"), Scalar::I32(9));
        assert_eq!(scalar("2 + 3 << 1"), Scalar::I32(8));
    }

    #[test]
    fn environment_persists_across_programs() {
        let mut env = Environment::new();
        eval_in(&mut env, "mut total := 1").unwrap();
        eval_in(&mut env, "total += 41").unwrap();
        let value = eval_in(&mut env, "total").unwrap().unwrap();
        assert_eq!(value.scalar(), &Scalar::I32(42));
        assert!(!env.binding("total").unwrap().constant);
    }

    #[test]
    fn compound_assignment_combines_new_then_old() {
        assert_eq!(scalar("x := 10\nx -= 3"), Scalar::I32(-7));
        assert_eq!(scalar("x := 2\nx <<= 5"), Scalar::I32(5 << 2));
    }

    #[test]
    fn compound_assignment_needs_a_binding() {
        let err = eval("y += 1").unwrap_err();
        assert!(err.message.starts_with("variable not found"));
    }

    #[test]
    fn conditional_without_match_has_no_value() {
        assert_eq!(eval("if false { 1 }").unwrap(), None);
        let err = eval("x := if false { 1 }").unwrap_err();
        assert_eq!(err.message, "expression produced no value");
    }

    #[test]
    fn condition_must_be_boolean() {
        let err = eval("if 1 { 2 }").unwrap_err();
        assert!(err.message.starts_with("condition is not a boolean"));
    }

    /// `1 + 1 + ...` with `terms` literals, built without the parser.
    fn chain(terms: usize) -> Expr {
        let one = || parser::parse("1").unwrap().exprs.remove(0);
        (1..terms).fold(one(), |left, _| Expr::binary(left, BinaryOp::Add, one()))
    }

    #[test]
    fn left_deep_chains_hit_the_depth_guard() {
        let ok = vec!["1"; 100].join(" + ");
        assert_eq!(scalar(&ok), Scalar::I32(100));

        let mut env = Environment::new();
        let program = Scope::new(vec![chain(102)], Span::empty(BufferId(0), 0));
        let err = Evaluator::new(&mut env).evaluate_program(&program).unwrap_err();
        assert!(err.message.starts_with("expression too deep"));
        assert_eq!(err.kind, ErrorKind::RuntimeError);
    }

    #[test]
    fn too_deep_programs_leave_bindings_untouched() {
        let mut env = Environment::new();
        let mut program = parser::parse("y = true").unwrap();
        program.exprs.push(chain(102));

        let err = Evaluator::new(&mut env).evaluate_program(&program).unwrap_err();
        assert!(err.message.starts_with("expression too deep"));
        assert!(env.is_empty());

        // The same statement alone still runs.
        program.exprs.pop();
        Evaluator::new(&mut env).evaluate_program(&program).unwrap();
        assert!(env.contains("y"));
    }

    #[test]
    fn else_rungs_count_toward_depth() {
        let mut env = Environment::new();
        let inner = parser::parse("if false { 1 } else { 2 }").unwrap().exprs.remove(0);
        let wrapped = (0..99).fold(inner, |expr, _| Expr::Paren {
            span: *expr.span(),
            expr: Box::new(expr),
        });
        let program = Scope::new(vec![wrapped], Span::empty(BufferId(0), 0));
        let err = Evaluator::new(&mut env).evaluate_program(&program).unwrap_err();
        assert!(err.message.starts_with("expression too deep"));
    }

    #[test]
    fn depth_resets_after_an_error() {
        let mut env = Environment::new();
        let mut evaluator = Evaluator::new(&mut env);
        let bad = parser::parse("(1 + true)").unwrap();
        assert!(evaluator.evaluate_program(&bad).is_err());
        let chain = parser::parse(&vec!["1"; 100].join(" + ")).unwrap();
        assert!(evaluator.evaluate_program(&chain).is_ok());
    }
}
