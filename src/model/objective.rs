//! The optimisation goal attached to a problem: minimise or maximise an expression.

use crate::error::SolverResult;
use crate::model::Assignment;
use crate::model::Expression;
use crate::model::Number;

/// Whether an [`Objective`] is being minimised or maximised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// An optimisation goal: an expression plus a polarity and the best value seen so far.
///
/// `best_so_far` starts absent (standing in for `+inf`/`-inf`, per the polarity) and is only
/// ever moved in the improving direction — [`Objective::is_better_than_optimal`] is both the
/// query and the only place that mutates it, mirroring its source-level "checks and records in
/// one call" contract.
#[derive(Debug, Clone)]
pub struct Objective {
    expression: Expression,
    sense: Sense,
    best_so_far: Option<Number>,
}

impl Objective {
    pub fn minimize(expression: Expression) -> Self {
        Objective { expression, sense: Sense::Minimize, best_so_far: None }
    }

    pub fn maximize(expression: Expression) -> Self {
        Objective { expression, sense: Sense::Maximize, best_so_far: None }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn best_so_far(&self) -> Option<Number> {
        self.best_so_far
    }

    /// Evaluates the objective under `assignment`, requiring every referenced variable to be
    /// bound (an objective has no use for a residual value).
    pub fn eval(&self, assignment: &Assignment) -> SolverResult<Number> {
        match self.expression.eval(assignment)? {
            Expression::Const(value) => Ok(value),
            residual => Err(crate::error::SolverError::internal_inconsistency(format!(
                "objective evaluated to a non-constant residual {residual:?}; the assignment did not bind every referenced variable"
            ))),
        }
    }

    /// Partially evaluates the stored expression against `fixed` (typically the variables
    /// preprocessing just moved to `removed_vars`), replacing it with the residual. May collapse
    /// all the way to a numeric constant if `fixed` covers every variable the objective mentions.
    pub fn update(&mut self, fixed: &Assignment) -> SolverResult<()> {
        self.expression = self.expression.eval(fixed)?;
        Ok(())
    }

    /// True exactly when `candidate` equals the currently recorded best.
    pub fn is_optimal(&self, candidate: Number) -> bool {
        self.best_so_far == Some(candidate)
    }

    /// Strictly-better check with a recording side effect: if `candidate` improves on
    /// `best_so_far` (or nothing has been recorded yet), records it and returns `true`;
    /// otherwise leaves the recorded best untouched and returns `false`.
    pub fn is_better_than_optimal(&mut self, candidate: Number) -> bool {
        let better = match self.best_so_far {
            None => true,
            Some(current) => match self.sense {
                Sense::Minimize => candidate < current,
                Sense::Maximize => candidate > current,
            },
        };
        if better {
            self.best_so_far = Some(candidate);
        }
        better
    }

    /// Restores the sentinel (`+inf` for `Minimize`, `-inf` for `Maximize`), represented here as
    /// "nothing recorded yet".
    pub fn reset_optimal(&mut self) {
        self.best_so_far = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Variable;

    #[test]
    fn minimize_keeps_the_smallest_value() {
        let x = Variable::new("x", [1, 2, 3]).unwrap();
        let mut objective = Objective::minimize(Expression::Var(x));
        assert!(objective.is_better_than_optimal(Number::Int(3)));
        assert!(objective.is_better_than_optimal(Number::Int(1)));
        assert!(!objective.is_better_than_optimal(Number::Int(2)));
        assert_eq!(objective.best_so_far(), Some(Number::Int(1)));
    }

    #[test]
    fn maximize_keeps_the_largest_value() {
        let x = Variable::new("x", [1, 2, 3]).unwrap();
        let mut objective = Objective::maximize(Expression::Var(x));
        assert!(objective.is_better_than_optimal(Number::Int(1)));
        assert!(objective.is_better_than_optimal(Number::Int(3)));
        assert!(!objective.is_better_than_optimal(Number::Int(2)));
        assert_eq!(objective.best_so_far(), Some(Number::Int(3)));
    }

    #[test]
    fn reset_optimal_makes_any_finite_value_improving_again() {
        let x = Variable::new("x", [1, 2, 3]).unwrap();
        let mut objective = Objective::minimize(Expression::Var(x));
        objective.is_better_than_optimal(Number::Int(1));
        objective.reset_optimal();
        assert!(objective.is_better_than_optimal(Number::Int(100)));
    }

    #[test]
    fn update_folds_fixed_values_into_the_expression() {
        let x = Variable::new("x", [1, 2, 3]).unwrap();
        let mut objective = Objective::minimize(crate::model::add(Expression::Var(x.clone()), 1));
        let mut fixed = Assignment::new();
        fixed.insert(&x, Number::Int(4));
        objective.update(&fixed).unwrap();
        assert_eq!(objective.expression(), &Expression::Const(Number::Int(5)));
    }

    #[test]
    fn eval_requires_a_fully_bound_expression() {
        let x = Variable::new("x", [1, 2, 3]).unwrap();
        let objective = Objective::minimize(Expression::Var(x));
        assert!(objective.eval(&Assignment::new()).is_err());
    }
}
