//! An ordered collection of [`Comparison`]s, with the bookkeeping preprocessing needs to fold
//! newly-fixed values back into the constraints that reference them.

use log::debug;

use crate::error::SolverError;
use crate::error::SolverResult;
use crate::model::Assignment;
use crate::model::Comparison;
use crate::model::ComparisonOutcome;
use crate::model::Variable;

/// The constraints of a problem, kept in the order they were added (insertion order is the order
/// search and consistency-checking visit them in, so it is observable, not incidental).
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    constraints: Vec<Comparison>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        ConstraintSet::default()
    }

    pub fn add(&mut self, constraint: Comparison) {
        self.constraints.push(constraint);
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comparison> {
        self.constraints.iter()
    }

    /// Removes the first constraint structurally equal (per [`Comparison::is_equal`]) to
    /// `constraint`. Fails with [`SolverError::InternalInconsistency`] if no such constraint is
    /// present.
    pub fn remove(&mut self, constraint: &Comparison) -> SolverResult<()> {
        match self.constraints.iter().position(|existing| existing.is_equal(constraint)) {
            Some(index) => {
                self.constraints.remove(index);
                Ok(())
            }
            None => Err(SolverError::internal_inconsistency(format!(
                "constraint {constraint:?} is not a member of this set"
            ))),
        }
    }

    /// Removes every constraint structurally equal to one in `to_remove`. Unlike `remove`, a
    /// constraint with no match is silently skipped.
    pub fn remove_many(&mut self, to_remove: &[Comparison]) {
        self.constraints.retain(|existing| !to_remove.iter().any(|c| existing.is_equal(c)));
    }

    /// Evaluates every constraint under `assignment`.
    ///
    /// Fails with [`SolverError::Infeasible`] the moment any constraint decides to `false`;
    /// otherwise returns the list of outcomes, one per constraint, in order.
    pub fn evaluate(&self, assignment: &Assignment) -> SolverResult<Vec<ComparisonOutcome>> {
        let mut outcomes = Vec::with_capacity(self.constraints.len());
        for (index, constraint) in self.constraints.iter().enumerate() {
            let outcome = constraint.evaluate(assignment)?;
            if matches!(outcome, ComparisonOutcome::Decided(false)) {
                return Err(SolverError::infeasible(format!(
                    "constraint #{index} ({constraint:?}) is false under the current assignment"
                )));
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Folds `fixed` into every stored constraint by re-evaluating it under that (partial)
    /// assignment, replacing fully-decided constraints with nothing and residual ones with their
    /// simplified form.
    ///
    /// Fails with [`SolverError::Infeasible`] if any constraint decides to `false`.
    pub fn update_constraints(&mut self, fixed: &Assignment) -> SolverResult<()> {
        let mut remaining = Vec::with_capacity(self.constraints.len());
        for (index, constraint) in self.constraints.drain(..).enumerate() {
            match constraint.evaluate(fixed)? {
                ComparisonOutcome::Decided(true) => {
                    debug!("constraint #{index} decided true under {} fixed value(s), dropping it", fixed.len());
                }
                ComparisonOutcome::Decided(false) => {
                    return Err(SolverError::infeasible(format!(
                        "constraint #{index} is false once {} value(s) were fixed",
                        fixed.len()
                    )));
                }
                ComparisonOutcome::Residual(simplified) => remaining.push(simplified),
            }
        }
        self.constraints = remaining;
        Ok(())
    }

    /// Drops constraints that are structurally equal (per [`Comparison::is_equal`], which treats
    /// operand-flipped relations as equivalent) to an earlier constraint in the set.
    pub fn remove_repeated(&mut self) {
        let mut kept: Vec<Comparison> = Vec::with_capacity(self.constraints.len());
        for constraint in self.constraints.drain(..) {
            if !kept.iter().any(|existing| existing.is_equal(&constraint)) {
                kept.push(constraint);
            }
        }
        self.constraints = kept;
    }

    /// Every variable referenced by any constraint, deduplicated in first-occurrence order.
    pub fn get_vars(&self) -> Vec<Variable> {
        let mut vars = Vec::new();
        for constraint in &self.constraints {
            for v in constraint.get_vars() {
                if !vars.contains(&v) {
                    vars.push(v);
                }
            }
        }
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::eq;
    use crate::model::lt;
    use crate::model::Expression;
    use crate::model::Number;
    use crate::model::Variable;

    fn var(name: &str, domain: impl IntoIterator<Item = i64>) -> Variable {
        Variable::new(name, domain).unwrap()
    }

    #[test]
    fn evaluate_fails_fast_on_a_false_constraint() {
        let mut set = ConstraintSet::new();
        set.add(eq(1, 2));
        assert!(matches!(set.evaluate(&Assignment::new()), Err(SolverError::Infeasible(_))));
    }

    #[test]
    fn update_constraints_drops_decided_and_keeps_residual() {
        let x = var("x", [1, 2, 3]);
        let y = var("y", [1, 2, 3]);
        let mut set = ConstraintSet::new();
        set.add(eq(Expression::Var(x.clone()), 1));
        set.add(lt(Expression::Var(x.clone()), Expression::Var(y)));

        let mut fixed = Assignment::new();
        fixed.insert(&x, Number::Int(1));
        set.update_constraints(&fixed).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn update_constraints_rejects_a_now_false_constraint() {
        let x = var("x", [1, 2, 3]);
        let mut set = ConstraintSet::new();
        set.add(eq(Expression::Var(x.clone()), 1));

        let mut fixed = Assignment::new();
        fixed.insert(&x, Number::Int(2));
        assert!(matches!(set.update_constraints(&fixed), Err(SolverError::Infeasible(_))));
    }

    #[test]
    fn remove_repeated_drops_operand_flipped_duplicates() {
        let x = Expression::Var(var("x", [1]));
        let y = Expression::Var(var("y", [1]));
        let mut set = ConstraintSet::new();
        set.add(lt(x.clone(), y.clone()));
        set.add(crate::model::gt(y, x));
        set.remove_repeated();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove_drops_a_matching_constraint_including_operand_flipped_forms() {
        let x = var("x", [1, 2, 3]);
        let y = var("y", [1, 2, 3]);
        let mut set = ConstraintSet::new();
        set.add(lt(Expression::Var(x.clone()), Expression::Var(y.clone())));
        set.add(eq(Expression::Var(x.clone()), 1));

        set.remove(&crate::model::gt(Expression::Var(y), Expression::Var(x))).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove_fails_when_the_constraint_is_not_present() {
        let x = var("x", [1, 2, 3]);
        let mut set = ConstraintSet::new();
        set.add(eq(Expression::Var(x.clone()), 1));
        assert!(matches!(set.remove(&eq(Expression::Var(x), 2)), Err(SolverError::InternalInconsistency(_))));
    }

    #[test]
    fn remove_many_drops_every_matching_constraint_and_skips_absent_ones() {
        let x = var("x", [1, 2, 3]);
        let y = var("y", [1, 2, 3]);
        let mut set = ConstraintSet::new();
        set.add(eq(Expression::Var(x.clone()), 1));
        set.add(lt(Expression::Var(x.clone()), Expression::Var(y.clone())));
        set.add(eq(Expression::Var(y.clone()), 2));

        set.remove_many(&[eq(Expression::Var(x.clone()), 1), eq(Expression::Var(x), 99)]);
        assert_eq!(set.len(), 2);
    }
}
