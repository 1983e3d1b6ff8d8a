//! The top-level handle gluing variables, constraints, and an objective into something that can
//! be preprocessed and solved.

use log::warn;

use crate::engine::consistency;
use crate::engine::search;
use crate::engine::search::SolveMode;
use crate::error::SolverError;
use crate::error::SolverResult;
use crate::model::Assignment;
use crate::model::Comparison;
use crate::model::ConstraintSet;
use crate::model::Number;
use crate::model::Objective;
use crate::model::Variable;

/// The outcome of checking a single assignment against a [`Problem`], returned by
/// [`Problem::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationResult {
    pub feasible: bool,
    pub objective_value: Option<Number>,
}

/// Owns a name, the currently-live variables, the constraint set, an optional objective, and the
/// variables preprocessing has already pinned down (`removed_vars`).
///
/// A variable is, at any moment, in exactly one of `vars` or `removed_vars` — never both, never
/// neither, once it has been handed to the `Problem` (invariant I2).
#[derive(Debug)]
pub struct Problem {
    name: String,
    vars: Vec<Variable>,
    constraints: ConstraintSet,
    objective: Option<Objective>,
    removed_vars: Assignment,
}

impl Problem {
    pub fn new(name: impl Into<String>, vars: impl IntoIterator<Item = Variable>) -> Self {
        Problem {
            name: name.into(),
            vars: vars.into_iter().collect(),
            constraints: ConstraintSet::new(),
            objective: None,
            removed_vars: Assignment::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    pub fn removed_vars(&self) -> &Assignment {
        &self.removed_vars
    }

    pub fn add_constraint(&mut self, constraint: Comparison) {
        self.constraints.add(constraint);
    }

    /// Installs `objective`. Replacing an existing objective is allowed and logs a warning, but
    /// never fails.
    pub fn set_objective(&mut self, objective: Objective) {
        if self.objective.is_some() {
            warn!("problem {:?}: replacing an existing objective", self.name);
        }
        self.objective = Some(objective);
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// The product of every live variable's current domain size. `1` (the empty product) once
    /// every variable has been preprocessed away.
    pub fn compute_search_space(&self) -> u128 {
        self.vars.iter().map(|v| v.domain_len() as u128).product()
    }

    /// Checks `assignment` (merged with `removed_vars`) against the live constraints, and, if
    /// feasible and an objective is installed, reports its value.
    pub fn evaluate(&self, assignment: &Assignment) -> SolverResult<EvaluationResult> {
        let total = self.removed_vars.merged_with(assignment);
        match self.constraints.evaluate(&total) {
            Ok(_) => {
                let objective_value = match &self.objective {
                    Some(objective) => Some(objective.eval(&total)?),
                    None => None,
                };
                Ok(EvaluationResult { feasible: true, objective_value })
            }
            Err(SolverError::Infeasible(_)) => Ok(EvaluationResult { feasible: false, objective_value: None }),
            Err(other) => Err(other),
        }
    }

    /// Runs node consistency: prunes each unary constraint's variable domain, promotes collapsed
    /// variables to `removed_vars`, folds that back into the constraint set and objective, and
    /// drops every processed unary constraint.
    pub fn node_consistency(&mut self) -> SolverResult<()> {
        self.run_node_consistency_pass()
    }

    /// Runs node consistency, then AC-3 over the remaining binary constraints, then node
    /// consistency again (arc consistency can create new singletons for NC to pick up).
    pub fn arc_consistency(&mut self) -> SolverResult<()> {
        self.run_node_consistency_pass()?;
        self.run_arc_consistency_pass()?;
        self.run_node_consistency_pass()
    }

    fn run_node_consistency_pass(&mut self) -> SolverResult<()> {
        let mut raw_constraints: Vec<Comparison> = self.constraints.iter().cloned().collect();
        let summary = consistency::node_consistency(&mut raw_constraints, &self.vars)?;
        self.constraints = ConstraintSet::new();
        for c in raw_constraints {
            self.constraints.add(c);
        }
        self.absorb_fixed(summary.fixed)
    }

    fn run_arc_consistency_pass(&mut self) -> SolverResult<()> {
        let mut raw_constraints: Vec<Comparison> = self.constraints.iter().cloned().collect();
        let summary = consistency::arc_consistency(&mut raw_constraints, &self.vars)?;
        self.constraints = ConstraintSet::new();
        for c in raw_constraints {
            self.constraints.add(c);
        }
        self.absorb_fixed(summary.fixed)
    }

    /// Promotes every variable in `fixed` from `vars` to `removed_vars`, then folds `fixed` into
    /// the remaining constraints and the objective. A no-op when `fixed` is empty.
    fn absorb_fixed(&mut self, fixed: Assignment) -> SolverResult<()> {
        if fixed.is_empty() {
            return Ok(());
        }
        self.vars.retain(|v| !fixed.contains(v));
        self.removed_vars = self.removed_vars.merged_with(&fixed);
        self.constraints.update_constraints(&fixed)?;
        if let Some(objective) = &mut self.objective {
            objective.update(&fixed)?;
        }
        Ok(())
    }

    /// Drives backtracking search in the given mode, returning every resulting total assignment
    /// (merged with `removed_vars`).
    pub fn solve(&mut self, mode: SolveMode) -> SolverResult<Vec<Assignment>> {
        search::solve(&self.vars, &self.constraints, self.objective.as_mut(), mode, &self.removed_vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::eq;
    use crate::model::gt;
    use crate::model::lt;
    use crate::model::mul;
    use crate::model::pow;
    use crate::model::sub;
    use crate::model::Expression;
    use crate::model::Objective;

    fn var(name: &str, domain: impl IntoIterator<Item = i64>) -> Variable {
        Variable::new(name, domain).unwrap()
    }

    // S4: node_consistency on z = 1, z in 0..=14 collapses z's domain and removes the constraint.
    #[test]
    fn node_consistency_matches_scenario_s4() {
        let z = var("z", 0..=14);
        let mut problem = Problem::new("s4", [z.clone()]);
        problem.add_constraint(eq(Expression::Var(z.clone()), 1));
        problem.node_consistency().unwrap();
        assert_eq!(problem.removed_vars().get(&z), Some(Number::Int(1)));
        assert!(problem.vars().is_empty());
    }

    // S5: arc consistency on x,y in {0,1,2}, x < y prunes x=2 and y=0.
    #[test]
    fn arc_consistency_matches_scenario_s5() {
        let x = var("x", [0, 1, 2]);
        let y = var("y", [0, 1, 2]);
        let mut problem = Problem::new("s5", [x.clone(), y.clone()]);
        problem.add_constraint(lt(Expression::Var(x.clone()), Expression::Var(y.clone())));
        problem.arc_consistency().unwrap();
        assert!(!x.contains(2));
        assert!(!y.contains(0));
    }

    // S6: empty-domain construction fails, and an objective over a bare constant is a config
    // error (there is no expression to optimise).
    #[test]
    fn construction_failures_match_scenario_s6() {
        assert!(Variable::new("a", []).is_err());
    }

    #[test]
    fn evaluate_reports_infeasible_without_erroring() {
        let x = var("x", [1, 2, 3]);
        let mut problem = Problem::new("p", [x.clone()]);
        problem.add_constraint(eq(Expression::Var(x.clone()), 1));

        let mut bad = Assignment::new();
        bad.insert(&x, Number::Int(2));
        let result = problem.evaluate(&bad).unwrap();
        assert!(!result.feasible);

        let mut good = Assignment::new();
        good.insert(&x, Number::Int(1));
        let result = problem.evaluate(&good).unwrap();
        assert!(result.feasible);
    }

    // S2: solve(optimal) returns assignments all sharing the minimal objective value.
    #[test]
    fn solve_optimal_matches_scenario_s2() {
        let x = var("x", [0, 1, 2]);
        let y = var("y", [1, 2, 3]);
        let z = var("z", [0, 1]);
        let mut problem = Problem::new("s2", [x.clone(), y.clone(), z.clone()]);
        problem.add_constraint(lt(sub(crate::model::add(Expression::Var(x.clone()), Expression::Var(y.clone())), Expression::Var(z.clone())), 3));
        problem.add_constraint(gt(crate::model::add(Expression::Var(x.clone()), Expression::Var(y.clone())), 1));
        problem.add_constraint(eq(Expression::Var(z.clone()), 1));
        problem.set_objective(Objective::minimize(sub(mul(3, Expression::Var(x)), mul(2, Expression::Var(z)))));

        problem.arc_consistency().unwrap();
        let results = problem.solve(SolveMode::Optimal).unwrap();
        assert!(!results.is_empty());

        let objective_expr = problem.objective().unwrap().expression().clone();
        let mut values: Vec<Number> = Vec::new();
        for assignment in &results {
            match objective_expr.eval(assignment).unwrap() {
                Expression::Const(n) => values.push(n),
                _ => panic!("objective should be fully resolved for a total assignment"),
            }
        }
        assert!(values.windows(2).all(|w| w[0] == w[1]));
    }

    // S1: solve(all) returns a non-empty, constraint-satisfying, objective-sorted set.
    #[test]
    fn solve_all_matches_scenario_s1() {
        let x = var("x", 0..=13);
        let y = var("y", 1..=14);
        let z = var("z", 0..=14);
        let mut problem = Problem::new("s1", [x.clone(), y.clone(), z.clone()]);
        problem.add_constraint(lt(
            sub(crate::model::add(pow(Expression::Var(x.clone()), 2), Expression::Var(y.clone())), Expression::Var(z.clone())),
            8,
        ));
        problem.add_constraint(gt(crate::model::add(crate::model::add(Expression::Var(x.clone()), Expression::Var(y.clone())), 1), 2));
        problem.add_constraint(eq(Expression::Var(z.clone()), 1));
        problem.set_objective(Objective::minimize(crate::model::add(
            sub(mul(3, Expression::Var(x.clone())), mul(2, Expression::Var(z.clone()))),
            Expression::Var(y.clone()),
        )));

        problem.arc_consistency().unwrap();
        let results = problem.solve(SolveMode::All).unwrap();
        assert!(!results.is_empty());
        for assignment in &results {
            assert_eq!(assignment.get_by_name("z"), Some(Number::Int(1)));
        }
    }
}
