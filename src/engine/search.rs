//! Backtracking search over the live variables of a [`Problem`](super::Problem), with three
//! termination modes.

use std::str::FromStr;

use log::trace;

use crate::error::SolverError;
use crate::error::SolverResult;
use crate::model::Assignment;
use crate::model::ConstraintSet;
use crate::model::Number;
use crate::model::Objective;
use crate::model::Variable;
use crate::model::VariableCursor;

/// How `Problem::solve` should terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMode {
    /// Stop at the first feasible assignment.
    First,
    /// Collect every feasible assignment.
    All,
    /// Requires an objective; collect every assignment achieving its extremum.
    Optimal,
}

impl FromStr for SolveMode {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(SolveMode::First),
            "all" => Ok(SolveMode::All),
            "optimal" => Ok(SolveMode::Optimal),
            other => Err(SolverError::config(format!("unknown solve mode {other:?}"))),
        }
    }
}

/// Drives backtracking search over `vars` (already reduced to the live set by preprocessing),
/// checking candidates against `constraints` and, for `optimal`, tracking the best value of
/// `objective`. `removed_vars` is merged into every returned assignment so callers see a total
/// assignment over every originally declared variable.
pub(crate) fn solve(
    vars: &[Variable],
    constraints: &ConstraintSet,
    objective: Option<&mut Objective>,
    mode: SolveMode,
    removed_vars: &Assignment,
) -> SolverResult<Vec<Assignment>> {
    if mode == SolveMode::Optimal && objective.is_none() {
        return Err(SolverError::config("solve(optimal) requires an objective"));
    }

    let mut cursors: Vec<VariableCursor> = vars.iter().cloned().map(VariableCursor::new).collect();
    let mut results = Vec::new();
    let mut stop = false;
    let mut objective = objective;

    backtrack(vars, 0, &mut cursors, constraints, &mut objective, mode, removed_vars, &mut results, &mut stop)?;

    for v in vars {
        v.de_instance();
    }

    if mode == SolveMode::All {
        if let Some(obj) = &objective {
            let sense = obj.sense();
            let expr = obj.expression().clone();
            let mut keyed: Vec<(Number, Assignment)> = Vec::with_capacity(results.len());
            for assignment in results {
                let value = match expr.eval(&assignment)? {
                    crate::model::Expression::Const(n) => n,
                    _ => {
                        return Err(SolverError::internal_inconsistency(
                            "objective did not fully resolve against a total assignment",
                        ))
                    }
                };
                keyed.push((value, assignment));
            }
            keyed.sort_by(|(a, _), (b, _)| match sense {
                crate::model::Sense::Minimize => a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal),
                crate::model::Sense::Maximize => b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal),
            });
            results = keyed.into_iter().map(|(_, a)| a).collect();
        }
    }

    Ok(results)
}

#[allow(clippy::too_many_arguments)]
fn backtrack(
    vars: &[Variable],
    index: usize,
    cursors: &mut [VariableCursor],
    constraints: &ConstraintSet,
    objective: &mut Option<&mut Objective>,
    mode: SolveMode,
    removed_vars: &Assignment,
    results: &mut Vec<Assignment>,
    stop: &mut bool,
) -> SolverResult<()> {
    if *stop {
        return Ok(());
    }
    if index == vars.len() {
        let total = total_assignment(vars, removed_vars);
        record_candidate(total, objective, mode, results, stop)?;
        return Ok(());
    }

    loop {
        if *stop || !cursors[index].instance_next()? {
            cursors[index].reset();
            return Ok(());
        }
        trace!("search: bound {} = {:?} at depth {index}", vars[index].name(), vars[index].instanced());

        match constraints.evaluate(removed_vars) {
            Ok(_) => {
                backtrack(vars, index + 1, cursors, constraints, objective, mode, removed_vars, results, stop)?;
            }
            Err(SolverError::Infeasible(_)) => {
                trace!("search: pruned branch at depth {index}");
            }
            Err(other) => return Err(other),
        }
        if *stop {
            return Ok(());
        }
    }
}

fn total_assignment(vars: &[Variable], removed_vars: &Assignment) -> Assignment {
    let mut assignment = Assignment::new();
    for v in vars {
        let value = v.instanced().expect("every variable is bound once search reaches the leaf frame");
        assignment.insert_named(v.name(), Number::Int(value));
    }
    removed_vars.merged_with(&assignment)
}

fn record_candidate(
    total: Assignment,
    objective: &mut Option<&mut Objective>,
    mode: SolveMode,
    results: &mut Vec<Assignment>,
    stop: &mut bool,
) -> SolverResult<()> {
    match mode {
        SolveMode::First => {
            results.push(total);
            *stop = true;
        }
        SolveMode::All => {
            results.push(total);
        }
        SolveMode::Optimal => {
            let objective = objective.as_deref_mut().expect("checked Some at entry to solve()");
            let value = objective.eval(&total)?;
            if objective.is_better_than_optimal(value) {
                results.clear();
                results.push(total);
            } else if objective.is_optimal(value) {
                results.push(total);
            }
        }
    }
    Ok(())
}
