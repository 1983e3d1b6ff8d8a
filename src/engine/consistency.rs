//! Node and arc consistency preprocessing.
//!
//! Both passes work directly against the live `Variable` domains (removing values is the whole
//! point), and report back which variables collapsed to a singleton so the caller (`Problem`) can
//! promote them to `removed_vars` and fold that into the constraint set and objective exactly
//! once per pass, per the teacher's style of returning a small summary struct from a preprocessing
//! routine rather than threading mutable counters through by reference.

use std::collections::VecDeque;

use log::debug;

use crate::error::SolverError;
use crate::error::SolverResult;
use crate::model::Assignment;
use crate::model::Comparison;
use crate::model::ComparisonOutcome;
use crate::model::Number;
use crate::model::Variable;

/// What a single node- or arc-consistency pass accomplished.
#[derive(Debug, Default)]
pub(crate) struct PassSummary {
    pub(crate) fixed: Assignment,
    pub(crate) values_pruned: usize,
}

/// Runs node consistency: for every constraint mentioning exactly one live variable, prunes
/// domain values that falsify it, then drops the constraint (it has been fully accounted for by
/// the pruning). Constraints that collapse their variable to a singleton report it via the
/// returned summary; `constraints` has every processed unary constraint removed in place.
pub(crate) fn node_consistency(
    constraints: &mut Vec<Comparison>,
    live_vars: &[Variable],
) -> SolverResult<PassSummary> {
    let mut summary = PassSummary::default();
    let mut processed = Vec::new();

    for (index, constraint) in constraints.iter().enumerate() {
        let vars = constraint.get_vars();
        if vars.len() != 1 {
            continue;
        }
        let var = vars.into_iter().next().expect("checked len == 1 above");
        if !live_vars.contains(&var) {
            continue;
        }

        let mut to_remove = Vec::new();
        for value in var.get_domain() {
            let mut probe = Assignment::new();
            probe.insert_named(var.name(), Number::Int(value));
            if let ComparisonOutcome::Decided(false) = constraint.evaluate(&probe)? {
                to_remove.push(value);
            }
        }
        summary.values_pruned += to_remove.len();
        for value in to_remove {
            var.remove_from_domain(value)?;
        }
        if var.domain_len() == 0 {
            return Err(SolverError::infeasible(format!(
                "node consistency emptied the domain of variable {:?}",
                var.name()
            )));
        }
        processed.push(index);
        if let Some(value) = var.singleton_value() {
            record_fixed(&mut summary.fixed, &var, value)?;
        }
    }

    for &index in processed.iter().rev() {
        let _ = constraints.remove(index);
    }
    debug!(
        "node consistency: {} constraint(s) processed, {} value(s) pruned, {} variable(s) fixed",
        processed.len(),
        summary.values_pruned,
        summary.fixed.len()
    );
    Ok(summary)
}

/// Records that `var` collapsed to `value`, failing with [`SolverError::InternalInconsistency`]
/// if a different value was already recorded for it in this pass.
fn record_fixed(fixed: &mut Assignment, var: &Variable, value: i64) -> SolverResult<()> {
    if let Some(existing) = fixed.get(var) {
        if existing != Number::Int(value) {
            return Err(SolverError::internal_inconsistency(format!(
                "variable {:?} was fixed to both {existing} and {value} in the same pass",
                var.name()
            )));
        }
    } else {
        fixed.insert(var, Number::Int(value));
    }
    Ok(())
}

/// Runs AC-3 over the binary constraints of `constraints`. Like `node_consistency`, mutates
/// variable domains directly and reports newly-singleton variables; constraints whose both sides
/// collapsed are removed from `constraints`.
pub(crate) fn arc_consistency(
    constraints: &mut Vec<Comparison>,
    live_vars: &[Variable],
) -> SolverResult<PassSummary> {
    let mut summary = PassSummary::default();
    let mut removed_constraint_indices = Vec::new();

    let binary_indices: Vec<usize> = constraints
        .iter()
        .enumerate()
        .filter(|(_, c)| c.get_vars().len() == 2)
        .map(|(i, _)| i)
        .collect();

    let mut worklist: VecDeque<usize> = binary_indices.into_iter().collect();
    let mut queued: Vec<bool> = vec![false; constraints.len()];
    for &i in &worklist {
        queued[i] = true;
    }

    while let Some(index) = worklist.pop_back() {
        queued[index] = false;
        if removed_constraint_indices.contains(&index) {
            continue;
        }
        let constraint = constraints[index].clone();
        let vars = constraint.get_vars();
        if vars.len() != 2 {
            continue;
        }
        let (j, k) = (&vars[0], &vars[1]);
        if !live_vars.contains(j) || !live_vars.contains(k) {
            continue;
        }

        let j_removed = revise(&constraint, j, k)?;
        let k_removed = revise(&constraint, k, j)?;
        summary.values_pruned += j_removed.len() + k_removed.len();

        if j.domain_len() == 0 || k.domain_len() == 0 {
            return Err(SolverError::infeasible(format!(
                "arc consistency emptied the domain of {:?} or {:?}",
                j.name(),
                k.name()
            )));
        }

        let j_collapsed = j.is_singleton();
        let k_collapsed = k.is_singleton();
        if j_collapsed && k_collapsed {
            removed_constraint_indices.push(index);
        }
        if j_collapsed {
            record_fixed(&mut summary.fixed, j, j.singleton_value().expect("just checked singleton"))?;
        }
        if k_collapsed {
            record_fixed(&mut summary.fixed, k, k.singleton_value().expect("just checked singleton"))?;
        }

        if !j_removed.is_empty() && !j_collapsed {
            enqueue_mentioning(&mut worklist, &mut queued, constraints, j, index);
        }
        if !k_removed.is_empty() && !k_collapsed {
            enqueue_mentioning(&mut worklist, &mut queued, constraints, k, index);
        }
    }

    removed_constraint_indices.sort_unstable();
    removed_constraint_indices.dedup();
    for &index in removed_constraint_indices.iter().rev() {
        let _ = constraints.remove(index);
    }
    debug!(
        "arc consistency: {} value(s) pruned, {} variable(s) fixed, {} constraint(s) removed",
        summary.values_pruned,
        summary.fixed.len(),
        removed_constraint_indices.len()
    );
    Ok(summary)
}

/// Removes unsupported values from `target`'s domain with respect to `other` under `constraint`,
/// returning the values that were removed.
fn revise(constraint: &Comparison, target: &Variable, other: &Variable) -> SolverResult<Vec<i64>> {
    let mut removed = Vec::new();
    for a in target.get_domain() {
        let mut supported = false;
        for b in other.get_domain() {
            let mut probe = Assignment::new();
            probe.insert_named(target.name(), Number::Int(a));
            probe.insert_named(other.name(), Number::Int(b));
            if let ComparisonOutcome::Decided(true) = constraint.evaluate(&probe)? {
                supported = true;
                break;
            }
        }
        if !supported {
            removed.push(a);
        }
    }
    for value in &removed {
        target.remove_from_domain(*value)?;
    }
    Ok(removed)
}

/// Enqueues every other binary constraint mentioning `var`, skipping `skip_index` (the constraint
/// currently being revised) and anything already queued.
fn enqueue_mentioning(
    worklist: &mut VecDeque<usize>,
    queued: &mut [bool],
    constraints: &[Comparison],
    var: &Variable,
    skip_index: usize,
) {
    for (index, constraint) in constraints.iter().enumerate() {
        if index == skip_index || queued[index] {
            continue;
        }
        let vars = constraint.get_vars();
        if vars.len() == 2 && vars.contains(var) {
            worklist.push_back(index);
            queued[index] = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::eq;
    use crate::model::lt;
    use crate::model::Expression;

    fn var(name: &str, domain: impl IntoIterator<Item = i64>) -> Variable {
        Variable::new(name, domain).unwrap()
    }

    #[test]
    fn node_consistency_collapses_a_fixed_variable() {
        let z = var("z", 0..=14);
        let mut constraints = vec![eq(Expression::Var(z.clone()), 1)];
        let summary = node_consistency(&mut constraints, std::slice::from_ref(&z)).unwrap();
        assert_eq!(z.get_domain(), [1].into_iter().collect());
        assert_eq!(summary.fixed.get(&z), Some(Number::Int(1)));
        assert!(constraints.is_empty());
    }

    #[test]
    fn node_consistency_fails_infeasible_on_an_emptied_domain() {
        let z = var("z", [5]);
        let mut constraints = vec![eq(Expression::Var(z.clone()), 1)];
        assert!(matches!(
            node_consistency(&mut constraints, std::slice::from_ref(&z)),
            Err(SolverError::Infeasible(_))
        ));
    }

    #[test]
    fn arc_consistency_prunes_unsupported_values() {
        let x = var("x", [0, 1, 2]);
        let y = var("y", [0, 1, 2]);
        let mut constraints = vec![lt(Expression::Var(x.clone()), Expression::Var(y.clone()))];
        let live = [x.clone(), y.clone()];
        arc_consistency(&mut constraints, &live).unwrap();
        assert_eq!(x.get_domain(), [0, 1].into_iter().collect());
        assert_eq!(y.get_domain(), [1, 2].into_iter().collect());
    }
}
