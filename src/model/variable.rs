//! Named, finite-domain variables.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::rc::Rc;

use crate::error::not_in_domain;
use crate::error::SolverError;
use crate::error::SolverResult;

#[derive(Debug)]
struct VariableState {
    name: String,
    domain: BTreeSet<i64>,
    instanced: Option<i64>,
}

/// A named integer variable with a finite domain.
///
/// A `Variable` is a cheap, cloneable handle over shared state: cloning it does not copy the
/// domain, it creates a second reference to the same variable, mirroring the source's
/// name-as-identity semantics (two handles constructed with the same name alias one another).
/// This is what lets an [`Expression::Var`](crate::model::Expression::Var) node be built from a
/// `Variable` before any [`Problem`](crate::engine::Problem) exists to "own" it: the builder
/// table creates variables first and hands them to the `Problem` afterwards, and the `Problem`
/// only ever holds another handle to the same shared state.
///
/// Equality and hashing are by name, not by the identity of the underlying allocation — this is
/// intentional (see the variable-identity design note) and means two independently constructed
/// `Variable`s sharing a name are indistinguishable to the rest of the crate.
#[derive(Clone)]
pub struct Variable {
    state: Rc<RefCell<VariableState>>,
}

impl Variable {
    /// Creates a new variable with the given name and domain.
    ///
    /// Fails with [`SolverError::DomainError`] if `domain` is empty.
    pub fn new(name: impl Into<String>, domain: impl IntoIterator<Item = i64>) -> SolverResult<Self> {
        let name = name.into();
        let domain: BTreeSet<i64> = domain.into_iter().collect();
        if domain.is_empty() {
            return Err(SolverError::domain(format!(
                "variable {name:?} was constructed with an empty domain"
            )));
        }
        Ok(Variable {
            state: Rc::new(RefCell::new(VariableState {
                name,
                domain,
                instanced: None,
            })),
        })
    }

    pub fn name(&self) -> String {
        self.state.borrow().name.clone()
    }

    /// The variable's current domain, snapshotted into a fresh set.
    pub fn get_domain(&self) -> BTreeSet<i64> {
        self.state.borrow().domain.clone()
    }

    pub fn domain_len(&self) -> usize {
        self.state.borrow().domain.len()
    }

    pub fn contains(&self, value: i64) -> bool {
        self.state.borrow().domain.contains(&value)
    }

    pub fn is_singleton(&self) -> bool {
        self.state.borrow().domain.len() == 1
    }

    /// Returns the sole remaining value if the domain has collapsed to a singleton.
    pub fn singleton_value(&self) -> Option<i64> {
        let state = self.state.borrow();
        if state.domain.len() == 1 {
            state.domain.iter().next().copied()
        } else {
            None
        }
    }

    /// Removes `value` from the domain.
    ///
    /// Fails with [`SolverError::DomainError`] if `value` was not present.
    pub fn remove_from_domain(&self, value: i64) -> SolverResult<()> {
        let mut state = self.state.borrow_mut();
        if !state.domain.remove(&value) {
            return Err(not_in_domain(&state.name, crate::model::Number::Int(value)));
        }
        Ok(())
    }

    /// Binds `value` as the variable's current instantiation.
    ///
    /// Fails with [`SolverError::DomainError`] if `value` is not in the domain.
    pub fn instance_value(&self, value: i64) -> SolverResult<()> {
        let mut state = self.state.borrow_mut();
        if !state.domain.contains(&value) {
            return Err(not_in_domain(&state.name, crate::model::Number::Int(value)));
        }
        state.instanced = Some(value);
        Ok(())
    }

    pub fn de_instance(&self) {
        self.state.borrow_mut().instanced = None;
    }

    pub fn instanced(&self) -> Option<i64> {
        self.state.borrow().instanced
    }

    /// Resolves the variable's current binding. Returns `None` when the variable is not
    /// currently instanced (the caller decides whether that means "still symbolic").
    pub fn call(&self) -> Option<i64> {
        self.instanced()
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Variable")
            .field("name", &state.name)
            .field("domain", &state.domain)
            .field("instanced", &state.instanced)
            .finish()
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.state.borrow().name == other.state.borrow().name
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.state.borrow().name.hash(state)
    }
}

/// A per-variable iterator used by backtracking search.
///
/// Snapshots the variable's domain at construction time (so further mutation of the live domain
/// does not perturb an in-progress search frame) and walks it in stable, ascending order.
#[derive(Debug)]
pub struct VariableCursor {
    variable: Variable,
    snapshot: Vec<i64>,
    position: usize,
}

impl VariableCursor {
    pub fn new(variable: Variable) -> Self {
        let snapshot: Vec<i64> = variable.get_domain().into_iter().collect();
        VariableCursor {
            variable,
            snapshot,
            position: 0,
        }
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    /// Advances to the next value in the snapshot and binds it.
    ///
    /// Returns `false` once the snapshot is exhausted, without mutating the cursor further.
    pub fn instance_next(&mut self) -> SolverResult<bool> {
        if self.position >= self.snapshot.len() {
            return Ok(false);
        }
        let value = self.snapshot[self.position];
        self.position += 1;
        self.variable.instance_value(value)?;
        Ok(true)
    }

    pub fn de_instance(&self) {
        self.variable.de_instance();
    }

    /// Resets the cursor back to the start of its snapshot and unbinds the variable.
    pub fn reset(&mut self) {
        self.de_instance();
        self.position = 0;
    }
}
