//! # Tangram
//! Tangram is a finite-domain constraint satisfaction and optimisation (CSP/COP) solver. A caller
//! declares integer-valued variables, each with a finite domain; builds a [`Problem`] by
//! attaching arithmetic constraints and, optionally, a single objective expression; and asks the
//! solver for the first feasible assignment, every feasible assignment, or the assignments that
//! optimise the objective.
//!
//! The solver is synchronous, single-threaded, and has no external I/O: it is a library for
//! embedding into a driver, not a driver itself.
//!
//! # Using Tangram
//! The first step is **declaring variables**:
//! ```rust
//! use tangram::model::Variable;
//!
//! let x = Variable::new("x", 0..=13).unwrap();
//! let y = Variable::new("y", 1..=14).unwrap();
//! let z = Variable::new("z", 0..=14).unwrap();
//! ```
//!
//! Then **build a problem** out of constraints over those variables:
//! ```rust
//! use tangram::model::{add, eq, gt, lt, mul, pow, sub, Expression, Objective, Variable};
//! use tangram::engine::Problem;
//!
//! let x = Variable::new("x", 0..=13).unwrap();
//! let y = Variable::new("y", 1..=14).unwrap();
//! let z = Variable::new("z", 0..=14).unwrap();
//!
//! let mut problem = Problem::new("example", [x.clone(), y.clone(), z.clone()]);
//! problem.add_constraint(lt(
//!     sub(add(pow(Expression::Var(x.clone()), 2), Expression::Var(y.clone())), Expression::Var(z.clone())),
//!     8,
//! ));
//! problem.add_constraint(gt(add(add(Expression::Var(x.clone()), Expression::Var(y.clone())), 1), 2));
//! problem.add_constraint(eq(Expression::Var(z.clone()), 1));
//! problem.set_objective(Objective::minimize(add(
//!     sub(mul(3, Expression::Var(x)), mul(2, Expression::Var(z))),
//!     Expression::Var(y),
//! )));
//! ```
//!
//! Preprocess and **search for solutions**:
//! ```rust
//! # use tangram::model::{add, eq, gt, lt, mul, pow, sub, Expression, Objective, Variable};
//! # use tangram::engine::Problem;
//! # let x = Variable::new("x", 0..=13).unwrap();
//! # let y = Variable::new("y", 1..=14).unwrap();
//! # let z = Variable::new("z", 0..=14).unwrap();
//! # let mut problem = Problem::new("example", [x.clone(), y.clone(), z.clone()]);
//! # problem.add_constraint(lt(sub(add(pow(Expression::Var(x.clone()), 2), Expression::Var(y.clone())), Expression::Var(z.clone())), 8));
//! # problem.add_constraint(gt(add(add(Expression::Var(x.clone()), Expression::Var(y.clone())), 1), 2));
//! # problem.add_constraint(eq(Expression::Var(z.clone()), 1));
//! # problem.set_objective(Objective::minimize(add(sub(mul(3, Expression::Var(x)), mul(2, Expression::Var(z))), Expression::Var(y))));
//! use tangram::engine::SolveMode;
//!
//! problem.arc_consistency().unwrap();
//! let solutions = problem.solve(SolveMode::All).unwrap();
//! assert!(!solutions.is_empty());
//! ```

pub mod engine;
mod error;
pub mod model;

pub use error::SolverError;
pub use error::SolverResult;

pub mod solver {
    //! Re-exports [`Problem`] and the handful of types its public methods speak in, for callers
    //! who only need the solving entry point and not the full model vocabulary.
    pub use crate::engine::EvaluationResult;
    pub use crate::engine::Problem;
    pub use crate::engine::SolveMode;
}
