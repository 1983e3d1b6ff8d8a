//! Relational comparisons between two expressions.

use crate::error::SolverResult;
use crate::model::Assignment;
use crate::model::Expression;
use crate::model::Number;
use crate::model::Variable;

/// The six relations a [`Comparison`] can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Relation {
    /// The relation obtained by swapping the operand order (`a < b` becomes `b > a`).
    fn flipped(self) -> Relation {
        match self {
            Relation::Eq => Relation::Eq,
            Relation::Ne => Relation::Ne,
            Relation::Lt => Relation::Gt,
            Relation::Le => Relation::Ge,
            Relation::Gt => Relation::Lt,
            Relation::Ge => Relation::Le,
        }
    }

    fn apply(self, left: Number, right: Number) -> bool {
        match self {
            Relation::Eq => left == right,
            Relation::Ne => left != right,
            Relation::Lt => left < right,
            Relation::Le => left <= right,
            Relation::Gt => left > right,
            Relation::Ge => left >= right,
        }
    }
}

/// Either a settled truth value or an expression pair still awaiting more bindings.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonOutcome {
    Decided(bool),
    Residual(Comparison),
}

/// A single relational constraint: `left <relation> right`.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    left: Expression,
    relation: Relation,
    right: Expression,
}

impl Comparison {
    pub fn new(left: Expression, relation: Relation, right: Expression) -> Self {
        Comparison { left, relation, right }
    }

    pub fn left(&self) -> &Expression {
        &self.left
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn right(&self) -> &Expression {
        &self.right
    }

    /// Every variable referenced by either side, deduplicated in first-occurrence order.
    pub fn get_vars(&self) -> Vec<Variable> {
        let mut vars = self.left.get_vars();
        for v in self.right.get_vars() {
            if !vars.contains(&v) {
                vars.push(v);
            }
        }
        vars
    }

    /// Evaluates both sides under `assignment`. Returns `Decided` once both sides have collapsed
    /// to constants, otherwise `Residual` carrying the partially-evaluated comparison.
    pub fn evaluate(&self, assignment: &Assignment) -> SolverResult<ComparisonOutcome> {
        let left = self.left.eval(assignment)?;
        let right = self.right.eval(assignment)?;
        if let (Expression::Const(l), Expression::Const(r)) = (&left, &right) {
            Ok(ComparisonOutcome::Decided(self.relation.apply(*l, *r)))
        } else {
            Ok(ComparisonOutcome::Residual(Comparison::new(left, self.relation, right)))
        }
    }

    /// Structural equivalence that also accounts for operand-order symmetry: `a < b` is
    /// equivalent to `b > a`, and `a == b` is equivalent to `b == a` (and likewise for `!=`).
    pub fn is_equal(&self, other: &Comparison) -> bool {
        let same_order = self.relation == other.relation && self.left.is_equal(&other.left) && self.right.is_equal(&other.right);
        let flipped_order =
            self.relation == other.relation.flipped() && self.left.is_equal(&other.right) && self.right.is_equal(&other.left);
        same_order || flipped_order
    }
}

pub fn eq(left: impl Into<Expression>, right: impl Into<Expression>) -> Comparison {
    Comparison::new(left.into(), Relation::Eq, right.into())
}

pub fn ne(left: impl Into<Expression>, right: impl Into<Expression>) -> Comparison {
    Comparison::new(left.into(), Relation::Ne, right.into())
}

pub fn lt(left: impl Into<Expression>, right: impl Into<Expression>) -> Comparison {
    Comparison::new(left.into(), Relation::Lt, right.into())
}

pub fn le(left: impl Into<Expression>, right: impl Into<Expression>) -> Comparison {
    Comparison::new(left.into(), Relation::Le, right.into())
}

pub fn gt(left: impl Into<Expression>, right: impl Into<Expression>) -> Comparison {
    Comparison::new(left.into(), Relation::Gt, right.into())
}

pub fn ge(left: impl Into<Expression>, right: impl Into<Expression>) -> Comparison {
    Comparison::new(left.into(), Relation::Ge, right.into())
}
