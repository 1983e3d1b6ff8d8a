//! The arithmetic expression tree and its peephole normalization rules.

use std::ops::Add as StdAdd;
use std::ops::Mul as StdMul;
use std::ops::Neg as StdNeg;
use std::ops::Sub as StdSub;

use crate::error::SolverError;
use crate::error::SolverResult;
use crate::model::Assignment;
use crate::model::Number;
use crate::model::Variable;

/// An arithmetic expression over constants and [`Variable`]s.
///
/// Every operator node is n-ary (`Add`/`Mul` flatten associative chains; `Div` flattens
/// right-chained division; `Pow`/`Mod` stay binary), mirroring the structure the original system
/// built incrementally via operator overloading. Nodes are normalized at construction time by the
/// builder functions below, not lazily when evaluated: an `Expression` you hold is already in
/// peephole-normal form.
///
/// Equality is structural: two nodes are equal when they carry the same operator (or are both
/// `Const`/`Var`) and their children are pairwise equal in order. This is exactly what `#[derive(
/// PartialEq)]` gives us here, since `Number` compares exactly and `Variable` compares by name.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Const(Number),
    Var(Variable),
    Add(Vec<Expression>),
    Mul(Vec<Expression>),
    Div(Vec<Expression>),
    Pow(Vec<Expression>),
    Mod(Vec<Expression>),
}

impl Expression {
    /// Structural equality, exposed as a named method to mirror the rest of the model's
    /// `is_equal` vocabulary; identical to `==`.
    pub fn is_equal(&self, other: &Expression) -> bool {
        self == other
    }

    /// Every variable referenced anywhere in the tree, deduplicated by name but listed in
    /// first-occurrence order.
    pub fn get_vars(&self) -> Vec<Variable> {
        let mut found = Vec::new();
        self.collect_vars(&mut found);
        found
    }

    fn collect_vars(&self, found: &mut Vec<Variable>) {
        match self {
            Expression::Const(_) => {}
            Expression::Var(v) => {
                if !found.contains(v) {
                    found.push(v.clone());
                }
            }
            Expression::Add(children)
            | Expression::Mul(children)
            | Expression::Div(children)
            | Expression::Pow(children)
            | Expression::Mod(children) => {
                for child in children {
                    child.collect_vars(found);
                }
            }
        }
    }

    /// Evaluates the tree against `assignment`, falling back to each [`Variable`]'s own current
    /// instantiation when it has no binding in `assignment`.
    ///
    /// A fully bound subtree collapses to [`Expression::Const`]; any variable left unbound by
    /// both `assignment` and its own instantiation survives in the result, so the same method
    /// serves both "give me the final number" (full assignment) and "simplify what I can"
    /// (partial assignment) callers.
    pub fn eval(&self, assignment: &Assignment) -> SolverResult<Expression> {
        match self {
            Expression::Const(_) => Ok(self.clone()),
            Expression::Var(v) => match assignment.get(v).or_else(|| v.instanced().map(Number::Int)) {
                Some(value) => Ok(Expression::Const(value)),
                None => Ok(self.clone()),
            },
            Expression::Add(children) => {
                let mut acc = Expression::Const(Number::Int(0));
                for child in children {
                    acc = add(acc, child.eval(assignment)?);
                }
                Ok(acc)
            }
            Expression::Mul(children) => Self::fold_first(children, assignment, |acc, next| Ok(mul(acc, next))),
            Expression::Div(children) => Self::fold_first(children, assignment, |acc, next| div(acc, next)),
            Expression::Pow(children) => Self::fold_first(children, assignment, |acc, next| Ok(pow(acc, next))),
            Expression::Mod(children) => Self::fold_first(children, assignment, |acc, next| modulo(acc, next)),
        }
    }

    fn fold_first(
        children: &[Expression],
        assignment: &Assignment,
        combine: impl Fn(Expression, Expression) -> SolverResult<Expression>,
    ) -> SolverResult<Expression> {
        let mut iter = children.iter();
        let first = iter
            .next()
            .ok_or_else(|| SolverError::build("operator node constructed with no children"))?;
        let mut acc = first.eval(assignment)?;
        for child in iter {
            acc = combine(acc, child.eval(assignment)?)?;
        }
        Ok(acc)
    }

    /// Distributes `Mul([Add([a, b, ...]), rest...])` into `Add([Mul([a, rest...]), Mul([b,
    /// rest...]), ...])`. A no-op on anything but a `Mul` with an `Add` child.
    pub fn distribute_mul(&self) -> Expression {
        let Expression::Mul(children) = self else {
            return self.clone();
        };
        let Some(add_index) = children.iter().position(|c| matches!(c, Expression::Add(_))) else {
            return self.clone();
        };
        let Expression::Add(terms) = &children[add_index] else {
            unreachable!()
        };
        let other_factors: Vec<Expression> = children
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != add_index)
            .map(|(_, c)| c.clone())
            .collect();

        let distributed = terms.iter().map(|term| {
            let mut factors = vec![term.clone()];
            factors.extend(other_factors.iter().cloned());
            Expression::Mul(factors)
        });
        build_add(distributed.collect())
    }

    /// Splits an `Add` node's numeric-constant children out from its symbolic children, folding
    /// the constants into a single `Number` and mutating `self` to hold only the remainder.
    ///
    /// Returns `0` (and leaves non-`Add` nodes untouched) when there is nothing to pop.
    pub fn pop_numbers(&mut self) -> Number {
        let Expression::Add(children) = self else {
            return Number::Int(0);
        };
        let mut sum = Number::Int(0);
        let mut remainder = Vec::with_capacity(children.len());
        for child in children.drain(..) {
            match child {
                Expression::Const(n) => sum = sum + n,
                other => remainder.push(other),
            }
        }
        *children = remainder;
        sum
    }

    /// Splits an `Add` node's non-numeric children out from its numeric-constant children,
    /// summing the former into a single (possibly still symbolic) `Expression` and mutating
    /// `self` to hold only the numeric remainder. The mirror of `pop_numbers`.
    ///
    /// Returns `None` (and leaves non-`Add` nodes untouched) when there are no non-numeric
    /// children to pop.
    pub fn pop_elements(&mut self) -> Option<Expression> {
        let Expression::Add(children) = self else {
            return None;
        };
        let mut popped = Vec::with_capacity(children.len());
        let mut remainder = Vec::with_capacity(children.len());
        for child in children.drain(..) {
            match child {
                Expression::Const(_) => remainder.push(child),
                other => popped.push(other),
            }
        }
        *children = remainder;
        if popped.is_empty() {
            None
        } else {
            Some(build_add(popped))
        }
    }

    /// Collapses repeated structurally-equal children of an `Add` node into a single `Mul([k,
    /// term])`, and cancels additive-inverse pairs (`x + (-x) -> 0`), repeating both passes until
    /// neither changes anything further. A no-op on anything but `Add`.
    pub fn group_same_expressions(&mut self) {
        let Expression::Add(children) = self else {
            return;
        };
        let mut current = std::mem::take(children);
        loop {
            let (next, grouped_anything) = group_pass(current);
            let (next, cancelled_anything) = cancel_pass(next);
            current = next;
            if !grouped_anything && !cancelled_anything {
                break;
            }
        }
        *children = current;
    }
}

/// One grouping pass: fuses structurally-equal children into a `Mul([count, term])`. Returns
/// whether any fusion happened.
fn group_pass(children: Vec<Expression>) -> (Vec<Expression>, bool) {
    let mut counts: Vec<(Expression, i64)> = Vec::new();
    let mut changed = false;
    for child in children {
        if let Some(entry) = counts.iter_mut().find(|(term, _)| term.is_equal(&child)) {
            entry.1 += 1;
            changed = true;
        } else {
            counts.push((child, 1));
        }
    }
    let grouped = counts
        .into_iter()
        .map(|(term, count)| {
            if count == 1 {
                term
            } else {
                Expression::Mul(vec![Expression::Const(Number::Int(count)), term])
            }
        })
        .collect();
    (grouped, changed)
}

/// One cancellation pass: drops the first pair of children where one is the negation of the
/// other. Returns whether any pair was dropped.
fn cancel_pass(mut children: Vec<Expression>) -> (Vec<Expression>, bool) {
    let mut changed = false;
    let mut i = 0;
    while i < children.len() {
        let negated = neg(children[i].clone());
        let partner = children.iter().skip(i + 1).position(|c| c.is_equal(&negated)).map(|p| p + i + 1);
        match partner {
            Some(j) => {
                children.remove(j);
                children.remove(i);
                changed = true;
            }
            None => i += 1,
        }
    }
    (children, changed)
}

impl From<i64> for Expression {
    fn from(value: i64) -> Self {
        Expression::Const(Number::Int(value))
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::Const(Number::Real(value))
    }
}

impl From<Number> for Expression {
    fn from(value: Number) -> Self {
        Expression::Const(value)
    }
}

impl From<Variable> for Expression {
    fn from(value: Variable) -> Self {
        Expression::Var(value)
    }
}

fn as_const(expr: &Expression) -> Option<Number> {
    match expr {
        Expression::Const(n) => Some(*n),
        _ => None,
    }
}

fn build_add(mut flattened: Vec<Expression>) -> Expression {
    if flattened.len() == 1 {
        return flattened.remove(0);
    }
    Expression::Add(flattened)
}

/// Builds `a + b`, flattening nested `Add`s and dropping additive identities.
pub fn add(a: impl Into<Expression>, b: impl Into<Expression>) -> Expression {
    let a = a.into();
    let b = b.into();
    if let (Some(x), Some(y)) = (as_const(&a), as_const(&b)) {
        return Expression::Const(x + y);
    }
    if matches!(&a, Expression::Const(n) if n.is_zero()) {
        return b;
    }
    if matches!(&b, Expression::Const(n) if n.is_zero()) {
        return a;
    }
    match (a, b) {
        (Expression::Add(mut left), Expression::Add(right)) => {
            left.extend(right);
            Expression::Add(left)
        }
        (Expression::Add(mut left), b) => {
            left.push(b);
            Expression::Add(left)
        }
        (a, Expression::Add(mut right)) => {
            right.insert(0, a);
            Expression::Add(right)
        }
        (a, b) => Expression::Add(vec![a, b]),
    }
}

/// Builds `a - b` as `add(a, -b)`.
pub fn sub(a: impl Into<Expression>, b: impl Into<Expression>) -> Expression {
    add(a.into(), neg(b.into()))
}

/// Builds `a * b`, flattening nested `Mul`s and applying the zero/one identities.
pub fn mul(a: impl Into<Expression>, b: impl Into<Expression>) -> Expression {
    let a = a.into();
    let b = b.into();
    if let (Some(x), Some(y)) = (as_const(&a), as_const(&b)) {
        return Expression::Const(x * y);
    }
    if matches!(&a, Expression::Const(n) if n.is_zero()) || matches!(&b, Expression::Const(n) if n.is_zero()) {
        return Expression::Const(Number::Int(0));
    }
    if matches!(&a, Expression::Const(n) if n.is_one()) {
        return b;
    }
    if matches!(&b, Expression::Const(n) if n.is_one()) {
        return a;
    }
    match (a, b) {
        (Expression::Mul(mut left), Expression::Mul(right)) => {
            left.extend(right);
            Expression::Mul(left)
        }
        (Expression::Mul(mut left), b) => {
            left.push(b);
            Expression::Mul(left)
        }
        (a, Expression::Mul(mut right)) => {
            right.insert(0, a);
            Expression::Mul(right)
        }
        (a, b) => Expression::Mul(vec![a, b]),
    }
}

/// Builds `a / b`.
///
/// `b` the literal constant zero fails at build time, matching the rest of the model's
/// fail-fast-on-construction posture for malformed arithmetic. Chaining further division on the
/// right (`div(a, b)` where `a` is itself a `Div`) flattens into one n-ary node; dividing into an
/// existing `Div` on the left does not flatten, since that is not associative with the existing
/// chain's evaluation order.
pub fn div(a: impl Into<Expression>, b: impl Into<Expression>) -> SolverResult<Expression> {
    let a = a.into();
    let b = b.into();
    if matches!(&b, Expression::Const(n) if n.is_zero()) {
        return Err(SolverError::domain("division by the literal zero"));
    }
    if let (Some(x), Some(y)) = (as_const(&a), as_const(&b)) {
        return Ok(Expression::Const(crate::model::number::true_divide(x, y)));
    }
    if matches!(&b, Expression::Const(n) if n.is_one()) {
        return Ok(a);
    }
    Ok(match a {
        Expression::Div(mut left) => {
            left.push(b);
            Expression::Div(left)
        }
        a => Expression::Div(vec![a, b]),
    })
}

/// Builds `a % b`, failing at build time when `b` is the literal zero.
pub fn modulo(a: impl Into<Expression>, b: impl Into<Expression>) -> SolverResult<Expression> {
    let a = a.into();
    let b = b.into();
    if matches!(&b, Expression::Const(n) if n.is_zero()) {
        return Err(SolverError::domain("modulo by the literal zero"));
    }
    if let (Some(x), Some(y)) = (as_const(&a), as_const(&b)) {
        return Ok(Expression::Const(x % y));
    }
    Ok(Expression::Mod(vec![a, b]))
}

/// Builds `a ** b`, applying the exponent-0/1 and base-0/1 identities (checked in that order, so
/// `pow(0, 0)` is `1`, matching the exponent-first check the rest of the model uses).
pub fn pow(a: impl Into<Expression>, b: impl Into<Expression>) -> Expression {
    let a = a.into();
    let b = b.into();
    if matches!(&b, Expression::Const(n) if n.is_zero()) {
        return Expression::Const(Number::Int(1));
    }
    if matches!(&b, Expression::Const(n) if n.is_one()) {
        return a;
    }
    if matches!(&a, Expression::Const(n) if n.is_zero()) {
        return Expression::Const(Number::Int(0));
    }
    if matches!(&a, Expression::Const(n) if n.is_one()) {
        return Expression::Const(Number::Int(1));
    }
    if let (Some(x), Some(y)) = (as_const(&a), as_const(&b)) {
        if let (Number::Int(base), Some(exp)) = (x, y.as_i64()) {
            if exp >= 0 {
                return Expression::Const(Number::Int(base.pow(exp as u32)));
            }
        }
        return Expression::Const(Number::Real(x.as_f64().powf(y.as_f64())));
    }
    Expression::Pow(vec![a, b])
}

/// Negates `self`, per the model's negation rules:
/// - `Const(n)` negates the number directly.
/// - `Var` becomes `Mul([-1, Var])`.
/// - `Add` distributes the negation over its children.
/// - `Mul` drops a leading literal `-1` if present, otherwise prepends one.
/// - `Div`/`Pow`/`Mod` are wrapped in `Mul([-1, ...])`.
pub fn neg(expr: impl Into<Expression>) -> Expression {
    match expr.into() {
        Expression::Const(n) => Expression::Const(-n),
        Expression::Var(v) => Expression::Mul(vec![Expression::Const(Number::Int(-1)), Expression::Var(v)]),
        Expression::Add(children) => Expression::Add(children.into_iter().map(neg).collect()),
        Expression::Mul(mut children) => {
            if matches!(children.first(), Some(Expression::Const(n)) if n.as_f64() == -1.0) {
                children.remove(0);
                build_mul(children)
            } else {
                children.insert(0, Expression::Const(Number::Int(-1)));
                Expression::Mul(children)
            }
        }
        other @ (Expression::Div(_) | Expression::Pow(_) | Expression::Mod(_)) => {
            Expression::Mul(vec![Expression::Const(Number::Int(-1)), other])
        }
    }
}

fn build_mul(mut flattened: Vec<Expression>) -> Expression {
    if flattened.len() == 1 {
        return flattened.remove(0);
    }
    if flattened.is_empty() {
        return Expression::Const(Number::Int(1));
    }
    Expression::Mul(flattened)
}

impl<T: Into<Expression>> StdAdd<T> for Expression {
    type Output = Expression;

    fn add(self, rhs: T) -> Self::Output {
        add(self, rhs)
    }
}

impl<T: Into<Expression>> StdSub<T> for Expression {
    type Output = Expression;

    fn sub(self, rhs: T) -> Self::Output {
        sub(self, rhs)
    }
}

impl<T: Into<Expression>> StdMul<T> for Expression {
    type Output = Expression;

    fn mul(self, rhs: T) -> Self::Output {
        mul(self, rhs)
    }
}

impl StdNeg for Expression {
    type Output = Expression;

    fn neg(self) -> Self::Output {
        neg(self)
    }
}

macro_rules! impl_primitive_lhs {
    ($ty:ty) => {
        impl StdAdd<Expression> for $ty {
            type Output = Expression;

            fn add(self, rhs: Expression) -> Self::Output {
                add(self, rhs)
            }
        }

        impl StdSub<Expression> for $ty {
            type Output = Expression;

            fn sub(self, rhs: Expression) -> Self::Output {
                sub(self, rhs)
            }
        }

        impl StdMul<Expression> for $ty {
            type Output = Expression;

            fn mul(self, rhs: Expression) -> Self::Output {
                mul(self, rhs)
            }
        }
    };
}

impl_primitive_lhs!(i64);
impl_primitive_lhs!(f64);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Variable;

    fn var(name: &str, domain: impl IntoIterator<Item = i64>) -> Variable {
        Variable::new(name, domain).unwrap()
    }

    #[test]
    fn additive_identity_is_dropped() {
        let x = Expression::Var(var("x", [1, 2, 3]));
        assert_eq!(add(x.clone(), 0), x);
        assert_eq!(add(0, x.clone()), x);
    }

    #[test]
    fn multiplicative_identities() {
        let x = Expression::Var(var("x", [1, 2, 3]));
        assert_eq!(mul(x.clone(), 1), x);
        assert_eq!(mul(x.clone(), 0), Expression::Const(Number::Int(0)));
    }

    #[test]
    fn add_flattens_associative_chains() {
        let x = Expression::Var(var("x", [1]));
        let y = Expression::Var(var("y", [1]));
        let z = Expression::Var(var("z", [1]));
        let lhs = add(add(x.clone(), y.clone()), z.clone());
        assert_eq!(lhs, Expression::Add(vec![x, y, z]));
    }

    #[test]
    fn div_rejects_literal_zero_divisor() {
        let x = Expression::Var(var("x", [1]));
        assert!(div(x, 0).is_err());
    }

    #[test]
    fn div_chains_on_the_right_flatten() {
        let x = Expression::Var(var("x", [1]));
        let step = div(x.clone(), 2).unwrap();
        let chained = div(step, 3).unwrap();
        assert_eq!(chained, Expression::Div(vec![x, Expression::Const(Number::Int(2)), Expression::Const(Number::Int(3))]));
    }

    #[test]
    fn pow_zero_exponent_wins_over_zero_base() {
        assert_eq!(pow(Expression::Const(Number::Int(0)), Expression::Const(Number::Int(0))), Expression::Const(Number::Int(1)));
    }

    #[test]
    fn negating_a_variable_wraps_in_mul_neg_one() {
        let x = Expression::Var(var("x", [1]));
        assert_eq!(neg(x.clone()), Expression::Mul(vec![Expression::Const(Number::Int(-1)), x]));
    }

    #[test]
    fn double_negation_of_mul_cancels_the_leading_neg_one() {
        let x = Expression::Var(var("x", [1]));
        let once = neg(x.clone());
        let twice = neg(once);
        assert_eq!(twice, x);
    }

    #[test]
    fn eval_resolves_bound_variables_and_leaves_others_residual() {
        let x = var("x", [1, 2, 3]);
        let y = var("y", [1, 2, 3]);
        let expr = add(Expression::Var(x.clone()), Expression::Var(y.clone()));

        let mut assignment = Assignment::new();
        assignment.insert(&x, Number::Int(5));
        let residual = expr.eval(&assignment).unwrap();
        assert_eq!(residual, Expression::Add(vec![Expression::Const(Number::Int(5)), Expression::Var(y.clone())]));

        assignment.insert(&y, Number::Int(7));
        let full = expr.eval(&assignment).unwrap();
        assert_eq!(full, Expression::Const(Number::Int(12)));
    }

    #[test]
    fn eval_true_division_example_from_the_property_suite() {
        // x + y - (x/y)*x + 3 at {x=2, y=4}: x/y = 0.5, (x/y)*x = 1.0, 2+4-1+3 = 8.
        let x = var("x", [2]);
        let y = var("y", [4]);
        let ratio = div(Expression::Var(x.clone()), Expression::Var(y.clone())).unwrap();
        let scaled = mul(ratio, Expression::Var(x.clone()));
        let expr = add(sub(add(Expression::Var(x.clone()), Expression::Var(y.clone())), scaled), 3);

        let mut assignment = Assignment::new();
        assignment.insert(&x, Number::Int(2));
        assignment.insert(&y, Number::Int(4));
        assert_eq!(expr.eval(&assignment).unwrap(), Expression::Const(Number::Real(8.0)));
    }

    #[test]
    fn pop_numbers_extracts_constant_children() {
        let x = Expression::Var(var("x", [1]));
        let mut expr = add(add(x.clone(), 2), 3);
        let sum = expr.pop_numbers();
        assert_eq!(sum, Number::Int(5));
        assert_eq!(expr, Expression::Add(vec![x]));
    }

    #[test]
    fn pop_elements_extracts_non_numeric_children() {
        let x = Expression::Var(var("x", [1]));
        let mut expr = add(add(x.clone(), 2), 3);
        let popped = expr.pop_elements();
        assert_eq!(popped, Some(x));
        assert_eq!(expr, Expression::Add(vec![Expression::Const(Number::Int(2)), Expression::Const(Number::Int(3))]));
    }

    #[test]
    fn pop_elements_returns_none_when_nothing_but_constants_remain() {
        let mut expr = add(2, 3);
        assert_eq!(expr.pop_elements(), None);
    }

    #[test]
    fn group_same_expressions_collapses_repeats_into_a_coefficient() {
        let x = Expression::Var(var("x", [1]));
        let mut expr = Expression::Add(vec![x.clone(), x.clone(), x.clone()]);
        expr.group_same_expressions();
        assert_eq!(expr, Expression::Add(vec![Expression::Mul(vec![Expression::Const(Number::Int(3)), x])]));
    }

    #[test]
    fn group_same_expressions_cancels_additive_inverses() {
        let x = Expression::Var(var("x", [1]));
        let mut expr = Expression::Add(vec![x.clone(), neg(x)]);
        expr.group_same_expressions();
        assert!(expr == Expression::Add(vec![]));
    }

    #[test]
    fn group_same_expressions_cancels_after_grouping_reveals_a_pair() {
        let x = Expression::Var(var("x", [1]));
        let y = Expression::Var(var("y", [1]));
        // x + x + (-2x) + y groups to 2x + (-2x) + y, then cancels to just y.
        let mut expr = Expression::Add(vec![x.clone(), x.clone(), neg(Expression::Mul(vec![Expression::Const(Number::Int(2)), x])), y.clone()]);
        expr.group_same_expressions();
        assert_eq!(expr, Expression::Add(vec![y]));
    }

    #[test]
    fn distribute_mul_pushes_a_factor_into_a_sum() {
        let x = Expression::Var(var("x", [1]));
        let y = Expression::Var(var("y", [1]));
        let z = Expression::Var(var("z", [1]));
        let expr = Expression::Mul(vec![z.clone(), Expression::Add(vec![x.clone(), y.clone()])]);
        let distributed = expr.distribute_mul();
        assert_eq!(
            distributed,
            Expression::Add(vec![
                Expression::Mul(vec![x, z.clone()]),
                Expression::Mul(vec![y, z]),
            ])
        );
    }
}
