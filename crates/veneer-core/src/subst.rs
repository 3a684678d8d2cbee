//! Substitution engine — binds type variables across expression trees
//!
//! A pure, total, shape-preserving rewrite: bound symbols are replaced by
//! their concrete type expression, every other symbol is returned
//! unchanged, and literals are opaque (never inspected or rewritten).
//!
//! # Guarantees
//! - Idempotent under the empty binding map
//! - Never mutates its input

use std::collections::BTreeMap;

use crate::expr::Expr;

/// The transient variable → concrete-type binding for one check invocation.
///
/// Built fresh per check call; recursive composition sub-checks build their
/// own map. Never persisted.
pub type Bindings = BTreeMap<String, Expr>;

/// Apply a binding map to an expression, rebuilding compound nodes
/// shape-preserving.
pub fn substitute(expr: &Expr, bindings: &Bindings) -> Expr {
    match expr {
        Expr::Symbol(name) => match bindings.get(name) {
            Some(bound) => bound.clone(),
            None => expr.clone(),
        },
        Expr::Literal(_) => expr.clone(),
        Expr::Tuple(items) => {
            Expr::Tuple(items.iter().map(|item| substitute(item, bindings)).collect())
        }
        Expr::Apply { head, args } => Expr::Apply {
            head: Box::new(substitute(head, bindings)),
            args: args.iter().map(|arg| substitute(arg, bindings)).collect(),
        },
    }
}

/// Substitute across a slice of expressions.
pub fn substitute_all(exprs: &[Expr], bindings: &Bindings) -> Vec<Expr> {
    exprs.iter().map(|e| substitute(e, bindings)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Literal;

    fn bindings(pairs: &[(&str, Expr)]) -> Bindings {
        pairs
            .iter()
            .map(|(name, expr)| (name.to_string(), expr.clone()))
            .collect()
    }

    #[test]
    fn replaces_bound_symbols_only() {
        let map = bindings(&[("A", Expr::symbol("Int"))]);
        assert_eq!(
            substitute(&Expr::symbol("A"), &map),
            Expr::symbol("Int")
        );
        assert_eq!(
            substitute(&Expr::symbol("B"), &map),
            Expr::symbol("B")
        );
    }

    #[test]
    fn descends_into_compound_expressions() {
        let map = bindings(&[("A", Expr::symbol("Int")), ("B", Expr::symbol("Str"))]);
        let expr = Expr::Tuple(vec![
            Expr::apply("Array", vec![Expr::symbol("A")]),
            Expr::symbol("B"),
            Expr::symbol("C"),
        ]);
        assert_eq!(
            substitute(&expr, &map),
            Expr::Tuple(vec![
                Expr::apply("Array", vec![Expr::symbol("Int")]),
                Expr::symbol("Str"),
                Expr::symbol("C"),
            ])
        );
    }

    #[test]
    fn literals_are_opaque() {
        // Even a string literal spelling a bound variable's name is left
        // untouched: literals are never inspected.
        let map = bindings(&[("A", Expr::symbol("Int"))]);
        let lit = Expr::Literal(Literal::Str("A".into()));
        assert_eq!(substitute(&lit, &map), lit);
    }

    #[test]
    fn empty_map_is_identity() {
        let expr = Expr::apply(
            "Pair",
            vec![
                Expr::symbol("A"),
                Expr::Tuple(vec![Expr::Literal(Literal::Integer(1))]),
            ],
        );
        let empty = Bindings::new();
        let once = substitute(&expr, &empty);
        assert_eq!(once, expr);
        assert_eq!(substitute(&once, &empty), once);
    }

    #[test]
    fn input_is_not_consumed() {
        let map = bindings(&[("A", Expr::symbol("Int"))]);
        let expr = Expr::symbol("A");
        let _ = substitute(&expr, &map);
        assert_eq!(expr, Expr::symbol("A"));
    }

    #[test]
    fn substitutes_slices() {
        let map = bindings(&[("A", Expr::symbol("Int"))]);
        let out = substitute_all(&[Expr::symbol("A"), Expr::symbol("B")], &map);
        assert_eq!(out, vec![Expr::symbol("Int"), Expr::symbol("B")]);
    }
}
