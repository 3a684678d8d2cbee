//! End-to-end interface checks against a table-backed host oracle.

use veneer_core::{
    assert_implements, check, define, runtime_check, Error, Expr, Registry, ScopeId,
    TableOracle, TypeId,
};

fn sym(name: &str) -> Expr {
    Expr::symbol(name)
}

/// A small host world: numeric tower `Int <: Integer <: Number`, `String`,
/// `Bool`, and helpers to define interfaces bound by name in a scope.
struct Host {
    registry: Registry,
    oracle: TableOracle,
    root: ScopeId,
    number: TypeId,
    integer: TypeId,
    int: TypeId,
    string: TypeId,
    bool_ty: TypeId,
}

impl Host {
    fn new() -> Self {
        let mut oracle = TableOracle::new();
        let root = oracle.root_scope();
        let number = oracle.declare_type(root, "Number", None);
        let integer = oracle.declare_type(root, "Integer", Some(number));
        let int = oracle.declare_type(root, "Int", Some(integer));
        let string = oracle.declare_type(root, "String", None);
        let bool_ty = oracle.declare_type(root, "Bool", None);
        Host {
            registry: Registry::new(),
            oracle,
            root,
            number,
            integer,
            int,
            string,
            bool_ty,
        }
    }

    fn define(&mut self, source: &str) -> veneer_core::InterfaceId {
        self.define_in(source, self.root)
    }

    fn define_in(&mut self, source: &str, scope: ScopeId) -> veneer_core::InterfaceId {
        let id = define(&mut self.registry, source, scope).unwrap();
        let name = self.registry.get(id).unwrap().name.clone();
        self.oracle.bind_interface(scope, &name, id);
        id
    }

    fn check(&self, interface: &str, types: &[&str]) -> Result<bool, Error> {
        let types: Vec<Expr> = types.iter().map(|t| sym(t)).collect();
        check(
            &self.registry,
            &self.oracle,
            &sym(interface),
            &types,
            self.root,
        )
    }

    fn assert_implements(&self, interface: &str, types: &[&str]) -> Result<(), Error> {
        let types: Vec<Expr> = types.iter().map(|t| sym(t)).collect();
        assert_implements(
            &self.registry,
            &self.oracle,
            &sym(interface),
            &types,
            self.root,
        )
    }
}

// ── Arity ──────────────────────────────────────────────────

#[test]
fn arity_mismatch_is_false_and_raises_with_counts() {
    let mut host = Host::new();
    host.define("interface Pair(A, B) {}");

    assert!(!host.check("Pair", &["Int"]).unwrap());
    assert!(!host.check("Pair", &["Int", "Int", "Int"]).unwrap());

    let err = host.assert_implements("Pair", &["Int"]).unwrap_err();
    let text = err.to_string();
    assert!(text.contains("expects 2"), "got: {}", text);
    assert!(text.contains("got 1"), "got: {}", text);
}

// ── Idempotence ────────────────────────────────────────────

#[test]
fn repeated_checks_yield_identical_results() {
    let mut host = Host::new();
    let point = host.oracle.declare_type(host.root, "Point", None);
    host.oracle.declare_field(point, "x", host.int);
    host.define("interface Positioned(T) { T.x :: Integer  T.y :: Integer }");

    let first = host.check("Positioned", &["Point"]).unwrap();
    let second = host.check("Positioned", &["Point"]).unwrap();
    assert_eq!(first, second);
    assert!(!first);

    let first = host.assert_implements("Positioned", &["Point"]).unwrap_err();
    let second = host.assert_implements("Positioned", &["Point"]).unwrap_err();
    assert_eq!(first.to_string(), second.to_string());
}

// ── Field covariance ───────────────────────────────────────

#[test]
fn field_type_must_be_subtype_of_requirement() {
    let mut host = Host::new();
    for (name, field_ty) in [
        ("HoldsInt", host.int),
        ("HoldsInteger", host.integer),
        ("HoldsNumber", host.number),
    ] {
        let ty = host.oracle.declare_type(host.root, name, None);
        host.oracle.declare_field(ty, "count", field_ty);
    }
    host.define("interface Counted(T) { T.count :: Integer }");

    assert!(host.check("Counted", &["HoldsInt"]).unwrap());
    assert!(host.check("Counted", &["HoldsInteger"]).unwrap());
    assert!(!host.check("Counted", &["HoldsNumber"]).unwrap());
}

// ── Return-type covariance ─────────────────────────────────

#[test]
fn return_types_are_covariant() {
    let mut host = Host::new();
    let narrow = host.oracle.declare_function(host.root, "measure");
    host.oracle
        .declare_method(narrow, &[host.int], &[], Some(host.int));
    let wide = host.oracle.declare_function(host.root, "estimate");
    host.oracle
        .declare_method(wide, &[host.int], &[], Some(host.number));

    host.define("interface Measured(A) { measure(::A) -> Integer }");
    host.define("interface Estimated(A) { estimate(::A) -> Integer }");

    // Implementation returns Int, a subtype of the required Integer: pass.
    assert!(host.check("Measured", &["Int"]).unwrap());
    // Implementation returns Number, a proper supertype: fail.
    assert!(!host.check("Estimated", &["Int"]).unwrap());
}

// ── Method parameter exactness ─────────────────────────────

#[test]
fn method_existence_is_not_contravariant_in_parameters() {
    let mut host = Host::new();
    let f = host.oracle.declare_function(host.root, "absorb");
    // Accepts only Int, a strict subtype of Integer.
    host.oracle
        .declare_method(f, &[host.int], &[], Some(host.bool_ty));
    host.define("interface Absorbing(A <: Any) { absorb(::Integer) }");

    assert!(!host.check("Absorbing", &["Int"]).unwrap());
}

// ── Composition ordering ───────────────────────────────────

#[test]
fn earliest_composition_failure_is_reported() {
    let mut host = Host::new();
    host.oracle.declare_type(host.root, "Anon", None);
    host.define("interface P1(T) { T.first }");
    host.define("interface P2(T) { T.second }");
    host.define("interface C(T) { compose(P1, (T,))  compose(P2, (T,))  T.third }");

    let err = host.assert_implements("C", &["Anon"]).unwrap_err();
    let text = err.to_string();
    assert!(
        text.contains("compose(P1, (T,))"),
        "diagnostic should reference the composing clause: {}",
        text
    );
    assert!(text.contains("T.first"), "got: {}", text);
    assert!(!text.contains("P2"), "later failures must not appear: {}", text);
}

// ── Keyword existence leniency ─────────────────────────────

#[test]
fn keyword_parameters_are_checked_by_name_only() {
    let mut host = Host::new();
    // `sort` carries `by` plus an extra optional keyword.
    let generous = host.oracle.declare_function(host.root, "sort");
    host.oracle
        .declare_method(generous, &[host.int], &["by", "rev"], Some(host.int));
    // `arrange` is missing `by` entirely.
    let missing = host.oracle.declare_function(host.root, "arrange");
    host.oracle
        .declare_method(missing, &[host.int], &["rev"], Some(host.int));

    host.define("interface Sortable(A) { sort(::A; by) }");
    host.define("interface Arrangeable(A) { arrange(::A; by) }");

    assert!(host.check("Sortable", &["Int"]).unwrap());
    assert!(!host.check("Arrangeable", &["Int"]).unwrap());
}

// ── Pair scenario ──────────────────────────────────────────

#[test]
fn pair_scenario() {
    let mut host = Host::new();
    let impl_ty = host.oracle.declare_type(host.root, "Impl", None);
    let combine = host.oracle.declare_function(host.root, "combine");
    host.oracle
        .declare_method(combine, &[impl_ty, host.int], &[], Some(host.bool_ty));

    host.define("interface Pair(A, B) { combine(::A, ::B) -> Bool }");

    assert!(host.check("Pair", &["Impl", "Int"]).unwrap());
    assert!(!host.check("Pair", &["Impl", "String"]).unwrap());
}

// ── HasName scenario ───────────────────────────────────────

#[test]
fn has_name_scenario() {
    let mut host = Host::new();
    host.oracle.declare_type(host.root, "Anon", None);
    let person = host.oracle.declare_type(host.root, "Person", None);
    host.oracle.declare_field(person, "name", host.string);
    host.define("interface HasName(T) { T.name :: String }");
    host.define("interface NamedAtAll(T) { T.name }");

    assert!(host.check("HasName", &["Person"]).unwrap());
    assert!(host.check("NamedAtAll", &["Person"]).unwrap());

    // The untyped-field failure names its own category and the field.
    let err = host.assert_implements("NamedAtAll", &["Anon"]).unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with(
        "InterfaceImplementationError: Failed to implement interface 'NamedAtAll' for types 'Anon'."
    ));
    assert!(text.contains("field existence"), "got: {}", text);
    assert!(text.contains("name"), "got: {}", text);

    // The typed-field failure is the combined category.
    let err = host.assert_implements("HasName", &["Anon"]).unwrap_err();
    assert!(err.to_string().contains("field requirement failed"));
}

// ── Scoped identities ──────────────────────────────────────

#[test]
fn same_display_name_in_two_scopes_is_two_interfaces() {
    let mut host = Host::new();
    let left = host.oracle.child_scope(host.root);
    let right = host.oracle.child_scope(host.root);

    let sized = host.oracle.declare_type(host.root, "Sized", None);
    host.oracle.declare_field(sized, "len", host.int);

    // Same display name, different requirements, different scopes.
    let a = host.define_in("interface Measurable(T) { T.len }", left);
    let b = host.define_in("interface Measurable(T) { T.width }", right);
    assert_ne!(a, b);

    let types = [sym("Sized")];
    assert!(check(&host.registry, &host.oracle, &sym("Measurable"), &types, left).unwrap());
    assert!(!check(&host.registry, &host.oracle, &sym("Measurable"), &types, right).unwrap());
}

// ── Constraints and usage errors ───────────────────────────

#[test]
fn variable_bounds_are_checked_before_requirements() {
    let mut host = Host::new();
    host.define("interface Numericish(A <: Number) { missing_fn(::A) }");

    // The constraint fails first; the unresolvable method is never reached,
    // so this is a plain mismatch rather than an oracle failure.
    let err = host.assert_implements("Numericish", &["String"]).unwrap_err();
    assert!(err.to_string().contains("subtype constraint"));
}

#[test]
fn unresolvable_references_are_usage_errors_except_at_runtime() {
    let mut host = Host::new();
    host.define("interface HasName(T) { T.name }");

    assert!(matches!(
        host.check("Undefined", &["Int"]),
        Err(Error::Usage(_))
    ));
    assert!(matches!(
        host.check("HasName", &["Undefined"]),
        Err(Error::Usage(_))
    ));

    // The lenient runtime variant folds both to false.
    let types = [sym("Int")];
    assert!(!runtime_check(
        &host.registry,
        &host.oracle,
        &types,
        &sym("Undefined"),
        host.root
    ));
}

// ── Composition with substituted arguments ─────────────────

#[test]
fn composition_substitutes_type_arguments() {
    let mut host = Host::new();
    let add = host.oracle.declare_function(host.root, "add");
    host.oracle
        .declare_method(add, &[host.int, host.int], &[], Some(host.int));

    host.define("interface Addable(X, Y) { add(::X, ::Y) -> Number }");
    host.define("interface SelfAddable(T) { compose(Addable, (T, T)) }");

    assert!(host.check("SelfAddable", &["Int"]).unwrap());
    assert!(!host.check("SelfAddable", &["String"]).unwrap());
}
