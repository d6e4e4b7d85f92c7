use std::collections::HashMap;

use javelin_types::{Substitution, Type, TypeVar};

/// A requirement on one type variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constraint {
    /// The variable must be exactly this type.
    Equality(Type),
    /// The variable must be a subtype of this type.
    UpperBound(Type),
}

/// Per-variable constraints, keyed by canonical variable name.
pub type ConstraintSet = HashMap<String, Vec<Constraint>>;

/// Add a constraint, keeping each variable's list duplicate-free.
pub fn add_constraint(set: &mut ConstraintSet, name: &str, constraint: Constraint) {
    let entry = set.entry(name.to_string()).or_default();
    if !entry.contains(&constraint) {
        entry.push(constraint);
    }
}

/// Derive constraints for every free variable of a member's generic
/// signature from the composed bindings (target instantiation plus
/// externally supplied bindings, resolved transitively through intermediate
/// variables) and from each variable's declared bound.
pub fn collect_constraints(
    free_vars: &[TypeVar],
    prior: &Substitution,
) -> ConstraintSet {
    let mut set = ConstraintSet::new();
    for var in free_vars {
        set.entry(var.name.clone()).or_default();
        if let Some(value) = prior.resolve(&var.name) {
            let is_self = matches!(&value, Type::Var(v) if v.name == var.name);
            if !is_self {
                add_constraint(&mut set, &var.name, Constraint::Equality(value));
            }
        }
        if let Some(bound) = var.bound.as_deref() {
            add_constraint(
                &mut set,
                &var.name,
                Constraint::UpperBound(prior.apply(bound)),
            );
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use javelin_types::{TypeStore, TypeVar};

    #[test]
    fn collect_resolves_chains_and_bounds() {
        let store = TypeStore::with_builtins();
        let wk = store.well_known();

        let t1 = TypeVar::new("Foo.T1");
        let t2 = TypeVar::bounded("List.T1", Type::named(wk.number));

        // Foo.T1 -> List.T1 -> Integer: the chain resolves transitively.
        let mut prior = Substitution::new();
        prior.insert("Foo.T1", Type::Var(t2.clone()));
        prior.insert("List.T1", Type::named(wk.integer));

        let set = collect_constraints(&[t1, t2], &prior);
        assert_eq!(
            set["Foo.T1"],
            vec![Constraint::Equality(Type::named(wk.integer))]
        );
        assert_eq!(
            set["List.T1"],
            vec![
                Constraint::Equality(Type::named(wk.integer)),
                Constraint::UpperBound(Type::named(wk.number)),
            ]
        );
    }

    #[test]
    fn unbound_unconstrained_var_gets_empty_entry() {
        let set = collect_constraints(&[TypeVar::new("M.T1")], &Substitution::new());
        assert!(set["M.T1"].is_empty());
    }

    #[test]
    fn add_constraint_dedups() {
        let store = TypeStore::with_builtins();
        let wk = store.well_known();
        let mut set = ConstraintSet::new();
        add_constraint(&mut set, "X", Constraint::Equality(Type::named(wk.string)));
        add_constraint(&mut set, "X", Constraint::Equality(Type::named(wk.string)));
        assert_eq!(set["X"].len(), 1);
    }
}
