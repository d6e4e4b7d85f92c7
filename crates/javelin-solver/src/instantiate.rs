use javelin_graph::SubtypingGraph;
use javelin_types::{is_subtype, ClassType, Substitution, Type, TypeStore, TypeVar};
use rand::Rng;
use rand::RngCore;

use crate::constraint::{Constraint, ConstraintSet};
use crate::recursive::recursive_bound_instantiations;

/// A resolved set of bindings, plus the variable whose constraint was
/// deliberately violated when the caller asked for an infeasible assignment.
#[derive(Clone, Debug)]
pub struct Assignment {
    pub bindings: Substitution,
    pub violated: Option<String>,
}

/// Pick a concrete binding for every variable, honoring `constraints`.
///
/// Per variable: two or more distinct `Equality` constraints is
/// unsatisfiable — unless `respect_constraints` is `false`, in which case one
/// is picked arbitrarily and the violation recorded (fault-injection mode).
/// One `Equality` beats any `UpperBound`; a sole `UpperBound` is used
/// directly; an unconstrained variable draws a uniformly random concrete (or
/// constructor-shaped) type from the registry through the caller's seeded
/// `rng`. Recursively-bounded variables route to
/// [`recursive_bound_instantiations`]. A primitive that cannot be boxed
/// invalidates the assignment.
pub fn instantiate_type_vars(
    store: &TypeStore,
    graph: &SubtypingGraph,
    vars: &[TypeVar],
    constraints: &ConstraintSet,
    prior: &Substitution,
    respect_constraints: bool,
    rng: &mut dyn RngCore,
) -> Option<Assignment> {
    let mut bindings = prior.clone();
    let mut violated = None;

    for var in vars {
        let empty = Vec::new();
        let var_constraints = constraints.get(&var.name).unwrap_or(&empty);

        let mut equalities: Vec<Type> = Vec::new();
        let mut uppers: Vec<Type> = Vec::new();
        for constraint in var_constraints {
            match constraint {
                Constraint::Equality(ty) => {
                    let ty = boxed_form(store, &bindings.apply(ty))?;
                    if !equalities.contains(&ty) {
                        equalities.push(ty);
                    }
                }
                Constraint::UpperBound(ty) => uppers.push(bindings.apply(ty)),
            }
        }

        let value = if equalities.len() >= 2 {
            if respect_constraints {
                tracing::debug!(var = %var.name, "conflicting equality constraints");
                return None;
            }
            violated = Some(var.name.clone());
            equalities.swap_remove(0)
        } else if let Some(eq) = equalities.pop() {
            eq
        } else if is_recursively_bounded(var) {
            let candidates = recursive_bound_instantiations(store, graph, var);
            if candidates.is_empty() {
                return None;
            }
            candidates[rng.gen_range(0..candidates.len())].clone()
        } else if let Some(upper) = uppers.first() {
            // An upper bound with no equality is used directly.
            boxed_form(store, upper)?
        } else {
            random_reference_type(store, rng)
        };

        if respect_constraints && !satisfies_uppers(store, &bindings, &value, &uppers) {
            return None;
        }
        bindings.insert(&var.name, value);
    }

    Some(Assignment { bindings, violated })
}

fn is_recursively_bounded(var: &TypeVar) -> bool {
    var.bound
        .as_deref()
        .is_some_and(|b| b.mentions_var(&var.name))
}

/// Type variables range over reference types: a primitive binding is lifted
/// to its boxed counterpart, and a primitive with none (e.g. `void`) makes
/// the assignment invalid.
fn boxed_form(store: &TypeStore, ty: &Type) -> Option<Type> {
    match ty {
        Type::Class(ClassType { def, args }) if args.is_empty() && store.is_primitive(*def) => {
            store.boxed(*def).map(Type::named)
        }
        _ => Some(ty.clone()),
    }
}

fn satisfies_uppers(
    store: &TypeStore,
    bindings: &Substitution,
    value: &Type,
    uppers: &[Type],
) -> bool {
    uppers.iter().all(|upper| {
        let upper = bindings.apply(upper);
        if !value.is_ground() || !upper.is_ground() {
            // Bounds still mentioning free variables are checked once the
            // chain resolves; nothing to decide yet.
            return true;
        }
        value == &upper || is_subtype(store, value, &upper)
    })
}

/// A uniformly random concrete type from the registry: usually a plain
/// reference type, occasionally a constructor instantiated with random
/// reference arguments.
pub fn random_reference_type(store: &TypeStore, rng: &mut dyn RngCore) -> Type {
    let refs = store.concrete_reference_types();
    let constructors = store.constructor_defs();

    if !constructors.is_empty() && rng.gen_range(0..4) == 0 {
        let def = constructors[rng.gen_range(0..constructors.len())];
        let args = store
            .def(def)
            .params()
            .iter()
            .map(|_| Type::named(refs[rng.gen_range(0..refs.len())]))
            .collect();
        return Type::class(def, args);
    }
    Type::named(refs[rng.gen_range(0..refs.len())])
}
