use std::collections::HashSet;

use javelin_types::{
    unify_with, ClassType, Substitution, Type, TypeStore, UnifyOptions, Variance,
};

use crate::subtyping::{SubtypingGraph, TypeNode};

/// Enumerate the concrete and variable subtypes of `ty`.
///
/// Type variables and raw constructors are opaque: they enumerate only
/// themselves (generic subclasses of a raw constructor are deliberately not
/// expanded). Parameterized types expand per-position admissible replacement
/// sets, take the Cartesian product, and then follow declared inheritance
/// downward, unifying each edge's parameter-mapping constraint against the
/// running assignment; an edge that fails to unify prunes everything
/// reachable only through it.
pub fn subtypes(store: &TypeStore, graph: &SubtypingGraph, ty: &Type) -> HashSet<Type> {
    let mut out = HashSet::new();
    match ty {
        Type::Var(_) | Type::Wildcard(_) | Type::Constructor(_) => {
            out.insert(ty.clone());
        }
        Type::Class(ct) if ct.args.is_empty() => {
            out.insert(ty.clone());
            descend(
                store,
                graph,
                &TypeNode::Def(ct.def),
                &Substitution::new(),
                &mut out,
            );
        }
        Type::Class(ct) => {
            let params = store.def(ct.def).params().to_vec();
            let mut position_sets: Vec<Vec<Type>> = Vec::with_capacity(ct.args.len());
            for (param, arg) in params.iter().zip(&ct.args) {
                position_sets.push(admissible_arguments(store, graph, param.variance, arg));
            }
            for combo in cartesian(&position_sets) {
                out.insert(Type::class(ct.def, combo.clone()));
                let mut seed = Substitution::new();
                for (param, arg) in params.iter().zip(&combo) {
                    seed.insert(&param.name, arg.clone());
                }
                descend(store, graph, &TypeNode::Def(ct.def), &seed, &mut out);
            }
        }
    }
    out
}

/// The replacement set for one argument position.
fn admissible_arguments(
    store: &TypeStore,
    graph: &SubtypingGraph,
    declared: Variance,
    arg: &Type,
) -> Vec<Type> {
    let object = Type::named(store.well_known().object);
    match arg {
        Type::Wildcard(w) => match w.variance {
            // An unbounded wildcard in an invariant position admits every
            // registered concrete non-generic type.
            Variance::Invariant => store
                .concrete_reference_types()
                .into_iter()
                .map(Type::named)
                .collect(),
            Variance::Covariant => {
                let bound = w.bound.as_deref().unwrap_or(&object);
                subtypes(store, graph, bound).into_iter().collect()
            }
            Variance::Contravariant => {
                let bound = w.bound.as_deref().unwrap_or(&object);
                supertypes(store, graph, bound).into_iter().collect()
            }
        },
        arg => match declared {
            Variance::Invariant => vec![arg.clone()],
            Variance::Covariant => subtypes(store, graph, arg).into_iter().collect(),
            Variance::Contravariant => supertypes(store, graph, arg).into_iter().collect(),
        },
    }
}

/// Walk declared inheritance downward from `node`, carrying the running
/// assignment. Unification failure at an edge prunes the whole branch: later
/// substitutions depend on earlier ones, so nothing below the failed edge
/// can be consistent.
fn descend(
    store: &TypeStore,
    graph: &SubtypingGraph,
    node: &TypeNode,
    assignment: &Substitution,
    out: &mut HashSet<Type>,
) {
    for child in graph.children_of(node) {
        let Some(edge) = graph
            .parent_edges(child)
            .iter()
            .find(|e| &e.parent == node)
        else {
            continue;
        };

        let mut child_assignment = Substitution::new();
        let mut consistent = true;
        if let Some(binding) = &edge.binding {
            for (parent_param, expr) in binding.iter() {
                let Some(value) = assignment.resolve(parent_param) else {
                    continue;
                };
                if !unify_with(
                    store,
                    expr,
                    &value,
                    UnifyOptions::strict(),
                    &mut child_assignment,
                ) {
                    consistent = false;
                    break;
                }
            }
        }
        if !consistent {
            continue;
        }

        let Some(instance) = node_instance(store, graph, child, &child_assignment) else {
            continue;
        };
        if out.insert(instance) {
            descend(store, graph, child, &child_assignment, out);
        }
    }
}

/// Supertypes of `ty`, substituting already-known bindings forward into each
/// supertype's argument expressions. The upward direction is structurally
/// consistent, so there is no pruning.
pub fn supertypes(store: &TypeStore, graph: &SubtypingGraph, ty: &Type) -> HashSet<Type> {
    let mut out = HashSet::new();
    out.insert(ty.clone());
    match ty {
        Type::Class(ClassType { def, args }) => {
            let mut seed = Substitution::new();
            for (param, arg) in store.def(*def).params().iter().zip(args) {
                seed.insert(&param.name, arg.clone());
            }
            ascend(store, graph, &TypeNode::Def(*def), &seed, &mut out);
        }
        Type::Constructor(def) => {
            ascend(
                store,
                graph,
                &TypeNode::Def(*def),
                &Substitution::new(),
                &mut out,
            );
        }
        Type::Var(var) => {
            let node = TypeNode::Var(var.name.clone());
            if graph.contains(&node) {
                ascend(store, graph, &node, &Substitution::new(), &mut out);
            } else if let Some(bound) = var.bound.as_deref() {
                out.extend(supertypes(store, graph, bound));
            } else {
                out.insert(Type::named(store.well_known().object));
            }
        }
        Type::Wildcard(_) => {}
    }
    out
}

fn ascend(
    store: &TypeStore,
    graph: &SubtypingGraph,
    node: &TypeNode,
    assignment: &Substitution,
    out: &mut HashSet<Type>,
) {
    for edge in graph.parent_edges(node) {
        let mut parent_assignment = Substitution::new();
        if let Some(binding) = &edge.binding {
            for (parent_param, expr) in binding.iter() {
                parent_assignment.insert(parent_param, assignment.apply(expr));
            }
        }
        let Some(instance) = node_instance(store, graph, &edge.parent, &parent_assignment) else {
            continue;
        };
        if out.insert(instance) {
            ascend(store, graph, &edge.parent, &parent_assignment, out);
        }
    }
}

/// The type a visited node denotes under `assignment`; still-free parameters
/// of a generic node are re-instantiated as the node's own variables.
fn node_instance(
    store: &TypeStore,
    graph: &SubtypingGraph,
    node: &TypeNode,
    assignment: &Substitution,
) -> Option<Type> {
    match node {
        TypeNode::Def(def) => {
            let decl = store.try_def(*def)?;
            if decl.is_constructor() {
                let args = decl
                    .params()
                    .iter()
                    .map(|p| {
                        assignment
                            .resolve(&p.name)
                            .unwrap_or_else(|| Type::Var(p.clone()))
                    })
                    .collect();
                Some(Type::class(*def, args))
            } else {
                Some(Type::named(*def))
            }
        }
        TypeNode::Var(name) => graph.var_def(name).map(|v| Type::Var(v.clone())),
    }
}

fn cartesian(sets: &[Vec<Type>]) -> Vec<Vec<Type>> {
    let mut combos: Vec<Vec<Type>> = vec![Vec::new()];
    for set in sets {
        let mut next = Vec::with_capacity(combos.len().saturating_mul(set.len()));
        for combo in &combos {
            for item in set {
                let mut extended = combo.clone();
                extended.push(item.clone());
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

#[cfg(test)]
mod tests {
    use super::*;
    use javelin_types::{TypeStore, TypeVar, WildcardType};

    /// `class G<T>` with `class F<T> extends G<T>` and a conflicting
    /// `class H extends G<String>`.
    fn fixture() -> (TypeStore, SubtypingGraph) {
        let mut store = TypeStore::with_builtins();
        let object = store.well_known().object;

        let g = store.add_constructor(
            "G",
            vec![TypeVar::new("G.T1")],
            vec![Type::named(object)],
        );
        store.add_constructor(
            "F",
            vec![TypeVar::new("F.T1")],
            vec![Type::class(g, vec![Type::Var(TypeVar::new("F.T1"))])],
        );
        store.add_classifier("H", vec![Type::class(g, vec![Type::named(store.well_known().string)])]);

        let graph = SubtypingGraph::from_store(&store);
        (store, graph)
    }

    #[test]
    fn parameterized_subtypes_propagate_arguments() {
        let (store, graph) = fixture();
        let wk = store.well_known();
        let g = store.lookup("G").unwrap();
        let f = store.lookup("F").unwrap();

        let g_integer = Type::class(g, vec![Type::named(wk.integer)]);
        let subs = subtypes(&store, &graph, &g_integer);

        assert!(subs.contains(&g_integer));
        assert!(subs.contains(&Type::class(f, vec![Type::named(wk.integer)])));
        assert!(!subs.contains(&Type::class(f, vec![Type::named(wk.string)])));
        // H extends G<String>, which conflicts with G<Integer>: pruned.
        let h = store.lookup("H").unwrap();
        assert!(!subs.contains(&Type::named(h)));
    }

    #[test]
    fn conflicting_inheritance_survives_for_matching_arguments() {
        let (store, graph) = fixture();
        let wk = store.well_known();
        let g = store.lookup("G").unwrap();
        let h = store.lookup("H").unwrap();

        let g_string = Type::class(g, vec![Type::named(wk.string)]);
        let subs = subtypes(&store, &graph, &g_string);
        assert!(subs.contains(&Type::named(h)));
    }

    #[test]
    fn raw_constructor_is_opaque() {
        let (store, graph) = fixture();
        let g = store.lookup("G").unwrap();
        let subs = subtypes(&store, &graph, &Type::Constructor(g));
        assert_eq!(subs.len(), 1);
        assert!(subs.contains(&Type::Constructor(g)));
    }

    #[test]
    fn covariant_wildcard_position_expands_to_bound_subtypes() {
        let (store, graph) = fixture();
        let wk = store.well_known();
        let g = store.lookup("G").unwrap();

        let g_extends_number = Type::class(
            g,
            vec![Type::Wildcard(WildcardType::extends(Type::named(wk.number)))],
        );
        let subs = subtypes(&store, &graph, &g_extends_number);
        assert!(subs.contains(&Type::class(g, vec![Type::named(wk.integer)])));
        assert!(subs.contains(&Type::class(g, vec![Type::named(wk.number)])));
        assert!(!subs.contains(&Type::class(g, vec![Type::named(wk.string)])));
    }

    #[test]
    fn supertypes_substitute_bindings_forward() {
        let (store, graph) = fixture();
        let wk = store.well_known();
        let g = store.lookup("G").unwrap();
        let f = store.lookup("F").unwrap();

        let f_integer = Type::class(f, vec![Type::named(wk.integer)]);
        let sups = supertypes(&store, &graph, &f_integer);
        assert!(sups.contains(&f_integer));
        assert!(sups.contains(&Type::class(g, vec![Type::named(wk.integer)])));
        assert!(sups.contains(&Type::named(wk.object)));
    }

    #[test]
    fn registered_var_supertypes_walk_through_bound() {
        let (store, mut graph) = fixture();
        let wk = store.well_known().clone();
        let g = store.lookup("G").unwrap();

        let var = TypeVar::bounded(
            "M.T1",
            Type::class(g, vec![Type::named(wk.integer)]),
        );
        graph.add_var(&store, &var);

        let sups = supertypes(&store, &graph, &Type::Var(var.clone()));
        assert!(sups.contains(&Type::Var(var)));
        assert!(sups.contains(&Type::class(g, vec![Type::named(wk.integer)])));
        assert!(sups.contains(&Type::named(wk.object)));
    }
}
