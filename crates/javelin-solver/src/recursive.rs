use std::collections::{HashSet, VecDeque};

use javelin_graph::{SubtypingGraph, TypeNode};
use javelin_types::{
    instantiate_as_supertype, unify, ClassType, Type, TypeStore, TypeVar, UnifyOptions,
};

/// Candidate instantiations for a recursively-bounded variable.
///
/// For `T extends Comparable<T>` the admissible types are exactly those `S`
/// whose own supertype instance of `Comparable` closes the loop —
/// `Comparable<S>` and nothing else. Enumerates the bound constructor's
/// non-generic descendants and keeps the ones that unify back to themselves.
/// Results are name-sorted so a seeded caller picks reproducibly.
pub fn recursive_bound_instantiations(
    store: &TypeStore,
    graph: &SubtypingGraph,
    var: &TypeVar,
) -> Vec<Type> {
    let Some(bound) = var.bound.as_deref() else {
        return Vec::new();
    };
    let Type::Class(ClassType { def: bound_def, .. }) = bound else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    let mut queue: VecDeque<TypeNode> = VecDeque::new();
    let mut seen: HashSet<TypeNode> = HashSet::new();
    queue.push_back(TypeNode::Def(*bound_def));

    while let Some(node) = queue.pop_front() {
        if !seen.insert(node.clone()) {
            continue;
        }
        for child in graph.children_of(&node) {
            queue.push_back(child.clone());
        }

        let TypeNode::Def(def) = node else {
            continue;
        };
        let Some(decl) = store.try_def(def) else {
            continue;
        };
        // Only ground candidates can close the loop by themselves.
        if decl.is_constructor() {
            continue;
        }

        let candidate = ClassType { def, args: vec![] };
        let Some(view) = instantiate_as_supertype(store, &candidate, *bound_def) else {
            continue;
        };
        let Some(subst) = unify(store, bound, &Type::Class(view), UnifyOptions::strict()) else {
            continue;
        };
        if subst.resolve(&var.name) == Some(Type::named(def)) {
            candidates.push(Type::named(def));
        }
    }

    candidates.sort_by(|a, b| {
        let name = |t: &Type| t.def_id().map(|d| store.name(d).to_string());
        name(a).cmp(&name(b))
    });
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_loop_closing_candidates() {
        let mut store = TypeStore::with_builtins();
        let wk = store.well_known().clone();

        // class Bar implements Comparable<Bar>
        let bar = store.intern("Bar");
        store.define(
            bar,
            javelin_types::TypeDef::Classifier {
                name: "Bar".to_string(),
                supertypes: vec![Type::class(wk.comparable, vec![Type::named(bar)])],
            },
        );
        // class Baz implements Comparable<Bar> -- does not close the loop.
        store.add_classifier(
            "Baz",
            vec![Type::class(wk.comparable, vec![Type::named(bar)])],
        );

        let graph = SubtypingGraph::from_store(&store);

        // T extends Comparable<T>
        let var = TypeVar::bounded(
            "Foo.T1",
            Type::class(
                wk.comparable,
                vec![Type::Var(TypeVar::new("Foo.T1"))],
            ),
        );

        let candidates = recursive_bound_instantiations(&store, &graph, &var);
        let baz = store.lookup("Baz").unwrap();
        assert!(candidates.contains(&Type::named(bar)));
        assert!(!candidates.contains(&Type::named(baz)));
        // The builtin table's own loop-closers qualify too.
        assert!(candidates.contains(&Type::named(wk.string)));
        assert!(candidates.contains(&Type::named(wk.integer)));
    }
}
