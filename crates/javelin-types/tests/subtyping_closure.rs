use javelin_types::{is_subtype, Type, TypeStore, TypeVar, UnifyOptions};

use pretty_assertions::assert_eq;

/// Nominal subtyping must agree exactly with membership in the
/// reflexive-transitive closure of declared supertypes.
#[test]
fn nominal_subtyping_matches_declared_closure() {
    let mut store = TypeStore::with_builtins();
    let object = store.well_known().object;

    // A : Object, B : A, C : B, D : Object -- a small diamond-free chain.
    let a = store.add_classifier("com.example.A", vec![Type::named(object)]);
    let b = store.add_classifier("com.example.B", vec![Type::named(a)]);
    let c = store.add_classifier("com.example.C", vec![Type::named(b)]);
    let d = store.add_classifier("com.example.D", vec![Type::named(object)]);

    let closure: &[(javelin_types::DefId, &[javelin_types::DefId])] = &[
        (a, &[a, object]),
        (b, &[b, a, object]),
        (c, &[c, b, a, object]),
        (d, &[d, object]),
    ];

    for (sub, supers) in closure {
        for candidate in [a, b, c, d, object] {
            let expected = supers.contains(&candidate);
            let got = is_subtype(&store, &Type::named(*sub), &Type::named(candidate));
            assert_eq!(
                got,
                expected,
                "is_subtype({}, {})",
                store.name(*sub),
                store.name(candidate)
            );
        }
    }
}

#[test]
fn unify_is_reflexive_with_empty_substitution() {
    let mut store = TypeStore::with_builtins();
    let wk = store.well_known().clone();
    let list = store.add_constructor(
        "List",
        vec![TypeVar::new("List.T1")],
        vec![Type::named(wk.object)],
    );

    let samples = [
        Type::named(wk.object),
        Type::class(list, vec![Type::named(wk.string)]),
        Type::class(
            list,
            vec![Type::class(list, vec![Type::Var(TypeVar::new("X.T1"))])],
        ),
    ];
    for ty in &samples {
        let subst = javelin_types::unify(&store, ty, ty, UnifyOptions::strict())
            .expect("unify(x, x) must succeed");
        assert!(subst.is_empty(), "unify(x, x) must bind nothing");
    }
}
