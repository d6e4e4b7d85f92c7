use javelin_corpus::ClassRecord;
use javelin_graph::{build_session, Member, TypeNode};
use javelin_solver::{add_constraint, Constraint, ConstraintSet};
use javelin_synth::{encode_api_components, PathFinder, SelectionMode};
use javelin_types::{Type, TypeVar};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn corpus() -> Vec<ClassRecord> {
    serde_json::from_str(
        r#"[
            {
                "name": "List",
                "type_parameters": ["T"],
                "methods": [
                    {"name": "toSet", "return_type": "Set<T>"}
                ]
            },
            {
                "name": "Set",
                "type_parameters": ["T"]
            },
            {
                "name": "Foo",
                "methods": [
                    {
                        "name": "makeList",
                        "return_type": "List<T>",
                        "type_parameters": ["T"],
                        "is_static": true
                    }
                ]
            }
        ]"#,
    )
    .unwrap()
}

#[test]
fn finds_chain_and_unifies_bindings_across_members() {
    let (mut session, _) = build_session(&corpus());
    let store = session.store();
    let wk = store.well_known().clone();
    let set = store.lookup("Set").unwrap();
    let foo = store.lookup("Foo").unwrap();

    let target = Type::class(set, vec![Type::named(wk.integer)]);
    let mut finder = PathFinder::new();
    let mut rng = StdRng::seed_from_u64(11);

    let path = finder
        .find_api_path(
            &mut session,
            &target,
            &ConstraintSet::new(),
            SelectionMode::Concrete,
            false,
            &mut rng,
        )
        .expect("Set<Integer> must be reachable via Foo.makeList().toSet()");

    assert_eq!(path.source, TypeNode::Def(foo));
    let names: Vec<&str> = path
        .steps
        .iter()
        .map(|&id| session.api().member(id).name())
        .collect();
    assert_eq!(names, vec!["makeList", "toSet"]);

    // One binding unifies the whole chain down to the target argument.
    for var in ["Foo.T1", "List.T1", "Set.T1"] {
        assert_eq!(
            path.assignment.resolve(var),
            Some(Type::named(wk.integer)),
            "binding for {var}"
        );
    }

    // The attempt's ephemeral registration was popped again.
    assert!(!session
        .subtyping()
        .contains(&TypeNode::Var("Foo.T1".to_string())));
}

#[test]
fn unreachable_target_returns_no_path() {
    let (mut session, _) = build_session(&corpus());
    let string = Type::named(session.store().well_known().string);
    let mut finder = PathFinder::new();
    let mut rng = StdRng::seed_from_u64(11);

    assert!(finder
        .find_api_path(
            &mut session,
            &string,
            &ConstraintSet::new(),
            SelectionMode::Concrete,
            false,
            &mut rng,
        )
        .is_none());
}

#[test]
fn conflicting_prior_constraints_feed_infeasible_mode() {
    let (mut session, _) = build_session(&corpus());
    let wk = session.store().well_known().clone();
    let set = session.store().lookup("Set").unwrap();

    let target = Type::class(set, vec![Type::named(wk.integer)]);

    // The caller pins Set.T1 to String while the target demands Integer.
    let mut prior = ConstraintSet::new();
    add_constraint(
        &mut prior,
        "Set.T1",
        Constraint::Equality(Type::named(wk.string)),
    );

    let mut finder = PathFinder::new();
    let mut rng = StdRng::seed_from_u64(5);

    // Normal mode refuses the conflicting assignment entirely.
    assert!(finder
        .find_api_path(
            &mut session,
            &target,
            &prior,
            SelectionMode::Concrete,
            false,
            &mut rng,
        )
        .is_none());

    // Infeasible mode wants exactly this: an unsatisfiable path, solved
    // best-effort, with the violated binding named.
    let path = finder
        .find_api_path(
            &mut session,
            &target,
            &prior,
            SelectionMode::Concrete,
            true,
            &mut rng,
        )
        .expect("conflicting constraints make the path deliberately wrong");
    assert_eq!(path.violated.as_deref(), Some("Set.T1"));
}

#[test]
fn abstract_mode_targets_registered_compatible_vars() {
    let (mut session, _) = build_session(&corpus());
    let wk = session.store().well_known().clone();
    let list = session.store().lookup("List").unwrap();

    // The external generator has an enclosing `X extends Object` in scope
    // whose value some member produces (makeList returns List<Foo.T1>, so
    // only a List-shaped variable is reachable).
    let var = TypeVar::bounded(
        "Outer.X1",
        Type::class(list, vec![Type::named(wk.integer)]),
    );
    session.add_type_vars(std::slice::from_ref(&var));

    let mut finder = PathFinder::new();
    let mut rng = StdRng::seed_from_u64(23);

    let target = Type::class(list, vec![Type::named(wk.integer)]);
    let path = finder.find_api_path(
        &mut session,
        &target,
        &ConstraintSet::new(),
        SelectionMode::All,
        false,
        &mut rng,
    );
    session.remove_type_vars(std::slice::from_ref(&var));

    let path = path.expect("concrete List node is reachable in All mode");
    assert_eq!(
        session.api().member(*path.steps.last().unwrap()).name(),
        "makeList"
    );
}

#[test]
fn encode_produces_admissible_type_sets() {
    let (mut session, _) = build_session(&corpus());
    let wk = session.store().well_known().clone();
    let set = session.store().lookup("Set").unwrap();

    let target = Type::class(set, vec![Type::named(wk.integer)]);
    let mut finder = PathFinder::new();
    let mut rng = StdRng::seed_from_u64(11);
    let path = finder
        .find_api_path(
            &mut session,
            &target,
            &ConstraintSet::new(),
            SelectionMode::Concrete,
            false,
            &mut rng,
        )
        .unwrap();

    let last = *path.steps.last().unwrap();
    let components = encode_api_components(&session, last, &path.assignment);

    let Member::Method { name, .. } = session.api().member(components.member) else {
        panic!("expected method");
    };
    assert_eq!(name, "toSet");
    // The produced Set<Integer> satisfies every supertype of itself.
    assert!(components.return_types.contains(&target));
    assert!(components
        .return_types
        .contains(&Type::named(wk.object)));
    // The receiver accepts List<Integer> (and any of its subtypes).
    let list = session.store().lookup("List").unwrap();
    assert!(components
        .receiver_types
        .contains(&Type::class(list, vec![Type::named(wk.integer)])));
}

#[test]
fn same_seed_reproduces_the_same_path() {
    let run = |seed: u64| {
        let (mut session, _) = build_session(&corpus());
        let wk = session.store().well_known().clone();
        let set = session.store().lookup("Set").unwrap();
        let target = Type::class(set, vec![Type::named(wk.integer)]);
        let mut finder = PathFinder::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let path = finder
            .find_api_path(
                &mut session,
                &target,
                &ConstraintSet::new(),
                SelectionMode::Concrete,
                false,
                &mut rng,
            )
            .unwrap();
        path.steps
            .iter()
            .map(|&id| session.api().member(id).name().to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(run(99), run(99));
}
