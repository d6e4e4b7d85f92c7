use javelin_corpus::ClassRecord;
use javelin_graph::{build_session, Member, TypeNode};
use javelin_types::{Type, TypeVar};

use pretty_assertions::assert_eq;

fn corpus() -> Vec<ClassRecord> {
    serde_json::from_str(
        r#"[
            {
                "name": "List",
                "type_parameters": ["T"],
                "methods": [
                    {"name": "toSet", "return_type": "Set<T>"},
                    {"name": "secret", "return_type": "String", "access_mod": "protected"}
                ]
            },
            {
                "name": "Set",
                "type_parameters": ["T"]
            },
            {
                "name": "ArrayList",
                "type_parameters": ["T"],
                "inherits": ["List<T>"],
                "methods": [
                    {"name": "ArrayList", "is_constructor": true}
                ]
            },
            {
                "name": "Foo",
                "methods": [
                    {
                        "name": "makeList",
                        "return_type": "List<T>",
                        "type_parameters": ["T"],
                        "is_static": true
                    },
                    {"name": "broken", "return_type": "Wot<"}
                ]
            },
            {
                "name": "Mapper",
                "functional_interface": true,
                "methods": [
                    {"name": "apply", "parameters": ["String"], "return_type": "Integer"}
                ]
            }
        ]"#,
    )
    .unwrap()
}

#[test]
fn build_wires_in_and_out_edges() {
    let (session, report) = build_session(&corpus());
    assert_eq!(report.classes, 5);
    // toSet, ArrayList ctor, makeList, apply; `secret` is protected and
    // `broken` is unparseable.
    assert_eq!(report.members, 4);
    assert_eq!(report.skipped_members, 1);
    assert_eq!(report.functional_interfaces, 1);

    let store = session.store();
    let foo = store.lookup("Foo").unwrap();
    let list = store.lookup("List").unwrap();

    let foo_members = session.api().members_of(&TypeNode::Def(foo));
    assert_eq!(foo_members.len(), 1);
    let make_list = foo_members[0];
    let Member::Method {
        name, type_params, ..
    } = session.api().member(make_list)
    else {
        panic!("expected method member");
    };
    assert_eq!(name, "makeList");
    // Method-level T gets the class-scoped canonical name.
    assert_eq!(type_params, &[TypeVar::new("Foo.T1")]);

    let out = session.api().out_edge(make_list);
    assert_eq!(
        out.ret,
        Type::class(list, vec![Type::Var(TypeVar::new("Foo.T1"))])
    );
    let binding = out.binding.as_ref().unwrap();
    assert_eq!(
        binding.get("List.T1"),
        Some(&Type::Var(TypeVar::new("Foo.T1")))
    );
}

#[test]
fn declared_inheritance_feeds_subtype_enumeration() {
    let (session, _) = build_session(&corpus());
    let store = session.store();
    let wk = store.well_known();
    let list = store.lookup("List").unwrap();
    let array_list = store.lookup("ArrayList").unwrap();

    let list_integer = Type::class(list, vec![Type::named(wk.integer)]);
    let subs = session.subtypes(&list_integer);
    assert!(subs.contains(&Type::class(array_list, vec![Type::named(wk.integer)])));
    assert!(!subs.contains(&Type::class(array_list, vec![Type::named(wk.string)])));
}

#[test]
fn functional_interface_registers_sam_shape() {
    let (mut session, _) = build_session(&corpus());
    let mapper = session.store().lookup("Mapper").unwrap();

    let shape = session
        .api()
        .functional_shape(mapper)
        .expect("Mapper must register as functional");
    let rendered = session.store().display(shape).to_string();
    assert_eq!(rendered, "(String) -> Integer");

    // A lambda of the right shape coerces; the wrong parameter type does not.
    let wk = session.store().well_known().clone();
    let f1 = session.store_mut().function_def(1, false);
    let good = Type::class(f1, vec![Type::named(wk.string), Type::named(wk.integer)]);
    let bad = Type::class(f1, vec![Type::named(wk.integer), Type::named(wk.integer)]);
    let iface = Type::named(mapper);
    assert!(session.coerce_to_functional(&iface, &good).is_some());
    assert!(session.coerce_to_functional(&iface, &bad).is_none());
}

#[test]
fn ephemeral_type_vars_are_scoped_and_versioned() {
    let (mut session, _) = build_session(&corpus());
    let number = Type::named(session.store().well_known().number);
    let vars = vec![TypeVar::bounded("Synth.T1", number)];

    let shape_before = session.subtyping().shape();
    let version_before = session.version();

    let seen_inside = session.with_ephemeral_type_vars(&vars, |session| {
        session.subtyping().contains(&TypeNode::Var("Synth.T1".to_string()))
    });
    assert!(seen_inside);
    assert!(!session
        .subtyping()
        .contains(&TypeNode::Var("Synth.T1".to_string())));
    assert_eq!(session.subtyping().shape(), shape_before);
    // Both the add and the remove bump the version, so caches keyed on it
    // can never confuse pre- and post-scope graphs.
    assert_eq!(session.version(), version_before + 2);
}
