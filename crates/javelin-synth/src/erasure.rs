use javelin_graph::Parameter;
use javelin_types::{unify, Substitution, Type, TypeStore, TypeVar, UnifyOptions};

/// Where a declared type parameter occurs in a member's signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Occurrence {
    /// In the return type.
    Out,
    /// In the formal parameter at this index.
    In(usize),
}

/// A resolved call the advisor inspects.
#[derive(Clone, Copy, Debug)]
pub struct ResolvedCall<'a> {
    pub type_params: &'a [TypeVar],
    pub parameters: &'a [Parameter],
    pub return_type: &'a Type,
    pub assignment: &'a Substitution,
}

/// Occurrence positions for each declared type parameter, in declaration
/// order.
pub fn occurrences(call: &ResolvedCall<'_>) -> Vec<(String, Vec<Occurrence>)> {
    call.type_params
        .iter()
        .map(|tp| {
            let mut positions = Vec::new();
            if call.return_type.mentions_var(&tp.name) {
                positions.push(Occurrence::Out);
            }
            for (idx, param) in call.parameters.iter().enumerate() {
                if param.ty.mentions_var(&tp.name) {
                    positions.push(Occurrence::In(idx));
                }
            }
            (tp.name.clone(), positions)
        })
        .collect()
}

/// Whether the call's explicit type arguments can be elided.
///
/// A parameter is individually omittable when (a) it occurs in the return
/// type and the concrete return type unifies with the context's expected
/// type, or (b) some in-position argument's own type already pins it to the
/// resolved binding. Elision is all-or-nothing: every declared parameter
/// must be omittable.
pub fn can_elide_type_args(
    store: &TypeStore,
    call: &ResolvedCall<'_>,
    expected: Option<&Type>,
    argument_types: &[Type],
) -> bool {
    occurrences(call).iter().all(|(name, positions)| {
        positions.iter().any(|position| match position {
            Occurrence::Out => {
                let Some(expected) = expected else {
                    return false;
                };
                let concrete = call.assignment.apply(call.return_type);
                unify(store, expected, &concrete, UnifyOptions::subtyping()).is_some()
            }
            Occurrence::In(idx) => {
                let Some(arg_ty) = argument_types.get(*idx) else {
                    return false;
                };
                let declared = &call.parameters[*idx].ty;
                let Some(inferred) = unify(store, declared, arg_ty, UnifyOptions::strict()) else {
                    return false;
                };
                match (inferred.resolve(name), call.assignment.resolve(name)) {
                    (Some(pinned), Some(resolved)) => pinned == resolved,
                    _ => false,
                }
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use javelin_types::TypeStore;

    /// `<T> List<T> singleton(T value)` resolved with `T = Integer`.
    fn fixture() -> (TypeStore, TypeVar, Vec<Parameter>, Type, Substitution) {
        let mut store = TypeStore::with_builtins();
        let wk = store.well_known().clone();
        let list = store.add_constructor(
            "List",
            vec![TypeVar::new("List.T1")],
            vec![Type::named(wk.object)],
        );

        let t = TypeVar::new("Util.T1");
        let params = vec![Parameter {
            ty: Type::Var(t.clone()),
            variadic: false,
        }];
        let ret = Type::class(list, vec![Type::Var(t.clone())]);
        let mut assignment = Substitution::new();
        assignment.insert("Util.T1", Type::named(wk.integer));
        (store, t, params, ret, assignment)
    }

    #[test]
    fn classifies_in_and_out_positions() {
        let (_, t, params, ret, assignment) = fixture();
        let call = ResolvedCall {
            type_params: std::slice::from_ref(&t),
            parameters: &params,
            return_type: &ret,
            assignment: &assignment,
        };
        assert_eq!(
            occurrences(&call),
            vec![(
                "Util.T1".to_string(),
                vec![Occurrence::Out, Occurrence::In(0)]
            )]
        );
    }

    #[test]
    fn elides_when_expected_type_pins_the_return() {
        let (store, t, params, ret, assignment) = fixture();
        let wk = store.well_known();
        let list = store.lookup("List").unwrap();
        let call = ResolvedCall {
            type_params: std::slice::from_ref(&t),
            parameters: &params,
            return_type: &ret,
            assignment: &assignment,
        };

        let expected = Type::class(list, vec![Type::named(wk.integer)]);
        assert!(can_elide_type_args(&store, &call, Some(&expected), &[]));
        // No context and no pinning argument: keep the explicit arguments.
        assert!(!can_elide_type_args(&store, &call, None, &[]));
    }

    #[test]
    fn elides_when_an_argument_pins_the_variable() {
        let (store, t, params, ret, assignment) = fixture();
        let wk = store.well_known();
        let call = ResolvedCall {
            type_params: std::slice::from_ref(&t),
            parameters: &params,
            return_type: &ret,
            assignment: &assignment,
        };

        assert!(can_elide_type_args(
            &store,
            &call,
            None,
            &[Type::named(wk.integer)]
        ));
        // An argument of a different type pins the variable to the wrong
        // binding, so elision would change meaning.
        assert!(!can_elide_type_args(
            &store,
            &call,
            None,
            &[Type::named(wk.string)]
        ));
    }
}
