use std::collections::HashSet;

use javelin_graph::{ApiSession, MemberId, TypeNode};
use javelin_types::{Substitution, Type, TypeVar};

/// A matched member encoded as the admissible type sets the external program
/// generator consumes: every receiver typing that can invoke it, every
/// argument typing per parameter, every typing the produced value satisfies,
/// plus the variable map and the fresh parameters the caller must scope.
#[derive(Clone, Debug)]
pub struct ApiComponents {
    pub member: MemberId,
    pub receiver_types: HashSet<Type>,
    pub parameter_types: Vec<HashSet<Type>>,
    pub return_types: HashSet<Type>,
    pub type_var_map: Substitution,
    pub ephemeral_type_params: Vec<TypeVar>,
}

/// Encode one resolved member under `assignment`.
///
/// Receivers and arguments accept subtypes of their declared typing; the
/// returned value satisfies every supertype of its concrete typing.
pub fn encode_api_components(
    session: &ApiSession,
    member: MemberId,
    assignment: &Substitution,
) -> ApiComponents {
    let api = session.api();
    let store = session.store();

    let receiver = match api.receiver(member) {
        TypeNode::Def(def) => {
            let decl = store.def(*def);
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
                Type::class(*def, args)
            } else {
                Type::named(*def)
            }
        }
        TypeNode::Var(name) => Type::Var(TypeVar::new(name.clone())),
    };

    let parameter_types = api
        .member(member)
        .parameters()
        .iter()
        .map(|p| session.subtypes(&assignment.apply(&p.ty)))
        .collect();

    ApiComponents {
        member,
        receiver_types: session.subtypes(&receiver),
        parameter_types,
        return_types: session.supertypes(&assignment.apply(&api.out_edge(member).ret)),
        type_var_map: assignment.clone(),
        ephemeral_type_params: api.member(member).type_params().to_vec(),
    }
}
