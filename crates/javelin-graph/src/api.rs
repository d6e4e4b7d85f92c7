use std::collections::HashMap;

use javelin_types::{ClassType, DefId, Substitution, Type, TypeStore, TypeVar};

use crate::subtyping::TypeNode;

/// Index of a member in the API graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MemberId(u32);

impl MemberId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    pub ty: Type,
    pub variadic: bool,
}

/// A member reachable through the API graph. `Variable` is an ephemeral
/// in-scope value the external generator injects; the builder never creates
/// one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Member {
    Field {
        name: String,
        class_name: String,
    },
    Method {
        name: String,
        class_name: String,
        parameters: Vec<Parameter>,
        type_params: Vec<TypeVar>,
        is_static: bool,
    },
    Ctor {
        class_name: String,
        parameters: Vec<Parameter>,
    },
    Variable {
        name: String,
    },
}

impl Member {
    /// Display name: the member's own name, or the class name for
    /// constructors.
    pub fn name(&self) -> &str {
        match self {
            Member::Field { name, .. }
            | Member::Method { name, .. }
            | Member::Variable { name } => name,
            Member::Ctor { class_name, .. } => class_name,
        }
    }

    pub fn parameters(&self) -> &[Parameter] {
        match self {
            Member::Method { parameters, .. } | Member::Ctor { parameters, .. } => parameters,
            Member::Field { .. } | Member::Variable { .. } => &[],
        }
    }

    /// Fresh type parameters this member declares (method-level generics).
    pub fn type_params(&self) -> &[TypeVar] {
        match self {
            Member::Method { type_params, .. } => type_params,
            _ => &[],
        }
    }
}

/// The OUT edge of a member: its return type, plus the constraint capturing
/// how the return constructor's parameters depend on the member's (and
/// receiver's) own parameters.
#[derive(Clone, Debug)]
pub struct OutEdge {
    pub ret: Type,
    pub binding: Option<Substitution>,
}

impl OutEdge {
    /// Derive the constraint from a declared return type: `List<M.T1>`
    /// yields `List.T1 -> M.T1`.
    pub fn from_return_type(store: &TypeStore, ret: Type) -> OutEdge {
        let binding = match &ret {
            Type::Class(ClassType { def, args }) if !args.is_empty() => {
                let params = store.try_def(*def).map(|d| d.params()).unwrap_or(&[]);
                let mut binding = Substitution::new();
                for (param, arg) in params.iter().zip(args) {
                    binding.insert(&param.name, arg.clone());
                }
                (!binding.is_empty()).then_some(binding)
            }
            _ => None,
        };
        OutEdge { ret, binding }
    }
}

/// Type/member graph: IN edges from receiver nodes to members, one OUT edge
/// per member to its return type.
///
/// A member is only ever added with both edges at once; an IN edge without a
/// matching OUT edge cannot be represented, which turns that invariant from
/// a runtime check into a structural fact.
#[derive(Clone, Debug, Default)]
pub struct ApiGraph {
    members: Vec<Member>,
    receivers: Vec<TypeNode>,
    out_edges: Vec<OutEdge>,
    in_edges: HashMap<TypeNode, Vec<MemberId>>,
    /// Single-abstract-method interfaces, keyed by class node, valued by the
    /// equivalent function-type instantiation.
    functional: HashMap<DefId, Type>,
}

impl ApiGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&mut self, member: Member, receiver: TypeNode, out: OutEdge) -> MemberId {
        let id = MemberId(u32::try_from(self.members.len()).expect("api graph overflow"));
        self.members.push(member);
        self.receivers.push(receiver.clone());
        self.out_edges.push(out);
        self.in_edges.entry(receiver).or_default().push(id);
        id
    }

    pub fn member(&self, id: MemberId) -> &Member {
        &self.members[id.index()]
    }

    pub fn receiver(&self, id: MemberId) -> &TypeNode {
        &self.receivers[id.index()]
    }

    pub fn out_edge(&self, id: MemberId) -> &OutEdge {
        &self.out_edges[id.index()]
    }

    /// Members whose IN edge originates at `node`.
    pub fn members_of(&self, node: &TypeNode) -> &[MemberId] {
        self.in_edges.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn member_ids(&self) -> impl Iterator<Item = MemberId> {
        (0..self.members.len() as u32).map(MemberId)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn register_functional(&mut self, def: DefId, shape: Type) {
        self.functional.insert(def, shape);
    }

    /// The function-type shape of a registered SAM interface.
    pub fn functional_shape(&self, def: DefId) -> Option<&Type> {
        self.functional.get(&def)
    }

    pub fn functional_interfaces(&self) -> impl Iterator<Item = (&DefId, &Type)> {
        self.functional.iter()
    }
}
