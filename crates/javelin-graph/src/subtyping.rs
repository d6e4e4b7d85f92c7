use std::collections::{HashMap, HashSet};

use javelin_types::{ClassType, DefId, Substitution, Type, TypeStore, TypeVar};

/// A node of the subtyping graph: an interned definition, or a type variable
/// registered for the duration of a synthesis attempt.
///
/// `Ord` keeps candidate listings deterministic so seeded shuffles reproduce.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeNode {
    Def(DefId),
    Var(String),
}

impl TypeNode {
    /// The node a type value hangs off, if any. Parameterized types resolve
    /// to their constructor's node; wildcards have no node.
    pub fn of(ty: &Type) -> Option<TypeNode> {
        match ty {
            Type::Class(ClassType { def, .. }) | Type::Constructor(def) => {
                Some(TypeNode::Def(*def))
            }
            Type::Var(var) => Some(TypeNode::Var(var.name.clone())),
            Type::Wildcard(_) => None,
        }
    }
}

/// An upward edge: `child` is declared a subtype of `parent`.
///
/// `binding` maps the parent constructor's parameter names to expressions
/// over the child's own parameters (`ArrayList<T> : List<T>` carries
/// `List.T1 -> ArrayList.T1`); `None` for non-generic parents.
#[derive(Clone, Debug)]
pub struct SubtypeEdge {
    pub parent: TypeNode,
    pub binding: Option<Substitution>,
}

/// Declared-inheritance graph over definitions plus registered type
/// variables (a variable's single parent edge points at its bound).
#[derive(Clone, Debug, Default)]
pub struct SubtypingGraph {
    nodes: HashSet<TypeNode>,
    parents: HashMap<TypeNode, Vec<SubtypeEdge>>,
    children: HashMap<TypeNode, Vec<TypeNode>>,
    /// Declarations of registered variable nodes, by canonical name.
    var_defs: HashMap<String, TypeVar>,
}

impl SubtypingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph over every defined entry of `store`, with one edge per declared
    /// supertype carrying the parameter-mapping constraint.
    pub fn from_store(store: &TypeStore) -> Self {
        let mut graph = Self::new();
        for id in store.def_ids() {
            let Some(def) = store.try_def(id) else {
                continue;
            };
            graph.add_node(TypeNode::Def(id));
            for sup in def.supertypes() {
                let Some(parent) = TypeNode::of(sup) else {
                    continue;
                };
                let binding = supertype_binding(store, sup);
                graph.add_edge(TypeNode::Def(id), parent, binding);
            }
        }
        graph
    }

    pub fn add_node(&mut self, node: TypeNode) {
        self.nodes.insert(node);
    }

    pub fn add_edge(&mut self, child: TypeNode, parent: TypeNode, binding: Option<Substitution>) {
        self.nodes.insert(child.clone());
        self.nodes.insert(parent.clone());
        self.children
            .entry(parent.clone())
            .or_default()
            .push(child.clone());
        self.parents
            .entry(child)
            .or_default()
            .push(SubtypeEdge { parent, binding });
    }

    /// Register a type variable node with an edge to its bound (or `Object`
    /// when unbounded).
    pub fn add_var(&mut self, store: &TypeStore, var: &TypeVar) {
        let node = TypeNode::Var(var.name.clone());
        self.add_node(node.clone());
        self.var_defs.insert(var.name.clone(), var.clone());

        let bound = var
            .bound
            .as_deref()
            .cloned()
            .unwrap_or_else(|| Type::named(store.well_known().object));
        if let Some(parent) = TypeNode::of(&bound) {
            let binding = supertype_binding(store, &bound);
            self.add_edge(node, parent, binding);
        }
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, node: &TypeNode) {
        self.nodes.remove(node);
        if let TypeNode::Var(name) = node {
            self.var_defs.remove(name);
        }
        if let Some(edges) = self.parents.remove(node) {
            for edge in edges {
                if let Some(children) = self.children.get_mut(&edge.parent) {
                    children.retain(|c| c != node);
                }
            }
        }
        if let Some(children) = self.children.remove(node) {
            for child in children {
                if let Some(edges) = self.parents.get_mut(&child) {
                    edges.retain(|e| &e.parent != node);
                }
            }
        }
    }

    pub fn contains(&self, node: &TypeNode) -> bool {
        self.nodes.contains(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TypeNode> {
        self.nodes.iter()
    }

    pub fn parent_edges(&self, node: &TypeNode) -> &[SubtypeEdge] {
        self.parents.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn children_of(&self, node: &TypeNode) -> &[TypeNode] {
        self.children.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn var_def(&self, name: &str) -> Option<&TypeVar> {
        self.var_defs.get(name)
    }

    /// Registered variable nodes, in no particular order.
    pub fn vars(&self) -> impl Iterator<Item = &TypeVar> {
        self.var_defs.values()
    }

    /// Node and edge counts, used to check push/pop balance.
    pub fn shape(&self) -> (usize, usize) {
        let edges: usize = self.parents.values().map(Vec::len).sum();
        (self.nodes.len(), edges)
    }
}

/// The parameter-mapping constraint carried by an edge to `sup`: the parent
/// constructor's parameter names mapped to the declared argument expressions.
fn supertype_binding(store: &TypeStore, sup: &Type) -> Option<Substitution> {
    let Type::Class(ClassType { def, args }) = sup else {
        return None;
    };
    if args.is_empty() {
        return None;
    }
    let mut binding = Substitution::new();
    for (param, arg) in store.def(*def).params().iter().zip(args) {
        binding.insert(&param.name, arg.clone());
    }
    Some(binding)
}
