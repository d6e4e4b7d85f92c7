use std::cmp::Reverse;
use std::collections::{HashMap, HashSet, VecDeque};

use javelin_graph::{ApiSession, MemberId, TypeNode};
use javelin_solver::{
    add_constraint, collect_constraints, instantiate_type_vars, Constraint, ConstraintSet,
};
use javelin_types::{
    unify, unify_with, ClassType, Substitution, Type, TypeStore, TypeVar, UnifyOptions, Variance,
};
use rand::seq::SliceRandom;
use rand::RngCore;

/// Which graph nodes may serve as the synthesis target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionMode {
    /// Only the exact constructor/classifier node of the origin type.
    Concrete,
    /// Only registered type variables with a compatible bound.
    Abstract,
    /// Both.
    All,
}

/// A realized call chain plus the assignment that makes it well-typed.
#[derive(Clone, Debug)]
pub struct ApiPath {
    pub source: TypeNode,
    pub target_node: TypeNode,
    pub steps: Vec<MemberId>,
    pub assignment: Substitution,
    /// In infeasible mode, the variable whose constraint was deliberately
    /// broken.
    pub violated: Option<String>,
    /// Fresh member-level type parameters the attempt registered (already
    /// removed again by the time the path is returned).
    pub ephemeral: Vec<TypeVar>,
}

/// Type-level projection of the API graph: receiver node -> (member, return
/// node) edges, rebuilt whenever the session version moves.
#[derive(Debug, Default)]
struct Projection {
    version: u64,
    edges: HashMap<TypeNode, Vec<(MemberId, TypeNode)>>,
    reverse: HashMap<TypeNode, Vec<TypeNode>>,
    /// Nodes with no incoming return edge (self-loops ignored), sorted for
    /// deterministic iteration under a seeded shuffle.
    zero_indegree: Vec<TypeNode>,
}

impl Projection {
    fn build(session: &ApiSession) -> Projection {
        let api = session.api();
        let mut edges: HashMap<TypeNode, Vec<(MemberId, TypeNode)>> = HashMap::new();
        let mut reverse: HashMap<TypeNode, Vec<TypeNode>> = HashMap::new();
        let mut nodes: HashSet<TypeNode> = HashSet::new();
        let mut has_incoming: HashSet<TypeNode> = HashSet::new();

        for id in api.member_ids() {
            let receiver = api.receiver(id).clone();
            let Some(ret) = TypeNode::of(&api.out_edge(id).ret) else {
                continue;
            };
            nodes.insert(receiver.clone());
            nodes.insert(ret.clone());
            if ret != receiver {
                has_incoming.insert(ret.clone());
            }
            reverse.entry(ret.clone()).or_default().push(receiver.clone());
            edges.entry(receiver).or_default().push((id, ret));
        }

        let mut zero_indegree: Vec<TypeNode> = nodes
            .iter()
            .filter(|n| !has_incoming.contains(n))
            .cloned()
            .collect();
        zero_indegree.sort();

        Projection {
            version: session.version(),
            edges,
            reverse,
            zero_indegree,
        }
    }

    /// All simple paths (no repeated type node) from `source` to `target`.
    fn simple_paths(&self, source: &TypeNode, target: &TypeNode) -> Vec<Vec<MemberId>> {
        let mut out = Vec::new();
        let mut visited = vec![source.clone()];
        let mut path = Vec::new();
        self.dfs(source, target, &mut visited, &mut path, &mut out);
        out
    }

    fn dfs(
        &self,
        node: &TypeNode,
        target: &TypeNode,
        visited: &mut Vec<TypeNode>,
        path: &mut Vec<MemberId>,
        out: &mut Vec<Vec<MemberId>>,
    ) {
        let Some(edges) = self.edges.get(node) else {
            return;
        };
        for (member, next) in edges {
            if next == target {
                let mut found = path.clone();
                found.push(*member);
                out.push(found);
                continue;
            }
            if visited.contains(next) {
                continue;
            }
            visited.push(next.clone());
            path.push(*member);
            self.dfs(next, target, visited, path, out);
            path.pop();
            visited.pop();
        }
    }
}

/// The path-finding engine. Owns the per-target ancestor cache, keyed by
/// `(target node, graph version)` so `add_type_vars`/`remove_type_vars`
/// can never leak stale sources into a later query.
#[derive(Debug, Default)]
pub struct PathFinder {
    projection: Option<Projection>,
    ancestors: HashMap<(TypeNode, u64), Vec<TypeNode>>,
}

impl PathFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a call chain realizing `target` under `prior` constraints.
    ///
    /// Sources are shuffled per call through the caller's seeded `rng`;
    /// candidate paths are tried longest-first with random tie order. In
    /// `want_infeasible` mode the search instead looks for a path whose
    /// constraints are unsatisfiable, then resolves a best-effort assignment
    /// with the violated binding recorded.
    pub fn find_api_path(
        &mut self,
        session: &mut ApiSession,
        target: &Type,
        prior: &ConstraintSet,
        mode: SelectionMode,
        want_infeasible: bool,
        rng: &mut dyn RngCore,
    ) -> Option<ApiPath> {
        let mut hint = Substitution::new();
        let concrete = match target {
            Type::Class(ClassType { def, .. }) => Some(TypeNode::Def(*def)),
            Type::Constructor(def) => Some(TypeNode::Def(*def)),
            Type::Var(var) => {
                hint.insert(&var.name, var_hint(session, var));
                Some(TypeNode::Var(var.name.clone()))
            }
            // A wildcard is never a standalone target.
            Type::Wildcard(_) => return None,
        };

        let mut candidates: Vec<TypeNode> = Vec::new();
        if matches!(mode, SelectionMode::Concrete | SelectionMode::All) {
            candidates.extend(concrete);
        }
        if matches!(mode, SelectionMode::Abstract | SelectionMode::All) {
            let mut abstracts: Vec<TypeNode> = session
                .subtyping()
                .vars()
                .filter(|var| bound_admits(session, var, target))
                .map(|var| TypeNode::Var(var.name.clone()))
                .collect();
            abstracts.sort();
            for node in abstracts {
                if !candidates.contains(&node) {
                    candidates.push(node);
                }
            }
        }

        for target_node in candidates {
            let mut sources = self.sources_for(session, &target_node);
            sources.shuffle(rng);

            for source in sources {
                let mut paths = {
                    let projection = self.projection(session);
                    projection.simple_paths(&source, &target_node)
                };
                // Longest-first, random order among equal lengths.
                paths.shuffle(rng);
                paths.sort_by_key(|p| Reverse(p.len()));

                for steps in paths {
                    let attempt = attempt_path(
                        session,
                        &steps,
                        target,
                        prior,
                        want_infeasible,
                        &hint,
                        rng,
                    );
                    if let Some((assignment, violated, ephemeral)) = attempt {
                        tracing::debug!(
                            steps = steps.len(),
                            infeasible = want_infeasible,
                            "resolved api path"
                        );
                        return Some(ApiPath {
                            source,
                            target_node,
                            steps,
                            assignment,
                            violated,
                            ephemeral,
                        });
                    }
                }
            }
        }
        None
    }

    fn projection(&mut self, session: &ApiSession) -> &Projection {
        let stale = self
            .projection
            .as_ref()
            .map_or(true, |p| p.version != session.version());
        if stale {
            self.projection = Some(Projection::build(session));
        }
        self.projection.as_ref().expect("projection just built")
    }

    /// Zero-indegree ancestors able to reach `target`, memoized per
    /// `(target, version)`.
    fn sources_for(&mut self, session: &ApiSession, target: &TypeNode) -> Vec<TypeNode> {
        let key = (target.clone(), session.version());
        if let Some(cached) = self.ancestors.get(&key) {
            return cached.clone();
        }

        let projection = self.projection(session);
        let mut reachable: HashSet<TypeNode> = HashSet::new();
        let mut queue: VecDeque<TypeNode> = VecDeque::new();
        reachable.insert(target.clone());
        queue.push_back(target.clone());
        while let Some(node) = queue.pop_front() {
            if let Some(preds) = projection.reverse.get(&node) {
                for pred in preds {
                    if reachable.insert(pred.clone()) {
                        queue.push_back(pred.clone());
                    }
                }
            }
        }

        let sources: Vec<TypeNode> = projection
            .zero_indegree
            .iter()
            .filter(|n| reachable.contains(*n))
            .cloned()
            .collect();
        self.ancestors.insert(key, sources.clone());
        sources
    }
}

/// The hint binding for a bare-variable target: its bound with primitives
/// boxed, or `Object` when unbounded.
fn var_hint(session: &ApiSession, var: &TypeVar) -> Type {
    let store = session.store();
    let declared = session
        .subtyping()
        .var_def(&var.name)
        .and_then(|v| v.bound.as_deref().cloned())
        .or_else(|| var.bound.as_deref().cloned());
    match declared {
        Some(Type::Class(ClassType { def, args })) if args.is_empty() && store.is_primitive(def) => {
            store
                .boxed(def)
                .map(Type::named)
                .unwrap_or_else(|| Type::named(store.well_known().object))
        }
        Some(bound) => bound,
        None => Type::named(store.well_known().object),
    }
}

/// Whether a registered variable's bound admits the target type.
fn bound_admits(session: &ApiSession, var: &TypeVar, target: &Type) -> bool {
    match var.bound.as_deref() {
        None => true,
        Some(bound) => unify(session.store(), bound, target, UnifyOptions::subtyping()).is_some(),
    }
}

/// Try one candidate path: register its fresh member type parameters, compose
/// edge constraints in order, unify the final return type against the
/// target, then hand the accumulated constraints to the solver.
#[allow(clippy::too_many_arguments)]
fn attempt_path(
    session: &mut ApiSession,
    steps: &[MemberId],
    target: &Type,
    prior: &ConstraintSet,
    want_infeasible: bool,
    hint: &Substitution,
    rng: &mut dyn RngCore,
) -> Option<(Substitution, Option<String>, Vec<TypeVar>)> {
    let mut ephemeral: Vec<TypeVar> = Vec::new();
    for &step in steps {
        for var in session.api().member(step).type_params() {
            if !ephemeral.contains(var) {
                ephemeral.push(var.clone());
            }
        }
    }

    let scoped = ephemeral.clone();
    session.with_ephemeral_type_vars(&scoped, |session| {
        let store = session.store();
        let api = session.api();

        let mut composed = hint.clone();
        let mut extra = ConstraintSet::new();
        let mut vars: Vec<TypeVar> = Vec::new();
        let mut prev_ret: Option<Type> = None;

        for &step in steps {
            if let TypeNode::Def(def) = api.receiver(step) {
                for param in store.def(*def).params() {
                    push_unique(&mut vars, param);
                }
            }
            for param in api.member(step).type_params() {
                push_unique(&mut vars, param);
            }

            // The previous return value becomes this member's receiver.
            if let Some(prev) = &prev_ret {
                let receiver = receiver_self_type(store, api.receiver(step));
                if !unify_with(store, &receiver, prev, UnifyOptions::subtyping(), &mut composed) {
                    return None;
                }
            }

            let out = api.out_edge(step);
            if let Some(binding) = &out.binding {
                for (name, expr) in binding.iter() {
                    record_binding(&mut composed, &mut extra, name, expr);
                }
            }
            if let Type::Class(ClassType { def, args }) = &out.ret {
                if !args.is_empty() {
                    for param in store.def(*def).params() {
                        push_unique(&mut vars, param);
                    }
                }
            }
            prev_ret = Some(out.ret.clone());
        }

        let last_ret = prev_ret?;
        if !unify_with(store, target, &last_ret, UnifyOptions::subtyping(), &mut composed) {
            return None;
        }

        let mut constraints = collect_constraints(&vars, &composed);
        for (name, list) in &extra {
            for constraint in list {
                add_constraint(&mut constraints, name, constraint.clone());
            }
        }
        for (name, list) in prior {
            for constraint in list {
                add_constraint(&mut constraints, name, constraint.clone());
            }
        }

        let graph = session.subtyping();
        if want_infeasible {
            if instantiate_type_vars(store, graph, &vars, &constraints, &composed, true, rng)
                .is_some()
            {
                return None;
            }
            let forced =
                instantiate_type_vars(store, graph, &vars, &constraints, &composed, false, rng)?;
            forced.violated.as_ref()?;
            Some((forced.bindings, forced.violated, ephemeral.clone()))
        } else {
            let solved =
                instantiate_type_vars(store, graph, &vars, &constraints, &composed, true, rng)?;
            if !params_realizable(api, steps, &solved.bindings) {
                return None;
            }
            Some((solved.bindings, None, ephemeral.clone()))
        }
    })
}

fn push_unique(vars: &mut Vec<TypeVar>, var: &TypeVar) {
    if !vars.contains(var) {
        vars.push(var.clone());
    }
}

/// A receiver node viewed as a type: the class instantiated with its own
/// parameters, so unifying against the incoming value binds them.
fn receiver_self_type(store: &TypeStore, node: &TypeNode) -> Type {
    match node {
        TypeNode::Def(def) => {
            let decl = store.def(*def);
            if decl.is_constructor() {
                Type::class(
                    *def,
                    decl.params().iter().cloned().map(Type::Var).collect(),
                )
            } else {
                Type::named(*def)
            }
        }
        TypeNode::Var(name) => Type::Var(TypeVar::new(name.clone())),
    }
}

/// Compose one OUT-edge binding. A conflicting rebinding is not a hard
/// failure here: both sides become equality constraints so the solver can
/// classify the path as unsatisfiable (which infeasible mode goes looking
/// for).
fn record_binding(
    composed: &mut Substitution,
    extra: &mut ConstraintSet,
    name: &str,
    expr: &Type,
) {
    match composed.get(name) {
        Some(existing) if existing == expr => {}
        Some(existing) => {
            let existing = existing.clone();
            add_constraint(extra, name, Constraint::Equality(existing));
            add_constraint(extra, name, Constraint::Equality(expr.clone()));
        }
        None => composed.insert(name, expr.clone()),
    }
}

/// Every formal-parameter type along the path must be realizable after
/// substitution: no free variables, and no `? super` wildcard left with an
/// unpinned bound.
fn params_realizable(
    api: &javelin_graph::ApiGraph,
    steps: &[MemberId],
    bindings: &Substitution,
) -> bool {
    steps.iter().all(|&step| {
        api.member(step)
            .parameters()
            .iter()
            .all(|p| param_realizable(&bindings.apply(&p.ty)))
    })
}

fn param_realizable(ty: &Type) -> bool {
    match ty {
        Type::Var(_) | Type::Constructor(_) => false,
        Type::Wildcard(w) => match w.variance {
            Variance::Contravariant => w
                .bound
                .as_deref()
                .is_some_and(|b| b.is_ground() && param_realizable(b)),
            _ => w.bound.as_deref().map_or(true, param_realizable),
        },
        Type::Class(ClassType { args, .. }) => args.iter().all(param_realizable),
    }
}
