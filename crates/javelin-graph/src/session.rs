use std::collections::HashSet;

use javelin_types::{unify, ClassType, Substitution, Type, TypeStore, TypeVar, UnifyOptions};

use crate::api::ApiGraph;
use crate::enumerate;
use crate::subtyping::{SubtypingGraph, TypeNode};

/// Session-scoped owner of the store and both graphs.
///
/// All mutation after build time goes through [`ApiSession::add_type_vars`] /
/// [`ApiSession::remove_type_vars`] in strict push/pop pairs — prefer
/// [`ApiSession::with_ephemeral_type_vars`], which removes on every
/// non-panicking exit path. Every mutation bumps [`ApiSession::version`];
/// derived caches key on it so they can never serve stale graph content.
#[derive(Clone, Debug)]
pub struct ApiSession {
    store: TypeStore,
    subtyping: SubtypingGraph,
    api: ApiGraph,
    version: u64,
}

impl ApiSession {
    pub fn new(store: TypeStore, subtyping: SubtypingGraph, api: ApiGraph) -> Self {
        Self {
            store,
            subtyping,
            api,
            version: 0,
        }
    }

    pub fn store(&self) -> &TypeStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TypeStore {
        &mut self.store
    }

    pub fn subtyping(&self) -> &SubtypingGraph {
        &self.subtyping
    }

    pub fn api(&self) -> &ApiGraph {
        &self.api
    }

    /// Monotonic graph-content version; bumped by every add/remove.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Register ephemeral type variables (a matched member's fresh
    /// parameters) as subtyping-graph nodes.
    pub fn add_type_vars(&mut self, vars: &[TypeVar]) {
        for var in vars {
            self.subtyping.add_var(&self.store, var);
        }
        self.version += 1;
    }

    /// Remove variables registered by a matching [`ApiSession::add_type_vars`].
    pub fn remove_type_vars(&mut self, vars: &[TypeVar]) {
        for var in vars {
            self.subtyping.remove_node(&TypeNode::Var(var.name.clone()));
        }
        self.version += 1;
    }

    /// Scoped push/pop: the variables are registered for the duration of
    /// `body` and removed again on every non-panicking exit path.
    pub fn with_ephemeral_type_vars<R>(
        &mut self,
        vars: &[TypeVar],
        body: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.add_type_vars(vars);
        let result = body(self);
        self.remove_type_vars(vars);
        result
    }

    /// Concrete and variable subtypes of `ty`. See [`crate::subtypes`].
    pub fn subtypes(&self, ty: &Type) -> HashSet<Type> {
        enumerate::subtypes(&self.store, &self.subtyping, ty)
    }

    /// Supertypes of `ty` with known bindings substituted forward.
    pub fn supertypes(&self, ty: &Type) -> HashSet<Type> {
        enumerate::supertypes(&self.store, &self.subtyping, ty)
    }

    /// Whether a function-typed value coerces to the SAM interface `iface`,
    /// returning the unifying substitution (lambda and method-reference
    /// matching).
    pub fn coerce_to_functional(&self, iface: &Type, func: &Type) -> Option<Substitution> {
        let Type::Class(ClassType { def, args }) = iface else {
            return None;
        };
        let shape = self.api.functional_shape(*def)?;

        let mut binding = Substitution::new();
        for (param, arg) in self.store.def(*def).params().iter().zip(args) {
            binding.insert(&param.name, arg.clone());
        }
        unify(
            &self.store,
            &binding.apply(shape),
            func,
            UnifyOptions::subtyping(),
        )
    }
}
