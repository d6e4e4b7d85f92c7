use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{ClassType, Type, TypeVar, Variance, WildcardType};
use crate::store::TypeStore;
use crate::subtype::{instantiate_as_supertype, is_subtype};

/// A finite map from type-variable names to types.
///
/// Bindings may chain through intermediate variables; [`Substitution::apply`]
/// resolves chains transitively with a cycle guard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    map: HashMap<String, Type>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.map.get(name)
    }

    pub fn insert(&mut self, name: &str, ty: Type) {
        self.map.insert(name.to_string(), ty);
    }

    /// Add a binding, failing on conflict with an existing one.
    pub fn bind(&mut self, name: &str, ty: Type) -> bool {
        match self.map.get(name) {
            Some(existing) if *existing == ty => true,
            Some(_) => false,
            None => {
                self.map.insert(name.to_string(), ty);
                true
            }
        }
    }

    /// Merge `other` into `self`, failing on any conflicting binding.
    pub fn merge(&mut self, other: &Substitution) -> bool {
        other.iter().all(|(name, ty)| self.bind(name, ty.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Type)> {
        self.map.iter()
    }

    /// Fully resolve the binding for `name`, chasing variable chains.
    pub fn resolve(&self, name: &str) -> Option<Type> {
        let ty = self.get(name)?;
        Some(self.apply(ty))
    }

    /// Apply the substitution to `ty`, resolving chains of variable bindings
    /// transitively. Unbound variables are kept, with the substitution pushed
    /// into their bounds.
    pub fn apply(&self, ty: &Type) -> Type {
        let mut chasing = Vec::new();
        self.apply_inner(ty, &mut chasing)
    }

    fn apply_inner(&self, ty: &Type, chasing: &mut Vec<String>) -> Type {
        match ty {
            Type::Class(ClassType { def, args }) => Type::class(
                *def,
                args.iter().map(|a| self.apply_inner(a, chasing)).collect(),
            ),
            Type::Constructor(def) => Type::Constructor(*def),
            Type::Var(var) => {
                if chasing.iter().any(|n| n == &var.name) {
                    return ty.clone();
                }
                match self.map.get(&var.name) {
                    Some(bound_to) => {
                        chasing.push(var.name.clone());
                        let resolved = self.apply_inner(bound_to, chasing);
                        chasing.pop();
                        resolved
                    }
                    None => Type::Var(TypeVar {
                        name: var.name.clone(),
                        variance: var.variance,
                        bound: var
                            .bound
                            .as_deref()
                            .map(|b| Box::new(self.apply_inner(b, chasing))),
                    }),
                }
            }
            Type::Wildcard(w) => Type::Wildcard(WildcardType {
                variance: w.variance,
                bound: w
                    .bound
                    .as_deref()
                    .map(|b| Box::new(self.apply_inner(b, chasing))),
            }),
        }
    }
}

/// Apply `subst` to `ty`. Free-function form for call sites that read better
/// without the method syntax.
pub fn substitute(ty: &Type, subst: &Substitution) -> Type {
    subst.apply(ty)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnifyOptions {
    /// Permit the actual type to be a proper subtype of the expected type,
    /// honoring declared variance in argument positions.
    pub allow_subtyping: bool,
}

impl UnifyOptions {
    pub fn strict() -> Self {
        Self {
            allow_subtyping: false,
        }
    }

    pub fn subtyping() -> Self {
        Self {
            allow_subtyping: true,
        }
    }
}

/// Match `expected` against `actual`, returning the substitution that makes
/// them agree, or `None`.
///
/// Failure is the backtracking signal throughout the solver and path finder;
/// it is never an error.
pub fn unify(
    store: &TypeStore,
    expected: &Type,
    actual: &Type,
    opts: UnifyOptions,
) -> Option<Substitution> {
    let mut subst = Substitution::new();
    unify_into(store, expected, actual, opts, &mut subst).then_some(subst)
}

/// Unify on top of existing bindings, accumulating into `subst`.
///
/// Returns `false` without rolling back, so callers that need backtracking
/// clone the substitution first.
pub fn unify_with(
    store: &TypeStore,
    expected: &Type,
    actual: &Type,
    opts: UnifyOptions,
    subst: &mut Substitution,
) -> bool {
    unify_into(store, expected, actual, opts, subst)
}

pub(crate) fn unify_into(
    store: &TypeStore,
    expected: &Type,
    actual: &Type,
    opts: UnifyOptions,
    subst: &mut Substitution,
) -> bool {
    let expected = subst.apply(expected);
    let actual = subst.apply(actual);
    if expected == actual {
        return true;
    }

    match (&expected, &actual) {
        (Type::Var(v), other) | (other, Type::Var(v)) => bind_var(v, other, subst),
        (Type::Class(e), Type::Class(a)) => {
            if e.def == a.def {
                unify_args(store, e, a, opts, subst)
            } else if opts.allow_subtyping {
                match instantiate_as_supertype(store, a, e.def) {
                    Some(view) => unify_args(store, e, &view, opts, subst),
                    None => false,
                }
            } else {
                false
            }
        }
        // Raw constructors only unify with themselves, which the equality
        // check above already covered.
        (Type::Constructor(_), _) | (_, Type::Constructor(_)) => false,
        (Type::Wildcard(w), other) | (other, Type::Wildcard(w)) => {
            unify_wildcard(store, w, other, opts, subst)
        }
    }
}

fn bind_var(var: &TypeVar, other: &Type, subst: &mut Substitution) -> bool {
    if let Type::Var(o) = other {
        if o.name == var.name {
            return true;
        }
    }
    // Occurs check: a variable never binds to a type containing itself.
    if other.mentions_var(&var.name) {
        return false;
    }
    subst.bind(&var.name, other.clone())
}

fn unify_args(
    store: &TypeStore,
    expected: &ClassType,
    actual: &ClassType,
    opts: UnifyOptions,
    subst: &mut Substitution,
) -> bool {
    if expected.args.len() != actual.args.len() {
        return false;
    }
    let params: Vec<Variance> = store
        .def(expected.def)
        .params()
        .iter()
        .map(|p| p.variance)
        .collect();

    expected
        .args
        .iter()
        .zip(&actual.args)
        .enumerate()
        .all(|(idx, (e, a))| {
            let variance = params.get(idx).copied().unwrap_or_default();
            match (e, a) {
                (Type::Wildcard(w), other) => unify_wildcard(store, w, other, opts, subst),
                (_, Type::Wildcard(_)) => {
                    // An existential actual only matches an expected variable
                    // (handled in unify_into) or another wildcard.
                    unify_into(store, e, a, opts, subst)
                }
                _ => match variance {
                    Variance::Invariant => {
                        unify_into(store, e, a, UnifyOptions::strict(), subst)
                    }
                    Variance::Covariant if opts.allow_subtyping => {
                        unify_covariant(store, e, a, opts, subst)
                    }
                    Variance::Contravariant if opts.allow_subtyping => {
                        unify_covariant(store, a, e, opts, subst)
                    }
                    _ => unify_into(store, e, a, UnifyOptions::strict(), subst),
                },
            }
        })
}

/// Unify where `sub` may be a proper subtype of `sup`.
fn unify_covariant(
    store: &TypeStore,
    sup: &Type,
    sub: &Type,
    opts: UnifyOptions,
    subst: &mut Substitution,
) -> bool {
    let mut attempt = subst.clone();
    if unify_into(store, sup, sub, UnifyOptions::strict(), &mut attempt) {
        *subst = attempt;
        return true;
    }
    if opts.allow_subtyping {
        let mut attempt = subst.clone();
        if unify_into(store, sup, sub, opts, &mut attempt) {
            *subst = attempt;
            return true;
        }
    }
    let sup = subst.apply(sup);
    let sub = subst.apply(sub);
    sup.is_ground() && sub.is_ground() && is_subtype(store, &sub, &sup)
}

/// Unify a wildcard against a type per the wildcard's variance.
fn unify_wildcard(
    store: &TypeStore,
    wildcard: &WildcardType,
    other: &Type,
    opts: UnifyOptions,
    subst: &mut Substitution,
) -> bool {
    if let Type::Wildcard(o) = other {
        return wildcard.variance == o.variance
            && match (&wildcard.bound, &o.bound) {
                (None, None) => true,
                (Some(wb), Some(ob)) => unify_into(store, wb, ob, opts, subst),
                _ => false,
            };
    }
    match wildcard.variance {
        Variance::Covariant => match &wildcard.bound {
            Some(bound) => unify_covariant(store, bound, other, UnifyOptions::subtyping(), subst),
            None => true,
        },
        Variance::Contravariant => match &wildcard.bound {
            Some(bound) => unify_covariant(store, other, bound, UnifyOptions::subtyping(), subst),
            None => true,
        },
        Variance::Invariant => match &wildcard.bound {
            Some(bound) => unify_into(store, bound, other, opts, subst),
            None => true,
        },
    }
}
