use std::collections::{HashSet, VecDeque};

use crate::model::{ClassType, Type, Variance, WildcardType};
use crate::store::{DefId, TypeStore};
use crate::unify::{substitute, Substitution};

/// Substitution mapping a definition's declared parameters to `args`.
///
/// Missing trailing arguments (raw instantiation) map the parameter to
/// itself, which keeps the walk total without inventing information.
pub(crate) fn param_binding(store: &TypeStore, def: DefId, args: &[Type]) -> Substitution {
    let mut subst = Substitution::new();
    for (idx, param) in store.def(def).params().iter().enumerate() {
        let value = args
            .get(idx)
            .cloned()
            .unwrap_or_else(|| Type::Var(param.clone()));
        subst.insert(&param.name, value);
    }
    subst
}

/// Nominal subtyping: `b` equals `a` or lies in the reflexive-transitive
/// closure of `a`'s declared supertypes.
///
/// The closure is computed by traversal of the declared supertype lists with
/// type-argument substitution applied along the walk; nothing is cached, the
/// lists are small. Type variables are opaque here: a variable is only a
/// subtype of itself, and its bound participates in the solver, not in this
/// test.
pub fn is_subtype(store: &TypeStore, a: &Type, b: &Type) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Type::Class(ca), Type::Class(cb)) => class_subtype(store, ca, cb),
        (Type::Constructor(da), Type::Constructor(db)) => da == db,
        (Type::Var(va), Type::Var(vb)) => va.name == vb.name,
        _ => false,
    }
}

fn class_subtype(store: &TypeStore, a: &ClassType, b: &ClassType) -> bool {
    let mut queue: VecDeque<ClassType> = VecDeque::new();
    let mut seen: HashSet<ClassType> = HashSet::new();
    queue.push_back(a.clone());

    while let Some(current) = queue.pop_front() {
        if !seen.insert(current.clone()) {
            continue;
        }

        if current.def == b.def && args_compatible(store, b.def, &current.args, &b.args) {
            return true;
        }

        let subst = param_binding(store, current.def, &current.args);
        for sup in store.def(current.def).supertypes() {
            if let Type::Class(sup) = substitute(sup, &subst) {
                queue.push_back(sup);
            }
        }
    }
    false
}

/// Position-wise compatibility of `actual` against `expected` arguments of
/// definition `def`, honoring declared variance and wildcard containment.
fn args_compatible(store: &TypeStore, def: DefId, actual: &[Type], expected: &[Type]) -> bool {
    if actual.len() != expected.len() {
        return false;
    }
    let params = store.def(def).params();
    expected.iter().zip(actual).enumerate().all(|(idx, (e, a))| {
        let variance = params.get(idx).map(|p| p.variance).unwrap_or_default();
        arg_compatible(store, e, a, variance)
    })
}

fn arg_compatible(store: &TypeStore, expected: &Type, actual: &Type, variance: Variance) -> bool {
    match (expected, actual) {
        (Type::Wildcard(we), Type::Wildcard(wa)) => wildcard_contains(store, we, wa),
        (Type::Wildcard(w), a) => match w.variance {
            Variance::Covariant => match &w.bound {
                Some(bound) => is_subtype(store, a, bound),
                None => true,
            },
            Variance::Contravariant => match &w.bound {
                Some(bound) => is_subtype(store, bound, a),
                None => true,
            },
            Variance::Invariant => w.bound.is_none() || w.bound.as_deref() == Some(a),
        },
        // A concrete expected argument never absorbs an existential actual.
        (_, Type::Wildcard(_)) => false,
        (e, a) => match variance {
            Variance::Invariant => e == a,
            Variance::Covariant => is_subtype(store, a, e),
            Variance::Contravariant => is_subtype(store, e, a),
        },
    }
}

/// `? extends A` is contained in `? extends B` iff `A <: B`; `? super A` in
/// `? super B` iff `B <: A`. Everything is contained in the unbounded `?`.
fn wildcard_contains(store: &TypeStore, outer: &WildcardType, inner: &WildcardType) -> bool {
    if outer.bound.is_none() && outer.variance != Variance::Contravariant {
        return true;
    }
    if outer.variance != inner.variance {
        return false;
    }
    match (&outer.bound, &inner.bound) {
        (Some(ob), Some(ib)) => match outer.variance {
            Variance::Covariant => is_subtype(store, ib, ob),
            Variance::Contravariant => is_subtype(store, ob, ib),
            Variance::Invariant => ob == ib,
        },
        (Some(_), None) => false,
        (None, _) => true,
    }
}

/// View `ty` as an instantiation of `target` by walking the declared
/// supertype lists and applying argument substitution along the way.
///
/// `ArrayList<String>` viewed as `List` yields `List<String>`. Returns `None`
/// when `target` is not among `ty`'s supertypes.
pub fn instantiate_as_supertype(
    store: &TypeStore,
    ty: &ClassType,
    target: DefId,
) -> Option<ClassType> {
    let mut queue: VecDeque<ClassType> = VecDeque::new();
    let mut seen: HashSet<ClassType> = HashSet::new();
    queue.push_back(ty.clone());

    while let Some(current) = queue.pop_front() {
        if !seen.insert(current.clone()) {
            continue;
        }
        if current.def == target {
            return Some(current);
        }
        let subst = param_binding(store, current.def, &current.args);
        for sup in store.def(current.def).supertypes() {
            if let Type::Class(sup) = substitute(sup, &subst) {
                queue.push_back(sup);
            }
        }
    }
    None
}
