use serde::{Deserialize, Serialize};

use crate::store::DefId;

/// Declaration-site variance of a type parameter, also used for wildcard
/// bounds (`Covariant` models `? extends`, `Contravariant` models `? super`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variance {
    #[default]
    Invariant,
    Covariant,
    Contravariant,
}

impl Variance {
    /// The variance of a position nested inside a position of variance `self`.
    pub fn compose(self, inner: Variance) -> Variance {
        match (self, inner) {
            (Variance::Invariant, _) | (_, Variance::Invariant) => Variance::Invariant,
            (a, b) if a == b => Variance::Covariant,
            _ => Variance::Contravariant,
        }
    }
}

/// A type variable: a class- or method-level generic parameter, or an
/// ephemeral placeholder minted during a synthesis attempt.
///
/// Names are globally unique (`Class.T1` scheme assigned by the graph
/// builder), so substitutions and constraint maps key on the name alone.
///
/// An invariant variable may carry an explicit bound: method-level parameters
/// default to invariant and routinely declare `extends` bounds, so the model
/// accepts the combination (see DESIGN.md).
///
/// Equality and hashing use the canonical name alone: variance and bound are
/// attributes of the declaration, and occurrences of one variable must
/// compare equal whether or not the embedding site carried the bound copy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypeVar {
    pub name: String,
    pub variance: Variance,
    pub bound: Option<Box<Type>>,
}

impl PartialEq for TypeVar {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TypeVar {}

impl std::hash::Hash for TypeVar {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl TypeVar {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variance: Variance::Invariant,
            bound: None,
        }
    }

    pub fn bounded(name: impl Into<String>, bound: Type) -> Self {
        Self {
            name: name.into(),
            variance: Variance::Invariant,
            bound: Some(Box::new(bound)),
        }
    }

    pub fn with_variance(mut self, variance: Variance) -> Self {
        self.variance = variance;
        self
    }
}

/// A (possibly parameterized) reference to an interned definition.
///
/// `args` empty means a plain nominal reference (builtin or simple
/// classifier); non-empty means an instantiation of a type constructor.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    pub def: DefId,
    pub args: Vec<Type>,
}

/// An existential type argument. Only legal inside a type-argument list;
/// the parser and graph builder reject wildcards in top-level positions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WildcardType {
    pub variance: Variance,
    pub bound: Option<Box<Type>>,
}

impl WildcardType {
    /// The unbounded wildcard `?`.
    pub fn unbounded() -> Self {
        Self {
            variance: Variance::Invariant,
            bound: None,
        }
    }

    /// `? extends bound`.
    pub fn extends(bound: Type) -> Self {
        Self {
            variance: Variance::Covariant,
            bound: Some(Box::new(bound)),
        }
    }

    /// `? super bound`.
    pub fn super_(bound: Type) -> Self {
        Self {
            variance: Variance::Contravariant,
            bound: Some(Box::new(bound)),
        }
    }
}

/// The closed set of type shapes the synthesizer reasons about.
///
/// Every consumer matches exhaustively; adding a variant is intentionally a
/// breaking change at each call site.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// Builtin, simple classifier, or parameterized instantiation.
    Class(ClassType),
    /// An unapplied (raw) generic template.
    Constructor(DefId),
    /// A type variable.
    Var(TypeVar),
    /// A wildcard type argument.
    Wildcard(WildcardType),
}

impl Type {
    pub fn class(def: DefId, args: Vec<Type>) -> Type {
        Type::Class(ClassType { def, args })
    }

    /// A plain nominal reference with no type arguments.
    pub fn named(def: DefId) -> Type {
        Type::class(def, Vec::new())
    }

    pub fn var(var: TypeVar) -> Type {
        Type::Var(var)
    }

    /// The referenced definition, if this is a class or raw constructor.
    pub fn def_id(&self) -> Option<DefId> {
        match self {
            Type::Class(ClassType { def, .. }) | Type::Constructor(def) => Some(*def),
            Type::Var(_) | Type::Wildcard(_) => None,
        }
    }

    pub fn is_parameterized(&self) -> bool {
        matches!(self, Type::Class(ClassType { args, .. }) if !args.is_empty())
    }

    /// Whether any immediate type argument is a wildcard.
    pub fn has_wildcard_args(&self) -> bool {
        match self {
            Type::Class(ClassType { args, .. }) => {
                args.iter().any(|a| matches!(a, Type::Wildcard(_)))
            }
            Type::Constructor(_) | Type::Var(_) | Type::Wildcard(_) => false,
        }
    }

    /// Whether the variable `name` occurs anywhere in this type.
    pub fn mentions_var(&self, name: &str) -> bool {
        match self {
            Type::Class(ClassType { args, .. }) => args.iter().any(|a| a.mentions_var(name)),
            Type::Constructor(_) => false,
            Type::Var(v) => v.name == name,
            Type::Wildcard(w) => w.bound.as_deref().is_some_and(|b| b.mentions_var(name)),
        }
    }

    /// Collect the names of all type variables occurring in this type, in
    /// first-occurrence order.
    pub fn collect_var_names(&self, out: &mut Vec<String>) {
        match self {
            Type::Class(ClassType { args, .. }) => {
                for arg in args {
                    arg.collect_var_names(out);
                }
            }
            Type::Constructor(_) => {}
            Type::Var(v) => {
                if !out.iter().any(|n| n == &v.name) {
                    out.push(v.name.clone());
                }
            }
            Type::Wildcard(w) => {
                if let Some(bound) = &w.bound {
                    bound.collect_var_names(out);
                }
            }
        }
    }

    /// Whether the type is free of variables and wildcards.
    pub fn is_ground(&self) -> bool {
        match self {
            Type::Class(ClassType { args, .. }) => args.iter().all(Type::is_ground),
            Type::Constructor(_) => false,
            Type::Var(_) | Type::Wildcard(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variance_composition() {
        use Variance::*;
        assert_eq!(Covariant.compose(Covariant), Covariant);
        assert_eq!(Covariant.compose(Contravariant), Contravariant);
        assert_eq!(Contravariant.compose(Contravariant), Covariant);
        assert_eq!(Invariant.compose(Covariant), Invariant);
        assert_eq!(Covariant.compose(Invariant), Invariant);
    }

    #[test]
    fn bounded_invariant_type_var_is_accepted() {
        // Regression pin for the open question in the upstream design: an
        // invariant variable with an explicit bound is legal and defaults to
        // `Variance::Invariant` when no variance is supplied.
        let def = DefId::from_raw(0);
        let var = TypeVar::bounded("Foo.T1", Type::named(def));
        assert_eq!(var.variance, Variance::Invariant);
        assert!(var.bound.is_some());
    }

    #[test]
    fn mentions_and_collects_nested_vars() {
        let def = DefId::from_raw(0);
        let t = Type::class(
            def,
            vec![
                Type::Var(TypeVar::new("A.T1")),
                Type::Wildcard(WildcardType::extends(Type::Var(TypeVar::new("A.T2")))),
            ],
        );
        assert!(t.mentions_var("A.T1"));
        assert!(t.mentions_var("A.T2"));
        assert!(!t.mentions_var("A.T3"));

        let mut names = Vec::new();
        t.collect_var_names(&mut names);
        assert_eq!(names, vec!["A.T1".to_string(), "A.T2".to_string()]);
    }
}
