//! Constraint collection and type-variable instantiation.
//!
//! The solver turns a partially-composed substitution (produced by unifying
//! a call chain's edge constraints and the synthesis target) into concrete
//! bindings for every free type variable, or reports "no solution" — which
//! is the path finder's backtracking signal, never an error.

mod constraint;
mod instantiate;
mod recursive;

pub use constraint::{add_constraint, collect_constraints, Constraint, ConstraintSet};
pub use instantiate::{instantiate_type_vars, random_reference_type, Assignment};
pub use recursive::recursive_bound_instantiations;
