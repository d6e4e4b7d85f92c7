use std::fmt;

use crate::model::{ClassType, Type, Variance};
use crate::store::TypeStore;

/// Java-like rendering of a type against its store.
///
/// `Map<String, ? extends Number>`, `int[]`, `(Integer) -> String`. Used by
/// diagnostics and the CLI; never parsed back.
pub struct TypeDisplay<'a> {
    store: &'a TypeStore,
    ty: &'a Type,
}

impl TypeStore {
    pub fn display<'a>(&'a self, ty: &'a Type) -> TypeDisplay<'a> {
        TypeDisplay { store: self, ty }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type(f, self.store, self.ty)
    }
}

fn write_type(f: &mut fmt::Formatter<'_>, store: &TypeStore, ty: &Type) -> fmt::Result {
    match ty {
        Type::Class(ClassType { def, args }) => {
            if *def == store.well_known().array && args.len() == 1 {
                write_type(f, store, &args[0])?;
                return write!(f, "[]");
            }
            if store.try_def(*def).is_some_and(|d| d.is_function()) {
                return write_function(f, store, args);
            }
            write!(f, "{}", store.name(*def))?;
            if !args.is_empty() {
                write!(f, "<")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write_type(f, store, arg)?;
                }
                write!(f, ">")?;
            }
            Ok(())
        }
        Type::Constructor(def) => write!(f, "{}", store.name(*def)),
        Type::Var(var) => write!(f, "{}", var.name),
        Type::Wildcard(w) => match (&w.variance, &w.bound) {
            (Variance::Covariant, Some(bound)) => {
                write!(f, "? extends ")?;
                write_type(f, store, bound)
            }
            (Variance::Contravariant, Some(bound)) => {
                write!(f, "? super ")?;
                write_type(f, store, bound)
            }
            _ => write!(f, "?"),
        },
    }
}

fn write_function(f: &mut fmt::Formatter<'_>, store: &TypeStore, args: &[Type]) -> fmt::Result {
    // Trailing argument is the return slot.
    let (ret, params) = match args.split_last() {
        Some(split) => split,
        None => return write!(f, "() -> ?"),
    };
    write!(f, "(")?;
    for (idx, param) in params.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write_type(f, store, param)?;
    }
    write!(f, ") -> ")?;
    write_type(f, store, ret)
}
