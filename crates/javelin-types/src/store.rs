use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Type, TypeVar, Variance};

/// Handle to an interned type definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefId(u32);

impl DefId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An interned type definition.
///
/// `Builtin` and `Classifier` are non-generic nominal types; `Constructor` is
/// a generic template whose supertypes may reference its own parameters
/// (F-bounds included).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeDef {
    Builtin {
        name: String,
        primitive: bool,
        supertypes: Vec<Type>,
    },
    Classifier {
        name: String,
        supertypes: Vec<Type>,
    },
    Constructor {
        name: String,
        params: Vec<TypeVar>,
        supertypes: Vec<Type>,
        /// Registered function-shape constructor (`FunctionN` and friends).
        function: bool,
    },
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Builtin { name, .. }
            | TypeDef::Classifier { name, .. }
            | TypeDef::Constructor { name, .. } => name,
        }
    }

    pub fn supertypes(&self) -> &[Type] {
        match self {
            TypeDef::Builtin { supertypes, .. }
            | TypeDef::Classifier { supertypes, .. }
            | TypeDef::Constructor { supertypes, .. } => supertypes,
        }
    }

    /// Declared type parameters; empty for non-generic definitions.
    pub fn params(&self) -> &[TypeVar] {
        match self {
            TypeDef::Builtin { .. } | TypeDef::Classifier { .. } => &[],
            TypeDef::Constructor { params, .. } => params,
        }
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self, TypeDef::Constructor { .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self, TypeDef::Constructor { function: true, .. })
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeDef::Builtin { primitive: true, .. })
    }
}

/// Ids of the definitions the core needs by name.
#[derive(Clone, Debug)]
pub struct WellKnown {
    pub object: DefId,
    pub string: DefId,
    pub number: DefId,
    /// The `Comparable<T>` constructor, used by recursive-bound tests and
    /// builtin supertype declarations.
    pub comparable: DefId,
    /// Covariant single-parameter `Array<T>` constructor; `T[]` parses to it.
    pub array: DefId,
    /// The `void` pseudo-type for value-less returns.
    pub unit: DefId,
    pub int: DefId,
    pub integer: DefId,
    /// `(primitive, boxed)` pairs, in no particular order.
    pub boxing: Vec<(DefId, DefId)>,
}

/// Interner for type definitions plus the builtin table.
///
/// Definitions may be reserved (named but undefined) and filled in later;
/// this is how self-referential bounds such as `Enum<E extends Enum<E>>` are
/// constructed without a placeholder type.
#[derive(Clone, Debug)]
pub struct TypeStore {
    names: Vec<String>,
    defs: Vec<Option<TypeDef>>,
    by_name: HashMap<String, DefId>,
    well_known: WellKnown,
    function_defs: HashMap<(usize, bool), DefId>,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl TypeStore {
    /// A store populated with the builtin table: `Object`, `String`,
    /// `Number`, `Comparable<T>`, `Array<T>`, `void`, and the primitive /
    /// boxed numeric pairs.
    pub fn with_builtins() -> Self {
        let mut store = Self {
            names: Vec::new(),
            defs: Vec::new(),
            by_name: HashMap::new(),
            well_known: WellKnown {
                object: DefId(0),
                string: DefId(0),
                number: DefId(0),
                comparable: DefId(0),
                array: DefId(0),
                unit: DefId(0),
                int: DefId(0),
                integer: DefId(0),
                boxing: Vec::new(),
            },
            function_defs: HashMap::new(),
        };

        let object = store.intern("Object");
        store.define(
            object,
            TypeDef::Builtin {
                name: "Object".to_string(),
                primitive: false,
                supertypes: vec![],
            },
        );

        let comparable = store.intern("Comparable");
        store.define(
            comparable,
            TypeDef::Constructor {
                name: "Comparable".to_string(),
                params: vec![TypeVar::new("Comparable.T1")],
                supertypes: vec![Type::named(object)],
                function: false,
            },
        );

        let string = store.intern("String");
        store.define(
            string,
            TypeDef::Builtin {
                name: "String".to_string(),
                primitive: false,
                supertypes: vec![
                    Type::named(object),
                    Type::class(comparable, vec![Type::named(string)]),
                ],
            },
        );

        let number = store.intern("Number");
        store.define(
            number,
            TypeDef::Builtin {
                name: "Number".to_string(),
                primitive: false,
                supertypes: vec![Type::named(object)],
            },
        );

        let array = store.intern("Array");
        store.define(
            array,
            TypeDef::Constructor {
                name: "Array".to_string(),
                params: vec![TypeVar::new("Array.T1").with_variance(Variance::Covariant)],
                supertypes: vec![Type::named(object)],
                function: false,
            },
        );

        let unit = store.intern("void");
        store.define(
            unit,
            TypeDef::Builtin {
                name: "void".to_string(),
                primitive: true,
                supertypes: vec![],
            },
        );

        let mut boxing = Vec::new();
        let mut int = DefId(0);
        let mut integer = DefId(0);
        for (prim_name, boxed_name) in [
            ("int", "Integer"),
            ("long", "Long"),
            ("double", "Double"),
            ("float", "Float"),
            ("boolean", "Boolean"),
            ("char", "Character"),
        ] {
            let prim = store.intern(prim_name);
            store.define(
                prim,
                TypeDef::Builtin {
                    name: prim_name.to_string(),
                    primitive: true,
                    supertypes: vec![],
                },
            );

            let numeric = matches!(prim_name, "int" | "long" | "double" | "float");
            let boxed = store.intern(boxed_name);
            store.define(
                boxed,
                TypeDef::Builtin {
                    name: boxed_name.to_string(),
                    primitive: false,
                    supertypes: vec![
                        if numeric {
                            Type::named(number)
                        } else {
                            Type::named(object)
                        },
                        Type::class(comparable, vec![Type::named(boxed)]),
                    ],
                },
            );
            boxing.push((prim, boxed));
            if prim_name == "int" {
                int = prim;
                integer = boxed;
            }
        }

        store.well_known = WellKnown {
            object,
            string,
            number,
            comparable,
            array,
            unit,
            int,
            integer,
            boxing,
        };
        store
    }

    pub fn well_known(&self) -> &WellKnown {
        &self.well_known
    }

    /// Reserve (or fetch) the id for `name`. The definition may be filled in
    /// later with [`TypeStore::define`].
    pub fn intern(&mut self, name: &str) -> DefId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = DefId(u32::try_from(self.defs.len()).expect("type store overflow"));
        self.names.push(name.to_string());
        self.defs.push(None);
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Fill in a reserved definition.
    ///
    /// Panics if a constructor declares no type parameters: that is a graph
    /// builder defect, not bad input.
    pub fn define(&mut self, id: DefId, def: TypeDef) {
        if let TypeDef::Constructor { name, params, .. } = &def {
            assert!(
                !params.is_empty(),
                "type constructor `{name}` must declare at least one type parameter"
            );
        }
        debug_assert_eq!(self.names[id.index()], def.name());
        self.defs[id.index()] = Some(def);
    }

    pub fn add_classifier(&mut self, name: &str, supertypes: Vec<Type>) -> DefId {
        let id = self.intern(name);
        self.define(
            id,
            TypeDef::Classifier {
                name: name.to_string(),
                supertypes,
            },
        );
        id
    }

    pub fn add_constructor(
        &mut self,
        name: &str,
        params: Vec<TypeVar>,
        supertypes: Vec<Type>,
    ) -> DefId {
        let id = self.intern(name);
        self.define(
            id,
            TypeDef::Constructor {
                name: name.to_string(),
                params,
                supertypes,
                function: false,
            },
        );
        id
    }

    /// The definition behind `id`. Panics if the id is still reserved; a
    /// dangling reservation means the builder's second pass never ran.
    pub fn def(&self, id: DefId) -> &TypeDef {
        self.defs[id.index()]
            .as_ref()
            .unwrap_or_else(|| panic!("type `{}` was reserved but never defined", self.name(id)))
    }

    pub fn try_def(&self, id: DefId) -> Option<&TypeDef> {
        self.defs.get(id.index()).and_then(Option::as_ref)
    }

    pub fn name(&self, id: DefId) -> &str {
        &self.names[id.index()]
    }

    pub fn lookup(&self, name: &str) -> Option<DefId> {
        self.by_name.get(name).copied()
    }

    pub fn def_ids(&self) -> impl Iterator<Item = DefId> + '_ {
        (0..self.defs.len() as u32).map(DefId)
    }

    /// The `FunctionN` (or receiver-style `ReceiverFunctionN`) constructor of
    /// the given arity, interned on first use.
    ///
    /// Parameter slots are contravariant, the trailing return slot covariant;
    /// receiver-style variants prepend a contravariant receiver slot.
    pub fn function_def(&mut self, arity: usize, receiver: bool) -> DefId {
        if let Some(id) = self.function_defs.get(&(arity, receiver)) {
            return *id;
        }
        let name = if receiver {
            format!("ReceiverFunction{arity}")
        } else {
            format!("Function{arity}")
        };
        let mut params = Vec::with_capacity(arity + 2);
        if receiver {
            params.push(
                TypeVar::new(format!("{name}.R0")).with_variance(Variance::Contravariant),
            );
        }
        for k in 1..=arity {
            params.push(
                TypeVar::new(format!("{name}.T{k}")).with_variance(Variance::Contravariant),
            );
        }
        params.push(TypeVar::new(format!("{name}.R")).with_variance(Variance::Covariant));

        let object = self.well_known.object;
        let id = self.intern(&name);
        self.define(
            id,
            TypeDef::Constructor {
                name,
                params,
                supertypes: vec![Type::named(object)],
                function: true,
            },
        );
        self.function_defs.insert((arity, receiver), id);
        id
    }

    pub fn boxed(&self, id: DefId) -> Option<DefId> {
        self.well_known
            .boxing
            .iter()
            .find(|(prim, _)| *prim == id)
            .map(|(_, boxed)| *boxed)
    }

    pub fn unboxed(&self, id: DefId) -> Option<DefId> {
        self.well_known
            .boxing
            .iter()
            .find(|(_, boxed)| *boxed == id)
            .map(|(prim, _)| *prim)
    }

    pub fn is_primitive(&self, id: DefId) -> bool {
        self.try_def(id).is_some_and(TypeDef::is_primitive)
    }

    /// All defined concrete non-generic reference types: the admissible
    /// replacements for an unbounded wildcard in an invariant position, and
    /// the candidate pool for unconstrained variable instantiation.
    pub fn concrete_reference_types(&self) -> Vec<DefId> {
        self.def_ids()
            .filter(|id| match self.try_def(*id) {
                Some(TypeDef::Builtin { primitive, .. }) => {
                    !primitive && *id != self.well_known.unit
                }
                Some(TypeDef::Classifier { .. }) => true,
                Some(TypeDef::Constructor { .. }) | None => false,
            })
            .collect()
    }

    /// All defined non-function type constructors.
    pub fn constructor_defs(&self) -> Vec<DefId> {
        self.def_ids()
            .filter(|id| {
                self.try_def(*id)
                    .is_some_and(|d| d.is_constructor() && !d.is_function())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_is_closed_over_lookup() {
        let store = TypeStore::with_builtins();
        for name in ["Object", "String", "Number", "Comparable", "Array", "int", "Integer"] {
            let id = store.lookup(name).expect("builtin must be registered");
            assert_eq!(store.def(id).name(), name);
        }
    }

    #[test]
    fn boxing_pairs_are_symmetric() {
        let store = TypeStore::with_builtins();
        let wk = store.well_known();
        assert_eq!(store.boxed(wk.int), Some(wk.integer));
        assert_eq!(store.unboxed(wk.integer), Some(wk.int));
        assert!(store.is_primitive(wk.int));
        assert!(!store.is_primitive(wk.integer));
    }

    #[test]
    fn function_defs_are_interned_once_with_expected_variance() {
        let mut store = TypeStore::with_builtins();
        let f2 = store.function_def(2, false);
        assert_eq!(store.function_def(2, false), f2);

        let def = store.def(f2);
        assert!(def.is_function());
        let variances: Vec<Variance> = def.params().iter().map(|p| p.variance).collect();
        assert_eq!(
            variances,
            vec![
                Variance::Contravariant,
                Variance::Contravariant,
                Variance::Covariant
            ]
        );
    }

    #[test]
    #[should_panic(expected = "must declare at least one type parameter")]
    fn zero_parameter_constructor_is_a_builder_defect() {
        let mut store = TypeStore::with_builtins();
        let id = store.intern("Bad");
        store.define(
            id,
            TypeDef::Constructor {
                name: "Bad".to_string(),
                params: vec![],
                supertypes: vec![],
                function: false,
            },
        );
    }

    #[test]
    fn concrete_reference_types_exclude_primitives_and_constructors() {
        let store = TypeStore::with_builtins();
        let wk = store.well_known();
        let refs = store.concrete_reference_types();
        assert!(refs.contains(&wk.object));
        assert!(refs.contains(&wk.string));
        assert!(refs.contains(&wk.integer));
        assert!(!refs.contains(&wk.int));
        assert!(!refs.contains(&wk.comparable));
        assert!(!refs.contains(&wk.unit));
    }
}
