use std::collections::HashMap;

use javelin_corpus::{AccessMod, ClassRecord, TypeParamDecl, TypeParser, TypeVarScope};
use javelin_types::{Type, TypeDef, TypeStore, TypeVar};

use crate::api::{ApiGraph, Member, OutEdge, Parameter};
use crate::session::ApiSession;
use crate::subtyping::{SubtypingGraph, TypeNode};

/// What the build did, for logging and CLI reporting.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuildReport {
    pub classes: usize,
    pub members: usize,
    /// Members dropped because a parameter or return type failed to parse.
    pub skipped_members: usize,
    pub functional_interfaces: usize,
}

/// Build the session graphs from per-class descriptors.
///
/// Classes are processed in topological order of their extends/implements/
/// nested-in edges so supertype references resolve to already-defined
/// constructors. A member with an unparseable signature is dropped with a
/// diagnostic; the rest of its class still builds.
pub fn build_session(records: &[ClassRecord]) -> (ApiSession, BuildReport) {
    let mut store = TypeStore::with_builtins();
    let mut api = ApiGraph::new();
    let mut report = BuildReport::default();

    let order = topo_order(records);

    // Pass 1: declare every class, its canonical type parameters, and its
    // supertypes. Ids are reserved before bounds are parsed, so
    // self-referential bounds resolve without a placeholder.
    let mut class_scopes: HashMap<String, TypeVarScope> = HashMap::new();
    let mut counters: HashMap<String, usize> = HashMap::new();
    for &idx in &order {
        let record = &records[idx];
        let id = store.intern(&record.name);
        let (scope, params) = declare_type_params(
            &mut store,
            &TypeVarScope::new(),
            &record.name,
            &record.type_parameters,
            &mut counters,
        );

        let mut supertypes = Vec::new();
        for sup in record.inherits.iter().chain(&record.implements) {
            let parsed = TypeParser::new(&mut store, &scope).parse(sup);
            match parsed {
                Some(ty) => supertypes.push(ty),
                None => {
                    tracing::warn!(class = %record.name, supertype = %sup,
                        "dropping unparseable supertype reference");
                }
            }
        }
        if supertypes.is_empty() {
            supertypes.push(Type::named(store.well_known().object));
        }

        let def = if params.is_empty() {
            TypeDef::Classifier {
                name: record.name.clone(),
                supertypes,
            }
        } else {
            TypeDef::Constructor {
                name: record.name.clone(),
                params,
                supertypes,
                function: false,
            }
        };
        store.define(id, def);
        class_scopes.insert(record.name.clone(), scope);
        report.classes += 1;
    }

    // Pass 2: members. The receiver (or enclosing class, for statics and
    // constructors) provides the IN edge; the return type the OUT edge.
    for &idx in &order {
        let record = &records[idx];
        let id = store.intern(&record.name);
        let receiver = TypeNode::Def(id);
        let class_scope = class_scopes
            .get(&record.name)
            .cloned()
            .unwrap_or_default();
        let mut sam_shape: Option<Type> = None;

        for field in &record.fields {
            if field.access_mod != AccessMod::Public {
                continue;
            }
            let parsed = TypeParser::new(&mut store, &class_scope).parse(&field.field_type);
            let Some(ret) = parsed else {
                tracing::warn!(class = %record.name, field = %field.name, ty = %field.field_type,
                    "skipping field with unparseable type");
                report.skipped_members += 1;
                continue;
            };
            let out = OutEdge::from_return_type(&store, ret);
            api.add_member(
                Member::Field {
                    name: field.name.clone(),
                    class_name: record.name.clone(),
                },
                receiver.clone(),
                out,
            );
            report.members += 1;
        }

        for method in &record.methods {
            if method.access_mod != AccessMod::Public {
                continue;
            }

            // Class-level parameters are not in scope inside static members;
            // constructors do see them (their parameter lists routinely
            // reference the class's own parameters).
            let base_scope = if method.is_static {
                TypeVarScope::new()
            } else {
                class_scope.clone()
            };
            let (scope, type_params) = declare_type_params(
                &mut store,
                &base_scope,
                &record.name,
                &method.type_parameters,
                &mut counters,
            );

            let mut parameters = Vec::with_capacity(method.parameters.len());
            let mut parse_failed = false;
            for param_src in &method.parameters {
                match TypeParser::new(&mut store, &scope).parse_parameter(param_src) {
                    Some((ty, variadic)) => parameters.push(Parameter { ty, variadic }),
                    None => {
                        parse_failed = true;
                        break;
                    }
                }
            }
            if parse_failed {
                tracing::warn!(class = %record.name, method = %method.name,
                    "skipping method with unparseable parameter type");
                report.skipped_members += 1;
                continue;
            }

            let ret = if method.is_constructor {
                Some(self_instance(&store, id))
            } else {
                TypeParser::new(&mut store, &scope).parse(&method.return_type)
            };
            let Some(ret) = ret else {
                tracing::warn!(class = %record.name, method = %method.name,
                    ty = %method.return_type, "skipping method with unparseable return type");
                report.skipped_members += 1;
                continue;
            };

            if record.functional_interface
                && sam_shape.is_none()
                && !method.is_static
                && !method.is_constructor
                && !method.is_default
            {
                let def = store.function_def(parameters.len(), false);
                let mut args: Vec<Type> = parameters.iter().map(|p| p.ty.clone()).collect();
                args.push(ret.clone());
                sam_shape = Some(Type::class(def, args));
            }

            let member = if method.is_constructor {
                Member::Ctor {
                    class_name: record.name.clone(),
                    parameters,
                }
            } else {
                Member::Method {
                    name: method.name.clone(),
                    class_name: record.name.clone(),
                    parameters,
                    type_params,
                    is_static: method.is_static,
                }
            };
            let out = OutEdge::from_return_type(&store, ret);
            api.add_member(member, receiver.clone(), out);
            report.members += 1;
        }

        if let Some(shape) = sam_shape {
            api.register_functional(id, shape);
            report.functional_interfaces += 1;
        }
    }

    define_leftovers(&mut store);
    let subtyping = SubtypingGraph::from_store(&store);
    (ApiSession::new(store, subtyping, api), report)
}

/// Declare a class's or member's type parameters with canonical names
/// (`Class.Tk`, `k` counted per class across class- and method-level
/// declarations) and parse their bounds with the parameter itself already in
/// scope, so F-bounds close over the canonical variable.
fn declare_type_params(
    store: &mut TypeStore,
    base_scope: &TypeVarScope,
    class_name: &str,
    decls: &[String],
    counters: &mut HashMap<String, usize>,
) -> (TypeVarScope, Vec<TypeVar>) {
    let mut scope = base_scope.clone();
    let mut parsed_decls = Vec::with_capacity(decls.len());
    for src in decls {
        let Some(decl) = TypeParamDecl::parse(src) else {
            tracing::warn!(class = %class_name, decl = %src,
                "dropping unparseable type parameter declaration");
            continue;
        };
        let counter = counters.entry(class_name.to_string()).or_insert(0);
        *counter += 1;
        let canonical = format!("{class_name}.T{counter}");
        let var = TypeVar::new(canonical).with_variance(decl.variance);
        scope.insert(&decl.name, var.clone());
        parsed_decls.push((decl, var));
    }

    // Second phase: bounds, now that every sibling parameter is in scope.
    let mut params = Vec::with_capacity(parsed_decls.len());
    for (decl, mut var) in parsed_decls {
        if let Some(bound_src) = &decl.bound {
            match TypeParser::new(store, &scope).parse(bound_src) {
                Some(bound) => var.bound = Some(Box::new(bound)),
                None => {
                    tracing::warn!(class = %class_name, param = %decl.name, bound = %bound_src,
                        "dropping unparseable type parameter bound");
                }
            }
            scope.insert(&decl.name, var.clone());
        }
        params.push(var);
    }
    (scope, params)
}

/// The type a constructor member produces: the class instantiated with its
/// own parameters.
fn self_instance(store: &TypeStore, id: javelin_types::DefId) -> Type {
    match store.try_def(id) {
        Some(def) if def.is_constructor() => Type::class(
            id,
            def.params().iter().cloned().map(Type::Var).collect(),
        ),
        _ => Type::named(id),
    }
}

/// Names referenced by some signature but never described by the corpus
/// become plain classifiers below `Object`.
fn define_leftovers(store: &mut TypeStore) {
    let object = store.well_known().object;
    let leftovers: Vec<_> = store
        .def_ids()
        .filter(|id| store.try_def(*id).is_none())
        .collect();
    for id in leftovers {
        let name = store.name(id).to_string();
        tracing::debug!(class = %name, "defining undescribed external type as classifier");
        store.define(
            id,
            TypeDef::Classifier {
                name,
                supertypes: vec![Type::named(object)],
            },
        );
    }
}

/// Order classes so that supertypes and enclosing classes come first.
fn topo_order(records: &[ClassRecord]) -> Vec<usize> {
    let index: HashMap<&str, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.name.as_str(), i))
        .collect();

    let mut indegree = vec![0usize; records.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    for (i, record) in records.iter().enumerate() {
        let mut deps = Vec::new();
        for sup in record.inherits.iter().chain(&record.implements) {
            if let Some(&dep) = index.get(head_name(sup)) {
                if dep != i {
                    deps.push(dep);
                }
            }
        }
        // `Outer.Inner` depends on `Outer` when the corpus describes it.
        let mut name = record.name.as_str();
        while let Some(dot) = name.rfind('.') {
            name = &name[..dot];
            if let Some(&dep) = index.get(name) {
                if dep != i {
                    deps.push(dep);
                }
            }
        }
        deps.sort_unstable();
        deps.dedup();
        indegree[i] = deps.len();
        for &dep in &deps {
            dependents[dep].push(i);
        }
    }

    let mut ready: Vec<usize> = (0..records.len()).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(records.len());
    while let Some(next) = ready.pop() {
        order.push(next);
        for &dep in &dependents[next] {
            indegree[dep] -= 1;
            if indegree[dep] == 0 {
                ready.push(dep);
            }
        }
    }
    if order.len() != records.len() {
        tracing::warn!("inheritance cycle in corpus; remaining classes appended in input order");
        for i in 0..records.len() {
            if !order.contains(&i) {
                order.push(i);
            }
        }
    }
    order
}

/// The dotted head of a type-expression string: `List<String>` -> `List`.
fn head_name(type_expr: &str) -> &str {
    type_expr
        .split('<')
        .next()
        .unwrap_or(type_expr)
        .trim()
}
