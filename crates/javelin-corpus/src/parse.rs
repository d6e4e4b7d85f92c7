use std::collections::HashMap;

use javelin_types::{Type, TypeStore, TypeVar, Variance, WildcardType};

/// Source-level type-variable names in scope, mapped to their canonical
/// (globally unique) variables.
///
/// The graph builder composes one scope per class and layers a method scope
/// on top; a method-level `T` shadows a class-level `T`.
#[derive(Clone, Debug, Default)]
pub struct TypeVarScope {
    vars: HashMap<String, TypeVar>,
}

impl TypeVarScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source_name: &str, var: TypeVar) {
        self.vars.insert(source_name.to_string(), var);
    }

    pub fn get(&self, source_name: &str) -> Option<&TypeVar> {
        self.vars.get(source_name)
    }

    /// A copy of `self` with `overlay`'s entries shadowing.
    pub fn layered(&self, overlay: &TypeVarScope) -> TypeVarScope {
        let mut vars = self.vars.clone();
        for (name, var) in &overlay.vars {
            vars.insert(name.clone(), var.clone());
        }
        TypeVarScope { vars }
    }

    pub fn vars(&self) -> impl Iterator<Item = &TypeVar> {
        self.vars.values()
    }
}

/// A declared type parameter split into its syntactic pieces.
///
/// `"+T extends Comparable<T>"` yields variance `Covariant`, name `T`, and
/// the unparsed bound text; the builder parses the bound only after the
/// parameter's canonical variable is in scope, so F-bounds resolve to the
/// parameter itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParamDecl {
    pub variance: Variance,
    pub name: String,
    pub bound: Option<String>,
}

impl TypeParamDecl {
    /// Split a source-syntax parameter declaration. Returns `None` on
    /// malformed input (the member or class is then skipped).
    pub fn parse(input: &str) -> Option<TypeParamDecl> {
        let s = input.trim();
        let (variance, s) = if let Some(rest) = s.strip_prefix('+') {
            (Variance::Covariant, rest.trim_start())
        } else if let Some(rest) = s.strip_prefix('-') {
            (Variance::Contravariant, rest.trim_start())
        } else {
            (Variance::Invariant, s)
        };

        let (name, bound) = match s.find(" extends ") {
            Some(idx) => (
                s[..idx].trim(),
                Some(s[idx + " extends ".len()..].trim().to_string()),
            ),
            None => (s, None),
        };

        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        {
            return None;
        }
        Some(TypeParamDecl {
            variance,
            name: name.to_string(),
            bound,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Tok {
    Ident(String),
    Lt,
    Gt,
    Comma,
    Question,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Arrow,
    Extends,
    Super,
}

fn lex(input: &str) -> Option<Vec<Tok>> {
    let mut toks = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '<' => {
                chars.next();
                toks.push(Tok::Lt);
            }
            '>' => {
                chars.next();
                toks.push(Tok::Gt);
            }
            ',' => {
                chars.next();
                toks.push(Tok::Comma);
            }
            '?' => {
                chars.next();
                toks.push(Tok::Question);
            }
            '[' => {
                chars.next();
                toks.push(Tok::LBracket);
            }
            ']' => {
                chars.next();
                toks.push(Tok::RBracket);
            }
            '(' => {
                chars.next();
                toks.push(Tok::LParen);
            }
            ')' => {
                chars.next();
                toks.push(Tok::RParen);
            }
            '-' => {
                chars.next();
                if chars.next() != Some('>') {
                    return None;
                }
                toks.push(Tok::Arrow);
            }
            c if c.is_alphanumeric() || c == '_' || c == '$' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '$' || c == '.' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                toks.push(match ident.as_str() {
                    "extends" => Tok::Extends,
                    "super" => Tok::Super,
                    _ => Tok::Ident(ident),
                });
            }
            _ => return None,
        }
    }
    Some(toks)
}

struct Cursor {
    toks: Vec<Tok>,
    pos: usize,
}

impl Cursor {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos == self.toks.len()
    }
}

/// Recursive-descent parser from Java-like signature strings to [`Type`]
/// values.
///
/// Unknown nominal names are reserved in the store on first sight; the graph
/// builder defines any leftovers as plain classifiers once the corpus has
/// been processed. An unparseable signature is `None`, meaning "skip this
/// member" — never fatal to the rest of the corpus.
pub struct TypeParser<'a> {
    store: &'a mut TypeStore,
    scope: &'a TypeVarScope,
}

impl<'a> TypeParser<'a> {
    pub fn new(store: &'a mut TypeStore, scope: &'a TypeVarScope) -> Self {
        Self { store, scope }
    }

    /// Parse a top-level type signature. Wildcards are rejected here: they
    /// are only legal inside a type-argument list.
    pub fn parse(&mut self, input: &str) -> Option<Type> {
        let mut cur = Cursor {
            toks: lex(input)?,
            pos: 0,
        };
        let ty = self.parse_type(&mut cur, false)?;
        if !cur.at_end() {
            return None;
        }
        Some(ty)
    }

    /// Parse a formal-parameter signature; a trailing `...` marks the
    /// parameter variadic.
    pub fn parse_parameter(&mut self, input: &str) -> Option<(Type, bool)> {
        let trimmed = input.trim();
        match trimmed.strip_suffix("...") {
            Some(rest) => Some((self.parse(rest)?, true)),
            None => Some((self.parse(trimmed)?, false)),
        }
    }

    fn parse_type(&mut self, cur: &mut Cursor, arg_position: bool) -> Option<Type> {
        let core = match cur.peek()? {
            Tok::LParen => self.parse_function(cur)?,
            Tok::Question => {
                if !arg_position {
                    return None;
                }
                return self.parse_wildcard(cur);
            }
            _ => self.parse_atom(cur)?,
        };

        // Array suffixes apply outside-in: `int[][]` is Array<Array<int>>.
        let mut ty = core;
        while cur.eat(&Tok::LBracket) {
            if !cur.eat(&Tok::RBracket) {
                return None;
            }
            let array = self.store.well_known().array;
            ty = Type::class(array, vec![ty]);
        }
        Some(ty)
    }

    fn parse_wildcard(&mut self, cur: &mut Cursor) -> Option<Type> {
        if !cur.eat(&Tok::Question) {
            return None;
        }
        let wildcard = match cur.peek() {
            Some(Tok::Extends) => {
                cur.next();
                WildcardType::extends(self.parse_type(cur, false)?)
            }
            Some(Tok::Super) => {
                cur.next();
                WildcardType::super_(self.parse_type(cur, false)?)
            }
            _ => WildcardType::unbounded(),
        };
        Some(Type::Wildcard(wildcard))
    }

    fn parse_function(&mut self, cur: &mut Cursor) -> Option<Type> {
        if !cur.eat(&Tok::LParen) {
            return None;
        }
        let mut params = Vec::new();
        if !cur.eat(&Tok::RParen) {
            loop {
                params.push(self.parse_type(cur, false)?);
                if cur.eat(&Tok::RParen) {
                    break;
                }
                if !cur.eat(&Tok::Comma) {
                    return None;
                }
            }
        }
        if !cur.eat(&Tok::Arrow) {
            return None;
        }
        let ret = self.parse_type(cur, false)?;

        let def = self.store.function_def(params.len(), false);
        let mut args = params;
        args.push(ret);
        Some(Type::class(def, args))
    }

    fn parse_atom(&mut self, cur: &mut Cursor) -> Option<Type> {
        let name = match cur.next()? {
            Tok::Ident(name) => name,
            _ => return None,
        };

        if let Some(var) = self.scope.get(&name) {
            // A type variable is not a generic template.
            if cur.peek() == Some(&Tok::Lt) {
                return None;
            }
            return Some(Type::Var(var.clone()));
        }

        let def = self.store.intern(&name);
        if cur.eat(&Tok::Lt) {
            let mut args = Vec::new();
            loop {
                args.push(self.parse_type(cur, true)?);
                if cur.eat(&Tok::Gt) {
                    break;
                }
                if !cur.eat(&Tok::Comma) {
                    return None;
                }
            }
            if let Some(decl) = self.store.try_def(def) {
                if !decl.is_constructor() || decl.params().len() != args.len() {
                    return None;
                }
            }
            return Some(Type::class(def, args));
        }

        match self.store.try_def(def) {
            Some(decl) if decl.is_constructor() => Some(Type::Constructor(def)),
            _ => Some(Type::named(def)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parser_fixture() -> (TypeStore, TypeVarScope) {
        let mut store = TypeStore::with_builtins();
        let object = store.well_known().object;
        store.add_constructor(
            "List",
            vec![TypeVar::new("List.T1")],
            vec![Type::named(object)],
        );
        store.add_constructor(
            "Map",
            vec![TypeVar::new("Map.T1"), TypeVar::new("Map.T2")],
            vec![Type::named(object)],
        );
        let mut scope = TypeVarScope::new();
        scope.insert("T", TypeVar::new("Ctx.T1"));
        (store, scope)
    }

    #[test]
    fn parses_nested_generics_and_arrays() {
        let (mut store, scope) = parser_fixture();
        let list = store.lookup("List").unwrap();
        let map = store.lookup("Map").unwrap();
        let wk = store.well_known().clone();

        let mut parser = TypeParser::new(&mut store, &scope);
        let ty = parser.parse("Map<String, List<Integer>>").unwrap();
        assert_eq!(
            ty,
            Type::class(
                map,
                vec![
                    Type::named(wk.string),
                    Type::class(list, vec![Type::named(wk.integer)]),
                ]
            )
        );

        let arr = parser.parse("int[][]").unwrap();
        assert_eq!(
            arr,
            Type::class(wk.array, vec![Type::class(wk.array, vec![Type::named(wk.int)])])
        );
    }

    #[test]
    fn wildcards_only_inside_argument_lists() {
        let (mut store, scope) = parser_fixture();
        let mut parser = TypeParser::new(&mut store, &scope);

        assert!(parser.parse("? extends Number").is_none());
        let ty = parser.parse("List<? super Integer>").unwrap();
        let Type::Class(class) = ty else {
            panic!("expected class type");
        };
        assert!(matches!(class.args[0], Type::Wildcard(_)));
    }

    #[test]
    fn scope_resolves_type_variables() {
        let (mut store, scope) = parser_fixture();
        let mut parser = TypeParser::new(&mut store, &scope);

        let ty = parser.parse("List<T>").unwrap();
        let Type::Class(class) = ty else {
            panic!("expected class type");
        };
        assert_eq!(class.args[0], Type::Var(TypeVar::new("Ctx.T1")));

        // A variable is not a template.
        assert!(parser.parse("T<String>").is_none());
    }

    #[test]
    fn arity_mismatch_is_unparseable() {
        let (mut store, scope) = parser_fixture();
        let mut parser = TypeParser::new(&mut store, &scope);
        assert!(parser.parse("List<String, Integer>").is_none());
        assert!(parser.parse("String<Integer>").is_none());
    }

    #[test]
    fn function_shorthand_builds_function_instantiation() {
        let (mut store, scope) = parser_fixture();
        let mut parser = TypeParser::new(&mut store, &scope);
        let ty = parser.parse("(Integer, String) -> Boolean").unwrap();

        let Type::Class(class) = &ty else {
            panic!("expected class type");
        };
        assert_eq!(class.args.len(), 3);
        assert!(store.def(class.def).is_function());
    }

    #[test]
    fn variadic_marker_is_split_off() {
        let (mut store, scope) = parser_fixture();
        let wk = store.well_known().clone();
        let mut parser = TypeParser::new(&mut store, &scope);
        let (ty, variadic) = parser.parse_parameter("String...").unwrap();
        assert_eq!(ty, Type::named(wk.string));
        assert!(variadic);
    }

    #[test]
    fn param_decl_splits_variance_and_bound() {
        assert_eq!(
            TypeParamDecl::parse("+T extends Comparable<T>"),
            Some(TypeParamDecl {
                variance: Variance::Covariant,
                name: "T".to_string(),
                bound: Some("Comparable<T>".to_string()),
            })
        );
        assert_eq!(
            TypeParamDecl::parse("E"),
            Some(TypeParamDecl {
                variance: Variance::Invariant,
                name: "E".to_string(),
                bound: None,
            })
        );
        assert!(TypeParamDecl::parse("not a name!").is_none());
    }

    #[test]
    fn unknown_names_are_reserved_for_later_definition() {
        let (mut store, scope) = parser_fixture();
        {
            let mut parser = TypeParser::new(&mut store, &scope);
            parser.parse("com.example.Mystery").unwrap();
        }
        assert!(store.lookup("com.example.Mystery").is_some());
    }
}
