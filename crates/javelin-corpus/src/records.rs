use serde::{Deserialize, Serialize};

/// Member visibility as recorded in the corpus. Only `public` members enter
/// the API graph; `protected` is retained so external tooling can filter
/// differently.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMod {
    #[default]
    Public,
    Protected,
}

/// One class (or interface) of the API surface under test.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// Declared type parameters in source syntax (`"T"`, `"+T"`,
    /// `"T extends Comparable<T>"`).
    #[serde(default)]
    pub type_parameters: Vec<String>,
    /// Implemented interfaces as type-expression strings.
    #[serde(default)]
    pub implements: Vec<String>,
    /// Extended classes as type-expression strings.
    #[serde(default)]
    pub inherits: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldRecord>,
    #[serde(default)]
    pub methods: Vec<MethodRecord>,
    /// Single-abstract-method interface usable as a lambda target.
    #[serde(default)]
    pub functional_interface: bool,
}

fn default_language() -> String {
    "java".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub access_mod: AccessMod,
    #[serde(default)]
    pub is_static: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MethodRecord {
    pub name: String,
    /// Parameter types in source syntax; a trailing `...` marks a variadic
    /// parameter.
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default = "default_return_type")]
    pub return_type: String,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub access_mod: AccessMod,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_constructor: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub throws: Vec<String>,
}

fn default_return_type() -> String {
    "void".to_string()
}
