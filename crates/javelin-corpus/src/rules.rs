use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::CorpusError;

/// How a rule file combines its rows: a row hit is enough (`any`) or every
/// row must hit (`all`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchFunc {
    Any,
    All,
}

#[derive(Debug, Deserialize)]
struct RuleFileRaw {
    column_names: Vec<String>,
    func: MatchFunc,
    rules: Vec<Vec<String>>,
}

/// A compiled member-selection pattern.
///
/// The leading sigil selects the matcher: `*` any, `?` regex, `!` inverse,
/// `_` prefix, `&` conjunction, `|` disjunction, `=` literal; a pattern with
/// no sigil is a literal.
#[derive(Debug)]
pub enum Matcher {
    Any,
    Literal(String),
    Prefix(String),
    Regex(regex::Regex),
    Inverse(Box<Matcher>),
    And(Vec<Matcher>),
    Or(Vec<Matcher>),
}

impl Matcher {
    pub fn parse(pattern: &str) -> Result<Matcher, CorpusError> {
        let rule_err = |reason: &str| CorpusError::Rule {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };
        match pattern.split_at(pattern.chars().next().map_or(0, char::len_utf8)) {
            ("*", _) => Ok(Matcher::Any),
            ("?", rest) => regex::Regex::new(rest)
                .map(Matcher::Regex)
                .map_err(|e| rule_err(&e.to_string())),
            ("!", rest) => Ok(Matcher::Inverse(Box::new(Matcher::parse(rest)?))),
            ("_", rest) => Ok(Matcher::Prefix(rest.to_string())),
            ("&", rest) => rest
                .split('&')
                .map(Matcher::parse)
                .collect::<Result<Vec<_>, _>>()
                .map(Matcher::And),
            ("|", rest) => rest
                .split('|')
                .map(Matcher::parse)
                .collect::<Result<Vec<_>, _>>()
                .map(Matcher::Or),
            ("=", rest) => Ok(Matcher::Literal(rest.to_string())),
            _ if !pattern.is_empty() => Ok(Matcher::Literal(pattern.to_string())),
            _ => Err(rule_err("empty pattern")),
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Literal(expected) => value == expected,
            Matcher::Prefix(prefix) => value.starts_with(prefix),
            Matcher::Regex(re) => re.is_match(value),
            Matcher::Inverse(inner) => !inner.matches(value),
            Matcher::And(parts) => parts.iter().all(|m| m.matches(value)),
            Matcher::Or(parts) => parts.iter().any(|m| m.matches(value)),
        }
    }
}

/// A compiled member-selection rule file.
///
/// Each rule row pairs one pattern per declared column; a row matches when
/// every pattern accepts its column's value.
#[derive(Debug)]
pub struct RuleSet {
    columns: Vec<String>,
    func: MatchFunc,
    rules: Vec<Vec<Matcher>>,
}

impl RuleSet {
    pub fn from_json(text: &str) -> Result<Self, CorpusError> {
        let raw: RuleFileRaw =
            serde_json::from_str(text).map_err(|source| CorpusError::Json {
                path: "<inline>".into(),
                source,
            })?;
        Self::compile(raw)
    }

    pub fn from_file(path: &Path) -> Result<Self, CorpusError> {
        let text = fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RuleFileRaw =
            serde_json::from_str(&text).map_err(|source| CorpusError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Self::compile(raw)
    }

    fn compile(raw: RuleFileRaw) -> Result<Self, CorpusError> {
        let mut rules = Vec::with_capacity(raw.rules.len());
        for row in &raw.rules {
            if row.len() != raw.column_names.len() {
                return Err(CorpusError::RuleArity {
                    expected: raw.column_names.len(),
                    got: row.len(),
                });
            }
            rules.push(
                row.iter()
                    .map(|p| Matcher::parse(p))
                    .collect::<Result<Vec<_>, _>>()?,
            );
        }
        Ok(Self {
            columns: raw.column_names,
            func: raw.func,
            rules,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Match a row of column values. Missing columns are treated as empty
    /// strings, which only `*` and inverse patterns accept.
    pub fn matches(&self, row: &HashMap<&str, &str>) -> bool {
        let row_hit = |patterns: &Vec<Matcher>| {
            self.columns
                .iter()
                .zip(patterns)
                .all(|(col, m)| m.matches(row.get(col.as_str()).copied().unwrap_or("")))
        };
        match self.func {
            MatchFunc::Any => self.rules.iter().any(row_hit),
            MatchFunc::All => self.rules.iter().all(row_hit),
        }
    }
}
