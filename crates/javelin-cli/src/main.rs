//! `javelin` — load an API corpus, build the session graphs, and synthesize
//! well-typed (or deliberately ill-typed) call chains for a target type.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;

use javelin_corpus::{load_corpus, RuleSet, TypeParser, TypeVarScope};
use javelin_graph::{build_session, ApiSession, Member, MemberId, TypeNode};
use javelin_solver::ConstraintSet;
use javelin_synth::{PathFinder, SelectionMode};
use javelin_types::Substitution;

#[derive(Parser)]
#[command(
    name = "javelin",
    version,
    about = "Type-directed API synthesis for fuzzing JVM-family compilers"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Concrete,
    Abstract,
    All,
}

impl From<Mode> for SelectionMode {
    fn from(mode: Mode) -> SelectionMode {
        match mode {
            Mode::Concrete => SelectionMode::Concrete,
            Mode::Abstract => SelectionMode::Abstract,
            Mode::All => SelectionMode::All,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Build the graphs for a corpus and print a summary.
    Inspect {
        /// Corpus file: a JSON array of per-class records.
        corpus: PathBuf,
        /// Optional member-selection rule file; reports how many members
        /// match.
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Synthesize call chains realizing a target type.
    Synth {
        corpus: PathBuf,
        /// Target type signature, e.g. `Set<Integer>`.
        #[arg(long)]
        target: String,
        /// Number of chains to request.
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// Seed for the search randomness; omit for a fresh seed per run.
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, value_enum, default_value_t = Mode::Concrete)]
        mode: Mode,
        /// Search for a path with deliberately unsatisfiable constraints and
        /// report the violated binding.
        #[arg(long)]
        infeasible: bool,
        /// Emit one JSON report per resolved path instead of text.
        #[arg(long)]
        json: bool,
    },
}

/// What `--json` emits per resolved path.
#[derive(serde::Serialize)]
struct PathReport<'a> {
    target: &'a str,
    chain: String,
    assignment: &'a Substitution,
    violated: Option<&'a str>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    match Cli::parse().command {
        Command::Inspect { corpus, rules } => inspect(&corpus, rules.as_deref()),
        Command::Synth {
            corpus,
            target,
            count,
            seed,
            mode,
            infeasible,
            json,
        } => synth(&corpus, &target, count, seed, mode.into(), infeasible, json),
    }
}

fn inspect(corpus_path: &std::path::Path, rules_path: Option<&std::path::Path>) -> Result<()> {
    let records = load_corpus(corpus_path)
        .with_context(|| format!("failed to load corpus {}", corpus_path.display()))?;
    let (session, report) = build_session(&records);

    println!("classes:               {}", report.classes);
    println!("members:               {}", report.members);
    println!("skipped members:       {}", report.skipped_members);
    println!("functional interfaces: {}", report.functional_interfaces);
    let (nodes, edges) = session.subtyping().shape();
    println!("subtyping graph:       {nodes} nodes, {edges} edges");

    if let Some(rules_path) = rules_path {
        let rules = RuleSet::from_file(rules_path)
            .with_context(|| format!("failed to load rules {}", rules_path.display()))?;
        let matched = session
            .api()
            .member_ids()
            .filter(|&id| rules.matches(&member_row(&session, id)))
            .count();
        println!("rule-matched members:  {matched}");
    }
    Ok(())
}

/// The columns a member exposes to selection rules.
fn member_row<'a>(session: &'a ApiSession, id: MemberId) -> HashMap<&'a str, &'a str> {
    let member = session.api().member(id);
    let mut row = HashMap::new();
    row.insert("member", member.name());
    row.insert(
        "class",
        match member {
            Member::Field { class_name, .. }
            | Member::Method { class_name, .. }
            | Member::Ctor { class_name, .. } => class_name.as_str(),
            Member::Variable { name } => name.as_str(),
        },
    );
    row
}

#[allow(clippy::too_many_arguments)]
fn synth(
    corpus_path: &std::path::Path,
    target_src: &str,
    count: usize,
    seed: Option<u64>,
    mode: SelectionMode,
    infeasible: bool,
    json: bool,
) -> Result<()> {
    let records = load_corpus(corpus_path)
        .with_context(|| format!("failed to load corpus {}", corpus_path.display()))?;
    let (mut session, report) = build_session(&records);
    tracing::info!(
        classes = report.classes,
        members = report.members,
        "corpus graphs built"
    );

    let scope = TypeVarScope::new();
    let target = TypeParser::new(session.store_mut(), &scope)
        .parse(target_src)
        .with_context(|| format!("unparseable target type `{target_src}`"))?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut finder = PathFinder::new();

    let mut found = 0usize;
    for attempt in 0..count {
        let path = finder.find_api_path(
            &mut session,
            &target,
            &ConstraintSet::new(),
            mode,
            infeasible,
            &mut rng,
        );
        let Some(path) = path else {
            println!("[{attempt}] no path");
            continue;
        };
        found += 1;

        let chain = render_chain(&session, &path.source, &path.steps);
        if json {
            let report = PathReport {
                target: target_src,
                chain,
                assignment: &path.assignment,
                violated: path.violated.as_deref(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            continue;
        }
        println!("[{attempt}] {chain}");
        let mut bindings: Vec<String> = path
            .assignment
            .iter()
            .filter_map(|(name, _)| {
                let resolved = path.assignment.resolve(name)?;
                Some(format!("{name} = {}", session.store().display(&resolved)))
            })
            .collect();
        bindings.sort();
        if !bindings.is_empty() {
            println!("      where {}", bindings.join(", "));
        }
        if let Some(violated) = &path.violated {
            println!("      violates {violated}");
        }
    }

    if found == 0 {
        bail!("no path found for `{target_src}` in {count} attempt(s)");
    }
    Ok(())
}

fn render_chain(session: &ApiSession, source: &TypeNode, steps: &[MemberId]) -> String {
    let mut chain = match source {
        TypeNode::Def(def) => session.store().name(*def).to_string(),
        TypeNode::Var(name) => name.clone(),
    };
    for &step in steps {
        let member = session.api().member(step);
        chain.push_str(" -> ");
        match member {
            Member::Field { name, .. } | Member::Variable { name } => chain.push_str(name),
            Member::Method { name, .. } => {
                chain.push_str(name);
                chain.push_str("()");
            }
            Member::Ctor { class_name, .. } => {
                chain.push_str("new ");
                chain.push_str(class_name);
                chain.push_str("()");
            }
        }
    }
    chain
}
