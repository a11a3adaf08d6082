//! Repo-local lint keeping the reactions crate hexagonal.
//!
//! The reaction engine keeps its rules in `domain` (with the ports), the
//! session adapter in `inbound` and the store adapters in `outbound`. This
//! crate parses every source file under those modules and reports:
//!
//! - `domain` code reaching into `inbound`, `outbound` or `settings`, or
//!   pulling in process-level crates (CLI, config loading, subscribers,
//!   randomness)
//! - `inbound` code importing `outbound` modules or process-level crates
//! - `outbound` code importing `inbound` modules or process-level crates
//! - any layer writing to stdout or stderr instead of emitting `tracing`
//!   events
//!
//! Run it with `cargo run -p architecture-lint`.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use syn::visit::Visit;

/// Library name of the linted crate, as it appears in absolute paths.
const CRATE_NAME: &str = "reactions";

/// Top-level modules the lint knows about.
const LAYER_MODULES: [&str; 4] = ["domain", "inbound", "outbound", "settings"];

/// Crates that belong to the binary, never to a library layer.
const PROCESS_LEVEL_CRATES: [&str; 5] = [
    "clap",
    "color_eyre",
    "eyre",
    "ortho_config",
    "tracing_subscriber",
];

const CONSOLE_MACROS: [&str; 5] = ["print", "println", "eprint", "eprintln", "dbg"];

/// A single boundary violation discovered by the linter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File path relative to `src/`.
    pub file: PathBuf,
    /// Human-readable description of the violated rule.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.message)
    }
}

/// Failure modes returned by the architecture lint.
#[derive(Debug)]
pub enum ArchitectureLintError {
    /// Filesystem traversal or reading failed.
    Io(io::Error),
    /// A file could not be parsed or placed in a layer.
    Parse { file: PathBuf, message: String },
    /// One or more boundary violations were found.
    Violations(Vec<Violation>),
}

impl fmt::Display for ArchitectureLintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "architecture lint I/O failure: {err}"),
            Self::Parse { file, message } => {
                write!(f, "cannot lint {}: {message}", file.display())
            }
            Self::Violations(violations) => {
                writeln!(f, "{} architecture violation(s):", violations.len())?;
                violations
                    .iter()
                    .try_for_each(|violation| writeln!(f, "- {violation}"))
            }
        }
    }
}

impl std::error::Error for ArchitectureLintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse { .. } | Self::Violations(_) => None,
        }
    }
}

impl From<io::Error> for ArchitectureLintError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// A Rust source file to be linted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to `src/`.
    pub file: PathBuf,
    /// File contents.
    pub contents: String,
}

/// Lint the reactions crate sources on disk.
///
/// `backend_dir` is the crate directory, the one holding `src/`.
pub fn lint_backend_sources(backend_dir: &Path) -> Result<(), ArchitectureLintError> {
    let src_dir = backend_dir.join("src");
    let mut sources = Vec::new();
    for layer in Layer::ALL {
        let dir = src_dir.join(layer.module());
        if dir.is_dir() {
            walk_rust_files(&src_dir, &dir, &mut sources)?;
        }
    }
    lint_sources(&sources)
}

/// Lint the provided Rust sources. Intended for unit and behaviour tests.
pub fn lint_sources(sources: &[LintSource]) -> Result<(), ArchitectureLintError> {
    let mut violations = Vec::new();
    for source in sources {
        let layer = Layer::of(&source.file).ok_or_else(|| ArchitectureLintError::Parse {
            file: source.file.clone(),
            message: "file is not under domain/, inbound/ or outbound/".to_owned(),
        })?;
        let parsed =
            syn::parse_file(&source.contents).map_err(|err| ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: err.to_string(),
            })?;
        violations.extend(
            layer
                .check(&parsed)
                .into_iter()
                .map(|message| Violation {
                    file: source.file.clone(),
                    message,
                }),
        );
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ArchitectureLintError::Violations(violations))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    Domain,
    Inbound,
    Outbound,
}

impl Layer {
    const ALL: [Self; 3] = [Self::Domain, Self::Inbound, Self::Outbound];

    fn of(relative_path: &Path) -> Option<Self> {
        let first = relative_path.components().next()?.as_os_str().to_str()?;
        Self::ALL.into_iter().find(|layer| layer.module() == first)
    }

    const fn module(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }

    fn forbidden_modules(self) -> &'static [&'static str] {
        match self {
            Self::Domain => &["inbound", "outbound", "settings"],
            Self::Inbound => &["outbound", "settings"],
            Self::Outbound => &["inbound", "settings"],
        }
    }

    fn forbids_crate(self, name: &str) -> bool {
        // Backoff jitter reaches the domain through the `BackoffJitter` port.
        PROCESS_LEVEL_CRATES.contains(&name) || (self == Self::Domain && name == "rand")
    }

    fn check(self, parsed: &syn::File) -> BTreeSet<String> {
        let mut collector = PathCollector::default();
        collector.visit_file(parsed);

        let layer = self.module();
        let mut messages = BTreeSet::new();
        for segments in &collector.paths {
            match PathRoot::of(segments) {
                Some(PathRoot::Module(module)) if self.forbidden_modules().contains(&module) => {
                    messages.insert(format!("{layer} module must not depend on crate::{module}"));
                }
                Some(PathRoot::External(name)) if self.forbids_crate(name) => {
                    messages.insert(format!(
                        "{layer} module must not depend on external crate `{name}`"
                    ));
                }
                _ => {}
            }
        }
        for name in &collector.macros {
            messages.insert(format!(
                "{layer} module must log through tracing, not `{name}!`"
            ));
        }
        messages
    }
}

/// Where a path starts: one of the crate's own modules or another crate.
enum PathRoot<'a> {
    Module(&'a str),
    External(&'a str),
}

impl<'a> PathRoot<'a> {
    fn of(segments: &'a [String]) -> Option<Self> {
        let first = segments.first()?.as_str();
        if LAYER_MODULES.contains(&first) {
            return Some(Self::Module(first));
        }
        let rest = match first {
            "crate" | "self" | "super" => segments
                .iter()
                .find(|segment| !matches!(segment.as_str(), "crate" | "self" | "super"))?,
            CRATE_NAME => segments.get(1)?,
            _ => return Some(Self::External(first)),
        };
        Some(Self::Module(rest.as_str()))
    }
}

#[derive(Default)]
struct PathCollector {
    paths: BTreeSet<Vec<String>>,
    macros: BTreeSet<String>,
}

impl PathCollector {
    fn collect_use(&mut self, tree: &syn::UseTree, prefix: &[String]) {
        let extended = |ident: &syn::Ident| {
            let mut segments = prefix.to_vec();
            segments.push(ident.to_string());
            segments
        };
        match tree {
            syn::UseTree::Path(path) => self.collect_use(&path.tree, &extended(&path.ident)),
            syn::UseTree::Name(name) => {
                self.paths.insert(extended(&name.ident));
            }
            syn::UseTree::Rename(rename) => {
                self.paths.insert(extended(&rename.ident));
            }
            syn::UseTree::Glob(_) => {
                let mut segments = prefix.to_vec();
                segments.push("*".to_owned());
                self.paths.insert(segments);
            }
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.collect_use(item, prefix);
                }
            }
        }
    }
}

impl<'ast> Visit<'ast> for PathCollector {
    fn visit_path(&mut self, node: &'ast syn::Path) {
        let segments: Vec<String> = node
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect();
        if !segments.is_empty() {
            self.paths.insert(segments);
        }
        syn::visit::visit_path(self, node);
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.collect_use(&node.tree, &[]);
    }

    fn visit_macro(&mut self, node: &'ast syn::Macro) {
        if let Some(ident) = node.path.get_ident() {
            let name = ident.to_string();
            if CONSOLE_MACROS.contains(&name.as_str()) {
                self.macros.insert(name);
            }
        }
        syn::visit::visit_macro(self, node);
    }
}

fn walk_rust_files(
    src_root: &Path,
    dir: &Path,
    sources: &mut Vec<LintSource>,
) -> Result<(), ArchitectureLintError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk_rust_files(src_root, &path, sources)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            let file = path
                .strip_prefix(src_root)
                .map_err(|err| ArchitectureLintError::Parse {
                    file: path.clone(),
                    message: err.to_string(),
                })?
                .to_path_buf();
            let contents = fs::read_to_string(&path)?;
            sources.push(LintSource { file, contents });
        }
    }
    Ok(())
}
