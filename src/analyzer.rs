//! Cost assignment over syntax trees
//!
//! Uses `syn` to parse Rust source code and assigns a (space, time)
//! [`Cost`] to every node bottom-up. Directories are analyzed file by file
//! in parallel via Rayon.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::bounds::{LinearBound, LoopBoundPolicy};
use crate::calls::CallTable;
use crate::complexity::{ComplexityExpr, Cost};
use crate::report::{AnalysisReport, FileFailure, FileReport, NodeResult, ProjectReport, SourceSpan};
use crate::syntax::{Construct, NodeKind, Syntax, is_list_literal};

/// Errors that can occur during analysis
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {message}")]
    ParseFailure {
        message: String,
        line: Option<usize>,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl From<syn::Error> for AnalyzerError {
    fn from(error: syn::Error) -> Self {
        let line = error.span().start().line;
        AnalyzerError::ParseFailure {
            message: error.to_string(),
            line: (line > 0).then_some(line),
        }
    }
}

/// Options that change what gets analyzed and how it is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Drop coefficients from rendered complexities
    pub clean: bool,
    /// Skip `#[test]` and `#[cfg(test)]` items
    pub exclude_tests: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            clean: true,
            exclude_tests: false,
        }
    }
}

/// Chain of enclosing subroutine names, threaded through the recursion
#[derive(Debug, Clone, Copy)]
struct Scope<'a> {
    name: &'a str,
    parent: Option<&'a Scope<'a>>,
}

impl Scope<'static> {
    fn root() -> Self {
        Scope {
            name: "",
            parent: None,
        }
    }
}

impl Scope<'_> {
    fn enter<'b>(&'b self, name: &'b str) -> Scope<'b> {
        Scope {
            name,
            parent: Some(self),
        }
    }

    /// `outer::inner`, `None` at top level
    fn path(&self) -> Option<String> {
        let mut names = Vec::new();
        let mut current = Some(self);
        while let Some(scope) = current {
            if scope.parent.is_some() {
                names.push(scope.name);
            }
            current = scope.parent;
        }
        if names.is_empty() {
            return None;
        }
        names.reverse();
        Some(names.join("::"))
    }
}

/// One traversal of one syntax tree
struct CostVisitor<'a> {
    options: AnalysisOptions,
    calls: &'a CallTable,
    bounds: &'a dyn LoopBoundPolicy,
    results: Vec<NodeResult>,
}

impl CostVisitor<'_> {
    fn visit(&mut self, node: Option<Syntax<'_>>, scope: &Scope<'_>) -> Cost {
        let Some(node) = node else {
            return Cost::identity();
        };
        if self.options.exclude_tests && node.is_test_code() {
            return Cost::identity();
        }

        match node.construct() {
            Construct::Sequence(kind, children) => {
                let cost = self.visit_all(children, scope);
                self.record(kind, node, scope, &cost);
                cost
            }
            Construct::Subroutine { kind, name, body } => {
                let inner = scope.enter(&name);
                let cost = self.visit(body, &inner);
                self.record(kind, node, &inner, &cost);
                cost
            }
            Construct::Iteration { kind, head, body } => {
                let iterations = self.bounds.iterations(head);
                let body = self.visit(Some(Syntax::Block(body)), scope);
                let cost = Cost {
                    time: iterations.multiply(&body.time),
                    space: body.space,
                };
                self.record(kind, node, scope, &cost);
                cost
            }
            Construct::Conditional {
                kind,
                primary,
                alternates,
            } => {
                let mut cost = self.visit(primary, scope);
                if alternates.is_empty() {
                    cost = cost.worst(Cost::identity());
                }
                for alternate in alternates {
                    let branch = self.visit(Some(alternate), scope);
                    cost = cost.worst(branch);
                }
                self.record(kind, node, scope, &cost);
                cost
            }
            Construct::Call { kind, member } => {
                let time = member
                    .map(|member| self.calls.cost_of(&member))
                    .unwrap_or_default();
                let cost = Cost {
                    space: ComplexityExpr::one(),
                    time,
                };
                self.record(kind, node, scope, &cost);
                cost
            }
            Construct::Binding {
                kind,
                bindings,
                initializers,
            } => {
                let mut space = ComplexityExpr::constant(bindings as u64);
                for initializer in initializers {
                    // visited for its rows only
                    self.visit(Some(Syntax::Expr(initializer)), scope);
                    if is_list_literal(initializer) {
                        space = space.add(&ComplexityExpr::linear());
                    }
                }
                let cost = Cost {
                    space,
                    time: ComplexityExpr::one(),
                };
                self.record(kind, node, scope, &cost);
                cost
            }
            Construct::MacroBody(arguments) => {
                let mut cost = Cost::identity();
                for argument in &arguments {
                    cost = cost.then(&self.visit(Some(Syntax::Expr(argument)), scope));
                }
                cost
            }
            Construct::Other(children) => self.visit_all(children, scope),
        }
    }

    /// Running sum of `children`, starting from the identity
    fn visit_all(&mut self, children: Vec<Syntax<'_>>, scope: &Scope<'_>) -> Cost {
        children
            .into_iter()
            .fold(Cost::identity(), |total, child| {
                let cost = self.visit(Some(child), scope);
                total.then(&cost)
            })
    }

    fn record(&mut self, kind: NodeKind, node: Syntax<'_>, scope: &Scope<'_>, cost: &Cost) {
        let span = SourceSpan::from_span(node.span());
        self.results.push(NodeResult {
            kind,
            line: span.line(),
            scope: scope.path(),
            space: cost.space.render(self.options.clean),
            time: cost.time.render(self.options.clean),
            span,
        });
    }
}

/// Estimates the complexity of Rust source code
///
/// Holds only immutable configuration; each call to [`analyze`] runs a
/// fresh traversal, so one analyzer can be shared across threads.
///
/// [`analyze`]: ComplexityAnalyzer::analyze
pub struct ComplexityAnalyzer {
    options: AnalysisOptions,
    calls: CallTable,
    bounds: Box<dyn LoopBoundPolicy>,
}

impl ComplexityAnalyzer {
    /// Create an analyzer with the default call table and linear loop bounds
    pub fn new(options: AnalysisOptions) -> Self {
        Self {
            options,
            calls: CallTable::default(),
            bounds: Box::new(LinearBound),
        }
    }

    pub fn with_call_table(mut self, calls: CallTable) -> Self {
        self.calls = calls;
        self
    }

    pub fn with_bound_policy(mut self, policy: impl LoopBoundPolicy + 'static) -> Self {
        self.bounds = Box::new(policy);
        self
    }

    pub fn options(&self) -> AnalysisOptions {
        self.options
    }

    pub fn call_table(&self) -> &CallTable {
        &self.calls
    }

    /// Analyze a piece of Rust source code
    pub fn analyze(&self, code: &str) -> Result<AnalysisReport, AnalyzerError> {
        let syntax = syn::parse_file(code)?;

        let mut visitor = CostVisitor {
            options: self.options,
            calls: &self.calls,
            bounds: self.bounds.as_ref(),
            results: Vec::new(),
        };
        let totals = visitor.visit(Some(Syntax::File(&syntax)), &Scope::root());

        Ok(AnalysisReport::new(
            visitor.results,
            totals,
            self.options.clean,
        ))
    }

    /// Read and analyze a Rust source file
    pub fn analyze_file(&self, path: &Path) -> Result<AnalysisReport, AnalyzerError> {
        let content = fs::read_to_string(path)?;
        let report = self.analyze(&content)?;
        debug!(
            path = %path.display(),
            rows = report.results.len(),
            time = %report.overall.time,
            "analyzed file"
        );
        Ok(report)
    }
}

impl Default for ComplexityAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisOptions::default())
    }
}

/// Analyze a piece of Rust source code with the default call table
pub fn analyze(code: &str, options: AnalysisOptions) -> Result<AnalysisReport, AnalyzerError> {
    ComplexityAnalyzer::new(options).analyze(code)
}

/// Get an iterator over all non-hidden rust files in `dir`
fn rs_files(dir: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(move |entry| {
            let file_path = entry.path();
            // strip parent dir to avoid false positives for `target` and hidden checks
            let file_path = file_path.strip_prefix(dir).unwrap_or(file_path);

            // Skip target directory and hidden directories
            !file_path.components().any(|c| {
                let s = c.as_os_str().to_string_lossy();
                s == "target" || s.starts_with('.')
            }) && file_path.extension() == Some(OsStr::new("rs"))
        })
        .map(|e| e.path().to_path_buf())
}

/// Analyze a file, or every `.rs` file below a directory
pub fn analyze_project(
    path: &Path,
    analyzer: &ComplexityAnalyzer,
) -> Result<ProjectReport, AnalyzerError> {
    analyze_project_filtered(path, analyzer, |_| true)
}

/// Like [`analyze_project`], keeping only files for which `include`
/// returns true (paths as found on disk, below `path`)
pub fn analyze_project_filtered<F>(
    path: &Path,
    analyzer: &ComplexityAnalyzer,
    include: F,
) -> Result<ProjectReport, AnalyzerError>
where
    F: Fn(&Path) -> bool,
{
    if !path.exists() {
        return Err(AnalyzerError::InvalidPath(path.display().to_string()));
    }

    let file_paths: Vec<PathBuf> = if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        rs_files(path)
            .filter(|file| include(file))
            .collect()
    };
    info!(files = file_paths.len(), path = %path.display(), "analyzing project");

    let analyzed: Vec<(PathBuf, Result<AnalysisReport, AnalyzerError>)> = file_paths
        .into_par_iter()
        .map(|file| {
            let result = analyzer.analyze_file(&file);
            (file, result)
        })
        .collect();

    let mut project = ProjectReport {
        clean: analyzer.options().clean,
        ..ProjectReport::default()
    };
    for (file, result) in analyzed {
        match result {
            Ok(report) => project.files.push(FileReport { path: file, report }),
            Err(e) => {
                warn!(path = %file.display(), error = %e, "skipping file");
                project.failures.push(FileFailure {
                    path: file,
                    error: e.to_string(),
                });
            }
        }
    }
    project.files.sort_by(|a, b| a.path.cmp(&b.path));
    project.failures.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(project)
}
