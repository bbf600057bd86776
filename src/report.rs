//! Complexity reports
//!
//! [`AnalysisReport`] holds the per-node rows of one analyzed source plus its
//! overall complexity. [`ProjectReport`] groups the reports of every file in
//! a directory. The `generate_*` functions render them as Markdown or as a
//! short summary.

use std::io::{self, Write};
use std::path::PathBuf;

use proc_macro2::Span;
use serde::Serialize;

use crate::complexity::Cost;
use crate::syntax::NodeKind;

/// Source location of a recorded node
///
/// Lines are 1-based; a zero line means the location is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceSpan {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl SourceSpan {
    pub fn from_span(span: Span) -> Self {
        let start = span.start();
        let end = span.end();
        Self {
            start_line: start.line,
            start_column: start.column,
            end_line: end.line,
            end_column: end.column,
        }
    }

    pub fn line(&self) -> Option<usize> {
        (self.start_line > 0).then_some(self.start_line)
    }
}

/// One recorded syntax node
#[derive(Debug, Clone, Serialize)]
pub struct NodeResult {
    pub kind: NodeKind,
    pub line: Option<usize>,
    /// Enclosing subroutines, outermost first (`outer::closure`)
    pub scope: Option<String>,
    pub space: String,
    pub time: String,
    #[serde(skip)]
    pub span: SourceSpan,
}

impl NodeResult {
    /// `Line 12`, or `unknown`
    pub fn location(&self) -> String {
        match self.line {
            Some(line) => format!("Line {}", line),
            None => "unknown".to_string(),
        }
    }
}

/// Rendered complexity of a whole program
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overall {
    pub space: String,
    pub time: String,
}

/// Rows in post-order plus the program's overall complexity
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub results: Vec<NodeResult>,
    pub overall: Overall,
    /// Unrendered totals of the root node
    #[serde(skip)]
    pub totals: Cost,
}

impl AnalysisReport {
    pub fn new(results: Vec<NodeResult>, totals: Cost, clean: bool) -> Self {
        Self {
            results,
            overall: Overall {
                space: totals.space.render(clean),
                time: totals.time.render(clean),
            },
            totals,
        }
    }
}

/// Report for one file of a project
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub report: AnalysisReport,
}

/// A file that could not be read or parsed
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Reports for every analyzed file, sorted by path
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectReport {
    pub files: Vec<FileReport>,
    pub failures: Vec<FileFailure>,
    /// Whether rendered complexities drop coefficients
    #[serde(skip)]
    pub clean: bool,
}

impl ProjectReport {
    /// Worst overall space and time across all files
    pub fn worst_case(&self) -> Option<Cost> {
        self.files
            .iter()
            .map(|file| file.report.totals.clone())
            .reduce(Cost::worst)
    }

    /// Rendered worst case, `None` when no file was analyzed
    pub fn worst_overall(&self) -> Option<Overall> {
        self.worst_case().map(|cost| Overall {
            space: cost.space.render(self.clean),
            time: cost.time.render(self.clean),
        })
    }

    pub fn total_files(&self) -> usize {
        self.files.len() + self.failures.len()
    }
}

/// Generate a one-line-per-file summary
pub fn generate_summary<W: Write>(project: &ProjectReport, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "Worst-Case Complexity Analysis")?;
    writeln!(writer, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
    writeln!(writer)?;

    if project.files.is_empty() {
        writeln!(writer, "No files analyzed.")?;
    }

    for file in &project.files {
        writeln!(
            writer,
            "  {:<40} time {:<14} space {}",
            truncate_path(&file.path.display().to_string(), 40),
            file.report.overall.time,
            file.report.overall.space
        )?;
    }

    if let Some(worst) = project.worst_overall() {
        writeln!(writer)?;
        writeln!(
            writer,
            "Worst case: time {} | space {} | files: {}",
            worst.time,
            worst.space,
            project.files.len()
        )?;
    }

    if !project.failures.is_empty() {
        writeln!(writer, "Skipped {} file(s):", project.failures.len())?;
        for failure in &project.failures {
            writeln!(writer, "  - {}: {}", failure.path.display(), failure.error)?;
        }
    }

    Ok(())
}

/// Generate a full Markdown report with a per-node table for every file
pub fn generate_report<W: Write>(project: &ProjectReport, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "# Complexity Analysis Report\n")?;

    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "| Metric | Value |")?;
    writeln!(writer, "|--------|-------|")?;
    writeln!(writer, "| Files analyzed | {} |", project.files.len())?;
    writeln!(writer, "| Files skipped | {} |", project.failures.len())?;
    if let Some(worst) = project.worst_overall() {
        writeln!(writer, "| Worst-case time | {} |", worst.time)?;
        writeln!(writer, "| Worst-case space | {} |", worst.space)?;
    }
    writeln!(writer)?;

    for file in &project.files {
        writeln!(writer, "## {}\n", file.path.display())?;
        write_analysis(&file.report, writer)?;
    }

    if !project.failures.is_empty() {
        writeln!(writer, "## Skipped Files\n")?;
        for failure in &project.failures {
            writeln!(writer, "- `{}`: {}", failure.path.display(), failure.error)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

/// Write the overall line and node table of a single report
pub fn write_analysis<W: Write>(report: &AnalysisReport, writer: &mut W) -> io::Result<()> {
    writeln!(
        writer,
        "**Overall:** time {}, space {}\n",
        report.overall.time, report.overall.space
    )?;

    if report.results.is_empty() {
        return Ok(());
    }

    writeln!(writer, "| Kind | Line | Scope | Space | Time |")?;
    writeln!(writer, "|------|------|-------|-------|------|")?;
    for row in &report.results {
        writeln!(
            writer,
            "| {} | {} | {} | {} | {} |",
            row.kind,
            row.location(),
            row.scope.as_deref().unwrap_or("-"),
            row.space,
            row.time
        )?;
    }
    writeln!(writer)?;

    Ok(())
}

fn truncate_path(path: &str, max_len: usize) -> String {
    let chars: Vec<char> = path.chars().collect();
    if chars.len() <= max_len {
        path.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}
