//! CLI output functions for automation
//!
//! - Check: CI/CD complexity gate with exit codes
//! - JSON: Machine-readable output

use std::io::{self, Write};

use serde::Serialize;

use crate::complexity::ComplexityExpr;
use crate::report::{FileFailure, FileReport, Overall, ProjectReport};

// ============================================================================
// Check/Gate: CI/CD Complexity Budget
// ============================================================================

/// A file whose overall time exceeds the budget
#[derive(Debug, Clone, Serialize)]
pub struct BudgetViolation {
    pub path: String,
    pub time: String,
}

/// Check result with details
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub passed: bool,
    /// Rendered budget, e.g. `O(n^2)`
    pub budget: String,
    pub files_checked: usize,
    pub violations: Vec<BudgetViolation>,
}

/// Compare every file's overall time against `max_time`
///
/// Only growth shapes are compared: a file rendered `O(n^2)` passes an
/// `n^2` budget whatever its coefficient.
pub fn run_check(project: &ProjectReport, max_time: &ComplexityExpr) -> CheckResult {
    let violations: Vec<BudgetViolation> = project
        .files
        .iter()
        .filter(|file| file.report.totals.time.exceeds(max_time))
        .map(|file| BudgetViolation {
            path: file.path.display().to_string(),
            time: file.report.overall.time.clone(),
        })
        .collect();

    CheckResult {
        passed: violations.is_empty(),
        budget: max_time.render(project.clean),
        files_checked: project.files.len(),
        violations,
    }
}

/// Generate check output and return exit code (0 = pass, 1 = fail)
pub fn generate_check_output<W: Write>(
    project: &ProjectReport,
    max_time: &ComplexityExpr,
    writer: &mut W,
) -> io::Result<i32> {
    let result = run_check(project, max_time);

    writeln!(writer, "Complexity Budget Gate")?;
    writeln!(
        writer,
        "═══════════════════════════════════════════════════════════"
    )?;

    let status = if result.passed {
        "✅ PASSED"
    } else {
        "❌ FAILED"
    };
    writeln!(writer, "Budget: time {}  {}", result.budget, status)?;

    writeln!(writer)?;
    writeln!(writer, "Metrics:")?;
    writeln!(writer, "  Files checked: {}", result.files_checked)?;
    writeln!(writer, "  Files skipped: {}", project.failures.len())?;
    if let Some(worst) = project.worst_overall() {
        writeln!(writer, "  Worst-case time: {}", worst.time)?;
    }

    if !result.passed {
        writeln!(writer)?;
        writeln!(writer, "Over Budget:")?;
        for violation in &result.violations {
            writeln!(writer, "  - {}: {}", violation.path, violation.time)?;
        }
    }

    Ok(if result.passed { 0 } else { 1 })
}

// ============================================================================
// JSON Output
// ============================================================================

/// Complete analysis in JSON format
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    pub summary: JsonSummary,
    pub files: &'a [FileReport],
    pub failures: &'a [FileFailure],
    /// Budget check, when a budget was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<&'a CheckResult>,
}

/// Summary in JSON format
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    pub total_files: usize,
    pub analyzed_files: usize,
    pub skipped_files: usize,
    pub clean: bool,
    pub worst_case: Option<Overall>,
}

/// Generate complete JSON output
pub fn generate_json_output<W: Write>(
    project: &ProjectReport,
    check: Option<&CheckResult>,
    writer: &mut W,
) -> io::Result<()> {
    let output = JsonOutput {
        summary: JsonSummary {
            total_files: project.total_files(),
            analyzed_files: project.files.len(),
            skipped_files: project.failures.len(),
            clean: project.clean,
            worst_case: project.worst_overall(),
        },
        files: &project.files,
        failures: &project.failures,
        check,
    };

    let json = serde_json::to_string_pretty(&output).map_err(io::Error::other)?;
    writeln!(writer, "{}", json)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::ComplexityAnalyzer;
    use std::path::PathBuf;

    fn project() -> ProjectReport {
        let analyzer = ComplexityAnalyzer::default();
        let file = |path: &str, code: &str| FileReport {
            path: PathBuf::from(path),
            report: analyzer.analyze(code).unwrap(),
        };

        ProjectReport {
            files: vec![
                file("src/pairs.rs", "fn pairs(v: &[i32]) { for a in v { for b in v {} } }"),
                file("src/scan.rs", "fn scan(v: &[i32]) { for x in v {} }"),
            ],
            failures: vec![FileFailure {
                path: PathBuf::from("src/broken.rs"),
                error: "Parse error: expected `)`".to_string(),
            }],
            clean: true,
        }
    }

    #[test]
    fn test_check_passes_within_budget() {
        let result = run_check(&project(), &"n^2".parse().unwrap());
        assert!(result.passed);
        assert_eq!(result.budget, "O(n^2)");
        assert_eq!(result.files_checked, 2);
    }

    #[test]
    fn test_check_reports_files_over_budget() {
        let result = run_check(&project(), &"n".parse().unwrap());
        assert!(!result.passed);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].path, "src/pairs.rs");
        assert_eq!(result.violations[0].time, "O(n^2)");
    }

    #[test]
    fn test_check_ignores_coefficients() {
        let analyzer = ComplexityAnalyzer::default();
        let busy = FileReport {
            path: PathBuf::from("src/busy.rs"),
            report: analyzer
                .analyze(
                    r#"
                    fn busy(v: &[i32]) -> i32 {
                        let mut s = 0;
                        for a in v {
                            for b in v {
                                s += a;
                                s += b;
                                s -= a * b;
                            }
                        }
                        s
                    }
                    "#,
                )
                .unwrap(),
        };
        assert_eq!(busy.report.overall.time, "O(n^2)");
        assert_ne!(busy.report.totals.time.leading_term().coefficient(), 1);

        let project = ProjectReport {
            files: vec![busy],
            clean: true,
            ..ProjectReport::default()
        };
        let result = run_check(&project, &"n^2".parse().unwrap());
        assert!(result.passed, "{:?}", result.violations);
        assert!(!run_check(&project, &"n*log(n)".parse().unwrap()).passed);
    }

    #[test]
    fn test_check_passes_on_empty() {
        let result = run_check(&ProjectReport::default(), &ComplexityExpr::one());
        assert!(result.passed);
    }

    #[test]
    fn test_generate_check_output_exit_code() {
        let mut output = Vec::new();
        let code = generate_check_output(&project(), &"n".parse().unwrap(), &mut output).unwrap();
        assert_eq!(code, 1);

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("Complexity Budget Gate"));
        assert!(output_str.contains("FAILED"));
        assert!(output_str.contains("src/pairs.rs: O(n^2)"));

        let mut output = Vec::new();
        let code = generate_check_output(&project(), &"n^3".parse().unwrap(), &mut output).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_json_output() {
        let mut output = Vec::new();
        generate_json_output(&project(), None, &mut output).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert!(value.get("check").is_none());
        assert_eq!(value["summary"]["total_files"], 3);
        assert_eq!(value["summary"]["worst_case"]["time"], "O(n^2)");
        assert_eq!(value["files"][0]["path"], "src/pairs.rs");
        assert_eq!(value["files"][0]["overall"]["time"], "O(n^2)");
        assert_eq!(value["files"][0]["results"][0]["kind"], "Block");
        assert_eq!(value["failures"][0]["path"], "src/broken.rs");
    }

    #[test]
    fn test_json_output_includes_check() {
        let project = project();
        let check = run_check(&project, &"n".parse().unwrap());

        let mut output = Vec::new();
        generate_json_output(&project, Some(&check), &mut output).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["check"]["passed"], false);
        assert_eq!(value["check"]["budget"], "O(n)");
        assert_eq!(value["check"]["violations"][0]["path"], "src/pairs.rs");
    }
}
