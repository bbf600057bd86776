//! # cargo-worstcase - Worst-Case Complexity Estimator
//!
//! A tool for statically estimating the asymptotic time and space
//! complexity of Rust source code.
//!
//! ## Overview
//!
//! cargo-worstcase walks the syntax tree of each file and assigns every
//! node a (space, time) cost built from a small symbolic algebra:
//!
//! 1. **Sequence** - statements run one after another add up
//! 2. **Iteration** - a loop multiplies its body by an estimated bound
//! 3. **Conditional** - branches keep the worst alternative
//!
//! ## Usage
//!
//! ```bash
//! # Analyze current project (as cargo subcommand)
//! cargo worstcase ./src
//!
//! # Generate detailed report
//! cargo worstcase -o report.md ./src
//!
//! # Fail CI when any file is worse than quadratic
//! cargo worstcase --max-time "n^2" ./src
//! ```
//!
//! ## Library
//!
//! ```
//! use cargo_worstcase::{AnalysisOptions, analyze};
//!
//! let report = analyze(
//!     "fn f(v: &[i32]) { for a in v { for b in v {} } }",
//!     AnalysisOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(report.overall.time, "O(n^2)");
//! ```

pub mod analyzer;
pub mod bounds;
pub mod calls;
pub mod cli_output;
pub mod complexity;
pub mod config;
pub mod report;
pub mod syntax;

pub use analyzer::{
    AnalysisOptions, AnalyzerError, ComplexityAnalyzer, analyze, analyze_project,
    analyze_project_filtered,
};
pub use bounds::{LinearBound, LoopBoundPolicy, LoopHead};
pub use calls::CallTable;
pub use cli_output::{
    BudgetViolation, CheckResult, generate_check_output, generate_json_output, run_check,
};
pub use complexity::{ComplexityExpr, ComplexityParseError, Cost, Factor, Term};
pub use config::{
    AnalysisConfig, CompiledConfig, ConfigError, ThresholdsConfig, WorstcaseConfig,
    load_compiled_config, load_compiled_config_file, load_config, load_config_file,
};
pub use report::{
    AnalysisReport, FileFailure, FileReport, NodeResult, Overall, ProjectReport, generate_report,
    generate_summary, write_analysis,
};
pub use syntax::NodeKind;
