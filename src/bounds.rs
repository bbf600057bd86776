//! Loop-bound estimation
//!
//! Converts a loop head into an estimated iteration count. The cost visitor
//! only sees the [`LoopBoundPolicy`] trait, so a sharper heuristic can be
//! swapped in through `ComplexityAnalyzer::with_bound_policy`.

use syn::{Expr, Pat};
use tracing::trace;

use crate::complexity::ComplexityExpr;

/// The part of a loop that decides how often its body runs
#[derive(Clone, Copy)]
pub enum LoopHead<'ast> {
    /// `for pat in iterable { .. }`
    For {
        pat: &'ast Pat,
        iterable: &'ast Expr,
    },
    /// `while condition { .. }` and `while let`
    While { condition: &'ast Expr },
    /// `loop { .. }`
    Unbounded,
}

impl LoopHead<'_> {
    /// Short description of the head's shape, for logging
    pub fn shape(&self) -> &'static str {
        match self {
            LoopHead::For {
                iterable: Expr::Range(_),
                ..
            } => "range",
            LoopHead::For { .. } => "iterator",
            LoopHead::While {
                condition: Expr::Binary(_),
            } => "comparison",
            LoopHead::While {
                condition: Expr::Let(_),
            } => "pattern",
            LoopHead::While { .. } => "condition",
            LoopHead::Unbounded => "unbounded",
        }
    }
}

/// Estimates how many times a loop body executes
pub trait LoopBoundPolicy: Send + Sync {
    fn iterations(&self, head: LoopHead<'_>) -> ComplexityExpr;
}

/// Assumes every loop runs `n` times, whatever its head looks like
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearBound;

impl LoopBoundPolicy for LinearBound {
    fn iterations(&self, head: LoopHead<'_>) -> ComplexityExpr {
        trace!(shape = head.shape(), "assuming linear iteration count");
        ComplexityExpr::linear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_bound_ignores_head_shape() {
        let counted: syn::ExprForLoop = syn::parse_str("for _ in 0..10 {}").unwrap();
        let scan: syn::ExprWhile = syn::parse_str("while i < items.len() {}").unwrap();
        let flag: syn::ExprWhile = syn::parse_str("while running {}").unwrap();

        let heads = [
            LoopHead::For {
                pat: &counted.pat,
                iterable: &counted.expr,
            },
            LoopHead::While {
                condition: &scan.cond,
            },
            LoopHead::While {
                condition: &flag.cond,
            },
            LoopHead::Unbounded,
        ];

        for head in heads {
            assert_eq!(LinearBound.iterations(head), ComplexityExpr::linear());
        }
    }

    #[test]
    fn test_head_shapes() {
        let counted: syn::ExprForLoop = syn::parse_str("for i in 0..n {}").unwrap();
        let scan: syn::ExprWhile = syn::parse_str("while i < n {}").unwrap();
        let drain: syn::ExprWhile = syn::parse_str("while let Some(x) = stack.pop() {}").unwrap();

        let range = LoopHead::For {
            pat: &counted.pat,
            iterable: &counted.expr,
        };
        assert_eq!(range.shape(), "range");
        assert_eq!(
            LoopHead::While {
                condition: &scan.cond
            }
            .shape(),
            "comparison"
        );
        assert_eq!(
            LoopHead::While {
                condition: &drain.cond
            }
            .shape(),
            "pattern"
        );
        assert_eq!(LoopHead::Unbounded.shape(), "unbounded");
    }
}
