//! Known method-call costs
//!
//! Method calls are looked up by member name only; the receiver's type is
//! unknown to a purely syntactic pass, so `v.sort()` is charged `n*log(n)`
//! whatever `v` is.

use std::collections::HashMap;

use crate::complexity::ComplexityExpr;

/// Searching, transforming, filtering, reducing and iterating: `O(n)`
pub const LINEAR_FAMILY: &[&str] = &[
    "contains", "position", "find", "map", "filter", "retain", "fold", "reduce", "sum", "for_each",
];

/// Comparison sorts: `O(n*log(n))`
pub const SORT_FAMILY: &[&str] = &[
    "sort",
    "sort_unstable",
    "sort_by",
    "sort_by_key",
    "sort_unstable_by",
    "sort_unstable_by_key",
];

/// Member name -> time cost
#[derive(Debug, Clone)]
pub struct CallTable {
    costs: HashMap<String, ComplexityExpr>,
}

impl CallTable {
    /// A table that knows no calls (every call costs `O(1)`)
    pub fn empty() -> Self {
        Self {
            costs: HashMap::new(),
        }
    }

    /// Register or replace the cost of a member; returns the previous cost
    pub fn insert(
        &mut self,
        member: impl Into<String>,
        cost: ComplexityExpr,
    ) -> Option<ComplexityExpr> {
        self.costs.insert(member.into(), cost)
    }

    /// Time cost of calling `member`, `O(1)` when unknown
    pub fn cost_of(&self, member: &str) -> ComplexityExpr {
        self.costs.get(member).cloned().unwrap_or_default()
    }

    pub fn contains(&self, member: &str) -> bool {
        self.costs.contains_key(member)
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }
}

impl Default for CallTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for member in LINEAR_FAMILY {
            table.insert(*member, ComplexityExpr::linear());
        }
        for member in SORT_FAMILY {
            table.insert(*member, ComplexityExpr::linearithmic());
        }
        table
    }
}

impl Extend<(String, ComplexityExpr)> for CallTable {
    fn extend<I: IntoIterator<Item = (String, ComplexityExpr)>>(&mut self, iter: I) {
        self.costs.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_families() {
        let table = CallTable::default();
        assert_eq!(table.len(), LINEAR_FAMILY.len() + SORT_FAMILY.len());
        assert_eq!(table.cost_of("filter").render(true), "O(n)");
        assert_eq!(table.cost_of("sort_by_key").render(true), "O(nlog(n))");
    }

    #[test]
    fn test_unknown_member_is_constant() {
        let table = CallTable::default();
        assert!(!table.contains("frobnicate"));
        assert_eq!(table.cost_of("frobnicate"), ComplexityExpr::one());
    }

    #[test]
    fn test_overrides_replace_defaults() {
        let mut table = CallTable::default();
        table.extend([
            ("sort".to_string(), ComplexityExpr::linear()),
            ("binary_search".to_string(), "log(n)".parse().unwrap()),
        ]);

        assert_eq!(table.cost_of("sort").render(true), "O(n)");
        assert_eq!(table.cost_of("binary_search").render(true), "O(log(n))");
    }

    #[test]
    fn test_empty_table() {
        let table = CallTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.cost_of("sort").render(true), "O(1)");
    }
}
