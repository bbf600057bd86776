//! Symbolic growth-rate algebra
//!
//! A [`ComplexityExpr`] is a sum of monomial [`Term`]s over the input-size
//! symbol `n`. Three operations drive the whole analysis:
//!
//! - `add`: sequential composition (run A, then B)
//! - `multiply`: repetition (a loop body executed some number of times)
//! - `max`: mutually exclusive branches (worst case of if/else)
//!
//! Every operation returns a freshly normalized expression: like terms are
//! merged and the leading term is cached by evaluating each term at a large
//! probe value of `n`.
//!
//! ```text
//! (2*n + 3) + (n^2 + 2 + n)  =  5 + 3*n + n^2      leading: n^2
//! (n^2 + 2*n) * (n + 2)      =  4*n + 4*n^2 + n^3  leading: n^3
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Value substituted for `n` when ranking terms
pub const PROBE: f64 = 1_000_000_000.0;

/// Largest `k` accepted in `n^k` when parsing
pub const MAX_EXPONENT: usize = 64;

/// Errors produced when parsing a complexity expression from text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComplexityParseError {
    #[error("Empty term in expression: {0:?}")]
    EmptyTerm(String),

    #[error("Empty factor in term: {0:?}")]
    EmptyFactor(String),

    #[error("Unknown factor: {0:?}")]
    UnknownFactor(String),

    #[error("Invalid exponent in factor: {0:?}")]
    InvalidExponent(String),
}

/// An atomic growth symbol
///
/// The derived ordering is the canonical factor order used when terms are
/// simplified and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Factor {
    /// The input size `n`
    N,
    /// `log(n)`, base 10 when evaluated
    Log,
    /// `base^n`
    Exp(u32),
}

impl Factor {
    fn value_at(self, n: f64) -> f64 {
        match self {
            Factor::N => n,
            Factor::Log => n.log10(),
            Factor::Exp(base) => f64::from(base).powf(n),
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factor::N => write!(f, "n"),
            Factor::Log => write!(f, "log(n)"),
            Factor::Exp(base) => write!(f, "{}^n", base),
        }
    }
}

/// A monomial: coefficient times a multiset of factors
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    coefficient: u64,
    factors: Vec<Factor>,
}

impl Term {
    /// Create a term; factors are sorted into canonical order
    pub fn new(coefficient: u64, factors: impl IntoIterator<Item = Factor>) -> Self {
        let mut factors: Vec<Factor> = factors.into_iter().collect();
        factors.sort_unstable();
        Self {
            coefficient,
            factors,
        }
    }

    /// A term with no symbolic factors
    pub fn constant(value: u64) -> Self {
        Self {
            coefficient: value,
            factors: Vec::new(),
        }
    }

    pub fn coefficient(&self) -> u64 {
        self.coefficient
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    pub fn is_constant(&self) -> bool {
        self.factors.is_empty()
    }

    /// Number of `n` factors (the polynomial degree of this term)
    pub fn degree(&self) -> usize {
        self.factors.iter().filter(|f| **f == Factor::N).count()
    }

    fn times(&self, other: &Term) -> Term {
        Term::new(
            self.coefficient.saturating_mul(other.coefficient),
            self.factors.iter().chain(&other.factors).copied(),
        )
    }

    fn value_at(&self, n: f64) -> f64 {
        if self.coefficient == 0 {
            return 0.0;
        }
        self.coefficient as f64 * self.growth_at(n)
    }

    /// Value of the factors alone, ignoring the coefficient
    fn growth_at(&self, n: f64) -> f64 {
        self.factors
            .iter()
            .fold(1.0, |acc, factor| acc * factor.value_at(n))
    }

    /// Render the growth shape: factors without separators, runs of `n`
    /// collapsed into `n^k`
    fn shape(&self, clean: bool) -> String {
        if self.is_constant() {
            return if clean {
                "1".to_string()
            } else {
                self.coefficient.to_string()
            };
        }

        let mut shape = String::new();
        if !clean && self.coefficient != 1 {
            shape.push_str(&self.coefficient.to_string());
        }

        match self.degree() {
            0 => {}
            1 => shape.push('n'),
            k => shape.push_str(&format!("n^{}", k)),
        }
        for factor in self.factors.iter().filter(|f| **f != Factor::N) {
            shape.push_str(&factor.to_string());
        }
        shape
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constant() {
            return write!(f, "{}", self.coefficient);
        }

        let mut parts = Vec::new();
        if self.coefficient != 1 {
            parts.push(self.coefficient.to_string());
        }
        match self.degree() {
            0 => {}
            1 => parts.push("n".to_string()),
            k => parts.push(format!("n^{}", k)),
        }
        parts.extend(
            self.factors
                .iter()
                .filter(|factor| **factor != Factor::N)
                .map(ToString::to_string),
        );
        write!(f, "{}", parts.join("*"))
    }
}

/// A normalized sum of terms with a cached leading term
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexityExpr {
    terms: Vec<Term>,
    leading: usize,
    leading_value: f64,
}

impl ComplexityExpr {
    /// The identity cost `1`
    pub fn one() -> Self {
        Self::constant(1)
    }

    pub fn constant(value: u64) -> Self {
        Self::from_terms([Term::constant(value)])
    }

    /// `n`
    pub fn linear() -> Self {
        Self::from_terms([Term::new(1, [Factor::N])])
    }

    /// `n*log(n)`
    pub fn linearithmic() -> Self {
        Self::from_terms([Term::new(1, [Factor::N, Factor::Log])])
    }

    /// Build a normalized expression; no terms means the identity `1`
    pub fn from_terms(terms: impl IntoIterator<Item = Term>) -> Self {
        let mut terms: Vec<Term> = terms.into_iter().collect();
        if terms.is_empty() {
            terms.push(Term::constant(1));
        }

        let terms = simplify(terms);
        let (leading, leading_value) = rank(&terms);
        Self {
            terms,
            leading,
            leading_value,
        }
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn leading_term(&self) -> &Term {
        &self.terms[self.leading]
    }

    /// Value of the leading term at [`PROBE`]
    pub fn leading_value(&self) -> f64 {
        self.leading_value
    }

    /// Sequential composition
    #[allow(clippy::should_implement_trait)]
    pub fn add(&self, other: &ComplexityExpr) -> ComplexityExpr {
        Self::from_terms(self.terms.iter().chain(&other.terms).cloned())
    }

    /// Repetition: every term of `self` times every term of `other`
    pub fn multiply(&self, other: &ComplexityExpr) -> ComplexityExpr {
        Self::from_terms(
            self.terms
                .iter()
                .flat_map(|left| other.terms.iter().map(move |right| left.times(right))),
        )
    }

    /// Worst case of two alternatives
    ///
    /// Keeps whichever whole expression has the larger cached leading value;
    /// ties go to `other`.
    pub fn max(self, other: ComplexityExpr) -> ComplexityExpr {
        if self.leading_value > other.leading_value {
            self
        } else {
            other
        }
    }

    /// Whether this expression's rendered shape grows strictly faster than
    /// `other`'s
    ///
    /// Coefficients are ignored, so `3*n^2` does not exceed `n^2`.
    pub fn exceeds(&self, other: &ComplexityExpr) -> bool {
        self.leading_term().growth_at(PROBE) > other.leading_term().growth_at(PROBE)
    }

    /// Format the leading term as `O(<shape>)`
    ///
    /// With `clean` the coefficient is dropped (`O(n^2)`), otherwise it is
    /// kept (`O(43n^2)`).
    pub fn render(&self, clean: bool) -> String {
        format!("O({})", self.leading_term().shape(clean))
    }
}

impl Default for ComplexityExpr {
    fn default() -> Self {
        Self::one()
    }
}

impl fmt::Display for ComplexityExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self.terms.iter().map(ToString::to_string).collect();
        write!(f, "{}", terms.join(" + "))
    }
}

impl FromStr for ComplexityExpr {
    type Err = ComplexityParseError;

    /// Parse `3*n^2 + n*log(n) + 2^n` style text
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let terms = s
            .split('+')
            .map(|term| parse_term(term, s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_terms(terms))
    }
}

fn parse_term(text: &str, expression: &str) -> Result<Term, ComplexityParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ComplexityParseError::EmptyTerm(expression.to_string()));
    }

    let mut coefficient: u64 = 1;
    let mut factors = Vec::new();

    for raw in text.split('*') {
        let factor = raw.trim();
        if factor.is_empty() {
            return Err(ComplexityParseError::EmptyFactor(text.to_string()));
        }

        if let Ok(value) = factor.parse::<u64>() {
            coefficient = coefficient.saturating_mul(value);
            continue;
        }

        match factor {
            "n" => factors.push(Factor::N),
            "log(n)" => factors.push(Factor::Log),
            _ => {
                if let Some(exponent) = factor.strip_prefix("n^") {
                    let power: usize = exponent
                        .parse()
                        .ok()
                        .filter(|power| *power <= MAX_EXPONENT)
                        .ok_or_else(|| ComplexityParseError::InvalidExponent(factor.to_string()))?;
                    factors.extend(std::iter::repeat_n(Factor::N, power));
                } else if let Some(base) = factor.strip_suffix("^n") {
                    let base: u32 = base
                        .parse()
                        .map_err(|_| ComplexityParseError::InvalidExponent(factor.to_string()))?;
                    factors.push(Factor::Exp(base));
                } else {
                    return Err(ComplexityParseError::UnknownFactor(factor.to_string()));
                }
            }
        }
    }

    Ok(Term::new(coefficient, factors))
}

/// Merge terms with identical factor multisets
///
/// Output order is canonical: the constant term first, then by factor list.
fn simplify(terms: Vec<Term>) -> Vec<Term> {
    let mut merged: BTreeMap<Vec<Factor>, u64> = BTreeMap::new();
    for term in terms {
        let coefficient = merged.entry(term.factors).or_insert(0);
        *coefficient = coefficient.saturating_add(term.coefficient);
    }

    merged
        .into_iter()
        .map(|(factors, coefficient)| Term {
            coefficient,
            factors,
        })
        .collect()
}

/// Index and value of the strictly largest term at the probe
fn rank(terms: &[Term]) -> (usize, f64) {
    let mut leading = 0;
    let mut leading_value = f64::NEG_INFINITY;
    for (index, term) in terms.iter().enumerate() {
        let value = term.value_at(PROBE);
        if value > leading_value {
            leading = index;
            leading_value = value;
        }
    }
    (leading, leading_value)
}

/// Space and time cost of one syntax node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cost {
    pub space: ComplexityExpr,
    pub time: ComplexityExpr,
}

impl Cost {
    /// `O(1)` space and time
    pub fn identity() -> Self {
        Self::default()
    }

    /// Cost of running `self` and then `other`
    pub fn then(&self, other: &Cost) -> Cost {
        Cost {
            space: self.space.add(&other.space),
            time: self.time.add(&other.time),
        }
    }

    /// Worst case of two branches, space and time compared independently
    pub fn worst(self, other: Cost) -> Cost {
        Cost {
            space: self.space.max(other.space),
            time: self.time.max(other.time),
        }
    }
}
