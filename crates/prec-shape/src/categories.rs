//! Truth-matching categories per regime.
//!
//! Predicates are built as typed trees of identity comparisons and rendered to
//! expression strings only at the boundary, so that a complement is a
//! structural negation rather than text substitution.

use std::fmt;

use prec_core::{ErrorInfo, PrecError, Regime};
use serde::{Deserialize, Serialize};

const BD: i64 = 511;
const BP: i64 = 521;
const BS: i64 = 531;
const JPSI: i64 = 443;
const PSI2S: i64 = 100443;
const KP: i64 = 321;
const KST0: i64 = 313;
const KSTP: i64 = 323;

/// Comparison of one identity column against a particle id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdMatch {
    column: String,
    id: i64,
    abs: bool,
    equal: bool,
}

impl IdMatch {
    /// `abs(column) == id`.
    pub fn abs(column: &str, id: i64) -> Self {
        Self {
            column: column.to_string(),
            id,
            abs: true,
            equal: true,
        }
    }

    /// `column == id`, sign-sensitive.
    pub fn exact(column: &str, id: i64) -> Self {
        Self {
            abs: false,
            ..Self::abs(column, id)
        }
    }

    fn negate(&self) -> Self {
        Self {
            equal: !self.equal,
            ..self.clone()
        }
    }
}

impl fmt::Display for IdMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.equal { "==" } else { "!=" };
        if self.abs {
            write!(f, "(abs({}) {op} {})", self.column, self.id)
        } else {
            write!(f, "({} {op} {})", self.column, self.id)
        }
    }
}

/// Boolean combination of identity matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Single comparison.
    Match(IdMatch),
    /// Conjunction.
    All(Vec<Predicate>),
    /// Disjunction.
    Any(Vec<Predicate>),
}

impl Predicate {
    /// Conjunction of `abs(column) == id` terms.
    pub fn abs_ids(terms: &[(&str, i64)]) -> Self {
        Predicate::all(terms.iter().map(|(c, id)| Predicate::Match(IdMatch::abs(c, *id))))
    }

    /// Conjunction, flattened when it has a single term.
    pub fn all(terms: impl IntoIterator<Item = Predicate>) -> Self {
        let mut terms: Vec<Predicate> = terms.into_iter().collect();
        if terms.len() == 1 {
            terms.remove(0)
        } else {
            Predicate::All(terms)
        }
    }

    /// Logical complement by De Morgan.
    pub fn negate(&self) -> Self {
        match self {
            Predicate::Match(m) => Predicate::Match(m.negate()),
            Predicate::All(terms) => Predicate::Any(terms.iter().map(Predicate::negate).collect()),
            Predicate::Any(terms) => Predicate::All(terms.iter().map(Predicate::negate).collect()),
        }
    }

    /// Expression text, e.g. `(abs(B_TRUEID) == 521) & (abs(H_TRUEID) == 321)`.
    pub fn render(&self) -> String {
        self.render_inner(false)
    }

    fn render_inner(&self, nested: bool) -> String {
        let (terms, sep) = match self {
            Predicate::Match(m) => return m.to_string(),
            Predicate::All(terms) => (terms, " & "),
            Predicate::Any(terms) => (terms, " | "),
        };
        let body = terms
            .iter()
            .map(|t| t.render_inner(true))
            .collect::<Vec<_>>()
            .join(sep);
        if nested && terms.len() > 1 {
            format!("({body})")
        } else {
            body
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// One named category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Display label, used as the component name.
    pub label: String,
    /// Row predicate.
    pub predicate: Predicate,
}

/// Ordered categories of one regime.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryMap {
    categories: Vec<Category>,
}

impl CategoryMap {
    fn from_pairs(pairs: Vec<(&str, Predicate)>) -> Self {
        Self {
            categories: pairs
                .into_iter()
                .map(|(label, predicate)| Category {
                    label: label.to_string(),
                    predicate,
                })
                .collect(),
        }
    }

    /// Categories in order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// True when no category is defined.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Category labels in order.
    pub fn labels(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.label.as_str()).collect()
    }

    /// Predicate string of `label`.
    pub fn predicate(&self, label: &str) -> Option<String> {
        self.categories
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.predicate.render())
    }

    /// Rows matching none of the categories.
    pub fn unmatched_predicate(&self) -> Predicate {
        Predicate::all(self.categories.iter().map(|c| c.predicate.negate()))
    }
}

/// Which decomposition of the background to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategoryScheme {
    /// Split by parent identity; `jpsi` and `psi2`.
    #[default]
    Default,
    /// Split of the inclusive psi2 mix by decay chain, with an explicit
    /// `unmatched` remainder.
    Detailed,
    /// psi2 only: true J/psi versus anything else.
    Inclusive,
}

impl CategoryScheme {
    /// Stable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryScheme::Default => "default",
            CategoryScheme::Detailed => "detailed",
            CategoryScheme::Inclusive => "inclusive",
        }
    }

    /// Resolves the category map for `regime`.
    pub fn categories(&self, regime: Regime) -> Result<CategoryMap, PrecError> {
        match (self, regime) {
            (CategoryScheme::Default, Regime::Jpsi) => Ok(jpsi_default()),
            (CategoryScheme::Default, Regime::Psi2) => Ok(psi2_default()),
            (CategoryScheme::Detailed, Regime::Psi2) => Ok(psi2_detailed()),
            (CategoryScheme::Inclusive, Regime::Psi2) => Ok(psi2_inclusive()),
            (scheme, regime) => Err(PrecError::Config(
                ErrorInfo::new(
                    "invalid-scheme",
                    format!("category scheme '{}' is not defined for regime '{regime}'", scheme.as_str()),
                )
                .with_context("scheme", scheme.as_str())
                .with_context("regime", regime.as_str())
                .with_hint("detailed and inclusive schemes exist for psi2 only"),
            )),
        }
    }
}

/// Default categories of `regime`.
pub fn categories_for(regime: Regime) -> Result<CategoryMap, PrecError> {
    CategoryScheme::Default.categories(regime)
}

fn parent(id: i64) -> Predicate {
    Predicate::abs_ids(&[("B_TRUEID", id)])
}

fn jpsi_default() -> CategoryMap {
    CategoryMap::from_pairs(vec![
        (r"$B_d\to c\bar{c}(\to ee)H_s$", parent(BD)),
        (r"$B^+\to c\bar{c}(\to ee)H_s$", parent(BP)),
        (r"$B_s\to c\bar{c}(\to ee)H_s$", parent(BS)),
    ])
}

fn psi2_default() -> CategoryMap {
    let bp_psjp = Predicate::abs_ids(&[
        ("B_TRUEID", BP),
        ("Jpsi_TRUEID", JPSI),
        ("Jpsi_MC_MOTHER_ID", PSI2S),
        ("Jpsi_MC_GD_MOTHER_ID", BP),
        ("H_MC_MOTHER_ID", BP),
    ]);
    let bp_other = Predicate::All(vec![parent(BP), bp_psjp.negate()]);
    CategoryMap::from_pairs(vec![
        (r"$B^+\to \psi(2S)(\to J/\psi X)H_{s}$", bp_psjp),
        (r"$B^+\to c\bar{c}(\to ee)H_s$", bp_other),
        (r"$B_d\to c\bar{c}(\to ee)H_s$", parent(BD)),
        (r"$B_s\to c\bar{c}(\to ee)H_s$", parent(BS)),
    ])
}

fn psi2_detailed() -> CategoryMap {
    let bp_psjp = Predicate::abs_ids(&[
        ("Jpsi_MC_MOTHER_ID", PSI2S),
        ("Jpsi_MC_GD_MOTHER_ID", BP),
        ("H_MC_MOTHER_ID", BP),
    ]);
    let bd_psks = Predicate::abs_ids(&[
        ("Jpsi_MC_MOTHER_ID", BD),
        ("H_MC_MOTHER_ID", KST0),
        ("H_MC_GD_MOTHER_ID", BD),
        ("Jpsi_TRUEID", PSI2S),
    ]);
    let bp_psks = Predicate::abs_ids(&[
        ("Jpsi_MC_MOTHER_ID", BP),
        ("H_MC_MOTHER_ID", KSTP),
        ("H_MC_GD_MOTHER_ID", BP),
        ("Jpsi_TRUEID", PSI2S),
    ]);
    let jpsi_k = |b: i64| Predicate::abs_ids(&[("B_TRUEID", b), ("H_TRUEID", KP), ("Jpsi_TRUEID", JPSI)]);
    let not_psi = |base: Predicate| {
        Predicate::All(vec![
            base,
            bp_psjp.negate(),
            bd_psks.negate(),
            bp_psks.negate(),
        ])
    };
    let unmatched = Predicate::All(vec![
        jpsi_k(BP).negate(),
        jpsi_k(BD).negate(),
        bp_psjp.negate(),
        bd_psks.negate(),
        bp_psks.negate(),
        parent(BS).negate(),
    ]);
    CategoryMap::from_pairs(vec![
        ("bp_psjp", bp_psjp.clone()),
        ("bp_psks", bp_psks.clone()),
        ("bp_jpkp", not_psi(jpsi_k(BP))),
        ("bd_psks", bd_psks.clone()),
        ("bd_jpkp", not_psi(jpsi_k(BD))),
        ("bs", parent(BS)),
        ("unmatched", unmatched),
    ])
}

fn psi2_inclusive() -> CategoryMap {
    CategoryMap::from_pairs(vec![
        ("jpsi", Predicate::Match(IdMatch::exact("Jpsi_TRUEID", JPSI))),
        ("nojpsi", Predicate::Match(IdMatch::exact("Jpsi_TRUEID", JPSI).negate())),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpsi_splits_by_parent() {
        let map = categories_for(Regime::Jpsi).expect("jpsi");
        assert_eq!(map.len(), 3);
        assert_eq!(
            map.predicate(r"$B^+\to c\bar{c}(\to ee)H_s$").as_deref(),
            Some("(abs(B_TRUEID) == 521)")
        );
    }

    #[test]
    fn psi2_complement_negates_the_chain() {
        let map = categories_for(Regime::Psi2).expect("psi2");
        assert_eq!(map.len(), 4);
        let other = map.predicate(r"$B^+\to c\bar{c}(\to ee)H_s$").expect("bp");
        assert_eq!(
            other,
            "(abs(B_TRUEID) == 521) & ((abs(B_TRUEID) != 521) | (abs(Jpsi_TRUEID) != 443) | \
             (abs(Jpsi_MC_MOTHER_ID) != 100443) | (abs(Jpsi_MC_GD_MOTHER_ID) != 521) | \
             (abs(H_MC_MOTHER_ID) != 521))"
        );
    }

    #[test]
    fn negation_is_involutive() {
        let p = Predicate::abs_ids(&[("B_TRUEID", BP), ("H_TRUEID", KP)]);
        assert_eq!(p.negate().negate(), p);
    }

    #[test]
    fn schemes_outside_psi2_are_rejected() {
        let err = CategoryScheme::Detailed
            .categories(Regime::Jpsi)
            .expect_err("detailed jpsi");
        assert_eq!(err.code(), "invalid-scheme");
        let map = CategoryScheme::Inclusive.categories(Regime::Psi2).expect("inclusive");
        assert_eq!(map.labels(), vec!["jpsi", "nojpsi"]);
        assert_eq!(map.predicate("nojpsi").as_deref(), Some("(Jpsi_TRUEID != 443)"));
    }
}
