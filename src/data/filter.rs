use std::collections::BTreeSet;

use super::model::{Category, Measure, Opportunity, Table, YearField};

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// A single row predicate.
///
/// A row whose value for the filtered field is null never matches.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Value must be one of `allowed`. An empty set matches nothing.
    Membership {
        field: Category,
        allowed: BTreeSet<String>,
    },
    /// `low <= value <= high`.
    Range { field: Measure, low: f64, high: f64 },
    /// `low <= year <= high`.
    YearRange {
        field: YearField,
        low: i32,
        high: i32,
    },
}

impl Predicate {
    pub fn matches(&self, row: &Opportunity) -> bool {
        match self {
            Predicate::Membership { field, allowed } => row
                .category(*field)
                .is_some_and(|value| allowed.contains(value)),
            Predicate::Range { field, low, high } => row
                .measure(*field)
                .is_some_and(|value| *low <= value && value <= *high),
            Predicate::YearRange { field, low, high } => row
                .year(*field)
                .is_some_and(|year| (*low..=*high).contains(&year)),
        }
    }
}

/// Conjunction of predicates. The empty set matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn with_membership<I, S>(self, field: Category, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(Predicate::Membership {
            field,
            allowed: allowed.into_iter().map(Into::into).collect(),
        })
    }

    pub fn with_range(self, field: Measure, low: f64, high: f64) -> Self {
        self.with(Predicate::Range { field, low, high })
    }

    pub fn with_year_range(self, field: YearField, low: i32, high: i32) -> Self {
        self.with(Predicate::YearRange { field, low, high })
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches(&self, row: &Opportunity) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }
}

// ---------------------------------------------------------------------------
// Applying a predicate set
// ---------------------------------------------------------------------------

/// Return indices of rows that pass every predicate, in input order.
pub fn filtered_indices(table: &Table, predicates: &PredicateSet) -> Vec<usize> {
    table
        .iter()
        .enumerate()
        .filter(|(_, row)| predicates.matches(row))
        .map(|(i, _)| i)
        .collect()
}

/// Build a new table holding the rows that pass every predicate.
/// Row order is preserved and `table` is left untouched.
pub fn filter(table: &Table, predicates: &PredicateSet) -> Table {
    table
        .iter()
        .filter(|row| predicates.matches(row))
        .cloned()
        .collect()
}
