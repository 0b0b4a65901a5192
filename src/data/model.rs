use std::collections::HashSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Stage value that marks an opportunity as won.
pub const WON_STAGE: &str = "Closed Won";
/// Stage value that marks an opportunity as lost.
pub const LOST_STAGE: &str = "Closed Lost";

// ---------------------------------------------------------------------------
// Field selectors
// ---------------------------------------------------------------------------

/// Categorical columns that can be grouped on or filtered by membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Account,
    Owner,
    Stage,
    Type,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Account,
        Category::Owner,
        Category::Stage,
        Category::Type,
    ];

    /// Header of the source column holding this field.
    pub fn column_name(self) -> &'static str {
        match self {
            Category::Account => "Account",
            Category::Owner => "Opportunity Owner",
            Category::Stage => "Stage",
            Category::Type => "Type",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Numeric fields usable in range predicates and sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Measure {
    Amount,
    SalesCycleDuration,
}

/// Derived year fields usable in year-range predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum YearField {
    Created,
    Closed,
}

/// Boolean classification flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Flag {
    Won,
    Lost,
}

// ---------------------------------------------------------------------------
// Opportunity – one row of the source table
// ---------------------------------------------------------------------------

/// Source values of one opportunity, before derived fields are computed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewOpportunity {
    pub account: Option<String>,
    pub owner: Option<String>,
    pub stage: Option<String>,
    pub kind: Option<String>,
    pub amount: f64,
    pub created_date: Option<NaiveDate>,
    pub close_date: Option<NaiveDate>,
}

/// A single sales opportunity.
///
/// Derived fields are computed once in [`From<NewOpportunity>`] and there is
/// no way to change them afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    account: Option<String>,
    owner: Option<String>,
    stage: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    amount: f64,
    created_date: Option<NaiveDate>,
    close_date: Option<NaiveDate>,
    sales_cycle_duration: Option<i64>,
    year_created: Option<i32>,
    year_closed: Option<i32>,
    won: bool,
}

impl From<NewOpportunity> for Opportunity {
    fn from(src: NewOpportunity) -> Self {
        let sales_cycle_duration = src
            .close_date
            .zip(src.created_date)
            .map(|(close, created)| (close - created).num_days());
        let won = src.stage.as_deref() == Some(WON_STAGE);

        Opportunity {
            year_created: src.created_date.map(|d| d.year()),
            year_closed: src.close_date.map(|d| d.year()),
            sales_cycle_duration,
            won,
            account: src.account,
            owner: src.owner,
            stage: src.stage,
            kind: src.kind,
            amount: src.amount,
            created_date: src.created_date,
            close_date: src.close_date,
        }
    }
}

impl Opportunity {
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn stage(&self) -> Option<&str> {
        self.stage.as_deref()
    }

    /// Opportunity type (the `Type` column).
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn created_date(&self) -> Option<NaiveDate> {
        self.created_date
    }

    pub fn close_date(&self) -> Option<NaiveDate> {
        self.close_date
    }

    /// Days between creation and close; `None` when either date is unknown.
    pub fn sales_cycle_duration(&self) -> Option<i64> {
        self.sales_cycle_duration
    }

    pub fn year_created(&self) -> Option<i32> {
        self.year_created
    }

    pub fn year_closed(&self) -> Option<i32> {
        self.year_closed
    }

    pub fn won(&self) -> bool {
        self.won
    }

    pub fn lost(&self) -> bool {
        self.stage.as_deref() == Some(LOST_STAGE)
    }

    pub fn category(&self, field: Category) -> Option<&str> {
        match field {
            Category::Account => self.account(),
            Category::Owner => self.owner(),
            Category::Stage => self.stage(),
            Category::Type => self.kind(),
        }
    }

    pub fn measure(&self, field: Measure) -> Option<f64> {
        match field {
            Measure::Amount => Some(self.amount),
            Measure::SalesCycleDuration => self.sales_cycle_duration.map(|d| d as f64),
        }
    }

    pub fn year(&self, field: YearField) -> Option<i32> {
        match field {
            YearField::Created => self.year_created,
            YearField::Closed => self.year_closed,
        }
    }

    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::Won => self.won,
            Flag::Lost => self.lost(),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – an immutable, ordered set of opportunities
// ---------------------------------------------------------------------------

/// Rows sharing the opportunity schema. Never modified after construction;
/// filters build new tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    rows: Vec<Opportunity>,
}

impl Table {
    pub fn from_rows(rows: Vec<Opportunity>) -> Self {
        Table { rows }
    }

    /// Number of opportunities.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Opportunity] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Opportunity> {
        self.rows.iter()
    }

    /// Distinct non-null values of a categorical field in first-seen order.
    pub fn unique(&self, field: Category) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter_map(|row| row.category(field))
            .filter(|value| seen.insert(*value))
            .map(str::to_string)
            .collect()
    }

    /// Observed `(min, max)` of a numeric field, ignoring nulls.
    pub fn measure_bounds(&self, field: Measure) -> Option<(f64, f64)> {
        self.rows
            .iter()
            .filter_map(|row| row.measure(field))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Observed `(min, max)` of a year field, ignoring nulls.
    pub fn year_bounds(&self, field: YearField) -> Option<(i32, i32)> {
        let years = self.rows.iter().filter_map(|row| row.year(field));
        years.fold(None, |acc, y| match acc {
            None => Some((y, y)),
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        })
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Opportunity;
    type IntoIter = std::slice::Iter<'a, Opportunity>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl FromIterator<Opportunity> for Table {
    fn from_iter<I: IntoIterator<Item = Opportunity>>(iter: I) -> Self {
        Table::from_rows(iter.into_iter().collect())
    }
}
