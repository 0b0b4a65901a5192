//! The three dashboard pages as plain view models.
//!
//! Every page is the same pipeline with different parameters: apply the
//! page's filters to the base [`Table`], then aggregate. Nothing here knows
//! about egui; the UI only reads the `*View` structs.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::Settings;
use crate::data::aggregate::{
    conversion, count_by, rate_by, sum_by_ranked, CategoryCount, CategoryValue, IndicatorSummary,
};
use crate::data::filter::{filter, PredicateSet};
use crate::data::model::{Category, Flag, Measure, Table, YearField, LOST_STAGE, WON_STAGE};

/// Stages pre-selected on the summary page, when present in the data.
/// The lost stage is spelled `Closed Lost` so lost deals are part of the
/// default selection.
pub const DEFAULT_STAGES: [&str; 4] = [WON_STAGE, LOST_STAGE, "Cancelled", "Negotiate"];

/// Widen observed amount bounds to whole numbers so the default range covers
/// every row.
fn whole_bounds((lo, hi): (f64, f64)) -> (f64, f64) {
    (lo.floor(), hi.ceil())
}

// ---------------------------------------------------------------------------
// General summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryFilters {
    pub stages: BTreeSet<String>,
    /// Inclusive amount range; `None` applies no amount constraint.
    pub amount: Option<(f64, f64)>,
}

impl SummaryFilters {
    pub fn defaults(table: &Table) -> Self {
        let present = table.unique(Category::Stage);
        let stages = DEFAULT_STAGES
            .iter()
            .filter(|stage| present.iter().any(|p| p == *stage))
            .map(|stage| stage.to_string())
            .collect();
        Self {
            stages,
            amount: table.measure_bounds(Measure::Amount).map(whole_bounds),
        }
    }

    pub fn predicates(&self) -> PredicateSet {
        let preds = PredicateSet::new().with_membership(Category::Stage, self.stages.iter().cloned());
        match self.amount {
            Some((low, high)) => preds.with_range(Measure::Amount, low, high),
            None => preds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    pub stage_options: Vec<String>,
    pub amount_bounds: Option<(f64, f64)>,
    pub filtered_rows: usize,
    pub stage_counts: Vec<CategoryCount>,
    pub top_accounts: Vec<CategoryValue>,
}

pub fn general_summary(table: &Table, filters: &SummaryFilters, settings: &Settings) -> SummaryView {
    let filtered = filter(table, &filters.predicates());
    SummaryView {
        stage_options: table.unique(Category::Stage),
        amount_bounds: table.measure_bounds(Measure::Amount).map(whole_bounds),
        filtered_rows: filtered.len(),
        stage_counts: count_by(&filtered, Category::Stage),
        top_accounts: sum_by_ranked(
            &filtered,
            Category::Account,
            Measure::Amount,
            Some(settings.top_accounts),
        ),
    }
}

// ---------------------------------------------------------------------------
// Performance analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceFilters {
    pub owners: BTreeSet<String>,
}

impl PerformanceFilters {
    /// Pre-select the owners with the largest total amount.
    pub fn defaults(table: &Table, settings: &Settings) -> Self {
        let owners = sum_by_ranked(
            table,
            Category::Owner,
            Measure::Amount,
            Some(settings.top_owners),
        )
        .into_iter()
        .map(|owner| owner.category)
        .collect();
        Self { owners }
    }

    pub fn predicates(&self) -> PredicateSet {
        PredicateSet::new().with_membership(Category::Owner, self.owners.iter().cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceView {
    /// Every owner ranked by total amount over the whole table.
    pub owner_ranking: Vec<CategoryValue>,
    pub filtered_rows: usize,
    pub top_owners: Vec<CategoryValue>,
    pub stage_counts: Vec<CategoryCount>,
}

pub fn performance(
    table: &Table,
    filters: &PerformanceFilters,
    settings: &Settings,
) -> PerformanceView {
    let filtered = filter(table, &filters.predicates());
    PerformanceView {
        owner_ranking: sum_by_ranked(table, Category::Owner, Measure::Amount, None),
        filtered_rows: filtered.len(),
        top_owners: sum_by_ranked(
            &filtered,
            Category::Owner,
            Measure::Amount,
            Some(settings.top_owners),
        ),
        stage_counts: count_by(&filtered, Category::Stage),
    }
}

// ---------------------------------------------------------------------------
// Advanced insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsightsFilters {
    /// Inclusive created-year range; `None` applies no year constraint.
    pub years: Option<(i32, i32)>,
    pub types: BTreeSet<String>,
}

impl InsightsFilters {
    pub fn defaults(table: &Table) -> Self {
        Self {
            years: table.year_bounds(YearField::Created),
            types: table.unique(Category::Type).into_iter().collect(),
        }
    }

    pub fn predicates(&self) -> PredicateSet {
        let preds = PredicateSet::new().with_membership(Category::Type, self.types.iter().cloned());
        match self.years {
            Some((low, high)) => preds.with_year_range(YearField::Created, low, high),
            None => preds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsView {
    pub type_options: Vec<String>,
    pub year_bounds: Option<(i32, i32)>,
    pub filtered_rows: usize,
    /// Total, won and conversion rate over the whole table. The page filters
    /// do not apply to these headline figures.
    pub indicators: IndicatorSummary,
    pub conversion_by_type: Vec<CategoryValue>,
    pub lost_by_stage: Vec<CategoryCount>,
    pub lost_by_type: Vec<CategoryCount>,
}

pub fn insights(table: &Table, filters: &InsightsFilters) -> InsightsView {
    let filtered = filter(table, &filters.predicates());
    let lost = filter(
        &filtered,
        &PredicateSet::new().with_membership(Category::Stage, [LOST_STAGE]),
    );

    InsightsView {
        type_options: table.unique(Category::Type),
        year_bounds: table.year_bounds(YearField::Created),
        filtered_rows: filtered.len(),
        indicators: conversion(table),
        conversion_by_type: rate_by(&filtered, Category::Type, Flag::Won),
        lost_by_stage: count_by(&lost, Category::Stage),
        lost_by_type: count_by(&lost, Category::Type),
    }
}

// ---------------------------------------------------------------------------
// Whole-dashboard report
// ---------------------------------------------------------------------------

/// Every page computed with its default filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub total_rows: usize,
    pub general_summary: SummaryView,
    pub performance: PerformanceView,
    pub insights: InsightsView,
}

impl DashboardReport {
    pub fn with_defaults(table: &Table, settings: &Settings) -> Self {
        Self {
            total_rows: table.len(),
            general_summary: general_summary(table, &SummaryFilters::defaults(table), settings),
            performance: performance(
                table,
                &PerformanceFilters::defaults(table, settings),
                settings,
            ),
            insights: insights(table, &InsightsFilters::defaults(table)),
        }
    }
}
