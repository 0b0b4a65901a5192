use std::collections::HashMap;

use serde::Serialize;

use super::model::{Category, Flag, Measure, Opportunity, Table};

// ---------------------------------------------------------------------------
// Aggregate outputs – the only shapes handed to the presentation layer
// ---------------------------------------------------------------------------

/// Number of rows in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// A numeric summary (sum, rate, ...) for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryValue {
    pub category: String,
    pub value: f64,
}

/// Headline counts for a table.
///
/// `ratio` is `None` when the table is empty; there is no meaningful share
/// of zero rows and it must never surface as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorSummary {
    pub row_count: usize,
    pub matched: usize,
    pub ratio: Option<f64>,
}

impl IndicatorSummary {
    /// `ratio` as a percentage.
    pub fn percent(&self) -> Option<f64> {
        self.ratio.map(|r| r * 100.0)
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Fold rows into per-category accumulators, keeping groups in first-seen
/// order. Rows with a null category are skipped.
fn fold_groups<A, F>(table: &Table, field: Category, mut fold: F) -> Vec<(String, A)>
where
    A: Default,
    F: FnMut(&mut A, &Opportunity),
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, A)> = Vec::new();

    for row in table {
        let Some(key) = row.category(field) else {
            continue;
        };
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key.to_string(), A::default()));
            groups.len() - 1
        });
        fold(&mut groups[slot].1, row);
    }
    groups
}

fn rank_descending(mut values: Vec<CategoryValue>, top: Option<usize>) -> Vec<CategoryValue> {
    // Stable sort: ties keep first-seen order.
    values.sort_by(|a, b| b.value.total_cmp(&a.value));
    if let Some(n) = top {
        values.truncate(n);
    }
    values
}

// ---------------------------------------------------------------------------
// Reducers
// ---------------------------------------------------------------------------

/// Count rows per category, most frequent first.
pub fn count_by(table: &Table, field: Category) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = fold_groups(table, field, |n: &mut usize, _| *n += 1)
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Sum `measure` per category, largest first, optionally keeping the top `n`.
/// Null measures contribute nothing to their group's sum.
pub fn sum_by_ranked(
    table: &Table,
    field: Category,
    measure: Measure,
    top: Option<usize>,
) -> Vec<CategoryValue> {
    let sums = fold_groups(table, field, |sum: &mut f64, row| {
        *sum += row.measure(measure).unwrap_or(0.0);
    })
    .into_iter()
    .map(|(category, value)| CategoryValue { category, value })
    .collect();
    rank_descending(sums, top)
}

/// Share of rows per category for which `flag` holds, highest first.
pub fn rate_by(table: &Table, field: Category, flag: Flag) -> Vec<CategoryValue> {
    let rates = fold_groups(table, field, |acc: &mut (usize, usize), row| {
        acc.0 += usize::from(row.flag(flag));
        acc.1 += 1;
    })
    .into_iter()
    .map(|(category, (hits, total))| CategoryValue {
        category,
        value: hits as f64 / total as f64,
    })
    .collect();
    rank_descending(rates, None)
}

/// Row count, number of rows matching `predicate`, and their ratio.
pub fn indicator_summary<P>(table: &Table, predicate: P) -> IndicatorSummary
where
    P: Fn(&Opportunity) -> bool,
{
    let row_count = table.len();
    let matched = table.iter().filter(|&row| predicate(row)).count();
    let ratio = (row_count > 0).then(|| matched as f64 / row_count as f64);
    IndicatorSummary {
        row_count,
        matched,
        ratio,
    }
}

/// Won opportunities over all opportunities.
pub fn conversion(table: &Table) -> IndicatorSummary {
    indicator_summary(table, |row| row.flag(Flag::Won))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::opp;
    use crate::data::model::NewOpportunity;

    fn pairs_counts(counts: &[CategoryCount]) -> Vec<(&str, usize)> {
        counts.iter().map(|c| (c.category.as_str(), c.count)).collect()
    }

    fn pairs_values(values: &[CategoryValue]) -> Vec<(&str, f64)> {
        values.iter().map(|c| (c.category.as_str(), c.value)).collect()
    }

    fn by_account(rows: &[(&str, &str, f64)]) -> Table {
        rows.iter()
            .map(|(account, stage, amount)| -> Opportunity {
                NewOpportunity {
                    account: Some(account.to_string()),
                    stage: Some(stage.to_string()),
                    kind: Some("New".into()),
                    amount: *amount,
                    ..Default::default()
                }
                .into()
            })
            .collect()
    }

    #[test]
    fn count_and_sum_by_stage() {
        let table = Table::from_rows(vec![
            opp("Closed Won", 100.0),
            opp("Closed Won", 50.0),
            opp("Open", 30.0),
        ]);

        assert_eq!(
            pairs_counts(&count_by(&table, Category::Stage)),
            vec![("Closed Won", 2), ("Open", 1)]
        );
        assert_eq!(
            pairs_values(&sum_by_ranked(&table, Category::Stage, Measure::Amount, None)),
            vec![("Closed Won", 150.0), ("Open", 30.0)]
        );
    }

    #[test]
    fn count_ties_keep_first_seen_order() {
        let table = Table::from_rows(vec![
            opp("Negotiate", 1.0),
            opp("Open", 1.0),
            opp("Closed Won", 1.0),
            opp("Closed Won", 1.0),
        ]);
        assert_eq!(
            pairs_counts(&count_by(&table, Category::Stage)),
            vec![("Closed Won", 2), ("Negotiate", 1), ("Open", 1)]
        );
    }

    #[test]
    fn ranked_sum_truncates_and_breaks_ties_by_encounter() {
        let table = by_account(&[
            ("Initech", "Open", 10.0),
            ("Acme", "Open", 40.0),
            ("Globex", "Open", 40.0),
            ("Initech", "Open", 25.0),
            ("Hooli", "Open", 5.0),
        ]);

        let top = sum_by_ranked(&table, Category::Account, Measure::Amount, Some(3));
        assert_eq!(
            pairs_values(&top),
            vec![("Acme", 40.0), ("Globex", 40.0), ("Initech", 35.0)]
        );

        let none = sum_by_ranked(&table, Category::Account, Measure::Amount, Some(0));
        assert!(none.is_empty());
    }

    #[test]
    fn sums_are_conserved_across_categories() {
        let table = by_account(&[
            ("a", "Open", 0.1),
            ("b", "Open", 0.2),
            ("a", "Open", 0.3),
            ("c", "Open", 1e6),
        ]);
        let total: f64 = table.iter().map(Opportunity::amount).sum();
        let grouped: f64 = sum_by_ranked(&table, Category::Account, Measure::Amount, None)
            .iter()
            .map(|c| c.value)
            .sum();
        assert!((total - grouped).abs() < 1e-6);
    }

    #[test]
    fn null_categories_are_not_grouped() {
        let mut rows = vec![opp("Open", 1.0)];
        rows.push(
            NewOpportunity {
                amount: 9.0,
                ..Default::default()
            }
            .into(),
        );
        let table = Table::from_rows(rows);
        assert_eq!(pairs_counts(&count_by(&table, Category::Stage)), vec![("Open", 1)]);
    }

    #[test]
    fn conversion_rate_by_type() {
        let mk = |kind: &str, stage: &str| -> Opportunity {
            NewOpportunity {
                kind: Some(kind.into()),
                stage: Some(stage.into()),
                amount: 1.0,
                ..Default::default()
            }
            .into()
        };
        let table = Table::from_rows(vec![
            mk("Renewal", "Closed Won"),
            mk("New", "Closed Lost"),
            mk("Renewal", "Closed Lost"),
            mk("New", "Closed Won"),
            mk("New", "Closed Won"),
            mk("Upsell", "Open"),
        ]);

        let rates = rate_by(&table, Category::Type, Flag::Won);
        let names: Vec<&str> = rates.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(names, vec!["New", "Renewal", "Upsell"]);
        assert!((rates[0].value - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(rates[1].value, 0.5);
        assert_eq!(rates[2].value, 0.0);
    }

    #[test]
    fn indicator_on_empty_table_has_no_ratio() {
        let summary = conversion(&Table::default());
        assert_eq!(summary.row_count, 0);
        assert_eq!(summary.matched, 0);
        assert_eq!(summary.ratio, None);
        assert_eq!(summary.percent(), None);
    }

    #[test]
    fn indicator_counts_matches() {
        let table = Table::from_rows(vec![
            opp("Closed Won", 1.0),
            opp("Closed Lost", 1.0),
            opp("Closed Won", 1.0),
            opp("Open", 1.0),
        ]);
        let summary = conversion(&table);
        assert_eq!((summary.row_count, summary.matched), (4, 2));
        assert_eq!(summary.percent(), Some(50.0));

        let lost = indicator_summary(&table, Opportunity::lost);
        assert_eq!(lost.ratio, Some(0.25));
    }

    #[test]
    fn empty_table_gives_empty_aggregates() {
        let table = Table::default();
        assert!(count_by(&table, Category::Stage).is_empty());
        assert!(sum_by_ranked(&table, Category::Account, Measure::Amount, Some(15)).is_empty());
        assert!(rate_by(&table, Category::Type, Flag::Won).is_empty());
    }
}
