use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::color::ColorMap;
use crate::config::Settings;
use crate::dashboard::{
    general_summary, insights, performance, InsightsFilters, InsightsView, PerformanceFilters,
    PerformanceView, SummaryFilters, SummaryView,
};
use crate::data::loader::load_file;
use crate::data::model::{Category, Table};

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Summary,
    Performance,
    Insights,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Summary, Page::Performance, Page::Insights];

    pub fn title(self) -> &'static str {
        match self {
            Page::Summary => "General Summary",
            Page::Performance => "Performance Analysis",
            Page::Insights => "Advanced Insights",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded table (None until a file is loaded). Shared, never mutated.
    pub table: Option<Arc<Table>>,

    /// File the table was read from.
    pub source: Option<PathBuf>,

    pub settings: Settings,

    /// Page shown in the central panel.
    pub page: Page,

    pub summary_filters: SummaryFilters,
    pub performance_filters: PerformanceFilters,
    pub insights_filters: InsightsFilters,

    /// Views for the current filters (recomputed by [`AppState::refilter`]).
    pub summary: Option<SummaryView>,
    pub performance: Option<PerformanceView>,
    pub insights: Option<InsightsView>,

    /// Stage → colour, shared by every stage chart.
    pub stage_colors: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            table: None,
            source: None,
            settings,
            page: Page::default(),
            summary_filters: SummaryFilters::default(),
            performance_filters: PerformanceFilters::default(),
            insights_filters: InsightsFilters::default(),
            summary: None,
            performance: None,
            insights: None,
            stage_colors: None,
            status_message: None,
        }
    }

    /// Load `path`, replacing the current table on success. On failure the
    /// previous table stays and the error goes to the status bar.
    pub fn open(&mut self, path: &Path) {
        match load_file(path) {
            Ok(table) => {
                self.set_table(table);
                self.source = Some(path.to_path_buf());
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a newly loaded table, initialise filters and colours.
    pub fn set_table(&mut self, table: Table) {
        self.summary_filters = SummaryFilters::defaults(&table);
        self.performance_filters = PerformanceFilters::defaults(&table, &self.settings);
        self.insights_filters = InsightsFilters::defaults(&table);
        self.stage_colors = Some(ColorMap::new(&table.unique(Category::Stage)));

        self.table = Some(Arc::new(table));
        self.status_message = None;
        self.refilter();
    }

    /// Recompute every page after a filter change.
    pub fn refilter(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        self.summary = Some(general_summary(table, &self.summary_filters, &self.settings));
        self.performance = Some(performance(
            table,
            &self.performance_filters,
            &self.settings,
        ));
        self.insights = Some(insights(table, &self.insights_filters));
    }

    /// Put every filter back to its load-time default.
    pub fn reset_filters(&mut self) {
        if let Some(table) = self.table.clone() {
            self.summary_filters = SummaryFilters::defaults(&table);
            self.performance_filters = PerformanceFilters::defaults(&table, &self.settings);
            self.insights_filters = InsightsFilters::defaults(&table);
            self.refilter();
        }
    }

    pub fn set_summary_filters(&mut self, filters: SummaryFilters) {
        if filters != self.summary_filters {
            self.summary_filters = filters;
            self.refilter();
        }
    }

    pub fn set_performance_filters(&mut self, filters: PerformanceFilters) {
        if filters != self.performance_filters {
            self.performance_filters = filters;
            self.refilter();
        }
    }

    pub fn set_insights_filters(&mut self, filters: InsightsFilters) {
        if filters != self.insights_filters {
            self.insights_filters = filters;
            self.refilter();
        }
    }

    /// Number of loaded rows and the number passing the current page's filters.
    pub fn row_counts(&self) -> Option<(usize, usize)> {
        let table = self.table.as_ref()?;
        let shown = match self.page {
            Page::Summary => self.summary.as_ref()?.filtered_rows,
            Page::Performance => self.performance.as_ref()?.filtered_rows,
            Page::Insights => self.insights.as_ref()?.filtered_rows,
        };
        Some((table.len(), shown))
    }
}

/// Toggle a single value in a selection set.
pub fn toggle(selected: &mut BTreeSet<String>, value: &str) {
    if !selected.remove(value) {
        selected.insert(value.to_string());
    }
}
