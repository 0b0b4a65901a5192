use std::f32::consts::{FRAC_PI_2, TAU};
use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, Sense, Shape, Stroke, Ui, Vec2};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, Plot};

use crate::color::{sequential, ColorMap};
use crate::data::aggregate::{CategoryCount, CategoryValue, IndicatorSummary};
use crate::state::{AppState, Page};

const CHART_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the current page in the central panel.
pub fn page(ui: &mut Ui, state: &AppState) {
    if state.table.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view opportunities  (File → Open…)");
        });
        return;
    }

    ui.heading(state.page.title());
    if let Some(source) = &state.source {
        ui.label(RichText::new(source.display().to_string()).weak());
    }
    ui.separator();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.page {
            Page::Summary => summary_page(ui, state),
            Page::Performance => performance_page(ui, state),
            Page::Insights => insights_page(ui, state),
        });
}

fn no_rows(ui: &mut Ui) {
    ui.label(RichText::new("No opportunities match the current filters.").italics());
}

fn summary_page(ui: &mut Ui, state: &AppState) {
    let Some(view) = &state.summary else {
        return;
    };
    if view.filtered_rows == 0 {
        no_rows(ui);
        return;
    }

    let fallback = ColorMap::new(&[]);
    let colors = state.stage_colors.as_ref().unwrap_or(&fallback);
    let top_n = state.settings.top_accounts;

    ui.columns(2, |cols: &mut [Ui]| {
        cols[0].strong("Opportunities by Stage");
        pie_chart(&mut cols[0], &view.stage_counts, colors);

        cols[1].strong(format!("Top {top_n} Accounts by Total Amount"));
        ranked_bars(&mut cols[1], "top_accounts", &view.top_accounts, "Total Amount");
    });
}

fn performance_page(ui: &mut Ui, state: &AppState) {
    let Some(view) = &state.performance else {
        return;
    };
    if view.filtered_rows == 0 {
        no_rows(ui);
        return;
    }

    ui.strong("Top Opportunity Owners by Total Amount");
    ranked_bars(ui, "top_owners", &view.top_owners, "Total Amount");

    ui.add_space(12.0);
    ui.strong("Opportunities by Stage");
    let fallback = ColorMap::new(&[]);
    let colors = state.stage_colors.as_ref().unwrap_or(&fallback);
    let entries = counts_as_values(&view.stage_counts);
    bar_chart(
        ui,
        "owner_stages",
        &entries,
        true,
        "Number of Opportunities",
        |entry| colors.color_for(&entry.category),
    );
    counts_table(ui, "owner_stage_table", "Stage", "Opportunities", &view.stage_counts);
}

fn insights_page(ui: &mut Ui, state: &AppState) {
    let Some(view) = &state.insights else {
        return;
    };

    indicators(ui, &view.indicators);
    ui.separator();

    if view.filtered_rows == 0 {
        no_rows(ui);
        return;
    }

    ui.strong("Conversion Rate by Opportunity Type");
    bar_chart(
        ui,
        "conversion_by_type",
        &view.conversion_by_type,
        false,
        "Conversion Rate",
        |entry| sequential(entry.value as f32),
    );
    for entry in &view.conversion_by_type {
        ui.label(format!("{}: {:.1}%", entry.category, entry.value * 100.0));
    }

    ui.add_space(12.0);
    ui.heading("Loss Analysis");
    if view.lost_by_stage.is_empty() {
        ui.label("No lost opportunities in the current selection.");
        return;
    }

    ui.columns(2, |cols: &mut [Ui]| {
        cols[0].strong("Lost Opportunities by Stage");
        count_bars(&mut cols[0], "lost_by_stage", &view.lost_by_stage);

        cols[1].strong("Lost Opportunities by Type");
        count_bars(&mut cols[1], "lost_by_type", &view.lost_by_type);
    });
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

/// Three headline metrics: total, won, conversion rate.
fn indicators(ui: &mut Ui, summary: &IndicatorSummary) {
    let rate = summary
        .percent()
        .map(|p| format!("{p:.2}%"))
        .unwrap_or_else(|| "n/a".to_string());

    ui.columns(3, |cols: &mut [Ui]| {
        metric(&mut cols[0], "Total Opportunities", &summary.row_count.to_string());
        metric(&mut cols[1], "Won Opportunities", &summary.matched.to_string());
        metric(&mut cols[2], "Conversion Rate", &rate);
    });
}

fn metric(ui: &mut Ui, label: &str, value: &str) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).weak());
        ui.label(RichText::new(value).size(26.0).strong());
    });
}

/// Pie chart of category counts with a legend of counts and shares.
fn pie_chart(ui: &mut Ui, counts: &[CategoryCount], colors: &ColorMap) {
    let total: usize = counts.iter().map(|c| c.count).sum();
    if total == 0 {
        no_rows(ui);
        return;
    }

    let side = ui.available_width().clamp(120.0, 260.0);
    let (response, painter) = ui.allocate_painter(Vec2::splat(side), Sense::hover());
    let center = response.rect.center();
    let radius = side * 0.45;

    let mut start = -FRAC_PI_2;
    for entry in counts {
        let sweep = TAU * entry.count as f32 / total as f32;
        paint_slice(&painter, center, radius, start, sweep, colors.color_for(&entry.category));
        start += sweep;
    }

    for entry in counts {
        let share = 100.0 * entry.count as f64 / total as f64;
        ui.horizontal(|ui: &mut Ui| {
            ui.label(RichText::new("■").color(colors.color_for(&entry.category)));
            ui.label(format!("{}  {} ({share:.1}%)", entry.category, entry.count));
        });
    }
}

/// Fill a pie slice as a fan of convex pieces no wider than a quarter turn.
fn paint_slice(
    painter: &egui::Painter,
    center: egui::Pos2,
    radius: f32,
    start: f32,
    sweep: f32,
    color: Color32,
) {
    const SEGMENTS: usize = 16;
    let pieces = (sweep / FRAC_PI_2).ceil().max(1.0) as usize;
    let step = sweep / pieces as f32;

    for piece in 0..pieces {
        let from = start + step * piece as f32;
        let mut points = Vec::with_capacity(SEGMENTS + 2);
        points.push(center);
        for s in 0..=SEGMENTS {
            let angle = from + step * s as f32 / SEGMENTS as f32;
            points.push(center + radius * Vec2::angled(angle));
        }
        painter.add(Shape::convex_polygon(points, color, Stroke::NONE));
    }
}

/// Horizontal bars of a ranking, largest on top, shaded by value.
fn ranked_bars(ui: &mut Ui, id: &str, entries: &[CategoryValue], value_label: &str) {
    let max = entries.iter().map(|e| e.value).fold(0.0_f64, f64::max);
    bar_chart(ui, id, entries, true, value_label, |entry| {
        sequential(if max > 0.0 { (entry.value / max) as f32 } else { 0.0 })
    });
}

fn count_bars(ui: &mut Ui, id: &str, counts: &[CategoryCount]) {
    let entries = counts_as_values(counts);
    let max = entries.iter().map(|e| e.value).fold(0.0_f64, f64::max);
    bar_chart(ui, id, &entries, false, "Number of Lost Opportunities", |entry| {
        sequential(if max > 0.0 { (entry.value / max) as f32 } else { 0.0 })
    });
}

fn counts_as_values(counts: &[CategoryCount]) -> Vec<CategoryValue> {
    counts
        .iter()
        .map(|c| CategoryValue {
            category: c.category.clone(),
            value: c.count as f64,
        })
        .collect()
}

/// Bar chart with one bar per category. Horizontal charts list the first
/// entry at the top.
fn bar_chart(
    ui: &mut Ui,
    id: &str,
    entries: &[CategoryValue],
    horizontal: bool,
    value_label: &str,
    color: impl Fn(&CategoryValue) -> Color32,
) {
    let n = entries.len();
    let position = |i: usize| if horizontal { (n - 1 - i) as f64 } else { i as f64 };

    let mut labels = vec![String::new(); n];
    let bars: Vec<Bar> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            labels[position(i) as usize] = entry.category.clone();
            Bar::new(position(i), entry.value)
                .name(&entry.category)
                .fill(color(entry))
                .width(0.7)
        })
        .collect();

    let mut chart = BarChart::new(bars).name(value_label);
    if horizontal {
        chart = chart.horizontal();
    }

    let axis = move |mark: GridMark, _range: &RangeInclusive<f64>| category_label(&labels, mark.value);
    let mut plot = Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false);
    plot = if horizontal {
        plot.y_axis_formatter(axis).x_axis_label(value_label)
    } else {
        plot.x_axis_formatter(axis).y_axis_label(value_label)
    };

    plot.show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

/// Axis tick text: the category at an integer position, blank elsewhere.
fn category_label(labels: &[String], value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

/// Two-column table of category counts.
fn counts_table(ui: &mut Ui, id: &str, left: &str, right: &str, counts: &[CategoryCount]) {
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(160.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong(left);
                });
                header.col(|ui| {
                    ui.strong(right);
                });
            })
            .body(|mut body| {
                for entry in counts {
                    body.row(18.0, |mut row| {
                        row.col(|ui| {
                            ui.label(entry.category.as_str());
                        });
                        row.col(|ui| {
                            ui.label(entry.count.to_string());
                        });
                    });
                }
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_labels_only_on_integer_positions() {
        let labels = vec!["Acme".to_string(), "Globex".to_string()];
        assert_eq!(category_label(&labels, 0.0), "Acme");
        assert_eq!(category_label(&labels, 1.0000001), "Globex");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, -1.0), "");
        assert_eq!(category_label(&labels, 7.0), "");
    }

    #[test]
    fn counts_become_values() {
        let values = counts_as_values(&[CategoryCount {
            category: "Open".into(),
            count: 3,
        }]);
        assert_eq!(values[0].value, 3.0);
        assert_eq!(values[0].category, "Open");
    }
}
