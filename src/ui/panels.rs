use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};

use crate::color::ColorMap;
use crate::state::{toggle, AppState, Page};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel for the current page.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.table.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            match state.page {
                Page::Summary => summary_filters(ui, state),
                Page::Performance => performance_filters(ui, state),
                Page::Insights => insights_filters(ui, state),
            }

            ui.separator();
            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        });
}

fn summary_filters(ui: &mut Ui, state: &mut AppState) {
    let Some(view) = state.summary.as_ref() else {
        return;
    };
    let options = view.stage_options.clone();
    let bounds = view.amount_bounds;
    let mut filters = state.summary_filters.clone();

    checklist(
        ui,
        "Stage",
        &options,
        &mut filters.stages,
        state.stage_colors.as_ref(),
    );

    if let (Some((min, max)), Some((low, high))) = (bounds, filters.amount.as_mut()) {
        ui.add_space(6.0);
        ui.strong("Amount range");
        ui.add(Slider::new(low, min..=max).text("from"));
        ui.add(Slider::new(high, min..=max).text("to"));
        if *low > *high {
            std::mem::swap(low, high);
        }
    }

    state.set_summary_filters(filters);
}

fn performance_filters(ui: &mut Ui, state: &mut AppState) {
    let Some(view) = state.performance.as_ref() else {
        return;
    };
    let options: Vec<String> = view
        .owner_ranking
        .iter()
        .map(|o| o.category.clone())
        .collect();
    let mut filters = state.performance_filters.clone();

    let top_n = state.settings.top_owners;
    if ui.small_button(format!("Top {top_n}")).clicked() {
        filters.owners = options.iter().take(top_n).cloned().collect();
    }
    checklist(ui, "Opportunity Owner", &options, &mut filters.owners, None);

    state.set_performance_filters(filters);
}

fn insights_filters(ui: &mut Ui, state: &mut AppState) {
    let Some(view) = state.insights.as_ref() else {
        return;
    };
    let options = view.type_options.clone();
    let bounds = view.year_bounds;
    let mut filters = state.insights_filters.clone();

    if let (Some((min, max)), Some((low, high))) = (bounds, filters.years.as_mut()) {
        ui.strong("Year created");
        ui.add(Slider::new(low, min..=max).text("from"));
        ui.add(Slider::new(high, min..=max).text("to"));
        if *low > *high {
            std::mem::swap(low, high);
        }
        ui.add_space(6.0);
    }

    checklist(ui, "Opportunity Type", &options, &mut filters.types, None);

    state.set_insights_filters(filters);
}

/// Collapsible multi-select with All / None buttons.
fn checklist(
    ui: &mut Ui,
    title: &str,
    options: &[String],
    selected: &mut BTreeSet<String>,
    colors: Option<&ColorMap>,
) {
    // Show count of selected / total in the header
    let n_selected = options.iter().filter(|o| selected.contains(*o)).count();
    let header_text = format!("{title}  ({n_selected}/{})", options.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    selected.extend(options.iter().cloned());
                }
                if ui.small_button("None").clicked() {
                    selected.clear();
                }
            });

            for option in options {
                let mut text = RichText::new(option);
                if let Some(cm) = colors {
                    text = text.color(cm.color_for(option));
                }

                let mut checked = selected.contains(option);
                if ui.checkbox(&mut checked, text).changed() {
                    toggle(selected, option);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu, page switcher and status line.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for page in Page::ALL {
            ui.selectable_value(&mut state.page, page, page.title());
        }

        ui.separator();

        if let Some((total, shown)) = state.row_counts() {
            ui.label(format!("{total} opportunities loaded, {shown} shown"));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open opportunity data")
        .add_filter("Supported files", &["csv", "tsv", "psv", "txt", "json", "parquet", "pq"])
        .add_filter("Delimited text", &["csv", "tsv", "psv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}
