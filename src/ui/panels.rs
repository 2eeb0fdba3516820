use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{MappingOrigin, YearRange};
use crate::data::source::DataSource;
use crate::error::Error;
use crate::state::{AppState, NarrativeState};

/// Rows shown in the raw-table preview.
const PREVIEW_ROWS: usize = 50;

// ---------------------------------------------------------------------------
// Left side panel – inputs and column mapping
// ---------------------------------------------------------------------------

/// Render the left sidebar.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("🌊 Tide Tales");
    ui.separator();

    ui.strong("Anthropic API key");
    ui.add(
        egui::TextEdit::singleline(&mut state.api_key_input)
            .password(true)
            .hint_text("optional"),
    );
    ui.strong("📍 Your location");
    ui.text_edit_singleline(&mut state.location);
    ui.separator();

    ui.strong("Dataset");
    if ui.button("Open CSV…").clicked() {
        open_file_dialog(state);
    }
    for remote in state.config.sources.clone() {
        if ui.button(format!("Fetch {}", remote.name)).clicked() {
            state.open_source(DataSource::Remote(remote));
        }
    }

    let Some(table) = &state.table else {
        ui.label("No dataset loaded.");
        return;
    };
    let names: Vec<String> = table.column_names().iter().map(|n| n.to_string()).collect();

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("🔄 Re-analyze").clicked() {
            state.reanalyze();
        }
        if state.source.is_some() && ui.button("Reload").clicked() {
            state.reload_source();
        }
    });
    ui.separator();

    // ---- Column mapping ----
    let Some(classification) = state.classification.clone() else {
        return;
    };
    let origin = match classification.origin {
        MappingOrigin::Heuristic => "detected by heuristics",
        MappingOrigin::Advisor => "suggested by the assistant",
        MappingOrigin::Manual => "picked by hand",
    };
    ui.strong("Columns");
    ui.label(RichText::new(origin).weak());

    let mut time_column = classification.mapping.time_column.clone();
    let mut value_column = classification.mapping.value_column.clone();
    column_combo(ui, "time_column", "Time", &names, &mut time_column);
    column_combo(ui, "value_column", "Value", &names, &mut value_column);

    if time_column != classification.mapping.time_column
        || value_column != classification.mapping.value_column
    {
        if time_column == value_column {
            state.status_message = Some("Time and value must be different columns.".to_string());
        } else {
            state.set_mapping(time_column, value_column);
        }
    }
    ui.separator();

    // ---- Range selection ----
    let Some(span) = state.series.as_ref().and_then(|s| s.span()) else {
        return;
    };
    let current = state.range.unwrap_or(span);
    let (mut start, mut end) = (current.start, current.end);
    ui.strong("Time range");
    ui.add(egui::Slider::new(&mut start, span.start..=span.end).text("from"));
    ui.add(egui::Slider::new(&mut end, span.start..=span.end).text("to"));
    if start > end {
        // Keep the handles from crossing.
        if start != current.start {
            end = start;
        } else {
            start = end;
        }
    }
    let selected = YearRange::new(start, end);
    if selected != current {
        state.set_range(selected);
    }
}

fn column_combo(ui: &mut Ui, id: &str, label: &str, names: &[String], selected: &mut String) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(label);
        egui::ComboBox::from_id_salt(id)
            .selected_text(selected.as_str())
            .show_ui(ui, |ui: &mut Ui| {
                for name in names {
                    if ui.selectable_label(*selected == *name, name).clicked() {
                        *selected = name.clone();
                    }
                }
            });
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / status line.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(source), Some(table)) = (&state.source, &state.table) {
            let valid = state.series.as_ref().map_or(0, |s| s.len());
            ui.label(format!(
                "{source}: {} rows, {valid} valid observations",
                table.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Heading and metric cards for the current fact pack.
pub fn facts_panel(ui: &mut Ui, state: &AppState) {
    let Some(facts) = &state.facts else {
        return;
    };
    let (kind, unit) = state
        .classification
        .as_ref()
        .map(|c| (c.labels.kind.as_str(), c.labels.unit.as_str()))
        .unwrap_or(("Data", ""));

    let (summary, slope) = match facts {
        Ok(fp) => (fp.summary, Some(fp.slope())),
        Err(Error::DegenerateFit { summary }) => (*summary, None),
        Err(e) => {
            ui.label(RichText::new(format!("{e}. {}", e.user_hint())).color(Color32::YELLOW));
            return;
        }
    };

    ui.heading(format!(
        "📊 Evidence: {kind} in {} ({})",
        state.location, summary.range
    ));
    ui.columns(5, |cols: &mut [Ui]| {
        metric(&mut cols[0], "Net Change", format!("{:+.2} {unit}", summary.net_change));
        metric(
            &mut cols[1],
            "Trend Slope",
            slope.map_or("n/a".to_string(), |s| format!("{s:+.4} / yr")),
        );
        metric(&mut cols[2], "Peak", format!("{:.2}", summary.peak));
        metric(&mut cols[3], "Trough", format!("{:.2}", summary.trough));
        metric(&mut cols[4], "Observations", summary.count.to_string());
    });
    if slope.is_none() {
        ui.label(RichText::new(Error::DegenerateFit { summary }.user_hint()).weak());
    }
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).weak());
        ui.label(RichText::new(value).size(20.0).strong());
    });
}

// ---------------------------------------------------------------------------
// Raw table preview
// ---------------------------------------------------------------------------

pub fn table_preview(ui: &mut Ui, state: &AppState) {
    let Some(table) = &state.table else {
        return;
    };
    egui::CollapsingHeader::new(format!("Raw table ({} columns)", table.n_columns()))
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let columns = table.columns();
            let n_rows = table.len().min(PREVIEW_ROWS);
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .max_scroll_height(220.0)
                .columns(Column::auto().at_least(60.0), columns.len())
                .header(20.0, |mut header| {
                    for col in columns {
                        header.col(|ui: &mut Ui| {
                            ui.strong(&col.name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(18.0, n_rows, |mut row| {
                        let i = row.index();
                        for col in columns {
                            row.col(|ui: &mut Ui| {
                                ui.label(col.cells[i].to_string());
                            });
                        }
                    });
                });
        });
}

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

pub fn narrative_panel(ui: &mut Ui, state: &mut AppState) {
    let pending = matches!(state.narrative, NarrativeState::Pending(_));
    let can_weave = state.story_facts().is_some() && !pending;

    ui.horizontal(|ui: &mut Ui| {
        if ui
            .add_enabled(can_weave, egui::Button::new("✨ Weave narrative"))
            .clicked()
        {
            state.start_narrative();
        }
        if state.anthropic().credential().is_none() {
            ui.label(RichText::new("Demo mode: no API key, using a template summary.").weak());
        }
    });

    match &state.narrative {
        NarrativeState::Idle => {}
        NarrativeState::Pending(_) => {
            ui.horizontal(|ui: &mut Ui| {
                ui.spinner();
                ui.label("Weaving…");
            });
        }
        NarrativeState::Failed(msg) => {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
        NarrativeState::Ready(narrative) => match &narrative.local {
            Some(local) => {
                ui.columns(2, |cols: &mut [Ui]| {
                    cols[0].strong("English");
                    cols[0].label(&narrative.english);
                    cols[1].strong("Local");
                    cols[1].label(local);
                });
            }
            None => {
                ui.label(&narrative.english);
            }
        },
    }
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open dataset")
        .add_filter("Supported files", &["csv", "txt", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_source(DataSource::File(path));
    }
}

