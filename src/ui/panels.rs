use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use thermal_panda::data::pairwise::CurveSummary;

use crate::state::{AppState, ModalityView, Panel, ViewMode};

// ---------------------------------------------------------------------------
// Left side panel
// ---------------------------------------------------------------------------

fn summary_grid(ui: &mut Ui, id: &str, summary: Option<CurveSummary>) {
    let Some(s) = summary else {
        ui.label("(no overlapping values)");
        return;
    };
    egui::Grid::new(id).num_columns(2).striped(true).show(ui, |ui: &mut Ui| {
        for (label, value) in [
            ("mean", s.mean),
            ("std", s.std),
            ("max |Δ|", s.max_abs),
            ("mean |Δ|", s.mean_abs),
        ] {
            ui.label(label);
            ui.monospace(format!("{value:.5}"));
            ui.end_row();
        }
    });
}

fn samples_section(ui: &mut Ui, view: &ModalityView) {
    let (processed, skipped, errors) = view.output.summary.counts();
    ui.label(format!("{processed} processed, {skipped} skipped, {errors} errors"));

    if !view.output.summary.skipped.is_empty() || !view.output.summary.errors.is_empty() {
        egui::CollapsingHeader::new("Issues")
            .id_salt("issues")
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                for issue in &view.output.summary.skipped {
                    ui.label(format!("{}: {}", issue.file, issue.kind));
                }
                for issue in &view.output.summary.errors {
                    ui.label(RichText::new(format!("{}: {}", issue.file, issue.kind)).color(Color32::RED));
                }
            });
    }
    ui.separator();

    ui.strong("Samples");
    for (idx, name) in view.output.matrix.sample_names().iter().enumerate() {
        let mut text = RichText::new(format!("{idx}: {name}")).color(view.colors.color_for(name));
        if view.output.matrix.is_missing_row(idx) {
            text = text.italics();
        }
        ui.label(text);
    }
}

fn pairs_section(ui: &mut Ui, state: &mut AppState) {
    let n_pairs = state.n_pairs();
    ui.horizontal(|ui: &mut Ui| {
        if ui.add_enabled(state.pair_index > 0, egui::Button::new("◀ Prev")).clicked() {
            state.prev_pair();
        }
        if ui
            .add_enabled(state.pair_index + 1 < n_pairs, egui::Button::new("Next ▶"))
            .clicked()
        {
            state.next_pair();
        }
    });

    let (Some(view), Some(pair)) = (state.current(), state.current_pair()) else {
        ui.label("No pairs.");
        return;
    };
    let names = view.output.matrix.sample_names();
    ui.label(format!(
        "{}/{}: {} vs {}",
        state.pair_index + 1,
        n_pairs,
        names[pair.i],
        names[pair.j]
    ));
    ui.add_space(4.0);
    summary_grid(ui, "pair_summary", pair.summary);
}

fn overall_section(ui: &mut Ui, view: &ModalityView) {
    let analysis = &view.output.analysis;
    ui.label(format!("{} pairs", analysis.n_pairs()));
    if let Some(global) = analysis.global {
        ui.label(format!(
            "Δ range [{:.5}, {:.5}], max |Δ| {:.5}",
            global.diff_min, global.diff_max, global.abs_max
        ));
    }
    ui.add_space(4.0);
    ui.strong("Mean difference");
    summary_grid(ui, "mean_diff_summary", analysis.mean_difference.overall());
    ui.add_space(4.0);
    ui.strong("Mean absolute difference");
    summary_grid(ui, "mean_abs_diff_summary", analysis.mean_abs_difference.overall());
}

/// Render the left panel: batch summary, sample list and the statistics of
/// whatever the central panel shows.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading(state.view_mode.modality().label());
    ui.separator();

    if state.current().is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            match state.panel {
                Panel::Curves => {}
                Panel::Pairs => {
                    pairs_section(ui, state);
                    ui.separator();
                }
                Panel::Summary => {
                    if let Some(view) = state.current() {
                        overall_section(ui, view);
                    }
                    ui.separator();
                }
            }
            if let Some(view) = state.current() {
                samples_section(ui, view);
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for mode in [ViewMode::ShowingTga, ViewMode::ShowingDsc] {
            let label = mode.modality().label();
            if ui.selectable_label(state.view_mode == mode, label).clicked() {
                state.set_view_mode(mode);
            }
        }

        ui.separator();

        for (panel, label) in [
            (Panel::Curves, "Curves"),
            (Panel::Pairs, "Pairs"),
            (Panel::Summary, "Summary"),
        ] {
            if ui.selectable_label(state.panel == panel, label).clicked() {
                state.panel = panel;
            }
        }

        ui.separator();

        if let Some(dir) = &state.data_dir {
            ui.label(dir.display().to_string());
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

/// Ask for a folder holding `TGA/` and `DSC/` subfolders and process both.
pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open thermal analysis data folder")
        .pick_folder();

    if let Some(dir) = folder {
        log::info!("Loading {}", dir.display());
        state.load_folder(&dir);
    }
}
