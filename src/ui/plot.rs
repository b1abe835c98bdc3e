use eframe::egui::{Color32, Ui};
use egui_plot::{HLine, Legend, Line, LineStyle, Plot, PlotPoints};
use thermal_panda::data::pairwise::AggregateCurve;

use crate::state::{AppState, ModalityView};

/// `(x, y)` points of a row, skipping missing values.
fn present_points(grid: &[f64], values: &[Option<f64>]) -> Vec<[f64; 2]> {
    grid.iter()
        .zip(values)
        .filter_map(|(&x, v)| v.map(|y| [x, y]))
        .collect()
}

fn no_data(ui: &mut Ui, text: &str) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.heading(text);
    });
}

// ---------------------------------------------------------------------------
// Curves (central panel, default)
// ---------------------------------------------------------------------------

/// Trimmed, normalized curves of the current modality.
pub fn curves_plot(ui: &mut Ui, state: &AppState) {
    let Some(view) = state.current() else {
        no_data(ui, "Open a data folder to view curves  (File → Open folder…)");
        return;
    };
    let modality = view.output.modality;

    Plot::new("curves_plot")
        .legend(Legend::default())
        .x_axis_label("Temperature (°C)")
        .y_axis_label(modality.y_label())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for curve in &view.output.curves {
                let points: PlotPoints = curve
                    .x
                    .iter()
                    .zip(&curve.y)
                    .map(|(&xi, &yi)| [xi, yi])
                    .collect();
                let line = Line::new(points)
                    .name(&curve.sample)
                    .color(view.colors.color_for(&curve.sample))
                    .width(1.5);
                plot_ui.line(line);
            }
        });
}

// ---------------------------------------------------------------------------
// Current pair
// ---------------------------------------------------------------------------

/// Resampled rows of the current pair (top) and their difference (bottom),
/// the latter on the axis range shared by every pair.
pub fn pair_plot(ui: &mut Ui, state: &AppState) {
    let Some(view) = state.current() else {
        no_data(ui, "No data loaded.");
        return;
    };
    let Some(pair) = state.current_pair() else {
        no_data(ui, "Need at least two samples to compare.");
        return;
    };
    let matrix = &view.output.matrix;
    let names = matrix.sample_names();
    let (a, b) = (&names[pair.i], &names[pair.j]);
    let y_label = view.output.modality.y_label();
    let half = ui.available_height() / 2.0 - 4.0;

    Plot::new("pair_rows_plot")
        .legend(Legend::default())
        .height(half)
        .x_axis_label("Temperature (°C)")
        .y_axis_label(y_label)
        .show(ui, |plot_ui| {
            for (idx, name) in [(pair.i, a), (pair.j, b)] {
                let line = Line::new(present_points(matrix.grid(), matrix.row(idx)))
                    .name(name)
                    .color(view.colors.color_for(name))
                    .width(2.0);
                plot_ui.line(line);
            }
        });

    let mut diff_plot = Plot::new("pair_diff_plot")
        .legend(Legend::default())
        .height(half)
        .x_axis_label("Temperature (°C)")
        .y_axis_label(format!("{y_label} difference ({a} - {b})"));
    if let Some(global) = view.output.analysis.global {
        diff_plot = diff_plot.include_y(global.diff_min).include_y(global.diff_max);
    }
    diff_plot.show(ui, |plot_ui| {
        plot_ui.hline(HLine::new(0.0).color(Color32::GRAY).style(LineStyle::dashed_loose()));
        plot_ui.line(
            Line::new(present_points(matrix.grid(), &pair.diff))
                .name("Difference")
                .color(Color32::RED)
                .width(1.5),
        );
    });
}

// ---------------------------------------------------------------------------
// Aggregate over all pairs
// ---------------------------------------------------------------------------

/// Dashed ±1σ and ±2σ band edges as `(legend name, colour, points)`.
fn band_series(
    grid: &[f64],
    bands: [(Vec<Option<f64>>, Vec<Option<f64>>); 2],
    color: Color32,
) -> Vec<(&'static str, Color32, Vec<[f64; 2]>)> {
    let mut series = Vec::with_capacity(4);
    for ((lo, hi), (name, alpha)) in bands.iter().zip([("±1σ", 160u8), ("±2σ", 80u8)]) {
        let faded = Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha);
        series.push((name, faded, present_points(grid, lo)));
        series.push((name, faded, present_points(grid, hi)));
    }
    series
}

/// Mean difference and mean absolute difference across all pairs, with
/// ±1σ/±2σ bands.
pub fn summary_plot(ui: &mut Ui, state: &AppState) {
    let Some(view) = state.current() else {
        no_data(ui, "No data loaded.");
        return;
    };
    draw_summary(ui, view);
}

fn bands_of(curve: &AggregateCurve) -> [(Vec<Option<f64>>, Vec<Option<f64>>); 2] {
    [curve.band(1.0), curve.band(2.0)]
}

fn draw_summary(ui: &mut Ui, view: &ModalityView) {
    let analysis = &view.output.analysis;
    let grid = view.output.matrix.grid();
    let y_label = view.output.modality.y_label();
    let half = ui.available_height() / 2.0 - 4.0;

    let diff = &analysis.mean_difference;
    Plot::new("mean_diff_plot")
        .legend(Legend::default())
        .height(half)
        .x_axis_label("Temperature (°C)")
        .y_axis_label(format!("{y_label} difference"))
        .show(ui, |plot_ui| {
            plot_ui.hline(HLine::new(0.0).color(Color32::GRAY).style(LineStyle::dashed_loose()));
            plot_ui.line(
                Line::new(present_points(grid, &diff.mean))
                    .name("Mean difference")
                    .color(Color32::LIGHT_BLUE)
                    .width(2.0),
            );
            for (name, color, points) in band_series(grid, bands_of(diff), Color32::LIGHT_BLUE) {
                plot_ui.line(Line::new(points).name(name).color(color).style(LineStyle::dashed_loose()));
            }
        });

    let abs = &analysis.mean_abs_difference;
    Plot::new("mean_abs_diff_plot")
        .legend(Legend::default())
        .height(half)
        .x_axis_label("Temperature (°C)")
        .y_axis_label(format!("Absolute {y_label} difference"))
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(present_points(grid, &abs.mean))
                    .name("Mean absolute difference")
                    .color(Color32::LIGHT_RED)
                    .width(2.0),
            );
            for (name, color, points) in band_series(grid, bands_of(abs), Color32::LIGHT_RED) {
                plot_ui.line(Line::new(points).name(name).color(color).style(LineStyle::dashed_loose()));
            }
        });
}
