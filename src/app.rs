use eframe::egui;

use crate::state::{AppState, Panel};
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ThermalPandaApp {
    pub state: AppState,
}

impl ThermalPandaApp {
    /// Start with `dir` already processed, if given.
    pub fn with_folder(dir: Option<&std::path::Path>) -> Self {
        let mut app = Self::default();
        if let Some(dir) = dir {
            app.state.load_folder(dir);
        }
        app
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let (next, prev, toggle) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowRight) || i.key_pressed(egui::Key::Enter),
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::T),
            )
        });
        if toggle {
            self.state.toggle_view_mode();
        }
        if self.state.panel == Panel::Pairs {
            if next {
                self.state.next_pair();
            }
            if prev {
                self.state.prev_pair();
            }
        }
    }
}

impl eframe::App for ThermalPandaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: samples and statistics ----
        egui::SidePanel::left("info_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.panel {
            Panel::Curves => plot::curves_plot(ui, &self.state),
            Panel::Pairs => plot::pair_plot(ui, &self.state),
            Panel::Summary => plot::summary_plot(ui, &self.state),
        });
    }
}
