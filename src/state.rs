use std::path::{Path, PathBuf};

use thermal_panda::config::PipelineConfig;
use thermal_panda::data::format::Modality;
use thermal_panda::data::pairwise::{pair_statistics, PairStatistics};
use thermal_panda::pipeline::{run_modality, ModalityOutput};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// View selection
// ---------------------------------------------------------------------------

/// Which dataset is on screen. Only changed by user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    ShowingTga,
    ShowingDsc,
}

impl ViewMode {
    pub fn modality(self) -> Modality {
        match self {
            ViewMode::ShowingTga => Modality::Tga,
            ViewMode::ShowingDsc => Modality::Dsc,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ViewMode::ShowingTga => ViewMode::ShowingDsc,
            ViewMode::ShowingDsc => ViewMode::ShowingTga,
        }
    }
}

/// Which plot the central panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Curves,
    Pairs,
    Summary,
}

/// One processed modality plus its colours.
pub struct ModalityView {
    pub output: ModalityOutput,
    pub colors: ColorMap,
}

impl ModalityView {
    pub fn new(output: ModalityOutput) -> Self {
        let colors = ColorMap::new(output.matrix.sample_names());
        Self { output, colors }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    pub config: PipelineConfig,

    /// Folder holding `TGA/` and `DSC/` (None until user opens one).
    pub data_dir: Option<PathBuf>,

    pub tga: Option<ModalityView>,
    pub dsc: Option<ModalityView>,

    pub view_mode: ViewMode,
    pub panel: Panel,

    /// Index into the current modality's pair list.
    pub pair_index: usize,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Run the pipeline on `<dir>/TGA` and `<dir>/DSC`. A modality that fails
    /// is left empty and its error reported in the status line.
    pub fn load_folder(&mut self, dir: &Path) {
        let mut problems = Vec::new();
        for modality in Modality::ALL {
            let sub = dir.join(modality.label());
            let view = match run_modality(&sub, modality, &self.config) {
                Ok(output) => {
                    log::info!(
                        "{modality}: {} samples, {} pairs",
                        output.matrix.n_samples(),
                        output.analysis.n_pairs()
                    );
                    Some(ModalityView::new(output))
                }
                Err(e) => {
                    log::error!("{modality}: {e}");
                    problems.push(format!("{modality}: {e}"));
                    None
                }
            };
            match modality {
                Modality::Tga => self.tga = view,
                Modality::Dsc => self.dsc = view,
            }
        }
        self.data_dir = Some(dir.to_path_buf());
        self.pair_index = 0;
        self.status_message = (!problems.is_empty()).then(|| problems.join("; "));
    }

    pub fn view(&self, mode: ViewMode) -> Option<&ModalityView> {
        match mode {
            ViewMode::ShowingTga => self.tga.as_ref(),
            ViewMode::ShowingDsc => self.dsc.as_ref(),
        }
    }

    /// The dataset currently on screen.
    pub fn current(&self) -> Option<&ModalityView> {
        self.view(self.view_mode)
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if mode != self.view_mode {
            self.view_mode = mode;
            self.pair_index = 0;
        }
    }

    pub fn toggle_view_mode(&mut self) {
        self.set_view_mode(self.view_mode.toggled());
    }

    pub fn n_pairs(&self) -> usize {
        self.current().map_or(0, |v| v.output.analysis.n_pairs())
    }

    pub fn next_pair(&mut self) {
        if self.pair_index + 1 < self.n_pairs() {
            self.pair_index += 1;
        }
    }

    pub fn prev_pair(&mut self) {
        self.pair_index = self.pair_index.saturating_sub(1);
    }

    /// Statistics of the pair under the cursor.
    pub fn current_pair(&self) -> Option<PairStatistics> {
        let view = self.current()?;
        let &(i, j) = view.output.analysis.pairs.get(self.pair_index)?;
        Some(pair_statistics(&view.output.matrix, i, j))
    }
}
