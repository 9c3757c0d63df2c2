use crate::{
    bridge::{ExportBridge, ExportHost},
    config::SelectionConfig,
    engine::{compute_intensities, ResolvedPattern},
    grid::{Intensities, GRID_SIDE},
    timeline::{FrameLoop, TimeMode, TimeSource},
    Result,
};

const SHADES: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// The hosting view: one resolved pattern driven by one time source.
///
/// Its time mode is fixed when the view is built. In export mode the view
/// never advances on its own; see [`GridView::export_bridge`].
#[derive(Debug)]
pub struct GridView {
    resolved: ResolvedPattern,
    source: TimeSource,
}

impl GridView {
    pub fn new(resolved: ResolvedPattern, mode: TimeMode) -> Self {
        Self {
            resolved,
            source: TimeSource::new(mode),
        }
    }

    /// Builds the view from the selection inputs read at load time.
    pub fn from_selection(selection: &SelectionConfig) -> Self {
        let resolved = ResolvedPattern::from_catalog(&selection.pattern, selection.seed.as_deref());
        tracing::info!(
            pattern = resolved.id(),
            seed = resolved.seed(),
            export = selection.export,
            "grid view ready"
        );
        Self::new(resolved, TimeMode::from_export_flag(selection.export))
    }

    pub fn mode(&self) -> TimeMode {
        self.source.mode()
    }

    pub fn resolved(&self) -> &ResolvedPattern {
        &self.resolved
    }

    pub fn loop_ms(&self) -> f64 {
        self.resolved.loop_ms()
    }

    pub fn source(&self) -> &TimeSource {
        &self.source
    }

    /// Intensities at the time source's current time.
    pub fn sample(&self) -> Result<Intensities> {
        let t_abs = self.source.now_ms()?;
        Ok(self.sample_at(t_abs))
    }

    pub fn sample_at(&self, t_abs: f64) -> Intensities {
        compute_intensities(t_abs, &self.resolved)
    }

    /// Exposes this view's time to a capture driver through `host` for as long
    /// as the returned bridge lives.
    pub fn export_bridge(&self, host: &ExportHost) -> Result<ExportBridge> {
        ExportBridge::register(host, &self.source, self.loop_ms(), self.resolved.id())
    }

    /// Drives the view from the realtime clock until `frame_loop` is cancelled.
    pub fn run_realtime<F>(&self, frame_loop: &FrameLoop, mut on_frame: F) -> Result<u64>
    where
        F: FnMut(f64, &Intensities) -> Result<()>,
    {
        frame_loop.run(&self.source, |t_abs| {
            let frame = self.sample_at(t_abs);
            on_frame(t_abs, &frame)
        })
    }
}

/// Renders a frame as three lines of shade characters, two per cell.
pub fn ascii_frame(frame: &Intensities) -> String {
    let mut out = String::with_capacity(GRID_SIDE * (GRID_SIDE * 3 + 1));
    for (cell, value) in frame.iter() {
        let index = (value * (SHADES.len() - 1) as f64).round() as usize;
        let shade = SHADES[index.min(SHADES.len() - 1)];
        out.push(shade);
        out.push(shade);
        if cell.col() + 1 == GRID_SIDE {
            out.push('\n');
        } else {
            out.push(' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DEFAULT_PATTERN_ID;

    fn selection(pattern: &str, export: bool) -> SelectionConfig {
        SelectionConfig {
            pattern: pattern.to_string(),
            seed: Some("123".to_string()),
            export,
            theme: None,
        }
    }

    #[test]
    fn export_view_samples_injected_time() {
        let view = GridView::from_selection(&selection("wave", true));
        let host = ExportHost::new();
        let _bridge = view.export_bridge(&host).unwrap();

        host.set_export_time(250.0).unwrap();
        assert_eq!(view.sample().unwrap(), view.sample_at(250.0));
        assert_eq!(host.loop_duration().unwrap(), view.loop_ms());
    }

    #[test]
    fn realtime_view_cannot_export() {
        let view = GridView::from_selection(&selection("wave", false));
        assert_eq!(view.mode(), TimeMode::Realtime);
        assert!(view.export_bridge(&ExportHost::new()).is_err());
    }

    #[test]
    fn unknown_selection_renders_default() {
        let view = GridView::from_selection(&selection("missing", true));
        assert_eq!(view.resolved().id(), DEFAULT_PATTERN_ID);
    }

    #[test]
    fn realtime_view_reports_frames() {
        let view = GridView::from_selection(&selection("snake", false));
        let frame_loop = FrameLoop::new(1000.0).unwrap();
        let token = frame_loop.cancel_token();
        let mut count = 0;
        let frames = view
            .run_realtime(&frame_loop, |_, frame| {
                assert!(frame.peak() <= 1.0);
                count += 1;
                if count == 2 {
                    token.cancel();
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(frames, 2);
    }

    #[test]
    fn ascii_frame_has_three_rows() {
        let text = ascii_frame(&Intensities::dark());
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().all(|line| line.chars().count() == 8));
    }
}
