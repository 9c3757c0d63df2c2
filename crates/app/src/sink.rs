use std::path::{Path, PathBuf};

use glowgrid_core::{
    Cell, FramePlan, FrameSink, GlowGridError, Intensities, Result, Theme, GRID_SIDE,
};
use image::{Rgb, RgbImage};

/// Zero padding of frame numbers in file names. The encoder input pattern
/// depends on it.
pub const FRAME_DIGITS: usize = 5;

/// Geometry of a rendered still.
#[derive(Debug, Clone, Copy)]
pub struct GridLayout {
    pub cell_px: u32,
    pub gap_px: u32,
}

impl GridLayout {
    pub fn side_px(&self) -> u32 {
        GRID_SIDE as u32 * self.cell_px + (GRID_SIDE as u32 + 1) * self.gap_px
    }

    fn cell_origin(&self, cell: Cell) -> (u32, u32) {
        let step = self.cell_px + self.gap_px;
        (
            self.gap_px + cell.col() as u32 * step,
            self.gap_px + cell.row() as u32 * step,
        )
    }
}

pub fn frame_file_name(prefix: &str, index: u64) -> String {
    format!("{prefix}_{index:0width$}.png", width = FRAME_DIGITS)
}

/// Whether `name` is a frame written under `prefix`, e.g. `frame_00012.png`.
fn is_frame_file(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix(".png"))
        .is_some_and(|digits| {
            digits.len() == FRAME_DIGITS && digits.bytes().all(|b| b.is_ascii_digit())
        })
}

/// Deletes frames a previous capture left under `prefix`. The encoder reads
/// every consecutive number it finds, so stale tails would end up in the loop.
fn remove_stale_frames(dir: &Path, prefix: &str) -> Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_str().is_some_and(|name| is_frame_file(name, prefix)) {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Paints one frame as a square image.
pub fn render_frame(frame: &Intensities, theme: &Theme, layout: GridLayout) -> RgbImage {
    let side = layout.side_px();
    let mut image = RgbImage::from_pixel(side, side, Rgb(theme.background));

    for (cell, value) in frame.iter() {
        let colour = Rgb(theme.shade(value));
        let (x0, y0) = layout.cell_origin(cell);
        for y in y0..y0 + layout.cell_px {
            for x in x0..x0 + layout.cell_px {
                image.put_pixel(x, y, colour);
            }
        }
    }

    image
}

/// Writes every captured frame as a sequentially numbered PNG.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    prefix: String,
    theme: Theme,
    layout: GridLayout,
    written: u64,
}

impl PngSequenceSink {
    pub fn new(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        theme: Theme,
        layout: GridLayout,
    ) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            theme,
            layout,
            written: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, plan: &FramePlan) -> Result<()> {
        if plan.frame_count >= 10_u64.pow(FRAME_DIGITS as u32) {
            return Err(GlowGridError::InvalidInput(
                "too many frames for the numbered file pattern",
            ));
        }
        if self.layout.cell_px == 0 {
            return Err(GlowGridError::InvalidInput("cell size must be at least one pixel"));
        }

        std::fs::create_dir_all(&self.dir)?;
        let removed = remove_stale_frames(&self.dir, &self.prefix)?;
        if removed > 0 {
            tracing::debug!(
                dir = %self.dir.display(),
                removed,
                "removed frames of an earlier capture"
            );
        }
        self.written = 0;
        Ok(())
    }

    fn push_frame(&mut self, index: u64, _t_ms: f64, frame: &Intensities) -> Result<()> {
        let path = self.dir.join(frame_file_name(&self.prefix, index));
        render_frame(frame, &self.theme, self.layout)
            .save(&path)
            .map_err(|e| GlowGridError::msg(format!("write png '{}': {e}", path.display())))?;
        self.written += 1;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        tracing::info!(dir = %self.dir.display(), frames = self.written, "frame sequence written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glowgrid_core::{GridView, Recorder, ResolvedPattern, TimeMode};

    use super::*;

    const LAYOUT: GridLayout = GridLayout {
        cell_px: 4,
        gap_px: 2,
    };

    #[test]
    fn file_names_are_zero_padded() {
        assert_eq!(frame_file_name("frame", 7), "frame_00007.png");
    }

    #[test]
    fn recognises_only_numbered_frames() {
        assert!(is_frame_file("loop_00042.png", "loop"));
        assert!(!is_frame_file("loop_0042.png", "loop"));
        assert!(!is_frame_file("loop_00042.jpg", "loop"));
        assert!(!is_frame_file("other_00042.png", "loop"));
        assert!(!is_frame_file("loop_extra_00042.png", "loop"));
        assert!(!is_frame_file("loop.mp4", "loop"));
    }

    #[test]
    fn dark_frame_uses_dim_cells_on_background() {
        let theme = Theme::default();
        let image = render_frame(&Intensities::dark(), &theme, LAYOUT);
        assert_eq!(image.width(), LAYOUT.side_px());
        assert_eq!(image.get_pixel(0, 0), &Rgb(theme.background));
        assert_eq!(image.get_pixel(2, 2), &Rgb(theme.dim));
    }

    #[test]
    fn writes_one_png_per_frame() {
        let dir = PathBuf::from("target").join("png_sequence_sink");
        let _ = std::fs::remove_dir_all(&dir);

        let view = GridView::new(ResolvedPattern::from_catalog("checker", None), TimeMode::Export);
        let mut sink = PngSequenceSink::new(&dir, "loop", Theme::default(), LAYOUT);
        let summary = Recorder::new(10.0).capture_view(&view, &mut sink).unwrap();

        assert_eq!(sink.written(), summary.plan.frame_count);
        assert!(dir.join(frame_file_name("loop", 0)).is_file());
        let last = summary.plan.frame_count - 1;
        assert!(dir.join(frame_file_name("loop", last)).is_file());
        assert!(!dir.join(frame_file_name("loop", last + 1)).exists());
    }

    fn frames_on_disk(dir: &Path, prefix: &str) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.unwrap().file_name().into_string().ok())
            .filter(|name| is_frame_file(name, prefix))
            .count()
    }

    #[test]
    fn recapture_leaves_no_stale_frames() {
        let dir = PathBuf::from("target").join("png_sequence_recapture");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let keep = dir.join("notes.txt");
        std::fs::write(&keep, "keep me").unwrap();

        let recorder = Recorder::new(10.0);
        let long = GridView::new(ResolvedPattern::from_catalog("random", None), TimeMode::Export);
        let mut sink = PngSequenceSink::new(&dir, "f", Theme::default(), LAYOUT);
        let first = recorder.capture_view(&long, &mut sink).unwrap();
        assert_eq!(frames_on_disk(&dir, "f"), first.plan.frame_count as usize);

        let short = GridView::new(ResolvedPattern::from_catalog("checker", None), TimeMode::Export);
        let mut sink = PngSequenceSink::new(&dir, "f", Theme::default(), LAYOUT);
        let second = recorder.capture_view(&short, &mut sink).unwrap();

        assert!(second.plan.frame_count < first.plan.frame_count);
        assert_eq!(frames_on_disk(&dir, "f"), second.plan.frame_count as usize);
        assert!(keep.is_file());
    }
}
