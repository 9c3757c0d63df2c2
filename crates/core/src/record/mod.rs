use serde::{Deserialize, Serialize};

use crate::{bridge::ExportHost, grid::Intensities, render::GridView, GlowGridError, Result};

/// Largest distance, in frames, between `loop_ms * fps / 1000` and a whole
/// number that still counts as a clean loop.
pub const FRAME_COUNT_TOLERANCE: f64 = 1e-6;

/// The exact timestamps a capture visits for one loop.
///
/// Frame `i` sits at `i * 1000 / fps` milliseconds. The loop end itself is
/// never requested because it is frame 0 again.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FramePlan {
    pub loop_ms: f64,
    pub fps: f64,
    pub frame_count: u64,
    pub frame_ms: f64,
    /// Distance of the exact frame count from `frame_count`.
    pub residual: f64,
}

impl FramePlan {
    /// Plans a capture. An unusable loop length is fatal; a fractional frame
    /// count only logs a warning because the loop merely gets a small seam.
    pub fn new(loop_ms: f64, fps: f64) -> Result<Self> {
        if !(loop_ms.is_finite() && loop_ms > 0.0) {
            return Err(GlowGridError::InvalidLoopDuration(loop_ms));
        }
        if !(fps.is_finite() && fps > 0.0) {
            return Err(GlowGridError::InvalidInput("fps must be finite and positive"));
        }

        let exact = loop_ms * fps / 1000.0;
        let rounded = exact.round();
        if rounded < 1.0 {
            return Err(GlowGridError::InvalidInput("loop is shorter than one frame"));
        }

        let plan = Self {
            loop_ms,
            fps,
            frame_count: rounded as u64,
            frame_ms: 1000.0 / fps,
            residual: (exact - rounded).abs(),
        };

        if !plan.is_seamless() {
            tracing::warn!(
                loop_ms,
                fps,
                exact_frames = exact,
                frame_count = plan.frame_count,
                "loop does not span a whole number of frames; the video will have a seam"
            );
        }

        Ok(plan)
    }

    pub fn is_seamless(&self) -> bool {
        self.residual <= FRAME_COUNT_TOLERANCE
    }

    pub fn timestamp(&self, index: u64) -> f64 {
        index as f64 * self.frame_ms
    }

    /// `(index, t_ms)` for every frame, in capture order.
    pub fn timestamps(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        (0..self.frame_count).map(move |index| (index, self.timestamp(index)))
    }
}

/// Receives captured frames strictly in order.
pub trait FrameSink {
    /// Called once before the first frame.
    fn begin(&mut self, plan: &FramePlan) -> Result<()>;
    /// Called once per frame with increasing `index`.
    fn push_frame(&mut self, index: u64, t_ms: f64, frame: &Intensities) -> Result<()>;
    /// Called once after the last frame.
    fn end(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedFrame {
    pub index: u64,
    pub t_ms: f64,
    pub intensities: Intensities,
}

/// Keeps every frame in memory. Handy for tests and JSON dumps.
#[derive(Debug, Default)]
pub struct InMemorySink {
    plan: Option<FramePlan>,
    frames: Vec<CapturedFrame>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(&self) -> Option<&FramePlan> {
        self.plan.as_ref()
    }

    pub fn frames(&self) -> &[CapturedFrame] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, plan: &FramePlan) -> Result<()> {
        self.plan = Some(*plan);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, index: u64, t_ms: f64, frame: &Intensities) -> Result<()> {
        self.frames.push(CapturedFrame {
            index,
            t_ms,
            intensities: *frame,
        });
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Outcome of one capture run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureSummary {
    pub pattern_id: String,
    pub plan: FramePlan,
    pub seamless: bool,
}

/// In-process capture driver. Steps an export-mode view through one loop,
/// one fully sampled frame before the next timestamp.
#[derive(Debug, Clone, Copy)]
pub struct Recorder {
    fps: f64,
}

impl Recorder {
    pub fn new(fps: f64) -> Self {
        Self { fps }
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Captures through `host`, which must carry `view`'s bridge.
    ///
    /// The loop duration is read from the host, never from the pattern, so
    /// the driver uses exactly what the view reports. A host bridged to a
    /// different view is rejected before the sink sees anything.
    pub fn capture(
        &self,
        host: &ExportHost,
        view: &GridView,
        sink: &mut dyn FrameSink,
    ) -> Result<CaptureSummary> {
        let loop_ms = host.loop_duration()?;
        let pattern_id = host.pattern_id()?;
        if !host.drives(view.source())? {
            return Err(GlowGridError::HostMismatch);
        }
        let plan = FramePlan::new(loop_ms, self.fps)?;

        tracing::info!(
            pattern = %pattern_id,
            loop_ms,
            fps = self.fps,
            frames = plan.frame_count,
            "capturing loop"
        );

        sink.begin(&plan)?;
        for (index, t_ms) in plan.timestamps() {
            host.set_export_time(t_ms)?;
            let frame = view.sample()?;
            sink.push_frame(index, t_ms, &frame)?;
            tracing::debug!(index, t_ms, "frame captured");
        }
        sink.end()?;

        Ok(CaptureSummary {
            pattern_id,
            seamless: plan.is_seamless(),
            plan,
        })
    }

    /// Registers `view` on a private host for the duration of the capture.
    pub fn capture_view(
        &self,
        view: &GridView,
        sink: &mut dyn FrameSink,
    ) -> Result<CaptureSummary> {
        let host = ExportHost::new();
        let _bridge = view.export_bridge(&host)?;
        self.capture(&host, view, sink)
    }
}
