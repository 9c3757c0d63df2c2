//! Core library for the Glow Grid loop renderer.
//!
//! A 3×3 grid of cells breathes according to a named pattern. Everything here
//! is built so that the brightness of every cell is a pure function of
//! `(time, pattern)`: sampling the same instant twice gives the same frame, and
//! the last instant of a loop flows into the first. Time comes either from a
//! realtime clock or, in export mode, from a capture driver stepping through
//! exact frame timestamps via a scoped [`ExportBridge`].

pub mod bridge;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod grid;
pub mod random;
pub mod record;
pub mod render;
pub mod theme;
pub mod timeline;

pub use bridge::{ExportBridge, ExportHost};
pub use catalog::{
    catalog, AccentPulse, Pattern, PatternCatalog, PatternPreview, PreviewCatalog, Schedule,
    DEFAULT_PATTERN_ID,
};
pub use config::{AppConfig, CaptureConfig, SelectionConfig};
pub use engine::{compute_intensities, fold_loop_time, ResolvedPattern, DEFAULT_SEED};
pub use envelope::{envelope, BREATH_EXPONENT};
pub use error::{GlowGridError, Result};
pub use grid::{Cell, Intensities, CELL_COUNT, GRID_SIDE};
pub use random::{generate, hash_seed, Event, RandomParams, SeededRng};
pub use record::{CaptureSummary, CapturedFrame, FramePlan, FrameSink, InMemorySink, Recorder};
pub use render::{ascii_frame, GridView};
pub use theme::Theme;
pub use timeline::{CancelToken, FrameLoop, PlaybackClock, SharedTime, TimeMode, TimeSource};
