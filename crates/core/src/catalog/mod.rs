use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::{
    grid::{Cell, CELL_COUNT},
    random::RandomParams,
    GlowGridError, Result,
};

mod preview;

pub use preview::{PatternPreview, PreviewCatalog, PREVIEW_PHASE};

/// Pattern used whenever a requested id is unknown.
pub const DEFAULT_PATTERN_ID: &str = "spiral";

/// Cells that light up together at one beat of a schedule. May be empty (a rest).
pub type Step = Vec<Cell>;

/// Where a pattern's triggers come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// Hand-authored steps, one every `beat_ms`.
    Steps(Vec<Step>),
    /// Events generated from the selection seed.
    Procedural(RandomParams),
}

/// Always-on decorative breath on one cell, timed from absolute time rather
/// than from the pattern loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccentPulse {
    pub cell: Cell,
    pub period_ms: f64,
    pub pulse_ms: f64,
    pub amplitude: f64,
}

/// Immutable pattern descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    pub schedule: Schedule,
    pub beat_ms: f64,
    pub loop_ms: f64,
    pub pulse_ms: f64,
    pub accent: Option<AccentPulse>,
}

impl Pattern {
    /// Builds a schedule-based pattern, checking every step against the grid.
    ///
    /// The loop length is always `steps.len() * beat_ms`.
    pub fn from_steps(
        id: impl Into<String>,
        steps: &[&[usize]],
        beat_ms: f64,
        pulse_ms: f64,
    ) -> Result<Self> {
        if steps.is_empty() {
            return Err(GlowGridError::InvalidInput("pattern needs at least one step"));
        }
        if !(beat_ms > 0.0 && beat_ms.is_finite()) {
            return Err(GlowGridError::InvalidInput("beat must be finite and positive"));
        }
        if !(pulse_ms > 0.0 && pulse_ms.is_finite()) {
            return Err(GlowGridError::InvalidInput("pulse must be finite and positive"));
        }

        let mut built = Vec::with_capacity(steps.len());
        for step in steps {
            let mut seen = [false; CELL_COUNT];
            let mut cells = Vec::with_capacity(step.len());
            for &index in step.iter() {
                let cell = Cell::new(index)
                    .ok_or(GlowGridError::InvalidInput("step references a cell outside 0..=8"))?;
                if seen[cell.index()] {
                    return Err(GlowGridError::InvalidInput("step lists the same cell twice"));
                }
                seen[cell.index()] = true;
                cells.push(cell);
            }
            built.push(cells);
        }

        Ok(Self {
            id: id.into(),
            loop_ms: built.len() as f64 * beat_ms,
            schedule: Schedule::Steps(built),
            beat_ms,
            pulse_ms,
            accent: None,
        })
    }

    /// Builds a seed-driven pattern with an explicit loop length.
    pub fn procedural(id: impl Into<String>, params: RandomParams, pulse_ms: f64) -> Self {
        Self {
            id: id.into(),
            schedule: Schedule::Procedural(params),
            beat_ms: params.beat_ms,
            loop_ms: params.loop_ms,
            pulse_ms,
            accent: None,
        }
    }

    pub fn with_accent(mut self, accent: AccentPulse) -> Self {
        self.accent = Some(accent);
        self
    }

    pub fn is_procedural(&self) -> bool {
        matches!(self.schedule, Schedule::Procedural(_))
    }

    pub fn steps(&self) -> Option<&[Step]> {
        match &self.schedule {
            Schedule::Steps(steps) => Some(steps),
            Schedule::Procedural(_) => None,
        }
    }
}

/// The fixed set of patterns shipped with the application.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    patterns: Vec<Pattern>,
}

impl PatternCatalog {
    /// Builds every shipped pattern. Each call produces an identical catalog.
    pub fn builtin() -> Self {
        let mut patterns = vec![
            authored(
                "spiral",
                &[&[0], &[1], &[2], &[5], &[8], &[7], &[6], &[3], &[4]],
                160.0,
                640.0,
            ),
            authored(
                "wave",
                &[&[0], &[1, 3], &[2, 4, 6], &[5, 7], &[8]],
                200.0,
                900.0,
            ),
            authored(
                "ripple",
                &[&[4], &[1, 3, 5, 7], &[0, 2, 6, 8], &[]],
                250.0,
                1000.0,
            ),
            authored(
                "scan",
                &[&[0, 1, 2], &[3, 4, 5], &[6, 7, 8], &[3, 4, 5]],
                300.0,
                1100.0,
            ),
            authored(
                "snake",
                &[&[0], &[1], &[2], &[5], &[4], &[3], &[6], &[7], &[8]],
                150.0,
                600.0,
            ),
            authored("checker", &[&[0, 2, 4, 6, 8], &[1, 3, 5, 7]], 400.0, 1200.0),
            authored(
                "rain",
                &[&[1], &[4, 0], &[7, 3, 2], &[6, 5], &[8]],
                240.0,
                820.0,
            ),
            authored(
                "heartbeat",
                &[&[4], &[1, 3, 5, 7], &[], &[]],
                200.0,
                520.0,
            )
            .with_accent(AccentPulse {
                cell: Cell::CENTER,
                period_ms: 400.0,
                pulse_ms: 260.0,
                amplitude: 0.35,
            }),
        ];

        patterns.push(Pattern::procedural(
            "random",
            RandomParams {
                loop_ms: 4800.0,
                beat_ms: 300.0,
                min_count: 1,
                max_count: 3,
                min_amplitude: 0.45,
                max_amplitude: 1.0,
            },
            1100.0,
        ));

        Self { patterns }
    }

    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|pattern| pattern.id == id)
    }

    /// Looks up `id`, falling back to [`DEFAULT_PATTERN_ID`] so there is
    /// always something to render.
    pub fn resolve_or_default(&self, id: &str) -> &Pattern {
        if let Some(pattern) = self.get(id) {
            return pattern;
        }

        tracing::warn!(requested = id, fallback = DEFAULT_PATTERN_ID, "unknown pattern");
        self.default_pattern()
    }

    pub fn default_pattern(&self) -> &Pattern {
        self.get(DEFAULT_PATTERN_ID).unwrap_or(&self.patterns[0])
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.patterns.iter().map(|pattern| pattern.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> + '_ {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Process-wide catalog, built on first use and never mutated.
pub fn catalog() -> &'static PatternCatalog {
    static CATALOG: OnceLock<PatternCatalog> = OnceLock::new();
    CATALOG.get_or_init(PatternCatalog::builtin)
}

fn authored(id: &str, steps: &[&[usize]], beat_ms: f64, pulse_ms: f64) -> Pattern {
    Pattern::from_steps(id, steps, beat_ms, pulse_ms)
        .expect("built-in step tables must stay on the grid")
}
