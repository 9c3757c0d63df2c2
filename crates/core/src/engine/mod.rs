use crate::{
    catalog::{catalog, AccentPulse, Pattern, Schedule},
    envelope::envelope,
    grid::Intensities,
    random::{self, Event},
};

/// Seed used when a procedural pattern is selected without one.
pub const DEFAULT_SEED: &str = "1";

/// Reduces absolute time into `[0, loop_ms)`, also for negative input.
pub fn fold_loop_time(t_abs: f64, loop_ms: f64) -> f64 {
    if !(loop_ms > 0.0 && loop_ms.is_finite() && t_abs.is_finite()) {
        return 0.0;
    }

    let folded = ((t_abs % loop_ms) + loop_ms) % loop_ms;
    // (-tiny % l) + l can round up to exactly l.
    if folded >= loop_ms {
        0.0
    } else {
        folded
    }
}

/// A pattern paired with the triggers it plays. Procedural patterns carry
/// their seeded event list, generated once here and never again.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPattern {
    pattern: Pattern,
    seed: String,
    events: Vec<Event>,
}

impl ResolvedPattern {
    pub fn new(pattern: Pattern, seed: &str) -> Self {
        let events = match &pattern.schedule {
            Schedule::Procedural(params) => random::generate(seed, params),
            Schedule::Steps(_) => Vec::new(),
        };

        Self {
            pattern,
            seed: seed.to_string(),
            events,
        }
    }

    /// Resolves `id` against the shipped catalog, falling back to the default
    /// pattern for unknown ids.
    pub fn from_catalog(id: &str, seed: Option<&str>) -> Self {
        let pattern = catalog().resolve_or_default(id).clone();
        Self::new(pattern, seed.unwrap_or(DEFAULT_SEED))
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn id(&self) -> &str {
        &self.pattern.id
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn loop_ms(&self) -> f64 {
        self.pattern.loop_ms
    }
}

/// Brightness of every cell at absolute time `t_abs`.
///
/// Pure: the same `(t_abs, pattern)` always gives the same vector, and
/// `t_abs` and `t_abs + loop_ms` always agree. That is what makes captured
/// loops seamless.
pub fn compute_intensities(t_abs: f64, resolved: &ResolvedPattern) -> Intensities {
    let pattern = &resolved.pattern;
    let loop_ms = pattern.loop_ms;
    let t_loop = fold_loop_time(t_abs, loop_ms);
    let mut out = Intensities::dark();

    match &pattern.schedule {
        Schedule::Steps(steps) => {
            for (index, step) in steps.iter().enumerate() {
                let event_time = index as f64 * pattern.beat_ms;
                let dt = wrapped_delay(t_loop, event_time, loop_ms);
                let value = envelope(dt, pattern.pulse_ms, 1.0);
                for &cell in step {
                    out.combine_max(cell, value);
                }
            }
        }
        Schedule::Procedural(_) => {
            for event in &resolved.events {
                let dt = wrapped_delay(t_loop, event.t_ms, loop_ms);
                out.combine_max(event.cell, envelope(dt, pattern.pulse_ms, event.amplitude));
            }
        }
    }

    if let Some(accent) = &pattern.accent {
        out.combine_max(accent.cell, accent_value(t_abs, accent));
    }

    out.clamped()
}

// A trigger that is still ahead in this loop is treated as having fired one
// loop earlier, so a breath spanning the loop seam stays continuous.
fn wrapped_delay(t_loop: f64, event_time: f64, loop_ms: f64) -> f64 {
    let dt = t_loop - event_time;
    if dt < 0.0 {
        dt + loop_ms
    } else {
        dt
    }
}

fn accent_value(t_abs: f64, accent: &AccentPulse) -> f64 {
    if !(accent.period_ms > 0.0) {
        return 0.0;
    }
    envelope(t_abs.rem_euclid(accent.period_ms), accent.pulse_ms, accent.amplitude)
}
