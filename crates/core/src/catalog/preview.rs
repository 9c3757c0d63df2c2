use serde::Serialize;

use crate::{
    engine::{compute_intensities, ResolvedPattern, DEFAULT_SEED},
    grid::Intensities,
};

use super::PatternCatalog;

/// Fraction of the loop at which idle previews are sampled.
pub const PREVIEW_PHASE: f64 = 0.35;

const GOLDEN_FRACTION: f64 = 0.618_033_988_749_895;

/// Still frame shown for a pattern that is not animating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternPreview {
    pub id: String,
    /// Per-pattern shift so neighbouring previews do not all sit on the same beat.
    pub phase_offset_ms: f64,
    pub snapshot: Intensities,
}

/// Previews for every pattern of a catalog, computed once.
#[derive(Debug, Clone)]
pub struct PreviewCatalog {
    previews: Vec<PatternPreview>,
}

impl PreviewCatalog {
    pub fn build(catalog: &PatternCatalog) -> Self {
        let previews = catalog
            .iter()
            .enumerate()
            .map(|(index, pattern)| {
                let phase_offset_ms = (index as f64 * GOLDEN_FRACTION).fract() * pattern.loop_ms;
                let resolved = ResolvedPattern::new(pattern.clone(), DEFAULT_SEED);
                let at = PREVIEW_PHASE * pattern.loop_ms + phase_offset_ms;
                PatternPreview {
                    id: pattern.id.clone(),
                    phase_offset_ms,
                    snapshot: compute_intensities(at, &resolved),
                }
            })
            .collect();

        Self { previews }
    }

    pub fn get(&self, id: &str) -> Option<&PatternPreview> {
        self.previews.iter().find(|preview| preview.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatternPreview> + '_ {
        self.previews.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_preview_per_pattern() {
        let catalog = PatternCatalog::builtin();
        let previews = PreviewCatalog::build(&catalog);
        assert_eq!(previews.iter().count(), catalog.len());
        for pattern in catalog.iter() {
            let preview = previews.get(&pattern.id).unwrap();
            assert!((0.0..pattern.loop_ms).contains(&preview.phase_offset_ms));
        }
    }

    #[test]
    fn previews_are_stable_and_offsets_differ() {
        let catalog = PatternCatalog::builtin();
        let a = PreviewCatalog::build(&catalog);
        let b = PreviewCatalog::build(&catalog);
        assert_eq!(a.previews, b.previews);

        let spiral = a.get("spiral").unwrap().phase_offset_ms;
        let wave = a.get("wave").unwrap().phase_offset_ms;
        assert_ne!(spiral, wave);
    }

    #[test]
    fn at_least_one_cell_is_lit_somewhere() {
        let previews = PreviewCatalog::build(&PatternCatalog::builtin());
        assert!(previews.iter().any(|preview| preview.snapshot.peak() > 0.0));
    }
}
