use serde::Serialize;

pub const DEFAULT_THEME_ID: &str = "ember";

/// Colours used when frames are turned into pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub id: &'static str,
    pub background: [u8; 3],
    /// Colour of a cell at intensity 0.
    pub dim: [u8; 3],
    /// Colour of a cell at intensity 1.
    pub glow: [u8; 3],
}

const THEMES: &[Theme] = &[
    Theme {
        id: "ember",
        background: [12, 8, 6],
        dim: [38, 22, 16],
        glow: [255, 146, 64],
    },
    Theme {
        id: "ice",
        background: [6, 10, 16],
        dim: [18, 30, 44],
        glow: [140, 220, 255],
    },
    Theme {
        id: "moss",
        background: [6, 12, 8],
        dim: [20, 36, 24],
        glow: [150, 255, 120],
    },
    Theme {
        id: "mono",
        background: [0, 0, 0],
        dim: [24, 24, 24],
        glow: [255, 255, 255],
    },
];

impl Theme {
    pub fn all() -> &'static [Theme] {
        THEMES
    }

    pub fn by_id(id: &str) -> Option<Theme> {
        THEMES.iter().copied().find(|theme| theme.id == id)
    }

    pub fn by_id_or_default(id: Option<&str>) -> Theme {
        match id {
            None => Self::default(),
            Some(id) => Self::by_id(id).unwrap_or_else(|| {
                tracing::warn!(requested = id, fallback = DEFAULT_THEME_ID, "unknown theme");
                Self::default()
            }),
        }
    }

    /// Cell colour for `intensity`, clamped into `[0, 1]`.
    pub fn shade(&self, intensity: f64) -> [u8; 3] {
        let t = if intensity.is_nan() {
            0.0
        } else {
            intensity.clamp(0.0, 1.0)
        };

        let mut out = [0_u8; 3];
        for (channel, slot) in out.iter_mut().enumerate() {
            let from = f64::from(self.dim[channel]);
            let to = f64::from(self.glow[channel]);
            *slot = (from + (to - from) * t).round() as u8;
        }
        out
    }
}

impl Default for Theme {
    fn default() -> Self {
        THEMES[0]
    }
}
