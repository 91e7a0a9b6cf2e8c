//! Fonts for PDF output: an embedded TrueType face, or built-in Helvetica.

use std::path::Path;

use ttf_parser::Face;

use crate::error::ArtifactError;

/// Helvetica advance widths (1/1000 em) for ASCII 0x20..=0x7E, WinAnsi encoding.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // sp .. /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0 .. 9
    278, 278, 584, 584, 584, 556, 1015, // : .. @
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A .. M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N .. Z
    278, 278, 278, 469, 556, 333, // [ .. `
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a .. m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n .. z
    334, 260, 334, 584, // { .. ~
];

const HELVETICA_DEFAULT_WIDTH: u16 = 556;

/// A TrueType font loaded from disk for embedding.
#[derive(Debug, Clone)]
pub struct TrueTypeFont {
    pub(crate) name: String,
    pub(crate) data: Vec<u8>,
    pub(crate) units_per_em: u16,
    pub(crate) ascender: i16,
    pub(crate) descender: i16,
    pub(crate) bbox: [i16; 4],
}

impl TrueTypeFont {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let data = std::fs::read(path).map_err(|e| ArtifactError::Font {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        Self::from_bytes(stem, data).map_err(|reason| ArtifactError::Font {
            path: path.display().to_string(),
            reason,
        })
    }

    fn from_bytes(stem: &str, data: Vec<u8>) -> Result<Self, String> {
        let (units_per_em, ascender, descender, bbox) = {
            let face = Face::parse(&data, 0).map_err(|e| e.to_string())?;
            if face.glyph_index('가').is_none() {
                tracing::warn!(font = stem, "Font has no Hangul glyphs");
            }
            let rect = face.global_bounding_box();
            (
                face.units_per_em(),
                face.ascender(),
                face.descender(),
                [rect.x_min, rect.y_min, rect.x_max, rect.y_max],
            )
        };

        let name: String = stem.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        let name = if name.is_empty() {
            "EmbeddedFont".to_string()
        } else {
            name
        };

        Ok(Self {
            name,
            data,
            units_per_em,
            ascender,
            descender,
            bbox,
        })
    }

    /// Scale font units to 1/1000 em.
    pub(crate) fn to_thousandths(&self, units: i32) -> i64 {
        i64::from(units) * 1000 / i64::from(self.units_per_em.max(1))
    }
}

/// Font selected for a PDF render.
#[derive(Debug, Clone)]
pub enum PdfFont {
    Helvetica,
    TrueType(TrueTypeFont),
}

impl PdfFont {
    /// Load `path` when given, falling back to Helvetica on any failure.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::Helvetica;
        };
        match TrueTypeFont::load(path) {
            Ok(font) => {
                tracing::info!(font = %path.display(), "Registered PDF font");
                Self::TrueType(font)
            }
            Err(e) => {
                tracing::warn!(error = %e, "PDF font unavailable, using Helvetica");
                Self::Helvetica
            }
        }
    }

    /// Parse the face once for a render pass.
    pub(crate) fn metrics(&self) -> Result<Metrics<'_>, ArtifactError> {
        match self {
            Self::Helvetica => Ok(Metrics::Helvetica),
            Self::TrueType(font) => {
                let face = Face::parse(&font.data, 0).map_err(|e| ArtifactError::Font {
                    path: font.name.clone(),
                    reason: e.to_string(),
                })?;
                Ok(Metrics::TrueType { font, face })
            }
        }
    }
}

/// Width and glyph lookups for one render pass.
pub(crate) enum Metrics<'a> {
    Helvetica,
    TrueType {
        font: &'a TrueTypeFont,
        face: Face<'a>,
    },
}

impl Metrics<'_> {
    /// Advance width of `ch` in 1/1000 em.
    pub fn char_width(&self, ch: char) -> u16 {
        match self {
            Self::Helvetica => helvetica_width(ch),
            Self::TrueType { font, face } => {
                let advance = face
                    .glyph_index(ch)
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .unwrap_or(0);
                font.to_thousandths(i32::from(advance)).clamp(0, i64::from(u16::MAX)) as u16
            }
        }
    }

    /// Width of `text` in points at `font_size`.
    pub fn string_width(&self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.char_width(c))).sum();
        units as f32 * font_size / 1000.0
    }

    /// Glyph id used for `ch` in an Identity-H encoded string.
    pub fn glyph_id(&self, ch: char) -> u16 {
        match self {
            Self::Helvetica => 0,
            Self::TrueType { face, .. } => face.glyph_index(ch).map(|g| g.0).unwrap_or(0),
        }
    }
}

fn helvetica_width(ch: char) -> u16 {
    match ch as u32 {
        code @ 0x20..=0x7E => HELVETICA_WIDTHS[(code - 0x20) as usize],
        _ => HELVETICA_DEFAULT_WIDTH,
    }
}

/// WinAnsi bytes for Helvetica: Latin-1 passes through, anything else becomes `?`.
pub(crate) fn winansi_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => b'?',
        })
        .collect()
}
