use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::StampError;

/// An RGB color with channels in `[0, 1]`, the range PDF content
/// streams use for the `rg` operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Rgb = Rgb {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    /// Parse a `#RRGGBB` hex color (leading `#` optional).
    pub fn from_hex(s: &str) -> Option<Rgb> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map(|v| f32::from(v) / 255.0)
                .ok()
        };
        Some(Rgb {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    fn in_range(&self) -> bool {
        [self.r, self.g, self.b]
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let to_byte = |c: f32| (c * 255.0).round() as u8;
        write!(
            f,
            "#{:02X}{:02X}{:02X}",
            to_byte(self.r),
            to_byte(self.g),
            to_byte(self.b)
        )
    }
}

/// Styling applied uniformly to every overlay in a run.
///
/// Offsets are PDF user-space units with y increasing upward, so the
/// default `y_offset` of 8 places the stamp box above the printed
/// identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub font_size: f32,
    pub text_color: Rgb,
    pub bg_color: Rgb,
    pub bg_opacity: f32,
    pub x_offset: f32,
    pub y_offset: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        OverlayStyle {
            font_size: 8.0,
            text_color: Rgb::BLACK,
            bg_color: Rgb::WHITE,
            bg_opacity: 0.7,
            x_offset: 0.0,
            y_offset: 8.0,
        }
    }
}

impl OverlayStyle {
    /// Validate once up front so bad values fail the run before any
    /// page is touched.
    pub fn validate(&self) -> Result<(), StampError> {
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(StampError::StyleInvalid(format!(
                "font_size must be a positive number, got {}",
                self.font_size
            )));
        }
        if !self.text_color.in_range() {
            return Err(StampError::StyleInvalid(format!(
                "text_color channels must be within [0, 1], got {}",
                self.text_color
            )));
        }
        if !self.bg_color.in_range() {
            return Err(StampError::StyleInvalid(format!(
                "bg_color channels must be within [0, 1], got {}",
                self.bg_color
            )));
        }
        if !self.bg_opacity.is_finite() || !(0.0..=1.0).contains(&self.bg_opacity) {
            return Err(StampError::StyleInvalid(format!(
                "bg_opacity must be within [0, 1], got {}",
                self.bg_opacity
            )));
        }
        if !self.x_offset.is_finite() || !self.y_offset.is_finite() {
            return Err(StampError::StyleInvalid(
                "offsets must be finite numbers".into(),
            ));
        }
        Ok(())
    }
}

/// Mapping from integer identifier to the names printed for it.
///
/// Names keep spreadsheet row order; rows repeating an identifier
/// append to the existing list rather than overwriting it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifierMapping {
    entries: BTreeMap<i64, Vec<String>>,
}

impl IdentifierMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append names for an identifier. Empty name lists are ignored so
    /// the invariant "every key maps to at least one name" holds.
    pub fn append(&mut self, id: i64, names: Vec<String>) {
        if names.is_empty() {
            return;
        }
        self.entries.entry(id).or_default().extend(names);
    }

    pub fn names(&self, id: i64) -> Option<&[String]> {
        self.entries.get(&id).map(|n| n.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &[String])> {
        self.entries.iter().map(|(id, names)| (*id, names.as_slice()))
    }
}

/// Counters derived from a finished mapping, never maintained
/// incrementally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingStats {
    /// Distinct identifiers in the mapping.
    pub identifiers: usize,
    /// Total names across all identifiers.
    pub names: usize,
    /// Identifiers that carry more than one name.
    pub multi_name_identifiers: usize,
}

impl MappingStats {
    pub fn for_mapping(mapping: &IdentifierMapping) -> MappingStats {
        MappingStats {
            identifiers: mapping.len(),
            names: mapping.iter().map(|(_, names)| names.len()).sum(),
            multi_name_identifiers: mapping
                .iter()
                .filter(|(_, names)| names.len() > 1)
                .count(),
        }
    }
}

/// Row accounting from a roster load. Skipped rows are outcomes, not
/// errors.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RosterSummary {
    pub rows_read: usize,
    pub rows_skipped: usize,
}

/// Run-level counters surfaced to the operator.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RunSummary {
    pub pages: usize,
    pub spans_stamped: usize,
    pub mapping: MappingStats,
}

/// The modified PDF plus its run summary. The byte vector is the sole
/// durable artifact of a run.
#[derive(Debug)]
pub struct ProcessingResult {
    pub pdf: Vec<u8>,
    pub summary: RunSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_parses_ui_defaults() {
        assert_eq!(Rgb::from_hex("#000000"), Some(Rgb::BLACK));
        assert_eq!(Rgb::from_hex("#FFFFFF"), Some(Rgb::WHITE));
        let red = Rgb::from_hex("ff0000").unwrap();
        assert!((red.r - 1.0).abs() < f32::EPSILON);
        assert_eq!(red.g, 0.0);
        assert_eq!(red.b, 0.0);
    }

    #[test]
    fn from_hex_rejects_malformed() {
        assert_eq!(Rgb::from_hex("#fff"), None);
        assert_eq!(Rgb::from_hex("#GGGGGG"), None);
        assert_eq!(Rgb::from_hex(""), None);
    }

    #[test]
    fn default_style_is_valid() {
        assert!(OverlayStyle::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_opacity() {
        let style = OverlayStyle {
            bg_opacity: 1.5,
            ..OverlayStyle::default()
        };
        assert!(style.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_font() {
        let style = OverlayStyle {
            font_size: 0.0,
            ..OverlayStyle::default()
        };
        assert!(style.validate().is_err());
    }

    #[test]
    fn mapping_appends_on_repeat() {
        let mut mapping = IdentifierMapping::new();
        mapping.append(12, vec!["Alice".into()]);
        mapping.append(12, vec!["Bob".into()]);
        assert_eq!(mapping.names(12), Some(&["Alice".into(), "Bob".into()][..]));
    }

    #[test]
    fn mapping_ignores_empty_name_list() {
        let mut mapping = IdentifierMapping::new();
        mapping.append(7, vec![]);
        assert!(mapping.is_empty());
    }

    #[test]
    fn stats_derived_from_mapping() {
        let mut mapping = IdentifierMapping::new();
        mapping.append(1, vec!["Smith".into(), "John".into()]);
        mapping.append(2, vec!["Lee".into()]);
        let stats = MappingStats::for_mapping(&mapping);
        assert_eq!(stats.identifiers, 2);
        assert_eq!(stats.names, 3);
        assert_eq!(stats.multi_name_identifiers, 1);
    }
}
