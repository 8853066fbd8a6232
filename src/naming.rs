//! File names for exports and archive entries.
//!
//! Every name produced here is deterministic: the same artifact, format and
//! position always map to the same name, so repeated exports overwrite rather
//! than accumulate.
//!
//! ## Archive entries
//!
//! `design_{index}_{slug}_{date}.png`, with a 1-based index that is unique
//! inside one archive:
//! - free mode, topic `"Big Friendly Dragon"` → `design_1_Big_Friendly_Dragon_2026-03-14.png`
//! - mandala mode → `design_2_mandala_2026-03-14.png`

use crate::geometry::PrintLayout;
use crate::types::{GenerationConfig, Mode};
use chrono::{DateTime, Utc};

/// Slug length cap, in characters.
const SLUG_MAX_CHARS: usize = 20;

pub const PNG_FILENAME: &str = "coloring-page.png";
pub const SVG_FILENAME: &str = "coloring-page.svg";
pub const ZIP_FILENAME: &str = "coloring-pages.zip";

fn is_slug_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// `mandala`, or the first 20 characters of the topic with everything that
/// is not an ASCII letter, digit or Hangul syllable replaced by `_`.
pub fn topic_slug(config: &GenerationConfig) -> String {
    match config.mode {
        Mode::Mandala => "mandala".to_string(),
        Mode::Free => config
            .topic
            .chars()
            .take(SLUG_MAX_CHARS)
            .map(|c| if is_slug_char(c) { c } else { '_' })
            .collect(),
    }
}

/// Archive entry name for the item at `index` (0-based) of an export.
pub fn zip_entry_name(index: usize, config: &GenerationConfig, created: DateTime<Utc>) -> String {
    format!(
        "design_{}_{}_{}.png",
        index + 1,
        topic_slug(config),
        created.format("%Y-%m-%d")
    )
}

/// `coloring-page-2x3-A4.pdf`
pub fn pdf_filename(layout: &PrintLayout) -> String {
    format!("coloring-page-{}-{}.pdf", layout.grid, layout.paper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Grid, Orientation, PaperSize};
    use crate::types::MandalaTheme;
    use chrono::TimeZone;

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 23, 59, 0).unwrap()
    }

    #[test]
    fn mandala_slug_ignores_topic() {
        let config = GenerationConfig {
            topic: "whatever".into(),
            ..GenerationConfig::mandala(MandalaTheme::Star)
        };
        assert_eq!(topic_slug(&config), "mandala");
    }

    #[test]
    fn free_slug_replaces_punctuation_and_spaces() {
        let config = GenerationConfig::free("Big Friendly Dragon!");
        assert_eq!(topic_slug(&config), "Big_Friendly_Dragon_");
    }

    #[test]
    fn free_slug_truncates_to_twenty_chars() {
        let config = GenerationConfig::free("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(topic_slug(&config), "abcdefghijklmnopqrst");
    }

    #[test]
    fn hangul_survives_other_scripts_do_not() {
        let config = GenerationConfig::free("공룡 dinos café");
        assert_eq!(topic_slug(&config), "공룡_dinos_caf_");
    }

    #[test]
    fn entry_name_uses_one_based_index_and_date() {
        let config = GenerationConfig::free("cats");
        assert_eq!(zip_entry_name(0, &config, date()), "design_1_cats_2026-03-14.png");
        assert_eq!(zip_entry_name(4, &config, date()), "design_5_cats_2026-03-14.png");
    }

    #[test]
    fn same_topic_and_day_still_unique_by_index() {
        let config = GenerationConfig::free("cats");
        let names: std::collections::HashSet<String> =
            (0..3).map(|i| zip_entry_name(i, &config, date())).collect();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn pdf_name_names_grid_and_paper() {
        let layout = PrintLayout::new(Grid::new(2, 3).unwrap(), PaperSize::B4, Orientation::Vertical);
        assert_eq!(pdf_filename(&layout), "coloring-page-2x3-B4.pdf");
    }
}
