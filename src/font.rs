use crate::types::Pt;

pub const FONT_REGULAR: &str = "Helvetica";
pub const FONT_BOLD: &str = "Helvetica-Bold";
pub const FONT_OBLIQUE: &str = "Helvetica-Oblique";
pub const FONT_BOLD_OBLIQUE: &str = "Helvetica-BoldOblique";

/// Resolves the base-14 face for a style's weight/slant flags.
pub fn font_name(bold: bool, italic: bool) -> &'static str {
    match (bold, italic) {
        (false, false) => FONT_REGULAR,
        (true, false) => FONT_BOLD,
        (false, true) => FONT_OBLIQUE,
        (true, true) => FONT_BOLD_OBLIQUE,
    }
}

// Advance widths in 1/1000 em for chars 0x20..=0x7E, from the standard
// Helvetica AFM metrics. The oblique faces share the upright widths.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // !"#$%&'()*+,-./
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :;<=>?@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, // A-P
    778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // Q-Z
    278, 278, 278, 469, 556, 333, // [\]^_`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, // a-p
    556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // q-z
    334, 260, 334, 584, // {|}~
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667,
    778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611,
    611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

// Out-of-table chars fall back to 0.6 em, matching the engine-wide
// approximation used when no metrics are available.
const FALLBACK_ADVANCE: u16 = 600;

fn advance_for_char(font: &str, ch: char) -> u16 {
    let table = match font {
        FONT_BOLD | FONT_BOLD_OBLIQUE => &HELVETICA_BOLD_WIDTHS,
        _ => &HELVETICA_WIDTHS,
    };
    let code = ch as u32;
    if (0x20..=0x7E).contains(&code) {
        table[(code - 0x20) as usize]
    } else {
        FALLBACK_ADVANCE
    }
}

pub fn measure_text_width(font: &str, font_size: Pt, text: &str) -> Pt {
    let mut units: i64 = 0;
    for ch in text.chars() {
        units = units.saturating_add(advance_for_char(font, ch) as i64);
    }
    let milli = font_size.to_milli_i64().saturating_mul(units);
    let adj = if milli >= 0 { 500 } else { -500 };
    Pt::from_milli_i64((milli + adj) / 1000)
}

pub fn line_height(font_size: Pt) -> Pt {
    font_size.mul_ratio(6, 5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_selection_covers_all_flag_pairs() {
        assert_eq!(font_name(false, false), "Helvetica");
        assert_eq!(font_name(true, false), "Helvetica-Bold");
        assert_eq!(font_name(false, true), "Helvetica-Oblique");
        assert_eq!(font_name(true, true), "Helvetica-BoldOblique");
    }

    #[test]
    fn measurement_uses_per_glyph_advances() {
        let size = Pt::from_f32(10.0);
        // "il" is far narrower than "mw" at the same length.
        let narrow = measure_text_width(FONT_REGULAR, size, "il");
        let wide = measure_text_width(FONT_REGULAR, size, "mw");
        assert!(narrow < wide);
        // i=222 + l=222 at 10pt -> 4.44pt.
        assert_eq!(narrow.to_milli_i64(), 4440);
    }

    #[test]
    fn bold_face_measures_wider() {
        let size = Pt::from_f32(12.0);
        let regular = measure_text_width(FONT_REGULAR, size, "Dispatch");
        let bold = measure_text_width(FONT_BOLD, size, "Dispatch");
        assert!(bold > regular);
    }

    #[test]
    fn out_of_table_chars_use_the_fallback_advance() {
        let size = Pt::from_f32(10.0);
        assert_eq!(measure_text_width(FONT_REGULAR, size, "\u{00e9}").to_milli_i64(), 6000);
    }

    #[test]
    fn line_height_is_six_fifths_of_the_font_size() {
        assert_eq!(line_height(Pt::from_f32(10.0)).to_milli_i64(), 12000);
    }
}
