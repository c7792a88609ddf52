use crate::canvas::{Command, Document};
use crate::debug::DebugLogger;
use crate::font;
use crate::types::Pt;
use std::collections::{BTreeMap, BTreeSet};
use std::io;

/// Serializes a drawing-primitive document into PDF 1.4 bytes. Fonts
/// are the base-14 Helvetica faces with WinAnsi encoding; nothing is
/// embedded, so the writer is a single forward pass over the pages.
pub fn document_to_pdf(document: &Document) -> io::Result<Vec<u8>> {
    document_to_pdf_with_debug(document, None)
}

pub(crate) fn document_to_pdf_with_debug(
    document: &Document,
    debug: Option<&DebugLogger>,
) -> io::Result<Vec<u8>> {
    let page_height = document.page_size.height;
    let used_fonts = collect_used_font_names(document);

    // Object ids: 1 catalog, 2 pages, then one object per font, then
    // (content, page) pairs in page order.
    let font_count = used_fonts.len();
    let mut font_ids: BTreeMap<String, (String, usize)> = BTreeMap::new();
    for (index, name) in used_fonts.iter().enumerate() {
        font_ids.insert(name.clone(), (format!("F{}", index + 1), 3 + index));
    }

    let first_page_object = 3 + font_count;
    let kids: Vec<String> = (0..document.pages.len())
        .map(|index| format!("{} 0 R", first_page_object + index * 2 + 1))
        .collect();

    let mut font_resources = String::new();
    for (resource, id) in font_ids.values() {
        font_resources.push_str(&format!("/{} {} 0 R ", resource, id));
    }
    let resources = format!("<< /Font << {}>> >>", font_resources);

    let mut objects: Vec<String> = Vec::with_capacity(2 + font_count + document.pages.len() * 2);
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Count {} /Kids [{}] >>",
        document.pages.len(),
        kids.join(" ")
    ));
    for name in &used_fonts {
        objects.push(format!(
            "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
            name
        ));
    }
    for (index, page) in document.pages.iter().enumerate() {
        let content = render_commands(&page.commands, page_height, &font_ids, debug);
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ));
        let content_id = first_page_object + index * 2;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources {} /Contents {} 0 R >>",
            fmt_pt(document.page_size.width),
            fmt_pt(page_height),
            resources,
            content_id
        ));
    }

    let mut out: Vec<u8> = Vec::with_capacity(4096);
    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
    let mut offsets: Vec<usize> = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", index + 1, body).as_bytes());
    }

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF",
            objects.len() + 1,
            xref_start
        )
        .as_bytes(),
    );

    if let Some(logger) = debug {
        logger.flush();
    }
    Ok(out)
}

fn collect_used_font_names(document: &Document) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for page in &document.pages {
        let mut current = font::FONT_REGULAR.to_string();
        for command in &page.commands {
            match command {
                Command::SetFontName(name) => current = name.clone(),
                Command::DrawString { .. } => {
                    names.insert(current.clone());
                }
                _ => {}
            }
        }
    }
    names
}

fn render_commands(
    commands: &[Command],
    page_height: Pt,
    font_ids: &BTreeMap<String, (String, usize)>,
    debug: Option<&DebugLogger>,
) -> String {
    let mut out = String::new();
    let mut current_font = font::FONT_REGULAR.to_string();
    let mut current_size = Pt::from_f32(10.0);
    for command in commands {
        match command {
            Command::SetFillColor(color) => {
                out.push_str(&format!(
                    "{} {} {} rg\n",
                    fmt_unit(color.r),
                    fmt_unit(color.g),
                    fmt_unit(color.b)
                ));
            }
            Command::SetStrokeColor(color) => {
                out.push_str(&format!(
                    "{} {} {} RG\n",
                    fmt_unit(color.r),
                    fmt_unit(color.g),
                    fmt_unit(color.b)
                ));
            }
            Command::SetLineWidth(width) => {
                out.push_str(&format!("{} w\n", fmt_pt(*width)));
            }
            Command::SetFontName(name) => current_font = name.clone(),
            Command::SetFontSize(size) => current_size = *size,
            Command::MoveTo { x, y } => {
                out.push_str(&format!("{} {} m\n", fmt_pt(*x), fmt_pt(page_height - *y)));
            }
            Command::LineTo { x, y } => {
                out.push_str(&format!("{} {} l\n", fmt_pt(*x), fmt_pt(page_height - *y)));
            }
            Command::Stroke => out.push_str("S\n"),
            Command::DrawString { x, y, text } => {
                let Some((resource, _)) = font_ids.get(&current_font) else {
                    continue;
                };
                let encoded = encode_winansi(text);
                if encoded.replaced > 0 {
                    if let Some(logger) = debug {
                        logger.log_json(&format!(
                            "{{\"type\":\"pdf.winansi.lossy\",\"font\":\"{}\",\"replaced\":{},\"sample\":\"{}\"}}",
                            crate::debug::json_escape(&current_font),
                            encoded.replaced,
                            crate::debug::json_escape(&truncate_preview(text, 80))
                        ));
                        logger.increment("pdf.winansi.lossy", encoded.replaced as u64);
                    }
                }
                out.push_str("BT\n");
                out.push_str(&format!("/{} {} Tf\n", resource, fmt_pt(current_size)));
                out.push_str(&format!(
                    "{} {} Td\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - current_size)
                ));
                out.push_str(&format!("({}) Tj\n", encoded.text));
                out.push_str("ET\n");
            }
            Command::DrawRect {
                x,
                y,
                width,
                height,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} re\nf\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - *height),
                    fmt_pt(*width),
                    fmt_pt(*height)
                ));
            }
            Command::StrokeRect {
                x,
                y,
                width,
                height,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} re\nS\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - *height),
                    fmt_pt(*width),
                    fmt_pt(*height)
                ));
            }
        }
    }
    out
}

struct EncodedText {
    text: String,
    replaced: usize,
}

/// Escapes a string into a WinAnsi PDF literal. Bytes above 0x7E are
/// written as octal escapes so the content stream stays ASCII-clean;
/// unmappable chars become `?` and are counted for the debug log.
fn encode_winansi(text: &str) -> EncodedText {
    let mut out = String::with_capacity(text.len());
    let mut replaced = 0usize;
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\u{20}'..='\u{7E}' => out.push(ch),
            _ => match winansi_byte(ch) {
                Some(byte) => out.push_str(&format!("\\{:03o}", byte)),
                None => {
                    out.push('?');
                    replaced += 1;
                }
            },
        }
    }
    EncodedText {
        text: out,
        replaced,
    }
}

fn winansi_byte(ch: char) -> Option<u8> {
    let code = ch as u32;
    if (0xA0..=0xFF).contains(&code) {
        return Some(code as u8);
    }
    // The 0x80..0x9F window where WinAnsi departs from Latin-1.
    let byte = match ch {
        '\u{20AC}' => 0x80, // euro
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85, // ellipsis
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95, // bullet
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

fn truncate_preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Milli-point precision decimal without trailing zeros.
fn fmt_pt(value: Pt) -> String {
    let milli = value.to_milli_i64();
    let sign = if milli < 0 { "-" } else { "" };
    let milli = milli.abs();
    let whole = milli / 1000;
    let frac = milli % 1000;
    if frac == 0 {
        format!("{}{}", sign, whole)
    } else {
        let mut frac = format!("{:03}", frac);
        while frac.ends_with('0') {
            frac.pop();
        }
        format!("{}{}.{}", sign, whole, frac)
    }
}

fn fmt_unit(value: f32) -> String {
    let clamped = value.clamp(0.0, 1.0);
    let milli = (clamped * 1000.0).round() as i64;
    fmt_pt(Pt::from_milli_i64(milli))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::types::{Color, Size};

    fn small_page() -> Size {
        Size {
            width: Pt::from_f32(200.0),
            height: Pt::from_f32(800.0),
        }
    }

    #[test]
    fn writes_a_well_formed_single_page_pdf() {
        let mut canvas = Canvas::new(small_page());
        canvas.set_font_size(Pt::from_f32(12.0));
        canvas.draw_string(Pt::from_f32(100.0), Pt::from_f32(100.0), "Docket");
        let bytes = document_to_pdf(&canvas.finish()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.ends_with("%%EOF"));
        assert!(text.contains("/Type /Catalog"));
        assert!(text.contains("/Count 1"));
        assert!(text.contains("/BaseFont /Helvetica /Encoding /WinAnsiEncoding"));
        assert!(text.contains("(Docket) Tj"));
    }

    #[test]
    fn flips_top_down_coordinates_into_pdf_space() {
        let mut canvas = Canvas::new(small_page());
        canvas.set_font_size(Pt::from_f32(10.0));
        canvas.draw_string(Pt::from_f32(100.0), Pt::from_f32(100.0), "x");
        canvas.draw_rect(
            Pt::from_f32(10.0),
            Pt::from_f32(20.0),
            Pt::from_f32(30.0),
            Pt::from_f32(40.0),
        );
        let bytes = document_to_pdf(&canvas.finish()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        // Text baseline: 800 - 100 - 10.
        assert!(text.contains("100 690 Td"));
        // Rect origin: 800 - 20 - 40.
        assert!(text.contains("10 740 30 40 re"));
    }

    #[test]
    fn startxref_points_at_the_xref_table() {
        let mut canvas = Canvas::new(small_page());
        canvas.draw_string(Pt::ZERO, Pt::ZERO, "a");
        let bytes = document_to_pdf(&canvas.finish()).unwrap();
        let text = String::from_utf8_lossy(&bytes).to_string();
        let tail = text.rsplit("startxref\n").next().unwrap();
        let offset: usize = tail.lines().next().unwrap().trim().parse().unwrap();
        assert_eq!(&text.as_bytes()[offset..offset + 4], b"xref");
    }

    #[test]
    fn each_used_face_gets_one_font_object() {
        let mut canvas = Canvas::new(small_page());
        canvas.draw_string(Pt::ZERO, Pt::ZERO, "regular");
        canvas.set_font_name(font::FONT_BOLD);
        canvas.draw_string(Pt::ZERO, Pt::from_f32(20.0), "bold");
        let bytes = document_to_pdf(&canvas.finish()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/BaseFont /Helvetica /Encoding"));
        assert!(text.contains("/BaseFont /Helvetica-Bold /Encoding"));
    }

    #[test]
    fn winansi_escapes_delimiters_and_maps_specials() {
        let encoded = encode_winansi("(qty) 3 \\ \u{2022} \u{2026} caf\u{e9}");
        assert_eq!(encoded.replaced, 0);
        assert_eq!(encoded.text, "\\(qty\\) 3 \\\\ \\225 \\205 caf\\351");
        let lossy = encode_winansi("price \u{2192} total");
        assert_eq!(lossy.replaced, 1);
        assert_eq!(lossy.text, "price ? total");
    }

    #[test]
    fn fmt_pt_trims_trailing_zeros() {
        assert_eq!(fmt_pt(Pt::from_f32(595.28)), "595.28");
        assert_eq!(fmt_pt(Pt::from_f32(40.0)), "40");
        assert_eq!(fmt_pt(Pt::from_f32(-1.5)), "-1.5");
        assert_eq!(fmt_pt(Pt::from_f32(0.125)), "0.125");
    }

    #[test]
    fn identical_documents_serialize_to_identical_bytes() {
        let build = || {
            let mut canvas = Canvas::new(small_page());
            canvas.set_fill_color(Color::rgb(0.2, 0.4, 0.6));
            canvas.draw_string(Pt::from_f32(10.0), Pt::from_f32(10.0), "same");
            canvas.finish()
        };
        let first = document_to_pdf(&build()).unwrap();
        let second = document_to_pdf(&build()).unwrap();
        assert_eq!(first, second);
    }
}
