use crate::canvas::Canvas;
use crate::font;
use crate::types::{Color, Margins, Pt, Size};
use std::sync::Arc;

/// Fixed page geometry for one render: portrait A4 with uniform 40pt
/// margins unless the caller configures otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub size: Size,
    pub margins: Margins,
}

impl PageGeometry {
    pub fn a4() -> Self {
        Self {
            size: Size::a4(),
            margins: Margins::all(40.0),
        }
    }

    pub fn content_left(&self) -> Pt {
        self.margins.left
    }

    pub fn content_top(&self) -> Pt {
        self.margins.top
    }

    /// Top-down y of the bottom content edge; drawing past this point
    /// belongs on the next page.
    pub fn content_bottom(&self) -> Pt {
        self.size.height - self.margins.bottom
    }

    pub fn content_width(&self) -> Pt {
        (self.size.width - self.margins.left - self.margins.right).max(Pt::ZERO)
    }
}

/// Per-page facts handed to the page-lifecycle hook.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub page_number: usize,
    pub doc_label: String,
}

/// Runs at the start of every page, before any component content is
/// drawn on it. Headers and footers live here, outside the component
/// tree.
pub type OnPageCallback = Arc<dyn Fn(&mut Canvas, &PageContext, &PageGeometry) + Send + Sync>;

const CHROME_FONT_SIZE: f32 = 8.0;

/// The stock header/footer hook: document label top-left, `Page N`
/// bottom-right, both in the margin band outside the content area.
pub fn standard_chrome() -> OnPageCallback {
    Arc::new(|canvas, page, geometry| {
        let size = Pt::from_f32(CHROME_FONT_SIZE);
        canvas.set_fill_color(Color::rgb(0.45, 0.45, 0.45));
        canvas.set_font_name(font::FONT_REGULAR);
        canvas.set_font_size(size);
        if !page.doc_label.is_empty() {
            let y = (geometry.margins.top - size).mul_ratio(1, 2);
            canvas.draw_string(geometry.content_left(), y, page.doc_label.clone());
        }
        let footer = format!("Page {}", page.page_number);
        let width = font::measure_text_width(font::FONT_REGULAR, size, &footer);
        let x = geometry.size.width - geometry.margins.right - width;
        let y = geometry.content_bottom() + (geometry.margins.bottom - size).mul_ratio(1, 2);
        canvas.draw_string(x, y, footer);
        canvas.set_fill_color(Color::BLACK);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;

    #[test]
    fn geometry_derives_the_content_box() {
        let geometry = PageGeometry::a4();
        assert_eq!(geometry.content_left(), Pt::from_f32(40.0));
        assert_eq!(geometry.content_top(), Pt::from_f32(40.0));
        assert_eq!(geometry.content_bottom(), Pt::from_f32(801.89));
        assert_eq!(geometry.content_width(), Pt::from_f32(515.28));
    }

    #[test]
    fn standard_chrome_draws_label_and_page_number() {
        let geometry = PageGeometry::a4();
        let mut canvas = Canvas::new(geometry.size);
        let hook = standard_chrome();
        hook(
            &mut canvas,
            &PageContext {
                page_number: 3,
                doc_label: "Dispatch docket".to_string(),
            },
            &geometry,
        );
        let document = canvas.finish();
        let strings: Vec<&str> = document.pages[0]
            .commands
            .iter()
            .filter_map(|command| match command {
                Command::DrawString { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(strings, vec!["Dispatch docket", "Page 3"]);
    }
}
