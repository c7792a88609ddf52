use crate::types::{Color, Pt, Size};

/// Drawing primitives recorded by the paginated renderer. Coordinates
/// are top-down page space (y measured from the top edge); the PDF
/// writer flips into PDF user space at emission.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(Pt),
    SetFontName(String),
    SetFontSize(Pt),
    MoveTo { x: Pt, y: Pt },
    LineTo { x: Pt, y: Pt },
    Stroke,
    DrawString { x: Pt, y: Pt, text: String },
    DrawRect { x: Pt, y: Pt, width: Pt, height: Pt },
    StrokeRect { x: Pt, y: Pt, width: Pt, height: Pt },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub commands: Vec<Command>,
}

impl Page {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

/// The drawing-primitive stream a paginated render produces; the
/// structural twin of the final PDF bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub page_size: Size,
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    fill_color: Color,
    stroke_color: Color,
    line_width: Pt,
    font_size: Pt,
    font_name: String,
}

impl GraphicsState {
    fn page_default() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: Pt::from_f32(1.0),
            font_size: Pt::from_f32(10.0),
            font_name: crate::font::FONT_REGULAR.to_string(),
        }
    }
}

/// Append-only command recorder. Setter calls that would not change the
/// current graphics state are dropped so identical content produces an
/// identical, minimal stream.
pub struct Canvas {
    page_size: Size,
    pages: Vec<Page>,
    current: Page,
    state: GraphicsState,
}

impl Canvas {
    pub fn new(page_size: Size) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
            current: Page::new(),
            state: GraphicsState::page_default(),
        }
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn set_fill_color(&mut self, color: Color) {
        if self.state.fill_color == color {
            return;
        }
        self.state.fill_color = color;
        self.current.commands.push(Command::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        if self.state.stroke_color == color {
            return;
        }
        self.state.stroke_color = color;
        self.current.commands.push(Command::SetStrokeColor(color));
    }

    pub fn set_line_width(&mut self, width: Pt) {
        let width = width.max(Pt::ZERO);
        if self.state.line_width == width {
            return;
        }
        self.state.line_width = width;
        self.current.commands.push(Command::SetLineWidth(width));
    }

    pub fn set_font_name(&mut self, name: &str) {
        if self.state.font_name == name {
            return;
        }
        self.state.font_name = name.to_string();
        self.current
            .commands
            .push(Command::SetFontName(self.state.font_name.clone()));
    }

    pub fn set_font_size(&mut self, size: Pt) {
        if self.state.font_size == size {
            return;
        }
        self.state.font_size = size;
        self.current.commands.push(Command::SetFontSize(size));
    }

    pub fn move_to(&mut self, x: Pt, y: Pt) {
        self.current.commands.push(Command::MoveTo { x, y });
    }

    pub fn line_to(&mut self, x: Pt, y: Pt) {
        self.current.commands.push(Command::LineTo { x, y });
    }

    pub fn stroke(&mut self) {
        self.current.commands.push(Command::Stroke);
    }

    pub fn draw_string(&mut self, x: Pt, y: Pt, text: impl Into<String>) {
        self.current.commands.push(Command::DrawString {
            x,
            y,
            text: text.into(),
        });
    }

    pub fn draw_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt) {
        self.current.commands.push(Command::DrawRect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn stroke_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt) {
        self.current.commands.push(Command::StrokeRect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn current_command_count(&self) -> usize {
        self.current.commands.len()
    }

    pub fn is_current_empty(&self) -> bool {
        self.current.commands.is_empty()
    }

    pub fn show_page(&mut self) {
        let current = std::mem::replace(&mut self.current, Page::new());
        self.pages.push(current);
        self.state = GraphicsState::page_default();
    }

    pub fn finish(mut self) -> Document {
        if !self.current.commands.is_empty() || self.pages.is_empty() {
            self.show_page();
        }
        Document {
            page_size: self.page_size,
            pages: self.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redundant_state_setters_are_dropped() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_fill_color(Color::rgb(0.2, 0.2, 0.2));
        canvas.set_fill_color(Color::rgb(0.2, 0.2, 0.2));
        canvas.set_font_size(Pt::from_f32(10.0)); // page default, dropped
        assert_eq!(canvas.current_command_count(), 1);
    }

    #[test]
    fn show_page_resets_graphics_state() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_font_name(crate::font::FONT_BOLD);
        canvas.show_page();
        canvas.set_font_name(crate::font::FONT_BOLD);
        let document = canvas.finish();
        assert_eq!(document.pages.len(), 2);
        // The second page must restate the font.
        assert_eq!(
            document.pages[1].commands,
            vec![Command::SetFontName("Helvetica-Bold".to_string())]
        );
    }

    #[test]
    fn finish_always_yields_at_least_one_page() {
        let document = Canvas::new(Size::a4()).finish();
        assert_eq!(document.pages.len(), 1);
        assert!(document.pages[0].commands.is_empty());
    }
}
