use crate::binding;
use crate::canvas::Document;
use crate::cursor::PageCursor;
use crate::debug::DebugLogger;
use crate::font;
use crate::format;
use crate::layout::{Align, Column, Component, ComponentBody, ComponentStyle, Layout};
use crate::metrics::PageMetrics;
use crate::page::{OnPageCallback, PageGeometry};
use crate::types::{Color, Pt};
use crate::visibility;
use serde_json::Value;

const HEADING_SIZES: [f32; 4] = [20.0, 16.0, 13.0, 11.0];
const TEXT_FONT_SIZE: f32 = 10.0;
const TABLE_FONT_SIZE: f32 = 9.0;
const TABLE_ROW_HEIGHT: f32 = 18.0;
const TABLE_HEADER_HEIGHT: f32 = 20.0;
const CELL_PADDING: f32 = 4.0;
const LIST_INDENT: f32 = 14.0;
const CHIP_HEIGHT: f32 = 14.0;
const CHIP_FONT_SIZE: f32 = 8.0;
const CHIP_PAD_X: f32 = 6.0;
const CHIP_GAP: f32 = 6.0;
const CHIP_ROW_GAP: f32 = 4.0;
const DIVIDER_HEIGHT: f32 = 9.0;
const SPACER_DEFAULT_HEIGHT: f32 = 12.0;
const BOX_PADDING: f32 = 8.0;

/// Walks a validated layout into a page-based drawing command stream.
/// Pure over its inputs: the tree and context are read-only, and every
/// render owns a fresh cursor.
pub(crate) fn render(
    layout: &Layout,
    context: &Value,
    geometry: PageGeometry,
    doc_label: &str,
    on_page: Option<OnPageCallback>,
    debug: Option<DebugLogger>,
) -> (Document, Vec<PageMetrics>) {
    let mut painter = Painter {
        context,
        cursor: PageCursor::new(geometry, doc_label.to_string(), on_page, debug),
    };
    let x = geometry.content_left();
    let width = geometry.content_width();
    painter.draw_components(&layout.components, x, width);
    painter.cursor.finish()
}

struct Painter<'a> {
    context: &'a Value,
    cursor: PageCursor,
}

impl Painter<'_> {
    fn draw_components(&mut self, components: &[Component], x: Pt, width: Pt) {
        for component in components {
            if !visibility::is_visible(component, self.context) {
                continue;
            }
            self.cursor.note_component();
            self.draw_component(component, x, width);
        }
    }

    fn draw_component(&mut self, component: &Component, x: Pt, width: Pt) {
        let style = &component.style;
        match &component.body {
            ComponentBody::Heading {
                text,
                binding,
                level,
            } => {
                let level = (*level).clamp(1, 4) as usize;
                let content = binding::component_text(text, binding, self.context);
                self.draw_text_block(
                    &content,
                    x,
                    width,
                    style,
                    TextDefaults {
                        font_size: HEADING_SIZES[level - 1],
                        bold: true,
                        margin_bottom: 8.0,
                        component: "heading",
                    },
                );
            }
            ComponentBody::Text { text, binding } => {
                let content = binding::component_text(text, binding, self.context);
                self.draw_text_block(
                    &content,
                    x,
                    width,
                    style,
                    TextDefaults {
                        font_size: TEXT_FONT_SIZE,
                        bold: false,
                        margin_bottom: 6.0,
                        component: "text",
                    },
                );
            }
            ComponentBody::List { items } => self.draw_list(items, x, width, style),
            ComponentBody::Chips { chips } => self.draw_chips(chips, x, width, style),
            ComponentBody::Divider => self.draw_divider(x, width, style),
            ComponentBody::Spacer { height } => {
                let height = Pt::from_f32(height.unwrap_or(SPACER_DEFAULT_HEIGHT).max(0.0));
                self.cursor.ensure_space(height, "spacer");
                self.cursor.advance(height);
                self.advance_margin(style, 0.0);
            }
            ComponentBody::Image { height, .. } => {
                // No raster drawing in this backend; declared space is
                // still reserved so surrounding layout stays stable.
                if let Some(height) = height {
                    let height = Pt::from_f32(height.max(0.0));
                    self.cursor.ensure_space(height, "image");
                    self.cursor.advance(height);
                    self.advance_margin(style, 8.0);
                }
            }
            ComponentBody::Box { children } => self.draw_box(children, x, width, style),
            ComponentBody::Table {
                rows_binding,
                columns,
                show_header,
            } => self.draw_table(rows_binding, columns, *show_header, x, width, style),
            ComponentBody::Unknown => {}
        }
    }

    fn draw_text_block(
        &mut self,
        text: &str,
        x: Pt,
        width: Pt,
        style: &ComponentStyle,
        defaults: TextDefaults,
    ) {
        if text.trim().is_empty() {
            return;
        }
        let font_size = Pt::from_f32(style.font_size.unwrap_or(defaults.font_size).max(1.0));
        let face = font::font_name(
            style.bold.unwrap_or(defaults.bold),
            style.italic.unwrap_or(false),
        );
        let color = parse_color(&style.color, Color::BLACK);
        let line_height = font::line_height(font_size);
        let align = style.align.unwrap_or(Align::Left);
        for line in wrap_text(face, font_size, text, width) {
            self.cursor.ensure_space(line_height, defaults.component);
            let line_width = font::measure_text_width(face, font_size, &line);
            let offset = align_offset(align, width, line_width);
            let y = self.cursor.y();
            let canvas = self.cursor.canvas_mut();
            canvas.set_fill_color(color);
            canvas.set_font_name(face);
            canvas.set_font_size(font_size);
            canvas.draw_string(x + offset, y, line);
            self.cursor.advance(line_height);
        }
        self.advance_margin(style, defaults.margin_bottom);
    }

    fn draw_list(
        &mut self,
        items: &[crate::layout::ListItem],
        x: Pt,
        width: Pt,
        style: &ComponentStyle,
    ) {
        let font_size = Pt::from_f32(style.font_size.unwrap_or(TEXT_FONT_SIZE).max(1.0));
        let face = font::font_name(style.bold.unwrap_or(false), style.italic.unwrap_or(false));
        let color = parse_color(&style.color, Color::BLACK);
        let line_height = font::line_height(font_size);
        let indent = Pt::from_f32(LIST_INDENT);
        let mut drew_any = false;
        for item in items {
            let text = binding::list_item_text(item, self.context);
            if text.trim().is_empty() {
                continue;
            }
            drew_any = true;
            let inner_width = (width - indent).max(Pt::from_f32(1.0));
            for (index, line) in wrap_text(face, font_size, &text, inner_width)
                .into_iter()
                .enumerate()
            {
                self.cursor.ensure_space(line_height, "list");
                let y = self.cursor.y();
                let canvas = self.cursor.canvas_mut();
                canvas.set_fill_color(color);
                canvas.set_font_name(face);
                canvas.set_font_size(font_size);
                if index == 0 {
                    canvas.draw_string(x, y, "\u{2022}");
                }
                canvas.draw_string(x + indent, y, line);
                self.cursor.advance(line_height);
            }
        }
        if drew_any {
            self.advance_margin(style, 6.0);
        }
    }

    fn draw_chips(
        &mut self,
        chips: &[crate::layout::Chip],
        x: Pt,
        width: Pt,
        style: &ComponentStyle,
    ) {
        let font_size = Pt::from_f32(CHIP_FONT_SIZE);
        let chip_height = Pt::from_f32(CHIP_HEIGHT);
        let pad_x = Pt::from_f32(CHIP_PAD_X);
        let gap = Pt::from_f32(CHIP_GAP);

        // Pre-flow into rows so each row is one ensure_space unit.
        let mut rows: Vec<Vec<(&crate::layout::Chip, Pt)>> = Vec::new();
        let mut row: Vec<(&crate::layout::Chip, Pt)> = Vec::new();
        let mut row_width = Pt::ZERO;
        for chip in chips {
            if chip.label.trim().is_empty() {
                continue;
            }
            let chip_width =
                font::measure_text_width(font::FONT_REGULAR, font_size, &chip.label)
                    + pad_x * 2;
            let needed = if row.is_empty() {
                chip_width
            } else {
                row_width + gap + chip_width
            };
            if !row.is_empty() && needed > width {
                rows.push(std::mem::take(&mut row));
            }
            row_width = if row.is_empty() {
                chip_width
            } else {
                row_width + gap + chip_width
            };
            row.push((chip, chip_width));
        }
        if !row.is_empty() {
            rows.push(row);
        }
        if rows.is_empty() {
            return;
        }

        let row_advance = chip_height + Pt::from_f32(CHIP_ROW_GAP);
        for row in rows {
            self.cursor.ensure_space(chip_height, "chips");
            let y = self.cursor.y();
            let mut chip_x = x;
            for (chip, chip_width) in row {
                let fill = parse_color(&chip.color, Color::rgb(0.91, 0.93, 0.9));
                let canvas = self.cursor.canvas_mut();
                canvas.set_fill_color(fill);
                canvas.draw_rect(chip_x, y, chip_width, chip_height);
                canvas.set_fill_color(Color::rgb(0.15, 0.15, 0.15));
                canvas.set_font_name(font::FONT_REGULAR);
                canvas.set_font_size(font_size);
                let text_y = y + (chip_height - font_size).mul_ratio(1, 2);
                canvas.draw_string(chip_x + pad_x, text_y, chip.label.clone());
                chip_x += chip_width + gap;
            }
            self.cursor.advance(row_advance);
        }
        self.advance_margin(style, 6.0);
    }

    fn draw_divider(&mut self, x: Pt, width: Pt, style: &ComponentStyle) {
        let height = Pt::from_f32(DIVIDER_HEIGHT);
        self.cursor.ensure_space(height, "divider");
        let stroke = parse_color(
            &style.border_color.clone().or_else(|| style.color.clone()),
            Color::rgb(0.62, 0.62, 0.62),
        );
        let line_width = Pt::from_f32(style.border_width.unwrap_or(0.75).max(0.1));
        let y = self.cursor.y() + height.mul_ratio(1, 2);
        let canvas = self.cursor.canvas_mut();
        canvas.set_stroke_color(stroke);
        canvas.set_line_width(line_width);
        canvas.move_to(x, y);
        canvas.line_to(x + width, y);
        canvas.stroke();
        self.cursor.advance(height);
        self.advance_margin(style, 6.0);
    }

    /// Children draw first, exactly as they would standalone; the
    /// border is backfilled afterwards from the vertical extent they
    /// actually consumed. There is no pre-measurement pass, so a box
    /// whose content crosses a page break gets its border only around
    /// the portion on the page where drawing completed.
    fn draw_box(&mut self, children: &[Component], x: Pt, width: Pt, style: &ComponentStyle) {
        let pad = Pt::from_f32(style.padding.unwrap_or(BOX_PADDING).max(0.0));
        let before_y = self.cursor.y();
        let before_page = self.cursor.page_number();

        self.cursor.advance(pad);
        let inner_x = x + pad;
        let inner_width = (width - pad * 2).max(Pt::from_f32(1.0));
        self.draw_components(children, inner_x, inner_width);
        self.cursor.advance(pad);

        let top = if self.cursor.page_number() == before_page {
            before_y
        } else {
            self.cursor.geometry().content_top()
        };
        let height_used = self.cursor.y() - top;
        if height_used > Pt::ZERO {
            let border = parse_color(&style.border_color, Color::rgb(0.78, 0.78, 0.78));
            let border_width = Pt::from_f32(style.border_width.unwrap_or(1.0).max(0.1));
            let canvas = self.cursor.canvas_mut();
            canvas.set_stroke_color(border);
            canvas.set_line_width(border_width);
            canvas.stroke_rect(x, top, width, height_used);
        }
        self.advance_margin(style, 10.0);
    }

    fn draw_table(
        &mut self,
        rows_binding: &str,
        columns: &[Column],
        show_header: bool,
        x: Pt,
        width: Pt,
        style: &ComponentStyle,
    ) {
        if columns.is_empty() {
            return;
        }
        // A binding that resolves to anything but an array means zero rows.
        let rows: &[Value] = binding::resolve(self.context, rows_binding)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let font_size = Pt::from_f32(style.font_size.unwrap_or(TABLE_FONT_SIZE).max(1.0));
        let color = parse_color(&style.color, Color::BLACK);
        let cell_pad = Pt::from_f32(CELL_PADDING);
        // Equal-width slots across the content width; per-column width
        // hints apply to the markup backend only.
        let slot = width / columns.len() as i32;

        if show_header {
            let header_height = Pt::from_f32(TABLE_HEADER_HEIGHT);
            self.cursor.ensure_space(header_height, "table");
            let y = self.cursor.y();
            let text_y = y + (header_height - font_size).mul_ratio(1, 2);
            for (index, column) in columns.iter().enumerate() {
                let cell_x = x + slot * index as i32;
                let label = fit_text(
                    font::FONT_BOLD,
                    font_size,
                    column.header_label(),
                    slot - cell_pad * 2,
                );
                let label_width = font::measure_text_width(font::FONT_BOLD, font_size, &label);
                let offset = align_offset(
                    column.align.unwrap_or(Align::Left),
                    slot - cell_pad * 2,
                    label_width,
                );
                let canvas = self.cursor.canvas_mut();
                canvas.set_fill_color(color);
                canvas.set_font_name(font::FONT_BOLD);
                canvas.set_font_size(font_size);
                canvas.draw_string(cell_x + cell_pad + offset, text_y, label);
            }
            let rule_y = y + header_height - Pt::from_f32(2.0);
            let canvas = self.cursor.canvas_mut();
            canvas.set_stroke_color(Color::rgb(0.62, 0.62, 0.62));
            canvas.set_line_width(Pt::from_f32(0.75));
            canvas.move_to(x, rule_y);
            canvas.line_to(x + width, rule_y);
            canvas.stroke();
            self.cursor.advance(header_height);
        }

        let row_height = Pt::from_f32(TABLE_ROW_HEIGHT);
        for row in rows {
            // The header is drawn once; rows continuing onto the next
            // page start directly with cell content.
            self.cursor.ensure_space(row_height, "table");
            let y = self.cursor.y();
            let text_y = y + (row_height - font_size).mul_ratio(1, 2);
            for (index, column) in columns.iter().enumerate() {
                let cell_x = x + slot * index as i32;
                let value = binding::resolve(row, column.cell_path());
                let text = format::format_value(value, column.format);
                if text.is_empty() {
                    continue;
                }
                let text = fit_text(font::FONT_REGULAR, font_size, &text, slot - cell_pad * 2);
                let text_width =
                    font::measure_text_width(font::FONT_REGULAR, font_size, &text);
                let offset = align_offset(
                    column.align.unwrap_or(Align::Left),
                    slot - cell_pad * 2,
                    text_width,
                );
                let canvas = self.cursor.canvas_mut();
                canvas.set_fill_color(color);
                canvas.set_font_name(font::FONT_REGULAR);
                canvas.set_font_size(font_size);
                canvas.draw_string(cell_x + cell_pad + offset, text_y, text);
            }
            self.cursor.advance(row_height);
        }
        self.advance_margin(style, 10.0);
    }

    fn advance_margin(&mut self, style: &ComponentStyle, default: f32) {
        let margin = Pt::from_f32(style.margin_bottom.unwrap_or(default).max(0.0));
        if margin > Pt::ZERO {
            self.cursor.advance(margin);
        }
    }
}

struct TextDefaults {
    font_size: f32,
    bold: bool,
    margin_bottom: f32,
    component: &'static str,
}

fn parse_color(raw: &Option<String>, default: Color) -> Color {
    raw.as_deref()
        .and_then(Color::parse_hex)
        .unwrap_or(default)
}

fn align_offset(align: Align, avail: Pt, content_width: Pt) -> Pt {
    match align {
        Align::Left => Pt::ZERO,
        Align::Center => (avail - content_width).max(Pt::ZERO).mul_ratio(1, 2),
        Align::Right => (avail - content_width).max(Pt::ZERO),
    }
}

/// Greedy word wrap against measured widths. Words wider than the full
/// line are hard-broken so a pathological token cannot stall layout.
fn wrap_text(face: &str, font_size: Pt, text: &str, max_width: Pt) -> Vec<String> {
    let max_width = max_width.max(Pt::from_f32(1.0));
    let mut lines = Vec::new();
    for hard_line in text.split('\n') {
        let mut current = String::new();
        for word in hard_line.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if font::measure_text_width(face, font_size, &candidate) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if font::measure_text_width(face, font_size, word) <= max_width {
                current = word.to_string();
            } else {
                current = hard_break(face, font_size, word, max_width, &mut lines);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

fn hard_break(
    face: &str,
    font_size: Pt,
    word: &str,
    max_width: Pt,
    lines: &mut Vec<String>,
) -> String {
    let mut chunk = String::new();
    for ch in word.chars() {
        chunk.push(ch);
        if font::measure_text_width(face, font_size, &chunk) > max_width
            && chunk.chars().count() > 1
        {
            let last = chunk.pop().unwrap_or_default();
            lines.push(std::mem::take(&mut chunk));
            chunk.push(last);
        }
    }
    chunk
}

/// Truncates with an ellipsis when the text cannot fit the available
/// cell width.
fn fit_text(face: &str, font_size: Pt, text: &str, max_width: Pt) -> String {
    let max_width = max_width.max(Pt::from_f32(1.0));
    if font::measure_text_width(face, font_size, text) <= max_width {
        return text.to_string();
    }
    let mut out: String = text.to_string();
    while !out.is_empty() {
        out.pop();
        let candidate = format!("{}\u{2026}", out.trim_end());
        if font::measure_text_width(face, font_size, &candidate) <= max_width {
            return candidate;
        }
    }
    "\u{2026}".to_string()
}
