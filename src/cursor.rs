use crate::canvas::{Canvas, Document};
use crate::debug::DebugLogger;
use crate::metrics::PageMetrics;
use crate::page::{OnPageCallback, PageContext, PageGeometry};
use crate::types::Pt;

/// The mutable position state threaded through one paginated render:
/// current canvas page, top-down vertical offset, page counter. Owned
/// by exactly one render call; never shared.
pub(crate) struct PageCursor {
    canvas: Canvas,
    geometry: PageGeometry,
    y: Pt,
    page_number: usize,
    doc_label: String,
    on_page: Option<OnPageCallback>,
    debug: Option<DebugLogger>,
    metrics: Vec<PageMetrics>,
    components_on_page: usize,
}

impl PageCursor {
    pub fn new(
        geometry: PageGeometry,
        doc_label: String,
        on_page: Option<OnPageCallback>,
        debug: Option<DebugLogger>,
    ) -> Self {
        let mut cursor = Self {
            canvas: Canvas::new(geometry.size),
            geometry,
            y: geometry.content_top(),
            page_number: 1,
            doc_label,
            on_page,
            debug,
            metrics: Vec::new(),
            components_on_page: 0,
        };
        cursor.run_page_hook();
        cursor
    }

    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    pub fn y(&self) -> Pt {
        self.y
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn note_component(&mut self) {
        self.components_on_page += 1;
    }

    /// The only pagination primitive: call before drawing anything of
    /// known height. Breaks to a fresh page when the draw would cross
    /// the bottom content edge. A draw taller than a whole page is
    /// placed at the top of one anyway, best effort.
    pub fn ensure_space(&mut self, height: Pt, component: &'static str) {
        if self.y + height > self.geometry.content_bottom()
            && self.y > self.geometry.content_top()
        {
            self.break_page(component);
        }
    }

    pub fn advance(&mut self, height: Pt) {
        self.y += height;
    }

    fn break_page(&mut self, component: &'static str) {
        self.finish_page_metrics();
        self.canvas.show_page();
        if let Some(logger) = &self.debug {
            logger.log_json(&format!(
                "{{\"type\":\"page.break\",\"from_page\":{},\"to_page\":{},\"component\":\"{}\"}}",
                self.page_number,
                self.page_number + 1,
                component
            ));
            logger.increment("page.break", 1);
        }
        self.page_number += 1;
        self.y = self.geometry.content_top();
        self.run_page_hook();
    }

    fn run_page_hook(&mut self) {
        if let Some(hook) = self.on_page.clone() {
            let context = PageContext {
                page_number: self.page_number,
                doc_label: self.doc_label.clone(),
            };
            hook(&mut self.canvas, &context, &self.geometry);
        }
    }

    fn finish_page_metrics(&mut self) {
        self.metrics.push(PageMetrics {
            page_number: self.page_number,
            command_count: self.canvas.current_command_count(),
            component_count: self.components_on_page,
        });
        self.components_on_page = 0;
    }

    pub fn finish(mut self) -> (Document, Vec<PageMetrics>) {
        self.finish_page_metrics();
        if let Some(logger) = &self.debug {
            logger.emit_summary("paginate");
            logger.flush();
        }
        (self.canvas.finish(), self.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_geometry() -> PageGeometry {
        // 100pt of content height to force breaks quickly.
        PageGeometry {
            size: crate::types::Size {
                width: Pt::from_f32(200.0),
                height: Pt::from_f32(140.0),
            },
            margins: crate::types::Margins::all(20.0),
        }
    }

    #[test]
    fn ensure_space_breaks_when_the_bottom_would_be_crossed() {
        let mut cursor = PageCursor::new(small_geometry(), String::new(), None, None);
        cursor.ensure_space(Pt::from_f32(60.0), "text");
        let y = cursor.y();
        cursor.canvas_mut().draw_string(Pt::ZERO, y, "a");
        cursor.advance(Pt::from_f32(60.0));
        assert_eq!(cursor.page_number(), 1);
        cursor.ensure_space(Pt::from_f32(60.0), "text");
        assert_eq!(cursor.page_number(), 2);
        assert_eq!(cursor.y(), Pt::from_f32(20.0));
    }

    #[test]
    fn oversized_draw_at_page_top_does_not_loop() {
        let mut cursor = PageCursor::new(small_geometry(), String::new(), None, None);
        cursor.ensure_space(Pt::from_f32(500.0), "table");
        assert_eq!(cursor.page_number(), 1);
    }

    #[test]
    fn finish_reports_per_page_metrics() {
        let mut cursor = PageCursor::new(small_geometry(), String::new(), None, None);
        cursor.note_component();
        let y = cursor.y();
        cursor.canvas_mut().draw_string(Pt::ZERO, y, "a");
        cursor.advance(Pt::from_f32(90.0));
        cursor.ensure_space(Pt::from_f32(50.0), "text");
        cursor.note_component();
        let y = cursor.y();
        cursor.canvas_mut().draw_string(Pt::ZERO, y, "b");
        let (document, metrics) = cursor.finish();
        assert_eq!(document.pages.len(), 2);
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].page_number, 1);
        assert_eq!(metrics[0].component_count, 1);
        assert_eq!(metrics[1].component_count, 1);
    }
}
