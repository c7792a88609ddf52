mod binding;
mod canvas;
mod cursor;
mod debug;
mod error;
mod font;
mod format;
mod layout;
mod markup;
mod metrics;
mod page;
mod paginate;
mod pdf;
mod types;
mod visibility;

pub use binding::{display_string, resolve, substitute};
pub use canvas::{Canvas, Command, Document, Page};
pub use error::SeedPressError;
pub use format::format_value;
pub use layout::{
    Align, Chip, Column, Component, ComponentBody, ComponentStyle, Condition, FormatKind, Layout,
    ListItem, MAX_BOX_DEPTH, Operator, VisibleWhen, validate,
};
pub use metrics::{PageMetrics, RenderMetrics};
pub use page::{OnPageCallback, PageContext, PageGeometry, standard_chrome};
pub use pdf::document_to_pdf;
pub use types::{Color, Margins, Pt, Rect, Size};
pub use visibility::is_visible;

use debug::DebugLogger;
use serde_json::Value;
use std::time::Instant;

/// The rendering engine. One configured instance renders any number of
/// `(layout, context)` pairs; each call is a pure function of its
/// inputs and owns its own page state, so concurrent renders need no
/// coordination.
pub struct SeedPress {
    geometry: PageGeometry,
    doc_label: String,
    on_page: Option<OnPageCallback>,
    debug: Option<DebugLogger>,
}

#[derive(Default)]
pub struct SeedPressBuilder {
    page_size: Option<Size>,
    margins: Option<Margins>,
    doc_label: String,
    on_page: Option<OnPageCallback>,
    use_standard_chrome: bool,
    debug_path: Option<std::path::PathBuf>,
}

impl SeedPressBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_size(mut self, size: Size) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.margins = Some(margins);
        self
    }

    /// Label drawn by the page chrome; falls back to the layout's own
    /// name when left empty.
    pub fn doc_label(mut self, label: impl Into<String>) -> Self {
        self.doc_label = label.into();
        self
    }

    /// Custom page-lifecycle hook, run at the start of every page
    /// before component content. Replaces the standard chrome.
    pub fn on_page(mut self, callback: OnPageCallback) -> Self {
        self.on_page = Some(callback);
        self
    }

    /// Draw the stock header/footer (document label, page number).
    pub fn with_standard_chrome(mut self) -> Self {
        self.use_standard_chrome = true;
        self
    }

    /// Write a JSONL diagnostics trace (page breaks, lossy encodings)
    /// to the given path.
    pub fn debug_log(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<SeedPress, SeedPressError> {
        let geometry = PageGeometry {
            size: self.page_size.unwrap_or_else(Size::a4),
            margins: self.margins.unwrap_or_else(|| Margins::all(40.0)),
        };
        let on_page = match self.on_page {
            Some(callback) => Some(callback),
            None if self.use_standard_chrome => Some(standard_chrome()),
            None => None,
        };
        let debug = match self.debug_path {
            Some(path) => Some(DebugLogger::new(path)?),
            None => None,
        };
        Ok(SeedPress {
            geometry,
            doc_label: self.doc_label,
            on_page,
            debug,
        })
    }
}

impl Default for SeedPress {
    fn default() -> Self {
        Self::new()
    }
}

impl SeedPress {
    /// A4, 40pt margins, no chrome, no diagnostics.
    pub fn new() -> Self {
        Self {
            geometry: PageGeometry::a4(),
            doc_label: String::new(),
            on_page: None,
            debug: None,
        }
    }

    pub fn builder() -> SeedPressBuilder {
        SeedPressBuilder::new()
    }

    /// The markup backend: one complete HTML document for preview or
    /// email. Never fails; malformed pieces render as nothing.
    pub fn render_markup(&self, layout: &Layout, context: &Value) -> String {
        markup::render(layout, context)
    }

    /// The paginated backend, stopped at the drawing-primitive stream.
    /// Validates the layout first; a validated layout always renders.
    pub fn render_document(
        &self,
        layout: &Layout,
        context: &Value,
    ) -> Result<Document, SeedPressError> {
        layout::validate(layout)?;
        let (document, _) = paginate::render(
            layout,
            context,
            self.geometry,
            &self.effective_label(layout),
            self.on_page.clone(),
            self.debug.clone(),
        );
        Ok(document)
    }

    /// The paginated backend through to PDF bytes.
    pub fn render_pdf(&self, layout: &Layout, context: &Value) -> Result<Vec<u8>, SeedPressError> {
        Ok(self.render_pdf_with_metrics(layout, context)?.0)
    }

    pub fn render_pdf_with_metrics(
        &self,
        layout: &Layout,
        context: &Value,
    ) -> Result<(Vec<u8>, RenderMetrics), SeedPressError> {
        layout::validate(layout)?;
        let start = Instant::now();
        let (document, pages) = paginate::render(
            layout,
            context,
            self.geometry,
            &self.effective_label(layout),
            self.on_page.clone(),
            self.debug.clone(),
        );
        let bytes = pdf::document_to_pdf_with_debug(&document, self.debug.as_ref())?;
        let metrics = RenderMetrics {
            pages,
            total_render_ms: start.elapsed().as_secs_f64() * 1000.0,
            total_bytes: bytes.len(),
        };
        Ok((bytes, metrics))
    }

    fn effective_label(&self, layout: &Layout) -> String {
        if !self.doc_label.is_empty() {
            self.doc_label.clone()
        } else {
            layout.name.clone().unwrap_or_default()
        }
    }
}
