#[derive(Debug, Clone, Default)]
pub struct PageMetrics {
    pub page_number: usize,
    pub command_count: usize,
    pub component_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RenderMetrics {
    pub pages: Vec<PageMetrics>,
    pub total_render_ms: f64,
    pub total_bytes: usize,
}
