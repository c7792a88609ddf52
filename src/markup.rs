use crate::binding;
use crate::format;
use crate::layout::{Align, Column, Component, ComponentBody, ComponentStyle, Layout, MAX_BOX_DEPTH};
use crate::visibility;
use serde_json::Value;
use std::fmt::Write;

/// Presentational defaults for the preview/email body. Sizes mirror the
/// paginated backend's so the two outputs read the same.
const BASE_STYLES: &str = ".sp-doc{font-family:Helvetica,Arial,sans-serif;color:#1c1c1c;font-size:10pt;line-height:1.45;max-width:640px;margin:0 auto;padding:24px;}\
.sp-doc h1{font-size:20pt;margin:0 0 8pt;}\
.sp-doc h2{font-size:16pt;margin:0 0 8pt;}\
.sp-doc h3{font-size:13pt;margin:0 0 8pt;}\
.sp-doc h4{font-size:11pt;margin:0 0 8pt;}\
.sp-doc p{margin:0 0 6pt;}\
.sp-doc ul{margin:0 0 6pt;padding-left:16pt;}\
.sp-doc hr{border:none;border-top:1px solid #9e9e9e;margin:4pt 0 6pt;}\
.sp-doc table{border-collapse:collapse;width:100%;margin:0 0 10pt;}\
.sp-doc th{text-align:left;border-bottom:1px solid #9e9e9e;padding:3pt 4pt;font-size:9pt;}\
.sp-doc td{padding:3pt 4pt;font-size:9pt;border-bottom:1px solid #e3e3e3;}\
.sp-box{border:1px solid #c7c7c7;padding:8pt;margin:0 0 10pt;}\
.sp-chips{margin:0 0 6pt;}\
.sp-chip{display:inline-block;background:#e8ede6;color:#262626;padding:1pt 5pt;border-radius:7pt;font-size:8pt;margin:0 3pt 3pt 0;}";

/// Renders a layout into one complete, self-contained HTML document.
/// Never fails: malformed pieces degrade to omission, and all
/// interpolated content is escaped on the way in.
pub(crate) fn render(layout: &Layout, context: &Value) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let title = layout.name.as_deref().unwrap_or("Document");
    let _ = writeln!(out, "<title>{}</title>", escape_html(title));
    out.push_str("<style>");
    out.push_str(BASE_STYLES);
    out.push_str("</style>\n</head>\n<body>\n<div class=\"sp-doc\">\n");
    for component in &layout.components {
        render_component(&mut out, component, context, 0);
    }
    out.push_str("</div>\n</body>\n</html>\n");
    out
}

fn render_component(out: &mut String, component: &Component, context: &Value, depth: usize) {
    // Defensive cap for trees rendered without a prior validate() call.
    if depth > MAX_BOX_DEPTH {
        return;
    }
    if !visibility::is_visible(component, context) {
        return;
    }
    let style_attr = style_attr(&component.style);
    match &component.body {
        ComponentBody::Heading {
            text,
            binding,
            level,
        } => {
            let level = (*level).clamp(1, 4);
            let content = binding::component_text(text, binding, context);
            let _ = writeln!(
                out,
                "<h{level}{style_attr}>{}</h{level}>",
                escape_html(&content)
            );
        }
        ComponentBody::Text { text, binding } => {
            let content = binding::component_text(text, binding, context);
            let _ = writeln!(out, "<p{style_attr}>{}</p>", escape_html(&content));
        }
        ComponentBody::List { items } => {
            let texts: Vec<String> = items
                .iter()
                .map(|item| binding::list_item_text(item, context))
                .filter(|text| !text.trim().is_empty())
                .collect();
            if texts.is_empty() {
                return;
            }
            let _ = writeln!(out, "<ul{style_attr}>");
            for text in texts {
                let _ = writeln!(out, "<li>{}</li>", escape_html(&text));
            }
            out.push_str("</ul>\n");
        }
        ComponentBody::Chips { chips } => {
            let visible: Vec<&crate::layout::Chip> = chips
                .iter()
                .filter(|chip| !chip.label.trim().is_empty())
                .collect();
            if visible.is_empty() {
                return;
            }
            let _ = writeln!(out, "<div class=\"sp-chips\"{style_attr}>");
            for chip in visible {
                match &chip.color {
                    Some(color) => {
                        let _ = writeln!(
                            out,
                            "<span class=\"sp-chip\" style=\"background:{}\">{}</span>",
                            escape_html(color),
                            escape_html(&chip.label)
                        );
                    }
                    None => {
                        let _ = writeln!(
                            out,
                            "<span class=\"sp-chip\">{}</span>",
                            escape_html(&chip.label)
                        );
                    }
                }
            }
            out.push_str("</div>\n");
        }
        ComponentBody::Divider => {
            let _ = writeln!(out, "<hr{style_attr}>");
        }
        ComponentBody::Spacer { height } => {
            let height = height.unwrap_or(12.0).max(0.0);
            let _ = writeln!(out, "<div style=\"height:{height}pt\"></div>");
        }
        ComponentBody::Image {
            url,
            binding,
            width,
            height,
        } => {
            let source = match url {
                Some(url) if !url.is_empty() => url.clone(),
                _ => binding
                    .as_deref()
                    .map(|path| binding::display_string(binding::resolve(context, path)))
                    .unwrap_or_default(),
            };
            // No resolvable source: the component is omitted entirely.
            if source.is_empty() {
                return;
            }
            let mut img = format!("<img src=\"{}\"", escape_html(&source));
            if let Some(width) = width {
                let _ = write!(img, " width=\"{width}\"");
            }
            if let Some(height) = height {
                let _ = write!(img, " height=\"{height}\"");
            }
            let _ = writeln!(out, "{img}{style_attr}>");
        }
        ComponentBody::Box { children } => {
            let _ = writeln!(out, "<div class=\"sp-box\"{style_attr}>");
            for child in children {
                render_component(out, child, context, depth + 1);
            }
            out.push_str("</div>\n");
        }
        ComponentBody::Table {
            rows_binding,
            columns,
            show_header,
        } => {
            if columns.is_empty() {
                return;
            }
            let rows: &[Value] = binding::resolve(context, rows_binding)
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let _ = writeln!(out, "<table{style_attr}>");
            if *show_header {
                out.push_str("<thead>\n<tr>");
                for column in columns {
                    let _ = write!(
                        out,
                        "<th{}>{}</th>",
                        column_attr(column, true),
                        escape_html(column.header_label())
                    );
                }
                out.push_str("</tr>\n</thead>\n");
            }
            out.push_str("<tbody>\n");
            for row in rows {
                out.push_str("<tr>");
                for column in columns {
                    let value = binding::resolve(row, column.cell_path());
                    let text = format::format_value(value, column.format);
                    let _ = write!(
                        out,
                        "<td{}>{}</td>",
                        column_attr(column, false),
                        escape_html(&text)
                    );
                }
                out.push_str("</tr>\n");
            }
            out.push_str("</tbody>\n</table>\n");
        }
        ComponentBody::Unknown => {}
    }
}

/// Inline style attribute for a component's explicit overrides; empty
/// when the component relies on the stylesheet defaults.
fn style_attr(style: &ComponentStyle) -> String {
    let mut css = String::new();
    if let Some(size) = style.font_size {
        let _ = write!(css, "font-size:{size}pt;");
    }
    match style.bold {
        Some(true) => css.push_str("font-weight:700;"),
        Some(false) => css.push_str("font-weight:400;"),
        None => {}
    }
    if style.italic == Some(true) {
        css.push_str("font-style:italic;");
    }
    if let Some(color) = &style.color {
        let _ = write!(css, "color:{};", color);
    }
    if let Some(background) = &style.background {
        let _ = write!(css, "background:{};", background);
    }
    if let Some(padding) = style.padding {
        let _ = write!(css, "padding:{padding}pt;");
    }
    if let Some(margin) = style.margin_bottom {
        let _ = write!(css, "margin-bottom:{margin}pt;");
    }
    if let Some(align) = style.align {
        let _ = write!(css, "text-align:{};", align_keyword(align));
    }
    if let Some(border_width) = style.border_width {
        let color = style.border_color.as_deref().unwrap_or("#c7c7c7");
        let _ = write!(css, "border:{border_width}pt solid {color};");
    }
    if css.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", escape_html(&css))
    }
}

/// Cell attributes. Width hints are honored here and only here; the
/// paginated backend lays columns out in equal slots.
fn column_attr(column: &Column, header: bool) -> String {
    let mut css = String::new();
    if header {
        if let Some(width) = column.width {
            let _ = write!(css, "width:{width}pt;");
        }
    }
    if let Some(align) = column.align {
        let _ = write!(css, "text-align:{};", align_keyword(align));
    }
    if css.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", escape_html(&css))
    }
}

fn align_keyword(align: Align) -> &'static str {
    match align {
        Align::Left => "left",
        Align::Center => "center",
        Align::Right => "right",
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layout(json: &str) -> Layout {
        serde_json::from_str(json).unwrap()
    }

    fn invoice_layout() -> Layout {
        layout(
            r#"{"components": [
                {"id": "h", "kind": "heading", "text": "Invoice {{order.number}}", "level": 1},
                {"id": "t", "kind": "table", "rowsBinding": "items",
                 "columns": [
                    {"key": "sku"},
                    {"key": "qty"},
                    {"key": "price", "format": "currency"}
                 ]}
            ]}"#,
        )
    }

    fn invoice_context() -> Value {
        json!({
            "order": {"number": "INV-1"},
            "items": [
                {"sku": "A1", "qty": 2, "price": 9.5},
                {"sku": "A2", "qty": 1, "price": 3}
            ]
        })
    }

    #[test]
    fn invoice_scenario_produces_heading_rows_and_currency() {
        let html = render(&invoice_layout(), &invoice_context());
        assert!(html.contains("<h1>Invoice INV-1</h1>"));
        assert_eq!(html.matches("<tr><td").count(), 2);
        assert!(html.contains("<td>$9.50</td>"));
        assert!(html.contains("<td>$3.00</td>"));
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn missing_binding_substitutes_empty_without_error() {
        let html = render(&invoice_layout(), &json!({"items": []}));
        assert!(html.contains("<h1>Invoice </h1>"));
        assert!(html.contains("<tbody>\n</tbody>"));
    }

    #[test]
    fn bound_values_are_escaped() {
        let template = layout(
            r#"{"components": [{"id": "t", "kind": "text", "text": "Note: {{order.note}}"}]}"#,
        );
        let html = render(
            &template,
            &json!({"order": {"note": "<script>alert('x')</script> & more"}}),
        );
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; more"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn hidden_and_unknown_components_emit_nothing() {
        let template = layout(
            r#"{"components": [
                {"id": "a", "kind": "text", "text": "shown"},
                {"id": "b", "kind": "text", "text": "concealed",
                 "visibleWhen": {"field": "missing"}},
                {"id": "c", "kind": "holograph", "payload": 1}
            ]}"#,
        );
        let html = render(&template, &json!({}));
        assert!(html.contains("shown"));
        assert!(!html.contains("concealed"));
        assert!(!html.contains("holograph"));
    }

    #[test]
    fn rendering_twice_is_byte_identical() {
        let template = invoice_layout();
        let context = invoice_context();
        assert_eq!(render(&template, &context), render(&template, &context));
    }

    #[test]
    fn non_array_rows_render_an_empty_body() {
        let template = layout(
            r#"{"components": [{"id": "t", "kind": "table", "rowsBinding": "items",
                "columns": [{"key": "sku"}]}]}"#,
        );
        let html = render(&template, &json!({"items": {"not": "an array"}}));
        assert!(html.contains("<tbody>\n</tbody>"));
    }

    #[test]
    fn column_width_hint_lands_on_the_header_cell() {
        let template = layout(
            r#"{"components": [{"id": "t", "kind": "table", "rowsBinding": "items",
                "columns": [{"key": "sku", "width": 120, "align": "right"}]}]}"#,
        );
        let html = render(&template, &json!({"items": []}));
        assert!(html.contains("width:120pt;text-align:right;"));
    }

    #[test]
    fn image_without_a_source_is_omitted() {
        let template = layout(
            r#"{"components": [
                {"id": "a", "kind": "image", "binding": "logo.url", "width": 80},
                {"id": "b", "kind": "image"}
            ]}"#,
        );
        let with_source = render(&template, &json!({"logo": {"url": "https://x/y.png"}}));
        assert!(with_source.contains("<img src=\"https://x/y.png\" width=\"80\">"));
        let without = render(&template, &json!({}));
        assert!(!without.contains("<img"));
    }

    #[test]
    fn list_omits_blank_items() {
        let template = layout(
            r#"{"components": [{"id": "l", "kind": "list", "items": [
                {"label": "Water in"},
                {"binding": "care.missing"},
                {"binding": "care.note"}
            ]}]}"#,
        );
        let html = render(&template, &json!({"care": {"note": "Part shade"}}));
        assert_eq!(html.matches("<li>").count(), 2);
        assert!(html.contains("<li>Water in</li>"));
        assert!(html.contains("<li>Part shade</li>"));
    }

    #[test]
    fn style_overrides_become_inline_css() {
        let template = layout(
            r##"{"components": [{"id": "t", "kind": "text", "text": "x",
                "style": {"fontSize": 12, "bold": true, "color": "#336633",
                          "align": "center", "marginBottom": 9}}]}"##,
        );
        let html = render(&template, &json!({}));
        assert!(html.contains(
            "style=\"font-size:12pt;font-weight:700;color:#336633;margin-bottom:9pt;text-align:center;\""
        ));
    }
}
