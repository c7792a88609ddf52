use crate::error::SeedPressError;
use serde::Deserialize;
use serde_json::Value;

/// Deepest allowed box nesting. The tree is owned so true cycles cannot
/// be constructed, but stored templates are still checked before any
/// render so a pathological document fails at load time, not mid-draw.
pub const MAX_BOX_DEPTH: usize = 32;

const SUPPORTED_TEMPLATE_VERSION: u32 = 1;

/// An ordered tree of components defining one document template.
/// Produced by the template store, consumed read-only by both renderers.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_version")]
    pub version: u32,
    pub components: Vec<Component>,
}

fn default_version() -> u32 {
    SUPPORTED_TEMPLATE_VERSION
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub style: ComponentStyle,
    #[serde(default)]
    pub visible_when: Option<VisibleWhen>,
    #[serde(flatten)]
    pub body: ComponentBody,
}

/// The component kinds. Unrecognized kinds deserialize to `Unknown` and
/// render to nothing in both backends; a template authored against a
/// newer component set degrades instead of failing wholesale.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentBody {
    #[serde(rename_all = "camelCase")]
    Heading {
        #[serde(default)]
        text: String,
        #[serde(default)]
        binding: Option<String>,
        #[serde(default = "default_heading_level")]
        level: u8,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        #[serde(default)]
        text: String,
        #[serde(default)]
        binding: Option<String>,
    },
    List {
        #[serde(default)]
        items: Vec<ListItem>,
    },
    Chips {
        #[serde(default)]
        chips: Vec<Chip>,
    },
    Divider,
    Spacer {
        #[serde(default)]
        height: Option<f32>,
    },
    Image {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        binding: Option<String>,
        #[serde(default)]
        width: Option<f32>,
        #[serde(default)]
        height: Option<f32>,
    },
    Box {
        #[serde(default)]
        children: Vec<Component>,
    },
    #[serde(rename_all = "camelCase")]
    Table {
        #[serde(default)]
        rows_binding: String,
        #[serde(default)]
        columns: Vec<Column>,
        #[serde(default = "default_true")]
        show_header: bool,
    },
    #[serde(other)]
    Unknown,
}

fn default_heading_level() -> u8 {
    2
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStyle {
    pub font_size: Option<f32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: Option<String>,
    pub background: Option<String>,
    pub padding: Option<f32>,
    pub margin_bottom: Option<f32>,
    pub align: Option<Align>,
    pub border_width: Option<f32>,
    pub border_color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Center,
    Right,
}

/// One or many conditions; a component is emitted iff all hold.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VisibleWhen {
    One(Condition),
    Many(Vec<Condition>),
}

impl VisibleWhen {
    pub fn conditions(&self) -> &[Condition] {
        match self {
            VisibleWhen::One(condition) => std::slice::from_ref(condition),
            VisibleWhen::Many(conditions) => conditions,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub field: String,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[default]
    Exists,
    Equals,
    NotEquals,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub binding: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chip {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub binding: Option<String>,
    #[serde(default)]
    pub align: Option<Align>,
    #[serde(default)]
    pub format: Option<FormatKind>,
    #[serde(default)]
    pub width: Option<f32>,
}

impl Column {
    /// Header text: explicit label, else the key itself.
    pub fn header_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }

    /// Path a cell value is resolved with, relative to its row.
    pub fn cell_path(&self) -> &str {
        self.binding.as_deref().unwrap_or(&self.key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    Text,
    Currency,
    Number,
    Date,
}

/// Structural checks that must pass before either renderer runs. A
/// template that validates always produces some output; a template that
/// fails here never starts rendering.
pub fn validate(layout: &Layout) -> Result<(), SeedPressError> {
    if layout.version != SUPPORTED_TEMPLATE_VERSION {
        return Err(SeedPressError::UnsupportedTemplateVersion(layout.version));
    }
    for component in &layout.components {
        validate_component(component, 1)?;
    }
    Ok(())
}

fn validate_component(component: &Component, depth: usize) -> Result<(), SeedPressError> {
    if depth > MAX_BOX_DEPTH {
        return Err(SeedPressError::InvalidLayout(format!(
            "box nesting exceeds {} levels",
            MAX_BOX_DEPTH
        )));
    }
    if let Some(visible_when) = &component.visible_when {
        for condition in visible_when.conditions() {
            if condition.field.is_empty() {
                return Err(SeedPressError::InvalidLayout(format!(
                    "component '{}' has a visibility condition with an empty field",
                    component.id
                )));
            }
        }
    }
    match &component.body {
        ComponentBody::Box { children } => {
            for child in children {
                validate_component(child, depth + 1)?;
            }
        }
        ComponentBody::Table {
            rows_binding,
            columns,
            ..
        } => {
            if rows_binding.is_empty() {
                return Err(SeedPressError::InvalidLayout(format!(
                    "table '{}' is missing rowsBinding",
                    component.id
                )));
            }
            for column in columns {
                if column.key.is_empty() {
                    return Err(SeedPressError::InvalidLayout(format!(
                        "table '{}' has a column with an empty key",
                        component.id
                    )));
                }
            }
        }
        _ => {}
    }
    Ok(())
}
