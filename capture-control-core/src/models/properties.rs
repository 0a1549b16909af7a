use serde::{Deserialize, Serialize};

/// How a numeric property is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberType {
    Scroller,
    Slider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextType {
    Default,
    Password,
    Multiline,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathType {
    File,
    FileSave,
    Directory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComboType {
    Editable,
    List,
    Radio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComboFormat {
    Int,
    Float,
    String,
}

/// Value of a list option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListValue {
    Int(i64),
    Float(f64),
    String(String),
}

/// One option of a list property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub name: String,
    pub value: ListValue,
    pub disabled: bool,
}

impl ListItem {
    pub fn new(name: &str, value: ListValue) -> Self {
        Self {
            name: name.to_string(),
            value,
            disabled: false,
        }
    }
}

/// Kind-specific part of a property descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyKind {
    Bool,
    Int {
        min: i64,
        max: i64,
        step: i64,
        number_type: NumberType,
    },
    Float {
        min: f64,
        max: f64,
        step: f64,
        number_type: NumberType,
    },
    Text {
        text_type: TextType,
    },
    Path {
        path_type: PathType,
        filter: String,
        default_path: String,
    },
    List {
        combo_type: ComboType,
        combo_format: ComboFormat,
        items: Vec<ListItem>,
    },
    Color {
        alpha: bool,
    },
    Button,
    Font,
    EditableList,
    FrameRate,
    Group {
        properties: Vec<Property>,
    },
}

/// Read-only descriptor of one editable setting of a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub visible: bool,
    #[serde(flatten)]
    pub kind: PropertyKind,
}

impl Property {
    pub fn new(name: &str, description: &str, kind: PropertyKind) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            enabled: true,
            visible: true,
            kind,
        }
    }

    /// Options of a list property, empty for every other kind.
    pub fn items(&self) -> &[ListItem] {
        match &self.kind {
            PropertyKind::List { items, .. } => items,
            _ => &[],
        }
    }
}

/// Find a property by name, descending into groups.
pub fn find_property<'a>(properties: &'a [Property], name: &str) -> Option<&'a Property> {
    properties.iter().find_map(|p| {
        if p.name == name {
            return Some(p);
        }
        match &p.kind {
            PropertyKind::Group { properties } => find_property(properties, name),
            _ => None,
        }
    })
}
