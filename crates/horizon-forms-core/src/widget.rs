//! Widgets and layout elements of a generated form.
//!
//! A generated form is a sequence of positioned [`Element`]s: labels,
//! separators and field widgets. Field widgets live in the form's widget
//! table and are referenced from elements by [`WidgetId`]; the renderer
//! queries their live state through [`Form::widget`](crate::Form::widget).

use std::sync::Arc;

use slotmap::new_key_type;

use crate::extract::AttributeDescriptor;
use crate::numeric::NumericValueModel;
use crate::value::{AnyValue, EnumMeta, NumericKind};

new_key_type! {
    /// Identifies a field widget within one generated form.
    pub struct WidgetId;
}

/// The widget kinds the selector can choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// Pick one of a fixed list of strings.
    ChoiceList,
    /// Numeric input with step buttons.
    Stepper,
    /// One line of free text.
    SingleLineText,
    /// Several lines of free text.
    MultiLineText,
    /// An embedded sub-form for a composite attribute.
    NestedForm,
}

impl WidgetKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::ChoiceList => "choice list",
            Self::Stepper => "stepper",
            Self::SingleLineText => "single-line text",
            Self::MultiLineText => "multi-line text",
            Self::NestedForm => "nested form",
        }
    }
}

/// An edit delivered by the renderer.
pub enum Edit {
    /// Text typed into a text field or a stepper.
    Text(String),
    /// A choice list entry picked by index.
    Select(usize),
    /// A choice list entry picked by its text.
    SelectText(String),
    /// Stepper buttons pressed; negative values step down.
    Step(i32),
    /// A value supplied directly, converted to the declared type.
    Value(AnyValue),
}

impl Edit {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Select(_) => "select",
            Self::SelectText(_) => "select-text",
            Self::Step(_) => "step",
            Self::Value(_) => "value",
        }
    }
}

impl std::fmt::Debug for Edit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Select(index) => f.debug_tuple("Select").field(index).finish(),
            Self::SelectText(text) => f.debug_tuple("SelectText").field(text).finish(),
            Self::Step(steps) => f.debug_tuple("Step").field(steps).finish(),
            Self::Value(_) => f.write_str("Value(..)"),
        }
    }
}

/// A text label.
#[derive(Debug, Clone)]
pub struct Label {
    text: String,
    tooltip: Option<String>,
    attribute: AttributeDescriptor,
}

impl Label {
    pub(crate) fn new(text: String, attribute: &AttributeDescriptor) -> Self {
        Self {
            text,
            tooltip: attribute.binding().tooltip().map(str::to_owned),
            attribute: attribute.clone(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    /// The attribute this label names.
    pub fn attribute(&self) -> &AttributeDescriptor {
        &self.attribute
    }
}

/// One cell of the form's grid.
#[derive(Debug, Clone)]
pub enum Element {
    Label(Label),
    Separator,
    Field(WidgetId),
}

impl Element {
    pub fn is_separator(&self) -> bool {
        matches!(self, Element::Separator)
    }

    pub fn as_label(&self) -> Option<&Label> {
        match self {
            Element::Label(label) => Some(label),
            _ => None,
        }
    }

    pub fn widget_id(&self) -> Option<WidgetId> {
        match self {
            Element::Field(id) => Some(*id),
            _ => None,
        }
    }
}

/// Kind-specific widget state.
#[derive(Debug, Clone)]
pub enum Control {
    ChoiceList {
        options: Vec<String>,
        selected: Option<usize>,
        /// Set when the options are the variants of an enum type.
        variants: Option<EnumMeta>,
    },
    Stepper {
        model: NumericValueModel,
        kind: NumericKind,
    },
    Text {
        multi_line: bool,
    },
}

impl Control {
    pub fn kind(&self) -> WidgetKind {
        match self {
            Control::ChoiceList { .. } => WidgetKind::ChoiceList,
            Control::Stepper { .. } => WidgetKind::Stepper,
            Control::Text { multi_line: false } => WidgetKind::SingleLineText,
            Control::Text { multi_line: true } => WidgetKind::MultiLineText,
        }
    }
}

/// A field widget bound to one attribute.
#[derive(Debug, Clone)]
pub struct FieldWidget {
    pub(crate) attribute: AttributeDescriptor,
    /// Composite attributes leading from the bound object to the owning object.
    pub(crate) path: Arc<[AttributeDescriptor]>,
    pub(crate) control: Control,
    pub(crate) text: String,
    pub(crate) editable: bool,
    pub(crate) max_width: f32,
    pub(crate) tooltip: Option<String>,
}

impl FieldWidget {
    pub fn kind(&self) -> WidgetKind {
        self.control.kind()
    }

    pub fn attribute(&self) -> &AttributeDescriptor {
        &self.attribute
    }

    pub fn control(&self) -> &Control {
        &self.control
    }

    /// The text currently displayed.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Read-only widgets cannot take focus.
    pub fn is_focusable(&self) -> bool {
        self.editable
    }

    pub fn max_width(&self) -> f32 {
        self.max_width
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    /// Choice list entries; empty for other kinds.
    pub fn options(&self) -> &[String] {
        match &self.control {
            Control::ChoiceList { options, .. } => options,
            _ => &[],
        }
    }

    /// The selected choice list entry.
    pub fn selected_index(&self) -> Option<usize> {
        match &self.control {
            Control::ChoiceList { selected, .. } => *selected,
            _ => None,
        }
    }

    /// The stepper's value model.
    pub fn numeric_model(&self) -> Option<&NumericValueModel> {
        match &self.control {
            Control::Stepper { model, .. } => Some(model),
            _ => None,
        }
    }

    /// Nesting depth: 0 for attributes of the bound object itself.
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}
