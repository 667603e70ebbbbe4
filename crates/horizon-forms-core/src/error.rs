//! Error types for form generation and editing.
//!
//! Errors fall into two groups. Structural errors ([`FormError`] variants other
//! than [`FormError::Parse`]) abort a generation pass and no form is returned.
//! Input errors ([`ParseError`]) are caught at the widget that produced them:
//! the bound attribute is left untouched and the widget reverts its display.
//!
//! Local change handlers report failures through [`HandlerError`], which is
//! collected per commit and never aborts anything.

/// Result type alias for form operations.
pub type Result<T> = std::result::Result<T, FormError>;

/// Errors that can occur while generating or editing a form.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// An attribute could not be reached on its owning object.
    #[error("cannot access attribute '{attribute}' on {owner}: {message}")]
    AttributeAccess {
        owner: String,
        attribute: String,
        message: String,
    },

    /// A plain-value attribute asked for a widget hint nobody recognizes.
    #[error("unknown widget hint '{hint}' on attribute '{attribute}'")]
    UnknownFieldKind { attribute: String, hint: String },

    /// No text codec exists for a type that needs one.
    #[error("no converter registered for type {type_name}")]
    NoConverterRegistered { type_name: String },

    /// User-supplied text could not be turned into a value.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A numeric value model was configured inconsistently.
    #[error("invalid numeric configuration: {message}")]
    NumericConfig { message: String },

    /// A value of one type was handed to a slot of another.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A widget id that does not belong to this form.
    #[error("unknown widget")]
    UnknownWidget,

    /// The edit kind does not fit the widget it was delivered to.
    #[error("{widget} widgets do not accept {edit} edits")]
    UnsupportedEdit {
        widget: &'static str,
        edit: &'static str,
    },

    /// `regenerate` was called before anything was bound.
    #[error("no object is bound to the generator")]
    NoBoundObject,

    /// Configuration text could not be deserialized.
    #[error("invalid form configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl FormError {
    /// Create an attribute access error.
    pub fn attribute_access(
        owner: impl Into<String>,
        attribute: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::AttributeAccess {
            owner: owner.into(),
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Create an unknown widget hint error.
    pub fn unknown_field_kind(attribute: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::UnknownFieldKind {
            attribute: attribute.into(),
            hint: hint.into(),
        }
    }

    /// Create a missing converter error.
    pub fn no_converter(type_name: impl Into<String>) -> Self {
        Self::NoConverterRegistered {
            type_name: type_name.into(),
        }
    }

    /// Create a numeric configuration error.
    pub fn numeric_config(message: impl Into<String>) -> Self {
        Self::NumericConfig {
            message: message.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Returns `true` for errors caused by user input rather than by the
    /// schema or the caller.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

/// User text that could not be parsed into the declared type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse '{input}' as {type_name}: {message}")]
pub struct ParseError {
    /// Name of the type the text was parsed into.
    pub type_name: String,
    /// The offending input.
    pub input: String,
    /// Parser diagnostic.
    pub message: String,
}

impl ParseError {
    /// Create a parse error.
    pub fn new(
        type_name: impl Into<String>,
        input: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            input: input.into(),
            message: message.into(),
        }
    }

    /// Blank input delivered to an attribute that cannot be absent.
    pub fn required(type_name: impl Into<String>) -> Self {
        Self::new(type_name, "", "a value is required")
    }
}

/// A local change handler reported a failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("change handler '{handler}' on {owner} failed for '{attribute}': {message}")]
pub struct HandlerError {
    /// Handler name as declared on the owning type.
    pub handler: String,
    /// Owning type name.
    pub owner: String,
    /// Attribute whose change triggered the handler.
    pub attribute: String,
    /// The handler's own message.
    pub message: String,
}
