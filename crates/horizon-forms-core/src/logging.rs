//! Logging and debugging facilities for Horizon Forms.
//!
//! This module provides:
//! - Target names for filtering the crate's `tracing` output by subsystem
//! - A text rendering of generated forms for debugging
//!
//! # Tracing Integration
//!
//! The library never installs a subscriber. To see logs, install one in your
//! application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_forms_core::commit=trace")
//!     .init();
//! ```
//!
//! # Debug Visualization
//!
//! Use [`FormDebug`] to print the placed elements of a form:
//!
//! ```ignore
//! use horizon_forms_core::logging::FormDebug;
//!
//! println!("{}", FormDebug::new().format(&form));
//! ```

use std::fmt::Write as FmtWrite;

use crate::form::Form;
use crate::widget::Element;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_forms_core";
    /// Attribute extraction and form generation.
    pub const GENERATE: &str = "horizon_forms_core::generate";
    /// Converter registration and text conversion.
    pub const CONVERT: &str = "horizon_forms_core::convert";
    /// Edit commits and rejections.
    pub const COMMIT: &str = "horizon_forms_core::commit";
    /// Observer and change handler dispatch.
    pub const NOTIFY: &str = "horizon_forms_core::notify";
    /// Signal emission.
    pub const SIGNAL: &str = "horizon_forms_core::signal";
}

/// Configuration for form debug output.
#[derive(Debug, Clone)]
pub struct FormFormatOptions {
    /// Whether to prefix each element with its grid cell.
    pub show_positions: bool,
    /// Whether to show the widget kind of field widgets.
    pub show_kinds: bool,
    /// Whether to show tooltips.
    pub show_tooltips: bool,
    /// Indent size for each nesting level.
    pub indent_size: usize,
}

impl Default for FormFormatOptions {
    fn default() -> Self {
        Self {
            show_positions: true,
            show_kinds: true,
            show_tooltips: false,
            indent_size: 2,
        }
    }
}

impl FormFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_tooltips: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_positions: false,
            show_kinds: false,
            show_tooltips: false,
            indent_size: 0,
        }
    }
}

/// Debug utility that renders a generated form as text, one element per line.
///
/// Field widgets of nested sub-forms are indented by their depth.
#[derive(Debug, Clone, Default)]
pub struct FormDebug {
    options: FormFormatOptions,
}

impl FormDebug {
    /// Create a new debug renderer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug renderer with custom options.
    pub fn with_options(options: FormFormatOptions) -> Self {
        Self { options }
    }

    /// Render every placed element of `form`.
    pub fn format(&self, form: &Form) -> String {
        let elements = form.elements();
        let mut output = String::new();
        let _ = writeln!(
            output,
            "Form ({:?}, {} elements, cursor {}):",
            form.config().strategy,
            elements.len(),
            form.cursor()
        );
        if elements.is_empty() {
            let _ = writeln!(output, "  (empty)");
            return output;
        }

        for placed in elements {
            let mut line = String::from("  ");
            if self.options.show_positions {
                let _ = write!(line, "{:<9}", placed.position.to_string());
            }
            match placed.element {
                Element::Label(label) => {
                    let _ = write!(line, "{}", label.text());
                    if let Some(tooltip) = label.tooltip().filter(|_| self.options.show_tooltips) {
                        let _ = write!(line, "  ({tooltip})");
                    }
                }
                Element::Separator => {
                    let _ = write!(line, "{}", "-".repeat(8 * placed.column_span));
                }
                Element::Field(id) => match form.widget(*id) {
                    Some(widget) => {
                        line.push_str(&" ".repeat(widget.depth() * self.options.indent_size));
                        if self.options.show_kinds {
                            let _ = write!(line, "[{}] ", widget.kind().name());
                        }
                        let _ = write!(line, "{:?}", widget.text());
                        if !widget.is_editable() {
                            line.push_str(" (read-only)");
                        }
                        if widget.options().len() > 1 {
                            let _ = write!(line, " of {:?}", widget.options());
                        }
                    }
                    None => line.push_str("<missing widget>"),
                },
            }
            let _ = writeln!(output, "{}", line.trim_end());
        }
        output
    }
}
