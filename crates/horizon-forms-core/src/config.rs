//! Form generation settings.
//!
//! ```
//! use horizon_forms_core::{FormConfig, LayoutStrategy};
//!
//! let config = FormConfig::from_toml_str(r#"
//!     strategy = "stacked"
//!     max_widget_width = 240.0
//! "#).unwrap();
//!
//! assert_eq!(config.strategy, LayoutStrategy::Stacked);
//! assert_eq!(config.max_widget_width, 240.0);
//! assert_eq!(config.padding, 10.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layout::LayoutStrategy;
use crate::notify::DEFAULT_HANDLER_CACHE_CAPACITY;

/// How attribute names become label text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldNaming {
    /// Use the attribute name unchanged.
    Verbatim,
    /// `receiverPort` and `receiver_port` both become `Receiver Port`.
    #[default]
    SplitCapitalizedWords,
}

impl FieldNaming {
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Verbatim => name.to_owned(),
            Self::SplitCapitalizedWords => split_capitalized(name),
        }
    }
}

fn split_capitalized(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for ch in name.chars() {
        if ch == '_' || ch.is_uppercase() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            if ch == '_' {
                continue;
            }
        }
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Settings applied to a generated form and every sub-form inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Label/field arrangement.
    pub strategy: LayoutStrategy,
    /// Maximum display width of every field widget.
    pub max_widget_width: f32,
    /// Label text derivation.
    pub naming: FieldNaming,
    /// Gap between columns, for the renderer.
    pub horizontal_spacing: f32,
    /// Gap between rows, for the renderer.
    pub vertical_spacing: f32,
    /// Outer padding, for the renderer.
    pub padding: f32,
    /// Number of types whose change handlers are cached. Read by
    /// [`FormContext::from_config`](crate::FormContext::from_config).
    pub handler_cache_capacity: usize,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            strategy: LayoutStrategy::Paired,
            max_widget_width: 300.0,
            naming: FieldNaming::SplitCapitalizedWords,
            horizontal_spacing: 5.0,
            vertical_spacing: 5.0,
            padding: 10.0,
            handler_cache_capacity: DEFAULT_HANDLER_CACHE_CAPACITY,
        }
    }
}

impl FormConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses settings from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Set the layout strategy using builder pattern.
    pub fn with_strategy(mut self, strategy: LayoutStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_widget_width(mut self, width: f32) -> Self {
        self.max_widget_width = width;
        self
    }

    pub fn with_naming(mut self, naming: FieldNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Set both gaps at once.
    pub fn with_spacing(mut self, horizontal: f32, vertical: f32) -> Self {
        self.horizontal_spacing = horizontal;
        self.vertical_spacing = vertical;
        self
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_handler_cache_capacity(mut self, capacity: usize) -> Self {
        self.handler_cache_capacity = capacity;
        self
    }

    /// Label text for an attribute name.
    pub fn display_name(&self, name: &str) -> String {
        self.naming.apply(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormError;

    #[test]
    fn test_split_capitalized_words() {
        let naming = FieldNaming::SplitCapitalizedWords;
        assert_eq!(naming.apply("receiverPort"), "Receiver Port");
        assert_eq!(naming.apply("receiver_port"), "Receiver Port");
        assert_eq!(naming.apply("name"), "Name");
        assert_eq!(naming.apply("choiceForYou"), "Choice For You");
        assert_eq!(naming.apply("_hidden__twice"), "Hidden Twice");
        assert_eq!(naming.apply("ip"), "Ip");
        assert_eq!(naming.apply(""), "");
    }

    #[test]
    fn test_verbatim() {
        assert_eq!(FieldNaming::Verbatim.apply("receiverPort"), "receiverPort");
    }

    #[test]
    fn test_defaults() {
        let config = FormConfig::default();
        assert_eq!(config.strategy, LayoutStrategy::Paired);
        assert_eq!(config.max_widget_width, 300.0);
        assert_eq!(config.horizontal_spacing, 5.0);
        assert_eq!(config.vertical_spacing, 5.0);
        assert_eq!(config.padding, 10.0);
        assert_eq!(config.handler_cache_capacity, 15);
        assert_eq!(config.naming, FieldNaming::SplitCapitalizedWords);
    }

    #[test]
    fn test_builder() {
        let config = FormConfig::new()
            .with_strategy(LayoutStrategy::Stacked)
            .with_naming(FieldNaming::Verbatim)
            .with_spacing(2.0, 3.0)
            .with_padding(0.0)
            .with_max_widget_width(120.0)
            .with_handler_cache_capacity(4);
        assert_eq!(config.strategy, LayoutStrategy::Stacked);
        assert_eq!(config.display_name("someField"), "someField");
        assert_eq!(config.vertical_spacing, 3.0);
        assert_eq!(config.handler_cache_capacity, 4);
    }

    #[test]
    fn test_toml() {
        let config = FormConfig::from_toml_str("naming = \"verbatim\"\npadding = 4.0").unwrap();
        assert_eq!(config.naming, FieldNaming::Verbatim);
        assert_eq!(config.padding, 4.0);
        assert_eq!(config.strategy, LayoutStrategy::Paired);

        let err = FormConfig::from_toml_str("strategy = \"diagonal\"").unwrap_err();
        assert!(matches!(err, FormError::Config(_)));
    }
}
