//! Widget selection and widget state binding.
//!
//! [`select_kind`] maps an attribute to the widget that edits it. The first
//! rule that matches wins:
//!
//! 1. a non-empty option list gives a choice list over those strings,
//! 2. a numeric type gives a stepper,
//! 3. an enumeration gives a choice list over its variants,
//! 4. any other plain value gives a text field, single- or multi-line per the
//!    widget hint,
//! 5. a composite attribute gives a nested form.

use std::any::Any;

use crate::convert::ConverterRegistry;
use crate::error::{FormError, Result};
use crate::extract::AttributeDescriptor;
use crate::numeric::{NumericConfig, NumericValueModel};
use crate::schema::TextWidget;
use crate::value::{FieldShape, TypeKey, ValueKind};
use crate::widget::{Control, WidgetKind};

/// Chooses the widget kind for an attribute.
///
/// Fails with [`FormError::UnknownFieldKind`] when a plain value carries a
/// widget hint nobody recognizes.
pub fn select_kind(attribute: &AttributeDescriptor) -> Result<WidgetKind> {
    if !attribute.binding().options().is_empty() {
        return Ok(WidgetKind::ChoiceList);
    }
    match attribute.shape() {
        FieldShape::Value {
            kind: ValueKind::Numeric(_),
            ..
        } => Ok(WidgetKind::Stepper),
        FieldShape::Value {
            kind: ValueKind::Enum(_),
            ..
        } => Ok(WidgetKind::ChoiceList),
        FieldShape::Value { .. } => match attribute.binding().text_widget() {
            Ok(TextWidget::SingleLine) => Ok(WidgetKind::SingleLineText),
            Ok(TextWidget::MultiLine) => Ok(WidgetKind::MultiLineText),
            Err(hint) => Err(FormError::unknown_field_kind(attribute.name(), hint)),
        },
        FieldShape::Nested { .. } => Ok(WidgetKind::NestedForm),
    }
}

/// Builds the control for a value widget and returns it with its initial text.
pub(crate) fn build_control(
    kind: WidgetKind,
    attribute: &AttributeDescriptor,
    converters: &ConverterRegistry,
    current: Option<&dyn Any>,
) -> Result<(Control, String)> {
    let enum_meta = match attribute.shape() {
        FieldShape::Value {
            kind: ValueKind::Enum(meta),
            ..
        } => Some(*meta),
        _ => None,
    };
    if let Some(meta) = &enum_meta {
        converters.ensure_enum(meta);
    }

    let mut control = match kind {
        WidgetKind::ChoiceList => {
            let options = attribute.binding().options();
            if !options.is_empty() {
                Control::ChoiceList {
                    options: options.to_vec(),
                    selected: None,
                    variants: None,
                }
            } else if let Some(meta) = enum_meta {
                Control::ChoiceList {
                    options: meta
                        .variant_names()
                        .into_iter()
                        .map(str::to_owned)
                        .collect(),
                    selected: None,
                    variants: Some(meta),
                }
            } else {
                return Err(FormError::type_mismatch(
                    "an enumeration or an option list",
                    attribute.declared_type().name(),
                ));
            }
        }
        WidgetKind::Stepper => {
            let FieldShape::Value {
                kind: ValueKind::Numeric(numeric),
                ..
            } = attribute.shape()
            else {
                return Err(FormError::type_mismatch(
                    "a numeric type",
                    attribute.declared_type().name(),
                ));
            };
            let (minimum, maximum) = numeric.bounds();
            let config =
                NumericConfig::new(minimum, maximum).with_integral(numeric.is_integral());
            Control::Stepper {
                model: NumericValueModel::new(config, minimum)?,
                kind: *numeric,
            }
        }
        WidgetKind::SingleLineText => Control::Text { multi_line: false },
        WidgetKind::MultiLineText => Control::Text { multi_line: true },
        WidgetKind::NestedForm => {
            return Err(FormError::type_mismatch(
                "a value attribute",
                attribute.declared_type().name(),
            ));
        }
    };

    let text = sync_control(&mut control, attribute.declared_type(), converters, current)?;
    Ok((control, text))
}

/// Brings a control in line with the attribute's current value and returns
/// the text to display.
///
/// A stepper whose attribute lies outside its range displays the clamped
/// model value, so text and model agree. Values a stepper cannot hold at all
/// (NaN, infinities) are displayed as they are and leave the model alone.
pub(crate) fn sync_control(
    control: &mut Control,
    key: TypeKey,
    converters: &ConverterRegistry,
    current: Option<&dyn Any>,
) -> Result<String> {
    match control {
        Control::ChoiceList {
            options,
            selected,
            variants: Some(meta),
        } => {
            *selected = current.and_then(|value| meta.index_of(value));
            Ok(selected
                .and_then(|index| options.get(index).cloned())
                .unwrap_or_default())
        }
        Control::ChoiceList {
            options,
            selected,
            variants: None,
        } => {
            let text = converters.to_text(key, current)?;
            *selected = options.iter().position(|option| *option == text);
            Ok(text)
        }
        Control::Stepper { model, kind } => {
            let Some(number) = current.and_then(|value| kind.to_decimal(value)) else {
                return converters.to_text(key, current);
            };
            model.set_value(number);
            if model.value() == number {
                return converters.to_text(key, current);
            }
            // Out of range: show where the stepper sits, not the raw value.
            let held = converters.from_object(key, Some(Box::new(model.value())))?;
            converters.to_text(key, held.as_deref().map(|value| value as &dyn Any))
        }
        Control::Text { .. } => converters.to_text(key, current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    use rust_decimal::Decimal;

    use crate::extract::extract;
    use crate::schema::{Bindable, BindingMeta, FormMeta};
    use crate::value::{AnyValue, EnumMeta, FormEnum, FormField, downcast_value};

    #[derive(Clone, Debug, PartialEq)]
    enum Level {
        Low,
        High,
    }

    impl FormEnum for Level {
        fn variants() -> &'static [Self] {
            &[Level::Low, Level::High]
        }

        fn variant_name(&self) -> &'static str {
            match self {
                Level::Low => "Low",
                Level::High => "High",
            }
        }
    }

    impl FormField for Level {
        fn shape() -> FieldShape {
            FieldShape::Value {
                key: TypeKey::of::<Level>(),
                kind: ValueKind::Enum(EnumMeta::of::<Level>()),
            }
        }

        fn read(&self) -> Option<AnyValue> {
            Some(Box::new(self.clone()))
        }

        fn from_value(value: AnyValue) -> crate::error::Result<Self> {
            downcast_value(value)
        }
    }

    #[derive(Default)]
    struct Inner {
        flag: bool,
    }

    struct Sample {
        count: i32,
        limited: i32,
        level: Level,
        note: String,
        body: String,
        odd: String,
        ratio: f64,
        inner: Inner,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                count: 3,
                limited: 2,
                level: Level::High,
                note: "hi".into(),
                body: String::new(),
                odd: String::new(),
                ratio: 0.5,
                inner: Inner::default(),
            }
        }
    }

    impl Bindable for Inner {
        fn schema() -> &'static FormMeta {
            static META: OnceLock<FormMeta> = OnceLock::new();
            META.get_or_init(|| {
                FormMeta::builder::<Inner>()
                    .field("flag", BindingMeta::new(), |i: &Inner| &i.flag, |i: &mut Inner| &mut i.flag)
                    .build()
            })
        }

        fn form_meta(&self) -> &'static FormMeta {
            Self::schema()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl FormField for Inner {
        fn shape() -> FieldShape {
            FieldShape::Nested {
                key: TypeKey::of::<Inner>(),
                schema: <Inner as Bindable>::schema,
            }
        }

        fn read(&self) -> Option<AnyValue> {
            None
        }

        fn from_value(value: AnyValue) -> crate::error::Result<Self> {
            downcast_value(value)
        }

        fn nested(&self) -> Option<&dyn Bindable> {
            Some(self)
        }

        fn nested_mut(&mut self) -> Option<&mut dyn Bindable> {
            Some(self)
        }
    }

    impl Bindable for Sample {
        fn schema() -> &'static FormMeta {
            static META: OnceLock<FormMeta> = OnceLock::new();
            META.get_or_init(|| {
                FormMeta::builder::<Sample>()
                    .field("count", BindingMeta::new(), |s: &Sample| &s.count, |s: &mut Sample| &mut s.count)
                    .field(
                        "limited",
                        BindingMeta::new().with_options(["1", "2", "3"]),
                        |s: &Sample| &s.limited,
                        |s: &mut Sample| &mut s.limited,
                    )
                    .field("level", BindingMeta::new(), |s: &Sample| &s.level, |s: &mut Sample| &mut s.level)
                    .field("note", BindingMeta::new(), |s: &Sample| &s.note, |s: &mut Sample| &mut s.note)
                    .field(
                        "body",
                        BindingMeta::new().with_widget("text_area"),
                        |s: &Sample| &s.body,
                        |s: &mut Sample| &mut s.body,
                    )
                    .field(
                        "odd",
                        BindingMeta::new().with_widget("spinner_wheel"),
                        |s: &Sample| &s.odd,
                        |s: &mut Sample| &mut s.odd,
                    )
                    .field("ratio", BindingMeta::new(), |s: &Sample| &s.ratio, |s: &mut Sample| &mut s.ratio)
                    .field("inner", BindingMeta::new(), |s: &Sample| &s.inner, |s: &mut Sample| &mut s.inner)
                    .build()
            })
        }

        fn form_meta(&self) -> &'static FormMeta {
            Self::schema()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn attribute(name: &str) -> AttributeDescriptor {
        extract(Sample::schema())
            .unwrap()
            .into_iter()
            .find(|a| a.name() == name)
            .unwrap()
    }

    #[test]
    fn test_selection_rules() {
        assert_eq!(select_kind(&attribute("count")).unwrap(), WidgetKind::Stepper);
        assert_eq!(select_kind(&attribute("level")).unwrap(), WidgetKind::ChoiceList);
        assert_eq!(select_kind(&attribute("note")).unwrap(), WidgetKind::SingleLineText);
        assert_eq!(select_kind(&attribute("body")).unwrap(), WidgetKind::MultiLineText);
        assert_eq!(select_kind(&attribute("ratio")).unwrap(), WidgetKind::Stepper);
        assert_eq!(select_kind(&attribute("inner")).unwrap(), WidgetKind::NestedForm);
    }

    #[test]
    fn test_options_take_precedence_over_numeric() {
        assert_eq!(select_kind(&attribute("limited")).unwrap(), WidgetKind::ChoiceList);
    }

    #[test]
    fn test_unknown_hint_fails() {
        let err = select_kind(&attribute("odd")).unwrap_err();
        assert!(matches!(err, FormError::UnknownFieldKind { .. }));
    }

    #[test]
    fn test_option_list_initial_selection() {
        let sample = Sample::default();
        let limited = attribute("limited");
        let current = limited.read(&sample).unwrap();
        let (control, text) = build_control(
            WidgetKind::ChoiceList,
            &limited,
            &ConverterRegistry::new(),
            current.as_deref().map(|v| v as &dyn Any),
        )
        .unwrap();
        assert_eq!(text, "2");
        assert!(matches!(control, Control::ChoiceList { selected: Some(1), .. }));
    }

    #[test]
    fn test_enum_choice_list_registers_codec() {
        let converters = ConverterRegistry::new();
        let sample = Sample::default();
        let level = attribute("level");
        let current = level.read(&sample).unwrap();
        let (control, text) = build_control(
            WidgetKind::ChoiceList,
            &level,
            &converters,
            current.as_deref().map(|v| v as &dyn Any),
        )
        .unwrap();
        assert_eq!(text, "High");
        match control {
            Control::ChoiceList { options, selected, .. } => {
                assert_eq!(options, vec!["Low", "High"]);
                assert_eq!(selected, Some(1));
            }
            other => panic!("unexpected control {other:?}"),
        }
        assert!(converters.contains(TypeKey::of::<Level>()));
    }

    #[test]
    fn test_stepper_bounds() {
        let sample = Sample::default();
        let ratio = attribute("ratio");
        let current = ratio.read(&sample).unwrap();
        let (control, text) = build_control(
            WidgetKind::Stepper,
            &ratio,
            &ConverterRegistry::new(),
            current.as_deref().map(|v| v as &dyn Any),
        )
        .unwrap();
        assert_eq!(text, "0.5");
        let Control::Stepper { model, .. } = control else {
            panic!("expected a stepper");
        };
        assert_eq!(model.value(), Decimal::new(5, 1));
        assert_eq!(model.maximum(), Decimal::from(i32::MAX));
        assert!(!model.is_integral());
    }

    #[test]
    fn test_out_of_range_stepper_shows_clamped_value() {
        let converters = ConverterRegistry::new();
        let ratio = attribute("ratio");
        let (mut control, _) =
            build_control(WidgetKind::Stepper, &ratio, &converters, Some(&0.5f64)).unwrap();

        let text = sync_control(&mut control, ratio.declared_type(), &converters, Some(&1e12f64))
            .unwrap();
        assert_eq!(text, "2147483647");
        let Control::Stepper { model, .. } = &control else {
            panic!("expected a stepper");
        };
        assert_eq!(model.value(), Decimal::from(i32::MAX));

        let text = sync_control(&mut control, ratio.declared_type(), &converters, Some(&-3.25f64))
            .unwrap();
        assert_eq!(text, "-3.25");
    }
}
