//! Form generation and two-way binding.
//!
//! A [`FormGenerator`] turns a bound object into a [`Form`]: every attribute
//! becomes a label and a field widget, nested objects become embedded
//! sub-forms, and everything is placed on a [`FormGrid`].
//!
//! The renderer delivers user edits through [`Form::commit`]. Valid edits are
//! written to the bound object and announced to observers and change
//! handlers. Invalid text never reaches the object: the widget reverts to the
//! attribute's current value and the form emits
//! [`commit_rejected`](Form::commit_rejected).
//!
//! ```
//! use std::any::Any;
//! use std::sync::{Arc, OnceLock};
//!
//! use horizon_forms_core::{
//!     Bindable, BindingMeta, CommitOutcome, Edit, FormContext, FormGenerator, FormMeta,
//! };
//! use parking_lot::RwLock;
//!
//! #[derive(Default)]
//! struct Volume {
//!     level: u8,
//! }
//!
//! impl Bindable for Volume {
//!     fn schema() -> &'static FormMeta {
//!         static META: OnceLock<FormMeta> = OnceLock::new();
//!         META.get_or_init(|| {
//!             FormMeta::builder::<Volume>()
//!                 .field("level", BindingMeta::new(), |v: &Volume| &v.level, |v: &mut Volume| &mut v.level)
//!                 .build()
//!         })
//!     }
//!
//!     fn form_meta(&self) -> &'static FormMeta {
//!         Self::schema()
//!     }
//!
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//!
//!     fn as_any_mut(&mut self) -> &mut dyn Any {
//!         self
//!     }
//! }
//!
//! let volume = Arc::new(RwLock::new(Volume::default()));
//! let mut generator = FormGenerator::new(FormContext::new().shared());
//! let mut form = generator.generate(volume.clone()).unwrap();
//!
//! let id = form.widget_for("level").unwrap();
//! assert!(form.commit(id, Edit::Step(3)).unwrap().is_applied());
//! assert_eq!(volume.read().level, 3);
//!
//! let outcome = form.commit(id, Edit::Text("loud".into())).unwrap();
//! assert!(matches!(outcome, CommitOutcome::Rejected { .. }));
//! assert_eq!(form.widget(id).unwrap().text(), "3");
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use slotmap::SlotMap;

use crate::config::FormConfig;
use crate::context::FormContext;
use crate::convert::ConverterRegistry;
use crate::error::{FormError, HandlerError, ParseError, Result};
use crate::extract::{AttributeDescriptor, extract_for};
use crate::layout::{FormGrid, GridPosition, PlacedElement};
use crate::logging::targets;
use crate::schema::Bindable;
use crate::select::{build_control, select_kind, sync_control};
use crate::signal::Signal;
use crate::numeric::NumericValueModel;
use crate::value::{AnyValue, NumericKind, TypeKey};
use crate::widget::{Control, Edit, Element, FieldWidget, Label, WidgetId, WidgetKind};

/// A bound object shared between its owner and the forms editing it.
pub type SharedBindable = Arc<RwLock<dyn Bindable>>;

/// Builds forms for bound objects.
///
/// The generator remembers the last object it bound so the form can be
/// rebuilt with [`regenerate`](Self::regenerate), for instance after the
/// layout strategy changed.
pub struct FormGenerator {
    context: Arc<FormContext>,
    config: FormConfig,
    bound: Option<SharedBindable>,
}

impl FormGenerator {
    /// A generator with default settings.
    pub fn new(context: Arc<FormContext>) -> Self {
        Self {
            context,
            config: FormConfig::default(),
            bound: None,
        }
    }

    /// Set the settings using builder pattern.
    pub fn with_config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Replace the settings. Takes effect on the next generation.
    pub fn set_config(&mut self, config: FormConfig) {
        self.config = config;
    }

    pub fn context(&self) -> &Arc<FormContext> {
        &self.context
    }

    /// The object bound by the last successful generation.
    pub fn bound_object(&self) -> Option<&SharedBindable> {
        self.bound.as_ref()
    }

    /// Generates a form for `object` and binds it.
    pub fn generate<T: Bindable>(&mut self, object: Arc<RwLock<T>>) -> Result<Form> {
        let shared: SharedBindable = object;
        self.generate_shared(shared)
    }

    /// Generates a form for an already type-erased object.
    #[tracing::instrument(skip_all, target = "horizon_forms_core::generate", level = "trace")]
    pub fn generate_shared(&mut self, object: SharedBindable) -> Result<Form> {
        let mut widgets = SlotMap::with_key();
        let grid = {
            let guard = object.read();
            let mut builder = GridBuilder {
                converters: self.context.converters(),
                config: &self.config,
                widgets: &mut widgets,
            };
            builder.build(&*guard, &[])?
        };
        tracing::debug!(
            target: targets::GENERATE,
            bound = object.read().form_meta().key().name(),
            rows = grid.len(),
            widgets = widgets.len(),
            "form generated"
        );

        self.bound = Some(object.clone());
        Ok(Form {
            root: object,
            context: self.context.clone(),
            config: self.config.clone(),
            grid,
            widgets,
            display_changed: Signal::new(),
            commit_rejected: Signal::new(),
        })
    }

    /// Generates a fresh form for the last bound object with the current
    /// settings.
    pub fn regenerate(&mut self) -> Result<Form> {
        let object = self.bound.clone().ok_or(FormError::NoBoundObject)?;
        self.generate_shared(object)
    }
}

impl fmt::Debug for FormGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormGenerator")
            .field("config", &self.config)
            .field("bound", &self.bound.is_some())
            .finish()
    }
}

struct GridBuilder<'a> {
    converters: &'a ConverterRegistry,
    config: &'a FormConfig,
    widgets: &'a mut SlotMap<WidgetId, FieldWidget>,
}

impl GridBuilder<'_> {
    /// Lays out `object`, reached from the bound object through `path`.
    fn build(&mut self, object: &dyn Bindable, path: &[AttributeDescriptor]) -> Result<FormGrid> {
        let mut grid = FormGrid::new(self.config.strategy);

        for attribute in extract_for(object)? {
            let kind = select_kind(&attribute)?;
            let display_name = self.config.display_name(attribute.name());

            if kind == WidgetKind::NestedForm {
                grid.add_row(
                    Element::Label(Label::new(format!("{display_name}:"), &attribute)),
                    Element::Separator,
                );
                if let Some(child) = attribute.nested(object)? {
                    let mut child_path = path.to_vec();
                    child_path.push(attribute.clone());
                    let child_grid = self.build(child, &child_path)?;
                    grid.absorb(child_grid);
                } else {
                    tracing::trace!(target: targets::GENERATE, attribute = %attribute, "nested object absent");
                }
                grid.add_separator();
                continue;
            }

            let current = attribute.read(object)?;
            let (control, text) = build_control(kind, &attribute, self.converters, erase(&current))?;
            let label = Label::new(display_name, &attribute);
            let id = self.widgets.insert(FieldWidget {
                editable: attribute.binding().is_editable(),
                tooltip: attribute.binding().tooltip().map(str::to_owned),
                max_width: self.config.max_widget_width,
                path: path.iter().cloned().collect(),
                attribute,
                control,
                text,
            });
            grid.add_row(Element::Label(label), Element::Field(id));
        }

        Ok(grid)
    }
}

fn erase(value: &Option<AnyValue>) -> Option<&dyn Any> {
    value.as_deref().map(|value| value as &dyn Any)
}

fn resolve_owner<'a>(
    root: &'a dyn Bindable,
    path: &[AttributeDescriptor],
) -> Result<&'a dyn Bindable> {
    let mut current = root;
    for step in path {
        current = step.nested(current)?.ok_or_else(|| absent(step))?;
    }
    Ok(current)
}

fn resolve_owner_mut<'a>(
    root: &'a mut dyn Bindable,
    path: &[AttributeDescriptor],
) -> Result<&'a mut dyn Bindable> {
    let mut current = root;
    for step in path {
        current = step.nested_mut(current)?.ok_or_else(|| absent(step))?;
    }
    Ok(current)
}

fn absent(step: &AttributeDescriptor) -> FormError {
    FormError::attribute_access(step.owner().name(), step.name(), "nested object is absent")
}

/// A widget's displayed text changed.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayUpdate {
    pub widget: WidgetId,
    pub text: String,
}

/// An edit could not be parsed and was discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedEdit {
    pub widget: WidgetId,
    pub error: ParseError,
    /// The text the widget went back to.
    pub restored_text: String,
}

/// The result of delivering one edit.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// The value was written and listeners were notified.
    Applied { handler_errors: Vec<HandlerError> },
    /// The input did not parse; the attribute is unchanged.
    Rejected {
        error: ParseError,
        restored_text: String,
    },
    /// The widget is read-only.
    Ignored,
}

impl CommitOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// A generated form bound to one object.
pub struct Form {
    root: SharedBindable,
    context: Arc<FormContext>,
    config: FormConfig,
    grid: FormGrid,
    widgets: SlotMap<WidgetId, FieldWidget>,
    /// Emitted when a widget's displayed text changes.
    pub display_changed: Signal<DisplayUpdate>,
    /// Emitted when an edit is rejected.
    pub commit_rejected: Signal<RejectedEdit>,
}

impl Form {
    /// Every placed element in insertion order.
    pub fn elements(&self) -> Vec<PlacedElement<'_>> {
        self.grid.elements()
    }

    pub fn grid(&self) -> &FormGrid {
        &self.grid
    }

    /// Where the next row would go; one past the last row.
    pub fn cursor(&self) -> GridPosition {
        self.grid.cursor()
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<FormContext> {
        &self.context
    }

    pub fn bound_object(&self) -> &SharedBindable {
        &self.root
    }

    pub fn widget(&self, id: WidgetId) -> Option<&FieldWidget> {
        self.widgets.get(id)
    }

    /// Field widgets in layout order.
    pub fn widgets(&self) -> impl Iterator<Item = (WidgetId, &FieldWidget)> + '_ {
        self.widget_ids()
            .into_iter()
            .filter_map(move |id| self.widgets.get(id).map(|widget| (id, widget)))
    }

    /// The first widget, in layout order, bound to an attribute called `name`.
    pub fn widget_for(&self, name: &str) -> Option<WidgetId> {
        self.widgets()
            .find(|(_, widget)| widget.attribute().name() == name)
            .map(|(id, _)| id)
    }

    /// The widget reached by following composite attribute names from the
    /// bound object, e.g. `["data", "port"]`.
    pub fn widget_at(&self, path: &[&str]) -> Option<WidgetId> {
        let (name, parents) = path.split_last()?;
        self.widgets()
            .find(|(_, widget)| {
                widget.attribute().name() == *name
                    && widget.path.len() == parents.len()
                    && widget
                        .path
                        .iter()
                        .zip(parents)
                        .all(|(step, parent)| step.name() == *parent)
            })
            .map(|(id, _)| id)
    }

    fn widget_ids(&self) -> Vec<WidgetId> {
        self.grid
            .rows()
            .filter_map(|row| row.field().and_then(Element::widget_id))
            .collect()
    }

    /// Delivers an edit from the renderer.
    ///
    /// Only structural problems are returned as errors. Unparseable input
    /// yields [`CommitOutcome::Rejected`].
    #[tracing::instrument(skip(self, edit), target = "horizon_forms_core::commit", level = "trace")]
    pub fn commit(&mut self, id: WidgetId, edit: Edit) -> Result<CommitOutcome> {
        let widget = self.widgets.get(id).ok_or(FormError::UnknownWidget)?;
        if !widget.editable {
            tracing::trace!(target: targets::COMMIT, attribute = %widget.attribute, "read-only widget ignores edit");
            return Ok(CommitOutcome::Ignored);
        }
        let attribute = widget.attribute.clone();
        let path = widget.path.clone();

        let value = match candidate(
            self.context.converters(),
            &widget.control,
            attribute.declared_type(),
            edit,
        ) {
            Ok(value) => value,
            Err(FormError::Parse(error)) => return self.reject(id, error),
            Err(other) => return Err(other),
        };

        let root = self.root.clone();
        let written = {
            let mut guard = root.write();
            let owner = resolve_owner_mut(&mut *guard, &path)?;
            attribute
                .write(&mut *owner, value)
                .map(|()| self.context.notify(&attribute, owner))
        };
        let report = match written {
            Ok(report) => report,
            Err(FormError::Parse(error)) => return self.reject(id, error),
            Err(other) => return Err(other),
        };
        tracing::trace!(
            target: targets::COMMIT,
            attribute = %attribute,
            handler_errors = report.handler_errors.len(),
            "edit applied"
        );

        self.sync_widget(id)?;
        self.announce(id);
        // Handlers may have changed sibling attributes.
        for other in self.widget_ids().into_iter().filter(|other| *other != id) {
            match self.sync_widget(other) {
                Ok(true) => self.announce(other),
                Ok(false) => {}
                Err(error) => {
                    tracing::debug!(target: targets::COMMIT, %error, "widget not refreshed")
                }
            }
        }

        Ok(CommitOutcome::Applied {
            handler_errors: report.handler_errors,
        })
    }

    /// Re-reads every bound attribute and updates the widgets. Returns the
    /// number of widgets whose text changed.
    pub fn refresh(&mut self) -> Result<usize> {
        let mut changed = 0;
        for id in self.widget_ids() {
            if self.sync_widget(id)? {
                self.announce(id);
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn reject(&mut self, id: WidgetId, error: ParseError) -> Result<CommitOutcome> {
        self.sync_widget(id)?;
        let restored_text = self
            .widgets
            .get(id)
            .map(|widget| widget.text.clone())
            .unwrap_or_default();
        tracing::warn!(
            target: targets::COMMIT,
            error = %error,
            restored = %restored_text,
            "edit rejected"
        );

        self.display_changed.emit(DisplayUpdate {
            widget: id,
            text: restored_text.clone(),
        });
        self.commit_rejected.emit(RejectedEdit {
            widget: id,
            error: error.clone(),
            restored_text: restored_text.clone(),
        });
        Ok(CommitOutcome::Rejected {
            error,
            restored_text,
        })
    }

    fn announce(&self, id: WidgetId) {
        if let Some(widget) = self.widgets.get(id) {
            self.display_changed.emit(DisplayUpdate {
                widget: id,
                text: widget.text.clone(),
            });
        }
    }

    /// Brings one widget in line with its attribute. Returns `true` if the
    /// displayed text changed.
    fn sync_widget(&mut self, id: WidgetId) -> Result<bool> {
        let root = self.root.clone();
        let guard = root.read();
        let widget = self.widgets.get_mut(id).ok_or(FormError::UnknownWidget)?;
        let owner = resolve_owner(&*guard, &widget.path)?;
        let current = widget.attribute.read(owner)?;
        let text = sync_control(
            &mut widget.control,
            widget.attribute.declared_type(),
            self.context.converters(),
            erase(&current),
        )?;
        let changed = widget.text != text;
        widget.text = text;
        Ok(changed)
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("config", &self.config)
            .field("rows", &self.grid.len())
            .field("widgets", &self.widgets.len())
            .finish()
    }
}

/// Turns an edit into a value of the declared type `key`.
fn candidate(
    converters: &ConverterRegistry,
    control: &Control,
    key: TypeKey,
    edit: Edit,
) -> Result<Option<AnyValue>> {
    let widget = control.kind().name();
    let edit_name = edit.name();
    match (control, edit) {
        (Control::Stepper { model, .. }, Edit::Step(steps)) => {
            let mut model = model.clone();
            model.step_by(steps);
            converters.from_object(key, Some(Box::new(model.value())))
        }
        (Control::Stepper { model, kind }, Edit::Text(text)) => {
            match converters.from_text(key, Some(&text))? {
                Some(value) => within_model(converters, model, *kind, key, value, Some(&text)),
                None => Ok(None),
            }
        }
        (Control::Stepper { model, kind }, Edit::Value(value)) => {
            match converters.from_object(key, Some(value))? {
                Some(value) => within_model(converters, model, *kind, key, value, None),
                None => Ok(None),
            }
        }
        (
            Control::ChoiceList {
                options, variants, ..
            },
            Edit::Select(index),
        ) => {
            let not_a_choice =
                || ParseError::new(key.name(), index.to_string(), "no choice at this index");
            match variants {
                Some(meta) => meta.value_at(index).map(Some).ok_or_else(|| not_a_choice().into()),
                None => {
                    let option = options.get(index).ok_or_else(not_a_choice)?;
                    converters.from_text(key, Some(option))
                }
            }
        }
        (
            Control::ChoiceList {
                options, variants, ..
            },
            Edit::SelectText(text),
        ) => {
            let Some(index) = options.iter().position(|option| *option == text) else {
                return Err(ParseError::new(key.name(), text, "not one of the choices").into());
            };
            match variants {
                Some(meta) => Ok(meta.value_at(index)),
                None => converters.from_text(key, Some(&text)),
            }
        }
        (Control::Text { .. }, Edit::Text(text)) => converters.from_text(key, Some(&text)),
        (_, Edit::Value(value)) => converters.from_object(key, Some(value)),
        _ => Err(FormError::UnsupportedEdit {
            widget,
            edit: edit_name,
        }),
    }
}

/// Holds a parsed stepper value to the model's range. Values the model
/// cannot represent (NaN, infinities) are rejected.
fn within_model(
    converters: &ConverterRegistry,
    model: &NumericValueModel,
    kind: NumericKind,
    key: TypeKey,
    value: AnyValue,
    input: Option<&str>,
) -> Result<Option<AnyValue>> {
    let Some(number) = kind.to_decimal(&*value) else {
        let input = match input {
            Some(text) => text.to_owned(),
            None => converters.to_text(key, Some(&*value as &dyn Any))?,
        };
        return Err(ParseError::new(key.name(), input, "not a number the stepper can hold").into());
    };
    let mut model = model.clone();
    model.set_value(number);
    if model.value() == number {
        Ok(Some(value))
    } else {
        converters.from_object(key, Some(Box::new(model.value())))
    }
}

static_assertions::assert_impl_all!(Form: Send, Sync);
static_assertions::assert_impl_all!(FormGenerator: Send, Sync);
