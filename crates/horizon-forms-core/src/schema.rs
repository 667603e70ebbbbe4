//! Static per-type form schemas.
//!
//! A [`FormMeta`] lists the attributes a type exposes to form generation, in
//! declaration order, together with their binding metadata, an optional link
//! to a parent type whose attributes are inherited, and the local change
//! handlers declared on the type.
//!
//! Schemas are normally produced by `#[derive(Bindable)]`, which builds one
//! lazily per type and keeps it for the life of the process. They can also be
//! written by hand with [`FormMeta::builder`]:
//!
//! ```
//! use std::sync::OnceLock;
//! use horizon_forms_core::{Bindable, BindingMeta, FormMeta};
//!
//! struct Endpoint {
//!     host: String,
//!     port: u16,
//! }
//!
//! impl Bindable for Endpoint {
//!     fn schema() -> &'static FormMeta {
//!         static META: OnceLock<FormMeta> = OnceLock::new();
//!         META.get_or_init(|| {
//!             FormMeta::builder::<Endpoint>()
//!                 .field("host", BindingMeta::new(), |e: &Endpoint| &e.host, |e: &mut Endpoint| &mut e.host)
//!                 .field("port", BindingMeta::new(), |e: &Endpoint| &e.port, |e: &mut Endpoint| &mut e.port)
//!                 .build()
//!         })
//!     }
//!
//!     fn form_meta(&self) -> &'static FormMeta {
//!         Self::schema()
//!     }
//!
//!     fn as_any(&self) -> &dyn std::any::Any {
//!         self
//!     }
//!
//!     fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
//!         self
//!     }
//! }
//!
//! assert_eq!(Endpoint::schema().fields().len(), 2);
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{FormError, Result};
use crate::extract::AttributeDescriptor;
use crate::value::{AnyValue, FieldShape, FormField, TypeKey};

/// A type whose attributes can be bound to a generated form.
pub trait Bindable: Any + Send + Sync {
    /// The static schema of the implementing type.
    fn schema() -> &'static FormMeta
    where
        Self: Sized;

    /// The schema of this object's concrete type.
    fn form_meta(&self) -> &'static FormMeta;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Which text widget a plain-value attribute wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextWidget {
    SingleLine,
    MultiLine,
}

/// Per-attribute binding metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingMeta {
    editable: bool,
    options: Vec<String>,
    widget: Option<String>,
    tooltip: Option<String>,
}

impl Default for BindingMeta {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingMeta {
    /// Editable, no options, default widget, no tooltip.
    pub fn new() -> Self {
        Self {
            editable: true,
            options: Vec::new(),
            widget: None,
            tooltip: None,
        }
    }

    /// Set editability using builder pattern.
    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Mark the attribute read-only.
    pub fn read_only(self) -> Self {
        self.with_editable(false)
    }

    /// Restrict input to a fixed list of choices.
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Set the widget hint for plain-value attributes.
    pub fn with_widget(mut self, hint: impl Into<String>) -> Self {
        self.widget = Some(hint.into());
        self
    }

    /// Shorthand for the `multi_line` widget hint.
    pub fn multi_line(self) -> Self {
        self.with_widget("multi_line")
    }

    /// Set the tooltip text.
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn widget_hint(&self) -> Option<&str> {
        self.widget.as_deref()
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    /// Resolves the widget hint. Unrecognized hints are returned as the error.
    pub fn text_widget(&self) -> std::result::Result<TextWidget, &str> {
        let Some(hint) = self.widget.as_deref() else {
            return Ok(TextWidget::SingleLine);
        };
        match hint.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "single_line" | "text_field" => Ok(TextWidget::SingleLine),
            "multi_line" | "text_area" => Ok(TextWidget::MultiLine),
            _ => Err(hint),
        }
    }
}

/// Type-erased access to one attribute slot on its declaring type.
pub(crate) trait FieldAccess: Send + Sync {
    fn read(&self, owner: &dyn Bindable) -> Result<Option<AnyValue>>;

    fn write(&self, owner: &mut dyn Bindable, value: Option<AnyValue>) -> Result<()>;

    fn nested<'a>(&self, owner: &'a dyn Bindable) -> Result<Option<&'a dyn Bindable>>;

    fn nested_mut<'a>(&self, owner: &'a mut dyn Bindable) -> Result<Option<&'a mut dyn Bindable>>;
}

fn downcast_owner<'a, T: Bindable>(owner: &'a dyn Bindable, attribute: &str) -> Result<&'a T> {
    owner.as_any().downcast_ref::<T>().ok_or_else(|| {
        FormError::attribute_access(
            std::any::type_name::<T>(),
            attribute,
            "object is not of the declaring type",
        )
    })
}

fn downcast_owner_mut<'a, T: Bindable>(
    owner: &'a mut dyn Bindable,
    attribute: &str,
) -> Result<&'a mut T> {
    owner.as_any_mut().downcast_mut::<T>().ok_or_else(|| {
        FormError::attribute_access(
            std::any::type_name::<T>(),
            attribute,
            "object is not of the declaring type",
        )
    })
}

struct Accessor<T, F> {
    name: &'static str,
    get: fn(&T) -> &F,
    get_mut: fn(&mut T) -> &mut F,
}

impl<T: Bindable, F: FormField> FieldAccess for Accessor<T, F> {
    fn read(&self, owner: &dyn Bindable) -> Result<Option<AnyValue>> {
        let owner = downcast_owner::<T>(owner, self.name)?;
        Ok((self.get)(owner).read())
    }

    fn write(&self, owner: &mut dyn Bindable, value: Option<AnyValue>) -> Result<()> {
        let owner = downcast_owner_mut::<T>(owner, self.name)?;
        (self.get_mut)(owner).write(value)
    }

    fn nested<'a>(&self, owner: &'a dyn Bindable) -> Result<Option<&'a dyn Bindable>> {
        let owner = downcast_owner::<T>(owner, self.name)?;
        Ok((self.get)(owner).nested())
    }

    fn nested_mut<'a>(&self, owner: &'a mut dyn Bindable) -> Result<Option<&'a mut dyn Bindable>> {
        let owner = downcast_owner_mut::<T>(owner, self.name)?;
        Ok((self.get_mut)(owner).nested_mut())
    }
}

/// Metadata for one attribute declared on a type.
pub struct FieldMeta {
    name: &'static str,
    owner: TypeKey,
    shape: FieldShape,
    binding: BindingMeta,
    access: Box<dyn FieldAccess>,
}

impl FieldMeta {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The declaring type.
    pub fn owner(&self) -> TypeKey {
        self.owner
    }

    pub fn shape(&self) -> &FieldShape {
        &self.shape
    }

    pub fn binding(&self) -> &BindingMeta {
        &self.binding
    }

    pub(crate) fn access(&self) -> &dyn FieldAccess {
        self.access.as_ref()
    }
}

impl fmt::Debug for FieldMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMeta")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("shape", &self.shape)
            .field("binding", &self.binding)
            .finish()
    }
}

/// Projection from a type to the embedded parent it extends.
pub(crate) trait ParentAccess: Send + Sync {
    fn project<'a>(&self, owner: &'a dyn Bindable) -> Result<&'a dyn Bindable>;

    fn project_mut<'a>(&self, owner: &'a mut dyn Bindable) -> Result<&'a mut dyn Bindable>;
}

struct Projection<T, P> {
    name: &'static str,
    get: fn(&T) -> &P,
    get_mut: fn(&mut T) -> &mut P,
}

impl<T: Bindable, P: Bindable> ParentAccess for Projection<T, P> {
    fn project<'a>(&self, owner: &'a dyn Bindable) -> Result<&'a dyn Bindable> {
        let owner = downcast_owner::<T>(owner, self.name)?;
        let parent: &dyn Bindable = (self.get)(owner);
        Ok(parent)
    }

    fn project_mut<'a>(&self, owner: &'a mut dyn Bindable) -> Result<&'a mut dyn Bindable> {
        let owner = downcast_owner_mut::<T>(owner, self.name)?;
        let parent: &mut dyn Bindable = (self.get_mut)(owner);
        Ok(parent)
    }
}

/// Link from a type to the parent type whose attributes it inherits.
pub struct ParentLink {
    field: &'static str,
    schema: fn() -> &'static FormMeta,
    access: Box<dyn ParentAccess>,
}

impl ParentLink {
    /// Name of the field that embeds the parent.
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// The parent's schema.
    pub fn schema(&self) -> &'static FormMeta {
        (self.schema)()
    }

    pub(crate) fn access(&self) -> &dyn ParentAccess {
        self.access.as_ref()
    }
}

impl fmt::Debug for ParentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentLink")
            .field("field", &self.field)
            .field("parent", &self.schema().key())
            .finish()
    }
}

/// Converts a change handler's return value into a handler result.
///
/// Handlers may return `()` or `Result<(), E>` for any displayable `E`.
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> std::result::Result<(), String>;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> std::result::Result<(), String> {
        Ok(())
    }
}

impl<E: fmt::Display> IntoHandlerResult for std::result::Result<(), E> {
    fn into_handler_result(self) -> std::result::Result<(), String> {
        self.map_err(|e| e.to_string())
    }
}

/// A change handler declared on a bindable type.
pub trait LocalHandler: Send + Sync {
    /// Handler name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Calls the handler on `owner`.
    fn invoke(
        &self,
        owner: &mut dyn Bindable,
        attribute: &AttributeDescriptor,
    ) -> std::result::Result<(), String>;
}

type HandlerFn<T> = fn(&mut T, &AttributeDescriptor) -> std::result::Result<(), String>;

struct MethodHandler<T> {
    name: &'static str,
    call: HandlerFn<T>,
}

impl<T: Bindable> LocalHandler for MethodHandler<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn invoke(
        &self,
        owner: &mut dyn Bindable,
        attribute: &AttributeDescriptor,
    ) -> std::result::Result<(), String> {
        let owner = owner
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| format!("object is not a {}", std::any::type_name::<T>()))?;
        (self.call)(owner, attribute)
    }
}

/// The form schema of one type.
pub struct FormMeta {
    key: TypeKey,
    fields: Vec<FieldMeta>,
    parent: Option<ParentLink>,
    handlers: Vec<Arc<dyn LocalHandler>>,
}

impl FormMeta {
    /// Start building the schema for `T`.
    pub fn builder<T: Bindable>() -> FormMetaBuilder<T> {
        FormMetaBuilder {
            fields: Vec::new(),
            parent: None,
            handlers: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// The described type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Attributes declared directly on this type, in declaration order.
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    /// Looks up an attribute declared directly on this type.
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The inherited parent, if any.
    pub fn parent(&self) -> Option<&ParentLink> {
        self.parent.as_ref()
    }

    /// Change handlers declared on this type.
    pub fn handlers(&self) -> &[Arc<dyn LocalHandler>] {
        &self.handlers
    }
}

impl fmt::Debug for FormMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers: Vec<_> = self.handlers.iter().map(|h| h.name()).collect();
        f.debug_struct("FormMeta")
            .field("key", &self.key)
            .field("fields", &self.fields)
            .field("parent", &self.parent)
            .field("handlers", &handlers)
            .finish()
    }
}

/// Builder for [`FormMeta`].
pub struct FormMetaBuilder<T> {
    fields: Vec<FieldMeta>,
    parent: Option<ParentLink>,
    handlers: Vec<Arc<dyn LocalHandler>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Bindable> FormMetaBuilder<T> {
    /// Declare an attribute. Attributes keep the order they are declared in.
    pub fn field<F: FormField>(
        mut self,
        name: &'static str,
        binding: BindingMeta,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        self.fields.push(FieldMeta {
            name,
            owner: TypeKey::of::<T>(),
            shape: F::shape(),
            binding,
            access: Box::new(Accessor { name, get, get_mut }),
        });
        self
    }

    /// Inherit the attributes of the embedded parent `P`.
    pub fn extends<P: Bindable>(
        mut self,
        name: &'static str,
        get: fn(&T) -> &P,
        get_mut: fn(&mut T) -> &mut P,
    ) -> Self {
        self.parent = Some(ParentLink {
            field: name,
            schema: P::schema,
            access: Box::new(Projection { name, get, get_mut }),
        });
        self
    }

    /// Declare a local change handler.
    pub fn on_change(mut self, name: &'static str, call: HandlerFn<T>) -> Self {
        self.handlers.push(Arc::new(MethodHandler { name, call }));
        self
    }

    pub fn build(self) -> FormMeta {
        FormMeta {
            key: TypeKey::of::<T>(),
            fields: self.fields,
            parent: self.parent,
            handlers: self.handlers,
        }
    }
}
