//! Core systems for Horizon Forms.
//!
//! This crate turns an annotated object into an editable, two-way bound form:
//!
//! - **Schema**: per-type attribute metadata, usually produced by
//!   `#[derive(Bindable)]`
//! - **Extraction**: ordered attribute lists across the whole parent chain
//! - **Conversion**: a registry of bidirectional text codecs per type
//! - **Numeric Model**: bounded, steppable numeric state with wraparound
//! - **Widget Selection**: one widget kind per attribute, bound to its value
//! - **Layout**: a cursor-driven grid that splices nested sub-forms in place
//! - **Notification**: global observers and per-type change handlers
//!
//! # Example
//!
//! ```
//! use std::any::Any;
//! use std::sync::{Arc, OnceLock};
//!
//! use horizon_forms_core::{Bindable, BindingMeta, Edit, FormContext, FormGenerator, FormMeta};
//! use parking_lot::RwLock;
//!
//! struct Profile {
//!     name: String,
//!     bio: String,
//! }
//!
//! impl Bindable for Profile {
//!     fn schema() -> &'static FormMeta {
//!         static META: OnceLock<FormMeta> = OnceLock::new();
//!         META.get_or_init(|| {
//!             FormMeta::builder::<Profile>()
//!                 .field("name", BindingMeta::new(), |p: &Profile| &p.name, |p: &mut Profile| &mut p.name)
//!                 .field("bio", BindingMeta::new().multi_line(), |p: &Profile| &p.bio, |p: &mut Profile| &mut p.bio)
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
//! let context = FormContext::new().shared();
//! let profile = Arc::new(RwLock::new(Profile { name: "Ada".into(), bio: String::new() }));
//!
//! let mut generator = FormGenerator::new(context);
//! let mut form = generator.generate(profile.clone()).unwrap();
//! assert_eq!(form.elements().len(), 4);
//!
//! let name = form.widget_for("name").unwrap();
//! form.commit(name, Edit::Text("Grace".into())).unwrap();
//! assert_eq!(profile.read().name, "Grace");
//! ```

mod config;
mod context;
pub mod convert;
mod error;
pub mod extract;
mod form;
pub mod layout;
pub mod logging;
pub mod notify;
pub mod numeric;
pub mod schema;
pub mod select;
pub mod signal;
pub mod value;
pub mod widget;

pub use config::{FieldNaming, FormConfig};
pub use context::FormContext;
pub use convert::{BoolCodec, Codec, ConverterRegistry, EnumCodec, FnCodec, ParseCodec};
pub use error::{FormError, HandlerError, ParseError, Result};
pub use extract::{AttributeDescriptor, extract, extract_for};
pub use form::{
    CommitOutcome, DisplayUpdate, Form, FormGenerator, RejectedEdit, SharedBindable,
};
pub use layout::{FormGrid, FormRow, GridPosition, LayoutStrategy, PlacedElement};
pub use logging::{FormDebug, FormFormatOptions};
pub use notify::{
    CacheStats, ChangeObserver, ChangeReport, DEFAULT_HANDLER_CACHE_CAPACITY, HandlerCache,
    ObserverId, ObserverRegistry,
};
pub use numeric::{NumericConfig, NumericValueModel};
pub use schema::{
    Bindable, BindingMeta, FieldMeta, FormMeta, FormMetaBuilder, IntoHandlerResult, LocalHandler,
    ParentLink, TextWidget,
};
pub use select::select_kind;
pub use signal::{ConnectionId, Signal};
pub use value::{AnyValue, EnumMeta, FieldShape, FormEnum, FormField, NumericKind, TypeKey, ValueKind};
pub use widget::{Control, Edit, Element, FieldWidget, Label, WidgetId, WidgetKind};

// Re-export the decimal type used by numeric models and `Decimal` attributes.
pub use rust_decimal::{self, Decimal};
