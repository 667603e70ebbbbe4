//! Horizon Forms - editable, two-way bound forms generated from annotated types.
//!
//! This is the main umbrella crate that re-exports the core systems and the
//! derive macros.
//!
//! # Example
//!
//! ```
//! use horizon_forms::prelude::*;
//!
//! #[derive(FormEnum, Clone, PartialEq, Debug)]
//! #[form(crate = "horizon_forms")]
//! enum Protocol {
//!     Tcp,
//!     Udp,
//! }
//!
//! #[derive(Bindable)]
//! #[form(crate = "horizon_forms")]
//! struct Listener {
//!     #[form(tooltip = "Port to listen on")]
//!     port: u16,
//!
//!     #[form]
//!     protocol: Protocol,
//! }
//!
//! # fn main() -> horizon_forms::Result<()> {
//! let listener = horizon_forms::bind(Listener { port: 80, protocol: Protocol::Tcp });
//! let mut generator = FormGenerator::new(FormContext::new().shared());
//! let mut form = generator.generate(listener.clone())?;
//!
//! if let Some(port) = form.widget_for("port") {
//!     form.commit(port, Edit::Text("8080".into()))?;
//! }
//! assert_eq!(listener.read().port, 8080);
//! # Ok(())
//! # }
//! ```
//!
//! The derives refer to `horizon_forms_core` by default. Crates that only
//! depend on this one point them here with `#[form(crate = "horizon_forms")]`.

use std::sync::Arc;

pub use horizon_forms_core::*;
pub use horizon_forms_macros::*;

pub use parking_lot::RwLock;

pub mod prelude;

/// Wraps `object` the way [`FormGenerator::generate`] expects it.
pub fn bind<T: Bindable>(object: T) -> Arc<RwLock<T>> {
    Arc::new(RwLock::new(object))
}
