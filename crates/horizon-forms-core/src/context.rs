//! Shared state for form generation and editing.

use std::fmt;
use std::sync::Arc;

use crate::config::FormConfig;
use crate::convert::ConverterRegistry;
use crate::extract::AttributeDescriptor;
use crate::notify::{self, ChangeObserver, ChangeReport, HandlerCache, ObserverId, ObserverRegistry};
use crate::schema::Bindable;

/// Converters, global observers and the handler cache used by every form
/// generated from it.
///
/// Share one context between generators with `Arc`.
pub struct FormContext {
    converters: ConverterRegistry,
    observers: ObserverRegistry,
    handlers: HandlerCache,
}

impl Default for FormContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FormContext {
    /// A context with the built-in converters and the default handler cache.
    pub fn new() -> Self {
        Self::with_handler_capacity(notify::DEFAULT_HANDLER_CACHE_CAPACITY)
    }

    /// A context whose handler cache holds at most `capacity` types.
    pub fn with_handler_capacity(capacity: usize) -> Self {
        Self {
            converters: ConverterRegistry::new(),
            observers: ObserverRegistry::new(),
            handlers: HandlerCache::new(capacity),
        }
    }

    /// A context sized by `config`'s handler cache capacity.
    pub fn from_config(config: &FormConfig) -> Self {
        Self::with_handler_capacity(config.handler_cache_capacity)
    }

    /// Wrap in an `Arc` for sharing.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }

    pub fn handlers(&self) -> &HandlerCache {
        &self.handlers
    }

    /// Registers a global observer.
    pub fn register_observer<O: ChangeObserver + 'static>(&self, observer: O) -> ObserverId {
        self.observers.register(observer)
    }

    /// Removes a global observer.
    pub fn deregister_observer(&self, id: ObserverId) -> bool {
        self.observers.deregister(id)
    }

    /// Announces that `attribute` changed on `owner`.
    pub fn notify(&self, attribute: &AttributeDescriptor, owner: &mut dyn Bindable) -> ChangeReport {
        notify::dispatch(&self.observers, &self.handlers, attribute, owner)
    }
}

impl fmt::Debug for FormContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormContext")
            .field("converters", &self.converters)
            .field("observers", &self.observers)
            .field("handlers", &self.handlers)
            .finish()
    }
}

static_assertions::assert_impl_all!(FormContext: Send, Sync);
