//! Change notification after a successful commit.
//!
//! Two kinds of listeners hear about attribute changes:
//!
//! - **Global observers**, registered on the [`ObserverRegistry`], receive the
//!   attribute and the object that owns it. They always run first.
//! - **Local handlers**, declared on the owning object's type, receive only
//!   the attribute. The handler list of each type is resolved once and kept in
//!   a bounded [`HandlerCache`].
//!
//! A failing local handler is logged and reported. It never undoes the write
//! and never stops the remaining handlers.

use std::any::TypeId;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::HandlerError;
use crate::extract::AttributeDescriptor;
use crate::logging::targets;
use crate::schema::{Bindable, FormMeta, LocalHandler};

/// Default number of types whose handler lists are cached.
pub const DEFAULT_HANDLER_CACHE_CAPACITY: usize = 15;

new_key_type! {
    /// Identifies a registered global observer.
    pub struct ObserverId;
}

/// A global change observer.
pub trait ChangeObserver: Send + Sync {
    fn attribute_changed(&self, attribute: &AttributeDescriptor, owner: &dyn Bindable);
}

impl<F> ChangeObserver for F
where
    F: Fn(&AttributeDescriptor, &dyn Bindable) + Send + Sync,
{
    fn attribute_changed(&self, attribute: &AttributeDescriptor, owner: &dyn Bindable) {
        self(attribute, owner)
    }
}

#[derive(Default)]
struct Observers {
    slots: SlotMap<ObserverId, Arc<dyn ChangeObserver>>,
    order: Vec<ObserverId>,
}

/// Global observers, called in registration order.
#[derive(Default)]
pub struct ObserverRegistry {
    inner: Mutex<Observers>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer.
    pub fn register<O: ChangeObserver + 'static>(&self, observer: O) -> ObserverId {
        let mut inner = self.inner.lock();
        let id = inner.slots.insert(Arc::new(observer));
        inner.order.push(id);
        id
    }

    /// Removes an observer. Returns `true` if it was registered.
    pub fn deregister(&self, id: ObserverId) -> bool {
        let mut inner = self.inner.lock();
        if inner.slots.remove(id).is_none() {
            return false;
        }
        inner.order.retain(|other| *other != id);
        true
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.slots.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current observers in registration order.
    pub fn snapshot(&self) -> Vec<Arc<dyn ChangeObserver>> {
        let inner = self.inner.lock();
        inner
            .order
            .iter()
            .filter_map(|id| inner.slots.get(*id).cloned())
            .collect()
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.len())
            .finish()
    }
}

/// Handler cache hit/miss statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

type HandlerList = Arc<[Arc<dyn LocalHandler>]>;

/// LRU cache of per-type local handler lists.
pub struct HandlerCache {
    inner: Mutex<LruCache<TypeId, HandlerList>>,
    stats: Mutex<CacheStats>,
}

impl Default for HandlerCache {
    fn default() -> Self {
        Self::new(DEFAULT_HANDLER_CACHE_CAPACITY)
    }
}

impl HandlerCache {
    /// A cache holding at most `capacity` types. A capacity of zero is
    /// treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// The handlers declared on the type described by `schema`.
    pub fn resolve(&self, schema: &'static FormMeta) -> HandlerList {
        let key = schema.key().id();
        let mut cache = self.inner.lock();
        if let Some(handlers) = cache.get(&key) {
            self.stats.lock().hits += 1;
            return handlers.clone();
        }

        let handlers: HandlerList = schema.handlers().iter().cloned().collect();
        tracing::debug!(
            target: targets::NOTIFY,
            owner = schema.key().name(),
            handlers = handlers.len(),
            "cached change handlers"
        );
        cache.put(key, handlers.clone());
        self.stats.lock().misses += 1;
        handlers
    }

    /// Returns `true` if the type's handlers are cached. Does not touch
    /// recency.
    pub fn contains(&self, schema: &FormMeta) -> bool {
        self.inner.lock().contains(&schema.key().id())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.lock()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl fmt::Debug for HandlerCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("stats", &self.stats())
            .finish()
    }
}

/// What happened during one notification.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeReport {
    pub observers_notified: usize,
    pub handlers_invoked: usize,
    pub handler_errors: Vec<HandlerError>,
}

impl ChangeReport {
    pub fn is_clean(&self) -> bool {
        self.handler_errors.is_empty()
    }
}

/// Runs the notification sequence for one written attribute.
///
/// `owner` is the object that holds the attribute: the nested object for
/// attributes of a sub-form, the bound object for inherited ones.
pub fn dispatch(
    observers: &ObserverRegistry,
    handlers: &HandlerCache,
    attribute: &AttributeDescriptor,
    owner: &mut dyn Bindable,
) -> ChangeReport {
    let mut report = ChangeReport::default();

    for observer in observers.snapshot() {
        observer.attribute_changed(attribute, &*owner);
        report.observers_notified += 1;
    }

    let schema = owner.form_meta();
    for handler in handlers.resolve(schema).iter() {
        report.handlers_invoked += 1;
        if let Err(message) = handler.invoke(owner, attribute) {
            let error = HandlerError {
                handler: handler.name().to_owned(),
                owner: schema.key().name().to_owned(),
                attribute: attribute.name().to_owned(),
                message,
            };
            tracing::warn!(target: targets::NOTIFY, error = %error, "change handler failed");
            report.handler_errors.push(error);
        }
    }

    tracing::trace!(
        target: targets::NOTIFY,
        attribute = attribute.name(),
        observers = report.observers_notified,
        handlers = report.handlers_invoked,
        "change dispatched"
    );
    report
}
