//! # Handler Registry
//!
//! Ordered set of handler providers and the routing map derived from them.
//!
//! ## Overview
//!
//! The registry owns every registered [`EventHandler`] in registration order.
//! Each mutation rebuilds a brand-new [`HandlerMap`] from scratch and swaps it
//! in once it is complete, so readers either see the previous map or the new
//! one, never something in between.
//!
//! ## Key Features
//!
//! - **Identity-based membership**: a provider (the `Arc` allocation) is
//!   registered at most once; adding it again is a no-op
//! - **Deterministic ordering**: handlers run by provider registration order,
//!   then by declaration order within the provider; wildcard and typed
//!   handlers are merged by that order, not wildcard-first
//! - **Snapshot reads**: [`HandlerRegistry::snapshot`] hands out an immutable
//!   `Arc<HandlerMap>` that concurrent rebuilds never touch
//!
//! ## Usage
//!
//! ```rust
//! use dispatch_core::events::Event;
//! use dispatch_core::registry::{EventHandler, Handled, HandlerDeclarations, HandlerRegistry};
//! use std::any::TypeId;
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct Disconnected;
//! impl Event for Disconnected {}
//!
//! struct Reconnector;
//! impl EventHandler for Reconnector {
//!     fn declare_handlers(self: Arc<Self>, handlers: &mut HandlerDeclarations) {
//!         handlers.on::<Disconnected, _>("reconnect", |_| Ok(Handled::Consumed));
//!     }
//! }
//!
//! let registry = HandlerRegistry::new();
//! let provider: Arc<dyn EventHandler> = Arc::new(Reconnector);
//! assert!(registry.add(provider.clone()).unwrap());
//! assert!(!registry.add(provider).unwrap());
//! assert_eq!(registry.resolve(TypeId::of::<Disconnected>()).len(), 1);
//! ```

use super::handler::{DeclaredHandler, EventHandler, HandlerDeclarations, HandlerFn, HandlerKey};
use crate::constants::operations;
use crate::error::RegistryError;
use crate::logging::log_registry_operation;
use parking_lot::{Mutex, RwLock};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A callback bound to its position in the registry
#[derive(Clone)]
pub struct HandlerEntry {
    /// Provider position at the time of the last rebuild
    pub provider_index: usize,
    /// Position of the callback among its provider's declarations
    pub declaration_index: usize,
    pub provider_name: Arc<str>,
    pub handler_name: Arc<str>,
    pub callback: HandlerFn,
}

impl HandlerEntry {
    /// Ordering key used when merging wildcard and typed handlers
    pub fn order_key(&self) -> (usize, usize) {
        (self.provider_index, self.declaration_index)
    }
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("provider_index", &self.provider_index)
            .field("declaration_index", &self.declaration_index)
            .field("provider_name", &self.provider_name)
            .field("handler_name", &self.handler_name)
            .finish()
    }
}

/// Immutable routing table from handler key to ordered entries
#[derive(Debug, Default)]
pub struct HandlerMap {
    entries: HashMap<HandlerKey, Vec<HandlerEntry>>,
}

impl HandlerMap {
    fn build(providers: &[RegisteredProvider]) -> Self {
        let mut entries: HashMap<HandlerKey, Vec<HandlerEntry>> = HashMap::new();

        for (provider_index, provider) in providers.iter().enumerate() {
            for (declaration_index, declared) in provider.handlers.iter().enumerate() {
                entries.entry(declared.key).or_default().push(HandlerEntry {
                    provider_index,
                    declaration_index,
                    provider_name: Arc::clone(&provider.name),
                    handler_name: Arc::from(declared.name.as_str()),
                    callback: Arc::clone(&declared.callback),
                });
            }
        }

        Self { entries }
    }

    /// Ordered handlers for an event of the given concrete type.
    ///
    /// Wildcard and typed entries are merged by `(provider_index,
    /// declaration_index)`.
    pub fn resolve(&self, event_type: TypeId) -> Vec<HandlerEntry> {
        let wildcard = self.entries.get(&HandlerKey::Any).map(Vec::as_slice);
        let typed = self
            .entries
            .get(&HandlerKey::Type(event_type))
            .map(Vec::as_slice);

        let mut resolved: Vec<HandlerEntry> = wildcard
            .unwrap_or_default()
            .iter()
            .chain(typed.unwrap_or_default())
            .cloned()
            .collect();
        resolved.sort_by_key(HandlerEntry::order_key);
        resolved
    }

    /// Entries registered under exactly this key
    pub fn entries_for(&self, key: &HandlerKey) -> &[HandlerEntry] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Total number of entries across all keys
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct concrete event types with at least one handler
    pub fn typed_keys(&self) -> usize {
        self.entries
            .keys()
            .filter(|key| !key.is_wildcard())
            .count()
    }
}

/// A provider together with the declarations collected when it was added
struct RegisteredProvider {
    provider: Arc<dyn EventHandler>,
    name: Arc<str>,
    handlers: Vec<DeclaredHandler>,
}

impl RegisteredProvider {
    fn is(&self, other: &Arc<dyn EventHandler>) -> bool {
        same_provider(&self.provider, other)
    }
}

/// Provider identity is the allocation, not the vtable
fn same_provider(a: &Arc<dyn EventHandler>, b: &Arc<dyn EventHandler>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Registry of handler providers with an atomically rebuilt routing map
pub struct HandlerRegistry {
    /// Registered providers, in registration order; the lock serialises mutations
    providers: Mutex<Vec<RegisteredProvider>>,
    /// Current routing map; replaced wholesale after each rebuild
    map: RwLock<Arc<HandlerMap>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            providers: Mutex::new(Vec::new()),
            map: RwLock::new(Arc::new(HandlerMap::default())),
        }
    }

    /// Create a registry seeded with an initial provider list
    pub fn with_handlers<I>(handlers: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Arc<dyn EventHandler>>,
    {
        let registry = Self::new();
        for handler in handlers {
            registry.add(handler)?;
        }
        Ok(registry)
    }

    /// Register a provider.
    ///
    /// Returns `Ok(false)` when the provider is already registered. A provider
    /// whose declarations are unusable is rejected with
    /// [`RegistryError::InvalidHandler`].
    pub fn add(&self, provider: Arc<dyn EventHandler>) -> Result<bool, RegistryError> {
        // Declarations run without the providers lock held
        let name: Arc<str> = Arc::from(provider.handler_name());
        let mut declarations = HandlerDeclarations::new();
        Arc::clone(&provider).declare_handlers(&mut declarations);

        let mut providers = self.providers.lock();

        if providers.iter().any(|registered| registered.is(&provider)) {
            debug!(provider = %name, "Handler provider already registered");
            return Ok(false);
        }

        if let Err(reason) = declarations.validate() {
            warn!(provider = %name, reason = %reason, "Rejected handler provider");
            return Err(RegistryError::InvalidHandler {
                provider: name.to_string(),
                reason,
            });
        }

        let handler_count = declarations.len();
        providers.push(RegisteredProvider {
            provider,
            name: Arc::clone(&name),
            handlers: declarations.into_handlers(),
        });
        self.rebuild(&providers);

        log_registry_operation(
            operations::ADD,
            &name,
            providers.len() - 1,
            handler_count,
            "registered",
        );
        Ok(true)
    }

    /// Unregister a provider. Returns `false` when it was not registered.
    pub fn remove(&self, provider: &Arc<dyn EventHandler>) -> bool {
        let mut providers = self.providers.lock();

        let Some(position) = providers.iter().position(|registered| registered.is(provider))
        else {
            debug!(
                provider = provider.handler_name(),
                "Handler provider not registered, nothing to remove"
            );
            return false;
        };

        let removed = providers.remove(position);
        self.rebuild(&providers);

        log_registry_operation(
            operations::REMOVE,
            &removed.name,
            position,
            removed.handlers.len(),
            "unregistered",
        );
        true
    }

    /// Check whether this exact provider is registered
    pub fn contains(&self, provider: &Arc<dyn EventHandler>) -> bool {
        self.providers
            .lock()
            .iter()
            .any(|registered| registered.is(provider))
    }

    /// Ordered handlers for an event type, read from the current snapshot
    pub fn resolve(&self, event_type: TypeId) -> Vec<HandlerEntry> {
        self.snapshot().resolve(event_type)
    }

    /// The current routing map; unaffected by later mutations
    pub fn snapshot(&self) -> Arc<HandlerMap> {
        Arc::clone(&self.map.read())
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.lock().is_empty()
    }

    /// Registered provider names in registration order
    pub fn provider_names(&self) -> Vec<String> {
        self.providers
            .lock()
            .iter()
            .map(|registered| registered.name.to_string())
            .collect()
    }

    /// Get registry statistics
    pub fn stats(&self) -> RegistryStats {
        let providers = self.len();
        let map = self.snapshot();
        RegistryStats {
            providers,
            handler_entries: map.len(),
            typed_event_types: map.typed_keys(),
            wildcard_handlers: map.entries_for(&HandlerKey::Any).len(),
        }
    }

    /// Build a new map from `providers` and publish it.
    ///
    /// Called with the providers lock held; the write lock is only taken for
    /// the pointer swap.
    fn rebuild(&self, providers: &[RegisteredProvider]) {
        let map = Arc::new(HandlerMap::build(providers));
        debug!(
            providers = providers.len(),
            handler_entries = map.len(),
            "Rebuilt handler map"
        );
        *self.map.write() = map;
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("providers", &self.provider_names())
            .field("handler_entries", &self.snapshot().len())
            .finish()
    }
}

/// Statistics about registered handlers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub providers: usize,
    pub handler_entries: usize,
    pub typed_event_types: usize,
    pub wildcard_handlers: usize,
}
