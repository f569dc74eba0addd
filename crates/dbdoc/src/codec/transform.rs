//! Per-kind transformation hooks.
//!
//! A [`Transformers`] value is an immutable pair of tables (encode-direction
//! and decode-direction) from [`ValueKind`] to a hook. A
//! [`TransformerRegistry`] publishes successive `Transformers` snapshots
//! through an [`ArcSwap`]: readers load one snapshot per encode/decode call
//! without locking, writers replace it with read-copy-update, so a reader
//! never sees half of an update.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use lazy_static::lazy_static;
use rustc_hash::FxHashMap;

use crate::error::HookError;
use crate::model::{Value, ValueKind};

/// A caller-supplied value transformation.
pub type Transformer = Arc<dyn Fn(Value) -> Result<Value, HookError> + Send + Sync>;

lazy_static! {
    static ref GLOBAL: Arc<TransformerRegistry> = Arc::new(TransformerRegistry::new());
}

/// Returns the process-wide registry.
pub fn global() -> Arc<TransformerRegistry> {
    Arc::clone(&GLOBAL)
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Immutable encode/decode hook tables.
#[derive(Clone, Default)]
pub struct Transformers {
    encode: FxHashMap<ValueKind, Transformer>,
    decode: FxHashMap<ValueKind, Transformer>,
}

impl Transformers {
    /// Creates empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no hook is registered in either direction.
    pub fn is_empty(&self) -> bool {
        self.encode.is_empty() && self.decode.is_empty()
    }

    /// Adds an encode hook, builder style.
    pub fn with_encode_hook<F>(mut self, kind: ValueKind, hook: F) -> Self
    where
        F: Fn(Value) -> Result<Value, HookError> + Send + Sync + 'static,
    {
        self.set_encode_hook(kind, Arc::new(hook));
        self
    }

    /// Adds a decode hook, builder style.
    pub fn with_decode_hook<F>(mut self, kind: ValueKind, hook: F) -> Self
    where
        F: Fn(Value) -> Result<Value, HookError> + Send + Sync + 'static,
    {
        self.set_decode_hook(kind, Arc::new(hook));
        self
    }

    pub fn set_encode_hook(&mut self, kind: ValueKind, hook: Transformer) {
        self.encode.insert(kind, hook);
    }

    pub fn set_decode_hook(&mut self, kind: ValueKind, hook: Transformer) {
        self.decode.insert(kind, hook);
    }

    pub fn encode_hook(&self, kind: ValueKind) -> Option<&Transformer> {
        self.encode.get(&kind)
    }

    pub fn decode_hook(&self, kind: ValueKind) -> Option<&Transformer> {
        self.decode.get(&kind)
    }
}

impl fmt::Debug for Transformers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut encode: Vec<_> = self.encode.keys().copied().collect();
        let mut decode: Vec<_> = self.decode.keys().copied().collect();
        encode.sort();
        decode.sort();
        f.debug_struct("Transformers")
            .field("encode", &encode)
            .field("decode", &decode)
            .finish()
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Shared, mutable holder of the current [`Transformers`] snapshot.
pub struct TransformerRegistry {
    current: ArcSwap<Transformers>,
}

impl TransformerRegistry {
    /// Creates a registry with no hooks.
    pub fn new() -> Self {
        Self::with_transformers(Transformers::new())
    }

    /// Creates a registry seeded with `transformers`.
    pub fn with_transformers(transformers: Transformers) -> Self {
        Self {
            current: ArcSwap::from_pointee(transformers),
        }
    }

    /// Registers an encode hook for `kind`, replacing any previous one.
    pub fn register_encode_hook<F>(&self, kind: ValueKind, hook: F)
    where
        F: Fn(Value) -> Result<Value, HookError> + Send + Sync + 'static,
    {
        let hook: Transformer = Arc::new(hook);
        self.current.rcu(|cur| {
            let mut next = Transformers::clone(cur);
            next.set_encode_hook(kind, Arc::clone(&hook));
            next
        });
        tracing::debug!(?kind, "registered encode hook");
    }

    /// Registers a decode hook for `kind`, replacing any previous one.
    pub fn register_decode_hook<F>(&self, kind: ValueKind, hook: F)
    where
        F: Fn(Value) -> Result<Value, HookError> + Send + Sync + 'static,
    {
        let hook: Transformer = Arc::new(hook);
        self.current.rcu(|cur| {
            let mut next = Transformers::clone(cur);
            next.set_decode_hook(kind, Arc::clone(&hook));
            next
        });
        tracing::debug!(?kind, "registered decode hook");
    }

    /// Empties both tables in one step.
    pub fn clear_all(&self) {
        self.current.store(Arc::new(Transformers::new()));
        tracing::debug!("cleared all hooks");
    }

    /// Swaps in a complete set of hooks.
    pub fn replace(&self, transformers: Transformers) {
        self.current.store(Arc::new(transformers));
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Arc<Transformers> {
        self.current.load_full()
    }

    pub fn lookup_encode_hook(&self, kind: ValueKind) -> Option<Transformer> {
        self.current.load().encode_hook(kind).cloned()
    }

    pub fn lookup_decode_hook(&self, kind: ValueKind) -> Option<Transformer> {
        self.current.load().decode_hook(kind).cloned()
    }
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("current", &**self.current.load())
            .finish()
    }
}
