//! Type-indexed codec registry
//!
//! Resolvers are consulted in registration order the first time a type is
//! requested; the winning codec is cached by `TypeId` for every later call.

use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use tracing::debug;

use super::{DynamicCodec, PrimitiveCodec, Value, ValueCodec};
use crate::error::{MapError, MapResult};

/// Type-erased `Arc<dyn ValueCodec<T>>`
pub type ErasedCodec = Arc<dyn Any + Send + Sync>;

/// Erase a codec for storage in the registry
pub fn erase<T: 'static, C: ValueCodec<T> + 'static>(codec: C) -> ErasedCodec {
    let codec: Arc<dyn ValueCodec<T>> = Arc::new(codec);
    Arc::new(codec)
}

/// Source of codecs for a set of types
pub trait CodecResolver: Send + Sync {
    /// Codec for `type_id`, erased with [`erase`], or `None` if this
    /// resolver does not handle the type
    fn resolve(&self, type_id: TypeId) -> Option<ErasedCodec>;
}

/// Resolves [`PrimitiveCodec`] for the primitive value types
#[derive(Debug, Default)]
pub struct PrimitiveResolver;

macro_rules! resolve_primitives {
    ($type_id:expr, $($ty:ty),* $(,)?) => {
        $(
            if $type_id == TypeId::of::<$ty>() {
                return Some(erase::<$ty, _>(PrimitiveCodec));
            }
        )*
    };
}

impl CodecResolver for PrimitiveResolver {
    fn resolve(&self, type_id: TypeId) -> Option<ErasedCodec> {
        resolve_primitives!(
            type_id, bool, u8, i8, u16, i16, u32, i32, u64, i64, f32, f64, u128, i128, char,
            String, Vec<u8>,
        );
        None
    }
}

/// Resolves [`DynamicCodec`] for [`Value`]
#[derive(Debug, Default)]
pub struct DynamicResolver;

impl CodecResolver for DynamicResolver {
    fn resolve(&self, type_id: TypeId) -> Option<ErasedCodec> {
        (type_id == TypeId::of::<Value>()).then(|| erase::<Value, _>(DynamicCodec))
    }
}

/// Registry mapping value types to codecs
pub struct CodecRegistry {
    resolvers: Vec<Box<dyn CodecResolver>>,
    cache: DashMap<TypeId, ErasedCodec>,
}

impl CodecRegistry {
    /// Registry without any resolver
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
            cache: DashMap::new(),
        }
    }

    /// Registry with the primitive and dynamic resolvers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.add_resolver(PrimitiveResolver);
        registry.add_resolver(DynamicResolver);
        registry
    }

    /// Append a resolver to the chain
    pub fn add_resolver<R: CodecResolver + 'static>(&mut self, resolver: R) {
        self.resolvers.push(Box::new(resolver));
    }

    /// Register `codec` for `T`, replacing any cached codec
    pub fn register<T: 'static, C: ValueCodec<T> + 'static>(&self, codec: C) {
        self.cache.insert(TypeId::of::<T>(), erase::<T, C>(codec));
    }

    /// Codec for `T`, resolved on first use
    pub fn get<T: 'static>(&self) -> MapResult<Arc<dyn ValueCodec<T>>> {
        let type_id = TypeId::of::<T>();

        // Clone out of the map so no shard guard is held while resolving
        let cached = self.cache.get(&type_id).map(|entry| Arc::clone(entry.value()));
        let erased = match cached {
            Some(erased) => erased,
            None => {
                let resolved = self
                    .resolvers
                    .iter()
                    .find_map(|resolver| resolver.resolve(type_id))
                    .ok_or(MapError::UnsupportedType(std::any::type_name::<T>()))?;
                debug!(type_name = std::any::type_name::<T>(), "resolved value codec");
                Arc::clone(self.cache.entry(type_id).or_insert(resolved).value())
            }
        };

        erased
            .downcast_ref::<Arc<dyn ValueCodec<T>>>()
            .cloned()
            .ok_or(MapError::UnsupportedType(std::any::type_name::<T>()))
    }

    /// Whether a codec for `T` is cached or resolvable
    pub fn supports<T: 'static>(&self) -> bool {
        self.get::<T>().is_ok()
    }

    /// Number of cached codecs
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Process-wide registry with the default resolvers
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<CodecRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::with_defaults)
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("resolvers", &self.resolvers.len())
            .field("cached", &self.cache.len())
            .finish()
    }
}
