//! Type-keyed plan registry
//!
//! Populated once at startup; lookups fall back to [`SerdeJson`] for types
//! without a compiled plan.

use super::plan::{CompiledPlan, ItemDecoder, ItemEncoder, SerdeJson};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type AnyPlan = Arc<dyn Any + Send + Sync>;

/// Immutable mapping from item type to compiled plan
#[derive(Clone, Default)]
pub struct PlanRegistry {
    plans: Arc<HashMap<TypeId, AnyPlan>>,
}

impl PlanRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a registry
    pub fn builder() -> PlanRegistryBuilder {
        PlanRegistryBuilder::default()
    }

    /// Number of registered plans
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Whether no plans are registered
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Check whether a compiled plan exists for `T`
    pub fn contains<T: 'static>(&self) -> bool {
        self.plans.contains_key(&TypeId::of::<T>())
    }

    /// The compiled plan for `T`, if one was registered
    pub fn plan<T: 'static>(&self) -> Option<Arc<CompiledPlan<T>>> {
        let plan = self.plans.get(&TypeId::of::<T>())?;
        Arc::clone(plan).downcast::<CompiledPlan<T>>().ok()
    }

    /// Encoder for `T`: the compiled plan when present, serde otherwise
    pub fn encoder<T: Serialize + 'static>(&self) -> Arc<dyn ItemEncoder<T>> {
        match self.plan::<T>() {
            Some(plan) => plan as Arc<dyn ItemEncoder<T>>,
            None => Arc::new(SerdeJson),
        }
    }

    /// Decoder for `T`: the compiled plan when present, serde otherwise
    pub fn decoder<T: DeserializeOwned + 'static>(&self) -> Arc<dyn ItemDecoder<T>> {
        match self.plan::<T>() {
            Some(plan) => plan as Arc<dyn ItemDecoder<T>>,
            None => Arc::new(SerdeJson),
        }
    }
}

impl std::fmt::Debug for PlanRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanRegistry")
            .field("plans", &self.plans.len())
            .finish()
    }
}

/// Builder for [`PlanRegistry`]
#[derive(Default)]
pub struct PlanRegistryBuilder {
    plans: HashMap<TypeId, AnyPlan>,
}

impl PlanRegistryBuilder {
    /// Register the compiled plan for `T`, replacing any previous one
    #[must_use]
    pub fn register<T: 'static>(mut self, plan: CompiledPlan<T>) -> Self {
        debug!(
            "Registering plan '{}' for {}",
            ItemEncoder::<T>::name(&plan),
            std::any::type_name::<T>()
        );
        self.plans.insert(TypeId::of::<T>(), Arc::new(plan));
        self
    }

    /// Build the registry
    pub fn build(self) -> PlanRegistry {
        PlanRegistry {
            plans: Arc::new(self.plans),
        }
    }
}
