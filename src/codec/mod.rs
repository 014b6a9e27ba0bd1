//! Item codec module
//!
//! Supports: serde (general path), compiled per-type plans
//!
//! # Overview
//!
//! The codec module decides how individual items are written to and read
//! from the `items` array. Callers pick a plan explicitly, or resolve one from
//! a [`PlanRegistry`] built at startup.

mod plan;
mod registry;

pub use plan::{CompiledPlan, DecodeFn, EncodeFn, ItemDecoder, ItemEncoder, SerdeJson};
pub use registry::{PlanRegistry, PlanRegistryBuilder};
