//! Bill-of-materials registry.
//!
//! Loads, once per session, the per-model mapping from part to quantity required
//! per finished vehicle. The registry is immutable after load.

pub mod registry;
pub mod table;

pub use registry::{BomRegistry, RequirementLine, Requirements};
pub use table::{load_requirements, BomTableLayout, ModelColumns};
