//! Descriptor extraction passes.
//!
//! A pure, side-effect-free transform from raw front-end declarations into
//! immutable descriptors: [`module::extract_module`] per module,
//! [`component::extract_component`] for a component and its subcomponent
//! tree.

pub mod component;
pub mod module;

pub use component::{extract_component, ComponentDescriptor, EntryPointRequest};
pub use module::{extract_module, ModuleDescriptor};
