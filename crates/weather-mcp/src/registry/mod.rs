//! Capability registry, fixed at startup.

pub mod capability;
pub mod registry;
pub mod template;

pub use capability::{
    Arguments, Capability, CapabilityKind, HandlerError, HandlerFn, ParamSchema, ParamSpec,
    ParamType,
};
pub use registry::{CapabilityRegistry, RegistryError, Resolved};
pub use template::UriTemplate;
