pub mod capability;
pub mod role;

pub use capability::{Capabilities, EntityKind, capabilities};
pub use role::Role;
