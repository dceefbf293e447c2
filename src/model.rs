pub mod persistence;
pub mod profile;
pub mod registry;
pub mod url;

pub use profile::{Group, GroupId, Profile, ProfileId};
pub use registry::{GroupEdits, Registry, RegistryError, Selection};
