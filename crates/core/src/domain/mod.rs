mod entry;
mod error;
pub mod path_resolver;
mod sandbox_root;

pub use entry::{Entry, EntryKind};
pub use error::DomainError;
pub use path_resolver::{is_contained, normalize, resolve_relative};
pub use sandbox_root::SandboxRoot;
