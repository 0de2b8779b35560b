//! Source frontends: turn files on disk into syntax-model units and answer
//! symbol queries about them.

#[cfg(feature = "go-frontend")]
pub mod go;
pub mod workspace;

#[cfg(feature = "go-frontend")]
pub use go::GoParser;
pub use workspace::{GoWorkspace, WorkspaceError};
