//! System Capabilities - 沙箱文件系统能力封装模块。
//!
//! 该 crate 提供受沙箱约束的文件操作与共享的当前目录状态，
//! 供 server 集成为 HTTP API 路由。

pub mod error;
pub mod filesystem;
pub mod folder;
pub mod sandbox;

pub use error::{FileSystemError, Result};
pub use filesystem::{FileSystemCapabilities, PendingUpload};
pub use folder::CurrentFolder;
pub use sandbox::Sandbox;
