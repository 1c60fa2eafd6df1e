//! 文件系统能力错误类型。

use std::io;
use std::path::Path;

use filedeck_core::domain::DomainError;
use thiserror::Error;

/// 文件系统错误类型。
#[derive(Debug, Error)]
pub enum FileSystemError {
    #[error("缺少参数: {0}")]
    MissingArgument(&'static str),

    #[error("参数无效: {0}")]
    InvalidInput(String),

    #[error("禁止访问沙箱之外的路径: {0}")]
    Forbidden(String),

    #[error("路径不存在: {0}")]
    PathNotFound(String),

    #[error("路径不是目录: {0}")]
    NotADirectory(String),

    #[error("源路径不存在: {0}")]
    SourceMissing(String),

    #[error("目标目录不存在: {0}")]
    DestinationMissing(String),

    #[error("路径已存在: {0}")]
    AlreadyExists(String),

    #[error("权限不足: {0}")]
    PermissionDenied(String),

    #[error("沙箱根目录无效: {0}")]
    Domain(#[from] DomainError),

    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, FileSystemError>;

impl FileSystemError {
    /// 将底层 IO 错误按类型归类，保留路径信息。
    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
        let display = path.display().to_string();
        match err.kind() {
            io::ErrorKind::NotFound => Self::PathNotFound(display),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(display),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(display),
            _ => Self::Io(err),
        }
    }
}
