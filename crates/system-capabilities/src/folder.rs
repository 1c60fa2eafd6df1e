//! 进程内共享的“当前目录”。
//!
//! 当前目录只有一份，初始为沙箱根目录，只由 [`CurrentFolder::navigate`]
//! 修改。其他请求在读锁下取一份快照后再访问文件系统，因此与并发的
//! 切换目录请求之间仍存在一个窗口：列表可能反映切换前的目录。

use std::path::PathBuf;
use std::sync::Arc;

use filedeck_core::domain::resolve_relative;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{FileSystemError, Result};
use crate::sandbox::Sandbox;

/// 受读写锁保护的当前目录。
#[derive(Debug, Clone)]
pub struct CurrentFolder {
    sandbox: Sandbox,
    path: Arc<RwLock<PathBuf>>,
}

impl CurrentFolder {
    /// 以沙箱根目录作为初始当前目录。
    pub fn new(sandbox: Sandbox) -> Self {
        let path = sandbox.root().to_path_buf();
        Self {
            sandbox,
            path: Arc::new(RwLock::new(path)),
        }
    }

    /// 当前目录的快照。
    pub async fn get(&self) -> PathBuf {
        self.path.read().await.clone()
    }

    /// 切换当前目录。
    ///
    /// 解析、校验与赋值都在写锁内完成；任何一步失败时当前目录保持不变。
    #[tracing::instrument(skip(self))]
    pub async fn navigate(&self, fragment: &str) -> Result<PathBuf> {
        if fragment.is_empty() {
            return Err(FileSystemError::MissingArgument("folder"));
        }

        let mut current = self.path.write().await;
        let resolved = resolve_relative(&current, fragment);
        let target = self.sandbox.check(&resolved)?;

        if !target.is_dir() {
            return Err(FileSystemError::PathNotFound(target.display().to_string()));
        }

        info!(from = %current.display(), to = %target.display(), "changing current folder");
        *current = target.clone();
        Ok(target)
    }
}
