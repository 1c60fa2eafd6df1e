//! 沙箱根目录与路径约束。

use std::path::{Path, PathBuf};

use filedeck_core::domain::{SandboxRoot, normalize, resolve_relative};
use tracing::{info, warn};

use crate::error::{FileSystemError, Result};

/// 所有操作都被限制在其中的根目录。
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: SandboxRoot,
}

impl Sandbox {
    /// 打开沙箱；目录不存在时会先创建，随后规范化为真实路径。
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path).map_err(|e| FileSystemError::from_io(path, e))?;
        let canonical = path
            .canonicalize()
            .map_err(|e| FileSystemError::from_io(path, e))?;
        let root = SandboxRoot::new(canonical)?;

        info!(root = %root, "sandbox opened");
        Ok(Self { root })
    }

    /// 沙箱根目录。
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// 相对 `current` 解析片段并校验其位于沙箱内。
    pub fn confine(&self, current: &Path, fragment: &str) -> Result<PathBuf> {
        self.check(&resolve_relative(current, fragment))
    }

    /// 规范化候选路径并校验其位于沙箱内。
    ///
    /// 先做逐段的词法检查，再对已存在的最近祖先做一次真实路径检查，
    /// 沙箱内指向外部的符号链接因此同样会被拒绝。
    pub fn check(&self, candidate: &Path) -> Result<PathBuf> {
        let candidate = self.check_lexical(candidate)?;
        self.check_real(&candidate, &candidate)?;
        Ok(candidate)
    }

    /// 与 [`Sandbox::confine`] 相同，但拒绝沙箱根目录本身，并且不跟随
    /// 最后一段：只校验父目录的真实路径，删除或重命名作用于链接本身。
    pub(crate) fn confine_entry(&self, current: &Path, fragment: &str) -> Result<PathBuf> {
        let path = self.check_lexical(&resolve_relative(current, fragment))?;
        if path == self.root() {
            return Err(FileSystemError::Forbidden(format!(
                "{} is the sandbox root",
                path.display()
            )));
        }

        if let Some(parent) = path.parent() {
            self.check_real(parent, &path)?;
        }
        Ok(path)
    }

    fn check_lexical(&self, candidate: &Path) -> Result<PathBuf> {
        let candidate = normalize(candidate);
        if !self.root.contains(&candidate) {
            warn!(path = %candidate.display(), root = %self.root, "rejected path outside sandbox");
            return Err(FileSystemError::Forbidden(candidate.display().to_string()));
        }
        Ok(candidate)
    }

    /// `path` 已存在的最近祖先（含自身）的真实路径必须位于沙箱内。
    fn check_real(&self, path: &Path, requested: &Path) -> Result<()> {
        if let Some(existing) = path.ancestors().find(|p| p.exists()) {
            let real = existing
                .canonicalize()
                .map_err(|e| FileSystemError::from_io(existing, e))?;
            if !self.root.contains(&real) {
                warn!(
                    path = %requested.display(),
                    real = %real.display(),
                    "rejected path resolving outside sandbox"
                );
                return Err(FileSystemError::Forbidden(requested.display().to_string()));
            }
        }
        Ok(())
    }
}
