//! 统一的应用状态。

use std::path::Path;

use system_capabilities::{CurrentFolder, FileSystemCapabilities, Sandbox};

/// 统一的应用状态，包含所有处理器共享的数据。
#[derive(Clone)]
pub struct AppState {
    /// 沙箱内的文件系统能力。
    pub filesystem: FileSystemCapabilities,
    /// 进程内共享的当前目录。
    pub current_folder: CurrentFolder,
}

impl AppState {
    /// 基于已打开的沙箱创建应用状态，当前目录初始为沙箱根目录。
    pub fn new(sandbox: Sandbox) -> Self {
        Self {
            current_folder: CurrentFolder::new(sandbox.clone()),
            filesystem: FileSystemCapabilities::new(sandbox),
        }
    }

    /// 打开（必要时创建）沙箱根目录并创建应用状态。
    pub fn open(base_dir: &Path) -> system_capabilities::Result<Self> {
        Sandbox::open(base_dir).map(Self::new)
    }
}
