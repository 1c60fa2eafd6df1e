use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

type Result<T> = anyhow::Result<T>;

/// 配置文件路径的环境变量名。
pub const CONFIG_PATH_ENV: &str = "FILEDECK_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "filedeck.toml";

/// 服务端配置。
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// 监听地址。
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// 沙箱根目录，不存在时启动时创建。
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// 请求体（包括上传文件）的最大字节数。
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// 读取 `FILEDECK_CONFIG` 指向的文件（默认 `filedeck.toml`），文件不存在时使用默认值。
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        if path.exists() {
            info!(path = %path.display(), "loading server config");
            Self::from_file(&path)
        } else {
            info!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to deserialize server config")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            base_dir: default_base_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_base_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("ServerTask").join("files"))
        .unwrap_or_else(|| PathBuf::from("files"))
}

fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}
