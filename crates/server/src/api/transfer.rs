//! 上传与下载路由。

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Multipart, Query, State, rejection::QueryRejection},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use filedeck_api_types::{DownloadQuery, UploadResponse};
use system_capabilities::{FileSystemError, PendingUpload};
use tokio_util::io::ReaderStream;
use tracing::info;

use super::error::ApiError;
use super::state::AppState;

/// 创建上传/下载路由。
pub fn create_transfer_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(upload_file))
        .route("/download", get(download_file))
}

/// 上传文件到当前目录。
///
/// 表单字段 `file` 为文件内容，按块写入临时文件；可选字段 `overwrite`
/// （默认 `true`）为 `false` 时不覆盖同名文件，可出现在 `file` 之前或之后。
async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let folder = state.current_folder.get().await;
    let mut overwrite = true;
    let mut upload: Option<(String, PendingUpload)> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().map(upload_name).unwrap_or_default();
                let mut pending = state.filesystem.begin_upload(&folder, &filename)?;
                while let Some(chunk) = field.chunk().await? {
                    pending.write_chunk(&chunk)?;
                }
                upload = Some((filename, pending));
            }
            Some("overwrite") => {
                overwrite = parse_flag(&field.text().await?)?;
            }
            _ => {}
        }
    }

    let (filename, pending) = upload.ok_or(FileSystemError::MissingArgument("file"))?;
    pending.finish(overwrite)?;

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        filename,
    }))
}

/// 以附件形式下载当前目录下的文件。
async fn download_file(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let filename = query.filename.unwrap_or_default();
    let folder = state.current_folder.get().await;
    let path = state.filesystem.prepare_download(&folder, &filename)?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(FileSystemError::Io)?;
    let attachment = path
        .file_name()
        .map(|name| header_safe_name(&name.to_string_lossy()))
        .unwrap_or_else(|| "download".to_string());

    info!(path = %path.display(), "streaming download");
    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", attachment),
        ),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

/// 只保留客户端给出的文件名最后一段，忽略其中的目录部分。
fn upload_name(raw: &str) -> String {
    match raw.rsplit(['/', '\\']).next().unwrap_or_default() {
        "." | ".." => String::new(),
        name => name.to_string(),
    }
}

/// Content-Disposition 中只放可见 ASCII 字符。
fn header_safe_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}

fn parse_flag(value: &str) -> Result<bool, FileSystemError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(FileSystemError::InvalidInput(format!(
            "overwrite must be a boolean, got {:?}",
            other
        ))),
    }
}
