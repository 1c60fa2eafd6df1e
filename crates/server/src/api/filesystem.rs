//! 文件系统 API 路由。
//!
//! 提供目录浏览、切换目录、文件与目录的增删改、移动和复制能力。
//! 以名称而非完整路径传入的参数都相对当前目录解析。

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{delete, get, post},
};
use filedeck_api_types::{
    ChangeFolderRequest, ChangeFolderResponse, CreateFileRequest, CreateFileResponse,
    CreateFolderRequest, DeleteRequest, FilesResponse, MessageResponse, MoveFileRequest,
    MoveFileResponse, OpenFileRequest, OpenFileResponse, RenameRequest,
};
use system_capabilities::FileSystemError;

use super::error::ApiError;
use super::state::AppState;

/// 创建文件系统 API 路由。
pub fn create_filesystem_router() -> Router<Arc<AppState>> {
    Router::new()
        // 列出当前目录内容
        .route("/files", get(list_files))
        // 切换当前目录
        .route("/change-folder", post(change_folder))
        .route("/create-folder", post(create_folder))
        .route("/delete", delete(delete_item))
        .route("/create-file", post(create_file))
        .route("/open-file", post(open_file))
        // 移动或复制
        .route("/move-file", post(move_file))
        .route("/rename", post(rename_item))
}

/// 列出当前目录内容。
async fn list_files(State(state): State<Arc<AppState>>) -> Result<Json<FilesResponse>, ApiError> {
    let folder = state.current_folder.get().await;
    let entries = state.filesystem.list_directory(&folder)?;

    Ok(Json(FilesResponse {
        current_folder: folder.display().to_string(),
        contents: entries.iter().map(|entry| entry.name.clone()).collect(),
        entries,
    }))
}

/// 切换当前目录，`..` 表示上一级。
async fn change_folder(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChangeFolderRequest>, JsonRejection>,
) -> Result<Json<ChangeFolderResponse>, ApiError> {
    let Json(request) = payload?;
    let folder = request.folder.unwrap_or_default();
    let current = state.current_folder.navigate(&folder).await?;

    Ok(Json(ChangeFolderResponse {
        message: "Changed folder".to_string(),
        current_folder: current.display().to_string(),
    }))
}

/// 在当前目录下创建目录。
async fn create_folder(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateFolderRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    let name = request.folder.unwrap_or_default();
    let folder = state.current_folder.get().await;
    state.filesystem.create_folder(&folder, &name)?;

    Ok(Json(MessageResponse::new("Folder created successfully")))
}

/// 删除当前目录下的文件或目录（目录递归删除，不可撤销）。
async fn delete_item(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    let target = request.target.unwrap_or_default();
    let folder = state.current_folder.get().await;
    state.filesystem.delete(&folder, &target)?;

    Ok(Json(MessageResponse::new("Item deleted successfully")))
}

/// 创建带内容的新文件，不覆盖已有文件。
async fn create_file(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateFileRequest>, JsonRejection>,
) -> Result<Json<CreateFileResponse>, ApiError> {
    let Json(request) = payload?;
    let file_name = request.file_name.unwrap_or_default();
    if file_name.is_empty() {
        return Err(FileSystemError::MissingArgument("file_name").into());
    }
    let content = request
        .content
        .ok_or(FileSystemError::MissingArgument("content"))?;

    let directory = resolve_directory(&state, request.directory.as_deref()).await?;
    let path = state
        .filesystem
        .create_file(&directory, &file_name, &content)?;

    Ok(Json(CreateFileResponse {
        message: "File created successfully".to_string(),
        file_path: path.display().to_string(),
        success: true,
    }))
}

/// 读取文本文件内容。
async fn open_file(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<OpenFileRequest>, JsonRejection>,
) -> Result<Json<OpenFileResponse>, ApiError> {
    let Json(request) = payload?;
    let file_name = request.file_name.unwrap_or_default();
    let directory = resolve_directory(&state, request.directory.as_deref()).await?;
    let content = state.filesystem.open_file(&directory, &file_name)?;

    Ok(Json(OpenFileResponse {
        message: "File opened successfully".to_string(),
        file_content: content,
        success: true,
    }))
}

/// 移动（`cut = true`）或复制文件/目录到目标目录。
async fn move_file(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MoveFileRequest>, JsonRejection>,
) -> Result<Json<MoveFileResponse>, ApiError> {
    let Json(request) = payload?;
    let source = request.current_file_folder.unwrap_or_default();
    let destination = request.new_file_folder.unwrap_or_default();
    let current = state.current_folder.get().await;

    let path = state
        .filesystem
        .move_or_copy(&current, &source, &destination, request.cut)?;

    let message = if request.cut {
        "File moved successfully"
    } else {
        "File/Folder copied successfully"
    };
    Ok(Json(MoveFileResponse {
        message: message.to_string(),
        destination_path: path.display().to_string(),
    }))
}

/// 在当前目录内重命名。
async fn rename_item(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    let current_name = request.current_name.unwrap_or_default();
    let new_name = request.new_name.unwrap_or_default();
    let folder = state.current_folder.get().await;

    state
        .filesystem
        .rename(&folder, &current_name, &new_name, request.overwrite)?;

    Ok(Json(MessageResponse::new("Item renamed successfully")))
}

/// 请求中的 `directory` 相对当前目录解析；缺省时即为当前目录。
async fn resolve_directory(state: &AppState, directory: Option<&str>) -> Result<PathBuf, ApiError> {
    let current = state.current_folder.get().await;
    match directory {
        Some(directory) if !directory.is_empty() => {
            Ok(state.filesystem.sandbox().confine(&current, directory)?)
        }
        _ => Ok(current),
    }
}
