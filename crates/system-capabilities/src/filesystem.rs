//! 文件系统能力模块。
//!
//! 提供沙箱内的目录浏览、文件读写、删除、重命名、移动与复制能力。
//! 每个来自用户输入的路径在触碰文件系统之前都会经过 [`Sandbox`] 校验。

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use filedeck_core::domain::{Entry, EntryKind};
use filetime::FileTime;
use tempfile::NamedTempFile;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{FileSystemError, Result};
use crate::sandbox::Sandbox;

const TEMP_PREFIX: &str = ".filedeck-";

/// 文件系统能力接口。
#[derive(Debug, Clone)]
pub struct FileSystemCapabilities {
    sandbox: Sandbox,
}

impl FileSystemCapabilities {
    /// 创建限定在给定沙箱内的实例。
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }

    /// 所使用的沙箱。
    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// 列出目录内容，顺序与文件系统返回的顺序一致。
    pub fn list_directory(&self, folder: &Path) -> Result<Vec<Entry>> {
        let folder = self.sandbox.check(folder)?;

        if !folder.exists() {
            return Err(FileSystemError::PathNotFound(folder.display().to_string()));
        }

        if !folder.is_dir() {
            return Err(FileSystemError::NotADirectory(folder.display().to_string()));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&folder).map_err(|e| FileSystemError::from_io(&folder, e))? {
            let entry = entry.map_err(|e| FileSystemError::from_io(&folder, e))?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!(folder = %folder.display(), name = ?raw, "skipping non UTF-8 entry name");
                    continue;
                }
            };
            let kind = entry
                .file_type()
                .map(EntryKind::from_file_type)
                .unwrap_or(EntryKind::Other);
            entries.push(Entry::new(name, kind));
        }

        info!(path = %folder.display(), count = entries.len(), "listed directory");
        Ok(entries)
    }

    /// 在 `parent` 下创建目录，中间目录会一并创建。
    pub fn create_folder(&self, parent: &Path, name: &str) -> Result<PathBuf> {
        let name = require(name, "folder")?;
        let target = self.sandbox.confine(parent, name)?;

        if target.exists() {
            return Err(FileSystemError::AlreadyExists(target.display().to_string()));
        }

        fs::create_dir_all(&target).map_err(|e| FileSystemError::from_io(&target, e))?;
        info!(path = %target.display(), "created folder");
        Ok(target)
    }

    /// 创建新文件并写入文本内容，绝不覆盖已有文件。
    ///
    /// 内容先写入同目录下的临时文件，再以不覆盖的方式原子地放到目标位置，
    /// 失败时不会留下写了一半的文件。
    pub fn create_file(&self, directory: &Path, name: &str, content: &str) -> Result<PathBuf> {
        let name = require(name, "file_name")?;
        let directory = self.sandbox.check(directory)?;
        let target = self.sandbox.confine_entry(&directory, name)?;

        if target.exists() {
            return Err(FileSystemError::AlreadyExists(target.display().to_string()));
        }

        let mut temp = self.temp_file_for(&target)?;
        temp.write_all(content.as_bytes())
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| FileSystemError::from_io(&target, e))?;
        temp.persist_noclobber(&target)
            .map_err(|e| FileSystemError::from_io(&target, e.error))?;

        info!(path = %target.display(), bytes = content.len(), "created file");
        Ok(target)
    }

    /// 以文本形式读取文件全部内容。
    pub fn open_file(&self, directory: &Path, name: &str) -> Result<String> {
        let name = require(name, "file_name")?;
        let directory = self.sandbox.check(directory)?;
        let target = self.sandbox.confine(&directory, name)?;

        if !target.exists() {
            return Err(FileSystemError::PathNotFound(target.display().to_string()));
        }

        let content = fs::read_to_string(&target).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                FileSystemError::from_io(&target, e)
            }
            _ => FileSystemError::Io(e),
        })?;

        info!(path = %target.display(), bytes = content.len(), "opened file");
        Ok(content)
    }

    /// 为 `directory/name` 准备一次上传：校验目标并在同目录下创建临时文件。
    ///
    /// 内容通过 [`PendingUpload::write_chunk`] 逐块写入，
    /// 最后由 [`PendingUpload::finish`] 放到目标位置。
    #[tracing::instrument(skip(self))]
    pub fn begin_upload(&self, directory: &Path, name: &str) -> Result<PendingUpload> {
        let name = require(name, "file")?;
        let target = self.sandbox.confine_entry(directory, name)?;

        if target.is_dir() {
            return Err(FileSystemError::InvalidInput(format!(
                "{} is a directory",
                target.display()
            )));
        }

        let temp = self.temp_file_for(&target)?;
        Ok(PendingUpload {
            temp,
            target,
            written: 0,
        })
    }

    /// 解析待下载文件的路径，要求其为已存在的普通文件。
    pub fn prepare_download(&self, directory: &Path, name: &str) -> Result<PathBuf> {
        let name = require(name, "filename")?;
        let target = self.sandbox.confine(directory, name)?;

        if !target.exists() {
            return Err(FileSystemError::PathNotFound(target.display().to_string()));
        }

        if !target.is_file() {
            return Err(FileSystemError::InvalidInput(format!(
                "{} is not a regular file",
                target.display()
            )));
        }

        info!(path = %target.display(), "prepared download");
        Ok(target)
    }

    /// 删除文件，或递归删除目录及其全部内容。
    ///
    /// 递归删除不可撤销。沙箱根目录本身不能被删除。
    #[tracing::instrument(skip(self))]
    pub fn delete(&self, folder: &Path, name: &str) -> Result<EntryKind> {
        let name = require(name, "target")?;
        let target = self.sandbox.confine_entry(folder, name)?;

        let metadata = fs::symlink_metadata(&target)
            .map_err(|e| FileSystemError::from_io(&target, e))?;
        let kind = EntryKind::from_file_type(metadata.file_type());

        let removed = if metadata.is_dir() {
            fs::remove_dir_all(&target)
        } else {
            fs::remove_file(&target)
        };
        removed.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FileSystemError::from_io(&target, e),
            _ => FileSystemError::Io(e),
        })?;

        info!(path = %target.display(), kind = ?kind, "deleted entry");
        Ok(kind)
    }

    /// 在同一目录内重命名条目。
    ///
    /// `overwrite` 为 `false` 时，若新名称已被占用则返回 `AlreadyExists`，
    /// 而不是依赖平台的 rename 语义悄悄覆盖。
    #[tracing::instrument(skip(self))]
    pub fn rename(
        &self,
        folder: &Path,
        current_name: &str,
        new_name: &str,
        overwrite: bool,
    ) -> Result<PathBuf> {
        let current_name = require(current_name, "current_name")?;
        let new_name = require(new_name, "new_name")?;
        let source = self.sandbox.confine_entry(folder, current_name)?;
        let target = self.sandbox.confine_entry(folder, new_name)?;

        if source.parent() != target.parent() {
            return Err(FileSystemError::InvalidInput(format!(
                "rename cannot move {} into another folder",
                source.display()
            )));
        }

        if fs::symlink_metadata(&source).is_err() {
            return Err(FileSystemError::PathNotFound(source.display().to_string()));
        }

        if !overwrite && source != target && fs::symlink_metadata(&target).is_ok() {
            return Err(FileSystemError::AlreadyExists(target.display().to_string()));
        }

        fs::rename(&source, &target).map_err(|e| FileSystemError::from_io(&source, e))?;
        info!(from = %source.display(), to = %target.display(), "renamed entry");
        Ok(target)
    }

    /// 移动（`cut`）或复制条目到目标目录，保留原名称。
    ///
    /// 两端路径都会经过沙箱校验：绝对路径必须位于沙箱内，相对路径相对
    /// `current` 解析。移动使用原子 rename，跨设备时直接返回 IO 错误；
    /// 复制会保留权限与修改时间。
    #[tracing::instrument(skip(self))]
    pub fn move_or_copy(
        &self,
        current: &Path,
        source: &str,
        destination_folder: &str,
        cut: bool,
    ) -> Result<PathBuf> {
        if source.is_empty() || destination_folder.is_empty() {
            return Err(FileSystemError::InvalidInput(
                "both current_file_folder and new_file_folder are required".to_string(),
            ));
        }

        let source = self.sandbox.confine_entry(current, source)?;
        let destination_folder = self.sandbox.confine(current, destination_folder)?;

        if fs::symlink_metadata(&source).is_err() {
            return Err(FileSystemError::SourceMissing(source.display().to_string()));
        }

        if !destination_folder.is_dir() {
            return Err(FileSystemError::DestinationMissing(
                destination_folder.display().to_string(),
            ));
        }

        let file_name = source.file_name().ok_or_else(|| {
            FileSystemError::InvalidInput(format!("{} has no file name", source.display()))
        })?;
        let destination = destination_folder.join(file_name);

        if fs::symlink_metadata(&destination).is_ok() {
            return Err(FileSystemError::AlreadyExists(destination.display().to_string()));
        }

        if !cut {
            // 复制会读取链接指向的内容，源路径的真实位置也必须在沙箱内。
            self.sandbox.check(&source)?;
        }

        if source.is_dir() {
            let real_source = source
                .canonicalize()
                .map_err(|e| FileSystemError::from_io(&source, e))?;
            let real_destination = destination_folder
                .canonicalize()
                .map_err(|e| FileSystemError::from_io(&destination_folder, e))?;
            if real_destination.starts_with(&real_source) {
                return Err(FileSystemError::InvalidInput(format!(
                    "cannot place {} inside itself",
                    source.display()
                )));
            }
        }

        if cut {
            fs::rename(&source, &destination).map_err(|e| FileSystemError::from_io(&source, e))?;
            info!(from = %source.display(), to = %destination.display(), "moved entry");
        } else {
            if source.is_dir() {
                copy_tree(&source, &destination)?;
            } else {
                copy_file(&source, &destination)?;
            }
            info!(from = %source.display(), to = %destination.display(), "copied entry");
        }

        Ok(destination)
    }

    /// 在目标文件所在目录创建临时文件，保证之后的 persist 不跨设备。
    fn temp_file_for(&self, target: &Path) -> Result<NamedTempFile> {
        let parent = target.parent().ok_or_else(|| {
            FileSystemError::InvalidInput(format!("{} has no parent", target.display()))
        })?;

        if !parent.is_dir() {
            return Err(FileSystemError::PathNotFound(parent.display().to_string()));
        }

        tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(parent)
            .map_err(|e| FileSystemError::from_io(parent, e))
    }
}

/// 正在写入的上传。未调用 [`PendingUpload::finish`] 就被丢弃时，临时文件随之删除。
#[derive(Debug)]
pub struct PendingUpload {
    temp: NamedTempFile,
    target: PathBuf,
    written: u64,
}

impl PendingUpload {
    /// 上传的目标路径。
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// 追加一块内容到临时文件。
    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.temp
            .write_all(chunk)
            .map_err(|e| FileSystemError::from_io(&self.target, e))?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// 落盘并放到目标位置。
    ///
    /// `overwrite` 为 `true` 时替换同名文件；为 `false` 时同名文件已存在则报错。
    pub fn finish(self, overwrite: bool) -> Result<PathBuf> {
        let Self {
            temp,
            target,
            written,
        } = self;

        if !overwrite && fs::symlink_metadata(&target).is_ok() {
            return Err(FileSystemError::AlreadyExists(target.display().to_string()));
        }

        temp.as_file()
            .sync_all()
            .map_err(|e| FileSystemError::from_io(&target, e))?;
        let persisted = if overwrite {
            temp.persist(&target)
        } else {
            temp.persist_noclobber(&target)
        };
        persisted.map_err(|e| FileSystemError::from_io(&target, e.error))?;

        info!(path = %target.display(), bytes = written, overwrite, "stored upload");
        Ok(target)
    }
}

fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str> {
    if value.is_empty() {
        Err(FileSystemError::MissingArgument(field))
    } else {
        Ok(value)
    }
}

fn copy_file(source: &Path, destination: &Path) -> Result<()> {
    fs::copy(source, destination).map_err(|e| FileSystemError::from_io(source, e))?;
    copy_times(source, destination)
}

fn copy_times(source: &Path, destination: &Path) -> Result<()> {
    let metadata = fs::metadata(source).map_err(|e| FileSystemError::from_io(source, e))?;
    let atime = FileTime::from_last_access_time(&metadata);
    let mtime = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_times(destination, atime, mtime)
        .map_err(|e| FileSystemError::from_io(destination, e))
}

/// 递归复制目录。目录在其内容之后访问，以便最后恢复目录的修改时间。
///
/// 符号链接会被跳过：跟随它们可能把沙箱外的内容复制进来。
fn copy_tree(source: &Path, destination: &Path) -> Result<()> {
    for entry in WalkDir::new(source).contents_first(true) {
        let entry = entry.map_err(|e| FileSystemError::Io(e.into()))?;
        let relative = entry.path().strip_prefix(source).map_err(|_| {
            FileSystemError::InvalidInput(format!("{} escaped copy root", entry.path().display()))
        })?;
        let target = destination.join(relative);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            warn!(path = %entry.path().display(), "skipping symlink during copy");
            continue;
        }

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| FileSystemError::from_io(&target, e))?;
            let permissions = entry
                .metadata()
                .map_err(|e| FileSystemError::Io(e.into()))?
                .permissions();
            fs::set_permissions(&target, permissions)
                .map_err(|e| FileSystemError::from_io(&target, e))?;
            copy_times(entry.path(), &target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| FileSystemError::from_io(parent, e))?;
            }
            copy_file(entry.path(), &target)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use filedeck_core::domain::EntryKind;

    use super::*;

    fn capabilities() -> (tempfile::TempDir, FileSystemCapabilities, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let sandbox = Sandbox::open(dir.path().join("sandbox")).expect("open sandbox");
        let root = sandbox.root().to_path_buf();
        (dir, FileSystemCapabilities::new(sandbox), root)
    }

    fn names(entries: &[Entry]) -> Vec<String> {
        let mut names: Vec<String> = entries.iter().map(|e| e.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_list_directory() {
        let (_dir, fs_caps, root) = capabilities();
        fs::create_dir(root.join("docs")).expect("create docs");
        fs::write(root.join("a.txt"), "a").expect("write a");

        let entries = fs_caps.list_directory(&root).expect("list root");
        assert_eq!(names(&entries), vec!["a.txt", "docs"]);
        let docs = entries.iter().find(|e| e.name == "docs").expect("docs entry");
        assert!(docs.is_dir());
    }

    #[test]
    fn list_missing_folder_is_not_found() {
        let (_dir, fs_caps, root) = capabilities();

        assert!(matches!(
            fs_caps.list_directory(&root.join("missing")),
            Err(FileSystemError::PathNotFound(_))
        ));
    }

    #[test]
    fn list_outside_sandbox_is_forbidden() {
        let (dir, fs_caps, _root) = capabilities();

        assert!(matches!(
            fs_caps.list_directory(dir.path()),
            Err(FileSystemError::Forbidden(_))
        ));
    }

    #[test]
    fn create_folder_rejects_duplicates_and_empty_names() {
        let (_dir, fs_caps, root) = capabilities();

        let created = fs_caps.create_folder(&root, "a").expect("create a");
        assert!(created.is_dir());

        assert!(matches!(
            fs_caps.create_folder(&root, "a"),
            Err(FileSystemError::AlreadyExists(_))
        ));
        assert!(matches!(
            fs_caps.create_folder(&root, ""),
            Err(FileSystemError::MissingArgument("folder"))
        ));
    }

    #[test]
    fn create_folder_creates_intermediate_folders() {
        let (_dir, fs_caps, root) = capabilities();

        fs_caps.create_folder(&root, "x/y/z").expect("create nested");
        assert!(root.join("x/y/z").is_dir());
    }

    #[test]
    fn create_then_open_round_trips_content() {
        let (_dir, fs_caps, root) = capabilities();
        let content = "line one\nline two: ünïcödé\n";

        let path = fs_caps
            .create_file(&root, "notes.txt", content)
            .expect("create file");
        assert_eq!(path, root.join("notes.txt"));

        let read = fs_caps.open_file(&root, "notes.txt").expect("open file");
        assert_eq!(read, content);
    }

    #[test]
    fn create_file_accepts_empty_content() {
        let (_dir, fs_caps, root) = capabilities();

        fs_caps.create_file(&root, "empty.txt", "").expect("create empty");
        assert_eq!(fs_caps.open_file(&root, "empty.txt").expect("open"), "");
    }

    #[test]
    fn create_file_never_overwrites() {
        let (_dir, fs_caps, root) = capabilities();
        fs_caps.create_file(&root, "x.txt", "first").expect("first create");

        let err = fs_caps
            .create_file(&root, "x.txt", "second")
            .expect_err("second create should fail");
        assert!(matches!(err, FileSystemError::AlreadyExists(_)));
        assert_eq!(fs_caps.open_file(&root, "x.txt").expect("open"), "first");
    }

    #[test]
    fn create_file_in_missing_directory_is_not_found() {
        let (_dir, fs_caps, root) = capabilities();

        assert!(matches!(
            fs_caps.create_file(&root.join("nope"), "x.txt", "hi"),
            Err(FileSystemError::PathNotFound(_))
        ));
    }

    #[test]
    fn create_file_leaves_no_temp_files_behind() {
        let (_dir, fs_caps, root) = capabilities();
        fs_caps.create_file(&root, "x.txt", "hi").expect("create");
        let _ = fs_caps.create_file(&root, "x.txt", "again");

        let entries = fs_caps.list_directory(&root).expect("list");
        assert_eq!(names(&entries), vec!["x.txt"]);
    }

    #[test]
    fn create_file_outside_sandbox_is_forbidden() {
        let (_dir, fs_caps, root) = capabilities();

        assert!(matches!(
            fs_caps.create_file(&root, "../escape.txt", "x"),
            Err(FileSystemError::Forbidden(_))
        ));
    }

    #[test]
    fn open_missing_file_is_not_found() {
        let (_dir, fs_caps, root) = capabilities();

        assert!(matches!(
            fs_caps.open_file(&root, "missing.txt"),
            Err(FileSystemError::PathNotFound(_))
        ));
    }

    #[test]
    fn open_binary_file_is_io_error() {
        let (_dir, fs_caps, root) = capabilities();
        fs::write(root.join("blob.bin"), [0xff, 0xfe, 0x00, 0x80]).expect("write blob");

        assert!(matches!(
            fs_caps.open_file(&root, "blob.bin"),
            Err(FileSystemError::Io(_))
        ));
    }

    fn upload_chunks(
        fs_caps: &FileSystemCapabilities,
        directory: &Path,
        name: &str,
        chunks: &[&[u8]],
        overwrite: bool,
    ) -> Result<PathBuf> {
        let mut pending = fs_caps.begin_upload(directory, name)?;
        for chunk in chunks {
            pending.write_chunk(chunk)?;
        }
        pending.finish(overwrite)
    }

    #[test]
    fn upload_writes_chunks_in_order() {
        let (_dir, fs_caps, root) = capabilities();

        let mut pending = fs_caps.begin_upload(&root, "big.bin").expect("begin upload");
        assert_eq!(pending.target(), root.join("big.bin"));
        for i in 0..4u8 {
            pending.write_chunk(&[i; 1024]).expect("write chunk");
        }
        assert!(!root.join("big.bin").exists());

        let path = pending.finish(true).expect("finish upload");
        let data = fs::read(&path).expect("read upload");
        assert_eq!(data.len(), 4 * 1024);
        assert!(data[..1024].iter().all(|b| *b == 0));
        assert!(data[3 * 1024..].iter().all(|b| *b == 3));
    }

    #[test]
    fn upload_overwrites_when_allowed() {
        let (_dir, fs_caps, root) = capabilities();
        fs::write(root.join("data.bin"), b"old").expect("seed");

        let chunks = ["new ".as_bytes(), "bytes".as_bytes()];
        upload_chunks(&fs_caps, &root, "data.bin", &chunks, true).expect("upload");
        assert_eq!(fs::read(root.join("data.bin")).expect("read"), b"new bytes");
    }

    #[test]
    fn upload_refuses_to_overwrite_when_disabled() {
        let (_dir, fs_caps, root) = capabilities();
        fs::write(root.join("data.bin"), b"old").expect("seed");

        let err = upload_chunks(&fs_caps, &root, "data.bin", &["new".as_bytes()], false)
            .expect_err("should refuse");
        assert!(matches!(err, FileSystemError::AlreadyExists(_)));
        assert_eq!(fs::read(root.join("data.bin")).expect("read"), b"old");
        assert_eq!(names(&fs_caps.list_directory(&root).expect("list")), vec!["data.bin"]);
    }

    #[test]
    fn dropped_upload_leaves_nothing_behind() {
        let (_dir, fs_caps, root) = capabilities();

        let mut pending = fs_caps.begin_upload(&root, "partial.bin").expect("begin upload");
        pending.write_chunk(b"half").expect("write chunk");
        drop(pending);

        assert!(fs_caps.list_directory(&root).expect("list").is_empty());
    }

    #[test]
    fn upload_requires_a_name() {
        let (_dir, fs_caps, root) = capabilities();

        assert!(matches!(
            fs_caps.begin_upload(&root, ""),
            Err(FileSystemError::MissingArgument("file"))
        ));
    }

    #[test]
    fn prepare_download_requires_existing_file() {
        let (_dir, fs_caps, root) = capabilities();
        fs::write(root.join("report.txt"), "r").expect("write");
        fs::create_dir(root.join("dir")).expect("mkdir");

        assert_eq!(
            fs_caps.prepare_download(&root, "report.txt").expect("download"),
            root.join("report.txt")
        );
        assert!(matches!(
            fs_caps.prepare_download(&root, "missing.txt"),
            Err(FileSystemError::PathNotFound(_))
        ));
        assert!(matches!(
            fs_caps.prepare_download(&root, "dir"),
            Err(FileSystemError::InvalidInput(_))
        ));
    }

    #[test]
    fn delete_removes_directories_recursively() {
        let (_dir, fs_caps, root) = capabilities();
        fs::create_dir_all(root.join("a/b/c")).expect("create tree");
        fs::write(root.join("a/b/c/deep.txt"), "deep").expect("write deep");
        fs::write(root.join("a/top.txt"), "top").expect("write top");

        let kind = fs_caps.delete(&root, "a").expect("delete a");
        assert_eq!(kind, EntryKind::Directory);
        assert!(!root.join("a").exists());

        let entries = fs_caps.list_directory(&root).expect("list");
        assert!(entries.iter().all(|e| e.name != "a"));
    }

    #[test]
    fn delete_removes_single_file() {
        let (_dir, fs_caps, root) = capabilities();
        fs::write(root.join("x.txt"), "x").expect("write");

        assert_eq!(fs_caps.delete(&root, "x.txt").expect("delete"), EntryKind::File);
        assert!(!root.join("x.txt").exists());
    }

    #[test]
    fn delete_validates_input() {
        let (_dir, fs_caps, root) = capabilities();

        assert!(matches!(
            fs_caps.delete(&root, ""),
            Err(FileSystemError::MissingArgument("target"))
        ));
        assert!(matches!(
            fs_caps.delete(&root, "ghost"),
            Err(FileSystemError::PathNotFound(_))
        ));
        assert!(matches!(
            fs_caps.delete(&root, "."),
            Err(FileSystemError::Forbidden(_))
        ));
        assert!(matches!(
            fs_caps.delete(&root, "../sandbox"),
            Err(FileSystemError::Forbidden(_))
        ));
        assert!(root.is_dir());
    }

    #[test]
    fn rename_within_folder() {
        let (_dir, fs_caps, root) = capabilities();
        fs::write(root.join("old.txt"), "content").expect("write");

        let renamed = fs_caps
            .rename(&root, "old.txt", "new.txt", false)
            .expect("rename");
        assert_eq!(renamed, root.join("new.txt"));
        assert!(!root.join("old.txt").exists());
        assert_eq!(fs::read_to_string(&renamed).expect("read"), "content");
    }

    #[test]
    fn rename_guards_existing_target_unless_overwrite() {
        let (_dir, fs_caps, root) = capabilities();
        fs::write(root.join("a.txt"), "a").expect("write a");
        fs::write(root.join("b.txt"), "b").expect("write b");

        let err = fs_caps
            .rename(&root, "a.txt", "b.txt", false)
            .expect_err("should refuse");
        assert!(matches!(err, FileSystemError::AlreadyExists(_)));
        assert_eq!(fs::read_to_string(root.join("b.txt")).expect("read"), "b");

        fs_caps
            .rename(&root, "a.txt", "b.txt", true)
            .expect("overwrite rename");
        assert_eq!(fs::read_to_string(root.join("b.txt")).expect("read"), "a");
    }

    #[test]
    fn rename_validates_input() {
        let (_dir, fs_caps, root) = capabilities();
        fs::create_dir(root.join("sub")).expect("mkdir");
        fs::write(root.join("a.txt"), "a").expect("write");

        assert!(matches!(
            fs_caps.rename(&root, "", "b", false),
            Err(FileSystemError::MissingArgument("current_name"))
        ));
        assert!(matches!(
            fs_caps.rename(&root, "a.txt", "", false),
            Err(FileSystemError::MissingArgument("new_name"))
        ));
        assert!(matches!(
            fs_caps.rename(&root, "ghost", "b", false),
            Err(FileSystemError::PathNotFound(_))
        ));
        assert!(matches!(
            fs_caps.rename(&root, "a.txt", "sub/a.txt", false),
            Err(FileSystemError::InvalidInput(_))
        ));
        assert!(matches!(
            fs_caps.rename(&root, "a.txt", "../a.txt", false),
            Err(FileSystemError::Forbidden(_))
        ));
    }

    #[test]
    fn cut_moves_file() {
        let (_dir, fs_caps, root) = capabilities();
        fs::create_dir(root.join("dest")).expect("mkdir");
        fs::write(root.join("x.txt"), "payload").expect("write");

        let destination = fs_caps
            .move_or_copy(&root, "x.txt", "dest", true)
            .expect("move");
        assert_eq!(destination, root.join("dest/x.txt"));
        assert!(!root.join("x.txt").exists());
        assert_eq!(fs::read_to_string(destination).expect("read"), "payload");
    }

    #[test]
    fn copy_keeps_source_and_mtime() {
        let (_dir, fs_caps, root) = capabilities();
        fs::create_dir(root.join("dest")).expect("mkdir");
        let source = root.join("x.txt");
        fs::write(&source, "payload").expect("write");
        let old = FileTime::from_unix_time(1_700_000_000, 0);
        filetime::set_file_times(&source, old, old).expect("set times");

        let source_abs = source.display().to_string();
        let dest_abs = root.join("dest").display().to_string();
        let destination = fs_caps
            .move_or_copy(&root, &source_abs, &dest_abs, false)
            .expect("copy");

        assert_eq!(fs::read_to_string(&source).expect("read source"), "payload");
        assert_eq!(fs::read_to_string(&destination).expect("read dest"), "payload");
        let dest_meta = fs::metadata(&destination).expect("dest metadata");
        assert_eq!(FileTime::from_last_modification_time(&dest_meta), old);
    }

    #[test]
    fn copy_directory_recursively() {
        let (_dir, fs_caps, root) = capabilities();
        fs::create_dir_all(root.join("src/nested")).expect("create src");
        fs::write(root.join("src/a.txt"), "a").expect("write a");
        fs::write(root.join("src/nested/b.txt"), "b").expect("write b");
        fs::create_dir(root.join("dest")).expect("mkdir dest");

        let destination = fs_caps
            .move_or_copy(&root, "src", "dest", false)
            .expect("copy dir");

        assert_eq!(destination, root.join("dest/src"));
        assert_eq!(fs::read_to_string(destination.join("a.txt")).expect("a"), "a");
        assert_eq!(
            fs::read_to_string(destination.join("nested/b.txt")).expect("b"),
            "b"
        );
        assert!(root.join("src/nested/b.txt").exists());
    }

    #[test]
    fn move_rejects_source_outside_sandbox() {
        let (dir, fs_caps, root) = capabilities();
        let outside = dir.path().join("outside.txt");
        fs::write(&outside, "secret").expect("write outside");
        fs::create_dir(root.join("dest")).expect("mkdir");

        let err = fs_caps
            .move_or_copy(&root, &outside.display().to_string(), "dest", true)
            .expect_err("outside source must be rejected");
        assert!(matches!(err, FileSystemError::Forbidden(_)));
        assert!(outside.exists());
        assert!(!root.join("dest/outside.txt").exists());
    }

    #[test]
    fn move_reports_missing_paths() {
        let (_dir, fs_caps, root) = capabilities();
        fs::write(root.join("x.txt"), "x").expect("write");

        assert!(matches!(
            fs_caps.move_or_copy(&root, "", "dest", true),
            Err(FileSystemError::InvalidInput(_))
        ));
        assert!(matches!(
            fs_caps.move_or_copy(&root, "ghost.txt", ".", true),
            Err(FileSystemError::SourceMissing(_))
        ));
        assert!(matches!(
            fs_caps.move_or_copy(&root, "x.txt", "nowhere", true),
            Err(FileSystemError::DestinationMissing(_))
        ));
        assert!(matches!(
            fs_caps.move_or_copy(&root, "x.txt", "x.txt", true),
            Err(FileSystemError::DestinationMissing(_))
        ));
    }

    #[test]
    fn move_refuses_existing_destination_and_self_nesting() {
        let (_dir, fs_caps, root) = capabilities();
        fs::create_dir_all(root.join("dir/inner")).expect("mkdir");
        fs::write(root.join("x.txt"), "x").expect("write");

        assert!(matches!(
            fs_caps.move_or_copy(&root, "x.txt", ".", false),
            Err(FileSystemError::AlreadyExists(_))
        ));
        assert!(matches!(
            fs_caps.move_or_copy(&root, "dir", "dir/inner", false),
            Err(FileSystemError::InvalidInput(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn copy_into_symlinked_subfolder_of_itself_is_rejected() {
        let (_dir, fs_caps, root) = capabilities();
        fs::create_dir_all(root.join("src/inner")).expect("create src");
        fs::write(root.join("src/a.txt"), "a").expect("write a");
        std::os::unix::fs::symlink(root.join("src/inner"), root.join("link")).expect("symlink");

        let err = fs_caps
            .move_or_copy(&root, "src", "link", false)
            .expect_err("nesting through a link must fail");
        assert!(matches!(err, FileSystemError::InvalidInput(_)), "{err}");
        assert!(!root.join("src/inner/src").exists());
    }

    #[cfg(unix)]
    #[test]
    fn links_pointing_outside_can_be_removed_but_not_copied() {
        let (dir, fs_caps, root) = capabilities();
        let outside = dir.path().join("outside.txt");
        fs::write(&outside, "s3cret").expect("write outside");
        fs::create_dir(root.join("dest")).expect("mkdir dest");
        std::os::unix::fs::symlink(&outside, root.join("link")).expect("symlink");

        assert!(matches!(
            fs_caps.move_or_copy(&root, "link", "dest", false),
            Err(FileSystemError::Forbidden(_))
        ));
        assert!(!root.join("dest/link").exists());

        fs_caps
            .rename(&root, "link", "renamed", false)
            .expect("rename link");
        assert!(fs::symlink_metadata(root.join("renamed")).is_ok());

        assert_eq!(fs_caps.delete(&root, "renamed").expect("delete link"), EntryKind::Other);
        assert!(fs::symlink_metadata(root.join("renamed")).is_err());
        assert_eq!(fs::read_to_string(&outside).expect("outside intact"), "s3cret");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn list_skips_names_that_are_not_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (_dir, fs_caps, root) = capabilities();
        fs::write(root.join("ok.txt"), "ok").expect("write ok");
        fs::write(root.join(OsStr::from_bytes(b"bad\xff.txt")), "bad").expect("write bad");

        let entries = fs_caps.list_directory(&root).expect("list");
        assert_eq!(names(&entries), vec!["ok.txt"]);
    }

    #[test]
    fn cut_moves_directory_with_contents() {
        let (_dir, fs_caps, root) = capabilities();
        fs::create_dir_all(root.join("src/nested")).expect("create src");
        fs::write(root.join("src/nested/b.txt"), "b").expect("write b");
        fs::create_dir(root.join("dest")).expect("mkdir dest");

        let destination = fs_caps
            .move_or_copy(&root, "src", "dest", true)
            .expect("move dir");

        assert_eq!(destination, root.join("dest/src"));
        assert!(!root.join("src").exists());
        assert_eq!(
            fs::read_to_string(destination.join("nested/b.txt")).expect("b"),
            "b"
        );
    }

    #[test]
    fn copy_directory_preserves_times() {
        let (_dir, fs_caps, root) = capabilities();
        fs::create_dir_all(root.join("src/nested")).expect("create src");
        fs::write(root.join("src/nested/b.txt"), "b").expect("write b");
        fs::create_dir(root.join("dest")).expect("mkdir dest");
        let file_time = FileTime::from_unix_time(1_600_000_000, 0);
        let dir_time = FileTime::from_unix_time(1_650_000_000, 0);
        filetime::set_file_times(root.join("src/nested/b.txt"), file_time, file_time)
            .expect("set file times");
        filetime::set_file_times(root.join("src/nested"), dir_time, dir_time)
            .expect("set dir times");

        let destination = fs_caps
            .move_or_copy(&root, "src", "dest", false)
            .expect("copy dir");

        let file_meta = fs::metadata(destination.join("nested/b.txt")).expect("file metadata");
        assert_eq!(FileTime::from_last_modification_time(&file_meta), file_time);
        let dir_meta = fs::metadata(destination.join("nested")).expect("dir metadata");
        assert_eq!(FileTime::from_last_modification_time(&dir_meta), dir_time);
    }

    #[cfg(unix)]
    #[test]
    fn copy_directory_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, fs_caps, root) = capabilities();
        fs::create_dir_all(root.join("src/nested")).expect("create src");
        fs::write(root.join("src/run.sh"), "#!/bin/sh").expect("write script");
        fs::create_dir(root.join("dest")).expect("mkdir dest");
        fs::set_permissions(root.join("src/run.sh"), fs::Permissions::from_mode(0o750))
            .expect("chmod script");
        fs::set_permissions(root.join("src/nested"), fs::Permissions::from_mode(0o700))
            .expect("chmod dir");

        let destination = fs_caps
            .move_or_copy(&root, "src", "dest", false)
            .expect("copy dir");

        let mode = |path: PathBuf| {
            fs::metadata(path)
                .expect("metadata")
                .permissions()
                .mode()
                & 0o777
        };
        assert_eq!(mode(destination.join("run.sh")), 0o750);
        assert_eq!(mode(destination.join("nested")), 0o700);
    }
}
