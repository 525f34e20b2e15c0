//! 导出文件存储模块
//!
//! # 设计思路
//!
//! 统一管理二维码导出文件的落盘路径，支持用户自定义目录，
//! 并在目录不存在时自动创建。
//!
//! # 实现思路
//!
//! - 优先使用设置中的自定义目录，未设置时回退到当前目录下的 `qr-output`。
//! - 文件名去掉用户给出的扩展名，再按导出格式追加扩展名。
//! - 同名文件已存在时追加时间戳后缀，不覆盖已有文件。

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::error::AppError;

/// 默认输出目录名。
pub const DEFAULT_OUTPUT_DIR: &str = "qr-output";

/// 未指定文件名时使用的基础名。
pub const DEFAULT_FILE_STEM: &str = "qr-code";

/// 已写入文件的信息
#[derive(Debug, Clone, Serialize)]
pub struct SavedFile {
    pub path: String,
    pub size: u64,
}

/// 获取输出目录
///
/// # 参数
/// * `custom_dir` - 用户自定义目录（可选）
///
/// # 返回
/// - `Ok(PathBuf)` — 可用的输出目录
/// - `Err(AppError::Storage)` — 无法创建目录
pub fn get_output_dir(custom_dir: Option<&str>) -> Result<PathBuf, AppError> {
    let path = match custom_dir.map(str::trim).filter(|d| !d.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(DEFAULT_OUTPUT_DIR),
    };

    if !path.exists() {
        fs::create_dir_all(&path)
            .map_err(|e| AppError::Storage(format!("创建输出目录 '{}' 失败: {}", path.display(), e)))?;
    }
    Ok(path)
}

/// 去掉扩展名后的文件基础名，空名回退为 `qr-code`。
///
/// 与浏览器下载行为一致：从第一个 `.` 起全部视为扩展名，但 `.` 之后至少要有一个字符，
/// 结尾的孤立 `.` 保留（`name.` → `name.`）。
pub fn file_stem(name: &str) -> &str {
    let name = name.trim();
    let stem = match name.find('.') {
        Some(idx) if idx + 1 < name.len() => &name[..idx],
        _ => name,
    };
    if stem.is_empty() { DEFAULT_FILE_STEM } else { stem }
}

/// 在 `dir` 下选一个不与现有文件冲突的路径。
pub fn unique_file_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let candidate = dir.join(format!("{}.{}", stem, extension));
    if !candidate.exists() {
        return candidate;
    }

    let timestamp = Local::now().format("%Y%m%d%H%M%S%f");
    let stamped = dir.join(format!("{}_{}.{}", stem, timestamp, extension));
    if !stamped.exists() {
        return stamped;
    }

    let mut counter = 1u32;
    loop {
        let path = dir.join(format!("{}_{}_{}.{}", stem, timestamp, counter, extension));
        if !path.exists() {
            return path;
        }
        counter += 1;
    }
}

/// 写入导出文件
pub fn save_export(dir: &Path, name: &str, extension: &str, bytes: &[u8]) -> Result<SavedFile, AppError> {
    let path = unique_file_path(dir, file_stem(name), extension);
    fs::write(&path, bytes)?;

    log::info!("💾 二维码已保存: {} ({} 字节)", path.display(), bytes.len());
    Ok(SavedFile {
        path: path.to_string_lossy().to_string(),
        size: bytes.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn unique_temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("qr-platform-storage-test-{nanos}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn stem_strips_everything_after_first_dot() {
        assert_eq!(file_stem("qr-email.png"), "qr-email");
        assert_eq!(file_stem("archive.tar.gz"), "archive");
        assert_eq!(file_stem("qr-url"), "qr-url");
        assert_eq!(file_stem(".png"), "qr-code");
        assert_eq!(file_stem("  "), "qr-code");
    }

    #[test]
    fn trailing_dot_is_not_an_extension() {
        assert_eq!(file_stem("name."), "name.");
        assert_eq!(file_stem("name.."), "name");
        assert_eq!(file_stem("a.b."), "a");
    }

    #[test]
    fn existing_files_are_not_overwritten() {
        let dir = unique_temp_dir();

        let first = save_export(&dir, "qr-text.png", "png", b"one").expect("first save");
        let second = save_export(&dir, "qr-text", "png", b"two").expect("second save");

        assert_ne!(first.path, second.path);
        assert!(first.path.ends_with("qr-text.png"));
        assert_eq!(std::fs::read(&first.path).expect("read first"), b"one");
        assert_eq!(std::fs::read(&second.path).expect("read second"), b"two");

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn custom_dir_is_created_on_demand() {
        let dir = unique_temp_dir().join("nested").join("out");
        let resolved = get_output_dir(Some(dir.to_string_lossy().as_ref())).expect("resolve");

        assert_eq!(resolved, dir);
        assert!(dir.exists());
        let _ = std::fs::remove_dir_all(dir);
    }
}
