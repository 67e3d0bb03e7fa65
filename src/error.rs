//! 錯誤分類
//!
//! - `DetectionError`：單一影片致命，批次繼續下一部
//! - `ExportError`：單一場景可恢復，記錄後跳過，下次執行時自動重試
//! - `FilesystemError`：建立資料夾或複製失敗，記錄後繼續處理其他項目
//!
//! 以上都無法涵蓋的錯誤以 `anyhow::Error` 往上傳遞，終止整個批次。

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("場景偵測工具無法使用: {0}")]
    Unavailable(String),

    #[error("無法讀取影片資訊 {path}: {message}")]
    Probe { path: PathBuf, message: String },

    #[error("場景偵測失敗 {path}: {message}")]
    Failed { path: PathBuf, message: String },

    #[error("場景邊界不合法: {0}")]
    InvalidBoundaries(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("編碼失敗 {path}: {message}")]
    Encoder { path: PathBuf, message: String },

    #[error("無法寫入 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub fn encoder(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Encoder {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FilesystemError {
    #[error("無法建立資料夾 {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("無法讀取資料夾 {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("無法複製 {from} -> {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 讓單一影片停止處理的錯誤
#[derive(Debug, Error)]
pub enum VideoError {
    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}
