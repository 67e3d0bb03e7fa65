use crate::error::ExportError;
use crate::tools::OutputLayout;
use log::debug;
use std::fs;
use std::path::Path;

/// 影片編碼能力（外部工具）
///
/// 實作必須保證目的檔出現時已完整寫入。
pub trait ClipEncoder {
    fn extract_range(
        &self,
        source: &Path,
        start_time: f64,
        end_time: f64,
        frame_rate: f64,
        destination: &Path,
    ) -> Result<(), ExportError>;

    fn extract_frame(
        &self,
        source: &Path,
        at_time: f64,
        destination: &Path,
    ) -> Result<(), ExportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    Written,
    AlreadyExists,
}

/// 匯出單一場景；目的檔已存在時不做任何事
pub struct ClipExporter<E> {
    encoder: E,
}

impl<E: ClipEncoder> ClipExporter<E> {
    pub const fn new(encoder: E) -> Self {
        Self { encoder }
    }

    pub fn export_clip(
        &self,
        source: &Path,
        start_time: f64,
        end_time: f64,
        destination: &Path,
        frame_rate: f64,
    ) -> Result<ExportOutcome, ExportError> {
        if OutputLayout::is_scene_done(destination) {
            debug!("片段已存在: {}", destination.display());
            return Ok(ExportOutcome::AlreadyExists);
        }

        if end_time <= start_time {
            return Err(ExportError::encoder(
                destination,
                format!("時間範圍不合法: {start_time:.3}s - {end_time:.3}s"),
            ));
        }

        ensure_parent(destination)?;
        self.encoder
            .extract_range(source, start_time, end_time, frame_rate, destination)?;
        Ok(ExportOutcome::Written)
    }

    /// 擷取場景起始幀作為縮圖
    pub fn export_keyframe(
        &self,
        source: &Path,
        at_time: f64,
        destination: &Path,
    ) -> Result<ExportOutcome, ExportError> {
        if OutputLayout::is_scene_done(destination) {
            debug!("關鍵幀已存在: {}", destination.display());
            return Ok(ExportOutcome::AlreadyExists);
        }

        ensure_parent(destination)?;
        self.encoder.extract_frame(source, at_time, destination)?;
        Ok(ExportOutcome::Written)
    }
}

fn ensure_parent(destination: &Path) -> Result<(), ExportError> {
    match destination.parent() {
        Some(parent) if !parent.exists() => {
            fs::create_dir_all(parent).map_err(|source| ExportError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
