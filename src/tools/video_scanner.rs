use crate::tools::output_layout::CLIP_EXTENSION;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 一部待處理的影片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoTask {
    pub source_path: PathBuf,
    /// 檔名去掉副檔名，也是輸出資料夾名稱
    pub display_name: String,
}

impl VideoTask {
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let display_name = path
            .file_stem()
            .map_or_else(|| "video".to_string(), |s| s.to_string_lossy().to_string());
        Self {
            source_path: path.to_path_buf(),
            display_name,
        }
    }
}

/// 掃描資料夾第一層的影片檔，依檔名排序
///
/// 不遞迴，避免把 `output/` 裡的片段當成輸入。
pub fn scan_video_files(directory: &Path) -> Result<Vec<VideoTask>> {
    let mut videos = Vec::new();

    for entry in WalkDir::new(directory).min_depth(1).max_depth(1).follow_links(false) {
        let entry =
            entry.with_context(|| format!("無法讀取目錄: {}", directory.display()))?;
        if entry.file_type().is_file() && is_input_video(entry.path()) {
            videos.push(VideoTask::from_path(entry.path()));
        }
    }

    videos.sort_by(|a, b| a.source_path.file_name().cmp(&b.source_path.file_name()));
    Ok(videos)
}

fn is_input_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CLIP_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_video_task_display_name() {
        let task = VideoTask::from_path(Path::new("/videos/holiday.trip.mp4"));
        assert_eq!(task.display_name, "holiday.trip");
    }

    #[test]
    fn test_scan_is_flat_and_sorted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.mp4"), b"x").unwrap();
        fs::write(dir.path().join("a.MP4"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir_all(dir.path().join("output/a")).unwrap();
        fs::write(dir.path().join("output/a/a_scene_001.mp4"), b"x").unwrap();

        let videos = scan_video_files(dir.path()).unwrap();
        let names: Vec<&str> = videos.iter().map(|v| v.display_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
