//! 輸出目錄結構
//!
//! ```text
//! {root}/{video}/{video}_scene_001.mp4
//! {root}/{video}/keyframes/{video}_scene_001.jpg
//! {root}/merged/001.mp4
//! {root}/merged/thumbnails/001.jpg
//! ```
//!
//! 續跑狀態完全由這個結構推導，沒有額外的紀錄檔：
//! 影片資料夾中至少有一個片段即視為已處理，片段檔存在即視為該場景已匯出。

use crate::error::FilesystemError;
use regex::Regex;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const CLIP_EXTENSION: &str = "mp4";
pub const KEYFRAME_EXTENSION: &str = "jpg";
pub const KEYFRAMES_DIR_NAME: &str = "keyframes";
pub const MERGED_DIR_NAME: &str = "merged";
pub const THUMBNAILS_DIR_NAME: &str = "thumbnails";
pub const OUTPUT_DIR_NAME: &str = "output";
pub const PARTIAL_SUFFIX: &str = ".part";

static SCENE_INDEX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_scene_(\d+)$").expect("Invalid regex"));

/// 磁碟上已存在的關鍵幀及其對應片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyframeEntry {
    pub scene_index: u32,
    pub image_path: PathBuf,
    pub clip_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 影片資料夾旁的 `output/`
    #[must_use]
    pub fn for_input_folder(input_folder: &Path) -> Self {
        Self::new(input_folder.join(OUTPUT_DIR_NAME))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn video_dir(&self, video_name: &str) -> PathBuf {
        self.root.join(video_name)
    }

    #[must_use]
    pub fn keyframes_dir(&self, video_name: &str) -> PathBuf {
        self.video_dir(video_name).join(KEYFRAMES_DIR_NAME)
    }

    #[must_use]
    pub fn scene_base_name(video_name: &str, scene_index: u32) -> String {
        format!("{video_name}_scene_{scene_index:03}")
    }

    #[must_use]
    pub fn scene_clip_path(&self, video_name: &str, scene_index: u32) -> PathBuf {
        self.video_dir(video_name).join(format!(
            "{}.{CLIP_EXTENSION}",
            Self::scene_base_name(video_name, scene_index)
        ))
    }

    #[must_use]
    pub fn scene_keyframe_path(&self, video_name: &str, scene_index: u32) -> PathBuf {
        self.keyframes_dir(video_name).join(format!(
            "{}.{KEYFRAME_EXTENSION}",
            Self::scene_base_name(video_name, scene_index)
        ))
    }

    /// 資料夾存在且至少含有一個片段檔
    #[must_use]
    pub fn is_video_done(&self, video_name: &str) -> bool {
        fs::read_dir(self.video_dir(video_name)).is_ok_and(|entries| {
            entries
                .filter_map(Result::ok)
                .any(|entry| entry.path().is_file() && is_scene_clip_file(&entry.path()))
        })
    }

    #[must_use]
    pub fn is_scene_done(path: &Path) -> bool {
        path.exists()
    }

    #[must_use]
    pub fn merged_dir(&self) -> PathBuf {
        self.root.join(MERGED_DIR_NAME)
    }

    #[must_use]
    pub fn merged_thumbnails_dir(&self) -> PathBuf {
        self.merged_dir().join(THUMBNAILS_DIR_NAME)
    }

    #[must_use]
    pub fn merged_clip_path(&self, sequence_number: usize) -> PathBuf {
        self.merged_dir()
            .join(format!("{sequence_number:03}.{CLIP_EXTENSION}"))
    }

    #[must_use]
    pub fn merged_thumbnail_path(&self, sequence_number: usize) -> PathBuf {
        self.merged_thumbnails_dir()
            .join(format!("{sequence_number:03}.{KEYFRAME_EXTENSION}"))
    }

    /// 所有影片輸出資料夾（排除 `merged/`），依名稱排序
    pub fn video_dirs(&self) -> Result<Vec<(String, PathBuf)>, FilesystemError> {
        let entries = fs::read_dir(&self.root).map_err(|source| FilesystemError::ReadDir {
            path: self.root.clone(),
            source,
        })?;

        let mut dirs: Vec<(String, PathBuf)> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .map(|entry| (entry.file_name().to_string_lossy().to_string(), entry.path()))
            .filter(|(name, _)| name != MERGED_DIR_NAME)
            .collect();

        dirs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(dirs)
    }

    /// 讀取某部影片已產生的關鍵幀，依檔名排序；無法解析場景編號的檔案略過
    #[must_use]
    pub fn existing_keyframes(&self, video_name: &str) -> Vec<KeyframeEntry> {
        let keyframes_dir = self.keyframes_dir(video_name);
        let Ok(images) = list_files_with_extension(&keyframes_dir, KEYFRAME_EXTENSION) else {
            return Vec::new();
        };

        let video_dir = self.video_dir(video_name);
        images
            .into_iter()
            .filter_map(|image_path| {
                let stem = image_path.file_stem()?.to_string_lossy().to_string();
                let scene_index = parse_scene_index(&stem)?;
                Some(KeyframeEntry {
                    scene_index,
                    clip_path: video_dir.join(format!("{stem}.{CLIP_EXTENSION}")),
                    image_path,
                })
            })
            .collect()
    }
}

#[must_use]
pub fn is_scene_clip_file(path: &Path) -> bool {
    has_extension(path, CLIP_EXTENSION)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// 列出資料夾內（不遞迴）所有片段檔，依檔名排序
pub fn list_scene_clips(dir: &Path) -> Result<Vec<PathBuf>, FilesystemError> {
    list_files_with_extension(dir, CLIP_EXTENSION)
}

pub(crate) fn list_files_with_extension(
    dir: &Path,
    extension: &str,
) -> Result<Vec<PathBuf>, FilesystemError> {
    let entries = fs::read_dir(dir).map_err(|source| FilesystemError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, extension))
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// `clip_scene_007` -> 7
#[must_use]
pub fn parse_scene_index(stem: &str) -> Option<u32> {
    SCENE_INDEX_REGEX.captures(stem)?.get(1)?.as_str().parse().ok()
}

/// 寫入中的暫存檔：`001.mp4` -> `001.mp4.part`
#[must_use]
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name: OsString = destination.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_scene_paths() {
        let layout = OutputLayout::new("/data/output");
        assert_eq!(
            layout.scene_clip_path("trip", 7),
            PathBuf::from("/data/output/trip/trip_scene_007.mp4")
        );
        assert_eq!(
            layout.scene_keyframe_path("trip", 12),
            PathBuf::from("/data/output/trip/keyframes/trip_scene_012.jpg")
        );
        assert_eq!(
            layout.merged_clip_path(3),
            PathBuf::from("/data/output/merged/003.mp4")
        );
        assert_eq!(
            layout.merged_thumbnail_path(3),
            PathBuf::from("/data/output/merged/thumbnails/003.jpg")
        );
    }

    #[test]
    fn test_for_input_folder() {
        let layout = OutputLayout::for_input_folder(Path::new("/videos"));
        assert_eq!(layout.root(), Path::new("/videos/output"));
    }

    #[test]
    fn test_is_video_done_requires_a_clip() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());

        assert!(!layout.is_video_done("a"));

        fs::create_dir_all(layout.keyframes_dir("a")).unwrap();
        fs::write(layout.scene_keyframe_path("a", 1), b"jpg").unwrap();
        assert!(!layout.is_video_done("a"), "只有關鍵幀不算完成");

        fs::write(layout.scene_clip_path("a", 1), b"mp4").unwrap();
        assert!(layout.is_video_done("a"));
    }

    #[test]
    fn test_partial_file_is_not_a_clip() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        fs::create_dir_all(layout.video_dir("a")).unwrap();
        fs::write(layout.video_dir("a").join("a_scene_001.mp4.part"), b"x").unwrap();

        assert!(!layout.is_video_done("a"));
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/out/v/v_scene_001.mp4")),
            PathBuf::from("/out/v/v_scene_001.mp4.part")
        );
    }

    #[test]
    fn test_parse_scene_index() {
        assert_eq!(parse_scene_index("trip_scene_007"), Some(7));
        assert_eq!(parse_scene_index("my_scene_video_scene_120"), Some(120));
        assert_eq!(parse_scene_index("trip_007"), None);
        assert_eq!(parse_scene_index("trip_scene_"), None);
    }

    #[test]
    fn test_existing_keyframes_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        fs::create_dir_all(layout.keyframes_dir("v")).unwrap();
        fs::write(layout.scene_keyframe_path("v", 2), b"2").unwrap();
        fs::write(layout.scene_keyframe_path("v", 1), b"1").unwrap();
        fs::write(layout.keyframes_dir("v").join("cover.jpg"), b"x").unwrap();
        fs::write(layout.keyframes_dir("v").join("notes.txt"), b"x").unwrap();

        let entries = layout.existing_keyframes("v");
        let indices: Vec<u32> = entries.iter().map(|e| e.scene_index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(entries[0].clip_path, layout.scene_clip_path("v", 1));
    }

    #[test]
    fn test_video_dirs_excludes_merged() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        for name in ["b", "merged", "a"] {
            fs::create_dir_all(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("stray.mp4"), b"x").unwrap();

        let names: Vec<String> = layout
            .video_dirs()
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
