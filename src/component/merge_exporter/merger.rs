use crate::error::FilesystemError;
use crate::tools::{
    CLIP_EXTENSION, KEYFRAME_EXTENSION, KEYFRAMES_DIR_NAME, OutputLayout,
    ensure_directory_exists, list_files_with_extension, list_scene_clips, partial_path,
};
use log::{info, warn};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// 合併後的一個項目
///
/// 由 `plan_merge` 產生時路徑指向來源片段；由 `list_merged` 產生時指向 `merged/` 內的檔案。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedItem {
    pub sequence_number: usize,
    pub clip_path: PathBuf,
    pub keyframe_path: Option<PathBuf>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub planned: usize,
    pub copied: usize,
    pub failed: usize,
    pub thumbnails_copied: usize,
    pub stale_removed: usize,
}

/// 依「影片資料夾名稱 -> 片段檔名」排序後，給每個片段 1..N 的編號
pub fn plan_merge(layout: &OutputLayout) -> Result<Vec<MergedItem>, FilesystemError> {
    let mut items = Vec::new();

    for (_, video_dir) in layout.video_dirs()? {
        let keyframes_dir = video_dir.join(KEYFRAMES_DIR_NAME);
        for clip_path in list_scene_clips(&video_dir)? {
            let keyframe_path = clip_path
                .file_stem()
                .map(|stem| {
                    let name = format!("{}.{KEYFRAME_EXTENSION}", stem.to_string_lossy());
                    keyframes_dir.join(name)
                })
                .filter(|path| path.is_file());

            items.push(MergedItem {
                sequence_number: items.len() + 1,
                clip_path,
                keyframe_path,
            });
        }
    }

    Ok(items)
}

/// 把所有片段複製到 `merged/` 並重新編號
///
/// 每次都從目前的磁碟內容重新排序，不沿用上一次的編號。
/// 單一檔案複製失敗只記錄，不影響其他檔案。
pub fn merge_outputs(layout: &OutputLayout) -> Result<MergeReport, FilesystemError> {
    let items = plan_merge(layout)?;
    if items.is_empty() {
        info!("沒有可合併的片段: {}", layout.root().display());
        return Ok(MergeReport::default());
    }

    ensure_directory_exists(&layout.merged_dir())?;
    ensure_directory_exists(&layout.merged_thumbnails_dir())?;

    let copied = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let thumbnails_copied = AtomicUsize::new(0);

    items.par_iter().for_each(|item| {
        let clip_dest = layout.merged_clip_path(item.sequence_number);
        let thumb_dest = layout.merged_thumbnail_path(item.sequence_number);

        // 同編號的舊檔屬於上一次合併的其他片段，失敗時不可留下
        if let Err(e) = copy_file(&item.clip_path, &clip_dest) {
            warn!("複製失敗: {e}");
            failed.fetch_add(1, Ordering::Relaxed);
            remove_leftover(&clip_dest);
            remove_leftover(&thumb_dest);
            return;
        }
        copied.fetch_add(1, Ordering::Relaxed);

        match &item.keyframe_path {
            Some(keyframe) => match copy_file(keyframe, &thumb_dest) {
                Ok(()) => {
                    thumbnails_copied.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    warn!("縮圖複製失敗: {e}");
                    remove_leftover(&thumb_dest);
                }
            },
            None => remove_leftover(&thumb_dest),
        }
    });

    let stale_removed = remove_stale_entries(layout, items.len());

    let report = MergeReport {
        planned: items.len(),
        copied: copied.into_inner(),
        failed: failed.into_inner(),
        thumbnails_copied: thumbnails_copied.into_inner(),
        stale_removed,
    };
    info!(
        "合併完成: {} 個片段, 失敗 {}, 縮圖 {} -> {}",
        report.copied,
        report.failed,
        report.thumbnails_copied,
        layout.merged_dir().display()
    );
    Ok(report)
}

/// 讀取 `merged/` 目前的內容，依編號排序
pub fn list_merged(layout: &OutputLayout) -> Result<Vec<MergedItem>, FilesystemError> {
    let merged_dir = layout.merged_dir();
    if !merged_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut items: Vec<MergedItem> = list_files_with_extension(&merged_dir, CLIP_EXTENSION)?
        .into_iter()
        .filter_map(|clip_path| {
            let sequence_number = sequence_of(&clip_path)?;
            let thumbnail = layout.merged_thumbnail_path(sequence_number);
            Some(MergedItem {
                sequence_number,
                keyframe_path: thumbnail.is_file().then_some(thumbnail),
                clip_path,
            })
        })
        .collect();

    items.sort_by_key(|item| item.sequence_number);
    Ok(items)
}

/// 先複製到 `.part` 再改名，目的檔不會是複製到一半的內容
fn copy_file(from: &Path, to: &Path) -> Result<(), FilesystemError> {
    let partial = partial_path(to);
    let result = fs::copy(from, &partial)
        .and_then(|_| fs::rename(&partial, to))
        .map_err(|source| FilesystemError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        });

    if result.is_err() {
        remove_leftover(&partial);
    }
    result
}

fn remove_leftover(path: &Path) {
    if path.is_file() {
        if let Err(e) = fs::remove_file(path) {
            warn!("無法移除舊檔 {}: {e}", path.display());
        }
    }
}

/// `007.mp4` -> 7；非純數字檔名不是合併產物
fn sequence_of(path: &Path) -> Option<usize> {
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// 上一次合併留下、這次已超出範圍的編號檔案
fn remove_stale_entries(layout: &OutputLayout, planned: usize) -> usize {
    let mut removed = 0;
    let dirs = [
        (layout.merged_dir(), CLIP_EXTENSION),
        (layout.merged_thumbnails_dir(), KEYFRAME_EXTENSION),
    ];

    for (dir, extension) in dirs {
        let Ok(files) = list_files_with_extension(&dir, extension) else {
            continue;
        };
        for path in files {
            if sequence_of(&path).is_some_and(|seq| seq > planned) {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!("無法移除過期檔案 {}: {e}", path.display()),
                }
            }
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_of() {
        assert_eq!(sequence_of(Path::new("/m/007.mp4")), Some(7));
        assert_eq!(sequence_of(Path::new("/m/1000.mp4")), Some(1000));
        assert_eq!(sequence_of(Path::new("/m/a_scene_001.mp4")), None);
        assert_eq!(sequence_of(Path::new("/m/.mp4")), None);
    }
}
