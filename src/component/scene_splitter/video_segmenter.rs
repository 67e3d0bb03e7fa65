use super::clip_exporter::{ClipEncoder, ClipExporter, ExportOutcome};
use super::events::{EventEmitter, SceneResult};
use super::scene_detector::SceneDetector;
use crate::error::VideoError;
use crate::signal::CancelFlag;
use crate::tools::{OutputLayout, VideoTask, ensure_directory_exists};
use log::{error, warn};

/// 開始偵測時回報的進度
pub const DETECTING_PROGRESS: u8 = 10;
/// 偵測完成、開始匯出時的進度；匯出佔剩下的 50%
pub const DETECTED_PROGRESS: u8 = 50;

/// 單部影片中各場景的處理統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneTally {
    pub total: usize,
    pub exported: usize,
    pub reused: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub enum SegmentOutcome {
    Completed(SceneTally),
    Cancelled(SceneTally),
    Failed(VideoError),
}

/// `50 + floor(done / total * 50)`
#[must_use]
pub fn scene_progress(scenes_done: usize, total_scenes: usize) -> u8 {
    if total_scenes == 0 {
        return 100;
    }
    let done = scenes_done.min(total_scenes);
    DETECTED_PROGRESS + (done * 50 / total_scenes) as u8
}

/// 驅動偵測與匯出處理一部影片
///
/// 流程: 偵測 -> 依序匯出各場景 -> 完成。
/// 取消只在場景之間檢查；單一場景匯出失敗不影響其他場景。
pub struct VideoSegmenter<'a, E> {
    layout: &'a OutputLayout,
    exporter: &'a ClipExporter<E>,
    events: &'a EventEmitter,
    cancel: &'a CancelFlag,
    extract_keyframes: bool,
}

impl<'a, E: ClipEncoder> VideoSegmenter<'a, E> {
    pub const fn new(
        layout: &'a OutputLayout,
        exporter: &'a ClipExporter<E>,
        events: &'a EventEmitter,
        cancel: &'a CancelFlag,
        extract_keyframes: bool,
    ) -> Self {
        Self {
            layout,
            exporter,
            events,
            cancel,
            extract_keyframes,
        }
    }

    pub fn segment<D>(&self, detector: &mut D, task: &VideoTask) -> SegmentOutcome
    where
        D: SceneDetector + ?Sized,
    {
        let video_name = task.display_name.as_str();
        self.events.log(format!("開始處理: {video_name}"));

        if let Err(e) = self.prepare_directories(video_name) {
            return self.fail(video_name, e);
        }

        self.events.log(format!("正在分析場景: {video_name} ..."));
        self.events.video_progress(video_name, DETECTING_PROGRESS);

        let detection = match detector
            .detect(&task.source_path)
            .and_then(|detection| detection.validate().map(|()| detection))
        {
            Ok(detection) => detection,
            Err(e) => return self.fail(video_name, e.into()),
        };

        let total = detection.boundaries.len();
        self.events.video_progress(video_name, DETECTED_PROGRESS);
        self.events
            .log(format!("場景分析完成，共識別出 {total} 個場景"));

        let mut tally = SceneTally {
            total,
            ..SceneTally::default()
        };
        let fps = detection.frame_rate;

        for (i, boundary) in detection.boundaries.iter().enumerate() {
            if self.cancel.is_cancelled() {
                self.events
                    .log(format!("{video_name} 已中斷，完成 {i}/{total} 個場景"));
                return SegmentOutcome::Cancelled(tally);
            }

            let scene_index = (i + 1) as u32;
            let clip_path = self.layout.scene_clip_path(video_name, scene_index);
            let start_time = boundary.start_time(fps);
            let end_time = boundary.end_time(fps);
            let clip_name = OutputLayout::scene_base_name(video_name, scene_index);

            match self.exporter.export_clip(
                &task.source_path,
                start_time,
                end_time,
                &clip_path,
                fps,
            ) {
                Ok(ExportOutcome::AlreadyExists) => {
                    tally.reused += 1;
                    self.events.log(format!("跳過已存在: {clip_name}"));
                }
                Ok(ExportOutcome::Written) => {
                    tally.exported += 1;
                    self.events
                        .log(format!("導出片段 {scene_index}/{total}: {clip_name}"));
                }
                Err(e) => {
                    tally.failed += 1;
                    warn!("{video_name} 場景 {scene_index} 匯出失敗: {e}");
                    self.events
                        .log(format!("片段匯出失敗 {clip_name}: {e}，下次執行時重試"));
                    self.events
                        .video_progress(video_name, scene_progress(i + 1, total));
                    continue;
                }
            }

            if self.extract_keyframes {
                let keyframe_path = self.layout.scene_keyframe_path(video_name, scene_index);
                match self
                    .exporter
                    .export_keyframe(&task.source_path, start_time, &keyframe_path)
                {
                    Ok(_) => self.events.result(SceneResult::Keyframe {
                        video: video_name.to_string(),
                        scene_index,
                        image_path: keyframe_path,
                        video_path: clip_path,
                    }),
                    Err(e) => {
                        warn!("{video_name} 場景 {scene_index} 關鍵幀擷取失敗: {e}");
                        self.events
                            .log(format!("關鍵幀提取失敗 {clip_name}: {e}"));
                    }
                }
            }

            self.events
                .video_progress(video_name, scene_progress(i + 1, total));
        }

        self.events.video_progress(video_name, 100);
        SegmentOutcome::Completed(tally)
    }

    fn prepare_directories(&self, video_name: &str) -> Result<(), VideoError> {
        ensure_directory_exists(&self.layout.video_dir(video_name))?;
        if self.extract_keyframes {
            ensure_directory_exists(&self.layout.keyframes_dir(video_name))?;
        }
        Ok(())
    }

    fn fail(&self, video_name: &str, e: VideoError) -> SegmentOutcome {
        error!("處理影片 {video_name} 失敗: {e}");
        self.events
            .log(format!("處理影片 {video_name} 失敗: {e}"));
        SegmentOutcome::Failed(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_progress_interpolates() {
        assert_eq!(scene_progress(0, 4), 50);
        assert_eq!(scene_progress(1, 4), 62);
        assert_eq!(scene_progress(2, 4), 75);
        assert_eq!(scene_progress(3, 4), 87);
        assert_eq!(scene_progress(4, 4), 100);
    }

    #[test]
    fn test_scene_progress_floors() {
        assert_eq!(scene_progress(1, 3), 66);
        assert_eq!(scene_progress(2, 3), 83);
    }

    #[test]
    fn test_scene_progress_without_scenes() {
        assert_eq!(scene_progress(0, 0), 100);
    }
}
