use super::clip_exporter::{ClipEncoder, ClipExporter};
use super::events::{EventEmitter, ProcessingState, SceneResult};
use super::scene_detector::DetectorLoader;
use super::video_segmenter::{SegmentOutcome, VideoSegmenter};
use crate::signal::CancelFlag;
use crate::tools::{OutputLayout, VideoTask};
use anyhow::{Context, Result};
use log::{error, info};

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub extract_keyframes: bool,
    /// 已有輸出的影片直接跳過，不載入模型
    pub skip_existing: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            extract_keyframes: true,
            skip_existing: true,
        }
    }
}

/// 一次批次中每部影片的最終狀態，順序與輸入相同
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<(String, ProcessingState)>,
    pub cancelled: bool,
}

impl BatchReport {
    #[must_use]
    pub fn count(&self, state: ProcessingState) -> usize {
        self.outcomes.iter().filter(|(_, s)| *s == state).count()
    }

    #[must_use]
    pub fn state_of(&self, video_name: &str) -> Option<ProcessingState> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == video_name)
            .map(|(_, state)| *state)
    }
}

/// 批次場景切割
///
/// 1. 逐一檢查輸出目錄，已完成的影片標記為跳過並補送既有結果
/// 2. 全部跳過時直接結束，不載入偵測模型
/// 3. 否則載入模型一次，依輸入順序逐部處理（模型不支援並行）
///
/// 批次進度在每部影片到達終止狀態後才回報，且只增不減。
pub struct BatchPipeline<L: DetectorLoader, E> {
    layout: OutputLayout,
    options: BatchOptions,
    loader: Option<L>,
    detector: Option<L::Detector>,
    exporter: ClipExporter<E>,
    events: EventEmitter,
    cancel: CancelFlag,
}

impl<L, E> BatchPipeline<L, E>
where
    L: DetectorLoader,
    E: ClipEncoder,
{
    pub fn new(
        layout: OutputLayout,
        options: BatchOptions,
        loader: L,
        encoder: E,
        events: EventEmitter,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            layout,
            options,
            loader: Some(loader),
            detector: None,
            exporter: ClipExporter::new(encoder),
            events,
            cancel,
        }
    }

    /// 執行批次；成功時送出 `Finished`，無法處理的錯誤送出 `Error` 並回傳
    pub fn run(&mut self, tasks: &[VideoTask]) -> Result<BatchReport> {
        match self.execute(tasks) {
            Ok(report) => {
                self.events.finished();
                Ok(report)
            }
            Err(e) => {
                error!("批次處理中止: {e:#}");
                self.events.error(format!("發生未預期錯誤: {e:#}"));
                Err(e)
            }
        }
    }

    fn execute(&mut self, tasks: &[VideoTask]) -> Result<BatchReport> {
        let total = tasks.len();
        let mut states = vec![ProcessingState::Pending; total];
        let mut completed = 0;

        info!("批次開始，共 {total} 部影片");

        for (idx, task) in tasks.iter().enumerate() {
            let video_name = task.display_name.as_str();
            if self.options.skip_existing && self.layout.is_video_done(video_name) {
                self.events
                    .log(format!("檢測到已處理: {video_name}，跳過場景分析"));
                self.publish_existing_results(video_name);
                states[idx] = ProcessingState::Skipped;
                self.events.status(video_name, ProcessingState::Skipped);
                completed += 1;
                self.events.batch_progress(completed, total);
            } else {
                self.events.status(video_name, ProcessingState::Pending);
            }
        }

        let pending: Vec<usize> = (0..total)
            .filter(|&idx| states[idx] == ProcessingState::Pending)
            .collect();

        if pending.is_empty() {
            self.events.log("所有檔案均已存在結果，無需重複處理。");
            return Ok(Self::report(tasks, states, false));
        }

        if self.cancel.is_cancelled() {
            self.events.log("任務已中斷");
            return Ok(Self::report(tasks, states, true));
        }

        if self.detector.is_none() {
            let loader = self.loader.take().context("偵測模型先前載入失敗")?;
            self.events.log("正在載入場景偵測模型...");
            self.detector = Some(loader.load().context("無法載入場景偵測模型")?);
        }
        let detector = self.detector.as_mut().context("偵測模型未載入")?;

        let segmenter = VideoSegmenter::new(
            &self.layout,
            &self.exporter,
            &self.events,
            &self.cancel,
            self.options.extract_keyframes,
        );

        let mut cancelled = false;
        for idx in pending {
            if self.cancel.is_cancelled() {
                self.events.log("任務已中斷");
                cancelled = true;
                break;
            }

            let task = &tasks[idx];
            states[idx] = ProcessingState::InProgress;
            self.events
                .status(&task.display_name, ProcessingState::InProgress);

            let state = match segmenter.segment(detector, task) {
                SegmentOutcome::Completed(tally) => {
                    info!(
                        "{} 完成: 新匯出 {}, 沿用 {}, 失敗 {}",
                        task.display_name, tally.exported, tally.reused, tally.failed
                    );
                    ProcessingState::Completed
                }
                SegmentOutcome::Cancelled(_) => {
                    cancelled = true;
                    ProcessingState::Cancelled
                }
                SegmentOutcome::Failed(_) => ProcessingState::Failed,
            };

            states[idx] = state;
            self.events.status(&task.display_name, state);
            completed += 1;
            self.events.batch_progress(completed, total);
        }

        if !cancelled {
            self.events.log("所有任務完成");
        }

        Ok(Self::report(tasks, states, cancelled))
    }

    /// 已完成的影片不重新計算，直接把磁碟上的關鍵幀送出
    fn publish_existing_results(&self, video_name: &str) {
        for entry in self.layout.existing_keyframes(video_name) {
            self.events.result(SceneResult::Keyframe {
                video: video_name.to_string(),
                scene_index: entry.scene_index,
                image_path: entry.image_path,
                video_path: entry.clip_path,
            });
        }
    }

    fn report(tasks: &[VideoTask], states: Vec<ProcessingState>, cancelled: bool) -> BatchReport {
        BatchReport {
            outcomes: tasks
                .iter()
                .map(|task| task.display_name.clone())
                .zip(states)
                .collect(),
            cancelled,
        }
    }
}
