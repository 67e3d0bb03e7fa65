//! 背景工作執行緒往前景送出的事件
//!
//! 單向傳遞：工作執行緒只負責推送，從不等待前景。

use log::{debug, info};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};

/// 依種類區分的處理結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneResult {
    Keyframe {
        video: String,
        scene_index: u32,
        image_path: PathBuf,
        video_path: PathBuf,
    },
}

/// 單部影片在一次批次中的狀態，每次執行都從輸出目錄重新推導
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingState {
    Skipped,
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl ProcessingState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Skipped | Self::Completed | Self::Failed | Self::Cancelled
        )
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Skipped => "已完成（跳過）",
            Self::Pending => "等待處理",
            Self::InProgress => "處理中",
            Self::Completed => "完成",
            Self::Failed => "失敗",
            Self::Cancelled => "已中斷",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Log(String),
    VideoProgress { video: String, percent: u8 },
    BatchProgress { completed: usize, total: usize },
    VideoStatus { video: String, state: ProcessingState },
    Result(SceneResult),
    Finished,
    Error(String),
}

/// 包裝 `Sender`，前景已關閉時事件直接丟棄
#[derive(Debug, Clone)]
pub struct EventEmitter {
    tx: Sender<PipelineEvent>,
}

impl EventEmitter {
    #[must_use]
    pub const fn new(tx: Sender<PipelineEvent>) -> Self {
        Self { tx }
    }

    #[must_use]
    pub fn channel() -> (Self, Receiver<PipelineEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }

    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.send(PipelineEvent::Log(message));
    }

    pub fn video_progress(&self, video: &str, percent: u8) {
        self.send(PipelineEvent::VideoProgress {
            video: video.to_string(),
            percent: percent.min(100),
        });
    }

    pub fn batch_progress(&self, completed: usize, total: usize) {
        self.send(PipelineEvent::BatchProgress { completed, total });
    }

    pub fn status(&self, video: &str, state: ProcessingState) {
        debug!("{video}: {state}");
        self.send(PipelineEvent::VideoStatus {
            video: video.to_string(),
            state,
        });
    }

    pub fn result(&self, result: SceneResult) {
        self.send(PipelineEvent::Result(result));
    }

    pub fn finished(&self) {
        self.send(PipelineEvent::Finished);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(PipelineEvent::Error(message.into()));
    }

    fn send(&self, event: PipelineEvent) {
        if self.tx.send(event).is_err() {
            debug!("事件接收端已關閉");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_result_is_tagged() {
        let result = SceneResult::Keyframe {
            video: "trip".to_string(),
            scene_index: 3,
            image_path: PathBuf::from("k.jpg"),
            video_path: PathBuf::from("c.mp4"),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], "keyframe");
        assert_eq!(value["scene_index"], 3);
    }

    #[test]
    fn test_emitter_survives_dropped_receiver() {
        let (events, rx) = EventEmitter::channel();
        drop(rx);
        events.log("還在");
        events.finished();
    }

    #[test]
    fn test_video_progress_is_clamped() {
        let (events, rx) = EventEmitter::channel();
        events.video_progress("v", 150);
        assert_eq!(
            rx.recv().unwrap(),
            PipelineEvent::VideoProgress {
                video: "v".to_string(),
                percent: 100
            }
        );
    }
}
