//! 影片場景切割元件
//!
//! 流程：
//! A. 依輸出目錄判斷哪些影片已完成
//! B. 偵測場景邊界
//! C. 逐場景匯出片段與關鍵幀
//!
//! 輸出目錄本身就是續跑狀態，中斷後重新執行會從缺少的場景接續。

mod batch_pipeline;
mod clip_exporter;
mod events;
mod ffmpeg_detector;
mod ffmpeg_encoder;
mod main;
mod scene_detector;
mod video_segmenter;

pub use batch_pipeline::{BatchOptions, BatchPipeline, BatchReport};
pub use clip_exporter::{ClipEncoder, ClipExporter, ExportOutcome};
pub use events::{EventEmitter, PipelineEvent, ProcessingState, SceneResult};
pub use ffmpeg_detector::{FfmpegSceneDetector, cuts_to_boundaries};
pub use ffmpeg_encoder::FfmpegEncoder;
pub use main::SceneSplitter;
pub use scene_detector::{Detection, DetectorLoader, SceneBoundary, SceneDetector};
pub use video_segmenter::{
    DETECTED_PROGRESS, DETECTING_PROGRESS, SceneTally, SegmentOutcome, VideoSegmenter,
    scene_progress,
};
