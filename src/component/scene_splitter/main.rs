use super::batch_pipeline::{BatchOptions, BatchPipeline, BatchReport};
use super::events::{EventEmitter, PipelineEvent, ProcessingState};
use super::ffmpeg_detector::FfmpegSceneDetector;
use super::ffmpeg_encoder::FfmpegEncoder;
use crate::config::Config;
use crate::config::save::remember_folder;
use crate::signal::CancelFlag;
use crate::tools::{OutputLayout, VideoTask, scan_video_files, validate_directory_exists};
use anyhow::{Context, Result, anyhow};
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, MultiSelect};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::thread;

const BATCH_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
const VIDEO_TEMPLATE: &str = "  {bar:40.green/white} {pos:>3}% {msg}";

/// 批次場景切割
///
/// 在背景執行緒跑完整個批次，前景只負責顯示事件。
pub struct SceneSplitter {
    config: Config,
    shutdown_signal: CancelFlag,
}

impl SceneSplitter {
    pub const fn new(config: Config, shutdown_signal: CancelFlag) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        println!("{}", style("=== 影片場景切割 ===").cyan().bold());

        let input_dir = self.prompt_input_dir()?;
        let layout = OutputLayout::for_input_folder(&input_dir);

        println!("{}", style("掃描影片檔案中...").dim());
        let videos = scan_video_files(&input_dir)?;
        if videos.is_empty() {
            println!("{}", style("找不到任何影片檔案").yellow());
            return Ok(());
        }

        let tasks = self.select_videos(&videos, &layout)?;
        if tasks.is_empty() {
            println!("{}", style("未選擇任何影片").yellow());
            return Ok(());
        }

        println!();
        println!(
            "{}",
            style(format!(
                "開始處理 {} 部影片，輸出至 {}（Ctrl-C 可在場景之間中斷）",
                tasks.len(),
                layout.root().display()
            ))
            .cyan()
        );

        let report = self.run_batch(tasks, layout)?;
        print_summary(&report);
        Ok(())
    }

    /// 列出某部影片已產生的場景
    pub fn show_existing_results(&mut self) -> Result<()> {
        println!("{}", style("=== 檢視切割結果 ===").cyan().bold());

        let input_dir = self.prompt_input_dir()?;
        let layout = OutputLayout::for_input_folder(&input_dir);
        let videos = scan_video_files(&input_dir)?;

        for video in &videos {
            let name = video.display_name.as_str();
            if !layout.is_video_done(name) {
                println!("  {} {}", style("○").dim(), name);
                continue;
            }

            let keyframes = layout.existing_keyframes(name);
            println!(
                "  {} {} ({} 張關鍵幀)",
                style("✓").green(),
                style(name).bold(),
                keyframes.len()
            );
            for entry in keyframes {
                println!(
                    "      {:03}  {}",
                    entry.scene_index,
                    style(entry.clip_path.display()).dim()
                );
            }
        }

        Ok(())
    }

    fn prompt_input_dir(&mut self) -> Result<PathBuf> {
        let mut prompt = Input::<String>::new().with_prompt("請輸入影片資料夾路徑");
        if let Some(last) = self.config.settings.last_folder.clone() {
            prompt = prompt.default(last);
        }
        let path = prompt.interact_text()?.trim().to_string();

        let directory = PathBuf::from(&path);
        validate_directory_exists(&directory)?;

        if let Err(e) = remember_folder(&mut self.config.settings, &path) {
            warn!("無法儲存最近使用的資料夾: {e:#}");
        }
        Ok(directory)
    }

    fn select_videos(&self, videos: &[VideoTask], layout: &OutputLayout) -> Result<Vec<VideoTask>> {
        let items: Vec<String> = videos
            .iter()
            .map(|video| {
                if layout.is_video_done(&video.display_name) {
                    format!("{} {}", video.display_name, style("(已完成)").green())
                } else {
                    video.display_name.clone()
                }
            })
            .collect();
        let defaults = vec![true; items.len()];

        let selection = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt("選擇要處理的影片（空白鍵切換，Enter 確認）")
            .items(&items)
            .defaults(&defaults)
            .interact()?;

        Ok(selection.into_iter().map(|i| videos[i].clone()).collect())
    }

    fn run_batch(&self, tasks: Vec<VideoTask>, layout: OutputLayout) -> Result<BatchReport> {
        self.shutdown_signal.reset();

        let settings = &self.config.settings;
        let options = BatchOptions {
            extract_keyframes: settings.extract_keyframes,
            skip_existing: settings.skip_existing,
        };
        let detector_settings = settings.detector.clone();
        let encoder = FfmpegEncoder::new(settings.encoder.clone());
        let (events, rx) = EventEmitter::channel();

        let mut pipeline = BatchPipeline::new(
            layout,
            options,
            move || FfmpegSceneDetector::load(detector_settings),
            encoder,
            events,
            self.shutdown_signal.clone(),
        );
        let total = tasks.len();

        let worker = thread::Builder::new()
            .name("scene-worker".to_string())
            .spawn(move || pipeline.run(&tasks))
            .context("無法建立背景工作執行緒")?;

        render_events(&rx, total);

        worker
            .join()
            .map_err(|_| anyhow!("背景工作執行緒異常結束"))?
    }
}

/// 消耗事件直到背景執行緒結束（所有 Sender 被釋放）
fn render_events(rx: &Receiver<PipelineEvent>, total: usize) {
    let multi = MultiProgress::new();

    let batch_bar = multi.add(ProgressBar::new(total as u64));
    batch_bar.set_style(
        ProgressStyle::default_bar()
            .template(BATCH_TEMPLATE)
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );

    let video_bar = multi.add(ProgressBar::new(100));
    video_bar.set_style(
        ProgressStyle::default_bar()
            .template(VIDEO_TEMPLATE)
            .expect("Invalid progress bar template")
            .progress_chars("=> "),
    );

    let mut result_count = 0;
    for event in rx {
        match event {
            PipelineEvent::Log(line) => {
                let _ = multi.println(format!("  {}", style(line).dim()));
            }
            PipelineEvent::VideoProgress { video, percent } => {
                video_bar.set_message(video);
                video_bar.set_position(u64::from(percent));
            }
            PipelineEvent::BatchProgress { completed, total } => {
                batch_bar.set_length(total as u64);
                batch_bar.set_position(completed as u64);
            }
            PipelineEvent::VideoStatus { video, state } if state.is_terminal() => {
                let marker = match state {
                    ProcessingState::Failed => style("✗").red(),
                    ProcessingState::Cancelled => style("■").yellow(),
                    _ => style("✓").green(),
                };
                let _ = multi.println(format!("{marker} {video}: {state}"));
            }
            PipelineEvent::VideoStatus { .. } => {}
            PipelineEvent::Result(result) => {
                result_count += 1;
                if let Ok(json) = serde_json::to_string(&result) {
                    debug!("{json}");
                }
            }
            PipelineEvent::Finished => {
                video_bar.finish_and_clear();
                batch_bar.finish_with_message(format!("完成，{result_count} 個場景結果"));
            }
            PipelineEvent::Error(message) => {
                video_bar.abandon();
                batch_bar.abandon_with_message("批次中止");
                eprintln!("{} {}", style("錯誤:").red().bold(), message);
            }
        }
    }
}

fn print_summary(report: &BatchReport) {
    let completed = report.count(ProcessingState::Completed);
    let skipped = report.count(ProcessingState::Skipped);
    let failed = report.count(ProcessingState::Failed);
    let cancelled = report.count(ProcessingState::Cancelled);
    let pending = report.count(ProcessingState::Pending);

    println!();
    println!("{}", style("=== 場景切割摘要 ===").cyan().bold());
    println!("  總計: {} 部影片", report.outcomes.len());
    println!("  完成: {} 部", style(completed).green());
    if skipped > 0 {
        println!("  已存在跳過: {} 部", style(skipped).yellow());
    }
    if failed > 0 {
        println!("  失敗: {} 部", style(failed).red());
    }
    if report.cancelled {
        println!(
            "  中斷: {} 部，未開始: {} 部（重新執行即可接續）",
            style(cancelled).yellow(),
            pending
        );
    }

    info!(
        "場景切割結束 - 完成: {completed}, 跳過: {skipped}, 失敗: {failed}, 中斷: {cancelled}"
    );
}
