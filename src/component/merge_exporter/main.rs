use super::merger::{MergeReport, list_merged, merge_outputs};
use crate::config::Config;
use crate::tools::{OutputLayout, validate_directory_exists};
use anyhow::Result;
use console::style;
use dialoguer::Input;
use log::info;
use std::path::PathBuf;

/// 合併匯出：所有影片的片段複製到同一個資料夾並連續編號
///
/// 不可與進行中的場景切割同時對同一個輸出目錄執行。
pub struct MergeExporter {
    config: Config,
}

impl MergeExporter {
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<()> {
        println!("{}", style("=== 合併匯出 ===").cyan().bold());

        let layout = self.prompt_layout()?;
        validate_directory_exists(layout.root())?;

        println!("{}", style("複製片段中...").dim());
        let report = merge_outputs(&layout)?;

        if report.planned == 0 {
            println!("{}", style("未找到任何分割片段").yellow());
            return Ok(());
        }

        self.print_summary(&report, &layout);
        Ok(())
    }

    /// 瀏覽 `merged/` 目前的內容
    pub fn show_merged(&self) -> Result<()> {
        println!("{}", style("=== 查看合併結果 ===").cyan().bold());

        let layout = self.prompt_layout()?;
        let items = list_merged(&layout)?;

        if items.is_empty() {
            println!(
                "{}",
                style("合併資料夾不存在或為空，請先執行「合併匯出」").yellow()
            );
            return Ok(());
        }

        for item in &items {
            let thumbnail = if item.keyframe_path.is_some() {
                style("有縮圖").green()
            } else {
                style("無縮圖").dim()
            };
            println!(
                "  {:03}  {}  {}",
                item.sequence_number,
                item.clip_path.display(),
                thumbnail
            );
        }
        info!("瀏覽合併資料夾: {} 個片段", items.len());
        Ok(())
    }

    fn prompt_layout(&self) -> Result<OutputLayout> {
        let mut prompt = Input::<String>::new().with_prompt("請輸入影片資料夾路徑");
        if let Some(last) = self.config.settings.last_folder.clone() {
            prompt = prompt.default(last);
        }
        let path = prompt.interact_text()?;
        Ok(OutputLayout::for_input_folder(&PathBuf::from(path.trim())))
    }

    fn print_summary(&self, report: &MergeReport, layout: &OutputLayout) {
        println!();
        println!("{}", style("=== 合併匯出摘要 ===").cyan().bold());
        println!("  片段: {} 個", report.planned);
        println!("  已複製: {} 個", style(report.copied).green());
        println!("  縮圖: {} 張", report.thumbnails_copied);
        if report.failed > 0 {
            println!("  失敗: {} 個", style(report.failed).red());
        }
        if report.stale_removed > 0 {
            println!("  移除舊編號: {} 個", style(report.stale_removed).yellow());
        }
        println!("  位置: {}", layout.merged_dir().display());
    }
}
