use crate::component::{MergeExporter, SceneSplitter};
use crate::config::Config;
use crate::pause;
use crate::signal::CancelFlag;
use anyhow::Result;
use console::{Term, style};

pub fn run_scene_splitter(term: &Term, shutdown_signal: &CancelFlag, config: &Config) -> Result<()> {
    let mut splitter = SceneSplitter::new(config.clone(), shutdown_signal.clone());

    if let Err(e) = splitter.run() {
        eprintln!("{} {}", style("錯誤:").red().bold(), e);
    }

    pause(term)?;
    Ok(())
}

pub fn run_result_viewer(term: &Term, shutdown_signal: &CancelFlag, config: &Config) -> Result<()> {
    let mut splitter = SceneSplitter::new(config.clone(), shutdown_signal.clone());

    if let Err(e) = splitter.show_existing_results() {
        eprintln!("{} {}", style("錯誤:").red().bold(), e);
    }

    pause(term)?;
    Ok(())
}

pub fn run_merge_exporter(term: &Term, config: &Config) -> Result<()> {
    let exporter = MergeExporter::new(config.clone());

    if let Err(e) = exporter.run() {
        eprintln!("{} {}", style("錯誤:").red().bold(), e);
    }

    pause(term)?;
    Ok(())
}

pub fn run_merged_viewer(term: &Term, config: &Config) -> Result<()> {
    let exporter = MergeExporter::new(config.clone());

    if let Err(e) = exporter.show_merged() {
        eprintln!("{} {}", style("錯誤:").red().bold(), e);
    }

    pause(term)?;
    Ok(())
}
