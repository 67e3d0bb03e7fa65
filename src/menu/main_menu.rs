use crate::config::Config;
use crate::config::save::save_settings;
use crate::menu::handlers::{
    run_merge_exporter, run_merged_viewer, run_result_viewer, run_scene_splitter,
};
use crate::signal::CancelFlag;
use anyhow::Result;
use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};

pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &CancelFlag,
    config: &mut Config,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style("=== 影片場景切割工具 ===").cyan().bold());
    println!("{}", style("按 Esc 離開").dim());

    let options = [
        "場景切割",
        "檢視切割結果",
        "合併匯出",
        "查看合併結果",
        "設定",
        "離開",
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("請選擇功能")
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => {
            run_scene_splitter(term, shutdown_signal, config)?;
            reload_settings(config)?;
            Ok(true)
        }
        Some(1) => {
            run_result_viewer(term, shutdown_signal, config)?;
            reload_settings(config)?;
            Ok(true)
        }
        Some(2) => {
            run_merge_exporter(term, config)?;
            Ok(true)
        }
        Some(3) => {
            run_merged_viewer(term, config)?;
            Ok(true)
        }
        Some(4) => {
            show_settings_menu(term, config)?;
            Ok(true)
        }
        Some(5) | None => Ok(false),
        _ => unreachable!(),
    }
}

/// 元件會把最近使用的資料夾寫入設定檔，回到選單時重新讀取
fn reload_settings(config: &mut Config) -> Result<()> {
    *config = Config::new()?;
    Ok(())
}

fn on_off(value: bool) -> &'static str {
    if value { "開" } else { "關" }
}

/// 設定選單
fn show_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    loop {
        term.clear_screen()?;
        println!("{}", style("=== 設定 ===").cyan().bold());

        let settings = &config.settings;
        let options = vec![
            format!("擷取關鍵幀: {}", on_off(settings.extract_keyframes)),
            format!("跳過已完成的影片: {}", on_off(settings.skip_existing)),
            format!("場景偵測閾值: {}", settings.detector.threshold),
            format!("片段品質 (CRF): {}", settings.encoder.crf),
            "返回".to_string(),
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("選擇要變更的項目")
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        let settings = &mut config.settings;
        match selection {
            Some(0) => settings.extract_keyframes = !settings.extract_keyframes,
            Some(1) => settings.skip_existing = !settings.skip_existing,
            Some(2) => {
                settings.detector.threshold = Input::new()
                    .with_prompt("閾值 (0-100，越低越敏感)")
                    .default(settings.detector.threshold)
                    .validate_with(|v: &f64| {
                        if (0.0..=100.0).contains(v) {
                            Ok(())
                        } else {
                            Err("必須介於 0 與 100 之間")
                        }
                    })
                    .interact_text()?;
            }
            Some(3) => {
                settings.encoder.crf = Input::new()
                    .with_prompt("CRF (0-51，越低品質越高)")
                    .default(settings.encoder.crf)
                    .validate_with(|v: &u8| if *v <= 51 { Ok(()) } else { Err("必須介於 0 與 51 之間") })
                    .interact_text()?;
            }
            _ => return Ok(()),
        }

        save_settings(settings)?;
    }
}
