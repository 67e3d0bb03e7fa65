//! 合併匯出元件
//!
//! 只讀取場景切割的輸出，寫入自己的 `merged/` 子資料夾

mod main;
mod merger;

pub use main::MergeExporter;
pub use merger::{MergeReport, MergedItem, list_merged, merge_outputs, plan_merge};
