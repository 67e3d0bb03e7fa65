use serde::{Deserialize, Serialize};

/// 場景偵測參數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// 場景變換閾值 (0-100)，越低越敏感
    pub threshold: f64,
    /// 分析前縮放到的寬度（加速分析，不影響輸出）
    pub scale_width: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            threshold: 10.0,
            scale_width: 320,
        }
    }
}

/// 片段編碼參數
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
    pub crf: u8,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "medium".to_string(),
            crf: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub last_folder: Option<String>,
    pub extract_keyframes: bool,
    /// 關閉時不跳過已完成的影片（仍會重用已存在的片段）
    pub skip_existing: bool,
    pub detector: DetectorSettings,
    pub encoder: EncoderSettings,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            last_folder: None,
            extract_keyframes: true,
            skip_existing: true,
            detector: DetectorSettings::default(),
            encoder: EncoderSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: UserSettings,
}
