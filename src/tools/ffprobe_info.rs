use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub duration_seconds: f64,
    pub frame_rate: f64,
    /// 容器回報的幀數，部分格式沒有
    pub frame_count: Option<u64>,
}

impl VideoInfo {
    /// 總幀數，沒有 `nb_frames` 時由長度與幀率推算
    #[must_use]
    pub fn total_frames(&self) -> u64 {
        self.frame_count
            .unwrap_or_else(|| (self.duration_seconds * self.frame_rate).round().max(0.0) as u64)
    }
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

/// 使用 ffprobe 取得影片長度與原生幀率
pub fn get_video_info(path: &Path) -> Result<VideoInfo> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .with_context(|| format!("無法執行 ffprobe: {}", path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("ffprobe 執行失敗: {stderr}");
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

fn parse_probe_output(json: &str) -> Result<VideoInfo> {
    let probe: FfprobeOutput = serde_json::from_str(json).context("無法解析 ffprobe 輸出")?;

    let video_stream = probe
        .streams
        .as_ref()
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some("video"))
        })
        .ok_or_else(|| anyhow::anyhow!("找不到視訊串流"))?;

    let duration_seconds = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .or(video_stream.duration.as_ref())
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| anyhow::anyhow!("無法取得影片長度"))?;

    // 平均幀率比 r_frame_rate 更接近實際輸出的幀數
    let frame_rate = video_stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| video_stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .ok_or_else(|| anyhow::anyhow!("無法取得影片幀率"))?;

    let frame_count = video_stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|&n| n > 0);

    Ok(VideoInfo {
        duration_seconds,
        frame_rate,
        frame_count,
    })
}

/// 解析幀率字串（例如 "30/1" 或 "30000/1001"）
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let value = if let Some((num_str, den_str)) = rate.split_once('/') {
        let num: f64 = num_str.parse().ok()?;
        let den: f64 = den_str.parse().ok()?;
        if den <= 0.0 {
            return None;
        }
        num / den
    } else {
        rate.parse().ok()?
    };

    (value.is_finite() && value > 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("25").unwrap() - 25.0).abs() < 0.01);
        assert!(parse_frame_rate("0/0").is_none());
        assert!(parse_frame_rate("invalid").is_none());
    }

    #[test]
    fn test_parse_probe_output_prefers_nb_frames() {
        let json = r#"{
            "format": {"duration": "10.0"},
            "streams": [
                {"codec_type": "audio"},
                {"codec_type": "video", "r_frame_rate": "25/1", "avg_frame_rate": "25/1", "nb_frames": "251"}
            ]
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert!((info.frame_rate - 25.0).abs() < 0.01);
        assert_eq!(info.total_frames(), 251);
    }

    #[test]
    fn test_total_frames_from_duration() {
        let info = VideoInfo {
            duration_seconds: 4.0,
            frame_rate: 24.0,
            frame_count: None,
        };
        assert_eq!(info.total_frames(), 96);
    }

    #[test]
    fn test_parse_probe_output_without_video_stream() {
        let json = r#"{"format": {"duration": "3.0"}, "streams": [{"codec_type": "audio"}]}"#;
        assert!(parse_probe_output(json).is_err());
    }
}
