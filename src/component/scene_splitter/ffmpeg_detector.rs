use super::scene_detector::{Detection, SceneBoundary, SceneDetector};
use crate::config::DetectorSettings;
use crate::error::DetectionError;
use crate::tools::get_video_info;
use log::debug;
use regex::Regex;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

static SCDET_TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"lavfi\.scd\.time[:=]\s*([0-9]+(?:\.[0-9]+)?)|scdet.*\bpts_time:\s*([0-9]+(?:\.[0-9]+)?)",
    )
    .expect("Invalid regex")
});

/// 以 ffmpeg scdet 濾鏡偵測鏡頭切換
///
/// 在原生幀率下分析縮小後的畫面，切換時間點換算成原生幀編號後組成
/// 連續且無間隙的場景列表。
pub struct FfmpegSceneDetector {
    settings: DetectorSettings,
}

impl FfmpegSceneDetector {
    /// 確認 ffmpeg 與 ffprobe 可以執行
    pub fn load(settings: DetectorSettings) -> Result<Self, DetectionError> {
        for tool in ["ffmpeg", "ffprobe"] {
            let status = Command::new(tool)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map_err(|e| DetectionError::Unavailable(format!("{tool}: {e}")))?;
            if !status.success() {
                return Err(DetectionError::Unavailable(format!(
                    "{tool} -version 回傳 {status}"
                )));
            }
        }

        debug!(
            "場景偵測設定: threshold={}, scale_width={}",
            settings.threshold, settings.scale_width
        );
        Ok(Self { settings })
    }

    fn filter(&self) -> String {
        format!(
            "scale={}:-2,scdet=s=1:t={}",
            self.settings.scale_width, self.settings.threshold
        )
    }
}

impl SceneDetector for FfmpegSceneDetector {
    fn detect(&mut self, video: &Path) -> Result<Detection, DetectionError> {
        let info = get_video_info(video).map_err(|e| DetectionError::Probe {
            path: video.to_path_buf(),
            message: format!("{e:#}"),
        })?;

        let output = Command::new("ffmpeg")
            .args(["-hide_banner", "-nostdin", "-i"])
            .arg(video)
            .args(["-an", "-sn", "-dn", "-vf", &self.filter(), "-f", "null", "-"])
            .output()
            .map_err(|e| DetectionError::Failed {
                path: video.to_path_buf(),
                message: format!("無法執行 ffmpeg: {e}"),
            })?;

        // scdet 的結果寫在 stderr
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(DetectionError::Failed {
                path: video.to_path_buf(),
                message: stderr.lines().last().unwrap_or_default().to_string(),
            });
        }

        let cut_times = parse_scdet_output(&stderr);
        debug!("{} 偵測到 {} 個切換點", video.display(), cut_times.len());

        Ok(Detection {
            boundaries: cuts_to_boundaries(&cut_times, info.frame_rate, info.total_frames()),
            frame_rate: info.frame_rate,
        })
    }
}

/// 解析 scdet 輸出的切換時間（秒）
///
/// 例如: `[scdet @ 0x55d] lavfi.scd.score: 42.310, lavfi.scd.time: 12.345`、
/// metadata 形式的 `lavfi.scd.time=12.345`，
/// 或舊版的 `[Parsed_scdet_2 @ 0x7f9] t:12.345 pts_time:12.345`
fn parse_scdet_output(output: &str) -> Vec<f64> {
    output
        .lines()
        .filter_map(|line| SCDET_TIME_REGEX.captures(line))
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

/// 切換時間轉為 `[0,c1), [c1,c2), ..., [cn,total)`
#[must_use]
pub fn cuts_to_boundaries(cut_times: &[f64], frame_rate: f64, total_frames: u64) -> Vec<SceneBoundary> {
    if total_frames == 0 {
        return Vec::new();
    }

    let mut cut_frames: Vec<u64> = cut_times
        .iter()
        .filter(|t| t.is_finite() && **t > 0.0)
        .map(|t| (t * frame_rate).round() as u64)
        .filter(|&frame| frame > 0 && frame < total_frames)
        .collect();
    cut_frames.sort_unstable();
    cut_frames.dedup();

    let mut boundaries = Vec::with_capacity(cut_frames.len() + 1);
    let mut start = 0;
    for cut in cut_frames {
        boundaries.push(SceneBoundary::new(start, cut));
        start = cut;
    }
    boundaries.push(SceneBoundary::new(start, total_frames));
    boundaries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scdet_log_format() {
        let output = r"
[scdet @ 0x55d0c] lavfi.scd.score: 42.310, lavfi.scd.time: 2.000
frame=  120 fps=0.0 q=-0.0 size=N/A time=00:00:04.80
[scdet @ 0x55d0c] lavfi.scd.score: 18.000, lavfi.scd.time: 4.4
";
        assert_eq!(parse_scdet_output(output), vec![2.0, 4.4]);
    }

    #[test]
    fn test_parse_scdet_pts_time_format() {
        let output = r"
[Parsed_scdet_2 @ 0x7f9b8c] t:12.345 pts_time:12.345
frame:456 pts:25678 pts_time:25.678
";
        assert_eq!(parse_scdet_output(output), vec![12.345]);
    }

    #[test]
    fn test_parse_scdet_metadata_format() {
        let output = "lavfi.scd.score=30.1\nlavfi.scd.time=12.5\n";
        assert_eq!(parse_scdet_output(output), vec![12.5]);
    }

    #[test]
    fn test_cuts_to_boundaries_is_gapless() {
        let boundaries = cuts_to_boundaries(&[2.0, 1.0, 1.0, 3.0], 10.0, 50);
        assert_eq!(
            boundaries,
            vec![
                SceneBoundary::new(0, 10),
                SceneBoundary::new(10, 20),
                SceneBoundary::new(20, 30),
                SceneBoundary::new(30, 50),
            ]
        );
    }

    #[test]
    fn test_cuts_outside_range_are_dropped() {
        let boundaries = cuts_to_boundaries(&[0.0, 9.0, 2.5], 10.0, 50);
        assert_eq!(
            boundaries,
            vec![SceneBoundary::new(0, 25), SceneBoundary::new(25, 50)]
        );
    }

    #[test]
    fn test_no_cuts_is_one_scene() {
        assert_eq!(
            cuts_to_boundaries(&[], 24.0, 240),
            vec![SceneBoundary::new(0, 240)]
        );
        assert!(cuts_to_boundaries(&[], 24.0, 0).is_empty());
    }
}
