use super::clip_exporter::ClipEncoder;
use crate::config::EncoderSettings;
use crate::error::ExportError;
use crate::tools::partial_path;
use log::{debug, warn};
use std::fs;
use std::path::Path;
use std::process::Command;

/// 以 ffmpeg 切出片段與擷取單張畫面
///
/// 先寫入 `<目的檔>.part`，成功後才改名，磁碟上的片段一定是完整的。
pub struct FfmpegEncoder {
    settings: EncoderSettings,
}

impl FfmpegEncoder {
    #[must_use]
    pub const fn new(settings: EncoderSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn clip_command(
        &self,
        source: &Path,
        start_time: f64,
        end_time: f64,
        frame_rate: f64,
        output: &Path,
    ) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error"]);
        cmd.args(["-ss", &format!("{start_time:.3}")]);
        cmd.arg("-i").arg(source);
        cmd.args([
            "-t",
            &format!("{:.3}", end_time - start_time),
            "-map",
            "0:v:0",
            "-map",
            "0:a:0?",
            "-c:v",
            &self.settings.video_codec,
            "-preset",
            &self.settings.preset,
            "-crf",
            &self.settings.crf.to_string(),
            "-pix_fmt",
            "yuv420p",
            "-r",
            &format!("{frame_rate}"),
            "-c:a",
            &self.settings.audio_codec,
            "-movflags",
            "+faststart",
            "-f",
            "mp4",
            "-y",
        ]);
        cmd.arg(output);
        cmd
    }

    #[must_use]
    pub fn frame_command(&self, source: &Path, at_time: f64, output: &Path) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error"]);
        cmd.args(["-ss", &format!("{at_time:.3}")]);
        cmd.arg("-i").arg(source);
        cmd.args([
            "-frames:v",
            "1",
            "-an",
            "-c:v",
            "mjpeg",
            "-q:v",
            "2",
            "-update",
            "1",
            "-f",
            "image2",
            "-y",
        ]);
        cmd.arg(output);
        cmd
    }
}

impl ClipEncoder for FfmpegEncoder {
    fn extract_range(
        &self,
        source: &Path,
        start_time: f64,
        end_time: f64,
        frame_rate: f64,
        destination: &Path,
    ) -> Result<(), ExportError> {
        let partial = partial_path(destination);
        let cmd = self.clip_command(source, start_time, end_time, frame_rate, &partial);
        run_into(cmd, &partial, destination)
    }

    fn extract_frame(
        &self,
        source: &Path,
        at_time: f64,
        destination: &Path,
    ) -> Result<(), ExportError> {
        let partial = partial_path(destination);
        let cmd = self.frame_command(source, at_time, &partial);
        run_into(cmd, &partial, destination)
    }
}

fn run_into(mut cmd: Command, partial: &Path, destination: &Path) -> Result<(), ExportError> {
    debug!("執行: {cmd:?}");

    let result = match cmd.output() {
        Ok(output) if output.status.success() && partial.exists() => fs::rename(partial, destination)
            .map_err(|source| ExportError::Io {
                path: destination.to_path_buf(),
                source,
            }),
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ExportError::encoder(
                destination,
                format!("ffmpeg 結束碼 {}: {}", output.status, stderr.trim()),
            ))
        }
        Err(e) => Err(ExportError::encoder(destination, format!("無法執行 ffmpeg: {e}"))),
    };

    if result.is_err() && partial.exists() && fs::remove_file(partial).is_err() {
        warn!("無法清除未完成的檔案: {}", partial.display());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_clip_command_uses_range_and_settings() {
        let encoder = FfmpegEncoder::new(EncoderSettings::default());
        let cmd = encoder.clip_command(
            Path::new("/in/v.mp4"),
            2.0,
            5.5,
            25.0,
            Path::new("/out/v_scene_002.mp4.part"),
        );
        let args = args_of(&cmd);

        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("-ss") + 1], "2.000");
        assert_eq!(args[pos("-t") + 1], "3.500");
        assert_eq!(args[pos("-c:v") + 1], "libx264");
        assert_eq!(args[pos("-c:a") + 1], "aac");
        assert_eq!(args[pos("-r") + 1], "25");
        assert_eq!(args[pos("-f") + 1], "mp4");
        assert_eq!(args.last().unwrap(), "/out/v_scene_002.mp4.part");
    }

    #[test]
    fn test_frame_command_grabs_one_frame() {
        let encoder = FfmpegEncoder::new(EncoderSettings::default());
        let cmd = encoder.frame_command(Path::new("/in/v.mp4"), 1.25, Path::new("/out/k.jpg.part"));
        let args = args_of(&cmd);

        assert!(args.windows(2).any(|w| w == ["-ss", "1.250"]));
        assert!(args.windows(2).any(|w| w == ["-frames:v", "1"]));
        assert_eq!(args.last().unwrap(), "/out/k.jpg.part");
    }
}
