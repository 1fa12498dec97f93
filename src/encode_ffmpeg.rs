use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    core::{Fps, FrameRgba},
    error::{SonovizError, SonovizResult},
};

const X264_PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
];

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    pub out_path: PathBuf,
    /// Audio file muxed alongside the video stream with `-shortest`.
    pub input_audio: Option<PathBuf>,
    pub preset: String,
    pub crf: u32,
    pub tune: String,
    pub overwrite: bool,
}

impl EncodeConfig {
    pub fn new(width: u32, height: u32, fps: Fps, out_path: impl Into<PathBuf>) -> Self {
        Self {
            width,
            height,
            fps,
            out_path: out_path.into(),
            input_audio: None,
            preset: "slow".into(),
            crf: 17,
            tune: "film".into(),
            overwrite: true,
        }
    }

    pub fn with_input_audio(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_audio = Some(path.into());
        self
    }

    pub fn validate(&self) -> SonovizResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SonovizError::configuration(
                "encode width/height must be non-zero",
            ));
        }
        // libx264 output targets yuv420p for compatibility.
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(SonovizError::configuration(
                "encode width/height must be even (required for yuv420p output)",
            ));
        }
        if self.crf > 51 {
            return Err(SonovizError::configuration(format!(
                "crf must be in 0..=51, got {}",
                self.crf
            )));
        }
        if !X264_PRESETS.contains(&self.preset.as_str()) {
            return Err(SonovizError::configuration(format!(
                "unknown x264 preset {:?}",
                self.preset
            )));
        }
        Ok(())
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> SonovizResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Pipes raw RGBA frames into a system `ffmpeg` process encoding H.264 MP4.
/// The system binary is used rather than linked FFmpeg to avoid native dev
/// header/lib requirements.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig) -> SonovizResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(SonovizError::encoding(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(SonovizError::encoding(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let fps = format!("{}/{}", cfg.fps.num, cfg.fps.den);
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.arg(if cfg.overwrite { "-y" } else { "-n" });
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &fps,
            "-i",
            "pipe:0",
        ]);

        if let Some(audio) = &cfg.input_audio {
            cmd.arg("-i").arg(audio);
            cmd.args(["-c:a", "aac", "-shortest"]);
        } else {
            cmd.arg("-an");
        }

        cmd.args([
            "-c:v",
            "libx264",
            "-preset",
            &cfg.preset,
            "-crf",
            &cfg.crf.to_string(),
            "-tune",
            &cfg.tune,
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&cfg.out_path);

        tracing::debug!(out = %cfg.out_path.display(), "spawning ffmpeg");
        let mut child = cmd.spawn().map_err(|e| {
            SonovizError::encoding(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SonovizError::encoding("failed to open ffmpeg stdin (unexpected)"))?;

        Ok(Self {
            cfg,
            child,
            stdin: Some(stdin),
        })
    }

    pub fn encode_frame(&mut self, frame: &FrameRgba) -> SonovizResult<()> {
        if frame.width != self.cfg.width || frame.height != self.cfg.height {
            return Err(SonovizError::encoding(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.width, self.cfg.height
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(SonovizError::encoding("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            SonovizError::encoding(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    pub fn finish(mut self) -> SonovizResult<()> {
        drop(self.stdin.take());

        let output = self.child.wait_with_output().map_err(|e| {
            SonovizError::encoding(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SonovizError::encoding(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}
