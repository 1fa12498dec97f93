use std::process::{Child, ChildStdin, Command, Stdio};

use crate::{
    core::{Fps, FrameRgba},
    error::{SonovizError, SonovizResult},
};

#[derive(Clone, Debug)]
pub struct PreviewConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    /// Flip the display vertically for canvases with a bottom-left origin.
    pub vflip: bool,
}

impl PreviewConfig {
    pub fn validate(&self) -> SonovizResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SonovizError::configuration(
                "preview width/height must be non-zero",
            ));
        }
        Ok(())
    }
}

pub fn is_ffplay_on_path() -> bool {
    Command::new("ffplay")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Realtime preview window: the same rawvideo-on-stdin contract as the
/// encoder, pointed at `ffplay` instead of `ffmpeg`.
pub struct FfplayPreview {
    cfg: PreviewConfig,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl FfplayPreview {
    pub fn start(cfg: PreviewConfig) -> SonovizResult<Self> {
        cfg.validate()?;
        if !is_ffplay_on_path() {
            return Err(SonovizError::encoding(
                "ffplay is required for realtime preview, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffplay");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pixel_format",
            "rgba",
            "-video_size",
            &format!("{}x{}", cfg.width, cfg.height),
            "-framerate",
            &format!("{}/{}", cfg.fps.num, cfg.fps.den),
        ]);
        if cfg.vflip {
            cmd.args(["-vf", "vflip"]);
        }
        cmd.args(["-i", "pipe:0"]);

        tracing::debug!(width = cfg.width, height = cfg.height, "spawning ffplay");
        let mut child = cmd.spawn().map_err(|e| {
            SonovizError::encoding(format!(
                "failed to spawn ffplay (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SonovizError::encoding("failed to open ffplay stdin (unexpected)"))?;

        Ok(Self {
            cfg,
            child,
            stdin: Some(stdin),
        })
    }

    pub fn send_frame(&mut self, frame: &FrameRgba) -> SonovizResult<()> {
        if frame.width != self.cfg.width || frame.height != self.cfg.height {
            return Err(SonovizError::encoding(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.width, self.cfg.height
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(SonovizError::encoding("ffplay preview is already closed"));
        };

        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            SonovizError::encoding(format!("failed to write frame to ffplay stdin: {e}"))
        })?;
        Ok(())
    }

    /// Close the pipe and wait for the window to be dismissed.
    pub fn finish(mut self) -> SonovizResult<()> {
        drop(self.stdin.take());

        let output = self.child.wait_with_output().map_err(|e| {
            SonovizError::encoding(format!("failed to wait for ffplay to exit: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SonovizError::encoding(format!(
                "ffplay exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}
