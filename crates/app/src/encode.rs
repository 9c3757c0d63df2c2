use std::{
    path::Path,
    process::{Command, Stdio},
};

use glowgrid_core::{GlowGridError, Result};

use crate::sink::FRAME_DIGITS;

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Hands a numbered PNG sequence to the system `ffmpeg` as an H.264 MP4.
pub fn encode_sequence(dir: &Path, prefix: &str, fps: f64, out: &Path) -> Result<()> {
    if !is_ffmpeg_on_path() {
        return Err(GlowGridError::msg(
            "ffmpeg is required for video encoding, but was not found on PATH",
        ));
    }

    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let input = dir.join(format!("{prefix}_%0{FRAME_DIGITS}d.png"));
    let status = Command::new("ffmpeg")
        .stdin(Stdio::null())
        .args(["-y", "-loglevel", "error", "-framerate", &fps.to_string(), "-i"])
        .arg(&input)
        .args([
            "-vf",
            "pad=ceil(iw/2)*2:ceil(ih/2)*2",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(out)
        .status()
        .map_err(|e| {
            GlowGridError::msg(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

    if !status.success() {
        return Err(GlowGridError::msg(format!("ffmpeg exited with {status}")));
    }

    tracing::info!(out = %out.display(), "video encoded");
    Ok(())
}
