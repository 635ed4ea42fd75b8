use super::VideoEncoder;
use crate::config::{EncoderSettings, OutputTarget};
use crate::error::EncodingError;
use crate::imaging::fit_within;
use crate::Frame;
use image::{imageops, Rgba, RgbaImage};
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;

const CANVAS: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Encoder driving the system `ffmpeg` binary in two passes.
///
/// Pass 1 streams raw RGBA frames over stdin into a video-only H.264 file at
/// a fixed frame duration. Pass 2 muxes the audio asset, starting at the
/// configured offset, under a copy of that video.
pub struct FfmpegEncoder {
    settings: EncoderSettings,
}

impl FfmpegEncoder {
    pub fn new(settings: EncoderSettings) -> Self {
        Self { settings }
    }

    /// Output extent: configured, else the first frame's, rounded down to even.
    pub fn output_size(&self, frames: &[Frame]) -> Result<(u32, u32), EncodingError> {
        let first = frames
            .first()
            .ok_or_else(|| EncodingError::video("no frames to encode"))?;
        let width = self.settings.width.unwrap_or(first.width()) & !1;
        let height = self.settings.height.unwrap_or(first.height()) & !1;
        if width == 0 || height == 0 {
            return Err(EncodingError::video(format!(
                "output size {width}x{height} is too small for yuv420p"
            )));
        }
        Ok((width, height))
    }

    fn write_video(
        &self,
        frames: &[Frame],
        (width, height): (u32, u32),
        out: &Path,
    ) -> Result<(), EncodingError> {
        let _span = tracing::debug_span!("encode_video", frames = frames.len()).entered();

        let mut cmd = Command::new(&self.settings.ffmpeg);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .args(["-y", "-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgba"])
            .args(["-s", &format!("{width}x{height}")])
            // For rawvideo input, `-r` before `-i` sets the input frame rate.
            .args(["-r", &self.settings.frame_duration.rate()])
            .args(["-i", "pipe:0", "-an", "-c:v", "libx264", "-pix_fmt", "yuv420p"])
            .args(["-crf", &self.settings.crf.to_string()])
            .args(["-movflags", "+faststart"])
            .arg(out);

        let mut child = cmd.spawn().map_err(|e| {
            EncodingError::writer_creation(format!(
                "failed to spawn {}: {e}",
                self.settings.ffmpeg.display()
            ))
        })?;
        let stderr_drain = drain_stderr(&mut child)?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EncodingError::writer_creation("failed to open ffmpeg stdin"))?;

        let mut written = Ok(());
        for (i, frame) in frames.iter().enumerate() {
            let canvas = letterbox(frame, width, height);
            if let Err(e) = stdin.write_all(canvas.as_raw()) {
                written = Err(EncodingError::video(format!(
                    "failed to write frame {i} to ffmpeg: {e}"
                )));
                break;
            }
        }
        drop(stdin);

        let finished = wait(child, stderr_drain).map_err(EncodingError::video);
        // A broken pipe usually means ffmpeg died; its own error is more useful.
        finished.and(written)
    }

    /// Arguments for the mux pass. The audio input is trimmed to the video's
    /// length so the video stream is never cut short.
    pub fn mux_args(
        &self,
        video: &Path,
        audio: &Path,
        out: &Path,
        frame_count: usize,
    ) -> Vec<OsString> {
        let offset = format!("{:.3}", self.settings.audio_offset.as_secs_f64());
        let length = format!(
            "{:.3}",
            frame_count as f64 * self.settings.frame_duration.as_secs_f64()
        );
        let mut args = Vec::from(["-y", "-loglevel", "error", "-i"].map(OsString::from));
        args.push(video.into());
        args.extend(["-ss", &offset, "-t", &length, "-i"].map(OsString::from));
        args.push(audio.into());
        args.extend(
            [
                "-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a", "aac", "-movflags",
                "+faststart",
            ]
            .map(OsString::from),
        );
        args.push(out.into());
        args
    }

    fn mux_audio(
        &self,
        video: &Path,
        audio: &Path,
        out: &Path,
        frame_count: usize,
    ) -> Result<(), EncodingError> {
        let _span = tracing::debug_span!("mux_audio").entered();

        let mut cmd = Command::new(&self.settings.ffmpeg);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .args(self.mux_args(video, audio, out, frame_count));

        let mut child = cmd
            .spawn()
            .map_err(|e| EncodingError::export(format!("failed to spawn ffmpeg: {e}")))?;
        let stderr_drain = drain_stderr(&mut child).map_err(|e| EncodingError::export(e.to_string()))?;
        wait(child, stderr_drain).map_err(EncodingError::export)
    }

    fn encode_into(
        &self,
        frames: &[Frame],
        audio: &Path,
        target: &OutputTarget,
    ) -> Result<PathBuf, EncodingError> {
        if !audio.is_file() {
            return Err(EncodingError::audio(format!(
                "audio asset {} not found",
                audio.display()
            )));
        }
        let size = self.output_size(frames)?;
        if !is_ffmpeg_available(&self.settings.ffmpeg) {
            return Err(EncodingError::writer_creation(format!(
                "{} is required for encoding but could not be run",
                self.settings.ffmpeg.display()
            )));
        }
        target.prepare().map_err(|e| {
            EncodingError::writer_creation(format!(
                "failed to prepare {}: {e}",
                target.dir().display()
            ))
        })?;

        let scratch = target.scratch_path();
        tracing::info!(
            "Encoding {} frames at {}x{} to {}",
            frames.len(),
            size.0,
            size.1,
            scratch.display()
        );
        self.write_video(frames, size, &scratch)?;

        let final_path = target.final_path();
        tracing::info!("Muxing audio from {}", audio.display());
        self.mux_audio(&scratch, audio, &final_path, frames.len())?;

        if let Err(e) = std::fs::remove_file(&scratch) {
            tracing::warn!("failed to remove {}: {e}", scratch.display());
        }
        Ok(final_path)
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new(EncoderSettings::default())
    }
}

impl VideoEncoder for FfmpegEncoder {
    fn encode(
        &self,
        frames: &[Frame],
        audio: &Path,
        target: &OutputTarget,
    ) -> Result<PathBuf, EncodingError> {
        let _span = tracing::debug_span!("ffmpeg_encode").entered();
        let result = self.encode_into(frames, audio, target);
        if result.is_err() {
            // No playable asset may survive a failed run.
            if let Err(e) = target.discard() {
                tracing::warn!("failed to clean up {}: {e}", target.dir().display());
            }
        }
        result
    }
}

/// Aspect-fit `frame` onto an opaque black `width` x `height` canvas.
pub fn letterbox(frame: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(width, height, CANVAS);
    if frame.dimensions() == (width, height) {
        imageops::overlay(&mut canvas, frame, 0, 0);
        return canvas;
    }
    // A frame without raster data becomes a black frame.
    if let Ok(fitted) = fit_within(frame, width, height, CANVAS) {
        let left = (width - fitted.width()) / 2;
        let top = (height - fitted.height()) / 2;
        imageops::overlay(&mut canvas, &fitted, i64::from(left), i64::from(top));
    }
    canvas
}

/// Return `true` when `ffmpeg` can be invoked.
pub fn is_ffmpeg_available(ffmpeg: &Path) -> bool {
    Command::new(ffmpeg)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

type StderrDrain = JoinHandle<std::io::Result<Vec<u8>>>;

fn drain_stderr(child: &mut Child) -> Result<StderrDrain, EncodingError> {
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| EncodingError::writer_creation("failed to open ffmpeg stderr"))?;
    Ok(std::thread::spawn(move || {
        let mut bytes = Vec::new();
        stderr.read_to_end(&mut bytes)?;
        Ok(bytes)
    }))
}

fn wait(mut child: Child, stderr_drain: StderrDrain) -> Result<(), String> {
    let status = child
        .wait()
        .map_err(|e| format!("failed to wait for ffmpeg: {e}"))?;
    let stderr = stderr_drain
        .join()
        .map_err(|_| "ffmpeg stderr drain thread panicked".to_string())?
        .map_err(|e| format!("ffmpeg stderr read failed: {e}"))?;
    if !status.success() {
        return Err(format!(
            "ffmpeg exited with status {}: {}",
            status,
            String::from_utf8_lossy(&stderr).trim()
        ));
    }
    Ok(())
}
