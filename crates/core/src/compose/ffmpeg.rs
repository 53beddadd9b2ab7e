//! FFmpeg-backed renderer.
//!
//! Turns a timeline into a vertical H.264 video: one clip per segment
//! (background still + motion filter + caption + narration audio), fixed
//! intro/outro slates, concat, optional background music bed, thumbnail.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::{
    ComposeError, MotionPattern, RenderAssets, RenderedVideo, Renderer, Segment, Timeline,
    INTRO_SECS, OUTRO_SECS,
};
use crate::narration::tempo_chain;

const FRAME_WIDTH: u32 = 1080;
const FRAME_HEIGHT: u32 = 1920;
const FPS: u32 = 30;
/// Slate color used when no background image is available for a slot.
const SLATE_COLOR: &str = "0x1a1a2e";
/// Thumbnail frame offset, just past the intro.
const THUMBNAIL_AT_SECS: f64 = 3.0;

/// Renderer that shells out to ffmpeg/ffprobe.
pub struct FfmpegRenderer {
    ffmpeg_path: String,
    ffprobe_path: String,
    timeout_secs: u64,
    tempo: f64,
}

impl Default for FfmpegRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRenderer {
    pub fn new() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            timeout_secs: 600,
            tempo: 1.0,
        }
    }

    pub fn with_paths(ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
            timeout_secs: 600,
            tempo: 1.0,
        }
    }

    /// Narration playback rate. Applied to narrated segments as an atempo
    /// chain; factors outside ffmpeg's single-filter range are split by
    /// [`tempo_chain`]. Invalid rates fall back to 1.0.
    pub fn with_tempo(mut self, tempo: f64) -> Self {
        self.tempo = if tempo.is_finite() && tempo > 0.0 {
            tempo
        } else {
            1.0
        };
        self
    }

    fn atempo_filter(tempo: f64) -> String {
        tempo_chain(tempo)
            .iter()
            .map(|f| format!("atempo={:.3}", f))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Checks that ffmpeg and ffprobe are runnable.
    pub async fn validate(&self) -> Result<(), ComposeError> {
        for binary in [&self.ffmpeg_path, &self.ffprobe_path] {
            Command::new(binary)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .map_err(|e| ComposeError::Render(format!("{} not runnable: {}", binary, e)))?;
        }
        Ok(())
    }

    /// Escapes text for use inside a drawtext filter argument.
    fn escape_drawtext(text: &str) -> String {
        text.replace('\\', "\\\\")
            .replace('\'', "\\'")
            .replace(':', "\\:")
            .replace('%', "\\%")
    }

    /// Motion expression for a segment background. Zooms use zoompan; pans
    /// scale the still 10% over frame size and slide the crop window.
    fn motion_filter(motion: MotionPattern, duration_secs: f64) -> String {
        let frames = ((duration_secs * FPS as f64).ceil() as u32).max(1);
        let size = format!("{}x{}", FRAME_WIDTH, FRAME_HEIGHT);
        match motion {
            MotionPattern::ZoomIn => format!(
                "scale={w}:{h}:force_original_aspect_ratio=increase,crop={size},\
                 zoompan=z='1+0.08*on/{frames}':d={frames}:s={size}:fps={fps}",
                w = FRAME_WIDTH,
                h = FRAME_HEIGHT,
                size = size,
                frames = frames,
                fps = FPS,
            ),
            MotionPattern::ZoomOut => format!(
                "scale={w}:{h}:force_original_aspect_ratio=increase,crop={size},\
                 zoompan=z='1.08-0.08*on/{frames}':d={frames}:s={size}:fps={fps}",
                w = FRAME_WIDTH,
                h = FRAME_HEIGHT,
                size = size,
                frames = frames,
                fps = FPS,
            ),
            MotionPattern::PanLeft => format!(
                "scale={sw}:{sh}:force_original_aspect_ratio=increase,\
                 crop={w}:{h}:x='(in_w-out_w)*(1-t/{dur:.3})':y='(in_h-out_h)/2'",
                sw = FRAME_WIDTH + FRAME_WIDTH / 10,
                sh = FRAME_HEIGHT + FRAME_HEIGHT / 10,
                w = FRAME_WIDTH,
                h = FRAME_HEIGHT,
                dur = duration_secs.max(0.1),
            ),
            MotionPattern::PanRight => format!(
                "scale={sw}:{sh}:force_original_aspect_ratio=increase,\
                 crop={w}:{h}:x='(in_w-out_w)*t/{dur:.3}':y='(in_h-out_h)/2'",
                sw = FRAME_WIDTH + FRAME_WIDTH / 10,
                sh = FRAME_HEIGHT + FRAME_HEIGHT / 10,
                w = FRAME_WIDTH,
                h = FRAME_HEIGHT,
                dur = duration_secs.max(0.1),
            ),
        }
    }

    /// Caption overlay; the opening segment gets larger, boxed text.
    fn caption_filter(segment: &Segment) -> String {
        let text = Self::escape_drawtext(&segment.caption);
        let (fontsize, boxcolor) = if segment.highlighted {
            (72, "black@0.7")
        } else {
            (56, "black@0.5")
        };
        format!(
            "drawtext=text='{}':fontcolor=white:fontsize={}:box=1:boxcolor={}:\
             boxborderw=18:x=(w-text_w)/2:y=h*0.72",
            text, fontsize, boxcolor
        )
    }

    /// Arguments for one body segment clip. Narrated segments are sped up to
    /// the configured tempo, so the clip runs shorter than the raw audio.
    fn build_segment_args(
        &self,
        segment: &Segment,
        duration_secs: f64,
        background: Option<&Path>,
        out_path: &Path,
    ) -> Vec<String> {
        let speedup = if segment.audio.is_some() {
            self.tempo
        } else {
            1.0
        };
        let clip_secs = duration_secs / speedup;

        let mut args = vec!["-y".to_string()];
        let mut filters = Vec::new();

        match background {
            Some(image) => {
                args.extend([
                    "-loop".to_string(),
                    "1".to_string(),
                    "-t".to_string(),
                    format!("{:.3}", clip_secs),
                    "-i".to_string(),
                    image.to_string_lossy().to_string(),
                ]);
                filters.push(Self::motion_filter(segment.motion, clip_secs));
            }
            None => {
                args.extend([
                    "-f".to_string(),
                    "lavfi".to_string(),
                    "-t".to_string(),
                    format!("{:.3}", clip_secs),
                    "-i".to_string(),
                    format!(
                        "color=c={}:s={}x{}:r={}",
                        SLATE_COLOR, FRAME_WIDTH, FRAME_HEIGHT, FPS
                    ),
                ]);
            }
        }

        match &segment.audio {
            Some(audio) => {
                args.extend(["-i".to_string(), audio.to_string_lossy().to_string()]);
            }
            None => {
                // Placeholder segment: silent bed keeps the concat streams uniform
                args.extend([
                    "-f".to_string(),
                    "lavfi".to_string(),
                    "-t".to_string(),
                    format!("{:.3}", clip_secs),
                    "-i".to_string(),
                    "anullsrc=r=44100:cl=stereo".to_string(),
                ]);
            }
        }

        if !segment.caption.is_empty() {
            filters.push(Self::caption_filter(segment));
        }

        if !filters.is_empty() {
            args.extend(["-vf".to_string(), filters.join(",")]);
        }

        if (speedup - 1.0).abs() > f64::EPSILON {
            args.extend(["-filter:a".to_string(), Self::atempo_filter(speedup)]);
        }

        args.extend(Self::encode_args(clip_secs));
        args.push(out_path.to_string_lossy().to_string());
        args
    }

    /// Arguments for a silent intro/outro slate.
    fn build_slate_args(&self, duration_secs: f64, out_path: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-f".to_string(),
            "lavfi".to_string(),
            "-t".to_string(),
            format!("{:.3}", duration_secs),
            "-i".to_string(),
            format!(
                "color=c={}:s={}x{}:r={}",
                SLATE_COLOR, FRAME_WIDTH, FRAME_HEIGHT, FPS
            ),
            "-f".to_string(),
            "lavfi".to_string(),
            "-t".to_string(),
            format!("{:.3}", duration_secs),
            "-i".to_string(),
            "anullsrc=r=44100:cl=stereo".to_string(),
        ];
        args.extend(Self::encode_args(duration_secs));
        args.push(out_path.to_string_lossy().to_string());
        args
    }

    fn encode_args(duration_secs: f64) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "veryfast".to_string(),
            "-crf".to_string(),
            "23".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-r".to_string(),
            FPS.to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-ar".to_string(),
            "44100".to_string(),
            "-t".to_string(),
            format!("{:.3}", duration_secs),
            "-loglevel".to_string(),
            "error".to_string(),
        ]
    }

    fn build_concat_args(&self, list_path: &Path, out_path: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            list_path.to_string_lossy().to_string(),
            "-c".to_string(),
            "copy".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            out_path.to_string_lossy().to_string(),
        ]
    }

    fn build_bgm_args(
        &self,
        video_path: &Path,
        bgm_path: &Path,
        volume: f64,
        out_path: &Path,
    ) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            video_path.to_string_lossy().to_string(),
            "-stream_loop".to_string(),
            "-1".to_string(),
            "-i".to_string(),
            bgm_path.to_string_lossy().to_string(),
            "-filter_complex".to_string(),
            format!(
                "[1:a]volume={:.2}[bed];[0:a][bed]amix=inputs=2:duration=first[aout]",
                volume
            ),
            "-map".to_string(),
            "0:v".to_string(),
            "-map".to_string(),
            "[aout]".to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            out_path.to_string_lossy().to_string(),
        ]
    }

    fn build_thumbnail_args(&self, video_path: &Path, at_secs: f64, out_path: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-ss".to_string(),
            format!("{:.3}", at_secs),
            "-i".to_string(),
            video_path.to_string_lossy().to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-q:v".to_string(),
            "3".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            out_path.to_string_lossy().to_string(),
        ]
    }

    /// Real duration of a narration file. The timeline carries the speech
    /// service's estimate; the rendered clip must match the actual audio.
    async fn probe_duration(&self, path: &Path) -> Option<f64> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-show_entries",
                "format=duration",
                "-of",
                "csv=p=0",
            ])
            .arg(path)
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8_lossy(&output.stdout).trim().parse().ok()
    }

    async fn run_ffmpeg(&self, args: &[String]) -> Result<(), ComposeError> {
        debug!("ffmpeg {}", args.join(" "));
        let result = timeout(
            Duration::from_secs(self.timeout_secs),
            Command::new(&self.ffmpeg_path)
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .output(),
        )
        .await;

        match result {
            Ok(Ok(output)) if output.status.success() => Ok(()),
            Ok(Ok(output)) => Err(ComposeError::Render(format!(
                "ffmpeg exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
            Ok(Err(e)) => Err(ComposeError::Render(format!("ffmpeg spawn failed: {}", e))),
            Err(_) => Err(ComposeError::Render(format!(
                "ffmpeg timed out after {}s",
                self.timeout_secs
            ))),
        }
    }
}

#[async_trait]
impl Renderer for FfmpegRenderer {
    async fn render(
        &self,
        timeline: &Timeline,
        assets: &RenderAssets,
        out_dir: &Path,
    ) -> Result<RenderedVideo, ComposeError> {
        let clips_dir = out_dir.join("clips");
        tokio::fs::create_dir_all(&clips_dir)
            .await
            .map_err(|e| ComposeError::Render(format!("cannot create {:?}: {}", clips_dir, e)))?;

        let mut clips: Vec<PathBuf> = Vec::with_capacity(timeline.segments.len() + 2);

        let intro = clips_dir.join("intro.mp4");
        self.run_ffmpeg(&self.build_slate_args(INTRO_SECS, &intro)).await?;
        clips.push(intro);

        for segment in &timeline.segments {
            let background = if assets.backgrounds.is_empty() {
                None
            } else {
                Some(
                    assets.backgrounds[segment.background_slot % assets.backgrounds.len()]
                        .as_path(),
                )
            };

            let duration = match &segment.audio {
                Some(audio) => match self.probe_duration(audio).await {
                    Some(d) if d > 0.0 => d,
                    _ => {
                        warn!("Cannot probe {:?}, using estimated duration", audio);
                        segment.duration_secs
                    }
                },
                None => segment.duration_secs,
            };

            let clip = clips_dir.join(format!("seg_{:02}.mp4", segment.index));
            self.run_ffmpeg(&self.build_segment_args(segment, duration, background, &clip))
                .await?;
            clips.push(clip);
        }

        let outro = clips_dir.join("outro.mp4");
        self.run_ffmpeg(&self.build_slate_args(OUTRO_SECS, &outro)).await?;
        clips.push(outro);

        let list_path = clips_dir.join("concat.txt");
        let list: String = clips
            .iter()
            .map(|c| format!("file '{}'\n", c.to_string_lossy()))
            .collect();
        tokio::fs::write(&list_path, list)
            .await
            .map_err(|e| ComposeError::Render(format!("cannot write concat list: {}", e)))?;

        let video_path = out_dir.join("video.mp4");
        match &assets.bgm {
            Some(bgm) => {
                let raw = clips_dir.join("concat_raw.mp4");
                self.run_ffmpeg(&self.build_concat_args(&list_path, &raw)).await?;
                self.run_ffmpeg(&self.build_bgm_args(&raw, bgm, timeline.bgm_volume, &video_path))
                    .await?;
            }
            None => {
                self.run_ffmpeg(&self.build_concat_args(&list_path, &video_path)).await?;
            }
        }

        let thumbnail_path = out_dir.join("thumbnail.jpg");
        let at = THUMBNAIL_AT_SECS.min(timeline.total_secs / 2.0);
        self.run_ffmpeg(&self.build_thumbnail_args(&video_path, at, &thumbnail_path))
            .await?;

        let _ = tokio::fs::remove_dir_all(&clips_dir).await;

        Ok(RenderedVideo {
            video_path,
            thumbnail_path,
        })
    }
}
