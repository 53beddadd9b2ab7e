//! Timeline assembly.
//!
//! Pure arithmetic over validated narration durations. Identical input
//! durations must always yield identical segment offsets.

use std::path::PathBuf;

use crate::narration::NarrationPart;

/// Fixed branding intro before the first body segment.
pub const INTRO_SECS: f64 = 2.5;
/// Fixed call-to-action outro after the last body segment.
pub const OUTRO_SECS: f64 = 3.0;
/// Volume of the continuous background music bed.
pub const BGM_VOLUME: f64 = 0.12;

/// Ken-Burns-style motion applied to a segment's background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPattern {
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
}

impl MotionPattern {
    /// Cycles through the four patterns by segment index.
    pub fn for_index(index: usize) -> Self {
        match index % 4 {
            0 => MotionPattern::ZoomIn,
            1 => MotionPattern::ZoomOut,
            2 => MotionPattern::PanLeft,
            _ => MotionPattern::PanRight,
        }
    }
}

/// One body segment of the video.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub index: usize,
    /// Absolute start offset from video start, in seconds.
    pub start_secs: f64,
    pub duration_secs: f64,
    pub caption: String,
    /// The opening segment gets emphasized caption styling.
    pub highlighted: bool,
    pub motion: MotionPattern,
    /// Index into the background asset list, cycling when assets run out.
    pub background_slot: usize,
    /// Narration audio cued at `start_secs`; absent for placeholder segments.
    pub audio: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub segments: Vec<Segment>,
    pub total_secs: f64,
    pub bgm_volume: f64,
}

/// Lay narration parts out as consecutive body segments between the fixed
/// intro and outro.
pub fn build_timeline(parts: &[NarrationPart], background_count: usize) -> Timeline {
    let slots = background_count.max(1);
    let mut segments = Vec::with_capacity(parts.len());
    let mut cursor = INTRO_SECS;

    for (index, part) in parts.iter().enumerate() {
        segments.push(Segment {
            index,
            start_secs: cursor,
            duration_secs: part.duration_secs,
            caption: part.caption.clone(),
            highlighted: index == 0,
            motion: MotionPattern::for_index(index),
            background_slot: index % slots,
            audio: part.audio.as_ref().map(|a| a.path.clone()),
        });
        cursor += part.duration_secs;
    }

    Timeline {
        segments,
        total_secs: cursor + OUTRO_SECS,
        bgm_volume: BGM_VOLUME,
    }
}
