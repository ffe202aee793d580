//! Core types for Orbmind

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Kind of interaction event
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StimulusKind {
    CursorMovement,
    TextQuery,
    SpeechQuery,
    SurveillanceProbe,
}

impl StimulusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StimulusKind::CursorMovement => "cursor_movement",
            StimulusKind::TextQuery => "text_query",
            StimulusKind::SpeechQuery => "speech_query",
            StimulusKind::SurveillanceProbe => "surveillance_probe",
        }
    }
}

/// Optional flags riding along with a stimulus
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StimulusMeta {
    #[serde(default)]
    pub test_mode: bool,
}

impl StimulusMeta {
    fn is_empty(&self) -> bool {
        !self.test_mode
    }
}

/// One discrete interaction event. Constructed by the caller, never mutated by the engine.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Stimulus {
    #[serde(rename = "type")]
    pub kind: StimulusKind,
    /// Pixel space, origin top-left
    #[serde(default)]
    pub coordinates: [f64; 2],
    #[serde(default)]
    pub velocity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// Where the orb itself currently sits, if the caller knows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orb_coordinates: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "StimulusMeta::is_empty")]
    pub meta: StimulusMeta,
}

impl Stimulus {
    fn new(kind: StimulusKind) -> Self {
        Self {
            kind,
            coordinates: [0.0, 0.0],
            velocity: 0.0,
            content: None,
            intent: None,
            orb_coordinates: None,
            meta: StimulusMeta::default(),
        }
    }

    pub fn cursor(x: f64, y: f64, velocity: f64) -> Self {
        Self {
            coordinates: [x, y],
            velocity: velocity.max(0.0),
            intent: Some("navigation".into()),
            ..Self::new(StimulusKind::CursorMovement)
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::new(StimulusKind::TextQuery)
        }
    }

    pub fn speech(transcription: impl Into<String>) -> Self {
        Self {
            content: Some(transcription.into()),
            ..Self::new(StimulusKind::SpeechQuery)
        }
    }

    pub fn probe() -> Self {
        Self::new(StimulusKind::SurveillanceProbe)
    }

    pub fn with_test_mode(mut self) -> Self {
        self.meta.test_mode = true;
        self
    }

    pub fn with_orb_coordinates(mut self, x: f64, y: f64) -> Self {
        self.orb_coordinates = Some([x, y]);
        self
    }

    pub fn is_cursor(&self) -> bool {
        self.kind == StimulusKind::CursorMovement
    }

    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Reject values the pipeline cannot reason about (NaN, infinities, negative velocity).
    pub fn validate(&self) -> Result<()> {
        if !self.coordinates.iter().all(|c| c.is_finite()) {
            return Err(Error::InvalidStimulus(format!(
                "non-finite coordinates {:?}",
                self.coordinates
            )));
        }
        if !self.velocity.is_finite() || self.velocity < 0.0 {
            return Err(Error::InvalidStimulus(format!(
                "velocity must be finite and non-negative, got {}",
                self.velocity
            )));
        }
        if let Some(orb) = self.orb_coordinates {
            if !orb.iter().all(|c| c.is_finite()) {
                return Err(Error::InvalidStimulus(format!(
                    "non-finite orb coordinates {:?}",
                    orb
                )));
            }
        }
        Ok(())
    }

    /// Key-sorted JSON rendering. Used for content hashing and cache fingerprints.
    pub fn canonical_json(&self) -> String {
        // serde_json::Map is BTreeMap-backed, so object keys come out sorted.
        serde_json::to_value(self)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }
}

/// Screen quadrant label
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quadrant {
    NW,
    NE,
    SW,
    SE,
}

impl Quadrant {
    /// Split the reference frame at its midpoint.
    pub fn from_coords(coords: [f64; 2], width: f64, height: f64) -> Self {
        let col = usize::from(coords[0] >= width / 2.0);
        let row = usize::from(coords[1] >= height / 2.0);
        [Quadrant::NW, Quadrant::NE, Quadrant::SW, Quadrant::SE][row * 2 + col]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quadrant::NW => "NW",
            Quadrant::NE => "NE",
            Quadrant::SW => "SW",
            Quadrant::SE => "SE",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "NW" => Some(Quadrant::NW),
            "NE" => Some(Quadrant::NE),
            "SW" => Some(Quadrant::SW),
            "SE" => Some(Quadrant::SE),
            _ => None,
        }
    }
}

impl std::fmt::Display for Quadrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved operating regime for one cycle
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    #[default]
    Guard,
    GuardHabit,
    Habit,
    IntuitionJump,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Guard => "GUARD",
            Mode::GuardHabit => "GUARD_HABIT",
            Mode::Habit => "HABIT",
            Mode::IntuitionJump => "INTUITION_JUMP",
        }
    }

    /// GUARD or GUARD_HABIT
    pub fn is_guarded(&self) -> bool {
        matches!(self, Mode::Guard | Mode::GuardHabit)
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_mode(*self)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-binding advisory verdict
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Escalate,
    Act,
    Monitor,
    NoAct,
}

impl Verdict {
    pub fn from_mode(mode: Mode) -> Self {
        match mode {
            Mode::IntuitionJump => Verdict::Escalate,
            Mode::Habit => Verdict::Act,
            Mode::GuardHabit => Verdict::Monitor,
            Mode::Guard => Verdict::NoAct,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Escalate => "escalate",
            Verdict::Act => "act",
            Verdict::Monitor => "monitor",
            Verdict::NoAct => "no_act",
        }
    }
}
