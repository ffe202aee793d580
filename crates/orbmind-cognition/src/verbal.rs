//! Verbal commands addressed to the orb by name

use orbmind_core::OutboundMessage;

const WAKE_WORD: &str = "cali";
const DEFAULT_COLOR: &str = "#00ff88";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerbalCommand {
    SlowDown,
    SpeedUp,
    ChangeColor(&'static str),
    IncreaseSize,
    DecreaseSize,
}

impl VerbalCommand {
    /// Parse a transcription. Only phrases starting with the wake word count.
    pub fn parse(transcription: &str) -> Option<Self> {
        let lower = transcription.trim().to_lowercase();
        let command = lower.strip_prefix(WAKE_WORD)?;

        if command.contains("slow down") {
            Some(Self::SlowDown)
        } else if command.contains("speed up") {
            Some(Self::SpeedUp)
        } else if command.contains("change color") {
            let color = if command.contains("blue") {
                "#00ff88"
            } else if command.contains("red") {
                "#ff4444"
            } else if command.contains("green") {
                "#44ff44"
            } else {
                DEFAULT_COLOR
            };
            Some(Self::ChangeColor(color))
        } else if command.contains("increase size") {
            Some(Self::IncreaseSize)
        } else if command.contains("decrease size") {
            Some(Self::DecreaseSize)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SlowDown => "slow_down",
            Self::SpeedUp => "speed_up",
            Self::ChangeColor(_) => "change_color",
            Self::IncreaseSize => "increase_size",
            Self::DecreaseSize => "decrease_size",
        }
    }

    pub fn color(&self) -> Option<&'static str> {
        match self {
            Self::ChangeColor(c) => Some(*c),
            _ => None,
        }
    }

    pub fn to_message(&self) -> OutboundMessage {
        OutboundMessage::VerbalCommand {
            command: self.name().to_string(),
            color: self.color().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_wake_word() {
        assert_eq!(VerbalCommand::parse("slow down please"), None);
        assert_eq!(VerbalCommand::parse("Cali, slow down"), Some(VerbalCommand::SlowDown));
    }

    #[test]
    fn color_defaults() {
        assert_eq!(
            VerbalCommand::parse("cali change color to red").and_then(|c| c.color()),
            Some("#ff4444")
        );
        assert_eq!(
            VerbalCommand::parse("cali change color").and_then(|c| c.color()),
            Some("#00ff88")
        );
    }

    #[test]
    fn unknown_phrase_is_none() {
        assert_eq!(VerbalCommand::parse("cali sing a song"), None);
    }
}
