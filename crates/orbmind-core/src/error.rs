//! Error types for Orbmind

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("duplicate evidence: {evidence_id} already recorded for {hypothesis}")]
    DuplicateEvidence {
        hypothesis: String,
        evidence_id: String,
    },

    #[error("unknown hypothesis: {0}")]
    UnknownHypothesis(String),

    #[error("collaborator unavailable: {collaborator} - {message}")]
    CollaboratorUnavailable {
        collaborator: String,
        message: String,
    },

    #[error("invalid stimulus: {0}")]
    InvalidStimulus(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn duplicate_evidence(hypothesis: impl Into<String>, evidence_id: impl Into<String>) -> Self {
        Self::DuplicateEvidence {
            hypothesis: hypothesis.into(),
            evidence_id: evidence_id.into(),
        }
    }

    pub fn collaborator(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CollaboratorUnavailable {
            collaborator: collaborator.into(),
            message: message.into(),
        }
    }

    /// Programming errors in the belief table. Callers should not retry these.
    pub fn is_belief_misuse(&self) -> bool {
        matches!(
            self,
            Self::DuplicateEvidence { .. } | Self::UnknownHypothesis(_)
        )
    }
}
