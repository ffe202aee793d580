//! Correlation envelope — the layered, advisory-only report of one cycle
//!
//! Tiers:
//! - perspectives: each shadow with the (shared) advisory verdict
//! - convergence weights: shadow confidences normalized to sum 1
//! - advisory: softmax gradients over the primary perspectives plus tension
//! - reflection: drift / anomaly / tension flags derived from the advisory tier
//!
//! `final_verdict` comes from the resolved mode alone. No single perspective
//! can bind it.

use crate::collaborators::{Shadow, Shadows};
use crate::config::EnvelopeConfig;
use crate::synthesis::LogicState;
use orbmind_core::{Mode, Stimulus, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const FINAL_VERDICT_SOURCE: &str = "mode deliberation (perspective verdicts advisory only)";
/// Confidence assumed for a primary perspective that produced no shadow.
const MISSING_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveVerdict {
    pub confidence: f64,
    pub advisory_verdict: Verdict,
    /// Persistence posterior for this perspective, when one was computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub belief: Option<f64>,
    pub shadow: Shadow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensionIndicators {
    pub entropy: f64,
    pub spread: f64,
    pub reweight_recommended: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryTier {
    pub advisory_only: bool,
    pub confidence_gradients: BTreeMap<String, f64>,
    pub tension: TensionIndicators,
    pub suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectionKind {
    Drift,
    Anomaly,
    Tension,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionEvent {
    pub kind: ReflectionKind,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReflectionFlags {
    pub drift_detected: bool,
    pub anomaly_detected: bool,
    pub ethical_tension: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reflection {
    pub observational_only: bool,
    pub events: Vec<ReflectionEvent>,
    pub flags: ReflectionFlags,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationEnvelope {
    /// Seconds since the Unix epoch
    pub stardate: f64,
    pub glyph_trace: String,
    pub perspectives: BTreeMap<String, PerspectiveVerdict>,
    pub convergence_weights: BTreeMap<String, f64>,
    pub advisory: AdvisoryTier,
    pub reflection: Reflection,
    pub final_verdict: Verdict,
    pub final_verdict_source: String,
    pub confidence: f64,
}

pub struct EnvelopeBuilder {
    config: EnvelopeConfig,
}

impl EnvelopeBuilder {
    pub fn new(config: EnvelopeConfig) -> Self {
        Self { config }
    }

    pub fn build(
        &self,
        stimulus: &Stimulus,
        stardate: f64,
        shadows: &Shadows,
        beliefs: &BTreeMap<String, f64>,
        logic: &LogicState,
        confidence: f64,
    ) -> CorrelationEnvelope {
        let verdict = Verdict::from_mode(logic.active_mode);
        let perspectives = shadows
            .iter()
            .map(|(name, shadow)| {
                let entry = PerspectiveVerdict {
                    confidence: shadow.confidence,
                    advisory_verdict: verdict,
                    belief: beliefs.get(name).copied(),
                    shadow: shadow.clone(),
                };
                (name.clone(), entry)
            })
            .collect();

        let advisory = self.advisory_tier(shadows);
        let reflection = self.reflect(&advisory.tension, logic.active_mode);

        CorrelationEnvelope {
            stardate,
            glyph_trace: glyph_trace(stimulus, stardate),
            perspectives,
            convergence_weights: normalize_weights(shadows),
            advisory,
            reflection,
            final_verdict: verdict,
            final_verdict_source: FINAL_VERDICT_SOURCE.to_string(),
            confidence,
        }
    }

    fn advisory_tier(&self, shadows: &Shadows) -> AdvisoryTier {
        let confidences: Vec<(String, f64)> = self
            .config
            .primary_perspectives
            .iter()
            .map(|name| {
                let c = shadows.get(name).map(|s| s.confidence).unwrap_or(MISSING_CONFIDENCE);
                (name.clone(), c)
            })
            .collect();

        let values: Vec<f64> = confidences.iter().map(|(_, c)| *c).collect();
        let weights = softmax(&values);
        let entropy = shannon_entropy(&weights);
        let spread = match (
            values.iter().cloned().reduce(f64::max),
            values.iter().cloned().reduce(f64::min),
        ) {
            (Some(max), Some(min)) => max - min,
            _ => 0.0,
        };
        let reweight = entropy > self.config.entropy_threshold || spread > self.config.spread_threshold;

        AdvisoryTier {
            advisory_only: true,
            confidence_gradients: confidences
                .into_iter()
                .map(|(name, _)| name)
                .zip(weights)
                .collect(),
            tension: TensionIndicators {
                entropy,
                spread,
                reweight_recommended: reweight,
            },
            suggestion: if reweight {
                "consider re-weighting high-tension perspectives".into()
            } else {
                "no reweight suggested".into()
            },
        }
    }

    fn reflect(&self, tension: &TensionIndicators, mode: Mode) -> Reflection {
        let mut events = Vec::new();
        if tension.spread > self.config.spread_threshold {
            events.push(ReflectionEvent {
                kind: ReflectionKind::Drift,
                detail: "confidence spread exceeded threshold".into(),
            });
        }
        if tension.entropy > self.config.entropy_threshold {
            events.push(ReflectionEvent {
                kind: ReflectionKind::Anomaly,
                detail: "high entropy in perspective gradients".into(),
            });
        }
        if mode == Mode::IntuitionJump && tension.entropy > self.config.tension_entropy {
            events.push(ReflectionEvent {
                kind: ReflectionKind::Tension,
                detail: "intuition jump under high entropy".into(),
            });
        }
        let has = |kind| events.iter().any(|e: &ReflectionEvent| e.kind == kind);
        let flags = ReflectionFlags {
            drift_detected: has(ReflectionKind::Drift),
            anomaly_detected: has(ReflectionKind::Anomaly),
            ethical_tension: has(ReflectionKind::Tension),
        };
        Reflection {
            observational_only: true,
            events,
            flags,
        }
    }
}

/// SHA-256 (hex) over `"<stardate>:<canonical stimulus JSON>"`.
pub fn glyph_trace(stimulus: &Stimulus, stardate: f64) -> String {
    let payload = format!("{}:{}", stardate, stimulus.canonical_json());
    let digest = ring::digest::digest(&ring::digest::SHA256, payload.as_bytes());
    digest.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn softmax(values: &[f64]) -> Vec<f64> {
    let Some(max) = values.iter().cloned().reduce(f64::max) else {
        return Vec::new();
    };
    let exps: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    let total = if total > 0.0 { total } else { 1.0 };
    exps.into_iter().map(|e| e / total).collect()
}

/// Natural-log entropy with a small epsilon so zero weights don't blow up.
pub fn shannon_entropy(weights: &[f64]) -> f64 {
    -weights.iter().map(|p| p * (p + 1e-9).ln()).sum::<f64>()
}

/// Confidences divided by their sum. A zero sum divides by 1.0 instead.
pub fn normalize_weights(shadows: &Shadows) -> BTreeMap<String, f64> {
    let total: f64 = shadows.values().map(|s| s.confidence).sum();
    let total = if total == 0.0 { 1.0 } else { total };
    shadows
        .iter()
        .map(|(name, s)| (name.clone(), s.confidence / total))
        .collect()
}
