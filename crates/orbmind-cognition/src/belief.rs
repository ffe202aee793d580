//! Belief updater — named hypotheses with evidence-weighted posteriors
//!
//! Not exact Bayesian inference: the posterior is the reliability-weighted
//! mean of every evidence likelihood, with the prior counted as one more item
//! weighted by its strength. Outcome feedback is the only way a prior moves
//! after it has been set.

use orbmind_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

pub const HABIT_CONTINUES: &str = "habit_continues";
pub const JUMP_NECESSARY: &str = "jump_necessary";
pub const GUARD_SUFFICIENT: &str = "guard_sufficient";

/// One piece of evidence attached to a hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub evidence_id: String,
    pub likelihood: f64,
    pub source: String,
    pub reliability: f64,
}

#[derive(Debug, Clone)]
pub struct Hypothesis {
    prior: f64,
    strength: f64,
    evidence: Vec<Evidence>,
    seen: HashSet<String>,
}

impl Hypothesis {
    fn new(prior: f64, strength: f64) -> Self {
        Self {
            prior: clamp_unit(prior),
            strength: strength.max(0.0),
            evidence: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn prior(&self) -> f64 {
        self.prior
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn evidence(&self) -> &[Evidence] {
        &self.evidence
    }

    fn posterior(&self) -> f64 {
        if self.evidence.is_empty() {
            return self.prior;
        }
        let mut weighted = self.prior * self.strength;
        let mut total = self.strength;
        for e in &self.evidence {
            weighted += e.likelihood * e.reliability;
            total += e.reliability;
        }
        if total > 0.0 {
            clamp_unit(weighted / total)
        } else {
            let sum: f64 = self.evidence.iter().map(|e| e.likelihood).sum();
            clamp_unit(sum / self.evidence.len() as f64)
        }
    }
}

/// Table of named hypotheses. Owned by one controller, mutated only inside a cycle.
#[derive(Debug, Clone)]
pub struct BeliefUpdater {
    hypotheses: HashMap<String, Hypothesis>,
    outcome_rate: f64,
}

impl BeliefUpdater {
    pub fn new(outcome_rate: f64) -> Self {
        Self {
            hypotheses: HashMap::new(),
            outcome_rate: clamp_unit(outcome_rate),
        }
    }

    /// Initialize a hypothesis. Returns false (and leaves it untouched) if it already exists.
    pub fn set_prior(&mut self, hypothesis: &str, probability: f64, strength: f64) -> bool {
        if self.hypotheses.contains_key(hypothesis) {
            debug!("Prior for {} already set, ignoring re-initialization", hypothesis);
            return false;
        }
        self.hypotheses
            .insert(hypothesis.to_string(), Hypothesis::new(probability, strength));
        true
    }

    pub fn add_evidence(
        &mut self,
        hypothesis: &str,
        evidence_id: &str,
        likelihood: f64,
        source: &str,
        reliability: f64,
    ) -> Result<()> {
        let h = self
            .hypotheses
            .get_mut(hypothesis)
            .ok_or_else(|| Error::UnknownHypothesis(hypothesis.to_string()))?;
        if !h.seen.insert(evidence_id.to_string()) {
            return Err(Error::duplicate_evidence(hypothesis, evidence_id));
        }
        h.evidence.push(Evidence {
            evidence_id: evidence_id.to_string(),
            likelihood: clamp_unit(likelihood),
            source: source.to_string(),
            reliability: clamp_unit(reliability),
        });
        Ok(())
    }

    pub fn posterior(&self, hypothesis: &str) -> Result<f64> {
        self.hypotheses
            .get(hypothesis)
            .map(Hypothesis::posterior)
            .ok_or_else(|| Error::UnknownHypothesis(hypothesis.to_string()))
    }

    /// Reinforce toward 1.0 on success or 0.0 on failure, scaled by `weight`.
    pub fn update_with_outcome(&mut self, hypothesis: &str, success: bool, weight: f64) -> Result<()> {
        let h = self
            .hypotheses
            .get_mut(hypothesis)
            .ok_or_else(|| Error::UnknownHypothesis(hypothesis.to_string()))?;
        let target = if success { 1.0 } else { 0.0 };
        let step = clamp_unit(weight.max(0.0) * self.outcome_rate);
        h.prior = clamp_unit(h.prior + step * (target - h.prior));
        Ok(())
    }

    pub fn contains(&self, hypothesis: &str) -> bool {
        self.hypotheses.contains_key(hypothesis)
    }

    pub fn hypothesis(&self, hypothesis: &str) -> Option<&Hypothesis> {
        self.hypotheses.get(hypothesis)
    }

    pub fn len(&self) -> usize {
        self.hypotheses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hypotheses.is_empty()
    }

    /// Every posterior, keyed by hypothesis name (sorted).
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.hypotheses
            .iter()
            .map(|(name, h)| (name.clone(), h.posterior()))
            .collect()
    }

    pub fn clear(&mut self) {
        self.hypotheses.clear();
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}
