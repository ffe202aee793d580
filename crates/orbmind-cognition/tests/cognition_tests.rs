//! Tests for orbmind-cognition: beliefs, pattern memory, mode resolution,
//! envelopes, and full synthesis cycles against stub collaborators.

use orbmind_cognition::belief::{BeliefUpdater, GUARD_SUFFICIENT, HABIT_CONTINUES, JUMP_NECESSARY};
use orbmind_cognition::collaborators::vault::MemoryVault;
use orbmind_cognition::collaborators::{GridIndex, PerspectiveBench};
use orbmind_cognition::config::{HabitConfig, ScreenConfig};
use orbmind_cognition::convergence::CEILING;
use orbmind_cognition::envelope::{glyph_trace, EnvelopeBuilder, FINAL_VERDICT_SOURCE};
use orbmind_cognition::intuition::NecessityReport;
use orbmind_cognition::proprioception::Navigator;
use orbmind_cognition::*;
use orbmind_core::{Error, Mode, Quadrant, Result, Stimulus, Verdict};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ===========================================================================
// Stub collaborators
// ===========================================================================

struct StubIndex {
    coords: Mutex<Vec<Vec<f64>>>,
    neighbors: Vec<FieldNode>,
    breach: usize,
    offline: bool,
    purges: AtomicUsize,
}

impl StubIndex {
    fn with_nodes(coords: Vec<Vec<f64>>) -> Self {
        Self {
            coords: Mutex::new(coords),
            neighbors: Vec::new(),
            breach: 0,
            offline: false,
            purges: AtomicUsize::new(0),
        }
    }

    fn empty() -> Self {
        Self::with_nodes(Vec::new())
    }

    /// `n` nodes spread so that almost no pair mirrors another.
    fn scattered(n: usize) -> Self {
        Self::with_nodes((0..n).map(|i| vec![i as f64 * 0.01, i as f64 * 0.003]).collect())
    }

    /// `n` nodes stacked on the origin, perfectly symmetric.
    fn symmetric(n: usize) -> Self {
        Self::with_nodes(vec![vec![0.0, 0.0]; n])
    }
}

impl SpatialIndex for StubIndex {
    fn map_adjacency(&self, _stimulus: &Stimulus) -> Result<FieldNode> {
        if self.offline {
            return Err(Error::collaborator("stub_index", "offline"));
        }
        Ok(FieldNode {
            n: 7,
            k: 1,
            coordinates: vec![0.1, 0.2],
            adjacency_value: 0.5,
        })
    }

    fn recursive_neighbors(&self, _node: &FieldNode, _radius: usize) -> Result<Vec<FieldNode>> {
        if self.offline {
            return Err(Error::collaborator("stub_index", "offline"));
        }
        Ok(self.neighbors.clone())
    }

    fn thought_vector(&self, nodes: &[FieldNode]) -> Vec<f64> {
        let mut acc = vec![0.0; 2];
        for node in nodes {
            for (a, v) in acc.iter_mut().zip(&node.coordinates) {
                *a += v;
            }
        }
        acc.iter().map(|a| a / nodes.len().max(1) as f64).collect()
    }

    fn dimension(&self) -> usize {
        2
    }

    fn node_count(&self) -> usize {
        self.coords.lock().unwrap().len()
    }

    fn node_coordinates(&self) -> Vec<Vec<f64>> {
        self.coords.lock().unwrap().clone()
    }

    fn last_density_breach(&self) -> usize {
        self.breach
    }

    fn edge_cutter_purge(&self) -> usize {
        self.purges.fetch_add(1, Ordering::SeqCst);
        let mut coords = self.coords.lock().unwrap();
        let removed = coords.len() / 2;
        coords.drain(..removed);
        removed
    }
}

struct StubShadows {
    shadows: Option<Shadows>,
}

impl StubShadows {
    fn uniform(confidence: f64) -> Self {
        let shadows = ["locke", "hume", "kant", "spinoza"]
            .iter()
            .map(|p| (p.to_string(), Shadow::new(confidence)))
            .collect();
        Self { shadows: Some(shadows) }
    }

    fn offline() -> Self {
        Self { shadows: None }
    }
}

impl ShadowGenerator for StubShadows {
    fn generate_epistemic_shadow(&self, _stimulus: &Stimulus) -> Result<Shadows> {
        self.shadows
            .clone()
            .ok_or_else(|| Error::collaborator("stub_shadows", "offline"))
    }
}

/// Store that accepts writes and remembers nothing.
struct NullStore;

impl CrystalStore for NullStore {
    fn crystallize_pattern(&self, _key: &str, _prediction: PatternPrediction) -> Result<()> {
        Ok(())
    }

    fn posteriori(&self, _key: &str) -> Option<PatternPrediction> {
        None
    }

    fn crystallize_thought(&self, _stimulus: &Stimulus, _record: ThoughtRecord) -> Result<()> {
        Ok(())
    }

    fn lightning_query(&self, _stimulus: &Stimulus) -> Option<ThoughtRecord> {
        None
    }
}

struct OfflineField;

impl FieldBridge for OfflineField {
    fn stimulus_to_field_stats(&self, _stimulus: &Stimulus) -> Result<FieldStats> {
        Err(Error::collaborator("ambient_field", "offline"))
    }
}

fn controller_with(index: StubIndex, store: Arc<dyn CrystalStore>) -> OrbController {
    OrbController::seeded(
        OrbConfig::default(),
        Arc::new(index),
        Arc::new(StubShadows::uniform(0.6)),
        store,
        None,
        7,
    )
}

fn thought_of(result: Option<Synthesis>) -> Thought {
    match result {
        Some(Synthesis::Thought(t)) => *t,
        other => panic!("expected a full thought, got {:?}", other),
    }
}

fn seeded_beliefs(habit: f64, jump: f64, guard: f64) -> BeliefUpdater {
    let mut beliefs = BeliefUpdater::new(0.1);
    beliefs.set_prior(HABIT_CONTINUES, habit, 1.0);
    beliefs.set_prior(JUMP_NECESSARY, jump, 1.0);
    beliefs.set_prior(GUARD_SUFFICIENT, guard, 1.0);
    beliefs
}

fn quiet_necessity(density: usize) -> NecessityReport {
    NecessityReport {
        jump_triggered: false,
        necessity_vector: None,
        symmetry_score: 0.0,
        certainty: 0.0,
        field_density: density,
        bypass_steps: None,
    }
}

fn prediction(confidence: f64) -> Prediction {
    Prediction {
        prediction_type: PredictionType::QuadrantTransition,
        target: Some(Quadrant::NW),
        confidence,
        vivacity: (confidence * 1.2).min(1.0),
    }
}

// ===========================================================================
// Belief updater
// ===========================================================================

#[test]
fn posterior_without_evidence_is_prior() {
    let mut beliefs = BeliefUpdater::new(0.1);
    beliefs.set_prior("h", 0.42, 2.0);
    assert_eq!(beliefs.posterior("h").unwrap(), 0.42);
}

#[test]
fn posterior_is_idempotent() {
    let mut beliefs = BeliefUpdater::new(0.1);
    beliefs.set_prior("h", 0.5, 1.0);
    beliefs.add_evidence("h", "e1", 0.9, "test", 0.8).unwrap();
    beliefs.add_evidence("h", "e2", 0.2, "test", 0.3).unwrap();
    let first = beliefs.posterior("h").unwrap();
    let second = beliefs.posterior("h").unwrap();
    assert_eq!(first, second);
}

#[test]
fn posterior_weights_prior_by_strength() {
    let mut beliefs = BeliefUpdater::new(0.1);
    beliefs.set_prior("h", 0.5, 1.0);
    beliefs.add_evidence("h", "e1", 1.0, "test", 1.0).unwrap();
    // (0.5·1 + 1.0·1) / (1 + 1)
    assert!((beliefs.posterior("h").unwrap() - 0.75).abs() < 1e-12);
}

#[test]
fn duplicate_evidence_is_rejected_and_not_overwritten() {
    let mut beliefs = BeliefUpdater::new(0.1);
    beliefs.set_prior("h", 0.5, 1.0);
    beliefs.add_evidence("h", "e1", 1.0, "test", 1.0).unwrap();
    let before = beliefs.posterior("h").unwrap();

    let err = beliefs.add_evidence("h", "e1", 0.0, "test", 1.0).unwrap_err();
    assert!(matches!(err, Error::DuplicateEvidence { .. }));
    assert!(err.is_belief_misuse());
    assert_eq!(beliefs.posterior("h").unwrap(), before);
    assert_eq!(beliefs.hypothesis("h").unwrap().evidence().len(), 1);
}

#[test]
fn unknown_hypothesis_fails_fast() {
    let mut beliefs = BeliefUpdater::new(0.1);
    assert!(matches!(
        beliefs.add_evidence("missing", "e1", 0.5, "test", 1.0),
        Err(Error::UnknownHypothesis(_))
    ));
    assert!(matches!(beliefs.posterior("missing"), Err(Error::UnknownHypothesis(_))));
    assert!(beliefs.update_with_outcome("missing", true, 1.0).is_err());
}

#[test]
fn set_prior_does_not_reinitialize() {
    let mut beliefs = BeliefUpdater::new(0.1);
    assert!(beliefs.set_prior("h", 0.5, 1.0));
    assert!(!beliefs.set_prior("h", 0.9, 3.0));
    assert_eq!(beliefs.hypothesis("h").unwrap().prior(), 0.5);
}

#[test]
fn outcomes_nudge_prior() {
    let mut beliefs = BeliefUpdater::new(0.1);
    beliefs.set_prior("h", 0.5, 1.0);
    beliefs.update_with_outcome("h", true, 1.0).unwrap();
    assert!((beliefs.hypothesis("h").unwrap().prior() - 0.55).abs() < 1e-12);
    beliefs.update_with_outcome("h", false, 1.0).unwrap();
    assert!((beliefs.hypothesis("h").unwrap().prior() - 0.495).abs() < 1e-12);
}

#[test]
fn probabilities_are_clamped() {
    let mut beliefs = BeliefUpdater::new(0.1);
    beliefs.set_prior("h", 1.7, 1.0);
    beliefs.add_evidence("h", "e1", -3.0, "test", 5.0).unwrap();
    let p = beliefs.posterior("h").unwrap();
    assert!((0.0..=1.0).contains(&p));
}

// ===========================================================================
// Pattern memory
// ===========================================================================

fn tracker() -> HabitTracker {
    HabitTracker::new(HabitConfig::default(), &ScreenConfig::default())
}

#[test]
fn non_cursor_stimuli_are_ignored() {
    let mut habit = tracker();
    let vault = MemoryVault::new();
    assert!(habit.record_observation(&Stimulus::text("hi"), &vault).is_none());
    assert_eq!(habit.buffered(), 0);
}

#[test]
fn ring_buffer_evicts_oldest() {
    let mut habit = tracker();
    let vault = MemoryVault::new();
    for i in 0..8 {
        habit.record_observation(&Stimulus::cursor(10.0 * i as f64, 10.0, 1.0), &vault);
    }
    assert_eq!(habit.buffered(), 5);
    let first = habit.observations().next().unwrap();
    assert_eq!(first.coords, [30.0, 10.0]);
}

#[test]
fn predict_next_needs_a_full_pattern() {
    let mut habit = tracker();
    let vault = MemoryVault::new();
    habit.record_observation(&Stimulus::cursor(100.0, 100.0, 1.0), &vault);
    habit.record_observation(&Stimulus::cursor(100.0, 100.0, 1.0), &vault);
    assert!(habit.predict_next(&vault).is_none());
}

#[test]
fn repeated_key_predicts_half_confidence() {
    let mut habit = tracker();
    let vault = MemoryVault::new();
    // Seven NW samples produce the NW_NW_NW key five times.
    for _ in 0..7 {
        habit.record_observation(&Stimulus::cursor(100.0, 200.0, 5.0), &vault);
    }
    assert_eq!(habit.occurrences("NW_NW_NW"), 5);

    let p = habit.predict_next(&vault).unwrap();
    assert_eq!(p.prediction_type, PredictionType::QuadrantTransition);
    assert_eq!(p.target, Some(Quadrant::NW));
    assert!((p.confidence - 0.5).abs() < 1e-12);
    assert!((p.vivacity - 0.6).abs() < 1e-12);
}

#[test]
fn predict_confidence_is_non_decreasing() {
    let mut habit = tracker();
    let vault = MemoryVault::new();
    let sequence = [(100.0, 100.0), (1500.0, 100.0), (1500.0, 900.0)];
    let mut last = 0.0;
    for round in 0..4 {
        for (x, y) in sequence {
            habit.record_observation(&Stimulus::cursor(x, y, 2.0), &vault);
            if let Some(p) = habit.predict_next(&vault) {
                if round > 0 {
                    assert!(p.confidence >= last, "{} < {}", p.confidence, last);
                    last = p.confidence;
                }
            }
        }
    }
    assert!(last > 0.0);
}

#[test]
fn missing_store_prediction_is_unsure() {
    let mut habit = tracker();
    for _ in 0..3 {
        habit.record_observation(&Stimulus::cursor(1800.0, 900.0, 1.0), &NullStore);
    }
    let p = habit.predict_next(&NullStore).unwrap();
    assert_eq!(p.prediction_type, PredictionType::Unsure);
    assert_eq!(p.target, None);
    assert_eq!(p.confidence, 0.3);
    assert_eq!(p.vivacity, 0.4);
}

#[test]
fn pattern_is_crystallized_under_habit_key() {
    let mut habit = tracker();
    let vault = MemoryVault::new();
    for _ in 0..3 {
        habit.record_observation(&Stimulus::cursor(1800.0, 100.0, 1.0), &vault);
    }
    let stored = vault.posteriori("habit_NE_NE_NE").unwrap();
    assert_eq!(stored.predicted_next, Quadrant::NE);
    assert!((stored.frequency - 0.1).abs() < 1e-12);
    assert_eq!(stored.temporal_decay, 0.95);
}

#[test]
fn quadrant_heat_tracks_pattern_traffic() {
    let mut habit = tracker();
    let vault = MemoryVault::new();
    for _ in 0..7 {
        habit.record_observation(&Stimulus::cursor(100.0, 200.0, 5.0), &vault);
    }
    assert!((habit.quadrant_heat(Quadrant::NW) - 0.05).abs() < 1e-12);
    assert_eq!(habit.quadrant_heat(Quadrant::SE), 0.0);
}

// ===========================================================================
// Mode synthesizer
// ===========================================================================

fn synthesizer() -> ModeSynthesizer {
    let config = OrbConfig::default();
    ModeSynthesizer::new(&config.habit, &config.beliefs, &config.field)
}

#[test]
fn jump_is_sticky_for_the_cycle() {
    let necessity = NecessityReport {
        jump_triggered: true,
        necessity_vector: Some([0.1, 0.2]),
        symmetry_score: 0.95,
        certainty: 0.98,
        field_density: 60,
        bypass_steps: Some(6),
    };
    let beliefs = seeded_beliefs(0.9, 0.0, 0.9);
    let state = synthesizer()
        .resolve(&necessity, Some(&prediction(0.9)), &beliefs, BTreeMap::new(), 60)
        .unwrap();
    assert_eq!(state.active_mode, Mode::IntuitionJump);
    assert!(state.intuitive_jump_triggered);
    assert_eq!(state.certainty, Some(0.98));
    assert_eq!(state.symmetry_score, 0.95);
    assert!(state.posteriors.is_none(), "later rules must not run");
}

#[test]
fn no_prediction_stays_guard() {
    let beliefs = seeded_beliefs(0.5, 0.3, 0.7);
    let state = synthesizer()
        .resolve(&quiet_necessity(0), None, &beliefs, BTreeMap::new(), 0)
        .unwrap();
    assert_eq!(state.active_mode, Mode::Guard);
    assert!(state.posteriors.is_some());
}

#[test]
fn symmetry_is_reported_without_a_jump() {
    let necessity = NecessityReport {
        symmetry_score: 0.42,
        ..quiet_necessity(60)
    };
    let beliefs = seeded_beliefs(0.5, 0.3, 0.7);
    let state = synthesizer()
        .resolve(&necessity, Some(&prediction(0.1)), &beliefs, BTreeMap::new(), 60)
        .unwrap();
    assert!(!state.intuitive_jump_triggered);
    assert_eq!(state.symmetry_score, 0.42);
    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["symmetry_score"], 0.42);
}

#[test]
fn confident_prediction_selects_habit() {
    let beliefs = seeded_beliefs(0.5, 0.3, 0.7);
    let s = synthesizer();
    let habit = s
        .resolve(&quiet_necessity(0), Some(&prediction(0.5)), &beliefs, BTreeMap::new(), 0)
        .unwrap();
    assert_eq!(habit.active_mode, Mode::Habit);
    assert!(habit.custom_habit_active);

    let guarded = s
        .resolve(&quiet_necessity(0), Some(&prediction(0.3)), &beliefs, BTreeMap::new(), 0)
        .unwrap();
    assert_eq!(guarded.active_mode, Mode::GuardHabit);
    assert!(!guarded.custom_habit_active);
}

#[test]
fn purge_density_forces_guard_habit() {
    let beliefs = seeded_beliefs(0.5, 0.3, 0.7);
    let state = synthesizer()
        .resolve(&quiet_necessity(800), None, &beliefs, BTreeMap::new(), 800)
        .unwrap();
    assert_eq!(state.active_mode, Mode::GuardHabit);
    assert_eq!(state.density_penalty, Some(1.0));
    assert!(!state.invariant_violation);
}

#[test]
fn critical_density_forces_jump() {
    let beliefs = seeded_beliefs(0.5, 0.3, 0.7);
    let state = synthesizer()
        .resolve(&quiet_necessity(950), Some(&prediction(0.9)), &beliefs, BTreeMap::new(), 950)
        .unwrap();
    assert_eq!(state.active_mode, Mode::IntuitionJump);
    assert_eq!(state.density_penalty, Some(1.5));
    assert!(!state.intuitive_jump_triggered);
}

#[test]
fn strong_habit_posterior_promotes_guard() {
    let beliefs = seeded_beliefs(0.6, 0.3, 0.7);
    let state = synthesizer()
        .resolve(&quiet_necessity(0), None, &beliefs, BTreeMap::new(), 0)
        .unwrap();
    assert_eq!(state.active_mode, Mode::Habit);
}

#[test]
fn strong_jump_posterior_escalates() {
    let beliefs = seeded_beliefs(0.9, 0.5, 0.7);
    let state = synthesizer()
        .resolve(&quiet_necessity(0), Some(&prediction(0.9)), &beliefs, BTreeMap::new(), 0)
        .unwrap();
    assert_eq!(state.active_mode, Mode::IntuitionJump);
}

#[test]
fn unseeded_beliefs_surface_an_error() {
    let beliefs = BeliefUpdater::new(0.1);
    let result = synthesizer().resolve(&quiet_necessity(0), None, &beliefs, BTreeMap::new(), 0);
    assert!(matches!(result, Err(Error::UnknownHypothesis(_))));
}

#[test]
fn density_never_resolves_guard() {
    let s = synthesizer();
    for habit in [0.0, 0.3, 0.5, 0.9] {
        for jump in [0.0, 0.2, 0.44] {
            let beliefs = seeded_beliefs(habit, jump, 1.0);
            for density in [800, 850, 949, 950, 5000] {
                for inductive in [None, Some(prediction(0.1)), Some(prediction(0.8))] {
                    let state = s
                        .resolve(
                            &quiet_necessity(density),
                            inductive.as_ref(),
                            &beliefs,
                            BTreeMap::new(),
                            density,
                        )
                        .unwrap();
                    assert_ne!(state.active_mode, Mode::Guard, "density {}", density);
                    assert!(!state.invariant_violation);
                }
            }
        }
    }
}

// ===========================================================================
// Envelope
// ===========================================================================

fn shadows_of(pairs: &[(&str, f64)]) -> Shadows {
    pairs
        .iter()
        .map(|(name, c)| (name.to_string(), Shadow::new(*c)))
        .collect()
}

fn logic_in(mode: Mode) -> LogicState {
    LogicState {
        active_mode: mode,
        ..LogicState::default()
    }
}

#[test]
fn glyph_trace_is_deterministic() {
    let s = Stimulus::cursor(100.0, 200.0, 5.0);
    let a = glyph_trace(&s, 1_700_000_000.5);
    let b = glyph_trace(&s, 1_700_000_000.5);
    assert_eq!(a, b);
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));

    assert_ne!(a, glyph_trace(&s, 1_700_000_001.5));
    assert_ne!(a, glyph_trace(&Stimulus::cursor(100.0, 201.0, 5.0), 1_700_000_000.5));
}

#[test]
fn envelope_verdict_comes_from_mode() {
    let builder = EnvelopeBuilder::new(OrbConfig::default().envelope);
    let shadows = shadows_of(&[("locke", 0.9), ("hume", 0.1), ("kant", 0.5), ("spinoza", 0.7)]);
    for mode in [Mode::Guard, Mode::GuardHabit, Mode::Habit, Mode::IntuitionJump] {
        let envelope = builder.build(
            &Stimulus::text("q"),
            1.0,
            &shadows,
            &BTreeMap::new(),
            &logic_in(mode),
            0.9,
        );
        assert_eq!(envelope.final_verdict, Verdict::from_mode(mode));
        assert_eq!(envelope.final_verdict_source, FINAL_VERDICT_SOURCE);
        assert!(!envelope.perspectives.contains_key(&envelope.final_verdict_source));
        assert!(envelope
            .perspectives
            .values()
            .all(|p| p.advisory_verdict == envelope.final_verdict));
    }
}

#[test]
fn envelope_weights_are_normalized() {
    let builder = EnvelopeBuilder::new(OrbConfig::default().envelope);
    let shadows = shadows_of(&[("locke", 0.2), ("hume", 0.3), ("kant", 0.5)]);
    let envelope = builder.build(
        &Stimulus::text("q"),
        1.0,
        &shadows,
        &BTreeMap::new(),
        &logic_in(Mode::Guard),
        0.9,
    );
    let total: f64 = envelope.convergence_weights.values().sum();
    assert!((total - 1.0).abs() < 1e-12);
    assert!((envelope.convergence_weights["kant"] - 0.5).abs() < 1e-12);

    let gradients: f64 = envelope.advisory.confidence_gradients.values().sum();
    assert!((gradients - 1.0).abs() < 1e-12);
    assert!(envelope.advisory.advisory_only);
    assert!(envelope.reflection.observational_only);
}

#[test]
fn wide_spread_flags_drift() {
    let builder = EnvelopeBuilder::new(OrbConfig::default().envelope);
    let shadows = shadows_of(&[("hume", 0.2), ("kant", 0.9), ("spinoza", 0.5)]);
    let envelope = builder.build(
        &Stimulus::text("q"),
        1.0,
        &shadows,
        &BTreeMap::new(),
        &logic_in(Mode::Habit),
        0.9,
    );
    assert!((envelope.advisory.tension.spread - 0.7).abs() < 1e-12);
    assert!(envelope.advisory.tension.reweight_recommended);
    assert!(envelope.reflection.flags.drift_detected);
    assert!(!envelope.reflection.flags.ethical_tension);
}

#[test]
fn uniform_perspectives_are_maximally_uncertain() {
    let builder = EnvelopeBuilder::new(OrbConfig::default().envelope);
    // Missing primaries count as 0.5, so an empty shadow map is uniform too.
    let envelope = builder.build(
        &Stimulus::text("q"),
        1.0,
        &Shadows::new(),
        &BTreeMap::new(),
        &logic_in(Mode::IntuitionJump),
        0.9,
    );
    let tension = &envelope.advisory.tension;
    assert!((tension.entropy - 3f64.ln()).abs() < 1e-6);
    assert_eq!(tension.spread, 0.0);
    assert!(envelope.reflection.flags.anomaly_detected);
    assert!(!envelope.reflection.flags.drift_detected);
    assert!(envelope.reflection.flags.ethical_tension);
    for w in envelope.advisory.confidence_gradients.values() {
        assert!((w - 1.0 / 3.0).abs() < 1e-12);
    }
}

// ===========================================================================
// Controller
// ===========================================================================

#[test]
fn first_cursor_stimulus_is_guarded() {
    let mut orb = controller_with(StubIndex::empty(), Arc::new(MemoryVault::new()));
    let thought = thought_of(orb.process_stimulus(&Stimulus::cursor(100.0, 200.0, 5.0)));

    assert!(matches!(thought.mode(), Mode::Guard | Mode::GuardHabit));
    assert!(thought.confidence() >= 0.85);
    assert!(thought.confidence() <= 0.87 + 1e-9);
    assert_eq!(thought.shadows().len(), 4);
    assert_eq!(thought.spatial().node_id, "NODE_7_1");
    assert_eq!(thought.envelope().final_verdict, Verdict::from_mode(thought.mode()));
}

#[test]
fn pulse_carries_the_full_spatial_descriptor() {
    let mut orb = controller_with(StubIndex::empty(), Arc::new(MemoryVault::new()));
    let thought = thought_of(orb.process_stimulus(&Stimulus::cursor(100.0, 200.0, 5.0)));

    let pulse = thought.pulse();
    assert_eq!(&pulse.spatial_coordinate, thought.spatial());
    let json = serde_json::to_value(&pulse).unwrap();
    let spatial = &json["spatial_coordinate"];
    assert_eq!(spatial["node_id"], "NODE_7_1");
    assert_eq!(spatial["recursion_depth"], 1);
    assert_eq!(spatial["coordinates"], serde_json::json!([0.1, 0.2]));
    assert_eq!(spatial["adjacency_value"], 0.5);
}

#[test]
fn surveillance_probe_is_rejected_without_mutation() {
    let mut orb = controller_with(StubIndex::empty(), Arc::new(MemoryVault::new()));
    orb.process_stimulus(&Stimulus::cursor(100.0, 200.0, 5.0));

    let beliefs_before = orb.beliefs().snapshot();
    let buffered_before = orb.habit().buffered();
    let position_before = orb.navigator().position();

    assert!(orb.process_stimulus(&Stimulus::probe()).is_none());

    assert_eq!(orb.beliefs().snapshot(), beliefs_before);
    assert_eq!(orb.habit().buffered(), buffered_before);
    assert_eq!(orb.navigator().position(), position_before);
    assert_eq!(orb.status().rejected, 1);
    assert_eq!(orb.status().cycles_processed, 1);
}

#[test]
fn test_mode_probe_is_processed() {
    let mut orb = controller_with(StubIndex::empty(), Arc::new(MemoryVault::new()));
    assert!(orb.process_stimulus(&Stimulus::probe().with_test_mode()).is_some());
}

#[test]
fn invalid_stimulus_is_rejected() {
    let mut orb = controller_with(StubIndex::empty(), Arc::new(MemoryVault::new()));
    assert!(orb.process_stimulus(&Stimulus::cursor(f64::NAN, 1.0, 1.0)).is_none());
    assert_eq!(orb.status().rejected, 1);
}

#[test]
fn lightning_bypass_returns_cached_result() {
    let vault = Arc::new(MemoryVault::new());
    let mut orb = controller_with(StubIndex::empty(), vault.clone());
    let stimulus = Stimulus::text("what is the shape of this?");

    let first = orb.process_stimulus(&stimulus).unwrap();
    assert!(!first.is_cached());
    assert_eq!(vault.thought_count(), 1);

    let beliefs_before = orb.beliefs().snapshot();
    let second = orb.process_stimulus(&stimulus).unwrap();
    assert!(second.is_cached());
    assert_eq!(second.mode(), first.mode());
    assert_eq!(second.confidence(), first.confidence());
    assert_eq!(second.pulse(), first.pulse());
    assert_eq!(orb.beliefs().snapshot(), beliefs_before);
    assert_eq!(orb.status().bypassed, 1);
}

#[test]
fn without_lightning_every_cycle_is_full() {
    let mut orb = controller_with(StubIndex::empty(), Arc::new(MemoryVault::without_lightning()));
    let stimulus = Stimulus::text("again");
    assert!(!orb.process_stimulus(&stimulus).unwrap().is_cached());
    assert!(!orb.process_stimulus(&stimulus).unwrap().is_cached());
}

#[test]
fn dense_field_never_resolves_guard() {
    for n in [800, 900, 1200] {
        let mut orb = controller_with(StubIndex::scattered(n), Arc::new(NullStore));
        for i in 0..4 {
            let thought =
                thought_of(orb.process_stimulus(&Stimulus::cursor(50.0 * i as f64, 300.0, 2.0)));
            assert_ne!(thought.mode(), Mode::Guard, "density {}", n);
            assert!(!thought.logic().invariant_violation);
        }
        assert_eq!(orb.status().invariant_violations, 0);
    }
}

#[test]
fn density_breach_counts_toward_density() {
    let index = StubIndex {
        breach: 1000,
        ..StubIndex::empty()
    };
    let mut orb = controller_with(index, Arc::new(NullStore));
    let thought = thought_of(orb.process_stimulus(&Stimulus::text("crowded")));
    assert_eq!(thought.logic().field_density, 1000);
    assert_eq!(thought.mode(), Mode::IntuitionJump);
    assert_eq!(thought.logic().density_penalty, Some(1.5));
}

#[test]
fn symmetric_dense_field_triggers_jump() {
    let index = StubIndex {
        neighbors: vec![FieldNode {
            n: 1,
            k: 0,
            coordinates: vec![100.0, 100.0],
            adjacency_value: 0.5,
        }],
        ..StubIndex::symmetric(60)
    };
    let mut orb = controller_with(index, Arc::new(NullStore));
    let thought = thought_of(orb.process_stimulus(&Stimulus::cursor(900.0, 500.0, 1.0)));

    assert_eq!(thought.mode(), Mode::IntuitionJump);
    assert!(thought.logic().intuitive_jump_triggered);
    assert_eq!(thought.logic().necessity_vector, Some([0.0, 0.0]));
    assert_eq!(thought.confidence(), CEILING);

    let pulse = thought.pulse();
    assert!(pulse.deterministic);
    assert_eq!(pulse.jump_vector, Some([0.0, 0.0]));
    assert_eq!(pulse.final_verdict, Verdict::Escalate);
}

#[test]
fn confidence_stays_bounded() {
    let mut orb = controller_with(StubIndex::symmetric(60), Arc::new(NullStore));
    let stimuli = [
        Stimulus::cursor(10.0, 10.0, 50.0),
        Stimulus::text("a"),
        Stimulus::speech("cali speed up"),
        Stimulus::cursor(1900.0, 1000.0, 0.0),
    ];
    for s in &stimuli {
        let c = orb.process_stimulus(s).unwrap().confidence();
        assert!((0.0..=CEILING).contains(&c), "confidence {}", c);
    }
}

#[test]
fn collaborator_failures_degrade_gracefully() {
    let index = StubIndex {
        offline: true,
        ..StubIndex::empty()
    };
    let mut orb = OrbController::seeded(
        OrbConfig::default(),
        Arc::new(index),
        Arc::new(StubShadows::offline()),
        Arc::new(NullStore),
        Some(Arc::new(OfflineField)),
        7,
    );
    let thought = thought_of(orb.process_stimulus(&Stimulus::cursor(100.0, 200.0, 5.0)));
    assert!(thought.shadows().is_empty());
    assert_eq!(thought.spatial().node_id, "NODE_0_0");
    assert_eq!(thought.gravity_stats(), &FieldStats::empty());
    assert!((thought.confidence() - 0.85).abs() < 1e-12);
    assert_eq!(thought.epistemic_alignment(), 0.0);
}

#[test]
fn guard_cycle_feeds_back_into_beliefs() {
    let mut orb = controller_with(StubIndex::empty(), Arc::new(NullStore));
    let thought = thought_of(orb.process_stimulus(&Stimulus::cursor(100.0, 200.0, 5.0)));
    assert_eq!(thought.mode(), Mode::Guard);

    let beliefs = orb.beliefs();
    assert!(beliefs.hypothesis(GUARD_SUFFICIENT).unwrap().prior() > 0.7);
    assert!(beliefs.hypothesis(HABIT_CONTINUES).unwrap().prior() < 0.5);
    assert!(beliefs.hypothesis(JUMP_NECESSARY).unwrap().prior() < 0.3);
}

#[test]
fn shadows_feed_persistence_beliefs() {
    let mut orb = controller_with(StubIndex::empty(), Arc::new(NullStore));
    let thought = thought_of(orb.process_stimulus(&Stimulus::text("hello")));

    let bayes = &thought.logic().epistemic_bayes;
    assert_eq!(bayes.len(), 4);
    // (0.5·1.0 + 0.6·1.0) / 2
    assert!((bayes["locke"] - 0.55).abs() < 1e-12);
    assert!(orb.beliefs().contains("kant_pattern_persistence"));

    orb.process_stimulus(&Stimulus::text("hello again"));
    let h = orb.beliefs().hypothesis("kant_pattern_persistence").unwrap();
    assert_eq!(h.evidence().len(), 2);
}

#[test]
fn emergency_purge_respects_floor() {
    let mut small = controller_with(StubIndex::scattered(10), Arc::new(NullStore));
    assert!(!small.emergency_purge());
    assert_eq!(small.status().live_nodes, 10);

    let mut large = controller_with(StubIndex::scattered(1001), Arc::new(NullStore));
    assert!(large.emergency_purge());
    assert_eq!(large.status().live_nodes, 501);
}

#[test]
fn reset_restores_seeded_beliefs() {
    let mut orb = controller_with(StubIndex::empty(), Arc::new(NullStore));
    let seeded = orb.beliefs().snapshot();
    for i in 0..5 {
        orb.process_stimulus(&Stimulus::cursor(10.0 * i as f64, 20.0, 1.0));
    }
    assert_ne!(orb.beliefs().snapshot(), seeded);

    orb.reset();
    assert_eq!(orb.beliefs().snapshot(), seeded);
    assert_eq!(orb.habit().buffered(), 0);
    assert_eq!(orb.status().cycles_processed, 0);
}

#[test]
fn thought_record_mirrors_thought() {
    let mut orb = controller_with(StubIndex::empty(), Arc::new(NullStore));
    let thought = thought_of(orb.process_stimulus(&Stimulus::text("record me")));
    let record = thought.record();
    assert_eq!(record.mode, thought.mode());
    assert_eq!(record.confidence, thought.confidence());
    assert_eq!(record.predicate, thought.pulse());
    assert_eq!(record.reflection, thought.envelope().reflection);
    assert!((thought.epistemic_alignment() - 0.6).abs() < 1e-12);
}

#[test]
fn reference_collaborators_run_full_cycles() {
    let mut orb = OrbController::with_reference_collaborators(OrbConfig::default());
    let cursor = thought_of(orb.process_stimulus(&Stimulus::cursor(100.0, 200.0, 5.0)));
    assert_eq!(cursor.shadows().len(), 4);
    assert!(cursor.spatial().node_id.starts_with("NODE_"));
    assert!(cursor.gravity_stats().renewal_pressure > 0.0);

    let text = thought_of(orb.process_stimulus(&Stimulus::text("where am I?")));
    assert!((0.85..=CEILING).contains(&text.confidence()));
    assert_eq!(orb.status().live_nodes, 2);
    assert_eq!(orb.status().cycles_processed, 2);
}

#[test]
fn crystallized_thoughts_stay_bounded() {
    let config = OrbConfig::default();
    let vault = Arc::new(MemoryVault::with_capacity(64));
    let mut orb = OrbController::new(
        config.clone(),
        Arc::new(GridIndex::new(&config.field, &config.screen)),
        Arc::new(PerspectiveBench::new(&config.screen).with_capacity(64)),
        vault.clone(),
        None,
    );

    let at = |i: usize| Stimulus::cursor((i % 50) as f64 * 37.0, (i / 50) as f64 * 97.0, 1.0);
    for i in 0..500 {
        assert!(orb.process_stimulus(&at(i)).is_some());
        assert!(vault.thought_count() <= 64, "vault grew to {}", vault.thought_count());
    }
    assert_eq!(orb.status().cycles_processed, 500);
    // The newest crystal survives eviction and still answers lightning queries.
    assert!(orb.process_stimulus(&at(499)).unwrap().is_cached());
}

#[test]
fn synthesis_serializes_with_source_tag() {
    let mut orb = controller_with(StubIndex::empty(), Arc::new(NullStore));
    let synthesis = orb.process_stimulus(&Stimulus::text("tag")).unwrap();
    let json = serde_json::to_value(&synthesis).unwrap();
    assert_eq!(json["source"], "thought");
    let pulse = serde_json::to_value(synthesis.pulse()).unwrap();
    assert!(pulse["cognitive_mode"].is_string());
    assert!(pulse.get("final_verdict").is_some());
}

// ===========================================================================
// Navigator
// ===========================================================================

fn navigator() -> Navigator {
    Navigator::seeded(OrbConfig::default().navigation, 42)
}

#[test]
fn navigator_repels_inside_bubble() {
    let mut nav = navigator();
    // Orb starts at (960, 540); cursor 100px to the right.
    let v = nav.navigation_vector([1060.0, 540.0], 0.0, 0.0);
    assert!((v[0] + 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(v[1], 0.0);
}

#[test]
fn navigator_rests_between_radii() {
    let mut nav = navigator();
    assert_eq!(nav.navigation_vector([1160.0, 540.0], 0.0, 0.0), [0.0, 0.0]);
}

#[test]
fn navigator_attracts_gently_beyond_target() {
    let mut nav = navigator();
    let v = nav.navigation_vector([960.0, 1790.0], 0.0, 0.0);
    assert_eq!(v[0], 0.0);
    assert!((v[1] - 0.5).abs() < 1e-12);
}

#[test]
fn navigator_ignores_coincident_cursor() {
    let mut nav = navigator();
    assert_eq!(nav.navigation_vector([960.0, 540.0], 1.0, 1.0), [0.0, 0.0]);
}

#[test]
fn density_pushes_away_from_cursor() {
    let mut nav = navigator();
    let v = nav.navigation_vector([1160.0, 540.0], 0.0, 1.0);
    assert!((v[0] + 0.5).abs() < 1e-12);
}

#[test]
fn heat_jitter_is_bounded_and_seeded() {
    let mut a = navigator();
    let mut b = navigator();
    for _ in 0..20 {
        let va = a.navigation_vector([1160.0, 540.0], 1.0, 0.0);
        let vb = b.navigation_vector([1160.0, 540.0], 1.0, 0.0);
        assert_eq!(va, vb);
        assert!(va.iter().all(|c| c.abs() <= 0.5));
    }
    // Below the threshold there is no jitter at all.
    assert_eq!(a.navigation_vector([1160.0, 540.0], 0.5, 0.0), [0.0, 0.0]);
}

#[test]
fn physics_tracks_velocity() {
    let mut nav = navigator();
    nav.update_physics([970.0, 540.0], 0.1);
    assert_eq!(nav.position(), [970.0, 540.0]);
    assert!((nav.velocity()[0] - 100.0).abs() < 1e-9);

    nav.update_physics([971.0, 540.0], 0.0);
    assert!(nav.velocity()[0].is_finite());
    assert!(nav.velocity()[0] > 0.0);
}

// ===========================================================================
// Config
// ===========================================================================

#[test]
fn config_defaults() {
    let config = OrbConfig::default();
    assert_eq!(config.screen.width, 1920.0);
    assert_eq!(config.habit.buffer_capacity, 5);
    assert_eq!(config.intuition.density_threshold, 50);
    assert_eq!(config.field.purge_trigger_threshold, 800);
    assert_eq!(config.runtime.tick_ms, 100);
    assert_eq!(config.memory.thought_capacity, 2048);
    let seeds = config.seed_priors();
    assert_eq!(seeds[0].0, HABIT_CONTINUES);
}

#[test]
fn config_load_missing_file_uses_defaults() {
    let config = OrbConfig::load(std::path::Path::new("/nonexistent/orbmind.toml"));
    assert_eq!(config.habit.habit_threshold, 0.35);
}

#[test]
fn config_partial_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orbmind.toml");
    std::fs::write(&path, "[habit]\nhabit_threshold = 0.5\n\n[runtime]\ntick_ms = 250\n").unwrap();
    let config = OrbConfig::load(&path);
    assert_eq!(config.habit.habit_threshold, 0.5);
    assert_eq!(config.habit.buffer_capacity, 5);
    assert_eq!(config.runtime.tick_ms, 250);
    assert_eq!(config.envelope.primary_perspectives.len(), 3);
}

#[test]
fn config_toml_round_trip_keeps_values() {
    let mut config = OrbConfig::default();
    config.field.max_field_density = 2000;
    let parsed: OrbConfig = toml::from_str(&config.to_toml()).unwrap();
    assert_eq!(parsed.field.max_field_density, 2000);
}
