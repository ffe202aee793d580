//! Orb controller — one synthesis cycle per stimulus
//!
//! The controller owns every piece of per-cycle mutable state (pattern memory,
//! beliefs, navigator) and borrows the external collaborators through trait
//! objects. `process_stimulus` never fails: collaborator errors degrade to
//! empty data, a rejected stimulus yields `None`.

use crate::belief::BeliefUpdater;
use crate::collaborators::field::AmbientField;
use crate::collaborators::grid::GridIndex;
use crate::collaborators::perspectives::PerspectiveBench;
use crate::collaborators::vault::MemoryVault;
use crate::collaborators::{
    CrystalStore, FieldBridge, FieldNode, FieldStats, ShadowGenerator, Shadows, SpatialIndex,
};
use crate::config::OrbConfig;
use crate::convergence::convergence_score;
use crate::envelope::EnvelopeBuilder;
use crate::habit::HabitTracker;
use crate::intuition::{IntuitiveRecognizer, NecessityReport};
use crate::proprioception::Navigator;
use crate::synthesis::{LogicState, ModeSynthesizer};
use crate::thought::{SpatialCoordinate, Synthesis, Thought};
use orbmind_core::{Mode, Stimulus, StimulusKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

const SHADOW_SOURCE: &str = "shadow";
const SEED_SOURCE: &str = "init";

/// Counters reported through `status()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrbStatus {
    pub cycles_processed: u64,
    pub rejected: u64,
    pub bypassed: u64,
    pub invariant_violations: u64,
    pub live_nodes: usize,
    pub current_mode: Mode,
}

pub struct OrbController {
    config: OrbConfig,
    index: Arc<dyn SpatialIndex>,
    shadows: Arc<dyn ShadowGenerator>,
    store: Arc<dyn CrystalStore>,
    field: Option<Arc<dyn FieldBridge>>,
    habit: HabitTracker,
    intuition: IntuitiveRecognizer,
    navigator: Navigator,
    beliefs: BeliefUpdater,
    synthesizer: ModeSynthesizer,
    envelopes: EnvelopeBuilder,
    cycle: u64,
    stats: OrbStatus,
}

impl OrbController {
    pub fn new(
        config: OrbConfig,
        index: Arc<dyn SpatialIndex>,
        shadows: Arc<dyn ShadowGenerator>,
        store: Arc<dyn CrystalStore>,
        field: Option<Arc<dyn FieldBridge>>,
    ) -> Self {
        let navigator = Navigator::new(config.navigation.clone());
        Self::assemble(config, index, shadows, store, field, navigator)
    }

    /// Controller wired to the in-process reference collaborators.
    pub fn with_reference_collaborators(config: OrbConfig) -> Self {
        let index = Arc::new(GridIndex::new(&config.field, &config.screen));
        let shadows = Arc::new(
            PerspectiveBench::new(&config.screen).with_capacity(config.memory.shadow_capacity),
        );
        let store = Arc::new(MemoryVault::with_capacity(config.memory.thought_capacity));
        let field = Arc::new(AmbientField::new(&config.screen));
        Self::new(config, index, shadows, store, Some(field))
    }

    /// Same as [`OrbController::new`] with a fixed navigator jitter seed.
    pub fn seeded(
        config: OrbConfig,
        index: Arc<dyn SpatialIndex>,
        shadows: Arc<dyn ShadowGenerator>,
        store: Arc<dyn CrystalStore>,
        field: Option<Arc<dyn FieldBridge>>,
        seed: u64,
    ) -> Self {
        let navigator = Navigator::seeded(config.navigation.clone(), seed);
        Self::assemble(config, index, shadows, store, field, navigator)
    }

    fn assemble(
        config: OrbConfig,
        index: Arc<dyn SpatialIndex>,
        shadows: Arc<dyn ShadowGenerator>,
        store: Arc<dyn CrystalStore>,
        field: Option<Arc<dyn FieldBridge>>,
        navigator: Navigator,
    ) -> Self {
        let mut controller = Self {
            habit: HabitTracker::new(config.habit.clone(), &config.screen),
            intuition: IntuitiveRecognizer::new(config.intuition.clone(), index.clone()),
            beliefs: BeliefUpdater::new(config.beliefs.outcome_rate),
            synthesizer: ModeSynthesizer::new(&config.habit, &config.beliefs, &config.field),
            envelopes: EnvelopeBuilder::new(config.envelope.clone()),
            navigator,
            config,
            index,
            shadows,
            store,
            field,
            cycle: 0,
            stats: OrbStatus::default(),
        };
        controller.seed_beliefs();
        controller
    }

    fn seed_beliefs(&mut self) {
        let reliability = self.config.beliefs.seed_reliability;
        let seeds: Vec<(&'static str, f64, f64)> = self
            .config
            .seed_priors()
            .iter()
            .map(|(h, seed)| (*h, seed.probability, seed.strength))
            .collect();
        for (hypothesis, probability, strength) in seeds {
            self.beliefs.set_prior(hypothesis, probability, strength);
            let evidence_id = format!("seed_{}", hypothesis);
            if let Err(e) = self.beliefs.add_evidence(
                hypothesis,
                &evidence_id,
                probability,
                SEED_SOURCE,
                reliability,
            ) {
                debug!("Seed evidence skipped for {}: {}", hypothesis, e);
            }
        }
    }

    pub fn config(&self) -> &OrbConfig {
        &self.config
    }

    pub fn beliefs(&self) -> &BeliefUpdater {
        &self.beliefs
    }

    pub fn habit(&self) -> &HabitTracker {
        &self.habit
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn store(&self) -> &Arc<dyn CrystalStore> {
        &self.store
    }

    pub fn index(&self) -> &Arc<dyn SpatialIndex> {
        &self.index
    }

    /// Run one synthesis cycle.
    ///
    /// Returns `None` when the stimulus is rejected before any state is
    /// touched, or when mode resolution hits an unseeded hypothesis.
    pub fn process_stimulus(&mut self, stimulus: &Stimulus) -> Option<Synthesis> {
        if stimulus.kind == StimulusKind::SurveillanceProbe && !stimulus.meta.test_mode {
            warn!("Sovereignty check failed: surveillance probe rejected");
            self.stats.rejected += 1;
            return None;
        }
        if let Err(e) = stimulus.validate() {
            warn!("Stimulus rejected: {}", e);
            self.stats.rejected += 1;
            return None;
        }

        let started = Instant::now();
        self.cycle += 1;
        let cycle = self.cycle;

        // Pattern memory and ambient field
        self.habit.record_observation(stimulus, self.store.as_ref());
        let gravity_stats = self.field_stats(stimulus);

        // Proprioception
        let orb_position = stimulus.orb_coordinates.unwrap_or_else(|| self.navigator.position());
        self.navigator
            .update_physics(orb_position, self.config.navigation.physics_dt);
        let heat = self
            .habit
            .quadrant_heat(self.habit.quadrant_of(self.navigator.position()));
        let navigation_vector = self.navigator.navigation_vector(
            stimulus.coordinates,
            heat,
            gravity_stats.renewal_pressure,
        );

        // Spatial lookup and necessity
        let node = match self.index.map_adjacency(stimulus) {
            Ok(node) => node,
            Err(e) => {
                warn!("Spatial index unavailable, using origin node: {}", e);
                FieldNode::origin(self.index.dimension())
            }
        };
        let density = self.index.node_count().max(self.index.last_density_breach());
        let necessity = self.intuition.check_necessity(stimulus, &node);
        let inductive = if necessity.jump_triggered {
            None
        } else {
            self.habit.predict_next(self.store.as_ref())
        };

        if let Some(cached) = self.store.lightning_query(stimulus) {
            self.stats.cycles_processed += 1;
            self.stats.bypassed += 1;
            self.stats.current_mode = cached.mode;
            info!(
                "Lightning bypass: {} (cached {}, confidence {:.3}) in {:.1}ms",
                stimulus.kind.as_str(),
                cached.mode.as_str(),
                cached.confidence,
                elapsed_ms(started)
            );
            return Some(Synthesis::Cached(Box::new(cached)));
        }

        let shadows = self.epistemic_shadows(stimulus);
        let epistemic_bayes = self.update_shadow_beliefs(cycle, &shadows);

        let logic = match self.synthesizer.resolve(
            &necessity,
            inductive.as_ref(),
            &self.beliefs,
            epistemic_bayes,
            density,
        ) {
            Ok(logic) => logic,
            Err(e) => {
                error!("Mode resolution failed: {}", e);
                return None;
            }
        };
        if logic.invariant_violation {
            self.stats.invariant_violations += 1;
        }

        let thought_vector = self.neighborhood_vector(&node);
        let confidence = convergence_score(shadows.len(), &logic, &thought_vector);
        let stardate = now_secs();
        let envelope = self.envelopes.build(
            stimulus,
            stardate,
            &shadows,
            &logic.epistemic_bayes,
            &logic,
            confidence,
        );

        self.feed_back_outcome(&logic, &necessity);

        let thought = Thought::new(
            shadows,
            SpatialCoordinate::from(&node),
            logic,
            confidence,
            gravity_stats,
            navigation_vector,
            envelope,
            stardate,
        );
        if let Err(e) = self.store.crystallize_thought(stimulus, thought.record()) {
            warn!("Failed to crystallize thought: {}", e);
        }

        self.stats.cycles_processed += 1;
        self.stats.current_mode = thought.mode();
        info!(
            "[{}] cycle {} {:.1}ms | {} | confidence {:.3} | density {}",
            thought.mode().as_str(),
            cycle,
            elapsed_ms(started),
            stimulus.kind.as_str(),
            confidence,
            density
        );
        Some(Synthesis::Thought(Box::new(thought)))
    }

    fn field_stats(&self, stimulus: &Stimulus) -> FieldStats {
        let Some(field) = &self.field else {
            return FieldStats::empty();
        };
        match field.stimulus_to_field_stats(stimulus) {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Ambient field unavailable: {}", e);
                FieldStats::empty()
            }
        }
    }

    fn epistemic_shadows(&self, stimulus: &Stimulus) -> Shadows {
        match self.shadows.generate_epistemic_shadow(stimulus) {
            Ok(shadows) => shadows,
            Err(e) => {
                warn!("Shadow generator unavailable: {}", e);
                Shadows::new()
            }
        }
    }

    /// Feed each shadow into its perspective's persistence hypothesis.
    fn update_shadow_beliefs(&mut self, cycle: u64, shadows: &Shadows) -> BTreeMap<String, f64> {
        let prior = self.config.beliefs.shadow_prior;
        let strength = self.config.beliefs.shadow_strength;
        let mut posteriors = BTreeMap::new();

        for (perspective, shadow) in shadows {
            let hypothesis = format!("{}_pattern_persistence", perspective);
            self.beliefs.set_prior(&hypothesis, prior, strength);
            let evidence_id = format!("cycle_{}_{}", cycle, perspective);
            if let Err(e) = self.beliefs.add_evidence(
                &hypothesis,
                &evidence_id,
                shadow.confidence,
                SHADOW_SOURCE,
                shadow.reliability,
            ) {
                error!("Belief update rejected: {}", e);
                continue;
            }
            match self.beliefs.posterior(&hypothesis) {
                Ok(p) => {
                    posteriors.insert(perspective.clone(), p);
                }
                Err(e) => error!("Posterior unavailable for {}: {}", hypothesis, e),
            }
        }
        posteriors
    }

    fn neighborhood_vector(&self, node: &FieldNode) -> Vec<f64> {
        let radius = self.config.field.neighbor_radius;
        let neighbors = match self.index.recursive_neighbors(node, radius) {
            Ok(neighbors) => neighbors,
            Err(e) => {
                warn!("Neighbor lookup failed: {}", e);
                Vec::new()
            }
        };
        if neighbors.is_empty() {
            return vec![0.0; self.index.dimension()];
        }
        let mut nodes = neighbors;
        nodes.push(node.clone());
        self.index.thought_vector(&nodes)
    }

    fn feed_back_outcome(&mut self, logic: &LogicState, necessity: &NecessityReport) {
        let b = &self.config.beliefs;
        let mode = logic.active_mode;
        let habit_success = matches!(mode, Mode::Habit | Mode::GuardHabit)
            && logic.prediction_confidence() > b.habit_success_confidence;
        let jump_success = mode == Mode::IntuitionJump && necessity.jump_triggered;
        let guard_success = mode == Mode::Guard && !habit_success && !jump_success;

        let outcomes = [
            (crate::belief::HABIT_CONTINUES, habit_success, b.habit_outcome_weight),
            (crate::belief::JUMP_NECESSARY, jump_success, b.jump_outcome_weight),
            (crate::belief::GUARD_SUFFICIENT, guard_success, b.guard_outcome_weight),
        ];
        for (hypothesis, success, weight) in outcomes {
            if let Err(e) = self.beliefs.update_with_outcome(hypothesis, success, weight) {
                error!("Outcome feedback rejected for {}: {}", hypothesis, e);
            }
        }
    }

    /// Purge the index when it has outgrown the emergency floor.
    pub fn emergency_purge(&mut self) -> bool {
        let before = self.index.node_count();
        if before <= self.config.field.emergency_purge_floor {
            debug!("Emergency purge skipped: {} nodes", before);
            return false;
        }
        let removed = self.index.edge_cutter_purge();
        info!(
            "Emergency purge: {} → {} nodes ({} removed)",
            before,
            self.index.node_count(),
            removed
        );
        true
    }

    pub fn status(&self) -> OrbStatus {
        OrbStatus {
            live_nodes: self.index.node_count(),
            ..self.stats.clone()
        }
    }

    /// Drop all learned state and re-seed the mode beliefs.
    ///
    /// The collaborators are shared and keep their own contents.
    pub fn reset(&mut self) {
        self.habit.reset();
        self.beliefs.clear();
        self.seed_beliefs();
        self.cycle = 0;
        self.stats = OrbStatus::default();
        info!("Orb controller reset");
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
