//! Orchestration of the floor placement run.
//!
//! Expands the pallet types, runs every strategy on its own copy of the
//! instance list, scores the layouts and keeps the best one:
//! - invalid input is rejected before any strategy runs
//! - a failing strategy is logged and skipped, never aborting the run
//! - a run where nothing fits still returns a well-formed, all-unplaced layout

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::{StrategyError, ValidationError};
use crate::evaluator::evaluate;
use crate::geometry::fits;
use crate::model::{
    Container, PalletInstance, PalletType, PlacementResult, expand_instances, orientations,
};
use crate::stats::{StatsSnapshot, StrategyReport};
use crate::strategy::{PlacementContext, PlacementStrategy, StrategyKind, verify_layout};
use crate::types::{EPSILON_PLACEMENT, Rect, validation};

/// Upper bound on expanded instances per run.
pub const MAX_TOTAL_PALLETS: usize = 10_000;

/// Upper bound on First-Fit/Best-Fit grid positions per orientation.
pub const MAX_GRID_CELLS: f64 = 1_000_000.0;

/// Tuning parameters for the placement strategies.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlacementConfig {
    /// Step of the First-Fit/Best-Fit position grid (smaller = denser, slower)
    pub grid_step: f64,
    /// Tolerance for boundary contact and containment
    pub epsilon: f64,
    /// Best-Fit penalises right/top gaps narrower than this
    pub small_gap_threshold: f64,
    /// Rotation default for pallet types without an override
    pub allow_rotation: bool,
    /// Run the strategies on scoped worker threads
    pub parallel: bool,
    /// Strategies still running after this long are abandoned
    pub time_budget: Option<Duration>,
}

impl PlacementConfig {
    pub const DEFAULT_GRID_STEP: f64 = 5.0;
    pub const DEFAULT_EPSILON: f64 = EPSILON_PLACEMENT;
    pub const DEFAULT_SMALL_GAP_THRESHOLD: f64 = 50.0;
    pub const DEFAULT_ALLOW_ROTATION: bool = true;
    pub const DEFAULT_PARALLEL: bool = false;
    pub const DEFAULT_TIME_BUDGET: Option<Duration> = None;

    /// Creates a builder for custom configuration.
    pub fn builder() -> PlacementConfigBuilder {
        PlacementConfigBuilder::default()
    }

    /// Checks the tunables before a run.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.grid_step.is_finite() && self.grid_step > 0.0) {
            return Err(ValidationError::InvalidConfiguration(format!(
                "grid_step must be greater than 0, got: {}",
                self.grid_step
            )));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(ValidationError::InvalidConfiguration(format!(
                "epsilon must be greater than 0, got: {}",
                self.epsilon
            )));
        }
        if !(self.small_gap_threshold.is_finite() && self.small_gap_threshold >= 0.0) {
            return Err(ValidationError::InvalidConfiguration(format!(
                "small_gap_threshold must be >= 0, got: {}",
                self.small_gap_threshold
            )));
        }
        if self.time_budget.is_some_and(|budget| budget.is_zero()) {
            return Err(ValidationError::InvalidConfiguration(
                "time_budget must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of grid positions the grid strategies scan on `container`.
    pub fn grid_cells(&self, container: &Container) -> f64 {
        let along_length = (container.length / self.grid_step).floor() + 1.0;
        let along_width = (container.width / self.grid_step).floor() + 1.0;
        along_length * along_width
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            grid_step: Self::DEFAULT_GRID_STEP,
            epsilon: Self::DEFAULT_EPSILON,
            small_gap_threshold: Self::DEFAULT_SMALL_GAP_THRESHOLD,
            allow_rotation: Self::DEFAULT_ALLOW_ROTATION,
            parallel: Self::DEFAULT_PARALLEL,
            time_budget: Self::DEFAULT_TIME_BUDGET,
        }
    }
}

/// Builder for `PlacementConfig`.
#[derive(Clone, Debug, Default)]
pub struct PlacementConfigBuilder {
    config: PlacementConfig,
}

impl PlacementConfigBuilder {
    /// Sets the grid step.
    pub fn grid_step(mut self, step: f64) -> Self {
        self.config.grid_step = step;
        self
    }

    /// Sets the placement tolerance.
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    /// Sets the Best-Fit sliver threshold.
    pub fn small_gap_threshold(mut self, threshold: f64) -> Self {
        self.config.small_gap_threshold = threshold;
        self
    }

    /// Sets the rotation default.
    pub fn allow_rotation(mut self, allow: bool) -> Self {
        self.config.allow_rotation = allow;
        self
    }

    /// Enables concurrent strategy execution.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Limits the wall-clock time of a run.
    pub fn time_budget(mut self, budget: Duration) -> Self {
        self.config.time_budget = Some(budget);
        self
    }

    /// Creates the final configuration.
    pub fn build(self) -> PlacementConfig {
        self.config
    }
}

/// Layout and statistics returned by [`place`].
#[derive(Clone, Debug)]
pub struct PlacementOutcome {
    pub placements: PlacementResult,
    pub stats: StatsSnapshot,
}

/// Why an instance of the winning layout stayed on the dock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnplacedReason {
    /// No orientation fits even on the empty floor.
    DimensionsExceedContainer,
    /// It would fit alone, but no free position was left.
    NoFreePosition,
}

impl UnplacedReason {
    pub fn code(&self) -> &'static str {
        match self {
            UnplacedReason::DimensionsExceedContainer => "dimensions_exceed_container",
            UnplacedReason::NoFreePosition => "no_free_position",
        }
    }
}

impl std::fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnplacedReason::DimensionsExceedContainer => write!(
                f,
                "Pallet exceeds the container floor in every allowed orientation"
            ),
            UnplacedReason::NoFreePosition => {
                write!(f, "No free position left on the container floor")
            }
        }
    }
}

/// Classifies an unplaced instance.
pub fn unplaced_reason(
    instance: &PalletInstance,
    container: &Container,
    config: &PlacementConfig,
) -> UnplacedReason {
    let fits_alone = orientations(instance, instance.allow_rotation)
        .iter()
        .any(|o| fits(&Rect::new(0.0, 0.0, o.length, o.width), container, config.epsilon));
    if fits_alone {
        UnplacedReason::NoFreePosition
    } else {
        UnplacedReason::DimensionsExceedContainer
    }
}

/// Events emitted during a run, for live progress reporting.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PlaceEvent {
    /// Instances were expanded and the strategies are about to run.
    RunStarted { total_pallets: usize },
    /// A strategy starts.
    StrategyStarted { strategy: String },
    /// A strategy produced a valid layout.
    StrategyFinished {
        strategy: String,
        placed: usize,
        score: f64,
    },
    /// A strategy failed and was skipped.
    StrategyFailed { strategy: String, reason: String },
    /// The run is complete.
    Finished {
        winning_strategy: Option<String>,
        placed: usize,
        total: usize,
        efficiency: f64,
    },
}

/// Places pallets with the default configuration.
///
/// # Parameters
/// * `pallet_types` - Requested pallet types
/// * `container` - The container floor
/// * `clearance` - Minimum gap between any two pallets
///
/// # Returns
/// The best layout found and its statistics, or a `ValidationError` for
/// invalid input
///
/// # Examples
/// ```
/// use stow_it_now::model::{Container, PalletType};
/// use stow_it_now::optimizer::place;
///
/// let types = vec![PalletType::new("EUR", 120.0, 80.0, 4).unwrap()];
/// let container = Container { length: 589.8, width: 235.0 };
/// let outcome = place(&types, container, 1.0).unwrap();
/// assert_eq!(outcome.stats.placed_pallets, 4);
/// ```
pub fn place(
    pallet_types: &[PalletType],
    container: Container,
    clearance: f64,
) -> Result<PlacementOutcome, ValidationError> {
    place_with_config(pallet_types, container, clearance, PlacementConfig::default())
}

/// Like [`place`], with custom tuning.
pub fn place_with_config(
    pallet_types: &[PalletType],
    container: Container,
    clearance: f64,
    config: PlacementConfig,
) -> Result<PlacementOutcome, ValidationError> {
    place_with_progress(pallet_types, container, clearance, config, |_| {})
}

/// Like [`place_with_config`], reporting every step through `on_event`.
pub fn place_with_progress(
    pallet_types: &[PalletType],
    container: Container,
    clearance: f64,
    config: PlacementConfig,
    on_event: impl FnMut(&PlaceEvent),
) -> Result<PlacementOutcome, ValidationError> {
    let kinds = StrategyKind::ALL;
    let strategies: Vec<&dyn PlacementStrategy> = kinds
        .iter()
        .map(|kind| kind as &dyn PlacementStrategy)
        .collect();
    place_with_strategies(&strategies, pallet_types, container, clearance, config, on_event)
}

/// Runs an explicit strategy list in the given order.
pub fn place_with_strategies(
    strategies: &[&dyn PlacementStrategy],
    pallet_types: &[PalletType],
    container: Container,
    clearance: f64,
    config: PlacementConfig,
    mut on_event: impl FnMut(&PlaceEvent),
) -> Result<PlacementOutcome, ValidationError> {
    validate_input(pallet_types, &container, clearance, &config)?;

    let started = Instant::now();
    let deadline = config
        .time_budget
        .and_then(|budget| started.checked_add(budget));
    let instances = expand_instances(pallet_types, config.allow_rotation);
    let ctx = PlacementContext::new(container, clearance, config).with_deadline(deadline);
    on_event(&PlaceEvent::RunStarted {
        total_pallets: instances.len(),
    });

    let selection = select_best(strategies, &instances, &ctx, &mut on_event);

    let (placements, score, winner) = match selection.best {
        Some((name, result, score)) => (result, score, Some(name.to_string())),
        None => (PlacementResult::new(instances), 0.0, None),
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    let mut stats = StatsSnapshot::collect(
        &placements,
        &container,
        score,
        winner.clone(),
        selection.reports,
        elapsed_ms,
    );
    stats.timed_out = selection.timed_out;

    log::debug!(
        "Placement finished in {} ms: {}/{} pallets via {}",
        elapsed_ms,
        stats.placed_pallets,
        stats.total_pallets,
        winner.as_deref().unwrap_or("none")
    );
    on_event(&PlaceEvent::Finished {
        winning_strategy: winner,
        placed: stats.placed_pallets,
        total: stats.total_pallets,
        efficiency: stats.efficiency,
    });

    Ok(PlacementOutcome { placements, stats })
}

/// Checks a request without running any strategy.
pub fn validate_input(
    pallet_types: &[PalletType],
    container: &Container,
    clearance: f64,
    config: &PlacementConfig,
) -> Result<(), ValidationError> {
    container.validate()?;
    validation::validate_clearance(clearance)?;
    config.validate()?;
    let cells = config.grid_cells(container);
    if cells > MAX_GRID_CELLS {
        return Err(ValidationError::InvalidConfiguration(format!(
            "grid_step {} yields {} grid positions on this container, at most {} are allowed",
            config.grid_step, cells, MAX_GRID_CELLS
        )));
    }
    for pallet_type in pallet_types {
        pallet_type.validate()?;
    }
    let total = pallet_types
        .iter()
        .try_fold(0usize, |sum, pallet_type| sum.checked_add(pallet_type.quantity))
        .unwrap_or(usize::MAX);
    if total > MAX_TOTAL_PALLETS {
        return Err(ValidationError::InvalidQuantity(format!(
            "At most {} pallets per request, got: {}",
            MAX_TOTAL_PALLETS, total
        )));
    }
    Ok(())
}

/// Best layout found so far plus a report for every strategy.
struct Selection {
    best: Option<(&'static str, PlacementResult, f64)>,
    reports: Vec<StrategyReport>,
    timed_out: bool,
}

/// Runs every strategy on its own copy and keeps the highest score.
///
/// Layouts scoring zero are never selected; the first strategy wins ties.
fn select_best(
    strategies: &[&dyn PlacementStrategy],
    instances: &[PalletInstance],
    ctx: &PlacementContext,
    on_event: &mut impl FnMut(&PlaceEvent),
) -> Selection {
    let mut selection = Selection {
        best: None,
        reports: Vec::with_capacity(strategies.len()),
        timed_out: false,
    };

    if ctx.config.parallel {
        for strategy in strategies {
            on_event(&PlaceEvent::StrategyStarted {
                strategy: strategy.name().to_string(),
            });
        }
        let outcomes: Vec<Result<PlacementResult, StrategyError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = strategies
                .iter()
                .map(|strategy| scope.spawn(move || run_strategy(*strategy, instances, ctx)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or(Err(StrategyError::Aborted)))
                .collect()
        });
        // Merged in declared order: identical to a sequential run.
        for (strategy, outcome) in strategies.iter().zip(outcomes) {
            record(&mut selection, *strategy, outcome, ctx, on_event);
        }
    } else {
        for strategy in strategies {
            on_event(&PlaceEvent::StrategyStarted {
                strategy: strategy.name().to_string(),
            });
            let outcome = run_strategy(*strategy, instances, ctx);
            record(&mut selection, *strategy, outcome, ctx, on_event);
        }
    }

    selection
}

fn run_strategy(
    strategy: &dyn PlacementStrategy,
    instances: &[PalletInstance],
    ctx: &PlacementContext,
) -> Result<PlacementResult, StrategyError> {
    let result = strategy.run(instances.to_vec(), ctx)?;
    verify_layout(&result, instances.len(), ctx)?;
    Ok(result)
}

fn record(
    selection: &mut Selection,
    strategy: &dyn PlacementStrategy,
    outcome: Result<PlacementResult, StrategyError>,
    ctx: &PlacementContext,
    on_event: &mut impl FnMut(&PlaceEvent),
) {
    let name = strategy.name();
    match outcome {
        Ok(result) => {
            let score = evaluate(&result, &ctx.container);
            let placed = result.placed_count();
            log::debug!(
                "Strategy {} placed {}/{} pallets (score {:.4})",
                name,
                placed,
                result.total(),
                score
            );
            on_event(&PlaceEvent::StrategyFinished {
                strategy: name.to_string(),
                placed,
                score,
            });
            selection.reports.push(StrategyReport {
                strategy: name.to_string(),
                placed,
                score: Some(score),
                error: None,
            });

            let best_score = selection.best.as_ref().map_or(0.0, |(_, _, s)| *s);
            if score > best_score {
                selection.best = Some((name, result, score));
            }
        }
        Err(err) => {
            if err == StrategyError::DeadlineExceeded {
                selection.timed_out = true;
            }
            log::warn!("Strategy {} failed and is skipped: {}", name, err);
            on_event(&PlaceEvent::StrategyFailed {
                strategy: name.to_string(),
                reason: err.to_string(),
            });
            selection.reports.push(StrategyReport {
                strategy: name.to_string(),
                placed: 0,
                score: None,
                error: Some(err.to_string()),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::overlaps;

    fn pallet(id: &str, length: f64, width: f64, quantity: usize) -> PalletType {
        PalletType::new(id, length, width, quantity).unwrap()
    }

    fn container(length: f64, width: f64) -> Container {
        Container::new(length, width).unwrap()
    }

    fn assert_layout_invariants(
        outcome: &PlacementOutcome,
        container: &Container,
        clearance: f64,
    ) {
        let eps = PlacementConfig::DEFAULT_EPSILON;
        let placed: Vec<_> = outcome.placements.placed().collect();
        for instance in &placed {
            assert!(fits(&instance.rect(), container, eps), "{:?} leaves the floor", instance);
            assert!(instance.has_valid_orientation(), "{:?} was resized", instance);
        }
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                assert!(
                    !overlaps(&a.rect(), &b.rect(), clearance, eps),
                    "{:?} overlaps {:?}",
                    a.rect(),
                    b.rect()
                );
            }
        }
        assert_eq!(
            outcome.placements.placed_count() + outcome.placements.unplaced_count(),
            outcome.stats.total_pallets
        );
    }

    struct FailingStrategy;

    impl PlacementStrategy for FailingStrategy {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn run(
            &self,
            _instances: Vec<PalletInstance>,
            _ctx: &PlacementContext,
        ) -> Result<PlacementResult, StrategyError> {
            Err(StrategyError::SkylineGap { covered: 0.0 })
        }
    }

    /// Outlives any short time budget and places nothing.
    struct SlowStrategy;

    impl PlacementStrategy for SlowStrategy {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn run(
            &self,
            instances: Vec<PalletInstance>,
            _ctx: &PlacementContext,
        ) -> Result<PlacementResult, StrategyError> {
            std::thread::sleep(Duration::from_millis(30));
            Ok(PlacementResult::new(instances))
        }
    }

    /// Stacks everything in the origin corner.
    struct OverlappingStrategy;

    impl PlacementStrategy for OverlappingStrategy {
        fn name(&self) -> &'static str {
            "overlapping"
        }

        fn run(
            &self,
            mut instances: Vec<PalletInstance>,
            _ctx: &PlacementContext,
        ) -> Result<PlacementResult, StrategyError> {
            for instance in instances.iter_mut() {
                let orientation = orientations(instance, false)[0];
                instance.place_at(0.0, 0.0, orientation);
            }
            Ok(PlacementResult::new(instances))
        }
    }

    #[test]
    fn mixed_load_fits_completely() {
        let types = vec![pallet("A", 110.0, 110.0, 12), pallet("B", 100.0, 125.0, 8)];
        let floor = container(1203.2, 235.0);
        let outcome = place(&types, floor, 1.0).unwrap();

        assert_eq!(outcome.stats.total_pallets, 20);
        assert_eq!(outcome.stats.placed_pallets, 20);
        assert!((outcome.stats.efficiency - 245_200.0 / (1203.2 * 235.0)).abs() < 1e-9);
        assert!((outcome.stats.efficiency - 0.867).abs() < 0.001);
        assert_layout_invariants(&outcome, &floor, 1.0);
    }

    #[test]
    fn oversized_pallet_yields_empty_layout() {
        let types = vec![pallet("huge", 300.0, 300.0, 1)];
        let floor = container(589.8, 235.0);
        let outcome = place(&types, floor, 0.0).unwrap();

        assert_eq!(outcome.stats.placed_pallets, 0);
        assert_eq!(outcome.stats.efficiency, 0.0);
        assert_eq!(outcome.stats.total_pallets, 1);
        assert!(outcome.stats.winning_strategy.is_none());
        let instance = &outcome.placements.instances[0];
        assert_eq!(
            unplaced_reason(instance, &floor, &PlacementConfig::default()),
            UnplacedReason::DimensionsExceedContainer
        );
    }

    #[test]
    fn larger_clearance_never_places_more() {
        let types = vec![pallet("S", 50.0, 50.0, 40)];
        let floor = container(300.0, 200.0);
        let tight = place(&types, floor, 0.0).unwrap();
        let spaced = place(&types, floor, 50.0).unwrap();

        assert_eq!(tight.stats.placed_pallets, 24);
        assert!(spaced.stats.placed_pallets <= tight.stats.placed_pallets);
        assert_layout_invariants(&tight, &floor, 0.0);
        assert_layout_invariants(&spaced, &floor, 50.0);
    }

    #[test]
    fn near_equal_pallets_at_tolerance_boundary() {
        let types = vec![
            pallet("A", 100.0, 100.0, 1).with_rotation(false),
            pallet("B", 100.0, 100.0001, 1).with_rotation(false),
        ];
        let floor = container(200.01, 100.0001);
        let first = place(&types, floor, 0.01).unwrap();
        let second = place(&types, floor, 0.01).unwrap();

        assert_eq!(first.stats.placed_pallets, 2);
        assert_eq!(first.placements, second.placements);
        assert_layout_invariants(&first, &floor, 0.01);
    }

    #[test]
    fn place_is_deterministic() {
        let types = vec![
            pallet("EUR", 120.0, 80.0, 9),
            pallet("IND", 120.0, 100.0, 5),
            pallet("HALF", 60.0, 80.0, 7),
        ];
        let floor = container(589.8, 235.0);
        let a = place(&types, floor, 2.0).unwrap();
        let b = place(&types, floor, 2.0).unwrap();
        assert_eq!(a.placements, b.placements);
        assert_eq!(a.stats.winning_strategy, b.stats.winning_strategy);
        assert_eq!(a.stats.strategies, b.stats.strategies);
    }

    #[test]
    fn selected_score_dominates_every_strategy() {
        let types = vec![pallet("EUR", 120.0, 80.0, 9), pallet("Q", 70.0, 70.0, 6)];
        let floor = container(589.8, 235.0);
        let clearance = 3.0;
        let outcome = place(&types, floor, clearance).unwrap();

        let ctx = PlacementContext::new(floor, clearance, PlacementConfig::default());
        let instances = expand_instances(&types, true);
        for kind in StrategyKind::ALL {
            let result = kind.run(instances.clone(), &ctx).unwrap();
            let score = evaluate(&result, &floor);
            assert!(
                outcome.stats.score + 1e-12 >= score,
                "{} scored {} above the selected {}",
                kind,
                score,
                outcome.stats.score
            );
        }
        assert!((evaluate(&outcome.placements, &floor) - outcome.stats.score).abs() < 1e-12);
    }

    #[test]
    fn parallel_run_matches_sequential_run() {
        let types = vec![pallet("EUR", 120.0, 80.0, 9), pallet("Q", 70.0, 70.0, 6)];
        let floor = container(589.8, 235.0);
        let sequential = place(&types, floor, 1.0).unwrap();
        let config = PlacementConfig::builder().parallel(true).build();
        let parallel = place_with_config(&types, floor, 1.0, config).unwrap();
        assert_eq!(sequential.placements, parallel.placements);
        assert_eq!(sequential.stats.strategies, parallel.stats.strategies);
    }

    #[test]
    fn failing_strategy_does_not_abort_the_run() {
        let types = vec![pallet("EUR", 120.0, 80.0, 4)];
        let floor = container(589.8, 235.0);
        let strategies: [&dyn PlacementStrategy; 2] = [&FailingStrategy, &StrategyKind::FirstFit];
        let outcome = place_with_strategies(
            &strategies,
            &types,
            floor,
            0.0,
            PlacementConfig::default(),
            |_| {},
        )
        .unwrap();

        assert_eq!(outcome.stats.placed_pallets, 4);
        assert_eq!(outcome.stats.winning_strategy.as_deref(), Some("first_fit"));
        assert_eq!(outcome.stats.strategies[0].score, None);
        assert!(outcome.stats.strategies[0].error.is_some());
    }

    #[test]
    fn invalid_layout_is_rejected_as_failure() {
        let types = vec![pallet("EUR", 120.0, 80.0, 3)];
        let floor = container(589.8, 235.0);
        let strategies: [&dyn PlacementStrategy; 1] = [&OverlappingStrategy];
        let mut events = Vec::new();
        let outcome = place_with_strategies(
            &strategies,
            &types,
            floor,
            0.0,
            PlacementConfig::default(),
            |event| events.push(event.clone()),
        )
        .unwrap();

        assert_eq!(outcome.stats.placed_pallets, 0);
        assert_eq!(outcome.placements.total(), 3);
        assert!(events.iter().any(|event| matches!(
            event,
            PlaceEvent::StrategyFailed { strategy, .. } if strategy == "overlapping"
        )));
    }

    #[test]
    fn all_strategies_failing_returns_unplaced_layout() {
        let types = vec![pallet("EUR", 120.0, 80.0, 2)];
        let floor = container(589.8, 235.0);
        let strategies: [&dyn PlacementStrategy; 1] = [&FailingStrategy];
        let outcome = place_with_strategies(
            &strategies,
            &types,
            floor,
            0.0,
            PlacementConfig::default(),
            |_| {},
        )
        .unwrap();

        assert_eq!(outcome.stats.placed_pallets, 0);
        assert_eq!(outcome.stats.total_pallets, 2);
        assert_eq!(outcome.stats.efficiency, 0.0);
        assert!(outcome.placements.instances.iter().all(|i| !i.placed));
    }

    #[test]
    fn rejects_invalid_input_before_running() {
        let floor = container(100.0, 100.0);
        let ok = vec![pallet("A", 10.0, 10.0, 1)];
        let bad_type = vec![PalletType {
            id: "bad".into(),
            length: 0.0,
            width: 10.0,
            quantity: 1,
            allow_rotation: None,
            color: None,
        }];

        let mut events = 0;
        let result = place_with_progress(&ok, floor, -1.0, PlacementConfig::default(), |_| {
            events += 1
        });
        assert!(matches!(result, Err(ValidationError::InvalidClearance(_))));
        assert_eq!(events, 0);

        assert!(matches!(
            place(&bad_type, floor, 0.0),
            Err(ValidationError::InvalidDimension(_))
        ));
        let negative = Container {
            length: -5.0,
            width: 10.0,
        };
        assert!(matches!(
            place(&ok, negative, 0.0),
            Err(ValidationError::InvalidDimension(_))
        ));
        let too_many = vec![pallet("A", 1.0, 1.0, MAX_TOTAL_PALLETS + 1)];
        assert!(matches!(
            place(&too_many, floor, 0.0),
            Err(ValidationError::InvalidQuantity(_))
        ));
        let bad_config = PlacementConfig::builder().grid_step(0.0).build();
        assert!(matches!(
            place_with_config(&ok, floor, 0.0, bad_config),
            Err(ValidationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn rejects_grid_too_fine_for_the_container() {
        let types = vec![pallet("P", 100.0, 100.0, 30)];
        let floor = container(589.8, 235.0);
        let fine = PlacementConfig::builder().grid_step(0.01).build();
        assert!(fine.grid_cells(&floor) > MAX_GRID_CELLS);
        assert!(matches!(
            place_with_config(&types, floor, 0.0, fine),
            Err(ValidationError::InvalidConfiguration(_))
        ));

        let default_grid = PlacementConfig::default().grid_cells(&floor);
        assert_eq!(default_grid, 118.0 * 48.0);
        assert!(place(&types, floor, 0.0).is_ok());
    }

    #[test]
    fn rejects_zero_time_budget() {
        let config = PlacementConfig::builder().time_budget(Duration::ZERO).build();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn strategies_past_the_time_budget_are_abandoned() {
        let types = vec![pallet("EUR", 120.0, 80.0, 4)];
        let floor = container(589.8, 235.0);
        let config = PlacementConfig::builder()
            .time_budget(Duration::from_millis(5))
            .build();
        let strategies: [&dyn PlacementStrategy; 2] = [&SlowStrategy, &StrategyKind::FirstFit];
        let outcome =
            place_with_strategies(&strategies, &types, floor, 0.0, config, |_| {}).unwrap();

        assert!(outcome.stats.timed_out);
        assert_eq!(outcome.stats.placed_pallets, 0);
        assert_eq!(
            outcome.stats.strategies[1].error.as_deref(),
            Some("time budget exceeded")
        );
    }

    #[test]
    fn run_within_budget_is_not_marked_timed_out() {
        let types = vec![pallet("EUR", 120.0, 80.0, 4)];
        let floor = container(589.8, 235.0);
        let config = PlacementConfig::builder()
            .time_budget(Duration::from_secs(60))
            .build();
        let outcome = place_with_config(&types, floor, 0.0, config).unwrap();
        assert!(!outcome.stats.timed_out);
        assert_eq!(outcome.stats.placed_pallets, 4);
    }

    #[test]
    fn progress_events_follow_declared_order() {
        let types = vec![pallet("EUR", 120.0, 80.0, 2)];
        let floor = container(589.8, 235.0);
        let mut events = Vec::new();
        place_with_progress(&types, floor, 0.0, PlacementConfig::default(), |event| {
            events.push(event.clone())
        })
        .unwrap();

        let started: Vec<String> = events
            .iter()
            .filter_map(|event| match event {
                PlaceEvent::StrategyStarted { strategy } => Some(strategy.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(started, vec!["first_fit", "best_fit", "guillotine", "skyline"]);
        assert!(matches!(events.first(), Some(PlaceEvent::RunStarted { total_pallets: 2 })));
        assert!(matches!(events.last(), Some(PlaceEvent::Finished { placed: 2, total: 2, .. })));
    }

    #[test]
    fn empty_request_is_well_formed() {
        let outcome = place(&[], container(100.0, 100.0), 0.0).unwrap();
        assert_eq!(outcome.stats.total_pallets, 0);
        assert_eq!(outcome.stats.placed_pallets, 0);
        assert!(outcome.placements.instances.is_empty());
    }

    #[test]
    fn unplaced_reason_distinguishes_space_from_size() {
        let types = vec![pallet("A", 60.0, 60.0, 2)];
        let floor = container(100.0, 60.0);
        let outcome = place(&types, floor, 0.0).unwrap();
        assert_eq!(outcome.stats.placed_pallets, 1);
        let leftover = outcome.placements.unplaced().next().unwrap();
        assert_eq!(
            unplaced_reason(leftover, &floor, &PlacementConfig::default()),
            UnplacedReason::NoFreePosition
        );
    }
}
