//! Statistics for a finished placement run.

use serde::Serialize;
use utoipa::ToSchema;

use crate::evaluator::area_efficiency;
use crate::model::{Container, PlacementResult};

/// Outcome of one strategy inside a run.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct StrategyReport {
    pub strategy: String,
    pub placed: usize,
    /// Composite score; absent when the strategy failed.
    #[schema(nullable = true)]
    pub score: Option<f64>,
    #[schema(nullable = true)]
    pub error: Option<String>,
}

/// Requested versus placed pallets for one pallet type.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct TypeSummary {
    pub type_id: String,
    pub requested: usize,
    pub placed: usize,
}

/// Read-only snapshot of the winning layout.
///
/// # Fields
/// * `total_pallets` - Number of instances in the run
/// * `placed_pallets` - Instances with `placed == true`
/// * `efficiency` - Covered floor fraction of the winning layout
/// * `score` - Composite score of the winning layout
/// * `execution_time_ms` - Wall-clock time for the whole run
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct StatsSnapshot {
    pub total_pallets: usize,
    pub placed_pallets: usize,
    pub unplaced_pallets: usize,
    pub efficiency: f64,
    pub score: f64,
    pub execution_time_ms: u64,
    #[schema(nullable = true)]
    pub winning_strategy: Option<String>,
    pub strategies: Vec<StrategyReport>,
    pub per_type: Vec<TypeSummary>,
    /// At least one strategy was abandoned because the time budget ran out.
    pub timed_out: bool,
}

impl StatsSnapshot {
    /// Aggregates the statistics for `result`.
    ///
    /// `efficiency` is recomputed from the layout rather than taken from the
    /// selection step.
    pub fn collect(
        result: &PlacementResult,
        container: &Container,
        score: f64,
        winning_strategy: Option<String>,
        strategies: Vec<StrategyReport>,
        execution_time_ms: u64,
    ) -> Self {
        let placed_pallets = result.placed_count();
        Self {
            total_pallets: result.total(),
            placed_pallets,
            unplaced_pallets: result.total() - placed_pallets,
            efficiency: area_efficiency(result, container),
            score,
            execution_time_ms,
            winning_strategy,
            strategies,
            per_type: per_type_summary(result),
            timed_out: false,
        }
    }

    /// Whether every requested pallet was placed.
    pub fn is_complete(&self) -> bool {
        self.unplaced_pallets == 0
    }
}

/// Summaries in order of first appearance in the instance list.
fn per_type_summary(result: &PlacementResult) -> Vec<TypeSummary> {
    let mut summaries: Vec<TypeSummary> = Vec::new();
    for instance in &result.instances {
        let index = match summaries
            .iter()
            .position(|summary| summary.type_id == instance.type_id)
        {
            Some(index) => index,
            None => {
                summaries.push(TypeSummary {
                    type_id: instance.type_id.clone(),
                    requested: 0,
                    placed: 0,
                });
                summaries.len() - 1
            }
        };
        summaries[index].requested += 1;
        if instance.placed {
            summaries[index].placed += 1;
        }
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PalletType, expand_instances, orientations};

    #[test]
    fn collects_counts_and_efficiency() {
        let container = Container::new(100.0, 100.0).unwrap();
        let types = vec![
            PalletType::new("A", 50.0, 50.0, 2).unwrap(),
            PalletType::new("B", 10.0, 10.0, 1).unwrap(),
        ];
        let mut instances = expand_instances(&types, false);
        let orientation = orientations(&instances[0], false)[0];
        instances[0].place_at(0.0, 0.0, orientation);
        let result = PlacementResult::new(instances);

        let stats =
            StatsSnapshot::collect(&result, &container, 0.5, Some("x".into()), vec![], 7);
        assert_eq!(stats.total_pallets, 3);
        assert_eq!(stats.placed_pallets, 1);
        assert_eq!(stats.unplaced_pallets, 2);
        assert!((stats.efficiency - 0.25).abs() < 1e-9);
        assert_eq!(stats.execution_time_ms, 7);
        assert!(!stats.timed_out);
        assert!(!stats.is_complete());
        assert_eq!(
            stats.per_type,
            vec![
                TypeSummary {
                    type_id: "A".into(),
                    requested: 2,
                    placed: 1
                },
                TypeSummary {
                    type_id: "B".into(),
                    requested: 1,
                    placed: 0
                },
            ]
        );
    }

    #[test]
    fn empty_result_is_complete_with_zero_efficiency() {
        let container = Container::new(100.0, 100.0).unwrap();
        let stats =
            StatsSnapshot::collect(&PlacementResult::default(), &container, 0.0, None, vec![], 0);
        assert_eq!(stats.total_pallets, 0);
        assert_eq!(stats.efficiency, 0.0);
        assert!(stats.is_complete());
    }
}
