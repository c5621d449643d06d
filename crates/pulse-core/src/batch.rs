//! Ordered batch assembly with capacity truncation.
//!
//! Entities are extracted in registry order and accepted records keep that
//! order. Once the batch is full the scan stops and every entity not yet
//! looked at is counted as truncated by capacity, separately from entities
//! the extractor filtered out or failed on.

use tracing::{info, warn};

use crate::config::RecordLimit;
use crate::extract::ExtractError;
use crate::job::JobKind;

/// Counters describing one assembled batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Entities returned by the registry.
    pub seen: usize,
    /// Records accepted into the batch.
    pub produced: usize,
    /// Entities the selection rule skipped (no overworld position).
    pub filtered: usize,
    /// Entities skipped because extraction failed.
    pub failed: usize,
    /// Entities never scanned because the batch was full.
    pub truncated: usize,
}

/// Records ready for export plus the counters that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<R> {
    /// Accepted records in registry order.
    pub records: Vec<R>,
    /// How the entities were accounted for.
    pub report: BatchReport,
}

/// Run `extract` over `entities` in order and collect at most `limit`
/// records.
///
/// Extraction errors never escape: the entity is counted as failed and,
/// when `verbose` is set, logged at warn level.
pub fn assemble<E, R, F>(
    kind: JobKind,
    entities: &[E],
    limit: RecordLimit,
    verbose: bool,
    mut extract: F,
) -> Batch<R>
where
    F: FnMut(&E) -> Result<Option<R>, ExtractError>,
{
    let mut records = Vec::new();
    let mut report = BatchReport {
        seen: entities.len(),
        ..BatchReport::default()
    };

    for (index, entity) in entities.iter().enumerate() {
        if limit.is_reached(records.len()) {
            report.truncated = entities.len().saturating_sub(index);
            if verbose {
                info!(
                    job = %kind,
                    limit = %limit,
                    skipped = report.truncated,
                    "Reached maximum record limit, skipping remaining entities"
                );
            }
            break;
        }

        match extract(entity) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => report.filtered = report.filtered.saturating_add(1),
            Err(error) => {
                report.failed = report.failed.saturating_add(1);
                if verbose {
                    warn!(job = %kind, index, %error, "Error extracting entity, skipping it");
                }
            }
        }
    }

    report.produced = records.len();
    Batch { records, report }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::host::HostError;

    fn keep_even(value: &u32) -> Result<Option<u32>, ExtractError> {
        Ok((value % 2 == 0).then_some(*value))
    }

    #[test]
    fn records_keep_registry_order() {
        let entities = [8, 3, 6, 1, 4];
        let batch = assemble(JobKind::Player, &entities, RecordLimit::Unbounded, false, keep_even);
        assert_eq!(batch.records, [8, 6, 4]);
        assert_eq!(
            batch.report,
            BatchReport {
                seen: 5,
                produced: 3,
                filtered: 2,
                failed: 0,
                truncated: 0,
            }
        );
    }

    #[test]
    fn capacity_overflow_is_counted_as_truncated_not_filtered() {
        let entities: Vec<u32> = (0..150).map(|i| i * 2).collect();
        let batch = assemble(JobKind::Player, entities.as_slice(), RecordLimit::Max(100), true, keep_even);
        assert_eq!(batch.records.len(), 100);
        assert_eq!(batch.report.truncated, 50);
        assert_eq!(batch.report.filtered, 0);
        assert_eq!(batch.records.last(), Some(&198));
    }

    #[test]
    fn never_exceeds_limit_for_any_n() {
        let entities: Vec<u32> = (0..20).collect();
        for n in 0..25 {
            let batch =
                assemble(JobKind::Region, entities.as_slice(), RecordLimit::Max(n), false, |v: &u32| {
                    Ok(Some(*v))
                });
            assert!(batch.records.len() <= n);
            assert_eq!(batch.records.len(), n.min(20));
            assert_eq!(batch.report.produced + batch.report.truncated, 20);
        }
    }

    #[test]
    fn limit_zero_truncates_everything() {
        let batch = assemble(JobKind::Player, &[2, 4], RecordLimit::Max(0), false, keep_even);
        assert!(batch.records.is_empty());
        assert_eq!(batch.report.truncated, 2);
    }

    #[test]
    fn exact_fit_is_not_truncation() {
        let batch = assemble(JobKind::Player, &[2, 4], RecordLimit::Max(2), false, keep_even);
        assert_eq!(batch.records, [2, 4]);
        assert_eq!(batch.report.truncated, 0);
    }

    #[test]
    fn extraction_errors_skip_only_that_entity() {
        let entities = [1_u32, 2, 3];
        let batch = assemble(JobKind::Region, &entities, RecordLimit::Unbounded, true, |v| {
            if *v == 2 {
                Err(ExtractError::Host {
                    entity: "landblock 2".to_owned(),
                    source: HostError::Internal {
                        message: "unloaded".to_owned(),
                    },
                })
            } else {
                Ok(Some(*v))
            }
        });
        assert_eq!(batch.records, [1, 3]);
        assert_eq!(batch.report.failed, 1);
        assert_eq!(batch.report.produced, 2);
    }

    #[test]
    fn filtered_entities_do_not_consume_capacity() {
        let entities = [1_u32, 3, 2, 5, 4, 6];
        let batch = assemble(JobKind::Player, &entities, RecordLimit::Max(2), false, keep_even);
        assert_eq!(batch.records, [2, 4]);
        assert_eq!(batch.report.filtered, 3);
        assert_eq!(batch.report.truncated, 1);
    }
}
