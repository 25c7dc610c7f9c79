use std::collections::BTreeMap;

use crate::db::StoreError;
use crate::models::Job;

/// Moves job `id` to board position `to_order`, shifting every job between
/// its old and new position by one so the sequence stays gap-free.
///
/// The moved job's current `order` is read from `rows`, not trusted from the
/// caller. Runs under the table's write lock when called through
/// `Table::mutate`.
pub fn apply_reorder(
    rows: &mut BTreeMap<String, Job>,
    id: &str,
    to_order: i64,
) -> Result<Job, StoreError> {
    let from_order = rows
        .get(id)
        .map(|job| job.order)
        .ok_or_else(|| StoreError::not_found::<Job>(id))?;

    for job in rows.values_mut() {
        if job.id == id {
            job.order = to_order;
        } else if from_order < to_order && job.order > from_order && job.order <= to_order {
            job.order -= 1;
        } else if to_order < from_order && job.order >= to_order && job.order < from_order {
            job.order += 1;
        }
    }

    rows.get(id)
        .cloned()
        .ok_or_else(|| StoreError::not_found::<Job>(id))
}

/// Client-side counterpart: moves the element at `from` to `to` in a list.
/// Out-of-range indices leave the list unchanged.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() || to >= items.len() || from == to {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{jobs, SeedConfig};

    fn board(n: usize) -> BTreeMap<String, Job> {
        let config = SeedConfig {
            job_count: n,
            ..SeedConfig::fixed()
        };
        jobs::generate(&config)
            .into_iter()
            .map(|j| (j.id.clone(), j))
            .collect()
    }

    fn ids_by_order(rows: &BTreeMap<String, Job>) -> Vec<String> {
        let mut jobs: Vec<&Job> = rows.values().collect();
        jobs.sort_by_key(|j| j.order);
        jobs.into_iter().map(|j| j.id.clone()).collect()
    }

    #[test]
    fn test_move_up_shifts_intermediate_jobs_down() {
        let mut rows = board(4);
        let moved = apply_reorder(&mut rows, "job-4", 1).unwrap();
        assert_eq!(moved.order, 1);
        assert_eq!(ids_by_order(&rows), ["job-1", "job-4", "job-2", "job-3"]);
    }

    #[test]
    fn test_move_down_shifts_intermediate_jobs_up() {
        let mut rows = board(4);
        apply_reorder(&mut rows, "job-1", 2).unwrap();
        assert_eq!(ids_by_order(&rows), ["job-2", "job-3", "job-1", "job-4"]);
    }

    #[test]
    fn test_orders_stay_dense() {
        let mut rows = board(6);
        apply_reorder(&mut rows, "job-2", 5).unwrap();
        apply_reorder(&mut rows, "job-6", 0).unwrap();
        let mut orders: Vec<i64> = rows.values().map(|j| j.order).collect();
        orders.sort_unstable();
        assert_eq!(orders, (0..6).collect::<Vec<i64>>());
    }

    #[test]
    fn test_missing_job_is_not_found() {
        let mut rows = board(2);
        assert!(matches!(
            apply_reorder(&mut rows, "job-9", 0),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_move_item_matches_server_reorder() {
        let mut rows = board(4);
        let mut local = ids_by_order(&rows);
        move_item(&mut local, 3, 1);
        apply_reorder(&mut rows, "job-4", 1).unwrap();
        assert_eq!(local, ids_by_order(&rows));
    }

    #[test]
    fn test_move_item_ignores_out_of_range() {
        let mut items = vec![1, 2, 3];
        move_item(&mut items, 5, 0);
        move_item(&mut items, 0, 3);
        assert_eq!(items, [1, 2, 3]);
    }
}
