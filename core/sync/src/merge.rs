//! Last-writer-wins merge of local and remote task sets.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use devtasks_common::{sort_newest_first, Task};

/// Merge a local task set with an authoritative remote snapshot.
///
/// Whole-record last-writer-wins per id:
/// - id only in local: kept (assumed not yet acknowledged by remote)
/// - id only in remote: adopted
/// - id in both: the record with the greater `updatedAt` wins; a missing
///   timestamp compares as the earliest possible instant; exact ties
///   resolve to the remote copy
///
/// No field-level merging, no tombstones: a local delete that has not yet
/// reached the remote is resurrected if the remote still returns the id.
/// Records with an empty id are dropped. The result is sorted
/// newest-updated first, matching the local store's `list()` contract.
pub fn merge(local: Vec<Task>, remote: Vec<Task>) -> Vec<Task> {
    let mut by_id: HashMap<String, Task> = HashMap::new();

    for task in local {
        if task.id.is_empty() {
            continue;
        }
        by_id.insert(task.id.clone(), task);
    }

    for task in remote {
        if task.id.is_empty() {
            continue;
        }
        match by_id.entry(task.id.clone()) {
            Entry::Occupied(mut slot) => {
                if task.updated_ts() >= slot.get().updated_ts() {
                    slot.insert(task);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(task);
            }
        }
    }

    let mut merged: Vec<Task> = by_id.into_values().collect();
    sort_newest_first(&mut merged);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use devtasks_common::TaskStatus;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn task(id: &str, title: &str, updated_secs: i64) -> Task {
        let mut t = Task::new(id, title);
        t.updated_at = Some(ts(updated_secs));
        t
    }

    #[test]
    fn test_local_only_task_survives() {
        // Local X never synced; remote has no X.
        let merged = merge(vec![task("x", "offline", 100)], vec![]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "x");
        assert_eq!(merged[0].updated_ts(), ts(100));
    }

    #[test]
    fn test_remote_only_task_adopted() {
        let merged = merge(vec![], vec![task("r", "from remote", 100)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "r");
    }

    #[test]
    fn test_newer_remote_wins() {
        let mut local = task("x", "local", 100);
        local.status = TaskStatus::Todo;
        let mut remote = task("x", "remote", 200);
        remote.status = TaskStatus::Done;

        let merged = merge(vec![local], vec![remote]);
        assert_eq!(merged[0].status, TaskStatus::Done);
        assert_eq!(merged[0].updated_ts(), ts(200));
    }

    #[test]
    fn test_newer_local_wins() {
        let merged = merge(vec![task("x", "local", 300)], vec![task("x", "remote", 200)]);
        assert_eq!(merged[0].title, "local");
    }

    #[test]
    fn test_remote_wins_exact_tie() {
        let merged = merge(vec![task("x", "Old", 100)], vec![task("x", "New", 100)]);
        assert_eq!(merged[0].title, "New");
    }

    #[test]
    fn test_missing_timestamp_loses_to_any_stamp() {
        let local = Task::new("x", "no stamp");
        let merged = merge(vec![local], vec![task("x", "stamped", 1)]);
        assert_eq!(merged[0].title, "stamped");
    }

    #[test]
    fn test_merged_updated_at_is_max() {
        let merged = merge(vec![task("x", "local", 150)], vec![task("x", "remote", 90)]);
        assert_eq!(merged[0].updated_ts(), ts(150));
    }

    #[test]
    fn test_result_sorted_newest_first() {
        let merged = merge(
            vec![task("a", "A", 10), task("b", "B", 30)],
            vec![task("c", "C", 20)],
        );
        let ids: Vec<&str> = merged.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_empty_ids_dropped() {
        let merged = merge(vec![task("", "bad", 10)], vec![task("", "bad", 20)]);
        assert!(merged.is_empty());
    }

    fn arb_task() -> impl Strategy<Value = Task> {
        (prop::sample::select(vec!["a", "b", "c", "d"]), 0i64..6).prop_map(|(id, secs)| {
            let mut t = Task::new(id, format!("task {id}"));
            t.updated_at = Some(ts(secs));
            t
        })
    }

    fn arb_tasks() -> impl Strategy<Value = Vec<Task>> {
        prop::collection::vec(arb_task(), 0..6)
    }

    fn by_id(tasks: Vec<Task>) -> BTreeMap<String, Task> {
        tasks.into_iter().map(|t| (t.id.clone(), t)).collect()
    }

    fn max_ts_by_id(tasks: &[Task]) -> BTreeMap<String, DateTime<Utc>> {
        let mut out = BTreeMap::new();
        for t in tasks {
            let entry = out.entry(t.id.clone()).or_insert_with(|| t.updated_ts());
            if t.updated_ts() > *entry {
                *entry = t.updated_ts();
            }
        }
        out
    }

    proptest! {
        #[test]
        fn prop_merge_is_idempotent(local in arb_tasks(), remote in arb_tasks()) {
            let once = merge(local, remote.clone());
            let twice = merge(once.clone(), remote);
            prop_assert_eq!(by_id(once), by_id(twice));
        }

        #[test]
        fn prop_merged_timestamp_is_max(local in arb_tasks(), remote in arb_tasks()) {
            let remote_max = max_ts_by_id(&remote);
            let merged = by_id(merge(local.clone(), remote));

            for (id, task) in &merged {
                // For a duplicated local id only the last write is live.
                let l = local.iter().rev().find(|t| &t.id == id).map(|t| t.updated_ts());
                let r = remote_max.get(id).copied();
                let expected = l.into_iter().chain(r).max().unwrap();
                prop_assert_eq!(task.updated_ts(), expected);
            }
        }
    }
}
