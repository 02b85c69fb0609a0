//! In-memory state containers for courseware
//!
//! Stores cache constructed entities for a UI. They hydrate from batches
//! of raw records, apply keyed updates through the entities' own `set`,
//! and never talk to the network.

mod config;
mod errors;
mod problem_sets;
mod users;

pub use config::StoreConfig;
pub use errors::{StoreError, StoreResult};
pub use problem_sets::ProblemSetStore;
pub use users::UserStore;

use serde_json::Value;
use std::collections::HashSet;
use std::hash::Hash;
use tracing::{debug, warn};

use crate::model::{ModelResult, Record};

/// Builds one entity per raw record. Keys returned by `key` must be
/// unique within the batch.
///
/// In strict mode the first bad or duplicate record fails the batch. In
/// lenient mode such records are logged and skipped, so the first record
/// with a given key wins.
pub(crate) fn hydrate<T, K>(
    entity: &'static str,
    records: &[Value],
    config: &StoreConfig,
    build: impl Fn(&Record) -> ModelResult<T>,
    key: impl Fn(&T) -> K,
) -> StoreResult<Vec<T>>
where
    K: Eq + Hash + ToString,
{
    let mut built = Vec::with_capacity(records.len());
    let mut seen = HashSet::new();

    for (index, raw) in records.iter().enumerate() {
        let result = match raw.as_object() {
            Some(record) => build(record).map_err(|source| StoreError::InvalidRecord { index, source }),
            None => Err(StoreError::NotAnObject { index }),
        };
        let result = result.and_then(|item| {
            let k = key(&item);
            if seen.contains(&k) {
                return Err(StoreError::duplicate(entity, k));
            }
            seen.insert(k);
            Ok(item)
        });
        match result {
            Ok(item) => built.push(item),
            Err(e) if config.skip_invalid_records => {
                warn!(entity, index, error = %e, "skipping invalid record");
            }
            Err(e) => return Err(e),
        }
    }

    debug!(entity, count = built.len(), total = records.len(), "hydrated");
    Ok(built)
}

/// Applies `apply` to a copy of `items[index]` and commits it only when
/// the update succeeds and the entity's key stays unique.
pub(crate) fn update_keyed<T, K>(
    entity: &'static str,
    items: &mut [T],
    index: usize,
    key: impl Fn(&T) -> K,
    apply: impl FnOnce(&mut T) -> ModelResult<()>,
) -> StoreResult<()>
where
    T: Clone,
    K: PartialEq + ToString,
{
    let mut staged = items[index].clone();
    apply(&mut staged)?;

    let staged_key = key(&staged);
    let collides = items
        .iter()
        .enumerate()
        .any(|(i, item)| i != index && key(item) == staged_key);
    if collides {
        return Err(StoreError::duplicate(entity, staged_key));
    }

    items[index] = staged;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Entity, User};
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn batch() -> Vec<Value> {
        vec![
            json!({ "username": "homer" }),
            json!({ "username": "1234login" }),
            json!("not a record"),
            json!({ "username": "lisa" }),
        ]
    }

    fn username(user: &User) -> String {
        user.username().to_owned()
    }

    #[test]
    fn test_strict_hydration_fails_batch() {
        let err = hydrate("User", &batch(), &StoreConfig::strict(), User::new, username).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord { index: 1, .. }));
    }

    #[test]
    fn test_lenient_hydration_skips() {
        let users = hydrate("User", &batch(), &StoreConfig::lenient(), User::new, username).unwrap();
        let names: Vec<&str> = users.iter().map(User::username).collect();
        assert_eq!(names, ["homer", "lisa"]);
    }

    #[test]
    fn test_hydration_rejects_duplicate_keys() {
        let records = [
            json!({ "username": "homer", "user_id": 1 }),
            json!({ "username": "homer", "user_id": 2 }),
        ];
        let err = hydrate("User", &records, &StoreConfig::strict(), User::new, username).unwrap_err();
        assert_eq!(err, StoreError::duplicate("User", "homer"));

        let users = hydrate("User", &records, &StoreConfig::lenient(), User::new, username).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_id(), 1);
    }

    #[test]
    fn test_update_keyed_rejects_collisions() {
        let mut users = vec![
            User::new(&record(json!({ "username": "homer" }))).unwrap(),
            User::new(&record(json!({ "username": "lisa" }))).unwrap(),
        ];
        let err = update_keyed("User", &mut users, 1, username, |u| {
            u.set(&record(json!({ "username": "homer", "first_name": "Lisa" })))
        })
        .unwrap_err();
        assert_eq!(err, StoreError::duplicate("User", "homer"));
        assert_eq!(users[1].username(), "lisa");
        assert_eq!(users[1].first_name(), None);

        update_keyed("User", &mut users, 1, username, |u| u.set(&record(json!({ "username": "maggie" })))).unwrap();
        assert_eq!(users[1].username(), "maggie");
    }
}
