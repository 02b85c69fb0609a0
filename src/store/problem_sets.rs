//! Problem sets of the active course

use serde_json::Value;
use tracing::debug;

use super::{hydrate, update_keyed, StoreConfig, StoreError, StoreResult};
use crate::entities::{ProblemSet, ProblemSetType};
use crate::model::Record;

const ENTITY: &str = "ProblemSet";

/// Cache of problem sets keyed by a unique `set_id`.
#[derive(Debug, Clone, Default)]
pub struct ProblemSetStore {
    config: StoreConfig,
    problem_sets: Vec<ProblemSet>,
}

impl ProblemSetStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            problem_sets: Vec::new(),
        }
    }

    pub fn problem_sets(&self) -> &[ProblemSet] {
        &self.problem_sets
    }

    /// Replaces the cached sets, choosing each variant by its `set_type`.
    pub fn set_problem_sets(&mut self, records: &[Value]) -> StoreResult<usize> {
        self.problem_sets = hydrate(ENTITY, records, &self.config, ProblemSet::parse, ProblemSet::set_id)?;
        Ok(self.problem_sets.len())
    }

    pub fn find_by_id(&self, set_id: u64) -> Option<&ProblemSet> {
        self.problem_sets.iter().find(|set| set.set_id() == set_id)
    }

    pub fn find_by_name(&self, set_name: &str) -> Option<&ProblemSet> {
        self.problem_sets
            .iter()
            .find(|set| set.set_name() == Some(set_name))
    }

    /// A fresh set of the given variant in the active course. Not cached.
    pub fn new_problem_set(&self, set_type: ProblemSetType) -> StoreResult<ProblemSet> {
        let mut input = Record::new();
        input.insert("course_id".into(), Value::from(self.config.course_id));
        Ok(ProblemSet::new(set_type, &input)?)
    }

    pub fn add_problem_set(&mut self, set: ProblemSet) -> StoreResult<&ProblemSet> {
        if self.find_by_id(set.set_id()).is_some() {
            return Err(StoreError::duplicate(ENTITY, set.set_id()));
        }
        debug!(set_id = set.set_id(), set_type = %set.set_type(), "adding problem set");
        self.problem_sets.push(set);
        Ok(&self.problem_sets[self.problem_sets.len() - 1])
    }

    pub fn update_problem_set(&mut self, set_id: u64, partial: &Record) -> StoreResult<&ProblemSet> {
        let index = self.index_of(set_id)?;
        update_keyed(ENTITY, &mut self.problem_sets, index, ProblemSet::set_id, |set| set.set(partial))?;
        debug!(set_id, "updated problem set");
        Ok(&self.problem_sets[index])
    }

    pub fn remove_problem_set(&mut self, set_id: u64) -> StoreResult<ProblemSet> {
        let index = self.index_of(set_id)?;
        debug!(set_id, "removing problem set");
        Ok(self.problem_sets.remove(index))
    }

    fn index_of(&self, set_id: u64) -> StoreResult<usize> {
        self.problem_sets
            .iter()
            .position(|set| set.set_id() == set_id)
            .ok_or_else(|| StoreError::not_found(ENTITY, set_id))
    }
}
