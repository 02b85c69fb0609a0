//! Problem sets assigned to one course user
//!
//! A user set carries per-user overrides of a problem set's dates and
//! params, using the `set_dates`/`set_params` schemas of its variant. A
//! merged user set joins a user set with the name and visibility of its
//! problem set and the username of its course user.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::sync::{Arc, OnceLock};

use super::problem_sets::{dates_in_order, timestamp};
use super::{construct, update, ProblemSet, ProblemSetType};
use crate::model::{FieldDef, FieldValue, Model, ModelResult, ModelSchema, Record};

static USER_SET_SCHEMAS: [OnceLock<Arc<ModelSchema>>; 3] = [OnceLock::new(), OnceLock::new(), OnceLock::new()];
static MERGED_USER_SET_SCHEMAS: [OnceLock<Arc<ModelSchema>>; 3] = [OnceLock::new(), OnceLock::new(), OnceLock::new()];

fn slot(set_type: ProblemSetType) -> usize {
    match set_type {
        ProblemSetType::Homework => 0,
        ProblemSetType::Quiz => 1,
        ProblemSetType::Review => 2,
    }
}

fn assignment_fields(name: &str, set_type: ProblemSetType) -> ModelSchema {
    let (dates, params) = set_type.record_schemas();
    ModelSchema::new(name)
        .field("user_set_id", FieldDef::non_neg_int().with_default(0))
        .field("set_id", FieldDef::non_neg_int().with_default(0))
        .field("course_user_id", FieldDef::non_neg_int().with_default(0))
        .field("set_version", FieldDef::non_neg_int().with_default(1))
        .field("set_dates", FieldDef::record(dates))
        .field("set_params", FieldDef::record(params))
}

fn user_set_schema(set_type: ProblemSetType) -> Arc<ModelSchema> {
    let cell = &USER_SET_SCHEMAS[slot(set_type)];
    Arc::clone(cell.get_or_init(|| {
        let name = match set_type {
            ProblemSetType::Homework => "UserHomeworkSet",
            ProblemSetType::Quiz => "UserQuiz",
            ProblemSetType::Review => "UserReviewSet",
        };
        assignment_fields(name, set_type).shared()
    }))
}

fn merged_user_set_schema(set_type: ProblemSetType) -> Arc<ModelSchema> {
    let cell = &MERGED_USER_SET_SCHEMAS[slot(set_type)];
    Arc::clone(cell.get_or_init(|| {
        let name = match set_type {
            ProblemSetType::Homework => "MergedUserHomeworkSet",
            ProblemSetType::Quiz => "MergedUserQuiz",
            ProblemSetType::Review => "MergedUserReviewSet",
        };
        assignment_fields(name, set_type)
            .field("set_visible", FieldDef::boolean().with_default(false))
            .field("set_name", FieldDef::string().with_default(""))
            .field("username", FieldDef::username())
            .shared()
    }))
}

fn reduced_scoring(model: &Model) -> bool {
    model
        .get_record("set_params")
        .and_then(|params| params.get_bool("enable_reduced_scoring"))
        .unwrap_or(false)
}

fn date(model: &Model, name: &str) -> Option<u64> {
    model.get_record("set_dates").and_then(|dates| dates.get_int(name))
}

/// A problem set as assigned to one course user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSet {
    set_type: ProblemSetType,
    model: Model,
}

impl UserSet {
    pub fn new(set_type: ProblemSetType, input: &Record) -> ModelResult<Self> {
        let model = construct(user_set_schema(set_type), input)?;
        Ok(Self { set_type, model })
    }

    pub fn set(&mut self, input: &Record) -> ModelResult<()> {
        update(&mut self.model, input)
    }

    pub fn set_type(&self) -> ProblemSetType {
        self.set_type
    }

    pub fn user_set_id(&self) -> u64 {
        self.model.get_int("user_set_id").unwrap_or(0)
    }

    pub fn set_id(&self) -> u64 {
        self.model.get_int("set_id").unwrap_or(0)
    }

    pub fn course_user_id(&self) -> u64 {
        self.model.get_int("course_user_id").unwrap_or(0)
    }

    pub fn set_version(&self) -> u64 {
        self.model.get_int("set_version").unwrap_or(1)
    }

    pub fn date(&self, name: &str) -> Option<u64> {
        date(&self.model, name)
    }

    pub fn date_time(&self, name: &str) -> Option<DateTime<Utc>> {
        timestamp(self.date(name)?)
    }

    pub fn param(&self, name: &str) -> Option<&FieldValue> {
        self.model.get_record("set_params").and_then(|params| params.get(name))
    }

    /// Whether the overridden dates are in order for the set's variant.
    pub fn has_valid_dates(&self) -> bool {
        dates_in_order(self.set_type, self.model.get_record("set_dates"), reduced_scoring(&self.model))
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn to_object(&self) -> Record {
        self.model.to_object(None)
    }
}

impl Serialize for UserSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.model.serialize(serializer)
    }
}

/// A user set joined with its problem set and course user.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedUserSet {
    set_type: ProblemSetType,
    model: Model,
}

impl MergedUserSet {
    pub fn new(set_type: ProblemSetType, input: &Record) -> ModelResult<Self> {
        let model = construct(merged_user_set_schema(set_type), input)?;
        Ok(Self { set_type, model })
    }

    /// Joins `user_set` with the name and visibility of `problem_set`.
    /// The variant and `set_id` come from the problem set.
    pub fn merge(problem_set: &ProblemSet, user_set: &UserSet, username: &str) -> ModelResult<Self> {
        let mut record = user_set.to_object();
        record.insert("set_id".into(), Value::from(problem_set.set_id()));
        record.insert("set_visible".into(), Value::Bool(problem_set.set_visible()));
        if let Some(name) = problem_set.set_name() {
            record.insert("set_name".into(), Value::String(name.to_owned()));
        }
        record.insert("username".into(), Value::String(username.to_owned()));
        Self::new(problem_set.set_type(), &record)
    }

    pub fn set(&mut self, input: &Record) -> ModelResult<()> {
        update(&mut self.model, input)
    }

    pub fn set_type(&self) -> ProblemSetType {
        self.set_type
    }

    pub fn user_set_id(&self) -> u64 {
        self.model.get_int("user_set_id").unwrap_or(0)
    }

    pub fn set_id(&self) -> u64 {
        self.model.get_int("set_id").unwrap_or(0)
    }

    pub fn course_user_id(&self) -> u64 {
        self.model.get_int("course_user_id").unwrap_or(0)
    }

    pub fn set_version(&self) -> u64 {
        self.model.get_int("set_version").unwrap_or(1)
    }

    pub fn set_visible(&self) -> bool {
        self.model.get_bool("set_visible").unwrap_or(false)
    }

    pub fn set_name(&self) -> &str {
        self.model.get_str("set_name").unwrap_or_default()
    }

    pub fn username(&self) -> Option<&str> {
        self.model.get_str("username")
    }

    pub fn date(&self, name: &str) -> Option<u64> {
        date(&self.model, name)
    }

    pub fn has_valid_dates(&self) -> bool {
        dates_in_order(self.set_type, self.model.get_record("set_dates"), reduced_scoring(&self.model))
    }

    /// The user set part of the join
    pub fn user_set(&self) -> ModelResult<UserSet> {
        let fields = ["user_set_id", "set_id", "course_user_id", "set_version", "set_dates", "set_params"];
        UserSet::new(self.set_type, &self.model.to_object(Some(&fields[..])))
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn to_object(&self) -> Record {
        self.model.to_object(None)
    }
}

impl Serialize for MergedUserSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.model.serialize(serializer)
    }
}
