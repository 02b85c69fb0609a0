//! Problem sets: homework sets, quizzes and review sets
//!
//! All variants share the common set fields. The `set_dates` and
//! `set_params` records take a variant-specific schema, selected by the
//! `set_type` tag. The tag is owned by the variant and cannot be changed
//! through `set`.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::{cached, construct, update};
use crate::model::parsers::parse_string;
use crate::model::{FieldDef, FieldValue, Model, ModelResult, ModelSchema, ParseError, Record};

static HOMEWORK_SCHEMA: OnceLock<Arc<ModelSchema>> = OnceLock::new();
static QUIZ_SCHEMA: OnceLock<Arc<ModelSchema>> = OnceLock::new();
static REVIEW_SCHEMA: OnceLock<Arc<ModelSchema>> = OnceLock::new();

/// Problem set variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemSetType {
    #[serde(rename = "HW")]
    Homework,
    #[serde(rename = "QUIZ")]
    Quiz,
    #[serde(rename = "REVIEW")]
    Review,
}

impl ProblemSetType {
    pub const ALL: [ProblemSetType; 3] = [
        ProblemSetType::Homework,
        ProblemSetType::Quiz,
        ProblemSetType::Review,
    ];

    /// Wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemSetType::Homework => "HW",
            ProblemSetType::Quiz => "QUIZ",
            ProblemSetType::Review => "REVIEW",
        }
    }

    /// Parses a tag case-insensitively: `hw`, `quiz` or `review`.
    pub fn parse(tag: &str) -> ModelResult<Self> {
        ProblemSetType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(tag.trim()))
            .ok_or_else(|| ParseError::enum_variant("problem set type", tag).with_field("set_type"))
    }

    /// Schema of this variant, including its dates and params records
    pub fn schema(&self) -> Arc<ModelSchema> {
        match self {
            ProblemSetType::Homework => cached(&HOMEWORK_SCHEMA, || set_schema(ProblemSetType::Homework)),
            ProblemSetType::Quiz => cached(&QUIZ_SCHEMA, || set_schema(ProblemSetType::Quiz)),
            ProblemSetType::Review => cached(&REVIEW_SCHEMA, || set_schema(ProblemSetType::Review)),
        }
    }

    /// The variant's `set_dates` and `set_params` record schemas
    pub(crate) fn record_schemas(&self) -> (Arc<ModelSchema>, Arc<ModelSchema>) {
        match self {
            ProblemSetType::Homework => {
                let params = ModelSchema::new("HomeworkSetParams")
                    .field("enable_reduced_scoring", FieldDef::boolean().with_default(false))
                    .field("hide_hint", FieldDef::boolean())
                    .field("hardcopy_header", FieldDef::string())
                    .field("set_header", FieldDef::string())
                    .field("description", FieldDef::string());
                let dates = date_fields("HomeworkSetDates", &["open", "reduced_scoring", "due", "answer"]);
                (dates, params.shared())
            }
            ProblemSetType::Quiz => {
                let params = ModelSchema::new("QuizParams")
                    .field("timed", FieldDef::boolean())
                    .field("quiz_duration", FieldDef::non_neg_int());
                (date_fields("QuizDates", &["open", "due", "answer"]), params.shared())
            }
            ProblemSetType::Review => {
                let params = ModelSchema::new("ReviewSetParams").field("allow", FieldDef::boolean());
                (date_fields("ReviewSetDates", &["open", "closed"]), params.shared())
            }
        }
    }
}

impl fmt::Display for ProblemSetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn date_fields(name: &str, fields: &[&str]) -> Arc<ModelSchema> {
    fields
        .iter()
        .fold(ModelSchema::new(name), |schema, field| {
            schema.field(*field, FieldDef::non_neg_int().with_default(0))
        })
        .shared()
}

fn set_schema(set_type: ProblemSetType) -> ModelSchema {
    let name = match set_type {
        ProblemSetType::Homework => "HomeworkSet",
        ProblemSetType::Quiz => "Quiz",
        ProblemSetType::Review => "ReviewSet",
    };
    let (dates, params) = set_type.record_schemas();
    ModelSchema::new(name)
        .field("set_id", FieldDef::non_neg_int().with_default(0))
        .field("set_name", FieldDef::string())
        .field("course_id", FieldDef::non_neg_int().with_default(0))
        .field("set_visible", FieldDef::boolean().with_default(false))
        .field("set_type", FieldDef::string().with_default(set_type.as_str()))
        .field("set_dates", FieldDef::record(dates))
        .field("set_params", FieldDef::record(params))
}

/// Whether `dates` are in order for `set_type`; `reduced_scoring` only
/// takes part when enabled.
pub(crate) fn dates_in_order(set_type: ProblemSetType, dates: Option<&Model>, reduced_scoring: bool) -> bool {
    let date = |name: &str| dates.and_then(|d| d.get_int(name));
    let (open, due, answer) = (date("open"), date("due"), date("answer"));
    match set_type {
        ProblemSetType::Homework => match (open, date("reduced_scoring"), due, answer) {
            (Some(o), Some(r), Some(d), Some(a)) if reduced_scoring => o <= r && r <= d && d <= a,
            (Some(o), _, Some(d), Some(a)) if !reduced_scoring => o <= d && d <= a,
            _ => false,
        },
        ProblemSetType::Quiz => match (open, due, answer) {
            (Some(o), Some(d), Some(a)) => o <= d && d <= a,
            _ => false,
        },
        ProblemSetType::Review => match (open, date("closed")) {
            (Some(o), Some(c)) => o <= c,
            _ => false,
        },
    }
}

/// Epoch seconds as a UTC timestamp
pub(crate) fn timestamp(secs: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(secs).ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

/// A problem set of one of the three variants.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemSet {
    set_type: ProblemSetType,
    model: Model,
}

impl ProblemSet {
    /// Constructs a set of the given variant. Any `set_type` in `input` is
    /// replaced by the variant's own tag.
    pub fn new(set_type: ProblemSetType, input: &Record) -> ModelResult<Self> {
        let mut forced = input.clone();
        forced.insert("set_type".into(), Value::String(set_type.as_str().into()));
        let model = construct(set_type.schema(), &forced)?;
        Ok(Self { set_type, model })
    }

    /// Constructs a set whose variant is chosen by its `set_type` field.
    pub fn parse(input: &Record) -> ModelResult<Self> {
        let tag = input.get("set_type").map(parse_string).unwrap_or_default();
        let set_type = ProblemSetType::parse(&tag)?;
        Self::new(set_type, input)
    }

    /// Applies a partial update; `set_type` is ignored.
    pub fn set(&mut self, input: &Record) -> ModelResult<()> {
        let mut partial = input.clone();
        partial.remove("set_type");
        update(&mut self.model, &partial)
    }

    pub fn set_type(&self) -> ProblemSetType {
        self.set_type
    }

    pub fn set_id(&self) -> u64 {
        self.model.get_int("set_id").unwrap_or(0)
    }

    pub fn set_name(&self) -> Option<&str> {
        self.model.get_str("set_name")
    }

    pub fn course_id(&self) -> u64 {
        self.model.get_int("course_id").unwrap_or(0)
    }

    pub fn set_visible(&self) -> bool {
        self.model.get_bool("set_visible").unwrap_or(false)
    }

    pub fn dates(&self) -> Option<&Model> {
        self.model.get_record("set_dates")
    }

    pub fn params(&self) -> Option<&Model> {
        self.model.get_record("set_params")
    }

    /// A date as seconds since the epoch
    pub fn date(&self, name: &str) -> Option<u64> {
        self.dates().and_then(|dates| dates.get_int(name))
    }

    /// A date as a UTC timestamp
    pub fn date_time(&self, name: &str) -> Option<DateTime<Utc>> {
        timestamp(self.date(name)?)
    }

    pub fn param(&self, name: &str) -> Option<&FieldValue> {
        self.params().and_then(|params| params.get(name))
    }

    /// Homework sets only; other variants never reduce scoring.
    pub fn reduced_scoring_enabled(&self) -> bool {
        self.param("enable_reduced_scoring")
            .and_then(FieldValue::as_bool)
            .unwrap_or(false)
    }

    /// Whether the set's dates are in order for its variant.
    pub fn is_valid(&self) -> bool {
        dates_in_order(self.set_type, self.dates(), self.reduced_scoring_enabled())
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn to_object(&self) -> Record {
        self.model.to_object(None)
    }
}

impl Serialize for ProblemSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.model.serialize(serializer)
    }
}
