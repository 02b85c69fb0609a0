//! Courses

use serde::Serialize;
use std::sync::{Arc, OnceLock};

use super::{cached, Entity};
use crate::model::{FieldDef, Model, ModelSchema};

static COURSE_SCHEMA: OnceLock<Arc<ModelSchema>> = OnceLock::new();

fn course_schema() -> ModelSchema {
    let dates = ModelSchema::new("CourseDates")
        .field("start", FieldDef::string().with_default(""))
        .field("end", FieldDef::string().with_default(""))
        .shared();

    ModelSchema::new(Course::NAME)
        .field("course_id", FieldDef::non_neg_int().with_default(0))
        .field("course_name", FieldDef::string().required())
        .field("visible", FieldDef::boolean().with_default(true))
        .field("course_dates", FieldDef::record(dates))
}

/// A course with its optional start and end dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Course {
    model: Model,
}

impl Entity for Course {
    const NAME: &'static str = "Course";

    fn schema() -> Arc<ModelSchema> {
        cached(&COURSE_SCHEMA, course_schema)
    }

    fn from_model(model: Model) -> Self {
        Self { model }
    }

    fn model(&self) -> &Model {
        &self.model
    }

    fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }
}

impl Course {
    pub fn course_id(&self) -> u64 {
        self.model.get_int("course_id").unwrap_or(0)
    }

    pub fn course_name(&self) -> &str {
        self.model.get_str("course_name").unwrap_or_default()
    }

    pub fn visible(&self) -> bool {
        self.model.get_bool("visible").unwrap_or(true)
    }

    fn date(&self, name: &str) -> &str {
        self.model
            .get_record("course_dates")
            .and_then(|dates| dates.get_str(name))
            .unwrap_or_default()
    }

    pub fn start(&self) -> &str {
        self.date("start")
    }

    pub fn end(&self) -> &str {
        self.date("end")
    }
}
