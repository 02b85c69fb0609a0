//! Concrete entities built on the model engine
//!
//! Each entity owns a [`Model`] of a fixed schema. Record fields
//! (course dates, problem and user set dates and params) are composed here: the
//! engine skips them, so construction installs every declared sub-model and
//! `set` routes partial updates into the installed ones.

mod courses;
mod problem_sets;
mod settings;
mod user_sets;
mod users;

pub use courses::Course;
pub use problem_sets::{ProblemSet, ProblemSetType};
pub use settings::{CourseSetting, DbCourseSetting, GlobalSetting, SettingOption, SettingType};
pub use user_sets::{MergedUserSet, UserSet};
pub use users::{CourseUser, MergedUser, User};

use serde::Serialize;
use std::sync::{Arc, OnceLock};

use crate::model::{Model, ModelResult, ModelSchema, Record};

/// A named entity backed by a single static schema.
pub trait Entity: Sized + Clone + Serialize {
    /// Entity name used in error messages and by the CLI
    const NAME: &'static str;

    fn schema() -> Arc<ModelSchema>;

    fn from_model(model: Model) -> Self;

    fn model(&self) -> &Model;

    fn model_mut(&mut self) -> &mut Model;

    /// Post-coercion fix-ups applied after construction and every update
    fn normalize(&mut self) -> ModelResult<()> {
        Ok(())
    }

    /// Constructs the entity, including its record fields.
    fn new(input: &Record) -> ModelResult<Self> {
        let mut entity = Self::from_model(construct(Self::schema(), input)?);
        entity.normalize()?;
        Ok(entity)
    }

    /// Entity with every field at its default
    fn empty() -> ModelResult<Self> {
        Self::new(&Record::new())
    }

    /// Applies a partial update. On failure the entity is unchanged.
    fn set(&mut self, input: &Record) -> ModelResult<()> {
        update(self.model_mut(), input)?;
        self.normalize()
    }

    fn to_object(&self) -> Record {
        self.model().to_object(None)
    }
}

/// Builds a model and installs each of its record fields from `input`.
pub(crate) fn construct(schema: Arc<ModelSchema>, input: &Record) -> ModelResult<Model> {
    let mut model = Model::construct(Arc::clone(&schema), input)?;
    for (name, def) in &schema.fields {
        if def.kind.is_record() {
            model.init_record(name, input.get(name))?;
        }
    }
    Ok(model)
}

/// Applies `input` to the scalar fields and record fields of `model`,
/// committing only when every part succeeds.
pub(crate) fn update(model: &mut Model, input: &Record) -> ModelResult<()> {
    let mut staged = model.clone();
    staged.set(input)?;

    let schema = Arc::clone(staged.schema());
    for (name, def) in &schema.fields {
        if !def.kind.is_record() {
            continue;
        }
        if let Some(raw) = input.get(name) {
            staged.update_record(name, raw)?;
        }
    }

    *model = staged;
    Ok(())
}

/// Returns the schema held in `cell`, building it on first use.
pub(crate) fn cached(cell: &'static OnceLock<Arc<ModelSchema>>, build: fn() -> ModelSchema) -> Arc<ModelSchema> {
    Arc::clone(cell.get_or_init(|| build().shared()))
}
