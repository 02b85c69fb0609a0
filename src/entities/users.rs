//! Users, course enrollments, and the merged instructor view

use serde::Serialize;
use std::sync::{Arc, OnceLock};

use super::{cached, Entity};
use crate::model::{FieldDef, Model, ModelResult, ModelSchema, UserRole};

static USER_SCHEMA: OnceLock<Arc<ModelSchema>> = OnceLock::new();
static COURSE_USER_SCHEMA: OnceLock<Arc<ModelSchema>> = OnceLock::new();
static MERGED_USER_SCHEMA: OnceLock<Arc<ModelSchema>> = OnceLock::new();

fn user_fields(schema: ModelSchema) -> ModelSchema {
    schema
        .field("username", FieldDef::username().required())
        .field("email", FieldDef::email())
        .field("user_id", FieldDef::non_neg_int().with_default(0))
        .field("first_name", FieldDef::string())
        .field("last_name", FieldDef::string())
        .field("is_admin", FieldDef::boolean().with_default(false))
        .field("student_id", FieldDef::string())
}

fn course_user_fields(schema: ModelSchema) -> ModelSchema {
    schema
        .field("course_user_id", FieldDef::non_neg_int().with_default(0))
        .field("course_id", FieldDef::non_neg_int().with_default(0))
        .field("user_id", FieldDef::non_neg_int().with_default(0))
        .field("role", FieldDef::role())
        .field("section", FieldDef::string())
        .field("recitation", FieldDef::string())
}

/// A site-wide user account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct User {
    model: Model,
}

impl Entity for User {
    const NAME: &'static str = "User";

    fn schema() -> Arc<ModelSchema> {
        cached(&USER_SCHEMA, || user_fields(ModelSchema::new(Self::NAME)))
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

impl User {
    pub fn username(&self) -> &str {
        self.model.get_str("username").unwrap_or_default()
    }

    pub fn email(&self) -> Option<&str> {
        self.model.get_str("email")
    }

    pub fn user_id(&self) -> u64 {
        self.model.get_int("user_id").unwrap_or(0)
    }

    pub fn first_name(&self) -> Option<&str> {
        self.model.get_str("first_name")
    }

    pub fn last_name(&self) -> Option<&str> {
        self.model.get_str("last_name")
    }

    pub fn student_id(&self) -> Option<&str> {
        self.model.get_str("student_id")
    }

    pub fn is_admin(&self) -> bool {
        self.model.get_bool("is_admin").unwrap_or(false)
    }
}

/// A user's enrollment in one course.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CourseUser {
    model: Model,
}

impl Entity for CourseUser {
    const NAME: &'static str = "CourseUser";

    fn schema() -> Arc<ModelSchema> {
        cached(&COURSE_USER_SCHEMA, || course_user_fields(ModelSchema::new(Self::NAME)))
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

impl CourseUser {
    pub fn course_user_id(&self) -> u64 {
        self.model.get_int("course_user_id").unwrap_or(0)
    }

    pub fn course_id(&self) -> u64 {
        self.model.get_int("course_id").unwrap_or(0)
    }

    pub fn user_id(&self) -> u64 {
        self.model.get_int("user_id").unwrap_or(0)
    }

    pub fn role(&self) -> Option<UserRole> {
        self.model.get_role("role")
    }

    pub fn section(&self) -> Option<&str> {
        self.model.get_str("section")
    }

    pub fn recitation(&self) -> Option<&str> {
        self.model.get_str("recitation")
    }
}

/// A user joined with one of their enrollments.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MergedUser {
    model: Model,
}

impl Entity for MergedUser {
    const NAME: &'static str = "MergedUser";

    fn schema() -> Arc<ModelSchema> {
        cached(&MERGED_USER_SCHEMA, || {
            course_user_fields(user_fields(ModelSchema::new(Self::NAME)))
        })
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

impl MergedUser {
    pub fn username(&self) -> &str {
        self.model.get_str("username").unwrap_or_default()
    }

    pub fn email(&self) -> Option<&str> {
        self.model.get_str("email")
    }

    pub fn user_id(&self) -> u64 {
        self.model.get_int("user_id").unwrap_or(0)
    }

    pub fn course_user_id(&self) -> u64 {
        self.model.get_int("course_user_id").unwrap_or(0)
    }

    pub fn course_id(&self) -> u64 {
        self.model.get_int("course_id").unwrap_or(0)
    }

    pub fn role(&self) -> Option<UserRole> {
        self.model.get_role("role")
    }

    pub fn is_admin(&self) -> bool {
        self.model.get_bool("is_admin").unwrap_or(false)
    }

    /// The enrollment half of the record
    pub fn course_user(&self) -> ModelResult<CourseUser> {
        let schema = CourseUser::schema();
        let fields = schema.all_fields();
        CourseUser::new(&self.model.to_object(Some(&fields)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ParseErrorKind, Record};
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_default_user_needs_username() {
        let err = User::empty().unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::MissingRequiredFields);
        assert_eq!(err.fields(), ["username"]);
    }

    #[test]
    fn test_user_defaults() {
        let user = User::new(&record(json!({ "username": "homer" }))).unwrap();
        assert_eq!(
            Value::Object(user.to_object()),
            json!({ "username": "homer", "user_id": 0, "is_admin": false })
        );
    }

    #[test]
    fn test_user_round_trip() {
        let input = json!({
            "username": "homer",
            "email": "homer@msn.com",
            "user_id": 15,
            "first_name": "Homer",
            "last_name": "Simpson",
            "is_admin": true,
            "student_id": "1234"
        });
        let user = User::new(&record(input.clone())).unwrap();
        assert_eq!(Value::Object(user.to_object()), input);
        assert_eq!(user.username(), "homer");
        assert!(user.is_admin());
    }

    #[test]
    fn test_user_set() {
        let mut user = User::new(&record(json!({ "username": "homer", "user_id": 3 }))).unwrap();
        user.set(&record(json!({ "first_name": "Homer", "student_id": 1234 }))).unwrap();
        assert_eq!(user.first_name(), Some("Homer"));
        assert_eq!(user.student_id(), Some("1234"));
        assert_eq!(user.user_id(), 3);

        let err = user.set(&record(json!({ "email": "not an email" }))).unwrap_err();
        assert_eq!(err.field(), Some("email"));
        assert_eq!(user.email(), None);
    }

    #[test]
    fn test_course_user_role() {
        let err = CourseUser::new(&record(json!({ "role": "superhero" }))).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::InvalidRole);

        let cu = CourseUser::new(&record(json!({ "role": "student", "course_id": "4" }))).unwrap();
        assert_eq!(cu.role(), Some(UserRole::Student));
        assert_eq!(cu.course_id(), 4);
        assert_eq!(cu.to_object()["role"], json!("student"));
    }

    #[test]
    fn test_course_user_rejects_user_fields() {
        let err = CourseUser::new(&record(json!({ "username": "homer" }))).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::UnknownFields);
        assert_eq!(err.fields(), ["username"]);
    }

    #[test]
    fn test_merged_user_splits() {
        let merged = MergedUser::new(&record(json!({
            "username": "lisa",
            "course_id": 2,
            "course_user_id": 7,
            "role": "TA",
            "section": 1
        })))
        .unwrap();
        let cu = merged.course_user().unwrap();
        assert_eq!(cu.course_user_id(), 7);
        assert_eq!(cu.role(), Some(UserRole::Ta));
        assert_eq!(cu.section(), Some("1"));
    }

    #[test]
    fn test_schemas_are_valid() {
        for schema in [User::schema(), CourseUser::schema(), MergedUser::schema()] {
            assert!(schema.validate_structure().is_ok(), "{}", schema.name);
        }
    }
}
