//! Global and course-level settings
//!
//! A global setting declares a name, a type and a default value. A course
//! setting carries the same declaration plus the value chosen for one
//! course, falling back to the default when no value was chosen. The
//! stored form of a course setting keeps only the ids and the value.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::{cached, Entity};
use crate::model::{FieldDef, Model, ModelResult, ModelSchema, Record};

static GLOBAL_SETTING_SCHEMA: OnceLock<Arc<ModelSchema>> = OnceLock::new();
static COURSE_SETTING_SCHEMA: OnceLock<Arc<ModelSchema>> = OnceLock::new();
static DB_COURSE_SETTING_SCHEMA: OnceLock<Arc<ModelSchema>> = OnceLock::new();
static UNSET: Value = Value::Null;

/// Value type of a setting. Unrecognized names map to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    Int,
    Decimal,
    List,
    Multilist,
    Text,
    Boolean,
    Time,
    Unknown,
}

impl SettingType {
    pub const ALL: [SettingType; 8] = [
        SettingType::Int,
        SettingType::Decimal,
        SettingType::List,
        SettingType::Multilist,
        SettingType::Text,
        SettingType::Boolean,
        SettingType::Time,
        SettingType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingType::Int => "int",
            SettingType::Decimal => "decimal",
            SettingType::List => "list",
            SettingType::Multilist => "multilist",
            SettingType::Text => "text",
            SettingType::Boolean => "boolean",
            SettingType::Time => "time",
            SettingType::Unknown => "unknown",
        }
    }

    /// Never fails
    pub fn from_name(name: &str) -> Self {
        SettingType::ALL
            .into_iter()
            .find(|t| t.as_str() == name)
            .unwrap_or(SettingType::Unknown)
    }

    /// Whether `value` is a well-formed value of this type given `options`.
    pub fn accepts(&self, value: &Value, options: &[SettingOption]) -> bool {
        let in_options = |v: &str| options.iter().any(|opt| opt.value == v);
        match (self, value) {
            (SettingType::Int, Value::Number(n)) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            (SettingType::Decimal, Value::Number(_)) => true,
            (SettingType::Text, Value::String(_)) => true,
            (SettingType::Boolean, Value::Bool(_)) => true,
            (SettingType::Time, Value::String(s)) => {
                s.len() == 5 && NaiveTime::parse_from_str(s, "%H:%M").is_ok()
            }
            (SettingType::List, Value::String(s)) => in_options(s.as_str()),
            (SettingType::Multilist, Value::Array(items)) => items
                .iter()
                .all(|item| item.as_str().is_some_and(in_options)),
            _ => false,
        }
    }
}

impl fmt::Display for SettingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One choice of a list or multilist setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingOption {
    pub label: String,
    pub value: String,
}

impl SettingOption {
    /// Reads either a bare string or a `{label, value}` object.
    pub fn from_json(raw: &Value) -> Option<Self> {
        match raw {
            Value::String(s) => Some(Self {
                label: s.clone(),
                value: s.clone(),
            }),
            Value::Object(map) => {
                let value = map.get("value")?.as_str()?.to_owned();
                let label = map
                    .get("label")
                    .and_then(Value::as_str)
                    .map_or_else(|| value.clone(), str::to_owned);
                Some(Self { label, value })
            }
            _ => None,
        }
    }
}

fn global_fields(schema: ModelSchema) -> ModelSchema {
    schema
        .field("setting_id", FieldDef::non_neg_int().with_default(0))
        .field("setting_name", FieldDef::string().with_default(""))
        .field("category", FieldDef::string().with_default(""))
        .field("subcategory", FieldDef::string())
        .field("description", FieldDef::string().with_default(""))
        .field("doc", FieldDef::string())
        .field("type", FieldDef::string().with_default(SettingType::Unknown.as_str()))
        .field("default_value", FieldDef::array().with_default(""))
        .field("options", FieldDef::array())
}

fn setting_type(model: &Model) -> SettingType {
    model.get_str("type").map_or(SettingType::Unknown, SettingType::from_name)
}

fn options(model: &Model) -> Vec<SettingOption> {
    model
        .get_array("options")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(SettingOption::from_json).collect())
        .unwrap_or_default()
}

fn normalize_type(model: &mut Model) -> ModelResult<()> {
    let name = model.get_str("type").unwrap_or_default();
    if SettingType::from_name(name) == SettingType::Unknown && name != SettingType::Unknown.as_str() {
        let mut reset = Record::new();
        reset.insert("type".into(), Value::String(SettingType::Unknown.as_str().into()));
        model.set(&reset)?;
    }
    Ok(())
}

fn declaration_is_valid(model: &Model, value: &Value) -> bool {
    let filled = |name: &str| model.get_str(name).is_some_and(|s| !s.is_empty());
    filled("setting_name")
        && filled("category")
        && filled("description")
        && setting_type(model).accepts(value, &options(model))
}

/// A site-wide setting declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GlobalSetting {
    model: Model,
}

impl Entity for GlobalSetting {
    const NAME: &'static str = "GlobalSetting";

    fn schema() -> Arc<ModelSchema> {
        cached(&GLOBAL_SETTING_SCHEMA, || global_fields(ModelSchema::new(Self::NAME)))
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

    fn normalize(&mut self) -> ModelResult<()> {
        normalize_type(&mut self.model)
    }
}

impl GlobalSetting {
    pub fn setting_id(&self) -> u64 {
        self.model.get_int("setting_id").unwrap_or(0)
    }

    pub fn setting_name(&self) -> &str {
        self.model.get_str("setting_name").unwrap_or_default()
    }

    pub fn category(&self) -> &str {
        self.model.get_str("category").unwrap_or_default()
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.model.get_str("subcategory")
    }

    pub fn description(&self) -> &str {
        self.model.get_str("description").unwrap_or_default()
    }

    pub fn doc(&self) -> Option<&str> {
        self.model.get_str("doc")
    }

    pub fn setting_type(&self) -> SettingType {
        setting_type(&self.model)
    }

    pub fn default_value(&self) -> &Value {
        self.model.get_array("default_value").unwrap_or(&UNSET)
    }

    pub fn options(&self) -> Vec<SettingOption> {
        options(&self.model)
    }

    /// Whether the setting is fully declared and its default matches its type.
    pub fn is_valid(&self) -> bool {
        declaration_is_valid(&self.model, self.default_value())
    }
}

/// A setting as configured for one course.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseSetting {
    model: Model,
}

impl Entity for CourseSetting {
    const NAME: &'static str = "CourseSetting";

    fn schema() -> Arc<ModelSchema> {
        cached(&COURSE_SETTING_SCHEMA, || {
            global_fields(ModelSchema::new(Self::NAME))
                .field("course_setting_id", FieldDef::non_neg_int().with_default(0))
                .field("course_id", FieldDef::non_neg_int().with_default(0))
                .field("value", FieldDef::array())
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

    fn normalize(&mut self) -> ModelResult<()> {
        normalize_type(&mut self.model)
    }

    /// The plain record, with `value` resolved through the default.
    fn to_object(&self) -> Record {
        let mut object = self.model.to_object(None);
        object.insert("value".into(), self.value().clone());
        object
    }
}

impl CourseSetting {
    pub fn course_setting_id(&self) -> u64 {
        self.model.get_int("course_setting_id").unwrap_or(0)
    }

    pub fn course_id(&self) -> u64 {
        self.model.get_int("course_id").unwrap_or(0)
    }

    pub fn setting_id(&self) -> u64 {
        self.model.get_int("setting_id").unwrap_or(0)
    }

    pub fn setting_name(&self) -> &str {
        self.model.get_str("setting_name").unwrap_or_default()
    }

    pub fn setting_type(&self) -> SettingType {
        setting_type(&self.model)
    }

    pub fn default_value(&self) -> &Value {
        self.model.get_array("default_value").unwrap_or(&UNSET)
    }

    /// The course's value, or the default when none was chosen
    pub fn value(&self) -> &Value {
        self.model
            .get_array("value")
            .unwrap_or_else(|| self.default_value())
    }

    pub fn options(&self) -> Vec<SettingOption> {
        options(&self.model)
    }

    pub fn is_valid(&self) -> bool {
        declaration_is_valid(&self.model, self.value())
    }
}

impl Serialize for CourseSetting {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_object().serialize(serializer)
    }
}

/// A course setting as stored: the ids linking a global setting to a
/// course, and the chosen value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DbCourseSetting {
    model: Model,
}

impl Entity for DbCourseSetting {
    const NAME: &'static str = "DbCourseSetting";

    fn schema() -> Arc<ModelSchema> {
        cached(&DB_COURSE_SETTING_SCHEMA, || {
            ModelSchema::new(Self::NAME)
                .field("course_setting_id", FieldDef::non_neg_int().with_default(0))
                .field("course_id", FieldDef::non_neg_int().with_default(0))
                .field("setting_id", FieldDef::non_neg_int().with_default(0))
                .field("value", FieldDef::array())
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

impl DbCourseSetting {
    pub fn course_setting_id(&self) -> u64 {
        self.model.get_int("course_setting_id").unwrap_or(0)
    }

    pub fn course_id(&self) -> u64 {
        self.model.get_int("course_id").unwrap_or(0)
    }

    pub fn setting_id(&self) -> u64 {
        self.model.get_int("setting_id").unwrap_or(0)
    }

    /// The stored value, if one was chosen
    pub fn value(&self) -> Option<&Value> {
        self.model.get_array("value")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn text_setting() -> GlobalSetting {
        GlobalSetting::new(&record(json!({
            "setting_name": "description",
            "default_value": "This is the description",
            "description": "Describe this.",
            "doc": "Extended help",
            "type": "text",
            "category": "general"
        })))
        .unwrap()
    }

    #[test]
    fn test_default_global_setting() {
        let setting = GlobalSetting::empty().unwrap();
        assert_eq!(
            Value::Object(setting.to_object()),
            json!({
                "setting_id": 0,
                "setting_name": "",
                "default_value": "",
                "category": "",
                "description": "",
                "type": "unknown"
            })
        );
        assert!(!setting.is_valid());
    }

    #[test]
    fn test_unknown_type_name() {
        let mut setting = text_setting();
        assert_eq!(setting.setting_type(), SettingType::Text);
        setting.set(&record(json!({ "type": "undefined type" }))).unwrap();
        assert_eq!(setting.setting_type(), SettingType::Unknown);
        assert_eq!(setting.to_object()["type"], json!("unknown"));
    }

    #[test]
    fn test_required_declaration() {
        let mut setting = text_setting();
        assert!(setting.is_valid());
        setting.set(&record(json!({ "description": "" }))).unwrap();
        assert!(!setting.is_valid());
        setting.set(&record(json!({ "description": "Help", "setting_name": "" }))).unwrap();
        assert!(!setting.is_valid());
        setting.set(&record(json!({ "setting_name": "description", "category": "" }))).unwrap();
        assert!(!setting.is_valid());
        setting.set(&record(json!({ "category": "general", "doc": "" }))).unwrap();
        assert!(setting.is_valid());
    }

    fn valid_with(setting: &mut GlobalSetting, default_value: Value) -> bool {
        let mut input = Record::new();
        input.insert("default_value".into(), default_value);
        setting.set(&input).unwrap();
        setting.is_valid()
    }

    #[test]
    fn test_text_values() {
        let mut setting = text_setting();
        assert!(!valid_with(&mut setting, json!(3.14)));
        assert!(!valid_with(&mut setting, json!(true)));
        assert!(!valid_with(&mut setting, json!(["1", "2"])));
    }

    #[test]
    fn test_numeric_values() {
        let mut setting = text_setting();
        setting.set(&record(json!({ "type": "int" }))).unwrap();
        assert!(valid_with(&mut setting, json!(10)));
        assert!(!valid_with(&mut setting, json!(3.14)));
        assert!(!valid_with(&mut setting, json!("hi")));

        setting.set(&record(json!({ "type": "decimal" }))).unwrap();
        assert!(valid_with(&mut setting, json!(3.14)));
        assert!(valid_with(&mut setting, json!(3)));
        assert!(!valid_with(&mut setting, json!("hi")));
    }

    #[test]
    fn test_boolean_values() {
        let mut setting = text_setting();
        setting.set(&record(json!({ "type": "boolean" }))).unwrap();
        assert!(valid_with(&mut setting, json!(true)));
        assert!(!valid_with(&mut setting, json!(3)));
    }

    #[test]
    fn test_time_values() {
        let mut setting = text_setting();
        setting.set(&record(json!({ "type": "time" }))).unwrap();
        assert!(valid_with(&mut setting, json!("23:59")));
        assert!(!valid_with(&mut setting, json!("31:45")));
        assert!(!valid_with(&mut setting, json!("13:65")));
        assert!(!valid_with(&mut setting, json!(["23:45"])));
        assert!(!valid_with(&mut setting, json!(3.14)));
    }

    #[test]
    fn test_list_values() {
        let mut setting = text_setting();
        setting.set(&record(json!({ "type": "list", "default_value": "1" }))).unwrap();
        assert!(!setting.is_valid());

        setting.set(&record(json!({ "options": ["1", "2", "3"] }))).unwrap();
        assert!(setting.is_valid());
        assert!(!valid_with(&mut setting, json!("hi")));
        assert!(!valid_with(&mut setting, json!(["1"])));

        setting
            .set(&record(json!({
                "options": [
                    { "label": "label1", "value": "1" },
                    { "label": "label2", "value": "2" }
                ],
                "default_value": "2"
            })))
            .unwrap();
        assert!(setting.is_valid());
        assert_eq!(setting.options()[0].label, "label1");
    }

    #[test]
    fn test_multilist_values() {
        let mut setting = text_setting();
        setting.set(&record(json!({ "type": "multilist", "default_value": ["1", "2"] }))).unwrap();
        assert!(!setting.is_valid());

        setting.set(&record(json!({ "options": ["1", "2", "3"] }))).unwrap();
        assert!(setting.is_valid());
        assert!(!valid_with(&mut setting, json!(["1", "4"])));
        assert!(!valid_with(&mut setting, json!("1")));
    }

    #[test]
    fn test_default_course_setting() {
        let setting = CourseSetting::empty().unwrap();
        assert_eq!(
            Value::Object(setting.to_object()),
            json!({
                "setting_id": 0,
                "course_id": 0,
                "course_setting_id": 0,
                "setting_name": "",
                "default_value": "",
                "category": "",
                "description": "",
                "value": "",
                "type": "unknown"
            })
        );
    }

    #[test]
    fn test_course_setting_value_falls_back() {
        let mut setting = CourseSetting::new(&record(json!({
            "setting_name": "time_due",
            "default_value": "23:59",
            "description": "The time that is due",
            "type": "time",
            "category": "general",
            "course_id": "5"
        })))
        .unwrap();
        assert_eq!(setting.value(), &json!("23:59"));
        assert!(setting.is_valid());

        setting.set(&record(json!({ "value": "25:00" }))).unwrap();
        assert_eq!(setting.value(), &json!("25:00"));
        assert!(!setting.is_valid());
        assert_eq!(setting.course_id(), 5);
    }

    #[test]
    fn test_default_db_course_setting() {
        let setting = DbCourseSetting::empty().unwrap();
        assert_eq!(
            Value::Object(setting.to_object()),
            json!({ "course_setting_id": 0, "course_id": 0, "setting_id": 0 })
        );
        assert!(setting.value().is_none());
    }

    #[test]
    fn test_db_course_setting_fields() {
        let mut setting = DbCourseSetting::new(&record(json!({
            "course_setting_id": 10,
            "course_id": "34",
            "setting_id": 199,
            "value": "xyz"
        })))
        .unwrap();
        assert_eq!(setting.course_setting_id(), 10);
        assert_eq!(setting.course_id(), 34);
        assert_eq!(setting.setting_id(), 199);
        assert_eq!(setting.value(), Some(&json!("xyz")));

        setting.set(&record(json!({ "setting_id": 25, "value": 6 }))).unwrap();
        assert_eq!(setting.setting_id(), 25);
        assert_eq!(setting.value(), Some(&json!(6)));
        assert_eq!(setting.course_setting_id(), 10);
    }

    #[test]
    fn test_db_course_setting_rejects_declaration_fields() {
        let err = DbCourseSetting::new(&record(json!({ "setting_name": "description" }))).unwrap_err();
        assert_eq!(err.kind(), crate::model::ParseErrorKind::UnknownFields);
        assert_eq!(err.fields(), ["setting_name"]);
    }
}
