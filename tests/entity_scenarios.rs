//! Entity and store scenarios through the public API

use courseware::entities::{
    Course, CourseSetting, CourseUser, Entity, MergedUser, MergedUserSet, ProblemSet, ProblemSetType,
    SettingType, UserSet,
};
use courseware::model::{ParseErrorKind, Record, UserRole};
use courseware::store::{ProblemSetStore, StoreConfig, StoreError, UserStore};
use serde_json::{json, Value};

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn test_course_user_roles() {
    let err = CourseUser::new(&record(json!({ "role": "superhero" }))).unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::InvalidRole);

    let cu = CourseUser::new(&record(json!({ "role": "student" }))).unwrap();
    assert_eq!(cu.role(), Some(UserRole::Student));
}

#[test]
fn test_merged_user_serializes_flat() {
    let merged = MergedUser::new(&record(json!({
        "username": "homer@msn.com",
        "role": "instructor",
        "course_id": 3
    })))
    .unwrap();
    let value = serde_json::to_value(&merged).unwrap();
    assert_eq!(value["username"], "homer@msn.com");
    assert_eq!(value["role"], "instructor");
    assert_eq!(value["course_user_id"], 0);
    assert_eq!(value["is_admin"], false);
}

#[test]
fn test_course_serializes_nested_dates() {
    let course = Course::new(&record(json!({
        "course_name": "Topology",
        "course_dates": { "start": "2022-01-10", "end": "2022-05-01" }
    })))
    .unwrap();
    assert_eq!(
        serde_json::to_value(&course).unwrap(),
        json!({
            "course_id": 0,
            "course_name": "Topology",
            "visible": true,
            "course_dates": { "start": "2022-01-10", "end": "2022-05-01" }
        })
    );
}

#[test]
fn test_problem_set_from_api_record() {
    let set = ProblemSet::parse(&record(json!({
        "set_id": "7",
        "set_name": "HW #7",
        "course_id": 2,
        "set_type": "hw",
        "set_visible": 1,
        "set_dates": { "open": "100", "reduced_scoring": 150, "due": 200, "answer": 300 },
        "set_params": { "enable_reduced_scoring": "true", "hide_hint": 0 }
    })))
    .unwrap();

    assert_eq!(set.set_type(), ProblemSetType::Homework);
    assert_eq!(set.set_id(), 7);
    assert!(set.set_visible());
    assert!(set.reduced_scoring_enabled());
    assert!(set.is_valid());
    assert_eq!(set.to_object()["set_type"], json!("HW"));
    assert_eq!(set.to_object()["set_params"]["hide_hint"], json!(false));
}

#[test]
fn test_course_setting_lifecycle() {
    let mut setting = CourseSetting::new(&record(json!({
        "setting_name": "num_attempts",
        "category": "problems",
        "description": "Number of attempts",
        "type": "int",
        "default_value": 3
    })))
    .unwrap();
    assert_eq!(setting.setting_type(), SettingType::Int);
    assert!(setting.is_valid());

    setting.set(&record(json!({ "value": "many" }))).unwrap();
    assert!(!setting.is_valid());
    setting.set(&record(json!({ "value": 5 }))).unwrap();
    assert!(setting.is_valid());
    assert_eq!(serde_json::to_value(&setting).unwrap()["value"], json!(5));
}

#[test]
fn test_user_store_hydration_modes() {
    let batch = [
        json!({ "username": "homer" }),
        json!({ "username": "homer", "email": "bad email" }),
    ];

    let mut strict = UserStore::new(StoreConfig::strict());
    match strict.set_users(&batch).unwrap_err() {
        StoreError::InvalidRecord { index, source } => {
            assert_eq!(index, 1);
            assert_eq!(source.kind(), ParseErrorKind::InvalidEmail);
        }
        other => panic!("unexpected error {other:?}"),
    }

    let mut lenient = UserStore::new(StoreConfig::lenient());
    assert_eq!(lenient.set_users(&batch).unwrap(), 1);
}

#[test]
fn test_problem_set_store_flow() {
    let config = StoreConfig::from_json_str(r#"{ "course_id": 4, "skip_invalid_records": true }"#).unwrap();
    let mut store = ProblemSetStore::new(config);
    store
        .set_problem_sets(&[
            json!({ "set_id": 1, "set_name": "Quiz A", "set_type": "QUIZ" }),
            json!({ "set_id": 2, "set_name": "Broken", "set_type": "QUIZ", "set_dates": { "closed": 1 } }),
        ])
        .unwrap();
    assert_eq!(store.problem_sets().len(), 1);

    let mut fresh = store.new_problem_set(ProblemSetType::Review).unwrap();
    fresh.set(&record(json!({ "set_id": 5, "set_name": "Final review" }))).unwrap();
    store.add_problem_set(fresh).unwrap();

    assert_eq!(store.find_by_name("Final review").unwrap().course_id(), 4);
    store
        .update_problem_set(5, &record(json!({ "set_dates": { "open": 10, "closed": 5 } })))
        .unwrap();
    assert!(!store.find_by_id(5).unwrap().is_valid());
}

#[test]
fn test_user_set_overrides_problem_set_dates() {
    let mut store = ProblemSetStore::new(StoreConfig::strict().with_course_id(4));
    store
        .set_problem_sets(&[json!({
            "set_id": 7,
            "set_name": "HW #2",
            "set_type": "hw",
            "set_visible": true,
            "set_dates": { "open": 100, "due": 200, "answer": 300 }
        })])
        .unwrap();
    let homework = store.find_by_id(7).unwrap();

    let users = {
        let mut users = UserStore::new(StoreConfig::strict());
        users.set_users(&[json!({ "username": "bart", "user_id": 3 })]).unwrap();
        users
            .set_course_users(&[json!({ "course_user_id": 30, "user_id": 3, "role": "student" })])
            .unwrap();
        users
    };
    let course_user = users.find_course_user(30).unwrap();
    let username = users.find_user_by_id(course_user.user_id()).unwrap().username();

    let extension = UserSet::new(
        homework.set_type(),
        &record(json!({
            "course_user_id": course_user.course_user_id(),
            "set_dates": { "open": 100, "due": 250, "answer": 240 }
        })),
    )
    .unwrap();
    assert!(!extension.has_valid_dates());

    let mut merged = MergedUserSet::merge(homework, &extension, username).unwrap();
    assert_eq!(merged.set_id(), 7);
    assert_eq!(merged.username(), Some("bart"));
    assert!(merged.set_visible());
    merged.set(&record(json!({ "set_dates": { "answer": 400 } }))).unwrap();
    assert!(merged.has_valid_dates());
    assert_eq!(merged.user_set().unwrap().date("answer"), Some(400));
}
