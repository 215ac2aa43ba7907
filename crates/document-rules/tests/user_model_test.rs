//! 用户模型集成测试

use document_rules::{
    DateObject, Emails, FromSnapshot, Gender, MemoryCollection, Snapshot, Timestamp, User,
    UserDocument, timestamp::SERVER_TIMESTAMP_SENTINEL,
};
use serde_json::json;

const RULES: [&str; 9] = [
    "firstName required",
    "firstName minLength",
    "firstName maxLength",
    "lastName required",
    "lastName minLength",
    "lastName maxLength",
    "uid required",
    "gender required",
    "email pattern",
];

fn user() -> UserDocument {
    UserDocument::new(User {
        uid: Some("1234".to_string()),
        first_name: Some("Nathan".to_string()),
        last_name: Some("Nelson".to_string()),
        gender: Some(Gender::Male),
        emails: Some(Emails {
            primary: Some("email@email.com".to_string()),
            secondary: None,
        }),
        ..Default::default()
    })
}

fn assert_fails(doc: &UserDocument, rule: &str) {
    let errors = doc.validate().unwrap_or_default();
    assert!(errors.contains(rule), "期望 {} 失败，实际 {:?}", rule, errors);
}

#[test]
fn test_rule_order() {
    let rules = UserDocument::shared_rules();
    assert_eq!(rules.names().collect::<Vec<_>>(), RULES.to_vec());
}

#[test]
fn test_valid_user() {
    assert!(user().validate_all().is_none());
}

#[test]
fn test_first_name_rules() {
    let mut doc = user();
    doc.attributes_mut().first_name = None;
    assert_fails(&doc, RULES[0]);

    doc.attributes_mut().first_name = Some("Me".to_string());
    assert_fails(&doc, RULES[1]);

    doc.attributes_mut().first_name = Some("H".repeat(60));
    assert_fails(&doc, RULES[2]);
}

#[test]
fn test_last_name_rules() {
    let mut doc = user();
    doc.attributes_mut().last_name = None;
    assert_fails(&doc, RULES[3]);

    doc.attributes_mut().last_name = Some("Me".to_string());
    assert_fails(&doc, RULES[4]);

    doc.attributes_mut().last_name = Some("H".repeat(60));
    assert_fails(&doc, RULES[5]);
}

#[test]
fn test_uid_and_gender_rules() {
    let mut doc = user();
    doc.attributes_mut().uid = None;
    assert_fails(&doc, RULES[6]);

    let mut doc = user();
    doc.attributes_mut().gender = None;
    assert_fails(&doc, RULES[7]);
}

#[test]
fn test_email_rules() {
    let mut doc = user();
    doc.attributes_mut().emails = None;
    assert!(doc.validate().is_none());

    doc.attributes_mut().emails = Some(Emails::default());
    assert!(doc.validate().is_none());

    for invalid in [
        "email@email.coooomm",
        "email@email.c",
        "@email.com",
        "emailemail.com",
    ] {
        doc.attributes_mut().emails = Some(Emails {
            primary: Some(invalid.to_string()),
            secondary: None,
        });
        assert_fails(&doc, RULES[8]);
    }
}

#[test]
fn test_exhaustive_validation_of_empty_user() {
    let doc = UserDocument::new(User::default());
    let errors = doc.validate_all().unwrap();

    // 性别默认为 Unknown，长度与邮箱规则在字段缺失时通过
    assert_eq!(
        errors.names().collect::<Vec<_>>(),
        vec!["firstName required", "lastName required", "uid required"]
    );
    assert_eq!(
        doc.validate().unwrap().names().collect::<Vec<_>>(),
        vec!["uid required"]
    );
}

#[test]
fn test_from_snapshot() {
    let snapshot = Snapshot::new(
        "user-1",
        Some(json!({
            "uid": "1234",
            "firstName": "Nathan",
            "lastName": "Nelson",
            "gender": "FEMALE",
            "birthdate": "1990-06-15T00:00:00Z",
            "emails": {"primary": "email@email.com"},
            "createdOn": {"seconds": 1262304000, "nanos": 0}
        })),
    );

    let doc = UserDocument::from_snapshot(&snapshot).unwrap();
    assert_eq!(doc.id(), Some("user-1"));
    assert_eq!(doc.attributes().gender, Some(Gender::Female));
    assert_eq!(doc.birth_year(), Some(1990));
    assert_eq!(
        doc.attributes().base.created_on,
        Some(DateObject::Timestamp(Timestamp::new(1_262_304_000, 0)))
    );
    assert!(doc.validate_all().is_none());

    let missing = UserDocument::from_snapshot(&Snapshot::new("user-2", None));
    assert!(missing.is_err());
}

#[test]
fn test_store_and_reload() {
    let collection = MemoryCollection::new("users");
    let mut doc = UserDocument::create(User {
        uid: Some("1234".to_string()),
        first_name: Some("Nathan".to_string()),
        last_name: Some("Nelson".to_string()),
        ..Default::default()
    });

    let id = collection.put(&mut *doc).unwrap();
    let stored = collection.get(&id);
    let data = stored.data().unwrap();
    assert_eq!(data["gender"], json!("UNKNOWN"));
    assert_eq!(data["firstName"], json!("Nathan"));
    assert!(data["createdOn"]["seconds"].is_i64());

    let reloaded: UserDocument = collection.load(&id).unwrap();
    assert_eq!(reloaded.id(), Some(id.as_str()));
    assert_eq!(reloaded.display_name(), "Nathan Nelson");
    assert!(matches!(
        reloaded.attributes().base.updated_on,
        Some(DateObject::Timestamp(_))
    ));
}

#[test]
fn test_invalid_user_is_not_stored() {
    let collection = MemoryCollection::new("users");
    let mut doc = UserDocument::create(User::default());

    let err = collection.put(&mut *doc).unwrap_err();
    assert_eq!(err.to_string(), "User document has errors");
    assert_eq!(err.fields().map(|f| f.len()), Some(3));
    assert!(collection.is_empty());
}

#[test]
fn test_out_of_range_stored_timestamps() {
    let snapshot = Snapshot::new(
        "user-far",
        Some(json!({
            "uid": "1234",
            "createdOn": {"seconds": i64::MAX, "nanos": 0},
            "updatedOn": {"seconds": i64::MIN, "nanos": 999_999_999},
            "birthdate": {"seconds": i64::MAX, "nanos": 0}
        })),
    );

    let doc = UserDocument::from_snapshot(&snapshot).unwrap();
    assert_eq!(doc.created_on(), None);
    assert_eq!(doc.updated_on(), None);
    assert_eq!(doc.birthdate(), None);
    assert_eq!(doc.age(), None);
    assert_eq!(doc.birth_day(), None);
}

#[test]
fn test_stored_title_matching_sentinel_is_kept() {
    let collection = MemoryCollection::new("users");
    let mut doc = UserDocument::create(User {
        uid: Some("1234".to_string()),
        title: Some(SERVER_TIMESTAMP_SENTINEL.to_string()),
        first_name: Some("Nathan".to_string()),
        last_name: Some("Nelson".to_string()),
        ..Default::default()
    });

    let id = collection.put(&mut *doc).unwrap();
    let data = collection.get(&id).data().cloned().unwrap();
    assert_eq!(data["title"], json!(SERVER_TIMESTAMP_SENTINEL));
    assert!(data["createdOn"]["seconds"].is_i64());

    let reloaded: UserDocument = collection.load(&id).unwrap();
    assert_eq!(
        reloaded.attributes().title.as_deref(),
        Some(SERVER_TIMESTAMP_SENTINEL)
    );
    assert_eq!(reloaded.attributes(), doc.attributes());
}
