use std::collections::HashMap;

use chrono::{Duration, Utc};
use fileos::storage::models::{
    FileKind, FileRecord, FileUpdate, Patch, SessionRecord, SettingsUpdate, UserRecord,
};
use fileos::storage::Database;

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    (dir, db)
}

fn sample_file(id: &str, owner_id: &str) -> FileRecord {
    let now = Utc::now();
    FileRecord {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        name: "notes".to_string(),
        extension: "txt".to_string(),
        mime_type: "text/plain".to_string(),
        size: 5,
        content: Some("hello".to_string()),
        storage_key: Some(id.to_string()),
        position_x: None,
        position_y: None,
        is_deleted: false,
        deleted_at: None,
        share_token: None,
        created_at: now,
        updated_at: now,
    }
}

fn sample_user(id: &str) -> UserRecord {
    let now = Utc::now();
    UserRecord {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
        first_name: None,
        last_name: None,
        profile_image_url: None,
        created_at: now,
        updated_at: now,
    }
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn test_put_and_get_file() {
    let (_dir, db) = test_db();
    db.put_file(&sample_file("file-1", "alice")).unwrap();

    let retrieved = db.get_file("file-1").unwrap().expect("file should exist");
    assert_eq!(retrieved.owner_id, "alice");
    assert_eq!(retrieved.file_name(), "notes.txt");
    assert_eq!(retrieved.kind(), FileKind::Text);
    assert_eq!(retrieved.content.as_deref(), Some("hello"));
}

#[test]
fn test_get_file_not_found() {
    let (_dir, db) = test_db();
    assert!(db.get_file("nonexistent").unwrap().is_none());
}

#[test]
fn test_files_are_scoped_to_owner() {
    let (_dir, db) = test_db();
    db.put_files(&[
        sample_file("a-1", "alice"),
        sample_file("a-2", "alice"),
        sample_file("b-1", "bob"),
    ])
    .unwrap();

    let alice: Vec<String> = db
        .get_files_by_owner("alice")
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(alice, vec!["a-1", "a-2"]);
    assert_eq!(db.get_files_by_owner("bob").unwrap().len(), 1);
    assert!(db.get_files_by_owner("carol").unwrap().is_empty());
}

#[test]
fn test_update_file_partial() {
    let (_dir, db) = test_db();
    let mut file = sample_file("file-1", "alice");
    file.position_x = Some(10);
    file.position_y = Some(20);
    db.put_file(&file).unwrap();

    let update = FileUpdate {
        name: Some("renamed".to_string()),
        position_x: Patch::Value(160),
        position_y: Patch::Null,
        ..Default::default()
    };
    let updated = db.update_file("file-1", &update).unwrap().unwrap();

    assert_eq!(updated.name, "renamed");
    assert_eq!(updated.position_x, Some(160));
    assert_eq!(updated.position_y, None);
    assert_eq!(updated.content.as_deref(), Some("hello"));
    assert!(updated.updated_at >= file.updated_at);
}

#[test]
fn test_update_missing_file_returns_none() {
    let (_dir, db) = test_db();
    let update = FileUpdate {
        name: Some("x".to_string()),
        ..Default::default()
    };
    assert!(db.update_file("missing", &update).unwrap().is_none());
}

#[test]
fn test_soft_delete_and_restore() {
    let (_dir, db) = test_db();
    db.put_file(&sample_file("file-1", "alice")).unwrap();

    let deleted = db.soft_delete_file("file-1").unwrap().unwrap();
    assert!(deleted.is_deleted);
    assert!(deleted.deleted_at.is_some());
    assert!(db.list_files("alice", false).unwrap().is_empty());
    assert_eq!(db.list_files("alice", true).unwrap().len(), 1);

    let restored = db.restore_file("file-1").unwrap().unwrap();
    assert!(!restored.is_deleted);
    assert!(restored.deleted_at.is_none());
    assert_eq!(db.list_files("alice", false).unwrap().len(), 1);
    assert!(db.list_files("alice", true).unwrap().is_empty());
}

#[test]
fn test_delete_file_removes_indexes() {
    let (_dir, db) = test_db();
    db.put_file(&sample_file("file-1", "alice")).unwrap();
    db.issue_share_token("file-1", "tok-1").unwrap();

    let removed = db.delete_file("file-1").unwrap().expect("file should be removed");
    assert_eq!(removed.share_token.as_deref(), Some("tok-1"));

    assert!(db.get_file("file-1").unwrap().is_none());
    assert!(db.get_files_by_owner("alice").unwrap().is_empty());
    assert!(db.get_file_by_share_token("tok-1").unwrap().is_none());
    assert!(db.delete_file("file-1").unwrap().is_none());
}

#[test]
fn test_empty_trash_only_touches_deleted_files_of_owner() {
    let (_dir, db) = test_db();
    db.put_files(&[
        sample_file("a-1", "alice"),
        sample_file("a-2", "alice"),
        sample_file("b-1", "bob"),
    ])
    .unwrap();
    db.soft_delete_file("a-1").unwrap();
    db.soft_delete_file("b-1").unwrap();

    let removed = db.empty_trash("alice").unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].id, "a-1");

    assert!(db.get_file("a-1").unwrap().is_none());
    assert!(db.get_file("a-2").unwrap().is_some());
    assert_eq!(db.list_files("bob", true).unwrap().len(), 1);
}

#[test]
fn test_issue_share_token_is_idempotent() {
    let (_dir, db) = test_db();
    db.put_file(&sample_file("file-1", "alice")).unwrap();

    let first = db.issue_share_token("file-1", "tok-1").unwrap().unwrap();
    let second = db.issue_share_token("file-1", "tok-2").unwrap().unwrap();

    assert_eq!(first.share_token.as_deref(), Some("tok-1"));
    assert_eq!(second.share_token.as_deref(), Some("tok-1"));
    assert!(db.get_file_by_share_token("tok-2").unwrap().is_none());

    let resolved = db.get_file_by_share_token("tok-1").unwrap().unwrap();
    assert_eq!(resolved.id, "file-1");
}

#[test]
fn test_issue_share_token_missing_file() {
    let (_dir, db) = test_db();
    assert!(db.issue_share_token("missing", "tok").unwrap().is_none());
    assert!(db.get_file_by_share_token("tok").unwrap().is_none());
}

// ============================================================================
// Users, sessions and settings
// ============================================================================

#[test]
fn test_upsert_user_keeps_created_at() {
    let (_dir, db) = test_db();
    let first = db.upsert_user(&sample_user("alice")).unwrap();

    let mut changed = sample_user("alice");
    changed.first_name = Some("Alice".to_string());
    changed.created_at = Utc::now() + Duration::days(1);
    let second = db.upsert_user(&changed).unwrap();

    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.display_name(), "Alice");
    assert_eq!(
        db.get_user("alice").unwrap().unwrap().first_name.as_deref(),
        Some("Alice")
    );
}

#[test]
fn test_display_name_falls_back_to_email() {
    assert_eq!(sample_user("alice").display_name(), "alice");

    let mut anonymous = sample_user("anon");
    anonymous.email = None;
    assert_eq!(anonymous.display_name(), "User");
}

#[test]
fn test_session_lifecycle() {
    let (_dir, db) = test_db();
    let now = Utc::now();
    let session = SessionRecord {
        id: "session-1".to_string(),
        user_id: "alice".to_string(),
        created_at: now,
        expires_at: now + Duration::hours(1),
    };
    db.put_session(&session).unwrap();

    let stored = db.get_session("session-1").unwrap().unwrap();
    assert_eq!(stored.user_id, "alice");
    assert!(!stored.is_expired(now));
    assert!(stored.is_expired(now + Duration::hours(2)));

    assert!(db.delete_session("session-1").unwrap());
    assert!(!db.delete_session("session-1").unwrap());
    assert!(db.get_session("session-1").unwrap().is_none());
}

#[test]
fn test_purge_expired_sessions_keeps_live_ones() {
    let (_dir, db) = test_db();
    let now = Utc::now();
    let session = |id: &str, expires_at| SessionRecord {
        id: id.to_string(),
        user_id: "alice".to_string(),
        created_at: now - Duration::hours(3),
        expires_at,
    };
    db.put_session(&session("stale-1", now - Duration::hours(2))).unwrap();
    db.put_session(&session("stale-2", now - Duration::seconds(1))).unwrap();
    db.put_session(&session("live", now + Duration::hours(1))).unwrap();

    assert_eq!(db.purge_expired_sessions(now).unwrap(), 2);
    assert!(db.get_session("stale-1").unwrap().is_none());
    assert!(db.get_session("stale-2").unwrap().is_none());
    assert!(db.get_session("live").unwrap().is_some());

    assert_eq!(db.purge_expired_sessions(now).unwrap(), 0);
}

#[test]
fn test_settings_upsert() {
    let (_dir, db) = test_db();
    assert!(db.get_settings("alice").unwrap().is_none());

    let created = db
        .upsert_settings(
            "alice",
            &SettingsUpdate {
                desktop_background: Patch::Value("/backgrounds/teal.png".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(created.theme, "classic");
    assert_eq!(
        created.desktop_background.as_deref(),
        Some("/backgrounds/teal.png")
    );

    let colors = HashMap::from([("desktop".to_string(), "180 30% 35%".to_string())]);
    let updated = db
        .upsert_settings(
            "alice",
            &SettingsUpdate {
                theme: Some("dark".to_string()),
                desktop_background: Patch::Null,
                custom_colors: Patch::Value(colors.clone()),
            },
        )
        .unwrap();
    assert_eq!(updated.theme, "dark");
    assert_eq!(updated.desktop_background, None);
    assert_eq!(updated.custom_colors, Some(colors));
    assert_eq!(updated.created_at, created.created_at);

    assert_eq!(db.get_settings("alice").unwrap().unwrap(), updated);
}

#[test]
fn test_purge_all() {
    let (_dir, db) = test_db();
    db.put_files(&[sample_file("a-1", "alice"), sample_file("b-1", "bob")])
        .unwrap();
    db.upsert_user(&sample_user("alice")).unwrap();

    let stats = db.purge_all().unwrap();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.users, 1);

    assert!(db.get_file("a-1").unwrap().is_none());
    assert!(db.get_file("b-1").unwrap().is_none());
    assert!(db.get_files_by_owner("alice").unwrap().is_empty());
    assert!(db.get_user("alice").unwrap().is_none());

    // Tables are usable again after a purge
    db.put_file(&sample_file("c-1", "carol")).unwrap();
    assert_eq!(db.get_files_by_owner("carol").unwrap().len(), 1);
}

#[test]
fn test_kind_lookup_is_case_insensitive() {
    assert_eq!(FileKind::from_extension("PNG"), FileKind::Image);
    assert_eq!(FileKind::from_extension("Md"), FileKind::Text);
    assert_eq!(FileKind::from_extension("flac"), FileKind::Audio);
    assert_eq!(FileKind::from_extension("mkv"), FileKind::Video);
    assert_eq!(FileKind::from_extension("exe"), FileKind::Other);
}
