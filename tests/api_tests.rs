mod common;

use chrono::{Duration, Utc};
use common::{claims, spawn_server, spawn_server_with};
use fileos::api::dto::{UpdateFileRequest, UpdateSettingsRequest};
use fileos::client::{ClientError, UploadFile};
use fileos::storage::models::SessionRecord;
use reqwest::StatusCode;

fn status_of<T: std::fmt::Debug>(result: Result<T, ClientError>) -> StatusCode {
    result
        .expect_err("request should fail")
        .status()
        .expect("error should carry a status")
}

// ============================================================================
// Session
// ============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let server = spawn_server().await;
    let body: serde_json::Value = reqwest::get(format!("{}/_internal/health", server.base_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_requests_without_session_are_rejected() {
    let server = spawn_server().await;
    let client = server.client();

    assert_eq!(status_of(client.list_files().await), StatusCode::UNAUTHORIZED);
    assert_eq!(status_of(client.current_user().await), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_and_current_user() {
    let server = spawn_server().await;
    let client = server.login("alice").await;

    let user = client.current_user().await.unwrap();
    assert_eq!(user.id, "alice");
    assert_eq!(user.email.as_deref(), Some("alice@example.com"));
    assert_eq!(user.display_name, "alice");
}

#[tokio::test]
async fn test_login_requires_shared_secret_when_configured() {
    let server = spawn_server_with(|config| {
        config.auth.shared_secret = Some("s3cret".to_string());
    })
    .await;

    let mut client = server.client();
    let err = client.login(&claims("alice"), None).await;
    assert_eq!(status_of(err), StatusCode::UNAUTHORIZED);

    let err = client.login(&claims("alice"), Some("wrong")).await;
    assert_eq!(status_of(err), StatusCode::UNAUTHORIZED);

    client.login(&claims("alice"), Some("s3cret")).await.unwrap();
    assert!(client.list_files().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_login_closed_without_secret_outside_test_mode() {
    let server = spawn_server_with(|config| config.test_mode = false).await;

    let mut client = server.client();
    let err = client.login(&claims("alice"), None).await;
    assert_eq!(status_of(err), StatusCode::UNAUTHORIZED);
    assert!(!client.is_logged_in());
    assert!(server.state.db.get_user("alice").unwrap().is_none());
}

#[tokio::test]
async fn test_login_with_secret_outside_test_mode() {
    let server = spawn_server_with(|config| {
        config.test_mode = false;
        config.auth.shared_secret = Some("s3cret".to_string());
    })
    .await;

    let mut client = server.client();
    client.login(&claims("alice"), Some("s3cret")).await.unwrap();
    assert_eq!(client.current_user().await.unwrap().id, "alice");
}

#[tokio::test]
async fn test_login_sweeps_expired_sessions() {
    let server = spawn_server().await;
    let now = Utc::now();
    server
        .state
        .db
        .put_session(&SessionRecord {
            id: "abandoned".to_string(),
            user_id: "bob".to_string(),
            created_at: now - Duration::days(30),
            expires_at: now - Duration::days(23),
        })
        .unwrap();

    let client = server.login("alice").await;
    assert!(server.state.db.get_session("abandoned").unwrap().is_none());
    assert!(client.list_files().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_login_rejects_empty_id() {
    let server = spawn_server().await;
    let mut client = server.client();
    let err = client.login(&claims("  "), None).await;
    assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let server = spawn_server().await;
    let mut client = server.login("alice").await;
    let stale = client.clone();

    client.logout().await.unwrap();
    assert!(!client.is_logged_in());
    assert_eq!(status_of(stale.list_files().await), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Upload and listing
// ============================================================================

#[tokio::test]
async fn test_upload_text_file() {
    let server = spawn_server().await;
    let client = server.login("alice").await;

    let uploaded = client
        .upload(&[UploadFile::new("notes.txt", "hello")])
        .await
        .unwrap();
    assert_eq!(uploaded.len(), 1);

    let files = client.list_files().await.unwrap();
    assert_eq!(files.len(), 1);
    let file = &files[0];
    assert_eq!(file.name, "notes");
    assert_eq!(file.extension, "txt");
    assert_eq!(file.mime_type, "text/plain");
    assert_eq!(file.content.as_deref(), Some("hello"));
    assert_eq!(file.size, 5);
    assert!(!file.is_deleted);

    let x = file.position_x.unwrap();
    let y = file.position_y.unwrap();
    assert!((16..416).contains(&x));
    assert!((16..316).contains(&y));

    let bytes = client.file_content(&file.id).await.unwrap();
    assert_eq!(&bytes[..], b"hello");
    assert_eq!(server.stored_blobs(), 1);
}

#[tokio::test]
async fn test_upload_multiple_and_binary_files() {
    let server = spawn_server().await;
    let client = server.login("alice").await;

    let uploaded = client
        .upload(&[
            UploadFile::new("photo.PNG", vec![0x89u8, b'P', b'N', b'G']).with_content_type("image/png"),
            UploadFile::new("Makefile", "all:\n"),
        ])
        .await
        .unwrap();
    assert_eq!(uploaded.len(), 2);

    let photo = &uploaded[0];
    assert_eq!(photo.extension, "png");
    assert_eq!(photo.mime_type, "image/png");
    assert!(photo.content.is_none());

    let unknown = &uploaded[1];
    assert_eq!(unknown.name, "Makefile");
    assert_eq!(unknown.extension, "bin");
    assert!(unknown.content.is_none());

    assert_eq!(client.list_files().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_upload_limits() {
    let server = spawn_server_with(|config| {
        config.storage.max_upload_size = 16;
        config.storage.max_upload_files = 2;
    })
    .await;
    let client = server.login("alice").await;

    let too_large = client
        .upload(&[UploadFile::new("big.txt", vec![b'x'; 64])])
        .await;
    assert_eq!(status_of(too_large), StatusCode::PAYLOAD_TOO_LARGE);

    let too_many = client
        .upload(&[
            UploadFile::new("a.txt", "a"),
            UploadFile::new("b.txt", "b"),
            UploadFile::new("c.txt", "c"),
        ])
        .await;
    assert_eq!(status_of(too_many), StatusCode::BAD_REQUEST);

    let empty = client.upload(&[]).await;
    assert_eq!(status_of(empty), StatusCode::BAD_REQUEST);

    assert!(client.list_files().await.unwrap().is_empty());
    assert_eq!(server.stored_blobs(), 0);
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
async fn test_other_users_files_are_forbidden() {
    let server = spawn_server().await;
    let alice = server.login("alice").await;
    let bob = server.login("bob").await;

    let file = alice
        .upload(&[UploadFile::new("private.txt", "secret")])
        .await
        .unwrap()
        .remove(0);

    assert!(bob.list_files().await.unwrap().is_empty());
    assert_eq!(status_of(bob.get_file(&file.id).await), StatusCode::FORBIDDEN);
    assert_eq!(status_of(bob.file_content(&file.id).await), StatusCode::FORBIDDEN);
    assert_eq!(
        status_of(bob.update_file(&file.id, &UpdateFileRequest::rename("mine")).await),
        StatusCode::FORBIDDEN
    );
    assert_eq!(status_of(bob.delete_file(&file.id).await), StatusCode::FORBIDDEN);
    assert_eq!(status_of(bob.share_file(&file.id).await), StatusCode::FORBIDDEN);
    assert_eq!(
        status_of(bob.permanent_delete_file(&file.id).await),
        StatusCode::FORBIDDEN
    );

    assert_eq!(alice.get_file(&file.id).await.unwrap().name, "private");
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let server = spawn_server().await;
    let client = server.login("alice").await;

    assert_eq!(status_of(client.get_file("missing").await), StatusCode::NOT_FOUND);
    assert_eq!(status_of(client.delete_file("missing").await), StatusCode::NOT_FOUND);
    assert_eq!(status_of(client.restore_file("missing").await), StatusCode::NOT_FOUND);
    assert_eq!(status_of(client.file_content("missing").await), StatusCode::NOT_FOUND);
}

// ============================================================================
// Updates
// ============================================================================

#[tokio::test]
async fn test_update_file_fields() {
    let server = spawn_server().await;
    let client = server.login("alice").await;
    let file = client
        .upload(&[UploadFile::new("notes.txt", "hello")])
        .await
        .unwrap()
        .remove(0);

    let renamed = client
        .update_file(&file.id, &UpdateFileRequest::rename("todo"))
        .await
        .unwrap();
    assert_eq!(renamed.file_name(), "todo.txt");

    let edited = client
        .update_file(&file.id, &UpdateFileRequest::content("hello, world"))
        .await
        .unwrap();
    assert_eq!(edited.content.as_deref(), Some("hello, world"));
    assert_eq!(edited.size, 12);
    assert_eq!(
        &client.file_content(&file.id).await.unwrap()[..],
        b"hello, world"
    );

    let moved = client
        .update_file(&file.id, &UpdateFileRequest::position(160, 80))
        .await
        .unwrap();
    assert_eq!((moved.position_x, moved.position_y), (Some(160), Some(80)));

    let cleared = client
        .update_file(
            &file.id,
            &UpdateFileRequest {
                position_x: Some(None),
                position_y: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!((cleared.position_x, cleared.position_y), (None, None));
    assert_eq!(cleared.name, "todo");
}

#[tokio::test]
async fn test_update_file_validation() {
    let server = spawn_server().await;
    let client = server.login("alice").await;
    let file = client
        .upload(&[UploadFile::new("notes.txt", "hello")])
        .await
        .unwrap()
        .remove(0);

    let empty = client
        .update_file(&file.id, &UpdateFileRequest::default())
        .await;
    assert_eq!(status_of(empty), StatusCode::BAD_REQUEST);

    let blank = client
        .update_file(&file.id, &UpdateFileRequest::rename("   "))
        .await;
    assert_eq!(status_of(blank), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_content_update_leaves_media_bytes_alone() {
    let server = spawn_server().await;
    let client = server.login("alice").await;
    let png = vec![0x89u8, b'P', b'N', b'G'];
    let photo = client
        .upload(&[UploadFile::new("photo.png", png.clone()).with_content_type("image/png")])
        .await
        .unwrap()
        .remove(0);

    let updated = client
        .update_file(&photo.id, &UpdateFileRequest::content("x"))
        .await
        .unwrap();
    assert_eq!(updated.size, 4);
    assert_eq!(&client.file_content(&photo.id).await.unwrap()[..], &png[..]);
}

#[tokio::test]
async fn test_clearing_text_content_empties_stored_bytes() {
    let server = spawn_server().await;
    let client = server.login("alice").await;
    let file = client
        .upload(&[UploadFile::new("notes.txt", "hello")])
        .await
        .unwrap()
        .remove(0);

    let cleared = client
        .update_file(
            &file.id,
            &UpdateFileRequest {
                content: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.content, None);
    assert_eq!(cleared.size, 0);
    assert!(client.file_content(&file.id).await.unwrap().is_empty());
}

// ============================================================================
// Recycle bin
// ============================================================================

#[tokio::test]
async fn test_delete_restore_and_empty_trash() {
    let server = spawn_server().await;
    let client = server.login("alice").await;
    let file = client
        .upload(&[UploadFile::new("notes.txt", "hello")])
        .await
        .unwrap()
        .remove(0);

    let deleted = client.delete_file(&file.id).await.unwrap();
    assert!(deleted.is_deleted);
    assert!(deleted.deleted_at.is_some());
    assert!(client.list_files().await.unwrap().is_empty());
    assert_eq!(client.list_deleted_files().await.unwrap().len(), 1);

    let restored = client.restore_file(&file.id).await.unwrap();
    assert!(!restored.is_deleted);
    assert!(restored.deleted_at.is_none());
    assert_eq!(client.list_files().await.unwrap().len(), 1);
    assert!(client.list_deleted_files().await.unwrap().is_empty());

    client.delete_file(&file.id).await.unwrap();
    let emptied = client.empty_trash().await.unwrap();
    assert_eq!(emptied.files_deleted, 1);

    assert!(client.list_files().await.unwrap().is_empty());
    assert!(client.list_deleted_files().await.unwrap().is_empty());
    assert_eq!(status_of(client.get_file(&file.id).await), StatusCode::NOT_FOUND);
    assert_eq!(server.stored_blobs(), 0);
}

#[tokio::test]
async fn test_permanent_delete_removes_bytes() {
    let server = spawn_server().await;
    let client = server.login("alice").await;
    let files = client
        .upload(&[UploadFile::new("a.txt", "a"), UploadFile::new("b.txt", "b")])
        .await
        .unwrap();

    client.permanent_delete_file(&files[0].id).await.unwrap();

    let remaining = client.list_files().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, files[1].id);
    assert_eq!(server.stored_blobs(), 1);
}

// ============================================================================
// Sharing
// ============================================================================

#[tokio::test]
async fn test_share_and_add_as_another_user() {
    let server = spawn_server().await;
    let alice = server.login("alice").await;
    let bob = server.login("bob").await;

    let file = alice
        .upload(&[UploadFile::new("notes.txt", "hello")])
        .await
        .unwrap()
        .remove(0);
    assert!(file.share_token.is_none());

    let shared = alice.share_file(&file.id).await.unwrap();
    let token = shared.share_token.clone().expect("token should be issued");
    let again = alice.share_file(&file.id).await.unwrap();
    assert_eq!(again.share_token.as_deref(), Some(token.as_str()));

    // Public metadata needs no session
    let public = server.client().shared_file(&token).await.unwrap();
    assert_eq!(public.name, "notes");
    assert_eq!(public.extension, "txt");
    assert_eq!(public.size, 5);

    let added = bob.add_shared_file(&token).await.unwrap();
    assert_ne!(added.id, file.id);
    assert_eq!(added.owner_id, "bob");
    assert_eq!(added.name, file.name);
    assert_eq!(added.extension, file.extension);
    assert_eq!(added.content, file.content);
    assert!(added.share_token.is_none());

    let bobs = bob.list_files().await.unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].id, added.id);

    // The clone keeps its bytes after the original is gone
    alice.permanent_delete_file(&file.id).await.unwrap();
    assert_eq!(&bob.file_content(&added.id).await.unwrap()[..], b"hello");
    assert_eq!(
        status_of(server.client().shared_file(&token).await),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_unknown_share_token() {
    let server = spawn_server().await;
    let bob = server.login("bob").await;

    assert_eq!(
        status_of(bob.add_shared_file("no-such-token").await),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status_of(bob.shared_file("no-such-token").await),
        StatusCode::NOT_FOUND
    );
}

// ============================================================================
// Content
// ============================================================================

#[tokio::test]
async fn test_content_download_disposition() {
    let server = spawn_server().await;
    let client = server.login("alice").await;
    let file = client
        .upload(&[UploadFile::new("notes.txt", "hello")])
        .await
        .unwrap()
        .remove(0);

    // Log in again with a raw client to inspect response headers
    let http = reqwest::Client::new();
    let login = http
        .post(format!("{}/api/login", server.base_url))
        .json(&claims("alice"))
        .send()
        .await
        .unwrap();
    let cookie = login
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("fileos_session="));

    let url = format!("{}/api/files/{}/content", server.base_url, file.id);
    let inline = http
        .get(&url)
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(inline.status(), StatusCode::OK);
    assert_eq!(inline.headers()["content-type"], "text/plain");
    assert_eq!(
        inline.headers()["content-disposition"],
        "inline; filename=\"notes.txt\""
    );

    let download = http
        .get(format!("{url}?download=true"))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(
        download.headers()["content-disposition"],
        "attachment; filename=\"notes.txt\""
    );
    assert_eq!(download.text().await.unwrap(), "hello");
}

#[tokio::test]
async fn test_content_falls_back_to_inline_text() {
    let server = spawn_server().await;
    let client = server.login("alice").await;
    let file = client
        .upload(&[UploadFile::new("notes.txt", "hello")])
        .await
        .unwrap()
        .remove(0);

    std::fs::remove_file(server.upload_dir.join(&file.id)).unwrap();
    assert_eq!(&client.file_content(&file.id).await.unwrap()[..], b"hello");
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn test_settings_default_and_update() {
    let server = spawn_server().await;
    let client = server.login("alice").await;

    let defaults = client.get_settings().await.unwrap();
    assert_eq!(defaults.theme, "classic");
    assert!(defaults.desktop_background.is_none());
    assert!(server.state.db.get_settings("alice").unwrap().is_none());

    let updated = client
        .update_settings(&UpdateSettingsRequest {
            theme: Some("dark".to_string()),
            desktop_background: Some(Some("/bg/teal.png".to_string())),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.theme, "dark");
    assert_eq!(updated.desktop_background.as_deref(), Some("/bg/teal.png"));

    let cleared = client
        .update_settings(&UpdateSettingsRequest {
            desktop_background: Some(None),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(cleared.theme, "dark");
    assert!(cleared.desktop_background.is_none());

    let empty = client.update_settings(&UpdateSettingsRequest::default()).await;
    assert_eq!(status_of(empty), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
async fn test_purge_wipes_everything() {
    let server = spawn_server().await;
    let client = server.login("alice").await;
    client
        .upload(&[UploadFile::new("notes.txt", "hello")])
        .await
        .unwrap();

    let response = reqwest::Client::new()
        .delete(format!("{}/admin/purge", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["files_deleted"], 1);

    assert_eq!(server.stored_blobs(), 0);
    assert_eq!(status_of(client.list_files().await), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_purge_is_not_routed_outside_test_mode() {
    let server = spawn_server_with(|config| config.test_mode = false).await;

    let response = reqwest::Client::new()
        .delete(format!("{}/admin/purge", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
