#![allow(dead_code)]

use std::sync::Arc;

use fileos::api::dto::LoginRequest;
use fileos::client::ApiClient;
use fileos::config::{AuthConfig, Config, ServerConfig, StorageConfig};
use fileos::object_store::LocalStore;
use fileos::storage::Database;
use fileos::AppState;

pub struct TestServer {
    pub base_url: String,
    pub state: Arc<AppState>,
    pub upload_dir: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

impl TestServer {
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url)
    }

    /// A client logged in as `user_id`.
    pub async fn login(&self, user_id: &str) -> ApiClient {
        let mut client = self.client();
        client
            .login(&claims(user_id), self.state.config.auth.shared_secret.as_deref())
            .await
            .expect("login should succeed");
        client
    }

    /// Number of blobs in the upload directory.
    pub fn stored_blobs(&self) -> usize {
        std::fs::read_dir(&self.upload_dir).unwrap().count()
    }
}

pub fn claims(user_id: &str) -> LoginRequest {
    LoginRequest {
        id: user_id.to_string(),
        email: Some(format!("{user_id}@example.com")),
        first_name: Some(user_id.to_string()),
        ..Default::default()
    }
}

pub async fn spawn_server() -> TestServer {
    spawn_server_with(|_| {}).await
}

/// Serve a fresh app on an ephemeral port with isolated data and upload directories.
pub async fn spawn_server_with(configure: impl FnOnce(&mut Config)) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let upload_dir = dir.path().join("uploads");

    let mut config = Config {
        auth: AuthConfig::default(),
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.display().to_string(),
        },
        storage: StorageConfig {
            upload_dir: upload_dir.display().to_string(),
            ..Default::default()
        },
        test_mode: true,
    };
    configure(&mut config);

    let db = Database::open(&data_dir).unwrap();
    let store = LocalStore::new(&upload_dir).unwrap();
    let state = Arc::new(AppState {
        config,
        db,
        object_store: Arc::new(store),
    });

    let app = fileos::api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}"),
        state,
        upload_dir,
        _dir: dir,
    }
}
