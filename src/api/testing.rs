//! Router-level test harness: in-memory database, temp storage, and a
//! recording stand-in for the remote functions

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::api::build_router;
use crate::api::middleware::AppState;
use crate::cache::create_test_cache;
use crate::config::{AdminConfig, Config, StorageConfig};
use crate::db::create_test_pool;
use crate::db::migrations::run_migrations;
use crate::functions::{
    AutomationRequest, FunctionError, RemoteFunctions, SendEmailRequest, SendEmailResponse,
};
use crate::services::LoginInput;
use crate::storage::LocalStorage;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

#[derive(Default)]
pub struct RecordingFunctions {
    pub emails: Mutex<Vec<SendEmailRequest>>,
    pub automations: Mutex<Vec<AutomationRequest>>,
}

#[async_trait]
impl RemoteFunctions for RecordingFunctions {
    async fn send_email(
        &self,
        request: &SendEmailRequest,
    ) -> Result<SendEmailResponse, FunctionError> {
        let sent = match &request.to {
            crate::functions::Recipients::One(_) => 1,
            crate::functions::Recipients::Many(list) => list.len() as i64,
        };
        self.emails.lock().unwrap().push(request.clone());
        Ok(SendEmailResponse {
            total_sent: sent,
            total_failed: 0,
            message: None,
        })
    }

    async fn email_automation(&self, request: &AutomationRequest) -> Result<Value, FunctionError> {
        self.automations.lock().unwrap().push(request.clone());
        Ok(json!({ "queued": true }))
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub functions: Arc<RecordingFunctions>,
    pub storage_dir: TempDir,
}

impl TestApp {
    /// Bootstrap the admin account and log in, returning the session token
    pub async fn admin_token(&self) -> String {
        self.state
            .auth
            .bootstrap_admin(&AdminConfig {
                email: Some(ADMIN_EMAIL.into()),
                password: Some(ADMIN_PASSWORD.into()),
            })
            .await
            .unwrap();
        self.state
            .auth
            .login(LoginInput {
                email: ADMIN_EMAIL.into(),
                password: ADMIN_PASSWORD.into(),
            })
            .await
            .unwrap()
            .token
    }
}

pub async fn test_app() -> TestApp {
    test_app_with(|_| {}).await
}

/// Like [`test_app`], with a hook to adjust the configuration first
pub async fn test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let storage_dir = tempfile::tempdir().unwrap();
    let mut config = Config {
        storage: StorageConfig {
            path: storage_dir.path().to_path_buf(),
            ..Default::default()
        },
        ..Default::default()
    };
    configure(&mut config);

    let pool = create_test_pool().await.unwrap();
    run_migrations(&pool).await.unwrap();
    let functions = Arc::new(RecordingFunctions::default());
    let state = AppState::new(
        pool,
        create_test_cache(),
        LocalStorage::boxed(&config.storage),
        functions.clone(),
        &config,
    );

    let server = TestServer::new(build_router(state.clone(), &config)).unwrap();
    TestApp {
        server,
        state,
        functions,
        storage_dir,
    }
}
