//! Session token storage and the authenticated-session lifecycle.
//!
//! The token is process-wide state. It lives behind [`TokenStore`] so the
//! request path can be exercised without touching the filesystem.

use crate::api::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::model::{AuthResponse, LoginRequest, SignupRequest, User};
use crate::nav::Route;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File name of the persisted token inside the data directory.
pub const TOKEN_FILE_NAME: &str = "token";

pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self);
}

/// Token persisted to a single file, readable only by the owner on unix.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let token = raw.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let mut opts = std::fs::OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        let mut file = opts
            .open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        // `mode` only applies on creation; tighten a file left by an older run
        // before the token lands in it.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("chmod {}", self.path.display()))?;
        }
        file.write_all(token.as_bytes())
            .with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "could not remove token"),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Mutex::new(token),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().ok().and_then(|t| t.clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("token store poisoned"))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.token.lock() {
            *slot = None;
        }
    }
}

/// Authenticated session: created by [`Session::init`], torn down by
/// [`Session::logout`] or by any 401 the client observes.
#[derive(Debug)]
pub struct Session {
    api: ApiClient,
    user: Option<User>,
}

impl Session {
    /// Anonymous session over `api`. Makes no request.
    pub fn new(api: ApiClient) -> Session {
        Session { api, user: None }
    }

    /// Restore a session from the stored token, if any.
    ///
    /// A token the server rejects is evicted. Network failures keep the
    /// token so a flaky connection does not force a new login.
    pub async fn init(api: ApiClient) -> Session {
        let mut session = Session::new(api);
        if session.api.tokens().load().is_some() {
            if let Err(e) = session.refresh_user().await {
                tracing::debug!(error = %e, "could not restore session");
            }
        }
        session
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn has_token(&self) -> bool {
        self.api.tokens().load().is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.has_token()
    }

    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
        totp_code: Option<String>,
    ) -> Result<AuthResponse> {
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            totp_code,
        };
        let auth = self.api.login(&req).await?;
        self.establish(&auth)?;
        Ok(auth)
    }

    pub async fn signup(&mut self, req: &SignupRequest) -> Result<AuthResponse> {
        let auth = self.api.signup(req).await?;
        self.establish(&auth)?;
        Ok(auth)
    }

    /// Exchange the current token for a fresh one.
    pub async fn refresh_token(&mut self) -> Result<AuthResponse> {
        let auth = self.api.refresh_token().await?;
        self.establish(&auth)?;
        Ok(auth)
    }

    pub async fn refresh_user(&mut self) -> ApiResult<()> {
        match self.api.me().await {
            Ok(user) => {
                self.user = Some(user);
                Ok(())
            }
            Err(e) => {
                if !matches!(e, ApiError::Transport(_)) {
                    self.api.tokens().clear();
                }
                self.user = None;
                Err(e)
            }
        }
    }

    pub fn logout(&mut self) {
        self.api.tokens().clear();
        self.user = None;
        self.api.navigator().go(Route::Login);
    }

    fn establish(&mut self, auth: &AuthResponse) -> Result<()> {
        self.api
            .tokens()
            .save(&auth.token)
            .context("persist session token")?;
        self.user = Some(auth.user.clone());
        self.api.navigator().go(Route::Dashboard);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::Navigator;
    use std::sync::Arc;

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join(TOKEN_FILE_NAME));
        assert_eq!(store.load(), None);

        store.save("abc.def").unwrap();
        assert_eq!(store.load().as_deref(), Some("abc.def"));

        store.clear();
        assert_eq!(store.load(), None);
        // Clearing twice is fine.
        store.clear();
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join(TOKEN_FILE_NAME));
        store.save("secret").unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn saving_over_a_readable_file_tightens_it() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TOKEN_FILE_NAME);
        std::fs::write(&path, "old-token-that-was-longer").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileTokenStore::new(&path);
        store.save("new").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn blank_token_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TOKEN_FILE_NAME);
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(FileTokenStore::new(path).load(), None);
    }

    fn offline_client(store: Arc<MemoryTokenStore>) -> ApiClient {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(2))
            .build()
            .unwrap();
        ApiClient::with_http(http, "http://127.0.0.1:9/api", store, Navigator::default())
    }

    #[tokio::test]
    async fn init_without_token_is_anonymous() {
        let store = Arc::new(MemoryTokenStore::default());
        let session = Session::init(offline_client(store)).await;
        assert!(!session.is_authenticated());
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn network_failure_on_init_keeps_token() {
        let store = Arc::new(MemoryTokenStore::new(Some("tok".into())));
        let session = Session::init(offline_client(store.clone())).await;
        assert!(!session.is_authenticated());
        assert_eq!(store.load().as_deref(), Some("tok"));
    }

    #[test]
    fn logout_clears_token_and_routes_to_login() {
        let store = Arc::new(MemoryTokenStore::new(Some("tok".into())));
        let mut session = Session::new(offline_client(store.clone()));
        session.logout();
        assert_eq!(store.load(), None);
        assert_eq!(session.api().navigator().current(), Route::Login);
    }
}
