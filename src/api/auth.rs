use super::ApiClient;
use crate::error::ApiResult;
use crate::model::{AuthResponse, CodeRequest, LoginRequest, Message, MfaSetup, SignupRequest, User};

impl ApiClient {
    pub async fn signup(&self, req: &SignupRequest) -> ApiResult<AuthResponse> {
        self.post("/auth/signup", req).await
    }

    /// Answers 428 when the account has MFA enabled and `totp_code` is absent.
    pub async fn login(&self, req: &LoginRequest) -> ApiResult<AuthResponse> {
        self.post("/auth/login", req).await
    }

    pub async fn me(&self) -> ApiResult<User> {
        self.get("/auth/me").await
    }

    pub async fn refresh_token(&self) -> ApiResult<AuthResponse> {
        self.post_empty("/auth/refresh").await
    }

    pub async fn mfa_setup(&self) -> ApiResult<MfaSetup> {
        self.post_empty("/auth/mfa/setup").await
    }

    pub async fn mfa_verify(&self, code: &str) -> ApiResult<Message> {
        self.post("/auth/mfa/verify", &CodeRequest { code }).await
    }

    pub async fn mfa_disable(&self) -> ApiResult<Message> {
        self.post_empty("/auth/mfa/disable").await
    }
}
