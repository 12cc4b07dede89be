use std::sync::Arc;

use crate::auth::password::PasswordHasher;
use crate::auth::reset::ResetHandshake;
use crate::auth::token::TokenService;
use crate::auth::{AuthResponse, Identity, ResetRequestResponse};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::AppError;
use crate::models::User;
use crate::notifier::{reset_message, Notifier};
use crate::store::UserStore;

/// Returned by `request_reset` whether or not the account exists.
pub const RESET_REQUESTED_MESSAGE: &str =
    "If an account with that email exists, password reset instructions have been sent";

/// Registration, login, identity resolution and password changes.
///
/// This is the only place that combines the credential store, the hasher and
/// the token service, so handlers and the middleware never see a password hash.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: TokenService,
    resets: ResetHandshake,
    notifier: Option<Arc<dyn Notifier>>,
    frontend_url: Option<String>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    /// Wires the service from configuration. Without a notifier, password
    /// resets run in demo mode and the secret is returned to the caller.
    pub fn new(
        config: &Config,
        users: Arc<dyn UserStore>,
        notifier: Option<Arc<dyn Notifier>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let hasher = PasswordHasher::new(config.bcrypt_cost);
        Self {
            tokens: TokenService::new(&config.jwt_secret, config.token_ttl, clock.clone()),
            resets: ResetHandshake::new(users.clone(), hasher, config.reset_ttl, clock.clone()),
            users,
            hasher,
            notifier,
            frontend_url: config.frontend_url.clone(),
            clock,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn is_demo_mode(&self) -> bool {
        self.notifier.is_none()
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AppError> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let user = User::new(name, email, password, &self.hasher, self.clock.now())?;
        let user = self.users.create(user).await?;
        log::info!("registered user {}", user.id);

        Ok(AuthResponse {
            token: self.tokens.issue(user.id)?,
            user: user.profile(),
        })
    }

    /// Wrong email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => return Err(AppError::InvalidCredentials),
        };

        if !user.verify_password(password, &self.hasher)? {
            log::debug!("failed login for user {}", user.id);
            return Err(AppError::InvalidCredentials);
        }

        Ok(AuthResponse {
            token: self.tokens.issue(user.id)?,
            user: user.profile(),
        })
    }

    /// Resolves a bearer token to the live account it names.
    ///
    /// A valid token for a deleted user is rejected like any other bad token.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, AppError> {
        let claims = self.tokens.verify(token)?;
        match self.users.find_by_id(claims.sub).await? {
            Some(user) => Ok(Identity(user.profile())),
            None => Err(AppError::Unauthenticated("User no longer exists".into())),
        }
    }

    /// Issues a reset for `email` and delivers it.
    ///
    /// With a notifier the response is the same for known and unknown emails,
    /// and delivery runs on a spawned task so the reply does not wait on it.
    /// In demo mode the secret of a known account is included in the response.
    pub async fn request_reset(&self, email: &str) -> Result<ResetRequestResponse, AppError> {
        let issued = self.resets.request_reset(email).await?;

        let Some(notifier) = &self.notifier else {
            return Ok(ResetRequestResponse {
                message: RESET_REQUESTED_MESSAGE.to_string(),
                delivery: "demo".to_string(),
                reset_token: issued.map(|reset| reset.secret.into_inner()),
            });
        };

        if let Some(reset) = issued {
            let message = reset_message(
                &reset.user.email,
                &reset.user.name,
                reset.secret.expose(),
                self.resets.ttl(),
                self.frontend_url.as_deref(),
            );
            let notifier = Arc::clone(notifier);
            let user_id = reset.user.id;
            actix_web::rt::spawn(async move {
                if let Err(e) = notifier.send(&message).await {
                    log::warn!("reset notification for user {} failed: {}", user_id, e);
                }
            });
        }

        Ok(ResetRequestResponse {
            message: RESET_REQUESTED_MESSAGE.to_string(),
            delivery: "email".to_string(),
            reset_token: None,
        })
    }

    pub async fn complete_reset(&self, secret: &str, new_password: &str) -> Result<(), AppError> {
        self.resets.complete_reset(secret, new_password).await?;
        Ok(())
    }

    /// Outstanding tokens stay valid after the change.
    pub async fn change_password(
        &self,
        identity: &Identity,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let mut user = self
            .users
            .find_by_id(identity.id)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("User no longer exists".into()))?;

        if !user.verify_password(current_password, &self.hasher)? {
            return Err(AppError::Unauthenticated("Current password is incorrect".into()));
        }

        user.set_password(new_password, &self.hasher)?;
        if !self
            .users
            .set_password_hash(user.id, user.password_hash())
            .await?
        {
            return Err(AppError::Unauthenticated("User no longer exists".into()));
        }
        log::info!("password changed for user {}", user.id);
        Ok(())
    }
}
