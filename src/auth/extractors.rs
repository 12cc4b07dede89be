use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use std::ops::Deref;

use crate::error::AppError;
use crate::models::UserProfile;

/// The authenticated caller, resolved from the bearer token.
///
/// `AuthMiddleware` inserts it into the request extensions after loading the
/// live user record; handlers take it as an argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity(pub UserProfile);

impl Deref for Identity {
    type Target = UserProfile;

    fn deref(&self) -> &UserProfile {
        &self.0
    }
}

impl FromRequest for Identity {
    type Error = ActixError; // AppError will be converted into ActixError via ResponseError
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Identity>().cloned() {
            Some(identity) => ready(Ok(identity)),
            // Only reachable on a route that is not behind AuthMiddleware.
            None => ready(Err(
                AppError::Unauthenticated("Authentication required".to_string()).into(),
            )),
        }
    }
}
