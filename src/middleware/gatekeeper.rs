/// Request Gatekeeper
///
/// Reads the `access_token` cookie, verifies it, and attaches the resulting
/// [`Identity`] to the request extensions. Each wrapped route declares
/// whether it requires an identity:
///
/// | route     | valid token        | invalid token        | no token           |
/// |-----------|--------------------|----------------------|--------------------|
/// | protected | attach, allow      | 401                  | 401                |
/// | public    | attach, allow      | allow, no identity   | allow, no identity |

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{
    Identity, TokenError, TokenIssuer, TokenKind, VerifyOptions, ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
};
use crate::error::{AppError, AuthError};

/// Access declaration of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteAccess {
    pub requires_auth: bool,
}

impl RouteAccess {
    pub const PUBLIC: RouteAccess = RouteAccess { requires_auth: false };
    pub const PROTECTED: RouteAccess = RouteAccess { requires_auth: true };
}

impl Default for RouteAccess {
    fn default() -> Self {
        RouteAccess::PROTECTED
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingToken,
    InvalidToken(TokenError),
}

/// Outcome of checking the token a request carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCheck {
    Authenticated(Identity),
    Rejected(Rejection),
}

/// What the gatekeeper does with the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow(Option<Identity>),
    Deny(AuthError),
}

/// Verify an optional raw token against the secret of `kind`.
pub fn check_token(issuer: &TokenIssuer, token: Option<&str>, kind: TokenKind) -> TokenCheck {
    match token {
        None => TokenCheck::Rejected(Rejection::MissingToken),
        Some(token) => match issuer.verify_identity(token, kind, VerifyOptions::default()) {
            Ok(identity) => TokenCheck::Authenticated(identity),
            Err(e) => TokenCheck::Rejected(Rejection::InvalidToken(e)),
        },
    }
}

/// Combine a token check with the route's declared access.
pub fn decide(check: TokenCheck, access: RouteAccess) -> Decision {
    match (check, access.requires_auth) {
        (TokenCheck::Authenticated(identity), _) => Decision::Allow(Some(identity)),
        (TokenCheck::Rejected(Rejection::MissingToken), true) => {
            Decision::Deny(AuthError::MissingToken)
        }
        (TokenCheck::Rejected(Rejection::InvalidToken(_)), true) => {
            Decision::Deny(AuthError::InvalidAccessToken)
        }
        (TokenCheck::Rejected(Rejection::MissingToken), false) => Decision::Allow(None),
        (TokenCheck::Rejected(Rejection::InvalidToken(e)), false) => {
            tracing::debug!("Skipping token validation for public endpoint: {}", e);
            Decision::Allow(None)
        }
    }
}

/// Access-token gatekeeper for a route or scope
pub struct Gatekeeper {
    issuer: TokenIssuer,
    access: RouteAccess,
}

impl Gatekeeper {
    pub fn new(issuer: TokenIssuer, access: RouteAccess) -> Self {
        Self { issuer, access }
    }

    pub fn protected(issuer: TokenIssuer) -> Self {
        Self::new(issuer, RouteAccess::PROTECTED)
    }

    pub fn public(issuer: TokenIssuer) -> Self {
        Self::new(issuer, RouteAccess::PUBLIC)
    }
}

impl<S, B> Transform<S, ServiceRequest> for Gatekeeper
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = GatekeeperService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(GatekeeperService {
            service: Rc::new(service),
            issuer: self.issuer.clone(),
            access: self.access,
        }))
    }
}

pub struct GatekeeperService<S> {
    service: Rc<S>,
    issuer: TokenIssuer,
    access: RouteAccess,
}

impl<S, B> Service<ServiceRequest> for GatekeeperService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req.cookie(ACCESS_TOKEN_COOKIE);
        let check = check_token(
            &self.issuer,
            token.as_ref().map(|c| c.value()),
            TokenKind::Access,
        );

        match decide(check, self.access) {
            Decision::Allow(identity) => {
                if let Some(identity) = identity {
                    tracing::debug!(
                        account_id = %identity.account_id,
                        email = %identity.email,
                        "Access token validated"
                    );
                    req.extensions_mut().insert(identity);
                }
                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Decision::Deny(reason) => {
                tracing::warn!(path = %req.path(), "Request rejected: {}", reason);
                Box::pin(async move { Err(AppError::Auth(reason).into()) })
            }
        }
    }
}

/// Raw refresh token plus the identity it resolved to.
///
/// The token is kept because rotation re-signs from it, not from any
/// server-side record.
#[derive(Debug, Clone)]
pub struct RefreshCredential {
    pub identity: Identity,
    pub token: String,
}

/// Guard for the refresh endpoint
///
/// Verifies the `refresh_token` cookie against the refresh secret. A missing
/// or invalid token is a `403`, never a `401`.
pub struct RefreshGuard {
    issuer: TokenIssuer,
}

impl RefreshGuard {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self { issuer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RefreshGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RefreshGuardService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RefreshGuardService {
            service: Rc::new(service),
            issuer: self.issuer.clone(),
        }))
    }
}

pub struct RefreshGuardService<S> {
    service: Rc<S>,
    issuer: TokenIssuer,
}

impl<S, B> Service<ServiceRequest> for RefreshGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .cookie(REFRESH_TOKEN_COOKIE)
            .map(|c| c.value().to_string());

        match check_token(&self.issuer, token.as_deref(), TokenKind::Refresh) {
            TokenCheck::Authenticated(identity) => {
                if let Some(token) = token {
                    req.extensions_mut().insert(RefreshCredential { identity, token });
                }
                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            TokenCheck::Rejected(rejection) => {
                tracing::warn!("Refresh request rejected: {:?}", rejection);
                Box::pin(async move { Err(AppError::Auth(AuthError::InvalidRefreshToken).into()) })
            }
        }
    }
}
