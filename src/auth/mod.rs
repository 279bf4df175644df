/// Authentication module
///
/// Credential storage, JWT issuance/verification, the login/refresh
/// orchestration, and cookie transport of the token pair.

mod claims;
mod cookies;
mod credentials;
mod password;
mod session;
mod token;

pub use claims::{Claims, Identity};
pub use cookies::{
    clear_token_cookies, removal_cookies, set_token_cookies, token_cookies, ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
};
pub use credentials::CredentialStore;
pub use password::{hash_password, verify_password, BCRYPT_COST};
pub use session::{AuthService, SessionGrant};
pub use token::{
    TokenError, TokenIssuer, TokenKind, TokenPair, VerifyOptions, REFRESH_TOKEN_TTL_SECONDS,
};
