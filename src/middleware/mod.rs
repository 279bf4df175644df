/// Middleware module
///
/// Token gatekeeping for protected, public and refresh routes.

mod gatekeeper;

pub use gatekeeper::{
    check_token, decide, Decision, Gatekeeper, RefreshCredential, RefreshGuard, Rejection,
    RouteAccess, TokenCheck,
};
