/// Cookie transport for the token pair.

use actix_web::cookie::{time::Duration, Cookie};
use actix_web::HttpResponseBuilder;

use crate::auth::token::{TokenPair, REFRESH_TOKEN_TTL_SECONDS};
use crate::configuration::CookieSettings;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

fn token_cookie(
    name: &'static str,
    value: String,
    remember_me: bool,
    settings: &CookieSettings,
) -> Cookie<'static> {
    let mut builder = Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .secure(settings.secure)
        .same_site(settings.same_site.into());

    // without remember-me the browser drops them at the end of the session
    if remember_me {
        builder = builder.max_age(Duration::seconds(REFRESH_TOKEN_TTL_SECONDS));
    }

    builder.finish()
}

/// Build both token cookies.
pub fn token_cookies(
    tokens: &TokenPair,
    remember_me: bool,
    settings: &CookieSettings,
) -> [Cookie<'static>; 2] {
    [
        token_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token.clone(), remember_me, settings),
        token_cookie(REFRESH_TOKEN_COOKIE, tokens.refresh_token.clone(), remember_me, settings),
    ]
}

/// Build removal cookies for both tokens.
pub fn removal_cookies(settings: &CookieSettings) -> [Cookie<'static>; 2] {
    [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE].map(|name| {
        let mut cookie = token_cookie(name, String::new(), false, settings);
        cookie.make_removal();
        cookie
    })
}

pub fn set_token_cookies(
    response: &mut HttpResponseBuilder,
    tokens: &TokenPair,
    remember_me: bool,
    settings: &CookieSettings,
) {
    for cookie in token_cookies(tokens, remember_me, settings) {
        response.cookie(cookie);
    }
}

pub fn clear_token_cookies(response: &mut HttpResponseBuilder, settings: &CookieSettings) {
    for cookie in removal_cookies(settings) {
        response.cookie(cookie);
    }
}
