#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use reqwest::header::{HeaderMap, SET_COOKIE};
use serde_json::{json, Value};
use taskdeck::auth::TokenIssuer;
use taskdeck::configuration::{CookieSettings, JwtSettings, SameSitePolicy};
use taskdeck::startup::run;
use taskdeck::store::{InMemoryAccountStore, InMemoryTaskStore};

pub const PASSWORD: &str = "Passw0rd!";

pub struct TestApp {
    pub address: String,
    pub jwt: JwtSettings,
    pub accounts: Arc<InMemoryAccountStore>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn issuer(&self) -> TokenIssuer {
        TokenIssuer::new(&self.jwt)
    }

    pub async fn register(&self, client: &reqwest::Client, email: &str, username: &str) -> Value {
        let response = client
            .post(&self.url("/auth/register"))
            .json(&json!({
                "email": email,
                "username": username,
                "password": PASSWORD,
            }))
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(201, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }

    pub async fn login(&self, client: &reqwest::Client, email: &str) -> reqwest::Response {
        client
            .post(&self.url("/auth/login"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

pub fn jwt_settings(access_token_expiry: i64) -> JwtSettings {
    JwtSettings {
        access_secret: "integration-access-secret-0123456789".to_string(),
        access_token_expiry,
        refresh_secret: "integration-refresh-secret-0123456789".to_string(),
        issuer: "taskdeck-test".to_string(),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_access_ttl(900).await
}

pub async fn spawn_app_with_access_ttl(access_token_expiry: i64) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let jwt = jwt_settings(access_token_expiry);
    let accounts = Arc::new(InMemoryAccountStore::new());
    let cookies = CookieSettings {
        secure: false,
        same_site: SameSitePolicy::Lax,
    };

    let server = run(
        listener,
        accounts.clone(),
        Arc::new(InMemoryTaskStore::new()),
        jwt.clone(),
        cookies,
    )
    .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        jwt,
        accounts,
    }
}

/// Client that keeps cookies between requests, like a browser.
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}

/// Raw `Set-Cookie` header for the named cookie.
pub fn set_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let prefix = format!("{}=", name);
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&prefix))
}

/// Value of the named cookie in a `Set-Cookie` header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    set_cookie(headers, name)
        .and_then(|header| header.split(';').next())
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| value.to_string())
}
