//! The identity-provider seam and the OAuth 2.0 implementation behind it.
//!
//! The session manager only sees [`IdentityProvider`]; production wires in
//! [`OAuthProvider`], which runs a PKCE authorization-code flow with a
//! loopback redirect server and the user's own browser.

use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, RedirectUrl,
    Scope, TokenResponse, TokenUrl,
};
use std::future::Future;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://www.googleapis.com/oauth2/v3/token";
const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/youtube",
    "https://www.googleapis.com/auth/youtube.force-ssl",
];

const AUTH_DONE_HTML: &str =
    "<html><body><p>Signed in. You can close this tab and return to the app.</p></body></html>";

/// Source of bearer tokens for the session manager.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Obtains a bearer token, prompting the user interactively if needed.
    async fn authenticate(&self) -> GatewayResult<String>;

    /// Tells the issuer the token is no longer in use. Callers treat a
    /// failure here as non-fatal; local sign-out proceeds regardless.
    async fn revoke(&self, token: &str) -> GatewayResult<()>;
}

/// Interactive OAuth 2.0 provider for installed applications.
pub struct OAuthProvider {
    client_id: String,
    client_secret: String,
    http: reqwest::Client,
}

impl OAuthProvider {
    pub fn new(client_id: String, client_secret: String) -> GatewayResult<Self> {
        let http = reqwest::ClientBuilder::new()
            // SSRF no thank you.
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            client_id,
            client_secret,
            http,
        })
    }

    /// Binds a one-shot local HTTP server for the OAuth redirect.
    ///
    /// Returns the redirect URL to advertise in the authorization request
    /// and a future resolving to the authorization code once the provider
    /// calls back. The callback's `state` parameter is checked against
    /// `csrf` before the code is accepted.
    async fn bind_redirect(
        &self,
        csrf: CsrfToken,
    ) -> GatewayResult<(
        RedirectUrl,
        impl Future<Output = GatewayResult<AuthorizationCode>>,
    )> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let url = RedirectUrl::new(format!("http://{}:{}", addr.ip(), addr.port()))
            .map_err(|e| GatewayError::Auth(format!("construct redirect url: {e}")))?;

        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let outcome = async move {
                let (conn, _) = listener
                    .accept()
                    .await
                    .map_err(|e| GatewayError::Auth(format!("accept redirect connection: {e}")))?;
                let conn = hyper_util::rt::TokioIo::new(conn);
                let (code_tx, mut code_rx) = tokio::sync::mpsc::channel(1);
                let service = service_fn(move |request: Request<body::Incoming>| {
                    let csrf = csrf.clone();
                    let code_tx = code_tx.clone();
                    async move {
                        let mut presented_state = None;
                        let mut presented_code = None;
                        for (k, v) in
                            form_urlencoded::parse(request.uri().query().unwrap_or("").as_bytes())
                        {
                            match &*k {
                                "state" => presented_state = Some(v),
                                "code" => presented_code = Some(v),
                                _ => {}
                            }
                        }
                        if presented_state.as_deref() != Some(csrf.secret().as_str()) {
                            return Err("invalid csrf token");
                        }
                        let Some(code) = presented_code else {
                            return Err("no authorization code found");
                        };
                        let code = AuthorizationCode::new(code.into_owned());
                        code_tx
                            .send(code)
                            .await
                            .expect("channel won't be closed until server exit");
                        Ok(Response::new(Full::<Bytes>::from(AUTH_DONE_HTML)))
                    }
                });

                let mut serve = std::pin::pin!(
                    hyper::server::conn::http1::Builder::new().serve_connection(conn, service)
                );

                tokio::select! {
                    exit = &mut serve => {
                        match exit {
                            Err(e) => Err(GatewayError::Auth(format!("redirect server got bad request: {e}"))),
                            Ok(()) => Err(GatewayError::Auth("redirect server exited prematurely".into())),
                        }
                    }
                    code = code_rx.recv() => {
                        serve.graceful_shutdown();
                        let code = code.expect("channel won't be closed until service_fn is dropped");
                        Ok(code)
                    }
                }
            };
            let _ = done_tx.send(outcome.await);
        });

        Ok((url, async move {
            done_rx
                .await
                .map_err(|_| GatewayError::Auth("redirect listener dropped prematurely".into()))?
        }))
    }
}

#[async_trait]
impl IdentityProvider for OAuthProvider {
    async fn authenticate(&self) -> GatewayResult<String> {
        let csrf = CsrfToken::new_random();
        let (redirect_url, eventual_code) = self.bind_redirect(csrf.clone()).await?;

        let auth_url = AuthUrl::new(AUTH_URL.to_string()).expect("Invalid authorization endpoint URL");
        let token_url = TokenUrl::new(TOKEN_URL.to_string()).expect("Invalid token endpoint URL");
        let client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        // The CSRF token is never re-used; the flow runs exactly once.
        let mut authorize = client.authorize_url(move || csrf.clone());
        for scope in SCOPES {
            authorize = authorize.add_scope(Scope::new(scope.to_string()));
        }
        let (auth_url, _csrf_token) = authorize.set_pkce_challenge(pkce_challenge).url();

        tracing::info!(url = %auth_url, "asking user to follow OAuth flow");
        webbrowser::open(auth_url.as_ref())
            .map_err(|e| GatewayError::Auth(format!("open user's browser: {e}")))?;
        let authorization_code = eventual_code.await?;

        let token = client
            .exchange_code(authorization_code)
            .set_pkce_verifier(pkce_verifier)
            .request_async(&self.http)
            .await
            .map_err(|e| GatewayError::Auth(format!("exchange authorization code: {e}")))?;

        Ok(token.access_token().secret().to_string())
    }

    async fn revoke(&self, token: &str) -> GatewayResult<()> {
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("token", token)
            .finish();
        let response = self
            .http
            .post(REVOKE_URL)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Api {
                status: response.status().as_u16(),
            });
        }
        tracing::debug!("token revoked with issuer");
        Ok(())
    }
}
