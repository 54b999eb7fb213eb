//! Request lifecycle: build, send, classify, refresh and replay.
//!
//! Every call goes through the same steps. The credential for the call's
//! scope is attached, the response status is classified, and an expired
//! credential is refreshed through the [`RefreshCoordinator`] before the call
//! is replayed exactly once. Streaming calls run the same steps up to the
//! first byte and then hand the body to a [`StreamDriver`].

use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::options::{RequestBody, RequestOptions};
use super::status::{classify_status, ErrorBody, ResponseBody, StatusClass};
use crate::adapters::{FileStore, LogObserver, ReqwestHttpClient, SystemClock};
use crate::auth::{
    CredentialScope, CredentialStore, HttpTokenRefresher, RefreshCoordinator, RefreshLock,
    TokenRefresher,
};
use crate::config::ClientConfig;
use crate::error::{AuthError, ClientError, ClientResult};
use crate::sse::EventSink;
use crate::stream::{StreamDriver, StreamOutcome};
use crate::traits::{
    Body, ByteStream, Clock, HttpClient, HttpError, KeyValueStore, Request, Response,
    SessionObserver, SignInTarget, StoreError,
};

/// First attempt plus one replay after a refresh.
const MAX_ATTEMPTS: usize = 2;

const JSON_CONTENT_TYPE: &str = "application/json";

/// 403 code meaning the instance is already set up.
const ALREADY_SETUP_CODE: &str = "already_setup";

/// Client for console and public API calls.
///
/// Cloning is cheap; clones share the transport, the store and the refresh
/// coordinator, so concurrent calls from every clone refresh at most once.
///
/// # Example
///
/// ```ignore
/// use flowlink::client::{ApiClient, RequestOptions};
/// use flowlink::config::ClientConfig;
///
/// let client = ApiClient::from_config(ClientConfig::from_env())?;
/// let apps = client.request("/apps", RequestOptions::get()).await?;
/// ```
#[derive(Clone)]
pub struct ApiClient {
    http: Arc<dyn HttpClient>,
    credentials: CredentialStore,
    coordinator: Arc<RefreshCoordinator>,
    observer: Arc<dyn SessionObserver>,
    config: ClientConfig,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("coordinator", &self.coordinator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client refreshing credentials against `config.api_prefix`.
    pub fn new(
        http: Arc<dyn HttpClient>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn SessionObserver>,
        config: ClientConfig,
    ) -> Self {
        let refresher = Arc::new(HttpTokenRefresher::new(
            Arc::clone(&http),
            config.api_prefix.clone(),
        ));
        Self::with_refresher(http, store, clock, observer, refresher, config)
    }

    /// Create a client with a custom [`TokenRefresher`].
    pub fn with_refresher(
        http: Arc<dyn HttpClient>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn SessionObserver>,
        refresher: Arc<dyn TokenRefresher>,
        config: ClientConfig,
    ) -> Self {
        let lock = Arc::new(RefreshLock::new(
            Arc::clone(&store),
            clock,
            config.lock_staleness,
        ));
        let credentials = CredentialStore::new(store);
        let coordinator = Arc::new(RefreshCoordinator::new(
            lock,
            credentials.clone(),
            refresher,
            config.refresh_poll_interval,
            config.refresh_timeout,
        ));

        Self {
            http,
            credentials,
            coordinator,
            observer,
            config,
        }
    }

    /// Production client: reqwest transport, file store, wall clock and a
    /// logging observer.
    pub fn from_config(config: ClientConfig) -> Result<Self, StoreError> {
        let store = match &config.store_dir {
            Some(dir) => FileStore::new(dir),
            None => FileStore::default_location()?,
        };
        Ok(Self::new(
            Arc::new(ReqwestHttpClient::new()),
            Arc::new(store),
            Arc::new(SystemClock),
            Arc::new(LogObserver),
            config,
        ))
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Perform a non-streaming call and decode its body.
    pub async fn request(&self, path: &str, options: RequestOptions) -> ClientResult<ResponseBody> {
        let cancel = options.cancel_token();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            result = self.send_with_replay(path, &options) => result,
        };

        if let Err(err) = &result {
            if err.is_cancellation() {
                tracing::debug!("Request to {} cancelled", path);
            } else {
                tracing::warn!(
                    "Request to {} failed [{}/{}]: {}",
                    path,
                    err.category(),
                    err.error_code(),
                    err
                );
            }
        }
        result
    }

    /// Perform a non-streaming call and deserialize its JSON body into `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ClientResult<T> {
        match self.request(path, options).await? {
            ResponseBody::Json(value) => {
                serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
            }
            ResponseBody::Binary { content_type, .. } => Err(ClientError::Decode(format!(
                "expected a JSON body, got {}",
                content_type
            ))),
        }
    }

    /// Perform a streaming call, delivering events to `sink`.
    ///
    /// Failures before the first byte (transport, failing status, credential
    /// problems, cancellation) reach `sink.on_error` and the driver never
    /// starts. Once streaming, the driver owns the callbacks; the returned
    /// result mirrors how the stream ended.
    pub async fn stream<S: EventSink + ?Sized>(
        &self,
        path: &str,
        options: RequestOptions,
        sink: &mut S,
    ) -> ClientResult<()> {
        let cancel = options.cancel_token();
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            opened = self.open_stream(path, &options) => opened,
        };

        let body = match opened {
            Ok(body) => body,
            Err(err) => {
                if !err.is_cancellation() {
                    tracing::warn!("Stream to {} failed to open: {}", path, err);
                }
                sink.on_error(&err);
                return Err(err);
            }
        };

        let mut driver = StreamDriver::with_cancellation(cancel);
        match driver.run(body, sink).await {
            StreamOutcome::Completed => Ok(()),
            StreamOutcome::Failed(err) => Err(err.into()),
            StreamOutcome::Cancelled => Err(ClientError::Cancelled),
        }
    }

    async fn send_with_replay(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> ClientResult<ResponseBody> {
        let url = self.resolve_url(path, options);

        for attempt in 1..=MAX_ATTEMPTS {
            let token = self.access_token(&options.scope)?;
            let request = self.build_request(&url, options, token.as_deref());

            let response = match tokio::time::timeout(
                self.config.request_timeout,
                self.http.execute(request),
            )
            .await
            {
                Ok(Ok(response)) => response,
                Ok(Err(err)) => return Err(self.transport_failure(err, options)),
                Err(_) => {
                    return Err(ClientError::Timeout {
                        timeout_ms: self.config.request_timeout.as_millis() as u64,
                    })
                }
            };

            match classify_status(response.status) {
                StatusClass::Success | StatusClass::NoContent => {
                    return ResponseBody::from_response(&response)
                }
                StatusClass::CredentialExpired if attempt < MAX_ATTEMPTS => {
                    self.recover_credential(path, options, &response, token.as_deref())
                        .await?;
                }
                StatusClass::CredentialExpired => break,
                StatusClass::Forbidden | StatusClass::Failed => {
                    return Err(self.status_failure(&response, options))
                }
            }
        }

        tracing::warn!("Credential rejected again after refresh: {}", path);
        Err(AuthError::CredentialExpired.into())
    }

    async fn open_stream(&self, path: &str, options: &RequestOptions) -> ClientResult<ByteStream> {
        let url = self.resolve_url(path, options);

        for attempt in 1..=MAX_ATTEMPTS {
            let token = self.access_token(&options.scope)?;
            let request = self.build_request(&url, options, token.as_deref());

            let response = self
                .http
                .execute_streaming(request)
                .await
                .map_err(|e| self.transport_failure(e, options))?;

            match classify_status(response.status) {
                StatusClass::Success | StatusClass::NoContent => return Ok(response.body),
                StatusClass::CredentialExpired if attempt < MAX_ATTEMPTS => {
                    let buffered = self.buffer(response.into_response().await, options)?;
                    self.recover_credential(path, options, &buffered, token.as_deref())
                        .await?;
                }
                StatusClass::CredentialExpired => break,
                StatusClass::Forbidden | StatusClass::Failed => {
                    let buffered = self.buffer(response.into_response().await, options)?;
                    return Err(self.status_failure(&buffered, options));
                }
            }
        }

        tracing::warn!("Credential rejected again after refresh: {}", path);
        Err(AuthError::CredentialExpired.into())
    }

    /// Handle a 401. `Ok(())` means the credential is fresh and the call
    /// should be replayed.
    async fn recover_credential(
        &self,
        path: &str,
        options: &RequestOptions,
        response: &Response,
        used_token: Option<&str>,
    ) -> ClientResult<()> {
        let Some(body) = ErrorBody::parse(response) else {
            self.observer.sign_in_required(SignInTarget::Console);
            return Err(status_error(response.status, &ErrorBody::default()));
        };
        let rejected = status_error(response.status, &body);

        if path.contains("/login") {
            return Err(rejected);
        }

        let community = self.config.community_edition;
        match body.code.as_deref() {
            Some("web_app_access_denied") => {
                self.observer.sign_in_required(SignInTarget::WebApp {
                    message: body.message.clone(),
                    status: Some(403),
                });
                return Err(rejected);
            }
            Some("web_sso_auth_required") => {
                self.drop_public_credential(&options.scope);
                self.observer.sign_in_required(web_app_sign_in());
                return Err(rejected);
            }
            Some("unauthorized_and_force_logout") => {
                if let Err(e) = self.credentials.clear_console() {
                    tracing::warn!("Failed to clear console credentials: {}", e);
                }
                self.observer.sign_in_required(SignInTarget::Reload);
                return Err(rejected);
            }
            Some("unauthorized") if options.scope.is_public() => {
                self.drop_public_credential(&options.scope);
                self.observer.sign_in_required(web_app_sign_in());
                return Err(rejected);
            }
            Some("init_validate_failed") if community && !options.silent => {
                self.observer.notify_error(&body.display_message());
                return Err(rejected);
            }
            Some("not_init_validated") if community => {
                self.observer.sign_in_required(SignInTarget::Init);
                return Err(rejected);
            }
            Some("not_setup") if community => {
                self.observer.sign_in_required(SignInTarget::Install);
                return Err(rejected);
            }
            _ => {}
        }

        // Only a console credential can be compared with the stored one
        let rejected_token = match options.scope {
            CredentialScope::Console => used_token,
            CredentialScope::Public { .. } => None,
        };

        match self.coordinator.ensure_fresh_credential(rejected_token).await {
            Ok(()) => {
                tracing::debug!("Credential refreshed, replaying {}", path);
                Ok(())
            }
            Err(err) => {
                let target = if options.scope.is_public() {
                    web_app_sign_in()
                } else {
                    SignInTarget::Console
                };
                self.observer.sign_in_required(target);
                Err(err.into())
            }
        }
    }

    fn status_failure(&self, response: &Response, options: &RequestOptions) -> ClientError {
        let body = ErrorBody::parse(response).unwrap_or_default();
        if !options.silent {
            self.observer.notify_error(&body.display_message());
        }
        if response.status == 403 && body.code.as_deref() == Some(ALREADY_SETUP_CODE) {
            self.observer.sign_in_required(SignInTarget::Console);
        }
        status_error(response.status, &body)
    }

    fn transport_failure(&self, err: HttpError, options: &RequestOptions) -> ClientError {
        let err = ClientError::from(err);
        if !options.silent && !err.is_cancellation() {
            self.observer.notify_error(&err.user_message());
        }
        err
    }

    fn buffer(
        &self,
        response: Result<Response, HttpError>,
        options: &RequestOptions,
    ) -> ClientResult<Response> {
        response.map_err(|e| self.transport_failure(e, options))
    }

    fn access_token(&self, scope: &CredentialScope) -> ClientResult<Option<String>> {
        self.credentials
            .access_token(scope)
            .map_err(|e| AuthError::Store(e).into())
    }

    fn drop_public_credential(&self, scope: &CredentialScope) {
        if let CredentialScope::Public { share_code } = scope {
            if let Err(e) = self.credentials.remove_public(share_code) {
                tracing::warn!("Failed to remove public credential: {}", e);
            }
        }
    }

    fn resolve_url(&self, path: &str, options: &RequestOptions) -> String {
        let mut url = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            let prefix = if options.scope.is_public() {
                &self.config.public_api_prefix
            } else {
                &self.config.api_prefix
            };
            format!(
                "{}/{}",
                prefix.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        };

        if !options.query.is_empty() {
            let query = options
                .query
                .iter()
                .map(|(key, value)| {
                    format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
                })
                .collect::<Vec<_>>()
                .join("&");
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }
        url
    }

    fn build_request(&self, url: &str, options: &RequestOptions, token: Option<&str>) -> Request {
        let mut request = Request::new(options.method, url);

        let multipart = matches!(options.body, RequestBody::Multipart(_));
        if !options.skip_content_type && !multipart {
            request = request.with_header("Content-Type", JSON_CONTENT_TYPE);
        }
        if let Some(token) = token {
            request = request.with_header("Authorization", format!("Bearer {}", token));
        } else {
            tracing::debug!("No credential stored for {:?}", options.scope);
        }
        for (name, value) in &options.headers {
            request = request.with_header(name.clone(), value.clone());
        }

        let body = match &options.body {
            RequestBody::Empty => Body::Empty,
            RequestBody::Json(value) => Body::Text(value.to_string()),
            RequestBody::Text(text) => Body::Text(text.clone()),
            RequestBody::Multipart(parts) => Body::Multipart(parts.clone()),
        };

        tracing::debug!("{} {}", options.method, url);
        request.with_body(body)
    }
}

fn status_error(status: u16, body: &ErrorBody) -> ClientError {
    ClientError::Status {
        status,
        code: body.code.clone(),
        message: body.display_message(),
    }
}

fn web_app_sign_in() -> SignInTarget {
    SignInTarget::WebApp {
        message: None,
        status: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockResponse;
    use crate::adapters::{InMemoryStore, ManualClock, MockHttpClient, RecordingObserver};
    use crate::auth::RefreshLock;
    use crate::traits::Method;
    use serde_json::json;
    use std::time::Duration;

    const API: &str = "http://api.test/console/api";
    const PUBLIC_API: &str = "http://api.test/api";

    struct Harness {
        http: Arc<MockHttpClient>,
        store: InMemoryStore,
        observer: RecordingObserver,
        client: ApiClient,
    }

    fn harness_with(config: ClientConfig) -> Harness {
        let http = Arc::new(MockHttpClient::new());
        let store = InMemoryStore::with_entries([
            ("console_token", "old-access"),
            ("refresh_token", "old-refresh"),
        ]);
        let observer = RecordingObserver::new();
        let client = ApiClient::new(
            http.clone(),
            Arc::new(store.clone()),
            Arc::new(ManualClock::new(1_000_000)),
            Arc::new(observer.clone()),
            config
                .with_api_prefix(API)
                .with_public_api_prefix(PUBLIC_API)
                .with_refresh_poll_interval(Duration::from_millis(10)),
        );
        Harness {
            http,
            store,
            observer,
            client,
        }
    }

    fn harness() -> Harness {
        harness_with(ClientConfig::default())
    }

    fn json_response(status: u16, body: serde_json::Value) -> MockResponse {
        MockResponse::Success(Response::new(status, body.to_string()))
    }

    fn refresh_ok() -> MockResponse {
        json_response(
            200,
            json!({"data": {"access_token": "new-access", "refresh_token": "new-refresh"}}),
        )
    }

    #[test]
    fn test_resolve_url() {
        let h = harness();
        let console = RequestOptions::get();
        let public = RequestOptions::get().public("share");

        assert_eq!(h.client.resolve_url("/apps", &console), format!("{}/apps", API));
        assert_eq!(h.client.resolve_url("apps", &console), format!("{}/apps", API));
        assert_eq!(
            h.client.resolve_url("/messages", &public),
            format!("{}/messages", PUBLIC_API)
        );
        assert_eq!(
            h.client.resolve_url("https://other.test/x", &console),
            "https://other.test/x"
        );
    }

    #[test]
    fn test_resolve_url_appends_encoded_query() {
        let h = harness();
        let options = RequestOptions::get()
            .with_query("keyword", "a b&c")
            .with_query("page", "1");
        assert_eq!(
            h.client.resolve_url("/apps", &options),
            format!("{}/apps?keyword=a%20b%26c&page=1", API)
        );
        assert_eq!(
            h.client.resolve_url("/apps?limit=5", &options),
            format!("{}/apps?limit=5&keyword=a%20b%26c&page=1", API)
        );
    }

    #[test]
    fn test_build_request_headers() {
        let h = harness();
        let request = h.client.build_request(
            "http://x",
            &RequestOptions::post(json!({"a": 1})),
            Some("tok"),
        );
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.header("Authorization"), Some("Bearer tok"));
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.body.as_text(), Some(r#"{"a":1}"#));

        let request = h.client.build_request(
            "http://x",
            &RequestOptions::get().without_content_type(),
            None,
        );
        assert_eq!(request.header("Content-Type"), None);
        assert_eq!(request.header("Authorization"), None);
    }

    #[test]
    fn test_caller_content_type_replaces_default() {
        let h = harness();
        let options = RequestOptions::post(json!({})).with_header("content-type", "text/plain");
        let request = h.client.build_request("http://x", &options, None);

        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("Content-Type"), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_public_scope_uses_public_token() {
        let h = harness();
        h.client
            .credentials()
            .set_public("share", "public-tok")
            .unwrap();
        h.http.set_response(
            &format!("{}/parameters", PUBLIC_API),
            json_response(200, json!({"ok": true})),
        );

        h.client
            .request("/parameters", RequestOptions::get().public("share"))
            .await
            .unwrap();

        let sent = h.http.requests();
        assert_eq!(sent[0].header("Authorization"), Some("Bearer public-tok"));
    }

    #[tokio::test]
    async fn test_refresh_then_replay_once() {
        let h = harness();
        let url = format!("{}/apps", API);
        h.http
            .push_response(&url, json_response(401, json!({"code": "unauthorized"})));
        h.http.push_response(&url, json_response(200, json!({"data": []})));
        h.http
            .set_response(&format!("{}/refresh-token", API), refresh_ok());

        let body = h.client.request("/apps", RequestOptions::get()).await.unwrap();

        assert_eq!(body.as_json(), Some(&json!({"data": []})));
        let calls = h.http.requests_to(&url);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].header("Authorization"), Some("Bearer old-access"));
        assert_eq!(calls[1].header("Authorization"), Some("Bearer new-access"));
        assert_eq!(
            h.store.snapshot().get("refresh_token").map(String::as_str),
            Some("new-refresh")
        );
        assert!(h.observer.sign_ins().is_empty());
    }

    #[tokio::test]
    async fn test_second_401_is_hard_failure() {
        let h = harness();
        let url = format!("{}/apps", API);
        h.http
            .set_response(&url, json_response(401, json!({"code": "unauthorized"})));
        h.http
            .set_response(&format!("{}/refresh-token", API), refresh_ok());

        let err = h
            .client
            .request("/apps", RequestOptions::get())
            .await
            .unwrap_err();

        assert_eq!(err, ClientError::Auth(AuthError::CredentialExpired));
        assert_eq!(h.http.requests_to(&url).len(), 2);
        assert_eq!(
            h.http
                .requests_to(&format!("{}/refresh-token", API))
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_failed_refresh_requires_sign_in() {
        let h = harness();
        h.http.set_response(
            &format!("{}/apps", API),
            json_response(401, json!({"code": "unauthorized"})),
        );
        h.http.set_response(
            &format!("{}/refresh-token", API),
            json_response(401, json!({})),
        );

        let err = h
            .client
            .request("/apps", RequestOptions::get())
            .await
            .unwrap_err();

        assert_eq!(err, ClientError::Auth(AuthError::RefreshRejected));
        assert_eq!(h.observer.sign_ins(), vec![SignInTarget::Console]);
        assert!(!h.client.coordinator().lock().is_held());
    }

    #[tokio::test]
    async fn test_unparsable_401_goes_to_sign_in() {
        let h = harness();
        h.http.set_response(
            &format!("{}/apps", API),
            MockResponse::Success(Response::new(401, "<html>")),
        );

        let err = h
            .client
            .request("/apps", RequestOptions::get())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert_eq!(h.observer.sign_ins(), vec![SignInTarget::Console]);
        assert!(h
            .http
            .requests_to(&format!("{}/refresh-token", API))
            .is_empty());
    }

    #[tokio::test]
    async fn test_login_401_is_not_refreshed() {
        let h = harness();
        h.http.set_response(
            &format!("{}/login", API),
            json_response(401, json!({"code": "invalid_password", "message": "Wrong"})),
        );

        let err = h
            .client
            .request("/login", RequestOptions::post(json!({})))
            .await
            .unwrap_err();

        assert_eq!(err.code(), Some("invalid_password"));
        assert!(h.observer.sign_ins().is_empty());
        assert_eq!(h.http.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_force_logout_clears_console_credentials() {
        let h = harness();
        h.http.set_response(
            &format!("{}/apps", API),
            json_response(401, json!({"code": "unauthorized_and_force_logout"})),
        );

        h.client
            .request("/apps", RequestOptions::get())
            .await
            .unwrap_err();

        let snapshot = h.store.snapshot();
        assert!(!snapshot.contains_key("console_token"));
        assert!(!snapshot.contains_key("refresh_token"));
        assert_eq!(h.observer.sign_ins(), vec![SignInTarget::Reload]);
    }

    #[tokio::test]
    async fn test_public_special_codes() {
        let h = harness();
        h.client.credentials().set_public("share", "pub").unwrap();
        let url = format!("{}/messages", PUBLIC_API);

        h.http.push_response(
            &url,
            json_response(
                401,
                json!({"code": "web_app_access_denied", "message": "No access"}),
            ),
        );
        h.http
            .push_response(&url, json_response(401, json!({"code": "unauthorized"})));

        let options = RequestOptions::get().public("share");
        h.client.request("/messages", options.clone()).await.unwrap_err();
        assert_eq!(
            h.client
                .credentials()
                .access_token(&options.scope)
                .unwrap()
                .as_deref(),
            Some("pub")
        );

        h.client.request("/messages", options.clone()).await.unwrap_err();
        assert_eq!(h.client.credentials().access_token(&options.scope).unwrap(), None);

        assert_eq!(
            h.observer.sign_ins(),
            vec![
                SignInTarget::WebApp {
                    message: Some("No access".to_string()),
                    status: Some(403),
                },
                SignInTarget::WebApp {
                    message: None,
                    status: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_setup_codes_need_community_edition() {
        let h = harness_with(ClientConfig::default().with_community_edition(true));
        let url = format!("{}/setup", API);
        h.http
            .push_response(&url, json_response(401, json!({"code": "not_setup"})));
        h.http
            .push_response(&url, json_response(401, json!({"code": "not_init_validated"})));
        h.http.push_response(
            &url,
            json_response(
                401,
                json!({"code": "init_validate_failed", "message": "Bad password"}),
            ),
        );

        for _ in 0..3 {
            h.client
                .request("/setup", RequestOptions::get())
                .await
                .unwrap_err();
        }

        assert_eq!(
            h.observer.sign_ins(),
            vec![SignInTarget::Install, SignInTarget::Init]
        );
        assert_eq!(h.observer.errors(), vec!["Bad password".to_string()]);
    }

    #[tokio::test]
    async fn test_forbidden_already_setup() {
        let h = harness();
        h.http.set_response(
            &format!("{}/setup", API),
            json_response(403, json!({"code": "already_setup", "message": "Done"})),
        );

        let err = h
            .client
            .request("/setup", RequestOptions::post(json!({})))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(403));
        assert_eq!(h.observer.errors(), vec!["Done".to_string()]);
        assert_eq!(h.observer.sign_ins(), vec![SignInTarget::Console]);
    }

    #[tokio::test]
    async fn test_silent_suppresses_notices() {
        let h = harness();
        h.http.set_response(
            &format!("{}/apps", API),
            json_response(500, json!({})),
        );

        let err = h
            .client
            .request("/apps", RequestOptions::get().silent())
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Server Error");
        assert!(h.observer.errors().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_notifies() {
        let h = harness();
        h.http.set_response(
            &format!("{}/apps", API),
            MockResponse::Error(HttpError::ConnectionFailed("refused".to_string())),
        );

        let err = h
            .client
            .request("/apps", RequestOptions::get())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(h.observer.errors().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let h = harness_with(ClientConfig::default().with_request_timeout(Duration::from_secs(5)));
        h.http
            .set_response(&format!("{}/slow", API), MockResponse::Pending);

        let err = h
            .client
            .request("/slow", RequestOptions::get())
            .await
            .unwrap_err();

        assert_eq!(err, ClientError::Timeout { timeout_ms: 5000 });
        assert!(h.observer.errors().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_settles_pending_request() {
        let h = harness();
        h.http
            .set_response(&format!("{}/slow", API), MockResponse::Pending);
        let handle = crate::client::CancelHandle::new();
        let options = RequestOptions::get().with_cancel(handle.clone());

        let client = h.client.clone();
        let task = tokio::spawn(async move { client.request("/slow", options).await });
        tokio::task::yield_now().await;
        handle.cancel();

        let err = task.await.unwrap().unwrap_err();
        assert_eq!(err, ClientError::Cancelled);
        assert!(h.observer.errors().is_empty());
    }

    #[tokio::test]
    async fn test_request_json_decodes() {
        #[derive(serde::Deserialize)]
        struct Page {
            total: u32,
        }

        let h = harness();
        h.http.set_response(
            &format!("{}/apps", API),
            json_response(200, json!({"total": 3})),
        );

        let page: Page = h
            .client
            .request_json("/apps", RequestOptions::get())
            .await
            .unwrap();
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn test_lock_is_shared_with_store() {
        let h = harness();
        let other = Arc::new(RefreshLock::new(
            Arc::new(h.store.clone()),
            Arc::new(ManualClock::new(1_000_000)),
            Duration::from_secs(100),
        ));
        let guard = other.acquire().unwrap().unwrap();
        assert!(h.client.coordinator().lock().is_held());
        drop(guard);
        assert!(!h.client.coordinator().lock().is_held());
    }
}
