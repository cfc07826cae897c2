//! HTTP gateway implementation.
//!
//! The actual HTTP client is abstracted via a trait so different libraries
//! (reqwest, ureq, platform-native stacks) can back the gateway without the
//! engine depending on any of them.

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{ListFilters, RemoteGateway};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use trove_core::{ItemDraft, ItemId, ItemPatch, RemoteItem};

/// A response from an [`HttpClient`] request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A 200 response with the given body.
    #[must_use]
    pub fn ok(body: Vec<u8>) -> Self {
        Self { status: 200, body }
    }

    /// A response with the given status and empty body.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual transport. An `Err` means the
/// request never produced an HTTP response (unreachable host, timeout) and
/// is treated as retryable; HTTP-level failures come back as status codes.
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response.
    fn request(
        &self,
        method: &str,
        url: &str,
        bearer: Option<&str>,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse, String>;
}

/// HTTP-based remote gateway speaking the service's JSON endpoints.
///
/// Attaches the bearer credential to every call. Endpoints:
///
/// - `POST {base}/post_item` - create
/// - `PUT {base}/admin/items/edit/{id}` - update
/// - `DELETE {base}/admin/items/delete/{id}` - delete
/// - `GET {base}/api/items` - list
pub struct HttpGateway<C: HttpClient> {
    base_url: String,
    client: C,
    token: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpGateway<C> {
    /// Creates a gateway against the given base URL.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into(),
            client,
            token: RwLock::new(None),
        }
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sets the bearer credential attached to every call.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// Clears the bearer credential.
    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    /// Sends a request and maps the HTTP status onto the gateway error
    /// taxonomy, returning the raw success body.
    fn send<Req: Serialize>(
        &self,
        method: &str,
        path: &str,
        target: Option<ItemId>,
        request: Option<&Req>,
    ) -> GatewayResult<Vec<u8>> {
        let body = request
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| GatewayError::Protocol(format!("failed to encode request: {e}")))?;

        let url = format!("{}{}", self.base_url, path);
        let token = self.token.read().clone();
        let response = self
            .client
            .request(method, &url, token.as_deref(), body.as_deref())
            .map_err(GatewayError::transport_retryable)?;

        match response.status {
            200..=299 => Ok(response.body),
            404 | 409 if target.is_some() => Err(GatewayError::Conflict {
                id: target.unwrap_or_default(),
            }),
            401 | 403 => Err(GatewayError::Rejected(format!(
                "authentication failed (status {})",
                response.status
            ))),
            400..=499 => Err(GatewayError::Rejected(format!(
                "status {}: {}",
                response.status,
                String::from_utf8_lossy(&response.body)
            ))),
            status => Err(GatewayError::transport_retryable(format!(
                "status {status}"
            ))),
        }
    }

    fn send_json<Req, Res>(
        &self,
        method: &str,
        path: &str,
        target: Option<ItemId>,
        request: Option<&Req>,
    ) -> GatewayResult<Res>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let body = self.send(method, path, target, request)?;
        serde_json::from_slice(&body)
            .map_err(|e| GatewayError::Protocol(format!("failed to decode response: {e}")))
    }

    fn list_path(filters: &ListFilters) -> String {
        let mut pairs = Vec::new();
        if let Some(status) = filters.status {
            let tag = match status {
                trove_core::ItemStatus::Found => "found",
                trove_core::ItemStatus::Lost => "lost",
            };
            pairs.push(format!("status={tag}"));
        }
        if let Some(category_id) = filters.category_id {
            pairs.push(format!("category_id={category_id}"));
        }
        if let Some(query) = &filters.query {
            pairs.push(format!("q={}", encode_query_component(query)));
        }

        if pairs.is_empty() {
            "/api/items".to_string()
        } else {
            format!("/api/items?{}", pairs.join("&"))
        }
    }
}

impl<C: HttpClient> RemoteGateway for HttpGateway<C> {
    fn create(&self, draft: &ItemDraft) -> GatewayResult<RemoteItem> {
        self.send_json("POST", "/post_item", None, Some(draft))
    }

    fn update(&self, id: ItemId, patch: &ItemPatch) -> GatewayResult<RemoteItem> {
        self.send_json(
            "PUT",
            &format!("/admin/items/edit/{id}"),
            Some(id),
            Some(patch),
        )
    }

    fn delete(&self, id: ItemId) -> GatewayResult<()> {
        // The delete endpoint returns an empty body on success
        self.send::<ItemPatch>("DELETE", &format!("/admin/items/delete/{id}"), Some(id), None)?;
        Ok(())
    }

    fn list(&self, filters: &ListFilters) -> GatewayResult<Vec<RemoteItem>> {
        self.send_json::<ItemPatch, _>("GET", &Self::list_path(filters), None, None)
    }
}

/// Percent-encodes a query-string component.
fn encode_query_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// A loopback HTTP client that routes requests directly to an in-process
/// server. Useful for testing without sockets.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a loopback client over the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }
}

/// Trait for in-process servers that handle loopback requests.
pub trait LoopbackServer {
    /// Handles a request for the given method and path (including query).
    fn handle(
        &self,
        method: &str,
        path: &str,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse, String>;
}

impl<S: LoopbackServer + Send + Sync> HttpClient for LoopbackClient<S> {
    fn request(
        &self,
        method: &str,
        url: &str,
        _bearer: Option<&str>,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse, String> {
        // Strip the scheme and host, keep the path
        let path = url
            .find("://")
            .and_then(|i| url[i + 3..].find('/').map(|j| &url[i + 3 + j..]))
            .unwrap_or(url);
        self.server.handle(method, path, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use trove_core::ItemStatus;

    struct TestClient {
        response: Mutex<Option<Result<HttpResponse, String>>>,
        requests: Mutex<Vec<(String, String, Option<String>)>>,
    }

    impl TestClient {
        fn new() -> Self {
            Self {
                response: Mutex::new(None),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn respond(&self, response: Result<HttpResponse, String>) {
            *self.response.lock() = Some(response);
        }
    }

    impl HttpClient for TestClient {
        fn request(
            &self,
            method: &str,
            url: &str,
            bearer: Option<&str>,
            _body: Option<&[u8]>,
        ) -> Result<HttpResponse, String> {
            self.requests.lock().push((
                method.to_string(),
                url.to_string(),
                bearer.map(str::to_string),
            ));
            self.response
                .lock()
                .clone()
                .unwrap_or(Err("no response set".into()))
        }
    }

    fn remote_item_json() -> Vec<u8> {
        serde_json::to_vec(&RemoteItem {
            id: 501,
            title: "Wallet".into(),
            description: "desc".into(),
            status: ItemStatus::Lost,
            location: "Library".into(),
            image_path: None,
            category_id: 7,
            created_at: 0,
            updated_at: 0,
        })
        .unwrap()
    }

    #[test]
    fn create_posts_to_post_item() {
        let client = TestClient::new();
        client.respond(Ok(HttpResponse::ok(remote_item_json())));

        let gateway = HttpGateway::new("https://found.example.com", client);
        gateway.set_token("secret");

        let draft = ItemDraft::new("Wallet", "desc", ItemStatus::Lost, "Library", 7);
        let item = gateway.create(&draft).unwrap();
        assert_eq!(item.id, 501);

        let requests = gateway.client.requests.lock();
        let (method, url, bearer) = &requests[0];
        assert_eq!(method, "POST");
        assert_eq!(url, "https://found.example.com/post_item");
        assert_eq!(bearer.as_deref(), Some("secret"));
    }

    #[test]
    fn transport_failure_is_retryable() {
        let client = TestClient::new();
        client.respond(Err("connection refused".into()));

        let gateway = HttpGateway::new("https://found.example.com", client);
        let result = gateway.delete(5);
        assert!(matches!(
            result,
            Err(GatewayError::Transport { retryable: true, .. })
        ));
    }

    #[test]
    fn missing_target_maps_to_conflict() {
        let client = TestClient::new();
        client.respond(Ok(HttpResponse::status(404)));

        let gateway = HttpGateway::new("https://found.example.com", client);
        let result = gateway.update(42, &ItemPatch::title("X"));
        assert!(matches!(result, Err(GatewayError::Conflict { id: 42 })));
    }

    #[test]
    fn auth_failure_is_rejected() {
        let client = TestClient::new();
        client.respond(Ok(HttpResponse::status(401)));

        let gateway = HttpGateway::new("https://found.example.com", client);
        let draft = ItemDraft::new("Wallet", "desc", ItemStatus::Lost, "Library", 7);
        let result = gateway.create(&draft);
        assert!(matches!(result, Err(GatewayError::Rejected(_))));
    }

    #[test]
    fn server_error_is_retryable() {
        let client = TestClient::new();
        client.respond(Ok(HttpResponse::status(503)));

        let gateway = HttpGateway::new("https://found.example.com", client);
        let result = gateway.list(&ListFilters::all());
        assert!(matches!(
            result,
            Err(GatewayError::Transport { retryable: true, .. })
        ));
    }

    #[test]
    fn garbage_body_is_protocol_error() {
        let client = TestClient::new();
        client.respond(Ok(HttpResponse::ok(b"not json".to_vec())));

        let gateway = HttpGateway::new("https://found.example.com", client);
        let draft = ItemDraft::new("Wallet", "desc", ItemStatus::Lost, "Library", 7);
        assert!(matches!(
            gateway.create(&draft),
            Err(GatewayError::Protocol(_))
        ));
    }

    #[test]
    fn list_builds_query_string() {
        let path = HttpGateway::<TestClient>::list_path(&ListFilters {
            status: Some(ItemStatus::Lost),
            category_id: Some(3),
            query: Some("blue backpack".into()),
        });
        assert_eq!(path, "/api/items?status=lost&category_id=3&q=blue%20backpack");

        let bare = HttpGateway::<TestClient>::list_path(&ListFilters::all());
        assert_eq!(bare, "/api/items");
    }

    #[test]
    fn loopback_strips_host() {
        struct Echo;
        impl LoopbackServer for Echo {
            fn handle(
                &self,
                _method: &str,
                path: &str,
                _body: Option<&[u8]>,
            ) -> Result<HttpResponse, String> {
                Ok(HttpResponse::ok(path.as_bytes().to_vec()))
            }
        }

        let client = LoopbackClient::new(Echo);
        let response = client
            .request("GET", "https://found.example.com/api/items", None, None)
            .unwrap();
        assert_eq!(response.body, b"/api/items");
    }
}
