//! Result type alias for request layer operations.

use super::client_error::ClientError;

/// Type alias for Results using ClientError.
///
/// # Example
///
/// ```ignore
/// use flowlink::error::ClientResult;
///
/// async fn load_apps(client: &ApiClient) -> ClientResult<serde_json::Value> {
///     client.request_json("/apps", RequestOptions::get()).await
/// }
/// ```
pub type ClientResult<T> = Result<T, ClientError>;
