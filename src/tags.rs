//! Standard tag keys recorded against server spans.
//!
//! Host integrations should use these so collectors see a consistent tag
//! vocabulary regardless of which framework fed the core.

/// The deployment environment the server runs in.
pub const SERVER_ENV: &str = "server.env";

/// The `Host` header of the inbound request.
pub const SERVER_HOST: &str = "server.host";

/// The request URI.
pub const SERVER_URI: &str = "server.uri";

/// The request query string, serialized by the host.
pub const SERVER_QUERY: &str = "server.query";

/// The HTTP status code of the response.
pub const SERVER_RESPONSE_STATUS: &str = "server.response.http_status_code";
