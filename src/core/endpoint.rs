use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Fallback service name used when the host supplies an empty one.
pub const DEFAULT_SERVICE_NAME: &str = "unknown";

/// Static description of the service instance emitting trace data.
///
/// Value object compared by field equality; immutable after construction
/// and shared by clone across all spans in a trace. A port of `0` means
/// "unknown".
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ipv4: Option<Ipv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ipv6: Option<Ipv6Addr>,
    #[serde(skip_serializing_if = "is_zero_port")]
    port: u16,
}

fn is_zero_port(port: &u16) -> bool {
    *port == 0
}

impl Endpoint {
    /// Create an endpoint for the given service name, address and port.
    ///
    /// An empty service name falls back to [`DEFAULT_SERVICE_NAME`].
    pub fn new(service_name: impl Into<String>, ip: IpAddr, port: u16) -> Self {
        let service_name = service_name.into();
        let service_name = if service_name.is_empty() {
            DEFAULT_SERVICE_NAME.to_owned()
        } else {
            service_name
        };
        let (ipv4, ipv6) = match ip {
            IpAddr::V4(addr) => (Some(addr), None),
            IpAddr::V6(addr) => (None, Some(addr)),
        };
        Endpoint {
            service_name,
            ipv4,
            ipv6,
            port,
        }
    }

    /// The service name reported to the collector.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// The endpoint's address.
    pub fn ip(&self) -> IpAddr {
        match (self.ipv4, self.ipv6) {
            (Some(addr), _) => IpAddr::V4(addr),
            (_, Some(addr)) => IpAddr::V6(addr),
            _ => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }

    /// The endpoint's port, `0` if unknown.
    pub fn port(&self) -> u16 {
        self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_service_name_falls_back() {
        let endpoint = Endpoint::new("", IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
        assert_eq!(endpoint.service_name(), DEFAULT_SERVICE_NAME);
    }

    #[test]
    fn compares_by_field_equality() {
        let a = Endpoint::new("users", IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 8080);
        let b = Endpoint::new("users", IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 8080);
        let c = Endpoint::new("users", IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)), 8080);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn serializes_in_zipkin_shape() {
        let endpoint = Endpoint::new("users", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080);
        assert_eq!(
            serde_json::to_string(&endpoint).unwrap(),
            "{\"serviceName\":\"users\",\"ipv4\":\"127.0.0.1\",\"port\":8080}"
        );
    }

    #[test]
    fn unknown_port_is_omitted_on_the_wire() {
        let endpoint = Endpoint::new("users", IpAddr::V6(Ipv6Addr::LOCALHOST), 0);
        assert_eq!(
            serde_json::to_string(&endpoint).unwrap(),
            "{\"serviceName\":\"users\",\"ipv6\":\"::1\"}"
        );
    }
}
