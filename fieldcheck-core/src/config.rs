//! Server address configuration: env `HOST`/`PORT`, overridable by command-line flags.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Reads `HOST` and `PORT`. Unset or unparsable values fall back to the defaults.
    pub fn from_env(default_host: &str, default_port: u16) -> Self {
        Self::from_lookup(default_host, default_port, |k| std::env::var(k).ok())
    }

    fn from_lookup(
        default_host: &str,
        default_port: u16,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let host = lookup("HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| default_host.to_string());
        let port = lookup("PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(default_port);
        Self { host, port }
    }

    /// Flags given on the command line win over env.
    pub fn with_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(h) = host {
            self.host = h;
        }
        if let Some(p) = port {
            self.port = p;
        }
        self
    }
}

/// `host:port`, with IPv6 literals bracketed (`[::1]:8000`) so the string binds.
impl fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_values_used() {
        let cfg = ServerConfig::from_lookup("127.0.0.1", 8000, |k| match k {
            "HOST" => Some("0.0.0.0".into()),
            "PORT" => Some("9090".into()),
            _ => None,
        });
        assert_eq!(cfg, ServerConfig::new("0.0.0.0", 9090));
    }

    #[test]
    fn bad_port_falls_back() {
        let cfg = ServerConfig::from_lookup("127.0.0.1", 8000, |k| {
            (k == "PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(cfg, ServerConfig::new("127.0.0.1", 8000));
    }

    #[test]
    fn flags_override_env() {
        let cfg = ServerConfig::new("0.0.0.0", 9090).with_overrides(None, Some(1234));
        assert_eq!(cfg.to_string(), "0.0.0.0:1234");
    }

    #[test]
    fn ipv6_host_bracketed() {
        assert_eq!(ServerConfig::new("::1", 8000).to_string(), "[::1]:8000");
        assert_eq!(ServerConfig::new("[::1]", 8000).to_string(), "[::1]:8000");
        let addr: std::net::SocketAddr = ServerConfig::new("::1", 8000).to_string().parse().unwrap();
        assert!(addr.is_ipv6());
    }
}
