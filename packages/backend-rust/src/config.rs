use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    /// Postgres connection string; the service falls back to the
    /// in-memory store when absent.
    pub database_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let database_url = parse_database_url(std::env::var("DATABASE_URL").ok());

        Self {
            host,
            port,
            log_level,
            database_url,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// A blank `DATABASE_URL` counts as unset.
fn parse_database_url(value: Option<String>) -> Option<String> {
    value.filter(|url| !url.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_database_url_is_unset() {
        assert_eq!(parse_database_url(None), None);
        assert_eq!(parse_database_url(Some(String::new())), None);
        assert_eq!(parse_database_url(Some("   ".to_string())), None);
        assert_eq!(
            parse_database_url(Some("postgres://localhost/drill".to_string())),
            Some("postgres://localhost/drill".to_string())
        );
    }
}
