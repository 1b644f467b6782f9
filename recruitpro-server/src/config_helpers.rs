use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use recruitpro_db::DbConnectionConfig;

/// Build database connection config from application config.
pub fn database_config_from_config(cfg: &recruitpro_config::Config) -> DbConnectionConfig {
    if let Some(path) = &cfg.database.path {
        return DbConnectionConfig::new(path);
    }
    match DbConnectionConfig::from_env("RECRUITPRO") {
        Ok(config) => config,
        Err(error) => {
            tracing::warn!(%error, "falling back to in-memory sqlite database");
            DbConnectionConfig::new("sqlite::memory:")
        }
    }
}

/// Parse host:port into a SocketAddr, with fallback to 0.0.0.0.
pub fn parse_bind_address(host: &str, port: u16) -> SocketAddr {
    host.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, port))
        .or_else(|_| host.parse::<SocketAddr>())
        .or_else(|_| {
            host.parse::<Ipv6Addr>()
                .map(|ip| SocketAddr::new(IpAddr::V6(ip), port))
        })
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], port)))
}
