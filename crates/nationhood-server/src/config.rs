//! Command-line and environment configuration.

use std::net::SocketAddr;

use clap::Parser;
use nationhood_db::DbConfig;

/// Nationhood API server
#[derive(Parser, Debug, Clone)]
#[command(name = "nationhood-server")]
#[command(about = "Nations, membership and territory claims over HTTP")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "NATIONHOOD_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// SurrealDB endpoint (`ws://host:port`, or `mem://` for an
    /// in-process store)
    #[arg(long, env = "DATABASE_URL", default_value = "ws://127.0.0.1:8000")]
    pub database_url: String,

    /// SurrealDB namespace
    #[arg(long, env = "DATABASE_NS", default_value = "nationhood")]
    pub database_ns: String,

    /// SurrealDB database
    #[arg(long, env = "DATABASE_DB", default_value = "main")]
    pub database_db: String,

    /// Root user for a remote SurrealDB
    #[arg(long, env = "DATABASE_USER")]
    pub database_user: Option<String>,

    /// Root password for a remote SurrealDB
    #[arg(long, env = "DATABASE_PASSWORD")]
    pub database_password: Option<String>,

    /// Tracing filter directives, used when `RUST_LOG` is unset
    #[arg(long, env = "LOG_FILTER", default_value = "nationhood=info,tower_http=info")]
    pub log_filter: String,
}

impl Args {
    /// Database settings. Credentials are used only when both the user
    /// and the password are set.
    pub fn db_config(&self) -> DbConfig {
        let credentials = match (&self.database_user, &self.database_password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            _ => None,
        };
        DbConfig {
            url: self.database_url.clone(),
            namespace: self.database_ns.clone(),
            database: self.database_db.clone(),
            credentials,
        }
    }
}
