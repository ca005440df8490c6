//! Configuration for the CreatorsLab API
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// CreatorsLab - engagement task marketplace core API
#[derive(Parser, Debug, Clone)]
#[command(name = "creatorslab")]
#[command(about = "CreatorsLab core API for engagement tasks and the $CLS points ledger")]
pub struct Args {
    /// Unique node identifier for this API instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "creatorslab")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "86400")]
    pub jwt_expiry_seconds: u64,

    /// Solana JSON-RPC endpoint for wallet balance reads
    #[arg(long, env = "SOLANA_RPC_URL", default_value = "https://api.mainnet-beta.solana.com")]
    pub solana_rpc_url: String,

    /// Lamports-per-point rate for converting wallet balance to $CLS
    #[arg(long, env = "CONVERT_LAMPORTS_PER_POINT", default_value = "1000000")]
    pub convert_lamports_per_point: u64,

    /// Enable development mode (tolerates missing MongoDB, default JWT secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Request timeout in milliseconds for upstream RPC calls
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
    pub request_timeout_ms: u64,
}

impl Args {
    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> String {
        if self.dev_mode {
            self.jwt_secret
                .clone()
                .unwrap_or_else(|| "dev-only-insecure-secret".to_string())
        } else {
            self.jwt_secret
                .clone()
                .expect("JWT_SECRET is required in production mode")
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if self.convert_lamports_per_point == 0 {
            return Err("CONVERT_LAMPORTS_PER_POINT must be non-zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        // try_parse_from so a parse error fails the test instead of the
        // whole process
        Args::try_parse_from(argv).expect("arguments should parse")
    }

    #[test]
    fn test_dev_mode_flag_takes_no_value() {
        let args = parse(&["creatorslab", "--dev-mode"]);
        assert!(args.dev_mode);
        assert!(Args::try_parse_from(["creatorslab", "--dev-mode", "true"]).is_err());
    }

    #[test]
    fn test_dev_mode_jwt_fallback() {
        let args = parse(&["creatorslab", "--dev-mode"]);
        assert_eq!(args.jwt_secret(), "dev-only-insecure-secret");
    }

    #[test]
    fn test_validate_requires_jwt_in_production() {
        let args = parse(&["creatorslab"]);
        assert!(args.validate().is_err());

        let args = parse(&["creatorslab", "--jwt-secret", "s3cret"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_convert_rate() {
        let args = parse(&[
            "creatorslab",
            "--dev-mode",
            "--convert-lamports-per-point",
            "0",
        ]);
        assert!(args.validate().is_err());
    }
}
