//! Facilitator server configuration.
//!
//! Loads configuration from a TOML file with support for environment
//! variable expansion in string values. Variables use `$VAR` or `${VAR}`
//! syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 4000
//!
//! [timeouts]
//! get_requirements_ms = 500
//! supported_ms = 500
//!
//! [networks."devnet"]
//! admin_keypair_path = "$ADMIN_KEYPAIR_PATH"
//!
//! [networks."mainnet-beta"]
//! rpc_url = "https://my-rpc.example.com"
//! admin_keypair_path = "/etc/f402/admin.json"
//! usdc_mint = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to configuration file (default: `config.toml`)
//! - `HOST` — Override server bind address
//! - `PORT` — Override server port
//! - Values referenced by `$VAR` in the config file

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dispatcher::Timeouts;

/// Top-level facilitator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilitatorConfig {
    /// Server bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Server port (default: `4000`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Fan-out deadlines.
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Settlement networks keyed by cluster name (e.g. `devnet`).
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
}

/// Deadlines for the concurrent fan-out operations, in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Deadline for `/accepts` requirement augmentation.
    #[serde(default = "default_timeout_ms")]
    pub get_requirements_ms: u64,

    /// Deadline for `/supported` capability listing.
    #[serde(default = "default_timeout_ms")]
    pub supported_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            get_requirements_ms: default_timeout_ms(),
            supported_ms: default_timeout_ms(),
        }
    }
}

impl From<TimeoutConfig> for Timeouts {
    fn from(value: TimeoutConfig) -> Self {
        Self {
            get_requirements: Duration::from_millis(value.get_requirements_ms),
            supported: Duration::from_millis(value.supported_ms),
        }
    }
}

/// Per-network settlement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// HTTP RPC endpoint URL. Defaults to the cluster's public endpoint.
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Path to the settlement authority keypair (Solana CLI JSON format).
    /// Supports `$VAR` / `${VAR}` for environment variable expansion.
    pub admin_keypair_path: String,

    /// USDC mint override. Defaults to the cluster's well-known mint.
    #[serde(default)]
    pub usdc_mint: Option<String>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0))
}

fn default_port() -> u16 {
    4000
}

fn default_timeout_ms() -> u64 {
    500
}

impl FacilitatorConfig {
    /// Loads configuration from the path given by the `CONFIG` environment
    /// variable, falling back to `config.toml` in the current directory.
    ///
    /// After loading, all string values with `$VAR` / `${VAR}` references
    /// are expanded from the process environment. `HOST` and `PORT` env
    /// vars override the file values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "config.toml".to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path)?
        } else {
            // If no config file exists, use empty TOML and rely on defaults
            String::new()
        };

        // Expand environment variables in the raw TOML string
        let expanded = expand_env_vars(&content);

        let mut config: Self = toml::from_str(&expanded)?;

        // Allow HOST / PORT env overrides
        if let Ok(host) = std::env::var("HOST") {
            if let Ok(addr) = host.parse() {
                config.host = addr;
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }

        Ok(config)
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            let braced = chars.peek() == Some(&'{');
            if braced {
                chars.next(); // consume '{'
            }

            let mut var_name = String::new();
            while let Some(&c) = chars.peek() {
                if braced {
                    if c == '}' {
                        chars.next();
                        break;
                    }
                } else if !c.is_ascii_alphanumeric() && c != '_' {
                    break;
                }
                var_name.push(c);
                chars.next();
            }

            if var_name.is_empty() {
                result.push('$');
                if braced {
                    result.push('{');
                }
            } else if let Ok(val) = std::env::var(&var_name) {
                result.push_str(&val);
            } else {
                // Leave unresolved variable as-is
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&var_name);
                if braced {
                    result.push('}');
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}
