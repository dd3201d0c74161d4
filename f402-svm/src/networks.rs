//! Well-known Solana clusters and token deployments.

use std::fmt;
use std::str::FromStr;

use solana_pubkey::{Pubkey, pubkey};

/// A Solana cluster this crate knows default endpoints and tokens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownCluster {
    /// Solana mainnet.
    MainnetBeta,
    /// Solana devnet.
    Devnet,
    /// Solana testnet.
    Testnet,
}

/// The requested cluster name is not a known cluster.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown cluster '{0}'")]
pub struct UnknownClusterError(String);

impl KnownCluster {
    /// The network name used on the wire.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MainnetBeta => "mainnet-beta",
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
        }
    }

    /// The public RPC endpoint for this cluster.
    #[must_use]
    pub const fn default_rpc_url(self) -> &'static str {
        match self {
            Self::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Self::Devnet => "https://api.devnet.solana.com",
            Self::Testnet => "https://api.testnet.solana.com",
        }
    }

    /// The Circle USDC mint on this cluster, if one is deployed.
    ///
    /// Mainnet: <https://solscan.io/token/EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v>.
    /// Devnet: <https://explorer.solana.com/address/4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU?cluster=devnet>.
    #[must_use]
    pub const fn usdc_mint(self) -> Option<Pubkey> {
        match self {
            Self::MainnetBeta => Some(pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v")),
            Self::Devnet => Some(pubkey!("4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU")),
            Self::Testnet => None,
        }
    }
}

impl fmt::Display for KnownCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KnownCluster {
    type Err = UnknownClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet-beta" => Ok(Self::MainnetBeta),
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            other => Err(UnknownClusterError(other.to_string())),
        }
    }
}
