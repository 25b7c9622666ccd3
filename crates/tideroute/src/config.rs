use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

use crate::error::{RouterError, RouterResult};

/// Router configuration loaded from a TOML file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouterConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,

    /// Commitment level for reads ("processed", "confirmed" or "finalized")
    #[serde(default = "default_commitment")]
    pub commitment: String,

    /// Sustained RPC request rate
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Requests allowed in a burst above the sustained rate
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Deadline for one routing request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Slippage tolerance used to derive minimum output (basis points)
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u64,

    /// Upper bound on tick arrays loaded on demand while quoting one CLMM pool
    #[serde(default = "default_max_tick_array_fetches")]
    pub max_tick_array_fetches: usize,

    /// Signer used by `swap`
    #[serde(default)]
    pub keypair_path: Option<String>,

    #[serde(default)]
    pub programs: ProgramIds,
}

/// Program IDs and well-known accounts the encoders reference
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProgramIds {
    #[serde(with = "pubkey_serde")]
    pub pump_amm: Pubkey,

    #[serde(with = "pubkey_serde")]
    pub pump_global_config: Pubkey,

    #[serde(with = "pubkey_serde")]
    pub pump_fee_recipient: Pubkey,

    #[serde(with = "pubkey_serde")]
    pub pump_fee_recipient_token_account: Pubkey,

    #[serde(with = "pubkey_serde")]
    pub pump_event_authority: Pubkey,

    #[serde(with = "pubkey_serde")]
    pub raydium_cpmm: Pubkey,

    #[serde(with = "pubkey_serde")]
    pub raydium_clmm: Pubkey,

    #[serde(with = "pubkey_serde")]
    pub token_program: Pubkey,

    #[serde(with = "pubkey_serde")]
    pub token_2022_program: Pubkey,

    #[serde(with = "pubkey_serde")]
    pub memo_program: Pubkey,

    #[serde(with = "pubkey_serde")]
    pub associated_token_program: Pubkey,

    #[serde(with = "pubkey_serde")]
    pub system_program: Pubkey,
}

impl ProgramIds {
    pub fn mainnet() -> Self {
        Self {
            pump_amm: pubkey!("pAMMBay6oceH9fJKBRHGP5D4bD4sWpmSwMn52FMfXEA"),
            pump_global_config: pubkey!("ADyA8hdefvWN2dbGGWFotbzWxrAvLW83WG6QCVXvJKqw"),
            pump_fee_recipient: pubkey!("62qc2CNXwrYqQScmEdiZFFAnJR262PxWEuNQtxfafNgV"),
            pump_fee_recipient_token_account: pubkey!(
                "94qWNrtmfn42h3ZjUZwWvK1MEiuyXawxXgU3JxSnpnKR"
            ),
            pump_event_authority: pubkey!("GS4CU59F31iL7aR2Q8zVS8DRrcRnXX1yjQ66TqNVQnaR"),
            raydium_cpmm: pubkey!("CPMMoo8L3F4NbTegBCKVNunggL7H1ZpdTHKxQB5qKP1C"),
            raydium_clmm: pubkey!("CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK"),
            token_program: spl_token::ID,
            token_2022_program: pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb"),
            memo_program: pubkey!("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr"),
            associated_token_program: spl_associated_token_account::ID,
            system_program: solana_sdk::system_program::ID,
        }
    }
}

impl Default for ProgramIds {
    fn default() -> Self {
        Self::mainnet()
    }
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_burst() -> u32 {
    20
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_slippage_bps() -> u64 {
    100
}

fn default_max_tick_array_fetches() -> usize {
    8
}

impl RouterConfig {
    /// Public mainnet endpoint with conservative rate limits
    pub fn mainnet() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            commitment: default_commitment(),
            requests_per_second: default_requests_per_second(),
            burst: default_burst(),
            timeout_secs: default_timeout_secs(),
            slippage_bps: default_slippage_bps(),
            max_tick_array_fetches: default_max_tick_array_fetches(),
            keypair_path: None,
            programs: ProgramIds::mainnet(),
        }
    }

    /// Local validator with cloned mainnet programs
    pub fn localnet() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8899".to_string(),
            requests_per_second: 1_000,
            burst: 1_000,
            timeout_secs: 10,
            ..Self::mainnet()
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> RouterResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RouterError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)
            .map_err(|e| RouterError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> RouterResult<Self> {
        let config: RouterConfig = toml::from_str(content)
            .map_err(|e| RouterError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> RouterResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RouterError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path.as_ref(), content).map_err(|e| {
            RouterError::Config(format!(
                "Failed to write config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    pub fn validate(&self) -> RouterResult<()> {
        if self.rpc_url.is_empty() {
            return Err(RouterError::Config("rpc_url must not be empty".to_string()));
        }
        self.commitment_config()?;
        if self.requests_per_second == 0 {
            return Err(RouterError::Config(
                "requests_per_second must be greater than 0".to_string(),
            ));
        }
        if self.burst < 1 {
            return Err(RouterError::Config("burst must be at least 1".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(RouterError::Config("timeout_secs must be greater than 0".to_string()));
        }
        if self.slippage_bps > 10_000 {
            return Err(RouterError::Config(format!(
                "slippage_bps {} exceeds 10000 (100%)",
                self.slippage_bps
            )));
        }
        Ok(())
    }

    pub fn commitment_config(&self) -> RouterResult<CommitmentConfig> {
        let commitment = CommitmentLevel::from_str(&self.commitment).map_err(|_| {
            RouterError::Config(format!("Unknown commitment level {}", self.commitment))
        })?;
        Ok(CommitmentConfig { commitment })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn with_slippage_bps(mut self, slippage_bps: u64) -> Self {
        self.slippage_bps = slippage_bps;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_rate_limit(mut self, requests_per_second: u32, burst: u32) -> Self {
        self.requests_per_second = requests_per_second;
        self.burst = burst;
        self
    }

    pub fn with_keypair_path(mut self, keypair_path: impl Into<String>) -> Self {
        self.keypair_path = Some(keypair_path.into());
        self
    }

    pub fn with_programs(mut self, programs: ProgramIds) -> Self {
        self.programs = programs;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

// Pubkeys as base58 strings
mod pubkey_serde {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(pubkey: &Pubkey, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&pubkey.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Pubkey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Pubkey::from_str(&s).map_err(serde::de::Error::custom)
    }
}
