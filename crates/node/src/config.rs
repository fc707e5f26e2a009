// node/src/config.rs
use crate::runtime::GenesisValidator;
use crate::{RuntimeError, RuntimeResult};
use serde::{Deserialize, Serialize};
use staking_core::{Amount, StakingParams, SystemAuthority, ValidatorRewardCurve};
use staking_crypto::Address;
use storage::{PruningMode, StoreConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub staking: StakingConfig,
    pub authority: AuthorityConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genesis: Vec<GenesisConfig>,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Protocol constants; stakes are whole tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingConfig {
    pub epoch_duration: u64,
    pub stake_withdraw_disallow_period: u64,
    pub collect_round_length: u64,
    pub candidate_min_stake: u64,
    pub delegator_min_stake: u64,
    pub max_validators: usize,
    pub max_candidates: usize,
    pub max_delegators_per_pool: usize,
    pub validator_ban_duration: u64,
    pub delegators_ban_duration: u64,
    pub malice_report_max_age: u64,
    pub reward_floor_percent: u64,
    pub reward_initial_percent: u64,
    pub reward_decay_epochs: u64,
    pub token_inflation_bps: u64,
    pub blocks_per_year: u64,
    /// Staking address of the pool exempt from ejection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unremovable: Option<String>,
    /// Finalize a proposed set at the next block instead of waiting for the host
    pub auto_finalize: bool,
}

/// Privileged identities as hex addresses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityConfig {
    pub system: String,
    pub admin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub governance: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub staking_address: String,
    pub mining_address: String,
    /// Whole tokens
    pub stake: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub enabled: bool,
    pub path: String,
    pub cache_size_mb: u64,
    pub checkpoint_interval: u64,
    /// Checkpoints kept on disk; all of them when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_checkpoints: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let params = StakingParams::default();
        Self {
            staking: StakingConfig {
                epoch_duration: params.epoch_duration,
                stake_withdraw_disallow_period: params.stake_withdraw_disallow_period,
                collect_round_length: params.collect_round_length,
                candidate_min_stake: 20_000,
                delegator_min_stake: 1_000,
                max_validators: params.max_validators,
                max_candidates: params.max_candidates,
                max_delegators_per_pool: params.max_delegators_per_pool,
                validator_ban_duration: params.validator_ban_duration,
                delegators_ban_duration: params.delegators_ban_duration,
                malice_report_max_age: params.malice_report_max_age,
                reward_floor_percent: params.reward_curve.floor_percent,
                reward_initial_percent: params.reward_curve.initial_percent,
                reward_decay_epochs: params.reward_curve.decay_epochs,
                token_inflation_bps: params.token_inflation_bps,
                blocks_per_year: params.blocks_per_year,
                unremovable: None,
                auto_finalize: true,
            },
            authority: AuthorityConfig {
                system: Address::derive(b"system").to_hex(),
                admin: Address::derive(b"admin").to_hex(),
                bridge: None,
                governance: None,
            },
            genesis: vec![],
            storage: StorageConfig {
                enabled: true,
                path: "./data/staking".into(),
                cache_size_mb: 64,
                checkpoint_interval: 120,
                keep_checkpoints: Some(16),
            },
            logging: LoggingConfig {
                level: "info".into(),
            },
        }
    }
}

impl NodeConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Validated protocol parameters
    pub fn staking_params(&self) -> RuntimeResult<StakingParams> {
        let s = &self.staking;
        let params = StakingParams {
            epoch_duration: s.epoch_duration,
            stake_withdraw_disallow_period: s.stake_withdraw_disallow_period,
            collect_round_length: s.collect_round_length,
            candidate_min_stake: Amount::from_tokens(s.candidate_min_stake),
            delegator_min_stake: Amount::from_tokens(s.delegator_min_stake),
            max_validators: s.max_validators,
            max_candidates: s.max_candidates,
            max_delegators_per_pool: s.max_delegators_per_pool,
            validator_ban_duration: s.validator_ban_duration,
            delegators_ban_duration: s.delegators_ban_duration,
            malice_report_max_age: s.malice_report_max_age,
            reward_curve: ValidatorRewardCurve {
                floor_percent: s.reward_floor_percent,
                initial_percent: s.reward_initial_percent,
                decay_epochs: s.reward_decay_epochs,
            },
            token_inflation_bps: s.token_inflation_bps,
            blocks_per_year: s.blocks_per_year,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn authority(&self) -> RuntimeResult<SystemAuthority> {
        let a = &self.authority;
        let mut authority = SystemAuthority::new(parse_address(&a.system)?, parse_address(&a.admin)?)?;
        if let Some(bridge) = &a.bridge {
            authority = authority.with_bridge(parse_address(bridge)?);
        }
        if let Some(governance) = &a.governance {
            authority = authority.with_governance(parse_address(governance)?);
        }
        Ok(authority)
    }

    pub fn genesis_validators(&self) -> RuntimeResult<Vec<GenesisValidator>> {
        self.genesis
            .iter()
            .map(|g| {
                Ok(GenesisValidator {
                    staking_address: parse_address(&g.staking_address)?,
                    mining_address: parse_address(&g.mining_address)?,
                    stake: Amount::from_tokens(g.stake),
                })
            })
            .collect()
    }

    pub fn unremovable(&self) -> RuntimeResult<Option<Address>> {
        self.staking
            .unremovable
            .as_deref()
            .map(parse_address)
            .transpose()
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            path: self.storage.path.clone(),
            cache_capacity: self.storage.cache_size_mb * 1024 * 1024,
            pruning_mode: match self.storage.keep_checkpoints {
                Some(keep) => PruningMode::KeepLast(keep),
                None => PruningMode::Archive,
            },
            ..Default::default()
        }
    }
}

fn parse_address(s: &str) -> RuntimeResult<Address> {
    Address::from_hex(s).map_err(|e| RuntimeError::InvalidConfig(format!("address {}: {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let mut config = NodeConfig::default();
        config.genesis.push(GenesisConfig {
            staking_address: Address::derive(b"pool").to_hex(),
            mining_address: Address::derive(b"miner").to_hex(),
            stake: 20_000,
        });
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("[staking]"));
        assert!(text.contains("[authority]"));
        assert!(text.contains("[[genesis]]"));

        let parsed: NodeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.staking_params().unwrap(), StakingParams::default());
        assert_eq!(parsed.genesis_validators().unwrap()[0].stake, Amount::from_tokens(20_000));
        assert_eq!(
            parsed.authority().unwrap().system(),
            Address::derive(b"system")
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = NodeConfig::default();
        config.authority.admin = "0xnothex".into();
        assert!(matches!(config.authority(), Err(RuntimeError::InvalidConfig(_))));

        let mut config = NodeConfig::default();
        config.staking.collect_round_length = 7;
        assert!(config.staking_params().is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("node.toml");
        let path = path.to_str().unwrap();
        let mut config = NodeConfig::default();
        config.storage.keep_checkpoints = None;
        config.to_file(path).unwrap();

        let loaded = NodeConfig::from_file(path).unwrap();
        assert_eq!(loaded.store_config().pruning_mode, PruningMode::Archive);
        assert_eq!(loaded.logging.level, "info");
    }
}
