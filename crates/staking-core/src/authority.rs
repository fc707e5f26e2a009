// staking-core/src/authority.rs

use crate::{types::BlockNumber, CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use staking_crypto::Address;

/// Who is calling and at which block height.
///
/// The host execution environment builds one of these for every inbound
/// call; components never read ambient state to learn either value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub block: BlockNumber,
}

impl CallContext {
    pub fn new(caller: Address, block: BlockNumber) -> Self {
        Self { caller, block }
    }
}

/// Capability proving the current call comes from the per-block system caller.
///
/// Only [`SystemAuthority::authorize_system`] can construct one.
#[derive(Debug)]
pub struct SystemCall {
    block: BlockNumber,
}

impl SystemCall {
    pub fn block(&self) -> BlockNumber {
        self.block
    }
}

/// Capability proving the current call comes from the bridge
#[derive(Debug)]
pub struct BridgeCall {
    _private: (),
}

/// Capability proving the current call comes from the governance module
#[derive(Debug)]
pub struct GovernanceCall {
    _private: (),
}

/// Configurable privileged identities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemAuthority {
    system: Address,
    admin: Address,
    bridge: Option<Address>,
    governance: Option<Address>,
}

impl SystemAuthority {
    pub fn new(system: Address, admin: Address) -> CoreResult<Self> {
        if system.is_zero() || admin.is_zero() {
            return Err(CoreError::ZeroAddress);
        }
        Ok(Self {
            system,
            admin,
            bridge: None,
            governance: None,
        })
    }

    pub fn with_bridge(mut self, bridge: Address) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn with_governance(mut self, governance: Address) -> Self {
        self.governance = Some(governance);
        self
    }

    pub fn system(&self) -> Address {
        self.system
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn bridge(&self) -> Option<Address> {
        self.bridge
    }

    pub fn governance(&self) -> Option<Address> {
        self.governance
    }

    pub fn is_admin(&self, caller: &Address) -> bool {
        self.admin == *caller
    }

    pub fn authorize_system(&self, ctx: &CallContext) -> CoreResult<SystemCall> {
        if ctx.caller != self.system {
            return Err(CoreError::Unauthorized {
                caller: ctx.caller,
                role: "system",
            });
        }
        Ok(SystemCall { block: ctx.block })
    }

    pub fn authorize_bridge(&self, ctx: &CallContext) -> CoreResult<BridgeCall> {
        match self.bridge {
            Some(bridge) if bridge == ctx.caller => Ok(BridgeCall { _private: () }),
            _ => Err(CoreError::Unauthorized {
                caller: ctx.caller,
                role: "bridge",
            }),
        }
    }

    pub fn authorize_governance(&self, ctx: &CallContext) -> CoreResult<GovernanceCall> {
        match self.governance {
            Some(governance) if governance == ctx.caller => {
                Ok(GovernanceCall { _private: () })
            }
            _ => Err(CoreError::Unauthorized {
                caller: ctx.caller,
                role: "governance",
            }),
        }
    }

    pub fn ensure_admin(&self, ctx: &CallContext) -> CoreResult<()> {
        if !self.is_admin(&ctx.caller) {
            return Err(CoreError::Unauthorized {
                caller: ctx.caller,
                role: "admin",
            });
        }
        Ok(())
    }

    /// Rotate the per-block system identity (admin only)
    pub fn set_system(&mut self, ctx: &CallContext, system: Address) -> CoreResult<()> {
        self.ensure_admin(ctx)?;
        if system.is_zero() {
            return Err(CoreError::ZeroAddress);
        }
        tracing::info!(old = %self.system, new = %system, "system caller rotated");
        self.system = system;
        Ok(())
    }

    pub fn set_bridge(&mut self, ctx: &CallContext, bridge: Address) -> CoreResult<()> {
        self.ensure_admin(ctx)?;
        if bridge.is_zero() {
            return Err(CoreError::ZeroAddress);
        }
        self.bridge = Some(bridge);
        Ok(())
    }

    pub fn set_governance(&mut self, ctx: &CallContext, governance: Address) -> CoreResult<()> {
        self.ensure_admin(ctx)?;
        if governance.is_zero() {
            return Err(CoreError::ZeroAddress);
        }
        self.governance = Some(governance);
        Ok(())
    }
}
