// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key policies
//!
//! Replica key policies are never inherited from the primary: the grants
//! for the storage service and the administrative principal must be
//! declared explicitly and are validated at replication time.

use crate::error::KeyError;
use serde::{Deserialize, Serialize};

/// Operations the store performs against a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOp {
    Encrypt,
    Decrypt,
    GenerateDataKey,
}

impl KeyOp {
    pub fn action(self) -> &'static str {
        match self {
            KeyOp::Encrypt => "kms:Encrypt",
            KeyOp::Decrypt => "kms:Decrypt",
            KeyOp::GenerateDataKey => "kms:GenerateDataKey",
        }
    }
}

/// Actions a replica policy must grant the storage service
pub const REPLICA_SERVICE_ACTIONS: [&str; 3] = ["kms:Encrypt", "kms:Decrypt", "kms:GenerateDataKey"];

/// One allow statement in a key policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStatement {
    pub sid: String,
    pub principal: String,
    /// Actions, with trailing-`*` wildcards ("kms:*", "kms:GenerateDataKey*")
    pub actions: Vec<String>,
}

impl PolicyStatement {
    pub fn new(
        sid: impl Into<String>,
        principal: impl Into<String>,
        actions: &[&str],
    ) -> Self {
        Self {
            sid: sid.into(),
            principal: principal.into(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn grants(&self, principal: &str, action: &str) -> bool {
        if self.principal != principal && self.principal != "*" {
            return false;
        }
        self.actions.iter().any(|pattern| matches_action(pattern, action))
    }
}

fn matches_action(pattern: &str, action: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => action.starts_with(prefix),
        None => pattern == action,
    }
}

/// An explicit key policy: a list of allow statements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPolicy {
    pub statements: Vec<PolicyStatement>,
}

impl KeyPolicy {
    pub fn new(statements: Vec<PolicyStatement>) -> Self {
        Self { statements }
    }

    /// The policy a secondary-region replica needs: the storage service can
    /// encrypt/decrypt/generate data keys, and the administrative principal
    /// has full control.
    pub fn replica_default(service_principal: &str, admin_principal: &str) -> Self {
        Self::new(vec![
            PolicyStatement::new(
                "Allow storage service",
                service_principal,
                &["kms:Encrypt", "kms:Decrypt", "kms:GenerateDataKey*", "kms:DescribeKey"],
            ),
            PolicyStatement::new("Allow administration", admin_principal, &["kms:*"]),
        ])
    }

    pub fn allows(&self, principal: &str, action: &str) -> bool {
        self.statements.iter().any(|s| s.grants(principal, action))
    }

    /// Check the grants a replica policy must carry explicitly
    pub fn validate_for_replica(
        &self,
        service_principal: &str,
        admin_principal: &str,
    ) -> Result<(), KeyError> {
        for action in REPLICA_SERVICE_ACTIONS {
            if !self.allows(service_principal, action) {
                return Err(KeyError::PolicyMissingGrant {
                    principal: service_principal.to_string(),
                    action: action.to_string(),
                });
            }
        }
        // Full administrative control, spot-checked through two actions only
        // a kms:* grant covers
        for action in ["kms:PutKeyPolicy", "kms:ScheduleKeyDeletion"] {
            if !self.allows(admin_principal, action) {
                return Err(KeyError::PolicyMissingGrant {
                    principal: admin_principal.to_string(),
                    action: action.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
