use std::collections::HashMap;

use parking_lot::RwLock;
use polycall_error::CryptonomicGuid;

use crate::isolation::IsolationLevel;
use crate::mask::PermissionMask;

/// `spec.md` §3 "Identity & permission": `{identity_id, role set, attached
/// policy set}`. The "policy set" is represented here as the resolved
/// permission mask and isolation level a caller presents to the ACL.
#[derive(Debug, Clone)]
pub struct Identity {
    pub identity_id: String,
    pub roles: Vec<String>,
    pub permission_mask: PermissionMask,
    pub isolation: IsolationLevel,
}

impl Identity {
    pub fn new(identity_id: impl Into<String>, permission_mask: PermissionMask, isolation: IsolationLevel) -> Self {
        Self { identity_id: identity_id.into(), roles: Vec::new(), permission_mask, isolation }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }
}

/// An opaque credential returned by `issue_token` (`spec.md` §6), carrying
/// the issuing identity's mask and isolation level so `check_permission`
/// doesn't need to re-resolve the identity on every call.
#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub guid: CryptonomicGuid,
    pub permission_mask: PermissionMask,
    pub isolation: IsolationLevel,
}

/// Issues and tracks live tokens. Revocation removes a token from the live
/// set without touching the identity it was issued for.
#[derive(Default)]
pub struct TokenIssuer {
    live: RwLock<HashMap<CryptonomicGuid, String>>,
}

impl TokenIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, identity: &Identity) -> Token {
        let guid = CryptonomicGuid::generate(&identity.identity_id, self.live.read().len() as u64);
        self.live.write().insert(guid, identity.identity_id.clone());
        Token { guid, permission_mask: identity.permission_mask, isolation: identity.isolation }
    }

    pub fn revoke(&self, token: &Token) {
        self.live.write().remove(&token.guid);
    }

    pub fn is_live(&self, token: &Token) -> bool {
        self.live.read().contains_key(&token.guid)
    }
}
