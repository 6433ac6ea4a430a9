//! Group identifiers and the V1 → V2 migration derivation.
//!
//! A V2 group is identified by a 32-byte id derived from its master key. A
//! legacy V1 group that migrates keeps its conversation but gets a master key
//! derived from its V1 id, so every device computes the same V2 id for it.

use serde::{Deserialize, Serialize};

use crate::constants::{
    GROUP_MASTER_KEY_LEN, GROUP_V1_ID_LEN, GROUP_V2_ID_LEN, KDF_CONTEXT_GROUP_V1_MIGRATION,
    KDF_CONTEXT_GROUP_V2_ID,
};
use crate::error::IdError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupIdV1(pub [u8; GROUP_V1_ID_LEN]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupIdV2(pub [u8; GROUP_V2_ID_LEN]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupMasterKey(pub [u8; GROUP_MASTER_KEY_LEN]);

impl GroupIdV1 {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdError> {
        Ok(Self(fixed::<GROUP_V1_ID_LEN>(bytes)?))
    }

    /// Master key this group receives when it is migrated to V2.
    pub fn migration_master_key(&self) -> GroupMasterKey {
        GroupMasterKey(derive(KDF_CONTEXT_GROUP_V1_MIGRATION, &self.0))
    }

    /// The V2 id this group is expected to migrate into.
    pub fn expected_v2_id(&self) -> GroupIdV2 {
        self.migration_master_key().group_id()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl GroupMasterKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdError> {
        Ok(Self(fixed::<GROUP_MASTER_KEY_LEN>(bytes)?))
    }

    pub fn group_id(&self) -> GroupIdV2 {
        GroupIdV2(derive(KDF_CONTEXT_GROUP_V2_ID, &self.0))
    }
}

impl GroupIdV2 {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, IdError> {
        let bytes = hex::decode(s).map_err(|_| IdError::InvalidLength {
            expected: GROUP_V2_ID_LEN,
            actual: s.len() / 2,
        })?;
        Ok(Self(fixed::<GROUP_V2_ID_LEN>(&bytes)?))
    }
}

impl std::fmt::Display for GroupIdV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "__textsecure_group__!{}", self.to_hex())
    }
}

impl std::fmt::Display for GroupIdV2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "__signal_group__v2__!{}", self.to_hex())
    }
}

fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N], IdError> {
    if bytes.len() != N {
        return Err(IdError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut arr = [0u8; N];
    arr.copy_from_slice(bytes);
    Ok(arr)
}

// BLAKE3 KDF with domain separation
fn derive(context: &str, input: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(input);
    *hasher.finalize().as_bytes()
}
