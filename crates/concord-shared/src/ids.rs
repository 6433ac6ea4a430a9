use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::constants::{
    STORAGE_ID_LEN, WIRE_TYPE_ACCOUNT, WIRE_TYPE_CONTACT, WIRE_TYPE_DISTRIBUTION_LIST,
    WIRE_TYPE_GROUP_V1, WIRE_TYPE_GROUP_V2,
};
use crate::error::IdError;

/// Raw bytes of a storage key. Unique across the whole key space.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawId(pub [u8; STORAGE_ID_LEN]);

impl RawId {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdError> {
        if bytes.len() != STORAGE_ID_LEN {
            return Err(IdError::InvalidLength {
                expected: STORAGE_ID_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; STORAGE_ID_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; STORAGE_ID_LEN] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn from_base64(s: &str) -> Result<Self, IdError> {
        let bytes = STANDARD
            .decode(s.trim())
            .map_err(|_| IdError::Base64Decode)?;
        Self::from_slice(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for RawId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}

impl std::fmt::Debug for RawId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawId({})", self.to_base64())
    }
}

impl Serialize for RawId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for RawId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        RawId::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

/// The declared type of a storage record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    Contact,
    GroupV1,
    GroupV2,
    Account,
    DistributionList,
    /// A type number this device does not understand.
    Unknown(u32),
}

impl RecordType {
    pub fn from_wire(value: u32) -> Self {
        match value {
            WIRE_TYPE_CONTACT => Self::Contact,
            WIRE_TYPE_GROUP_V1 => Self::GroupV1,
            WIRE_TYPE_GROUP_V2 => Self::GroupV2,
            WIRE_TYPE_ACCOUNT => Self::Account,
            WIRE_TYPE_DISTRIBUTION_LIST => Self::DistributionList,
            other => Self::Unknown(other),
        }
    }

    pub fn to_wire(self) -> u32 {
        match self {
            Self::Contact => WIRE_TYPE_CONTACT,
            Self::GroupV1 => WIRE_TYPE_GROUP_V1,
            Self::GroupV2 => WIRE_TYPE_GROUP_V2,
            Self::Account => WIRE_TYPE_ACCOUNT,
            Self::DistributionList => WIRE_TYPE_DISTRIBUTION_LIST,
            Self::Unknown(n) => n,
        }
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contact => write!(f, "contact"),
            Self::GroupV1 => write!(f, "gv1"),
            Self::GroupV2 => write!(f, "gv2"),
            Self::Account => write!(f, "account"),
            Self::DistributionList => write!(f, "dlist"),
            Self::Unknown(n) => write!(f, "unknown({n})"),
        }
    }
}

/// A storage key: raw bytes plus the record type they were declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageId {
    pub kind: RecordType,
    pub raw: RawId,
}

impl StorageId {
    pub fn new(kind: RecordType, raw: RawId) -> Self {
        Self { kind, raw }
    }

    pub fn for_contact(raw: RawId) -> Self {
        Self::new(RecordType::Contact, raw)
    }

    pub fn for_group_v1(raw: RawId) -> Self {
        Self::new(RecordType::GroupV1, raw)
    }

    pub fn for_group_v2(raw: RawId) -> Self {
        Self::new(RecordType::GroupV2, raw)
    }

    pub fn for_account(raw: RawId) -> Self {
        Self::new(RecordType::Account, raw)
    }

    pub fn for_distribution_list(raw: RawId) -> Self {
        Self::new(RecordType::DistributionList, raw)
    }

    pub fn is_unknown(&self) -> bool {
        self.kind.is_unknown()
    }

    /// Same type, different key.
    pub fn with_raw(&self, raw: RawId) -> Self {
        Self::new(self.kind, raw)
    }
}

impl std::fmt::Display for StorageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.raw)
    }
}

/// Account identifier: the primary, stable identity of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Aci(pub Uuid);

/// Phone-number identifier: a secondary identity bound to the current number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pni(pub Uuid);

impl std::fmt::Display for Aci {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ACI:{}", self.0)
    }
}

impl std::fmt::Display for Pni {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PNI:{}", self.0)
    }
}

/// Identifier of a story distribution list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistributionId(pub Uuid);

impl DistributionId {
    /// The singleton "My Story" list every account owns.
    pub const MY_STORY: DistributionId = DistributionId(Uuid::nil());

    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdError> {
        Uuid::from_slice(bytes)
            .map(Self)
            .map_err(|_| IdError::InvalidLength {
                expected: crate::constants::DISTRIBUTION_ID_LEN,
                actual: bytes.len(),
            })
    }

    pub fn is_my_story(&self) -> bool {
        *self == Self::MY_STORY
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }
}

impl std::fmt::Display for DistributionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_id_rejects_wrong_length() {
        assert_eq!(
            RawId::from_slice(&[1, 2, 3]),
            Err(IdError::InvalidLength {
                expected: STORAGE_ID_LEN,
                actual: 3
            })
        );
    }

    #[test]
    fn test_raw_id_base64() {
        let id = RawId([7u8; STORAGE_ID_LEN]);
        let parsed = RawId::from_base64(&id.to_base64()).unwrap();
        assert_eq!(parsed, id);

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_base64()));
    }

    #[test]
    fn test_record_type_wire_numbers() {
        assert_eq!(RecordType::from_wire(1), RecordType::Contact);
        assert_eq!(RecordType::from_wire(4), RecordType::Account);
        assert_eq!(RecordType::from_wire(99), RecordType::Unknown(99));
        assert_eq!(RecordType::Unknown(99).to_wire(), 99);
        assert_eq!(RecordType::DistributionList.to_wire(), 5);
    }

    #[test]
    fn test_my_story_is_nil_uuid() {
        let parsed = DistributionId::from_slice(&[0u8; 16]).unwrap();
        assert!(parsed.is_my_story());
        assert!(DistributionId::from_slice(&[0u8; 5]).is_err());
    }
}
