/// Application name
pub const APP_NAME: &str = "Concord";

/// Length in bytes of a storage record key
pub const STORAGE_ID_LEN: usize = 16;

/// Length in bytes of a legacy (V1) group identifier
pub const GROUP_V1_ID_LEN: usize = 16;

/// Length in bytes of a V2 group master key
pub const GROUP_MASTER_KEY_LEN: usize = 32;

/// Length in bytes of a V2 group identifier
pub const GROUP_V2_ID_LEN: usize = 32;

/// Length in bytes of a distribution list identifier (a UUID)
pub const DISTRIBUTION_ID_LEN: usize = 16;

/// Storage record type numbers as they appear on the wire
pub const WIRE_TYPE_CONTACT: u32 = 1;
pub const WIRE_TYPE_GROUP_V1: u32 = 2;
pub const WIRE_TYPE_GROUP_V2: u32 = 3;
pub const WIRE_TYPE_ACCOUNT: u32 = 4;
pub const WIRE_TYPE_DISTRIBUTION_LIST: u32 = 5;

/// Key derivation contexts (BLAKE3)
pub const KDF_CONTEXT_GROUP_V2_ID: &str = "concord group-v2 id v1";
pub const KDF_CONTEXT_GROUP_V1_MIGRATION: &str = "concord group-v1 migration v1";

/// How long an unregistered contact keeps its storage key before it is
/// dropped from the remote store.
pub const DEFAULT_UNREGISTERED_RETENTION_DAYS: i64 = 30;
