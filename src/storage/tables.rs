use redb::TableDefinition;

/// File records: uuid -> FileRecord (msgpack)
pub const FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("files");

/// Owner index: user id -> msgpack Vec of file UUIDs
pub const OWNER_FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("owner_files");

/// Share index: share token -> uuid
pub const SHARE_TOKENS: TableDefinition<&str, &str> = TableDefinition::new("share_tokens");

/// Users: user id -> UserRecord (msgpack)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Sessions: session id -> SessionRecord (msgpack)
pub const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// Settings: user id -> SettingsRecord (msgpack)
pub const SETTINGS: TableDefinition<&str, &[u8]> = TableDefinition::new("settings");
