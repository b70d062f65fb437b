use redb::TableDefinition;

/// Submission records: uuid -> Submission (msgpack)
pub const SUBMISSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("submissions");

/// Vote records: "{user_id}:{submission_id}" -> Vote (msgpack). The key is the uniqueness constraint.
pub const VOTES: TableDefinition<&str, &[u8]> = TableDefinition::new("votes");

/// Local accounts: lowercased email -> UserRecord (msgpack)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
