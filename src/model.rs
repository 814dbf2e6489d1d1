type Watts = i64;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    /// Plaintext; hashed with `api::hash_password` before it goes on the wire.
    pub password: String,
    pub plant_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub right_level: String,
}

/// Authenticated context required for polling. Only ever built complete by a
/// successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub cookie: String,
    pub plant_id: String,
    pub account: Option<Account>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerReading {
    pub watts: Watts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectivityState {
    pub connected: bool,
}
