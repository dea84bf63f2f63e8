//! Authentication provider for the surreal-link client.
//!
//! Credentials are not sent as HTTP headers. They are replayed as RPC calls
//! right after the socket opens: [`AuthProvider::Credentials`] becomes a
//! `signin` request and [`AuthProvider::Token`] an `authenticate` request.

use serde_json::{Map, Value as JsonValue};

/// Sign-in credentials, one variant per access level.
///
/// # Examples
///
/// ```rust
/// use surreal_link::Credentials;
///
/// let root = Credentials::root("root", "root");
/// let db_user = Credentials::database("app", "main", "alice", "secret");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Credentials {
    /// System (root) user
    Root { user: String, pass: String },
    /// User defined on a namespace
    Namespace {
        ns: String,
        user: String,
        pass: String,
    },
    /// User defined on a database
    Database {
        ns: String,
        db: String,
        user: String,
        pass: String,
    },
    /// Record user signing in through an access method
    Record {
        ns: String,
        db: String,
        access: String,
        params: Map<String, JsonValue>,
    },
}

impl Credentials {
    pub fn root(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self::Root {
            user: user.into(),
            pass: pass.into(),
        }
    }

    pub fn namespace(
        ns: impl Into<String>,
        user: impl Into<String>,
        pass: impl Into<String>,
    ) -> Self {
        Self::Namespace {
            ns: ns.into(),
            user: user.into(),
            pass: pass.into(),
        }
    }

    pub fn database(
        ns: impl Into<String>,
        db: impl Into<String>,
        user: impl Into<String>,
        pass: impl Into<String>,
    ) -> Self {
        Self::Database {
            ns: ns.into(),
            db: db.into(),
            user: user.into(),
            pass: pass.into(),
        }
    }

    pub fn record(
        ns: impl Into<String>,
        db: impl Into<String>,
        access: impl Into<String>,
        params: Map<String, JsonValue>,
    ) -> Self {
        Self::Record {
            ns: ns.into(),
            db: db.into(),
            access: access.into(),
            params,
        }
    }

    /// The parameter object of a `signin` / `signup` request.
    pub fn to_value(&self) -> JsonValue {
        let mut object = Map::new();
        match self {
            Self::Root { user, pass } => {
                object.insert("user".into(), user.clone().into());
                object.insert("pass".into(), pass.clone().into());
            },
            Self::Namespace { ns, user, pass } => {
                object.insert("NS".into(), ns.clone().into());
                object.insert("user".into(), user.clone().into());
                object.insert("pass".into(), pass.clone().into());
            },
            Self::Database { ns, db, user, pass } => {
                object.insert("NS".into(), ns.clone().into());
                object.insert("DB".into(), db.clone().into());
                object.insert("user".into(), user.clone().into());
                object.insert("pass".into(), pass.clone().into());
            },
            Self::Record {
                ns,
                db,
                access,
                params,
            } => {
                // Record fields go first so they cannot shadow the scoping keys.
                object.extend(params.clone());
                object.insert("NS".into(), ns.clone().into());
                object.insert("DB".into(), db.clone().into());
                object.insert("AC".into(), access.clone().into());
            },
        }
        JsonValue::Object(object)
    }
}

/// How the engine authenticates after each connect.
///
/// # Examples
///
/// ```rust
/// use surreal_link::{AuthProvider, Credentials};
///
/// let auth = AuthProvider::credentials(Credentials::root("root", "root"));
/// let auth = AuthProvider::token("eyJhbGc...");
/// let auth = AuthProvider::none();
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AuthProvider {
    /// Sign in with credentials (`signin`)
    Credentials(Credentials),

    /// Resume a session from a token (`authenticate`)
    Token(String),

    /// Anonymous session
    #[default]
    None,
}

impl AuthProvider {
    pub fn credentials(credentials: Credentials) -> Self {
        Self::Credentials(credentials)
    }

    /// Convenience for the system `root` user.
    pub fn root(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self::Credentials(Credentials::root(user, pass))
    }

    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    pub fn none() -> Self {
        Self::None
    }

    /// Check if authentication is configured
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }
}
