//! Core types for the permission system.

/// Permission tier granted to an identity, ordered from least to most privileged.
///
/// Each level implies every level below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionLevel {
    NoAccess,
    Relaybot,
    User,
    Puppeting,
    MatrixPuppeting,
    Admin,
}

impl PermissionLevel {
    /// Parse a level string as written in the permission table.
    ///
    /// `full` is accepted as the older spelling of `matrix_puppeting`. The
    /// empty string means "no entry" and maps to [`PermissionLevel::NoAccess`].
    /// Returns `None` for strings that name no level at all.
    pub fn from_config(level: &str) -> Option<Self> {
        match level {
            "admin" => Some(Self::Admin),
            "matrix_puppeting" | "full" => Some(Self::MatrixPuppeting),
            "puppeting" => Some(Self::Puppeting),
            "user" => Some(Self::User),
            "relaybot" => Some(Self::Relaybot),
            "none" | "" => Some(Self::NoAccess),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoAccess => "none",
            Self::Relaybot => "relaybot",
            Self::User => "user",
            Self::Puppeting => "puppeting",
            Self::MatrixPuppeting => "matrix_puppeting",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities derived from a resolved permission level.
///
/// The booleans are always the monotonic closure of `level`: `admin` implies
/// `matrix_puppeting` implies `puppeting` implies `user` implies `relaybot`.
/// Unrecognized level strings grant nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions {
    pub relaybot: bool,
    pub user: bool,
    pub puppeting: bool,
    pub matrix_puppeting: bool,
    pub admin: bool,
    /// The level string exactly as found in the table (empty when nothing matched).
    pub level: String,
}

impl Permissions {
    /// Derive the capability set for a raw level string.
    pub fn from_level(level: &str) -> Self {
        let effective = PermissionLevel::from_config(level).unwrap_or(PermissionLevel::NoAccess);
        Self {
            relaybot: effective >= PermissionLevel::Relaybot,
            user: effective >= PermissionLevel::User,
            puppeting: effective >= PermissionLevel::Puppeting,
            matrix_puppeting: effective >= PermissionLevel::MatrixPuppeting,
            admin: effective >= PermissionLevel::Admin,
            level: level.to_string(),
        }
    }

    /// The highest level these permissions grant.
    pub fn effective_level(&self) -> PermissionLevel {
        if self.admin {
            PermissionLevel::Admin
        } else if self.matrix_puppeting {
            PermissionLevel::MatrixPuppeting
        } else if self.puppeting {
            PermissionLevel::Puppeting
        } else if self.user {
            PermissionLevel::User
        } else if self.relaybot {
            PermissionLevel::Relaybot
        } else {
            PermissionLevel::NoAccess
        }
    }

    /// Whether these permissions include `required`.
    pub fn allows(&self, required: PermissionLevel) -> bool {
        self.effective_level() >= required
    }
}
