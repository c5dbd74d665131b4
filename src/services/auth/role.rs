use std::fmt;

pub const ROLE_USER: &str = "ROLE_USER";
pub const ROLE_ORGANIZER: &str = "ROLE_ORGANIZER";
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Organizer,
    Admin,
}

impl Role {
    /// Parse the `role` claim: trimmed, case-insensitive.
    pub fn from_claim(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "USER" => Some(Self::User),
            "ORGANIZER" => Some(Self::Organizer),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Organizer => "ORGANIZER",
            Self::Admin => "ADMIN",
        }
    }

    /// Higher roles carry every authority of the lower ones.
    pub fn authorities(&self) -> &'static [&'static str] {
        match self {
            Self::User => &[ROLE_USER],
            Self::Organizer => &[ROLE_ORGANIZER, ROLE_USER],
            Self::Admin => &[ROLE_ADMIN, ROLE_ORGANIZER, ROLE_USER],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
