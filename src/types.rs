//! Shared enumerations used across the codebase.
//!
//! Every enum is stored as lowercase snake_case text in Postgres and travels
//! over JSON in the same spelling; `as_str` and `FromStr` cover both.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a stored or submitted value is not a known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant { kind: $kind, value: other.to_string() }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

/// The three user roles of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    AgencyAdmin,
    ManagedClinic,
    IndependentClinic,
}

text_enum!(Role, "role", {
    AgencyAdmin => "agency_admin",
    ManagedClinic => "managed_clinic",
    IndependentClinic => "independent_clinic",
});

impl Role {
    pub const ALL: [Role; 3] = [Role::AgencyAdmin, Role::ManagedClinic, Role::IndependentClinic];
}

/// Which kind of tenant owns a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerType {
    Agency,
    Clinic,
}

text_enum!(OwnerType, "owner type", {
    Agency => "agency",
    Clinic => "clinic",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trialing,
    Active,
    PastDue,
    Canceled,
}

text_enum!(SubscriptionStatus, "subscription status", {
    Trialing => "trialing",
    Active => "active",
    PastDue => "past_due",
    Canceled => "canceled",
});

/// Whether an agency or clinic receptionist is currently taking calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemStatus {
    #[default]
    Active,
    Paused,
}

text_enum!(SystemStatus, "system status", {
    Active => "active",
    Paused => "paused",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Answered,
    Missed,
    Voicemail,
    Routed,
}

text_enum!(CallStatus, "call status", {
    Answered => "answered",
    Missed => "missed",
    Voicemail => "voicemail",
    Routed => "routed",
});
