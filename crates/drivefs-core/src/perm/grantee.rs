use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::PermissionRecord;

pub const USER_TYPE: &str = "user";
pub const GROUP_TYPE: &str = "group";
pub const DOMAIN_TYPE: &str = "domain";
pub const ANYONE_TYPE: &str = "anyone";

/// The identity a permission is granted to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Grantee {
    User { email: String },
    Group { email: String },
    Domain { domain: String },
    Anyone,
}

impl Grantee {
    pub fn user(email: impl Into<String>) -> Self {
        Grantee::User { email: email.into() }
    }

    pub fn group(email: impl Into<String>) -> Self {
        Grantee::Group { email: email.into() }
    }

    pub fn domain(domain: impl Into<String>) -> Self {
        Grantee::Domain { domain: domain.into() }
    }

    /// Wire type tag.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Grantee::User { .. } => USER_TYPE,
            Grantee::Group { .. } => GROUP_TYPE,
            Grantee::Domain { .. } => DOMAIN_TYPE,
            Grantee::Anyone => ANYONE_TYPE,
        }
    }

    /// Whether a stored record grants to this identity. Emails and domains
    /// compare exactly.
    pub fn matches(&self, record: &PermissionRecord) -> bool {
        if record.grantee_type != self.type_tag() {
            return false;
        }
        match self {
            Grantee::User { email } | Grantee::Group { email } => record.email_address.as_deref() == Some(email.as_str()),
            Grantee::Domain { domain } => record.domain.as_deref() == Some(domain.as_str()),
            Grantee::Anyone => true,
        }
    }

    /// Decode the grantee of a stored record. `None` for an unknown type.
    pub fn from_record(record: &PermissionRecord) -> Option<Self> {
        let email = || record.email_address.clone().unwrap_or_default();
        match record.grantee_type.as_str() {
            USER_TYPE => Some(Grantee::User { email: email() }),
            GROUP_TYPE => Some(Grantee::Group { email: email() }),
            DOMAIN_TYPE => Some(Grantee::Domain {
                domain: record.domain.clone().unwrap_or_default(),
            }),
            ANYONE_TYPE => Some(Grantee::Anyone),
            _ => None,
        }
    }

    /// Fill the grantee fields of an outgoing record.
    pub(crate) fn write_to(&self, record: &mut PermissionRecord) {
        record.grantee_type = self.type_tag().to_string();
        match self {
            Grantee::User { email } | Grantee::Group { email } => record.email_address = Some(email.clone()),
            Grantee::Domain { domain } => record.domain = Some(domain.clone()),
            Grantee::Anyone => {}
        }
    }
}

impl fmt::Display for Grantee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grantee::User { email } | Grantee::Group { email } => write!(f, "{}:{email}", self.type_tag()),
            Grantee::Domain { domain } => write!(f, "{DOMAIN_TYPE}:{domain}"),
            Grantee::Anyone => f.write_str(ANYONE_TYPE),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseGranteeError {
    #[error("unknown grantee type '{0}' (expected user, group, domain or anyone)")]
    UnknownType(String),

    #[error("grantee '{0}' needs a value after ':'")]
    MissingValue(String),

    #[error("'anyone' takes no value")]
    UnexpectedValue,
}

/// Parses `user:<email>`, `group:<email>`, `domain:<domain>` or `anyone`.
impl FromStr for Grantee {
    type Err = ParseGranteeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = match s.split_once(':') {
            Some((kind, value)) => (kind, Some(value)),
            None => (s, None),
        };
        let required = || match value {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => Err(ParseGranteeError::MissingValue(kind.to_string())),
        };
        match kind {
            USER_TYPE => Ok(Grantee::User { email: required()? }),
            GROUP_TYPE => Ok(Grantee::Group { email: required()? }),
            DOMAIN_TYPE => Ok(Grantee::Domain { domain: required()? }),
            ANYONE_TYPE if value.is_none() => Ok(Grantee::Anyone),
            ANYONE_TYPE => Err(ParseGranteeError::UnexpectedValue),
            other => Err(ParseGranteeError::UnknownType(other.to_string())),
        }
    }
}
