use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;

// =============================================================================
// MODEL NAME
// =============================================================================

/// The protected entity types a right can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ModelName {
    User,
    Advertisement,
}

impl ModelName {
    pub const ALL: [ModelName; 2] = [ModelName::User, ModelName::Advertisement];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelName::User => "User",
            ModelName::Advertisement => "Advertisement",
        }
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(ModelName::User),
            "Advertisement" => Ok(ModelName::Advertisement),
            other => Err(AppError::internal(format!("unknown model name: {}", other))),
        }
    }
}

// =============================================================================
// ACTION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Read => f.write_str("read"),
            Action::Write => f.write_str("write"),
        }
    }
}

// =============================================================================
// RIGHT
// =============================================================================

/// A single flat authorization rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct RightSpec {
    pub read: bool,
    pub write: bool,
    pub only_own: bool,
    pub model: ModelName,
}

impl RightSpec {
    pub fn new(model: ModelName) -> Self {
        Self {
            read: false,
            write: false,
            only_own: false,
            model,
        }
    }

    pub fn read(mut self) -> Self {
        self.read = true;
        self
    }

    pub fn write(mut self) -> Self {
        self.write = true;
        self
    }

    pub fn only_own(mut self) -> Self {
        self.only_own = true;
        self
    }

    /// Whether this rule permits `action` on an instance of `model`, given
    /// whether the acting user owns that instance.
    pub fn grants(&self, model: ModelName, action: Action, acting_is_owner: bool) -> bool {
        if self.model != model {
            return false;
        }
        let action_allowed = match action {
            Action::Read => self.read,
            Action::Write => self.write,
        };
        action_allowed && (acting_is_owner || !self.only_own)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Right {
    pub id: i64,
    #[serde(flatten)]
    pub spec: RightSpec,
}

// =============================================================================
// ROLE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

/// A role together with the rights attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: Role,
    pub rights: Vec<Right>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_names_round_trip_through_storage_text() {
        for model in ModelName::ALL {
            assert_eq!(model.as_str().parse::<ModelName>().unwrap(), model);
        }
        assert!("Token".parse::<ModelName>().is_err());
    }

    #[test]
    fn own_only_right_needs_ownership() {
        let right = RightSpec::new(ModelName::Advertisement).write().only_own();
        assert!(right.grants(ModelName::Advertisement, Action::Write, true));
        assert!(!right.grants(ModelName::Advertisement, Action::Write, false));
        assert!(!right.grants(ModelName::Advertisement, Action::Read, true));
    }

    #[test]
    fn unscoped_right_ignores_ownership() {
        let right = RightSpec::new(ModelName::User).read();
        assert!(right.grants(ModelName::User, Action::Read, true));
        assert!(right.grants(ModelName::User, Action::Read, false));
        assert!(!right.grants(ModelName::Advertisement, Action::Read, false));
    }

    #[test]
    fn flagless_right_is_inert() {
        let right = RightSpec::new(ModelName::User);
        for action in [Action::Read, Action::Write] {
            assert!(!right.grants(ModelName::User, action, true));
            assert!(!right.grants(ModelName::User, action, false));
        }
    }
}
