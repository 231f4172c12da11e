use serde::{Deserialize, Serialize};

use rolegate_core::RecordId;

use crate::PrincipalType;

/// Input to every role resolution call.
///
/// `model_class`/`model_id` are only set for ownership checks against an
/// arbitrary persisted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleContext {
    pub principal_type: PrincipalType,
    pub principal_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<RecordId>,
}

impl RoleContext {
    pub fn new(principal_type: PrincipalType, principal_id: Option<RecordId>) -> Self {
        Self {
            principal_type,
            principal_id,
            model_class: None,
            model_id: None,
        }
    }

    /// Context for a known principal.
    pub fn principal(principal_type: PrincipalType, principal_id: impl Into<RecordId>) -> Self {
        Self::new(principal_type, Some(principal_id.into()))
    }

    /// Context for an anonymous caller.
    pub fn anonymous(principal_type: PrincipalType) -> Self {
        Self::new(principal_type, None)
    }

    /// Target an entity for ownership checks.
    pub fn with_model(mut self, model_class: impl Into<String>, model_id: impl Into<RecordId>) -> Self {
        self.model_class = Some(model_class.into());
        self.model_id = Some(model_id.into());
        self
    }

    /// Principal id present and the principal type is USER or APPLICATION.
    pub fn is_authenticated(&self) -> bool {
        self.principal_id.is_some() && self.principal_type.authenticates()
    }

    /// Negation of [`RoleContext::is_authenticated`].
    pub fn is_unauthenticated(&self) -> bool {
        !self.is_authenticated()
    }

    /// `(model_class, model_id, principal_id)` when all three are present.
    pub fn owner_target(&self) -> Option<(&str, &RecordId, &RecordId)> {
        match (&self.model_class, &self.model_id, &self.principal_id) {
            (Some(class), Some(model_id), Some(principal_id)) => {
                Some((class.as_str(), model_id, principal_id))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{APPLICATION, ROLE, USER};

    #[test]
    fn authenticated_requires_id_and_user_or_app() {
        assert!(RoleContext::principal(USER, 1).is_authenticated());
        assert!(RoleContext::principal(APPLICATION, "app").is_authenticated());
        assert!(!RoleContext::principal(ROLE, 1).is_authenticated());
        assert!(!RoleContext::anonymous(USER).is_authenticated());
    }

    #[test]
    fn unauthenticated_negates_authenticated() {
        assert!(RoleContext::anonymous(USER).is_unauthenticated());
        assert!(!RoleContext::principal(USER, 1).is_unauthenticated());
        assert!(RoleContext::principal(ROLE, 1).is_unauthenticated());

        let contexts = [
            RoleContext::principal(USER, 1),
            RoleContext::principal(APPLICATION, 1),
            RoleContext::principal(ROLE, 1),
            RoleContext::anonymous(USER),
            RoleContext::anonymous(ROLE),
        ];
        for ctx in contexts {
            assert_ne!(ctx.is_authenticated(), ctx.is_unauthenticated(), "{ctx:?}");
        }
    }

    #[test]
    fn owner_target_needs_model_and_principal() {
        assert!(RoleContext::principal(USER, 1).owner_target().is_none());
        assert!(RoleContext::anonymous(USER).with_model("Album", 1).owner_target().is_none());
        let ctx = RoleContext::principal(USER, 1).with_model("Album", 9);
        let (class, model_id, principal_id) = ctx.owner_target().unwrap();
        assert_eq!(class, "Album");
        assert_eq!(model_id, &RecordId::Int(9));
        assert_eq!(principal_id, &RecordId::Int(1));
    }
}
