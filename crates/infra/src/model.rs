//! Model-class introspection: which models exist and how they relate.
//!
//! Ownership resolution asks "which foreign keys on model X point at the
//! store of principal type T"; this registry answers from declared relations.

use std::collections::HashMap;
use std::sync::RwLock;

use rolegate_auth::{Application, Role, RoleMapping, User};
use rolegate_core::Entity;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RelationKind {
    BelongsTo,
    HasMany,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDefinition {
    pub name: String,
    pub kind: RelationKind,
    pub target: String,
    pub foreign_key: String,
}

/// Declared shape of a model class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDefinition {
    pub name: String,
    /// Parent model (e.g. a `Customer` model extending `User`).
    pub base: Option<String>,
    pub relations: Vec<RelationDefinition>,
}

impl ModelDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            relations: Vec::new(),
        }
    }

    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn belongs_to(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relations.push(RelationDefinition {
            name: name.into(),
            kind: RelationKind::BelongsTo,
            target: target.into(),
            foreign_key: foreign_key.into(),
        });
        self
    }

    pub fn has_many(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relations.push(RelationDefinition {
            name: name.into(),
            kind: RelationKind::HasMany,
            target: target.into(),
            foreign_key: foreign_key.into(),
        });
        self
    }
}

/// Registry of model definitions.
///
/// Definitions are expected at startup; later (re)definitions replace the
/// previous one wholesale.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: RwLock<HashMap<String, ModelDefinition>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the principal and mapping models.
    pub fn with_builtin_models() -> Self {
        let registry = Self::new();
        registry.define(ModelDefinition::new(User::MODEL));
        registry.define(ModelDefinition::new(Application::MODEL));
        registry.define(
            ModelDefinition::new(Role::MODEL).has_many("principals", RoleMapping::MODEL, "roleId"),
        );
        registry.define(
            ModelDefinition::new(RoleMapping::MODEL).belongs_to("role", Role::MODEL, "roleId"),
        );
        registry
    }

    pub fn define(&self, definition: ModelDefinition) {
        let mut models = self.models.write().unwrap_or_else(|e| e.into_inner());
        models.insert(definition.name.clone(), definition);
    }

    pub fn get(&self, name: &str) -> Option<ModelDefinition> {
        let models = self.models.read().unwrap_or_else(|e| e.into_inner());
        models.get(name).cloned()
    }

    /// Whether `model` is `ancestor` or (transitively) extends it.
    pub fn is_a(&self, model: &str, ancestor: &str) -> bool {
        let models = self.models.read().unwrap_or_else(|e| e.into_inner());
        let mut current = Some(model.to_string());
        let mut hops = 0;
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            // Cycles in `base` chains are a definition error; stop walking.
            hops += 1;
            if hops > models.len() {
                return false;
            }
            current = models.get(&name).and_then(|d| d.base.clone());
        }
        false
    }

    /// Foreign keys of every belongs-to relation on `model` whose target is
    /// `target` or a model extending it, in declaration order.
    pub fn belongs_to_keys(&self, model: &str, target: &str) -> Vec<String> {
        let Some(definition) = self.get(model) else {
            return Vec::new();
        };
        definition
            .relations
            .iter()
            .filter(|r| r.kind == RelationKind::BelongsTo && self.is_a(&r.target, target))
            .map(|r| r.foreign_key.clone())
            .collect()
    }
}
