use crate::EntityId;

/// Errors raised by component store queries and mutations.
///
/// All variants indicate a bug in authoring code or in the store's callers,
/// not a runtime condition: render hosts treat them as fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("entity {entity} has no {component}")]
    MissingComponent {
        entity: EntityId,
        component: &'static str,
    },
    #[error("entity {entity} already has a {component}")]
    DuplicateComponent {
        entity: EntityId,
        component: &'static str,
    },
    #[error("entity {0} does not exist")]
    NoSuchEntity(EntityId),
}
