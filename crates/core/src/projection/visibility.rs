//! Permission-scoped visibility.

use pb_protocol::{PipelineEntity, Role, UserSettings};

/// Who is looking at the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: String,
    pub role: Role,
}

impl Viewer {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// A viewer that sees everything.
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Admin)
    }

    /// Admins and managers see every entity. Salespeople see the entities
    /// they own or are assigned to.
    pub fn can_see(&self, entity: &PipelineEntity) -> bool {
        match self.role {
            Role::Admin | Role::Manager => true,
            Role::Salesperson => {
                entity.owner_id.as_deref() == Some(self.user_id.as_str())
                    || entity.salesperson_id.as_deref() == Some(self.user_id.as_str())
            }
        }
    }

    pub fn visible<'a>(&'a self, entities: &'a [PipelineEntity]) -> impl Iterator<Item = &'a PipelineEntity> + 'a {
        entities.iter().filter(move |e| self.can_see(e))
    }
}

impl From<&UserSettings> for Viewer {
    fn from(settings: &UserSettings) -> Self {
        Self::new(settings.id.clone(), settings.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salesperson_sees_owned_or_assigned() {
        let viewer = Viewer::new("u-2", Role::Salesperson);
        let owned = PipelineEntity::new("p-1", "A", "Nuevo").with_owner("u-2");
        let mut assigned = PipelineEntity::new("p-2", "B", "Nuevo");
        assigned.salesperson_id = Some("u-2".to_string());
        let other = PipelineEntity::new("p-3", "C", "Nuevo").with_owner("u-9");
        let unowned = PipelineEntity::new("p-4", "D", "Nuevo");

        assert!(viewer.can_see(&owned));
        assert!(viewer.can_see(&assigned));
        assert!(!viewer.can_see(&other));
        assert!(!viewer.can_see(&unowned));
    }

    #[test]
    fn test_manager_sees_everything() {
        let entities = vec![
            PipelineEntity::new("p-1", "A", "Nuevo").with_owner("u-9"),
            PipelineEntity::new("p-2", "B", "Nuevo"),
        ];
        let viewer = Viewer::new("u-1", Role::Manager);
        assert_eq!(viewer.visible(&entities).count(), 2);
    }
}
