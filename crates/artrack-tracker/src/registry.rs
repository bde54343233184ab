use artrack_core::{Target, TargetId};

use crate::error::TrackError;

/// Insertion-ordered target map.
///
/// Order matters: candidate scoring and vocabulary tie-breaks follow
/// registration order, so iteration must be stable.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    targets: Vec<Target>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.targets.iter().any(|t| t.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn insert(&mut self, target: Target) -> Result<(), TrackError> {
        if self.contains(&target.id) {
            return Err(TrackError::DuplicateTarget(target.id));
        }
        self.targets.push(target);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<Target> {
        let pos = self.targets.iter().position(|t| t.id == id)?;
        Some(self.targets.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn ids(&self) -> Vec<TargetId> {
        self.targets.iter().map(|t| t.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(id: &str) -> Target {
        Target {
            id: id.into(),
            name: id.into(),
            width: 10,
            height: 10,
            features: None,
            created_at_ms: 0,
        }
    }

    #[test]
    fn insert_preserves_order_and_rejects_duplicates() {
        let mut reg = TargetRegistry::new();
        reg.insert(target("b")).unwrap();
        reg.insert(target("a")).unwrap();
        assert_eq!(reg.ids(), vec!["b".to_string(), "a".to_string()]);

        assert!(matches!(
            reg.insert(target("b")),
            Err(TrackError::DuplicateTarget(_))
        ));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn remove_returns_the_target() {
        let mut reg = TargetRegistry::new();
        reg.insert(target("a")).unwrap();
        let removed = reg.remove("a").expect("removed");
        assert_eq!(removed.id, "a");
        assert!(reg.is_empty());
        assert!(reg.remove("a").is_none());
    }
}
