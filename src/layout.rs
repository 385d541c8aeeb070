use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::engine::EngineError;
use crate::model::Resource;

/// Floor plan: resources plus the undirected adjacency graph of physically
/// joinable resources. BTree containers keep iteration deterministic, which
/// the assignment search depends on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layout {
    resources: BTreeMap<Ulid, Resource>,
    #[serde(default)]
    adjacency: BTreeMap<Ulid, BTreeSet<Ulid>>,
    /// Designated overflow resource: always available, never a blocker.
    #[serde(default)]
    pub overflow: Option<Ulid>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: Resource) {
        self.resources.insert(resource.id, resource);
    }

    /// Join two resources. Adjacency is undirected; both directions are
    /// stored.
    pub fn connect(&mut self, a: Ulid, b: Ulid) -> Result<(), EngineError> {
        if !self.resources.contains_key(&a) {
            return Err(EngineError::UnknownResource(a));
        }
        if !self.resources.contains_key(&b) {
            return Err(EngineError::UnknownResource(b));
        }
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
        Ok(())
    }

    pub fn resource(&self, id: &Ulid) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn contains(&self, id: &Ulid) -> bool {
        self.resources.contains_key(id)
    }

    /// Neighbor ids in sorted order; empty for isolated or unknown ids.
    pub fn neighbors(&self, id: &Ulid) -> impl Iterator<Item = &Ulid> {
        self.adjacency.get(id).into_iter().flatten()
    }

    /// All resource ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &Ulid> {
        self.resources.keys()
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn is_overflow(&self, id: &Ulid) -> bool {
        self.overflow.as_ref() == Some(id)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Source of the current floor plan. Injected into every engine call — the
/// core holds no layout singleton.
#[async_trait]
pub trait LayoutProvider: Send + Sync {
    async fn snapshot(&self) -> Result<Layout, EngineError>;
}

/// Fixed layout, for tests and deployments where the floor plan is loaded
/// once from config.
pub struct StaticLayoutProvider {
    layout: Arc<Layout>,
}

impl StaticLayoutProvider {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout: Arc::new(layout),
        }
    }
}

#[async_trait]
impl LayoutProvider for StaticLayoutProvider {
    async fn snapshot(&self) -> Result<Layout, EngineError> {
        Ok(self.layout.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceKind;

    fn table(max: u32) -> Resource {
        Resource {
            id: Ulid::new(),
            kind: ResourceKind::Standard,
            min_occupancy: 1,
            max_occupancy: max,
            priority_weight: 50.0,
            position: None,
        }
    }

    #[test]
    fn connect_is_undirected() {
        let mut layout = Layout::new();
        let a = table(4);
        let b = table(4);
        let (ida, idb) = (a.id, b.id);
        layout.insert(a);
        layout.insert(b);
        layout.connect(ida, idb).unwrap();

        assert!(layout.neighbors(&ida).any(|n| *n == idb));
        assert!(layout.neighbors(&idb).any(|n| *n == ida));
    }

    #[test]
    fn connect_unknown_resource_fails() {
        let mut layout = Layout::new();
        let a = table(4);
        let ida = a.id;
        layout.insert(a);
        let result = layout.connect(ida, Ulid::new());
        assert!(matches!(result, Err(EngineError::UnknownResource(_))));
    }

    #[test]
    fn neighbors_of_isolated_resource_empty() {
        let mut layout = Layout::new();
        let a = table(4);
        let ida = a.id;
        layout.insert(a);
        assert_eq!(layout.neighbors(&ida).count(), 0);
        assert_eq!(layout.neighbors(&Ulid::new()).count(), 0);
    }

    #[test]
    fn overflow_designation() {
        let mut layout = Layout::new();
        let a = table(20);
        let ida = a.id;
        layout.insert(a);
        layout.overflow = Some(ida);
        assert!(layout.is_overflow(&ida));
        assert!(!layout.is_overflow(&Ulid::new()));
    }

    #[test]
    fn layout_json_roundtrip() {
        let mut layout = Layout::new();
        let a = table(4);
        let b = table(6);
        let (ida, idb) = (a.id, b.id);
        layout.insert(a);
        layout.insert(b);
        layout.connect(ida, idb).unwrap();
        layout.overflow = Some(idb);

        let json = serde_json::to_string(&layout).unwrap();
        let back = Layout::from_json(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert!(back.neighbors(&ida).any(|n| *n == idb));
        assert_eq!(back.overflow, Some(idb));
    }

    #[tokio::test]
    async fn static_provider_snapshot() {
        let mut layout = Layout::new();
        layout.insert(table(4));
        let provider = StaticLayoutProvider::new(layout);
        let snap = provider.snapshot().await.unwrap();
        assert_eq!(snap.len(), 1);
    }
}
