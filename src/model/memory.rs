use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::connection::{Connection, ModelConnection, StoreResult};
use super::list::StackList;
use super::value::{ResourceId, Value};
use super::vocab::{RDF_FIRST, RDF_NIL, RDF_REST};

type StatementKey = (ResourceId, ResourceId);

/// In-process statement store.
///
/// Backs the command-line front-end and tests. It keeps statements in
/// insertion order per `(subject, predicate)` pair and has no transactions.
#[derive(Default)]
pub struct MemoryStore {
    statements: DashMap<StatementKey, Vec<Value>>,
    blank_counter: std::sync::atomic::AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(self) -> Connection {
        Arc::new(self)
    }

    pub fn len(&self) -> usize {
        self.statements.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, subject: &ResourceId, predicate: &ResourceId, object: Value) {
        self.statements
            .entry((subject.clone(), predicate.clone()))
            .or_default()
            .push(object);
    }

    /// Writes `items` as an `rdf:first`/`rdf:rest` chain and returns its head.
    pub fn insert_list(&self, items: &StackList) -> ResourceId {
        let first = ResourceId::new(RDF_FIRST);
        let rest = ResourceId::new(RDF_REST);
        let mut tail = ResourceId::new(RDF_NIL);
        for value in items.reverse().iter() {
            let node = self.fresh_node();
            self.insert(&node, &first, value.clone());
            self.insert(&node, &rest, Value::Resource(tail));
            tail = node;
        }
        tail
    }

    fn fresh_node(&self) -> ResourceId {
        let n = self
            .blank_counter
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        ResourceId::new(format!("urn:ripple:node:{}", n))
    }
}

#[async_trait]
impl ModelConnection for MemoryStore {
    async fn objects(
        &self,
        subject: &ResourceId,
        predicate: &ResourceId,
    ) -> StoreResult<Vec<Value>> {
        let found = self
            .statements
            .get(&(subject.clone(), predicate.clone()))
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        debug!("objects({}, {}) -> {}", subject, predicate, found.len());
        Ok(found)
    }

    async fn add(
        &self,
        subject: &ResourceId,
        predicate: &ResourceId,
        object: Value,
    ) -> StoreResult<()> {
        self.insert(subject, predicate, object);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_query() {
        let store = MemoryStore::new();
        let s = ResourceId::new("http://example.org/s");
        let p = ResourceId::new("http://example.org/p");
        store.add(&s, &p, Value::from(1)).await.unwrap();
        store.add(&s, &p, Value::from(2)).await.unwrap();

        let objects = store.objects(&s, &p).await.unwrap();
        assert_eq!(objects, vec![Value::from(1), Value::from(2)]);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_insert_list_builds_chain() {
        let store = MemoryStore::new();
        let head = store.insert_list(&StackList::from_values(vec![Value::from(1), Value::from(2)]));

        let first = store
            .objects(&head, &ResourceId::new(RDF_FIRST))
            .await
            .unwrap();
        assert_eq!(first, vec![Value::from(1)]);
        assert_eq!(store.len(), 4);
    }
}
