//! In-memory question repository for tests and storeless development.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;

use lumen_core::{Insight, Question};

use crate::{QuestionStore, Result, StoreError};

#[derive(Debug, Default)]
struct Inner {
    next_question_id: i64,
    next_insight_id: i64,
    questions: HashMap<i64, Question>,
    insights: HashMap<i64, Vec<Insight>>,
}

/// Mutex-guarded map store with the same semantics as the Postgres
/// repository, minus durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn question_count(&self) -> usize {
        self.inner.lock().questions.len()
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn create(&self, text: &str, user_id: Option<&str>) -> Result<Question> {
        let mut inner = self.inner.lock();
        inner.next_question_id += 1;
        let id = inner.next_question_id;

        let now = Utc::now();
        let question = Question {
            id,
            text: text.to_string(),
            user_id: user_id.map(String::from),
            processed: false,
            response: None,
            created_at: now,
            updated_at: now,
        };
        inner.questions.insert(id, question.clone());
        Ok(question)
    }

    async fn mark_processed(&self, id: i64, summary: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        let question = inner.questions.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        question.mark_processed(summary);
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Option<Question>> {
        Ok(self.inner.lock().questions.get(&id).cloned())
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Question>> {
        let inner = self.inner.lock();
        let mut all: Vec<Question> = inner.questions.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.clamp(1, 100) as usize)
            .collect())
    }

    async fn store_insights(&self, question_id: i64, insights: &[Insight]) -> Result<Vec<Insight>> {
        let mut inner = self.inner.lock();
        if !inner.questions.contains_key(&question_id) {
            return Err(StoreError::NotFound(question_id));
        }

        let mut stored = Vec::with_capacity(insights.len());
        for insight in insights {
            inner.next_insight_id += 1;
            let mut persisted = insight.clone();
            persisted.id = inner.next_insight_id;
            persisted.question_id = question_id;
            stored.push(persisted);
        }
        inner
            .insights
            .entry(question_id)
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn insights_for(&self, question_id: i64) -> Result<Vec<Insight>> {
        Ok(self
            .inner
            .lock()
            .insights
            .get(&question_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::InsightCategory;

    fn sample_insight(question_id: i64) -> Insight {
        Insight {
            id: 0,
            question_id,
            title: "Stock is healthy".into(),
            description: "No items below reorder level".into(),
            category: InsightCategory::Summary,
            confidence_score: 0.7,
            data_sources: vec!["inventory_data".into()],
            action_items: vec!["Keep monitoring stock".into()],
            data_evidence: vec!["0 low-stock items".into()],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let a = store.create("first question", None).await.unwrap();
        let b = store.create("second question", Some("u1")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert!(!a.processed);
    }

    #[tokio::test]
    async fn mark_processed_requires_existing_question() {
        let store = MemoryStore::new();
        let q = store.create("question", None).await.unwrap();

        store.mark_processed(q.id, "done").await.unwrap();
        let stored = store.get(q.id).await.unwrap().unwrap();
        assert!(stored.processed);
        assert_eq!(stored.response.as_deref(), Some("done"));

        assert!(matches!(
            store.mark_processed(999, "done").await,
            Err(StoreError::NotFound(999))
        ));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paged() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.create(&format!("question {i}"), None).await.unwrap();
        }

        let page = store.list(0, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert!(page[0].id > page[1].id);

        let rest = store.list(2, 10).await.unwrap();
        assert_eq!(rest.len(), 3);
    }

    #[tokio::test]
    async fn insights_round_trip_with_assigned_ids() {
        let store = MemoryStore::new();
        let q = store.create("inventory question", None).await.unwrap();

        let stored = store
            .store_insights(q.id, &[sample_insight(q.id), sample_insight(q.id)])
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|i| i.id > 0));

        let fetched = store.insights_for(q.id).await.unwrap();
        assert_eq!(fetched.len(), 2);

        let none = store.insights_for(12345).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn storing_insights_for_missing_question_fails() {
        let store = MemoryStore::new();
        let result = store.store_insights(7, &[sample_insight(7)]).await;
        assert!(matches!(result, Err(StoreError::NotFound(7))));
    }
}
