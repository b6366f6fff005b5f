use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{DocumentStore, ReportFilter, StoreError};
use crate::reports::Report;
use crate::users::User;

/// In-process collections kept in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    reports: Mutex<Vec<Report>>,
    users: Mutex<Vec<User>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with a backend error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    pub async fn report_count(&self) -> usize {
        self.reports.lock().await.len()
    }

    fn check_online(&self, operation: &'static str) -> Result<(), StoreError> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(StoreError::Backend {
                backend: "memory",
                operation,
                message: "store offline".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self) -> Result<(), StoreError> {
        self.check_online("connect")
    }

    async fn insert_report(&self, report: &Report) -> Result<(), StoreError> {
        self.check_online("insert")?;
        self.reports.lock().await.push(report.clone());
        Ok(())
    }

    async fn find_report(&self, report_id: &str) -> Result<Option<Report>, StoreError> {
        self.check_online("find")?;
        Ok(self
            .reports
            .lock()
            .await
            .iter()
            .find(|r| r.report_id == report_id)
            .cloned())
    }

    async fn save_report(&self, report: &Report) -> Result<(), StoreError> {
        self.check_online("save")?;
        let mut reports = self.reports.lock().await;
        match reports.iter_mut().find(|r| r.report_id == report.report_id) {
            Some(existing) => *existing = report.clone(),
            None => reports.push(report.clone()),
        }
        Ok(())
    }

    async fn find_reports(&self, filter: &ReportFilter) -> Result<Vec<Report>, StoreError> {
        self.check_online("find")?;
        Ok(self
            .reports
            .lock()
            .await
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.check_online("insert")?;
        self.users.lock().await.push(user.clone());
        Ok(())
    }

    async fn find_user(&self, name: &str, password: &str) -> Result<Option<User>, StoreError> {
        self.check_online("find")?;
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|u| u.name.as_deref() == Some(name) && u.password.as_deref() == Some(password))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(report_id: &str, submitted_by: &str, resolved: bool) -> Report {
        Report {
            report_id: report_id.to_string(),
            image: "data:image/jpeg;base64,abc".to_string(),
            latitude: 1.0,
            longitude: 2.0,
            address: None,
            submitted_by: Some(submitted_by.to_string()),
            resolved,
            threat: 0,
            comment: None,
        }
    }

    #[tokio::test]
    async fn filters_by_single_field_in_insertion_order() {
        let store = MemoryStore::new();
        store.insert_report(&report("a", "alice", false)).await.unwrap();
        store.insert_report(&report("b", "bob", true)).await.unwrap();
        store.insert_report(&report("c", "alice", true)).await.unwrap();

        let ids = |reports: Vec<Report>| reports.into_iter().map(|r| r.report_id).collect::<Vec<_>>();

        assert_eq!(ids(store.find_reports(&ReportFilter::All).await.unwrap()), ["a", "b", "c"]);
        assert_eq!(ids(store.find_reports(&ReportFilter::Resolved(false)).await.unwrap()), ["a"]);
        assert_eq!(ids(store.find_reports(&ReportFilter::Resolved(true)).await.unwrap()), ["b", "c"]);
        assert_eq!(
            ids(store
                .find_reports(&ReportFilter::SubmittedBy("alice".to_string()))
                .await
                .unwrap()),
            ["a", "c"]
        );
    }

    #[tokio::test]
    async fn save_overwrites_existing_document() {
        let store = MemoryStore::new();
        store.insert_report(&report("a", "alice", false)).await.unwrap();

        let mut updated = report("a", "alice", true);
        updated.image = "data:image/jpeg;base64,new".to_string();
        store.save_report(&updated).await.unwrap();

        assert_eq!(store.report_count().await, 1);
        assert_eq!(store.find_report("a").await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn user_lookup_requires_both_fields() {
        let store = MemoryStore::new();
        let user = User {
            user_id: "u1".to_string(),
            name: Some("alice".to_string()),
            password: Some("secret".to_string()),
            access: Some("citizen".to_string()),
        };
        store.insert_user(&user).await.unwrap();

        assert_eq!(store.find_user("alice", "secret").await.unwrap(), Some(user));
        assert_eq!(store.find_user("alice", "wrong").await.unwrap(), None);
        assert_eq!(store.find_user("bob", "secret").await.unwrap(), None);
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert!(store.connect().await.is_err());
        assert!(store.find_reports(&ReportFilter::All).await.is_err());
        assert!(store.insert_report(&report("a", "alice", false)).await.is_err());

        store.set_offline(false);
        assert!(store.find_reports(&ReportFilter::All).await.unwrap().is_empty());
    }
}
