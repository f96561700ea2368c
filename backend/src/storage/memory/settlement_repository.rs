use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::warn;
use shared::{Settlement, SettlementPatch};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::storage::traits::{SettlementStore, SnapshotCallback, Subscription};

/// In-memory settlement repository with snapshot subscriptions
#[derive(Clone)]
pub struct MemorySettlementRepository {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    documents: Mutex<BTreeMap<String, Settlement>>,
    subscribers: Mutex<HashMap<u64, SnapshotCallback>>,
    next_subscriber_id: AtomicU64,
    next_generated_id: AtomicU64,
}

impl StoreInner {
    // A poisoned lock means a writer panicked mid-mutation; the collection
    // can no longer be trusted, so that is fatal.
    fn documents(&self) -> MutexGuard<'_, BTreeMap<String, Settlement>> {
        self.documents.lock().expect("document lock poisoned")
    }

    fn subscribers(&self) -> MutexGuard<'_, HashMap<u64, SnapshotCallback>> {
        self.subscribers.lock().expect("subscriber lock poisoned")
    }
}

impl MemorySettlementRepository {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                documents: Mutex::new(BTreeMap::new()),
                subscribers: Mutex::new(HashMap::new()),
                next_subscriber_id: AtomicU64::new(0),
                next_generated_id: AtomicU64::new(0),
            }),
        }
    }

    fn snapshot(&self) -> Vec<Settlement> {
        self.inner.documents().values().cloned().collect()
    }

    /// Deliver the current snapshot to every subscriber. Callbacks run
    /// outside the locks so a subscriber may issue store calls of its own.
    fn notify_subscribers(&self) {
        let snapshot = self.snapshot();
        let callbacks: Vec<SnapshotCallback> =
            self.inner.subscribers().values().cloned().collect();

        for callback in callbacks {
            callback(&snapshot);
        }
    }
}

impl Default for MemorySettlementRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_patch(settlement: &mut Settlement, patch: &SettlementPatch) {
    if let Some(date) = &patch.date {
        settlement.date = date.clone();
    }
    if let Some(name) = &patch.name {
        settlement.name = name.clone();
    }
    if let Some(salary) = patch.salary {
        settlement.salary = salary;
    }
    if let Some(bonus) = patch.bonus {
        settlement.bonus = bonus;
    }
    if let Some(overtime_pay) = patch.overtime_pay {
        settlement.overtime_pay = overtime_pay;
    }
    if let Some(national_pension) = patch.national_pension {
        settlement.national_pension = national_pension;
    }
    if let Some(health_insurance) = patch.health_insurance {
        settlement.health_insurance = health_insurance;
    }
    if let Some(employment_insurance) = patch.employment_insurance {
        settlement.employment_insurance = employment_insurance;
    }
    if let Some(long_term_care_insurance) = patch.long_term_care_insurance {
        settlement.long_term_care_insurance = long_term_care_insurance;
    }
    if let Some(pension_support) = patch.pension_support {
        settlement.pension_support = pension_support;
    }
    if let Some(employment_support) = patch.employment_support {
        settlement.employment_support = employment_support;
    }
    if let Some(transaction_amount) = patch.transaction_amount {
        settlement.transaction_amount = transaction_amount;
    }
    if let Some(income_type) = patch.income_type {
        settlement.income_type = Some(income_type);
    }
    if let Some(fee) = patch.fee {
        settlement.fee = fee;
    }
    if let Some(income_tax) = patch.income_tax {
        settlement.income_tax = income_tax;
    }
    if let Some(local_tax) = patch.local_tax {
        settlement.local_tax = local_tax;
    }
}

#[async_trait]
impl SettlementStore for MemorySettlementRepository {
    async fn get_all(&self) -> Result<Vec<Settlement>> {
        Ok(self.snapshot())
    }

    async fn add(&self, data: &Settlement) -> Result<String> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)?
            .as_millis() as u64;
        let sequence = self.inner.next_generated_id.fetch_add(1, Ordering::SeqCst);
        let id = format!("doc::{}::{}", millis, sequence);

        let mut record = data.clone();
        record.id = id.clone();
        self.inner.documents().insert(id.clone(), record);

        self.notify_subscribers();
        Ok(id)
    }

    async fn set_with_id(&self, id: &str, data: &Settlement) -> Result<()> {
        let mut record = data.clone();
        record.id = id.to_string();
        self.inner.documents().insert(id.to_string(), record);

        self.notify_subscribers();
        Ok(())
    }

    async fn update(&self, id: &str, patch: &SettlementPatch) -> Result<()> {
        {
            let mut documents = self.inner.documents();
            let settlement = documents
                .get_mut(id)
                .ok_or_else(|| anyhow!("Settlement not found: {}", id))?;
            apply_patch(settlement, patch);
        }

        self.notify_subscribers();
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.inner.documents().remove(id).is_some();

        if removed {
            self.notify_subscribers();
        } else {
            warn!("Delete requested for unknown settlement: {}", id);
        }

        Ok(removed)
    }

    async fn subscribe(&self, callback: SnapshotCallback) -> Result<Subscription> {
        let key = self.inner.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        self.inner.subscribers().insert(key, callback.clone());

        // Initial snapshot, same as the managed store's behavior
        callback(&self.snapshot());

        let inner = Arc::clone(&self.inner);
        Ok(Subscription::new(move || {
            inner.subscribers().remove(&key);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::SettlementCategory;

    fn sample(id: &str, name: &str) -> Settlement {
        Settlement {
            id: id.to_string(),
            date: "2026-01-05".to_string(),
            name: name.to_string(),
            category: SettlementCategory::Client,
            transaction_amount: 1_000_000,
            ..Settlement::default()
        }
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemorySettlementRepository::new();
        let record = sample("settlement::client::1", "한올출판사");

        store.set_with_id(&record.id, &record).await.unwrap();
        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "한올출판사");

        assert!(store.delete("settlement::client::1").await.unwrap());
        assert!(!store.delete("settlement::client::1").await.unwrap());
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_generates_distinct_ids() {
        let store = MemorySettlementRepository::new();
        let first = store.add(&sample("", "a")).await.unwrap();
        let second = store.add(&sample("", "b")).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(store.get_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_merges_only_set_fields() {
        let store = MemorySettlementRepository::new();
        let record = sample("settlement::client::1", "한올출판사");
        store.set_with_id(&record.id, &record).await.unwrap();

        let patch = SettlementPatch {
            transaction_amount: Some(2_000_000),
            ..SettlementPatch::default()
        };
        store.update(&record.id, &patch).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all[0].transaction_amount, 2_000_000);
        // Untouched fields survive a partial update
        assert_eq!(all[0].name, "한올출판사");
        assert_eq!(all[0].date, "2026-01-05");
    }

    #[tokio::test]
    async fn test_update_missing_record_fails() {
        let store = MemorySettlementRepository::new();
        let patch = SettlementPatch::default();
        assert!(store.update("settlement::client::404", &patch).await.is_err());
    }

    #[tokio::test]
    async fn test_subscribe_delivers_full_snapshots() {
        let store = MemorySettlementRepository::new();
        let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        let subscription = store
            .subscribe(Arc::new(move |snapshot: &[Settlement]| {
                seen_clone.lock().unwrap().push(snapshot.len());
            }))
            .await
            .unwrap();

        store
            .set_with_id("settlement::client::1", &sample("settlement::client::1", "a"))
            .await
            .unwrap();
        store
            .set_with_id("settlement::client::2", &sample("settlement::client::2", "b"))
            .await
            .unwrap();
        store.delete("settlement::client::1").await.unwrap();

        // Initial snapshot plus one per change, each a full collection view
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 1]);

        subscription.unsubscribe();
        store
            .set_with_id("settlement::client::3", &sample("settlement::client::3", "c"))
            .await
            .unwrap();
        assert_eq!(seen.lock().unwrap().len(), 4);
    }
}
