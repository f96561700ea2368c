//! Settlement service domain logic for the settlement ledger.

use crate::domain::models::settlement::{Settlement as DomainSettlement, SettlementDetails};
use crate::domain::settlement_math::recompute_tax;
use crate::storage::{Connection, SettlementStore};
use anyhow::{anyhow, Result};
use chrono::Local;
use log::{error, info};
use shared::{
    CreateSettlementRequest, Settlement as SharedSettlement, SettlementCategory,
    UpdateSettlementRequest,
};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use time::format_description::well_known::Rfc3339;

#[derive(Clone)]
pub struct SettlementService<C: Connection> {
    settlement_repository: C::SettlementRepository,
}

impl<C: Connection> SettlementService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            settlement_repository: connection.create_settlement_repository(),
        }
    }

    /// Create a new settlement record.
    ///
    /// Defaults: today's date, the employee category, zeroed amounts. The
    /// record is written under a freshly generated epoch-millis ID.
    pub async fn create_settlement(
        &self,
        request: CreateSettlementRequest,
    ) -> Result<SharedSettlement> {
        if request.name.trim().is_empty() {
            return Err(anyhow!("이름은 비워둘 수 없습니다"));
        }

        let category = request.category.unwrap_or(SettlementCategory::Employee);
        let date = request
            .date
            .unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string());

        let now_millis = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis() as u64;
        let id = SharedSettlement::generate_id(category, now_millis);
        let created_at = time::OffsetDateTime::now_utc().format(&Rfc3339)?;

        let settlement = DomainSettlement {
            id: id.clone(),
            date,
            name: request.name.trim().to_string(),
            created_at: Some(created_at),
            details: SettlementDetails::empty_for(category),
        };

        let dto = settlement.to_dto();
        self.settlement_repository.set_with_id(&id, &dto).await?;

        info!("Created settlement {} ({})", id, category.label());
        Ok(dto)
    }

    /// Replace an existing record's fields.
    ///
    /// Two rules are enforced here rather than trusted from the caller:
    /// a category switch resets every category-specific field to its zero
    /// default (no stale cross-category values survive), and activity
    /// records get their withholding tax recomputed from fee and income
    /// type, since those two fields are not independently editable. Employee tax
    /// fields pass through untouched; they are manual entries.
    pub async fn update_settlement(
        &self,
        request: UpdateSettlementRequest,
    ) -> Result<SharedSettlement> {
        let incoming = request.settlement;
        if incoming.name.trim().is_empty() {
            return Err(anyhow!("이름은 비워둘 수 없습니다"));
        }

        let existing = self
            .get_settlement(&incoming.id)
            .await?
            .ok_or_else(|| anyhow!("Settlement not found: {}", incoming.id))?;

        let mut settlement = if existing.category != incoming.category {
            // Category switch: keep the common fields from the edit but
            // discard everything category-specific.
            let mut switched = DomainSettlement::from_dto(&incoming);
            switched.details = SettlementDetails::empty_for(incoming.category);
            switched
        } else {
            DomainSettlement::from_dto(&incoming)
        };

        if let SettlementDetails::Activity(activity) = &mut settlement.details {
            let tax = recompute_tax(activity.fee, activity.income_type);
            activity.income_tax = tax.income_tax;
            activity.local_tax = tax.local_tax;
        }

        // created_at is immutable once set
        settlement.created_at = existing.created_at.clone();

        let dto = settlement.to_dto();
        self.settlement_repository
            .set_with_id(&dto.id, &dto)
            .await?;

        info!("Updated settlement {}", dto.id);
        Ok(dto)
    }

    pub async fn get_settlement(&self, id: &str) -> Result<Option<SharedSettlement>> {
        let settlements = self.settlement_repository.get_all().await?;
        Ok(settlements.into_iter().find(|s| s.id == id))
    }

    /// All settlements, most recent date first (ID as tie-break so ordering
    /// is stable within a day)
    pub async fn list_settlements(&self) -> Result<Vec<SharedSettlement>> {
        let mut settlements = self.settlement_repository.get_all().await?;
        settlements.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
        Ok(settlements)
    }

    /// Delete a record by ID; no cascading effects. Returns false when the
    /// record was already gone.
    pub async fn delete_settlement(&self, id: &str) -> Result<bool> {
        let deleted = self.settlement_repository.delete(id).await?;
        if deleted {
            info!("Deleted settlement {}", id);
        }
        Ok(deleted)
    }

    /// Persist a confirmed import preview, one record at a time.
    ///
    /// Writes are sequential with no batch transaction: a failure partway
    /// through leaves the earlier records committed and surfaces as one
    /// aggregate error. Nothing is rolled back; the next store snapshot is
    /// the source of truth for what actually landed.
    pub async fn persist_import(&self, settlements: Vec<SharedSettlement>) -> Result<usize> {
        let total = settlements.len();

        for (index, settlement) in settlements.iter().enumerate() {
            if let Err(e) = self
                .settlement_repository
                .set_with_id(&settlement.id, settlement)
                .await
            {
                error!(
                    "Import persistence failed at record {}/{}: {}",
                    index + 1,
                    total,
                    e
                );
                return Err(anyhow!(
                    "가져오기 저장 중 오류가 발생했습니다: {}건 중 {}건 저장 후 실패 ({})",
                    total,
                    index,
                    e
                ));
            }
        }

        info!("Imported {} settlements", total);
        Ok(total)
    }
}
