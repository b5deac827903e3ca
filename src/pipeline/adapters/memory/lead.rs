//! In-memory lead repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use super::poisoned;
use crate::pipeline::{
    domain::{Lead, LeadId, PersistedLeadData, StageId, UserId},
    ports::{LeadRepository, PipelineRepositoryError, PipelineRepositoryResult},
};

/// Thread-safe in-memory lead repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLeadRepository {
    leads: Arc<RwLock<HashMap<LeadId, Lead>>>,
}

impl InMemoryLeadRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn collect_where(
        &self,
        predicate: impl Fn(&Lead) -> bool,
    ) -> PipelineRepositoryResult<Vec<Lead>> {
        let leads = self.leads.read().map_err(poisoned)?;
        let mut matching: Vec<Lead> = leads
            .values()
            .filter(|lead| predicate(lead))
            .cloned()
            .collect();
        matching.sort_by_key(Lead::created_at);
        Ok(matching)
    }
}

#[async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn store(&self, lead: &Lead) -> PipelineRepositoryResult<()> {
        let mut leads = self.leads.write().map_err(poisoned)?;
        if leads.contains_key(&lead.id()) {
            return Err(PipelineRepositoryError::DuplicateLead(lead.id()));
        }
        leads.insert(lead.id(), lead.clone());
        Ok(())
    }

    async fn update(&self, lead: &Lead) -> PipelineRepositoryResult<()> {
        let mut leads = self.leads.write().map_err(poisoned)?;
        let existing = leads
            .get_mut(&lead.id())
            .ok_or(PipelineRepositoryError::LeadNotFound(lead.id()))?;
        *existing = lead.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: LeadId) -> PipelineRepositoryResult<Option<Lead>> {
        let leads = self.leads.read().map_err(poisoned)?;
        Ok(leads.get(&id).cloned())
    }

    async fn list_all(&self) -> PipelineRepositoryResult<Vec<Lead>> {
        self.collect_where(|_| true)
    }

    async fn list_by_stage(&self, stage_id: StageId) -> PipelineRepositoryResult<Vec<Lead>> {
        self.collect_where(|lead| lead.stage_id() == stage_id)
    }

    async fn list_by_seller(&self, seller_id: UserId) -> PipelineRepositoryResult<Vec<Lead>> {
        self.collect_where(|lead| lead.seller_id() == seller_id)
    }

    async fn count_in_stage(&self, stage_id: StageId) -> PipelineRepositoryResult<u64> {
        let leads = self.leads.read().map_err(poisoned)?;
        let count = leads
            .values()
            .filter(|lead| lead.stage_id() == stage_id)
            .count();
        u64::try_from(count).map_err(PipelineRepositoryError::persistence)
    }

    async fn escalate_if_in_stages(
        &self,
        id: LeadId,
        eligible: &BTreeSet<StageId>,
        target: StageId,
        at: DateTime<Utc>,
    ) -> PipelineRepositoryResult<Option<Lead>> {
        let mut leads = self.leads.write().map_err(poisoned)?;
        let Some(existing) = leads.get_mut(&id) else {
            return Ok(None);
        };
        if !eligible.contains(&existing.stage_id()) {
            return Ok(None);
        }

        let escalated = Lead::from_persisted(PersistedLeadData {
            id: existing.id(),
            customer_name: existing.customer_name().clone(),
            customer_phone: existing.customer_phone().clone(),
            stage_id: target,
            seller_id: existing.seller_id(),
            details: existing.details().clone(),
            created_at: existing.created_at(),
            updated_at: at,
        });
        *existing = escalated.clone();
        Ok(Some(escalated))
    }
}
