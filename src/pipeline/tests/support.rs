//! Shared builders and a controllable clock for pipeline unit tests.

use std::sync::{Arc, Mutex};

use crate::pipeline::{
    adapters::memory::{
        InMemoryCommentRepository, InMemoryFollowUpTaskRepository, InMemoryLeadRepository,
        InMemoryStageRepository,
    },
    domain::{
        CustomerName, DisplayOrder, Lead, LeadDetails, NewLead, PhoneNumber, Price, Stage,
        StageCatalog, StageCategory, StageColor, StageId, StageName, StageRules, UserId,
    },
    ports::StageRepository,
};
use chrono::{DateTime, FixedOffset, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

/// Clock returning a settable instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock lock") = now;
    }

    pub fn advance(&self, delta: TimeDelta) {
        let current = self.utc();
        self.set(current + delta);
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0)
        .single()
        .expect("valid base time")
}

pub fn utc_minus_three() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).expect("valid offset")
}

pub fn stage(name: &str, order: i64) -> Stage {
    stage_with_category(name, order, StageCategory::Normal)
}

pub fn stage_with_category(name: &str, order: i64, category: StageCategory) -> Stage {
    Stage::new(
        StageName::new(name).expect("valid stage name"),
        StageColor::new("#336699").expect("valid stage color"),
        DisplayOrder::new(order).expect("valid display order"),
        category,
    )
}

pub fn lead_in(stage_id: StageId, seller_id: UserId, clock: &FixedClock) -> Lead {
    lead_priced(stage_id, seller_id, None, clock)
}

pub fn lead_priced(
    stage_id: StageId,
    seller_id: UserId,
    price: Option<i64>,
    clock: &FixedClock,
) -> Lead {
    let mut details = LeadDetails::new();
    if let Some(amount) = price {
        details = details.with_price(Price::from_minor_units(amount).expect("valid price"));
    }
    Lead::new(
        NewLead {
            customer_name: CustomerName::new("Ana Souza").expect("valid name"),
            customer_phone: PhoneNumber::new("+55 11 91234-5678").expect("valid phone"),
            stage_id,
            seller_id,
            details,
        },
        clock,
    )
}

/// A six-stage pipeline: New, Contacted, Negotiation, Won, Lost, Escalated.
///
/// New is exempt, Won and Lost are task-optional, Negotiation triggers
/// escalation, and a separate Escalated stage receives escalated leads.
pub struct PipelineFixture {
    pub new: Stage,
    pub contacted: Stage,
    pub negotiation: Stage,
    pub won: Stage,
    pub lost: Stage,
    pub escalated: Stage,
}

impl PipelineFixture {
    pub fn new() -> Self {
        Self {
            new: stage("New", 1),
            contacted: stage("Contacted", 2),
            negotiation: stage("Negotiation", 3),
            won: stage_with_category("Won", 4, StageCategory::Won),
            lost: stage_with_category("Lost", 5, StageCategory::Lost),
            escalated: stage("Escalated", 6),
        }
    }

    pub fn stages(&self) -> Vec<Stage> {
        vec![
            self.new.clone(),
            self.contacted.clone(),
            self.negotiation.clone(),
            self.won.clone(),
            self.lost.clone(),
            self.escalated.clone(),
        ]
    }

    pub fn catalog(&self) -> StageCatalog {
        StageCatalog::new(self.stages())
    }

    pub fn rules(&self) -> StageRules {
        StageRules {
            exempt_stages: [self.new.id()].into_iter().collect(),
            task_optional_stages: [self.won.id(), self.lost.id()].into_iter().collect(),
            escalation_trigger_stages: [self.negotiation.id()].into_iter().collect(),
            escalation_stage: Some(self.escalated.id()),
        }
    }
}

/// In-memory repositories seeded with a [`PipelineFixture`].
pub struct MemoryStore {
    pub stages: Arc<InMemoryStageRepository>,
    pub leads: Arc<InMemoryLeadRepository>,
    pub comments: Arc<InMemoryCommentRepository>,
    pub tasks: Arc<InMemoryFollowUpTaskRepository>,
}

impl MemoryStore {
    pub async fn seeded(fixture: &PipelineFixture) -> Self {
        let stages = Arc::new(InMemoryStageRepository::new());
        for stage in fixture.stages() {
            stages.store(&stage).await.expect("seed stage");
        }
        Self {
            stages,
            leads: Arc::new(InMemoryLeadRepository::new()),
            comments: Arc::new(InMemoryCommentRepository::new()),
            tasks: Arc::new(InMemoryFollowUpTaskRepository::new()),
        }
    }
}
