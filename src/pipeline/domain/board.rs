//! Kanban board model and drag controller.
//!
//! The board is a read model assembled from a [`StageCatalog`] and a set of
//! leads. Dragging is reduced to discrete outcomes: move a lead to a stage,
//! or reorder the columns. Card order inside a column is session-local and
//! never persisted.

use super::{Lead, LeadId, Stage, StageCatalog, StageId};

/// One board column: a stage and the leads currently in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    stage: Stage,
    cards: Vec<Lead>,
}

impl Column {
    /// Returns the column's stage.
    #[must_use]
    pub const fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Returns the leads in display order.
    #[must_use]
    pub fn cards(&self) -> &[Lead] {
        &self.cards
    }

    /// Returns the number of leads in the column.
    #[must_use]
    pub fn lead_count(&self) -> usize {
        self.cards.len()
    }

    /// Returns the summed lead price in minor units, saturating on overflow.
    #[must_use]
    pub fn total_price_minor_units(&self) -> i64 {
        self.cards
            .iter()
            .filter_map(|lead| lead.details().price())
            .fold(0_i64, |total, price| {
                total.saturating_add(price.minor_units())
            })
    }

    /// Moves a card to `to_index` within this column for the current
    /// session. Indices past the end place the card last.
    ///
    /// Returns `false` when the lead is not in this column.
    pub fn move_card(&mut self, lead_id: LeadId, to_index: usize) -> bool {
        let Some(from_index) = self.cards.iter().position(|lead| lead.id() == lead_id) else {
            return false;
        };
        let card = self.cards.remove(from_index);
        let target = to_index.min(self.cards.len());
        self.cards.insert(target, card);
        true
    }
}

/// Stage columns with their leads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    columns: Vec<Column>,
    orphaned: Vec<Lead>,
}

impl Board {
    /// Builds a board with one column per stage in catalog order.
    ///
    /// Leads inside a column are ordered newest first. Leads referencing a
    /// stage missing from the catalog are kept aside in
    /// [`Board::orphaned`].
    #[must_use]
    pub fn assemble(catalog: &StageCatalog, leads: impl IntoIterator<Item = Lead>) -> Self {
        let mut columns: Vec<Column> = catalog
            .stages()
            .iter()
            .map(|stage| Column {
                stage: stage.clone(),
                cards: Vec::new(),
            })
            .collect();
        let mut orphaned = Vec::new();

        for lead in leads {
            match columns
                .iter_mut()
                .find(|column| column.stage.id() == lead.stage_id())
            {
                Some(column) => column.cards.push(lead),
                None => orphaned.push(lead),
            }
        }
        for column in &mut columns {
            column
                .cards
                .sort_by(|left, right| right.created_at().cmp(&left.created_at()));
        }

        Self { columns, orphaned }
    }

    /// Returns the columns in display order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column for `stage_id`.
    #[must_use]
    pub fn column(&self, stage_id: StageId) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.stage.id() == stage_id)
    }

    /// Returns the column for `stage_id` for session-local card moves.
    pub fn column_mut(&mut self, stage_id: StageId) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|column| column.stage.id() == stage_id)
    }

    /// Returns leads whose stage is not on the board.
    #[must_use]
    pub fn orphaned(&self) -> &[Lead] {
        &self.orphaned
    }

    /// Finds a lead on the board.
    #[must_use]
    pub fn find_lead(&self, lead_id: LeadId) -> Option<&Lead> {
        self.columns
            .iter()
            .flat_map(|column| column.cards.iter())
            .find(|lead| lead.id() == lead_id)
    }

    /// Returns stage identifiers in column order.
    #[must_use]
    pub fn stage_order(&self) -> Vec<StageId> {
        self.columns.iter().map(|column| column.stage.id()).collect()
    }

    /// Returns the number of leads across all columns.
    #[must_use]
    pub fn total_leads(&self) -> usize {
        self.columns.iter().map(Column::lead_count).sum()
    }

    /// Returns the summed lead price across all columns.
    #[must_use]
    pub fn total_price_minor_units(&self) -> i64 {
        self.columns
            .iter()
            .map(Column::total_price_minor_units)
            .fold(0_i64, i64::saturating_add)
    }

    /// Returns the column order after moving `stage_id` to the position
    /// currently held by `onto`.
    #[must_use]
    pub fn column_order_after_move(
        &self,
        stage_id: StageId,
        onto: StageId,
    ) -> Option<Vec<StageId>> {
        let mut order = self.stage_order();
        let from_index = order.iter().position(|id| *id == stage_id)?;
        let to_index = order.iter().position(|id| *id == onto)?;
        let moved = order.remove(from_index);
        order.insert(to_index.min(order.len()), moved);
        Some(order)
    }
}

/// The item currently being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragItem {
    /// A lead card picked up from `from_stage`.
    Card {
        /// Lead being dragged.
        lead_id: LeadId,
        /// Column the card was picked up from.
        from_stage: StageId,
    },
    /// A whole column.
    Column {
        /// Stage whose column is being dragged.
        stage_id: StageId,
    },
}

/// What a drop means for the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Nothing was being dragged, or the drop landed outside every column.
    Cancelled,
    /// Dropped back where it started.
    Unchanged,
    /// A card landed on another column; route through the transition gate.
    MoveLead {
        /// Lead to move.
        lead_id: LeadId,
        /// Stage the card came from.
        from: StageId,
        /// Stage the card was dropped on.
        to: StageId,
    },
    /// A column landed on another column's slot; persist the new order.
    ReorderColumns {
        /// Stage identifiers in the new visual order.
        order: Vec<StageId>,
    },
}

/// Tracks the transient drag item so the UI can render a floating preview.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragController {
    active: Option<DragItem>,
}

impl DragController {
    /// Creates a controller with nothing being dragged.
    #[must_use]
    pub const fn new() -> Self {
        Self { active: None }
    }

    /// Starts dragging `item`, replacing any previous drag.
    pub const fn begin(&mut self, item: DragItem) {
        self.active = Some(item);
    }

    /// Returns the item being dragged.
    #[must_use]
    pub const fn active(&self) -> Option<&DragItem> {
        self.active.as_ref()
    }

    /// Abandons the current drag.
    pub const fn cancel(&mut self) {
        self.active = None;
    }

    /// Ends the drag over `target`; `None` means outside every column.
    pub fn drop_on(&mut self, board: &Board, target: Option<StageId>) -> DropOutcome {
        let Some(item) = self.active.take() else {
            return DropOutcome::Cancelled;
        };
        let Some(target) = target.filter(|stage_id| board.column(*stage_id).is_some()) else {
            return DropOutcome::Cancelled;
        };

        match item {
            DragItem::Card { from_stage, .. } if from_stage == target => DropOutcome::Unchanged,
            DragItem::Card {
                lead_id,
                from_stage,
            } => DropOutcome::MoveLead {
                lead_id,
                from: from_stage,
                to: target,
            },
            DragItem::Column { stage_id } if stage_id == target => DropOutcome::Unchanged,
            DragItem::Column { stage_id } => board
                .column_order_after_move(stage_id, target)
                .map_or(DropOutcome::Cancelled, |order| DropOutcome::ReorderColumns {
                    order,
                }),
        }
    }
}
