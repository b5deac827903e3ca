//! Pipeline stages and the ordered stage catalog.

use super::{ParseStageCategoryError, PipelineDomainError, StageId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated, trimmed stage display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageName(String);

impl StageName {
    /// Creates a validated stage name.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::EmptyStageName`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, PipelineDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PipelineDomainError::EmptyStageName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Column color in normalized lowercase `#rrggbb` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageColor(String);

impl StageColor {
    /// Creates a validated color.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::InvalidStageColor`] unless the value is
    /// a `#` followed by exactly six hex digits.
    pub fn new(value: impl Into<String>) -> Result<Self, PipelineDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let is_valid = trimmed.strip_prefix('#').is_some_and(|digits| {
            digits.len() == 6 && digits.chars().all(|ch| ch.is_ascii_hexdigit())
        });
        if !is_valid {
            return Err(PipelineDomainError::InvalidStageColor(raw));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Returns the color as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One-based column position on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayOrder(u32);

impl DisplayOrder {
    /// First column position.
    pub const FIRST: Self = Self(1);

    /// Creates a validated display order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::InvalidDisplayOrder`] when the value is
    /// zero, negative, or does not fit in `u32`.
    pub fn new(value: i64) -> Result<Self, PipelineDomainError> {
        u32::try_from(value)
            .ok()
            .filter(|position| *position > 0)
            .map(Self)
            .ok_or(PipelineDomainError::InvalidDisplayOrder(value))
    }

    /// Returns the display order for a zero-based column index.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::InvalidDisplayOrder`] if the index
    /// cannot be represented.
    pub fn from_index(index: usize) -> Result<Self, PipelineDomainError> {
        let position = i64::try_from(index)
            .ok()
            .and_then(|value| value.checked_add(1))
            .unwrap_or(i64::MAX);
        Self::new(position)
    }

    /// Returns the position immediately after this one.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::InvalidDisplayOrder`] on overflow.
    pub fn next(self) -> Result<Self, PipelineDomainError> {
        Self::new(i64::from(self.0) + 1)
    }

    /// Returns the underlying position.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DisplayOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Business meaning of a stage, used instead of matching on display names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageCategory {
    /// Regular working stage.
    #[default]
    Normal,
    /// Deal closed successfully.
    Won,
    /// Deal closed unsuccessfully.
    Lost,
}

impl StageCategory {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }
}

impl fmt::Display for StageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for StageCategory {
    type Error = ParseStageCategoryError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "normal" => Ok(Self::Normal),
            "won" => Ok(Self::Won),
            "lost" => Ok(Self::Lost),
            _ => Err(ParseStageCategoryError(value.to_owned())),
        }
    }
}

/// A pipeline step a lead can occupy; rendered as one board column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    id: StageId,
    name: StageName,
    color: StageColor,
    display_order: DisplayOrder,
    category: StageCategory,
}

impl Stage {
    /// Creates a new stage with a fresh identifier.
    #[must_use]
    pub fn new(
        name: StageName,
        color: StageColor,
        display_order: DisplayOrder,
        category: StageCategory,
    ) -> Self {
        Self {
            id: StageId::new(),
            name,
            color,
            display_order,
            category,
        }
    }

    /// Reconstructs a stage from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        id: StageId,
        name: StageName,
        color: StageColor,
        display_order: DisplayOrder,
        category: StageCategory,
    ) -> Self {
        Self {
            id,
            name,
            color,
            display_order,
            category,
        }
    }

    /// Returns the stage identifier.
    #[must_use]
    pub const fn id(&self) -> StageId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub const fn name(&self) -> &StageName {
        &self.name
    }

    /// Returns the column color.
    #[must_use]
    pub const fn color(&self) -> &StageColor {
        &self.color
    }

    /// Returns the column position.
    #[must_use]
    pub const fn display_order(&self) -> DisplayOrder {
        self.display_order
    }

    /// Returns the stage category.
    #[must_use]
    pub const fn category(&self) -> StageCategory {
        self.category
    }

    /// Renames the stage.
    pub fn rename(&mut self, name: StageName) {
        self.name = name;
    }

    /// Changes the column color.
    pub fn recolor(&mut self, color: StageColor) {
        self.color = color;
    }

    /// Changes the stage category.
    pub const fn recategorize(&mut self, category: StageCategory) {
        self.category = category;
    }

    /// Moves the column to a new position.
    pub const fn set_display_order(&mut self, display_order: DisplayOrder) {
        self.display_order = display_order;
    }
}

/// Snapshot of the stage registry ordered by display order.
///
/// Stages sharing a display order (possible after a partially persisted
/// reorder) are tie-broken by name so rendering stays deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageCatalog {
    stages: Vec<Stage>,
}

impl StageCatalog {
    /// Builds a catalog, sorting stages into column order.
    #[must_use]
    pub fn new(mut stages: Vec<Stage>) -> Self {
        stages.sort_by(|left, right| {
            left.display_order
                .cmp(&right.display_order)
                .then_with(|| left.name.as_str().cmp(right.name.as_str()))
        });
        Self { stages }
    }

    /// Looks up a stage by identifier.
    #[must_use]
    pub fn get(&self, id: StageId) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.id == id)
    }

    /// Returns `true` when the stage exists.
    #[must_use]
    pub fn contains(&self, id: StageId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the stages in column order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Returns the stage identifiers in column order.
    #[must_use]
    pub fn ids(&self) -> Vec<StageId> {
        self.stages.iter().map(Stage::id).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` when no stages are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the display order a newly appended stage should take.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::InvalidDisplayOrder`] on overflow.
    pub fn next_display_order(&self) -> Result<DisplayOrder, PipelineDomainError> {
        self.stages
            .iter()
            .map(Stage::display_order)
            .max()
            .map_or(Ok(DisplayOrder::FIRST), DisplayOrder::next)
    }

    /// Computes the dense `1..=N` display orders for a requested column
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::InvalidStage`] for an unknown stage and
    /// [`PipelineDomainError::IncompleteStageOrder`] unless `order` lists
    /// every registered stage exactly once.
    pub fn dense_order(
        &self,
        order: &[StageId],
    ) -> Result<Vec<(StageId, DisplayOrder)>, PipelineDomainError> {
        if let Some(unknown) = order.iter().find(|id| !self.contains(**id)) {
            return Err(PipelineDomainError::InvalidStage(*unknown));
        }
        let mut seen = std::collections::HashSet::with_capacity(order.len());
        let is_permutation =
            order.len() == self.stages.len() && order.iter().all(|id| seen.insert(*id));
        if !is_permutation {
            return Err(PipelineDomainError::IncompleteStageOrder {
                expected: self.stages.len(),
            });
        }

        order
            .iter()
            .enumerate()
            .map(|(index, id)| DisplayOrder::from_index(index).map(|position| (*id, position)))
            .collect()
    }
}
