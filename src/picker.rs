//! Exercise picker - filters over the catalog and the 1-or-2 selection
//! that feeds a new workout entry

use tracing::debug;

use crate::catalog::{CatalogExercise, CatalogQuery, CatalogRef, ExerciseSource, matches_search};
use crate::routine::WorkoutExerciseEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Simple,
    Combined,
}

impl SelectionMode {
    /// Number of exercises a confirmed selection holds
    pub fn required(&self) -> usize {
        match self {
            SelectionMode::Simple => 1,
            SelectionMode::Combined => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Selected,
    Deselected,
    /// Combined selection already holds two exercises
    Rejected,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    mode: SelectionMode,
    selected: Vec<CatalogExercise>,
}

impl Selection {
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn selected(&self) -> &[CatalogExercise] {
        &self.selected
    }

    pub fn is_selected(&self, exercise: &CatalogExercise) -> bool {
        self.selected.iter().any(|s| s.id == exercise.id)
    }

    /// Switching mode always drops the current selection
    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
        self.selected.clear();
    }

    pub fn can_select(&self, exercise: &CatalogExercise) -> bool {
        self.is_selected(exercise)
            || self.mode == SelectionMode::Simple
            || self.selected.len() < 2
    }

    pub fn toggle(&mut self, exercise: &CatalogExercise) -> Toggle {
        if self.is_selected(exercise) {
            self.selected.retain(|s| s.id != exercise.id);
            return Toggle::Deselected;
        }
        if !self.can_select(exercise) {
            return Toggle::Rejected;
        }

        match self.mode {
            SelectionMode::Simple => self.selected = vec![exercise.clone()],
            SelectionMode::Combined => self.selected.push(exercise.clone()),
        }
        Toggle::Selected
    }

    pub fn is_confirmable(&self) -> bool {
        self.selected.len() == self.mode.required()
    }

    /// Build the workout entry for a complete selection
    pub fn confirm(&self) -> Option<WorkoutExerciseEntry> {
        if !self.is_confirmable() {
            return None;
        }
        let entry = match self.selected.as_slice() {
            [only] => WorkoutExerciseEntry::simple(CatalogRef::from(only)),
            [first, second] => {
                WorkoutExerciseEntry::combined(CatalogRef::from(first), CatalogRef::from(second))
            }
            _ => return None,
        };
        Some(entry)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFilter {
    #[default]
    All,
    Standard,
    /// Only the signed-in trainer's own exercises
    Custom,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogFilters {
    pub source: SourceFilter,
    /// `None` = every group of the workout
    pub muscle_group: Option<String>,
    pub search: String,
}

/// Identifies one catalog request so stale responses can be dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// Picker state for adding exercises to one workout
#[derive(Debug, Clone, Default)]
pub struct ExercisePicker {
    workout_id: String,
    workout_groups: Vec<String>,
    filters: CatalogFilters,
    selection: Selection,
    available: Vec<CatalogExercise>,
    issued: u64,
}

impl ExercisePicker {
    /// Open for a workout: simple mode, nothing selected, no group filter or search
    pub fn open(workout_id: &str, workout_groups: &[String]) -> Self {
        debug!("Opening picker for workout {}", workout_id);
        Self {
            workout_id: workout_id.to_string(),
            workout_groups: workout_groups.to_vec(),
            ..Default::default()
        }
    }

    pub fn workout_id(&self) -> &str {
        &self.workout_id
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn available(&self) -> &[CatalogExercise] {
        &self.available
    }

    /// Returns true when the catalog must be fetched again
    pub fn set_source(&mut self, source: SourceFilter) -> bool {
        let changed = self.filters.source != source;
        self.filters.source = source;
        changed
    }

    /// Returns true when the catalog must be fetched again
    pub fn set_muscle_group(&mut self, group: Option<String>) -> bool {
        let changed = self.filters.muscle_group != group;
        self.filters.muscle_group = group;
        changed
    }

    /// Client-side only, never triggers a fetch
    pub fn set_search(&mut self, search: &str) {
        self.filters.search = search.to_string();
    }

    /// Backend query for the current filters.
    ///
    /// `None` means the result is known to be empty: custom exercises were
    /// requested without a signed-in trainer.
    pub fn query(&self, trainer_id: Option<&str>) -> Option<CatalogQuery> {
        let muscle_group = self.filters
            .muscle_group
            .as_ref()
            .filter(|g| self.workout_groups.contains(*g))
            .cloned();

        let (source, owner_id) = match self.filters.source {
            SourceFilter::All => (None, None),
            SourceFilter::Standard => (Some(ExerciseSource::Standard), None),
            SourceFilter::Custom => (Some(ExerciseSource::Custom), Some(trainer_id?.to_string())),
        };

        Some(CatalogQuery {
            muscle_groups: self.workout_groups.clone(),
            muscle_group,
            source,
            owner_id,
        })
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// Install fetched rows unless a newer request has been issued since
    pub fn apply_fetch(&mut self, ticket: FetchTicket, rows: Vec<CatalogExercise>) -> bool {
        if ticket.0 != self.issued {
            debug!("Dropping stale catalog response {:?} (latest {})", ticket, self.issued);
            return false;
        }
        self.available = rows;
        true
    }

    /// Rows shown to the operator after search and group filtering
    pub fn visible(&self) -> Vec<&CatalogExercise> {
        self.available
            .iter()
            .filter(|row| matches_search(row, &self.filters.search))
            .filter(|row| match &self.filters.muscle_group {
                Some(group) => &row.muscle_group == group,
                None => true,
            })
            .collect()
    }
}
