//! Routine wizard - owns the draft and mirrors every change to session storage
//!
//! Steps: configuration → workouts → exercises → review. The storage is only
//! a mirror: it is read once on [`Wizard::open`] and written after each change.

use anyhow::Result;
use thiserror::Error;
use tracing::{info, warn};

use crate::picker::ExercisePicker;
use crate::routine::editor::{self, DropSetUpdate, PairSide, Rejection, SetUpdate, TargetUpdate};
use crate::routine::validation::{ConfigIssue, DraftIssue, validate_draft};
use crate::routine::{ExerciseMap, RoutineConfig, RoutineDraft, WorkoutExerciseEntry, WorkoutPlan};
use crate::storage::{DraftStorage, SessionStore};

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("invalid configuration: {}", format_issues(.0))]
    InvalidConfig(Vec<ConfigIssue>),
    #[error("configure the routine first")]
    NotConfigured,
    #[error("workout {0} not found")]
    UnknownWorkout(String),
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

fn format_issues(issues: &[ConfigIssue]) -> String {
    issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

pub struct Wizard<S> {
    storage: DraftStorage<S>,
    draft: RoutineDraft,
}

impl<S: SessionStore> Wizard<S> {
    /// Restore whatever the session holds
    pub fn open(store: S) -> Self {
        let storage = DraftStorage::new(store);
        let draft = storage.load_draft();
        info!(
            "Wizard opened: config={}, workouts={}, exercises={}",
            draft.config.is_some(),
            draft.workouts.len(),
            draft.total_entries()
        );
        Self { storage, draft }
    }

    pub fn draft(&self) -> &RoutineDraft {
        &self.draft
    }

    pub fn issues(&self) -> Vec<DraftIssue> {
        validate_draft(&self.draft)
    }

    // ---- configuration ----

    pub fn configure(&mut self, config: RoutineConfig) -> Result<(), WizardError> {
        let issues = config.issues();
        if !issues.is_empty() {
            return Err(WizardError::InvalidConfig(issues));
        }
        let config = RoutineConfig {
            name: config.name.trim().to_string(),
            description: config.description.trim().to_string(),
            ..config
        };
        self.storage.save_config(&config)?;
        self.draft.config = Some(config);
        Ok(())
    }

    // ---- workouts ----

    /// Keep saved workouts when their count still matches, otherwise start
    /// `Treino A..` afresh. Fresh workouts have no groups, so every saved
    /// exercise is dropped with the old ones.
    pub fn prepare_workouts(&mut self) -> Result<&[WorkoutPlan], WizardError> {
        let per_week = self
            .draft
            .config
            .as_ref()
            .ok_or(WizardError::NotConfigured)?
            .trainings_per_week;

        if self.draft.workouts.len() != per_week as usize {
            info!("Creating {} workouts", per_week);
            if !self.draft.exercises.is_empty() {
                warn!("Workout count changed, {} exercise(s) cleared", self.draft.total_entries());
            }
            self.draft.workouts = WorkoutPlan::sequence(per_week);
            self.draft.exercises.clear();
            self.storage.save_draft(&self.draft)?;
        }
        Ok(&self.draft.workouts)
    }

    fn workout_index(&self, workout_id: &str) -> Result<usize, WizardError> {
        self.draft
            .workouts
            .iter()
            .position(|w| w.id == workout_id)
            .ok_or_else(|| WizardError::UnknownWorkout(workout_id.to_string()))
    }

    /// Changing a workout's targets drops the exercises picked for it
    pub fn toggle_muscle_group(&mut self, workout_id: &str, group: &str) -> Result<(), WizardError> {
        let index = self.workout_index(workout_id)?;
        let groups = &mut self.draft.workouts[index].muscle_groups;
        if let Some(pos) = groups.iter().position(|g| g == group) {
            groups.remove(pos);
        } else {
            groups.push(group.to_string());
        }
        self.storage.save_workouts(&self.draft.workouts)?;
        self.drop_workout_exercises(workout_id)
    }

    pub fn clear_muscle_groups(&mut self, workout_id: &str) -> Result<(), WizardError> {
        let index = self.workout_index(workout_id)?;
        self.draft.workouts[index].muscle_groups.clear();
        self.storage.save_workouts(&self.draft.workouts)?;
        self.drop_workout_exercises(workout_id)
    }

    fn drop_workout_exercises(&mut self, workout_id: &str) -> Result<(), WizardError> {
        if self.draft.exercises.remove(workout_id).is_some() {
            warn!("Muscle groups of {} changed, its exercises were cleared", workout_id);
        }
        self.storage.clear_workout_exercises(workout_id)?;
        Ok(())
    }

    // ---- exercises ----

    pub fn open_picker(&self, workout_id: &str) -> Result<ExercisePicker, WizardError> {
        let index = self.workout_index(workout_id)?;
        Ok(ExercisePicker::open(workout_id, &self.draft.workouts[index].muscle_groups))
    }

    /// Swap in an edited map and persist the exercise slot
    fn commit(&mut self, next: ExerciseMap) -> Result<(), WizardError> {
        self.storage.save_exercises(&next)?;
        self.draft.exercises = next;
        Ok(())
    }

    fn edit<F>(&mut self, workout_id: &str, op: F) -> Result<(), WizardError>
    where
        F: FnOnce(&ExerciseMap) -> editor::EditResult,
    {
        self.workout_index(workout_id)?;
        let next = op(&self.draft.exercises)?;
        self.commit(next)
    }

    /// Add the picker's confirmed selection; returns the new entry id
    pub fn add_from_picker(&mut self, picker: &ExercisePicker) -> Result<Option<String>, WizardError> {
        let Some(entry) = picker.selection().confirm() else {
            return Ok(None);
        };
        let id = entry.id.clone();
        self.add_exercise(picker.workout_id(), entry)?;
        Ok(Some(id))
    }

    pub fn add_exercise(&mut self, workout_id: &str, entry: WorkoutExerciseEntry) -> Result<(), WizardError> {
        info!("Adding {} to {}", entry.name(), workout_id);
        self.edit(workout_id, |map| editor::add_exercise(map, workout_id, entry))
    }

    pub fn remove_exercise(&mut self, workout_id: &str, entry_id: &str) -> Result<(), WizardError> {
        self.edit(workout_id, |map| editor::remove_exercise(map, workout_id, entry_id))
    }

    pub fn add_set(&mut self, workout_id: &str, entry_id: &str) -> Result<(), WizardError> {
        self.edit(workout_id, |map| editor::add_set(map, workout_id, entry_id))
    }

    pub fn remove_set(&mut self, workout_id: &str, entry_id: &str, set_id: &str) -> Result<(), WizardError> {
        self.edit(workout_id, |map| editor::remove_set(map, workout_id, entry_id, set_id))
    }

    pub fn update_set(
        &mut self,
        workout_id: &str,
        entry_id: &str,
        set_id: &str,
        update: SetUpdate,
    ) -> Result<(), WizardError> {
        self.edit(workout_id, |map| editor::update_set(map, workout_id, entry_id, set_id, update))
    }

    pub fn update_combined_set(
        &mut self,
        workout_id: &str,
        entry_id: &str,
        set_id: &str,
        side: PairSide,
        update: TargetUpdate,
    ) -> Result<(), WizardError> {
        self.edit(workout_id, |map| {
            editor::update_combined_set(map, workout_id, entry_id, set_id, side, update)
        })
    }

    pub fn toggle_drop_set(&mut self, workout_id: &str, entry_id: &str, set_id: &str) -> Result<(), WizardError> {
        self.edit(workout_id, |map| editor::toggle_drop_set(map, workout_id, entry_id, set_id))
    }

    pub fn update_drop_set(
        &mut self,
        workout_id: &str,
        entry_id: &str,
        set_id: &str,
        update: DropSetUpdate,
    ) -> Result<(), WizardError> {
        self.edit(workout_id, |map| editor::update_drop_set(map, workout_id, entry_id, set_id, update))
    }

    pub fn update_exercise_rest(&mut self, workout_id: &str, entry_id: &str, secs: u32) -> Result<(), WizardError> {
        self.edit(workout_id, |map| editor::update_exercise_rest(map, workout_id, entry_id, secs))
    }

    // ---- end of session ----

    /// Drop the session after a successful submission
    pub fn finish(self) -> Result<()> {
        info!("Routine submitted, clearing session");
        self.storage.clear_all()
    }

    /// Abandon the draft
    pub fn exit(self) -> Result<()> {
        info!("Routine wizard exited, clearing session");
        self.storage.clear_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::row;
    use crate::picker::SelectionMode;
    use crate::routine::{Difficulty, snapshot};
    use crate::storage::{EXERCISES_KEY, MemoryStore};

    fn config(per_week: u32) -> RoutineConfig {
        RoutineConfig {
            name: "  Força total ".into(),
            description: String::new(),
            goal: Some("Força".into()),
            trainings_per_week: per_week,
            difficulty: Difficulty::High,
            duration_weeks: 4,
            student_id: "aluno-1".into(),
        }
    }

    fn configured(store: &MemoryStore, per_week: u32) -> Wizard<&MemoryStore> {
        let mut wizard = Wizard::open(store);
        wizard.configure(config(per_week)).unwrap();
        wizard.prepare_workouts().unwrap();
        wizard.toggle_muscle_group("treino-1", "Peito").unwrap();
        wizard
    }

    fn add_simple(wizard: &mut Wizard<&MemoryStore>) -> String {
        let mut picker = wizard.open_picker("treino-1").unwrap();
        picker.selection_mut().toggle(&row("e1", "Supino", "Peito"));
        wizard.add_from_picker(&picker).unwrap().unwrap()
    }

    #[test]
    fn test_configure_rejects_invalid() {
        let store = MemoryStore::new();
        let mut wizard = Wizard::open(&store);
        let err = wizard.configure(RoutineConfig { name: "x".into(), ..config(3) }).unwrap_err();
        assert!(matches!(err, WizardError::InvalidConfig(_)));
        assert!(wizard.draft().config.is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_configure_trims_and_saves() {
        let store = MemoryStore::new();
        let mut wizard = Wizard::open(&store);
        wizard.configure(config(3)).unwrap();
        assert_eq!(wizard.draft().config.as_ref().unwrap().name, "Força total");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_prepare_workouts_requires_config() {
        let store = MemoryStore::new();
        let mut wizard = Wizard::open(&store);
        assert!(matches!(wizard.prepare_workouts(), Err(WizardError::NotConfigured)));
    }

    #[test]
    fn test_prepare_workouts_reuses_matching_count() {
        let store = MemoryStore::new();
        let mut wizard = configured(&store, 3);
        let names: Vec<_> = wizard.prepare_workouts().unwrap().iter().map(|w| w.name.clone()).collect();
        assert_eq!(names, ["Treino A", "Treino B", "Treino C"]);
        assert_eq!(wizard.draft().workouts[0].muscle_groups, ["Peito"]);

        wizard.configure(config(2)).unwrap();
        let workouts = wizard.prepare_workouts().unwrap();
        assert_eq!(workouts.len(), 2);
        assert!(workouts[0].muscle_groups.is_empty());
    }

    #[test]
    fn test_new_workout_count_drops_old_exercises() {
        let store = MemoryStore::new();
        let mut wizard = configured(&store, 3);
        add_simple(&mut wizard);
        wizard.toggle_muscle_group("treino-3", "Costas").unwrap();
        let mut picker = wizard.open_picker("treino-3").unwrap();
        picker.selection_mut().toggle(&row("e2", "Remada", "Costas"));
        wizard.add_from_picker(&picker).unwrap();
        assert_eq!(wizard.draft().total_entries(), 2);

        wizard.configure(config(2)).unwrap();
        wizard.prepare_workouts().unwrap();
        assert!(wizard.draft().entries("treino-1").is_empty());
        assert_eq!(wizard.draft().total_entries(), 0);

        let reopened = Wizard::open(&store);
        assert!(reopened.draft().exercises.is_empty());
        assert_eq!(reopened.draft().workouts.len(), 2);
    }

    #[test]
    fn test_reopen_restores_draft() {
        let store = MemoryStore::new();
        let mut wizard = configured(&store, 2);
        let entry_id = add_simple(&mut wizard);
        wizard.add_set("treino-1", &entry_id).unwrap();
        let set_id = wizard.draft().entries("treino-1")[0].sets[0].id.clone();
        wizard.update_set("treino-1", &entry_id, &set_id, SetUpdate::Load(1.45)).unwrap();
        wizard.toggle_drop_set("treino-1", &entry_id, &set_id).unwrap();
        let before = wizard.draft().clone();

        let reopened = Wizard::open(&store);
        assert_eq!(reopened.draft(), &before);
    }

    #[test]
    fn test_rejection_leaves_state_and_storage() {
        let store = MemoryStore::new();
        let mut wizard = configured(&store, 2);
        let entry_id = add_simple(&mut wizard);
        let set_id = wizard.draft().entries("treino-1")[0].sets[0].id.clone();
        let saved = store.get(EXERCISES_KEY).unwrap();

        let err = wizard.remove_set("treino-1", &entry_id, &set_id).unwrap_err();
        assert!(matches!(err, WizardError::Rejected(Rejection::LastSet)));
        assert_eq!(wizard.draft().entries("treino-1")[0].sets.len(), 1);
        assert_eq!(store.get(EXERCISES_KEY).unwrap(), saved);
    }

    #[test]
    fn test_unknown_workout_rejected() {
        let store = MemoryStore::new();
        let mut wizard = configured(&store, 2);
        let entry = WorkoutExerciseEntry::simple(snapshot("e1", "Supino", "Peito"));
        assert!(matches!(
            wizard.add_exercise("treino-9", entry),
            Err(WizardError::UnknownWorkout(_))
        ));
        assert!(matches!(wizard.open_picker("treino-9"), Err(WizardError::UnknownWorkout(_))));
    }

    #[test]
    fn test_group_change_clears_workout_exercises() {
        let store = MemoryStore::new();
        let mut wizard = configured(&store, 2);
        add_simple(&mut wizard);
        assert_eq!(wizard.draft().entries("treino-1").len(), 1);

        wizard.toggle_muscle_group("treino-1", "Tríceps").unwrap();
        assert!(wizard.draft().entries("treino-1").is_empty());
        assert_eq!(wizard.draft().workouts[0].muscle_groups, ["Peito", "Tríceps"]);

        add_simple(&mut wizard);
        wizard.clear_muscle_groups("treino-1").unwrap();
        assert!(wizard.draft().workouts[0].muscle_groups.is_empty());

        let reopened = Wizard::open(&store);
        assert!(reopened.draft().entries("treino-1").is_empty());
    }

    #[test]
    fn test_incomplete_selection_adds_nothing() {
        let store = MemoryStore::new();
        let mut wizard = configured(&store, 2);
        let mut picker = wizard.open_picker("treino-1").unwrap();
        picker.selection_mut().set_mode(SelectionMode::Combined);
        picker.selection_mut().toggle(&row("e1", "Supino", "Peito"));
        assert_eq!(wizard.add_from_picker(&picker).unwrap(), None);
        assert!(wizard.draft().entries("treino-1").is_empty());
    }

    #[test]
    fn test_edits_flow_into_draft() {
        let store = MemoryStore::new();
        let mut wizard = configured(&store, 2);
        let entry_id = add_simple(&mut wizard);
        let set_id = wizard.draft().entries("treino-1")[0].sets[0].id.clone();

        wizard.update_set("treino-1", &entry_id, &set_id, SetUpdate::Load(50.0)).unwrap();
        wizard.toggle_drop_set("treino-1", &entry_id, &set_id).unwrap();
        wizard.update_exercise_rest("treino-1", &entry_id, 150).unwrap();

        let entry = &wizard.draft().entries("treino-1")[0];
        assert_eq!(entry.rest_after_exercise_secs, 150);
        assert_eq!(entry.sets[0].drop_set().map(|d| d.reduced_load), Some(40.0));
    }

    #[test]
    fn test_exit_clears_session() {
        let store = MemoryStore::new();
        let mut wizard = configured(&store, 2);
        add_simple(&mut wizard);
        assert_eq!(store.len(), 3);
        wizard.exit().unwrap();
        assert!(store.is_empty());
    }
}
