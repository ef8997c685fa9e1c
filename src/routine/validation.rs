//! Draft validation used by the wizard steps and the review screen

use thiserror::Error;

use super::{RoutineConfig, RoutineDraft, SetEntry, SetLoad};

pub const MIN_NAME_LEN: usize = 3;
pub const TRAININGS_PER_WEEK: std::ops::RangeInclusive<u32> = 1..=6;
pub const DURATION_WEEKS: std::ops::RangeInclusive<u32> = 1..=52;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    #[error("routine name is required")]
    NameMissing,
    #[error("routine name must have at least {} characters", MIN_NAME_LEN)]
    NameTooShort,
    #[error("trainings per week must be between 1 and 6 (got {0})")]
    TrainingsPerWeekOutOfRange(u32),
    #[error("duration must be between 1 and 52 weeks (got {0})")]
    DurationOutOfRange(u32),
}

impl RoutineConfig {
    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let name_len = self.name.trim().chars().count();
        if name_len == 0 {
            issues.push(ConfigIssue::NameMissing);
        } else if name_len < MIN_NAME_LEN {
            issues.push(ConfigIssue::NameTooShort);
        }
        if !TRAININGS_PER_WEEK.contains(&self.trainings_per_week) {
            issues.push(ConfigIssue::TrainingsPerWeekOutOfRange(self.trainings_per_week));
        }
        if !DURATION_WEEKS.contains(&self.duration_weeks) {
            issues.push(ConfigIssue::DurationOutOfRange(self.duration_weeks));
        }
        issues
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetIssue {
    #[error("repetitions must be greater than 0")]
    ZeroReps,
    #[error("load cannot be negative")]
    NegativeLoad,
    #[error("drop-set load cannot be negative")]
    NegativeDropLoad,
    /// Drop-set load not below the main load
    #[error("drop-set load ({reduced}kg) must be lower than the main load ({main}kg)")]
    DropLoadNotReduced { main: f64, reduced: f64 },
}

pub fn validate_set(set: &SetEntry) -> Vec<SetIssue> {
    let mut issues = Vec::new();
    match &set.load {
        SetLoad::Single { target, drop_set } => {
            if target.reps < 1 {
                issues.push(SetIssue::ZeroReps);
            }
            if target.load < 0.0 {
                issues.push(SetIssue::NegativeLoad);
            }
            if let Some(drop) = drop_set {
                if drop.reduced_load < 0.0 {
                    issues.push(SetIssue::NegativeDropLoad);
                }
                if drop.reduced_load >= target.load {
                    issues.push(SetIssue::DropLoadNotReduced {
                        main: target.load,
                        reduced: drop.reduced_load,
                    });
                }
            }
        }
        SetLoad::Paired { first, second } => {
            if first.reps < 1 || second.reps < 1 {
                issues.push(SetIssue::ZeroReps);
            }
            if first.load < 0.0 || second.load < 0.0 {
                issues.push(SetIssue::NegativeLoad);
            }
        }
    }
    issues
}

/// Anything that blocks submitting a draft
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftIssue {
    #[error("routine configuration not found")]
    MissingConfig,
    #[error(transparent)]
    Config(ConfigIssue),
    #[error("no workout configured")]
    NoWorkouts,
    #[error("{workout} has no muscle group selected")]
    NoMuscleGroups { workout: String },
    #[error("{workout} has no exercises")]
    NoExercises { workout: String },
    #[error("{workout} / {exercise} / set {set_number}: {issue}")]
    Set {
        workout: String,
        exercise: String,
        set_number: u32,
        issue: SetIssue,
    },
}

pub fn validate_draft(draft: &RoutineDraft) -> Vec<DraftIssue> {
    let mut issues = Vec::new();

    match &draft.config {
        None => issues.push(DraftIssue::MissingConfig),
        Some(config) => issues.extend(config.issues().into_iter().map(DraftIssue::Config)),
    }

    if draft.workouts.is_empty() {
        issues.push(DraftIssue::NoWorkouts);
    }

    for workout in &draft.workouts {
        if workout.muscle_groups.is_empty() {
            issues.push(DraftIssue::NoMuscleGroups { workout: workout.name.clone() });
        }
        let entries = draft.entries(&workout.id);
        if entries.is_empty() {
            issues.push(DraftIssue::NoExercises { workout: workout.name.clone() });
        }
        for entry in entries {
            for set in &entry.sets {
                for issue in validate_set(set) {
                    issues.push(DraftIssue::Set {
                        workout: workout.name.clone(),
                        exercise: entry.name(),
                        set_number: set.number,
                        issue,
                    });
                }
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routine::{
        Difficulty, DropSet, EntryKind, Target, WorkoutExerciseEntry, WorkoutPlan, snapshot,
    };

    fn config(name: &str, per_week: u32, weeks: u32) -> RoutineConfig {
        RoutineConfig {
            name: name.to_string(),
            description: String::new(),
            goal: None,
            trainings_per_week: per_week,
            difficulty: Difficulty::Medium,
            duration_weeks: weeks,
            student_id: "aluno-1".to_string(),
        }
    }

    fn single_set(reps: u32, load: f64, drop_set: Option<DropSet>) -> SetEntry {
        let mut set = SetEntry::new(1, EntryKind::Simple);
        set.load = SetLoad::Single { target: Target { reps, load }, drop_set };
        set
    }

    #[test]
    fn test_config_valid() {
        assert!(config("Hipertrofia", 3, 8).issues().is_empty());
    }

    #[test]
    fn test_config_name_rules() {
        assert_eq!(config("   ", 3, 8).issues(), [ConfigIssue::NameMissing]);
        assert_eq!(config(" ab ", 3, 8).issues(), [ConfigIssue::NameTooShort]);
    }

    #[test]
    fn test_config_ranges() {
        let issues = config("Força", 7, 0).issues();
        assert_eq!(
            issues,
            [
                ConfigIssue::TrainingsPerWeekOutOfRange(7),
                ConfigIssue::DurationOutOfRange(0),
            ]
        );
        assert!(config("Força", 6, 52).issues().is_empty());
    }

    #[test]
    fn test_set_defaults_are_valid() {
        assert!(validate_set(&SetEntry::new(1, EntryKind::Simple)).is_empty());
        assert!(validate_set(&SetEntry::new(1, EntryKind::Combined)).is_empty());
    }

    #[test]
    fn test_drop_load_must_be_lower() {
        let set = single_set(10, 40.0, Some(DropSet { reps: 8, reduced_load: 40.0 }));
        assert_eq!(
            validate_set(&set),
            [SetIssue::DropLoadNotReduced { main: 40.0, reduced: 40.0 }]
        );

        let ok = single_set(10, 40.0, Some(DropSet { reps: 8, reduced_load: 32.0 }));
        assert!(validate_set(&ok).is_empty());
    }

    #[test]
    fn test_zero_reps_and_negative_load() {
        let set = single_set(0, -5.0, None);
        assert_eq!(validate_set(&set), [SetIssue::ZeroReps, SetIssue::NegativeLoad]);
    }

    #[test]
    fn test_empty_draft_issues() {
        let issues = validate_draft(&RoutineDraft::default());
        assert_eq!(issues, [DraftIssue::MissingConfig, DraftIssue::NoWorkouts]);
    }

    #[test]
    fn test_draft_locates_set_issue() {
        let mut workouts = WorkoutPlan::sequence(1);
        workouts[0].muscle_groups.push("Peito".into());
        let mut entry = WorkoutExerciseEntry::simple(snapshot("e1", "Supino", "Peito"));
        entry.sets[0] = single_set(10, 20.0, Some(DropSet { reps: 8, reduced_load: 25.0 }));

        let mut draft = RoutineDraft {
            config: Some(config("Hipertrofia", 1, 4)),
            workouts,
            ..Default::default()
        };
        draft.exercises.insert("treino-1".into(), vec![entry]);

        let issues = validate_draft(&draft);
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            &issues[0],
            DraftIssue::Set { workout, set_number: 1, .. } if workout == "Treino A"
        ));
    }

    #[test]
    fn test_draft_workout_without_groups_or_exercises() {
        let draft = RoutineDraft {
            config: Some(config("Hipertrofia", 1, 4)),
            workouts: WorkoutPlan::sequence(1),
            ..Default::default()
        };
        assert_eq!(
            validate_draft(&draft),
            [
                DraftIssue::NoMuscleGroups { workout: "Treino A".into() },
                DraftIssue::NoExercises { workout: "Treino A".into() },
            ]
        );
    }

    #[test]
    fn test_issue_messages() {
        assert_eq!(
            ConfigIssue::NameTooShort.to_string(),
            "routine name must have at least 3 characters"
        );
        let issue = DraftIssue::Set {
            workout: "Treino A".into(),
            exercise: "Supino".into(),
            set_number: 2,
            issue: SetIssue::DropLoadNotReduced { main: 40.0, reduced: 42.5 },
        };
        assert_eq!(
            issue.to_string(),
            "Treino A / Supino / set 2: drop-set load (42.5kg) must be lower than the main load (40kg)"
        );
        assert_eq!(
            DraftIssue::Config(ConfigIssue::DurationOutOfRange(0)).to_string(),
            "duration must be between 1 and 52 weeks (got 0)"
        );
    }
}
