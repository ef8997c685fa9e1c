//! Routine draft model - workouts, exercise entries and their sets
//!
//! A draft is built step by step by the wizard and mirrored to session
//! storage; the three top-level fields of [`RoutineDraft`] map one-to-one to
//! the three storage slots.

pub mod editor;
pub mod validation;

use std::collections::BTreeMap;

use chrono::Utc;
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogRef;

pub const DEFAULT_REPS: u32 = 12;
pub const DEFAULT_LOAD: f64 = 0.0;
pub const DEFAULT_REST_AFTER_SET_SECS: u32 = 90;
pub const DEFAULT_REST_AFTER_EXERCISE_SECS: u32 = 120;
pub const DROP_SET_REPS: u32 = 8;
pub const DROP_SET_LOAD_FACTOR: f64 = 0.8;

/// Workout letters, one per training day
pub const WORKOUT_LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// Opaque id: `<prefix>-<unix millis>-<9 random chars>`
pub fn new_id(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("{}-{}-{}", prefix, Utc::now().timestamp_millis(), suffix)
}

/// Routine difficulty tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Difficulty {
    #[serde(rename = "Baixa")]
    Low,
    #[default]
    #[serde(rename = "Média")]
    Medium,
    #[serde(rename = "Alta")]
    High,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Low => "Baixa",
            Difficulty::Medium => "Média",
            Difficulty::High => "Alta",
        }
    }
}

/// First wizard step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutineConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub goal: Option<String>,
    pub trainings_per_week: u32,
    pub difficulty: Difficulty,
    pub duration_weeks: u32,
    pub student_id: String,
}

/// One session template ("Treino A") and the muscle groups it targets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutPlan {
    pub id: String,
    pub name: String,
    pub muscle_groups: Vec<String>,
}

impl WorkoutPlan {
    /// Empty workouts `Treino A`, `Treino B`, ... (at most six)
    pub fn sequence(count: u32) -> Vec<WorkoutPlan> {
        WORKOUT_LETTERS
            .iter()
            .take(count as usize)
            .enumerate()
            .map(|(i, letter)| WorkoutPlan {
                id: format!("treino-{}", i + 1),
                name: format!("Treino {}", letter),
                muscle_groups: Vec::new(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EntryKind {
    Simple,
    Combined,
}

/// The catalog exercise(s) an entry is built from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Movement {
    Simple(CatalogRef),
    /// Two exercises back to back (bi-set / super-set)
    Combined(CatalogRef, CatalogRef),
}

impl Movement {
    pub fn kind(&self) -> EntryKind {
        match self {
            Movement::Simple(_) => EntryKind::Simple,
            Movement::Combined(_, _) => EntryKind::Combined,
        }
    }

    pub fn primary(&self) -> &CatalogRef {
        match self {
            Movement::Simple(ex) | Movement::Combined(ex, _) => ex,
        }
    }

    pub fn secondary(&self) -> Option<&CatalogRef> {
        match self {
            Movement::Simple(_) => None,
            Movement::Combined(_, ex) => Some(ex),
        }
    }
}

/// Planned repetitions and load for one exercise
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Target {
    pub reps: u32,
    pub load: f64,
}

impl Default for Target {
    fn default() -> Self {
        Self { reps: DEFAULT_REPS, load: DEFAULT_LOAD }
    }
}

/// Reduced-load continuation at the end of a set
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DropSet {
    pub reps: u32,
    pub reduced_load: f64,
}

impl DropSet {
    /// Stage seeded from the set's current load
    pub fn seeded(main_load: f64) -> Self {
        Self {
            reps: DROP_SET_REPS,
            reduced_load: (main_load * DROP_SET_LOAD_FACTOR).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum SetLoad {
    Single {
        target: Target,
        drop_set: Option<DropSet>,
    },
    /// One target per side of a combined entry
    Paired { first: Target, second: Target },
}

impl SetLoad {
    pub fn default_for(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Simple => SetLoad::Single { target: Target::default(), drop_set: None },
            EntryKind::Combined => SetLoad::Paired {
                first: Target::default(),
                second: Target::default(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetEntry {
    pub id: String,
    /// 1-based, contiguous within the entry
    pub number: u32,
    pub load: SetLoad,
    /// Ignored on the last set of an entry
    pub rest_after_set_secs: u32,
}

impl SetEntry {
    pub fn new(number: u32, kind: EntryKind) -> Self {
        Self {
            id: new_id("serie"),
            number,
            load: SetLoad::default_for(kind),
            rest_after_set_secs: DEFAULT_REST_AFTER_SET_SECS,
        }
    }

    pub fn drop_set(&self) -> Option<&DropSet> {
        match &self.load {
            SetLoad::Single { drop_set, .. } => drop_set.as_ref(),
            SetLoad::Paired { .. } => None,
        }
    }

    /// Main load of a simple set
    pub fn main_load(&self) -> Option<f64> {
        match &self.load {
            SetLoad::Single { target, .. } => Some(target.load),
            SetLoad::Paired { .. } => None,
        }
    }
}

/// One row of a workout's exercise list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutExerciseEntry {
    pub id: String,
    pub movement: Movement,
    pub sets: Vec<SetEntry>,
    pub rest_after_exercise_secs: u32,
}

impl WorkoutExerciseEntry {
    pub fn simple(exercise: CatalogRef) -> Self {
        Self::with_movement(new_id("ex"), Movement::Simple(exercise))
    }

    pub fn combined(first: CatalogRef, second: CatalogRef) -> Self {
        Self::with_movement(new_id("ex-combinado"), Movement::Combined(first, second))
    }

    fn with_movement(id: String, movement: Movement) -> Self {
        let first_set = SetEntry::new(1, movement.kind());
        Self {
            id,
            movement,
            sets: vec![first_set],
            rest_after_exercise_secs: DEFAULT_REST_AFTER_EXERCISE_SECS,
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.movement.kind()
    }

    /// Display name, `"A + B"` for combined entries
    pub fn name(&self) -> String {
        match &self.movement {
            Movement::Simple(ex) => ex.name.clone(),
            Movement::Combined(a, b) => format!("{} + {}", a.name, b.name),
        }
    }

    /// Muscle group label; combined entries are tagged bi-set or super-set
    pub fn group_label(&self) -> String {
        match &self.movement {
            Movement::Simple(ex) => ex.muscle_group.clone(),
            Movement::Combined(a, b) if a.muscle_group == b.muscle_group => {
                format!("{} (Bi-set)", a.muscle_group)
            }
            Movement::Combined(a, b) => {
                format!("{}, {} (Super-set)", a.muscle_group, b.muscle_group)
            }
        }
    }

    pub fn summary(&self) -> EntrySummary {
        let total_sets = self.sets.len();
        let drop_sets = self.sets.iter().filter(|s| s.drop_set().is_some()).count();
        let total_load: f64 = self.sets.iter().filter_map(|s| s.main_load()).sum();
        let mean_load = if total_sets == 0 { 0.0 } else { total_load / total_sets as f64 };
        EntrySummary { total_sets, drop_sets, mean_load }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntrySummary {
    pub total_sets: usize,
    pub drop_sets: usize,
    /// Mean main load of simple sets, 0 for combined entries
    pub mean_load: f64,
}

/// Exercise entries per workout id, in display order
pub type ExerciseMap = BTreeMap<String, Vec<WorkoutExerciseEntry>>;

/// The in-progress routine owned by the wizard
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutineDraft {
    pub config: Option<RoutineConfig>,
    pub workouts: Vec<WorkoutPlan>,
    pub exercises: ExerciseMap,
}

impl RoutineDraft {
    pub fn workout(&self, workout_id: &str) -> Option<&WorkoutPlan> {
        self.workouts.iter().find(|w| w.id == workout_id)
    }

    pub fn entries(&self, workout_id: &str) -> &[WorkoutExerciseEntry] {
        self.exercises.get(workout_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_entries(&self) -> usize {
        self.exercises.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
pub(crate) fn snapshot(id: &str, name: &str, group: &str) -> CatalogRef {
    CatalogRef {
        exercise_id: id.to_string(),
        name: name.to_string(),
        muscle_group: group.to_string(),
        equipment: "Halteres".to_string(),
    }
}
