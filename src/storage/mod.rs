//! Session storage - three keyed slots mirroring the routine draft
//!
//! Slots are independent and last-write-wins. Reads never fail: a missing,
//! unreadable or corrupt slot is treated as "nothing saved yet".

mod sqlite;

pub use sqlite::SqliteStore;

use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::routine::{ExerciseMap, RoutineConfig, RoutineDraft, WorkoutPlan};

pub const CONFIG_KEY: &str = "routine_configuration";
pub const WORKOUTS_KEY: &str = "routine_workouts";
pub const EXERCISES_KEY: &str = "routine_exercises";

/// Format tag written into every slot
pub const SLOT_VERSION: u32 = 1;

/// Key/value capability the draft is mirrored into
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store, lives as long as the value
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.slots.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.slots.borrow_mut().remove(key);
        Ok(())
    }
}

impl<T: SessionStore + ?Sized> SessionStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

/// Typed access to the three draft slots of a [`SessionStore`]
pub struct DraftStorage<S> {
    store: S,
}

impl<S: SessionStore> DraftStorage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read slot {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str::<Envelope<T>>(&raw) {
            Ok(envelope) if envelope.version == SLOT_VERSION => Some(envelope.data),
            Ok(envelope) => {
                warn!("Slot {} has unsupported version {}, starting fresh", key, envelope.version);
                None
            }
            Err(e) => {
                warn!("Slot {} is corrupt, starting fresh: {}", key, e);
                None
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, data: &T) -> Result<()> {
        let json = serde_json::to_string(&EnvelopeRef { version: SLOT_VERSION, data })?;
        self.store.set(key, &json)?;
        debug!("Saved slot {} ({} bytes)", key, json.len());
        Ok(())
    }

    pub fn load_config(&self) -> Option<RoutineConfig> {
        self.read(CONFIG_KEY)
    }

    pub fn load_workouts(&self) -> Vec<WorkoutPlan> {
        self.read(WORKOUTS_KEY).unwrap_or_default()
    }

    pub fn load_exercises(&self) -> ExerciseMap {
        self.read(EXERCISES_KEY).unwrap_or_default()
    }

    /// Restore every slot into a draft
    pub fn load_draft(&self) -> RoutineDraft {
        RoutineDraft {
            config: self.load_config(),
            workouts: self.load_workouts(),
            exercises: self.load_exercises(),
        }
    }

    pub fn save_config(&self, config: &RoutineConfig) -> Result<()> {
        self.write(CONFIG_KEY, config)
    }

    pub fn save_workouts(&self, workouts: &[WorkoutPlan]) -> Result<()> {
        self.write(WORKOUTS_KEY, &workouts)
    }

    pub fn save_exercises(&self, exercises: &ExerciseMap) -> Result<()> {
        self.write(EXERCISES_KEY, exercises)
    }

    /// Write all three slots, one after the other
    pub fn save_draft(&self, draft: &RoutineDraft) -> Result<()> {
        if let Some(config) = &draft.config {
            self.save_config(config)?;
        }
        self.save_workouts(&draft.workouts)?;
        self.save_exercises(&draft.exercises)
    }

    /// Drop the saved exercises of one workout
    pub fn clear_workout_exercises(&self, workout_id: &str) -> Result<()> {
        let mut exercises = self.load_exercises();
        if exercises.remove(workout_id).is_some() {
            self.save_exercises(&exercises)?;
            debug!("Cleared exercises of workout {}", workout_id);
        }
        Ok(())
    }

    pub fn clear_all(&self) -> Result<()> {
        for key in [CONFIG_KEY, WORKOUTS_KEY, EXERCISES_KEY] {
            self.store.remove(key)?;
        }
        debug!("Cleared all routine slots");
        Ok(())
    }
}
