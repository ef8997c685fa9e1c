//! Series editor - copy-on-write operations over a draft's exercise map
//!
//! Every operation borrows the current map and returns a new one with the
//! rebuilt entry substituted in, or a [`Rejection`] leaving the caller's map
//! untouched.

use thiserror::Error;
use tracing::debug;

use super::{
    DropSet, ExerciseMap, SetEntry, SetLoad, WorkoutExerciseEntry,
};

/// Why an edit was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("workout {0} not found")]
    UnknownWorkout(String),
    #[error("exercise entry {0} not found")]
    UnknownEntry(String),
    #[error("set {0} not found")]
    UnknownSet(String),
    #[error("an exercise entry must keep at least one set")]
    LastSet,
    #[error("drop-sets only apply to simple sets")]
    DropSetOnPaired,
    #[error("set has no drop-set stage")]
    NoDropSet,
    #[error("field only applies to simple sets")]
    NotSimple,
    #[error("field only applies to combined sets")]
    NotCombined,
}

pub type EditResult = Result<ExerciseMap, Rejection>;

/// Single-field update of a set
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetUpdate {
    Reps(u32),
    Load(f64),
    RestAfterSet(u32),
}

/// Side of a combined set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSide {
    First,
    Second,
}

impl PairSide {
    /// 0 → first, 1 → second
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(PairSide::First),
            1 => Some(PairSide::Second),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetUpdate {
    Reps(u32),
    Load(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropSetUpdate {
    Reps(u32),
    ReducedLoad(f64),
}

/// Rebuild one entry of one workout
fn with_entry<F>(map: &ExerciseMap, workout_id: &str, entry_id: &str, rebuild: F) -> EditResult
where
    F: FnOnce(&WorkoutExerciseEntry) -> Result<WorkoutExerciseEntry, Rejection>,
{
    let entries = map
        .get(workout_id)
        .ok_or_else(|| Rejection::UnknownWorkout(workout_id.to_string()))?;
    let index = entries
        .iter()
        .position(|e| e.id == entry_id)
        .ok_or_else(|| Rejection::UnknownEntry(entry_id.to_string()))?;

    let rebuilt = rebuild(&entries[index])?;

    let mut next_entries = entries.clone();
    next_entries[index] = rebuilt;
    let mut next = map.clone();
    next.insert(workout_id.to_string(), next_entries);
    Ok(next)
}

/// Rebuild one set of one entry
fn with_set<F>(
    map: &ExerciseMap,
    workout_id: &str,
    entry_id: &str,
    set_id: &str,
    rebuild: F,
) -> EditResult
where
    F: FnOnce(&SetEntry) -> Result<SetEntry, Rejection>,
{
    with_entry(map, workout_id, entry_id, |entry| {
        let index = entry
            .sets
            .iter()
            .position(|s| s.id == set_id)
            .ok_or_else(|| Rejection::UnknownSet(set_id.to_string()))?;
        let rebuilt = rebuild(&entry.sets[index])?;
        let mut next = entry.clone();
        next.sets[index] = rebuilt;
        Ok(next)
    })
}

pub fn add_exercise(map: &ExerciseMap, workout_id: &str, entry: WorkoutExerciseEntry) -> EditResult {
    debug!("Adding {} to workout {}", entry.name(), workout_id);
    let mut next = map.clone();
    next.entry(workout_id.to_string()).or_default().push(entry);
    Ok(next)
}

pub fn remove_exercise(map: &ExerciseMap, workout_id: &str, entry_id: &str) -> EditResult {
    let entries = map
        .get(workout_id)
        .ok_or_else(|| Rejection::UnknownWorkout(workout_id.to_string()))?;
    if !entries.iter().any(|e| e.id == entry_id) {
        return Err(Rejection::UnknownEntry(entry_id.to_string()));
    }

    let mut next = map.clone();
    next.insert(
        workout_id.to_string(),
        entries.iter().filter(|e| e.id != entry_id).cloned().collect(),
    );
    Ok(next)
}

/// Append a default-valued set numbered after the current last one
pub fn add_set(map: &ExerciseMap, workout_id: &str, entry_id: &str) -> EditResult {
    with_entry(map, workout_id, entry_id, |entry| {
        let mut next = entry.clone();
        let number = next.sets.len() as u32 + 1;
        next.sets.push(SetEntry::new(number, entry.kind()));
        Ok(next)
    })
}

/// Remove a set and renumber the rest from 1
pub fn remove_set(map: &ExerciseMap, workout_id: &str, entry_id: &str, set_id: &str) -> EditResult {
    with_entry(map, workout_id, entry_id, |entry| {
        if !entry.sets.iter().any(|s| s.id == set_id) {
            return Err(Rejection::UnknownSet(set_id.to_string()));
        }
        if entry.sets.len() <= 1 {
            return Err(Rejection::LastSet);
        }

        let mut next = entry.clone();
        next.sets = entry
            .sets
            .iter()
            .filter(|s| s.id != set_id)
            .enumerate()
            .map(|(i, s)| SetEntry { number: i as u32 + 1, ..s.clone() })
            .collect();
        Ok(next)
    })
}

pub fn update_set(
    map: &ExerciseMap,
    workout_id: &str,
    entry_id: &str,
    set_id: &str,
    update: SetUpdate,
) -> EditResult {
    with_set(map, workout_id, entry_id, set_id, |set| {
        let mut next = set.clone();
        match (update, &mut next.load) {
            (SetUpdate::RestAfterSet(secs), _) => next.rest_after_set_secs = secs,
            (SetUpdate::Reps(reps), SetLoad::Single { target, .. }) => target.reps = reps,
            (SetUpdate::Load(load), SetLoad::Single { target, .. }) => target.load = load,
            (_, SetLoad::Paired { .. }) => return Err(Rejection::NotSimple),
        }
        Ok(next)
    })
}

/// Update one side of a combined set, leaving the other side as is
pub fn update_combined_set(
    map: &ExerciseMap,
    workout_id: &str,
    entry_id: &str,
    set_id: &str,
    side: PairSide,
    update: TargetUpdate,
) -> EditResult {
    with_set(map, workout_id, entry_id, set_id, |set| {
        let mut next = set.clone();
        let SetLoad::Paired { first, second } = &mut next.load else {
            return Err(Rejection::NotCombined);
        };
        let target = match side {
            PairSide::First => first,
            PairSide::Second => second,
        };
        match update {
            TargetUpdate::Reps(reps) => target.reps = reps,
            TargetUpdate::Load(load) => target.load = load,
        }
        Ok(next)
    })
}

/// Switch a simple set's drop-set stage on (seeded from the current load) or off
pub fn toggle_drop_set(map: &ExerciseMap, workout_id: &str, entry_id: &str, set_id: &str) -> EditResult {
    with_set(map, workout_id, entry_id, set_id, |set| {
        let mut next = set.clone();
        let SetLoad::Single { target, drop_set } = &mut next.load else {
            return Err(Rejection::DropSetOnPaired);
        };
        *drop_set = if drop_set.is_some() {
            None
        } else {
            Some(DropSet::seeded(target.load))
        };
        Ok(next)
    })
}

pub fn update_drop_set(
    map: &ExerciseMap,
    workout_id: &str,
    entry_id: &str,
    set_id: &str,
    update: DropSetUpdate,
) -> EditResult {
    with_set(map, workout_id, entry_id, set_id, |set| {
        let mut next = set.clone();
        let SetLoad::Single { drop_set, .. } = &mut next.load else {
            return Err(Rejection::DropSetOnPaired);
        };
        let stage = drop_set.as_mut().ok_or(Rejection::NoDropSet)?;
        match update {
            DropSetUpdate::Reps(reps) => stage.reps = reps,
            DropSetUpdate::ReducedLoad(load) => stage.reduced_load = load,
        }
        Ok(next)
    })
}

pub fn update_exercise_rest(map: &ExerciseMap, workout_id: &str, entry_id: &str, secs: u32) -> EditResult {
    with_entry(map, workout_id, entry_id, |entry| {
        Ok(WorkoutExerciseEntry { rest_after_exercise_secs: secs, ..entry.clone() })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routine::{Target, snapshot};
    use proptest::prelude::*;

    const W: &str = "treino-1";

    fn simple_map() -> (ExerciseMap, String) {
        let entry = WorkoutExerciseEntry::simple(snapshot("e1", "Supino", "Peito"));
        let id = entry.id.clone();
        (add_exercise(&ExerciseMap::new(), W, entry).unwrap(), id)
    }

    fn combined_map() -> (ExerciseMap, String) {
        let entry = WorkoutExerciseEntry::combined(
            snapshot("e1", "Supino", "Peito"),
            snapshot("e2", "Remada", "Costas"),
        );
        let id = entry.id.clone();
        (add_exercise(&ExerciseMap::new(), W, entry).unwrap(), id)
    }

    fn entry<'a>(map: &'a ExerciseMap, id: &str) -> &'a WorkoutExerciseEntry {
        map[W].iter().find(|e| e.id == id).unwrap()
    }

    fn numbers(entry: &WorkoutExerciseEntry) -> Vec<u32> {
        entry.sets.iter().map(|s| s.number).collect()
    }

    fn single(set: &SetEntry) -> (Target, Option<DropSet>) {
        match &set.load {
            SetLoad::Single { target, drop_set } => (*target, *drop_set),
            other => panic!("expected single set, got {:?}", other),
        }
    }

    fn paired(set: &SetEntry) -> (Target, Target) {
        match &set.load {
            SetLoad::Paired { first, second } => (*first, *second),
            other => panic!("expected paired set, got {:?}", other),
        }
    }

    #[test]
    fn test_add_exercise_creates_workout_list() {
        let (map, id) = simple_map();
        assert_eq!(map[W].len(), 1);
        assert_eq!(map[W][0].id, id);
    }

    #[test]
    fn test_remove_exercise_leaves_others() {
        let (map, first) = simple_map();
        let other = WorkoutExerciseEntry::simple(snapshot("e9", "Agachamento", "Quadríceps"));
        let other_id = other.id.clone();
        let map = add_exercise(&map, W, other).unwrap();

        let next = remove_exercise(&map, W, &first).unwrap();
        assert_eq!(next[W].len(), 1);
        assert_eq!(next[W][0].id, other_id);
        assert_eq!(map[W].len(), 2, "input map must stay untouched");
    }

    #[test]
    fn test_remove_unknown_exercise() {
        let (map, _) = simple_map();
        assert_eq!(
            remove_exercise(&map, W, "nope"),
            Err(Rejection::UnknownEntry("nope".into()))
        );
        assert_eq!(
            remove_exercise(&map, "treino-9", "nope"),
            Err(Rejection::UnknownWorkout("treino-9".into()))
        );
    }

    #[test]
    fn test_add_then_remove_first_set_scenario() {
        let (map, id) = simple_map();
        let map = update_set(&map, W, &id, &entry(&map, &id).sets[0].id.clone(), SetUpdate::Load(20.0)).unwrap();
        let map = add_set(&map, W, &id).unwrap();

        let e = entry(&map, &id);
        assert_eq!(numbers(e), [1, 2]);
        let (second_target, _) = single(&e.sets[1]);
        assert_eq!(second_target, Target { reps: 12, load: 0.0 });
        assert_eq!(e.sets[1].rest_after_set_secs, 90);

        let first_id = e.sets[0].id.clone();
        let second = e.sets[1].clone();
        let map = remove_set(&map, W, &id, &first_id).unwrap();

        let e = entry(&map, &id);
        assert_eq!(e.sets.len(), 1);
        assert_eq!(e.sets[0].number, 1);
        assert_eq!(e.sets[0].id, second.id);
        assert_eq!(e.sets[0].load, second.load);
    }

    #[test]
    fn test_remove_last_set_rejected() {
        let (map, id) = simple_map();
        let set_id = entry(&map, &id).sets[0].id.clone();
        assert_eq!(remove_set(&map, W, &id, &set_id), Err(Rejection::LastSet));
        assert_eq!(entry(&map, &id).sets.len(), 1);
    }

    #[test]
    fn test_remove_middle_set_renumbers() {
        let (map, id) = simple_map();
        let map = add_set(&add_set(&map, W, &id).unwrap(), W, &id).unwrap();
        let middle = entry(&map, &id).sets[1].id.clone();
        let map = remove_set(&map, W, &id, &middle).unwrap();
        assert_eq!(numbers(entry(&map, &id)), [1, 2]);
    }

    #[test]
    fn test_add_set_on_combined_defaults_both_pairs() {
        let (map, id) = combined_map();
        let map = add_set(&map, W, &id).unwrap();
        let (first, second) = paired(&entry(&map, &id).sets[1]);
        assert_eq!(first, Target::default());
        assert_eq!(second, Target::default());
    }

    #[test]
    fn test_update_set_single_field() {
        let (map, id) = simple_map();
        let set_id = entry(&map, &id).sets[0].id.clone();
        let map = update_set(&map, W, &id, &set_id, SetUpdate::Reps(10)).unwrap();
        let map = update_set(&map, W, &id, &set_id, SetUpdate::RestAfterSet(60)).unwrap();

        let set = &entry(&map, &id).sets[0];
        assert_eq!(single(set).0, Target { reps: 10, load: 0.0 });
        assert_eq!(set.rest_after_set_secs, 60);
    }

    #[test]
    fn test_update_set_reps_on_combined_rejected() {
        let (map, id) = combined_map();
        let set_id = entry(&map, &id).sets[0].id.clone();
        assert_eq!(
            update_set(&map, W, &id, &set_id, SetUpdate::Reps(5)),
            Err(Rejection::NotSimple)
        );
        assert!(update_set(&map, W, &id, &set_id, SetUpdate::RestAfterSet(45)).is_ok());
    }

    #[test]
    fn test_update_combined_side_isolated() {
        let (map, id) = combined_map();
        let set_id = entry(&map, &id).sets[0].id.clone();

        let map = update_combined_set(&map, W, &id, &set_id, PairSide::First, TargetUpdate::Load(30.0)).unwrap();
        let (first, second) = paired(&entry(&map, &id).sets[0]);
        assert_eq!(first, Target { reps: 12, load: 30.0 });
        assert_eq!(second, Target::default());

        let map = update_combined_set(&map, W, &id, &set_id, PairSide::Second, TargetUpdate::Reps(15)).unwrap();
        let (first, second) = paired(&entry(&map, &id).sets[0]);
        assert_eq!(first, Target { reps: 12, load: 30.0 });
        assert_eq!(second, Target { reps: 15, load: 0.0 });
    }

    #[test]
    fn test_update_combined_on_simple_rejected() {
        let (map, id) = simple_map();
        let set_id = entry(&map, &id).sets[0].id.clone();
        assert_eq!(
            update_combined_set(&map, W, &id, &set_id, PairSide::First, TargetUpdate::Reps(1)),
            Err(Rejection::NotCombined)
        );
    }

    #[test]
    fn test_toggle_drop_set_reseeds_from_current_load() {
        let (map, id) = simple_map();
        let set_id = entry(&map, &id).sets[0].id.clone();
        let map = update_set(&map, W, &id, &set_id, SetUpdate::Load(50.0)).unwrap();

        let on = toggle_drop_set(&map, W, &id, &set_id).unwrap();
        assert_eq!(
            single(&entry(&on, &id).sets[0]).1,
            Some(DropSet { reps: 8, reduced_load: 50.0 * 0.8 })
        );

        let off = toggle_drop_set(&on, W, &id, &set_id).unwrap();
        assert_eq!(single(&entry(&off, &id).sets[0]).1, None);

        let heavier = update_set(&off, W, &id, &set_id, SetUpdate::Load(100.0)).unwrap();
        let again = toggle_drop_set(&heavier, W, &id, &set_id).unwrap();
        assert_eq!(
            single(&entry(&again, &id).sets[0]).1,
            Some(DropSet { reps: 8, reduced_load: 100.0 * 0.8 })
        );
    }

    #[test]
    fn test_drop_set_on_combined_rejected() {
        let (map, id) = combined_map();
        let set_id = entry(&map, &id).sets[0].id.clone();
        assert_eq!(toggle_drop_set(&map, W, &id, &set_id), Err(Rejection::DropSetOnPaired));
        assert_eq!(
            update_drop_set(&map, W, &id, &set_id, DropSetUpdate::Reps(6)),
            Err(Rejection::DropSetOnPaired)
        );
    }

    #[test]
    fn test_update_drop_set_fields() {
        let (map, id) = simple_map();
        let set_id = entry(&map, &id).sets[0].id.clone();
        assert_eq!(
            update_drop_set(&map, W, &id, &set_id, DropSetUpdate::Reps(6)),
            Err(Rejection::NoDropSet)
        );

        let map = toggle_drop_set(&map, W, &id, &set_id).unwrap();
        let map = update_drop_set(&map, W, &id, &set_id, DropSetUpdate::Reps(6)).unwrap();
        let map = update_drop_set(&map, W, &id, &set_id, DropSetUpdate::ReducedLoad(15.0)).unwrap();
        assert_eq!(
            single(&entry(&map, &id).sets[0]).1,
            Some(DropSet { reps: 6, reduced_load: 15.0 })
        );
    }

    #[test]
    fn test_update_exercise_rest() {
        let (map, id) = simple_map();
        let map = update_exercise_rest(&map, W, &id, 180).unwrap();
        assert_eq!(entry(&map, &id).rest_after_exercise_secs, 180);
    }

    #[test]
    fn test_unknown_set() {
        let (map, id) = simple_map();
        assert_eq!(
            toggle_drop_set(&map, W, &id, "serie-x"),
            Err(Rejection::UnknownSet("serie-x".into()))
        );
    }

    #[test]
    fn test_pair_side_from_index() {
        assert_eq!(PairSide::from_index(0), Some(PairSide::First));
        assert_eq!(PairSide::from_index(1), Some(PairSide::Second));
        assert_eq!(PairSide::from_index(2), None);
    }

    proptest! {
        /// true = add a set, false = remove the set at `index % len`
        #[test]
        fn prop_numbering_contiguous_and_never_empty(
            ops in proptest::collection::vec((any::<bool>(), 0usize..16), 0..40)
        ) {
            let (mut map, id) = simple_map();
            for (add, index) in ops {
                let next = if add {
                    add_set(&map, W, &id)
                } else {
                    let sets = &entry(&map, &id).sets;
                    let set_id = sets[index % sets.len()].id.clone();
                    remove_set(&map, W, &id, &set_id)
                };
                match next {
                    Ok(next) => map = next,
                    Err(rejection) => prop_assert_eq!(rejection, Rejection::LastSet),
                }
                let e = entry(&map, &id);
                prop_assert!(!e.sets.is_empty());
                let expected: Vec<u32> = (1..=e.sets.len() as u32).collect();
                prop_assert_eq!(numbers(e), expected);
            }
        }
    }
}
