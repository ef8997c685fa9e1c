//! Draft submission - turns a validated draft into backend rows
//!
//! Insert order: routine, then per workout its row, entries and sets, then
//! the execution sessions spread round-robin over the workouts.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::Backend;
use crate::routine::validation::validate_draft;
use crate::routine::{
    Difficulty, RoutineConfig, RoutineDraft, SetEntry, SetLoad, WorkoutExerciseEntry, WorkoutPlan,
};

const BASE_WORKOUT_MINUTES: u32 = 60;
const MINUTES_PER_EXERCISE: u32 = 15;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub enum RoutineStatus {
    #[default]
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "ativa")]
    Active,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SubmitOptions {
    pub status: RoutineStatus,
    /// Only honoured for active routines
    pub student_can_execute: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReport {
    pub routine_id: String,
    pub workouts: usize,
    pub exercises: usize,
    pub sets: usize,
    pub sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct RoutineRow {
    pub nome: String,
    pub descricao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objetivo: Option<String>,
    pub aluno_id: String,
    pub personal_trainer_id: String,
    pub treinos_por_semana: u32,
    pub dificuldade: Difficulty,
    pub duracao_semanas: u32,
    pub data_inicio: String,
    pub valor_total: f64,
    pub forma_pagamento: &'static str,
    pub status: RoutineStatus,
    pub permite_execucao_aluno: bool,
    pub observacoes_pagamento: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WorkoutRow {
    pub rotina_id: String,
    pub nome: String,
    pub grupos_musculares: String,
    pub ordem: u32,
    pub tempo_estimado_minutos: u32,
    pub observacoes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExerciseRow {
    pub treino_id: String,
    pub exercicio_1: String,
    pub exercicio_2: Option<String>,
    /// Null after the last exercise of a workout
    pub intervalo_apos_exercicio: Option<u32>,
    pub ordem: u32,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SeriesRow {
    pub exercicio_id: String,
    pub numero_serie: u32,
    pub repeticoes: u32,
    pub carga: f64,
    pub repeticoes_1: Option<u32>,
    pub carga_1: Option<f64>,
    pub repeticoes_2: Option<u32>,
    pub carga_2: Option<f64>,
    pub tem_dropset: bool,
    pub carga_dropset: Option<f64>,
    /// Null after the last set of an entry
    pub intervalo_apos_serie: Option<u32>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SessionRow {
    pub rotina_id: String,
    pub treino_id: String,
    pub aluno_id: String,
    pub sessao_numero: u32,
    pub status: &'static str,
}

pub fn routine_row(
    config: &RoutineConfig,
    trainer_id: &str,
    options: SubmitOptions,
    start: NaiveDate,
) -> RoutineRow {
    let description = config.description.trim();
    RoutineRow {
        nome: config.name.trim().to_string(),
        descricao: (!description.is_empty()).then(|| description.to_string()),
        objetivo: config.goal.clone(),
        aluno_id: config.student_id.clone(),
        personal_trainer_id: trainer_id.to_string(),
        treinos_por_semana: config.trainings_per_week,
        dificuldade: config.difficulty,
        duracao_semanas: config.duration_weeks,
        data_inicio: start.format("%Y-%m-%d").to_string(),
        valor_total: 0.0,
        forma_pagamento: "pix",
        status: options.status,
        permite_execucao_aluno: options.status == RoutineStatus::Active && options.student_can_execute,
        observacoes_pagamento: None,
    }
}

pub fn workout_row(routine_id: &str, workout: &WorkoutPlan, index: usize, entries: usize) -> WorkoutRow {
    WorkoutRow {
        rotina_id: routine_id.to_string(),
        nome: workout.name.clone(),
        grupos_musculares: workout.muscle_groups.join(", "),
        ordem: index as u32 + 1,
        tempo_estimado_minutos: BASE_WORKOUT_MINUTES + MINUTES_PER_EXERCISE * entries as u32,
        observacoes: None,
    }
}

pub fn exercise_row(workout_id: &str, entry: &WorkoutExerciseEntry, index: usize, is_last: bool) -> ExerciseRow {
    ExerciseRow {
        treino_id: workout_id.to_string(),
        exercicio_1: entry.movement.primary().name.clone(),
        exercicio_2: entry.movement.secondary().map(|ex| ex.name.clone()),
        intervalo_apos_exercicio: (!is_last).then_some(entry.rest_after_exercise_secs),
        ordem: index as u32 + 1,
    }
}

fn series_row(exercise_id: &str, set: &SetEntry, is_last: bool) -> SeriesRow {
    let rest = (!is_last).then_some(set.rest_after_set_secs);
    match &set.load {
        SetLoad::Single { target, drop_set } => SeriesRow {
            exercicio_id: exercise_id.to_string(),
            numero_serie: set.number,
            repeticoes: target.reps,
            carga: target.load,
            repeticoes_1: None,
            carga_1: None,
            repeticoes_2: None,
            carga_2: None,
            tem_dropset: drop_set.is_some(),
            carga_dropset: drop_set.map(|d| d.reduced_load),
            intervalo_apos_serie: rest,
        },
        SetLoad::Paired { first, second } => SeriesRow {
            exercicio_id: exercise_id.to_string(),
            numero_serie: set.number,
            repeticoes: first.reps,
            carga: first.load,
            repeticoes_1: Some(first.reps),
            carga_1: Some(first.load),
            repeticoes_2: Some(second.reps),
            carga_2: Some(second.load),
            tem_dropset: false,
            carga_dropset: None,
            intervalo_apos_serie: rest,
        },
    }
}

pub fn series_rows(exercise_id: &str, entry: &WorkoutExerciseEntry) -> Vec<SeriesRow> {
    let last = entry.sets.len().saturating_sub(1);
    entry
        .sets
        .iter()
        .enumerate()
        .map(|(i, set)| series_row(exercise_id, set, i == last))
        .collect()
}

/// `trainings_per_week × duration_weeks` sessions, workouts assigned in turn
pub fn session_rows(routine_id: &str, workout_ids: &[String], config: &RoutineConfig) -> Vec<SessionRow> {
    if workout_ids.is_empty() {
        return Vec::new();
    }
    let total = config.trainings_per_week * config.duration_weeks;
    (1..=total)
        .map(|n| SessionRow {
            rotina_id: routine_id.to_string(),
            treino_id: workout_ids[(n as usize - 1) % workout_ids.len()].clone(),
            aluno_id: config.student_id.clone(),
            sessao_numero: n,
            status: "nao_iniciada",
        })
        .collect()
}

fn single_id(mut ids: Vec<String>, table: &str) -> Result<String> {
    match ids.pop() {
        Some(id) if ids.is_empty() => Ok(id),
        _ => bail!("expected exactly one id back from {}", table),
    }
}

/// Validate and write the whole draft. A draft with any issue is refused.
pub async fn submit_draft<B: Backend>(
    backend: &B,
    draft: &RoutineDraft,
    trainer_id: &str,
    options: SubmitOptions,
    start: NaiveDate,
) -> Result<SubmitReport> {
    let issues = validate_draft(draft);
    if !issues.is_empty() {
        for issue in &issues {
            warn!("Draft issue: {}", issue);
        }
        let lines: Vec<String> = issues.iter().map(|i| format!("- {}", i)).collect();
        bail!("routine has {} issue(s):\n{}", issues.len(), lines.join("\n"));
    }
    let Some(config) = &draft.config else {
        bail!("routine configuration not found");
    };

    info!("Creating routine {:?} for student {}", config.name, config.student_id);
    let routine_id = single_id(
        backend.insert("rotinas", &[routine_row(config, trainer_id, options, start)]).await?,
        "rotinas",
    )?;

    let mut report = SubmitReport {
        routine_id: routine_id.clone(),
        workouts: 0,
        exercises: 0,
        sets: 0,
        sessions: 0,
    };
    let mut workout_ids = Vec::with_capacity(draft.workouts.len());

    for (index, workout) in draft.workouts.iter().enumerate() {
        let entries = draft.entries(&workout.id);
        let workout_id = single_id(
            backend
                .insert("treinos", &[workout_row(&routine_id, workout, index, entries.len())])
                .await?,
            "treinos",
        )?;
        report.workouts += 1;

        for (entry_index, entry) in entries.iter().enumerate() {
            let is_last = entry_index + 1 == entries.len();
            let exercise_id = single_id(
                backend
                    .insert("exercicios_rotina", &[exercise_row(&workout_id, entry, entry_index, is_last)])
                    .await?,
                "exercicios_rotina",
            )?;
            report.exercises += 1;

            let rows = series_rows(&exercise_id, entry);
            backend.insert("series", &rows).await?;
            report.sets += rows.len();
        }

        info!("Workout {} created with {} exercise(s)", workout.name, entries.len());
        workout_ids.push(workout_id);
    }

    let sessions = session_rows(&routine_id, &workout_ids, config);
    if !sessions.is_empty() {
        backend.insert("execucoes_sessao", &sessions).await?;
    }
    report.sessions = sessions.len();

    info!(
        "Routine {} submitted: {} workouts, {} exercises, {} sets, {} sessions",
        report.routine_id, report.workouts, report.exercises, report.sets, report.sessions
    );
    Ok(report)
}
