//! rotina - routine builder for personal trainers

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};

use rotina::catalog::find_by_id;
use rotina::picker::{SelectionMode, SourceFilter, Toggle};
use rotina::routine::editor::{DropSetUpdate, PairSide, SetUpdate, TargetUpdate};
use rotina::routine::{Difficulty, RoutineConfig};
use rotina::storage::SqliteStore;
use rotina::supabase::submit::{RoutineStatus, SubmitOptions, submit_draft};
use rotina::supabase::{SupabaseClient, SupabaseConfig};
use rotina::tui::ReviewApp;
use rotina::Wizard;

const SESSION_PATH: &str = "rotina-session.db";

#[derive(Parser)]
#[command(name = "rotina")]
#[command(author, version, about = "Routine builder for personal trainers")]
struct Cli {
    /// Session file holding the draft between runs
    #[arg(long, env = "ROTINA_SESSION", default_value = SESSION_PATH, global = true)]
    session: String,

    #[command(flatten)]
    supabase: SupabaseArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct SupabaseArgs {
    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL", global = true)]
    supabase_url: Option<String>,

    /// Supabase anon key
    #[arg(long, env = "SUPABASE_ANON_KEY", global = true, hide_env_values = true)]
    anon_key: Option<String>,

    /// Signed-in trainer's access token
    #[arg(long, env = "SUPABASE_ACCESS_TOKEN", global = true, hide_env_values = true)]
    access_token: Option<String>,
}

impl SupabaseArgs {
    fn client(&self) -> Result<SupabaseClient> {
        let (Some(url), Some(anon_key)) = (&self.supabase_url, &self.anon_key) else {
            bail!("SUPABASE_URL and SUPABASE_ANON_KEY must be set");
        };
        SupabaseClient::new(SupabaseConfig {
            url: url.clone(),
            anon_key: anon_key.clone(),
            access_token: self.access_token.clone(),
        })
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DifficultyArg {
    Low,
    Medium,
    High,
}

impl From<DifficultyArg> for Difficulty {
    fn from(d: DifficultyArg) -> Self {
        match d {
            DifficultyArg::Low => Difficulty::Low,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::High => Difficulty::High,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    All,
    Standard,
    Custom,
}

impl From<SourceArg> for SourceFilter {
    fn from(s: SourceArg) -> Self {
        match s {
            SourceArg::All => SourceFilter::All,
            SourceArg::Standard => SourceFilter::Standard,
            SourceArg::Custom => SourceFilter::Custom,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Set the routine configuration
    Configure {
        /// Routine name (at least 3 characters)
        name: String,

        /// Student the routine is for
        #[arg(short, long)]
        student: String,

        /// Trainings per week (1-6)
        #[arg(short = 'w', long, default_value = "3")]
        per_week: u32,

        /// Duration in weeks (1-52)
        #[arg(short, long, default_value = "4")]
        duration: u32,

        #[arg(long, value_enum, default_value = "medium")]
        difficulty: DifficultyArg,

        #[arg(long)]
        goal: Option<String>,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Create or list the workouts
    Workouts,

    /// Toggle a muscle group on a workout (drops its exercises)
    Group {
        workout: String,
        group: String,
    },

    /// Remove every muscle group of a workout (drops its exercises)
    ClearGroups {
        workout: String,
    },

    /// Search the catalog for a workout
    Search {
        workout: String,

        #[arg(short, long)]
        query: Option<String>,

        /// Only this muscle group of the workout
        #[arg(short, long)]
        group: Option<String>,

        #[arg(long, value_enum, default_value = "all")]
        source: SourceArg,
    },

    /// Add one exercise, or two as a combined entry
    Add {
        workout: String,

        /// Catalog ids (two with --combined)
        #[arg(required = true, num_args = 1..=2)]
        exercises: Vec<String>,

        #[arg(short, long)]
        combined: bool,
    },

    /// Remove an exercise entry
    RemoveExercise {
        workout: String,
        entry: String,
    },

    /// Append a set to an entry
    AddSet {
        workout: String,
        entry: String,
    },

    /// Remove a set from an entry
    RemoveSet {
        workout: String,
        entry: String,
        set: String,
    },

    /// Update reps, load or rest of a simple set
    UpdateSet {
        workout: String,
        entry: String,
        set: String,

        #[arg(short, long)]
        reps: Option<u32>,

        #[arg(short, long)]
        load: Option<f64>,

        /// Rest after this set, seconds
        #[arg(long)]
        rest: Option<u32>,
    },

    /// Update one side of a combined set
    UpdatePair {
        workout: String,
        entry: String,
        set: String,

        /// 1 or 2
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=2))]
        side: u8,

        #[arg(short, long)]
        reps: Option<u32>,

        #[arg(short, long)]
        load: Option<f64>,

        /// Rest after this set, seconds
        #[arg(long)]
        rest: Option<u32>,
    },

    /// Enable or disable the drop-set of a simple set
    ToggleDrop {
        workout: String,
        entry: String,
        set: String,
    },

    /// Update the drop-set of a simple set
    UpdateDrop {
        workout: String,
        entry: String,
        set: String,

        #[arg(short, long)]
        reps: Option<u32>,

        #[arg(short, long)]
        load: Option<f64>,
    },

    /// Rest after an exercise entry, seconds
    Rest {
        workout: String,
        entry: String,
        secs: u32,
    },

    /// Print the draft with all ids
    Show,

    /// Open the review screen
    Review,

    /// Submit the routine and clear the session
    Submit {
        /// Create the routine as active instead of pending
        #[arg(long)]
        active: bool,

        /// Let the student run sessions (active routines only)
        #[arg(long)]
        student_can_execute: bool,
    },

    /// Discard the draft
    Exit,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let store = SqliteStore::open(&cli.session)
        .with_context(|| format!("failed to open session {}", cli.session))?;
    let mut wizard = Wizard::open(store);

    match cli.command {
        Some(Commands::Configure { name, student, per_week, duration, difficulty, goal, description }) => {
            wizard.configure(RoutineConfig {
                name,
                description,
                goal,
                trainings_per_week: per_week,
                difficulty: difficulty.into(),
                duration_weeks: duration,
                student_id: student,
            })?;
            println!("Routine configured");
        }

        Some(Commands::Workouts) => {
            for w in wizard.prepare_workouts()? {
                println!("{} | {:10} | {}", w.id, w.name, w.muscle_groups.join(", "));
            }
        }

        Some(Commands::Group { workout, group }) => {
            wizard.toggle_muscle_group(&workout, &group)?;
            print_groups(&wizard, &workout);
        }

        Some(Commands::ClearGroups { workout }) => {
            wizard.clear_muscle_groups(&workout)?;
            print_groups(&wizard, &workout);
        }

        Some(Commands::Search { workout, query, group, source }) => {
            let client = cli.supabase.client()?;
            let mut picker = wizard.open_picker(&workout)?;
            picker.set_source(source.into());
            picker.set_muscle_group(group);
            picker.set_search(query.as_deref().unwrap_or_default());

            let trainer = match source {
                SourceArg::Custom => Some(client.current_user().await?.id),
                _ => None,
            };
            let ticket = picker.begin_fetch();
            let rows = match picker.query(trainer.as_deref()) {
                Some(q) => client.list_exercises(&q).await?,
                None => Vec::new(),
            };
            picker.apply_fetch(ticket, rows);

            let visible = picker.visible();
            println!("{} exercise(s)", visible.len());
            println!("{:-<60}", "");
            for ex in visible {
                println!(
                    "{} | {:30} | {:12} | {}",
                    ex.id, ex.name, ex.muscle_group, ex.equipment
                );
            }
        }

        Some(Commands::Add { workout, exercises, combined }) => {
            let mode = if combined { SelectionMode::Combined } else { SelectionMode::Simple };
            if exercises.len() != mode.required() {
                bail!("expected {} exercise id(s), got {}", mode.required(), exercises.len());
            }

            let client = cli.supabase.client()?;
            let mut picker = wizard.open_picker(&workout)?;
            picker.selection_mut().set_mode(mode);
            let ticket = picker.begin_fetch();
            let rows = match picker.query(None) {
                Some(q) => client.list_exercises(&q).await?,
                None => Vec::new(),
            };
            picker.apply_fetch(ticket, rows);

            for id in &exercises {
                let Some(row) = find_by_id(picker.available(), id).cloned() else {
                    bail!("exercise {} is not available for {}", id, workout);
                };
                if picker.selection_mut().toggle(&row) == Toggle::Rejected {
                    bail!("combined entries take two exercises");
                }
            }

            match wizard.add_from_picker(&picker)? {
                Some(entry_id) => println!("Added entry {}", entry_id),
                None => bail!("select {} distinct exercise(s)", mode.required()),
            }
        }

        Some(Commands::RemoveExercise { workout, entry }) => {
            wizard.remove_exercise(&workout, &entry)?;
            println!("Removed entry {}", entry);
        }

        Some(Commands::AddSet { workout, entry }) => {
            wizard.add_set(&workout, &entry)?;
            println!("Set added");
        }

        Some(Commands::RemoveSet { workout, entry, set }) => {
            wizard.remove_set(&workout, &entry, &set)?;
            println!("Set removed");
        }

        Some(Commands::UpdateSet { workout, entry, set, reps, load, rest }) => {
            let updates = reps
                .map(SetUpdate::Reps)
                .into_iter()
                .chain(load.map(SetUpdate::Load))
                .chain(rest.map(SetUpdate::RestAfterSet));
            for update in updates {
                wizard.update_set(&workout, &entry, &set, update)?;
            }
        }

        Some(Commands::UpdatePair { workout, entry, set, side, reps, load, rest }) => {
            let side = PairSide::from_index(usize::from(side) - 1).context("side must be 1 or 2")?;
            let updates = reps.map(TargetUpdate::Reps).into_iter().chain(load.map(TargetUpdate::Load));
            for update in updates {
                wizard.update_combined_set(&workout, &entry, &set, side, update)?;
            }
            if let Some(secs) = rest {
                wizard.update_set(&workout, &entry, &set, SetUpdate::RestAfterSet(secs))?;
            }
        }

        Some(Commands::ToggleDrop { workout, entry, set }) => {
            wizard.toggle_drop_set(&workout, &entry, &set)?;
        }

        Some(Commands::UpdateDrop { workout, entry, set, reps, load }) => {
            let updates = reps
                .map(DropSetUpdate::Reps)
                .into_iter()
                .chain(load.map(DropSetUpdate::ReducedLoad));
            for update in updates {
                wizard.update_drop_set(&workout, &entry, &set, update)?;
            }
        }

        Some(Commands::Rest { workout, entry, secs }) => {
            wizard.update_exercise_rest(&workout, &entry, secs)?;
        }

        Some(Commands::Show) => print_draft(&wizard),

        Some(Commands::Submit { active, student_can_execute }) => {
            let client = cli.supabase.client()?;
            let trainer = client.current_user().await?;
            let options = SubmitOptions {
                status: if active { RoutineStatus::Active } else { RoutineStatus::Pending },
                student_can_execute,
            };
            let report = submit_draft(
                &client,
                wizard.draft(),
                &trainer.id,
                options,
                Local::now().date_naive(),
            )
            .await?;
            wizard.finish()?;
            println!(
                "Routine {} created: {} workouts, {} exercises, {} sets, {} sessions",
                report.routine_id, report.workouts, report.exercises, report.sets, report.sessions
            );
        }

        Some(Commands::Exit) => {
            wizard.exit()?;
            println!("Draft discarded");
        }

        Some(Commands::Review) | None => {
            let issues = wizard.issues();
            let mut app = ReviewApp::new(wizard.draft().clone(), issues);
            app.run()?;
        }
    }

    Ok(())
}

fn print_groups(wizard: &Wizard<SqliteStore>, workout_id: &str) {
    if let Some(w) = wizard.draft().workout(workout_id) {
        println!("{}: {}", w.name, w.muscle_groups.join(", "));
    }
}

fn print_draft(wizard: &Wizard<SqliteStore>) {
    let draft = wizard.draft();
    match &draft.config {
        Some(c) => println!(
            "{} | student {} | {}x/week | {} weeks | {}",
            c.name, c.student_id, c.trainings_per_week, c.duration_weeks, c.difficulty.label()
        ),
        None => println!("Routine not configured"),
    }

    for w in &draft.workouts {
        println!("{:-<60}", "");
        println!("{} ({}) - {}", w.name, w.id, w.muscle_groups.join(", "));
        for entry in draft.entries(&w.id) {
            let summary = entry.summary();
            println!(
                "  {} | {} | {} | {} set(s), {} drop, mean {:.1}kg, rest {}s",
                entry.id,
                entry.name(),
                entry.group_label(),
                summary.total_sets,
                summary.drop_sets,
                summary.mean_load,
                entry.rest_after_exercise_secs
            );
            for set in &entry.sets {
                println!("    {} #{} {:?} rest {}s", set.id, set.number, set.load, set.rest_after_set_secs);
            }
        }
    }

    let issues = wizard.issues();
    if !issues.is_empty() {
        println!("{:-<60}", "");
        for issue in issues {
            println!("! {}", issue);
        }
    }
}
