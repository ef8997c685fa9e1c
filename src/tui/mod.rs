//! TUI module - routine review screen with ratatui

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table},
};
use std::io::{stdout, Stdout};

use crate::routine::validation::DraftIssue;
use crate::routine::{RoutineDraft, SetLoad, WorkoutExerciseEntry};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Review state: the draft plus the highlighted workout
pub struct ReviewApp {
    draft: RoutineDraft,
    issues: Vec<DraftIssue>,
    selected: usize,
    should_quit: bool,
}

impl ReviewApp {
    pub fn new(draft: RoutineDraft, issues: Vec<DraftIssue>) -> Self {
        Self {
            draft,
            issues,
            selected: 0,
            should_quit: false,
        }
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }

        restore_terminal()?;
        Ok(())
    }

    fn title(&self) -> String {
        match &self.draft.config {
            Some(c) => format!(
                "{} - {}x/week, {} weeks, {}",
                c.name,
                c.trainings_per_week,
                c.duration_weeks,
                c.difficulty.label()
            ),
            None => "Routine not configured".to_string(),
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(self.issues.len().clamp(1, 6) as u16 + 2),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let header = Paragraph::new(self.title())
            .style(Style::default().fg(Color::Cyan).bold())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(28), Constraint::Min(40)])
            .split(chunks[1]);

        // Workout list
        let items: Vec<ListItem> = self.draft.workouts.iter().map(|w| {
            let count = self.draft.entries(&w.id).len();
            ListItem::new(format!("{} ({})", w.name, count))
        }).collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Workouts"))
            .highlight_style(Style::default().fg(Color::Yellow).bold())
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if !self.draft.workouts.is_empty() {
            state.select(Some(self.selected));
        }
        frame.render_stateful_widget(list, body[0], &mut state);

        // Entries of the selected workout
        let (title, entries) = match self.draft.workouts.get(self.selected) {
            Some(w) => (
                format!("{} - {}", w.name, w.muscle_groups.join(", ")),
                self.draft.entries(&w.id),
            ),
            None => ("No workouts".to_string(), &[][..]),
        };
        let rows: Vec<Row> = entry_rows(entries)
            .into_iter()
            .map(|cells| Row::new(cells.into_iter().map(Cell::from)))
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Min(24),
                Constraint::Length(22),
                Constraint::Length(28),
                Constraint::Length(10),
            ],
        )
        .header(Row::new(vec!["Exercise", "Group", "Sets", "Rest"])
            .style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(table, body[1]);

        // Issues
        let issues = if self.issues.is_empty() {
            Paragraph::new("Ready to submit").style(Style::default().fg(Color::Green))
        } else {
            let lines: Vec<Line> = self.issues.iter().map(|i| Line::from(i.to_string())).collect();
            Paragraph::new(lines).style(Style::default().fg(Color::Red))
        };
        frame.render_widget(
            issues.block(Block::default().borders(Borders::ALL).title("Issues")),
            chunks[2],
        );

        // Footer
        let footer = Paragraph::new("q: quit | j/k: workout")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[3]);
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press {
                    let last = self.draft.workouts.len().saturating_sub(1);
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                        KeyCode::Char('j') | KeyCode::Down => {
                            self.selected = (self.selected + 1).min(last);
                        }
                        KeyCode::Char('k') | KeyCode::Up => {
                            self.selected = self.selected.saturating_sub(1);
                        }
                        _ => {}
                    }
                }
        Ok(())
    }
}

/// One line of text per set: `12x40kg (drop 8x32kg)` or `12x20 / 10x15`
fn set_text(load: &SetLoad) -> String {
    match load {
        SetLoad::Single { target, drop_set } => {
            let main = format!("{}x{}kg", target.reps, target.load);
            match drop_set {
                Some(d) => format!("{} (drop {}x{}kg)", main, d.reps, d.reduced_load),
                None => main,
            }
        }
        SetLoad::Paired { first, second } => {
            format!("{}x{} / {}x{}", first.reps, first.load, second.reps, second.load)
        }
    }
}

/// Table cells for a workout's entries
fn entry_rows(entries: &[WorkoutExerciseEntry]) -> Vec<[String; 4]> {
    entries
        .iter()
        .map(|entry| {
            let sets: Vec<String> = entry.sets.iter().map(|s| set_text(&s.load)).collect();
            [
                entry.name(),
                entry.group_label(),
                sets.join(", "),
                format!("{}s", entry.rest_after_exercise_secs),
            ]
        })
        .collect()
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
