//! rotina - routine builder for personal trainers
//!
//! Configure a routine, split it into workouts, pick exercises and edit
//! their sets, then submit everything to the Supabase backend.

pub mod catalog;
pub mod picker;
pub mod routine;
pub mod storage;
pub mod supabase;
pub mod tui;
pub mod wizard;

pub use wizard::Wizard;
