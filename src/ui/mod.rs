mod app;
mod panels;
mod services;
mod state;
mod widgets;

pub use app::PhishstackApp;
pub use services::{AnalysisResult, AnalysisRunner, ProgressUpdate};
pub use state::{AppState, HistoryEntry};
