//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::{Priority, Status};

/// Header bars and the active stat card.
pub const BRAND: Color = Color::Rgb(37, 99, 235);
/// Awaiting clarity.
pub const AMBER: Color = Color::Rgb(245, 158, 11);
/// Finished and early deliveries.
pub const EMERALD: Color = Color::Rgb(16, 185, 129);
/// Late deliveries and urgent priority.
pub const ROSE: Color = Color::Rgb(225, 29, 72);
/// Confirmation dialogs.
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);

pub fn status_color(status: Status) -> Color {
    match status {
        Status::NotStarted => Color::Gray,
        Status::InProgress => BRAND,
        Status::AwaitingClarity => AMBER,
        Status::Finished => EMERALD,
    }
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::DarkGray,
        Priority::Medium => Color::White,
        Priority::High => AMBER,
        Priority::Urgent => ROSE,
    }
}
