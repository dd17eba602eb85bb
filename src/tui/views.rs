//! Rendering for the workspace, insights and archive screens.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::db::{format_deadline_relative, format_estimate, format_hours};
use crate::fields::StatusFilter;
use crate::task::WorkItem;
use crate::tui::app::App;
use crate::tui::colors::{priority_color, status_color, AMBER, BRAND, DARK_RED, EMERALD, ROSE};
use crate::tui::enums::{AppState, RowRef, View};

/// A rectangle of `percent_x` by `percent_y` centred in `r`.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn header_row(cells: &[&'static str]) -> Row<'static> {
    Row::new(cells.iter().map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD))))
        .style(Style::default().bg(BRAND).fg(Color::White))
        .height(1)
}

fn logged(item: &WorkItem) -> String {
    format!("{}h{:02}", item.duration_hours, item.duration_minutes)
}

/// A bordered box with a small title and one large figure.
fn metric_card<'a>(title: &'a str, value: String, highlight: bool) -> Paragraph<'a> {
    let style = if highlight {
        Style::default().bg(BRAND).fg(Color::White)
    } else {
        Style::default()
    };
    Paragraph::new(Line::from(Span::styled(value, Style::default().add_modifier(Modifier::BOLD))))
        .block(Block::default().borders(Borders::ALL).title(title))
        .alignment(Alignment::Center)
        .style(style)
}

impl App<'_> {
    fn render_tabs(&self, f: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled("TASKFIRST", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("   "),
        ];
        for (n, view) in View::ALL.iter().enumerate() {
            let style = if *view == self.view {
                Style::default().fg(Color::White).bg(BRAND).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(format!(" {} {} ", n + 1, view.title()), style));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            format!("  signed in as {}", self.user_name(&self.actor)),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        ));
        let tabs = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
        f.render_widget(tabs, area);
    }

    fn render_workspace(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 5); 5])
            .split(chunks[0]);
        let counts = self.dashboard.stat_cards;
        for (i, card) in StatusFilter::CARDS.into_iter().enumerate() {
            let title = format!("F{} {}", i + 1, card.label());
            let widget = metric_card(&title, counts.for_card(card).to_string(), self.filter == Some(card));
            f.render_widget(widget, cards[i]);
        }

        let rows: Vec<Row> = self
            .rows
            .iter()
            .filter_map(|&row| self.item_at(row).map(|item| (row, item)))
            .map(|(row, item)| {
                let (number, title) = match row {
                    RowRef::Task(i) => {
                        let task = &self.tasks[i];
                        let (done, total) = task.subtask_progress();
                        let marker = if total == 0 {
                            " "
                        } else if self.expanded.contains(task.id()) {
                            "▾"
                        } else {
                            "▸"
                        };
                        let progress = if total > 0 { format!(" [{done}/{total}]") } else { String::new() };
                        (self.task_number(i).to_string(), format!("{marker} {}{progress}", item.title))
                    }
                    RowRef::Sub(i, j) => (format!("{}.{}", self.task_number(i), j + 1), format!("   └ {}", item.title)),
                };
                let style = if item.is_finished() {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(number),
                    Cell::from(item.id.clone()),
                    Cell::from(title),
                    Cell::from(item.status.label()).style(Style::default().fg(status_color(item.status))),
                    Cell::from(item.priority.label()).style(Style::default().fg(priority_color(item.priority))),
                    Cell::from(format_deadline_relative(item.deadline, self.today)),
                    Cell::from(self.user_name(&item.assignee_id).to_string()),
                    Cell::from(item.team.clone()),
                    Cell::from(format_estimate(item.estimate())),
                    Cell::from(logged(item)),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(5),  // #
            Constraint::Length(4),  // ID
            Constraint::Min(28),    // Title
            Constraint::Length(16), // Status
            Constraint::Length(7),  // Priority
            Constraint::Length(9),  // Deadline
            Constraint::Length(13), // Assignee
            Constraint::Length(10), // Team
            Constraint::Length(6),  // Est
            Constraint::Length(6),  // Logged
        ];
        let title = match self.filter {
            Some(card) => format!("Tasks ({}/{}) - {}", self.rows.len(), self.tasks.len(), card.label()),
            None => format!("Tasks ({})", self.tasks.len()),
        };
        let table = Table::new(rows, widths)
            .header(header_row(&[
                "#", "ID", "Title", "Status", "Pri", "Deadline", "Assignee", "Team", "Est", "Logged",
            ]))
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");
        f.render_stateful_widget(table, chunks[1], &mut self.table_state);
    }

    /// 1-based position of task `i` among the visible top-level rows.
    fn task_number(&self, i: usize) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r, RowRef::Task(_)))
            .position(|r| *r == RowRef::Task(i))
            .map_or(0, |p| p + 1)
    }

    fn render_insights(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let s = &self.dashboard.summary;
        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(chunks[0]);
        f.render_widget(metric_card("Completion Precision", s.precision_label(), false), cards[0]);
        f.render_widget(metric_card("Aggregate Output", format!("{}h", s.aggregate_output_hours), false), cards[1]);
        f.render_widget(metric_card("Workforce Velocity", s.velocity_label(), false), cards[2]);
        f.render_widget(metric_card("Task Load Factor", s.load_factor_label(), false), cards[3]);

        let t = &self.dashboard.completion_timing;
        let timing = Paragraph::new(Line::from(vec![
            Span::styled(format!("Early {}", t.early), Style::default().fg(EMERALD)),
            Span::raw("   "),
            Span::styled(format!("On Time {}", t.on_time), Style::default().fg(BRAND)),
            Span::raw("   "),
            Span::styled(format!("Late {}", t.late), Style::default().fg(ROSE)),
        ]))
        .block(Block::default().borders(Borders::ALL).title(format!("Delivery Timing ({} finished)", t.total())))
        .alignment(Alignment::Center);
        f.render_widget(timing, chunks[1]);

        let tables = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);

        let dept_rows: Vec<Row> = self
            .dashboard
            .departments
            .iter()
            .map(|d| {
                Row::new(vec![
                    Cell::from(d.team.clone()),
                    Cell::from(d.task_count.to_string()),
                    Cell::from(format_hours(d.actual_hours)),
                    Cell::from(format_hours(d.estimated_hours)),
                ])
            })
            .collect();
        let departments = Table::new(
            dept_rows,
            [Constraint::Min(16), Constraint::Length(6), Constraint::Length(8), Constraint::Length(8)],
        )
        .header(header_row(&["Department", "Items", "Actual", "Est"]))
        .block(Block::default().borders(Borders::ALL).title("Output by Department"));
        f.render_widget(departments, tables[0]);

        let assignee_rows: Vec<Row> = self
            .dashboard
            .assignees
            .iter()
            .map(|a| {
                let eff_color = if a.efficiency_percent >= 100 { EMERALD } else { AMBER };
                Row::new(vec![
                    Cell::from(a.name.clone()),
                    Cell::from(a.completed.to_string()),
                    Cell::from(a.ongoing.to_string()),
                    Cell::from(format!("{}%", a.efficiency_percent)).style(Style::default().fg(eff_color)),
                    Cell::from(format_hours(a.total_hours)),
                ])
            })
            .collect();
        let assignees = Table::new(
            assignee_rows,
            [
                Constraint::Min(14),
                Constraint::Length(5),
                Constraint::Length(8),
                Constraint::Length(6),
                Constraint::Length(7),
            ],
        )
        .header(header_row(&["Assignee", "Done", "Ongoing", "Eff", "Hours"]))
        .block(Block::default().borders(Borders::ALL).title("Output by Assignee"));
        f.render_widget(assignees, tables[1]);
    }

    fn render_archive(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let searching = self.state == AppState::Search;
        let search_style = if searching {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let search = Paragraph::new(self.search.as_str().to_string())
            .style(search_style)
            .block(Block::default().borders(Borders::ALL).title("Search ('/' to edit)"));
        f.render_widget(search, chunks[0]);
        if searching {
            let x = chunks[0].x + 1 + self.search.cursor as u16;
            f.set_cursor_position((x.min(chunks[0].right().saturating_sub(2)), chunks[0].y + 1));
        }

        let items = self.archive_items();
        let count = items.len();
        let rows: Vec<Row> = items
            .into_iter()
            .map(|item| {
                let completed = item
                    .completed_at
                    .map(|c| c.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".into());
                Row::new(vec![
                    Cell::from(item.id.clone()),
                    Cell::from(item.title.clone()),
                    Cell::from(self.user_name(&item.assignee_id).to_string()),
                    Cell::from(completed),
                    Cell::from(logged(item)),
                    Cell::from(item.handoff_comment.clone().unwrap_or_default()),
                ])
            })
            .collect();
        let table = Table::new(
            rows,
            [
                Constraint::Length(4),
                Constraint::Min(24),
                Constraint::Length(13),
                Constraint::Length(16),
                Constraint::Length(6),
                Constraint::Min(20),
            ],
        )
        .header(header_row(&["ID", "Title", "Assignee", "Completed", "Logged", "Handoff"]))
        .block(Block::default().borders(Borders::ALL).title(format!("Finished Work ({count})")))
        .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
        .highlight_symbol(">> ");
        f.render_stateful_widget(table, chunks[1], &mut self.archive_state);
    }

    fn render_handoff(&self, f: &mut Frame, area: Rect) {
        let title = self.selected_item().map_or_else(String::new, |i| format!("{} {}", i.id, i.title));
        let area = centered_rect(60, 30, area);
        f.render_widget(Clear, area);

        let text = vec![
            Line::from(Span::styled("Hand off deliverable", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(title),
            Line::from(""),
            Line::from("Handoff note:"),
            Line::from(Span::styled(
                self.handoff_note.as_str().to_string(),
                Style::default().fg(Color::Yellow),
            )),
            Line::from(""),
            Line::from("Enter to finish, Esc to cancel"),
        ];
        let dialog = Paragraph::new(text)
            .block(Block::default().title("Handoff").borders(Borders::ALL).style(Style::default().bg(BRAND)))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(dialog, area);
    }

    fn render_confirm_delete(&self, f: &mut Frame, area: Rect) {
        let target = self.selected_item().map_or_else(String::new, |i| format!("delete {} {}", i.id, i.title));
        let area = centered_rect(50, 30, area);
        f.render_widget(Clear, area);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled("Are you sure you want to:", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(target),
            Line::from(""),
            Line::from("Subtasks are deleted with their task."),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];
        let paragraph = Paragraph::new(text)
            .block(Block::default().title("Confirm Action").borders(Borders::ALL).style(Style::default().bg(DARK_RED)))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let area = centered_rect(60, 60, area);
        f.render_widget(Clear, area);
        let lines: Vec<Line> = [
            ("Tab / 1 2 3", "switch view"),
            ("Up / Down", "move selection"),
            ("F1..F5", "toggle stat-card filter"),
            ("Enter", "expand or collapse subtasks"),
            ("s", "cycle status"),
            ("h", "hand off selected item"),
            ("d", "delete selected item"),
            ("/", "search the archive"),
            ("q / Esc", "quit"),
        ]
        .into_iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{key:<14}"), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(what),
            ])
        })
        .collect();
        let help = Paragraph::new(lines).block(Block::default().title("Keys").borders(Borders::ALL));
        f.render_widget(help, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match (self.state, self.view) {
                (AppState::Search, _) => "Search: Enter to keep, Esc to clear".to_string(),
                (_, View::Workspace) => "F1-F5 filter | Enter expand | s status | h handoff | ? help".to_string(),
                (_, View::Insights) => format!("{} work items | ? help", self.dashboard.stat_cards.total),
                (_, View::Archive) => "/ search | ? help".to_string(),
            }
        };
        let bar = Paragraph::new(text).style(Style::default().bg(BRAND).fg(Color::White));
        f.render_widget(bar, area);
    }

    /// Draw the whole screen for the current view and state.
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        self.render_tabs(f, chunks[0]);
        match self.view {
            View::Workspace => self.render_workspace(f, chunks[1]),
            View::Insights => self.render_insights(f, chunks[1]),
            View::Archive => self.render_archive(f, chunks[1]),
        }
        match self.state {
            AppState::ConfirmHandoff => self.render_handoff(f, chunks[1]),
            AppState::ConfirmDelete => self.render_confirm_delete(f, chunks[1]),
            AppState::Help => self.render_help(f, chunks[1]),
            AppState::Browse | AppState::Search => {}
        }
        self.render_status_bar(f, chunks[2]);
    }
}
