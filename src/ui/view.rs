// Rendering - pure function of AppState, no side effects

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::grid::{MediaButton, Pane, PaneKind, Position};
use crate::app::items::{format_duration, Item};
use crate::app::AppState;

const HELP: &str = "hjkl move | enter focus/select | esc back | p play/pause | n/b skip | +/- volume | a queue | s save | d default | r refresh | q quit";

pub fn render(f: &mut Frame, state: &AppState) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(outer[0]);

    render_grid(f, columns[0], state);
    render_sidebar(f, columns[1], state);

    let help = Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, outer[1]);
}

fn render_grid(f: &mut Frame, area: Rect, state: &AppState) {
    let rows = state.grid.rows();
    let constraints: Vec<Constraint> = rows
        .iter()
        .map(|row| match row.first().map(|p| p.id.kind()) {
            Some(PaneKind::ReadOnly) => Constraint::Length(6),
            Some(PaneKind::Media) => Constraint::Length(3),
            _ => Constraint::Min(5),
        })
        .collect();
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (r, (row, row_area)) in rows.iter().zip(row_areas.iter()).enumerate() {
        if row.is_empty() {
            continue;
        }
        let pane_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, row.len() as u32); row.len()])
            .split(*row_area);

        for (c, (pane, pane_area)) in row.iter().zip(pane_areas.iter()).enumerate() {
            let under_cursor = state.grid.cursor() == Position::new(r, c);
            let block = pane_block(pane, under_cursor, state.grid.is_focused());
            match pane.id.kind() {
                PaneKind::ReadOnly => render_now_playing(f, *pane_area, block, state),
                PaneKind::Media => render_controls(f, *pane_area, block, pane, under_cursor),
                PaneKind::List => render_list(f, *pane_area, block, pane, under_cursor),
            }
        }
    }
}

fn pane_block(pane: &Pane, under_cursor: bool, focused: bool) -> Block<'static> {
    let style = match (under_cursor, focused) {
        (true, true) => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        (true, false) => Style::default().fg(Color::Yellow),
        _ => Style::default(),
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(pane.id.title())
}

fn render_list(f: &mut Frame, area: Rect, block: Block, pane: &Pane, under_cursor: bool) {
    let items: Vec<ListItem> = pane.items.iter().map(|i| ListItem::new(i.label())).collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    if under_cursor && !pane.items.is_empty() {
        list_state.select(Some(pane.selected));
    }
    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_controls(f: &mut Frame, area: Rect, block: Block, pane: &Pane, under_cursor: bool) {
    let mut spans = Vec::with_capacity(MediaButton::ALL.len() * 2);
    for (i, button) in MediaButton::ALL.iter().enumerate() {
        let style = if under_cursor && i == pane.selected {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!(" {} ", button.label()), style));
        spans.push(Span::raw("  "));
    }
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_now_playing(f: &mut Frame, area: Rect, block: Block, state: &AppState) {
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    let Some(snapshot) = &state.currently_playing else {
        f.render_widget(Paragraph::new("Nothing playing"), chunks[0]);
        return;
    };

    let status = if snapshot.is_playing { "playing" } else { "paused" };
    let title = match &snapshot.item {
        Some(item) => Item::from(item.clone()).label(),
        None => "-".to_string(),
    };
    let device = state
        .active_device
        .as_ref()
        .map(|d| match d.volume_percent {
            Some(v) => format!("{} ({v}%)", d.name),
            None => d.name.clone(),
        })
        .unwrap_or_else(|| "no active device".into());

    let lines = vec![
        Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(format!("{status} on {device}")),
    ];
    f.render_widget(Paragraph::new(lines), chunks[0]);

    let duration = snapshot.item.as_ref().map(|i| i.duration_ms()).unwrap_or(0);
    let progress = snapshot.progress_ms.unwrap_or(0).min(duration);
    let ratio = if duration == 0 { 0.0 } else { progress as f64 / duration as f64 };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio)
        .label(format!("{} / {}", format_duration(progress), format_duration(duration)));
    f.render_widget(gauge, chunks[1]);
}

fn render_sidebar(f: &mut Frame, area: Rect, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    render_info(f, chunks[0], state);
    render_log(f, chunks[1], "Messages", state.messages.iter(), Style::default());
    render_log(f, chunks[2], "Errors", state.errors.iter(), Style::default().fg(Color::Red));
}

fn render_info(f: &mut Frame, area: Rect, state: &AppState) {
    let mut lines: Vec<Line> = Vec::new();
    match &state.info {
        Some(item) => {
            for (key, value) in item.details() {
                lines.push(Line::from(vec![
                    Span::styled(format!("{key}: "), Style::default().fg(Color::Cyan)),
                    Span::raw(value),
                ]));
            }
            if let Item::Artist(artist) = item {
                if let Some(tracks) = state.artist_tracks.get(&artist.id) {
                    lines.push(Line::from(""));
                    lines.push(Line::from(Span::styled(
                        "top tracks",
                        Style::default().add_modifier(Modifier::BOLD),
                    )));
                    for track in tracks {
                        lines.push(Line::from(format!("  {}", track.name)));
                    }
                }
            }
        }
        None => lines.push(Line::from("Select something to see its details")),
    }

    if let Some(playlist) = &state.default_playlist {
        lines.push(Line::from(""));
        lines.push(Line::from(format!("default playlist: {}", playlist.name)));
    }

    let title = match &state.profile {
        Some(user) => format!("Info - {}", user.display_name.as_deref().unwrap_or(&user.id)),
        None => "Info".to_string(),
    };
    let info = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(info, area);
}

fn render_log<'a>(
    f: &mut Frame,
    area: Rect,
    title: &'static str,
    entries: impl DoubleEndedIterator<Item = &'a String>,
    style: Style,
) {
    // newest first
    let items: Vec<ListItem> = entries.rev().map(|e| ListItem::new(e.as_str()).style(style)).collect();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::fixtures;
    use crate::app::{Message, PaneId};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(160, 48)).unwrap();
        terminal.draw(|f| render(f, state)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_every_pane_has_a_title() {
        let state = fixtures::state();
        let text = screen(&state);
        for id in [
            PaneId::NowPlaying,
            PaneId::Artists,
            PaneId::Tracks,
            PaneId::Playlists,
            PaneId::Devices,
            PaneId::Queue,
            PaneId::Recent,
            PaneId::Controls,
        ] {
            assert!(text.contains(id.title()), "missing {}", id.title());
        }
        assert!(text.contains("Nothing playing"));
    }

    #[test]
    fn test_loaded_rows_and_errors_show_up() {
        let mut state = fixtures::state();
        crate::app::update(&mut state, Message::TopTracksLoaded(vec![fixtures::track("1")]));
        crate::app::update(&mut state, Message::CurrentlyPlayingLoaded(Some(fixtures::playing(true))));
        crate::app::update(&mut state, Message::AppErr("status: 500".into()));

        let text = screen(&state);
        assert!(text.contains("track 1 - band"));
        assert!(text.contains("track now"));
        assert!(text.contains("status: 500"));
    }
}
