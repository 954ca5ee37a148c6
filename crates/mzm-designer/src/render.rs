//! Frame layout and widget drawing, modeled on the teacher's `tui/render.rs`:
//! a title/content/status vertical split, board+info-panel horizontal split,
//! everything built from `Block`/`Paragraph`/`Line`/`Span` rather than custom
//! widgets.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use mzm_core::types::{Coord, Path};

use crate::app::App;
use crate::mode::Mode;

const ROW_PALETTE: [Color; 6] =
    [Color::Cyan, Color::Yellow, Color::Green, Color::Magenta, Color::Blue, Color::Red];

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let rows = Layout::vertical([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)]).split(area);

    render_title(frame, rows[0], app);

    let content = Layout::horizontal([Constraint::Min(0), Constraint::Length(32)]).split(rows[1]);

    render_grid(frame, content[0], app);
    render_info(frame, content[1], app);
    render_status(frame, rows[2], app);
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let title = format!(" MazezaM Designer — {} ", app.mode().name());
    let paragraph = Paragraph::new(title).style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(paragraph, area);
}

fn player_position(app: &App) -> Option<(Coord, Coord)> {
    match app.mode() {
        Mode::Play(m) => Some((m.history.player().x(), m.history.player().y())),
        Mode::Playback(m) => Some((m.history.player().x(), m.history.player().y())),
        _ => None,
    }
}

fn row_style(app: &App, y: Coord) -> Style {
    if app.monochrome() {
        return Style::default();
    }
    let color = ROW_PALETTE[(y.max(0) as usize) % ROW_PALETTE.len()];
    Style::default().fg(color)
}

fn render_grid(frame: &mut Frame, area: Rect, app: &App) {
    let level = app.level();
    let (height, width) = (level.height(), level.width());
    let player = player_position(app);
    let editing = matches!(app.mode(), Mode::Edit);
    let cursor = app.cursor();

    let mut lines = Vec::with_capacity(height as usize + 2);

    let wall_row = "#".repeat(width as usize + 2);
    lines.push(Line::from(wall_row.clone()));

    for y in 0..height {
        let mut spans = Vec::with_capacity(width as usize + 2);
        let entrance_here = level.start() == y;
        let exit_here = level.finish() == y;
        let player_at_entrance = entrance_here && player == Some((-1, y));
        spans.push(if player_at_entrance {
            Span::styled("@", Style::default().fg(Color::White).bg(Color::Black))
        } else {
            Span::raw(if entrance_here { "+" } else { "#" })
        });

        for x in 0..width {
            let is_player = player == Some((x, y));
            let is_cursor = editing && cursor == (y, x);
            let selected = app.selection().is_selected(y, x);
            let ch = if is_player {
                '@'
            } else if level.get_block(y, x) {
                '`'
            } else {
                ' '
            };
            let mut style = row_style(app, y);
            if selected {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            if is_cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            if is_player {
                style = Style::default().fg(Color::White).bg(Color::Black);
            }
            spans.push(Span::styled(ch.to_string(), style));
        }
        let player_at_exit = exit_here && player == Some((width, y));
        spans.push(if player_at_exit {
            Span::styled("@", Style::default().fg(Color::White).bg(Color::Black))
        } else {
            Span::raw(if exit_here { "*" } else { "#" })
        });
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(wall_row));

    let block = Block::default().borders(Borders::ALL).title(" Level ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn solved_label(path: &Option<Option<Path>>) -> String {
    match path {
        None => "...".to_string(),
        Some(None) => "no solution".to_string(),
        Some(Some(p)) => format!("{} steps", p.len()),
    }
}

fn render_info(frame: &mut Frame, area: Rect, app: &App) {
    let level = app.level();
    let live = app.live();
    let mut lines = vec![
        Line::from(format!("Size: {}x{}", level.height(), level.width())),
        Line::from(format!("Next save #: {}", app.level_number())),
        Line::from(""),
        Line::from(format!("Fewest moves: {}", solved_label(&live.moves_path))),
        Line::from(format!("Fewest pushes: {}", solved_label(&live.pushes_path))),
        Line::from(format!(
            "Rating: {}",
            live.rating.map(|r| format!("{r:.2}")).unwrap_or_else(|| "...".to_string())
        )),
        Line::from(format!("Improver radius: {}", app.improver_radius())),
    ];

    match app.mode() {
        Mode::Improver(m) => {
            lines.push(Line::from(""));
            lines.push(Line::styled("Improving...", Style::default().add_modifier(Modifier::BOLD)));
            lines.push(Line::from(format!("Best rating: {:.2}", m.best_rating)));
            if let Some(pushes) = m.best_push_count {
                lines.push(Line::from(format!("Best pushes: {pushes}")));
            }
        }
        Mode::Playback(m) => {
            lines.push(Line::from(""));
            lines.push(Line::from(format!("Step {}/{}", m.history.cursor(), m.history.path().len())));
            lines.push(Line::from(if m.playing { "Playing" } else { "Paused" }));
        }
        _ => {}
    }

    let block = Block::default().borders(Borders::ALL).title(" Info ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    if !app.status().is_empty() {
        frame.render_widget(Paragraph::new(app.status()).style(Style::default().fg(Color::Yellow)), area);
        return;
    }
    let help = match app.mode() {
        Mode::Edit => {
            "arrows move  space/b/g toggle  </> shift  [ ] { } resize  m/M/a/A select  \
             C clear  R random  s save  p play  v view  I improve  q quit"
        }
        Mode::Play(_) => "arrows move/push  backspace undo  enter redo  r reset  q/esc back",
        Mode::Playback(_) => "p play/pause  space step  b back  i/d speed  r reset  x/esc back",
        Mode::Improver(_) => "x accept best  a/esc abandon",
    };
    frame.render_widget(Paragraph::new(help), area);
}
