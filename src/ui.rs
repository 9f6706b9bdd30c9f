//! Layout and drawing: title menu, board, sidebar, pause, game over, quit menu.

use crate::app::{MenuState, MenuTab, QuitOption, Screen};
use crate::board::BoardState;
use crate::bubble::Bubble;
use crate::game::GameSession;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each bubble takes two terminal columns so the board looks square-ish.
pub const CELL_WIDTH: u16 = 2;
pub const CELL_HEIGHT: u16 = 1;

const SIDEBAR_WIDTH: u16 = 24;

/// Smallest board the title screen reports as comfortable.
pub const MIN_BOARD_WIDTH: u16 = 10;
pub const MIN_BOARD_HEIGHT: u16 = 8;

/// Duration of the pop fade (TachyonFX).
const POP_FADE_MS: u32 = 350;

const BUBBLE: &str = "●";
const BUBBLE_SELECTED: &str = "◉";
const BUBBLE_BURST: &str = "✺";

/// Board size in terminal cells including the border.
fn board_outer_size(width: u16, height: u16) -> (u16, u16) {
    (width * CELL_WIDTH + 2, height * CELL_HEIGHT + 2)
}

/// Largest board (in bubbles) that fits the terminal next to the sidebar.
pub fn max_board_cells_for_terminal(term_cols: u16, term_rows: u16) -> (u16, u16) {
    let max_w = term_cols.saturating_sub(2).saturating_sub(SIDEBAR_WIDTH) / CELL_WIDTH;
    let max_h = term_rows.saturating_sub(2) / CELL_HEIGHT;
    (max_w, max_h)
}

/// Requested board size clamped to the terminal, never below 1x1.
pub fn board_size_for_terminal_clamped(
    term_cols: u16,
    term_rows: u16,
    requested_w: u16,
    requested_h: u16,
) -> (u16, u16) {
    let (max_w, max_h) = max_board_cells_for_terminal(term_cols, term_rows);
    (requested_w.min(max_w).max(1), requested_h.min(max_h).max(1))
}

/// Color for board size indicator: red = cramped, yellow = okay, green = good.
pub fn board_size_indicator_color(w: u16, h: u16) -> Color {
    let min_cells = MIN_BOARD_WIDTH as u32 * MIN_BOARD_HEIGHT as u32;
    let cells = w as u32 * h as u32;
    if cells <= min_cells {
        Color::Red
    } else if cells <= min_cells * 2 {
        Color::Yellow
    } else {
        Color::Green
    }
}

/// Board (with border) and sidebar rects, centred in `area`.
fn game_layout(area: Rect, board_w: u16, board_h: u16) -> (Rect, Rect) {
    let (pw, ph) = board_outer_size(board_w, board_h);
    let total_w = pw + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(ph) / 2;
    let board = Rect {
        x,
        y,
        width: pw.min(area.width),
        height: ph.min(area.height),
    }
    .intersection(area);
    let sidebar = Rect {
        x: x + pw,
        y,
        width: SIDEBAR_WIDTH,
        height: ph.max(20),
    }
    .intersection(area);
    (board, sidebar)
}

/// Inner board rect (no border); matches `draw_game`.
fn board_inner_rect(area: Rect, board_w: u16, board_h: u16) -> Rect {
    let (outer, _) = game_layout(area, board_w, board_h);
    Rect {
        x: outer.x + 1,
        y: outer.y + 1,
        width: (board_w * CELL_WIDTH).min(outer.width.saturating_sub(2)),
        height: (board_h * CELL_HEIGHT).min(outer.height.saturating_sub(2)),
    }
}

/// Board cell under a terminal position. May be out of range; the board ignores those.
pub fn cell_at(area: Rect, board_w: u16, board_h: u16, x: u16, y: u16) -> (i32, i32) {
    let inner = board_inner_rect(area, board_w, board_h);
    let dx = x as i32 - inner.x as i32;
    let dy = y as i32 - inner.y as i32;
    (dx.div_euclid(CELL_WIDTH as i32), dy.div_euclid(CELL_HEIGHT as i32))
}

/// Write one bubble cell (glyph + padding) if it lies inside `clip`.
fn put_cell(buf: &mut Buffer, clip: Rect, (x, y): (u16, u16), symbol: &str, style: Style) {
    if clip.contains(Position::new(x, y)) {
        buf[(x, y)].set_symbol(symbol).set_style(style);
    }
    if clip.contains(Position::new(x + 1, y)) {
        buf[(x + 1, y)].set_symbol(" ").set_style(style);
    }
}

/// Everything `draw` needs besides the frame.
pub struct View<'a> {
    pub screen: Screen,
    pub session: &'a GameSession,
    pub theme: &'a Theme,
    pub paused: bool,
    pub cursor: Option<(usize, usize)>,
    pub best_score: u32,
    pub new_best: bool,
    pub popped: &'a [Bubble],
    pub menu_state: &'a MenuState,
    pub menu_board_size: (u16, u16),
    pub quit_selected: QuitOption,
    pub now: Instant,
}

/// Draw current screen. While `popped` is non-empty the pop fade effect runs over those cells
/// and `pop_effect` / `pop_effect_time` are updated.
pub fn draw(
    frame: &mut Frame,
    view: &View,
    pop_effect: &mut Option<Effect>,
    pop_effect_time: &mut Option<Instant>,
) {
    let area = frame.area();
    frame.buffer_mut().set_style(area, Style::default().bg(view.theme.bg));
    match view.screen {
        Screen::Menu => draw_menu(frame, view, area),
        Screen::Playing => {
            draw_game(frame, view, area);
            if !view.popped.is_empty() {
                apply_pop_effect(frame, view, area, pop_effect, pop_effect_time);
            }
            if view.paused {
                draw_pause_overlay(frame, view.theme, area);
            }
        }
        Screen::QuitMenu => {
            draw_game(frame, view, area);
            draw_quit_menu(frame, view.theme, view.quit_selected);
        }
        Screen::GameOver => {
            draw_game(frame, view, area);
            if !view.popped.is_empty() {
                apply_pop_effect(frame, view, area, pop_effect, pop_effect_time);
            }
            draw_game_over(frame, view, area);
        }
    }
}

fn draw_game(frame: &mut Frame, view: &View, area: Rect) {
    let board = view.session.board();
    let (bw, bh) = (board.width() as u16, board.height() as u16);
    let (board_outer, sidebar) = game_layout(area, bw, bh);
    draw_board(frame, view, board_outer);
    draw_sidebar(frame, view, sidebar);
}

fn draw_board(frame: &mut Frame, view: &View, outer: Rect) {
    let theme = view.theme;
    let session = view.session;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Bubbletui ", Style::default().fg(theme.title)));
    let inner = block.inner(outer);
    block.render(outer, frame.buffer_mut());

    let poppable = session.board().selection_poppable();
    let buf = frame.buffer_mut();
    for bubble in session.bubbles() {
        let pos = bubble.origin(CELL_WIDTH, CELL_HEIGHT, inner.x, inner.y);
        let highlighted = bubble.is_selected() && poppable;
        let mut style = Style::default()
            .fg(theme.bubble_color(bubble.kind()))
            .bg(if highlighted { theme.selected_bg } else { theme.bg });
        if highlighted {
            style = style.add_modifier(Modifier::BOLD);
        }
        if view.cursor == Some(bubble.cell()) && !view.paused {
            style = style.add_modifier(Modifier::REVERSED);
        }
        let symbol = if highlighted { BUBBLE_SELECTED } else { BUBBLE };
        put_cell(buf, inner, pos, symbol, style);
    }

    for bubble in view.popped.iter().filter(|b| b.is_popped()) {
        let pos = bubble.origin(CELL_WIDTH, CELL_HEIGHT, inner.x, inner.y);
        let style = Style::default()
            .fg(theme.bubble_color(bubble.kind()))
            .bg(theme.bg)
            .add_modifier(Modifier::BOLD);
        put_cell(buf, inner, pos, BUBBLE_BURST, style);
    }

    // Floating score popups
    for popup in &session.popups {
        let (rx, ry) = (
            inner.x + popup.column as u16 * CELL_WIDTH,
            inner.y + popup.row as u16 * CELL_HEIGHT,
        );
        if !inner.contains(Position::new(rx, ry)) {
            continue;
        }
        let label = format!("+{}", popup.amount);
        let room = (inner.x + inner.width - rx) as usize;
        let style = Style::default()
            .fg(theme.bubble_color(popup.kind))
            .bg(theme.bg)
            .add_modifier(Modifier::BOLD);
        buf.set_stringn(rx, ry, label, room, style);
    }
}

/// Buffer positions covered by the popped bubbles.
fn popped_buffer_positions(inner: Rect, popped: &[Bubble]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for bubble in popped {
        let (x0, y0) = bubble.origin(CELL_WIDTH, CELL_HEIGHT, inner.x, inner.y);
        for x in x0..x0 + CELL_WIDTH {
            for y in y0..y0 + CELL_HEIGHT {
                set.insert((x, y));
            }
        }
    }
    set
}

/// Create or update the pop fade effect and process it (TachyonFX: fade burst cells to bg).
fn apply_pop_effect(
    frame: &mut Frame,
    view: &View,
    area: Rect,
    pop_effect: &mut Option<Effect>,
    pop_effect_time: &mut Option<Instant>,
) {
    let board = view.session.board();
    let inner = board_inner_rect(area, board.width() as u16, board.height() as u16);
    let delta = pop_effect_time
        .map(|t| view.now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *pop_effect_time = Some(view.now);

    if pop_effect.is_none() {
        let burst = popped_buffer_positions(inner, view.popped);
        let filter =
            CellFilter::PositionFn(ref_count(move |pos: Position| burst.contains(&(pos.x, pos.y))));
        let bg = view.theme.bg;
        let effect = fx::fade_to(bg, bg, (POP_FADE_MS, Interpolation::QuadOut))
            .with_filter(filter)
            .with_area(inner);
        *pop_effect = Some(effect);
    }

    if let Some(effect) = pop_effect {
        frame.render_effect(effect, inner, TfxDuration::from_millis(delta_ms));
    }
}

/// Sidebar hint for a board with nothing selected.
fn status_label(state: BoardState) -> &'static str {
    match state {
        BoardState::Empty => "Dealing…",
        BoardState::Settled => "Point at a bubble",
        BoardState::Selecting => "Group selected",
        BoardState::GameOver => "No moves left",
    }
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let session = view.session;
    let board = session.board();
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let hint_style = Style::default().fg(theme.inactive_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);
    let bordered = || Block::default().borders(Borders::ALL).border_style(border_style);

    let section = |y: u16, height: u16| {
        Rect {
            x: area.x,
            y: area.y + y,
            width: area.width,
            height,
        }
        .intersection(area)
    };

    // --- Stats ---
    let stats = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(session.score().to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Best: ", title_style),
            Span::styled(view.best_score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Pops: ", title_style),
            Span::styled(session.pops().to_string(), fg_style),
        ]),
    ];
    Paragraph::new(stats)
        .block(bordered())
        .render(section(0, 5), frame.buffer_mut());

    // --- Selection ---
    let size = session.selection_len();
    let selection_line = if size == 0 {
        Line::from(Span::styled(status_label(board.state()), hint_style))
    } else if board.selection_poppable() {
        Line::from(vec![
            Span::styled(format!("{size} bubbles "), fg_style),
            Span::styled(
                format!("+{size}"),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(Span::styled(
            format!("{size} (need {})", board.config().min_group),
            hint_style,
        ))
    };
    Paragraph::new(vec![
        Line::from(Span::styled("Selection", title_style)),
        selection_line,
    ])
    .block(bordered())
    .render(section(6, 4), frame.buffer_mut());

    // --- Colours in play ---
    let kinds = board.config().kinds;
    let strip: Vec<Span> = (0..kinds)
        .map(|k| Span::styled(format!("{BUBBLE} "), Style::default().fg(theme.bubble_color(k))))
        .collect();
    Paragraph::new(vec![
        Line::from(Span::styled("Colours", title_style)),
        Line::from(strip),
    ])
    .block(bordered())
    .render(section(11, 4), frame.buffer_mut());

    // --- Keys ---
    let keys = vec![
        Line::from(Span::styled("Mouse  select / pop", hint_style)),
        Line::from(Span::styled("←↑↓→   move", hint_style)),
        Line::from(Span::styled("Enter  pop", hint_style)),
        Line::from(Span::styled("R P Q  new/pause/quit", hint_style)),
    ];
    Paragraph::new(keys)
        .block(bordered())
        .render(section(16, 6), frame.buffer_mut());
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_menu(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let menu = view.menu_state;
    let popup = centered_popup(area, 48, 21);

    let title = Line::from(vec![
        Span::styled(
            " Bubble",
            Style::default()
                .fg(theme.bubble_color(0))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "tui ",
            Style::default().fg(theme.main_fg).add_modifier(Modifier::BOLD),
        ),
    ]);
    // A row of bubbles in the palette being picked, cycling with time.
    let elapsed = view.now.duration_since(menu.animation_start).as_millis() as u32;
    let shift = (elapsed / 250) as usize;
    let decoration: Vec<Span> = (0..12)
        .map(|i| {
            let kind = ((i + shift) % menu.colours as usize) as u8;
            Span::styled(format!("{BUBBLE} "), Style::default().fg(theme.bubble_color(kind)))
        })
        .collect();

    let highlight_style = Style::default()
        .fg(Color::Black)
        .bg(theme.title)
        .add_modifier(Modifier::BOLD);
    let selected_style = Style::default().fg(theme.title).add_modifier(Modifier::BOLD);
    let normal_style = Style::default().fg(theme.main_fg);
    let tab_style = |tab: MenuTab| {
        if menu.current_tab == tab {
            highlight_style
        } else {
            selected_style
        }
    };

    let (w, h) = view.menu_board_size;
    let size_line = Line::from(Span::styled(
        format!(" Board {}×{} ", w, h),
        Style::default()
            .fg(board_size_indicator_color(w, h))
            .add_modifier(Modifier::BOLD),
    ));

    let start_btn = if menu.current_tab == MenuTab::Start {
        Span::styled(" [ START ] ", highlight_style)
    } else {
        Span::styled(" [ START ] ", normal_style)
    };

    let lines = vec![
        Line::from(""),
        title,
        Line::from(decoration),
        Line::from(""),
        size_line,
        Line::from(""),
        Line::from(Span::styled(" ─ COLOURS ─ ", Style::default().fg(theme.div_line))),
        Line::from(Span::styled(format!(" ◂ {} ▸ ", menu.colours), tab_style(MenuTab::Colours))),
        Line::from(""),
        Line::from(Span::styled(
            " ─ SMALLEST GROUP ─ ",
            Style::default().fg(theme.div_line),
        )),
        Line::from(Span::styled(
            format!(" ◂ {} ▸ ", menu.min_group),
            tab_style(MenuTab::Group),
        )),
        Line::from(""),
        Line::from(start_btn),
        Line::from(""),
        Line::from(vec![
            Span::styled(" ↕ ", Style::default().fg(theme.bubble_color(1))),
            Span::from("NAVIGATE   "),
            Span::styled(" ↔ ", Style::default().fg(theme.bubble_color(1))),
            Span::from("CHANGE   "),
            Span::styled(" ENTER ", Style::default().fg(theme.bubble_color(1))),
            Span::from("PLAY"),
        ]),
        Line::from(""),
        Line::from(Span::styled(" [Q] QUIT ", Style::default().fg(theme.bubble_color(0)))),
    ];

    let p = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(theme.main_fg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        );

    // Slide in from the bottom, ease-out cubic.
    let t = (elapsed as f32 / 500.0).min(1.0);
    let offset_t = 1.0 - (1.0 - t).powi(3);
    let mut anim_popup = popup;
    anim_popup.y += ((1.0 - offset_t) * 10.0) as u16;
    p.render(anim_popup.intersection(area), frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P — Resume    Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let popup = centered_popup(area, 30, 10);
    let mut lines: Vec<Line> = vec![
        Line::from(""),
        Line::from(Span::styled(
            " No moves left ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", view.session.score()),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Best: {} ", view.best_score),
            Style::default().fg(theme.main_fg),
        )),
    ];
    if view.new_best {
        lines.push(Line::from(Span::styled(
            " New best! ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " R — Restart    Q — Quit ",
        Style::default().fg(theme.main_fg),
    )));
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title(Span::styled(" Game Over ", Style::default().fg(theme.title))),
        )
        .render(popup, frame.buffer_mut());
}

pub fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let quit_rect = centered_popup(frame.area(), 24, 8);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title).bg(theme.bg))
        .title(" Quit? ");

    Clear.render(quit_rect, frame.buffer_mut());
    frame
        .buffer_mut()
        .set_style(quit_rect, Style::default().bg(theme.bg));
    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::Title, " Title Screen "),
        (QuitOption::Exit, " Exit "),
    ];

    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default()
                .fg(theme.bg)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if inner.contains(Position::new(rx, ry)) {
            frame.buffer_mut().set_stringn(rx, ry, label, inner.width as usize, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_size_clamps_to_terminal() {
        // 80 columns leave (80 - 2 - 24) / 2 = 27 bubbles; 24 rows leave 22.
        assert_eq!(board_size_for_terminal_clamped(80, 24, 24, 17), (24, 17));
        assert_eq!(board_size_for_terminal_clamped(60, 12, 24, 17), (17, 10));
        assert_eq!(board_size_for_terminal_clamped(10, 3, 24, 17), (1, 1));
    }

    #[test]
    fn test_cell_at_inverts_bubble_origin() {
        let area = Rect::new(0, 0, 80, 24);
        let inner = board_inner_rect(area, 24, 17);
        let bubble = Bubble::new(0, 5, 9);
        let (x, y) = bubble.origin(CELL_WIDTH, CELL_HEIGHT, inner.x, inner.y);
        assert_eq!(cell_at(area, 24, 17, x, y), (5, 9));
        assert_eq!(cell_at(area, 24, 17, x + 1, y), (5, 9));
    }

    #[test]
    fn test_cell_at_outside_board_is_out_of_range() {
        let area = Rect::new(0, 0, 80, 24);
        let inner = board_inner_rect(area, 24, 17);
        assert_eq!(cell_at(area, 24, 17, inner.x - 1, inner.y).0, -1);
        assert_eq!(cell_at(area, 24, 17, inner.x, inner.y - 1).1, -1);
        let (c, r) = cell_at(area, 24, 17, inner.x + inner.width, inner.y + inner.height);
        assert_eq!((c, r), (24, 17));
    }

    #[test]
    fn test_popped_positions_cover_both_columns() {
        let inner = Rect::new(3, 2, 20, 10);
        let set = popped_buffer_positions(inner, &[Bubble::new(1, 2, 4)]);
        assert_eq!(set, HashSet::from([(7, 6), (8, 6)]));
    }

    #[test]
    fn test_size_indicator_bands() {
        assert_eq!(board_size_indicator_color(10, 8), Color::Red);
        assert_eq!(board_size_indicator_color(12, 10), Color::Yellow);
        assert_eq!(board_size_indicator_color(24, 17), Color::Green);
    }

    #[test]
    fn test_status_label_follows_board_state() {
        use crate::board::{Board, BoardConfig};
        let mut board =
            Board::from_kinds(BoardConfig::new(2, 2, 2), &[0, 0, 1, 1]).unwrap();
        assert_eq!(status_label(board.state()), "Point at a bubble");
        board.select(0, 0);
        assert_eq!(status_label(board.state()), "Group selected");
        let stuck = Board::from_kinds(BoardConfig::new(2, 2, 2), &[0, 1, 1, 0]).unwrap();
        assert_eq!(status_label(stuck.state()), "No moves left");
        let empty = Board::new(BoardConfig::new(2, 2, 2)).unwrap();
        assert_eq!(status_label(empty.state()), "Dealing…");
    }
}
