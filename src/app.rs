//! App: terminal init, main loop, key and mouse handling.

use crate::bubble::Bubble;
use crate::game::GameSession;
use crate::input::{Action, PointerAction, key_to_action, mouse_to_action};
use crate::theme::Theme;
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use log::info;
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Colours selectable on the title screen.
const MENU_COLOURS: std::ops::RangeInclusive<u8> = 3..=8;
/// Smallest-group sizes selectable on the title screen.
const MENU_MIN_GROUP: std::ops::RangeInclusive<usize> = 2..=5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Title,
    Exit,
}

impl QuitOption {
    fn next(self) -> Self {
        match self {
            Self::Resume => Self::Title,
            Self::Title => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::Title => Self::Resume,
            Self::Exit => Self::Title,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTab {
    Colours,
    Group,
    Start,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    pub current_tab: MenuTab,
    pub colours: u8,
    pub min_group: usize,
    pub animation_start: Instant,
}

impl MenuState {
    fn new(colours: u8, min_group: usize) -> Self {
        Self {
            current_tab: MenuTab::Start,
            colours,
            min_group,
            animation_start: Instant::now(),
        }
    }

    /// Apply a menu key. Returns true when the player asked to start.
    fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::Up => {
                self.current_tab = match self.current_tab {
                    MenuTab::Colours => MenuTab::Start,
                    MenuTab::Group => MenuTab::Colours,
                    MenuTab::Start => MenuTab::Group,
                }
            }
            Action::Down => {
                self.current_tab = match self.current_tab {
                    MenuTab::Colours => MenuTab::Group,
                    MenuTab::Group => MenuTab::Start,
                    MenuTab::Start => MenuTab::Colours,
                }
            }
            Action::Left | Action::Right => {
                let up = action == Action::Right;
                match self.current_tab {
                    MenuTab::Colours => self.colours = step(self.colours, up, &MENU_COLOURS),
                    MenuTab::Group => self.min_group = step(self.min_group, up, &MENU_MIN_GROUP),
                    MenuTab::Start => {}
                }
            }
            Action::Pop => return true,
            _ => {}
        }
        false
    }
}

/// Step a value within `range`, wrapping at both ends.
fn step<T>(value: T, up: bool, range: &std::ops::RangeInclusive<T>) -> T
where
    T: Copy + PartialOrd + std::ops::Add<Output = T> + std::ops::Sub<Output = T> + From<u8>,
{
    let one = T::from(1);
    let (lo, hi) = (*range.start(), *range.end());
    if up {
        if value >= hi { lo } else { value + one }
    } else if value <= lo {
        hi
    } else {
        value - one
    }
}

pub struct App {
    args: Args,
    config: GameConfig,
    theme: Theme,
    session: GameSession,
    screen: Screen,
    paused: bool,
    /// Keyboard cursor (column, row); follows the mouse too.
    cursor: (usize, usize),
    /// Best score this run; not persisted.
    best_score: u32,
    new_best: bool,
    /// Bubbles from the last pop, drawn as bursts until the fade finishes.
    popped: Vec<Bubble>,
    /// TachyonFX fade effect for popped bubbles (created on first frame after a pop).
    pop_effect: Option<Effect>,
    /// Last time we processed the pop effect (for delta).
    pop_effect_process_time: Option<Instant>,
    menu_state: MenuState,
    quit_selected: QuitOption,
    /// Board size from current terminal when on menu; used when starting from menu.
    menu_board_size: (u16, u16),
    /// Last frame area, for mapping mouse positions to board cells.
    area: Rect,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        let mut session = GameSession::new(config.board, config.seed)?;
        session.init();
        let screen = if args.no_menu {
            Screen::Playing
        } else {
            Screen::Menu
        };
        let menu_state = MenuState::new(
            config.board.kinds.clamp(*MENU_COLOURS.start(), *MENU_COLOURS.end()),
            config.board.min_group.clamp(*MENU_MIN_GROUP.start(), *MENU_MIN_GROUP.end()),
        );
        let menu_board_size = (config.board.width as u16, config.board.height as u16);
        Ok(Self {
            args,
            config,
            theme,
            session,
            screen,
            paused: false,
            cursor: (0, 0),
            best_score: 0,
            new_best: false,
            popped: Vec::new(),
            pop_effect: None,
            pop_effect_process_time: None,
            menu_state,
            quit_selected: QuitOption::Resume,
            menu_board_size,
            area: Rect::default(),
        })
    }

    /// Deal a new board with the current config; the session is rebuilt only if the config changed.
    fn reset_game(&mut self) -> Result<()> {
        if *self.session.board().config() != self.config.board {
            self.session = GameSession::new(self.config.board, self.config.seed)?;
        }
        self.session.init();
        self.screen = Screen::Playing;
        self.paused = false;
        self.new_best = false;
        self.clear_pop_animation();
        let (w, h) = (self.session.board().width(), self.session.board().height());
        self.cursor = (w / 2, h / 2);
        self.check_game_over();
        Ok(())
    }

    /// Start from the title screen with the chosen colours, group size and board size.
    fn start_from_menu(&mut self) -> Result<()> {
        self.config.board.kinds = self.menu_state.colours;
        self.config.board.min_group = self.menu_state.min_group;
        self.config.board.width = self.menu_board_size.0 as usize;
        self.config.board.height = self.menu_board_size.1 as usize;
        info!(
            "starting {}x{} game with {} colours, min group {}",
            self.config.board.width,
            self.config.board.height,
            self.config.board.kinds,
            self.config.board.min_group
        );
        self.reset_game()
    }

    fn clear_pop_animation(&mut self) {
        self.popped.clear();
        self.pop_effect = None;
        self.pop_effect_process_time = None;
    }

    fn check_game_over(&mut self) {
        if self.session.is_game_over() {
            self.screen = Screen::GameOver;
        }
    }

    /// Select the group at a cell, then pop it.
    fn pop_at(&mut self, column: i32, row: i32) {
        self.session.select(column, row);
        if self.session.pop() == 0 {
            return;
        }
        let popped = self.session.take_popped();
        self.clear_pop_animation();
        if !self.config.no_animation {
            self.popped = popped;
        }
        if self.session.score() > self.best_score {
            self.best_score = self.session.score();
            self.new_best = true;
        }
        // Highlight whatever fell into place under the cursor.
        self.session.select(column, row);
        self.check_game_over();
    }

    fn move_cursor(&mut self, action: Action) {
        let (w, h) = (self.session.board().width(), self.session.board().height());
        let (c, r) = self.cursor;
        self.cursor = match action {
            Action::Left => (c.saturating_sub(1), r),
            Action::Right => ((c + 1).min(w.saturating_sub(1)), r),
            Action::Up => (c, r.saturating_sub(1)),
            Action::Down => (c, (r + 1).min(h.saturating_sub(1))),
            _ => (c, r),
        };
        self.session.select(self.cursor.0 as i32, self.cursor.1 as i32);
    }

    /// Handle a key on the current screen. Returns false to exit.
    fn apply_action(&mut self, action: Action) -> Result<bool> {
        match self.screen {
            Screen::Menu => match action {
                Action::Quit => return Ok(false),
                _ => {
                    if self.menu_state.apply(action) {
                        self.start_from_menu()?;
                    }
                }
            },
            Screen::Playing => match action {
                Action::Quit => {
                    self.clear_pop_animation();
                    self.quit_selected = QuitOption::Resume;
                    self.screen = Screen::QuitMenu;
                }
                Action::Pause => self.paused = !self.paused,
                _ if self.paused => {}
                Action::Restart => self.reset_game()?,
                Action::Left | Action::Right | Action::Up | Action::Down => self.move_cursor(action),
                Action::Pop => {
                    let (c, r) = self.cursor;
                    self.pop_at(c as i32, r as i32);
                }
                Action::None => {}
            },
            Screen::GameOver => match action {
                Action::Restart | Action::Pop => self.reset_game()?,
                Action::Quit => return Ok(false),
                _ => {}
            },
            Screen::QuitMenu => match action {
                Action::Up | Action::Left => self.quit_selected = self.quit_selected.prev(),
                Action::Down | Action::Right => self.quit_selected = self.quit_selected.next(),
                Action::Quit | Action::Pause => self.screen = Screen::Playing,
                Action::Pop => match self.quit_selected {
                    QuitOption::Resume => self.screen = Screen::Playing,
                    QuitOption::Title => {
                        self.menu_state.animation_start = Instant::now();
                        self.screen = Screen::Menu;
                    }
                    QuitOption::Exit => return Ok(false),
                },
                _ => {}
            },
        }
        Ok(true)
    }

    fn apply_pointer(&mut self, pointer: PointerAction) {
        if self.screen != Screen::Playing || self.paused {
            return;
        }
        match pointer {
            PointerAction::Hover { x, y } => match self.bubble_under(x, y) {
                Some((c, r)) => {
                    self.cursor = (c, r);
                    self.session.select(c as i32, r as i32);
                }
                None => self.session.clear_selection(),
            },
            PointerAction::Click { x, y } => {
                if let Some((c, r)) = self.bubble_under(x, y) {
                    self.pop_at(c as i32, r as i32);
                }
            }
            PointerAction::None => {}
        }
    }

    /// Board cell holding a bubble at a terminal position, if any.
    fn bubble_under(&self, x: u16, y: u16) -> Option<(usize, usize)> {
        let board = self.session.board();
        let (bw, bh) = (board.width() as u16, board.height() as u16);
        let (c, r) = crate::ui::cell_at(self.area, bw, bh, x, y);
        let (c, r) = (usize::try_from(c).ok()?, usize::try_from(r).ok()?);
        board.get(c, r).map(|_| (c, r))
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{
                DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
                PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
            },
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        // Press/release reporting keeps held keys from auto-repeating pops.
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        // Size board to fit terminal; respect --width/--height when they fit
        let (term_cols, term_rows) = size()?;
        let (w, h) = crate::ui::board_size_for_terminal_clamped(
            term_cols,
            term_rows,
            self.args.width,
            self.args.height,
        );
        self.menu_board_size = (w, h);
        if (w as usize, h as usize) != (self.config.board.width, self.config.board.height) {
            self.config.board.width = w as usize;
            self.config.board.height = h as usize;
            self.reset_game()?;
            if !self.args.no_menu {
                self.screen = Screen::Menu;
            }
        }
        if self.screen == Screen::Playing {
            self.check_game_over();
        }

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let mut last_frame = Instant::now();
        loop {
            let now = Instant::now();
            if self.screen == Screen::Menu {
                let (c, r) = crossterm::terminal::size().unwrap_or((80, 24));
                self.menu_board_size =
                    crate::ui::board_size_for_terminal_clamped(c, r, self.args.width, self.args.height);
            }

            terminal.draw(|f| {
                self.area = f.area();
                let view = crate::ui::View {
                    screen: self.screen,
                    session: &self.session,
                    theme: &self.theme,
                    paused: self.paused,
                    cursor: Some(self.cursor),
                    best_score: self.best_score,
                    new_best: self.new_best,
                    popped: &self.popped,
                    menu_state: &self.menu_state,
                    menu_board_size: self.menu_board_size,
                    quit_selected: self.quit_selected,
                    now,
                };
                crate::ui::draw(
                    f,
                    &view,
                    &mut self.pop_effect,
                    &mut self.pop_effect_process_time,
                )
            })?;

            if self.pop_effect.as_ref().is_some_and(|e| e.done()) {
                self.clear_pop_animation();
            }

            if self.screen == Screen::Playing && !self.paused {
                let delta = now.duration_since(last_frame).as_millis().min(u32::MAX as u128);
                self.session.tick_popups(delta as u32);
            }
            last_frame = now;

            // Limit event polling to hit ~60 FPS rendering (16ms)
            let frame_duration = Duration::from_millis(16);
            let timeout = frame_duration.saturating_sub(now.elapsed());

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if !self.apply_action(key_to_action(key))? {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse) => self.apply_pointer(mouse_to_action(mouse)),
                        _ => {}
                    }
                }
            }
        }
    }
}
