//! Terminal dashboard for watching a training run: one reward plot per worker and a log view

use std::{
    io::{self, stdout, Stdout},
    panic,
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
    thread::{self, JoinHandle},
    time::Duration,
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, prelude::*, widgets::*, Terminal};

use crate::algo::a3c::EpisodeReport;

use self::{logs::Logs, plot::WorkerPlots};

mod logs;
mod plot;

const TABS: [&str; 2] = ["Rewards", "Logs"];

/// Spawn the dashboard on its own thread
///
/// Feed it the [`EpisodeReport`]s of a run through the returned sender, e.g. with
/// [`A3C::train_with_monitor`](crate::algo::a3c::A3C::train_with_monitor). The dashboard keeps
/// showing the final plots after the sender is dropped, until `q` is pressed.
///
/// Call [`init_logger`] beforehand to see log records in the log tab.
pub fn init(
    workers: usize,
    n_games: usize,
) -> (JoinHandle<io::Result<()>>, Sender<EpisodeReport>) {
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || App::new(workers, n_games).run(rx));
    (handle, tx)
}

/// Route the `log` facade into the dashboard's log tab
pub fn init_logger(level: ::log::LevelFilter) -> Result<(), ::log::SetLoggerError> {
    tui_logger::init_logger(level)?;
    tui_logger::set_default_level(level);
    Ok(())
}

#[derive(Default, PartialEq)]
enum State {
    #[default]
    Train,
    Done,
    Quit,
}

/// The root component which holds the dashboard state and runs the render loop
struct App {
    state: State,
    episode: usize,
    total_episodes: usize,
    selected_tab: usize,
    plots: WorkerPlots,
    logs: Logs,
}

impl App {
    fn new(workers: usize, episodes: usize) -> Self {
        Self {
            state: State::default(),
            episode: 0,
            total_episodes: episodes,
            selected_tab: 0,
            plots: WorkerPlots::new(workers),
            logs: Logs::new(),
        }
    }

    /// Initialize the terminal and run the main loop
    ///
    /// Restores the terminal on exit
    fn run(&mut self, rx: Receiver<EpisodeReport>) -> io::Result<()> {
        let mut terminal = init_terminal()?;

        while self.state != State::Quit {
            if self.state == State::Train {
                self.drain(&rx);
            }

            terminal.draw(|frame| frame.render_widget(&*self, frame.size()))?;

            if event::poll(Duration::from_millis(16))? {
                let event = event::read()?;
                self.handle_event(&event);
            }
        }

        restore_terminal()
    }

    fn drain(&mut self, rx: &Receiver<EpisodeReport>) {
        loop {
            match rx.try_recv() {
                Ok(report) => {
                    self.episode = self.episode.max(report.episode);
                    self.plots.update(&report);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.state = State::Done;
                    break;
                }
            }
        }
    }

    fn handle_event(&mut self, event: &Event) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.state = State::Quit,
            KeyCode::Tab => self.selected_tab = (self.selected_tab + 1) % TABS.len(),
            code => match self.selected_tab {
                0 => match code {
                    KeyCode::Left => self.plots.prev(),
                    KeyCode::Right => self.plots.next(),
                    _ => {}
                },
                _ => self.logs.handle_key(code),
            },
        }
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [menu_area, main_area, progress_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(3),
        ])
        .areas(area);

        Tabs::new(TABS)
            .block(Block::default().padding(Padding::uniform(1)))
            .white()
            .bold()
            .highlight_style(Style::default().light_green())
            .select(self.selected_tab)
            .render(menu_area, buf);

        match self.selected_tab {
            0 => self.plots.render(main_area, buf),
            _ => self.logs.render(main_area, buf),
        }

        let title = match self.state {
            State::Done => "Finished (q to quit)",
            _ => "Episodes",
        };
        let ratio = if self.total_episodes == 0 {
            1.0
        } else {
            (self.episode as f64 / self.total_episodes as f64).min(1.0)
        };
        Gauge::default()
            .block(Block::bordered().border_type(BorderType::Rounded).title(title))
            .gauge_style(Color::Cyan)
            .label(format!("{}/{}", self.episode, self.total_episodes))
            .ratio(ratio)
            .render(progress_area, buf);
    }
}

fn init_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    execute!(stdout(), EnterAlternateScreen)?;
    enable_raw_mode()?;
    Terminal::new(CrosstermBackend::new(stdout()))
}

fn restore_terminal() -> io::Result<()> {
    execute!(stdout(), LeaveAlternateScreen)?;
    disable_raw_mode()
}
