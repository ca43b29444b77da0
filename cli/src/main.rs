use std::io::{self, stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use ratatui::DefaultTerminal;

use kef::VolumeSyncController;
use kef_cli::config::AppConfig;
use kef_cli::logging;
use kef_cli::state::store::Store;
use kef_cli::views::control::ControlView;
use kef_cli::views::View;

const TICK: Duration = Duration::from_millis(50);

fn main() -> io::Result<()> {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("kef-panel: {}", e);
            std::process::exit(2);
        }
    };
    logging::init(&config)?;
    log::info!("Starting panel for {}", config.speaker_address);

    let runtime = tokio::runtime::Runtime::new()?;
    let speaker = Arc::new(config.simulation.build(&config.speaker_address));
    let (controller, task) = {
        let _guard = runtime.enter();
        VolumeSyncController::spawn(speaker, config.sync)
    };

    let store = Arc::new(Store::new());
    let view = ControlView::new(store.clone(), controller.clone(), &config.speaker_address, &config);

    let mut terminal = ratatui::init();
    let app_result = execute!(stdout(), EnableMouseCapture)
        .and_then(|_| App::new(store, view).run(&mut terminal));
    let _ = execute!(stdout(), DisableMouseCapture);
    ratatui::restore();

    let _ = controller.shutdown();
    if let Err(e) = runtime.block_on(task) {
        log::error!("Controller task failed: {}", e);
    }
    log::info!("Panel closed");
    app_result
}

pub struct App {
    store: Arc<Store>,
    view: ControlView,
}

impl App {
    pub fn new(store: Arc<Store>, view: ControlView) -> Self {
        Self { store, view }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        let mut dirty = true;

        while !self.store.with_state(|state| state.exit) {
            if dirty || self.view.needs_redraw() {
                terminal.draw(|frame| self.view.render(frame))?;
                dirty = false;
            }

            if event::poll(TICK)? {
                self.view.handle_event(event::read()?, &self.store)?;
                dirty = true;
            }
            self.view.tick(Instant::now(), &self.store);
        }
        Ok(())
    }
}
