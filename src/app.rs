use crate::config::{load_settings, save_settings_atomic, Paths, Settings};
use crate::input::{collect_input_nonblocking, InputEvent, Pointer};
use crate::layout::QuestLayout;
use crate::model::{Allocation, LevelCounter, QuestOutcome, Rules};
use crate::quest::AllocationQuest;
use crate::render::{draw_idle, draw_quest, Palette, Terminal};
use crate::results::ResultLog;
use crossterm::event::KeyCode;
use std::time::{Duration, Instant};
use tracing::{info, warn};

// Level bookkeeping and quest outcome handling, kept apart from the
// terminal so the idle loop only has to feed it.
#[derive(Debug, Default)]
pub(crate) struct Controller {
    level: LevelCounter,
    status: Option<String>,
    should_quit: bool,
}

impl Controller {
    pub(crate) fn level(&self) -> u64 {
        self.level.value()
    }

    pub(crate) fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub(crate) fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub(crate) fn quit(&mut self) {
        self.should_quit = true;
    }

    // the level to run a quest at, if the new level qualifies
    pub(crate) fn advance(&mut self) -> Option<u64> {
        let level = self.level.advance();
        info!(level, "level advanced");
        if !self.level.qualifies() {
            return None;
        }
        self.status = None;
        Some(level)
    }

    pub(crate) fn finish_quest(&mut self, outcome: QuestOutcome, results: &ResultLog) {
        let level = self.level.value();
        match outcome {
            QuestOutcome::Cancelled => {
                info!(level, "quest cancelled, exiting");
                self.should_quit = true;
            }
            QuestOutcome::Confirmed(allocation) => {
                info!(level, %allocation, "Allocation result");
                let mut line = format!("Allocation result: {allocation}");
                if let Some(warning) = record_result(results, level, &allocation) {
                    line = format!("{line} | {warning}");
                }
                self.status = Some(line);
            }
        }
    }
}

// A failed write is reported, never fatal.
fn record_result(results: &ResultLog, level: u64, allocation: &Allocation) -> Option<String> {
    match results.append(level, allocation) {
        Ok(()) => None,
        Err(e) => {
            warn!(error = %e, level, "result not logged");
            Some(format!("result not logged: {e}"))
        }
    }
}

pub(crate) struct App {
    settings: Settings,
    rules: Rules,
    controller: Controller,
    results: ResultLog,
    palette: Palette,
    paths: Paths,
    term: Terminal,
}

impl App {
    fn init(paths: Paths) -> anyhow::Result<Self> {
        let settings = load_settings(&paths.settings_path);
        let results = ResultLog::new(settings.result_log.clone());
        let palette = Palette::new(settings.enable_color);
        let term = Terminal::begin()?;

        info!(
            fps = settings.fps(),
            results = %results.path().display(),
            cols = term.cols,
            rows = term.rows,
            "terminal ready"
        );

        Ok(Self {
            settings,
            rules: Rules::default(),
            controller: Controller::default(),
            results,
            palette,
            paths,
            term,
        })
    }

    fn frame_dt(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.settings.fps() as f32)
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let frame_dt = self.frame_dt();

        while !self.controller.should_quit() {
            self.term.resize_if_needed()?;

            for ev in collect_input_nonblocking(frame_dt)? {
                match ev {
                    InputEvent::Quit => self.controller.quit(),
                    InputEvent::Key(KeyCode::Char(' ')) => {
                        if let Some(level) = self.controller.advance() {
                            let outcome = self.run_quest(level)?;
                            self.controller.finish_quest(outcome, &self.results);
                        }
                    }
                    _ => {}
                }
                if self.controller.should_quit() {
                    break;
                }
            }
            if self.controller.should_quit() {
                break;
            }

            draw_idle(
                &mut self.term.cur,
                self.controller.level(),
                self.controller.status(),
                &self.palette,
            );
            self.term.present(true)?;

            spin_sleep(frame_dt, Instant::now());
        }

        info!(level = self.controller.level(), "quitting");
        self.term.end()?;
        if let Err(e) = save_settings_atomic(&self.paths.settings_path, &self.settings) {
            warn!(error = %e, "could not write settings");
        }
        Ok(())
    }

    // Blocks the idle loop until the player confirms or quits.
    fn run_quest(&mut self, level: u64) -> anyhow::Result<QuestOutcome> {
        let frame_dt = self.frame_dt();
        let mut quest = AllocationQuest::new(self.rules.clone(), level);
        let mut pointer = Pointer::default();
        let mut last_frame = Instant::now();
        info!(level, resource = quest.resource(), "quest started");

        loop {
            self.term.resize_if_needed()?;
            let layout = QuestLayout::new(self.term.cols, self.term.rows);

            for ev in collect_input_nonblocking(frame_dt)? {
                pointer.observe(&ev);
                if let Some(outcome) = quest.handle(&ev, &layout) {
                    return Ok(outcome);
                }
            }

            let now = Instant::now();
            let dt = now.saturating_duration_since(last_frame);
            last_frame = now;
            quest.tick(dt, &pointer, &layout);

            draw_quest(&mut self.term.cur, &quest, &layout, &self.palette);
            self.term.present(true)?;

            spin_sleep(frame_dt, Instant::now());
        }
    }
}

pub(crate) fn run(paths: Paths) -> anyhow::Result<()> {
    let mut app = App::init(paths)?;
    app.run()?;
    Ok(())
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
