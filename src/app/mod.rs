use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use chrono::{DateTime, Utc};
use eframe::egui::{self, Context};
use tracing::debug;

use crate::config::Settings;
use crate::github::{FetchError, GithubClient, Portfolio, collect_portfolio};
use crate::network::{LanguagePalette, LayoutMode, RepoNetwork};

mod graph;
mod highlight;
mod render_utils;
mod ui;

use render_utils::Camera;

type LoadResult = Result<Portfolio, String>;

pub struct ConstellationApp {
    client: Arc<GithubClient>,
    settings: Settings,
    initial_mode: LayoutMode,
    state: AppState,
    /// In-flight load. Replacing it drops the older receiver, so a superseded
    /// worker's result is never observed.
    reload: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading,
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    client: Arc<GithubClient>,
    portfolio: Portfolio,
    settings: Settings,
    palette: LanguagePalette,
    network: RepoNetwork,
    mode: LayoutMode,
    network_dirty: bool,
    camera: Camera,
    auto_rotate: bool,
    live_layout: bool,
    show_labels: bool,
    search: String,
    selected: Option<String>,
    event_summary: Vec<(String, usize)>,
    recent_activity: Vec<(String, Option<DateTime<Utc>>)>,
    languages: HashMap<String, LanguageState>,
    language_requests: Vec<(String, Receiver<Result<Vec<(String, f32)>, FetchError>>)>,
    frame_samples: VecDeque<f32>,
    view_scratch: ViewScratch,
}

enum LanguageState {
    Loading,
    Ready(Vec<(String, f32)>),
    Failed(String),
}

#[derive(Default)]
struct ViewScratch {
    projected: Vec<Option<render_utils::Projected>>,
    draw_order: Vec<usize>,
}

struct HighlightState {
    focus: usize,
    related_nodes: HashSet<usize>,
    related_edges: HashSet<(usize, usize)>,
}

impl ConstellationApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: Settings, initial_mode: LayoutMode) -> Self {
        let client = Arc::new(GithubClient::from_settings(&settings.api));
        let mut app = Self {
            client,
            settings,
            initial_mode,
            state: AppState::Loading,
            reload: None,
        };
        app.start_load();
        app
    }

    /// Starts a load that supersedes any load still in flight.
    fn start_load(&mut self) {
        let client = Arc::clone(&self.client);
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = collect_portfolio(&client).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        self.track_load(rx);
    }

    fn track_load(&mut self, rx: Receiver<LoadResult>) {
        if self.reload.replace(rx).is_some() {
            debug!("superseding in-flight load");
        }
    }

    fn poll_load(&mut self) -> Option<AppState> {
        let pending = self.reload.take()?;
        match pending.try_recv() {
            Ok(Ok(portfolio)) => Some(AppState::Ready(Box::new(ViewModel::new(
                Arc::clone(&self.client),
                portfolio,
                self.settings.clone(),
                self.current_mode(),
            )))),
            Ok(Err(error)) => Some(AppState::Error(error)),
            Err(TryRecvError::Empty) => {
                self.reload = Some(pending);
                None
            }
            Err(TryRecvError::Disconnected) => {
                Some(AppState::Error("Background load worker disconnected".to_owned()))
            }
        }
    }

    fn current_mode(&self) -> LayoutMode {
        match &self.state {
            AppState::Ready(model) => model.mode,
            _ => self.initial_mode,
        }
    }
}

impl eframe::App for ConstellationApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let transition = self.poll_load();
        if let Some(next_state) = transition {
            self.state = next_state;
        }

        let is_loading = self.reload.is_some();
        if is_loading {
            ctx.request_repaint();
        }

        let mut reload_requested = false;
        match &mut self.state {
            AppState::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading(format!("Loading repositories for {}...", self.client.account()));
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load repositories");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.add_enabled(!is_loading, egui::Button::new("Retry")).clicked() {
                        reload_requested = true;
                    }
                });
            }
            AppState::Ready(model) => {
                model.show(ctx, &mut reload_requested, is_loading);
            }
        }

        if reload_requested {
            self.start_load();
            if matches!(self.state, AppState::Error(_)) {
                self.state = AppState::Loading;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_app() -> ConstellationApp {
        let settings = Settings::default();
        ConstellationApp {
            client: Arc::new(GithubClient::from_settings(&settings.api)),
            settings,
            initial_mode: LayoutMode::Force,
            state: AppState::Loading,
            reload: None,
        }
    }

    #[test]
    fn newer_load_supersedes_the_one_in_flight() {
        let mut app = idle_app();
        let (old_tx, old_rx) = mpsc::channel();
        let (new_tx, new_rx) = mpsc::channel();

        app.track_load(old_rx);
        app.track_load(new_rx);

        assert!(old_tx.send(Err("old".to_owned())).is_err());
        assert!(app.poll_load().is_none());
        assert!(app.reload.is_some());

        new_tx.send(Err("new".to_owned())).unwrap();
        match app.poll_load() {
            Some(AppState::Error(error)) => assert_eq!(error, "new"),
            _ => panic!("expected the newer load's error"),
        }
        assert!(app.reload.is_none());
    }

    #[test]
    fn vanished_worker_becomes_an_error() {
        let mut app = idle_app();
        let (tx, rx) = mpsc::channel::<LoadResult>();
        app.track_load(rx);
        drop(tx);

        assert!(matches!(app.poll_load(), Some(AppState::Error(_))));
    }
}
