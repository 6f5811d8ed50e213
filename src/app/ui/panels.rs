use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use eframe::egui::{self, Align, Context, Layout};

use crate::config::Settings;
use crate::github::{GithubClient, Portfolio, recent_repositories, summarize_events};
use crate::network::{LanguagePalette, LayoutMode, RepoNetwork};

use super::super::render_utils::Camera;
use super::super::{ViewModel, ViewScratch};

const RECENT_ACTIVITY_ROWS: usize = 8;

impl ViewModel {
    pub(in crate::app) fn new(
        client: Arc<GithubClient>,
        portfolio: Portfolio,
        settings: Settings,
        mode: LayoutMode,
    ) -> Self {
        let palette = LanguagePalette::github_defaults();
        let network = RepoNetwork::build(
            portfolio.repositories.clone(),
            &palette,
            &settings.network,
            mode,
            portfolio.fetched_at,
        );
        let event_summary = summarize_events(&portfolio.events);
        let recent_activity = recent_repositories(&portfolio.events, RECENT_ACTIVITY_ROWS);

        let mut model = Self {
            client,
            portfolio,
            settings,
            palette,
            network,
            mode,
            network_dirty: false,
            camera: Camera::default(),
            auto_rotate: true,
            live_layout: true,
            show_labels: true,
            search: String::new(),
            selected: None,
            event_summary,
            recent_activity,
            languages: HashMap::new(),
            language_requests: Vec::new(),
            frame_samples: VecDeque::new(),
            view_scratch: ViewScratch::default(),
        };
        model.camera.frame(model.network_extent());
        model
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, reload_requested: &mut bool, is_loading: bool) {
        self.update_fps_counter(ctx);
        if self.poll_language_requests() || !self.language_requests.is_empty() {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("repo-constellation");
                    ui.separator();
                    ui.label(format!("account: {}", self.portfolio.account));
                    ui.label(format!("repositories: {}", self.portfolio.repositories.len()));
                    ui.label(format!("fetched at {}", self.portfolio.fetched_at.format("%H:%M:%S")));
                    let reload_button = ui.add_enabled(!is_loading, egui::Button::new("Reload"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Rebuild network").clicked() {
                        self.network_dirty = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.network_summary_text());
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        if self.selected == selected {
            return;
        }

        if let Some(full_name) = &selected {
            self.request_languages(full_name);
        }
        self.selected = selected;
    }
}
