use std::sync::Arc;
use std::sync::mpsc::{self, TryRecvError};
use std::thread;

use eframe::egui::{self, RichText, Ui};
use tracing::debug;

use crate::github::language_shares;
use crate::util::{format_count, short_name};

use super::super::{LanguageState, ViewModel};

impl ViewModel {
    /// Starts a background language fetch for `full_name` unless one is
    /// already loaded or in flight.
    pub(in crate::app) fn request_languages(&mut self, full_name: &str) {
        if matches!(
            self.languages.get(full_name),
            Some(LanguageState::Loading | LanguageState::Ready(_))
        ) {
            return;
        }

        let client = Arc::clone(&self.client);
        let repository = full_name.to_owned();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = client
                .languages(&repository)
                .map(|breakdown| language_shares(&breakdown));
            let _ = tx.send(result);
        });

        self.languages
            .insert(full_name.to_owned(), LanguageState::Loading);
        self.language_requests.push((full_name.to_owned(), rx));
    }

    /// Drains finished language fetches. Returns whether any arrived.
    pub(in crate::app) fn poll_language_requests(&mut self) -> bool {
        let mut arrived = false;
        let languages = &mut self.languages;

        self.language_requests.retain(|(full_name, rx)| match rx.try_recv() {
            Ok(Ok(shares)) => {
                languages.insert(full_name.clone(), LanguageState::Ready(shares));
                arrived = true;
                false
            }
            Ok(Err(error)) if error.is_superseded() => {
                debug!(repository = full_name.as_str(), "language fetch superseded");
                languages.remove(full_name);
                false
            }
            Ok(Err(error)) => {
                languages.insert(full_name.clone(), LanguageState::Failed(error.to_string()));
                arrived = true;
                false
            }
            Err(TryRecvError::Empty) => true,
            Err(TryRecvError::Disconnected) => {
                languages.insert(
                    full_name.clone(),
                    LanguageState::Failed("language worker disconnected".to_owned()),
                );
                arrived = true;
                false
            }
        });

        arrived
    }

    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Repository Details");
        ui.add_space(6.0);

        let selected_index = self
            .selected
            .as_deref()
            .and_then(|full_name| self.network.index_of(full_name));
        let Some(index) = selected_index else {
            ui.label("Click a repository in the network to inspect it.");
            ui.separator();
            self.draw_account_summary(ui);
            return;
        };

        let node = &self.network.nodes()[index];
        let full_name = node.full_name.clone();

        ui.label(RichText::new(short_name(&node.full_name)).strong().size(16.0));
        ui.hyperlink_to(node.full_name.as_str(), node.html_url.as_str());
        if let Some(description) = &node.description {
            ui.add_space(4.0);
            ui.label(description.as_str());
        }
        ui.add_space(6.0);

        ui.label(format!(
            "Language: {}",
            node.language.as_deref().unwrap_or("none detected")
        ));
        ui.label(format!(
            "Stars {}  |  Forks {}  |  Open issues {}",
            format_count(node.stars),
            format_count(node.forks),
            format_count(node.open_issues)
        ));
        ui.label(format!("Size: {} KB", node.size));
        if let Some(pushed) = node.last_activity() {
            ui.label(format!("Last activity: {}", pushed.format("%Y-%m-%d")));
        }
        if let Some(created) = node.created_at {
            ui.label(format!("Created: {}", created.format("%Y-%m-%d")));
        }
        if node.is_fork {
            ui.label("Fork of another repository");
        }
        if !node.topics.is_empty() {
            ui.horizontal_wrapped(|ui| {
                ui.label("Topics:");
                for topic in &node.topics {
                    ui.label(RichText::new(topic.as_str()).monospace());
                }
            });
        }
        ui.label(format!(
            "Node radius {:.2}  |  mass {:.2}",
            node.radius, node.mass
        ));

        ui.separator();
        ui.label(RichText::new("Language breakdown").strong());
        match self.languages.get(&full_name) {
            Some(LanguageState::Ready(shares)) if shares.is_empty() => {
                ui.label("No language data reported.");
            }
            Some(LanguageState::Ready(shares)) => {
                for (language, percent) in shares.iter().take(8) {
                    ui.horizontal(|ui| {
                        ui.add(
                            egui::ProgressBar::new(percent / 100.0)
                                .desired_width(120.0)
                                .text(format!("{percent:.1}%")),
                        );
                        ui.label(language.as_str());
                    });
                }
            }
            Some(LanguageState::Failed(error)) => {
                ui.colored_label(ui.visuals().warn_fg_color, error.as_str());
            }
            Some(LanguageState::Loading) => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Fetching languages...");
                });
            }
            None => {
                if ui.button("Fetch languages").clicked() {
                    self.request_languages(&full_name);
                }
            }
        }

        ui.separator();
        let connections = self
            .network
            .connections_of(index)
            .filter_map(|connection| {
                let other = connection.other(index)?;
                Some((
                    self.network.nodes()[other].full_name.clone(),
                    connection.kind.label(),
                    connection.strength,
                ))
            })
            .collect::<Vec<_>>();

        ui.label(RichText::new(format!("Connections ({})", connections.len())).strong());
        if connections.is_empty() {
            ui.label("Not connected to any other repository.");
        }

        let mut pending_selection = None;
        egui::ScrollArea::vertical()
            .id_salt("connections_scroll")
            .max_height(280.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for (other, kind, strength) in &connections {
                    let label = format!("{}  ({kind}, {strength:.2})", short_name(other));
                    if ui.link(label).on_hover_text(other.as_str()).clicked() {
                        pending_selection = Some(other.clone());
                    }
                }
            });

        ui.add_space(6.0);
        if ui.button("Clear selection").clicked() {
            self.set_selected(None);
        } else if let Some(other) = pending_selection {
            self.set_selected(Some(other));
        }
    }

    fn draw_account_summary(&mut self, ui: &mut Ui) {
        match &self.portfolio.profile {
            Some(profile) => {
                ui.label(
                    RichText::new(profile.name.as_deref().unwrap_or(profile.login.as_str())).strong(),
                );
                if !profile.html_url.is_empty() {
                    ui.hyperlink_to(profile.login.as_str(), profile.html_url.as_str());
                }
                if let Some(bio) = &profile.bio {
                    ui.label(bio.as_str());
                }
                ui.label(format!(
                    "{} public repositories  |  {} followers  |  {} following",
                    profile.public_repos,
                    format_count(profile.followers),
                    format_count(profile.following)
                ));
            }
            None => {
                ui.label(format!("Profile for {} unavailable.", self.portfolio.account));
            }
        }

        ui.separator();
        ui.label(RichText::new("Recent public activity").strong());
        if self.event_summary.is_empty() {
            ui.label("No recent events.");
            return;
        }
        for (kind, count) in &self.event_summary {
            ui.label(format!("{kind}: {count}"));
        }

        ui.add_space(6.0);
        ui.label(RichText::new("Recently active").strong());
        let mut pending_selection = None;
        for (repository, at) in &self.recent_activity {
            let when = at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            if self.network.index_of(repository).is_some() {
                if ui.link(format!("{}  {when}", short_name(repository))).clicked() {
                    pending_selection = Some(repository.clone());
                }
            } else {
                ui.label(format!("{repository}  {when}"));
            }
        }
        ui.small(format!("{} cached responses", self.client.cached_entries()));

        if let Some(repository) = pending_selection {
            self.set_selected(Some(repository));
        }
    }
}
