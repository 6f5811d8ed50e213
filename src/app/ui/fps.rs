use eframe::egui::Context;

use super::super::ViewModel;

const FPS_SAMPLE_WINDOW: usize = 120;

impl ViewModel {
    pub(in crate::app) fn update_fps_counter(&mut self, ctx: &Context) {
        let dt = ctx.input(|input| input.stable_dt);
        if dt <= f32::EPSILON {
            return;
        }

        self.frame_samples.push_back((1.0 / dt).clamp(0.0, 1000.0));
        while self.frame_samples.len() > FPS_SAMPLE_WINDOW {
            self.frame_samples.pop_front();
        }
    }

    pub(in crate::app) fn fps_display_text(&self) -> Option<String> {
        let current = *self.frame_samples.back()?;
        let average = self.frame_samples.iter().sum::<f32>() / self.frame_samples.len() as f32;
        Some(format!("FPS {current:.0} | avg {average:.1}"))
    }

    pub(in crate::app) fn network_summary_text(&self) -> String {
        format!(
            "{} repositories / {} connections (cap {})",
            self.network.nodes().len(),
            self.network.connections().len(),
            self.network.degree_cap()
        )
    }
}
