use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::actions::Action;
use crate::ai;
use crate::canvas_view::CanvasView;
use crate::config::{AppConfig, CONFIG_FILE};
use crate::effects::Runtime;
use crate::panels;
use crate::persistence::JsonFileStore;
use crate::state::State;
use crate::store::Store;

pub struct FlowDoApp {
    state: State,
    canvas: CanvasView,
}

/// Build the application with settings from the working directory.
pub fn create_app(cc: &eframe::CreationContext<'_>) -> FlowDoApp {
    let config = AppConfig::from_environment();
    let generator = ai::generator_for(&config.ai);
    let persistence = Arc::new(JsonFileStore::new(config.storage.path.clone()));
    let ctx = cc.egui_ctx.clone();

    let mut state = State::new(Store::new(config), |inbox| {
        Runtime::new(
            generator,
            persistence,
            PathBuf::from(CONFIG_FILE),
            inbox,
            Arc::new(move || ctx.request_repaint()),
        )
    });
    state.dispatch(Action::LoadPersisted);

    FlowDoApp {
        state,
        canvas: CanvasView::default(),
    }
}

impl eframe::App for FlowDoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.state.pump(now);

        panels::toolbar(ctx, &mut self.state);
        panels::chat(ctx, &mut self.state);
        panels::inspector(ctx, &mut self.state);

        let mut canvas_origin = egui::Pos2::ZERO;
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                canvas_origin = ui.max_rect().min;
                self.canvas.show(ui, &mut self.state);
            });

        panels::canvas_menus(ctx, canvas_origin, &mut self.state);
        panels::modal(ctx, &mut self.state);

        // Apply what the panels dispatched this frame.
        self.state.pump(now);

        if let Some(left) = self.state.store.save_debounce.time_left(now) {
            ctx.request_repaint_after(left);
        }
    }
}
