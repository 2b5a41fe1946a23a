use anyhow::{Result, anyhow};
use eframe::egui::{self, Context};
use orbit_graph::{NodeId, Session, SharedSession, TickReport};

mod interaction;
mod panels;
mod render_utils;
mod view;

use render_utils::Camera;

pub(crate) fn run(session: Session, churn_per_tick: bool) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "orbit-graph",
        options,
        Box::new(move |cc| Ok(Box::new(OrbitApp::new(cc, session, churn_per_tick)))),
    )
    .map_err(|error| anyhow!("failed to start viewer: {error}"))
}

pub(crate) struct OrbitApp {
    session: SharedSession,
    churn_per_tick: bool,
    search: String,
    search_results: Vec<NodeId>,
    camera: Camera,
    dragging: Option<NodeId>,
    panning_with_primary: bool,
    fault: Option<String>,
    last_report: Option<TickReport>,
}

impl OrbitApp {
    fn new(_cc: &eframe::CreationContext<'_>, session: Session, churn_per_tick: bool) -> Self {
        Self {
            session: SharedSession::new(session),
            churn_per_tick,
            search: String::new(),
            search_results: Vec::new(),
            camera: Camera::default(),
            dragging: None,
            panning_with_primary: false,
            fault: None,
            last_report: None,
        }
    }

    fn recenter(&mut self, session: &mut Session, id: &NodeId) {
        if let Some(dragged) = self.dragging.take()
            && let Err(error) = session.end_drag(&dragged)
        {
            tracing::debug!(%error, "drag target vanished");
        }

        match session.recenter(id) {
            Ok(diff) => tracing::info!(
                center = %id,
                added = diff.added.len(),
                departed = diff.departed.len(),
                "recentered"
            ),
            Err(error) => tracing::warn!(%error, "recenter rejected"),
        }
    }
}

impl eframe::App for OrbitApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.show_top_panel(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }
}
