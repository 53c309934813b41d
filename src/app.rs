use std::time::Instant;

use log::{error, warn};

use crate::components::process_table::{ProcessTable, TableRequest};
use crate::components::settings::{show_settings_window, MemoryUnit, Settings};
use crate::components::{format_rate, performance_view};
use crate::metrics::{feed, Sampler, SamplerHandle, SharedHistory, SysinfoSource};
use crate::presenter::Presenter;
use crate::process::{ProcessController, ProcessMonitor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Processes,
    Performance,
}

pub struct TaskManagerApp {
    presenter: Presenter<ProcessMonitor>,
    controller: ProcessController,
    settings: Settings,
    process_table: ProcessTable,
    tab: Tab,
    status: String,
    // Dropped last so the sampler stops after the presenter is gone
    _sampler: Option<SamplerHandle>,
}

impl TaskManagerApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Load previous settings (if any).
        // Note that you must enable the `persistence` feature for this to work.
        let settings: Settings = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();

        Self::with_settings(settings)
    }

    pub fn with_settings(settings: Settings) -> Self {
        let history = SharedHistory::new(settings.history_length());
        let (tx, rx) = feed();

        let sampler = Sampler::new(SysinfoSource::new(), settings.sampler_config());
        let (sampler, status) = match sampler.spawn(history.clone(), tx) {
            Ok(handle) => (Some(handle), "Monitoring started".to_string()),
            Err(err) => {
                error!("Failed to start sampler thread: {}", err);
                (None, format!("Sampling unavailable: {err}"))
            }
        };

        let mut presenter = Presenter::new(
            rx,
            history,
            ProcessMonitor::new(),
            &settings.presenter_config(),
            Instant::now(),
        );
        presenter.set_filter(settings.process_filter.clone());

        Self {
            presenter,
            controller: ProcessController::new(),
            settings,
            process_table: ProcessTable::default(),
            tab: Tab::Processes,
            status,
            _sampler: sampler,
        }
    }

    fn apply_settings(&mut self) {
        self.presenter
            .set_config(&self.settings.presenter_config(), Instant::now());
        self.presenter.set_filter(self.settings.process_filter.clone());
        let history_length = self.settings.history_length();
        if self.presenter.history().read().capacity() != history_length {
            self.presenter.resize_history(history_length);
        }
    }

    fn handle_request(&mut self, request: TableRequest) {
        match request {
            TableRequest::Control { pid, name, action } => {
                self.status = match self.controller.apply(pid, action) {
                    Ok(()) => format!("{} '{}' (PID {}): done", action.label(), name, pid),
                    Err(err) => {
                        warn!("{} '{}' failed: {}", action.label(), name, err);
                        format!("{} '{}' failed: {}", action.label(), name, err)
                    }
                };
            }
            TableRequest::Details(pid) => {
                match self.presenter.processes_mut().details(pid) {
                    Some(details) => self.process_table.details = Some(details),
                    None => self.status = format!("Process not found (PID {pid})"),
                }
            }
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("View", |ui| {
                let mut auto_refresh = self.presenter.auto_refresh();
                if ui.checkbox(&mut auto_refresh, "Auto Refresh").changed() {
                    self.presenter.set_auto_refresh(auto_refresh);
                }
                ui.checkbox(
                    &mut self.settings.process_filter.include_hidden,
                    "Show Hidden Processes",
                );
                ui.separator();
                if ui.button("Refresh Now").clicked() {
                    self.presenter.force_refresh();
                    self.status = "Data refreshed manually".to_string();
                    ui.close_menu();
                }
                if ui.button("Clear Performance History").clicked() {
                    self.presenter.clear_history();
                    self.status = "Performance history cleared".to_string();
                    ui.close_menu();
                }
            });

            ui.add_space(16.0);
            egui::widgets::global_theme_preference_buttons(ui);

            ui.add_space(16.0);
            if ui.button("⚙").clicked() {
                self.settings.show();
            }

            ui.add_space(16.0);
            ui.selectable_value(&mut self.tab, Tab::Processes, "Processes");
            ui.selectable_value(&mut self.tab, Tab::Performance, "Performance");
        });
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        let display = self.presenter.display();
        ui.horizontal(|ui| {
            ui.label(self.status.as_str());
            ui.separator();
            ui.label(format!(
                "Memory: {}/{} | CPU: {:.1}%",
                MemoryUnit::Gigabytes.format(display.memory_used_bytes),
                MemoryUnit::Gigabytes.format(display.memory_total_bytes),
                display.cpu_percent
            ));
            if let Some(kbps) = display.network_kbps {
                ui.separator();
                ui.label(format!("Network: {}", format_rate(kbps)));
            }
            ui.separator();
            ui.label(format!("Processes: {}", self.presenter.listing().total));
        });
    }
}

impl eframe::App for TaskManagerApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.settings);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.settings.apply(ctx);

        let now = Instant::now();
        self.presenter.poll(now);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            self.menu_bar(ctx, ui);
        });

        show_settings_window(ctx, &mut self.settings);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.status_bar(ui);
        });

        let mut request = None;
        egui::CentralPanel::default().show(ctx, |ui| match self.tab {
            Tab::Processes => {
                ui.heading("Processes");
                request = self.process_table.show(
                    ui,
                    self.presenter.listing(),
                    &mut self.settings.process_filter,
                    self.settings.memory_unit,
                );
            }
            Tab::Performance => {
                ui.heading("Performance");
                performance_view::show_performance(
                    ui,
                    self.presenter.display(),
                    self.presenter.charts(),
                    self.presenter.listing().total,
                );
            }
        });

        if let Some(request) = request {
            self.handle_request(request);
        }
        self.apply_settings();

        ctx.request_repaint_after(self.presenter.next_wakeup(Instant::now()));
    }
}
