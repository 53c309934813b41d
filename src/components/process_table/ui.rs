use super::state::{format_run_time, ProcessTable, TableRequest};
use crate::components::settings::MemoryUnit;
use crate::process::{
    ControlAction, Priority, ProcessFilter, ProcessListing, ProcessRecord, Sort, SortKey,
};

const COLUMNS: [&str; 10] = [
    "PID", "Name", "CPU%", "Memory", "Mem%", "Status", "User", "Threads", "Handles", "Path",
];

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

fn copy_text(record: &ProcessRecord, unit: MemoryUnit) -> String {
    format!(
        "PID: {}\nName: {}\nCPU: {:.1}%\nMemory: {}",
        record.pid,
        record.name,
        record.cpu_percent,
        unit.format(record.memory_bytes)
    )
}

impl ProcessTable {
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        listing: &ProcessListing,
        filter: &mut ProcessFilter,
        unit: MemoryUnit,
    ) -> Option<TableRequest> {
        let mut request = None;

        Self::show_filter_bar(ui, filter);
        ui.label(format!(
            "Showing {} of {} matching ({} processes)",
            listing.records.len(),
            listing.matched,
            listing.total
        ));
        ui.separator();

        egui::ScrollArea::both().auto_shrink(false).show(ui, |ui| {
            egui::Grid::new("process_grid")
                .striped(true)
                .num_columns(COLUMNS.len())
                .show(ui, |ui| {
                    for column in COLUMNS {
                        ui.strong(column);
                    }
                    ui.end_row();

                    for record in &listing.records {
                        if let Some(row_request) = self.show_row(ui, record, unit) {
                            request = Some(row_request);
                        }
                        ui.end_row();
                    }
                });
        });

        if let Some(confirmed) = self.show_kill_confirmation(ui.ctx()) {
            request = Some(confirmed);
        }
        self.show_details_window(ui.ctx(), unit);

        request
    }

    fn show_filter_bar(ui: &mut egui::Ui, filter: &mut ProcessFilter) {
        ui.horizontal(|ui| {
            ui.label("Search:");
            ui.text_edit_singleline(&mut filter.name);
            if ui.small_button("❌").clicked() {
                filter.name.clear();
            }

            ui.add_space(16.0);
            ui.checkbox(&mut filter.include_hidden, "Show hidden processes");

            ui.add_space(16.0);
            let selected = filter
                .sort
                .map_or("Enumeration order", |sort| sort.key.label());
            egui::ComboBox::from_label("Sort by")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    let descending = filter.sort.is_some_and(|sort| sort.descending);
                    ui.selectable_value(&mut filter.sort, None, "Enumeration order");
                    for key in SortKey::ALL {
                        let current = filter.sort.is_some_and(|sort| sort.key == key);
                        if ui.selectable_label(current, key.label()).clicked() {
                            filter.sort = Some(Sort { key, descending });
                        }
                    }
                });
            if let Some(sort) = &mut filter.sort {
                ui.checkbox(&mut sort.descending, "Descending");
            }
        });
    }

    fn show_row(
        &mut self,
        ui: &mut egui::Ui,
        record: &ProcessRecord,
        unit: MemoryUnit,
    ) -> Option<TableRequest> {
        let mut request = None;
        let is_selected = self.selected == Some(record.pid);

        if ui.selectable_label(is_selected, record.pid.to_string()).clicked() {
            self.selected = Some(record.pid);
        }

        let response = ui.selectable_label(is_selected, record.name.as_str());
        if response.clicked() {
            self.selected = Some(record.pid);
        }
        if response.double_clicked() {
            request = Some(TableRequest::Details(record.pid));
        }
        response.context_menu(|ui| {
            self.selected = Some(record.pid);
            if let Some(menu_request) = self.show_context_menu(ui, record, unit) {
                request = Some(menu_request);
            }
        });

        ui.label(format!("{:.1}%", record.cpu_percent));
        ui.label(if record.memory_bytes > 0 {
            unit.format(record.memory_bytes)
        } else {
            "N/A".to_string()
        });
        ui.label(format!("{:.1}%", record.memory_percent));
        ui.label(record.status.as_str());
        ui.label(record.owner.as_deref().unwrap_or("System"));
        ui.label(or_na(record.thread_count));
        ui.label(or_na(record.handle_count));
        ui.label(or_na(record.executable_path.as_ref().map(|p| p.display())));

        request
    }

    fn show_context_menu(
        &mut self,
        ui: &mut egui::Ui,
        record: &ProcessRecord,
        unit: MemoryUnit,
    ) -> Option<TableRequest> {
        let control = |action| TableRequest::Control {
            pid: record.pid,
            name: record.name.clone(),
            action,
        };
        let mut request = None;

        if ui.button("Kill Process…").clicked() {
            self.confirm_kill = Some((record.pid, record.name.clone()));
            ui.close_menu();
        }
        if ui.button("Suspend").clicked() {
            request = Some(control(ControlAction::Suspend));
            ui.close_menu();
        }
        if ui.button("Resume").clicked() {
            request = Some(control(ControlAction::Resume));
            ui.close_menu();
        }
        ui.menu_button("Set Priority", |ui| {
            for priority in Priority::ALL {
                if ui.button(priority.label()).clicked() {
                    request = Some(control(ControlAction::SetPriority(priority)));
                    ui.close_menu();
                }
            }
        });
        ui.separator();
        if ui.button("Details").clicked() {
            request = Some(TableRequest::Details(record.pid));
            ui.close_menu();
        }
        if ui.button("Copy Info").clicked() {
            ui.ctx().copy_text(copy_text(record, unit));
            ui.close_menu();
        }

        request
    }

    fn show_kill_confirmation(&mut self, ctx: &egui::Context) -> Option<TableRequest> {
        let (pid, name) = self.confirm_kill.clone()?;
        let mut request = None;

        egui::Window::new("Confirm Kill Process")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!(
                    "Are you sure you want to kill '{}' (PID: {})?",
                    name, pid
                ));
                ui.horizontal(|ui| {
                    if ui.button("Kill").clicked() {
                        request = Some(TableRequest::Control {
                            pid,
                            name: name.clone(),
                            action: ControlAction::Kill,
                        });
                        self.confirm_kill = None;
                    }
                    if ui.button("Cancel").clicked() {
                        self.confirm_kill = None;
                    }
                });
            });

        request
    }

    fn show_details_window(&mut self, ctx: &egui::Context, unit: MemoryUnit) {
        let Some(details) = &self.details else {
            return;
        };
        let mut open = true;
        let record = &details.record;

        egui::Window::new(format!("Process Details - {}", record.name))
            .open(&mut open)
            .resizable(true)
            .default_size([500.0, 400.0])
            .show(ctx, |ui| {
                egui::Grid::new("process_details").num_columns(2).show(ui, |ui| {
                    let mut row = |label: &str, value: String| {
                        ui.strong(label);
                        ui.label(value);
                        ui.end_row();
                    };
                    row("PID", record.pid.to_string());
                    row("Name", record.name.clone());
                    row("Status", record.status.clone());
                    row("Parent PID", or_na(details.parent_pid));
                    row("Start Time", format!("{} (Unix time)", details.start_time));
                    row("Run Time", format_run_time(details.run_time));
                    row("CPU", format!("{:.2}%", record.cpu_percent));
                    row("Memory", unit.format(record.memory_bytes));
                    row("Memory %", format!("{:.2}%", record.memory_percent));
                    row("User", or_na(record.owner.clone()));
                    row("Threads", or_na(record.thread_count));
                    row("Handles", or_na(record.handle_count));
                    row(
                        "Executable",
                        or_na(record.executable_path.as_ref().map(|p| p.display())),
                    );
                });
                ui.separator();
                ui.strong("Command Line");
                let command_line = if details.command_line.is_empty() {
                    "N/A".to_string()
                } else {
                    details.command_line.join(" ")
                };
                ui.label(egui::RichText::new(command_line).monospace());
            });

        if !open {
            self.details = None;
        }
    }
}
