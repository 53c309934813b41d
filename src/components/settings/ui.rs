use super::state::{MemoryUnit, Settings, HISTORY_LENGTH_RANGE, INTERVAL_RANGE_MS};

pub fn show_settings_window(ctx: &egui::Context, settings: &mut Settings) {
    if !settings.is_visible() {
        return;
    }

    egui::Window::new("⚙ Settings")
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("UI Scale:");
                ui.add(egui::Slider::new(&mut settings.scale, 0.5..=2.0).step_by(0.1));
            });

            ui.horizontal(|ui| {
                ui.label("Font Size:");
                ui.add(egui::Slider::new(&mut settings.font_size, 8.0..=32.0).step_by(1.0));
            });

            ui.horizontal(|ui| {
                ui.label("Memory Unit:");
                for unit in MemoryUnit::ALL {
                    let (_, suffix) = unit.format_value(0.0);
                    ui.selectable_value(&mut settings.memory_unit, unit, suffix);
                }
            });

            ui.separator();
            ui.strong("Refresh");
            interval_slider(ui, "Display (ms):", &mut settings.consumer_interval_ms);
            interval_slider(ui, "Process list (ms):", &mut settings.process_refresh_ms);
            interval_slider(ui, "Charts (ms):", &mut settings.chart_refresh_ms);

            ui.horizontal(|ui| {
                ui.label("History points:");
                ui.add(egui::Slider::new(&mut settings.history_length, HISTORY_LENGTH_RANGE));
            });
            ui.horizontal(|ui| {
                ui.label("Max processes shown:");
                ui.add(egui::Slider::new(&mut settings.process_filter.limit, 10..=1000));
            });

            ui.separator();
            ui.strong("Sampling (applies after restart)");
            interval_slider(ui, "CPU and memory (ms):", &mut settings.sample_interval_ms);
            interval_slider(ui, "Network and disk (ms):", &mut settings.counters_interval_ms);
            ui.horizontal(|ui| {
                ui.label("Disk path:");
                let mut path = settings.disk_path.display().to_string();
                if ui.text_edit_singleline(&mut path).changed() {
                    settings.disk_path = path.into();
                }
            });

            ui.separator();

            if ui.button("Close").clicked() {
                settings.hide();
            }
        });
}

fn interval_slider(ui: &mut egui::Ui, label: &str, value: &mut u64) {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add(egui::Slider::new(value, INTERVAL_RANGE_MS).logarithmic(true));
    });
}
