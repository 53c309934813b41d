use crate::components::{format_rate, metric_plot, settings::MemoryUnit, stats_view};
use crate::presenter::{ChartSnapshot, DisplayState};

const PLOT_HEIGHT: f32 = 120.0;

pub fn show_performance(
    ui: &mut egui::Ui,
    display: &DisplayState,
    charts: &ChartSnapshot,
    process_count: usize,
) {
    ui.group(|ui| {
        ui.heading("Overview");
        ui.horizontal(|ui| {
            overview(ui, "CPU", format!("{:.1}%", display.cpu_percent));
            overview(ui, "Memory", format!("{:.1}%", display.memory_percent));
            overview(
                ui,
                "Network",
                display
                    .network_kbps
                    .map(format_rate)
                    .unwrap_or_else(|| "N/A".to_string()),
            );
            overview(
                ui,
                "Disk",
                display
                    .disk_percent
                    .map(|v| format!("{v:.1}%"))
                    .unwrap_or_else(|| "N/A".to_string()),
            );
        });
        ui.label(format!(
            "Memory: {} / {}",
            MemoryUnit::Gigabytes.format(display.memory_used_bytes),
            MemoryUnit::Gigabytes.format(display.memory_total_bytes)
        ));
    });

    egui::ScrollArea::vertical().show(ui, |ui| {
        ui.columns(2, |columns| {
            chart(&mut columns[0], "CPU", &charts.cpu, charts.capacity, Some(100.0), |v| {
                format!("{v:.1}%")
            });
            chart(&mut columns[1], "Memory", &charts.memory, charts.capacity, Some(100.0), |v| {
                format!("{v:.1}%")
            });
        });
        ui.columns(2, |columns| {
            chart(&mut columns[0], "Network", &charts.network, charts.capacity, None, format_rate);
            chart(&mut columns[1], "Disk", &charts.disk, charts.capacity, Some(100.0), |v| {
                format!("{v:.1}%")
            });
        });

        ui.separator();
        ui.heading("Statistics");
        stats_view::show_history_stats(ui, charts, process_count);
    });
}

fn overview(ui: &mut egui::Ui, name: &str, value: String) {
    ui.vertical(|ui| {
        ui.label(name);
        ui.heading(value);
    });
    ui.add_space(24.0);
}

fn chart(
    ui: &mut egui::Ui,
    name: &str,
    history: &[f32],
    capacity: usize,
    y_max: Option<f64>,
    format: impl Fn(f32) -> String,
) {
    match history.last() {
        Some(last) => ui.label(format!("{}: {}", name, format(*last))),
        None => ui.label(name),
    };
    metric_plot(ui, format!("{name}_plot"), PLOT_HEIGHT, history, capacity, y_max);
}
