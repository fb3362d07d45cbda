//! Chart export for a finished run.
//!
//! Consumes the frozen metrics ledger and renders PNGs with plotters. All
//! functions are read-only over the ledger; nothing here feeds back into a
//! simulation.

use std::error::Error;

use plotters::prelude::*;

use crate::engine::metrics::MetricsLedger;

const SERIES_COLORS: [RGBColor; 6] = [BLUE, RED, GREEN, MAGENTA, CYAN, BLACK];

/// Average wait per tick, one line per ledger (e.g. adaptive vs baseline).
pub fn wait_time_chart(
    path: &str,
    runs: &[(&str, &MetricsLedger)],
) -> Result<(), Box<dyn Error>> {
    let max_ticks = runs
        .iter()
        .map(|(_, l)| l.ticks_recorded())
        .max()
        .unwrap_or(0);
    let max_wait = runs
        .iter()
        .flat_map(|(_, l)| l.avg_wait_series().iter().copied())
        .fold(1.0_f64, f64::max);

    let backend = BitMapBackend::new(path, (800, 600));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Average Vehicle Wait per Tick", ("sans-serif", 20))
        .margin(40)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0..max_ticks, 0.0..max_wait * 1.1)?;

    chart.configure_mesh().draw()?;
    for (i, (label, ledger)) in runs.iter().enumerate() {
        let color = SERIES_COLORS[i % SERIES_COLORS.len()];
        chart
            .draw_series(LineSeries::new(
                ledger
                    .avg_wait_series()
                    .iter()
                    .enumerate()
                    .map(|(tick, &w)| (tick, w)),
                &color,
            ))?
            .label(*label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    log::info!("wait-time chart saved to {}", path);
    Ok(())
}

/// Per-zone fairness index over the run, one line per zone.
pub fn fairness_chart(path: &str, ledger: &MetricsLedger) -> Result<(), Box<dyn Error>> {
    let ticks = ledger.ticks_recorded();

    let backend = BitMapBackend::new(path, (800, 600));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Zone Fairness Index per Tick", ("sans-serif", 20))
        .margin(40)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0..ticks, 0.0..1.05_f64)?;

    chart.configure_mesh().draw()?;
    for (i, (zone, series)) in ledger.fairness_per_zone().iter().enumerate() {
        let color = SERIES_COLORS[i % SERIES_COLORS.len()];
        chart
            .draw_series(LineSeries::new(
                series.iter().enumerate().map(|(tick, &f)| (tick, f)),
                &color,
            ))?
            .label(format!("zone {}", zone.0))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    log::info!("fairness chart saved to {}", path);
    Ok(())
}

/// Grid heatmap of average wait per intersection over the whole run. Cell
/// shading scales from white (idle) to red (busiest intersection).
pub fn congestion_heatmap(path: &str, ledger: &MetricsLedger) -> Result<(), Box<dyn Error>> {
    let averages: Vec<((i8, i8), f64)> = ledger
        .intersection_waits()
        .iter()
        .map(|(id, series)| {
            let avg = if series.is_empty() {
                0.0
            } else {
                series.iter().map(|&w| f64::from(w)).sum::<f64>() / series.len() as f64
            };
            ((id.0, id.1), avg)
        })
        .collect();
    let max_avg = averages.iter().map(|&(_, a)| a).fold(1.0_f64, f64::max);
    let rows = averages.iter().map(|&((r, _), _)| r).max().unwrap_or(0) as i32 + 1;
    let cols = averages.iter().map(|&((_, c), _)| c).max().unwrap_or(0) as i32 + 1;

    let (cell_width, cell_height) = (100, 100);
    let backend = BitMapBackend::new(
        path,
        ((cols * cell_width) as u32, (rows * cell_height) as u32),
    );
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;

    for ((row, col), avg) in averages {
        let heat = avg / max_avg;
        let green_blue = (255.0 * (1.0 - heat)).round() as u8;
        let fill_color = RGBColor(255, green_blue, green_blue);

        let x0 = i32::from(col) * cell_width;
        let y0 = i32::from(row) * cell_height;
        root.draw(&Rectangle::new(
            [(x0, y0), (x0 + cell_width, y0 + cell_height)],
            fill_color.filled(),
        ))?;
        root.draw(&Rectangle::new(
            [(x0, y0), (x0 + cell_width, y0 + cell_height)],
            &BLACK,
        ))?;

        let text = format!("({},{}) {:.1}", row, col, avg);
        root.draw(&Text::new(
            text,
            (x0 + 8, y0 + cell_height / 2),
            ("sans-serif", 14).into_font(),
        ))?;
    }

    root.present()?;
    log::info!("congestion heatmap saved to {}", path);
    Ok(())
}
