//! Terminal rendering of charts as horizontal bars

use super::{Chart, Comparison, Distribution, Histogram};
use colored::*;

/// Width in cells of the longest bar
pub const BAR_WIDTH: usize = 40;

fn bar_len(value: f64, max: f64, width: usize) -> usize {
    if max <= 0.0 || value <= 0.0 {
        return 0;
    }
    ((value / max) * width as f64).round() as usize
}

fn bar(len: usize, color: (u8, u8, u8)) -> ColoredString {
    "█".repeat(len).truecolor(color.0, color.1, color.2)
}

fn title(text: &str) -> String {
    format!("{}", text.white().bold())
}

pub fn histogram(hist: &Histogram) -> Vec<String> {
    let mut lines = vec![title(&format!("{} ({} bins)", hist.column, hist.bins.len()))];
    let max = hist.max_count() as f64;

    for b in &hist.bins {
        let range = format!("{:>8.2} – {:<8.2}", b.lower, b.upper);
        lines.push(format!(
            "{} {} {}",
            range.truecolor(140, 140, 140),
            bar(bar_len(b.count as f64, max, BAR_WIDTH), (120, 170, 255)),
            b.count
        ));
    }
    lines
}

pub fn distribution(dist: &Distribution) -> Vec<String> {
    let mut lines = vec![title(&dist.column)];
    let max = dist.max_count() as f64;
    let label_width = dist.categories.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);

    for (label, count) in &dist.categories {
        lines.push(format!(
            "{:<width$} {} {}",
            label,
            bar(bar_len(*count as f64, max, BAR_WIDTH), (100, 210, 120)),
            count,
            width = label_width
        ));
    }
    lines
}

/// Two bars, predicted above actual, both values to two decimals
pub fn comparison(cmp: &Comparison) -> Vec<String> {
    let max = cmp.predicted.abs().max(cmp.actual.abs());
    vec![
        title(&format!("Student {}", cmp.student_id)),
        format!(
            "{:<10} {} {:.2}",
            "Predicted",
            bar(bar_len(cmp.predicted.abs(), max, BAR_WIDTH), (120, 170, 255)),
            cmp.predicted
        ),
        format!(
            "{:<10} {} {:.2}",
            "Actual",
            bar(bar_len(cmp.actual.abs(), max, BAR_WIDTH), (230, 160, 90)),
            cmp.actual
        ),
    ]
}

pub fn chart(chart: &Chart) -> Vec<String> {
    match chart {
        Chart::Histogram(h) => histogram(h),
        Chart::Distribution(d) => distribution(d),
    }
}
