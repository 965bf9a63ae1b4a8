// src/services/report.rs
use crate::models::FinalReturn;

pub const SEPARATOR_WIDTH: usize = 60;
pub const CAPTION: &str = "STOPY ZWROTU - 1 ROK:";

pub fn separator() -> String {
    "=".repeat(SEPARATOR_WIDTH)
}

pub fn report_row(fr: &FinalReturn) -> String {
    format!("{:<10} ({:<12}): {:+7.2}%", fr.ticker, fr.color.name(), fr.value)
}

/// Separator, one row per ticker, separator.
pub fn report_lines(finals: &[FinalReturn]) -> Vec<String> {
    let mut lines = Vec::with_capacity(finals.len() + 2);
    lines.push(separator());
    lines.extend(finals.iter().map(report_row));
    lines.push(separator());
    lines
}

/// What goes to stdout: separator and caption, then the report block.
pub fn console_lines(finals: &[FinalReturn]) -> Vec<String> {
    let mut lines = vec![separator(), CAPTION.to_string()];
    lines.extend(report_lines(finals));
    lines
}

pub fn print_report(finals: &[FinalReturn]) {
    println!();
    for line in console_lines(finals) {
        println!("{}", line);
    }
    println!();
}
