//! Plan preview and the confirmation prompt.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::organize::MovePlan;

/// Marker between source and destination in the preview.
pub const ARROW: &str = "> ";

/// Render one line per move: source, `-` padding, arrow, destination.
///
/// Padding brings every arrow to at least the longest source path plus two characters.
#[must_use]
pub fn render(plan: &MovePlan) -> String {
    let sources: Vec<String> = plan
        .records()
        .iter()
        .map(|record| record.source.display().to_string())
        .collect();
    let width = sources.iter().map(|s| s.chars().count()).max().unwrap_or_default() + ARROW.len();

    let mut text = String::new();
    for (source, record) in sources.iter().zip(plan.records()) {
        let padding = width - source.chars().count();
        text.push_str(source);
        text.push_str(&"-".repeat(padding));
        text.push_str(ARROW);
        text.push_str(&record.destination.display().to_string());
        text.push('\n');
    }
    text
}

/// Ask for confirmation until the answer is exactly `y` or `N`.
///
/// With `auto` set, returns `true` without touching `input` or `output`.
///
/// # Errors
/// Returns an error if reading input fails or input ends before an answer is given.
pub fn confirm<R: BufRead, W: Write>(auto: bool, mut input: R, mut output: W) -> Result<bool> {
    if auto {
        return Ok(true);
    }

    let mut line = String::new();
    loop {
        writeln!(output, "Move files? y/N")?;
        output.flush()?;
        line.clear();
        let read = input.read_line(&mut line).context("Failed to read confirmation")?;
        if read == 0 {
            anyhow::bail!("Input closed before confirmation");
        }
        match line.trim() {
            "y" => return Ok(true),
            "N" => return Ok(false),
            _ => {
                writeln!(output, "Unknown response, please enter 'y' or 'N'")?;
                output.flush()?;
            }
        }
    }
}
