//! Line-oriented session scripts.
//!
//! One command per line; blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! focus
//! type cache
//! wait 250
//! down
//! enter
//! ```

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use upstatic_suggest::Key;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Key(Key),
    Wait(Duration),
    Focus,
    Blur,
    Hover(usize),
    Unhover(usize),
    Click(usize),
}

impl Step {
    /// Short label used when echoing the step.
    pub fn label(&self) -> String {
        match self {
            Step::Key(Key::Input(text)) => format!("type {text}"),
            Step::Key(key) => format!("{key:?}").to_ascii_lowercase(),
            Step::Wait(duration) => format!("wait {}", duration.as_millis()),
            Step::Focus => "focus".to_owned(),
            Step::Blur => "blur".to_owned(),
            Step::Hover(index) => format!("hover {index}"),
            Step::Unhover(index) => format!("unhover {index}"),
            Step::Click(index) => format!("click {index}"),
        }
    }
}

pub fn parse(text: &str) -> Result<Vec<Step>> {
    let mut steps = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let step = parse_line(line).with_context(|| format!("script line {}", lineno + 1))?;
        steps.push(step);
    }
    Ok(steps)
}

fn parse_line(line: &str) -> Result<Step> {
    let trimmed = line.trim_start();
    let (command, rest) = match trimmed.split_once(' ') {
        Some((command, rest)) => (command, rest),
        None => (trimmed.trim_end(), ""),
    };

    let step = match command {
        // Everything after `type ` is the raw input value, spaces included.
        "type" => Step::Key(Key::Input(rest.to_owned())),
        "down" => Step::Key(Key::ArrowDown),
        "up" => Step::Key(Key::ArrowUp),
        "left" => Step::Key(Key::ArrowLeft),
        "right" => Step::Key(Key::ArrowRight),
        "enter" => Step::Key(Key::Enter),
        "esc" | "escape" => Step::Key(Key::Escape),
        "tab" => Step::Key(Key::Tab),
        "shift" => Step::Key(Key::Shift),
        "alt" => Step::Key(Key::Alt),
        "wait" => Step::Wait(Duration::from_millis(number(rest, "wait")?)),
        "focus" => Step::Focus,
        "blur" => Step::Blur,
        "hover" => Step::Hover(number(rest, "hover")?),
        "unhover" => Step::Unhover(number(rest, "unhover")?),
        "click" => Step::Click(number(rest, "click")?),
        other => bail!("unknown command `{other}`"),
    };
    Ok(step)
}

fn number<T: std::str::FromStr>(arg: &str, command: &str) -> Result<T> {
    let arg = arg.trim();
    if arg.is_empty() {
        bail!("`{command}` needs a numeric argument");
    }
    arg.parse()
        .map_err(|_| anyhow!("`{command}` argument `{arg}` is not a number"))
}
