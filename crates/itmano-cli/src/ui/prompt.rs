use std::io::{self, Write};

use anyhow::Result;

/// Prompt for a line of input, offering `default` when given
pub fn prompt_line(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) if !d.is_empty() => print!("{} [{}]: ", label, d),
        _ => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(input.to_string())
    }
}

pub fn prompt_password(label: &str) -> Result<String> {
    let password = rpassword::prompt_password(format!("{}: ", label))?;
    Ok(password)
}
