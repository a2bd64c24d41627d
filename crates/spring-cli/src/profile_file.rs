//! Reference profile files.
//!
//! `.toml` and `.json` files carry `{ id, samples }`. Anything else is plain
//! text: numbers separated by commas or whitespace, `#` comments allowed.
//! Plain text has no id of its own.

use std::path::Path;

use anyhow::{Context, Result, bail};
use spring_core::Profile;

/// Read a profile. `id` overrides the file's id; plain text without an
/// override gets id 0 unless `require_id` is set.
pub fn read_profile(path: &Path, id: Option<u32>, require_id: bool) -> Result<Profile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile {}", path.display()))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let profile = match ext {
        "toml" => toml::from_str::<Profile>(&content)
            .with_context(|| format!("invalid TOML profile {}", path.display()))?,
        "json" => serde_json::from_str::<Profile>(&content)
            .with_context(|| format!("invalid JSON profile {}", path.display()))?,
        _ => {
            if id.is_none() && require_id {
                bail!("{} is a plain-text profile; pass --id", path.display());
            }
            let samples = parse_plain(&content)
                .with_context(|| format!("invalid profile {}", path.display()))?;
            return Ok(Profile::new(id.unwrap_or(0), samples)?);
        }
    };

    match id {
        Some(id) if id != profile.id() => Ok(Profile::new(id, profile.samples().to_vec())?),
        _ => Ok(profile),
    }
}

fn parse_plain(content: &str) -> Result<Vec<f64>> {
    let mut samples = Vec::new();
    for (n, line) in content.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("");
        for token in line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let value: f64 = token
                .parse()
                .with_context(|| format!("line {}: '{token}' is not a number", n + 1))?;
            samples.push(value);
        }
    }
    Ok(samples)
}
