use dotenv::var;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn config_path() -> PathBuf {
    var("HEARTH_CONFIG")
        .unwrap_or_else(|_| "panel.json".to_string())
        .into()
}

/// Persistent panel settings, kept as JSON next to the binary (or wherever
/// `HEARTH_CONFIG` points).
#[derive(Serialize, Deserialize, Debug)]
pub struct Config {
    /// Key sequence that unlocks the panel.
    pub code: String,
}

impl Config {
    pub fn try_load() -> Option<Self> {
        Self::load_from(&config_path())
    }

    fn load_from(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let file = std::fs::File::open(path).ok()?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader).ok()
    }

    pub fn save(&self) -> std::io::Result<()> {
        let file = std::fs::File::create(config_path())?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            code: "1234".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let config = Config {
            code: "8427".to_string(),
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code, "8427");
    }

    #[test]
    fn missing_file_is_none() {
        assert!(Config::load_from(Path::new("does-not-exist.json")).is_none());
    }
}
