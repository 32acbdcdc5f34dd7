use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Paths {
    pub base: PathBuf,
}

impl Paths {
    pub fn new() -> Self {
        let base = dirs::home_dir()
            .map(|h| h.join(".taskwatch"))
            .unwrap_or_else(|| PathBuf::from(".taskwatch"));
        Self { base }
    }

    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.json")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.base.join("state")
    }

    pub fn notified_file(&self) -> PathBuf {
        self.state_dir().join("notified.json")
    }

    pub fn history_file(&self) -> PathBuf {
        self.state_dir().join("history.json")
    }

    /// User data directory for a managed browser launch.
    pub fn profile_dir(&self) -> PathBuf {
        self.base.join("profile")
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.base)?;
        std::fs::create_dir_all(self.state_dir())?;
        std::fs::create_dir_all(self.profile_dir())?;
        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}
