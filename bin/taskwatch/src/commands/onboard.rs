use taskwatch_core::{Config, Paths};

pub async fn run(force: bool) -> anyhow::Result<()> {
    let paths = Paths::new();
    paths.ensure_dirs()?;

    let config_path = paths.config_file();
    if config_path.exists() && !force {
        println!("Config already exists at {}", config_path.display());
        println!("Use `taskwatch onboard --force` to overwrite it.");
        return Ok(());
    }

    let config = Config::default();
    config.save(&config_path)?;

    println!("taskwatch initialized");
    println!("=====================");
    println!();
    println!("Config:  {}", config_path.display());
    println!("State:   {}", paths.state_dir().display());
    println!();
    println!("Next steps:");
    println!("  1. Edit the config and set tracker.urlMatch to a substring of");
    println!("     your tracker page URL; that marks the tab to watch.");
    println!("  2. Start your browser with --remote-debugging-port=9222 (or let");
    println!("     taskwatch launch a managed one).");
    println!("  3. Run `taskwatch doctor` to verify the environment.");
    println!("  4. Run `taskwatch run` to start watching.");

    Ok(())
}
