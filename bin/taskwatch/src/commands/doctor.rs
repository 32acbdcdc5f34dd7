use taskwatch_browser::chrome::{self, find_browser_binary, BrowserEngine};
use taskwatch_core::{Config, Paths};

pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();

    println!("taskwatch doctor");
    println!("================");
    println!();

    // Config
    let config_path = paths.config_file();
    if config_path.exists() {
        println!("Config:          ✓ {}", config_path.display());
    } else {
        println!("Config:          ✗ not found (run `taskwatch onboard`)");
    }
    let config = Config::load_or_default(&paths)?;

    // Tracker target
    if config.tracker.url_match.is_empty() {
        println!("Tracker:         ✗ tracker.urlMatch not set");
    } else {
        println!("Tracker:         ✓ \"{}\"", config.tracker.url_match);
    }

    // Browser binary
    let engine = BrowserEngine::from_str(&config.browser.engine);
    match find_browser_binary(engine) {
        Some(path) => println!("Browser binary:  ✓ {}", path),
        None => println!("Browser binary:  ✗ {} not found", engine.name()),
    }

    // CDP endpoint
    match chrome::probe(config.browser.debug_port).await {
        Ok(product) => println!(
            "CDP endpoint:    ✓ {} on port {}",
            product, config.browser.debug_port
        ),
        Err(_) => {
            println!(
                "CDP endpoint:    ✗ nothing listening on port {}",
                config.browser.debug_port
            );
            if config.browser.auto_launch {
                println!("                 (a managed browser will be launched by `taskwatch run`)");
            }
        }
    }

    // State files
    for (label, path) in [
        ("Notified state", paths.notified_file()),
        ("Task history", paths.history_file()),
    ] {
        if path.exists() {
            println!("{:<16} ✓ {}", format!("{}:", label), path.display());
        } else {
            println!("{:<16} - {} (will be created)", format!("{}:", label), path.display());
        }
    }

    Ok(())
}
