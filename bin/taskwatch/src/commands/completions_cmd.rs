use clap_complete::{generate, Shell};

/// Generate shell completion scripts.
///
/// A minimal CLI definition is re-created here to generate completions
/// without a circular dependency on the main Cli struct.
pub fn run(shell: &str) -> anyhow::Result<()> {
    let shell = match shell.to_lowercase().as_str() {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "powershell" | "ps" => Shell::PowerShell,
        "elvish" => Shell::Elvish,
        _ => {
            anyhow::bail!(
                "Unsupported shell: {}. Options: bash, zsh, fish, powershell, elvish",
                shell
            );
        }
    };

    let mut cmd = build_cli();
    generate(shell, &mut cmd, "taskwatch", &mut std::io::stdout());
    Ok(())
}

/// Build a minimal CLI definition for completion generation.
fn build_cli() -> clap::Command {
    clap::Command::new("taskwatch")
        .about("Watch a task tracker tab and get notified about new tasks")
        .subcommand(clap::Command::new("onboard").about("Initialize configuration"))
        .subcommand(clap::Command::new("status").about("Show watcher status"))
        .subcommand(clap::Command::new("run").about("Run the watcher daemon"))
        .subcommand(clap::Command::new("scan").about("Refresh and scan once"))
        .subcommand(clap::Command::new("history").about("Show recently found tasks"))
        .subcommand(clap::Command::new("clear").about("Clear the notification history"))
        .subcommand(clap::Command::new("test-notify").about("Send a test notification"))
        .subcommand(clap::Command::new("doctor").about("Run environment diagnostics"))
        .subcommand(clap::Command::new("completions").about("Generate shell completions"))
}
