use loginguard::settings::*;

// $ cargo run --bin settings_demo -- --settings=settings/dev.toml
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let project_settings = parse_settings(cli.settings.as_deref())?;
    println!("Loaded settings: {:#?}", project_settings);

    let policy = project_settings.lockout;
    for lockout_count in 1..=6 {
        println!(
            "lockout #{} -> {} minute(s)",
            lockout_count,
            policy.lockout_minutes(lockout_count)
        );
    }

    Ok(())
}
