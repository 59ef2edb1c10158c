use {anyhow::Result, clap::Subcommand, parley_config::ParleyConfig};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration (file, env and flags applied) as TOML.
    Show,
    /// Print the user-global config directory.
    Path,
}

pub fn handle_config(action: ConfigAction, config: &ParleyConfig) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", parley_config::to_toml_string(config)?);
        },
        ConfigAction::Path => match parley_config::config_dir() {
            Some(dir) => println!("{}", dir.display()),
            None => eprintln!("no home directory found; only ./parley.toml is searched"),
        },
    }
    Ok(())
}
