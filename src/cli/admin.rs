use inquire::Confirm;

use crate::engine::Engine;
use crate::types::GlobalRole;

use super::pickers::{prompt_password, prompt_username};
use super::{DataArgs, load_config};

pub fn run_init(
    data: DataArgs,
    username: Option<String>,
    password: Option<String>,
    email: String,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let config = load_config(&data)?;
    config.layout().ensure_dirs()?;

    let secret_path = config.secret_path();
    if config.session.secret.is_none() {
        if config.ensure_secret_file()? {
            println!();
            println!("Session secret written to: {}", secret_path.display());
        } else {
            println!();
            println!("Using existing session secret at: {}", secret_path.display());
        }
    }

    let engine = Engine::open(&config)?;

    if engine
        .credentials()
        .list_users()
        .iter()
        .any(|u| u.role.is_admin())
    {
        anyhow::bail!(
            "Already initialized. An admin user exists in {}",
            config.data_dir.display()
        );
    }

    let username = match username {
        Some(name) => name,
        None if non_interactive => {
            println!("Initialized {} without an admin user.", config.data_dir.display());
            println!();
            return Ok(());
        }
        None => {
            let create = Confirm::new("Would you like to create an admin user?")
                .with_default(true)
                .prompt()?;
            if !create {
                return Ok(());
            }
            prompt_username()?
        }
    };

    let password = match password {
        Some(p) => p,
        None if non_interactive => {
            anyhow::bail!("--password is required with --username in non-interactive mode")
        }
        None => prompt_password()?,
    };

    let (user, api_key) = engine
        .credentials()
        .create_user(&username, &password, &email, GlobalRole::Admin)?;

    println!();
    println!("========================================");
    println!("Created admin '{}'. API credential (keep this secure):", user.username);
    println!();
    println!("  {api_key}");
    println!();
    println!("========================================");
    println!();

    Ok(())
}
