mod access;
mod admin;
mod check;
mod commands;
mod group;
pub mod pickers;
mod share;
mod user;

pub use access::{run_access_set, run_access_show};
pub use admin::run_init;
pub use check::{run_check_file, run_check_group, run_check_share};
pub use commands::{
    AccessCommands, AdminCommands, CheckCommands, DataArgs, GroupCommands, ShareCommands,
    UserCommands,
};
pub use group::{
    run_group_add_member, run_group_create, run_group_list, run_group_members,
    run_group_remove_member,
};
pub use share::{run_share_add, run_share_list, run_share_remove};
pub use user::{run_user_add, run_user_list, run_user_remove, run_user_rotate_key};

use std::path::PathBuf;

use crate::config::CoreConfig;
use crate::engine::Engine;
use crate::types::Group;

/// Actor recorded in audit events for changes made from the command line.
pub const CLI_ACTOR: &str = "cli";

/// Builds the config from file, environment and command-line flags, in that order.
pub fn load_config(data: &DataArgs) -> anyhow::Result<CoreConfig> {
    let mut config = CoreConfig::load(data.config.as_deref())?;

    if let Some(dir) = &data.data_dir {
        config.data_dir = PathBuf::from(dir);
        if data.storage_dir.is_none() {
            config.storage_dir = config.data_dir.join("storage");
        }
    }
    if let Some(dir) = &data.storage_dir {
        config.storage_dir = PathBuf::from(dir);
    }

    Ok(config)
}

/// Opens the engine over an initialized data directory.
pub fn init_engine(data: &DataArgs) -> anyhow::Result<Engine> {
    let config = load_config(data)?;

    if !config.data_dir.exists() {
        anyhow::bail!(
            "Data directory not found at {}. Run 'lunatransfer admin init' first.",
            config.data_dir.display()
        );
    }

    if config.session.secret.is_none() && !config.secret_path().exists() {
        anyhow::bail!(
            "Session secret not found at {}. Run 'lunatransfer admin init' first.",
            config.secret_path().display()
        );
    }

    Engine::open(&config).map_err(Into::into)
}

/// Finds a group by ID, falling back to its name.
pub fn resolve_group(engine: &Engine, id_or_name: &str) -> anyhow::Result<Group> {
    engine
        .groups()
        .get_group(id_or_name)
        .or_else(|| engine.groups().get_group_by_name(id_or_name))
        .ok_or_else(|| anyhow::anyhow!("Group '{id_or_name}' not found"))
}
