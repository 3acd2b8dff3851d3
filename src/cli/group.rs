use crate::types::GroupRole;

use super::pickers::{print_groups_list, print_members_list};
use super::{CLI_ACTOR, DataArgs, init_engine, resolve_group};

pub fn run_group_create(
    data: DataArgs,
    name: String,
    description: String,
    owner: String,
) -> anyhow::Result<()> {
    let engine = init_engine(&data)?;

    if !engine.credentials().user_exists(&owner) {
        anyhow::bail!("User '{owner}' not found");
    }

    let group = engine.groups().create_group(&name, &description, &owner)?;

    println!();
    println!("Created group \"{}\" ({})", group.name, group.id);
    println!("  {owner} is the group admin");
    println!();

    Ok(())
}

pub fn run_group_add_member(
    data: DataArgs,
    group: String,
    username: String,
    role: String,
) -> anyhow::Result<()> {
    let engine = init_engine(&data)?;
    let group = resolve_group(&engine, &group)?;

    let role = GroupRole::coerce(&role);
    engine
        .groups()
        .add_member(&group.id, &username, role, CLI_ACTOR)?;

    println!("Added {username} to \"{}\" as {role}", group.name);
    Ok(())
}

pub fn run_group_remove_member(data: DataArgs, group: String, username: String) -> anyhow::Result<()> {
    let engine = init_engine(&data)?;
    let group = resolve_group(&engine, &group)?;

    engine
        .groups()
        .remove_member(&group.id, &username, CLI_ACTOR)?;

    println!("Removed {username} from \"{}\"", group.name);
    Ok(())
}

pub fn run_group_members(data: DataArgs, group: String, json: bool) -> anyhow::Result<()> {
    let engine = init_engine(&data)?;
    let group = resolve_group(&engine, &group)?;
    let members = engine.groups().list_members(&group.id);

    if json {
        println!("{}", serde_json::to_string_pretty(&members)?);
    } else {
        print_members_list(&members);
    }
    Ok(())
}

pub fn run_group_list(data: DataArgs, user: Option<String>, json: bool) -> anyhow::Result<()> {
    let engine = init_engine(&data)?;

    let groups = match user {
        Some(username) => engine.groups().list_groups_for_user(&username),
        None => engine.groups().list_groups(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
    } else {
        print_groups_list(groups);
    }
    Ok(())
}
