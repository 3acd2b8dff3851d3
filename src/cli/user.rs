use crate::types::GlobalRole;

use super::pickers::{confirm_action, get_or_pick_username, print_users_list, prompt_password, prompt_username};
use super::{CLI_ACTOR, DataArgs, init_engine};

pub fn run_user_add(
    data: DataArgs,
    username: Option<String>,
    password: Option<String>,
    email: String,
    role: String,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let engine = init_engine(&data)?;

    let Some(role) = GlobalRole::parse(&role) else {
        anyhow::bail!("Unknown role '{role}'. Expected admin, user or guest.");
    };

    let username = match username {
        Some(name) => name,
        None if non_interactive => anyhow::bail!("--username is required in non-interactive mode"),
        None => prompt_username()?,
    };

    let password = match password {
        Some(p) => p,
        None if non_interactive => anyhow::bail!("--password is required in non-interactive mode"),
        None => prompt_password()?,
    };

    let (user, api_key) = engine
        .credentials()
        .create_user(&username, &password, &email, role)?;

    println!();
    println!("Created user \"{}\" with role {}", user.username, user.role);
    println!("API credential: {api_key}");
    println!("  Keep this secure. Use 'user rotate-key' to replace it.");
    println!();

    Ok(())
}

pub fn run_user_remove(
    data: DataArgs,
    username: Option<String>,
    non_interactive: bool,
    yes: bool,
) -> anyhow::Result<()> {
    let engine = init_engine(&data)?;

    let Some(username) = get_or_pick_username(engine.credentials(), username, non_interactive)?
    else {
        return Ok(());
    };

    if !engine.credentials().user_exists(&username) {
        anyhow::bail!("User '{username}' not found");
    }

    let confirmed = confirm_action(
        &format!(
            "Delete user '{username}'? This also removes their files, memberships, access rules and shares."
        ),
        yes,
        non_interactive,
    )?;

    if !confirmed {
        println!("Cancelled.");
        return Ok(());
    }

    let report = engine.delete_user(&username, CLI_ACTOR)?;

    println!();
    println!("Deleted user '{username}'");
    println!(
        "  Removed {} memberships, {} access rules, {} shares",
        report.memberships, report.access_rules, report.shares
    );
    println!();

    Ok(())
}

pub fn run_user_rotate_key(data: DataArgs, username: String) -> anyhow::Result<()> {
    let engine = init_engine(&data)?;
    let api_key = engine.credentials().rotate_credential(&username)?;

    println!();
    println!("New API credential for '{username}': {api_key}");
    println!("  The previous credential no longer works.");
    println!();

    Ok(())
}

pub fn run_user_list(data: DataArgs, json: bool) -> anyhow::Result<()> {
    let engine = init_engine(&data)?;
    let users = engine.credentials().list_users();

    if json {
        let rows: Vec<_> = users
            .iter()
            .map(|u| {
                serde_json::json!({
                    "username": u.username,
                    "email": u.email,
                    "role": u.role,
                    "created_at": u.created_at,
                    "last_login": u.last_login,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print_users_list(users);
    }

    Ok(())
}
