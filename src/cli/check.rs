use crate::error::Result;
use crate::store::path::normalize_resource_path;

use super::{DataArgs, init_engine, resolve_group};

/// Prints the decision. A failed lookup is reported as a denial.
fn print_decision(subject: &str, decision: Result<bool>) {
    match decision {
        Ok(true) => println!("allowed"),
        Ok(false) => println!("denied"),
        Err(e) => {
            tracing::warn!("Access check for {subject} failed: {e}");
            println!("denied");
        }
    }
}

pub fn run_check_file(data: DataArgs, user: String, path: String) -> anyhow::Result<()> {
    let engine = init_engine(&data)?;
    let path = normalize_resource_path(&path)?;
    print_decision(&user, engine.files().has_file_access(&user, &path));
    Ok(())
}

pub fn run_check_share(data: DataArgs, user: String, path: String, write: bool) -> anyhow::Result<()> {
    let engine = init_engine(&data)?;
    let path = normalize_resource_path(&path)?;
    print_decision(
        &user,
        engine.sharing().has_access_to_shared_file(&user, &path, write),
    );
    Ok(())
}

pub fn run_check_group(
    data: DataArgs,
    user: String,
    group: String,
    action: String,
) -> anyhow::Result<()> {
    let engine = init_engine(&data)?;

    // Unknown names fall through as IDs so the decision reports GroupNotFound.
    let group_id = resolve_group(&engine, &group).map_or(group, |g| g.id);

    print_decision(
        &user,
        engine.groups().has_group_permission(&user, &group_id, &action),
    );
    Ok(())
}
