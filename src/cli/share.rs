use crate::store::path::normalize_resource_path;
use crate::types::SharePermission;

use super::pickers::print_shares_list;
use super::{DataArgs, init_engine, resolve_group};

pub fn run_share_add(
    data: DataArgs,
    path: String,
    source_group: Option<String>,
    target_group: String,
    shared_by: String,
    permission: String,
) -> anyhow::Result<()> {
    let engine = init_engine(&data)?;
    let path = normalize_resource_path(&path)?;

    let source_group = match source_group {
        Some(g) => resolve_group(&engine, &g)?.id,
        None => String::new(),
    };
    let target = resolve_group(&engine, &target_group)?;
    let permission = SharePermission::coerce(&permission);

    let share = engine.sharing().share_file(
        &path,
        &source_group,
        &target.id,
        &shared_by,
        permission,
    )?;

    println!("Shared {} with \"{}\" ({permission})", share.source_path, target.name);
    println!("  Share ID: {}", share.id);
    Ok(())
}

pub fn run_share_remove(data: DataArgs, id: String, as_user: String) -> anyhow::Result<()> {
    let engine = init_engine(&data)?;
    engine.sharing().remove_share(&id, &as_user)?;
    println!("Removed share {id}");
    Ok(())
}

pub fn run_share_list(
    data: DataArgs,
    group: Option<String>,
    path: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let engine = init_engine(&data)?;

    let shares = match (group, path) {
        (Some(group), _) => {
            let group = resolve_group(&engine, &group)?;
            engine.sharing().list_shares_for_group(&group.id)
        }
        (None, Some(path)) => engine
            .sharing()
            .list_shares_for_path(&normalize_resource_path(&path)?),
        (None, None) => anyhow::bail!("either --group or --path is required"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&shares)?);
    } else {
        print_shares_list(&shares);
    }
    Ok(())
}
