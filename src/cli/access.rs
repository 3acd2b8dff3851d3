use crate::store::path::normalize_resource_path;

use super::{DataArgs, init_engine, resolve_group};

pub fn run_access_set(
    data: DataArgs,
    path: String,
    owner: String,
    public: bool,
    groups: Vec<String>,
) -> anyhow::Result<()> {
    let engine = init_engine(&data)?;
    let path = normalize_resource_path(&path)?;

    if !engine.credentials().user_exists(&owner) {
        anyhow::bail!("User '{owner}' not found");
    }

    let group_ids = groups
        .iter()
        .map(|g| resolve_group(&engine, g).map(|group| group.id))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let rule = engine
        .files()
        .set_file_access(&path, &owner, public, group_ids)?;

    println!(
        "Access rule set for {} (owner {}, {}, {} groups)",
        rule.path,
        rule.owner,
        if rule.is_public { "public" } else { "private" },
        rule.group_ids.len()
    );
    Ok(())
}

pub fn run_access_show(data: DataArgs, path: String, json: bool) -> anyhow::Result<()> {
    let engine = init_engine(&data)?;
    let path = normalize_resource_path(&path)?;
    let rule = engine.files().get_file_access(&path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rule)?);
        return Ok(());
    }

    println!();
    println!("  Path:    {}", rule.path);
    println!("  Owner:   {}", rule.owner);
    println!("  Public:  {}", rule.is_public);
    if rule.group_ids.is_empty() {
        println!("  Groups:  none");
    } else {
        println!("  Groups:");
        for id in &rule.group_ids {
            let name = engine
                .groups()
                .get_group(id)
                .map(|g| g.name)
                .unwrap_or_else(|| "<unknown>".to_string());
            println!("    {name} ({id})");
        }
    }
    println!();
    Ok(())
}
