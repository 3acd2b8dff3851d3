use std::fmt;

use chrono::{DateTime, Utc};
use inquire::validator::Validation;
use inquire::{InquireError, Password, PasswordDisplayMode, Select, Text};

use crate::auth::{CredentialStore, validate_password, validate_username};
use crate::types::{Group, GroupMember, SharedFile, User};

/// User with role and last login for display
pub struct UserDisplay {
    pub user: User,
}

impl fmt::Display for UserDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last_login = match &self.user.last_login {
            Some(dt) => format!("last login {}", format_relative_time(dt)),
            None => "never logged in".to_string(),
        };
        write!(f, "{} [{}]  {}", self.user.username, self.user.role, last_login)
    }
}

/// Group with its ID prefix for display
pub struct GroupDisplay {
    pub group: Group,
}

impl fmt::Display for GroupDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short_id = self.group.id.get(..8).unwrap_or(&self.group.id);
        write!(f, "{} ({short_id}...)", self.group.name)?;
        if !self.group.description.is_empty() {
            write!(f, "  {}", self.group.description)?;
        }
        Ok(())
    }
}

pub fn print_users_list(users: Vec<User>) {
    if users.is_empty() {
        println!("No users found.");
        return;
    }
    println!();
    for user in users {
        println!("  {}", UserDisplay { user });
    }
    println!();
}

pub fn print_groups_list(groups: Vec<Group>) {
    if groups.is_empty() {
        println!("No groups found.");
        return;
    }
    println!();
    for group in groups {
        println!("  {}", GroupDisplay { group });
    }
    println!();
}

pub fn print_members_list(members: &[GroupMember]) {
    if members.is_empty() {
        println!("No members found.");
        return;
    }
    println!();
    for member in members {
        println!(
            "  {} [{}]  added by {} {}",
            member.username,
            member.role,
            member.added_by,
            format_relative_time(&member.added_at)
        );
    }
    println!();
}

pub fn print_shares_list(shares: &[SharedFile]) {
    if shares.is_empty() {
        println!("No shares found.");
        return;
    }
    println!();
    for share in shares {
        println!(
            "  {}  {} -> {} [{}]  by {} {}",
            share.id,
            share.source_path,
            share.group_id,
            share.permission,
            share.shared_by,
            format_relative_time(&share.shared_at)
        );
    }
    println!();
}

/// Format a datetime as relative time (e.g., "2 days ago")
#[must_use]
pub fn format_relative_time(dt: &DateTime<Utc>) -> String {
    let diff = Utc::now().signed_duration_since(*dt);

    if diff.num_seconds() < 0 {
        return "in the future".to_string();
    }

    let (value, unit) = if diff.num_seconds() < 60 {
        return "just now".to_string();
    } else if diff.num_minutes() < 60 {
        (diff.num_minutes(), "minute")
    } else if diff.num_hours() < 24 {
        (diff.num_hours(), "hour")
    } else if diff.num_days() < 30 {
        (diff.num_days(), "day")
    } else if diff.num_days() < 365 {
        (diff.num_days() / 30, "month")
    } else {
        (diff.num_days() / 365, "year")
    };

    if value == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{value} {unit}s ago")
    }
}

/// Pick a user from the list
pub fn pick_user(credentials: &CredentialStore) -> anyhow::Result<Option<User>> {
    let users: Vec<UserDisplay> = credentials
        .list_users()
        .into_iter()
        .map(|user| UserDisplay { user })
        .collect();

    if users.is_empty() {
        println!("No users found.");
        return Ok(None);
    }

    let selection = Select::new("Select user:", users)
        .with_page_size(15)
        .with_help_message("Type to filter, Enter to select")
        .with_vim_mode(true)
        .prompt();

    match selection {
        Ok(display) => Ok(Some(display.user)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Use the given username, or pick one interactively.
pub fn get_or_pick_username(
    credentials: &CredentialStore,
    username: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<Option<String>> {
    if let Some(name) = username {
        Ok(Some(name))
    } else if non_interactive {
        anyhow::bail!("--username is required in non-interactive mode");
    } else {
        Ok(pick_user(credentials)?.map(|u| u.username))
    }
}

pub fn prompt_username() -> anyhow::Result<String> {
    Ok(Text::new("Username:")
        .with_validator(|input: &str| {
            Ok(match validate_username(input) {
                Ok(()) => Validation::Valid,
                Err(e) => Validation::Invalid(e.to_string().into()),
            })
        })
        .prompt()?)
}

pub fn prompt_password() -> anyhow::Result<String> {
    Ok(Password::new("Password:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_validator(|input: &str| {
            Ok(match validate_password(input) {
                Ok(()) => Validation::Valid,
                Err(e) => Validation::Invalid(e.to_string().into()),
            })
        })
        .prompt()?)
}

pub fn confirm_action(message: &str, yes: bool, non_interactive: bool) -> anyhow::Result<bool> {
    if yes {
        Ok(true)
    } else if non_interactive {
        anyhow::bail!("--yes is required for destructive operations in non-interactive mode");
    } else {
        Ok(inquire::Confirm::new(message)
            .with_default(false)
            .prompt()?)
    }
}
