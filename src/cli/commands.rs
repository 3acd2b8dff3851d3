use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Location flags shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct DataArgs {
    /// Data directory for users, groups and shares [default: ./data]
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Storage root for user and group files [default: <data-dir>/storage]
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Path to a lunatransfer.toml config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Initialize the data directory, session secret and first admin user
    Init {
        #[command(flatten)]
        data: DataArgs,

        /// Username for the first admin
        #[arg(long)]
        username: Option<String>,

        /// Password for the first admin
        #[arg(long)]
        password: Option<String>,

        /// Email for the first admin
        #[arg(long, default_value = "")]
        email: String,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Add a new user and print its API credential
    Add {
        #[command(flatten)]
        data: DataArgs,

        /// Username for the new user
        #[arg(long)]
        username: Option<String>,

        /// Password for the new user
        #[arg(long)]
        password: Option<String>,

        /// Email address
        #[arg(long, default_value = "")]
        email: String,

        /// Global role (admin, user, guest)
        #[arg(long, default_value = "user")]
        role: String,

        /// Skip interactive prompts (requires --username and --password)
        #[arg(long)]
        non_interactive: bool,
    },

    /// Remove a user with their memberships, access rules and shares
    Remove {
        #[command(flatten)]
        data: DataArgs,

        /// Username to remove
        #[arg(long)]
        username: Option<String>,

        /// Skip interactive prompts (requires --username)
        #[arg(long)]
        non_interactive: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Replace a user's API credential
    RotateKey {
        #[command(flatten)]
        data: DataArgs,

        /// Username whose credential is rotated
        #[arg(long)]
        username: String,
    },

    /// List users
    List {
        #[command(flatten)]
        data: DataArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// Create a group; the owner becomes its admin
    Create {
        #[command(flatten)]
        data: DataArgs,

        /// Group name (unique, case-sensitive)
        #[arg(long)]
        name: String,

        /// Description
        #[arg(long, default_value = "")]
        description: String,

        /// User enrolled as the group's admin
        #[arg(long)]
        owner: String,
    },

    /// Add a user to a group
    AddMember {
        #[command(flatten)]
        data: DataArgs,

        /// Group ID or name
        #[arg(long)]
        group: String,

        /// Username to add
        #[arg(long)]
        username: String,

        /// Group role (admin, contributor, reader)
        #[arg(long, default_value = "reader")]
        role: String,
    },

    /// Remove a user from a group
    RemoveMember {
        #[command(flatten)]
        data: DataArgs,

        /// Group ID or name
        #[arg(long)]
        group: String,

        /// Username to remove
        #[arg(long)]
        username: String,
    },

    /// List members of a group
    Members {
        #[command(flatten)]
        data: DataArgs,

        /// Group ID or name
        #[arg(long)]
        group: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List groups
    List {
        #[command(flatten)]
        data: DataArgs,

        /// Only groups this user belongs to
        #[arg(long)]
        user: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AccessCommands {
    /// Set the access rule for a path, replacing any existing rule
    Set {
        #[command(flatten)]
        data: DataArgs,

        /// Resource path, e.g. alice/report.pdf
        #[arg(long)]
        path: String,

        /// Owning user
        #[arg(long)]
        owner: String,

        /// Make the path readable by everyone
        #[arg(long)]
        public: bool,

        /// Group ID or name granted access (repeatable)
        #[arg(long = "group")]
        groups: Vec<String>,
    },

    /// Show the access rule for a path
    Show {
        #[command(flatten)]
        data: DataArgs,

        /// Resource path
        #[arg(long)]
        path: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ShareCommands {
    /// Share a path with another group
    Add {
        #[command(flatten)]
        data: DataArgs,

        /// Resource path to share
        #[arg(long)]
        path: String,

        /// Group ID or name the path belongs to (omit for personal files)
        #[arg(long)]
        source_group: Option<String>,

        /// Group ID or name receiving access
        #[arg(long)]
        target_group: String,

        /// User recorded as the sharer
        #[arg(long)]
        shared_by: String,

        /// Permission (read, read_write)
        #[arg(long, default_value = "read")]
        permission: String,
    },

    /// Remove a share
    Remove {
        #[command(flatten)]
        data: DataArgs,

        /// Share ID
        #[arg(long)]
        id: String,

        /// User performing the removal (the sharer or an admin)
        #[arg(long = "as")]
        as_user: String,
    },

    /// List shares targeting a group or covering a path
    List {
        #[command(flatten)]
        data: DataArgs,

        /// Target group ID or name
        #[arg(long, conflicts_with = "path", required_unless_present = "path")]
        group: Option<String>,

        /// Shared resource path
        #[arg(long)]
        path: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum CheckCommands {
    /// Can a user access a path in personal storage?
    File {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long)]
        user: String,

        #[arg(long)]
        path: String,
    },

    /// Can a user access a shared path?
    Share {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long)]
        user: String,

        #[arg(long)]
        path: String,

        /// Require write access
        #[arg(long)]
        write: bool,
    },

    /// Can a user perform an action in a group?
    Group {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long)]
        user: String,

        /// Group ID or name
        #[arg(long)]
        group: String,

        /// read, write, upload, manage or delete
        #[arg(long)]
        action: String,
    },
}
