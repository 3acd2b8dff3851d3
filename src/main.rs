use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lunatransfer::cli::{
    AccessCommands, AdminCommands, CheckCommands, GroupCommands, ShareCommands, UserCommands,
    run_access_set, run_access_show, run_check_file, run_check_group, run_check_share,
    run_group_add_member, run_group_create, run_group_list, run_group_members,
    run_group_remove_member, run_init, run_share_add, run_share_list, run_share_remove,
    run_user_add, run_user_list, run_user_remove, run_user_rotate_key,
};

#[derive(Parser)]
#[command(name = "lunatransfer")]
#[command(about = "Administer users, groups and sharing for a LunaTransfer server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Manage users and API credentials
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage groups and memberships
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },

    /// Manage per-path access rules
    Access {
        #[command(subcommand)]
        command: AccessCommands,
    },

    /// Manage cross-group shares
    Share {
        #[command(subcommand)]
        command: ShareCommands,
    },

    /// Evaluate an access decision
    Check {
        #[command(subcommand)]
        command: CheckCommands,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("lunatransfer=info".parse()?)
                .add_directive("audit=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data,
                username,
                password,
                email,
                non_interactive,
            } => run_init(data, username, password, email, non_interactive),
        },
        Commands::User { command } => match command {
            UserCommands::Add {
                data,
                username,
                password,
                email,
                role,
                non_interactive,
            } => run_user_add(data, username, password, email, role, non_interactive),
            UserCommands::Remove {
                data,
                username,
                non_interactive,
                yes,
            } => run_user_remove(data, username, non_interactive, yes),
            UserCommands::RotateKey { data, username } => run_user_rotate_key(data, username),
            UserCommands::List { data, json } => run_user_list(data, json),
        },
        Commands::Group { command } => match command {
            GroupCommands::Create {
                data,
                name,
                description,
                owner,
            } => run_group_create(data, name, description, owner),
            GroupCommands::AddMember {
                data,
                group,
                username,
                role,
            } => run_group_add_member(data, group, username, role),
            GroupCommands::RemoveMember {
                data,
                group,
                username,
            } => run_group_remove_member(data, group, username),
            GroupCommands::Members { data, group, json } => run_group_members(data, group, json),
            GroupCommands::List { data, user, json } => run_group_list(data, user, json),
        },
        Commands::Access { command } => match command {
            AccessCommands::Set {
                data,
                path,
                owner,
                public,
                groups,
            } => run_access_set(data, path, owner, public, groups),
            AccessCommands::Show { data, path, json } => run_access_show(data, path, json),
        },
        Commands::Share { command } => match command {
            ShareCommands::Add {
                data,
                path,
                source_group,
                target_group,
                shared_by,
                permission,
            } => run_share_add(data, path, source_group, target_group, shared_by, permission),
            ShareCommands::Remove { data, id, as_user } => run_share_remove(data, id, as_user),
            ShareCommands::List {
                data,
                group,
                path,
                json,
            } => run_share_list(data, group, path, json),
        },
        Commands::Check { command } => match command {
            CheckCommands::File { data, user, path } => run_check_file(data, user, path),
            CheckCommands::Share {
                data,
                user,
                path,
                write,
            } => run_check_share(data, user, path, write),
            CheckCommands::Group {
                data,
                user,
                group,
                action,
            } => run_check_group(data, user, group, action),
        },
    }
}
