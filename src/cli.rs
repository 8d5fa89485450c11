use clap::{Parser, Subcommand};
use mechdesk::models::Resource;
use mechdesk::report::ListOptions;

#[derive(Parser)]
#[command(name = "mechdesk")]
#[command(about = "Terminal admin console for the vehicle-service marketplace API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the access token
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },

    /// Forget the stored access token
    Logout,

    /// List a resource as a plain-text table
    List {
        /// Resource to list
        #[arg(value_enum)]
        resource: Resource,

        /// Case-insensitive text matched against every field
        #[arg(short, long)]
        search: Option<String>,

        /// Column filter as column=value (repeatable)
        #[arg(short, long, value_parser = ListOptions::parse_filter)]
        filter: Vec<(String, String)>,

        /// Column to sort by
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// GET an endpoint and print the raw JSON
    Get {
        /// Path relative to the API base URL, e.g. /users
        endpoint: String,
    },

    /// Show one record's details, or the resource summary when no id is given
    Show {
        #[arg(value_enum)]
        resource: Resource,

        /// Record id
        id: Option<String>,
    },

    /// Delete one record
    Delete {
        #[arg(value_enum)]
        resource: Resource,

        /// Record id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Launch the interactive console (default)
    Tui,
}

impl Commands {
    pub fn list_options(&self) -> Option<ListOptions> {
        match self {
            Commands::List {
                search,
                filter,
                sort,
                desc,
                ..
            } => Some(ListOptions {
                search: search.clone(),
                filters: filter.clone(),
                sort: sort.clone(),
                descending: *desc,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_arguments() {
        let cli = Cli::try_parse_from([
            "mechdesk", "list", "mechanics", "--filter", "city=Pune", "-f", "is_verified=yes",
            "--sort", "name", "--desc",
        ])
        .unwrap();
        let command = cli.command.unwrap();
        assert!(matches!(
            command,
            Commands::List { resource: Resource::Mechanics, .. }
        ));
        let options = command.list_options().unwrap();
        assert_eq!(
            options.filters,
            vec![
                ("city".to_string(), "Pune".to_string()),
                ("is_verified".to_string(), "yes".to_string())
            ]
        );
        assert_eq!(options.sort.as_deref(), Some("name"));
        assert!(options.descending);
    }

    #[test]
    fn test_bad_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["mechdesk", "list", "invoices"]).is_err());
        assert!(Cli::try_parse_from(["mechdesk", "list", "users", "--filter", "name"]).is_err());
        assert!(Cli::try_parse_from(["mechdesk"]).unwrap().command.is_none());
    }

    #[test]
    fn test_show_arguments() {
        let cli = Cli::try_parse_from(["mechdesk", "show", "users", "u1"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Show { resource: Resource::Users, id: Some(ref id) }) if id == "u1"
        ));
        let cli = Cli::try_parse_from(["mechdesk", "show", "audit"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Show { id: None, .. })));
    }
}
