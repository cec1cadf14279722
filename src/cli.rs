//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Top-level CLI parser for `appmodel`.
#[derive(Debug, Parser)]
#[command(name = "appmodel", version, about = "Edit and inspect stored application models")]
pub struct Cli {
    /// Project database file; overrides `APPMODEL_DB`.
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Output format of `show`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ShowFormat {
    /// Indented outline.
    #[default]
    Tree,
    /// Persisted JSON form.
    Json,
    /// Persisted form rendered as YAML.
    Yaml,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List projects.
    Projects {
        /// Print a JSON array instead of `<id>\t<name>` lines.
        #[arg(long)]
        json: bool,
    },
    /// Create a project and print its id.
    CreateProject {
        /// Readable project name.
        name: String,
    },
    /// Delete a project and everything stored for it.
    DeleteProject {
        /// Project id.
        id: String,
    },
    /// Print a project's model.
    Show {
        /// Project id.
        project: String,
        /// Output format.
        #[arg(long, value_enum, default_value_t = ShowFormat::Tree)]
        format: ShowFormat,
    },
    /// List the types a field or parameter may use.
    Types {
        /// Project id.
        project: String,
        /// Include `void`.
        #[arg(long)]
        void: bool,
        /// Include `List<T>` of every base type.
        #[arg(long)]
        lists: bool,
        /// Include `Map<string,T>` of every base type.
        #[arg(long)]
        maps: bool,
    },
    /// Create modules along a dotted path.
    AddModule {
        /// Project id.
        project: String,
        /// Dotted module path, e.g. `shop.model`.
        path: String,
    },
    /// Create an empty class.
    AddClass {
        /// Project id.
        project: String,
        /// Class name.
        name: String,
        /// Dotted path of the owning module; the root when omitted.
        #[arg(long, value_name = "PATH")]
        module: Option<String>,
    },
    /// Remove a class.
    RemoveClass {
        /// Project id.
        project: String,
        /// Fully qualified class name.
        class: String,
    },
    /// Add or replace a field.
    AddField {
        /// Project id.
        project: String,
        /// Fully qualified class name.
        class: String,
        /// Field name.
        name: String,
        /// Field type in canonical form, e.g. `List<shop.Order>`.
        #[arg(long = "type", value_name = "TYPE")]
        ty: Option<String>,
    },
    /// Set the stereotype of a class.
    SetStereotype {
        /// Project id.
        project: String,
        /// Fully qualified class name.
        class: String,
        /// Stereotype tag, e.g. `PERSISTENCE_MODEL`.
        stereotype: String,
    },
    /// Print the current session's authorization value.
    Whoami,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, ShowFormat};
    use clap::Parser;

    #[test]
    fn parses_show_with_format() {
        let cli = Cli::parse_from(["appmodel", "show", "p1", "--format", "yaml"]);
        assert!(matches!(
            cli.command,
            Command::Show { ref project, format: ShowFormat::Yaml } if project == "p1"
        ));
    }

    #[test]
    fn show_defaults_to_tree() {
        let cli = Cli::parse_from(["appmodel", "show", "p1"]);
        assert!(matches!(cli.command, Command::Show { format: ShowFormat::Tree, .. }));
    }

    #[test]
    fn db_flag_is_global() {
        let cli = Cli::parse_from(["appmodel", "projects", "--db", "x.db"]);
        assert_eq!(cli.db.as_deref(), Some(std::path::Path::new("x.db")));
        assert!(matches!(cli.command, Command::Projects { json: false }));
    }

    #[test]
    fn parses_add_field_type() {
        let cli = Cli::parse_from(["appmodel", "add-field", "p1", "shop.Order", "lines", "--type", "List<int64>"]);
        match cli.command {
            Command::AddField { class, name, ty, .. } => {
                assert_eq!(class, "shop.Order");
                assert_eq!(name, "lines");
                assert_eq!(ty.as_deref(), Some("List<int64>"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_projects_json() {
        let cli = Cli::parse_from(["appmodel", "projects", "--json"]);
        assert!(matches!(cli.command, Command::Projects { json: true }));
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["appmodel", "show", "p1", "--format", "xml"]).is_err());
    }
}
