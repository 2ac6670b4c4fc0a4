use std::path::PathBuf;

use bibhub_types::{EntryId, EntryType};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bibhub",
    about = "bibhub: hub-and-spoke reference entry store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Workspace root holding `entries/`, `files/` and `bibhub.toml`.
    #[arg(short, long, global = true, env = "BIBHUB_WORKSPACE", default_value = ".")]
    pub workspace: PathBuf,

    /// Config file to use instead of `<workspace>/bibhub.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the workspace layout and a default config
    Init,
    /// Save a new entry
    Add(AddArgs),
    /// Show one entry
    Show(ShowArgs),
    /// List every entry on disk
    List(ListArgs),
    /// Search entries
    Search(SearchArgs),
    /// Find the entry holding a file with this SHA-256
    FindHash(FindHashArgs),
    /// Find an entry by DOI or PMID
    FindId(FindIdArgs),
    /// Rebuild the search and identity indexes from disk
    Reindex,
    /// Show an entry's change log
    Log(LogArgs),
    /// Write auxiliary hooks for an existing entry
    Hook(HookArgs),
}

#[derive(Args)]
pub struct AddArgs {
    /// publication, report, search-run or other
    #[arg(short = 't', long = "type", default_value = "publication")]
    pub entry_type: EntryType,
    #[arg(long)]
    pub title: String,
    /// Primary file to ingest into the content store
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    #[arg(long = "attach")]
    pub attachments: Vec<PathBuf>,
    #[arg(long = "author")]
    pub authors: Vec<String>,
    #[arg(long)]
    pub year: Option<i32>,
    #[arg(long)]
    pub journal: Option<String>,
    #[arg(long)]
    pub doi: Option<String>,
    #[arg(long)]
    pub pmid: Option<String>,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Save even if an entry with the same DOI or PMID exists
    #[arg(long)]
    pub allow_duplicate: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    pub id: EntryId,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(short = 't', long = "type")]
    pub entry_type: Option<EntryType>,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Free text over title, abstract, authors, keywords and file text
    pub text: Option<String>,
    #[arg(short = 't', long = "type")]
    pub entry_type: Option<EntryType>,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub year_from: Option<i32>,
    #[arg(long)]
    pub year_to: Option<i32>,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct FindHashArgs {
    pub sha256: String,
}

#[derive(Args)]
pub struct FindIdArgs {
    #[arg(long, required_unless_present = "pmid")]
    pub doi: Option<String>,
    #[arg(long)]
    pub pmid: Option<String>,
}

#[derive(Args)]
pub struct LogArgs {
    pub id: EntryId,
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

#[derive(Args)]
pub struct HookArgs {
    pub id: EntryId,
    /// Write a citation hook from the entry's own metadata
    #[arg(long)]
    pub cite: bool,
    /// Write an attachment-list hook from the entry's attachments
    #[arg(long)]
    pub attachments: bool,
    /// Append a change-log event with this action
    #[arg(long = "event")]
    pub events: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["bibhub", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init));
        assert_eq!(cli.workspace, PathBuf::from("."));
    }

    #[test]
    fn parse_workspace_and_config() {
        let cli = Cli::try_parse_from([
            "bibhub",
            "--workspace",
            "/data/refs",
            "--config",
            "/etc/bibhub.toml",
            "reindex",
        ])
        .unwrap();
        assert_eq!(cli.workspace, PathBuf::from("/data/refs"));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/bibhub.toml")));
        assert!(matches!(cli.command, Command::Reindex));
    }

    #[test]
    fn parse_add() {
        let cli = Cli::try_parse_from([
            "bibhub", "add", "--type", "report", "--title", "Demo", "-f", "/tmp/demo.pdf",
            "--tag", "a", "--tag", "b", "--author", "Doe J",
        ])
        .unwrap();
        if let Command::Add(args) = cli.command {
            assert_eq!(args.entry_type, EntryType::Report);
            assert_eq!(args.title, "Demo");
            assert_eq!(args.file, Some(PathBuf::from("/tmp/demo.pdf")));
            assert_eq!(args.tags, vec!["a", "b"]);
            assert_eq!(args.authors, vec!["Doe J"]);
            assert!(!args.allow_duplicate);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_add_defaults_to_publication() {
        let cli = Cli::try_parse_from(["bibhub", "add", "--title", "Paper"]).unwrap();
        if let Command::Add(args) = cli.command {
            assert_eq!(args.entry_type, EntryType::Publication);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(Cli::try_parse_from(["bibhub", "add", "--type", "poem", "--title", "x"]).is_err());
    }

    #[test]
    fn parse_show_requires_valid_id() {
        let id = EntryId::new();
        let cli = Cli::try_parse_from(["bibhub", "show", &id.to_string()]).unwrap();
        if let Command::Show(args) = cli.command {
            assert_eq!(args.id, id);
        } else {
            panic!("wrong command");
        }
        assert!(Cli::try_parse_from(["bibhub", "show", "nope"]).is_err());
    }

    #[test]
    fn parse_search() {
        let cli = Cli::try_parse_from([
            "bibhub", "search", "statin", "--type", "publication", "--year-from", "2020", "-n", "5",
        ])
        .unwrap();
        if let Command::Search(args) = cli.command {
            assert_eq!(args.text.as_deref(), Some("statin"));
            assert_eq!(args.entry_type, Some(EntryType::Publication));
            assert_eq!(args.year_from, Some(2020));
            assert_eq!(args.limit, Some(5));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn find_id_needs_an_identifier() {
        assert!(Cli::try_parse_from(["bibhub", "find-id"]).is_err());
        let cli = Cli::try_parse_from(["bibhub", "find-id", "--pmid", "123"]).unwrap();
        assert!(matches!(cli.command, Command::FindId(_)));
    }

    #[test]
    fn parse_hook() {
        let id = EntryId::new();
        let cli = Cli::try_parse_from([
            "bibhub",
            "hook",
            &id.to_string(),
            "--cite",
            "--event",
            "screened",
        ])
        .unwrap();
        if let Command::Hook(args) = cli.command {
            assert!(args.cite);
            assert!(!args.attachments);
            assert_eq!(args.events, vec!["screened"]);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["bibhub", "--format", "json", "list"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["bibhub", "--verbose", "init"]).unwrap();
        assert!(cli.verbose);
    }
}
