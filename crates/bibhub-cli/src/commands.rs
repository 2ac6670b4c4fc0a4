use std::path::Path;

use anyhow::Context;
use bibhub_spoke::ArticleHook;
use bibhub_store::{
    Attachment, ChangeLogEvent, Entry, EntryId, EntryStore, HookContext, SearchFilter,
    StoreConfig,
};
use colored::Colorize;
use futures::TryStreamExt;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let store = match &cli.command {
        Command::Init => EntryStore::init(&cli.workspace).await?,
        _ => open_store(&cli).await?,
    };
    let format = cli.format;
    match cli.command {
        Command::Init => cmd_init(&store),
        Command::Add(args) => cmd_add(&store, args, format).await,
        Command::Show(args) => cmd_show(&store, args, format).await,
        Command::List(args) => cmd_list(&store, args, format).await,
        Command::Search(args) => cmd_search(&store, args, format).await,
        Command::FindHash(args) => cmd_find_hash(&store, args, format).await,
        Command::FindId(args) => cmd_find_id(&store, args, format).await,
        Command::Reindex => cmd_reindex(&store).await,
        Command::Log(args) => cmd_log(&store, args).await,
        Command::Hook(args) => cmd_hook(&store, args).await,
    }
}

async fn open_store(cli: &Cli) -> anyhow::Result<EntryStore> {
    let config = match &cli.config {
        Some(path) => StoreConfig::load(path).await?,
        None => StoreConfig::load_from_workspace(&cli.workspace).await?,
    };
    Ok(EntryStore::builder(&cli.workspace).config(config).build())
}

fn cmd_init(store: &EntryStore) -> anyhow::Result<()> {
    let ws = store.workspace();
    println!(
        "{} Initialized bibhub workspace in {}",
        "✓".green().bold(),
        ws.root().display().to_string().bold()
    );
    println!("  Entries: {}", ws.entries_dir().display());
    println!("  Files:   {}", ws.cas_root().display());
    println!("  Ingest:  {:?}", store.config().ingest_mode);
    Ok(())
}

async fn absolute(path: &Path) -> anyhow::Result<String> {
    let path = tokio::fs::canonicalize(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    Ok(path.to_string_lossy().into_owned())
}

async fn cmd_add(store: &EntryStore, args: AddArgs, format: OutputFormat) -> anyhow::Result<()> {
    if !args.allow_duplicate && (args.doi.is_some() || args.pmid.is_some()) {
        if let Some(existing) = store
            .find_by_identifiers(args.doi.as_deref(), args.pmid.as_deref())
            .await?
        {
            let id = existing.id.map(|id| id.to_string()).unwrap_or_default();
            println!(
                "{} An entry with this identifier exists: {} {}",
                "!".yellow().bold(),
                id.yellow(),
                existing.title
            );
            println!("  Use --allow-duplicate to save anyway.");
            return Ok(());
        }
    }

    let mut entry = Entry::new(args.entry_type, args.title);
    entry.authors = args.authors;
    entry.year = args.year;
    entry.journal = args.journal;
    entry.doi = args.doi;
    entry.pmid = args.pmid;
    entry.notes = args.notes;
    entry.tags = args.tags.into_iter().collect();
    if let Some(file) = &args.file {
        entry.main_file_path = Some(absolute(file).await?);
    }
    for path in &args.attachments {
        entry.attachments.push(Attachment::from_source(absolute(path).await?));
    }
    entry.queue_event(
        ChangeLogEvent::new("created").with_actor(store.config().actor.clone()),
    );

    let id = store.save(&mut entry).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entry)?),
        OutputFormat::Text => {
            println!("{} Saved {} {}", "✓".green().bold(), entry.entry_type, id.to_string().yellow());
            if let Some(path) = &entry.main_file_path {
                println!("  File: {}", path.dimmed());
            }
            if !entry.attachments.is_empty() {
                println!("  Attachments: {}", entry.attachments.len());
            }
        }
    }
    Ok(())
}

async fn load(store: &EntryStore, id: &EntryId) -> anyhow::Result<Entry> {
    store
        .get_by_id(id)
        .await?
        .with_context(|| format!("no entry {id}"))
}

async fn cmd_show(store: &EntryStore, args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let entry = load(store, &args.id).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
        return Ok(());
    }

    println!("{}  {}", args.id.to_string().yellow().bold(), entry.entry_type.to_string().cyan());
    println!("  Title:   {}", entry.title.bold());
    if !entry.authors.is_empty() {
        println!("  Authors: {}", entry.authors.join("; "));
    }
    if let Some(year) = entry.year {
        println!("  Year:    {year}");
    }
    if let Some(journal) = &entry.journal {
        println!("  Journal: {journal}");
    }
    if let Some(doi) = &entry.doi {
        println!("  DOI:     {}", doi.blue());
    }
    if let Some(pmid) = &entry.pmid {
        println!("  PMID:    {pmid}");
    }
    if !entry.tags.is_empty() {
        let tags: Vec<&str> = entry.tags.iter().map(String::as_str).collect();
        println!("  Tags:    {}", tags.join(", ").green());
    }
    if let Some(path) = &entry.main_file_path {
        let name = entry.original_file_name.as_deref().unwrap_or("");
        println!("  File:    {} {}", path.dimmed(), name);
    }
    for attachment in &entry.attachments {
        let label = attachment
            .title
            .as_deref()
            .or(attachment.original_file_name.as_deref())
            .unwrap_or("");
        println!("  Attach:  {} {}", attachment.path.dimmed(), label);
    }
    if let Some(run) = &entry.search_run {
        println!("  Query:   {} ({})", run.query, run.provider.as_deref().unwrap_or("-"));
    }
    if let Some(notes) = &entry.notes {
        println!("  Notes:   {notes}");
    }
    if let (Some(created), Some(updated)) = (entry.created_utc, entry.updated_utc) {
        println!(
            "  Created: {} by {}",
            created.to_rfc3339(),
            entry.created_by.as_deref().unwrap_or("?")
        );
        println!(
            "  Updated: {} by {}",
            updated.to_rfc3339(),
            entry.updated_by.as_deref().unwrap_or("?")
        );
    }
    Ok(())
}

fn print_entries(entries: &[Entry], format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No entries.");
        return Ok(());
    }
    for entry in entries {
        let id = entry.id.map(|id| id.short_id()).unwrap_or_default();
        let year = entry.year.map(|y| y.to_string()).unwrap_or_default();
        println!(
            "{} {:<12} {:>4}  {}",
            id.yellow(),
            entry.entry_type.to_string().cyan(),
            year.dimmed(),
            entry.title
        );
    }
    Ok(())
}

async fn cmd_list(store: &EntryStore, args: ListArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut entries: Vec<Entry> = store
        .enumerate()
        .try_filter(|e| futures::future::ready(args.entry_type.map_or(true, |t| e.entry_type == t)))
        .try_collect()
        .await?;
    entries.sort_by(|a, b| b.updated_utc.cmp(&a.updated_utc));
    print_entries(&entries, format)
}

async fn cmd_search(
    store: &EntryStore,
    args: SearchArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    // The index lives in memory; populate it from disk first.
    store.reindex().await?;
    let filter = SearchFilter {
        text: args.text,
        entry_type: args.entry_type,
        tags: args.tags,
        year_from: args.year_from,
        year_to: args.year_to,
        author: args.author,
        limit: args.limit,
        ..SearchFilter::default()
    };
    let entries = store.search(&filter).await?;
    print_entries(&entries, format)
}

async fn cmd_find_hash(
    store: &EntryStore,
    args: FindHashArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    store.reindex().await?;
    match store.find_by_hash(&args.sha256).await? {
        Some(entry) => print_entries(std::slice::from_ref(&entry), format),
        None => {
            println!("No entry holds {}.", args.sha256.dimmed());
            Ok(())
        }
    }
}

async fn cmd_find_id(
    store: &EntryStore,
    args: FindIdArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match store
        .find_by_identifiers(args.doi.as_deref(), args.pmid.as_deref())
        .await?
    {
        Some(entry) => print_entries(std::slice::from_ref(&entry), format),
        None => {
            println!("No matching entry.");
            Ok(())
        }
    }
}

async fn cmd_reindex(store: &EntryStore) -> anyhow::Result<()> {
    let report = store.reindex().await?;
    println!(
        "{} Reindexed {} entries",
        "✓".green().bold(),
        report.indexed.to_string().bold()
    );
    if report.skipped > 0 {
        println!("  Skipped: {} (see log for details)", report.skipped.to_string().red());
    }
    println!("  Identity keys: {}", store.identity().len());
    Ok(())
}

async fn cmd_log(store: &EntryStore, args: LogArgs) -> anyhow::Result<()> {
    let events = store.change_log(&args.id).await?;
    if events.is_empty() {
        println!("No change-log events.");
        return Ok(());
    }
    for event in events.iter().rev().take(args.limit) {
        println!(
            "{}  {}  {}",
            event.at_utc.to_rfc3339().dimmed(),
            event.action.bold(),
            event.actor.as_deref().unwrap_or("-")
        );
        if let Some(details) = &event.details {
            println!("  {details}");
        }
    }
    Ok(())
}

fn citation_from(entry: &Entry) -> ArticleHook {
    ArticleHook {
        title: entry.title.clone(),
        authors: entry.authors.clone(),
        year: entry.year,
        journal: entry.journal.clone(),
        abstract_text: entry.abstract_text.clone(),
        keywords: entry.keywords.clone(),
        doi: entry.doi.clone(),
        pmid: entry.pmid.clone(),
        nct_id: entry.nct_id.clone(),
        ..ArticleHook::default()
    }
}

async fn cmd_hook(store: &EntryStore, args: HookArgs) -> anyhow::Result<()> {
    let entry = load(store, &args.id).await?;
    let mut context = HookContext::new().with_actor(store.config().actor.clone());
    if args.cite {
        context = context.with_citation(citation_from(&entry));
    }
    if args.attachments {
        context = context.with_attachments(entry.attachments.clone());
    }
    context = context.with_events(args.events.into_iter().map(ChangeLogEvent::new));
    if context.is_empty() {
        println!("Nothing to write. Pass --cite, --attachments or --event.");
        return Ok(());
    }

    let report = store.process_hooks(&args.id, &context).await?;
    for kind in report.persisted() {
        println!("  {} {}", "written:".green(), kind);
    }
    for kind in report.skipped() {
        println!("  {} {}", "skipped:".dimmed(), kind);
    }
    for (name, reason) in report.failed() {
        println!("  {} {}: {}", "failed:".red(), name, reason);
    }
    if !report.is_clean() {
        anyhow::bail!("some hooks were not written");
    }
    Ok(())
}
