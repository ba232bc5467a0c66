use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use receipt_ledger::cli::{
    handle_export_command, handle_plan_command, handle_run_command, handle_show_command,
    ExportFormat, SyncArgs,
};
use receipt_ledger::config::{LedgerPaths, Settings};
use receipt_ledger::logging::init_tracing;
use receipt_ledger::storage::Ledger;

#[derive(Parser)]
#[command(
    name = "receipts",
    author = "Kaylee Beyene",
    version,
    about = "Turns scanned grocery receipts into a monthly spending ledger",
    long_about = "Picks up new receipts from an inbox folder, reads them with OCR \
                  and appends every dated line item to an append-only ledger \
                  with one sheet per month. Running without a subcommand is the \
                  same as 'receipts run'."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, transcribe and record every new receipt
    #[command(alias = "sync")]
    Run(SyncArgs),

    /// List the receipts a run would fetch, without fetching them
    Plan(SyncArgs),

    /// Print a ledger sheet
    Show {
        /// Sheet name, e.g. 03.2024 (default: the last sheet)
        #[arg(short, long)]
        sheet: Option<String>,

        /// List sheet names instead
        #[arg(short, long)]
        list: bool,
    },

    /// Export a sheet or the whole ledger
    Export {
        /// Export format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Sheet to export as CSV (default: the last sheet)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create the data directories, settings file and an empty ledger
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let paths = LedgerPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        None => handle_run_command(&paths, &settings, &SyncArgs::default())?,
        Some(Commands::Run(args)) => handle_run_command(&paths, &settings, &args)?,
        Some(Commands::Plan(args)) => handle_plan_command(&paths, &settings, &args)?,
        Some(Commands::Show { sheet, list }) => {
            handle_show_command(&paths, &settings, sheet.as_deref(), list)?
        }
        Some(Commands::Export {
            format,
            sheet,
            output,
        }) => handle_export_command(
            &paths,
            &settings,
            format,
            sheet.as_deref(),
            output.as_ref(),
        )?,
        Some(Commands::Init) => {
            println!("Initializing receipt-ledger at: {}", paths.base_dir().display());
            paths.ensure_directories()?;
            let inbox = settings.inbox_dir(&paths);
            std::fs::create_dir_all(&inbox)?;
            settings.save(&paths)?;
            let ledger = Ledger::open(paths.ledger_file(), settings.ledger.clone())?;
            println!("Ledger: {}", ledger.path().display());
            println!("Inbox:  {}", inbox.display());
            println!();
            println!(
                "Drop receipts named YYMMDD_*.{} into the inbox and run 'receipts'.",
                settings.remote.extension
            );
        }
        Some(Commands::Config) => {
            println!("receipt-ledger Configuration");
            println!("============================");
            println!("Base directory:    {}", paths.base_dir().display());
            println!("Ledger:            {}", paths.ledger_file().display());
            println!("Inbox:             {}", settings.inbox_dir(&paths).display());
            println!("Staging directory: {}", paths.staging_dir().display());
            println!("Backup directory:  {}", paths.backup_dir().display());
            println!("Audit log:         {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  OCR engine:        {}", settings.ocr.engine_binary_path.display());
            println!("  Page segmentation: {}", settings.ocr.page_segmentation_mode);
            println!("  Rasterizer:        {}", settings.rasterizer.binary_path.display());
            println!("  Receipt extension: {}", settings.remote.extension);
            println!("  Keep staged text:  {}", settings.keep_staged_text);
            println!("  Backups kept:      {}", settings.backup_retention.keep);
        }
    }

    Ok(())
}
