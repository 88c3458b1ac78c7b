use std::{fs::File, io, path::PathBuf, process::ExitCode};

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use time::Date;

use expense_tracker::{
    CategoryFilter, Config, DEFAULT_TIMEZONE, DateSelection, EnrichedTransaction, Error,
    SortDirection, SortKey, SortState, Transaction, TransactionUpdate, TransactionsController,
    UserID, format_currency, parse_calendar_date, setup_logging,
    stores::sqlite::{SQLiteCategoryStore, SQLiteTransactionStore, open_stores},
    totals_by_category, write_csv,
};

type Controller = TransactionsController<SQLiteTransactionStore, SQLiteCategoryStore>;

/// Record expenses and view them by month, year or the last few days.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, default_value = "expenses.db")]
    db_path: PathBuf,

    /// The user whose expenses to work with.
    #[arg(long, default_value_t = 1)]
    user_id: i64,

    /// The canonical timezone used to work out today's date, e.g. "Pacific/Auckland".
    #[arg(long, default_value = DEFAULT_TIMEZONE)]
    timezone: String,

    /// File path to append debug logs to.
    #[arg(long, default_value = "debug.log")]
    log_path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the transactions in a time window.
    List(ListArgs),

    /// Record a new transaction.
    Add {
        /// What the money was spent on.
        name: String,
        /// The amount spent, must be greater than zero.
        amount: f64,
        /// The date as YYYY-MM-DD. Defaults to today.
        #[arg(long, value_parser = parse_date)]
        date: Option<Date>,
        /// The category ID.
        #[arg(long)]
        category: Option<i64>,
    },

    /// Change some fields of a transaction.
    Edit {
        /// The transaction ID.
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
        /// The date as YYYY-MM-DD.
        #[arg(long, value_parser = parse_date)]
        date: Option<Date>,
        /// The new category ID.
        #[arg(long, conflicts_with = "uncategorized")]
        category: Option<i64>,
        /// Remove the transaction from its category.
        #[arg(long)]
        uncategorized: bool,
    },

    /// Delete one or more transactions.
    Delete {
        /// The transaction IDs.
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Manage categories.
    #[command(subcommand)]
    Categories(CategoryCommand),
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    /// Month number (1-12) or "full" for the entire year. Defaults to the current month.
    #[arg(long, conflicts_with_all = ["last_days", "all"])]
    month: Option<String>,

    /// Calendar year. Defaults to the current year.
    #[arg(long, conflicts_with_all = ["last_days", "all"])]
    year: Option<i32>,

    /// Show the trailing N days up to and including today.
    #[arg(long, conflicts_with = "all")]
    last_days: Option<u32>,

    /// Show every transaction.
    #[arg(long)]
    all: bool,

    /// "all", "Other" or a category ID.
    #[arg(long, default_value = "all")]
    category: String,

    /// Only show transactions whose name contains this text.
    #[arg(long, default_value = "")]
    search: String,

    #[arg(long, value_enum, default_value_t = SortArg::Date)]
    sort: SortArg,

    /// Sort in descending order.
    #[arg(long)]
    desc: bool,

    /// Also write the displayed transactions to this CSV file.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print the displayed transactions as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum SortArg {
    Date,
    Amount,
    Name,
    Category,
}

impl From<SortArg> for SortKey {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Date => SortKey::Date,
            SortArg::Amount => SortKey::Amount,
            SortArg::Name => SortKey::Name,
            SortArg::Category => SortKey::Category,
        }
    }
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    /// Show the categories.
    List,
    /// Create a category.
    Add { name: String },
    /// Rename a category.
    Rename { id: i64, name: String },
    /// Delete a category. Its transactions are kept and shown as "Other".
    Delete { id: i64 },
}

fn parse_date(text: &str) -> Result<Date, String> {
    parse_calendar_date(text).map_err(|error| error.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(error) = setup_logging(&args.log_path) {
        eprintln!("Could not open log file {:?}: {error}", args.log_path);
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(error) => {
            tracing::error!("{error}");
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode, Error> {
    let config = Config::new(&args.timezone);
    let today = config.today()?;
    let (transaction_store, category_store) = open_stores(&args.db_path)?;
    let controller =
        TransactionsController::new(transaction_store, category_store, UserID::new(args.user_id));

    match args.command {
        Command::List(list_args) => list(&controller, list_args, today).await?,
        Command::Add {
            name,
            amount,
            date,
            category,
        } => {
            let builder = Transaction::build(&name, amount)
                .date(date.unwrap_or(today))
                .category_id(category);
            let transaction = controller.create_transaction(builder).await?;
            println!("Created transaction {}", transaction.id);
        }
        Command::Edit {
            id,
            name,
            amount,
            date,
            category,
            uncategorized,
        } => {
            let category_id = match (category, uncategorized) {
                (_, true) => Some(None),
                (Some(category), false) => Some(Some(category)),
                (None, false) => None,
            };
            let update = TransactionUpdate {
                name,
                amount,
                date,
                category_id,
            };
            let transaction = controller.update_transaction(id, update).await?;
            println!("Updated transaction {}", transaction.id);
        }
        Command::Delete { ids } => {
            let outcome = controller.delete_many(&ids).await?;

            for id in &outcome.deleted {
                println!("Deleted transaction {id}");
            }

            for (id, error) in &outcome.failed {
                eprintln!("Could not delete transaction {id}: {error}");
            }

            if !outcome.is_complete() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Categories(command) => categories(&controller, command, today).await?,
    }

    Ok(ExitCode::SUCCESS)
}

fn selection(args: &ListArgs, today: Date) -> Result<DateSelection, Error> {
    if args.all {
        return Ok(DateSelection::All);
    }

    if let Some(days) = args.last_days {
        return Ok(DateSelection::last_days(days)?);
    }

    let selection = match (&args.month, args.year) {
        (None, None) => DateSelection::current_month(today),
        (Some(month), year) => DateSelection::from_parts(month, year.unwrap_or(today.year()))?,
        (None, Some(year)) => DateSelection::from_parts("full", year)?,
    };

    Ok(selection)
}

async fn list(controller: &Controller, args: ListArgs, today: Date) -> Result<(), Error> {
    let selection = selection(&args, today)?;
    let filter: CategoryFilter = args.category.parse()?;
    let sort = SortState {
        key: args.sort.into(),
        direction: if args.desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        },
    };

    controller.apply_selection(selection, today).await?;
    let (label, displayed, total) = controller.with_state(|state| {
        state.set_category_filter(filter);
        state.set_search(&args.search);
        state.set_sort(sort);

        let label = state
            .window()
            .map(|window| window.label())
            .unwrap_or_default();

        (label, state.displayed(), state.total())
    })?;

    if let Some(path) = &args.csv {
        let file = File::create(path)?;
        write_csv(file, &displayed)?;
        eprintln!("Wrote {} transactions to {path:?}", displayed.len());
    }

    if args.json {
        serde_json::to_writer_pretty(io::stdout(), &displayed)
            .map_err(|error| Error::OutputError(error.to_string()))?;
        println!();
        return Ok(());
    }

    print_table(&label, &displayed, total);

    Ok(())
}

fn print_table(label: &str, transactions: &[EnrichedTransaction], total: f64) {
    println!("{label}");

    if transactions.is_empty() {
        println!("No transactions.");
        return;
    }

    for enriched in transactions {
        let transaction = &enriched.transaction;
        println!(
            "{:>6}  {}  {:<30}  {:<16}  {:>12}",
            transaction.id,
            transaction.date,
            transaction.name,
            enriched.category_name,
            format_currency(transaction.amount)
        );
    }

    println!();
    for (category, category_total) in totals_by_category(transactions) {
        println!("{category:<16}  {:>12}", format_currency(category_total));
    }
    println!("{:<16}  {:>12}", "Total", format_currency(total));
}

async fn categories(
    controller: &Controller,
    command: CategoryCommand,
    today: Date,
) -> Result<(), Error> {
    match command {
        CategoryCommand::List => {
            controller.apply_selection(DateSelection::All, today).await?;
            let categories = controller.with_state(|state| state.categories().to_vec())?;

            for category in categories {
                println!("{:>6}  {}", category.id, category.name);
            }
        }
        CategoryCommand::Add { name } => {
            let category = controller.create_category(&name).await?;
            println!("Created category {}", category.id);
        }
        CategoryCommand::Rename { id, name } => {
            let category = controller.rename_category(id, &name).await?;
            println!("Renamed category {} to {}", category.id, category.name);
        }
        CategoryCommand::Delete { id } => {
            controller.delete_category(id).await?;
            println!("Deleted category {id}");
        }
    }

    Ok(())
}
