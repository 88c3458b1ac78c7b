use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use expense_tracker::{
    CategoryName, Transaction, UserID,
    stores::{CategoryStore, TransactionStore, sqlite::create_stores},
};

/// A utility for creating a database with demo expenses for the expense tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The user to create the expenses for.
    #[arg(long, default_value_t = 1)]
    user_id: i64,
}

const CATEGORIES: [&str; 4] = ["Food", "Housing", "Transport", "Entertainment"];

/// (name, amount, days ago, index into [CATEGORIES])
const TRANSACTIONS: [(&str, f64, i64, Option<usize>); 10] = [
    ("Rent", 1200.0, 40, Some(1)),
    ("Groceries", 84.3, 33, Some(0)),
    ("Bus pass", 50.0, 25, Some(2)),
    ("Cinema", 22.5, 18, Some(3)),
    ("Groceries", 91.75, 12, Some(0)),
    ("Rent", 1200.0, 10, Some(1)),
    ("Coffee", 4.5, 6, Some(0)),
    ("Birthday present", 35.0, 4, None),
    ("Train", 7.2, 2, Some(2)),
    ("Lunch", 14.0, 0, Some(0)),
];

/// Create and populate a database for manual testing.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;
    let (transaction_store, category_store) = create_stores(conn)?;
    let user_id = UserID::new(args.user_id);

    println!("Creating categories...");
    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for name in CATEGORIES {
        let category = category_store
            .create(user_id, CategoryName::new(name)?)
            .await?;
        category_ids.push(category.id);
    }

    println!("Creating transactions...");
    let today = OffsetDateTime::now_utc().date();
    for (name, amount, days_ago, category_index) in TRANSACTIONS {
        let new_transaction = Transaction::build(name, amount)
            .date(today - Duration::days(days_ago))
            .category_id(category_index.map(|index| category_ids[index]))
            .finalize(user_id)?;

        transaction_store.create(new_transaction).await?;
    }

    println!("Success!");

    Ok(())
}
