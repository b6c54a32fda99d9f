use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::OffsetDateTime;

use ledgerly::{
    PasswordHash, Period, ValidatedPassword,
    account::{AccountType, NewAccount, create_account},
    balance::set_opening,
    initialize_db,
    transaction::{NewTransaction, TransactionType, create_transaction},
    user::create_user,
};

/// A utility for creating a demo database for the REST API server of ledgerly.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
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

    initialize_db(&conn)?;

    println!("Creating demo user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user("demo@example.com".parse()?, password_hash, &conn)?;

    println!("Creating demo accounts...");

    let checking = create_account(
        &NewAccount {
            name: "Checking".to_owned(),
            account_type: AccountType::Debit,
            notes: "everyday spending".to_owned(),
        },
        user.id,
        &conn,
    )?;
    let visa = create_account(
        &NewAccount {
            name: "Visa".to_owned(),
            account_type: AccountType::Credit,
            notes: String::new(),
        },
        user.id,
        &conn,
    )?;

    println!("Recording opening balances and transactions...");

    let today = OffsetDateTime::now_utc().date();
    let month = Period::from(today);

    set_opening(month.name(), checking.id, 2500.0, user.id, &conn)?;
    set_opening(month.name(), visa.id, 150.0, user.id, &conn)?;

    create_transaction(
        &NewTransaction {
            date: month.first_day(today.year()),
            account_id: checking.id,
            category: "Salary".to_owned(),
            description: "monthly pay".to_owned(),
            transaction_type: TransactionType::Income,
            amount: 3200.0,
        },
        user.id,
        &conn,
    )?;
    create_transaction(
        &NewTransaction {
            date: today,
            account_id: checking.id,
            category: "Rent".to_owned(),
            description: String::new(),
            transaction_type: TransactionType::Expense,
            amount: 1400.0,
        },
        user.id,
        &conn,
    )?;
    create_transaction(
        &NewTransaction {
            date: today,
            account_id: visa.id,
            category: "Food".to_owned(),
            description: "groceries".to_owned(),
            transaction_type: TransactionType::Expense,
            amount: 86.40,
        },
        user.id,
        &conn,
    )?;

    println!("Success!");

    Ok(())
}
