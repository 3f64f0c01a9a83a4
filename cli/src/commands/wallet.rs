//! # Wallet Command
//!
//! ```bash
//! portal wallet
//! portal wallet --transactions --page 2
//! ```

use anyhow::Result;
use colored::Colorize;

use crate::api::{ApiClient, PageRequest, Transaction, format_amount};
use crate::exit_codes::*;

use super::{build_client, print_json, report};

/// Arguments for the wallet command
#[derive(Debug, Clone)]
pub struct WalletArgs {
    /// List transactions instead of the balance
    pub transactions: bool,
    /// Transaction page
    pub page: u32,
    /// Transactions per page
    pub limit: u32,
    /// Output as JSON
    pub json: bool,
}

/// Execute the wallet command
pub async fn execute(args: WalletArgs) -> Result<i32> {
    let client = build_client()?;
    run(&client, &args).await
}

pub(crate) async fn run(client: &ApiClient, args: &WalletArgs) -> Result<i32> {
    if args.transactions {
        return run_transactions(client, args).await;
    }

    let wallet = match client.wallet().await {
        Ok(wallet) => wallet,
        Err(e) => return Ok(report(&e)),
    };

    if args.json {
        print_json(&wallet)?;
        return Ok(EXIT_SUCCESS);
    }

    println!("{} {}", "Balance:".bold(), wallet.formatted_balance().green());
    if let Some(pending) = wallet.pending_balance {
        println!(
            "{} {}",
            "Pending:".dimmed(),
            format_amount(pending, wallet.currency.as_deref())
        );
    }
    Ok(EXIT_SUCCESS)
}

async fn run_transactions(client: &ApiClient, args: &WalletArgs) -> Result<i32> {
    let request = PageRequest::new(args.page, args.limit);
    let page = match client.wallet_transactions(request).await {
        Ok(page) => page,
        Err(e) => return Ok(report(&e)),
    };

    if args.json {
        print_json(&page)?;
        return Ok(EXIT_SUCCESS);
    }

    if page.data.is_empty() {
        println!("{}", "No transactions.".dimmed());
        return Ok(EXIT_SUCCESS);
    }

    for transaction in &page.data {
        println!("{}", transaction_line(transaction));
    }

    if let Some(pages) = page.total_pages() {
        println!();
        println!(
            "{}",
            format!("Page {} of {}", request.page, pages).dimmed()
        );
    }
    if page.has_more() {
        println!(
            "  {} Run with --page {} for more",
            "→".cyan(),
            request.next().page
        );
    }
    Ok(EXIT_SUCCESS)
}

fn transaction_line(transaction: &Transaction) -> String {
    let amount = format!("{:>10.2}", transaction.amount);
    let amount = if transaction.amount < 0.0 {
        amount.red().to_string()
    } else {
        amount.green().to_string()
    };
    format!(
        "{}  {}  {:<8}  {}",
        transaction.created_at.as_deref().unwrap_or("-"),
        amount,
        transaction.kind.as_deref().unwrap_or("-"),
        transaction
            .description
            .as_deref()
            .or(transaction.status.as_deref())
            .unwrap_or("")
    )
}
