//! Plain-text rendering of API results.

use minibank_core::models::{Account, Transaction, TransactionPage, TransferResponse, User};
use minibank_core::utils::{format_amount, format_date, truncate_string};

/// Width of the account name column
const NAME_COLUMN_WIDTH: usize = 28;

pub fn print_user(user: &User) {
    println!("{}", user.display_name());
    if let Some(ref username) = user.username {
        println!("  username: {}", username);
    }
    if let Some(ref email) = user.email {
        println!("  email:    {}", email);
    }
}

pub fn print_accounts(accounts: &[Account]) {
    if accounts.is_empty() {
        println!("No accounts found");
        return;
    }
    println!(
        "{:<38} {:<12} {:<width$} {:<5} {:>16}",
        "ID",
        "NUMBER",
        "NAME",
        "TYPE",
        "BALANCE",
        width = NAME_COLUMN_WIDTH
    );
    for account in accounts {
        println!(
            "{:<38} {:<12} {:<width$} {:<5} {:>16}",
            account.id,
            account.number.as_deref().unwrap_or("-"),
            truncate_string(account.name.as_deref().unwrap_or("-"), NAME_COLUMN_WIDTH),
            account.account_type.as_deref().unwrap_or("-"),
            format_amount(account.balance),
            width = NAME_COLUMN_WIDTH
        );
    }
}

pub fn print_account(account: &Account) {
    println!("{}", account.display_name());
    println!("  id:      {}", account.id);
    if let Some(ref kind) = account.account_type {
        println!("  type:    {}", kind);
    }
    println!("  balance: {}", format_amount(account.balance));
    if let Some(ref created) = account.created_at {
        println!("  opened:  {}", format_date(created));
    }
}

pub fn print_transfer(response: &TransferResponse) {
    println!(
        "{} {} ({})",
        response.message.as_deref().unwrap_or("Transfer submitted"),
        format_amount(response.amount),
        response.status.as_deref().unwrap_or("UNKNOWN")
    );
    if let Some(id) = response.transaction_id {
        println!("  transaction: {}", id);
    }
}

pub fn print_transactions(transactions: &[Transaction]) {
    if transactions.is_empty() {
        println!("No transactions");
        return;
    }
    for tx in transactions {
        println!(
            "{:<20} {:>14}  {:<9} {}",
            tx.transaction_date.as_deref().map(format_date).unwrap_or_default(),
            format_amount(tx.signed_amount()),
            tx.status.as_deref().unwrap_or("-"),
            tx.other_account_id.as_deref().unwrap_or("-")
        );
    }
}

pub fn print_transaction_page(page: &TransactionPage) {
    print_transactions(&page.transactions);
    println!(
        "Page {} of {} ({} transactions){}{}",
        page.current_page + 1,
        page.total_pages.max(1),
        page.total_elements,
        if page.has_previous { "  [--page for previous]" } else { "" },
        if page.has_next { "  [--page for next]" } else { "" }
    );
}
