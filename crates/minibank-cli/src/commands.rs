//! Command-line parsing and execution.

use std::io::{self, Write};

use anyhow::{anyhow, bail, Context, Result};
use minibank_core::api::client::DEFAULT_PAGE_SIZE;
use minibank_core::models::{
    AccountCreateRequest, AccountSearch, AccountType, RegisterRequest, TransactionFilter, TransferRequest,
};
use minibank_core::{BankingClient, Config};

use crate::output;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { username: Option<String> },
    Register,
    Logout,
    WhoAmI,
    Accounts { search: AccountSearchArgs },
    Account { id: String },
    CreateAccount { name: String, account_type: AccountType, initial_balance: f64 },
    Transfer { from: String, to: String, amount: f64, description: String },
    Balance { id: String },
    History { id: String, page: Option<u32>, size: Option<u32> },
    Help,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountSearchArgs {
    pub number: Option<String>,
    pub name: Option<String>,
}

pub const USAGE: &str = "\
Usage: minibank <command> [args]

Commands:
  login [username]                              Log in and store credentials
  register                                      Create a new user
  logout                                        End the session
  whoami                                        Show the cached user
  accounts [--number N] [--name S]              List or search accounts
  account <id>                                  Show one account
  create-account <name> <TRY|USD|GOLD> [initial]
  transfer <from> <to> <amount> [description]
  balance <id>                                  Show an account balance
  history <id> [--page P] [--size S]            Paged transaction history
";

fn parse_amount(raw: &str) -> Result<f64> {
    let amount: f64 = raw
        .parse()
        .with_context(|| format!("Invalid amount: {}", raw))?;
    if !amount.is_finite() {
        bail!("Invalid amount: {}", raw);
    }
    Ok(amount)
}

/// Pull `--flag value` pairs out of `args`, returning the positionals.
fn split_flags<'a>(args: &'a [String], flags: &[&'static str]) -> Result<(Vec<&'a str>, Vec<(&'a str, &'a str)>)> {
    let mut positionals = Vec::new();
    let mut found = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(flag) = flags.iter().find(|f| **f == arg.as_str()) {
            let value = iter.next().ok_or_else(|| anyhow!("{} requires a value", flag))?;
            found.push((*flag, value.as_str()));
        } else if arg.starts_with("--") {
            bail!("Unknown option: {}", arg);
        } else {
            positionals.push(arg.as_str());
        }
    }
    Ok((positionals, found))
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };

        match name.as_str() {
            "login" => Ok(Command::Login {
                username: rest.first().cloned(),
            }),
            "register" => Ok(Command::Register),
            "logout" => Ok(Command::Logout),
            "whoami" => Ok(Command::WhoAmI),
            "accounts" => {
                let (positionals, flags) = split_flags(rest, &["--number", "--name"])?;
                if !positionals.is_empty() {
                    bail!("accounts takes no positional arguments");
                }
                let mut search = AccountSearchArgs::default();
                for (flag, value) in flags {
                    match flag {
                        "--number" => search.number = Some(value.to_string()),
                        _ => search.name = Some(value.to_string()),
                    }
                }
                Ok(Command::Accounts { search })
            }
            "account" | "balance" => {
                let id = rest.first().cloned().ok_or_else(|| anyhow!("{} requires an account id", name))?;
                if name == "account" {
                    Ok(Command::Account { id })
                } else {
                    Ok(Command::Balance { id })
                }
            }
            "create-account" => {
                let (name_arg, kind) = match rest {
                    [n, k, ..] => (n, k),
                    _ => bail!("create-account requires <name> <TRY|USD|GOLD>"),
                };
                let account_type =
                    AccountType::parse(kind).ok_or_else(|| anyhow!("Unknown account type: {}", kind))?;
                let initial_balance = match rest.get(2) {
                    Some(raw) => parse_amount(raw)?,
                    None => 0.0,
                };
                Ok(Command::CreateAccount {
                    name: name_arg.clone(),
                    account_type,
                    initial_balance,
                })
            }
            "transfer" => match rest {
                [from, to, amount, description @ ..] => Ok(Command::Transfer {
                    from: from.clone(),
                    to: to.clone(),
                    amount: parse_amount(amount)?,
                    description: description.join(" "),
                }),
                _ => bail!("transfer requires <from> <to> <amount>"),
            },
            "history" => {
                let (positionals, flags) = split_flags(rest, &["--page", "--size"])?;
                let id = positionals
                    .first()
                    .map(|s| s.to_string())
                    .ok_or_else(|| anyhow!("history requires an account id"))?;
                let mut page = None;
                let mut size = None;
                for (flag, value) in flags {
                    let parsed: u32 = value
                        .parse()
                        .with_context(|| format!("{} must be a non-negative number", flag))?;
                    match flag {
                        "--page" => page = Some(parsed),
                        _ => size = Some(parsed),
                    }
                }
                Ok(Command::History { id, page, size })
            }
            "help" | "--help" | "-h" => Ok(Command::Help),
            other => bail!("Unknown command: {}\n\n{}", other, USAGE),
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

pub async fn run(command: Command, client: &BankingClient, config: &mut Config) -> Result<()> {
    match command {
        Command::Help => print!("{}", USAGE),

        Command::Login { username } => {
            let username = match username.or_else(|| config.last_username.clone()) {
                Some(last) => {
                    let input = prompt(&format!("Username [{}]: ", last))?;
                    if input.is_empty() {
                        last
                    } else {
                        input
                    }
                }
                None => prompt("Username: ")?,
            };
            if username.is_empty() {
                bail!("Username required");
            }
            let password = rpassword::prompt_password("Password: ")?;

            let user = client.login(&username, &password).await?;

            config.last_username = Some(username);
            if let Err(e) = config.save() {
                tracing::warn!(error = %e, "Failed to save config");
            }
            println!("Logged in as {}", user.display_name());
        }

        Command::Register => {
            let username = prompt("Username: ")?;
            let email = prompt("Email: ")?;
            let first_name = prompt("First name (optional): ")?;
            let last_name = prompt("Last name (optional): ")?;
            let password = rpassword::prompt_password("Password: ")?;
            let confirm = rpassword::prompt_password("Confirm password: ")?;
            if password != confirm {
                bail!("Passwords do not match");
            }

            let request = RegisterRequest {
                username,
                email,
                password,
                first_name: Some(first_name).filter(|s| !s.is_empty()),
                last_name: Some(last_name).filter(|s| !s.is_empty()),
            };
            client.register(&request).await?;
            println!("Registration successful. Run `minibank login` to sign in.");
        }

        Command::Logout => {
            if let Err(e) = client.logout().await {
                tracing::warn!(error = %e, "Server logout failed");
            }
            println!("Logged out");
        }

        Command::WhoAmI => match client.current_user() {
            Some(user) => output::print_user(&user),
            None => println!("Not logged in"),
        },

        Command::Accounts { search } => {
            let filter = AccountSearch {
                number: search.number,
                name: search.name,
            };
            let accounts = client.search_accounts(&filter).await?;
            output::print_accounts(&accounts);
        }

        Command::Account { id } => {
            let account = client.get_account(&id).await?;
            output::print_account(&account);
        }

        Command::CreateAccount {
            name,
            account_type,
            initial_balance,
        } => {
            let account = client
                .create_account(&AccountCreateRequest {
                    name,
                    account_type,
                    initial_balance,
                })
                .await?;
            println!("Created account");
            output::print_account(&account);
        }

        Command::Transfer {
            from,
            to,
            amount,
            description,
        } => {
            let response = client
                .transfer(&TransferRequest {
                    from_account_id: from,
                    to_account_id: to,
                    amount,
                    description,
                })
                .await?;
            output::print_transfer(&response);
        }

        Command::Balance { id } => {
            let balance = client.account_balance(&id).await?;
            println!("{}: {}", balance.account_id, minibank_core::utils::format_amount(balance.balance));
        }

        Command::History { id, page, size } => {
            if page.is_none() && size.is_none() {
                let transactions = client.transaction_history(&id, &TransactionFilter::default()).await?;
                output::print_transactions(&transactions);
            } else {
                let page = client
                    .transaction_history_paginated(&id, page.unwrap_or(0), size.unwrap_or(DEFAULT_PAGE_SIZE))
                    .await?;
                output::print_transaction_page(&page);
            }
        }
    }

    Ok(())
}
