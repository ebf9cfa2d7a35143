use clap::Subcommand;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{format_money, output_success, require_login};
use crate::cli::{App, OutputFormat};
use crate::error::ClientError;
use crate::models::{Account, Transaction};
use crate::services::TransferRequest;

#[derive(Subcommand)]
pub enum TransactionCommands {
    #[command(about = "Deposit funds into an account")]
    Deposit {
        #[arg(help = "Account id")]
        account_id: Uuid,
        #[arg(help = "Amount")]
        amount: Decimal,
    },

    #[command(about = "Withdraw funds from an account")]
    Withdraw {
        #[arg(help = "Account id")]
        account_id: Uuid,
        #[arg(help = "Amount")]
        amount: Decimal,
    },

    #[command(about = "Transfer funds to another account")]
    Transfer {
        #[arg(help = "Source account id")]
        source: Uuid,
        #[arg(help = "Amount")]
        amount: Decimal,
        #[arg(long, help = "Target account id (internal transfer)")]
        to_account: Option<Uuid>,
        #[arg(long, help = "Target account number (external transfer)")]
        to_number: Option<String>,
    },

    #[command(about = "Show transaction history, for one account or all")]
    History {
        #[arg(help = "Account id (omit for all accounts)")]
        account_id: Option<Uuid>,
    },
}

pub async fn handle(
    app: &App,
    cmd: TransactionCommands,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        TransactionCommands::Deposit { account_id, amount } => {
            require_login(&app.session)?;
            let transaction = app.transactions.deposit(account_id, amount).await?;

            output_success(
                &output_format,
                &format!("Deposited {}", format_money(amount, "TRY")),
                Some(json!({ "transaction": transaction })),
            )
        }
        TransactionCommands::Withdraw { account_id, amount } => {
            let user = require_login(&app.session)?;
            advisory_balance_check(app, user.id, account_id, amount).await?;
            let transaction = app.transactions.withdraw(account_id, amount).await?;

            output_success(
                &output_format,
                &format!("Withdrew {}", format_money(amount, "TRY")),
                Some(json!({ "transaction": transaction })),
            )
        }
        TransactionCommands::Transfer {
            source,
            amount,
            to_account,
            to_number,
        } => {
            let user = require_login(&app.session)?;
            advisory_balance_check(app, user.id, source, amount).await?;

            // Both target flags pass through untouched so the exclusivity
            // check happens in one place, before dispatch
            let request = TransferRequest {
                source_account_id: source,
                target_account_id: to_account,
                target_account_number: to_number,
                amount,
            };
            let transaction = app.transactions.transfer(&request).await?;

            output_success(
                &output_format,
                &format!("Transferred {}", format_money(amount, "TRY")),
                Some(json!({ "transaction": transaction })),
            )
        }
        TransactionCommands::History { account_id } => match account_id {
            Some(account_id) => {
                require_login(&app.session)?;
                let account = app.accounts.account(account_id).await?;
                let history = app.transactions.history(account_id).await?;

                match output_format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&history)?),
                    OutputFormat::Text => {
                        if history.is_empty() {
                            println!("No transactions found");
                        }
                        for transaction in &history {
                            println!("{}", history_line(transaction, &account));
                        }
                    }
                }
                Ok(())
            }
            None => {
                let user = require_login(&app.session)?;
                let accounts = app.accounts.user_accounts(user.id).await?;
                let merged = app.transactions.all_history(&accounts).await?;

                match output_format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&merged)?),
                    OutputFormat::Text => {
                        if merged.is_empty() {
                            println!("No transaction records found");
                        }
                        for row in &merged {
                            let sign = row.direction().sign();
                            println!(
                                "{}  {:<12} {}  {}{}",
                                row.transaction.transaction_date,
                                row.account_name,
                                serde_json::to_value(row.transaction.kind)?
                                    .as_str()
                                    .unwrap_or_default(),
                                sign,
                                format_money(row.transaction.amount, "TRY")
                            );
                        }
                    }
                }
                Ok(())
            }
        },
    }
}

/// Client-side balance check before dispatching a debit. Advisory UX only;
/// the backend is the authority on whether funds suffice.
async fn advisory_balance_check(
    app: &App,
    user_id: Uuid,
    source_account_id: Uuid,
    amount: Decimal,
) -> anyhow::Result<()> {
    let accounts = app.accounts.user_accounts(user_id).await?;
    if let Some(source) = accounts.iter().find(|a| a.id == source_account_id) {
        if source.balance < amount {
            return Err(ClientError::field_error("amount", "Insufficient balance").into());
        }
    }
    Ok(())
}

fn history_line(transaction: &Transaction, account: &Account) -> String {
    let direction = transaction.direction_for(&account.account_number);
    format!(
        "{}  {} -> {}  {}{}",
        transaction.transaction_date,
        transaction.source_account_number,
        transaction.target_account_number,
        direction.sign(),
        format_money(transaction.amount, &account.currency)
    )
}
