use clap::Subcommand;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{account_line, format_money, output_success, require_login};
use crate::cli::{App, OutputFormat};

#[derive(Subcommand)]
pub enum AccountCommands {
    #[command(about = "List your accounts")]
    List,

    #[command(about = "Show one account")]
    Get {
        #[arg(help = "Account id")]
        id: Uuid,
    },

    #[command(about = "Open a new account")]
    Create {
        #[arg(help = "Account name")]
        name: String,
        #[arg(long, default_value = "0", help = "Initial balance")]
        balance: Decimal,
    },

    #[command(about = "Rename an account")]
    Rename {
        #[arg(help = "Account id")]
        id: Uuid,
        #[arg(help = "New account name")]
        name: String,
    },

    #[command(about = "Close an account")]
    Delete {
        #[arg(help = "Account id")]
        id: Uuid,
    },
}

pub async fn handle(
    app: &App,
    cmd: AccountCommands,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        AccountCommands::List => {
            let user = require_login(&app.session)?;
            let accounts = app.accounts.user_accounts(user.id).await?;

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&accounts)?);
                }
                OutputFormat::Text => {
                    if accounts.is_empty() {
                        println!("You have no accounts yet");
                    } else {
                        for account in &accounts {
                            println!("{}", account_line(account));
                        }
                    }
                }
            }
            Ok(())
        }
        AccountCommands::Get { id } => {
            require_login(&app.session)?;
            let account = app.accounts.account(id).await?;

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&account)?);
                }
                OutputFormat::Text => {
                    println!("{}", account.account_name);
                    println!("Account No: {}", account.account_number);
                    println!(
                        "Balance: {}",
                        format_money(account.balance, &account.currency)
                    );
                    println!("Created At: {}", account.created_at);
                }
            }
            Ok(())
        }
        AccountCommands::Create { name, balance } => {
            let user = require_login(&app.session)?;
            let account = app.accounts.create(user.id, &name, balance).await?;

            output_success(
                &output_format,
                &format!(
                    "Account '{}' created with number {}",
                    account.account_name, account.account_number
                ),
                Some(json!({ "account": account })),
            )
        }
        AccountCommands::Rename { id, name } => {
            require_login(&app.session)?;
            let account = app.accounts.rename(id, &name).await?;

            output_success(
                &output_format,
                &format!("Account renamed to '{}'", account.account_name),
                Some(json!({ "account": account })),
            )
        }
        AccountCommands::Delete { id } => {
            require_login(&app.session)?;
            app.accounts.delete(id).await?;

            output_success(
                &output_format,
                "Account deleted",
                Some(json!({ "id": id })),
            )
        }
    }
}
