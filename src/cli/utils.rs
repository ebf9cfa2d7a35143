use std::io::Write;

use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::models::Account;
use crate::session::{SessionStore, SessionUser};

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(Value::Object(map)) = data {
                response.as_object_mut().expect("object").extend(map);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "success": false,
                    "error": message
                }))?
            );
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Route guard for session-dependent commands: resolve the logged-in user
/// from the persisted session before touching the network, or fail with a
/// login hint. The backend enforces authorization on its own regardless.
pub fn require_login(session: &SessionStore) -> anyhow::Result<SessionUser> {
    if !session.is_authenticated() {
        anyhow::bail!("Not logged in. Run 'bank auth login <username>' first");
    }
    session
        .user()
        .ok_or_else(|| anyhow::anyhow!("Session is missing user identity; login again"))
}

/// Read a password from stdin when it was not passed as a flag.
pub fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    print!("{}: ", prompt);
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn format_money(amount: rust_decimal::Decimal, currency: &str) -> String {
    format!("{:.2} {}", amount, currency)
}

/// One-line text rendering of an account for list output.
pub fn account_line(account: &Account) -> String {
    format!(
        "{}  {}  {}  [{}]",
        account.id,
        account.account_number,
        format_money(account.balance, &account.currency),
        account.account_name
    )
}
