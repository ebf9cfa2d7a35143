use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_success, prompt_password};
use crate::cli::{App, OutputFormat};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login and store the session token")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Clear the stored session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Register new user")]
    Register {
        #[arg(help = "Username")]
        username: String,
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },
}

pub async fn handle(app: &App, cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password("Password")?,
            };

            let response = app.auth.login(&username, &password).await?;
            output_success(
                &output_format,
                &format!("Logged in as '{}'", username),
                Some(json!({ "userId": response.user_id, "username": username })),
            )
        }
        AuthCommands::Logout => {
            app.auth.logout()?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Status => match app.session.user() {
            Some(user) if app.session.is_authenticated() => output_success(
                &output_format,
                &format!("Logged in as '{}'", user.username),
                Some(json!({ "userId": user.id, "username": user.username })),
            ),
            _ => {
                crate::cli::utils::output_error(&output_format, "Not logged in")?;
                std::process::exit(1);
            }
        },
        AuthCommands::Register {
            username,
            email,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password("Password")?,
            };

            let created = app.auth.register(&username, &email, &password).await?;
            output_success(
                &output_format,
                &format!("User '{}' registered, you can now login", created.username),
                Some(json!({ "id": created.id, "email": created.email })),
            )
        }
    }
}
