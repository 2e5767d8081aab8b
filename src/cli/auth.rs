//! Account and session CLI commands
//!
//! Passwords are read from the terminal without echo unless given through
//! `LAPLATA_PASSWORD`, which scripts and tests use.

use clap::Subcommand;
use tracing::error;

use super::{saved, CommandFailure, CommandResult};
use crate::app::App;
use crate::auth::Password;
use crate::forms::{LoginForm, RegisterForm};
use crate::i18n::UNEXPECTED;
use crate::services::AuthResponse;

pub const PASSWORD_ENV: &str = "LAPLATA_PASSWORD";

/// Auth subcommands
#[derive(Subcommand)]
pub enum AuthCommands {
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        email: String,
        /// Display name
        #[arg(short, long)]
        name: String,
        /// Accept the terms and conditions
        #[arg(long)]
        accept_terms: bool,
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign out
    Logout,
    /// Send a password recovery e-mail
    ResetPassword { email: String },
    /// Change the password of the signed-in user
    Password {
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },
    /// Change the display name or e-mail
    Profile {
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Show the signed-in user
    Whoami,
}

fn read_password(given: Option<String>, prompt: &str) -> Result<Password, CommandFailure> {
    match given {
        Some(password) => Ok(Password::new(password)),
        None => rpassword::prompt_password(prompt)
            .map(Password::new)
            .map_err(|e| CommandFailure(format!("No se pudo leer la contraseña: {}", e))),
    }
}

fn answered(response: AuthResponse) -> Result<AuthResponse, CommandFailure> {
    if response.success {
        Ok(response)
    } else {
        Err(CommandFailure(response.message))
    }
}

pub fn handle_auth_command(app: &App, cmd: AuthCommands) -> CommandResult {
    match cmd {
        AuthCommands::Register {
            email,
            name,
            accept_terms,
            password,
        } => {
            let prompted = password.is_none();
            let password = read_password(password, "Contraseña: ")?;
            let confirm_password = if prompted {
                read_password(None, "Confirmar contraseña: ")?
            } else {
                password.clone()
            };
            let form = RegisterForm {
                email,
                password,
                confirm_password,
                name,
                terms_accepted: accept_terms,
            };
            if let Some(response) = saved(form.submit(&app.auth))? {
                println!("{}", response.message);
            }
        }

        AuthCommands::Login { email, password } => {
            let form = LoginForm {
                email,
                password: read_password(password, "Contraseña: ")?,
            };
            if let Some(response) = saved(form.submit(&app.auth))? {
                println!("{}", response.message);
                if let Some(user) = response.user {
                    println!("Hola, {}", user.display_name());
                }
            }
        }

        AuthCommands::Logout => {
            println!("{}", answered(app.auth.logout())?.message);
        }

        AuthCommands::ResetPassword { email } => {
            println!("{}", answered(app.auth.reset_password(&email))?.message);
        }

        AuthCommands::Password { password } => {
            let password = read_password(password, "Nueva contraseña: ")?;
            println!("{}", answered(app.auth.update_password(password))?.message);
        }

        AuthCommands::Profile { name, email } => {
            if name.is_none() && email.is_none() {
                println!("Sin cambios. Usa --name o --email.");
                return Ok(());
            }
            println!("{}", answered(app.auth.update_profile(name, email))?.message);
        }

        AuthCommands::Whoami => match app.auth.current_user() {
            Ok(Some(user)) => {
                println!("{} <{}>", user.display_name(), user.email);
                println!("  ID: {}", user.id);
            }
            Ok(None) => println!("No hay sesión iniciada."),
            Err(e) => {
                error!(error = %e, "could not read session");
                return Err(CommandFailure(UNEXPECTED.to_string()));
            }
        },
    }

    Ok(())
}
