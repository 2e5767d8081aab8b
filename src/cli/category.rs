//! Category CLI commands

use std::time::Instant;

use clap::Subcommand;

use super::{fail, not_found, saved, CommandFailure, CommandResult};
use crate::app::App;
use crate::display::format_category_list;
use crate::forms::CategoryForm;
use crate::i18n::{Action, Subject};
use crate::models::{Category, CategoryKind};

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List categories
    List {
        /// Only one kind (income or expense)
        #[arg(short, long)]
        kind: Option<String>,
    },
    /// Create a category
    Add {
        /// Category name
        name: String,
        /// Kind: income or expense (ingreso / gasto also accepted)
        #[arg(short, long)]
        kind: String,
    },
    /// Rename a category or change its kind
    Edit {
        /// Category name or ID
        category: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        kind: Option<String>,
    },
    /// Delete a category; its transactions become uncategorized
    Delete {
        /// Category name or ID
        category: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// Create the starter categories
    Seed,
}

fn parse_kind(value: &str) -> Result<CategoryKind, CommandFailure> {
    CategoryKind::parse(value).ok_or_else(|| {
        CommandFailure(format!(
            "Tipo inválido: '{}'. Usa 'income' o 'expense'",
            value
        ))
    })
}

fn lookup(app: &App, identifier: &str) -> Result<Category, CommandFailure> {
    app.categories
        .find(identifier, None)
        .map_err(fail(Subject::Category, Action::Load))?
        .ok_or_else(|| not_found("la categoría", identifier))
}

pub fn handle_category_command(app: &App, cmd: CategoryCommands) -> CommandResult {
    match cmd {
        CategoryCommands::List { kind } => {
            let categories = match kind {
                Some(kind) => app.categories.list_by_kind(parse_kind(&kind)?),
                None => app.categories.list(),
            }
            .map_err(fail(Subject::Category, Action::Load))?;
            print!("{}", format_category_list(&categories));
        }

        CategoryCommands::Add { name, kind } => {
            let mut form = CategoryForm::create();
            form.name = name;
            form.kind = Some(parse_kind(&kind)?);
            if let Some(category) = saved(form.submit(&app.categories, Instant::now()))? {
                println!("Categoría creada: {} ({})", category.name, category.kind);
            }
        }

        CategoryCommands::Edit {
            category,
            name,
            kind,
        } => {
            if name.is_none() && kind.is_none() {
                println!("Sin cambios. Usa --name o --kind.");
                return Ok(());
            }
            let found = lookup(app, &category)?;
            let mut form = CategoryForm::edit(&found);
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(kind) = kind {
                form.kind = Some(parse_kind(&kind)?);
            }
            if let Some(updated) = saved(form.submit(&app.categories, Instant::now()))? {
                println!("Categoría actualizada: {} ({})", updated.name, updated.kind);
            }
        }

        CategoryCommands::Delete { category, yes } => {
            let found = lookup(app, &category)?;
            if !yes {
                println!(
                    "Se eliminará '{}'. Repite con --yes para confirmar.",
                    found.name
                );
                return Ok(());
            }
            let mut form = CategoryForm::edit(&found);
            form.request_delete();
            saved(form.confirm_delete(&app.categories, Instant::now()))?;
            println!("Categoría eliminada: {}", found.name);
        }

        CategoryCommands::Seed => {
            let created = app
                .dashboard
                .initialize_user_data()
                .map_err(fail(Subject::Category, Action::Create))?;
            if created.is_empty() {
                println!("Las categorías predeterminadas ya existen.");
            } else {
                println!("Se crearon {} categorías:", created.len());
                for category in &created {
                    println!("  {} ({})", category.name, category.kind);
                }
            }
        }
    }

    Ok(())
}
