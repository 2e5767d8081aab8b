//! Category display formatting

use crate::models::{Category, CategoryKind};

/// Categories grouped under an income and an expense heading
pub fn format_category_list(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No hay categorías.\n\nEjecuta 'laplata category seed' para crear las predeterminadas."
            .to_string();
    }

    let mut output = String::new();
    for (kind, heading) in [
        (CategoryKind::Income, "Ingresos"),
        (CategoryKind::Expense, "Gastos"),
    ] {
        let group: Vec<&Category> = categories.iter().filter(|c| c.kind == kind).collect();
        if group.is_empty() {
            continue;
        }
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&format!("{}\n", heading));
        for (i, category) in group.iter().enumerate() {
            let prefix = if i == group.len() - 1 { "└── " } else { "├── " };
            output.push_str(&format!("  {}{}  ({})\n", prefix, category.name, category.id));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;

    #[test]
    fn test_grouped_by_kind() {
        let owner = UserId::new();
        let categories = vec![
            Category::new(owner, "Comida", CategoryKind::Expense),
            Category::new(owner, "Salario", CategoryKind::Income),
        ];
        let output = format_category_list(&categories);
        let income_at = output.find("Ingresos").unwrap();
        let expense_at = output.find("Gastos").unwrap();
        assert!(income_at < expense_at);
        assert!(output.contains("└── Comida"));
    }
}
