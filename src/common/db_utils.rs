// src/common/db_utils.rs

use serde::Serialize;

use crate::common::error::AppError;

// ---
// Identificadores dinâmicos
// ---
/// Nomes de tabela/coluna vindos de fora não podem ir direto para o SQL.
/// Só aceitamos snake_case minúsculo, que é o que o schema do BaaS usa.
pub(crate) fn checked_ident(ident: &str) -> Result<&str, AppError> {
    let mut chars = ident.chars();
    let valid_head = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_');
    let valid_tail = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid_head && valid_tail && ident.len() <= 63 {
        Ok(ident)
    } else {
        Err(AppError::InvalidInput(format!("Invalid identifier '{}'", ident)))
    }
}

// ---
// Paginação
// ---
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct Pagination {
    pub current_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = if per_page > 0 { (total + per_page - 1) / per_page } else { 0 };
        Self {
            current_page: page,
            per_page,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    pub fn offset(page: i64, per_page: i64) -> Result<i64, AppError> {
        (page.max(1) - 1)
            .checked_mul(per_page)
            .ok_or_else(|| AppError::InvalidInput("Page is out of range.".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_snake_case_identifiers() {
        assert!(checked_ident("consultation_vitals").is_ok());
        assert!(checked_ident("_private").is_ok());
        assert!(checked_ident("col2").is_ok());
    }

    #[test]
    fn rejects_anything_that_could_escape_sql() {
        assert!(checked_ident("").is_err());
        assert!(checked_ident("Patients").is_err());
        assert!(checked_ident("patients; drop table users").is_err());
        assert!(checked_ident("a\"b").is_err());
        assert!(checked_ident("1abc").is_err());
    }

    #[test]
    fn pagination_math() {
        let p = Pagination::new(2, 10, 25);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next);
        assert!(p.has_prev);
        assert_eq!(Pagination::offset(3, 10).unwrap(), 20);

        let empty = Pagination::new(1, 10, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
    }

    #[test]
    fn huge_page_is_rejected_instead_of_overflowing() {
        assert!(matches!(
            Pagination::offset(100_000_000_000_000_000, 100),
            Err(AppError::InvalidInput(_))
        ));
        assert_eq!(Pagination::offset(i64::MAX, 1).unwrap(), i64::MAX - 1);
    }
}
