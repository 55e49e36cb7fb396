//! Backend-specific rendering of the statements a migration plan can hold.

use crate::db::Backend;

/// DDL flavour for nullability changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `ALTER COLUMN c SET NOT NULL` / `ALTER COLUMN c DROP NOT NULL`
    Standard,
    /// `MODIFY c <type> NOT NULL` / `MODIFY c <type> NULL`
    MySql,
}

impl Dialect {
    /// Pick the dialect from a backend identifier string.
    pub fn from_backend_name(name: &str) -> Self {
        match Backend::from_name(name) {
            Backend::MySql => Dialect::MySql,
            _ => Dialect::Standard,
        }
    }
}

/// Renders SQL with every identifier passed through the backend's quoting function.
pub struct SqlRenderer<'q> {
    dialect: Dialect,
    quote: &'q dyn Fn(&str) -> String,
}

impl<'q> SqlRenderer<'q> {
    pub fn new(dialect: Dialect, quote: &'q dyn Fn(&str) -> String) -> Self {
        Self { dialect, quote }
    }

    fn q(&self, name: &str) -> String {
        (self.quote)(name)
    }

    pub fn add_column(&self, table: &str, column: &str, db_type: &str) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            self.q(table),
            self.q(column),
            db_type
        )
    }

    pub fn copy_column(&self, table: &str, target: &str, source: &str) -> String {
        format!(
            "UPDATE {} SET {} = {}",
            self.q(table),
            self.q(target),
            self.q(source)
        )
    }

    /// Fill absent or empty values with a literal placeholder.
    pub fn backfill(&self, table: &str, column: &str, placeholder: &str) -> String {
        let column = self.q(column);
        format!(
            "UPDATE {} SET {} = '{}' WHERE {} IS NULL OR {} = ''",
            self.q(table),
            column,
            placeholder.replace('\'', "''"),
            column,
            column
        )
    }

    pub fn set_not_null(&self, table: &str, column: &str, db_type: &str) -> String {
        match self.dialect {
            Dialect::Standard => format!(
                "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL",
                self.q(table),
                self.q(column)
            ),
            Dialect::MySql => format!(
                "ALTER TABLE {} MODIFY {} {} NOT NULL",
                self.q(table),
                self.q(column),
                db_type
            ),
        }
    }

    pub fn drop_not_null(&self, table: &str, column: &str, db_type: &str) -> String {
        match self.dialect {
            Dialect::Standard => format!(
                "ALTER TABLE {} ALTER COLUMN {} DROP NOT NULL",
                self.q(table),
                self.q(column)
            ),
            Dialect::MySql => format!(
                "ALTER TABLE {} MODIFY {} {} NULL",
                self.q(table),
                self.q(column),
                db_type
            ),
        }
    }

    pub fn drop_column(&self, table: &str, column: &str) -> String {
        format!("ALTER TABLE {} DROP COLUMN {}", self.q(table), self.q(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{quote_ident, quote_ident_mysql};

    #[test]
    fn test_dialect_from_backend_name() {
        assert_eq!(Dialect::from_backend_name("MySQL"), Dialect::MySql);
        assert_eq!(Dialect::from_backend_name("PostgreSQL"), Dialect::Standard);
        assert_eq!(Dialect::from_backend_name("SQLite"), Dialect::Standard);
    }

    #[test]
    fn test_standard_statements() {
        let quote = |n: &str| quote_ident(n);
        let sql = SqlRenderer::new(Dialect::Standard, &quote);

        assert_eq!(
            sql.add_column("article", "title_fr", "varchar(200)"),
            r#"ALTER TABLE "article" ADD COLUMN "title_fr" varchar(200)"#
        );
        assert_eq!(
            sql.copy_column("article", "title_en", "title"),
            r#"UPDATE "article" SET "title_en" = "title""#
        );
        assert_eq!(
            sql.set_not_null("article", "title_en", "varchar(200)"),
            r#"ALTER TABLE "article" ALTER COLUMN "title_en" SET NOT NULL"#
        );
        assert_eq!(
            sql.drop_not_null("article", "title_de", "varchar(200)"),
            r#"ALTER TABLE "article" ALTER COLUMN "title_de" DROP NOT NULL"#
        );
        assert_eq!(
            sql.drop_column("article", "title"),
            r#"ALTER TABLE "article" DROP COLUMN "title""#
        );
    }

    #[test]
    fn test_mysql_restates_column_type() {
        let quote = |n: &str| quote_ident_mysql(n);
        let sql = SqlRenderer::new(Dialect::MySql, &quote);

        assert_eq!(
            sql.set_not_null("article", "title_en", "varchar(200)"),
            "ALTER TABLE `article` MODIFY `title_en` varchar(200) NOT NULL"
        );
        assert_eq!(
            sql.drop_not_null("article", "title_de", "varchar(200)"),
            "ALTER TABLE `article` MODIFY `title_de` varchar(200) NULL"
        );
    }

    #[test]
    fn test_backfill_escapes_literal() {
        let quote = |n: &str| quote_ident(n);
        let sql = SqlRenderer::new(Dialect::Standard, &quote);
        assert_eq!(
            sql.backfill("article", "title_en", "it's empty"),
            r#"UPDATE "article" SET "title_en" = 'it''s empty' WHERE "title_en" IS NULL OR "title_en" = ''"#
        );
    }

    #[test]
    fn test_reserved_identifiers_are_quoted() {
        let quote = |n: &str| quote_ident(n);
        let sql = SqlRenderer::new(Dialect::Standard, &quote);
        assert_eq!(
            sql.drop_column("order", "select"),
            r#"ALTER TABLE "order" DROP COLUMN "select""#
        );
    }
}
