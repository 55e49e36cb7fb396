//! Migration plan construction for one translated field.
//!
//! Planning is pure: it reads the model, the configured languages and a
//! fresh [`SchemaSnapshot`] and returns the statements to run, in order.
//! Running the same planner against the resulting schema yields an empty plan.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::db::Backend;
use crate::error::PolyfieldError;
use crate::i18n::LanguageSet;
use crate::model::naming::{real_fieldname, real_fieldnames};
use crate::model::Model;
use crate::sync::{SchemaSnapshot, SqlRenderer};

/// What a planned statement does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    AddColumn,
    CopyLegacyData,
    BackfillPlaceholder,
    SetNotNull,
    DropNotNull,
    DropLegacyColumn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStatement {
    pub kind: StatementKind,
    /// Column the statement changes
    pub column: String,
    pub sql: String,
}

/// Ordered statements converging one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationPlan {
    pub field: String,
    /// Configured languages without a column
    pub missing: Vec<String>,
    /// Unconfigured languages that still have a column
    pub obsolete: Vec<String>,
    /// Whether the untranslated column still exists
    pub legacy: bool,
    pub statements: Vec<PlannedStatement>,
}

impl MigrationPlan {
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn sql(&self) -> Vec<&str> {
        self.statements.iter().map(|s| s.sql.as_str()).collect()
    }

    /// Languages touched by at least one statement, in statement order.
    pub fn changed_languages(&self) -> Vec<String> {
        let mut codes: Vec<String> = Vec::new();
        for statement in &self.statements {
            if let Some(code) = statement
                .column
                .strip_prefix(&self.field)
                .and_then(|rest| rest.strip_prefix('_'))
            {
                if !codes.iter().any(|c| c == code) {
                    codes.push(code.to_string());
                }
            }
        }
        codes
    }
}

/// Everything the planner reads for one field.
pub struct FieldContext<'a> {
    pub model: &'a Model,
    pub field: &'a str,
    pub languages: &'a LanguageSet,
    pub default_language: &'a str,
    pub snapshot: &'a SchemaSnapshot,
    pub obsolete: &'a [String],
    pub placeholder: &'a str,
    pub backend: Backend,
}

/// Baseline used to decide whether the default language must be required.
struct ReferenceField {
    column: String,
    required: bool,
}

impl FieldContext<'_> {
    /// First per-language field that is NOT NULL, else the legacy column.
    fn reference_field(&self) -> Option<ReferenceField> {
        let declared = real_fieldnames(self.field, self.languages)
            .iter()
            .find_map(|column| {
                self.model
                    .field(column)
                    .filter(|f| !f.null)
                    .map(|f| ReferenceField {
                        column: f.name.clone(),
                        required: true,
                    })
            });

        declared.or_else(|| {
            self.snapshot.column(self.field).map(|c| ReferenceField {
                column: c.name.clone(),
                required: !c.is_nullable,
            })
        })
    }

    /// Live type of an existing per-language column for this field, if any.
    fn existing_column_type(&self) -> Option<String> {
        self.model
            .translations_of(self.field)
            .map(|f| f.name.clone())
            .chain(self.obsolete.iter().map(|code| real_fieldname(self.field, code)))
            .find_map(|column| self.snapshot.column(&column))
            .map(|c| c.db_type.clone())
    }
}

/// Build the migration plan for one field.
///
/// Statement order: every add-column first, then data and constraint
/// changes per language in configuration order, then obsolete languages,
/// and the legacy column drop last.
///
/// # Arguments
///
/// * `ctx` - The model, configured languages, chosen default language and
///   live snapshot of the field's table
/// * `sql` - Renderer for the connection's dialect and identifier quoting
///
/// # Returns
///
/// The plan, empty when the table already matches the configuration. The
/// default language's column is only made NOT NULL when a required
/// reference column exists; a different required reference column is
/// relaxed before that, so only one language stays required.
///
/// # Example
///
/// ```rust,ignore
/// let quote = |name: &str| conn.quote_name(name);
/// let renderer = SqlRenderer::new(Dialect::Standard, &quote);
/// let plan = plan_field(&ctx, &renderer);
/// for statement in &plan.statements {
///     conn.execute_committed(&statement.sql)?;
/// }
/// ```
pub fn plan_field(ctx: &FieldContext<'_>, sql: &SqlRenderer<'_>) -> MigrationPlan {
    let table = ctx.model.table.as_str();
    let legacy = ctx.snapshot.has_column(ctx.field);
    let reference = ctx.reference_field();
    let existing_type = ctx.existing_column_type();

    let mut plan = MigrationPlan {
        field: ctx.field.to_string(),
        legacy,
        obsolete: ctx.obsolete.to_vec(),
        ..MigrationPlan::default()
    };
    let mut push = |kind: StatementKind, column: &str, statement: String| {
        plan.statements.push(PlannedStatement {
            kind,
            column: column.to_string(),
            sql: statement,
        });
    };

    // Column type per configured language: live, else the type just added
    let mut column_types: BTreeMap<String, String> = BTreeMap::new();
    let mut relaxed: BTreeSet<String> = BTreeSet::new();
    let mut missing = Vec::new();

    for lang in ctx.languages.entries() {
        let column = real_fieldname(ctx.field, &lang.code);
        let Some(field) = ctx.model.field(&column) else {
            let err = PolyfieldError::unknown_field(&ctx.model.name, &column);
            warn!(error = %err, "Skipping language without a per-language field");
            continue;
        };

        match ctx.snapshot.column(&column) {
            Some(live) => {
                column_types.insert(column, live.db_type.clone());
            }
            None => {
                let db_type = existing_type
                    .clone()
                    .unwrap_or_else(|| field.db_type(Some(ctx.backend)));
                push(
                    StatementKind::AddColumn,
                    &column,
                    sql.add_column(table, &column, &db_type),
                );
                column_types.insert(column, db_type);
                missing.push(lang.code.clone());
            }
        }
    }

    for lang in ctx.languages.entries() {
        let column = real_fieldname(ctx.field, &lang.code);
        let (Some(field), Some(db_type)) = (ctx.model.field(&column), column_types.get(&column))
        else {
            continue;
        };

        if lang.code == ctx.default_language {
            if legacy {
                push(
                    StatementKind::CopyLegacyData,
                    &column,
                    sql.copy_column(table, &column, ctx.field),
                );
                if !field.null {
                    push(
                        StatementKind::SetNotNull,
                        &column,
                        sql.set_not_null(table, &column, db_type),
                    );
                }
            } else if reference.as_ref().is_some_and(|r| r.required) {
                if ctx.snapshot.is_required(&column) {
                    continue;
                }
                push(
                    StatementKind::BackfillPlaceholder,
                    &column,
                    sql.backfill(table, &column, ctx.placeholder),
                );
                // The previous required language stops being required
                if let Some(previous) = reference
                    .as_ref()
                    .filter(|r| r.column != column)
                    .and_then(|r| ctx.snapshot.column(&r.column))
                    .filter(|live| !live.is_nullable)
                {
                    if relaxed.insert(previous.name.clone()) {
                        push(
                            StatementKind::DropNotNull,
                            &previous.name,
                            sql.drop_not_null(table, &previous.name, &previous.db_type),
                        );
                    }
                }
                push(
                    StatementKind::SetNotNull,
                    &column,
                    sql.set_not_null(table, &column, db_type),
                );
            }
        } else if field.null && ctx.snapshot.is_required(&column) && relaxed.insert(column.clone()) {
            // No longer the default language, or no longer required
            push(
                StatementKind::DropNotNull,
                &column,
                sql.drop_not_null(table, &column, db_type),
            );
        }
    }

    for code in ctx.obsolete {
        let column = real_fieldname(ctx.field, code);
        if let Some(live) = ctx.snapshot.column(&column).filter(|c| !c.is_nullable) {
            push(
                StatementKind::DropNotNull,
                &column,
                sql.drop_not_null(table, &column, &live.db_type),
            );
        }
    }

    if legacy {
        push(
            StatementKind::DropLegacyColumn,
            ctx.field,
            sql.drop_column(table, ctx.field),
        );
    }

    if let Some(reference) = &reference {
        debug!(
            field = %ctx.field,
            reference = %reference.column,
            required = reference.required,
            "Reference field"
        );
    }

    plan.missing = missing;
    plan
}
