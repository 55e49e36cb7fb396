//! The `sync-db` reconciliation run.
//!
//! For every concrete model with translated fields, and every such field,
//! the live table is introspected, a [`MigrationPlan`] is built, echoed,
//! confirmed and executed statement by statement. Each statement commits on
//! its own, so a failing statement leaves earlier ones applied; re-running
//! converges because every plan is computed from fresh introspection.

use std::io::Write;

use tracing::{debug, info, warn};

use crate::config::DEFAULT_PLACEHOLDER;
use crate::db::SchemaConnection;
use crate::error::{PolyfieldError, Result};
use crate::i18n::LanguageSettings;
use crate::model::naming::real_fieldname;
use crate::model::{Model, ModelRegistry};
use crate::sync::{
    ask_for_confirmation, detect_obsolete, plan_field, resolve_default_language, ColumnLedger,
    Dialect, FieldContext, MigrationPlan, Prompter, SchemaSnapshot, SqlRenderer,
};

/// Command-line options of one run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Answer yes to every question
    pub assume_yes: bool,
    /// Language of existing untranslated data
    pub default_language: Option<String>,
    /// Value written into empty required default-language columns
    pub placeholder: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            assume_yes: false,
            default_language: None,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

/// Why a field was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Schema already matches the configuration
    UpToDate,
    /// Operator answered no
    Declined,
    /// The model's table does not exist
    MissingTable,
}

/// Per-field state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldState {
    Analyzing,
    Planning,
    Confirming,
    Executing,
    Done,
    Skipped(SkipReason),
    /// A statement was rejected; earlier statements stay committed
    Failed { sql: String, message: String },
}

/// What happened to one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOutcome {
    pub model: String,
    pub field: String,
    pub state: FieldState,
    pub missing: Vec<String>,
    pub obsolete: Vec<String>,
    pub statements: Vec<String>,
    /// Statements committed before the field finished or failed
    pub executed: usize,
}

impl FieldOutcome {
    fn new(model: &Model, field: &str) -> Self {
        Self {
            model: model.full_name(),
            field: field.to_string(),
            state: FieldState::Analyzing,
            missing: Vec::new(),
            obsolete: Vec::new(),
            statements: Vec::new(),
            executed: 0,
        }
    }

    fn transition(&mut self, state: FieldState) {
        debug!(model = %self.model, field = %self.field, from = ?self.state, to = ?state, "Field state");
        self.state = state;
    }
}

/// A ledger field whose columns exist but which the model no longer translates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownColumn {
    pub model: String,
    pub field: String,
    pub columns: Vec<String>,
}

/// Result of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Language the run treated as default
    pub default_language: String,
    pub outcomes: Vec<FieldOutcome>,
    pub unknown: Vec<UnknownColumn>,
}

impl SyncReport {
    /// Whether any field needed a non-empty plan.
    pub fn found_changes(&self) -> bool {
        self.outcomes.iter().any(|o| !o.statements.is_empty())
    }

    pub fn done(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.outcomes.iter().filter(|o| o.state == FieldState::Done)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.state, FieldState::Skipped(_)))
    }

    pub fn failed(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.state, FieldState::Failed { .. }))
    }

    pub fn outcome(&self, model: &str, field: &str) -> Option<&FieldOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.model == model && o.field == field)
    }
}

/// Reconciles every translated field of a registry against a live database.
pub struct SyncCommand {
    settings: LanguageSettings,
    options: SyncOptions,
    ledger: ColumnLedger,
}

impl SyncCommand {
    pub fn new(settings: LanguageSettings, options: SyncOptions, ledger: ColumnLedger) -> Self {
        Self {
            settings,
            options,
            ledger,
        }
    }

    pub fn ledger(&self) -> &ColumnLedger {
        &self.ledger
    }

    pub fn into_ledger(self) -> ColumnLedger {
        self.ledger
    }

    /// Run the reconciliation.
    ///
    /// Connection and introspection errors abort the run. A statement the
    /// backend rejects fails only its own field.
    ///
    /// # Arguments
    ///
    /// * `conn` - Connection whose tables are inspected and altered
    /// * `registry` - Models whose translatable fields are synchronized
    /// * `prompter` - Source of the operator's answers
    /// * `out` - Sink for the plan listings and the final summary
    ///
    /// # Returns
    ///
    /// The report with one outcome per field. Converged fields are recorded
    /// in the ledger, which the caller saves.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let mut command = SyncCommand::new(settings, SyncOptions::default(), ledger);
    /// let report = command.run(&mut conn, &registry, &mut StdinPrompter, &mut io::stdout())?;
    /// command.ledger().save(&ledger_path)?;
    /// ```
    pub fn run(
        &mut self,
        conn: &mut dyn SchemaConnection,
        registry: &ModelRegistry,
        prompter: &mut dyn Prompter,
        out: &mut dyn Write,
    ) -> Result<SyncReport> {
        let default_language = resolve_default_language(
            &self.settings,
            self.options.default_language.as_deref(),
            self.options.assume_yes,
            prompter,
            out,
        )?;
        let dialect = Dialect::from_backend_name(conn.backend_name());

        info!(
            backend = %conn.backend_name(),
            default_language = %default_language,
            "Synchronizing translated fields"
        );

        let mut report = SyncReport {
            default_language,
            ..SyncReport::default()
        };

        for model in registry.concrete_models() {
            let fields = registry.all_translatable_fields(model, true);
            self.report_unknown_fields(conn, model, &fields, &mut report)?;

            for field in &fields {
                let outcome = self.sync_field(
                    conn,
                    dialect,
                    model,
                    field,
                    &report.default_language,
                    prompter,
                    out,
                )?;
                report.outcomes.push(outcome);
            }
        }

        self.print_summary(&report, out)?;
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn sync_field(
        &mut self,
        conn: &mut dyn SchemaConnection,
        dialect: Dialect,
        model: &Model,
        field: &str,
        default_language: &str,
        prompter: &mut dyn Prompter,
        out: &mut dyn Write,
    ) -> Result<FieldOutcome> {
        let mut outcome = FieldOutcome::new(model, field);

        let snapshot = SchemaSnapshot::new(conn.table_description(&model.table)?);
        if snapshot.is_empty() {
            warn!(model = %outcome.model, table = %model.table, "Table does not exist, skipping");
            writeln!(
                out,
                "\nTable \"{}\" of \"{}\" model does not exist, skipping \"{}\"",
                model.table, outcome.model, field
            )?;
            outcome.transition(FieldState::Skipped(SkipReason::MissingTable));
            return Ok(outcome);
        }

        let languages = &self.settings.languages;
        let obsolete = detect_obsolete(
            model,
            field,
            &languages.codes(),
            &snapshot,
            Some(&self.ledger),
        );

        outcome.transition(FieldState::Planning);
        let plan = {
            let quote = |name: &str| conn.quote_name(name);
            let renderer = SqlRenderer::new(dialect, &quote);
            let ctx = FieldContext {
                model,
                field,
                languages,
                default_language,
                snapshot: &snapshot,
                obsolete: &obsolete,
                placeholder: &self.options.placeholder,
                backend: conn.backend(),
            };
            plan_field(&ctx, &renderer)
        };
        outcome.missing = plan.missing.clone();
        outcome.obsolete = plan.obsolete.clone();
        outcome.statements = plan.statements.iter().map(|s| s.sql.clone()).collect();

        if plan.is_empty() {
            debug!(model = %outcome.model, field = %field, "Field is up to date");
            self.record_ledger(model, field, &plan);
            outcome.transition(FieldState::Skipped(SkipReason::UpToDate));
            return Ok(outcome);
        }

        print_affected_languages(&plan, default_language, &outcome.model, out)?;

        outcome.transition(FieldState::Confirming);
        let confirmed = ask_for_confirmation(
            &plan.sql(),
            &outcome.model,
            self.options.assume_yes,
            prompter,
            out,
        )?;
        if !confirmed {
            writeln!(out, "SQL not executed")?;
            outcome.transition(FieldState::Skipped(SkipReason::Declined));
            return Ok(outcome);
        }

        outcome.transition(FieldState::Executing);
        write!(out, "Executing SQL... ")?;
        out.flush()?;
        for statement in &plan.statements {
            match conn.execute_committed(&statement.sql) {
                Ok(()) => outcome.executed += 1,
                Err(PolyfieldError::BackendIncompatibility { sql, message, .. }) => {
                    writeln!(out, "Failed")?;
                    writeln!(out, "   {}", sql)?;
                    writeln!(out, "   {}", message)?;
                    warn!(
                        model = %outcome.model,
                        field = %field,
                        sql = %sql,
                        error = %message,
                        executed = outcome.executed,
                        "Statement rejected, field left partially migrated"
                    );
                    outcome.transition(FieldState::Failed { sql, message });
                    return Ok(outcome);
                }
                Err(e) => return Err(e),
            }
        }
        writeln!(out, "Done")?;

        info!(
            model = %outcome.model,
            field = %field,
            statements = outcome.executed,
            "Field synchronized"
        );
        self.record_ledger(model, field, &plan);
        outcome.transition(FieldState::Done);
        Ok(outcome)
    }

    /// Remember the expanded plus still-present obsolete codes for a converged field.
    fn record_ledger(&mut self, model: &Model, field: &str, plan: &MigrationPlan) {
        let mut codes: Vec<String> = match model.language_columns().get(field) {
            Some(codes) => codes.clone(),
            None => self
                .settings
                .languages
                .codes()
                .into_iter()
                .map(str::to_string)
                .collect(),
        };
        for code in &plan.obsolete {
            if !codes.contains(code) {
                codes.push(code.clone());
            }
        }
        self.ledger.record(&model.table, field, codes);
    }

    /// Warn about ledger fields the model stopped translating whose columns remain.
    fn report_unknown_fields(
        &self,
        conn: &mut dyn SchemaConnection,
        model: &Model,
        fields: &[String],
        report: &mut SyncReport,
    ) -> Result<()> {
        let stale: Vec<&str> = self
            .ledger
            .fields(&model.table)
            .into_iter()
            .filter(|f| !fields.iter().any(|known| known == *f))
            .collect();
        if stale.is_empty() {
            return Ok(());
        }

        let snapshot = SchemaSnapshot::new(conn.table_description(&model.table)?);
        for field in stale {
            let columns: Vec<String> = self
                .ledger
                .codes(&model.table, field)
                .unwrap_or_default()
                .iter()
                .map(|code| real_fieldname(field, code))
                .filter(|column| snapshot.has_column(column))
                .collect();
            if columns.is_empty() {
                continue;
            }

            let err = PolyfieldError::unknown_field(&model.name, field);
            warn!(error = %err, columns = ?columns, "Leaving columns of an undeclared field untouched");
            report.unknown.push(UnknownColumn {
                model: model.full_name(),
                field: field.to_string(),
                columns,
            });
        }
        Ok(())
    }

    fn print_summary(&self, report: &SyncReport, out: &mut dyn Write) -> Result<()> {
        for unknown in &report.unknown {
            writeln!(
                out,
                "\nField \"{}\" is no longer translated in \"{}\" model; columns left untouched: {}",
                unknown.field,
                unknown.model,
                unknown.columns.join(", ")
            )?;
        }

        for outcome in report.skipped() {
            let reason = match outcome.state {
                FieldState::Skipped(SkipReason::UpToDate) => "already up to date",
                FieldState::Skipped(SkipReason::Declined) => "changes declined",
                FieldState::Skipped(SkipReason::MissingTable) => "table not found",
                _ => continue,
            };
            writeln!(
                out,
                "\nSkipped \"{}\" field from \"{}\" model: {}",
                outcome.field, outcome.model, reason
            )?;
        }
        for outcome in report.failed() {
            writeln!(
                out,
                "\nFailed \"{}\" field from \"{}\" model after {} statement(s)",
                outcome.field, outcome.model, outcome.executed
            )?;
        }

        if !report.found_changes() {
            writeln!(out, "\nNo new translatable fields detected")?;
        }

        info!(
            done = report.done().count(),
            skipped = report.skipped().count(),
            failed = report.failed().count(),
            "Synchronization finished"
        );

        if self.options.default_language.is_some()
            && report.default_language != self.settings.fallback_language()
        {
            writeln!(
                out,
                "\n\nYou should change in your settings the {} variable to \"{}\"",
                self.settings.default_setting_name(),
                report.default_language
            )?;
        }
        Ok(())
    }
}

fn print_affected_languages(
    plan: &MigrationPlan,
    default_language: &str,
    model_full_name: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let mut affected = plan.missing.clone();
    if !affected.iter().any(|c| c == default_language) {
        affected.push(default_language.to_string());
    }
    writeln!(
        out,
        "\nMissing languages in \"{}\" field from \"{}\" model: {}",
        plan.field,
        model_full_name,
        affected.join(", ")
    )?;
    let changed: Vec<String> = plan
        .changed_languages()
        .into_iter()
        .filter(|code| !affected.contains(code) && !plan.obsolete.contains(code))
        .collect();
    if !changed.is_empty() {
        writeln!(
            out,
            "Changed languages in \"{}\" field from \"{}\" model: {}",
            plan.field,
            model_full_name,
            changed.join(", ")
        )?;
    }
    if !plan.obsolete.is_empty() {
        writeln!(
            out,
            "Obsolete languages in \"{}\" field from \"{}\" model: {}",
            plan.field,
            model_full_name,
            plan.obsolete.join(", ")
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{quote_ident, quote_ident_mysql, ColumnInfo};
    use crate::i18n::LanguageSet;
    use crate::model::{FieldDef, ModelDecl};
    use crate::sync::ScriptedPrompter;
    use std::collections::BTreeMap;

    // ==================== Helper Functions ====================

    /// In-memory table store that understands the statements the planner emits.
    struct FakeConnection {
        backend: &'static str,
        tables: BTreeMap<String, Vec<ColumnInfo>>,
        executed: Vec<String>,
        reject: Option<&'static str>,
    }

    impl FakeConnection {
        fn new(backend: &'static str) -> Self {
            Self {
                backend,
                tables: BTreeMap::new(),
                executed: Vec::new(),
                reject: None,
            }
        }

        fn table(mut self, name: &str, columns: &[(&str, bool)]) -> Self {
            self.tables.insert(
                name.to_string(),
                columns
                    .iter()
                    .map(|(c, nullable)| ColumnInfo::new(*c, "varchar(200)", *nullable))
                    .collect(),
            );
            self
        }

        fn column(&self, table: &str, name: &str) -> Option<&ColumnInfo> {
            self.tables.get(table)?.iter().find(|c| c.name == name)
        }

        fn unquote(&self, ident: &str) -> String {
            ident.trim_matches(|c| c == '"' || c == '`').to_string()
        }

        fn apply(&mut self, sql: &str) {
            let words: Vec<String> = sql.split_whitespace().map(|w| self.unquote(w)).collect();
            let words: Vec<&str> = words.iter().map(String::as_str).collect();
            match words.as_slice() {
                ["ALTER", "TABLE", t, "ADD", "COLUMN", c, ty @ ..] => {
                    let column = ColumnInfo::new(*c, ty.join(" "), true);
                    self.tables.entry(t.to_string()).or_default().push(column);
                }
                ["ALTER", "TABLE", t, "DROP", "COLUMN", c] => {
                    if let Some(columns) = self.tables.get_mut(*t) {
                        columns.retain(|col| col.name != *c);
                    }
                }
                ["ALTER", "TABLE", t, "ALTER", "COLUMN", c, verb, "NOT", "NULL"] => {
                    let nullable = *verb == "DROP";
                    self.set_nullable(t, c, nullable);
                }
                ["ALTER", "TABLE", t, "MODIFY", c, .., "NOT", "NULL"] => self.set_nullable(t, c, false),
                ["ALTER", "TABLE", t, "MODIFY", c, .., "NULL"] => self.set_nullable(t, c, true),
                _ => {}
            }
        }

        fn set_nullable(&mut self, table: &str, column: &str, nullable: bool) {
            if let Some(col) = self
                .tables
                .get_mut(table)
                .and_then(|cols| cols.iter_mut().find(|c| c.name == column))
            {
                col.is_nullable = nullable;
            }
        }
    }

    impl SchemaConnection for FakeConnection {
        fn backend_name(&self) -> &str {
            self.backend
        }

        fn quote_name(&self, name: &str) -> String {
            if self.backend == "MySQL" {
                quote_ident_mysql(name)
            } else {
                quote_ident(name)
            }
        }

        fn table_description(&mut self, table: &str) -> Result<Vec<ColumnInfo>> {
            Ok(self.tables.get(table).cloned().unwrap_or_default())
        }

        fn execute_committed(&mut self, sql: &str) -> Result<()> {
            if self.reject.is_some_and(|needle| sql.contains(needle)) {
                return Err(PolyfieldError::BackendIncompatibility {
                    backend: self.backend.to_string(),
                    sql: sql.to_string(),
                    message: "syntax error".to_string(),
                });
            }
            self.executed.push(sql.to_string());
            self.apply(sql);
            Ok(())
        }
    }

    fn settings(list: &str, default: &str) -> LanguageSettings {
        LanguageSettings::new(LanguageSet::parse(list).unwrap(), default)
    }

    fn registry(settings: &LanguageSettings, title: FieldDef) -> ModelRegistry {
        let mut registry = ModelRegistry::default();
        registry
            .register(
                &ModelDecl::new("news", "Article")
                    .table("article")
                    .field(FieldDef::new("id", crate::model::FieldType::Integer))
                    .field(title)
                    .translate(["title"]),
                settings,
            )
            .unwrap();
        registry
    }

    fn unattended() -> SyncOptions {
        SyncOptions {
            assume_yes: true,
            ..SyncOptions::default()
        }
    }

    fn run(
        command: &mut SyncCommand,
        conn: &mut FakeConnection,
        registry: &ModelRegistry,
        answers: &[&str],
    ) -> (SyncReport, String) {
        let mut prompter = ScriptedPrompter::new(answers.iter().copied());
        let mut out = Vec::new();
        let report = command
            .run(conn, registry, &mut prompter, &mut out)
            .expect("run should succeed");
        (report, String::from_utf8_lossy(&out).into_owned())
    }

    // ==================== Legacy Migration Tests ====================

    #[test]
    fn test_legacy_migration_runs_in_order() {
        let settings = settings("en:English,fr:French", "en");
        let registry = registry(&settings, FieldDef::char("title", 200));
        let mut conn = FakeConnection::new("PostgreSQL").table("article", &[("id", false), ("title", false)]);
        let mut command = SyncCommand::new(settings, unattended(), ColumnLedger::new());

        let (report, out) = run(&mut command, &mut conn, &registry, &[]);

        assert_eq!(
            conn.executed,
            vec![
                r#"ALTER TABLE "article" ADD COLUMN "title_en" varchar(200)"#,
                r#"ALTER TABLE "article" ADD COLUMN "title_fr" varchar(200)"#,
                r#"UPDATE "article" SET "title_en" = "title""#,
                r#"ALTER TABLE "article" ALTER COLUMN "title_en" SET NOT NULL"#,
                r#"ALTER TABLE "article" DROP COLUMN "title""#,
            ]
        );
        let outcome = report.outcome("news.article", "title").unwrap();
        assert_eq!(outcome.state, FieldState::Done);
        assert_eq!(outcome.executed, 5);
        assert!(out.contains("Missing languages in \"title\" field from \"news.article\" model: en, fr"));
        assert!(out.contains("Executing SQL... Done"));
        assert!(!out.contains("No new translatable fields detected"));
        assert_eq!(
            command.ledger().codes("article", "title"),
            Some(&["en".to_string(), "fr".to_string()][..])
        );
    }

    #[test]
    fn test_second_run_is_noop() {
        let settings = settings("en:English,fr:French", "en");
        let registry = registry(&settings, FieldDef::char("title", 200));
        let mut conn = FakeConnection::new("PostgreSQL").table("article", &[("id", false), ("title", false)]);
        let mut command = SyncCommand::new(settings, unattended(), ColumnLedger::new());

        run(&mut command, &mut conn, &registry, &[]);
        let executed = conn.executed.len();
        let (report, out) = run(&mut command, &mut conn, &registry, &[]);

        assert_eq!(conn.executed.len(), executed);
        assert!(!report.found_changes());
        assert_eq!(
            report.outcome("news.article", "title").unwrap().state,
            FieldState::Skipped(SkipReason::UpToDate)
        );
        assert!(out.contains("No new translatable fields detected"));
        assert!(out.contains("Skipped \"title\" field from \"news.article\" model: already up to date"));
    }

    // ==================== Language Change Tests ====================

    #[test]
    fn test_removed_language_relaxed_and_kept_in_ledger() {
        let settings = settings("en:English,fr:French", "en");
        let registry = registry(&settings, FieldDef::char("title", 200));
        let mut conn = FakeConnection::new("MySQL").table(
            "article",
            &[("id", false), ("title_en", false), ("title_fr", true), ("title_de", false)],
        );
        let mut command = SyncCommand::new(settings, unattended(), ColumnLedger::new());

        let (report, out) = run(&mut command, &mut conn, &registry, &[]);

        assert_eq!(
            conn.executed,
            vec!["ALTER TABLE `article` MODIFY `title_de` varchar(200) NULL"]
        );
        assert_eq!(report.outcome("news.article", "title").unwrap().obsolete, vec!["de"]);
        assert!(out.contains("Obsolete languages in \"title\" field from \"news.article\" model: de"));
        assert!(conn.column("article", "title_de").unwrap().is_nullable);
        assert_eq!(
            command.ledger().codes("article", "title"),
            Some(&["en".to_string(), "fr".to_string(), "de".to_string()][..])
        );
    }

    #[test]
    fn test_new_language_added() {
        let settings = settings("en:English,fr:French,de:German", "en");
        let registry = registry(&settings, FieldDef::char("title", 200));
        let mut conn = FakeConnection::new("PostgreSQL")
            .table("article", &[("id", false), ("title_en", false), ("title_fr", true)]);
        let mut command = SyncCommand::new(settings, unattended(), ColumnLedger::new());

        let (report, _) = run(&mut command, &mut conn, &registry, &[]);

        assert_eq!(
            conn.executed,
            vec![r#"ALTER TABLE "article" ADD COLUMN "title_de" varchar(200)"#]
        );
        assert_eq!(report.outcome("news.article", "title").unwrap().missing, vec!["de"]);
    }

    #[test]
    fn test_former_default_reported_as_changed() {
        let settings = settings("en:English,fr:French", "fr");
        let registry = registry(&settings, FieldDef::char("title", 200));
        let mut conn = FakeConnection::new("PostgreSQL")
            .table("article", &[("id", false), ("title_en", false), ("title_fr", false)]);
        let mut command = SyncCommand::new(settings, unattended(), ColumnLedger::new());

        let (report, out) = run(&mut command, &mut conn, &registry, &[]);

        assert_eq!(
            conn.executed,
            vec![r#"ALTER TABLE "article" ALTER COLUMN "title_en" DROP NOT NULL"#]
        );
        assert_eq!(report.outcome("news.article", "title").unwrap().state, FieldState::Done);
        assert!(out.contains("Missing languages in \"title\" field from \"news.article\" model: fr"));
        assert!(out.contains("Changed languages in \"title\" field from \"news.article\" model: en"));
    }

    #[test]
    fn test_command_default_moves_required_language() {
        // Settings still name en, the operator picks fr with -d
        let settings = settings("en:English,fr:French", "en");
        let registry = registry(&settings, FieldDef::char("title", 200));
        let mut conn = FakeConnection::new("PostgreSQL")
            .table("article", &[("id", false), ("title_en", false), ("title_fr", true)]);
        let options = SyncOptions {
            assume_yes: true,
            default_language: Some("fr".to_string()),
            ..SyncOptions::default()
        };
        let mut command = SyncCommand::new(settings, options, ColumnLedger::new());

        let (_, out) = run(&mut command, &mut conn, &registry, &[]);

        assert_eq!(
            conn.executed,
            vec![
                r#"UPDATE "article" SET "title_fr" = 'WITHOUT VALUE' WHERE "title_fr" IS NULL OR "title_fr" = ''"#,
                r#"ALTER TABLE "article" ALTER COLUMN "title_en" DROP NOT NULL"#,
                r#"ALTER TABLE "article" ALTER COLUMN "title_fr" SET NOT NULL"#,
            ]
        );
        assert!(conn.column("article", "title_en").unwrap().is_nullable);
        assert!(!conn.column("article", "title_fr").unwrap().is_nullable);
        assert!(out.contains("Changed languages in \"title\" field from \"news.article\" model: en"));

        // Converged: nothing left to do with the same default
        let executed = conn.executed.len();
        let (report, _) = run(&mut command, &mut conn, &registry, &[]);
        assert_eq!(conn.executed.len(), executed);
        assert!(!report.found_changes());
    }

    // ==================== Operator Interaction Tests ====================

    #[test]
    fn test_declined_plan_is_not_executed() {
        let settings = settings("en:English,fr:French", "en");
        let registry = registry(&settings, FieldDef::char("title", 200));
        let mut conn = FakeConnection::new("PostgreSQL").table("article", &[("id", false), ("title", false)]);
        let options = SyncOptions {
            default_language: Some("en".to_string()),
            ..SyncOptions::default()
        };
        let mut command = SyncCommand::new(settings, options, ColumnLedger::new());

        let (report, out) = run(&mut command, &mut conn, &registry, &["n"]);

        assert!(conn.executed.is_empty());
        assert_eq!(
            report.outcome("news.article", "title").unwrap().state,
            FieldState::Skipped(SkipReason::Declined)
        );
        assert!(out.contains("SQL not executed"));
        assert!(out.contains("Skipped \"title\" field from \"news.article\" model: changes declined"));
        assert!(command.ledger().is_empty());
    }

    #[test]
    fn test_menu_choice_and_settings_reminder() {
        let settings = settings("en:English,fr:French", "en");
        let registry = registry(&settings, FieldDef::char("title", 200));
        let mut conn = FakeConnection::new("PostgreSQL").table("article", &[("id", false), ("title", false)]);

        // Interactive menu: French holds the legacy data
        let mut command = SyncCommand::new(settings.clone(), SyncOptions::default(), ColumnLedger::new());
        let (report, out) = run(&mut command, &mut conn, &registry, &["2", "y"]);
        assert_eq!(report.default_language, "fr");
        assert!(conn.executed.contains(&r#"UPDATE "article" SET "title_fr" = "title""#.to_string()));
        assert!(!out.contains("You should change in your settings"));

        // Explicit -d differing from the configured default
        let mut conn = FakeConnection::new("PostgreSQL").table("article", &[("id", false), ("title", false)]);
        let options = SyncOptions {
            assume_yes: true,
            default_language: Some("fr".to_string()),
            ..SyncOptions::default()
        };
        let mut command = SyncCommand::new(settings, options, ColumnLedger::new());
        let (_, out) = run(&mut command, &mut conn, &registry, &[]);
        assert!(out.contains("You should change in your settings the LANGUAGE_CODE variable to \"fr\""));
    }

    // ==================== Failure Tests ====================

    #[test]
    fn test_rejected_statement_fails_field_only() {
        let settings = settings("en:English,fr:French", "en");
        let mut registry = registry(&settings, FieldDef::char("title", 200));
        registry
            .register(
                &ModelDecl::new("news", "Tag")
                    .table("tag")
                    .field(FieldDef::char("label", 50).with_null(true))
                    .translate(["label"]),
                &settings,
            )
            .unwrap();
        let mut conn = FakeConnection::new("SQLite")
            .table("article", &[("id", false), ("title", false)])
            .table("tag", &[("id", false), ("label", true)]);
        conn.reject = Some("SET NOT NULL");
        let mut command = SyncCommand::new(settings, unattended(), ColumnLedger::new());

        let (report, out) = run(&mut command, &mut conn, &registry, &[]);

        let article = report.outcome("news.article", "title").unwrap();
        assert!(matches!(article.state, FieldState::Failed { ref sql, .. } if sql.contains("SET NOT NULL")));
        assert_eq!(article.executed, 3);
        // Legacy column kept since the drop comes after the failing statement
        assert!(conn.column("article", "title").is_some());

        let tag = report.outcome("news.tag", "label").unwrap();
        assert_eq!(tag.state, FieldState::Done);
        assert!(out.contains("Failed \"title\" field from \"news.article\" model after 3 statement(s)"));
        assert_eq!(command.ledger().codes("article", "title"), None);
    }

    #[test]
    fn test_missing_table_is_skipped() {
        let settings = settings("en:English,fr:French", "en");
        let registry = registry(&settings, FieldDef::char("title", 200));
        let mut conn = FakeConnection::new("PostgreSQL");
        let mut command = SyncCommand::new(settings, unattended(), ColumnLedger::new());

        let (report, out) = run(&mut command, &mut conn, &registry, &[]);

        assert_eq!(
            report.outcome("news.article", "title").unwrap().state,
            FieldState::Skipped(SkipReason::MissingTable)
        );
        assert!(out.contains("does not exist"));
        assert!(out.contains("Skipped \"title\" field from \"news.article\" model: table not found"));
    }

    #[test]
    fn test_untranslated_ledger_field_reported_not_touched() {
        let settings = settings("en:English,fr:French", "en");
        let registry = registry(&settings, FieldDef::char("title", 200));
        let mut conn = FakeConnection::new("PostgreSQL").table(
            "article",
            &[("id", false), ("title_en", false), ("title_fr", true), ("summary_en", false)],
        );
        let mut ledger = ColumnLedger::new();
        ledger.record("article", "summary", vec!["en".into(), "fr".into()]);
        let mut command = SyncCommand::new(settings, unattended(), ledger);

        let (report, out) = run(&mut command, &mut conn, &registry, &[]);

        assert!(conn.executed.is_empty());
        assert_eq!(
            report.unknown,
            vec![UnknownColumn {
                model: "news.article".to_string(),
                field: "summary".to_string(),
                columns: vec!["summary_en".to_string()],
            }]
        );
        assert!(out.contains("columns left untouched: summary_en"));
    }
}
