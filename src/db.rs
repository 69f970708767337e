//! Session over one connection.
//!
//! A [`Db`] pairs an [`Executor`] with the dialect detected for it and a
//! shared [`MappingRegistry`]. The first time a session touches a model it
//! creates the table and its indexes (when the model asks for it) and then
//! checks the stored table version.

use sea_query::Value;
use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;

use crate::alias::Alias;
use crate::config::MappingConfig;
use crate::dialect::{Dialect, MergeStatement};
use crate::error::{Result, TideError};
use crate::executor::{classify, is_already_exists_message, Executor, Row};
use crate::model::{Entity, MappingRegistry, TableDefinition};
use crate::query::{self, Query, SqlStatement};
use crate::upgrade::{DbUpgrader, DbVersion};
use crate::value::conversion::as_i64;

/// A mapping session bound to one executor.
pub struct Db<E: Executor> {
    executor: E,
    dialect: Dialect,
    registry: Arc<MappingRegistry>,
    config: MappingConfig,
    upgrader: Option<Box<dyn DbUpgrader>>,
    prepared: HashSet<TypeId>,
}

impl<E: Executor> Db<E> {
    /// Open a session. The dialect is chosen once, from the configured
    /// override or else from the executor's product name.
    pub fn open(executor: E, registry: Arc<MappingRegistry>, config: MappingConfig) -> Self {
        let product = config.dialect.clone().unwrap_or_else(|| executor.product_name());
        let dialect = Dialect::detect(&product);
        log::info!("Opened session for {product} using the {dialect} dialect");
        Self {
            executor,
            dialect,
            registry,
            config,
            upgrader: None,
            prepared: HashSet::new(),
        }
    }

    /// Register the callback invoked when a stored table version is behind.
    pub fn with_upgrader(mut self, upgrader: impl DbUpgrader + 'static) -> Self {
        self.upgrader = Some(Box::new(upgrader));
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn registry(&self) -> &Arc<MappingRegistry> {
        &self.registry
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    /// A fresh alias for `M`; the table is prepared first.
    pub fn alias<M: Entity>(&mut self) -> Result<Alias<M>> {
        Ok(Alias::materialize(self.prepare::<M>()?))
    }

    /// Start a query over an alias.
    pub fn from<M: Entity>(&self, alias: &Alias<M>) -> Query<M> {
        Query::from(alias)
    }

    /// Create the table and indexes of `M` if needed and check its version.
    pub fn create_table<M: Entity>(&mut self) -> Result<()> {
        self.prepare::<M>().map(|_| ())
    }

    fn prepare<M: Entity>(&mut self) -> Result<Arc<TableDefinition<M>>> {
        let def = self.registry.definition::<M>()?;
        if self.prepared.contains(&TypeId::of::<M>()) {
            return Ok(def);
        }
        if def.create_if_required && self.config.create_tables {
            self.create(&def)?;
        }
        self.check_version(&def)?;
        self.prepared.insert(TypeId::of::<M>());
        Ok(def)
    }

    fn create<M>(&self, def: &TableDefinition<M>) -> Result<()> {
        let mut statements = query::build_create(def, self.dialect).into_iter();
        if let Some(table) = statements.next() {
            self.execute_statement("CREATE TABLE", &def.table_name, &table)?;
        }
        for index in statements {
            match self.execute_statement("CREATE INDEX", &def.table_name, &index) {
                Ok(_) => {}
                Err(TideError::Execution(message)) if is_already_exists_message(&message) => {
                    log::debug!("Index on {} already exists: {message}", def.table_name);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn check_version<M: Entity>(&mut self, def: &TableDefinition<M>) -> Result<()> {
        if def.version <= 0 || !self.config.check_versions || self.upgrader.is_none() {
            return Ok(());
        }
        let versions = self.prepare::<DbVersion>()?;
        let alias = Alias::materialize(versions);
        let schema = def.schema_name.clone().unwrap_or_default();
        let lookup = Query::from(&alias)
            .where_(alias.field(DbVersion::SCHEMA_NAME))?
            .is(schema.clone())?
            .and(alias.field(DbVersion::TABLE_NAME))?
            .is(def.table_name.clone())?;

        match self.select(&lookup)?.into_iter().next() {
            None => {
                let record = DbVersion {
                    schema_name: schema,
                    table_name: def.table_name.clone(),
                    version: def.version,
                };
                self.insert(&record)?;
            }
            Some(mut record) if record.version < def.version => {
                log::info!(
                    "Upgrading {} from version {} to {}",
                    def.table_name,
                    record.version,
                    def.version
                );
                let upgraded = match &self.upgrader {
                    Some(upgrader) => upgrader.upgrade_table(
                        &self.executor,
                        self.dialect,
                        def.schema_name.as_deref(),
                        &def.table_name,
                        record.version,
                        def.version,
                    )?,
                    None => true,
                };
                if !upgraded {
                    return Err(TideError::UpgradeFailed {
                        table: def.table_name.clone(),
                        from: record.version,
                        to: def.version,
                    });
                }
                record.version = def.version;
                self.update(&record)?;
            }
            Some(record) if record.version > def.version => {
                log::warn!(
                    "Stored version {} of {} is newer than the declared version {}",
                    record.version,
                    def.table_name,
                    def.version
                );
            }
            Some(_) => {}
        }
        Ok(())
    }

    fn execute_statement(&self, kind: &'static str, table: &str, statement: &SqlStatement) -> Result<u64> {
        log::debug!(target: "tidemark::sql", "{kind} {}", statement.sql);
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("tidemark.execute", kind, table).entered();
        self.executor
            .execute(&statement.sql, &statement.params)
            .map_err(|e| classify(e, table))
    }

    fn query_statement(&self, kind: &'static str, table: &str, statement: &SqlStatement) -> Result<Vec<Row>> {
        log::debug!(target: "tidemark::sql", "{kind} {}", statement.sql);
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("tidemark.query", kind, table).entered();
        self.executor
            .query(&statement.sql, &statement.params)
            .map_err(|e| classify(e, table))
    }

    /// Insert one object; returns the rows affected.
    pub fn insert<M: Entity>(&mut self, obj: &M) -> Result<u64> {
        let def = self.prepare::<M>()?;
        let statement = query::build_insert(&def, obj, self.dialect)?;
        self.execute_statement("INSERT", &def.table_name, &statement)
    }

    /// Insert one object and return the key the engine generated.
    pub fn insert_and_get_key<M: Entity>(&mut self, obj: &M) -> Result<i64> {
        let def = self.prepare::<M>()?;
        let mut statement = query::build_insert(&def, obj, self.dialect)?;
        if self.dialect == Dialect::Postgres {
            if let Some(key) = def.fields().iter().find(|f| f.is_auto_increment) {
                statement.sql.push_str(" RETURNING ");
                statement.sql.push_str(&self.dialect.prepare_column_name(&key.column_name));
            }
        }
        log::debug!(target: "tidemark::sql", "INSERT {}", statement.sql);
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("tidemark.insert", table = def.table_name.as_str()).entered();
        self.executor
            .execute_insert(&statement.sql, &statement.params)
            .map_err(|e| classify(e, &def.table_name))
    }

    /// Insert each object in order; stops at the first failure.
    pub fn insert_all<M: Entity>(&mut self, objs: &[M]) -> Result<u64> {
        let mut affected = 0;
        for obj in objs {
            affected += self.insert(obj)?;
        }
        Ok(affected)
    }

    /// Update an object by primary key; returns the rows affected.
    pub fn update<M: Entity>(&mut self, obj: &M) -> Result<u64> {
        let def = self.prepare::<M>()?;
        let statement = query::build_update(&def, obj, self.dialect)?;
        self.execute_statement("UPDATE", &def.table_name, &statement)
    }

    /// Delete an object by primary key; returns the rows affected.
    pub fn delete<M: Entity>(&mut self, obj: &M) -> Result<u64> {
        let def = self.prepare::<M>()?;
        let statement = query::build_delete(&def, obj, self.dialect)?;
        self.execute_statement("DELETE", &def.table_name, &statement)
    }

    /// Insert an object, or update it when its primary key is already stored.
    pub fn merge<M: Entity>(&mut self, obj: &M) -> Result<()> {
        let def = self.prepare::<M>()?;
        match query::build_merge(&def, obj, self.dialect)? {
            MergeStatement::Native(statement) => {
                self.execute_statement("MERGE", &def.table_name, &statement)?;
            }
            MergeStatement::Emulated { probe, update, insert } => {
                let rows = self.query_statement("SELECT", &def.table_name, &probe)?;
                if first_integer(&rows).unwrap_or(0) > 0 {
                    self.execute_statement("UPDATE", &def.table_name, &update)?;
                } else {
                    self.execute_statement("INSERT", &def.table_name, &insert)?;
                }
            }
        }
        Ok(())
    }

    /// Run a query and read every row into a fresh model instance.
    pub fn select<M: Entity>(&mut self, query: &Query<M>) -> Result<Vec<M>> {
        let def = self.prepare::<M>()?;
        let statement = query.to_select(self.dialect);
        let rows = self.query_statement("SELECT", &def.table_name, &statement)?;
        let mut select = query.select_alias().clone();
        let mut models = Vec::with_capacity(rows.len());
        for row in rows {
            select.read_row(row)?;
            models.push(select.copy_attribute_values()?);
        }
        Ok(models)
    }

    /// The first row of a query, if any.
    pub fn select_first<M: Entity>(&mut self, query: Query<M>) -> Result<Option<M>> {
        Ok(self.select(&query.limit(1))?.into_iter().next())
    }

    /// Number of rows a query matches.
    pub fn select_count<M: Entity>(&mut self, query: &Query<M>) -> Result<i64> {
        let def = self.prepare::<M>()?;
        let statement = query.to_count(self.dialect);
        let rows = self.query_statement("SELECT", &def.table_name, &statement)?;
        first_integer(&rows).ok_or_else(|| TideError::conversion("COUNT(*)", "count query returned no integer"))
    }

    /// Run a hand-written statement and return its raw rows.
    pub fn execute_query(&self, statement: &SqlStatement) -> Result<Vec<Row>> {
        self.query_statement("QUERY", "", statement)
    }
}

fn first_integer(rows: &[Row]) -> Option<i64> {
    rows.first().and_then(|row| row.first()).and_then(|value: &Value| as_i64(value))
}
