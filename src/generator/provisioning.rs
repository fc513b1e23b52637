//! Database provisioning: `CREATE DATABASE` with owner privileges.

use crate::classifier::diagnostics::Diagnostics;
use crate::classifier::SplitError;
use crate::identifiers::{self, IdentifierPolicy};

/// Options for creating a database with privileges.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    /// Name of the database to create.
    pub dbname: String,
    /// User granted ownership and full privileges.
    pub owner: String,
    /// Template database.
    pub template: String,
    /// Character encoding.
    pub encoding: String,
}

impl ProvisionConfig {
    /// Configuration with the `template1`/`UTF8` defaults.
    pub fn new(dbname: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            dbname: dbname.into(),
            owner: owner.into(),
            template: "template1".to_string(),
            encoding: "UTF8".to_string(),
        }
    }

    /// Check required arguments and identifier safety before any store
    /// interaction.
    pub fn validate(&self, diagnostics: &mut Diagnostics) -> Result<(), SplitError> {
        if self.dbname.is_empty() {
            return Err(SplitError::MissingArgument("dbname"));
        }
        if self.owner.is_empty() {
            return Err(SplitError::MissingArgument("owner"));
        }
        identifiers::validate_identifiers(
            [
                self.dbname.as_str(),
                self.owner.as_str(),
                self.template.as_str(),
                self.encoding.as_str(),
            ],
            IdentifierPolicy::General,
            diagnostics,
        )?;
        Ok(())
    }
}

/// `CREATE DATABASE` statement for the configuration.
pub fn create_database_statement(config: &ProvisionConfig) -> String {
    format!(
        "CREATE DATABASE {dbname} WITH TEMPLATE {template} ENCODING '{encoding}' OWNER {owner}",
        dbname = config.dbname,
        template = config.template,
        encoding = config.encoding,
        owner = config.owner,
    )
}

/// `GRANT ALL PRIVILEGES` statement, run against the new database.
pub fn grant_privileges_statement(dbname: &str, owner: &str) -> String {
    format!("GRANT ALL PRIVILEGES ON DATABASE {dbname} TO {owner};")
}

/// Create the database on the system connection, then reconnect to the new
/// database and grant the owner full privileges.
///
/// `CREATE DATABASE` cannot run inside a transaction; both statements run in
/// autocommit. Each connection is owned by this call and released on every
/// exit path.
#[cfg(feature = "db")]
pub fn create_database_with_privileges(
    system_url: &str,
    config: &ProvisionConfig,
    diagnostics: &mut Diagnostics,
) -> Result<(), SplitError> {
    use crate::output::env_file::derive_database_url;
    use crate::store::postgres::PgStore;
    use crate::store::StoreLike;

    config.validate(diagnostics)?;

    diagnostics.info(format!(
        "Connecting to the system database to create '{}'.",
        config.dbname
    ));
    let mut system_store = PgStore::connect(system_url)?;
    system_store.execute(&create_database_statement(config))?;
    diagnostics.info(format!("Successfully created '{}' database.", config.dbname));

    diagnostics.info(format!(
        "Connecting to new database '{}' to grant privileges to '{}'.",
        config.dbname, config.owner
    ));
    let grant_url = derive_database_url(system_url, &config.dbname)
        .map_err(SplitError::Config)?;
    let mut grant_store = PgStore::connect(&grant_url)?;
    grant_store.execute(&grant_privileges_statement(&config.dbname, &config.owner))?;
    diagnostics.info(format!(
        "Granted ALL privileges on '{}' to '{}'.",
        config.dbname, config.owner
    ));

    Ok(())
}
