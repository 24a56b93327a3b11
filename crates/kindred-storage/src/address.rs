//! Address persistence: the nested one-to-one sub-repository.
//!
//! Addresses are the degenerate extraction case: one row per entity, plain
//! column labels, no cursor movement. The repository declares only its Save
//! statement explicitly; FindById and AllCount come from built-in defaults,
//! and every other operation fails lazily when first invoked.

use std::rc::Rc;

use rusqlite::types::Value;
use rusqlite::Connection;

use kindred_core::{Address, AddressId, Region};

use crate::cursor::{value_by_alias, AliasIndexCache, RowCursor};
use crate::entity::{nullable, Entity};
use crate::error::StorageError;
use crate::repository::{CrudRepository, ErrorPolicy};
use crate::statement::{CrudOperation, StatementRegistry};

const SAVE_ADDRESS_SQL: &str = "INSERT INTO addresses \
    (street_address, line2, city, state, postcode, county, region, country) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

// Built-in defaults; a declared statement would take precedence.
const FIND_ADDRESS_BY_ID_SQL: &str = "SELECT id, street_address, line2, city, state, \
    postcode, county, region, country FROM addresses WHERE id = ?1";
const COUNT_ADDRESSES_SQL: &str = "SELECT COUNT(*) FROM addresses";

impl Entity for Address {
    type Id = AddressId;
    const KIND: &'static str = "address";

    fn id(&self) -> Option<AddressId> {
        self.id
    }

    fn assign_id(&mut self, id: AddressId) {
        self.id = Some(id);
    }

    fn insert_params(&self) -> Vec<Value> {
        vec![
            Value::from(self.street_address.clone()),
            nullable(self.line2.clone()),
            Value::from(self.city.clone()),
            Value::from(self.state.clone()),
            Value::from(self.postcode.clone()),
            nullable(self.county.clone()),
            Value::from(self.region.as_str().to_string()),
            Value::from(self.country.clone()),
        ]
    }

    fn update_params(&self) -> Vec<Value> {
        // No update statement is defined for addresses; resolution fails
        // before these parameters are ever requested.
        Vec::new()
    }

    fn from_cursor(
        cursor: &mut RowCursor,
        aliases: &AliasIndexCache,
    ) -> Result<Option<Address>, StorageError> {
        let Some(id) = value_by_alias::<i64>(cursor, aliases, "id")? else {
            return Ok(None);
        };
        Ok(Some(Address {
            id: Some(AddressId(id)),
            street_address: value_by_alias::<String>(cursor, aliases, "street_address")?
                .unwrap_or_default(),
            line2: value_by_alias::<String>(cursor, aliases, "line2")?,
            city: value_by_alias::<String>(cursor, aliases, "city")?.unwrap_or_default(),
            state: value_by_alias::<String>(cursor, aliases, "state")?.unwrap_or_default(),
            postcode: value_by_alias::<String>(cursor, aliases, "postcode")?.unwrap_or_default(),
            county: value_by_alias::<String>(cursor, aliases, "county")?,
            region: Region::from_label(
                &value_by_alias::<String>(cursor, aliases, "region")?.unwrap_or_default(),
            ),
            country: value_by_alias::<String>(cursor, aliases, "country")?.unwrap_or_default(),
        }))
    }
}

/// Repository for [`Address`] entities.
pub struct AddressRepository {
    conn: Rc<Connection>,
    statements: StatementRegistry,
    aliases: AliasIndexCache,
    policy: ErrorPolicy,
}

impl AddressRepository {
    /// Creates a repository over `conn` with the default lenient policy.
    pub fn new(conn: Rc<Connection>) -> Self {
        let statements = StatementRegistry::new(Address::KIND)
            .declare(CrudOperation::Save, SAVE_ADDRESS_SQL)
            .default_statement(CrudOperation::FindById, FIND_ADDRESS_BY_ID_SQL)
            .default_statement(CrudOperation::AllCount, COUNT_ADDRESSES_SQL);
        AddressRepository {
            conn,
            statements,
            aliases: AliasIndexCache::new(),
            policy: ErrorPolicy::default(),
        }
    }

    /// Replaces the error policy.
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl CrudRepository for AddressRepository {
    type Entity = Address;

    fn connection(&self) -> &Connection {
        &self.conn
    }

    fn statements(&self) -> &StatementRegistry {
        &self.statements
    }

    fn aliases(&self) -> &AliasIndexCache {
        &self.aliases
    }

    fn error_policy(&self) -> ErrorPolicy {
        self.policy
    }
}
