//! Person persistence: the parent repository and the entity-graph
//! reconstructor.
//!
//! A person row joins out to two optional address rows and to any number of
//! child rows, so find queries produce a flattened, denormalized cursor: the
//! parent's columns repeat on every row, and each row carries at most one
//! child block and at most one of each address block. [`Person`]'s
//! `from_cursor` folds those rows back into one hydrated entity per call,
//! segmenting on anchor identity alone -- never on row counts, which the
//! query cannot know.

use std::rc::Rc;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, Value};
use rusqlite::Connection;

use kindred_core::{Address, AddressId, Person, PersonId, Region};

use crate::address::AddressRepository;
use crate::cursor::{value_by_alias, AliasIndexCache, RowCursor};
use crate::entity::{nullable, Entity};
use crate::error::StorageError;
use crate::repository::{CrudRepository, ErrorPolicy};
use crate::statement::{CrudOperation, StatementRegistry};

const SAVE_PERSON_SQL: &str = "INSERT INTO people \
    (first_name, last_name, dob, salary, email, home_address, business_address, parent_id) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

const UPDATE_PERSON_SQL: &str =
    "UPDATE people SET first_name = ?1, last_name = ?2, dob = ?3, salary = ?4 WHERE id = ?5";

/// The flattened four-way outer join the reconstructor consumes. All rows
/// for one parent are contiguous because the query filters on a single
/// parent identifier.
const FIND_PERSON_BY_ID_SQL: &str = "\
SELECT
    parent.id AS parent_id, parent.first_name AS parent_first_name,
    parent.last_name AS parent_last_name, parent.dob AS parent_dob,
    parent.salary AS parent_salary, parent.email AS parent_email,
    child.id AS child_id, child.first_name AS child_first_name,
    child.last_name AS child_last_name, child.dob AS child_dob,
    child.salary AS child_salary, child.email AS child_email,
    home.id AS home_id, home.street_address AS home_street_address,
    home.line2 AS home_line2, home.city AS home_city,
    home.state AS home_state, home.postcode AS home_postcode,
    home.county AS home_county, home.region AS home_region,
    home.country AS home_country,
    business.id AS business_id, business.street_address AS business_street_address,
    business.line2 AS business_line2, business.city AS business_city,
    business.state AS business_state, business.postcode AS business_postcode,
    business.county AS business_county, business.region AS business_region,
    business.country AS business_country
FROM people AS parent
LEFT OUTER JOIN people AS child ON child.parent_id = parent.id
LEFT OUTER JOIN addresses AS home ON home.id = parent.home_address
LEFT OUTER JOIN addresses AS business ON business.id = parent.business_address
WHERE parent.id = ?1";

/// Narrow projection: parent scalars only, no joined blocks. The
/// reconstructor sees the child and address aliases as absent columns.
const FIND_ALL_PEOPLE_SQL: &str = "\
SELECT
    parent.id AS parent_id, parent.first_name AS parent_first_name,
    parent.last_name AS parent_last_name, parent.dob AS parent_dob,
    parent.salary AS parent_salary, parent.email AS parent_email
FROM people AS parent
ORDER BY parent.id";

const COUNT_PEOPLE_SQL: &str = "SELECT COUNT(*) FROM people";
const DELETE_PERSON_SQL: &str = "DELETE FROM people WHERE id = ?1";
const DELETE_PEOPLE_SQL: &str = "DELETE FROM people WHERE id IN (:ids)";

impl Entity for Person {
    type Id = PersonId;
    const KIND: &'static str = "person";

    fn id(&self) -> Option<PersonId> {
        self.id
    }

    fn assign_id(&mut self, id: PersonId) {
        self.id = Some(id);
    }

    fn describe(&self) -> String {
        format!(
            "Person {{ id: {:?}, name: {} {}, dob: {} }}",
            self.id, self.first_name, self.last_name, self.dob
        )
    }

    fn insert_params(&self) -> Vec<Value> {
        vec![
            Value::from(self.first_name.clone()),
            Value::from(self.last_name.clone()),
            Value::Text(self.dob.to_rfc3339()),
            Value::from(self.salary),
            nullable(self.email.clone()),
            nullable(self.home_address.as_ref().and_then(|a| a.id).map(|id| id.0)),
            nullable(
                self.business_address
                    .as_ref()
                    .and_then(|a| a.id)
                    .map(|id| id.0),
            ),
            nullable(self.parent_id.map(|id| id.0)),
        ]
    }

    fn update_params(&self) -> Vec<Value> {
        vec![
            Value::from(self.first_name.clone()),
            Value::from(self.last_name.clone()),
            Value::Text(self.dob.to_rfc3339()),
            Value::from(self.salary),
        ]
    }

    /// The entity-graph reconstructor.
    ///
    /// One call consumes every contiguous row belonging to the parent at the
    /// cursor's current position and returns that parent fully hydrated:
    /// scalars from the anchor block, both one-to-one address blocks, and
    /// one child per qualifying row. The first row whose anchor identifier
    /// differs is handed back via `retreat`, so the next call starts there.
    fn from_cursor(
        cursor: &mut RowCursor,
        aliases: &AliasIndexCache,
    ) -> Result<Option<Person>, StorageError> {
        let Some(mut parent) = read_person(cursor, aliases, "parent")? else {
            // Absent or NULL anchor: no entity at this position.
            return Ok(None);
        };
        loop {
            if let Some(home) = read_address(cursor, aliases, "home")? {
                parent.home_address = Some(home);
            }
            if let Some(business) = read_address(cursor, aliases, "business")? {
                parent.business_address = Some(business);
            }
            if let Some(child) = read_person(cursor, aliases, "child")? {
                parent.add_child(child);
            }
            if !cursor.advance() {
                break;
            }
            match read_person(cursor, aliases, "parent")? {
                Some(next) if next.id == parent.id => {}
                // A different parent (or no anchor at all): hand the row
                // back so the next call starts on it.
                _ => {
                    cursor.retreat();
                    break;
                }
            }
        }
        Ok(Some(parent))
    }
}

/// Extracts the person block under `role`-prefixed aliases from the current
/// row, or `None` when the block's identifier is absent or NULL.
fn read_person(
    cursor: &RowCursor,
    aliases: &AliasIndexCache,
    role: &str,
) -> Result<Option<Person>, StorageError> {
    let Some(id) = aliased::<i64>(cursor, aliases, role, "id")? else {
        return Ok(None);
    };
    let mut person = Person::new(
        aliased::<String>(cursor, aliases, role, "first_name")?.unwrap_or_default(),
        aliased::<String>(cursor, aliases, role, "last_name")?.unwrap_or_default(),
        aliased::<DateTime<Utc>>(cursor, aliases, role, "dob")?.unwrap_or(DateTime::UNIX_EPOCH),
    );
    person.id = Some(PersonId(id));
    person.salary = aliased::<f64>(cursor, aliases, role, "salary")?.unwrap_or(0.0);
    person.email = aliased::<String>(cursor, aliases, role, "email")?;
    Ok(Some(person))
}

/// Extracts the address block under `role`-prefixed aliases from the current
/// row, or `None` when the block's identifier is absent or NULL.
fn read_address(
    cursor: &RowCursor,
    aliases: &AliasIndexCache,
    role: &str,
) -> Result<Option<Address>, StorageError> {
    let Some(id) = aliased::<i64>(cursor, aliases, role, "id")? else {
        return Ok(None);
    };
    Ok(Some(Address {
        id: Some(AddressId(id)),
        street_address: aliased::<String>(cursor, aliases, role, "street_address")?
            .unwrap_or_default(),
        line2: aliased::<String>(cursor, aliases, role, "line2")?,
        city: aliased::<String>(cursor, aliases, role, "city")?.unwrap_or_default(),
        state: aliased::<String>(cursor, aliases, role, "state")?.unwrap_or_default(),
        postcode: aliased::<String>(cursor, aliases, role, "postcode")?.unwrap_or_default(),
        county: aliased::<String>(cursor, aliases, role, "county")?,
        region: Region::from_label(
            &aliased::<String>(cursor, aliases, role, "region")?.unwrap_or_default(),
        ),
        country: aliased::<String>(cursor, aliases, role, "country")?.unwrap_or_default(),
    }))
}

/// Reads the `<role>_<field>` aliased column from the current row.
fn aliased<T: FromSql>(
    cursor: &RowCursor,
    aliases: &AliasIndexCache,
    role: &str,
    field: &str,
) -> Result<Option<T>, StorageError> {
    value_by_alias(cursor, aliases, &format!("{role}_{field}"))
}

/// Repository for [`Person`] entities.
///
/// Owns an [`AddressRepository`] over the same connection for the nested
/// one-to-one associations: addresses are saved first so their generated
/// identifiers are bindable as foreign keys, and children are saved after
/// the parent row so their back-reference has a target.
pub struct PersonRepository {
    conn: Rc<Connection>,
    statements: StatementRegistry,
    aliases: AliasIndexCache,
    addresses: AddressRepository,
    policy: ErrorPolicy,
}

impl PersonRepository {
    /// Creates a repository over `conn` with the default lenient policy.
    pub fn new(conn: Rc<Connection>) -> Self {
        let statements = StatementRegistry::new(Person::KIND)
            .declare(CrudOperation::Save, SAVE_PERSON_SQL)
            .declare(CrudOperation::FindById, FIND_PERSON_BY_ID_SQL)
            .declare(CrudOperation::FindAll, FIND_ALL_PEOPLE_SQL)
            .declare(CrudOperation::AllCount, COUNT_PEOPLE_SQL)
            .declare(CrudOperation::Delete, DELETE_PERSON_SQL)
            .declare(CrudOperation::DeleteMany, DELETE_PEOPLE_SQL)
            .declare(CrudOperation::Update, UPDATE_PERSON_SQL);
        PersonRepository {
            addresses: AddressRepository::new(Rc::clone(&conn)),
            statements,
            aliases: AliasIndexCache::new(),
            policy: ErrorPolicy::default(),
            conn,
        }
    }

    /// Replaces the error policy. The address sub-repository follows it.
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self.addresses = self.addresses.with_policy(policy);
        self
    }

    /// The sub-repository handling the one-to-one address associations.
    pub fn addresses(&self) -> &AddressRepository {
        &self.addresses
    }
}

impl CrudRepository for PersonRepository {
    type Entity = Person;

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

    /// Persists each present one-to-one association first; the identifiers
    /// assigned here are what `insert_params` binds as foreign keys (absent
    /// associations bind SQL NULL).
    fn before_save(&self, entity: &mut Person) -> Result<(), StorageError> {
        if let Some(home) = entity.home_address.take() {
            entity.home_address = Some(self.addresses.save(home)?);
        }
        if let Some(business) = entity.business_address.take() {
            entity.business_address = Some(self.addresses.save(business)?);
        }
        Ok(())
    }

    /// Saves children once the parent identifier exists, stamping each
    /// child's back-reference first.
    fn post_save(&self, entity: &mut Person) -> Result<(), StorageError> {
        if entity.children.is_empty() {
            return Ok(());
        }
        let children = std::mem::take(&mut entity.children);
        let mut saved = Vec::with_capacity(children.len());
        for mut child in children {
            child.parent_id = entity.id;
            saved.push(self.save(child)?);
        }
        entity.children = saved;
        Ok(())
    }
}
