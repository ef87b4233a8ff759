use rusqlite::{params, Connection, OptionalExtension};

use crate::{
    constants::{CART_ID_KEY, CART_ITEMS_KEY},
    data_types::{CartError, CartItem},
};

pub fn check_or_create_db_tables(conn: &Connection) -> rusqlite::Result<()> {
    // mirrors browser local storage: string keys, JSON values
    conn.prepare(
        "create table if not exists local_storage (
            key text not null unique primary key,
            value text not null
        )",
    )?
    .execute([])?;

    Ok(())
}

fn get_item(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    let mut stmt = conn.prepare_cached("SELECT value FROM local_storage WHERE key = ?1")?;
    stmt.query_row(params![key], |row| row.get(0)).optional()
}

fn set_item(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(
        "replace into local_storage (key, value)
            values (?1, ?2)",
    )?;
    stmt.execute(params![key, value])?;

    Ok(())
}

fn remove_item(conn: &Connection, key: &str) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached("DELETE FROM local_storage WHERE key = ?1")?;
    stmt.execute(params![key])?;

    Ok(())
}

/// Unreadable JSON counts as an empty cart.
pub fn load_cart_items(conn: &Connection) -> rusqlite::Result<Vec<CartItem>> {
    let Some(json_text) = get_item(conn, CART_ITEMS_KEY)? else {
        return Ok(Vec::new());
    };

    match serde_json::from_str(&json_text) {
        Ok(items) => Ok(items),
        Err(e) => {
            log::warn!("Discarding unreadable stored cart: {}", e);
            Ok(Vec::new())
        }
    }
}

pub fn save_cart_items(conn: &Connection, items: &[CartItem]) -> Result<(), CartError> {
    let json_text = serde_json::to_string(items)?;
    set_item(conn, CART_ITEMS_KEY, &json_text)?;

    Ok(())
}

pub fn load_cart_id(conn: &Connection) -> rusqlite::Result<Option<String>> {
    Ok(get_item(conn, CART_ID_KEY)?.filter(|id| !id.is_empty()))
}

pub fn save_cart_id(conn: &Connection, cart_id: &str) -> rusqlite::Result<()> {
    set_item(conn, CART_ID_KEY, cart_id)
}

pub fn clear_cart_storage(conn: &Connection) -> rusqlite::Result<()> {
    remove_item(conn, CART_ITEMS_KEY)?;
    remove_item(conn, CART_ID_KEY)?;

    Ok(())
}
