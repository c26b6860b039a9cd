//! In-process versions of the server-side procedures declared in
//! [`crate::schema`].

use serde_json::{Value, json};

use super::{State, now, text};
use crate::error::{DbError, RAISED};

pub(super) fn call(state: &mut State, name: &str, args: &Value) -> Result<Value, DbError> {
    match name {
        "allocate_beneficiary" => allocate_beneficiary(state, args),
        "adjust_product_stock" => adjust_product_stock(state, args),
        "release_beneficiary" => release_beneficiary(state, args),
        other => Err(DbError::Backend {
            status: 404,
            code: Some("PGRST202".into()),
            message: format!("Could not find the function public.{other}"),
        }),
    }
}

fn raise(status: u16, message: impl Into<String>) -> DbError {
    DbError::Backend {
        status,
        code: Some(RAISED.into()),
        message: message.into(),
    }
}

fn arg(args: &Value, key: &str) -> Result<String, DbError> {
    text(args.get(key)).ok_or_else(|| raise(400, format!("missing argument {key}")))
}

fn counter(row: &Value, key: &str) -> i64 {
    row.get(key).and_then(Value::as_i64).unwrap_or(0)
}

/// Adds `delta` to an integer column of the row with `id`, never going
/// below zero.
fn bump(state: &mut State, table: &str, id: &str, column: &str, delta: i64) {
    let Some(row) = state
        .tables
        .get_mut(table)
        .and_then(|rows| rows.iter_mut().find(|r| text(r.get("id")).as_deref() == Some(id)))
    else {
        return;
    };
    let value = (counter(row, column) + delta).max(0);
    if let Some(object) = row.as_object_mut() {
        object.insert(column.into(), json!(value));
        object.insert("updated_at".into(), Value::String(now()));
    }
}

/// Moves a beneficiary into a room: checks capacity, shifts occupancy
/// counters from the old room to the new one, repoints the beneficiary
/// and appends the history row.
fn allocate_beneficiary(state: &mut State, args: &Value) -> Result<Value, DbError> {
    let beneficiary_id = arg(args, "beneficiary_id")?;
    let housing_id = arg(args, "housing_id")?;
    let room_id = arg(args, "room_id")?;
    let kind = text(args.get("type")).unwrap_or_else(|| "ALLOCATION".into());

    let beneficiary = state
        .find("beneficiaries", &beneficiary_id)
        .cloned()
        .ok_or_else(|| raise(404, format!("beneficiary {beneficiary_id} not found")))?;
    let room = state
        .find("housing_rooms", &room_id)
        .filter(|r| text(r.get("housing_id")).as_deref() == Some(housing_id.as_str()))
        .cloned()
        .ok_or_else(|| raise(404, format!("room {room_id} not found in housing {housing_id}")))?;

    let old_housing_id = text(beneficiary.get("current_housing_id"));
    let old_room_id = text(beneficiary.get("current_room_id"));
    if old_room_id.as_deref() == Some(room_id.as_str()) {
        return Err(raise(409, "beneficiary already occupies this room"));
    }
    if counter(&room, "occupied") >= counter(&room, "capacity") {
        return Err(raise(409, format!("room {room_id} is full")));
    }

    if let Some(old_room) = &old_room_id {
        bump(state, "housing_rooms", old_room, "occupied", -1);
    }
    if let Some(old_housing) = &old_housing_id {
        bump(state, "housing", old_housing, "occupied_vacancies", -1);
    }
    bump(state, "housing_rooms", &room_id, "occupied", 1);
    bump(state, "housing", &housing_id, "occupied_vacancies", 1);

    state.update_rows(
        "beneficiaries",
        &[crate::query::Filter::eq("id", &beneficiary_id)],
        &json!({ "current_housing_id": housing_id, "current_room_id": room_id }),
    );

    Ok(state.insert_row(
        "beneficiary_allocations",
        json!({
            "beneficiary_id": beneficiary_id,
            "housing_id": housing_id,
            "room_id": room_id,
            "old_housing_id": old_housing_id,
            "old_room_id": old_room_id,
            "organization_id": beneficiary.get("organization_id"),
            "type": kind,
        }),
    ))
}

/// Takes a beneficiary out of their room and gives the bed back. A
/// missing or unplaced beneficiary is left alone.
fn release_beneficiary(state: &mut State, args: &Value) -> Result<Value, DbError> {
    let beneficiary_id = arg(args, "beneficiary_id")?;
    let Some(beneficiary) = state.find("beneficiaries", &beneficiary_id).cloned() else {
        return Ok(json!({ "beneficiary_id": beneficiary_id, "released": false }));
    };
    let Some(room_id) = text(beneficiary.get("current_room_id")) else {
        return Ok(json!({ "beneficiary_id": beneficiary_id, "released": false }));
    };

    bump(state, "housing_rooms", &room_id, "occupied", -1);
    if let Some(housing_id) = text(beneficiary.get("current_housing_id")) {
        bump(state, "housing", &housing_id, "occupied_vacancies", -1);
    }
    state.update_rows(
        "beneficiaries",
        &[crate::query::Filter::eq("id", &beneficiary_id)],
        &json!({ "current_housing_id": null, "current_room_id": null }),
    );
    Ok(json!({ "beneficiary_id": beneficiary_id, "released": true }))
}

/// Adds `delta` to a product's stock; the total may not go negative.
fn adjust_product_stock(state: &mut State, args: &Value) -> Result<Value, DbError> {
    let product_id = arg(args, "product_type_id")?;
    let delta = args.get("delta").and_then(Value::as_i64).unwrap_or(0);

    let product = state
        .find("product_types", &product_id)
        .ok_or_else(|| raise(404, format!("product type {product_id} not found")))?;
    let total = counter(product, "total_in_storage") + delta;
    if total < 0 {
        return Err(raise(409, "insufficient stock"));
    }

    state.update_rows(
        "product_types",
        &[crate::query::Filter::eq("id", &product_id)],
        &json!({ "total_in_storage": total }),
    );
    Ok(json!({ "product_type_id": product_id, "total_in_storage": total }))
}
