use rusqlite::{params, Connection};
use tracing::debug;

use crate::models::{Observation, QueryParams};
use crate::services::csv_import::ParsedObservation;

/// Fetch the observations inside the query window, oldest first.
pub fn list_observations(
    conn: &Connection,
    query: &QueryParams,
) -> rusqlite::Result<Vec<Observation>> {
    let mut sql = String::from(
        "SELECT id, date, area_name, location_name, generation, weight_class,
                level1_name, category_code, category_short_name,
                count, rate, avg_weight_grams
         FROM mortality_records
         WHERE date >= ? AND date <= ?",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![
        Box::new(query.range.from_str()),
        Box::new(query.range.to_str()),
    ];

    push_in_filter(&mut sql, &mut params_vec, "area_name", &query.areas);
    push_in_filter(&mut sql, &mut params_vec, "generation", &query.generations);
    push_in_filter(
        &mut sql,
        &mut params_vec,
        "weight_class",
        &query.weight_classes,
    );

    sql.push_str(" ORDER BY date ASC, id ASC");

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;

    let observations = stmt
        .query_map(params_refs.as_slice(), |row| {
            Ok(Observation {
                id: row.get(0)?,
                date: row.get(1)?,
                area_name: row.get(2)?,
                location_name: row.get(3)?,
                generation: row.get(4)?,
                weight_class: row.get(5)?,
                level1_name: row.get(6)?,
                category_code: row.get(7)?,
                category_short_name: row.get(8)?,
                count: row.get(9)?,
                rate: row.get(10)?,
                avg_weight_grams: row.get(11)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(count = observations.len(), "Listed observations");
    Ok(observations)
}

fn push_in_filter(
    sql: &mut String,
    params_vec: &mut Vec<Box<dyn rusqlite::ToSql>>,
    column: &str,
    values: &[String],
) {
    if values.is_empty() {
        return;
    }
    let placeholders = vec!["?"; values.len()].join(", ");
    sql.push_str(&format!(" AND {} IN ({})", column, placeholders));
    for value in values {
        params_vec.push(Box::new(value.clone()));
    }
}

/// Insert parsed observations in a single transaction.
pub fn insert_observations(
    conn: &mut Connection,
    observations: &[ParsedObservation],
) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO mortality_records
                (date, area_name, location_name, generation, weight_class, level1_name,
                 category_code, category_short_name, count, rate, avg_weight_grams)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )?;
        for o in observations {
            stmt.execute(params![
                o.date,
                o.area_name,
                o.location_name,
                o.generation,
                o.weight_class,
                o.level1_name,
                o.category_code,
                o.category_short_name,
                o.count,
                o.rate,
                o.avg_weight_grams,
            ])?;
        }
    }
    tx.commit()?;

    debug!(count = observations.len(), "Inserted observations");
    Ok(observations.len())
}

pub fn count_observations(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM mortality_records", [], |row| {
        row.get(0)
    })
}
