//! Sequencing and materials queries over the ERP job tables.

use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use super::{Database, DatabaseError};

/// One (job, sequence) assignment in an operator's queue.
///
/// Field names on the wire follow the ERP column names the shop-floor
/// client reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequencingRow {
    #[serde(rename = "SOC_CODIOF")]
    pub job_number: String,
    #[serde(rename = "SOC_EMPRESA")]
    pub company_id: String,
    #[serde(rename = "SOC_CODSEQ")]
    pub sequence_code: String,
    #[serde(rename = "SOC_COLABID")]
    pub operator_id: i64,
    #[serde(rename = "SOC_SEQUEN")]
    pub sequence_order: i64,
    #[serde(rename = "JLB_CODERP")]
    pub operator_code: String,
    #[serde(rename = "JLB_NOMECB")]
    pub operator_name: String,
    #[serde(rename = "JRO_PROERP")]
    pub product_code: String,
    #[serde(rename = "JRO_DESCRI")]
    pub product_description: Option<String>,
    #[serde(rename = "JRO_UNIMED")]
    pub product_unit: Option<String>,
    #[serde(rename = "QUANTIDADE_PROGRAMADA")]
    pub programmed_qty: f64,
    #[serde(rename = "QUANTIDADE_REALIZADA")]
    pub produced_qty: f64,
    #[serde(rename = "JPC_DESENHO_ENG")]
    pub drawing_path: Option<String>,
}

/// Machine and routing data for one job sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDetails {
    #[serde(rename = "maquina")]
    pub machine_code: Option<String>,
    #[serde(rename = "operacao")]
    pub sequence_code: String,
    #[serde(rename = "np")]
    pub tooling_ref: Option<String>,
    #[serde(rename = "tempo_maquina")]
    pub machine_time: Option<f64>,
    #[serde(rename = "producao_por_hora")]
    pub hourly_rate: Option<f64>,
}

/// A bill-of-materials line. The description is missing when the product
/// master record does not exist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialRow {
    #[serde(rename = "codigo")]
    pub product_code: String,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "estoque")]
    pub stock_location: Option<String>,
}

const SEQUENCING_SQL: &str = "
    SELECT
        a.job_number                 AS job_number,
        a.company_id                 AS company_id,
        a.sequence_code              AS sequence_code,
        a.operator_id                AS operator_id,
        a.sequence_order             AS sequence_order,
        op.erp_code                  AS operator_code,
        op.name                      AS operator_name,
        p.erp_code                   AS product_code,
        p.description                AS product_description,
        p.unit                       AS product_unit,
        j.programmed_qty             AS programmed_qty,
        COALESCE(SUM(l.quantity), 0) AS produced_qty,
        d.drawing_path               AS drawing_path
    FROM sequence_assignments a

    JOIN operators op
        ON op.operator_id = a.operator_id

    JOIN jobs j
        ON j.job_number = a.job_number
       AND j.company_id = a.company_id
       AND j.deleted_at IS NULL
       AND j.closed_at IS NULL

    JOIN job_operations o
        ON o.job_number    = a.job_number
       AND o.company_id    = a.company_id
       AND o.sequence_code = a.sequence_code
       AND o.deleted_at IS NULL

    JOIN products p
        ON p.product_id = j.product_id

    LEFT JOIN product_drawings d
        ON d.product_id = j.product_id

    LEFT JOIN production_launches l
        ON l.job_number    = a.job_number
       AND l.company_id    = a.company_id
       AND l.sequence_code = a.sequence_code
       AND l.deleted_at IS NULL

    WHERE op.erp_code = ?1
      AND a.deleted_at IS NULL

    GROUP BY
        a.company_id, a.job_number, a.sequence_code,
        a.operator_id, a.sequence_order,
        op.erp_code, op.name,
        p.erp_code, p.description, p.unit,
        j.programmed_qty, d.drawing_path

    ORDER BY a.company_id, a.sequence_order
";

/// Returns the operator's job queue, one row per (job, sequence).
pub fn fetch_sequencing(
    db: &Database,
    operator_code: &str,
) -> Result<Vec<SequencingRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(SEQUENCING_SQL)?;
        let rows = stmt
            .query_map(params![operator_code], |row| {
                Ok(SequencingRow {
                    job_number: row.get("job_number")?,
                    company_id: row.get("company_id")?,
                    sequence_code: row.get("sequence_code")?,
                    operator_id: row.get("operator_id")?,
                    sequence_order: row.get("sequence_order")?,
                    operator_code: row.get("operator_code")?,
                    operator_name: row.get("operator_name")?,
                    product_code: row.get("product_code")?,
                    product_description: row.get("product_description")?,
                    product_unit: row.get("product_unit")?,
                    programmed_qty: row.get("programmed_qty")?,
                    produced_qty: row.get("produced_qty")?,
                    drawing_path: row.get("drawing_path")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Single-row routing lookup for a job sequence.
pub fn fetch_job_details(
    db: &Database,
    job_number: &str,
    company_id: &str,
    sequence_code: &str,
) -> Result<Option<JobDetails>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT machine_code, sequence_code, tooling_ref, machine_time, hourly_rate
                 FROM job_operations
                 WHERE job_number = ?1
                   AND company_id = ?2
                   AND sequence_code = ?3
                   AND deleted_at IS NULL",
                params![job_number, company_id, sequence_code],
                |row| {
                    Ok(JobDetails {
                        machine_code: row.get(0)?,
                        sequence_code: row.get(1)?,
                        tooling_ref: row.get(2)?,
                        machine_time: row.get(3)?,
                        hourly_rate: row.get(4)?,
                    })
                },
            )
            .optional()?)
    })
}

/// All material lines of a job.
pub fn fetch_job_materials(
    db: &Database,
    job_number: &str,
    company_id: &str,
) -> Result<Vec<MaterialRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT m.product_code, p.description, m.stock_location
             FROM job_materials m
             LEFT JOIN products p
                 ON p.erp_code = m.product_code
             WHERE m.job_number = ?1
               AND m.company_id = ?2
             ORDER BY m.id",
        )?;
        let rows = stmt
            .query_map(params![job_number, company_id], |row| {
                Ok(MaterialRow {
                    product_code: row.get(0)?,
                    description: row.get(1)?,
                    stock_location: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_db() -> Database {
        let db = Database::open_in_memory().expect("Failed to create test database");
        db.with_conn(|conn| {
            conn.execute_batch(
                "INSERT INTO operators (operator_id, erp_code, name) VALUES
                    (1, '100', 'Ana'), (2, '200', 'Bruno');
                 INSERT INTO products (product_id, erp_code, description, unit) VALUES
                    (10, 'P-10', 'Bracket', 'PC'), (11, 'P-11', 'Plate', 'PC'),
                    (20, 'RAW-1', 'Steel sheet 2mm', 'KG');
                 INSERT INTO product_drawings (product_id, drawing_path) VALUES
                    (10, '/step/bracket.step');
                 INSERT INTO jobs (company_id, job_number, product_id, programmed_qty) VALUES
                    ('1', 'OF1', 10, 100), ('1', 'OF2', 11, 50), ('2', 'OF3', 10, 10);
                 INSERT INTO jobs (company_id, job_number, product_id, programmed_qty, closed_at) VALUES
                    ('1', 'OF4', 11, 5, '2024-01-01 00:00:00');
                 INSERT INTO jobs (company_id, job_number, product_id, programmed_qty, deleted_at) VALUES
                    ('1', 'OF5', 10, 8, '2024-01-01 00:00:00');
                 INSERT INTO job_operations
                    (company_id, job_number, sequence_code, machine_code, tooling_ref, machine_time, hourly_rate)
                 VALUES
                    ('1', 'OF1', '10', 'LASER-01', 'NP-77', 1.5, 40),
                    ('1', 'OF1', '20', 'BEND-02', NULL, 0.5, 120),
                    ('1', 'OF2', '10', 'LASER-01', NULL, 2.0, 25),
                    ('2', 'OF3', '10', 'LASER-02', NULL, 1.0, 10),
                    ('1', 'OF4', '10', 'LASER-01', NULL, 1.0, 10),
                    ('1', 'OF5', '10', 'LASER-01', NULL, 1.0, 10);
                 INSERT INTO job_operations
                    (company_id, job_number, sequence_code, machine_code, machine_time, hourly_rate, deleted_at)
                 VALUES ('1', 'OF2', '30', 'PAINT-01', 0.2, 60, '2024-01-01 00:00:00');
                 INSERT INTO sequence_assignments
                    (company_id, job_number, sequence_code, operator_id, sequence_order)
                 VALUES
                    ('1', 'OF2', '10', 1, 1),
                    ('1', 'OF1', '10', 1, 2),
                    ('1', 'OF1', '20', 1, 3),
                    ('2', 'OF3', '10', 1, 1),
                    ('1', 'OF4', '10', 1, 4),
                    ('1', 'OF5', '10', 1, 5),
                    ('1', 'OF2', '30', 1, 6);
                 INSERT INTO sequence_assignments
                    (company_id, job_number, sequence_code, operator_id, sequence_order, deleted_at)
                 VALUES ('1', 'OF2', '10', 2, 1, '2024-01-01 00:00:00');
                 INSERT INTO production_launches (company_id, job_number, sequence_code, quantity, deleted_at) VALUES
                    ('1', 'OF1', '10', 30, NULL),
                    ('1', 'OF1', '10', 12, NULL),
                    ('1', 'OF1', '10', 99, '2024-01-01 00:00:00'),
                    ('1', 'OF1', '20', 7, NULL);
                 INSERT INTO job_materials (company_id, job_number, product_code, stock_location) VALUES
                    ('1', 'OF1', 'RAW-1', 'A-01'),
                    ('1', 'OF1', 'RAW-UNKNOWN', NULL);",
            )?;
            Ok(())
        })
        .unwrap();
        db
    }

    #[test]
    fn test_sequencing_orders_by_company_then_sequence() {
        let db = seeded_db();
        let rows = fetch_sequencing(&db, "100").unwrap();

        let keys: Vec<(&str, &str, &str)> = rows
            .iter()
            .map(|r| {
                (
                    r.company_id.as_str(),
                    r.job_number.as_str(),
                    r.sequence_code.as_str(),
                )
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                ("1", "OF2", "10"),
                ("1", "OF1", "10"),
                ("1", "OF1", "20"),
                ("2", "OF3", "10"),
            ]
        );
    }

    #[test]
    fn test_sequencing_sums_produced_quantity() {
        let db = seeded_db();
        let rows = fetch_sequencing(&db, "100").unwrap();

        let of1_10 = rows
            .iter()
            .find(|r| r.job_number == "OF1" && r.sequence_code == "10")
            .unwrap();
        assert_eq!(of1_10.produced_qty, 42.0);
        assert_eq!(of1_10.programmed_qty, 100.0);
        assert_eq!(of1_10.drawing_path.as_deref(), Some("/step/bracket.step"));
        assert_eq!(of1_10.operator_name, "Ana");

        let of2 = rows.iter().find(|r| r.job_number == "OF2").unwrap();
        assert_eq!(of2.produced_qty, 0.0);
        assert!(of2.drawing_path.is_none());
    }

    #[test]
    fn test_sequencing_excludes_closed_jobs() {
        let db = seeded_db();
        let rows = fetch_sequencing(&db, "100").unwrap();
        assert!(rows.iter().all(|r| r.job_number != "OF4"));
    }

    #[test]
    fn test_sequencing_skips_soft_deleted_assignments() {
        let db = seeded_db();
        assert!(fetch_sequencing(&db, "200").unwrap().is_empty());
    }

    #[test]
    fn test_sequencing_skips_soft_deleted_jobs_and_operations() {
        let db = seeded_db();
        let rows = fetch_sequencing(&db, "100").unwrap();
        assert!(rows.iter().all(|r| r.job_number != "OF5"));
        assert!(rows
            .iter()
            .all(|r| !(r.job_number == "OF2" && r.sequence_code == "30")));

        assert!(fetch_job_details(&db, "OF2", "1", "30").unwrap().is_none());
    }

    #[test]
    fn test_sequencing_unknown_operator_is_empty() {
        let db = seeded_db();
        assert!(fetch_sequencing(&db, "999").unwrap().is_empty());
    }

    #[test]
    fn test_sequencing_wire_names() {
        let db = seeded_db();
        let rows = fetch_sequencing(&db, "100").unwrap();
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["SOC_CODIOF"], "OF2");
        assert_eq!(json["SOC_EMPRESA"], "1");
        assert_eq!(json["JLB_CODERP"], "100");
        assert_eq!(json["QUANTIDADE_PROGRAMADA"], 50.0);
    }

    #[test]
    fn test_job_details_lookup() {
        let db = seeded_db();
        let details = fetch_job_details(&db, "OF1", "1", "10").unwrap().unwrap();
        assert_eq!(details.machine_code.as_deref(), Some("LASER-01"));
        assert_eq!(details.tooling_ref.as_deref(), Some("NP-77"));
        assert_eq!(details.machine_time, Some(1.5));
        assert_eq!(details.hourly_rate, Some(40.0));

        assert!(fetch_job_details(&db, "OF1", "1", "99").unwrap().is_none());
        assert!(fetch_job_details(&db, "OF1", "2", "10").unwrap().is_none());
    }

    #[test]
    fn test_materials_left_join_product() {
        let db = seeded_db();
        let materials = fetch_job_materials(&db, "OF1", "1").unwrap();
        assert_eq!(materials.len(), 2);
        assert_eq!(materials[0].description.as_deref(), Some("Steel sheet 2mm"));
        assert_eq!(materials[0].stock_location.as_deref(), Some("A-01"));
        assert_eq!(materials[1].product_code, "RAW-UNKNOWN");
        assert!(materials[1].description.is_none());

        assert!(fetch_job_materials(&db, "OF2", "1").unwrap().is_empty());
    }
}
