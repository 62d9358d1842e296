#![allow(dead_code)]

use rusqlite::params;
use shopfloor::Database;

/// Builder that seeds ERP rows: operators, products, jobs and their
/// sequences.
pub struct ErpFixture<'a> {
    db: &'a Database,
}

impl<'a> ErpFixture<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn operator(self, id: i64, code: &str, name: &str) -> Self {
        self.exec(
            "INSERT INTO operators (operator_id, erp_code, name) VALUES (?1, ?2, ?3)",
            params![id, code, name],
        )
    }

    pub fn product(self, id: i64, code: &str, description: &str) -> Self {
        self.exec(
            "INSERT INTO products (product_id, erp_code, description, unit) VALUES (?1, ?2, ?3, 'PC')",
            params![id, code, description],
        )
    }

    pub fn drawing(self, product_id: i64, path: &str) -> Self {
        self.exec(
            "INSERT INTO product_drawings (product_id, drawing_path) VALUES (?1, ?2)",
            params![product_id, path],
        )
    }

    pub fn job(self, company: &str, job: &str, product_id: i64, programmed: f64) -> Self {
        self.exec(
            "INSERT INTO jobs (company_id, job_number, product_id, programmed_qty)
             VALUES (?1, ?2, ?3, ?4)",
            params![company, job, product_id, programmed],
        )
    }

    pub fn operation(self, company: &str, job: &str, sequence: &str, machine: &str) -> Self {
        self.exec(
            "INSERT INTO job_operations
                (company_id, job_number, sequence_code, machine_code, machine_time, hourly_rate)
             VALUES (?1, ?2, ?3, ?4, 1.0, 60)",
            params![company, job, sequence, machine],
        )
    }

    pub fn assign(self, company: &str, job: &str, sequence: &str, operator_id: i64, order: i64) -> Self {
        self.exec(
            "INSERT INTO sequence_assignments
                (company_id, job_number, sequence_code, operator_id, sequence_order)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![company, job, sequence, operator_id, order],
        )
    }

    pub fn launch(self, company: &str, job: &str, sequence: &str, quantity: f64) -> Self {
        self.exec(
            "INSERT INTO production_launches (company_id, job_number, sequence_code, quantity)
             VALUES (?1, ?2, ?3, ?4)",
            params![company, job, sequence, quantity],
        )
    }

    pub fn material(self, company: &str, job: &str, product_code: &str, stock: Option<&str>) -> Self {
        self.exec(
            "INSERT INTO job_materials (company_id, job_number, product_code, stock_location)
             VALUES (?1, ?2, ?3, ?4)",
            params![company, job, product_code, stock],
        )
    }

    fn exec(self, sql: &str, params: impl rusqlite::Params) -> Self {
        self.db
            .with_conn(|conn| {
                conn.execute(sql, params)?;
                Ok(())
            })
            .expect("fixture insert failed");
        self
    }
}

/// One operator with a laser job of two sequences, one job with materials
/// only, and a second operator with nothing assigned.
pub fn standard_floor(db: &Database) {
    ErpFixture::new(db)
        .operator(1, "100", "Ana")
        .operator(2, "200", "Bruno")
        .product(10, "P-10", "Bracket")
        .product(20, "RAW-1", "Steel sheet 2mm")
        .drawing(10, "/step/bracket.step")
        .job("1", "OF1", 10, 100.0)
        .job("1", "OF2", 10, 20.0)
        .operation("1", "OF1", "10", "LASER-01")
        .operation("1", "OF1", "20", "BEND-02")
        .assign("1", "OF1", "10", 1, 1)
        .assign("1", "OF1", "20", 1, 2)
        .launch("1", "OF1", "10", 25.0)
        .material("1", "OF1", "RAW-1", Some("A-01"))
        .material("1", "OF2", "RAW-1", Some("A-02"));
}
