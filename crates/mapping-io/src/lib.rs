//! External collaborators around the mapping DSL core: a columnar table
//! reader and the per-output-format writers named in the mapping
//! document's `output_format`.
//!
//! Neither side is part of the DSL/compiler/executor specification;
//! both are thin adapters over mature formats (`serde_json`, `csv`,
//! `rust_xlsxwriter`, `quick-xml`), in the same spirit as
//! `oxide-migrate::dialect` wrapping `sqlx` rather than reimplementing
//! a SQL engine.

pub mod reader;
pub mod writer;
