#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;

pub const TRANSPORT_LONG: &str = "tf_transporte €/(kWh/día) y año";

#[derive(Clone, Debug)]
pub enum V {
    S(&'static str),
    N(f64),
    Blank,
}

#[derive(Clone, Debug)]
pub struct SheetDef {
    pub name: &'static str,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<V>>,
}

impl SheetDef {
    pub fn new(name: &'static str, columns: &[&'static str], rows: Vec<Vec<V>>) -> Self {
        Self {
            name,
            columns: columns.to_vec(),
            rows,
        }
    }
}

/// The reference sheets matching `tests/fixtures/factura_rl1.xml`.
pub fn standard_sheets() -> Vec<SheetDef> {
    use V::*;
    vec![
        SheetDef::new(
            "REF_peajes_local",
            &["peaje", "tf", "tv"],
            vec![
                vec![S("RL.1"), N(0.0254), N(0.0391)],
                vec![S("RL.2"), N(0.0612), N(0.0318)],
            ],
        ),
        SheetDef::new(
            "REF_peajes_regas",
            &["peaje", "tf_regas"],
            vec![vec![S("RL.1"), N(0.0011)], vec![S("RL.2"), N(0.0013)]],
        ),
        SheetDef::new(
            "REF_cargo_ministerio",
            &["peaje", "tf"],
            vec![vec![S("RL.1"), N(0.0007)], vec![S("RL.2"), N(0.0009)]],
        ),
        SheetDef::new(
            "REF_peajes_transporte",
            &[TRANSPORT_LONG, "tf"],
            vec![vec![N(0.0150), N(0.0999)]],
        ),
        SheetDef::new(
            "REF_multiplicadores",
            &["periodo", "factor"],
            vec![vec![S("diario"), N(1.0)], vec![S("trimestral"), N(1.05)]],
        ),
        SheetDef::new(
            "REF_rules_conceptos",
            &["codconcepto", "tabla"],
            vec![vec![S("2002"), S("local")], vec![S("2000"), S("local")]],
        ),
    ]
}

/// Replace (or drop, with `None`) one sheet of a sheet list.
pub fn replace_sheet(
    mut sheets: Vec<SheetDef>,
    name: &str,
    replacement: Option<SheetDef>,
) -> Vec<SheetDef> {
    let idx = sheets
        .iter()
        .position(|s| s.name == name)
        .unwrap_or_else(|| panic!("no sheet {name}"));
    match replacement {
        Some(sheet) => sheets[idx] = sheet,
        None => {
            sheets.remove(idx);
        }
    }
    sheets
}

fn build(sheets: &[SheetDef]) -> Workbook {
    let mut workbook = Workbook::new();
    for def in sheets {
        let ws = workbook.add_worksheet();
        ws.set_name(def.name).unwrap();
        for (c, name) in def.columns.iter().enumerate() {
            ws.write_string(0, c as u16, *name).unwrap();
        }
        for (r, row) in def.rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let (r, c) = (r as u32 + 1, c as u16);
                match value {
                    V::S(s) => {
                        ws.write_string(r, c, *s).unwrap();
                    }
                    V::N(n) => {
                        ws.write_number(r, c, *n).unwrap();
                    }
                    V::Blank => {}
                }
            }
        }
    }
    workbook
}

pub fn workbook_bytes(sheets: &[SheetDef]) -> Vec<u8> {
    build(sheets).save_to_buffer().unwrap()
}

pub fn save_workbook(dir: &Path, file: &str, sheets: &[SheetDef]) -> PathBuf {
    let path = dir.join(file);
    build(sheets).save(&path).unwrap();
    path
}

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}
