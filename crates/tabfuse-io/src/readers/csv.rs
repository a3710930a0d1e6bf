//! Delimited text (CSV, TSV) with a header row.

use std::io::Read;
use std::path::Path;

use ::csv::ReaderBuilder;
use tabfuse_core::types::Table;

use super::{table_from_rows, RawCell};
use crate::error::Result;

pub struct CsvReader {
    delimiter: u8,
}

impl CsvReader {
    pub fn comma() -> Self {
        Self { delimiter: b',' }
    }

    pub fn tab() -> Self {
        Self { delimiter: b'\t' }
    }

    pub fn read_path(&self, path: &Path) -> Result<Table> {
        let file = std::fs::File::open(path)?;
        self.read(file)
    }

    pub fn read<R: Read>(&self, input: R) -> Result<Table> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for rec in rdr.records() {
            let rec = rec?;
            rows.push(rec.iter().map(RawCell::from_text).collect());
        }
        table_from_rows(headers, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabfuse_core::schema::ColumnKind;
    use tabfuse_core::types::Scalar;

    #[test]
    fn reads_typed_columns() {
        let data = "id,make,price\n1,bmw,20000\n2,audi,\n";
        let table = CsvReader::comma().read(data.as_bytes()).unwrap();
        assert_eq!(table.column_names(), vec!["id", "make", "price"]);
        assert_eq!(table.column("id").unwrap().kind, ColumnKind::Numeric);
        assert_eq!(table.column("make").unwrap().kind, ColumnKind::Categorical);
        assert_eq!(table.column("price").unwrap().values[1], Scalar::Null);
    }

    #[test]
    fn mixed_column_is_categorical() {
        let data = "v\n1\nx\n";
        let table = CsvReader::comma().read(data.as_bytes()).unwrap();
        assert_eq!(table.column("v").unwrap().kind, ColumnKind::Categorical);
        assert_eq!(table.column("v").unwrap().values[0], Scalar::Str("1".into()));
    }

    #[test]
    fn categorical_cells_keep_source_text() {
        let data = "id,code
1,007
2,A12
3,1.50
";
        let table = CsvReader::comma().read(data.as_bytes()).unwrap();
        assert_eq!(table.column("id").unwrap().values[0], Scalar::Num(1.0));
        assert_eq!(
            table.column("code").unwrap().values,
            vec![
                Scalar::Str("007".into()),
                Scalar::Str("A12".into()),
                Scalar::Str("1.50".into()),
            ]
        );
    }

    #[test]
    fn tab_delimited_and_ragged_rows() {
        let data = "a\tb\n1\n2\t3\t4\n";
        let table = CsvReader::tab().read(data.as_bytes()).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column("b").unwrap().values, vec![Scalar::Null, Scalar::Num(3.0)]);
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let data = "a,a\n1,2\n";
        assert!(CsvReader::comma().read(data.as_bytes()).is_err());
    }
}
