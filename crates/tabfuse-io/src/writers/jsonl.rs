//! Streaming NDJSON writer: one serialized value per line.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::Result;

pub struct JsonlWriter<W: Write> {
    writer: BufWriter<W>,
    lines: usize,
}

impl JsonlWriter<File> {
    pub fn to_path(path: &Path) -> Result<Self> {
        let f = File::create(path)?;
        Ok(Self::to_writer(f))
    }
}

impl<W: Write> JsonlWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            lines: 0,
        }
    }

    pub fn write<T: Serialize>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, value)?;
        self.writer.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    pub fn write_all<'a, T, I>(&mut self, values: I) -> Result<()>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        for v in values {
            self.write(v)?;
        }
        Ok(())
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Flush and hand back the inner writer.
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::error::Error::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn one_value_per_line() {
        let mut w = JsonlWriter::to_writer(Vec::new());
        let a: BTreeMap<&str, i32> = [("x", 1)].into_iter().collect();
        let b: BTreeMap<&str, i32> = [("x", 2)].into_iter().collect();
        w.write_all([&a, &b]).unwrap();
        assert_eq!(w.lines(), 2);
        let out = String::from_utf8(w.finish().unwrap()).unwrap();
        assert_eq!(out, "{\"x\":1}\n{\"x\":2}\n");
    }
}
