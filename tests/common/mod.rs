//! Shared fixtures: per-test temp directories and the car source files.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use tabfuse_core::config::ServiceConfig;

pub struct TestDirs {
    pub root: PathBuf,
    pub data: PathBuf,
    pub results: PathBuf,
}

impl TestDirs {
    pub fn new(name: &str) -> Self {
        let mut root = std::env::temp_dir();
        root.push(format!("tabfuse-it-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        let data = root.join("data");
        let results = root.join("results");
        fs::create_dir_all(&data).expect("create data dir");
        Self {
            root,
            data,
            results,
        }
    }

    pub fn write(&self, name: &str, contents: &str) {
        fs::write(self.data.join(name), contents).expect("write fixture");
    }

    /// Source A `{id, make, price}`, source B `{id, color}`, and a source
    /// that shares no column with either.
    pub fn with_cars(self) -> Self {
        self.write("a.csv", "id,make,price\n1,bmw,20000\n2,audi,30000\n");
        self.write("b.csv", "id,color\n1,black\n3,white\n");
        self.write("c.csv", "shade\nred\n");
        self
    }

    pub fn config(&self) -> ServiceConfig {
        ServiceConfig {
            data_dir: self.data.clone(),
            results_dir: Some(self.results.clone()),
            ..Default::default()
        }
    }
}

impl Drop for TestDirs {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}
