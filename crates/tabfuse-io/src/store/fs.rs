//! JSONL file per task: `task-<id>.jsonl` under the results directory.
//!
//! Records are written to `task-<id>.jsonl.tmp`, synced, then renamed into
//! place, so readers only ever see complete files.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use parking_lot::Mutex;
use tabfuse_core::id::TaskId;
use tabfuse_core::record::MergedRecord;

use super::{wanted, ResultStore};
use crate::error::{Error, Result};
use crate::writers::jsonl::JsonlWriter;

const PREFIX: &str = "task-";
const SUFFIX: &str = ".jsonl";

pub struct FsResultStore {
    dir: PathBuf,
    // serializes writers; readers go straight to the files
    write_lock: Mutex<()>,
}

impl FsResultStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, task_id: TaskId) -> PathBuf {
        self.dir.join(format!("{PREFIX}{task_id}{SUFFIX}"))
    }

    /// Persisted task ids, ascending.
    fn task_ids(&self) -> Result<Vec<TaskId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(id) = name
                .strip_prefix(PREFIX)
                .and_then(|s| s.strip_suffix(SUFFIX))
                .and_then(|s| s.parse::<TaskId>().ok())
            else {
                continue;
            };
            ids.push(id);
        }
        ids.sort();
        Ok(ids)
    }

    fn read_task(&self, task_id: TaskId, columns: &[String], out: &mut Vec<MergedRecord>) -> Result<()> {
        let path = self.path_for(task_id);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let rec: MergedRecord = serde_json::from_str(&line).map_err(|e| {
                Error::Store(format!("{}:{}: {}", path.display(), lineno + 1, e))
            })?;
            if wanted(columns, &rec) {
                out.push(rec);
            }
        }
        Ok(())
    }
}

impl ResultStore for FsResultStore {
    fn write_task(&self, task_id: TaskId, records: Vec<MergedRecord>) -> Result<()> {
        let _guard = self.write_lock.lock();
        let path = self.path_for(task_id);
        if path.exists() {
            return Err(Error::AlreadyPersisted(task_id));
        }
        let tmp = path.with_extension("jsonl.tmp");
        let mut w = JsonlWriter::to_path(&tmp)?;
        w.write_all(&records)?;
        let lines = w.lines();
        w.finish()?.sync_all()?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(task_id = %task_id, records = lines, path = %path.display(), "records persisted");
        Ok(())
    }

    fn records(&self, columns: &[String], task: Option<TaskId>) -> Result<Vec<MergedRecord>> {
        let ids = match task {
            Some(id) => vec![id],
            None => self.task_ids()?,
        };
        let mut out = Vec::new();
        for id in ids {
            self.read_task(id, columns, &mut out)?;
        }
        Ok(out)
    }

    fn contains_task(&self, task_id: TaskId) -> Result<bool> {
        Ok(self.path_for(task_id).exists())
    }

    fn max_task_id(&self) -> Result<Option<TaskId>> {
        Ok(self.task_ids()?.last().copied())
    }
}
