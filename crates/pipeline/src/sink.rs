//! Record sinks: in-memory tables and JSON Lines files

use scriptorium_common::{
    Anchor, Anomaly, GlyphAlignment, RecordSink, Region, RegionEdge, RunContext, SinkError,
    WordAlignment,
};
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Upserts every record into ordered in-memory tables
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub word_alignments: BTreeMap<String, WordAlignment>,
    pub glyph_alignments: BTreeMap<String, GlyphAlignment>,
    pub regions: BTreeMap<String, Region>,
    pub region_edges: BTreeMap<String, RegionEdge>,
    pub anchors: BTreeMap<String, Anchor>,
    pub anomalies: Vec<Anomaly>,
    /// Run ids seen, in first-write order
    pub runs: Vec<String>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn note_run(&mut self, run: &RunContext) {
        if !self.runs.contains(&run.run_id) {
            self.runs.push(run.run_id.clone());
        }
    }
}

impl RecordSink for MemorySink {
    fn add_word_alignment(&mut self, run: &RunContext, record: &WordAlignment) -> Result<(), SinkError> {
        self.note_run(run);
        self.word_alignments.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn add_glyph_alignment(&mut self, run: &RunContext, record: &GlyphAlignment) -> Result<(), SinkError> {
        self.note_run(run);
        self.glyph_alignments.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn add_region(&mut self, run: &RunContext, record: &Region) -> Result<(), SinkError> {
        self.note_run(run);
        self.regions.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn add_region_edge(&mut self, run: &RunContext, record: &RegionEdge) -> Result<(), SinkError> {
        self.note_run(run);
        self.region_edges.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn add_anchor(&mut self, run: &RunContext, record: &Anchor) -> Result<(), SinkError> {
        self.note_run(run);
        self.anchors.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn add_anomaly(&mut self, run: &RunContext, anomaly: &Anomaly) -> Result<(), SinkError> {
        self.note_run(run);
        self.anomalies.push(anomaly.clone());
        Ok(())
    }
}

/// File name of each table written by [`JsonlSink`]
pub const WORD_ALIGNMENTS_FILE: &str = "word_alignments.jsonl";
pub const GLYPH_ALIGNMENTS_FILE: &str = "glyph_alignments.jsonl";
pub const REGIONS_FILE: &str = "regions.jsonl";
pub const REGION_EDGES_FILE: &str = "region_edges.jsonl";
pub const ANCHORS_FILE: &str = "anchors.jsonl";
pub const ANOMALIES_FILE: &str = "anomalies.jsonl";

#[derive(Serialize)]
struct Envelope<'a, T> {
    run_id: &'a str,
    record: &'a T,
}

struct Table {
    writer: BufWriter<File>,
    seen: HashSet<String>,
}

/// Appends one JSON object per record to a file per table
///
/// Each line is `{"run_id": ..., "record": ...}`. Within one sink a record id
/// is written once; files are opened in append mode so successive runs
/// accumulate.
pub struct JsonlSink {
    dir: PathBuf,
    tables: BTreeMap<&'static str, Table>,
}

impl std::fmt::Debug for JsonlSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlSink")
            .field("dir", &self.dir)
            .field("tables", &self.tables.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl JsonlSink {
    /// Create the output directory if needed
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            tables: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn table(&mut self, file: &'static str) -> Result<&mut Table, SinkError> {
        match self.tables.entry(file) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let path = self.dir.join(file);
                debug!("Opening {}", path.display());
                let handle = OpenOptions::new().create(true).append(true).open(&path)?;
                Ok(entry.insert(Table {
                    writer: BufWriter::new(handle),
                    seen: HashSet::new(),
                }))
            }
        }
    }

    fn write<T: Serialize>(
        &mut self,
        file: &'static str,
        id: Option<&str>,
        run: &RunContext,
        record: &T,
    ) -> Result<(), SinkError> {
        let table = self.table(file)?;
        if let Some(id) = id {
            if !table.seen.insert(id.to_string()) {
                return Ok(());
            }
        }
        let envelope = Envelope {
            run_id: &run.run_id,
            record,
        };
        serde_json::to_writer(&mut table.writer, &envelope)?;
        table.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl RecordSink for JsonlSink {
    fn add_word_alignment(&mut self, run: &RunContext, record: &WordAlignment) -> Result<(), SinkError> {
        self.write(WORD_ALIGNMENTS_FILE, Some(&record.id), run, record)
    }

    fn add_glyph_alignment(&mut self, run: &RunContext, record: &GlyphAlignment) -> Result<(), SinkError> {
        self.write(GLYPH_ALIGNMENTS_FILE, Some(&record.id), run, record)
    }

    fn add_region(&mut self, run: &RunContext, record: &Region) -> Result<(), SinkError> {
        self.write(REGIONS_FILE, Some(&record.id), run, record)
    }

    fn add_region_edge(&mut self, run: &RunContext, record: &RegionEdge) -> Result<(), SinkError> {
        self.write(REGION_EDGES_FILE, Some(&record.id), run, record)
    }

    fn add_anchor(&mut self, run: &RunContext, record: &Anchor) -> Result<(), SinkError> {
        self.write(ANCHORS_FILE, Some(&record.id), run, record)
    }

    fn add_anomaly(&mut self, run: &RunContext, anomaly: &Anomaly) -> Result<(), SinkError> {
        self.write(ANOMALIES_FILE, None, run, anomaly)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        for table in self.tables.values_mut() {
            table.writer.flush()?;
        }
        Ok(())
    }
}
