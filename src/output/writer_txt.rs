use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::concurrent::ResultSet;

/// Names in lexical order so repeated runs diff cleanly.
pub fn sorted_names(names: &ResultSet) -> Vec<&str> {
    let mut out: Vec<&str> = names.iter().map(String::as_str).collect();
    out.sort_unstable();
    out
}

/// One name per line.
pub fn write_names(path: &Path, names: &ResultSet) -> anyhow::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    for name in sorted_names(names) {
        w.write_all(name.as_bytes())?;
        w.write_all(b"\n")?;
    }
    w.flush()?;
    Ok(())
}
