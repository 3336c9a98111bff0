use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::defs::{CONTIGS_SHORT_FASTA, MAX_CONTIG_ID_LEN, PipelineError};

/// Insertion-ordered mapping from synthetic contig identifiers to the
/// original header text they replaced. Kept for audit, nothing downstream
/// reads it back.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NameMap {
    entries: Vec<(String, String)>,
}

impl NameMap {
    fn push(&mut self, new: String, old: String) {
        self.entries.push((new, old));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

/// Header rewrite is a two-state line parser: a `>` line starts a record,
/// everything else is sequence payload of the most recent header.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RenameState {
    AwaitingHeader,
    InRecord,
}

/// Rewrites the contigs file so every header is `>contig<N>`, N assigned in
/// file order starting at 0. Payload lines are copied through unchanged, so
/// the renamed file carries the same sequence data as the input.
///
/// Payload appearing before any header is rejected rather than silently
/// passed through.
///
/// # Arguments
///
/// * `contig_file` - Assembler contig output.
///
/// # Returns
/// Path of the renamed sibling file and the new-to-old name map.
pub fn rename_contigs(contig_file: &Path) -> Result<(PathBuf, NameMap), PipelineError> {
    let rename_err = |source| PipelineError::Rename {
        path: contig_file.to_path_buf(),
        source,
    };

    let new_contig_file = contig_file.with_file_name(CONTIGS_SHORT_FASTA);
    let reader = BufReader::new(File::open(contig_file).map_err(rename_err)?);
    let mut writer = BufWriter::new(File::create(&new_contig_file).map_err(rename_err)?);

    let mut name_map = NameMap::default();
    let mut state = RenameState::AwaitingHeader;

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(rename_err)?;
        if line.starts_with('>') {
            let new_name = format!("contig{}", name_map.len());
            debug_assert!(new_name.len() <= MAX_CONTIG_ID_LEN);
            writeln!(writer, ">{}", new_name).map_err(rename_err)?;
            name_map.push(new_name, line[1..].to_string());
            state = RenameState::InRecord;
        } else {
            match state {
                RenameState::AwaitingHeader => {
                    return Err(PipelineError::LeadingSequence {
                        path: contig_file.to_path_buf(),
                        line: index + 1,
                    });
                }
                RenameState::InRecord => writeln!(writer, "{}", line).map_err(rename_err)?,
            }
        }
    }
    writer.flush().map_err(rename_err)?;

    Ok((new_contig_file, name_map))
}

/// Persists the name map as a two-column table: header row `new,old`, one
/// row per renamed contig in assignment order. The original header goes out
/// raw, commas and all; consumers split on the first comma only.
pub fn write_name_map(path: &Path, name_map: &NameMap) -> Result<(), PipelineError> {
    let map_err = |source| PipelineError::Rename {
        path: path.to_path_buf(),
        source,
    };

    let mut file = BufWriter::new(File::create(path).map_err(map_err)?);
    writeln!(file, "new,old").map_err(map_err)?;
    for (new, old) in name_map.entries() {
        writeln!(file, "{},{}", new, old).map_err(map_err)?;
    }
    file.flush().map_err(map_err)?;
    Ok(())
}
