use std::path::PathBuf;

use super::command::Command;

/// Ordered variable → replacement-text mapping established by the most recent
/// `RegisterTreeType`. Replaced wholesale, never merged; lookups are linear,
/// first match wins, exact string equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionTable {
    entries: Vec<(String, String)>,
}

impl SubstitutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_all(&mut self, entries: Vec<(String, String)>) {
        self.entries = entries;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn lookup(&self, variable: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == variable)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Directory holding `<tree-type>.ml` model files that register custom
    /// tree printers in the toplevel.
    pub tree_models_dir: PathBuf,
}

/// The effect a single command asks the session to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    WriteToToplevel(String),
    LoadAuxiliarySource(PathBuf),
    NoOp,
    Error(String),
}

/// Interpret one command against the session's substitution state. Errors are
/// values, not aborts: the caller keeps dispatching the rest of the block.
pub fn dispatch(
    command: &Command,
    table: &mut SubstitutionTable,
    config: &DispatchConfig,
) -> DispatchResult {
    match command {
        Command::SetupPrinter { printer } => DispatchResult::WriteToToplevel(format!(
            "#open \"format\";;\ninstall_printer \"{printer}\";;\n"
        )),
        Command::SendCaml { source } => DispatchResult::WriteToToplevel(source.clone()),
        Command::SubstituteTree { variable } => match table.lookup(variable) {
            Some(value) => DispatchResult::WriteToToplevel(value.to_string()),
            // The reference followed this error with a zero-byte write, which
            // is invisible on the wire; the write is suppressed here.
            None => DispatchResult::Error(format!("unknown variable: {variable}")),
        },
        Command::RegisterTreeType { tree_type, pairs } => {
            table.replace_all(parse_pairs(pairs));
            DispatchResult::LoadAuxiliarySource(config.tree_models_dir.join(format!("{tree_type}.ml")))
        }
        Command::Unknown { name } => DispatchResult::Error(format!("unknown command: {name}")),
        Command::Malformed { name } => DispatchResult::Error(format!("malformed command: {name}")),
    }
}

/// Parse a `;`-separated `name=value` list. Empty fields are skipped; a field
/// that does not split into exactly two non-empty halves on `=` is dropped.
pub fn parse_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter(|field| !field.is_empty())
        .filter_map(|field| {
            let mut halves = field.splitn(2, '=');
            let name = halves.next()?;
            let value = halves.next()?;
            if name.is_empty() || value.is_empty() || value.contains('=') {
                return None;
            }
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}
