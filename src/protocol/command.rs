/// One parsed protocol command. A command block body carries a tab-separated
/// field list holding one or more commands back to back; each command name
/// consumes its own fixed number of argument fields.
///
/// Unknown names still parse (the grammar stays open to extension); deciding
/// what to do with them is the dispatcher's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetupPrinter { printer: String },
    SendCaml { source: String },
    SubstituteTree { variable: String },
    RegisterTreeType { tree_type: String, pairs: String },
    Unknown { name: String },
    Malformed { name: String },
}

impl Command {
    pub fn name(&self) -> &str {
        match self {
            Command::SetupPrinter { .. } => "SetupPrinter",
            Command::SendCaml { .. } => "SendCaml",
            Command::SubstituteTree { .. } => "SubstituteTree",
            Command::RegisterTreeType { .. } => "RegisterTreeType",
            Command::Unknown { name } | Command::Malformed { name } => name,
        }
    }
}

/// Split a command block body into commands. Empty name fields (stray tabs,
/// leading newlines) are skipped; argument fields are taken verbatim.
pub fn parse_command_block(body: &str) -> Vec<Command> {
    let fields: Vec<&str> = body.split('\t').collect();
    let mut commands = Vec::new();
    let mut index = 0;

    while index < fields.len() {
        let name = fields[index].trim();
        index += 1;
        if name.is_empty() {
            continue;
        }

        let mut take_arg = |index: &mut usize| -> Option<String> {
            if *index < fields.len() {
                let arg = fields[*index].to_string();
                *index += 1;
                Some(arg)
            } else {
                None
            }
        };

        let command = match name {
            "SetupPrinter" => match take_arg(&mut index) {
                Some(printer) => Command::SetupPrinter { printer },
                None => Command::Malformed {
                    name: name.to_string(),
                },
            },
            "SendCaml" => match take_arg(&mut index) {
                Some(source) => Command::SendCaml { source },
                None => Command::Malformed {
                    name: name.to_string(),
                },
            },
            "SubstituteTree" => match take_arg(&mut index) {
                Some(variable) => Command::SubstituteTree {
                    variable: variable.trim().to_string(),
                },
                None => Command::Malformed {
                    name: name.to_string(),
                },
            },
            "RegisterTreeType" => match (take_arg(&mut index), take_arg(&mut index)) {
                (Some(tree_type), Some(pairs)) => Command::RegisterTreeType {
                    tree_type: tree_type.trim().to_string(),
                    pairs,
                },
                _ => Command::Malformed {
                    name: name.to_string(),
                },
            },
            _ => Command::Unknown {
                name: name.to_string(),
            },
        };
        commands.push(command);
    }

    commands
}
