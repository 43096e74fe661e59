//! Public command model handed to the argument parser and execution engine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::kebab::to_kebab_case;

/// How a command is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// A plain function, called directly.
    Function,
    /// A struct type, instantiated and then run.
    Type,
}

/// One promoted command of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    /// Go identifier of the function or type.
    pub name: String,
    pub kind: CommandKind,
    /// File declaring the command.
    pub file: PathBuf,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// The invocation takes a `context.Context`.
    pub uses_context: bool,
    /// The invocation returns an `error`.
    pub returns_error: bool,
}

impl CommandInfo {
    /// Kebab-case name used on the command line.
    pub fn command_name(&self) -> String {
        to_kebab_case(&self.name)
    }
}

/// Commands grouped by the file that declares them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: PathBuf,
    /// File name without directory.
    pub base_name: String,
    /// Sorted by name.
    pub commands: Vec<CommandInfo>,
}

/// Validated command model for one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageModel {
    pub dir: PathBuf,
    pub package_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
    /// Sorted by name, unique by kebab-case name.
    pub commands: Vec<CommandInfo>,
    /// Sorted by path; only files that declare at least one command.
    pub files: Vec<FileInfo>,
}

impl PackageModel {
    /// Look up a command by its Go identifier.
    pub fn command(&self, name: &str) -> Option<&CommandInfo> {
        self.commands
            .binary_search_by(|c| c.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.commands[i])
    }

    /// Look up a command by its kebab-case command-line name.
    pub fn find_by_command_name(&self, command_name: &str) -> Option<&CommandInfo> {
        self.commands
            .iter()
            .find(|c| c.command_name() == command_name)
    }

    /// Commands of one kind, in name order.
    pub fn commands_of_kind(&self, kind: CommandKind) -> impl Iterator<Item = &CommandInfo> {
        self.commands.iter().filter(move |c| c.kind == kind)
    }
}
