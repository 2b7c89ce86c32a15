//! Interactive command shell over a `BTree<i64, String>`
//!
//! Commands are `;`-separated statements (see [`Command`]). Each statement
//! produces a [`Response`], which renders as a table or plain text.

mod command;
mod error;

pub use command::{Command, parser};
pub use error::{ShellError, ShellResult};

use std::path::Path;

use chumsky::Parser;
use csv::{ReaderBuilder, Trim};
use prettytable::{Cell, Row, Table};
use tracing::{debug, info};

use crate::btree::BTree;

pub const HELP_TEXT: &str = "\
INSERT <key> <value>;          add an entry (quote values with spaces: 'a b')
FIND <key>;                    look up the first entry for a key
TRAVERSE <key> [LIMIT <n>];    list entries in key order from <key>
LOAD '<path>';                 bulk insert a key,value CSV file (with header)
SHOW TREE;                     print the node layout
SHOW STATS;                    print entry count, height and capacity
DUMP;                          print the tree as JSON
CHECK;                         verify the tree invariants
HELP;                          show this message
EXIT;                          leave the shell
";

/// Outcome of a single command
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Inserted(i64),
    Found(i64, Option<String>),
    Entries(Vec<(i64, String)>),
    Loaded(usize),
    Tree(String),
    Stats {
        len: usize,
        height: usize,
        capacity: usize,
    },
    Json(String),
    Valid,
    Help,
    Exit,
}

impl Response {
    /// Render the response for the terminal
    pub fn render(&self) -> String {
        match self {
            Response::Inserted(key) => format!("Inserted key {}\n", key),
            Response::Found(key, Some(value)) => {
                let mut table = entry_table();
                table.add_row(entry_row(*key, value));
                table.to_string()
            }
            Response::Found(key, None) => format!("Key {} not found\n", key),
            Response::Entries(entries) => {
                let mut table = entry_table();
                for (key, value) in entries {
                    table.add_row(entry_row(*key, value));
                }
                format!("{}{} row(s)\n", table, entries.len())
            }
            Response::Loaded(rows) => format!("Loaded {} row(s)\n", rows),
            Response::Tree(layout) => layout.clone(),
            Response::Stats {
                len,
                height,
                capacity,
            } => {
                let mut table = Table::new();
                table.set_titles(Row::new(vec![
                    Cell::new("entries"),
                    Cell::new("height"),
                    Cell::new("capacity"),
                ]));
                table.add_row(Row::new(vec![
                    Cell::new(&len.to_string()),
                    Cell::new(&height.to_string()),
                    Cell::new(&capacity.to_string()),
                ]));
                table.to_string()
            }
            Response::Json(json) => format!("{}\n", json),
            Response::Valid => "Tree invariants hold\n".to_string(),
            Response::Help => HELP_TEXT.to_string(),
            Response::Exit => String::new(),
        }
    }
}

fn entry_table() -> Table {
    let mut table = Table::new();
    table.set_titles(Row::new(vec![Cell::new("key"), Cell::new("value")]));
    table
}

fn entry_row(key: i64, value: &str) -> Row {
    Row::new(vec![Cell::new(&key.to_string()), Cell::new(value)])
}

/// Shell state: the tree being edited
pub struct Shell {
    tree: BTree<i64, String>,
}

impl Shell {
    /// Create a shell over an empty tree with the given node capacity
    pub fn new(capacity: usize) -> ShellResult<Self> {
        Ok(Self {
            tree: BTree::new(capacity)?,
        })
    }

    pub fn tree(&self) -> &BTree<i64, String> {
        &self.tree
    }

    /// Parse and run every command in `input`, one outcome per command.
    ///
    /// Execution stops after the first failing command or an `EXIT`, so the
    /// last element is then the error or [`Response::Exit`]. Commands before
    /// a failure keep their effect on the tree and their responses are
    /// still returned. A parse error runs nothing and is the only element.
    pub fn run_line(&mut self, input: &str) -> Vec<ShellResult<Response>> {
        let commands = match parser().parse(input).into_result() {
            Ok(commands) => commands,
            Err(errs) => {
                let message = errs
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                return vec![Err(ShellError::Parse(message))];
            }
        };

        let mut outcomes = Vec::with_capacity(commands.len());
        for command in commands {
            let outcome = self.execute(command);
            let stop = !matches!(outcome, Ok(ref response) if *response != Response::Exit);
            outcomes.push(outcome);
            if stop {
                break;
            }
        }

        outcomes
    }

    /// Run a single parsed command
    pub fn execute(&mut self, command: Command) -> ShellResult<Response> {
        debug!(?command, "execute");

        let response = match command {
            Command::Insert(key, value) => {
                self.tree.insert(key, value)?;
                Response::Inserted(key)
            }
            Command::Find(key) => Response::Found(key, self.tree.find(&key).cloned()),
            Command::Traverse { from, limit } => Response::Entries(
                self.tree
                    .range_entries(&from, limit)
                    .into_iter()
                    .map(|(key, value)| (*key, value.clone()))
                    .collect(),
            ),
            Command::Load(path) => Response::Loaded(self.load_csv(&path)?),
            Command::ShowTree => Response::Tree(self.tree.to_string()),
            Command::ShowStats => Response::Stats {
                len: self.tree.len(),
                height: self.tree.height(),
                capacity: self.tree.capacity(),
            },
            Command::Dump => Response::Json(serde_json::to_string_pretty(&self.tree)?),
            Command::Check => {
                self.tree.check_invariants()?;
                Response::Valid
            }
            Command::Help => Response::Help,
            Command::Exit => Response::Exit,
        };

        Ok(response)
    }

    /// Insert every `key,value` row of a CSV file with a header row.
    ///
    /// The whole file is read and validated before the first insert, so a
    /// malformed row leaves the tree untouched.
    pub fn load_csv(&mut self, path: impl AsRef<Path>) -> ShellResult<usize> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_path(path)?;

        let entries = reader
            .deserialize()
            .collect::<Result<Vec<(i64, String)>, csv::Error>>()?;

        let rows = entries.len();
        for (key, value) in entries {
            self.tree.insert(key, value)?;
        }

        info!(rows, path = %path.display(), "loaded csv");
        Ok(rows)
    }
}
