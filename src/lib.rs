pub mod btree;
pub mod shell;

pub use btree::{BTree, BTreeError, BTreeIter, BTreeResult, DEFAULT_CAPACITY, Node};
pub use shell::{Command, Response, Shell, ShellError, ShellResult};
