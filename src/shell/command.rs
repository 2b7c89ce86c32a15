use chumsky::{prelude::*, regex::regex};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // INSERT Integer Value
    Insert(i64, String),

    // FIND Integer
    Find(i64),

    // TRAVERSE Integer (LIMIT Count)?
    Traverse { from: i64, limit: Option<usize> },

    // LOAD 'file_path'
    Load(String),

    // SHOW TREE
    ShowTree,

    // SHOW STATS
    ShowStats,

    // DUMP
    Dump,

    // CHECK
    Check,

    // HELP
    Help,

    // EXIT
    Exit,
}

type Extra<'a> = extra::Err<Rich<'a, char>>;

/// Case-insensitive keyword that is not the prefix of a longer word
fn keyword<'a>(word: &'static str) -> impl Parser<'a, &'a str, (), Extra<'a>> {
    regex(&format!(r"(?i){}\b", word)).ignored().padded()
}

fn integer<'a>() -> impl Parser<'a, &'a str, i64, Extra<'a>> {
    regex(r"-?\d+")
        .try_map(|s: &str, span| s.parse().map_err(|e| Rich::custom(span, e)))
        .padded()
}

fn count<'a>() -> impl Parser<'a, &'a str, usize, Extra<'a>> {
    regex(r"\d+")
        .try_map(|s: &str, span| s.parse().map_err(|e| Rich::custom(span, e)))
        .padded()
}

/// Single-quoted string; `\'` and `\\` are the only escapes
fn quoted<'a>() -> impl Parser<'a, &'a str, String, Extra<'a>> {
    regex(r#"'([^'\\]|\\['\\])*'"#)
        .map(|s: &str| unescape(&s[1..s.len() - 1]))
        .padded()
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

fn value<'a>() -> impl Parser<'a, &'a str, String, Extra<'a>> {
    let bare = regex(r"[^\s;']+").map(|s: &str| s.to_string()).padded();
    quoted().or(bare)
}

pub fn parser<'a>() -> impl Parser<'a, &'a str, Vec<Command>, Extra<'a>> {
    let insert = keyword("INSERT")
        .ignore_then(integer())
        .then(value())
        .map(|(key, value)| Command::Insert(key, value));

    let find = keyword("FIND").ignore_then(integer()).map(Command::Find);

    let traverse = keyword("TRAVERSE")
        .ignore_then(integer())
        .then(keyword("LIMIT").ignore_then(count()).or_not())
        .map(|(from, limit)| Command::Traverse { from, limit });

    let load = keyword("LOAD").ignore_then(quoted()).map(Command::Load);

    let show_tree = keyword("SHOW")
        .ignore_then(keyword("TREE"))
        .to(Command::ShowTree);

    let show_stats = keyword("SHOW")
        .ignore_then(keyword("STATS"))
        .to(Command::ShowStats);

    choice((
        insert,
        find,
        traverse,
        load,
        show_tree,
        show_stats,
        keyword("DUMP").to(Command::Dump),
        keyword("CHECK").to(Command::Check),
        keyword("HELP").to(Command::Help),
        keyword("EXIT").to(Command::Exit),
    ))
    .separated_by(just(';').padded())
    .allow_trailing()
    .collect()
    .padded()
}
