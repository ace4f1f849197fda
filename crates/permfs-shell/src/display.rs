//! Display utilities for shell output
//!
//! Coloured human-readable lines, or one JSON object per command.

use colored::*;
use permfs_core::{EntryInfo, EntryKind, Listing};
use serde_json::{json, Value};

use crate::command::{Output, Reply, ShellError};

/// Print the acknowledgement of a command without output
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg.dimmed());
}

/// Print a failed command with its error kind, e.g. `✗ [NotEmpty] ...`
pub fn print_error(kind: &str, msg: &str) {
    eprintln!("{} {} {}", "✗".red().bold(), format!("[{kind}]").red(), msg);
}

/// One `ls -l` style row.
pub fn format_entry(entry: &EntryInfo) -> String {
    let kind = match entry.kind {
        EntryKind::Directory => 'd',
        EntryKind::File => '-',
    };
    let size = entry.size.unwrap_or(0);
    format!(
        "{}{} {:<10} {:>8} {}",
        kind,
        entry.permissions.symbolic(),
        entry.owner,
        size,
        entry.name
    )
}

pub fn print_listing(listing: &Listing) {
    if listing.is_empty() {
        println!("{}", "(empty)".dimmed().italic());
        return;
    }
    for entry in &listing.directories {
        let row = format_entry(entry);
        println!("{}", row.blue().bold());
    }
    for entry in &listing.files {
        println!("{}", format_entry(entry));
    }
}

pub fn print_reply(reply: &Reply, json: bool) {
    if json {
        println!("{}", reply_json(reply));
        return;
    }

    match reply {
        Reply::Output(Output::Done) => print_success("ok"),
        Reply::Output(Output::Text(text)) => println!("{text}"),
        Reply::Output(Output::Listing(listing)) => print_listing(listing),
        Reply::Output(Output::Users(names)) => {
            for name in names {
                println!("{}", name.yellow());
            }
        }
        Reply::Error(ShellError::Usage(text)) => eprintln!("{text}"),
        Reply::Error(e) => print_error(&error_kind(e), &e.to_string()),
        Reply::Exit => {}
    }
}

/// Kind tag of an error: the [`permfs_core::ErrorKind`] name, or `Usage` for shell errors.
pub fn error_kind(error: &ShellError) -> String {
    match error {
        ShellError::Fs(e) => format!("{:?}", e.kind()),
        _ => "Usage".to_string(),
    }
}

/// `{"ok": true, "result": ...}` or `{"ok": false, "error": {...}}`.
pub fn reply_json(reply: &Reply) -> Value {
    match reply {
        Reply::Output(output) => json!({ "ok": true, "result": output }),
        Reply::Error(e) => json!({
            "ok": false,
            "error": { "kind": error_kind(e), "message": e.to_string() },
        }),
        Reply::Exit => json!({ "ok": true, "result": "exit" }),
    }
}

pub fn print_prompt(prompt: &str) {
    use std::io::Write;
    print!("{}", prompt.cyan());
    // A failed flush only delays the prompt.
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use permfs_core::{FsError, PermissionTriple};

    use super::*;

    fn file_entry() -> EntryInfo {
        EntryInfo {
            name: "notes.txt".into(),
            kind: EntryKind::File,
            owner: "usuario1".into(),
            permissions: PermissionTriple::from_mode(0o640),
            size: Some(12),
        }
    }

    #[test]
    fn test_format_entry() {
        assert_eq!(
            format_entry(&file_entry()),
            "-rw-r----- usuario1         12 notes.txt"
        );
    }

    #[test]
    fn test_format_directory_entry() {
        let entry = EntryInfo {
            name: "docs".into(),
            kind: EntryKind::Directory,
            owner: "root".into(),
            permissions: PermissionTriple::DIR_DEFAULT,
            size: None,
        };
        assert!(format_entry(&entry).starts_with("drwxr-xr-x root"));
    }

    #[test]
    fn test_json_listing() {
        let listing = Listing {
            directories: vec![],
            files: vec![file_entry()],
        };
        let value = reply_json(&Reply::Output(Output::Listing(listing)));
        assert_eq!(value["ok"], true);
        assert_eq!(value["result"]["files"][0]["name"], "notes.txt");
        assert_eq!(value["result"]["files"][0]["permissions"], "640");
        assert_eq!(value["result"]["files"][0]["kind"], "file");
    }

    #[test]
    fn test_json_error() {
        let reply = Reply::Error(ShellError::Fs(FsError::not_empty("/d")));
        let value = reply_json(&reply);
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"]["kind"], "NotEmpty");
        assert!(value["error"]["message"].as_str().unwrap().contains("/d"));
    }

    #[test]
    fn test_error_kind_tags() {
        let err = ShellError::Fs(FsError::unknown_user("mallory"));
        assert_eq!(error_kind(&err), "UnknownUser");
        assert_eq!(error_kind(&ShellError::UnterminatedQuote("\"x".into())), "Usage");
    }

    #[test]
    fn test_json_text() {
        let value = reply_json(&Reply::Output(Output::Text("/home".into())));
        assert_eq!(value["result"], "/home");
    }
}
