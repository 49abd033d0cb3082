//! HTML index pages for directories.

use std::io;
use std::path::Path;

/// Builds the index page for `dir`, requested as `uri`.
///
/// Each direct child becomes one anchor whose href is `uri` joined with the
/// child name. Entries appear in the order the filesystem yields them.
pub async fn render_directory(uri: &str, dir: &Path) -> io::Result<String> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(render_listing(uri, &names))
}

/// Pure rendering half of [`render_directory`].
pub fn render_listing<S: AsRef<str>>(uri: &str, names: &[S]) -> String {
    let base = uri.trim_end_matches('/');
    let mut html = format!(
        "<html><head><title>Index of {uri}</title></head><body><h1>Index of {uri}</h1><hr><pre>"
    );
    for name in names {
        let name = name.as_ref();
        html.push_str(&format!(" <a href=\"{base}/{name}\">{base}/{name}</a>\n"));
    }
    html.push_str("<hr></pre></body></html>");
    html
}
