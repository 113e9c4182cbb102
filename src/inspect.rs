//! Read-only terminal views over the content store.

use comfy_table::{Row, Table};
use itertools::Itertools;

use crate::{
    store::ContentStore,
    thread::{flatten, load_thread},
};

const PREVIEW_CHARS: usize = 60;

pub async fn posts(store: &dyn ContentStore) -> miette::Result<()> {
    let posts = store.posts().await?;

    let mut table = Table::new();
    table.set_header(Row::from(vec!["ID", "Slug", "Title", "Publication Date"]));
    for post in posts {
        table.add_row(Row::from(&[
            &post.id,
            &post.slug,
            &post.title,
            &post.published(),
        ]));
    }
    println!("{table}");

    Ok(())
}

pub async fn thread(store: &dyn ContentStore, post_id: &str) -> miette::Result<()> {
    let roots = load_thread(store, post_id).await?;
    let entries = flatten(&roots);

    let mut table = Table::new();
    table.set_header(Row::from(vec!["ID", "Author", "Posted", "Comment"]));
    for entry in &entries {
        let marker = if entry.depth == 0 { "" } else { "└ " };
        table.add_row(Row::from(&[
            &entry.comment.id,
            &format!("{}{}{}", "  ".repeat(entry.depth), marker, entry.comment.author),
            &entry.comment.published(),
            &preview(&entry.comment.body),
        ]));
    }
    println!("{table}");
    println!(
        "{} approved comments, {} top-level",
        entries.len(),
        roots.len()
    );

    Ok(())
}

/// First line-joined characters of a comment body.
fn preview(body: &str) -> String {
    let joined = body.lines().map(str::trim).filter(|l| !l.is_empty()).join(" ");
    if joined.chars().count() <= PREVIEW_CHARS {
        return joined;
    }
    let cut: String = joined.chars().take(PREVIEW_CHARS).collect();
    format!("{cut}…")
}
