use crate::models::{Profile, Repository, RepositoryList};
use colored::*;

pub const EMPTY_LIST_TEXT: &str = "You don't have any repositories yet.";
pub const DIVIDER_TEXT: &str = "My repositories";
const URL_PREVIEW_CHARS: usize = 20;

/// First characters of a URL followed by an ellipsis
pub fn url_preview(url: &str) -> String {
    let preview: String = url.chars().take(URL_PREVIEW_CHARS).collect();
    format!("{}...", preview)
}

pub fn render_header(profile: &Profile) -> String {
    format!(
        "{}\n{}\n",
        profile.name.bold().white(),
        profile.nick.dimmed()
    )
}

pub fn render_repository(repo: &Repository) -> String {
    let marker = if repo.liked { "♥".red() } else { "♡".normal() };
    let techs = repo
        .techs
        .iter()
        .map(|tech| format!("[{}]", tech).cyan().to_string())
        .collect::<Vec<_>>()
        .join(" ");

    let mut out = String::new();
    out.push_str(&format!("{}\n", repo.title.bold()));
    out.push_str(&format!("  {}\n", url_preview(&repo.url).dimmed()));
    if !techs.is_empty() {
        out.push_str(&format!("  {}\n", techs));
    }
    out.push_str(&format!("  {} {}\n", marker, repo.likes_label().bold()));
    out
}

/// Whole screen: header, divider, then either the cards or the empty-state text
pub fn render_screen(profile: &Profile, list: &RepositoryList) -> String {
    let mut out = render_header(profile);
    out.push_str(&format!("{}\n", DIVIDER_TEXT.bold().purple()));
    out.push_str(&format!("{}\n", "=".repeat(DIVIDER_TEXT.len()).dimmed()));

    if list.is_empty() {
        out.push_str(&format!("{}\n", EMPTY_LIST_TEXT.dimmed()));
        return out;
    }

    for repo in list {
        out.push_str(&render_repository(repo));
        out.push('\n');
    }
    out
}
