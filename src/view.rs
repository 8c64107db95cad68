//! Terminal rendering of the repository list.

use crate::actors::ViewStats;
use crate::types::Repository;
use colored::*;

/// Lines each repository occupies when rendered
pub const ROWS_PER_ITEM: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ScrollDown,
    ScrollUp,
    Retry,
    Stats,
    Quit,
    Unknown,
}

impl Command {
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "" | "j" | "down" => Command::ScrollDown,
            "k" | "up" => Command::ScrollUp,
            "r" | "retry" => Command::Retry,
            "s" | "stats" => Command::Stats,
            "q" | "quit" | "exit" => Command::Quit,
            _ => Command::Unknown,
        }
    }
}

/// Render one repository as `ROWS_PER_ITEM` lines
pub fn render_repository(index: usize, repo: &Repository) -> String {
    let description = repo.description.as_deref().unwrap_or("");
    format!(
        "{:>4}. {}  {} {}  {}\n      {}\n      {}  {}",
        index + 1,
        repo.name.bold(),
        "⭐".yellow(),
        repo.stargazers_count,
        repo.language_label().cyan(),
        description,
        repo.html_url.blue().underline(),
        repo.owner.avatar_url.dimmed(),
    )
}

/// Prints repositories as they scroll into view, each exactly once.
#[derive(Debug, Default)]
pub struct Pager {
    printed: usize,
    loading: bool,
}

impl Pager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn printed(&self) -> usize {
        self.printed
    }

    /// Lines to print for the viewport described by `stats`
    pub fn render(&mut self, stats: &ViewStats, repositories: &[Repository]) -> Vec<String> {
        let end = stats.visible_end().min(repositories.len());
        let mut lines = Vec::new();

        if end > self.printed {
            lines.extend(
                repositories[self.printed..end]
                    .iter()
                    .enumerate()
                    .map(|(i, repo)| render_repository(self.printed + i, repo)),
            );
            self.printed = end;
        }

        if stats.loading && !self.loading {
            lines.push(format!("{}", "Loading more repositories...".dimmed()));
        }
        self.loading = stats.loading;

        lines
    }
}

pub fn render_stats(stats: &ViewStats) -> String {
    format!(
        "📊 {} repositories loaded, next page {}, rows {}-{} of {}, {} requests triggered{}",
        stats.repositories,
        stats.page,
        stats.offset,
        stats.offset + stats.viewport_rows,
        stats.content_rows,
        stats.demands_fired,
        if stats.loading { " (loading)" } else { "" }
    )
}
