//! End-of-run report rendering

use crate::output::stats::StatsSnapshot;

const INNER_WIDTH: usize = 39;

/// Renders the boxed end-of-run summary
pub fn render_report(snapshot: &StatsSnapshot) -> String {
    let rows = [
        ("Jobs Found", snapshot.jobs_found.to_string()),
        ("Jobs Scraped", snapshot.jobs_scraped.to_string()),
        ("Errors", snapshot.errors.to_string()),
        (
            "IP Blocked",
            if snapshot.ip_blocked { "YES" } else { "NO" }.to_string(),
        ),
        ("Duration", format!("{}s", snapshot.duration_ms / 1000)),
    ];

    let width = INNER_WIDTH;
    let bar = "═".repeat(width);
    let mut out = String::new();
    out.push_str(&format!("╔{bar}╗\n"));
    out.push_str(&format!("║{:^width$}║\n", "SCRAPING COMPLETED"));
    out.push_str(&format!("╠{bar}╣\n"));
    for (label, value) in rows {
        out.push_str(&format!(
            "║ {:<17}{:<21}║\n",
            format!("{label}:"),
            value
        ));
    }
    out.push_str(&format!("╚{bar}╝"));
    out
}

/// Prints the boxed end-of-run summary to stdout
pub fn print_report(snapshot: &StatsSnapshot) {
    println!("\n{}", render_report(snapshot));
}
