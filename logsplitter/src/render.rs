//! Terminal rendering of store state

use logsplitter_core::format::{format_file_size, format_relative_time, format_relative_time_opt, truncate};
use logsplitter_core::store::analytics::{AnalyticsState, Feed};
use logsplitter_core::types::{
    ApiKey, DashboardData, LogGroup, LogLevel, Pagination, Plan, SearchResult, SearchSuggestion, Upload,
    UploadResult, UserProfile, Webhook, WebhookDelivery, WebhookDeliveryStats, WebhookWithStats,
};

const MESSAGE_WIDTH: usize = 72;

pub fn heading(title: &str) {
    println!("{}", title);
    println!("{}", "=".repeat(title.len()));
}

pub fn showing(shown: usize, pagination: Option<Pagination>) {
    match pagination {
        Some(p) if p.has_more => println!("\nShowing {} of {} (use --all to load everything)", shown, p.total),
        Some(p) => println!("\nShowing {} of {}", shown, p.total),
        None => {}
    }
}

pub fn uploads(uploads: &[Upload]) {
    if uploads.is_empty() {
        println!("No uploads yet. Run 'logsplitter upload <file>' to add one.");
        return;
    }
    println!(
        "{:<26} {:<30} {:>9} {:>7} {:>8}  {}",
        "ID", "FILE", "LINES", "ERRORS", "PATTERNS", "UPLOADED"
    );
    for u in uploads {
        println!(
            "{:<26} {:<30} {:>9} {:>7} {:>8}  {}",
            truncate(&u.id, 26),
            truncate(&u.filename, 30),
            u.total_lines,
            u.level_counts.error,
            u.patterns_found,
            format_relative_time(u.created_at)
        );
    }
}

pub fn upload_header(upload: &Upload) {
    heading(&upload.filename);
    println!("ID:        {}", upload.id);
    println!("Uploaded:  {}", format_relative_time(upload.created_at));
    println!("Lines:     {}", upload.total_lines);
    print!("Levels:   ");
    for level in LogLevel::ALL {
        print!(" {}={}", level, upload.level_counts.get(level));
    }
    println!();
    println!();
}

pub fn groups(groups: &[LogGroup]) {
    if groups.is_empty() {
        println!("No matching log groups.");
        return;
    }
    println!("{:<8} {:>7}  {:<14} {}", "LEVEL", "COUNT", "LAST SEEN", "MESSAGE");
    for g in groups {
        println!(
            "{:<8} {:>7}  {:<14} {}",
            g.level,
            g.count,
            format_relative_time(g.last_seen_at),
            truncate(&g.message_sample, MESSAGE_WIDTH)
        );
    }
}

pub fn upload_result(result: &UploadResult, size: Option<u64>) {
    println!("Uploaded {}", result.upload.original_filename);
    println!("  ID:              {}", result.upload.id);
    if let Some(size) = size {
        println!("  Size:            {}", format_file_size(size));
    }
    println!(
        "  Lines:           {} ({} processed)",
        result.summary.total_lines, result.summary.processed_lines
    );
    println!("  Unique patterns: {}", result.summary.unique_patterns);
    println!("  Groups:          {}", result.groups_count);
    print!("  By level:       ");
    for level in LogLevel::ALL {
        print!(" {}={}", level, result.summary.by_level.get(level));
    }
    println!();
}

pub fn search_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No results.");
        return;
    }
    println!("{:<8} {:>7}  {:<24} {}", "LEVEL", "COUNT", "FILE", "MESSAGE");
    for r in results {
        println!(
            "{:<8} {:>7}  {:<24} {}",
            r.level,
            r.count,
            truncate(&r.filename, 24),
            truncate(&r.message_sample, MESSAGE_WIDTH)
        );
    }
}

pub fn suggestions(suggestions: &[SearchSuggestion]) {
    if suggestions.is_empty() {
        println!("No suggestions yet.");
        return;
    }
    for s in suggestions {
        println!("{:<8} {:>7}  {}", s.level, s.count, truncate(&s.message, MESSAGE_WIDTH));
    }
}

fn feed_error<T>(feed: &Feed<T>) -> bool {
    if let Some(error) = &feed.error {
        println!("  {}", error);
        return true;
    }
    false
}

pub fn analytics(state: &AnalyticsState, advanced: bool, upgrade_message: &str) {
    heading("Overview");
    if !feed_error(&state.stats) {
        if let Some(stats) = &state.stats.data {
            println!("  Uploads:   {}", stats.total_uploads);
            println!("  Lines:     {}", stats.total_lines);
            println!("  Errors:    {}", stats.total_errors);
            println!("  Warnings:  {}", stats.total_warnings);
            println!("  Patterns:  {}", stats.total_patterns);
        }
    }

    println!();
    heading("Top errors");
    if !feed_error(&state.top_errors) {
        for e in &state.top_errors.data {
            println!(
                "  {:>6}  {:<24} {}",
                e.count,
                truncate(&e.filename, 24),
                truncate(&e.message_sample, MESSAGE_WIDTH)
            );
        }
    }

    println!();
    heading("Recent uploads");
    if !feed_error(&state.recent) {
        for r in &state.recent.data {
            println!(
                "  {:<30} {:>9} lines  {}",
                truncate(&r.filename, 30),
                r.total_lines,
                format_relative_time(r.created_at)
            );
        }
    }

    println!();
    heading("Upload frequency");
    if !advanced {
        println!("  {}", upgrade_message);
    } else if !feed_error(&state.upload_frequency) {
        for f in &state.upload_frequency.data {
            println!("  {}  uploads={} lines={} errors={}", f.date, f.uploads, f.lines, f.errors);
        }
    }

    println!();
    heading("Error trend");
    if !advanced {
        println!("  {}", upgrade_message);
    } else if !feed_error(&state.error_trend) {
        for t in &state.error_trend.data {
            println!("  {}  errors={} warnings={}", t.hour, t.errors, t.warnings);
        }
    }
}

pub fn api_keys(keys: &[ApiKey]) {
    if keys.is_empty() {
        println!("No API keys. Run 'logsplitter keys create <name>' to add one.");
        return;
    }
    println!("{:<26} {:<24} {:<12} {:<14} {}", "ID", "NAME", "PREFIX", "CREATED", "LAST USED");
    for k in keys {
        println!(
            "{:<26} {:<24} {:<12} {:<14} {}",
            truncate(&k.id, 26),
            truncate(&k.name, 24),
            k.prefix,
            format_relative_time(k.created_at),
            format_relative_time_opt(k.last_used_at)
        );
    }
}

fn success_rate(stats: &WebhookDeliveryStats) -> String {
    stats
        .success_rate()
        .map(|rate| format!("{:.0}%", rate))
        .unwrap_or_else(|| "-".to_string())
}

pub fn webhooks(webhooks: &[WebhookWithStats]) {
    if webhooks.is_empty() {
        println!("No webhooks configured.");
        return;
    }
    println!("{:<26} {:<40} {:<8} {:>6} {:>8}", "ID", "URL", "ACTIVE", "SENT", "SUCCESS");
    for w in webhooks {
        println!(
            "{:<26} {:<40} {:<8} {:>6} {:>8}",
            truncate(&w.webhook.id, 26),
            truncate(&w.webhook.url, 40),
            if w.webhook.is_active { "yes" } else { "no" },
            w.delivery_stats.total,
            success_rate(&w.delivery_stats)
        );
    }
}

pub fn webhook(webhook: &Webhook, stats: Option<&WebhookDeliveryStats>) {
    heading(&webhook.url);
    println!("ID:          {}", webhook.id);
    println!("Active:      {}", if webhook.is_active { "yes" } else { "no" });
    let events: Vec<&str> = webhook.events.iter().map(|e| e.as_str()).collect();
    println!("Events:      {}", events.join(", "));
    if let Some(threshold) = webhook.error_spike_threshold {
        println!("Spike at:    {} errors", threshold);
    }
    if let Some(description) = webhook.description.as_deref().filter(|d| !d.is_empty()) {
        println!("Description: {}", description);
    }
    println!("Created:     {}", format_relative_time(webhook.created_at));
    println!("Updated:     {}", format_relative_time(webhook.updated_at));
    if let Some(stats) = stats {
        println!(
            "Deliveries:  {} total, {} ok, {} failed, {} pending ({} success)",
            stats.total,
            stats.successful,
            stats.failed,
            stats.pending,
            success_rate(stats)
        );
    }
}

pub fn deliveries(deliveries: &[WebhookDelivery]) {
    if deliveries.is_empty() {
        println!("No deliveries yet.");
        return;
    }
    println!("{:<22} {:<10} {:>6} {:>8}  {}", "EVENT", "STATUS", "HTTP", "ATTEMPTS", "CREATED");
    for d in deliveries {
        println!(
            "{:<22} {:<10} {:>6} {:>8}  {}",
            d.event_type,
            format!("{:?}", d.status).to_lowercase(),
            d.response_status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
            d.attempt_count,
            format_relative_time(d.created_at)
        );
    }
}

fn price(plan: &Plan) -> String {
    if plan.price == 0 {
        return "Free".to_string();
    }
    format!("${}.{:02}", plan.price / 100, plan.price % 100)
}

pub fn plans(plans: &[Plan]) {
    println!("{:<12} {:<16} {:>10} {:<8} {:>12} {:>9}", "SLUG", "NAME", "PRICE", "PER", "UPLOADS/MO", "MAX FILE");
    for p in plans {
        let uploads = if p.limits.monthly_uploads < 0 {
            "unlimited".to_string()
        } else {
            p.limits.monthly_uploads.to_string()
        };
        println!(
            "{:<12} {:<16} {:>10} {:<8} {:>12} {:>9}",
            p.slug,
            p.name,
            price(p),
            format!("{:?}", p.interval).to_lowercase(),
            uploads,
            format!("{} MB", p.limits.max_file_size_mb)
        );
    }
}

pub fn profile(profile: &UserProfile) {
    heading("Profile");
    println!("ID:       {}", profile.id);
    println!("Email:    {}", profile.email.as_deref().unwrap_or("<none>"));
    println!("Joined:   {}", format_relative_time(profile.created_at));
    if let Some(plan) = profile.permissions.as_ref().and_then(|p| p.plan.as_deref()) {
        println!("Plan:     {}", plan);
    }
    println!();
    heading("Settings");
    println!("Email notifications: {}", profile.settings.email_notifications);
    println!("Dark mode:           {}", profile.settings.dark_mode);
    println!("Timezone:            {}", profile.settings.timezone);
}

pub fn dashboard(data: &DashboardData) {
    heading("Dashboard");
    let stats = &data.stats;
    println!("Uploads:        {}", stats.total_uploads);
    println!("Lines:          {}", stats.total_lines);
    println!("Patterns:       {}", stats.total_patterns);
    println!("Error rate:     {:.2}%", stats.error_rate);
    println!("Avg lines/file: {:.0}", stats.avg_lines_per_upload);

    if !data.recent_uploads.is_empty() {
        println!();
        println!("Recent uploads:");
        for r in &data.recent_uploads {
            println!(
                "  {:<30} {:>9} lines  {}",
                truncate(&r.filename, 30),
                r.total_lines,
                format_relative_time(r.created_at)
            );
        }
    }

    if !data.top_errors.is_empty() {
        println!();
        println!("Top errors:");
        for e in &data.top_errors {
            println!(
                "  {:>6}  {:<24} {}",
                e.count,
                truncate(&e.filename, 24),
                truncate(&e.message_sample, MESSAGE_WIDTH)
            );
        }
    }
}
