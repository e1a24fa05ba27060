use std::fmt::Write;

use crate::models::{ItemKind, SearchOutcome, SimilarItem};

pub const DESCRIPTION_LIMIT: usize = 80;
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x200?text=No+Image";

pub const EMPTY_MESSAGE: &str = "No similar items found. Try uploading a different image or check back later.";
pub const SERVICE_FAILURE_MESSAGE: &str = "Search failed. Please try again.";
pub const TRANSPORT_FAILURE_MESSAGE: &str = "An error occurred while searching. Please try again.";
pub const ANALYZING_MESSAGE: &str = "Analyzing image and searching for similar items...";

/// Escapes text for both element content and quoted attribute values.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Cuts at 80 characters (not bytes) and marks the cut. Exactly 80 is left alone.
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() > DESCRIPTION_LIMIT {
        let head: String = description.chars().take(DESCRIPTION_LIMIT).collect();
        format!("{head}...")
    } else {
        description.to_string()
    }
}

fn image_src(image: Option<&str>) -> &str {
    match image.map(str::trim) {
        Some(url)
            if url.starts_with("https://")
                || url.starts_with("http://")
                || url.starts_with("data:image/") =>
        {
            url
        }
        _ => PLACEHOLDER_IMAGE,
    }
}

pub fn render_analyzing() -> String {
    format!(
        r#"<div class="text-center"><i class="fas fa-search fa-2x text-primary mb-3"></i><p>{ANALYZING_MESSAGE}</p></div>"#
    )
}

pub fn render_empty() -> String {
    format!(
        r#"<div class="alert alert-info text-center"><i class="fas fa-info-circle me-2"></i>{EMPTY_MESSAGE}</div>"#
    )
}

/// Service messages are untrusted too.
pub fn render_error(message: Option<&str>) -> String {
    let message = message.unwrap_or(SERVICE_FAILURE_MESSAGE);
    format!(
        r#"<div class="alert alert-warning text-center"><i class="fas fa-exclamation-triangle me-2"></i>{}</div>"#,
        escape_html(message)
    )
}

fn render_card(out: &mut String, item: &SimilarItem) {
    let title = escape_html(&item.title);
    let badge = item
        .similarity_score
        .map(|score| format!(r#"<span class="badge bg-success similarity">{score}% match</span>"#))
        .unwrap_or_default();
    let kind = match item.kind {
        ItemKind::Lost => r#"<span class="kind kind-lost"><i class="fas fa-search text-danger"></i> Lost</span>"#,
        ItemKind::Found => {
            r#"<span class="kind kind-found"><i class="fas fa-hands-helping text-success"></i> Found</span>"#
        }
    };
    let specific = item
        .specific_location
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| format!(" - {}", escape_html(s)))
        .unwrap_or_default();
    // serde_json cannot fail on this type; an empty payload only disables the details view.
    let payload = serde_json::to_string(item).unwrap_or_default();

    let _ = write!(
        out,
        r#"<div class="col-md-6 col-lg-4 mb-4"><div class="card h-100 shadow-sm" data-kind="{kind_label}">
<div class="position-relative">
<img src="{src}" class="card-img-top" alt="{title}" style="height: 200px; object-fit: cover;">
<div class="position-absolute top-0 end-0 m-2">{badge}</div>
<div class="position-absolute top-0 start-0 m-2">{kind}</div>
</div>
<div class="card-body">
<h6 class="card-title">{title}</h6>
<p class="card-text small text-muted mb-2"><i class="fas fa-map-marker-alt me-1"></i>{location}{specific}</p>
<p class="card-text small text-muted mb-2"><i class="fas fa-calendar me-1"></i>{date}</p>
<p class="card-text small">{description}</p>
</div>
<div class="card-footer bg-transparent"><button type="button" class="btn btn-sm btn-primary w-100 view-details" data-item="{payload}"><i class="fas fa-eye me-1"></i>View Details</button></div>
</div></div>
"#,
        kind_label = item.kind.label().to_lowercase(),
        src = escape_html(image_src(item.image.as_deref())),
        location = escape_html(&item.location),
        date = escape_html(&item.date),
        description = escape_html(&truncate_description(&item.description)),
        payload = escape_html(&payload),
    );
}

/// One card per item, in the order the service ranked them.
pub fn render_items(items: &[SimilarItem]) -> String {
    if items.is_empty() {
        return render_empty();
    }

    let mut out = format!(
        "<div class=\"mt-4\">\n<h4 class=\"mb-3\"><i class=\"fas fa-images me-2\"></i>Similar Items Found ({})</h4>\n<div class=\"row\">\n",
        items.len()
    );
    for item in items {
        render_card(&mut out, item);
    }
    out.push_str(
        "</div>\n<div class=\"text-center mt-3\"><small class=\"text-muted\"><i class=\"fas fa-info-circle me-1\"></i>Results are ranked by visual similarity. Higher percentages indicate better matches.</small></div>\n</div>",
    );
    out
}

pub fn render(outcome: &SearchOutcome) -> String {
    match outcome {
        SearchOutcome::Items(items) => render_items(items),
        SearchOutcome::Rejected(message) => render_error(message.as_deref()),
        SearchOutcome::Unreachable => render_error(Some(TRANSPORT_FAILURE_MESSAGE)),
    }
}
