use iterable_core::event::Page;
use iterable_core::IterableSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Page,
    Screen,
}

impl ViewKind {
    fn label(&self) -> &'static str {
        match self {
            ViewKind::Page => "Page",
            ViewKind::Screen => "Screen",
        }
    }
}

/// Name of the track event a page or screen view is forwarded as, or `None`
/// when no forwarding switch applies. The first satisfied switch wins.
pub fn view_event_name(settings: &IterableSettings, view: &Page, kind: ViewKind) -> Option<String> {
    let label = kind.label();
    if settings.track_all_pages {
        return Some(format!("Loaded a {label}"));
    }

    let has_name = view.name.as_deref().is_some_and(|n| !n.is_empty());
    if settings.track_named_pages && has_name {
        if let Some(full_name) = view.full_name() {
            return Some(format!("Viewed {full_name} {label}"));
        }
    }

    if settings.track_categorized_pages {
        if let Some(category) = view.category.as_deref().filter(|c| !c.is_empty()) {
            return Some(format!("Viewed {category} {label}"));
        }
    }

    None
}
