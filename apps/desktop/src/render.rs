//! Plain-text rendering of the catalog view.

use client_core::{ListingSnapshot, Theme};
use colored::{ColoredString, Colorize};
use shared::domain::{Category, FavoriteSet, FilterState, Product, ViewQuery};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const GRID_COLUMNS: usize = 4;
const CARD_WIDTH: usize = 28;
const CARD_GAP: &str = "  ";

pub struct ViewModel<'a> {
    pub listing: &'a ListingSnapshot,
    pub favorites: &'a FavoriteSet,
    pub filters: &'a FilterState,
    pub theme: Theme,
}

/// Loading and listing errors replace the whole view.
pub fn render_view(view: &ViewModel<'_>) -> String {
    if view.listing.loading {
        return format!("{}\n", paint("Loading...", view.theme));
    }
    if let Some(error) = &view.listing.error {
        return format!("{}\n", paint(&error.message, view.theme).bold());
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{}  [{} mode]\n",
        paint("Product Explorer", view.theme).bold(),
        view.theme.label()
    ));
    if let Some(line) = filter_line(view.filters) {
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(&format!("{}\n\n", shown_label(view.listing.shown.as_ref())));
    out.push_str(&render_grid(
        &view.listing.products,
        view.favorites,
        view.theme,
    ));
    out.push('\n');
    out.push_str(&pagination_line(view.listing));
    out.push_str("\n\n");
    out.push_str(&render_favorites(view.favorites, view.theme));
    out
}

pub fn render_grid(products: &[Product], favorites: &FavoriteSet, theme: Theme) -> String {
    if products.is_empty() {
        return "No products.\n".to_string();
    }

    let mut out = String::new();
    for row in products.chunks(GRID_COLUMNS) {
        let cards: Vec<[String; 3]> = row
            .iter()
            .map(|product| card_lines(product, favorites.contains(product.id)))
            .collect();
        for line in 0..3 {
            let cells: Vec<String> = cards
                .iter()
                .map(|card| paint(&pad_to_width(&card[line], CARD_WIDTH), theme).to_string())
                .collect();
            out.push_str(cells.join(CARD_GAP).trim_end());
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

pub fn render_favorites(favorites: &FavoriteSet, theme: Theme) -> String {
    let mut out = format!("{}\n", paint("Your Favorites", theme).bold());
    if favorites.is_empty() {
        out.push_str("No favorites yet.\n");
        return out;
    }
    out.push_str(&render_grid(favorites.as_slice(), favorites, theme));
    out
}

pub fn render_categories(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories.\n".to_string();
    }
    let slug_width = categories
        .iter()
        .map(|category| category.slug.as_str().width())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for category in categories {
        let slug = category.slug.as_str();
        out.push_str(&format!(
            "{slug}{}  {}\n",
            " ".repeat(slug_width.saturating_sub(slug.width())),
            category.name
        ));
    }
    out
}

fn card_lines(product: &Product, is_favorite: bool) -> [String; 3] {
    let title = truncate_to_width(&format!("#{} {}", product.id, product.title), CARD_WIDTH);
    let price = format!("${:.2}  * {:.2}", product.price, product.rating);
    let toggle = if is_favorite {
        "[x] favorite"
    } else {
        "[ ] favorite"
    };
    [title, price, toggle.to_string()]
}

fn filter_line(filters: &FilterState) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(search) = &filters.search {
        parts.push(format!("search: {search:?}"));
    }
    if let Some(category) = &filters.category {
        parts.push(format!("category: {category}"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("  "))
    }
}

fn shown_label(shown: Option<&ViewQuery>) -> String {
    match shown {
        None => "Nothing loaded yet".to_string(),
        Some(ViewQuery::Listing { .. }) => "All products".to_string(),
        Some(ViewQuery::Search { query }) => format!("Search results for {query:?}"),
        Some(ViewQuery::Category { slug }) => format!("Category {slug}"),
    }
}

fn pagination_line(listing: &ListingSnapshot) -> String {
    let previous = if listing.page.is_first() {
        "(prev)"
    } else {
        "< prev"
    };
    format!("{previous}  Page {}  next >", listing.page.index() + 1)
}

fn paint(text: &str, theme: Theme) -> ColoredString {
    match theme {
        Theme::Light => text.black().on_white(),
        Theme::Dark => text.white().on_black(),
    }
}

fn pad_to_width(s: &str, width: usize) -> String {
    let padding = width.saturating_sub(s.width());
    format!("{s}{}", " ".repeat(padding))
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
