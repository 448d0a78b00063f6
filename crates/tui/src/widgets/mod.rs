//! Widgets for the board views.

pub mod history_view;
pub mod kanban;
pub mod list_view;
pub mod toast;

pub use history_view::HistoryView;
pub use kanban::{render_kanban, BoardLayout, CardArea, KanbanCursor};
pub use list_view::ListView;
pub use toast::Toasts;

/// Format an amount with thousands separators and no decimals unless it
/// has a fractional part.
pub fn format_amount(value: f64) -> String {
    let decimals = if value.fract().abs() < 0.005 { 0 } else { 2 };
    let text = format!("{value:.decimals$}");
    let (integer, fraction) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };
    let (sign, digits) = match integer.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", integer),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}
