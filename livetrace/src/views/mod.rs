//! View models: the strings each panel shows, computed from one snapshot.
//!
//! Nothing here touches the terminal, so the TUI and headless mode render the
//! same text and tests can check it directly.

pub mod stack_trace;
pub mod summary;
pub mod thread_list;

pub use stack_trace::{stack_rows, StackRow, StackTraceView};
pub use summary::SummaryView;
pub use thread_list::{thread_rows, ThreadRow};

/// Format with `,` thousands separators: `1234567` → `"1,234,567"`.
#[must_use]
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
