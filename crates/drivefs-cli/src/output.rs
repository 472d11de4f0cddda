use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;

use drivefs_core::{NodeKind, NodeRef};

/// Create a styled table for output
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).apply_modifier(UTF8_ROUND_CORNERS);
    table
}

/// Format a byte size into a human-readable string
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b >= GB => format!("{:.1}G", b as f64 / GB as f64),
        b if b >= MB => format!("{:.1}M", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1}K", b as f64 / KB as f64),
        b => format!("{b}B"),
    }
}

/// Single-letter type indicator, `ls -l` style
pub fn format_kind(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::Folder => "d",
        NodeKind::Shortcut { .. } => "l",
        NodeKind::AppDocument => "g",
        NodeKind::Regular => "-",
    }
}

/// Entry name with a suffix marking its kind
pub fn decorated_name(node: &NodeRef) -> String {
    match &node.kind {
        NodeKind::Folder => format!("{}/", node.name),
        NodeKind::Shortcut { target: Some(target) } => format!("{} -> {target}", node.name),
        NodeKind::Shortcut { target: None } => format!("{}@", node.name),
        NodeKind::AppDocument => format!("{}*", node.name),
        NodeKind::Regular => node.name.clone(),
    }
}

/// Size column: only regular files carry byte content
pub fn format_node_size(node: &NodeRef) -> String {
    match node.kind {
        NodeKind::Regular => format_size(node.size),
        _ => "-".to_string(),
    }
}
