// src/storage/usage.rs - Storage utilization estimate

use serde::{Deserialize, Serialize};

/// Approximate on-disk footprint of the message histories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub usage_bytes: u64,
    pub item_count: u64,
}

impl UsageStats {
    pub fn add_record(&mut self, encoded_len: usize) {
        self.usage_bytes += encoded_len as u64;
        self.item_count += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }
}

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Render a byte count for display: `0 Bytes`, `512 Bytes`, `1.5 KB`.
///
/// Uses base 1024, at most `decimals` fraction digits, trailing zeros
/// dropped. Anything past terabytes stays in TB.
pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".into();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rendered = format!("{value:.decimals$}");
    let rendered = if rendered.contains('.') {
        rendered.trim_end_matches('0').trim_end_matches('.')
    } else {
        rendered.as_str()
    };
    format!("{rendered} {}", UNITS[unit])
}
