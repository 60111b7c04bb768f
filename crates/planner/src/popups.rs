//! Popup bucketer: split a range's popups into bounded 1-based buckets

use serde::{Deserialize, Serialize};

/// One slice of a range's popup index space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PopupBucket {
    pub first_popup: u64,
    pub last_popup: u64,
    /// The page still has to run its non-popup part
    pub run_no_popup: bool,
}

impl PopupBucket {
    /// Query form of `run_no_popup`
    pub fn run_no_popup_str(&self) -> &'static str {
        if self.run_no_popup {
            "yes"
        } else {
            "no"
        }
    }
}

/// Split `[1, total]` into consecutive buckets of at most `max` popups.
///
/// Returns no buckets when `total <= max`: the range then runs as one URL
/// without popup parameters. The first bucket alone has `run_no_popup` set.
pub fn bucket_popups(total: u64, max: u64) -> Vec<PopupBucket> {
    if total <= max {
        return Vec::new();
    }
    let max = max.max(1);

    let mut buckets = Vec::with_capacity(total.div_ceil(max) as usize);
    let mut first = 1;
    while first <= total {
        let last = (first + max - 1).min(total);
        buckets.push(PopupBucket {
            first_popup: first,
            last_popup: last,
            run_no_popup: buckets.is_empty(),
        });
        first = last + 1;
    }
    buckets
}
